pub mod consts;
pub mod packets;
pub mod types;
pub mod v1_20_r1;
pub mod v1_20_r2;
pub mod v1_20_r3;
pub mod v1_20_r4;
pub mod v1_21_r1;

/* re-export all important types, packets and macros */
pub use consts::*;
pub use esp::*;
pub use packets::*;
pub use types::*;
