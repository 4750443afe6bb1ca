mod bits;
mod var_int;

pub use bits::FixedBitSet;
pub use var_int::VarInt;
