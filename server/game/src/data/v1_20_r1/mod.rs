//! Wire definitions for 1.20 and 1.20.1.

pub mod packets;

pub use packets::*;

use crate::data::ProtocolRevision;

pub const REVISION: ProtocolRevision = ProtocolRevision::V1_20_R1;
pub const PROTOCOL: i32 = 763;
