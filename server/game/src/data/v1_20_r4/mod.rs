//! Wire definitions for 1.20.5 and 1.20.6.

pub mod packets;

pub use packets::*;

use crate::data::ProtocolRevision;

pub const REVISION: ProtocolRevision = ProtocolRevision::V1_20_R4;
pub const PROTOCOL: i32 = 766;
