//! Wire definitions for 1.20.3 and 1.20.4.

pub mod packets;

pub use packets::*;

use crate::data::ProtocolRevision;

pub const REVISION: ProtocolRevision = ProtocolRevision::V1_20_R3;
pub const PROTOCOL: i32 = 765;
