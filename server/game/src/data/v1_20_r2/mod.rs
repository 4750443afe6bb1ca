//! Wire definitions for 1.20.2.

pub mod packets;

pub use packets::*;

use crate::data::ProtocolRevision;

pub const REVISION: ProtocolRevision = ProtocolRevision::V1_20_R2;
pub const PROTOCOL: i32 = 764;
