//! Wire definitions for 1.21 and 1.21.1.

pub mod packets;

pub use packets::*;

use crate::data::ProtocolRevision;

pub const REVISION: ProtocolRevision = ProtocolRevision::V1_21_R1;
pub const PROTOCOL: i32 = 767;
