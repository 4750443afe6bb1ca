use std::sync::Arc;

use crate::data::*;

pub type PacketId = i32;

/*
* for creating a new packet, the basic structure is:
* packet!(PacketName, id, { struct body })
*
* followed by an `encode_impl!` for the body of the packet (the id is written separately).
*/

macro_rules! packet {
    ($packet_type:ident, $packet_id:expr, { $($field:ident: $field_type:ty),* $(,)? }) => {
        #[derive(Clone, Debug)]
        pub struct $packet_type {
            $(pub $field: $field_type),*
        }

        impl crate::data::packets::PacketMetadata for $packet_type {
            const PACKET_ID: crate::data::packets::PacketId = $packet_id;
            const NAME: &'static str = stringify!($packet_type);
        }
    };
}

pub(crate) use packet;

pub trait PacketMetadata {
    const PACKET_ID: PacketId;
    const NAME: &'static str;
}

pub trait Packet: Encodable + PacketMetadata {}

impl<T: Encodable + PacketMetadata> Packet for T {}

/// One complete uncompressed frame as it goes on the wire: `VarInt length`, `VarInt packet id`, packet body.
/// Cheap to clone, the same frame is handed to every observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketFrame(Arc<[u8]>);

impl PacketFrame {
    pub fn encode<P: Packet>(packet: &P) -> Self {
        let mut body = ByteBuffer::new();
        body.write_var_int(P::PACKET_ID);
        body.write_value(packet);

        let mut frame = ByteBuffer::with_capacity(body.len() + 5);
        frame.write_prefixed_bytes(body.as_bytes());

        Self(frame.into_vec().into())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Strip the length prefix and return the packet id along with the packet body.
    pub fn split(&self) -> DecodeResult<(PacketId, Vec<u8>)> {
        let mut reader = ByteReader::from_bytes(&self.0);
        let length = usize::try_from(reader.read_var_int()?).map_err(|_| DecodeError::NotEnoughData)?;
        let start = reader.get_rpos();
        if self.0.len() - start != length {
            return Err(DecodeError::NotEnoughData);
        }

        let packet_id = reader.read_var_int()?;
        Ok((packet_id, reader.read_remaining_bytes()?))
    }
}

/// Every frame needed to announce one identity change, encoded for a single protocol revision.
#[derive(Clone, Debug)]
pub struct EncodedPacket {
    pub revision: ProtocolRevision,
    pub frames: Vec<PacketFrame>,
}

impl EncodedPacket {
    pub fn new(revision: ProtocolRevision) -> Self {
        Self {
            revision,
            frames: Vec::with_capacity(2),
        }
    }

    #[must_use]
    pub fn with<P: Packet>(mut self, packet: &P) -> Self {
        self.frames.push(PacketFrame::encode(packet));
        self
    }

    /// Total size of all frames in bytes.
    pub fn len(&self) -> usize {
        self.frames.iter().map(|f| f.as_bytes().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
