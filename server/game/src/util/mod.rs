pub mod channel;

pub use channel::{ChannelConnection, SenderDropped, TokioChannel};
