use masquerade_shared::SyncMutex;
use tokio::sync::mpsc;

use crate::{
    data::PacketFrame,
    identity::{ClientConnection, DeliveryError},
};

/// Wrapper around an unbounded `tokio::mpsc` channel where the receiver does not need to be mutable.
/// Meant for a single consumer draining it from the tick, any amount of tasks may send.
pub struct TokioChannel<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: SyncMutex<mpsc::UnboundedReceiver<T>>,
}

#[derive(Debug)]
pub struct SenderDropped;

impl<T> TokioChannel<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: SyncMutex::new(rx),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<T> {
        self.tx.clone()
    }

    pub fn send(&self, msg: T) -> Result<(), mpsc::error::SendError<T>> {
        self.tx.send(msg)
    }

    pub fn try_recv(&self) -> Option<T> {
        self.rx.lock().try_recv().ok()
    }

    /// Take every message that is currently queued, without waiting.
    pub fn drain(&self) -> Vec<T> {
        let mut rx = self.rx.lock();
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }

        out
    }
}

impl<T> Default for TokioChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Client connection backed by a bounded channel, the other end is drained by whatever writes to the socket.
pub struct ChannelConnection {
    tx: mpsc::Sender<Vec<PacketFrame>>,
}

impl ChannelConnection {
    pub fn new(queue_size: usize) -> (Self, mpsc::Receiver<Vec<PacketFrame>>) {
        let (tx, rx) = mpsc::channel(queue_size);
        (Self { tx }, rx)
    }
}

impl ClientConnection for ChannelConnection {
    fn send_frames(&self, frames: &[PacketFrame]) -> Result<(), DeliveryError> {
        self.tx.try_send(frames.to_vec()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
