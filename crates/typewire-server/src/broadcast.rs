use std::collections::HashMap;

use tokio::sync::mpsc;
use typewire_core::protocol::ServerMessage;
use typewire_core::session::SessionHandle;

/// A connection's outbound mailbox: the WS write task drains it and the rest
/// of the server only ever pushes onto it. Bounded so a stalled client can't
/// grow memory without limit (source spec §9's "bounded per-session outbound
/// queue").
pub type OutboundSender = mpsc::Sender<String>;

pub type OutboundMap = HashMap<SessionHandle, OutboundSender>;

/// Whether an overflowing send should be silently dropped or should mark the
/// session for disconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// `words-list` is a series of snapshots; missing one is harmless since
    /// the next claim (or the final `scores`) supersedes it.
    DropMessage,
    /// Everything else (`scores`, `game-start`, `manager`, the lobby
    /// messages) must arrive; a client too backed up to receive it is
    /// treated as gone.
    Disconnect,
}

/// Sends `message` to every handle in `targets` that still has a live
/// outbound channel. Returns the handles whose send failed under
/// [`OverflowPolicy::Disconnect`] — the caller is responsible for tearing
/// those sessions down.
pub fn broadcast(outbound: &OutboundMap, targets: impl IntoIterator<Item = SessionHandle>, message: &ServerMessage, policy: OverflowPolicy) -> Vec<SessionHandle> {
    let payload = message.to_json();
    let mut failed = Vec::new();
    for handle in targets {
        if let Some(sender) = outbound.get(&handle)
            && let Err(err) = sender.try_send(payload.clone())
        {
            match policy {
                OverflowPolicy::DropMessage => {
                    tracing::debug!(%handle, %err, "dropped outbound message on overflow");
                },
                OverflowPolicy::Disconnect => {
                    tracing::warn!(%handle, %err, "outbound queue full or closed, disconnecting");
                    failed.push(handle);
                },
            }
        }
    }
    failed
}

pub fn send_one(outbound: &OutboundMap, handle: SessionHandle, message: &ServerMessage) -> bool {
    broadcast(outbound, std::iter::once(handle), message, OverflowPolicy::Disconnect).is_empty()
}
