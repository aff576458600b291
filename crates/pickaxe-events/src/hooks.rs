use crate::StatusPayload;
use std::net::SocketAddr;

/// Collaborator-facing event hooks. A scripting/plugin host binds an
/// implementation of this trait to customize status responses and react to
/// client lifecycle events. Hooks run on the event-loop thread and must not
/// block.
pub trait Hooks: Send + Sync {
    /// Produce the Status Response payload for a connection that just sent
    /// `Request`. `protocol_version` is the client's declared Handshake
    /// protocol version.
    fn on_request_status(&self, peer: SocketAddr, protocol_version: i32) -> StatusPayload;

    /// Called once a client's `LoginStart` has been received, before any
    /// Disconnect or proxy dial decision is made.
    fn on_request_login(&self, peer: SocketAddr, username: &str);

    /// Called when a client disconnects, for any reason.
    fn on_client_disconnect(&self, peer: SocketAddr, reason: &str);
}

/// The default `Hooks` implementation used when no scripting/plugin host is
/// bound. Synthesizes a minimal status payload and otherwise only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHooks;

impl Hooks for NullHooks {
    fn on_request_status(&self, _peer: SocketAddr, protocol_version: i32) -> StatusPayload {
        StatusPayload::default_for_protocol(protocol_version)
    }

    fn on_request_login(&self, peer: SocketAddr, username: &str) {
        tracing::debug!(%peer, %username, "login requested, no hooks bound");
    }

    fn on_client_disconnect(&self, peer: SocketAddr, reason: &str) {
        tracing::debug!(%peer, %reason, "client disconnected, no hooks bound");
    }
}
