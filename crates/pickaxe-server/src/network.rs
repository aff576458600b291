use crate::config::{ConnectionMethod, ServerConfig, UpstreamConfig};
use crate::registry::{ClientGuard, ClientHandle, Registry};
use anyhow::Result;
use pickaxe_events::Hooks;
use pickaxe_protocol_core::{Connection, ConnectionState, InternalPacket, ProtocolAdapter};
use pickaxe_protocol_v1_21::V1_21Adapter;
use pickaxe_types::{ChatComponent, Color, NamedColor, Style};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Handle a single accepted connection through Handshake, then Status or
/// Login. Registers the client in the listener's registry for the lifetime
/// of the task and removes it on every exit path.
pub async fn handle_connection(
    socket: TcpStream,
    config: Arc<ServerConfig>,
    hooks: Arc<dyn Hooks>,
    registry: Arc<Registry>,
) {
    let peer = match socket.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("accepted connection with no peer address: {e}");
            return;
        }
    };

    let client = registry.insert();
    let _guard = ClientGuard::new(registry.clone(), client.id());

    if let Err(e) = handle_connection_inner(socket, peer, &config, &hooks, &client).await {
        debug!(%peer, error = %e, "connection closed");
    }
}

async fn handle_connection_inner(
    socket: TcpStream,
    peer: SocketAddr,
    config: &ServerConfig,
    hooks: &Arc<dyn Hooks>,
    client: &ClientHandle,
) -> Result<()> {
    let adapter = V1_21Adapter::new();
    let mut conn = Connection::new(socket);

    let (protocol_version, next_state) = read_handshake(&mut conn, &adapter, peer).await?;

    match next_state {
        1 => handle_status(&mut conn, &adapter, peer, protocol_version, hooks).await,
        2 => handle_login(conn, &adapter, peer, protocol_version, config, hooks, client).await,
        other => {
            warn!(%peer, next_state = other, "invalid next_state in Handshake, dropping connection");
            Ok(())
        }
    }
}

async fn read_handshake(
    conn: &mut Connection,
    adapter: &V1_21Adapter,
    peer: SocketAddr,
) -> Result<(i32, i32)> {
    let (id, mut data) = conn.read_packet().await?;
    match adapter.decode_packet(ConnectionState::Handshaking, id, &mut data)? {
        InternalPacket::Handshake {
            protocol_version,
            next_state,
            ..
        } => Ok((protocol_version, next_state)),
        other => {
            warn!(%peer, ?other, "expected Handshake as the first packet");
            Err(anyhow::anyhow!("expected Handshake packet"))
        }
    }
}

/// Status: `Request` -> `Response`, `Ping` -> `Pong`, both leaving the
/// connection in Status. The loop ends when the client closes its socket.
async fn handle_status(
    conn: &mut Connection,
    adapter: &V1_21Adapter,
    peer: SocketAddr,
    protocol_version: i32,
    hooks: &Arc<dyn Hooks>,
) -> Result<()> {
    loop {
        let (id, mut data) = conn.read_packet().await?;
        match adapter.decode_packet(ConnectionState::Status, id, &mut data)? {
            InternalPacket::StatusRequest => {
                let payload = hooks.on_request_status(peer, protocol_version);
                send_packet(
                    conn,
                    adapter,
                    ConnectionState::Status,
                    &InternalPacket::StatusResponse {
                        json: payload.to_json_string(),
                    },
                )
                .await?;
            }
            InternalPacket::PingRequest { payload } => {
                send_packet(
                    conn,
                    adapter,
                    ConnectionState::Status,
                    &InternalPacket::PongResponse { payload },
                )
                .await?;
            }
            other => warn!(%peer, ?other, "unexpected packet in Status state, dropped"),
        }
    }
}

/// Login: `LoginStart` either ends the connection with a fixed `Disconnect`
/// (no upstream configured) or hands it off to a proxied upstream session.
async fn handle_login(
    mut conn: Connection,
    adapter: &V1_21Adapter,
    peer: SocketAddr,
    protocol_version: i32,
    config: &ServerConfig,
    hooks: &Arc<dyn Hooks>,
    client: &ClientHandle,
) -> Result<()> {
    let (id, mut data) = conn.read_packet().await?;
    let username = match adapter.decode_packet(ConnectionState::Login, id, &mut data)? {
        InternalPacket::LoginStart { username } => username,
        other => {
            warn!(%peer, ?other, "expected LoginStart in Login state");
            return Ok(());
        }
    };

    hooks.on_request_login(peer, &username);
    client.set_username(username.clone());

    match config.upstream.as_ref() {
        Some(upstream) if upstream.connection_method == ConnectionMethod::Unencrypted => {
            proxy_to_upstream(conn, adapter, protocol_version, upstream, &username, peer).await
        }
        Some(upstream) => {
            warn!(
                %peer,
                method = ?upstream.connection_method,
                "connection method has no implemented behavior, disconnecting instead",
            );
            disconnect_with_default_reason(&mut conn, adapter, peer, hooks).await
        }
        None => disconnect_with_default_reason(&mut conn, adapter, peer, hooks).await,
    }
}

async fn disconnect_with_default_reason(
    conn: &mut Connection,
    adapter: &V1_21Adapter,
    peer: SocketAddr,
    hooks: &Arc<dyn Hooks>,
) -> Result<()> {
    let reason = default_disconnect_reason();
    send_packet(
        conn,
        adapter,
        ConnectionState::Login,
        &InternalPacket::Disconnect {
            reason: reason.clone(),
        },
    )
    .await?;
    hooks.on_client_disconnect(peer, &reason.to_json_string());
    Ok(())
}

/// Dials the configured upstream, replays a synthesized Handshake and
/// LoginStart on its behalf, then relays raw bytes in both directions for
/// the rest of the session. Play packets are never reinterpreted.
async fn proxy_to_upstream(
    conn: Connection,
    adapter: &V1_21Adapter,
    protocol_version: i32,
    upstream: &UpstreamConfig,
    username: &str,
    peer: SocketAddr,
) -> Result<()> {
    info!(%peer, upstream = %format!("{}:{}", upstream.address, upstream.port), "dialing upstream for proxy handoff");

    let upstream_socket = TcpStream::connect((upstream.address.as_str(), upstream.port)).await?;
    let mut upstream_conn = Connection::new(upstream_socket);

    send_packet(
        &mut upstream_conn,
        adapter,
        ConnectionState::Handshaking,
        &InternalPacket::Handshake {
            protocol_version,
            server_address: upstream.address.clone(),
            server_port: upstream.port,
            next_state: 2,
        },
    )
    .await?;
    send_packet(
        &mut upstream_conn,
        adapter,
        ConnectionState::Login,
        &InternalPacket::LoginStart {
            username: username.to_string(),
        },
    )
    .await?;

    let (mut client_stream, leftover) = conn.into_raw_stream()?;
    let (mut upstream_stream, _) = upstream_conn.into_raw_stream()?;

    if !leftover.is_empty() {
        upstream_stream.write_all(&leftover).await?;
    }

    tokio::io::copy_bidirectional(&mut client_stream, &mut upstream_stream).await?;
    Ok(())
}

/// The fixed chat component S2 requires when no upstream is configured.
fn default_disconnect_reason() -> ChatComponent {
    ChatComponent::text("It works!")
        .with_style(|s| Style {
            color: Some(Color::Named(NamedColor::Green)),
            ..s
        })
        .with_child(ChatComponent::text(" Good for you :^)").with_style(|s| Style {
            color: Some(Color::Named(NamedColor::Yellow)),
            ..s
        }))
}

async fn send_packet(
    conn: &mut Connection,
    adapter: &V1_21Adapter,
    state: ConnectionState,
    packet: &InternalPacket,
) -> Result<()> {
    let mut encoded = adapter.encode_packet(state, packet)?;
    let packet_id = pickaxe_protocol_core::read_varint(&mut encoded)?;
    conn.write_packet(packet_id, &encoded).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_disconnect_reason_matches_fixed_scenario() {
        let reason = default_disconnect_reason();
        let json = reason.to_json();
        assert_eq!(json["text"], "It works!");
        assert_eq!(json["color"], "green");
        let extra = json["extra"].as_array().unwrap();
        assert_eq!(extra[0]["text"], " Good for you :^)");
        assert_eq!(extra[0]["color"], "yellow");
    }
}
