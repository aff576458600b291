use anyhow::{bail, Result};
use bytes::{Buf, BufMut, BytesMut};
use pickaxe_protocol_core::*;

pub struct V1_21Adapter;

impl V1_21Adapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for V1_21Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolAdapter for V1_21Adapter {
    fn protocol_version(&self) -> i32 {
        767
    }

    fn decode_packet(
        &self,
        state: ConnectionState,
        id: i32,
        data: &mut BytesMut,
    ) -> Result<InternalPacket> {
        match state {
            ConnectionState::Handshaking => decode_handshaking(id, data),
            ConnectionState::Status => decode_status(id, data),
            ConnectionState::Login => decode_login(id, data),
            ConnectionState::Play => Ok(InternalPacket::Unknown {
                packet_id: id,
                data: data.to_vec(),
            }),
        }
    }

    fn encode_packet(&self, state: ConnectionState, packet: &InternalPacket) -> Result<BytesMut> {
        match state {
            ConnectionState::Handshaking => encode_handshaking(packet),
            ConnectionState::Status => encode_status(packet),
            ConnectionState::Login => encode_login(packet),
            _ => bail!("Cannot encode packets in {:?} state", state),
        }
    }
}

// === Packet ID constants (literal wire IDs per the catalog) ===

const HANDSHAKE: i32 = 0x00;

// Status
const STATUS_RESPONSE: i32 = 0x00;
const PONG_RESPONSE: i32 = 0x01;

// Login serverbound
const LOGIN_START: i32 = 0x00;

// Login clientbound
const LOGIN_DISCONNECT: i32 = 0x00;
const LOGIN_SUCCESS: i32 = 0x02;

// === Decode functions ===

fn decode_handshaking(id: i32, data: &mut BytesMut) -> Result<InternalPacket> {
    match id {
        0x00 => {
            let protocol_version = read_varint(data)?;
            let server_address = read_string(data, 255)?;
            let server_port = data.get_u16();
            let next_state = read_varint(data)?;
            Ok(InternalPacket::Handshake {
                protocol_version,
                server_address,
                server_port,
                next_state,
            })
        }
        _ => Ok(InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        }),
    }
}

fn decode_status(id: i32, data: &mut BytesMut) -> Result<InternalPacket> {
    match id {
        0x00 => Ok(InternalPacket::StatusRequest),
        0x01 => {
            let payload = data.get_i64();
            Ok(InternalPacket::PingRequest { payload })
        }
        _ => Ok(InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        }),
    }
}

fn decode_login(id: i32, data: &mut BytesMut) -> Result<InternalPacket> {
    match id {
        0x00 => {
            let username = read_string(data, 16)?;
            Ok(InternalPacket::LoginStart { username })
        }
        _ => Ok(InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        }),
    }
}

// === Encode functions ===

/// Encodes the client-to-server Handshake. Used by the server itself when
/// dialing an upstream in proxy mode.
fn encode_handshaking(packet: &InternalPacket) -> Result<BytesMut> {
    let mut buf = BytesMut::new();
    match packet {
        InternalPacket::Handshake {
            protocol_version,
            server_address,
            server_port,
            next_state,
        } => {
            write_varint(&mut buf, HANDSHAKE);
            write_varint(&mut buf, *protocol_version);
            write_string(&mut buf, server_address);
            buf.put_u16(*server_port);
            write_varint(&mut buf, *next_state);
        }
        _ => bail!(
            "Cannot encode {:?} in Handshaking state",
            std::mem::discriminant(packet)
        ),
    }
    Ok(buf)
}

fn encode_status(packet: &InternalPacket) -> Result<BytesMut> {
    let mut buf = BytesMut::new();
    match packet {
        InternalPacket::StatusResponse { json } => {
            write_varint(&mut buf, STATUS_RESPONSE);
            write_string(&mut buf, json);
        }
        InternalPacket::PongResponse { payload } => {
            write_varint(&mut buf, PONG_RESPONSE);
            buf.put_i64(*payload);
        }
        _ => bail!(
            "Cannot encode {:?} in Status state",
            std::mem::discriminant(packet)
        ),
    }
    Ok(buf)
}

fn encode_login(packet: &InternalPacket) -> Result<BytesMut> {
    let mut buf = BytesMut::new();
    match packet {
        InternalPacket::LoginStart { username } => {
            write_varint(&mut buf, LOGIN_START);
            write_string(&mut buf, username);
        }
        InternalPacket::Disconnect { reason } => {
            write_varint(&mut buf, LOGIN_DISCONNECT);
            write_string(&mut buf, &reason.to_json_string());
        }
        InternalPacket::LoginSuccess { uuid, username } => {
            write_varint(&mut buf, LOGIN_SUCCESS);
            write_uuid(&mut buf, uuid);
            write_string(&mut buf, username);
            write_varint(&mut buf, 0); // no profile properties
        }
        _ => bail!(
            "Cannot encode {:?} in Login state",
            std::mem::discriminant(packet)
        ),
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_roundtrip() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 767);
        write_string(&mut buf, "localhost");
        buf.put_u16(25565);
        write_varint(&mut buf, 1);

        let adapter = V1_21Adapter::new();
        let packet = adapter
            .decode_packet(ConnectionState::Handshaking, 0x00, &mut buf)
            .unwrap();
        match packet {
            InternalPacket::Handshake {
                protocol_version,
                server_address,
                server_port,
                next_state,
            } => {
                assert_eq!(protocol_version, 767);
                assert_eq!(server_address, "localhost");
                assert_eq!(server_port, 25565);
                assert_eq!(next_state, 1);
            }
            other => panic!("unexpected packet: {other:?}"),
        }
    }

    #[test]
    fn status_request_and_response() {
        let adapter = V1_21Adapter::new();
        let mut empty = BytesMut::new();
        let request = adapter
            .decode_packet(ConnectionState::Status, 0x00, &mut empty)
            .unwrap();
        assert!(matches!(request, InternalPacket::StatusRequest));

        let response = InternalPacket::StatusResponse {
            json: "{}".to_string(),
        };
        let encoded = adapter
            .encode_packet(ConnectionState::Status, &response)
            .unwrap();
        let mut encoded = encoded;
        let id = read_varint(&mut encoded).unwrap();
        assert_eq!(id, STATUS_RESPONSE);
        let json = read_string(&mut encoded, 32767).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn handshake_encode_for_proxy_dial() {
        let adapter = V1_21Adapter::new();
        let packet = InternalPacket::Handshake {
            protocol_version: 767,
            server_address: "127.0.0.1".into(),
            server_port: 25566,
            next_state: 2,
        };
        let mut encoded = adapter
            .encode_packet(ConnectionState::Handshaking, &packet)
            .unwrap();
        let id = read_varint(&mut encoded).unwrap();
        assert_eq!(id, HANDSHAKE);
        let decoded = adapter
            .decode_packet(ConnectionState::Handshaking, id, &mut encoded)
            .unwrap();
        match decoded {
            InternalPacket::Handshake {
                server_address,
                next_state,
                ..
            } => {
                assert_eq!(server_address, "127.0.0.1");
                assert_eq!(next_state, 2);
            }
            other => panic!("unexpected packet: {other:?}"),
        }
    }

    #[test]
    fn login_start_encode_for_proxy_replay() {
        let adapter = V1_21Adapter::new();
        let packet = InternalPacket::LoginStart {
            username: "alice".into(),
        };
        let mut encoded = adapter
            .encode_packet(ConnectionState::Login, &packet)
            .unwrap();
        let id = read_varint(&mut encoded).unwrap();
        assert_eq!(id, LOGIN_START);
        assert_eq!(read_string(&mut encoded, 16).unwrap(), "alice");
    }

    #[test]
    fn login_start_decode() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Notch");
        let adapter = V1_21Adapter::new();
        let packet = adapter
            .decode_packet(ConnectionState::Login, 0x00, &mut buf)
            .unwrap();
        match packet {
            InternalPacket::LoginStart { username } => assert_eq!(username, "Notch"),
            other => panic!("unexpected packet: {other:?}"),
        }
    }

    #[test]
    fn cannot_encode_status_packet_in_login_state() {
        let adapter = V1_21Adapter::new();
        let packet = InternalPacket::StatusRequest;
        assert!(adapter
            .encode_packet(ConnectionState::Login, &packet)
            .is_err());
    }
}
