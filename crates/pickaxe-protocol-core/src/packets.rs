use pickaxe_types::ChatComponent;
use uuid::Uuid;

/// Version-independent internal packet representation.
/// Protocol adapters convert between wire format and these.
#[derive(Debug, Clone)]
pub enum InternalPacket {
    // === Handshaking (serverbound) ===
    Handshake {
        protocol_version: i32,
        server_address: String,
        server_port: u16,
        next_state: i32,
    },

    // === Status ===
    StatusRequest,
    StatusResponse {
        json: String,
    },
    PingRequest {
        payload: i64,
    },
    PongResponse {
        payload: i64,
    },

    // === Login (serverbound) ===
    LoginStart {
        username: String,
    },

    // === Login (clientbound) ===
    LoginSuccess {
        uuid: Uuid,
        username: String,
    },

    // === Shared ===
    Disconnect {
        reason: ChatComponent,
    },

    /// Play-phase packet, or anything else this core does not decode.
    /// The taxonomy is declared but no record is decoded here; unknown
    /// Play IDs are logged and forwarded unchanged.
    Unknown {
        packet_id: i32,
        data: Vec<u8>,
    },
}
