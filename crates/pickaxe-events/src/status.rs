use pickaxe_types::ChatComponent;
use serde_json::{Map, Value};
use uuid::Uuid;

/// `version` field of a Status Response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: String,
    pub protocol: i32,
}

/// One entry of the `players.sample` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSample {
    pub name: String,
    pub id: Uuid,
}

/// `players` field of a Status Response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayersInfo {
    pub max: i32,
    pub online: i32,
    pub sample: Option<Vec<PlayerSample>>,
}

/// The full Status Response payload, returned by a bound
/// [`crate::Hooks::on_request_status`] and encoded as the Response packet's
/// JSON string field.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload {
    pub version: VersionInfo,
    pub players: PlayersInfo,
    pub description: ChatComponent,
    pub favicon: Option<String>,
}

impl StatusPayload {
    /// The minimal default synthesized when no hook is bound: protocol
    /// version filled in, everything else empty.
    pub fn default_for_protocol(protocol_version: i32) -> Self {
        Self {
            version: VersionInfo {
                name: String::new(),
                protocol: protocol_version,
            },
            players: PlayersInfo::default(),
            description: ChatComponent::text(""),
            favicon: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut version = Map::new();
        version.insert("name".into(), Value::String(self.version.name.clone()));
        version.insert(
            "protocol".into(),
            Value::Number(self.version.protocol.into()),
        );

        let mut players = Map::new();
        players.insert("max".into(), Value::Number(self.players.max.into()));
        players.insert("online".into(), Value::Number(self.players.online.into()));
        if let Some(ref sample) = self.players.sample {
            let entries = sample
                .iter()
                .map(|p| {
                    let mut m = Map::new();
                    m.insert("name".into(), Value::String(p.name.clone()));
                    m.insert("id".into(), Value::String(p.id.to_string()));
                    Value::Object(m)
                })
                .collect();
            players.insert("sample".into(), Value::Array(entries));
        }

        let mut root = Map::new();
        root.insert("version".into(), Value::Object(version));
        root.insert("players".into(), Value::Object(players));
        root.insert("description".into(), self.description.to_json());
        if let Some(ref favicon) = self.favicon {
            root.insert("favicon".into(), Value::String(favicon.clone()));
        }
        Value::Object(root)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_has_empty_description_and_no_sample() {
        let payload = StatusPayload::default_for_protocol(767);
        let json = payload.to_json();
        assert_eq!(json["version"]["protocol"], 767);
        assert!(json["players"].get("sample").is_none());
        assert!(json.get("favicon").is_none());
    }

    #[test]
    fn sample_is_present_when_set() {
        let mut payload = StatusPayload::default_for_protocol(767);
        payload.players.sample = Some(vec![PlayerSample {
            name: "Alice".into(),
            id: Uuid::nil(),
        }]);
        let json = payload.to_json();
        let sample = json["players"]["sample"].as_array().unwrap();
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0]["name"], "Alice");
        assert_eq!(sample[0]["id"], Uuid::nil().to_string());
    }

    // Scenario S1 from the spec: a status response whose payload decodes with
    // the right protocol version and a description that parses as chat.
    #[test]
    fn s1_status_payload_contains_protocol_and_decodable_description() {
        let payload = StatusPayload {
            version: VersionInfo {
                name: "1.21.1".into(),
                protocol: 756,
            },
            players: PlayersInfo {
                max: 20,
                online: 0,
                sample: None,
            },
            description: ChatComponent::text("A server"),
            favicon: None,
        };
        let json_string = payload.to_json_string();
        let value: Value = serde_json::from_str(&json_string).unwrap();
        assert_eq!(value["version"]["protocol"], 756);
        let description = ChatComponent::from_json(&value["description"]).unwrap();
        assert_eq!(description, ChatComponent::text("A server"));
    }
}
