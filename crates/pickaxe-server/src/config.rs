use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_motd")]
    pub motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: i32,
    #[serde(default)]
    pub upstream: Option<UpstreamConfig>,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_motd() -> String {
    "A Pickaxe Server".into()
}

fn default_max_players() -> i32 {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            motd: default_motd(),
            max_players: default_max_players(),
            upstream: None,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ServerConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// An upstream backend server to transparently proxy raw bytes to after
/// login. Only `Unencrypted` has an implemented connection method; the other
/// two variants reserve their tags without behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub connection_method: ConnectionMethod,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMethod {
    #[default]
    Unencrypted,
    Velocity,
    BungeeCord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_to_standard_port() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 25565);
        assert!(config.upstream.is_none());
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/pickaxe.toml")).unwrap();
        assert_eq!(config.bind, "0.0.0.0");
    }

    #[test]
    fn parses_upstream_from_toml() {
        let toml_str = r#"
            bind = "127.0.0.1"
            port = 25565

            [upstream]
            address = "127.0.0.1"
            port = 25566
            connection_method = "unencrypted"
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        let upstream = config.upstream.unwrap();
        assert_eq!(upstream.address, "127.0.0.1");
        assert_eq!(upstream.port, 25566);
        assert_eq!(upstream.connection_method, ConnectionMethod::Unencrypted);
    }

    #[test]
    fn upstream_defaults_connection_method_to_unencrypted() {
        let toml_str = r#"
            [upstream]
            address = "127.0.0.1"
            port = 25566
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.upstream.unwrap().connection_method,
            ConnectionMethod::Unencrypted
        );
    }
}
