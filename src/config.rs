use std::path::PathBuf;

use clap::Parser;

use crate::game::config::{EngineSettings, DEFAULT_SEARCH_DEPTH};

/// Relay server and engine endpoint for peer-to-peer chess sessions.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess_relay", version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "CHESS_RELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "CHESS_RELAY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// UCI engine binary used for move suggestions
    #[arg(long, env = "CHESS_RELAY_ENGINE_PATH", default_value = "stockfish")]
    pub engine_path: PathBuf,

    /// Search depth when a request does not give one
    #[arg(long, env = "CHESS_RELAY_ENGINE_DEPTH", default_value_t = DEFAULT_SEARCH_DEPTH)]
    pub engine_depth: u32,

    /// Number of engine worker threads
    #[arg(long, env = "CHESS_RELAY_ENGINE_WORKERS", default_value_t = 2)]
    pub engine_workers: usize,

    /// UCI "Skill Level" (0-20); full strength when omitted
    #[arg(long, env = "CHESS_RELAY_SKILL_LEVEL", value_parser = clap::value_parser!(u8).range(0..=20))]
    pub skill_level: Option<u8>,

    #[arg(long, env = "CHESS_RELAY_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            target_strength: self.skill_level,
            search_depth: self.engine_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::parse_from(["chess_relay"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.engine_depth, 3);
        assert_eq!(config.engine_settings().target_strength, None);
    }

    #[test]
    fn skill_level_is_bounded() {
        let config = ServerConfig::parse_from(["chess_relay", "--skill-level", "5", "--port", "9000"]);
        assert_eq!(config.engine_settings().target_strength, Some(5));
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 9000));
        assert!(ServerConfig::try_parse_from(["chess_relay", "--skill-level", "42"]).is_err());
    }
}
