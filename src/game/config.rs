use chess::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::game::utils::{color_from_name, color_name};

pub const DEFAULT_TIME_CONTROL_SECS: u64 = 600;
pub const DEFAULT_SEARCH_DEPTH: u32 = 3;

/// Settings passed to the engine bridge when the opponent is a computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// UCI "Skill Level" (0-20); `None` leaves the engine at full strength.
    #[serde(default)]
    pub target_strength: Option<u8>,
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            target_strength: None,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

fn default_search_depth() -> u32 {
    DEFAULT_SEARCH_DEPTH
}

/// Who sits across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opponent {
    /// Another peer reached through the relay.
    #[default]
    Remote,
    /// The engine bridge plays the other color.
    Engine(EngineSettings),
    /// Both sides are played on this peer.
    Hotseat,
}

/// How a peer treats position snapshots arriving from the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Load the sender's FEN outright.
    #[default]
    Trusting,
    /// Require the move descriptor, replay it locally and compare positions.
    Verifying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(
        default = "default_orientation",
        serialize_with = "serialize_color",
        deserialize_with = "deserialize_color"
    )]
    pub orientation: Color,
    #[serde(default)]
    pub opponent: Opponent,
    #[serde(default = "default_time_control")]
    pub time_control_secs: u64,
    #[serde(default)]
    pub trust: TrustPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            orientation: Color::White,
            opponent: Opponent::Remote,
            time_control_secs: DEFAULT_TIME_CONTROL_SECS,
            trust: TrustPolicy::Trusting,
        }
    }
}

impl SessionConfig {
    /// Whether a locally originated move of `color`'s pieces is allowed.
    pub fn local_controls(&self, color: Color) -> bool {
        match self.opponent {
            Opponent::Hotseat => true,
            Opponent::Remote | Opponent::Engine(_) => color == self.orientation,
        }
    }

    /// Color played by the engine, if any.
    pub fn engine_color(&self) -> Option<Color> {
        match self.opponent {
            Opponent::Engine(_) => Some(!self.orientation),
            _ => None,
        }
    }
}

fn default_orientation() -> Color {
    Color::White
}

fn default_time_control() -> u64 {
    DEFAULT_TIME_CONTROL_SECS
}

fn serialize_color<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(color_name(*color))
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
    let name = String::deserialize(deserializer)?;
    color_from_name(&name)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown color: {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn parses_engine_opponent() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"orientation":"black","opponent":{"kind":"engine","target_strength":5},"trust":"verifying"}"#,
        )
        .unwrap();
        assert_eq!(config.orientation, Color::Black);
        assert_eq!(config.engine_color(), Some(Color::White));
        assert_eq!(
            config.opponent,
            Opponent::Engine(EngineSettings {
                target_strength: Some(5),
                search_depth: DEFAULT_SEARCH_DEPTH,
            })
        );
        assert_eq!(config.trust, TrustPolicy::Verifying);
        assert!(config.local_controls(Color::Black));
        assert!(!config.local_controls(Color::White));
    }

    #[test]
    fn hotseat_controls_both_sides() {
        let config = SessionConfig {
            opponent: Opponent::Hotseat,
            ..SessionConfig::default()
        };
        assert!(config.local_controls(Color::White));
        assert!(config.local_controls(Color::Black));
    }
}
