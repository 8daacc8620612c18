//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use glam::Vec2;

use crate::game::movement::DEFAULT_SPEED;
use crate::scene::embed::DEFAULT_CHANNEL;
use crate::util::time::{DEFAULT_TICK_RATE, MAX_TICK_RATE};

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// WebSocket endpoint of the room server
    pub server_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Local movement speed in units per second
    pub player_speed: f32,
    /// Size of a participant's bounds
    pub avatar_size: Vec2,

    /// Room key submitted as soon as the connection is up
    pub room_key: Option<String>,
    /// Channel shown by the stream embed
    pub stream_channel: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let tick_rate: u32 = parse_or(&lookup, "TICK_RATE", DEFAULT_TICK_RATE)?;
        if !(1..=MAX_TICK_RATE).contains(&tick_rate) {
            return Err(ConfigError::Invalid {
                var: "TICK_RATE",
                value: tick_rate.to_string(),
            });
        }

        let player_speed = positive(
            parse_or(&lookup, "PLAYER_SPEED", DEFAULT_SPEED)?,
            "PLAYER_SPEED",
        )?;
        let avatar_size = Vec2::new(
            positive(parse_or(&lookup, "AVATAR_WIDTH", 29.0)?, "AVATAR_WIDTH")?,
            positive(parse_or(&lookup, "AVATAR_HEIGHT", 37.0)?, "AVATAR_HEIGHT")?,
        );

        Ok(Self {
            server_url: lookup("SERVER_URL")
                .unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            tick_rate,
            player_speed,
            avatar_size,

            room_key: lookup("ROOM_KEY")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            stream_channel: lookup("STREAM_CHANNEL")
                .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Finite and strictly positive
fn positive(value: f32, var: &'static str) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
