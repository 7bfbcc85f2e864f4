//! Start-up options read from the page's query string.
//!
//! `?rotation=black&speed=150&game=abc` flips the board, shortens move
//! animations to 150 ms and subscribes to the sync game `abc`.

use crate::error::ConfigError;
use crate::tile::BoardRotation;
use crate::timeline::Millis;

pub const DEFAULT_ANIMATION_MS: Millis = 300.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub rotation: BoardRotation,
    pub animation_ms: Millis,
    pub game_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rotation: BoardRotation::WhiteBottom,
            animation_ms: DEFAULT_ANIMATION_MS,
            game_key: None,
        }
    }
}

impl Config {
    pub fn from_query(search: &str) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        if let Some(v) = get_query_param(search, "rotation") {
            config.rotation = match v.as_str() {
                "white" => BoardRotation::WhiteBottom,
                "black" => BoardRotation::BlackBottom,
                _ => return Err(ConfigError::InvalidValue { key: "rotation", value: v }),
            };
        }
        if let Some(v) = get_query_param(search, "speed") {
            config.animation_ms = match v.parse::<Millis>() {
                Ok(ms) if ms.is_finite() && ms >= 0.0 => ms,
                _ => return Err(ConfigError::InvalidValue { key: "speed", value: v }),
            };
        }
        config.game_key = get_query_param(search, "game").filter(|k| !k.is_empty());
        Ok(config)
    }

    /// Like [`Config::from_query`], but a bad value only costs the defaults.
    pub fn from_query_or_default(search: &str) -> Config {
        Config::from_query(search).unwrap_or_else(|e| {
            log::warn!("{e}, using default settings");
            Config::default()
        })
    }
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    s.split('&').find_map(|pair| {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        (k == key).then(|| url_decode(v))
    })
}

fn url_decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_encoding::percent_decode_str(&s)
        .decode_utf8()
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.clone())
}
