//! Configuration file management for modes-decode.
//!
//! Reads/writes `~/.modes-decode/config.yaml` with the receiver reference
//! position, CPR pairing/range policy and the assumed ADS-B version.

use std::path::{Path, PathBuf};

use crate::accuracy::AdsbVersion;
use crate::cpr::{CprPolicy, Position};
use crate::types::{ModesError, Result};

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub receiver: ReceiverConfig,
    pub cpr: CprConfig,
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverConfig {
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CprConfig {
    pub max_airborne_interval: f64,
    pub max_surface_interval: f64,
    pub airborne_range_nm: f64,
    pub surface_range_nm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    pub adsb_version: AdsbVersion,
}

impl Default for Config {
    fn default() -> Self {
        let policy = CprPolicy::default();
        Config {
            receiver: ReceiverConfig {
                name: "default".into(),
                lat: None,
                lon: None,
            },
            cpr: CprConfig {
                max_airborne_interval: policy.max_airborne_interval,
                max_surface_interval: policy.max_surface_interval,
                airborne_range_nm: policy.airborne_range_nm,
                surface_range_nm: policy.surface_range_nm,
            },
            decoder: DecoderConfig {
                adsb_version: AdsbVersion::V0,
            },
        }
    }
}

impl Config {
    pub fn cpr_policy(&self) -> CprPolicy {
        CprPolicy {
            max_airborne_interval: self.cpr.max_airborne_interval,
            max_surface_interval: self.cpr.max_surface_interval,
            airborne_range_nm: self.cpr.airborne_range_nm,
            surface_range_nm: self.cpr.surface_range_nm,
        }
    }

    /// Receiver location, if both coordinates are set and valid.
    pub fn receiver_position(&self) -> Option<Position> {
        let pos = Position::new(self.receiver.lat?, self.receiver.lon?);
        pos.is_valid().then_some(pos)
    }
}

/// Get the config directory path (`~/.modes-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".modes-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.modes-decode/config.yaml`.
///
/// Returns default config if the file doesn't exist.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file())
}

/// Load config from an explicit path; missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Save config to `~/.modes-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text.
fn parse_config(text: &str) -> Result<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for (lineno, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            return Err(ModesError::Config(format!(
                "line {}: expected `key: value`",
                lineno + 1
            )));
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }
        let Some(section) = current_section.as_deref() else {
            continue;
        };

        let bad = |what: &str| {
            ModesError::Config(format!("line {}: invalid {what} `{val}`", lineno + 1))
        };
        match (section, key) {
            ("receiver", "name") => {
                if let Some(v) = parse_string_value(val) {
                    config.receiver.name = v;
                }
            }
            ("receiver", "lat") => config.receiver.lat = parse_float_value(val),
            ("receiver", "lon") => config.receiver.lon = parse_float_value(val),
            ("cpr", "max_airborne_interval") => {
                config.cpr.max_airborne_interval =
                    parse_float_value(val).ok_or_else(|| bad(key))?;
            }
            ("cpr", "max_surface_interval") => {
                config.cpr.max_surface_interval =
                    parse_float_value(val).ok_or_else(|| bad(key))?;
            }
            ("cpr", "airborne_range_nm") => {
                config.cpr.airborne_range_nm = parse_float_value(val).ok_or_else(|| bad(key))?;
            }
            ("cpr", "surface_range_nm") => {
                config.cpr.surface_range_nm = parse_float_value(val).ok_or_else(|| bad(key))?;
            }
            ("decoder", "adsb_version") => {
                config.decoder.adsb_version = val
                    .parse::<u8>()
                    .ok()
                    .and_then(AdsbVersion::from_number)
                    .ok_or_else(|| bad(key))?;
            }
            _ => {}
        }
    }

    Ok(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# modes-decode configuration".to_string(), String::new()];

    lines.push("receiver:".into());
    lines.push(format!("  name: \"{}\"", config.receiver.name));
    match config.receiver.lat {
        Some(v) => lines.push(format!("  lat: {v}")),
        None => lines.push("  lat: null".into()),
    }
    match config.receiver.lon {
        Some(v) => lines.push(format!("  lon: {v}")),
        None => lines.push("  lon: null".into()),
    }
    lines.push(String::new());

    lines.push("cpr:".into());
    lines.push(format!("  max_airborne_interval: {}", config.cpr.max_airborne_interval));
    lines.push(format!("  max_surface_interval: {}", config.cpr.max_surface_interval));
    lines.push(format!("  airborne_range_nm: {}", config.cpr.airborne_range_nm));
    lines.push(format!("  surface_range_nm: {}", config.cpr.surface_range_nm));
    lines.push(String::new());

    lines.push("decoder:".into());
    lines.push(format!("  adsb_version: {}", config.decoder.adsb_version.number()));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
