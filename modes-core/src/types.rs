//! Shared types, error enum, and small helpers for modes-core.

use serde::Serializer;
use thiserror::Error;

/// All errors produced by modes-core.
#[derive(Debug, Error)]
pub enum ModesError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid frame length: expected {expected} bits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("bad format: {0}")]
    BadFormat(String),
    #[error("unspecified format: {0}")]
    UnspecifiedFormat(String),
    #[error("ambiguous position: {0}")]
    AmbiguousPosition(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

impl ModesError {
    /// True for malformed input: bad hex, wrong length, or a DF/TC that does
    /// not match the requested message type.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ModesError::InvalidHex(_) | ModesError::InvalidLength { .. } | ModesError::BadFormat(_)
        )
    }

    /// True when the frame was recognized but its format is reserved or not
    /// decoded. Callers usually skip these rather than count them as corrupt.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, ModesError::UnspecifiedFormat(_))
    }
}

pub type Result<T> = std::result::Result<T, ModesError>;

// ---------------------------------------------------------------------------
// Downlink Format metadata
// ---------------------------------------------------------------------------

/// Metadata for a Downlink Format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfInfo {
    pub name: &'static str,
    pub bits: usize,
}

/// Downlink Formats with an assigned meaning.
pub const DF_TABLE: &[(u8, DfInfo)] = &[
    (
        0,
        DfInfo {
            name: "Short air-air surveillance (ACAS)",
            bits: 56,
        },
    ),
    (
        4,
        DfInfo {
            name: "Surveillance altitude reply",
            bits: 56,
        },
    ),
    (
        5,
        DfInfo {
            name: "Surveillance identity reply",
            bits: 56,
        },
    ),
    (
        11,
        DfInfo {
            name: "All-call reply",
            bits: 56,
        },
    ),
    (
        16,
        DfInfo {
            name: "Long air-air surveillance (ACAS)",
            bits: 112,
        },
    ),
    (
        17,
        DfInfo {
            name: "ADS-B extended squitter",
            bits: 112,
        },
    ),
    (
        18,
        DfInfo {
            name: "Extended squitter / non-transponder (TIS-B, ADS-R)",
            bits: 112,
        },
    ),
    (
        19,
        DfInfo {
            name: "Military extended squitter",
            bits: 112,
        },
    ),
    (
        20,
        DfInfo {
            name: "Comm-B altitude reply",
            bits: 112,
        },
    ),
    (
        21,
        DfInfo {
            name: "Comm-B identity reply",
            bits: 112,
        },
    ),
    (
        24,
        DfInfo {
            name: "Comm-D extended length message",
            bits: 112,
        },
    ),
];

/// Look up DF metadata. DF 25-31 share the Comm-D entry since only the
/// first two bits identify an ELM. Returns `None` for unassigned DFs.
pub fn df_info(df: u8) -> Option<&'static DfInfo> {
    let df = if df >= 24 { 24 } else { df };
    DF_TABLE
        .iter()
        .find(|(d, _)| *d == df)
        .map(|(_, info)| info)
}

/// Frame length in bits implied by a downlink format: the first DF bit
/// selects long (112) or short (56) messages.
pub fn expected_bits(df: u8) -> usize {
    if df >= 16 {
        112
    } else {
        56
    }
}

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// 3-byte ICAO address. Stored as raw bytes to avoid per-frame String allocation.
pub type Icao = [u8; 3];

/// Format ICAO address as 6-char uppercase hex string.
pub fn icao_to_string(icao: &Icao) -> String {
    format!("{:02X}{:02X}{:02X}", icao[0], icao[1], icao[2])
}

/// Serialize an ICAO address as its hex string (for `#[serde(serialize_with)]`).
pub fn serialize_icao<S: Serializer>(icao: &Icao, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&icao_to_string(icao))
}

/// Parse a 6-char hex string into an ICAO address.
pub fn icao_from_hex(hex: &str) -> Option<Icao> {
    if hex.len() != 6 {
        return None;
    }
    let val = u32::from_str_radix(hex, 16).ok()?;
    Some([
        ((val >> 16) & 0xFF) as u8,
        ((val >> 8) & 0xFF) as u8,
        (val & 0xFF) as u8,
    ])
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

/// Serialize raw bytes as an uppercase hex string.
pub fn serialize_hex<S: Serializer>(data: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex_encode(data))
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ADS-B callsign character set
// ---------------------------------------------------------------------------

/// ADS-B character set for callsign encoding (6 bits per character).
pub const CALLSIGN_CHARSET: &[u8; 64] =
    b"#ABCDEFGHIJKLMNOPQRSTUVWXYZ##### ###############0123456789######";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
