//! Typed message variants.
//!
//! Each variant is built from a parsed [`ModeFrame`] by its [`FromFrame`]
//! implementation, which re-checks the DF (and type code for extended
//! squitters) and copies out the wire fields it needs. Accessors convert to
//! physical units on read.

pub mod commb;
pub mod identification;
pub mod position;
pub mod status;
pub mod surveillance;
pub mod velocity;

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::frame::{ModeFrame, SquitterSource};
use crate::types::{icao_to_string, serialize_icao, Icao, ModesError, Result};

/// Construction from a frame, a hex string, or raw bytes.
pub trait FromFrame: Sized {
    /// Decode from an already parsed frame.
    fn from_frame(frame: &ModeFrame) -> Result<Self>;

    /// Parse and decode a hex string.
    fn from_hex(hex_str: &str, timestamp: f64) -> Result<Self> {
        Self::from_frame(&ModeFrame::from_hex(hex_str, timestamp)?)
    }

    /// Parse and decode raw frame bytes.
    fn from_bytes(bytes: &[u8], timestamp: f64) -> Result<Self> {
        Self::from_frame(&ModeFrame::from_bytes(bytes, timestamp)?)
    }
}

/// Fail with a format error unless the frame's DF is one of `allowed`.
pub(crate) fn expect_df(frame: &ModeFrame, allowed: &[u8], what: &str) -> Result<()> {
    if allowed.contains(&frame.df()) {
        Ok(())
    } else {
        Err(ModesError::BadFormat(format!(
            "DF{} is not a {what}",
            frame.df()
        )))
    }
}

/// Fields shared by every extended squitter message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SquitterHeader {
    #[serde(serialize_with = "serialize_icao")]
    icao: Icao,
    source: SquitterSource,
    type_code: u8,
    timestamp: f64,
}

impl SquitterHeader {
    /// Validate that `frame` is an extended squitter whose type code lies in
    /// one of `type_codes`, and return the header plus the packed ME word.
    pub(crate) fn parse(
        frame: &ModeFrame,
        type_codes: &[RangeInclusive<u8>],
        what: &str,
    ) -> Result<(Self, u64)> {
        let source = frame.squitter_source().ok_or_else(|| {
            ModesError::BadFormat(format!(
                "DF{} CF/AF {} is not an extended squitter",
                frame.df(), frame.first_field()
            ))
        })?;
        let icao = frame
            .announced_address()
            .ok_or_else(|| ModesError::BadFormat(format!("DF{} has no address", frame.df())))?;
        let me = frame.me_word()?;
        let type_code = crate::bits::me_field(me, 1, 5) as u8;
        if !type_codes.iter().any(|range| range.contains(&type_code)) {
            return Err(ModesError::BadFormat(format!(
                "type code {type_code} is not a {what}"
            )));
        }
        Ok((
            SquitterHeader {
                icao,
                source,
                type_code,
                timestamp: frame.timestamp(),
            },
            me,
        ))
    }

    pub fn icao(&self) -> Icao {
        self.icao
    }

    pub fn source(&self) -> SquitterSource {
        self.source
    }

    /// ME type code, already checked against the message kind.
    pub fn type_code(&self) -> u8 {
        self.type_code
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Address as a 6-char hex string.
    pub fn icao_hex(&self) -> String {
        icao_to_string(&self.icao)
    }

    /// True for rebroadcasts (ADS-R) and ground-station traffic (TIS-B).
    pub fn is_rebroadcast(&self) -> bool {
        matches!(self.source, SquitterSource::AdsR | SquitterSource::TisB)
    }
}
