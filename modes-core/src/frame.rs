//! Parse raw hex strings or bytes into Mode S frame envelopes.
//!
//! Responsibilities:
//! - Validate length (56 or 112 bits) against the Downlink Format (DF)
//! - Split the frame into DF, first field, payload, and AP/PI parity field
//! - Expose the 56-bit ME/MB field of long frames
//! - Identify the squitter source of DF17/18/19 frames
//!
//! CRC checking and address recovery from the parity field are left to the
//! caller: a `ModeFrame` holds exactly the bits it was given.

use serde::Serialize;

use crate::bits;
use crate::types::{df_info, expected_bits, hex_decode, Icao, ModesError, Result};

// DFs that carry the announced address (AA) in bytes 1-3
const DF_EXPLICIT_ICAO: &[u8] = &[11, 17, 18, 19];

/// Who originated an extended squitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SquitterSource {
    /// DF17 from a Mode S transponder.
    AdsB,
    /// DF18 CF 0/1: ADS-B from a device without a transponder.
    AdsBNonTransponder,
    /// DF18 CF 2/5: fine TIS-B broadcast by a ground station, with an ICAO
    /// (CF 2) or anonymous (CF 5) address.
    TisB,
    /// DF18 CF 6: rebroadcast of a UAT or other-link ADS-B report.
    AdsR,
    /// DF19 AF 0: military ADS-B.
    Military,
}

// ---------------------------------------------------------------------------
// ModeFrame
// ---------------------------------------------------------------------------

/// A parsed Mode S frame.
///
/// Only built through [`ModeFrame::from_bytes`] / [`ModeFrame::from_hex`],
/// so the byte length always agrees with the DF.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeFrame {
    df: u8,
    first_field: u8,
    raw: Vec<u8>,
    msg_bits: usize,
    timestamp: f64,
}

impl ModeFrame {
    /// Build a frame from raw bytes (7 or 14).
    ///
    /// Fails with [`ModesError::InvalidLength`] if the length is wrong or
    /// does not match the DF (DF < 16 are short, DF >= 16 are long).
    pub fn from_bytes(bytes: &[u8], timestamp: f64) -> Result<Self> {
        let msg_bits = bytes.len() * 8;
        let Some(&first) = bytes.first() else {
            return Err(ModesError::InvalidLength {
                expected: 56,
                actual: 0,
            });
        };

        let df = (first >> 3) & 0x1F;
        let expected = expected_bits(df);
        if msg_bits != expected {
            return Err(ModesError::InvalidLength {
                expected,
                actual: msg_bits,
            });
        }

        Ok(ModeFrame {
            df,
            first_field: first & 0x07,
            raw: bytes.to_vec(),
            msg_bits,
            timestamp,
        })
    }

    /// Build a frame from a hex string (14 or 28 hex characters).
    pub fn from_hex(hex_str: &str, timestamp: f64) -> Result<Self> {
        let hex_str = hex_str.trim();
        let raw = hex_decode(hex_str).ok_or_else(|| ModesError::InvalidHex(hex_str.to_string()))?;
        ModeFrame::from_bytes(&raw, timestamp)
    }

    /// Downlink Format (0-31; 24-31 all denote Comm-D).
    pub fn df(&self) -> u8 {
        self.df
    }

    /// The 3 bits after the DF (CA, CF, AF, FS or VS/CC depending on DF).
    pub fn first_field(&self) -> u8 {
        self.first_field
    }

    /// Full message bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Message length in bits (56 or 112).
    pub fn msg_bits(&self) -> usize {
        self.msg_bits
    }

    /// Capture time in seconds, as supplied by the caller.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Human-readable Downlink Format name.
    pub fn df_name(&self) -> &'static str {
        df_info(self.df)
            .map(|info| info.name)
            .unwrap_or("Unknown")
    }

    /// True if this is a 112-bit (long) message.
    pub fn is_long(&self) -> bool {
        self.msg_bits == 112
    }

    /// Bytes between the first byte and the parity field
    /// (3 bytes for short frames, 10 for long ones).
    pub fn payload(&self) -> &[u8] {
        &self.raw[1..self.raw.len() - 3]
    }

    /// ME/MB/MV field (bytes 4-10, 56 bits) of a long frame.
    /// Returns empty slice for short frames.
    pub fn me(&self) -> &[u8] {
        if self.is_long() {
            &self.raw[4..11]
        } else {
            &[]
        }
    }

    /// ME/MB/MV field of a long frame as a fixed array.
    pub fn me_bytes(&self) -> Result<[u8; 7]> {
        self.me().try_into().map_err(|_| {
            ModesError::BadFormat(format!("DF{} has no 56-bit application field", self.df))
        })
    }

    /// ME/MB field packed for [`bits::me_field`] access.
    pub fn me_word(&self) -> Result<u64> {
        bits::me_word(&self.me_bytes()?)
    }

    /// 24-bit address/parity (AP) or parity/interrogator (PI) field.
    pub fn parity(&self) -> u32 {
        let n = self.raw.len();
        u32::from(self.raw[n - 3]) << 16 | u32::from(self.raw[n - 2]) << 8 | u32::from(self.raw[n - 1])
    }

    /// Address announced in clear in DF11/17/18/19 frames.
    pub fn announced_address(&self) -> Option<Icao> {
        if DF_EXPLICIT_ICAO.contains(&self.df) {
            Some([self.raw[1], self.raw[2], self.raw[3]])
        } else {
            None
        }
    }

    /// True for frames whose ME field follows the extended squitter layout:
    /// DF17, DF18 with an ADS-B-like CF, and DF19 with AF 0.
    pub fn is_extended_squitter(&self) -> bool {
        self.squitter_source().is_some()
    }

    /// Originator of an extended squitter. `None` for other DFs, for DF18
    /// control fields whose ME layout is not ADS-B (3 coarse TIS-B, 4
    /// management, 7 reserved), and for military DF19 application fields
    /// other than 0.
    pub fn squitter_source(&self) -> Option<SquitterSource> {
        match (self.df, self.first_field) {
            (17, _) => Some(SquitterSource::AdsB),
            (18, 0 | 1) => Some(SquitterSource::AdsBNonTransponder),
            (18, 2 | 5) => Some(SquitterSource::TisB),
            (18, 6) => Some(SquitterSource::AdsR),
            (19, 0) => Some(SquitterSource::Military),
            _ => None,
        }
    }

    /// ADS-B Type Code (first 5 bits of ME field). None for non-ADS-B.
    pub fn type_code(&self) -> Option<u8> {
        if !self.is_extended_squitter() {
            return None;
        }
        Some((self.raw[4] >> 3) & 0x1F)
    }

    /// ME bits 6-8: subtype for TC 19/28/29/31, emitter category for TC 1-4.
    pub fn subtype(&self) -> Option<u8> {
        if !self.is_extended_squitter() {
            return None;
        }
        Some(self.raw[4] & 0x07)
    }
}

/// Parse a hex string into a ModeFrame.
pub fn parse_frame(hex_str: &str, timestamp: f64) -> Result<ModeFrame> {
    ModeFrame::from_hex(hex_str, timestamp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::icao_to_string;

    #[test]
    fn test_parse_df17_identification() {
        let frame = parse_frame("8D4840D6202CC371C32CE0576098", 1.0).unwrap();
        assert_eq!(frame.df, 17);
        assert_eq!(frame.first_field, 5);
        assert_eq!(icao_to_string(&frame.announced_address().unwrap()), "4840D6");
        assert_eq!(frame.msg_bits, 112);
        assert_eq!(frame.timestamp, 1.0);
        assert!(frame.is_long());
        assert_eq!(frame.squitter_source(), Some(SquitterSource::AdsB));
    }

    #[test]
    fn test_parse_df17_position() {
        let frame = parse_frame("8D40621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(frame.df, 17);
        assert_eq!(icao_to_string(&frame.announced_address().unwrap()), "40621D");
        assert_eq!(frame.type_code(), Some(11));
    }

    #[test]
    fn test_parse_df17_velocity() {
        let frame = parse_frame("8D485020994409940838175B284F", 1.0).unwrap();
        assert_eq!(frame.df, 17);
        assert_eq!(icao_to_string(&frame.announced_address().unwrap()), "485020");
        assert_eq!(frame.type_code(), Some(19));
        assert_eq!(frame.subtype(), Some(1));
    }

    #[test]
    fn test_parse_lowercase_and_whitespace() {
        let frame = parse_frame("  8d4840d6202cc371c32ce0576098\n", 0.0).unwrap();
        assert_eq!(frame.df, 17);
    }

    #[test]
    fn test_parse_invalid_length() {
        assert!(matches!(
            parse_frame("8D4840D6", 0.0),
            Err(ModesError::InvalidLength { .. })
        ));
        assert!(matches!(
            parse_frame("", 0.0),
            Err(ModesError::InvalidLength { actual: 0, .. })
        ));
    }

    #[test]
    fn test_parse_df_length_mismatch() {
        // DF17 truncated to 56 bits
        let err = parse_frame("8D4840D6202CC3", 0.0).unwrap_err();
        assert!(matches!(
            err,
            ModesError::InvalidLength {
                expected: 112,
                actual: 56
            }
        ));
        // DF4 padded to 112 bits
        assert!(parse_frame("20000F1F684A6C00000000000000", 0.0).is_err());
    }

    #[test]
    fn test_parse_invalid_hex() {
        assert!(matches!(
            parse_frame("ZZZZZZZZZZZZZZ", 0.0),
            Err(ModesError::InvalidHex(_))
        ));
        assert!(parse_frame("8D4840D6202CC371C32CE057609", 0.0).is_err());
    }

    #[test]
    fn test_payload_and_parity() {
        let frame = parse_frame("8D4840D6202CC371C32CE0576098", 1.0).unwrap();
        assert_eq!(frame.payload().len(), 10);
        assert_eq!(frame.payload()[0], 0x48);
        assert_eq!(frame.parity(), 0x576098);

        let short = parse_frame("5D4840D6ABCDEF", 1.0).unwrap();
        assert_eq!(short.df, 11);
        assert_eq!(short.payload(), &[0x48, 0x40, 0xD6]);
        assert_eq!(short.parity(), 0xABCDEF);
        assert!(short.me().is_empty());
        assert!(short.me_word().is_err());
    }

    #[test]
    fn test_me_field() {
        let frame = parse_frame("8D4840D6202CC371C32CE0576098", 1.0).unwrap();
        assert_eq!(frame.me(), &[0x20, 0x2C, 0xC3, 0x71, 0xC3, 0x2C, 0xE0]);
        assert_eq!(frame.me_word().unwrap(), 0x202CC371C32CE0);
    }

    #[test]
    fn test_squitter_sources() {
        // DF18 CF6 (ADS-R) carrying the same ME as the DF17 position frame
        let frame = parse_frame("9640621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(frame.df, 18);
        assert_eq!(frame.squitter_source(), Some(SquitterSource::AdsR));
        assert_eq!(frame.type_code(), Some(11));

        let tisb = parse_frame("9240621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(tisb.squitter_source(), Some(SquitterSource::TisB));

        // fine TIS-B with an anonymous address uses the ADS-B layout
        let anon = parse_frame("9540621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(anon.squitter_source(), Some(SquitterSource::TisB));
        assert_eq!(anon.type_code(), Some(11));

        // coarse TIS-B has its own layout
        let coarse = parse_frame("9340621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(coarse.squitter_source(), None);
        assert_eq!(coarse.type_code(), None);

        let mgmt = parse_frame("9440621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(mgmt.squitter_source(), None);
        assert_eq!(mgmt.type_code(), None);

        let mil = parse_frame("9940621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(mil.df, 19);
        assert_eq!(mil.squitter_source(), None);
    }

    #[test]
    fn test_accessors_match_parsed_bytes() {
        let frame = parse_frame("8D4840D6202CC371C32CE0576098", 3.5).unwrap();
        assert_eq!(frame.df(), 17);
        assert_eq!(frame.first_field(), 5);
        assert_eq!(frame.msg_bits(), 112);
        assert_eq!(frame.raw().len(), 14);
        assert_eq!(frame.timestamp(), 3.5);
        assert_eq!(frame.me_bytes().unwrap(), [0x20, 0x2C, 0xC3, 0x71, 0xC3, 0x2C, 0xE0]);

        let short = parse_frame("5D4840D6ABCDEF", 1.0).unwrap();
        assert!(matches!(short.me_bytes(), Err(ModesError::BadFormat(_))));
    }

    #[test]
    fn test_no_announced_address_for_replies() {
        let frame = parse_frame("20000F1F684A6C", 1.0).unwrap();
        assert_eq!(frame.df, 4);
        assert_eq!(frame.announced_address(), None);
        assert_eq!(frame.type_code(), None);
    }

    #[test]
    fn test_comm_d_frame() {
        // DF24 family: first two bits 11
        let frame = parse_frame("C0000000000000000000000000AB", 1.0).unwrap();
        assert_eq!(frame.df, 24);
        assert_eq!(frame.df_name(), "Comm-D extended length message");
        let frame = parse_frame("F8000000000000000000000000AB", 1.0).unwrap();
        assert_eq!(frame.df, 31);
        assert_eq!(frame.df_name(), "Comm-D extended length message");
    }
}
