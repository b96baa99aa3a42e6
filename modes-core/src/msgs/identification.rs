//! TC 1-4: aircraft identification and category.

use serde::Serialize;

use super::{FromFrame, SquitterHeader};
use crate::bits::me_field;
use crate::frame::ModeFrame;
use crate::types::{Result, CALLSIGN_CHARSET};

/// Identification and category message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    #[serde(flatten)]
    pub header: SquitterHeader,
    /// ME bits 6-8; meaning depends on the type code (category set)
    pub emitter_category: u8,
    /// Callsign with trailing padding removed
    pub callsign: String,
}

impl FromFrame for Identification {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(frame, &[1..=4], "identification message")?;

        // 8 characters, 6 bits each, from ME bit 9
        let callsign: String = (0..8)
            .map(|i| {
                let idx = me_field(me, 9 + i * 6, 6) as usize;
                CALLSIGN_CHARSET[idx] as char
            })
            .collect();

        Ok(Identification {
            header,
            emitter_category: me_field(me, 6, 3) as u8,
            callsign: callsign.trim_end().to_string(),
        })
    }
}

impl Identification {
    /// Category set letter: TC 4 = A, 3 = B, 2 = C, 1 = D.
    pub fn category_set(&self) -> char {
        match self.header.type_code() {
            4 => 'A',
            3 => 'B',
            2 => 'C',
            _ => 'D',
        }
    }

    /// Emitter category description per DO-260B.
    pub fn category_description(&self) -> &'static str {
        match (self.category_set(), self.emitter_category) {
            (_, 0) => "No category information",
            ('A', 1) => "Light (< 15500 lbs)",
            ('A', 2) => "Small (15500 to 75000 lbs)",
            ('A', 3) => "Large (75000 to 300000 lbs)",
            ('A', 4) => "High vortex large",
            ('A', 5) => "Heavy (> 300000 lbs)",
            ('A', 6) => "High performance (> 5g acceleration and > 400 kts)",
            ('A', 7) => "Rotorcraft",
            ('B', 1) => "Glider / sailplane",
            ('B', 2) => "Lighter-than-air",
            ('B', 3) => "Parachutist / skydiver",
            ('B', 4) => "Ultralight / hang-glider / paraglider",
            ('B', 6) => "Unmanned aerial vehicle",
            ('B', 7) => "Space / trans-atmospheric vehicle",
            ('C', 1) => "Surface vehicle - emergency",
            ('C', 2) => "Surface vehicle - service",
            ('C', 3) => "Point obstacle",
            ('C', 4) => "Cluster obstacle",
            ('C', 5) => "Line obstacle",
            _ => "Reserved",
        }
    }

    /// True if the callsign contains only characters of the ADS-B charset.
    pub fn has_valid_callsign(&self) -> bool {
        !self.callsign.is_empty() && !self.callsign.contains('#')
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SquitterSource;
    use crate::types::{icao_to_string, ModesError};

    #[test]
    fn test_decode_identification_klm() {
        let msg = Identification::from_hex("8D4840D6202CC371C32CE0576098", 1.0).unwrap();
        assert_eq!(msg.callsign, "KLM1023");
        assert_eq!(icao_to_string(&msg.header.icao()), "4840D6");
        assert_eq!(msg.header.type_code(), 4);
        assert_eq!(msg.header.source(), SquitterSource::AdsB);
        assert_eq!(msg.emitter_category, 0);
        assert_eq!(msg.category_set(), 'A');
        assert_eq!(msg.category_description(), "No category information");
        assert!(msg.has_valid_callsign());
    }

    #[test]
    fn test_decode_identification_ezy() {
        let msg = Identification::from_hex("8D406B902015A678D4D220AA4BDA", 1.0).unwrap();
        assert_eq!(msg.callsign, "EZY85MH");
        assert_eq!(msg.header.icao_hex(), "406B90");
    }

    #[test]
    fn test_category_description() {
        // Same frame with category 5 in set A
        let msg = Identification::from_hex("8D4840D6252CC371C32CE0576098", 1.0).unwrap();
        assert_eq!(msg.emitter_category, 5);
        assert_eq!(msg.category_description(), "Heavy (> 300000 lbs)");
    }

    #[test]
    fn test_identification_rejects_position() {
        let err = Identification::from_hex("8D40621D58C382D690C8AC2863A7", 1.0).unwrap_err();
        assert!(matches!(err, ModesError::BadFormat(_)));
    }

    #[test]
    fn test_identification_rejects_surveillance_reply() {
        assert!(Identification::from_hex("20000F1F684A6C", 1.0).is_err());
    }
}
