//! Comm-B replies (DF20/21), the common-usage GICB capability report
//! carried in them, and Comm-D extended length messages (DF24+).

use serde::Serialize;

use super::surveillance::{reply_fields, FlightStatus, UtilityMessage};
use super::{expect_df, FromFrame};
use crate::altitude::{decode_ac13, decode_identity, is_metric_ac13};
use crate::frame::ModeFrame;
use crate::types::{serialize_hex, ModesError, Result};

/// DF20 Comm-B altitude reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommBAltitudeReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: UtilityMessage,
    pub altitude_code: u16,
    /// 56-bit MB field; its register (BDS) is not identified by the reply
    #[serde(serialize_with = "serialize_hex")]
    pub mb: [u8; 7],
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for CommBAltitudeReply {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[20], "Comm-B altitude reply")?;
        let (flight_status, downlink_request, utility_message, altitude_code) =
            reply_fields(frame);
        Ok(CommBAltitudeReply {
            flight_status,
            downlink_request,
            utility_message,
            altitude_code,
            mb: frame.me_bytes()?,
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl CommBAltitudeReply {
    pub fn altitude_ft(&self) -> Option<i32> {
        decode_ac13(self.altitude_code)
    }

    pub fn is_metric(&self) -> bool {
        is_metric_ac13(self.altitude_code)
    }
}

/// DF21 Comm-B identity reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommBIdentifyReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: UtilityMessage,
    pub identity_code: u16,
    #[serde(serialize_with = "serialize_hex")]
    pub mb: [u8; 7],
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for CommBIdentifyReply {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[21], "Comm-B identity reply")?;
        let (flight_status, downlink_request, utility_message, identity_code) =
            reply_fields(frame);
        Ok(CommBIdentifyReply {
            flight_status,
            downlink_request,
            utility_message,
            identity_code,
            mb: frame.me_bytes()?,
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl CommBIdentifyReply {
    /// 4-digit squawk.
    pub fn identity(&self) -> String {
        decode_identity(self.identity_code)
    }
}

// ---------------------------------------------------------------------------
// BDS 1,7: common usage GICB capability report
// ---------------------------------------------------------------------------

/// Register name and MB bit (0-based) announcing its support.
const GICB_CAPABILITY_BITS: &[(&str, u32)] = &[
    ("BDS05", 0),
    ("BDS06", 1),
    ("BDS07", 2),
    ("BDS08", 3),
    ("BDS09", 4),
    ("BDS0A", 5),
    ("BDS20", 6),
    ("BDS21", 7),
    ("BDS40", 8),
    ("BDS41", 9),
    ("BDS42", 10),
    ("BDS43", 11),
    ("BDS44", 12),
    ("BDS45", 13),
    ("BDS48", 14),
    ("BDS50", 15),
    ("BDS51", 16),
    ("BDS52", 17),
    ("BDS53", 18),
    ("BDS54", 19),
    ("BDS55", 20),
    ("BDS56", 21),
    ("BDS5F", 22),
    ("BDS60", 23),
    ("BDSE1", 26),
    ("BDSE2", 27),
    ("BDSF1", 28),
];

/// Comm-B reply read as a BDS 1,7 capability report.
///
/// The MB field does not identify its register, so this is only decoded
/// when the caller knows (from the interrogation) that BDS 1,7 was asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonUsageGicbCapabilityReport {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: UtilityMessage,
    /// AC field, for DF20
    pub altitude_code: Option<u16>,
    /// ID field, for DF21
    pub identity_code: Option<u16>,
    /// Registers announced as supported, e.g. `"BDS40"`
    pub capabilities: Vec<&'static str>,
    pub timestamp: f64,
}

impl FromFrame for CommonUsageGicbCapabilityReport {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[20, 21], "Comm-B reply")?;
        let (flight_status, downlink_request, utility_message, code) = reply_fields(frame);
        let (altitude_code, identity_code) = if frame.df() == 20 {
            (Some(code), None)
        } else {
            (None, Some(code))
        };

        let mb = frame.me_word()?;
        let capabilities = GICB_CAPABILITY_BITS
            .iter()
            .filter(|(_, bit)| crate::bits::me_flag(mb, bit + 1))
            .map(|(name, _)| *name)
            .collect();

        Ok(CommonUsageGicbCapabilityReport {
            flight_status,
            downlink_request,
            utility_message,
            altitude_code,
            identity_code,
            capabilities,
            timestamp: frame.timestamp(),
        })
    }
}

impl CommonUsageGicbCapabilityReport {
    /// True if `register` (e.g. `"BDS60"`) is announced.
    pub fn supports(&self, register: &str) -> bool {
        self.capabilities
            .iter()
            .any(|name| name.eq_ignore_ascii_case(register))
    }
}

// ---------------------------------------------------------------------------
// DF24-31: Comm-D extended length message
// ---------------------------------------------------------------------------

/// DF24+ Comm-D extended length message segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommDExtendedLength {
    pub ack: bool,
    pub sequence_number: u8,
    /// 80-bit segment payload (MD field plus control bits)
    #[serde(serialize_with = "serialize_hex")]
    pub message: Vec<u8>,
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for CommDExtendedLength {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        if frame.df() < 24 {
            return Err(ModesError::BadFormat(format!(
                "DF{} is not an extended length message",
                frame.df()
            )));
        }
        Ok(CommDExtendedLength {
            ack: frame.df() & 0x02 != 0,
            sequence_number: ((frame.df() & 0x01) << 3) | frame.first_field(),
            message: frame.payload().to_vec(),
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comm_b_altitude_reply() {
        let msg = CommBAltitudeReply::from_hex("A0000F1F10000000000000ABCDEF", 1.0).unwrap();
        assert_eq!(msg.flight_status, FlightStatus(0));
        assert_eq!(msg.altitude_ft(), Some(23375));
        assert_eq!(msg.mb, [0x10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(msg.parity, 0xABCDEF);
    }

    #[test]
    fn test_comm_b_identify_reply() {
        let msg = CommBIdentifyReply::from_hex("AA00516D20000000000000492B80", 1.0).unwrap();
        assert_eq!(msg.identity(), "0356");
        assert_eq!(msg.mb[0], 0x20);
        assert!(CommBIdentifyReply::from_hex("A0000F1F10000000000000ABCDEF", 1.0).is_err());
    }

    #[test]
    fn test_gicb_capability_report() {
        // MB: BDS05, BDS09, BDS20 in byte 0; BDS40 in byte 1; BDS60 in byte 2; BDSF1 in byte 3
        let msg = CommonUsageGicbCapabilityReport::from_hex("A0000F1F8A800108000000ABCDEF", 1.0)
            .unwrap();
        assert_eq!(msg.altitude_code, Some(0x0F1F));
        assert_eq!(msg.identity_code, None);
        assert_eq!(
            msg.capabilities,
            vec!["BDS05", "BDS09", "BDS20", "BDS40", "BDS60", "BDSF1"]
        );
        assert!(msg.supports("BDS60"));
        assert!(msg.supports("bds40"));
        assert!(!msg.supports("BDS50"));
    }

    #[test]
    fn test_gicb_from_identity_reply() {
        let msg = CommonUsageGicbCapabilityReport::from_hex("AA00516D00000000000000492B80", 1.0)
            .unwrap();
        assert_eq!(msg.identity_code, Some(0x116D));
        assert!(msg.capabilities.is_empty());
        assert!(CommonUsageGicbCapabilityReport::from_hex("20000F1F684A6C", 1.0).is_err());
    }

    #[test]
    fn test_comm_d_extended_length() {
        // DF 27 (11011), first field 5
        let msg = CommDExtendedLength::from_hex("DD00112233445566778899AABBCC", 1.0).unwrap();
        assert!(msg.ack);
        assert_eq!(msg.sequence_number, 0b1101);
        assert_eq!(msg.message.len(), 10);
        assert_eq!(msg.message[0], 0x00);
        assert_eq!(msg.parity, 0xAABBCC);

        // DF 24, first field 0
        let msg = CommDExtendedLength::from_hex("C0000000000000000000000000AB", 1.0).unwrap();
        assert!(!msg.ack);
        assert_eq!(msg.sequence_number, 0);
    }
}
