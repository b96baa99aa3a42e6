//! Mode S surveillance replies: ACAS, altitude/identity replies, all-call
//! replies, and military squitters.

use serde::Serialize;

use super::{expect_df, FromFrame};
use crate::altitude::{decode_ac13, decode_identity, is_metric_ac13};
use crate::bits;
use crate::frame::ModeFrame;
use crate::types::{serialize_hex, serialize_icao, Icao, ModesError, Result};

/// Flight status (FS) field of DF4/5/20/21 replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlightStatus(pub u8);

impl FlightStatus {
    pub fn has_alert(self) -> bool {
        (2..=4).contains(&self.0)
    }

    /// Special position identification pulse active.
    pub fn has_spi(self) -> bool {
        self.0 == 4 || self.0 == 5
    }

    pub fn is_on_ground(self) -> bool {
        self.0 == 1 || self.0 == 3
    }

    pub fn is_airborne(self) -> bool {
        self.0 == 0 || self.0 == 2
    }
}

/// Utility message (UM) field: interrogator identifier and designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UtilityMessage(pub u8);

impl UtilityMessage {
    /// IIS subfield: identifier of the interrogator holding a reservation.
    pub fn interrogator_identifier(self) -> u8 {
        (self.0 >> 2) & 0x0F
    }

    /// IDS subfield: kind of reservation (Comm-B, Comm-C, Comm-D).
    pub fn identifier_designator(self) -> u8 {
        self.0 & 0x03
    }
}

/// FS, DR, UM and the 13-bit AC/ID code shared by DF4/5/20/21.
pub(crate) fn reply_fields(frame: &ModeFrame) -> (FlightStatus, u8, UtilityMessage, u16) {
    let payload = frame.payload();
    let downlink_request = payload[0] >> 3;
    let utility = ((payload[0] & 0x07) << 3) | (payload[1] >> 5);
    (
        FlightStatus(frame.first_field()),
        downlink_request,
        UtilityMessage(utility),
        thirteen_bit_code(payload),
    )
}

/// Low 13 bits of payload bytes 1-2 (AC or ID field).
pub(crate) fn thirteen_bit_code(payload: &[u8]) -> u16 {
    (u16::from(payload[1]) << 8 | u16::from(payload[2])) & 0x1FFF
}

/// SL and RI fields shared by DF0 and DF16.
fn acas_fields(payload: &[u8]) -> (u8, u8) {
    let sensitivity_level = payload[0] >> 5;
    let reply_information = ((payload[0] & 0x07) << 1) | (payload[1] >> 7);
    (sensitivity_level, reply_information)
}

/// Maximum cruising true airspeed category from the RI field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirspeedBound {
    /// At most this many knots.
    AtMost(u32),
    /// More than this many knots.
    Above(u32),
}

// ---------------------------------------------------------------------------
// DF0: short air-air surveillance
// ---------------------------------------------------------------------------

/// DF0 short air-air surveillance (ACAS) reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortAcas {
    pub airborne: bool,
    pub cross_link_capable: bool,
    pub sensitivity_level: u8,
    pub reply_information: u8,
    pub altitude_code: u16,
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for ShortAcas {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[0], "short ACAS reply")?;
        let payload = frame.payload();
        let (sensitivity_level, reply_information) = acas_fields(payload);
        Ok(ShortAcas {
            airborne: frame.first_field() & 0x04 == 0,
            cross_link_capable: frame.first_field() & 0x02 != 0,
            sensitivity_level,
            reply_information,
            altitude_code: thirteen_bit_code(payload),
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl ShortAcas {
    pub fn altitude_ft(&self) -> Option<i32> {
        decode_ac13(self.altitude_code)
    }

    pub fn is_metric(&self) -> bool {
        is_metric_ac13(self.altitude_code)
    }

    pub fn has_operating_acas(&self) -> bool {
        self.reply_information != 0
    }

    /// Only meaningful for replies to interrogations that asked for it
    /// (RI 8-14).
    pub fn maximum_airspeed(&self) -> Option<AirspeedBound> {
        max_airspeed(self.reply_information)
    }

    /// `None` when the RI value does not say.
    pub fn has_vertical_resolution_capability(&self) -> Option<bool> {
        match self.reply_information {
            0 | 1 => Some(false),
            3 | 4 => Some(true),
            _ => None,
        }
    }

    /// `None` when the RI value does not say.
    pub fn has_horizontal_resolution_capability(&self) -> Option<bool> {
        match self.reply_information {
            0 | 1 | 3 => Some(false),
            4 => Some(true),
            _ => None,
        }
    }
}

fn max_airspeed(reply_information: u8) -> Option<AirspeedBound> {
    match reply_information {
        9 => Some(AirspeedBound::AtMost(75)),
        10 => Some(AirspeedBound::AtMost(150)),
        11 => Some(AirspeedBound::AtMost(300)),
        12 => Some(AirspeedBound::AtMost(600)),
        13 => Some(AirspeedBound::AtMost(1200)),
        14 => Some(AirspeedBound::Above(1200)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// DF4 / DF5: surveillance replies
// ---------------------------------------------------------------------------

/// DF4 surveillance altitude reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AltitudeReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: UtilityMessage,
    pub altitude_code: u16,
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for AltitudeReply {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[4], "surveillance altitude reply")?;
        let (flight_status, downlink_request, utility_message, altitude_code) =
            reply_fields(frame);
        Ok(AltitudeReply {
            flight_status,
            downlink_request,
            utility_message,
            altitude_code,
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl AltitudeReply {
    pub fn altitude_ft(&self) -> Option<i32> {
        decode_ac13(self.altitude_code)
    }

    pub fn is_metric(&self) -> bool {
        is_metric_ac13(self.altitude_code)
    }
}

/// DF5 surveillance identity reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifyReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: UtilityMessage,
    pub identity_code: u16,
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for IdentifyReply {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[5], "surveillance identity reply")?;
        let (flight_status, downlink_request, utility_message, identity_code) =
            reply_fields(frame);
        Ok(IdentifyReply {
            flight_status,
            downlink_request,
            utility_message,
            identity_code,
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl IdentifyReply {
    /// 4-digit squawk.
    pub fn identity(&self) -> String {
        decode_identity(self.identity_code)
    }
}

// ---------------------------------------------------------------------------
// DF11: all-call reply
// ---------------------------------------------------------------------------

/// DF11 all-call reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllCallReply {
    pub capability: u8,
    #[serde(serialize_with = "serialize_icao")]
    pub icao: Icao,
    /// Parity/interrogator identifier (PI) field.
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for AllCallReply {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[11], "all-call reply")?;
        let icao = frame
            .announced_address()
            .ok_or_else(|| ModesError::BadFormat("all-call reply without address".into()))?;
        Ok(AllCallReply {
            capability: frame.first_field(),
            icao,
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl AllCallReply {
    /// Air/ground state from the capability field, if it tells.
    pub fn is_airborne(&self) -> Option<bool> {
        match self.capability {
            4 => Some(false),
            5 => Some(true),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DF16: long air-air surveillance
// ---------------------------------------------------------------------------

/// DF16 long air-air surveillance (ACAS) reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongAcas {
    pub airborne: bool,
    pub sensitivity_level: u8,
    pub reply_information: u8,
    pub altitude_code: u16,
    /// 56-bit MV field (ACAS coordination data)
    #[serde(serialize_with = "serialize_hex")]
    pub mv: [u8; 7],
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for LongAcas {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[16], "long ACAS reply")?;
        let payload = frame.payload();
        let (sensitivity_level, reply_information) = acas_fields(payload);
        let mv = frame.me_bytes()?;
        Ok(LongAcas {
            airborne: frame.first_field() & 0x04 == 0,
            sensitivity_level,
            reply_information,
            altitude_code: thirteen_bit_code(payload),
            mv,
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

impl LongAcas {
    pub fn altitude_ft(&self) -> Option<i32> {
        decode_ac13(self.altitude_code)
    }

    pub fn is_metric(&self) -> bool {
        is_metric_ac13(self.altitude_code)
    }

    pub fn maximum_airspeed(&self) -> Option<AirspeedBound> {
        max_airspeed(self.reply_information)
    }

    /// MV carries a resolution advisory report (VDS = 3,0).
    pub fn is_resolution_advisory(&self) -> bool {
        self.mv[0] == 0x30
    }

    /// Active resolution advisories (ARA, 14 bits), if MV holds an RA.
    pub fn active_resolution_advisories(&self) -> Option<u16> {
        if !self.is_resolution_advisory() {
            return None;
        }
        let mv = bits::me_word(&self.mv).ok()?;
        Some(bits::me_field(mv, 9, 14) as u16)
    }
}

// ---------------------------------------------------------------------------
// DF19: military
// ---------------------------------------------------------------------------

/// DF19 squitter with a military application field (AF != 0).
///
/// The content is not standardized; the payload is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilitaryExtendedSquitter {
    pub application_field: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub message: Vec<u8>,
    pub parity: u32,
    pub timestamp: f64,
}

impl FromFrame for MilitaryExtendedSquitter {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        expect_df(frame, &[19], "military extended squitter")?;
        if frame.first_field() == 0 {
            return Err(ModesError::BadFormat(
                "DF19 with AF 0 is a military ADS-B squitter".into(),
            ));
        }
        Ok(MilitaryExtendedSquitter {
            application_field: frame.first_field(),
            message: frame.payload().to_vec(),
            parity: frame.parity(),
            timestamp: frame.timestamp(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
