//! Route Mode S frames to their typed message.
//!
//! Handles all Downlink Formats and ES Type Codes:
//! - DF0/16:        Short and long air-air surveillance (ACAS)
//! - DF4/5:         Surveillance altitude and identity replies
//! - DF11:          All-call reply
//! - DF20/21:       Comm-B altitude and identity replies
//! - DF24+:         Comm-D extended length messages
//! - DF17/18/19 ES: TC 1-4 identification, TC 5-8 surface position,
//!   TC 0/9-18/20-22 airborne position, TC 19 velocity, TC 28 aircraft
//!   status, TC 29 target state, TC 31 operational status
//! - DF19 AF 1-7:   Military extended squitter (not decoded further)
//!
//! Everything else is reported as [`ModesError::UnspecifiedFormat`].

use serde::Serialize;
use tracing::debug;

use crate::accuracy::AdsbVersion;
use crate::bits::me_field;
use crate::frame::ModeFrame;
use crate::msgs::commb::{CommBAltitudeReply, CommBIdentifyReply, CommDExtendedLength};
use crate::msgs::identification::Identification;
use crate::msgs::position::{AirbornePosition, SurfacePosition};
use crate::msgs::status::{
    AcasResolutionAdvisory, EmergencyStatus, OperationalStatus, TargetStateAndStatus,
};
use crate::msgs::surveillance::{
    AllCallReply, AltitudeReply, IdentifyReply, LongAcas, MilitaryExtendedSquitter, ShortAcas,
};
use crate::msgs::velocity::{AirspeedHeading, VelocityOverGround};
use crate::msgs::FromFrame;
use crate::types::{Icao, ModesError, Result};

/// Message kind selected from DF, first field, type code and subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VariantTag {
    ShortAcas,
    AltitudeReply,
    IdentifyReply,
    AllCallReply,
    LongAcas,
    CommBAltitudeReply,
    CommBIdentifyReply,
    CommDExtendedLength,
    MilitaryExtendedSquitter,
    Identification,
    SurfacePosition,
    AirbornePosition,
    VelocityOverGround,
    AirspeedHeading,
    EmergencyStatus,
    AcasResolutionAdvisory,
    TargetStateAndStatus,
    OperationalStatus,
}

/// Decoded message of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DecodedMsg {
    ShortAcas(ShortAcas),
    AltitudeReply(AltitudeReply),
    IdentifyReply(IdentifyReply),
    AllCallReply(AllCallReply),
    LongAcas(LongAcas),
    CommBAltitudeReply(CommBAltitudeReply),
    CommBIdentifyReply(CommBIdentifyReply),
    CommDExtendedLength(CommDExtendedLength),
    MilitaryExtendedSquitter(MilitaryExtendedSquitter),
    Identification(Identification),
    SurfacePosition(SurfacePosition),
    AirbornePosition(AirbornePosition),
    VelocityOverGround(VelocityOverGround),
    AirspeedHeading(AirspeedHeading),
    EmergencyStatus(EmergencyStatus),
    AcasResolutionAdvisory(AcasResolutionAdvisory),
    TargetStateAndStatus(TargetStateAndStatus),
    OperationalStatus(OperationalStatus),
}

/// Caller policy for version-dependent decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// ADS-B version assumed for position messages
    pub version: AdsbVersion,
}

fn unspecified(frame: &ModeFrame, what: String) -> ModesError {
    debug!(df = frame.df(), first_field = frame.first_field(), "unspecified format: {what}");
    ModesError::UnspecifiedFormat(what)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Select the message kind for a parsed frame.
pub fn classify(frame: &ModeFrame) -> Result<VariantTag> {
    let tag = match frame.df() {
        0 => VariantTag::ShortAcas,
        4 => VariantTag::AltitudeReply,
        5 => VariantTag::IdentifyReply,
        11 => VariantTag::AllCallReply,
        16 => VariantTag::LongAcas,
        20 => VariantTag::CommBAltitudeReply,
        21 => VariantTag::CommBIdentifyReply,
        24..=31 => VariantTag::CommDExtendedLength,
        17..=19 if frame.is_extended_squitter() => classify_squitter(frame)?,
        19 => VariantTag::MilitaryExtendedSquitter,
        18 => {
            return Err(unspecified(
                frame,
                format!("DF18 control field {}", frame.first_field()),
            ))
        }
        df => return Err(unspecified(frame, format!("DF{df}"))),
    };
    Ok(tag)
}

fn classify_squitter(frame: &ModeFrame) -> Result<VariantTag> {
    let me = frame.me_word()?;
    let tc = me_field(me, 1, 5);
    let subtype = me_field(me, 6, 3);

    let tag = match (tc, subtype) {
        (1..=4, _) => VariantTag::Identification,
        (5..=8, _) => VariantTag::SurfacePosition,
        (0 | 9..=18 | 20..=22, _) => VariantTag::AirbornePosition,
        (19, 1 | 2) => VariantTag::VelocityOverGround,
        (19, 3 | 4) => VariantTag::AirspeedHeading,
        (28, 1) => VariantTag::EmergencyStatus,
        (28, 2) => VariantTag::AcasResolutionAdvisory,
        // TC 29 uses a 2-bit subtype
        (29, _) if me_field(me, 6, 2) == 1 => VariantTag::TargetStateAndStatus,
        (31, 0 | 1) => VariantTag::OperationalStatus,
        _ => {
            return Err(unspecified(
                frame,
                format!("type code {tc} subtype {subtype}"),
            ))
        }
    };
    Ok(tag)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Classify and decode a frame into its typed message.
///
/// Position messages are interpreted under `opts.version`.
pub fn decode(frame: &ModeFrame, opts: &DecodeOptions) -> Result<DecodedMsg> {
    let msg = match classify(frame)? {
        VariantTag::ShortAcas => DecodedMsg::ShortAcas(ShortAcas::from_frame(frame)?),
        VariantTag::AltitudeReply => DecodedMsg::AltitudeReply(AltitudeReply::from_frame(frame)?),
        VariantTag::IdentifyReply => DecodedMsg::IdentifyReply(IdentifyReply::from_frame(frame)?),
        VariantTag::AllCallReply => DecodedMsg::AllCallReply(AllCallReply::from_frame(frame)?),
        VariantTag::LongAcas => DecodedMsg::LongAcas(LongAcas::from_frame(frame)?),
        VariantTag::CommBAltitudeReply => {
            DecodedMsg::CommBAltitudeReply(CommBAltitudeReply::from_frame(frame)?)
        }
        VariantTag::CommBIdentifyReply => {
            DecodedMsg::CommBIdentifyReply(CommBIdentifyReply::from_frame(frame)?)
        }
        VariantTag::CommDExtendedLength => {
            DecodedMsg::CommDExtendedLength(CommDExtendedLength::from_frame(frame)?)
        }
        VariantTag::MilitaryExtendedSquitter => {
            DecodedMsg::MilitaryExtendedSquitter(MilitaryExtendedSquitter::from_frame(frame)?)
        }
        VariantTag::Identification => {
            DecodedMsg::Identification(Identification::from_frame(frame)?)
        }
        VariantTag::SurfacePosition => DecodedMsg::SurfacePosition(
            SurfacePosition::from_frame(frame)?.with_version(opts.version),
        ),
        VariantTag::AirbornePosition => DecodedMsg::AirbornePosition(
            AirbornePosition::from_frame(frame)?.with_version(opts.version),
        ),
        VariantTag::VelocityOverGround => {
            DecodedMsg::VelocityOverGround(VelocityOverGround::from_frame(frame)?)
        }
        VariantTag::AirspeedHeading => {
            DecodedMsg::AirspeedHeading(AirspeedHeading::from_frame(frame)?)
        }
        VariantTag::EmergencyStatus => {
            DecodedMsg::EmergencyStatus(EmergencyStatus::from_frame(frame)?)
        }
        VariantTag::AcasResolutionAdvisory => {
            DecodedMsg::AcasResolutionAdvisory(AcasResolutionAdvisory::from_frame(frame)?)
        }
        VariantTag::TargetStateAndStatus => {
            DecodedMsg::TargetStateAndStatus(TargetStateAndStatus::from_frame(frame)?)
        }
        VariantTag::OperationalStatus => {
            DecodedMsg::OperationalStatus(OperationalStatus::from_frame(frame)?)
        }
    };
    Ok(msg)
}

/// Parse a hex string and decode it with default options.
pub fn decode_hex(hex_str: &str, timestamp: f64) -> Result<DecodedMsg> {
    decode(&ModeFrame::from_hex(hex_str, timestamp)?, &DecodeOptions::default())
}

impl DecodedMsg {
    /// Address announced in clear. `None` for replies whose address is
    /// overlaid on the parity field.
    pub fn icao(&self) -> Option<Icao> {
        match self {
            DecodedMsg::AllCallReply(m) => Some(m.icao),
            DecodedMsg::Identification(m) => Some(m.header.icao()),
            DecodedMsg::SurfacePosition(m) => Some(m.header.icao()),
            DecodedMsg::AirbornePosition(m) => Some(m.header.icao()),
            DecodedMsg::VelocityOverGround(m) => Some(m.header.icao()),
            DecodedMsg::AirspeedHeading(m) => Some(m.header.icao()),
            DecodedMsg::EmergencyStatus(m) => Some(m.header.icao()),
            DecodedMsg::AcasResolutionAdvisory(m) => Some(m.header.icao()),
            DecodedMsg::TargetStateAndStatus(m) => Some(m.header.icao()),
            DecodedMsg::OperationalStatus(m) => Some(m.header.icao()),
            _ => None,
        }
    }

    pub fn tag(&self) -> VariantTag {
        match self {
            DecodedMsg::ShortAcas(_) => VariantTag::ShortAcas,
            DecodedMsg::AltitudeReply(_) => VariantTag::AltitudeReply,
            DecodedMsg::IdentifyReply(_) => VariantTag::IdentifyReply,
            DecodedMsg::AllCallReply(_) => VariantTag::AllCallReply,
            DecodedMsg::LongAcas(_) => VariantTag::LongAcas,
            DecodedMsg::CommBAltitudeReply(_) => VariantTag::CommBAltitudeReply,
            DecodedMsg::CommBIdentifyReply(_) => VariantTag::CommBIdentifyReply,
            DecodedMsg::CommDExtendedLength(_) => VariantTag::CommDExtendedLength,
            DecodedMsg::MilitaryExtendedSquitter(_) => VariantTag::MilitaryExtendedSquitter,
            DecodedMsg::Identification(_) => VariantTag::Identification,
            DecodedMsg::SurfacePosition(_) => VariantTag::SurfacePosition,
            DecodedMsg::AirbornePosition(_) => VariantTag::AirbornePosition,
            DecodedMsg::VelocityOverGround(_) => VariantTag::VelocityOverGround,
            DecodedMsg::AirspeedHeading(_) => VariantTag::AirspeedHeading,
            DecodedMsg::EmergencyStatus(_) => VariantTag::EmergencyStatus,
            DecodedMsg::AcasResolutionAdvisory(_) => VariantTag::AcasResolutionAdvisory,
            DecodedMsg::TargetStateAndStatus(_) => VariantTag::TargetStateAndStatus,
            DecodedMsg::OperationalStatus(_) => VariantTag::OperationalStatus,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
