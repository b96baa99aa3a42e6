//! Airborne (TC 0, 9-18, 20-22) and surface (TC 5-8) position messages.
//!
//! Both carry a CPR-encoded position. Resolving it needs either a second
//! frame of the opposite format or a reference position; see [`crate::cpr`].
//!
//! Integrity figures depend on the transmitter's ADS-B version and on NIC
//! supplement bits that arrive in Operational Status messages. Callers that
//! track those per aircraft merge them in with [`AirbornePosition::with_version`]
//! and [`AirbornePosition::with_nic_supplements`] (same on [`SurfacePosition`]).

use serde::Serialize;

use super::{FromFrame, SquitterHeader};
use crate::accuracy::{self, AdsbVersion};
use crate::altitude::decode_ac12;
use crate::bits::{me_field, me_flag};
use crate::cpr::{CprEncodedPosition, CprFormat, CprPolicy, Position};
use crate::frame::ModeFrame;
use crate::types::{ModesError, Result};

/// NIC supplement bits learned from Operational Status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NicSupplements {
    /// Supplement A (airborne and surface, version 1+)
    pub nic_a: bool,
    /// Supplement C (surface, version 2)
    pub nic_c: bool,
}

/// Reference of the altitude field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AltitudeType {
    /// Barometric pressure altitude (TC 9-18)
    Barometric,
    /// GNSS height above the WGS-84 ellipsoid (TC 20-22)
    Gnss,
}

const SURVEILLANCE_STATUS: [&str; 4] = [
    "No condition information",
    "Permanent alert (emergency condition)",
    "Temporary alert (change in Mode A identity code other than emergency condition)",
    "SPI condition",
];

/// CPR lat/lon and format flag at ME bits 22-56.
fn cpr_fields(me: u64, surface: bool, timestamp: f64) -> Result<CprEncodedPosition> {
    CprEncodedPosition::new(
        CprFormat::from_odd_flag(me_flag(me, 22)),
        me_field(me, 23, 17),
        me_field(me, 40, 17),
        17,
        surface,
        timestamp,
    )
}

// ---------------------------------------------------------------------------
// Airborne position
// ---------------------------------------------------------------------------

/// Airborne position message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirbornePosition {
    #[serde(flatten)]
    pub header: SquitterHeader,
    version: AdsbVersion,
    pub surveillance_status: u8,
    /// ME bit 8: NIC supplement B in version 2, single-antenna flag before
    pub nic_b: bool,
    pub altitude_code: u16,
    /// Time of applicability synchronized to UTC
    pub time_flag: bool,
    pub cpr: CprEncodedPosition,
    supplements: NicSupplements,
}

impl FromFrame for AirbornePosition {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(
            frame,
            &[0..=0, 9..=18, 20..=22],
            "airborne position message",
        )?;
        Ok(AirbornePosition {
            header,
            version: AdsbVersion::V0,
            surveillance_status: me_field(me, 6, 2) as u8,
            nic_b: me_flag(me, 8),
            altitude_code: me_field(me, 9, 12) as u16,
            time_flag: me_flag(me, 21),
            cpr: cpr_fields(me, false, frame.timestamp())?,
            supplements: NicSupplements::default(),
        })
    }
}

impl AirbornePosition {
    /// Interpret the message under a given ADS-B version.
    pub fn with_version(mut self, version: AdsbVersion) -> Self {
        self.version = version;
        self
    }

    /// Merge externally obtained NIC supplement bits.
    pub fn with_nic_supplements(mut self, supplements: NicSupplements) -> Self {
        self.supplements = supplements;
        self
    }

    /// ADS-B version the accuracy fields are interpreted under.
    pub fn version(&self) -> AdsbVersion {
        self.version
    }

    pub fn supplements(&self) -> NicSupplements {
        self.supplements
    }

    /// TC 0 carries no horizontal position.
    pub fn has_valid_position(&self) -> bool {
        self.header.type_code() != 0
    }

    pub fn has_valid_altitude(&self) -> bool {
        self.altitude_code != 0
    }

    /// Altitude in feet; `None` if unavailable or not decodable.
    pub fn altitude_ft(&self) -> Option<i32> {
        decode_ac12(self.altitude_code)
    }

    pub fn altitude_type(&self) -> Option<AltitudeType> {
        match self.header.type_code() {
            9..=18 => Some(AltitudeType::Barometric),
            20..=22 => Some(AltitudeType::Gnss),
            _ => None,
        }
    }

    pub fn surveillance_status_description(&self) -> &'static str {
        SURVEILLANCE_STATUS[usize::from(self.surveillance_status & 0x03)]
    }

    /// Encoded position, if the message carries one.
    pub fn cpr_position(&self) -> Option<&CprEncodedPosition> {
        self.has_valid_position().then_some(&self.cpr)
    }

    fn nic_b_supplement(&self) -> bool {
        self.version == AdsbVersion::V2 && self.nic_b
    }

    /// Horizontal containment radius limit in meters.
    pub fn containment_radius_m(&self) -> Option<f64> {
        accuracy::airborne_containment_radius(
            self.header.type_code(),
            self.version,
            self.supplements.nic_a,
            self.nic_b_supplement(),
        )
    }

    /// Navigation integrity category (0 = unknown).
    pub fn nic(&self) -> u8 {
        accuracy::airborne_nic(
            self.header.type_code(),
            self.version,
            self.supplements.nic_a,
            self.nic_b_supplement(),
        )
    }

    /// NACp implied by the type code. Only version 0 encodes it here; later
    /// versions announce it in Operational Status.
    pub fn nacp(&self) -> Option<u8> {
        (self.version == AdsbVersion::V0).then(|| accuracy::airborne_nacp_v0(self.header.type_code()))
    }

    /// Estimated position uncertainty in meters (version 0 only).
    pub fn position_uncertainty_m(&self) -> Option<f64> {
        if self.version != AdsbVersion::V0 {
            return None;
        }
        accuracy::airborne_epu_v0(self.header.type_code())
    }

    /// Source integrity level (version 0 only).
    pub fn sil(&self) -> Option<u8> {
        (self.version == AdsbVersion::V0).then(|| accuracy::airborne_sil_v0(self.header.type_code()))
    }

    /// Versions 0 and 1 use ME bit 8 as the single-antenna flag.
    pub fn has_single_antenna(&self) -> Option<bool> {
        (self.version != AdsbVersion::V2).then_some(self.nic_b)
    }

    /// Global decode with a message of the opposite CPR format.
    pub fn decode_global(&self, other: &AirbornePosition, policy: &CprPolicy) -> Result<Position> {
        let (a, b) = self.cpr_pair(other)?;
        a.decode_global(b, None, policy)
    }

    /// Local decode against a reference position.
    pub fn decode_local(&self, reference: &Position, policy: &CprPolicy) -> Result<Position> {
        self.cpr_position()
            .ok_or_else(no_position)?
            .decode_local(reference, policy)
    }

    fn cpr_pair<'a>(
        &'a self,
        other: &'a AirbornePosition,
    ) -> Result<(&'a CprEncodedPosition, &'a CprEncodedPosition)> {
        let a = self.cpr_position().ok_or_else(no_position)?;
        let b = other.cpr_position().ok_or_else(no_position)?;
        Ok((a, b))
    }
}

fn no_position() -> ModesError {
    ModesError::AmbiguousPosition("message carries no horizontal position".into())
}

// ---------------------------------------------------------------------------
// Surface position
// ---------------------------------------------------------------------------

/// Movement code breakpoints, speeds at each breakpoint, and step per code.
const MOVEMENT_BOUNDS: [u8; 7] = [2, 9, 13, 39, 94, 109, 124];
const MOVEMENT_SPEEDS: [f64; 7] = [0.125, 1.0, 2.0, 15.0, 70.0, 100.0, 175.0];
const MOVEMENT_STEPS: [f64; 6] = [0.125, 0.25, 0.5, 1.0, 2.0, 5.0];

/// Decode the 7-bit surface movement field into knots.
///
/// 0 = no information, 1 = stopped, 124 = 175 kt or more, 125-127 reserved.
pub fn decode_movement(movement: u8) -> Option<f64> {
    match movement {
        0 | 125..=u8::MAX => None,
        1 => Some(0.0),
        124 => Some(175.0),
        n => {
            let band = MOVEMENT_BOUNDS.iter().rposition(|&b| n >= b)?;
            Some(MOVEMENT_SPEEDS[band] + f64::from(n - MOVEMENT_BOUNDS[band]) * MOVEMENT_STEPS[band])
        }
    }
}

/// Surface position message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfacePosition {
    #[serde(flatten)]
    pub header: SquitterHeader,
    version: AdsbVersion,
    pub movement: u8,
    pub track_valid: bool,
    pub track_code: u8,
    pub time_flag: bool,
    pub cpr: CprEncodedPosition,
    supplements: NicSupplements,
}

impl FromFrame for SurfacePosition {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(frame, &[5..=8], "surface position message")?;
        Ok(SurfacePosition {
            header,
            version: AdsbVersion::V0,
            movement: me_field(me, 6, 7) as u8,
            track_valid: me_flag(me, 13),
            track_code: me_field(me, 14, 7) as u8,
            time_flag: me_flag(me, 21),
            cpr: cpr_fields(me, true, frame.timestamp())?,
            supplements: NicSupplements::default(),
        })
    }
}

impl SurfacePosition {
    pub fn with_version(mut self, version: AdsbVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_nic_supplements(mut self, supplements: NicSupplements) -> Self {
        self.supplements = supplements;
        self
    }

    /// ADS-B version the accuracy fields are interpreted under.
    pub fn version(&self) -> AdsbVersion {
        self.version
    }

    pub fn supplements(&self) -> NicSupplements {
        self.supplements
    }

    /// Ground speed in knots.
    pub fn ground_speed_kts(&self) -> Option<f64> {
        decode_movement(self.movement)
    }

    pub fn is_stopped(&self) -> bool {
        self.movement == 1
    }

    /// Ground track in degrees clockwise from true north, 2.8125 degree steps.
    pub fn ground_track_deg(&self) -> Option<f64> {
        self.track_valid
            .then(|| f64::from(self.track_code) * 360.0 / 128.0)
    }

    pub fn containment_radius_m(&self) -> Option<f64> {
        accuracy::surface_containment_radius(
            self.header.type_code(),
            self.version,
            self.supplements.nic_a,
            self.supplements.nic_c,
        )
    }

    pub fn nic(&self) -> u8 {
        accuracy::surface_nic(
            self.header.type_code(),
            self.version,
            self.supplements.nic_a,
            self.supplements.nic_c,
        )
    }

    /// NACp implied by the type code (version 0 only).
    pub fn nacp(&self) -> Option<u8> {
        (self.version == AdsbVersion::V0).then(|| accuracy::surface_nacp_v0(self.header.type_code()))
    }

    /// Estimated position uncertainty in meters (version 0 only).
    pub fn position_uncertainty_m(&self) -> Option<f64> {
        if self.version != AdsbVersion::V0 {
            return None;
        }
        accuracy::surface_epu_v0(self.header.type_code())
    }

    /// Global decode with a message of the opposite CPR format. `reference`
    /// (receiver or last known position) selects the quadrant.
    pub fn decode_global(
        &self,
        other: &SurfacePosition,
        reference: &Position,
        policy: &CprPolicy,
    ) -> Result<Position> {
        self.cpr.decode_global(&other.cpr, Some(reference), policy)
    }

    pub fn decode_local(&self, reference: &Position, policy: &CprPolicy) -> Result<Position> {
        self.cpr.decode_local(reference, policy)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SquitterSource;

    const EVEN: &str = "8D40621D58C382D690C8AC2863A7";
    const ODD: &str = "8D40621D58C386435CC412692AD6";

    const SURFACE_EVEN: &str = "8C4841753AAB238733C8CD4020B1";
    const SURFACE_ODD: &str = "8C4841753A8A35323FAEBDAC702D";

    #[test]
    fn test_decode_position_even() {
        let msg = AirbornePosition::from_hex(EVEN, 1.0).unwrap();
        assert_eq!(msg.header.icao_hex(), "40621D");
        assert_eq!(msg.header.type_code(), 11);
        assert_eq!(msg.altitude_ft(), Some(38000));
        assert_eq!(msg.altitude_type(), Some(AltitudeType::Barometric));
        assert_eq!(msg.cpr.format(), CprFormat::Even);
        assert_eq!(msg.cpr.encoded_lat(), 93000);
        assert_eq!(msg.cpr.encoded_lon(), 51372);
        assert_eq!(msg.surveillance_status, 0);
        assert_eq!(msg.surveillance_status_description(), "No condition information");
        assert!(msg.has_valid_position());
    }

    #[test]
    fn test_decode_position_odd() {
        let msg = AirbornePosition::from_hex(ODD, 0.0).unwrap();
        assert_eq!(msg.altitude_ft(), Some(38000));
        assert_eq!(msg.cpr.format(), CprFormat::Odd);
        assert_eq!(msg.cpr.encoded_lat(), 74158);
        assert_eq!(msg.cpr.encoded_lon(), 50194);
    }

    #[test]
    fn test_position_pair_global_decode() {
        let even = AirbornePosition::from_hex(EVEN, 1.0).unwrap();
        let odd = AirbornePosition::from_hex(ODD, 0.0).unwrap();
        let pos = even.decode_global(&odd, &CprPolicy::default()).unwrap();
        assert!((pos.latitude - 52.2572).abs() < 1e-4);
        assert!((pos.longitude - 3.9194).abs() < 1e-4);

        let local = even
            .decode_local(&Position::new(52.26, 3.92), &CprPolicy::default())
            .unwrap();
        assert!((local.latitude - pos.latitude).abs() < 1e-9);
    }

    #[test]
    fn test_refinement_keeps_validated_header() {
        let msg = AirbornePosition::from_hex(EVEN, 1.0).unwrap();
        let header = msg.header;
        let supplements = NicSupplements {
            nic_a: true,
            nic_c: false,
        };
        let refined = msg
            .with_version(AdsbVersion::V2)
            .with_nic_supplements(supplements);
        assert_eq!(refined.header, header);
        assert_eq!(refined.header.type_code(), 11);
        assert_eq!(refined.header.timestamp(), 1.0);
        assert_eq!(refined.version(), AdsbVersion::V2);
        assert_eq!(refined.supplements(), supplements);
    }

    #[test]
    fn test_v0_accuracy() {
        let msg = AirbornePosition::from_hex(EVEN, 1.0).unwrap();
        assert_eq!(msg.version(), AdsbVersion::V0);
        assert_eq!(msg.containment_radius_m(), Some(185.2));
        assert_eq!(msg.nic(), 9);
        assert_eq!(msg.nacp(), Some(8));
        assert_eq!(msg.position_uncertainty_m(), Some(92.6));
        assert_eq!(msg.sil(), Some(2));
        assert_eq!(msg.has_single_antenna(), Some(false));
    }

    #[test]
    fn test_v1_with_supplement_a() {
        let msg = AirbornePosition::from_hex(EVEN, 1.0)
            .unwrap()
            .with_version(AdsbVersion::V1)
            .with_nic_supplements(NicSupplements {
                nic_a: true,
                nic_c: false,
            });
        assert_eq!(msg.containment_radius_m(), Some(75.0));
        assert_eq!(msg.nic(), 9);
        assert_eq!(msg.nacp(), None);
        assert_eq!(msg.sil(), None);
        assert_eq!(msg.has_single_antenna(), Some(false));
    }

    #[test]
    fn test_v2_needs_both_supplements() {
        // NIC-B (ME bit 8) is clear in this frame
        let msg = AirbornePosition::from_hex(EVEN, 1.0)
            .unwrap()
            .with_version(AdsbVersion::V2)
            .with_nic_supplements(NicSupplements {
                nic_a: true,
                nic_c: false,
            });
        assert!(!msg.nic_b);
        assert_eq!(msg.containment_radius_m(), Some(185.2));
        assert_eq!(msg.nic(), 8);
        assert_eq!(msg.has_single_antenna(), None);

        // same frame with NIC-B set: ME byte 0 0x58 -> 0x59
        let msg = AirbornePosition::from_hex("8D40621D59C382D690C8AC2863A7", 1.0)
            .unwrap()
            .with_version(AdsbVersion::V2)
            .with_nic_supplements(NicSupplements {
                nic_a: true,
                nic_c: false,
            });
        assert!(msg.nic_b);
        assert_eq!(msg.containment_radius_m(), Some(75.0));
        assert_eq!(msg.nic(), 9);
    }

    #[test]
    fn test_adsr_position() {
        let msg = AirbornePosition::from_hex("9640621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert_eq!(msg.header.source(), SquitterSource::AdsR);
        assert!(msg.header.is_rebroadcast());
        assert_eq!(msg.altitude_ft(), Some(38000));
    }

    #[test]
    fn test_airborne_rejects_other_type_codes() {
        assert!(AirbornePosition::from_hex("8D4840D6202CC371C32CE0576098", 1.0).is_err());
        assert!(AirbornePosition::from_hex("8D485020994409940838175B284F", 1.0).is_err());
        assert!(AirbornePosition::from_hex(SURFACE_EVEN, 1.0).is_err());
    }

    #[test]
    fn test_type_code_zero_has_no_position() {
        // TC 0 with a barometric altitude only
        let msg = AirbornePosition::from_hex("8D40621D00C380000000002863A7", 1.0).unwrap();
        assert_eq!(msg.header.type_code(), 0);
        assert!(!msg.has_valid_position());
        assert_eq!(msg.cpr_position(), None);
        assert_eq!(msg.altitude_type(), None);
        assert_eq!(msg.altitude_ft(), Some(38000));
        assert!(msg
            .decode_local(&Position::new(52.0, 4.0), &CprPolicy::default())
            .is_err());
    }

    #[test]
    fn test_movement_table() {
        assert_eq!(decode_movement(0), None);
        assert_eq!(decode_movement(1), Some(0.0));
        assert_eq!(decode_movement(2), Some(0.125));
        assert_eq!(decode_movement(8), Some(0.875));
        assert_eq!(decode_movement(9), Some(1.0));
        assert_eq!(decode_movement(13), Some(2.0));
        assert_eq!(decode_movement(39), Some(15.0));
        assert_eq!(decode_movement(42), Some(18.0));
        assert_eq!(decode_movement(94), Some(70.0));
        assert_eq!(decode_movement(108), Some(98.0));
        assert_eq!(decode_movement(109), Some(100.0));
        assert_eq!(decode_movement(123), Some(170.0));
        assert_eq!(decode_movement(124), Some(175.0));
        assert_eq!(decode_movement(125), None);
        assert_eq!(decode_movement(127), None);
    }

    #[test]
    fn test_movement_monotonic() {
        let mut prev = 0.0;
        for n in 2..=124u8 {
            let speed = decode_movement(n).unwrap();
            assert!(speed > prev, "movement {n}");
            prev = speed;
        }
    }

    #[test]
    fn test_surface_position_fields() {
        let msg = SurfacePosition::from_hex(SURFACE_EVEN, 0.0).unwrap();
        assert_eq!(msg.header.icao_hex(), "484175");
        assert_eq!(msg.header.type_code(), 7);
        assert_eq!(msg.movement, 42);
        assert_eq!(msg.ground_speed_kts(), Some(18.0));
        assert!(msg.track_valid);
        assert_eq!(msg.ground_track_deg(), Some(140.625));
        assert_eq!(msg.cpr.format(), CprFormat::Even);
        assert!(msg.cpr.is_surface());
        assert_eq!(msg.cpr.encoded_lat(), 115609);
        assert_eq!(msg.cpr.encoded_lon(), 116941);

        let odd = SurfacePosition::from_hex(SURFACE_ODD, 1.0).unwrap();
        assert_eq!(odd.cpr.format(), CprFormat::Odd);
        assert_eq!(odd.cpr.encoded_lat(), 39199);
        assert_eq!(odd.cpr.encoded_lon(), 110269);
    }

    #[test]
    fn test_surface_global_decode() {
        // "The 1090 MHz Riddle" surface example, receiver near Delft
        let even = SurfacePosition::from_hex(SURFACE_EVEN, 0.0).unwrap();
        let odd = SurfacePosition::from_hex(SURFACE_ODD, 1.0).unwrap();
        let reference = Position::new(51.990, 4.375);
        let pos = even
            .decode_global(&odd, &reference, &CprPolicy::default())
            .unwrap();
        assert!((pos.latitude - 52.32061).abs() < 1e-4, "lat {}", pos.latitude);
        assert!((pos.longitude - 4.73473).abs() < 1e-4, "lon {}", pos.longitude);

        let local = odd
            .decode_local(&reference, &CprPolicy::default())
            .unwrap();
        assert!((local.latitude - pos.latitude).abs() < 1e-9);
        assert!((local.longitude - pos.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_surface_accuracy_versions() {
        let msg = SurfacePosition::from_hex(SURFACE_EVEN, 0.0).unwrap();
        assert_eq!(msg.containment_radius_m(), Some(185.2));
        assert_eq!(msg.nic(), 8);
        assert_eq!(msg.nacp(), Some(8));
        assert_eq!(msg.position_uncertainty_m(), Some(92.6));

        let msg = msg.with_version(AdsbVersion::V1).with_nic_supplements(NicSupplements {
            nic_a: true,
            nic_c: false,
        });
        assert_eq!(msg.containment_radius_m(), Some(75.0));
        assert_eq!(msg.nic(), 9);
        assert_eq!(msg.nacp(), None);
    }
}
