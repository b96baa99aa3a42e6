//! Status messages: aircraft status (TC 28), target state and status
//! (TC 29) and operational status (TC 31).

use serde::Serialize;

use super::position::NicSupplements;
use super::{FromFrame, SquitterHeader};
use crate::accuracy::{self, AdsbVersion};
use crate::altitude::{decode_ac13, decode_identity};
use crate::bits::{me_field, me_flag};
use crate::frame::ModeFrame;
use crate::types::{ModesError, Result};

fn wrong_subtype(subtype: u32, what: &str) -> ModesError {
    ModesError::BadFormat(format!("subtype {subtype} is not a {what}"))
}

// ---------------------------------------------------------------------------
// TC 28 subtype 1: emergency / priority status
// ---------------------------------------------------------------------------

const EMERGENCY_STATES: [&str; 8] = [
    "No emergency",
    "General emergency",
    "Lifeguard / medical emergency",
    "Minimum fuel",
    "No communications",
    "Unlawful interference",
    "Downed aircraft",
    "Reserved",
];

/// Emergency/priority status with the current Mode A code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergencyStatus {
    #[serde(flatten)]
    pub header: SquitterHeader,
    pub emergency_state: u8,
    pub mode_a_code: u16,
}

impl FromFrame for EmergencyStatus {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(frame, &[28..=28], "aircraft status message")?;
        let subtype = me_field(me, 6, 3);
        if subtype != 1 {
            return Err(wrong_subtype(subtype, "emergency status"));
        }
        Ok(EmergencyStatus {
            header,
            emergency_state: me_field(me, 9, 3) as u8,
            mode_a_code: me_field(me, 12, 13) as u16,
        })
    }
}

impl EmergencyStatus {
    pub fn has_emergency(&self) -> bool {
        self.emergency_state != 0
    }

    pub fn emergency_description(&self) -> &'static str {
        EMERGENCY_STATES[usize::from(self.emergency_state & 0x07)]
    }

    /// 4-digit squawk.
    pub fn identity(&self) -> String {
        decode_identity(self.mode_a_code)
    }
}

// ---------------------------------------------------------------------------
// TC 28 subtype 2: ACAS resolution advisory broadcast
// ---------------------------------------------------------------------------

/// Threat identity, as selected by the TTI field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThreatIdentity {
    None,
    /// Mode S address of the threat
    Address(u32),
    /// Altitude code, range code and bearing code of a non-Mode S threat
    Position { altitude_code: u16, range_code: u8, bearing_code: u8 },
}

/// ACAS RA report, same content as the MV field of a DF16 RA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcasResolutionAdvisory {
    #[serde(flatten)]
    pub header: SquitterHeader,
    /// Active resolution advisories (14 bits)
    pub active_advisories: u16,
    /// Resolution advisory complements (4 bits)
    pub complements: u8,
    pub terminated: bool,
    pub multiple_threats: bool,
    pub threat_type: u8,
    /// Raw threat identity data (26 bits)
    pub threat_data: u32,
}

impl FromFrame for AcasResolutionAdvisory {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(frame, &[28..=28], "aircraft status message")?;
        let subtype = me_field(me, 6, 3);
        if subtype != 2 {
            return Err(wrong_subtype(subtype, "resolution advisory report"));
        }
        Ok(AcasResolutionAdvisory {
            header,
            active_advisories: me_field(me, 9, 14) as u16,
            complements: me_field(me, 23, 4) as u8,
            terminated: me_flag(me, 27),
            multiple_threats: me_flag(me, 28),
            threat_type: me_field(me, 29, 2) as u8,
            threat_data: me_field(me, 31, 26),
        })
    }
}

impl AcasResolutionAdvisory {
    pub fn threat_identity(&self) -> ThreatIdentity {
        match self.threat_type {
            1 => ThreatIdentity::Address(self.threat_data >> 2),
            2 => ThreatIdentity::Position {
                altitude_code: (self.threat_data >> 13) as u16,
                range_code: ((self.threat_data >> 6) & 0x7F) as u8,
                bearing_code: (self.threat_data & 0x3F) as u8,
            },
            _ => ThreatIdentity::None,
        }
    }

    /// Threat altitude in feet, when the threat is identified by position.
    pub fn threat_altitude_ft(&self) -> Option<i32> {
        match self.threat_identity() {
            ThreatIdentity::Position { altitude_code, .. } => decode_ac13(altitude_code),
            _ => None,
        }
    }

    /// Threat range in NM: code 1 is < 0.05, then 0.1 NM steps up to 12.5.
    pub fn threat_range_nm(&self) -> Option<f64> {
        match self.threat_identity() {
            ThreatIdentity::Position { range_code: r @ 1..=126, .. } => Some((f64::from(r) - 1.0) / 10.0),
            _ => None,
        }
    }

    /// Threat bearing in degrees, 6 degree steps.
    pub fn threat_bearing_deg(&self) -> Option<u32> {
        match self.threat_identity() {
            ThreatIdentity::Position { bearing_code: b @ 1..=60, .. } => Some((u32::from(b) - 1) * 6),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TC 29 subtype 1: target state and status (version 2)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectedAltitudeSource {
    /// Mode control panel / flight control unit
    McpFcu,
    /// Flight management system
    Fms,
}

/// Target state and status (DO-260B layout).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStateAndStatus {
    #[serde(flatten)]
    pub header: SquitterHeader,
    pub sil_per_sample: bool,
    pub selected_altitude_source: SelectedAltitudeSource,
    pub selected_altitude_code: u16,
    pub barometric_setting_code: u16,
    pub heading_available: bool,
    pub heading_code: u16,
    pub nacp: u8,
    pub nic_baro: bool,
    pub sil: u8,
    /// Autopilot and mode flags below are valid
    pub mode_status_valid: bool,
    pub autopilot: bool,
    pub vnav: bool,
    pub altitude_hold: bool,
    /// ADS-R / TIS-B flag
    pub imf: bool,
    pub approach: bool,
    pub tcas_operational: bool,
    pub lnav: bool,
}

impl FromFrame for TargetStateAndStatus {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) =
            SquitterHeader::parse(frame, &[29..=29], "target state and status message")?;
        // TC 29 has a 2-bit subtype
        let subtype = me_field(me, 6, 2);
        if subtype != 1 {
            return Err(wrong_subtype(subtype, "version 2 target state report"));
        }
        Ok(TargetStateAndStatus {
            header,
            sil_per_sample: me_flag(me, 8),
            selected_altitude_source: if me_flag(me, 9) {
                SelectedAltitudeSource::Fms
            } else {
                SelectedAltitudeSource::McpFcu
            },
            selected_altitude_code: me_field(me, 10, 11) as u16,
            barometric_setting_code: me_field(me, 21, 9) as u16,
            heading_available: me_flag(me, 30),
            heading_code: me_field(me, 31, 9) as u16,
            nacp: me_field(me, 40, 4) as u8,
            nic_baro: me_flag(me, 44),
            sil: me_field(me, 45, 2) as u8,
            mode_status_valid: me_flag(me, 47),
            autopilot: me_flag(me, 48),
            vnav: me_flag(me, 49),
            altitude_hold: me_flag(me, 50),
            imf: me_flag(me, 51),
            approach: me_flag(me, 52),
            tcas_operational: me_flag(me, 53),
            lnav: me_flag(me, 54),
        })
    }
}

impl TargetStateAndStatus {
    /// Selected altitude in feet, 32 ft steps.
    pub fn selected_altitude_ft(&self) -> Option<i32> {
        (self.selected_altitude_code != 0)
            .then(|| (i32::from(self.selected_altitude_code) - 1) * 32)
    }

    /// Barometric pressure setting in millibars, 0.8 mbar steps above 800.
    pub fn barometric_setting_mbar(&self) -> Option<f64> {
        (self.barometric_setting_code != 0)
            .then(|| 800.0 + (f64::from(self.barometric_setting_code) - 1.0) * 0.8)
    }

    /// Selected heading in degrees, 180/256 steps.
    pub fn selected_heading_deg(&self) -> Option<f64> {
        self.heading_available
            .then(|| f64::from(self.heading_code) * 180.0 / 256.0)
    }

    pub fn position_uncertainty_m(&self) -> Option<f64> {
        accuracy::nacp_epu(self.nacp)
    }

    /// Autopilot mode flag, if the mode bits are valid.
    pub fn autopilot_engaged(&self) -> Option<bool> {
        self.mode_status_valid.then_some(self.autopilot)
    }
}

// ---------------------------------------------------------------------------
// TC 31: operational status
// ---------------------------------------------------------------------------

/// Aircraft operational status, airborne (subtype 0) or surface (subtype 1).
///
/// Capability class and operational mode bits are kept raw; their layout
/// differs between versions and the accessors interpret them for version 1
/// and 2 transmitters only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalStatus {
    #[serde(flatten)]
    pub header: SquitterHeader,
    pub subtype: u8,
    /// 16 bits airborne, 12 bits surface
    pub capability_class: u16,
    /// Surface only: aircraft length/width code
    pub length_width_code: Option<u8>,
    pub operational_mode: u16,
    pub version_number: u8,
    pub nic_supplement_a: bool,
    pub nacp: u8,
    /// Geometric vertical accuracy (airborne)
    pub gva: u8,
    pub sil: u8,
    /// NIC-baro (airborne) or track angle/heading flag (surface)
    pub nic_baro_or_track_heading: bool,
    /// Horizontal reference direction: magnetic north if true
    pub horizontal_reference_magnetic: bool,
    pub sil_per_sample: bool,
}

impl FromFrame for OperationalStatus {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) =
            SquitterHeader::parse(frame, &[31..=31], "operational status message")?;
        let subtype = me_field(me, 6, 3);
        let (capability_class, length_width_code) = match subtype {
            0 => (me_field(me, 9, 16) as u16, None),
            1 => (me_field(me, 9, 12) as u16, Some(me_field(me, 21, 4) as u8)),
            _ => return Err(wrong_subtype(subtype, "operational status")),
        };
        Ok(OperationalStatus {
            header,
            subtype: subtype as u8,
            capability_class,
            length_width_code,
            operational_mode: me_field(me, 25, 16) as u16,
            version_number: me_field(me, 41, 3) as u8,
            nic_supplement_a: me_flag(me, 44),
            nacp: me_field(me, 45, 4) as u8,
            gva: me_field(me, 49, 2) as u8,
            sil: me_field(me, 51, 2) as u8,
            nic_baro_or_track_heading: me_flag(me, 53),
            horizontal_reference_magnetic: me_flag(me, 54),
            sil_per_sample: me_flag(me, 55),
        })
    }
}

impl OperationalStatus {
    pub fn is_surface(&self) -> bool {
        self.subtype == 1
    }

    /// Announced ADS-B version; `None` for reserved version numbers.
    pub fn version(&self) -> Option<AdsbVersion> {
        AdsbVersion::from_number(self.version_number)
    }

    fn is_v1_or_later(&self) -> bool {
        self.version_number >= 1
    }

    /// Capability class bit by ME bit number (9-24 airborne, 9-20 surface).
    fn cc_bit(&self, bit: u32) -> bool {
        let width = if self.is_surface() { 12 } else { 16 };
        (self.capability_class >> (8 + width - bit)) & 1 != 0
    }

    /// Operational mode bit by ME bit number (25-40).
    fn om_bit(&self, bit: u32) -> bool {
        (self.operational_mode >> (40 - bit)) & 1 != 0
    }

    /// NIC supplement C: last capability class bit of surface messages (V2).
    pub fn nic_supplement_c(&self) -> Option<bool> {
        (self.is_surface() && self.version_number >= 2).then(|| self.cc_bit(20))
    }

    /// Supplement bits to merge into later position messages.
    pub fn nic_supplements(&self) -> NicSupplements {
        NicSupplements {
            nic_a: self.is_v1_or_later() && self.nic_supplement_a,
            nic_c: self.nic_supplement_c().unwrap_or(false),
        }
    }

    /// Surface NACv from the capability class (ME bits 17-19).
    pub fn nacv(&self) -> Option<u8> {
        (self.is_surface() && self.is_v1_or_later())
            .then(|| ((self.capability_class >> 1) & 0x07) as u8)
    }

    pub fn nacp(&self) -> Option<u8> {
        self.is_v1_or_later().then_some(self.nacp)
    }

    pub fn position_uncertainty_m(&self) -> Option<f64> {
        self.nacp().and_then(accuracy::nacp_epu)
    }

    pub fn sil(&self) -> Option<u8> {
        self.is_v1_or_later().then_some(self.sil)
    }

    pub fn sil_probability(&self) -> Option<&'static str> {
        self.sil().map(accuracy::sil_probability)
    }

    /// Geometric vertical accuracy in meters (airborne, version 2).
    pub fn geometric_vertical_accuracy_m(&self) -> Option<u32> {
        if self.is_surface() || self.version_number < 2 {
            return None;
        }
        match self.gva {
            1 => Some(150),
            2 => Some(45),
            _ => None,
        }
    }

    /// ACAS operational (airborne). Version 1 encodes this inverted.
    pub fn has_operational_acas(&self) -> Option<bool> {
        if self.is_surface() {
            return None;
        }
        match self.version_number {
            1 => Some(!self.cc_bit(11)),
            2..=u8::MAX => Some(self.cc_bit(11)),
            _ => None,
        }
    }

    /// Cockpit display of traffic information (V1) or 1090ES receive
    /// capability (V2).
    pub fn has_1090es_in(&self) -> Option<bool> {
        self.is_v1_or_later().then(|| self.cc_bit(12))
    }

    pub fn supports_air_referenced_velocity(&self) -> Option<bool> {
        (!self.is_surface() && self.is_v1_or_later()).then(|| self.cc_bit(15))
    }

    pub fn supports_target_state_report(&self) -> Option<bool> {
        (!self.is_surface() && self.is_v1_or_later()).then(|| self.cc_bit(16))
    }

    pub fn has_active_resolution_advisory(&self) -> Option<bool> {
        self.is_v1_or_later().then(|| self.om_bit(27))
    }

    pub fn has_active_ident_switch(&self) -> Option<bool> {
        self.is_v1_or_later().then(|| self.om_bit(28))
    }

    pub fn has_single_antenna(&self) -> Option<bool> {
        (self.version_number >= 2).then(|| self.om_bit(30))
    }

    pub fn system_design_assurance(&self) -> Option<u8> {
        (self.version_number >= 2).then(|| ((self.operational_mode >> 8) & 0x03) as u8)
    }

    /// Surface GPS antenna offset code (ME bits 33-40).
    pub fn gps_antenna_offset(&self) -> Option<u8> {
        (self.is_surface() && self.version_number >= 2)
            .then(|| (self.operational_mode & 0xFF) as u8)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Aircraft status --

    #[test]
    fn test_emergency_status() {
        let msg = EmergencyStatus::from_hex("8D4840D6E16AAA00000000000000", 1.0).unwrap();
        assert_eq!(msg.header.type_code(), 28);
        assert!(msg.has_emergency());
        assert_eq!(msg.emergency_state, 3);
        assert_eq!(msg.emergency_description(), "Minimum fuel");
        assert_eq!(msg.identity(), "7700");
        assert!(EmergencyStatus::from_hex("8D4840D6E2800116AF37BC000000", 1.0).is_err());
    }

    #[test]
    fn test_resolution_advisory_with_address() {
        let msg = AcasResolutionAdvisory::from_hex("8D4840D6E2800116AF37BC000000", 1.0).unwrap();
        assert_eq!(msg.active_advisories, 0x2000);
        assert_eq!(msg.complements, 0b0100);
        assert!(!msg.terminated);
        assert!(msg.multiple_threats);
        assert_eq!(msg.threat_identity(), ThreatIdentity::Address(0xABCDEF));
        assert_eq!(msg.threat_altitude_ft(), None);
    }

    #[test]
    fn test_resolution_advisory_with_threat_position() {
        let msg = AcasResolutionAdvisory::from_hex("8D4840D6E2000029E3E54A000000", 1.0).unwrap();
        assert!(msg.terminated);
        assert_eq!(
            msg.threat_identity(),
            ThreatIdentity::Position {
                altitude_code: 0x0F1F,
                range_code: 21,
                bearing_code: 10,
            }
        );
        assert_eq!(msg.threat_altitude_ft(), Some(23375));
        assert!((msg.threat_range_nm().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(msg.threat_bearing_deg(), Some(54));
    }

    // -- Target state and status --

    #[test]
    fn test_target_state_and_status() {
        let msg = TargetStateAndStatus::from_hex("8DA05629EA21485CBF3F8CADAEEB", 1.0).unwrap();
        assert_eq!(msg.header.icao_hex(), "A05629");
        assert_eq!(msg.selected_altitude_source, SelectedAltitudeSource::McpFcu);
        assert_eq!(msg.selected_altitude_ft(), Some(16992));
        let baro = msg.barometric_setting_mbar().unwrap();
        assert!((baro - 1012.8).abs() < 1e-6, "baro {baro}");
        let heading = msg.selected_heading_deg().unwrap();
        assert!((heading - 66.796875).abs() < 1e-9);
        assert_eq!(msg.nacp, 9);
        assert_eq!(msg.position_uncertainty_m(), Some(30.0));
        assert!(msg.nic_baro);
        assert_eq!(msg.sil, 3);
        assert_eq!(msg.autopilot_engaged(), Some(true));
        assert!(msg.vnav);
        assert!(!msg.altitude_hold);
        assert!(!msg.approach);
        assert!(msg.tcas_operational);
        assert!(msg.lnav);
    }

    #[test]
    fn test_target_state_rejects_version_1_layout() {
        // Same frame with the 2-bit subtype cleared
        let err = TargetStateAndStatus::from_hex("8DA05629E821485CBF3F8CADAEEB", 1.0).unwrap_err();
        assert!(err.is_format_error());
    }

    // -- Operational status --

    #[test]
    fn test_operational_status_airborne_v2() {
        let msg = OperationalStatus::from_hex("8D4840D6F8330002005AB8000000", 1.0).unwrap();
        assert!(!msg.is_surface());
        assert_eq!(msg.version(), Some(AdsbVersion::V2));
        assert_eq!(msg.length_width_code, None);
        assert_eq!(msg.has_operational_acas(), Some(true));
        assert_eq!(msg.has_1090es_in(), Some(true));
        assert_eq!(msg.supports_air_referenced_velocity(), Some(true));
        assert_eq!(msg.supports_target_state_report(), Some(true));
        assert_eq!(msg.has_active_resolution_advisory(), Some(false));
        assert_eq!(msg.has_single_antenna(), Some(false));
        assert_eq!(msg.system_design_assurance(), Some(2));
        assert_eq!(msg.nacp(), Some(10));
        assert_eq!(msg.position_uncertainty_m(), Some(10.0));
        assert_eq!(msg.geometric_vertical_accuracy_m(), Some(45));
        assert_eq!(msg.sil(), Some(3));
        assert_eq!(msg.sil_probability(), Some("<= 1e-7"));
        assert!(msg.nic_baro_or_track_heading);
        assert_eq!(msg.nic_supplement_c(), None);
        assert_eq!(
            msg.nic_supplements(),
            NicSupplements {
                nic_a: true,
                nic_c: false
            }
        );
    }

    #[test]
    fn test_operational_status_surface_v2() {
        let msg = OperationalStatus::from_hex("8D4840D6F930550441492C000000", 1.0).unwrap();
        assert!(msg.is_surface());
        assert_eq!(msg.version(), Some(AdsbVersion::V2));
        assert_eq!(msg.length_width_code, Some(5));
        assert_eq!(msg.nacv(), Some(2));
        assert_eq!(msg.nic_supplement_c(), Some(true));
        assert_eq!(msg.has_1090es_in(), Some(true));
        assert_eq!(msg.has_operational_acas(), None);
        assert_eq!(msg.has_single_antenna(), Some(true));
        assert_eq!(msg.gps_antenna_offset(), Some(0x41));
        assert_eq!(msg.nacp(), Some(9));
        assert_eq!(msg.sil(), Some(2));
        assert_eq!(msg.geometric_vertical_accuracy_m(), None);
        assert!(msg.horizontal_reference_magnetic);
        assert_eq!(
            msg.nic_supplements(),
            NicSupplements {
                nic_a: false,
                nic_c: true
            }
        );
    }

    #[test]
    fn test_operational_status_v1_acas_inverted() {
        let msg = OperationalStatus::from_hex("8D4840D6F8000000003820000000", 1.0).unwrap();
        assert_eq!(msg.version(), Some(AdsbVersion::V1));
        // bit 11 clear means ACAS operational in version 1
        assert_eq!(msg.has_operational_acas(), Some(true));
        assert_eq!(msg.has_single_antenna(), None);
        assert_eq!(msg.nacp(), Some(8));
        assert_eq!(msg.sil(), Some(2));
        assert!(msg.nic_supplements().nic_a);
    }

    #[test]
    fn test_operational_status_v0() {
        let msg = OperationalStatus::from_hex("8D4840D6F8123400000000000000", 1.0).unwrap();
        assert_eq!(msg.version(), Some(AdsbVersion::V0));
        assert_eq!(msg.capability_class, 0x1234);
        assert_eq!(msg.nacp(), None);
        assert_eq!(msg.sil(), None);
        assert_eq!(msg.has_operational_acas(), None);
        assert_eq!(msg.nic_supplements(), NicSupplements::default());
    }

    #[test]
    fn test_operational_status_rejects_reserved_subtype() {
        // subtype 2
        assert!(OperationalStatus::from_hex("8D4840D6FA000000000000000000", 1.0).is_err());
    }
}
