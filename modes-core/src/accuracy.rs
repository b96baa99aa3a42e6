//! Accuracy and integrity metadata implied by position type codes.
//!
//! Version 0 transponders encode their navigation quality purely in the
//! format type code. Version 1 and 2 refine a few codes with NIC supplement
//! bits: A (from Operational Status), B (in the airborne position message)
//! and C (from surface Operational Status).
//!
//! All functions are total over type codes 0-31: unknown combinations give
//! `None` (distances) or 0 (categories).

use serde::Serialize;

/// ADS-B version number announced in Operational Status (ME bits 41-43).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum AdsbVersion {
    /// DO-260
    #[default]
    V0,
    /// DO-260A
    V1,
    /// DO-260B
    V2,
}

impl AdsbVersion {
    /// Map the 3-bit version field. Reserved values 3-7 yield `None`.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(AdsbVersion::V0),
            1 => Some(AdsbVersion::V1),
            2 => Some(AdsbVersion::V2),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            AdsbVersion::V0 => 0,
            AdsbVersion::V1 => 1,
            AdsbVersion::V2 => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Airborne position (TC 0, 9-18, 20-22)
// ---------------------------------------------------------------------------

/// Horizontal containment radius limit in meters (version 0 table).
pub fn airborne_containment_radius_v0(tc: u8) -> Option<f64> {
    match tc {
        9 | 20 => Some(7.5),
        10 | 21 => Some(25.0),
        11 => Some(185.2),
        12 => Some(370.4),
        13 => Some(926.0),
        14 => Some(1852.0),
        15 => Some(3704.0),
        16 => Some(18520.0),
        17 => Some(37040.0),
        _ => None,
    }
}

/// Navigation integrity category (version 0 table).
pub fn airborne_nic_v0(tc: u8) -> u8 {
    match tc {
        9 | 20 => 11,
        10 | 21 => 10,
        11 => 9,
        12 => 7,
        13 => 6,
        14 => 5,
        15 => 4,
        16 => 3,
        17 => 1,
        _ => 0,
    }
}

/// Navigation accuracy category for position, as implied by a version 0
/// type code.
pub fn airborne_nacp_v0(tc: u8) -> u8 {
    match tc {
        9 | 20 => 11,
        10 | 21 => 10,
        11 => 8,
        12 => 7,
        13 => 6,
        14 => 5,
        15 => 4,
        16 | 17 => 1,
        _ => 0,
    }
}

/// Estimated position uncertainty in meters, as implied by a version 0
/// type code.
pub fn airborne_epu_v0(tc: u8) -> Option<f64> {
    match tc {
        9 => Some(3.0),
        10 => Some(10.0),
        11 => Some(92.6),
        12 => Some(185.2),
        13 => Some(463.0),
        14 => Some(926.0),
        15 => Some(1852.0),
        16 => Some(9260.0),
        17 => Some(18520.0),
        _ => None,
    }
}

/// Source integrity level implied by a version 0 type code.
pub fn airborne_sil_v0(tc: u8) -> u8 {
    match tc {
        9..=17 | 20 | 21 => 2,
        _ => 0,
    }
}

/// Containment radius in meters for any version.
///
/// `nic_a` comes from Operational Status; `nic_b` is the supplement bit of
/// the position message itself and only matters for version 2.
pub fn airborne_containment_radius(
    tc: u8,
    version: AdsbVersion,
    nic_a: bool,
    nic_b: bool,
) -> Option<f64> {
    match (version, tc) {
        (AdsbVersion::V0, _) => airborne_containment_radius_v0(tc),

        (AdsbVersion::V1, 11) => Some(if nic_a { 75.0 } else { 185.2 }),
        (AdsbVersion::V1, 13) => Some(if nic_a { 1111.2 } else { 926.0 }),
        (AdsbVersion::V1, 16) => Some(if nic_a { 7408.0 } else { 14816.0 }),

        (AdsbVersion::V2, 11) => Some(if nic_a && nic_b { 75.0 } else { 185.2 }),
        (AdsbVersion::V2, 13) => match (nic_a, nic_b) {
            (false, true) => Some(555.6),
            (false, false) => Some(926.0),
            (true, true) => Some(1111.2),
            (true, false) => None,
        },
        (AdsbVersion::V2, 16) => Some(if nic_a && nic_b { 7408.0 } else { 14816.0 }),

        _ => airborne_containment_radius_v0(tc),
    }
}

/// Navigation integrity category for any version.
pub fn airborne_nic(tc: u8, version: AdsbVersion, nic_a: bool, nic_b: bool) -> u8 {
    match (version, tc) {
        (AdsbVersion::V0, _) => airborne_nic_v0(tc),

        (AdsbVersion::V1, 11) => {
            if nic_a {
                9
            } else {
                8
            }
        }
        (AdsbVersion::V1, 16) => {
            if nic_a {
                3
            } else {
                2
            }
        }

        (AdsbVersion::V2, 11) => {
            if nic_a && nic_b {
                9
            } else {
                8
            }
        }
        (AdsbVersion::V2, 16) => {
            if nic_a && nic_b {
                3
            } else {
                2
            }
        }

        // TC 13 stays NIC 6 in every version
        _ => airborne_nic_v0(tc),
    }
}

// ---------------------------------------------------------------------------
// Surface position (TC 5-8)
// ---------------------------------------------------------------------------

/// Containment radius in meters of a surface position (version 0 table).
pub fn surface_containment_radius_v0(tc: u8) -> Option<f64> {
    match tc {
        5 => Some(7.5),
        6 => Some(25.0),
        7 => Some(185.2),
        _ => None,
    }
}

/// NIC of a surface position (version 0 table).
pub fn surface_nic_v0(tc: u8) -> u8 {
    match tc {
        5 => 11,
        6 => 10,
        7 => 8,
        _ => 0,
    }
}

/// NACp implied by a version 0 surface type code.
pub fn surface_nacp_v0(tc: u8) -> u8 {
    surface_nic_v0(tc)
}

/// EPU in meters implied by a version 0 surface type code.
pub fn surface_epu_v0(tc: u8) -> Option<f64> {
    match tc {
        5 => Some(3.0),
        6 => Some(10.0),
        7 => Some(92.6),
        _ => None,
    }
}

/// Containment radius in meters of a surface position for any version.
///
/// `nic_a` and `nic_c` both come from surface Operational Status.
pub fn surface_containment_radius(
    tc: u8,
    version: AdsbVersion,
    nic_a: bool,
    nic_c: bool,
) -> Option<f64> {
    match (version, tc) {
        (AdsbVersion::V0, _) => surface_containment_radius_v0(tc),
        (_, 7) => Some(if nic_a { 75.0 } else { 185.2 }),
        (AdsbVersion::V2, 8) => match (nic_a, nic_c) {
            (true, true) => Some(370.4),
            (true, false) => Some(555.6),
            (false, true) => Some(1111.2),
            (false, false) => None,
        },
        _ => surface_containment_radius_v0(tc),
    }
}

/// NIC of a surface position for any version.
pub fn surface_nic(tc: u8, version: AdsbVersion, nic_a: bool, nic_c: bool) -> u8 {
    match (version, tc) {
        (AdsbVersion::V0, _) => surface_nic_v0(tc),
        (_, 7) => {
            if nic_a {
                9
            } else {
                8
            }
        }
        (AdsbVersion::V2, 8) => match (nic_a, nic_c) {
            (true, true) => 7,
            (true, false) | (false, true) => 6,
            (false, false) => 0,
        },
        _ => surface_nic_v0(tc),
    }
}

// ---------------------------------------------------------------------------
// Category lookups
// ---------------------------------------------------------------------------

/// 95% bound on horizontal velocity error in m/s for a NACv category.
pub fn nacv_velocity_bound(nacv: u8) -> Option<f64> {
    match nacv {
        1 => Some(10.0),
        2 => Some(3.0),
        3 => Some(1.0),
        4 => Some(0.3),
        _ => None,
    }
}

/// 95% bound on horizontal position error (EPU) in meters for a NACp
/// category, as announced in Operational Status and Target State messages.
pub fn nacp_epu(nacp: u8) -> Option<f64> {
    match nacp {
        1 => Some(18520.0),
        2 => Some(7408.0),
        3 => Some(3704.0),
        4 => Some(1852.0),
        5 => Some(926.0),
        6 => Some(555.6),
        7 => Some(185.2),
        8 => Some(92.6),
        9 => Some(30.0),
        10 => Some(10.0),
        11 => Some(3.0),
        _ => None,
    }
}

/// Probability of exceeding the containment radius without alert.
pub fn sil_probability(sil: u8) -> &'static str {
    match sil {
        1 => "<= 1e-3",
        2 => "<= 1e-5",
        3 => "<= 1e-7",
        _ => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
