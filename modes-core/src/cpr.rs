//! Compact Position Reporting: global and local CPR decoding.
//!
//! Two decode modes:
//! - Global: requires an even+odd frame pair captured close together
//!   (10 s airborne, 25 s surface). Surface pairs additionally need a
//!   reference to pick the quadrant.
//! - Local: single frame + reference position. The reference must be closer
//!   than half a zone (~180 NM airborne, ~45 NM surface).
//!
//! Key constants:
//! - NZ = 15 (latitude zones per hemisphere for even frames)
//! - Dlat_even = span / (4 * NZ), Dlat_odd = span / (4 * NZ - 1)
//! - span = 360 degrees airborne, 90 degrees surface
//!
//! The engine holds no state. Pairing frames and remembering references is
//! the caller's job.

use serde::Serialize;
use tracing::trace;

use crate::types::{ModesError, Result};

/// Number of latitude zones per hemisphere.
const NZ: f64 = 15.0;

/// Maximum time between even/odd airborne frames for global decode (seconds).
pub const AIRBORNE_MAX_PAIR_INTERVAL: f64 = 10.0;

/// Maximum time between even/odd surface frames for global decode (seconds).
pub const SURFACE_MAX_PAIR_INTERVAL: f64 = 25.0;

/// Largest reference distance for which airborne local decode is unique.
pub const AIRBORNE_LOCAL_RANGE_NM: f64 = 180.0;

/// Largest reference distance for which surface local decode is unique.
pub const SURFACE_LOCAL_RANGE_NM: f64 = 45.0;

const EARTH_RADIUS_NM: f64 = 3440.065;

/// Candidates closer together than this (degrees, or zone fractions) are
/// treated as a tie.
const TIE_EPSILON: f64 = 1e-9;

/// Latitude breakpoints of the NL function, from 1090-WP-9-14.
///
/// Entry `k` is the upper bound of the band where NL = 59 - k. Above the last
/// entry NL is 1. Using the table instead of the closed-form `acos` avoids
/// encoder/decoder disagreement right at zone transitions.
const NL_TABLE: [f64; 58] = [
    10.47047130,
    14.82817437,
    18.18626357,
    21.02939493,
    23.54504487,
    25.82924707,
    27.93898710,
    29.91135686,
    31.77209708,
    33.53993436,
    35.22899598,
    36.85025108,
    38.41241892,
    39.92256684,
    41.38651832,
    42.80914012,
    44.19454951,
    45.54626723,
    46.86733252,
    48.16039128,
    49.42776439,
    50.67150166,
    51.89342469,
    53.09516153,
    54.27817472,
    55.44378444,
    56.59318756,
    57.72747354,
    58.84763776,
    59.95459277,
    61.04917774,
    62.13216659,
    63.20427479,
    64.26616523,
    65.31845310,
    66.36171008,
    67.39646774,
    68.42322022,
    69.44242631,
    70.45451075,
    71.45986473,
    72.45884545,
    73.45177442,
    74.43893416,
    75.42056257,
    76.39684391,
    77.36789461,
    78.33374083,
    79.29428225,
    80.24923213,
    81.19801349,
    82.13956981,
    83.07199445,
    83.99173563,
    84.89166191,
    85.75541621,
    86.53536998,
    87.00000000,
];

/// Number of longitude zones at a given latitude (NL function).
///
/// Ranges from 59 at the equator to 1 poleward of 87 degrees. Symmetric about
/// the equator.
pub fn nl(lat: f64) -> u32 {
    let lat = lat.abs();
    let band = NL_TABLE
        .iter()
        .position(|&bound| lat < bound)
        .unwrap_or(NL_TABLE.len());
    59 - band as u32
}

/// Modulo that always returns a non-negative result.
fn modulo(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

/// Wrap a longitude into (-180, 180].
fn wrap_longitude(lon: f64) -> f64 {
    let lon = lon.rem_euclid(360.0);
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Shortest angular distance between two longitudes.
fn longitude_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn ambiguous(reason: impl Into<String>) -> ModesError {
    let reason = reason.into();
    trace!(%reason, "CPR resolution rejected");
    ModesError::AmbiguousPosition(reason)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// CPR format flag carried in every position message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CprFormat {
    Even,
    Odd,
}

impl CprFormat {
    /// Map the F bit of a position message (1 = odd).
    pub fn from_odd_flag(odd: bool) -> Self {
        if odd {
            CprFormat::Odd
        } else {
            CprFormat::Even
        }
    }

    pub fn is_odd(self) -> bool {
        self == CprFormat::Odd
    }

    fn index(self) -> f64 {
        match self {
            CprFormat::Even => 0.0,
            CprFormat::Odd => 1.0,
        }
    }
}

/// A resolved WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }

    /// Finite and within [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    /// Great-circle distance in nautical miles (haversine).
    pub fn distance_nm(&self, other: &Position) -> f64 {
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (dlon / 2.0).sin().powi(2);
        EARTH_RADIUS_NM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Time and distance limits applied while resolving positions.
///
/// These are caller policy, not wall-clock state: the engine only compares
/// the timestamps and references it is handed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CprPolicy {
    /// Max seconds between an airborne even/odd pair.
    pub max_airborne_interval: f64,
    /// Max seconds between a surface even/odd pair.
    pub max_surface_interval: f64,
    /// Max distance of an airborne local-decode result from its reference.
    pub airborne_range_nm: f64,
    /// Max distance of a surface local-decode result from its reference.
    pub surface_range_nm: f64,
}

impl Default for CprPolicy {
    fn default() -> Self {
        CprPolicy {
            max_airborne_interval: AIRBORNE_MAX_PAIR_INTERVAL,
            max_surface_interval: SURFACE_MAX_PAIR_INTERVAL,
            airborne_range_nm: AIRBORNE_LOCAL_RANGE_NM,
            surface_range_nm: SURFACE_LOCAL_RANGE_NM,
        }
    }
}

/// One CPR-encoded position report, as carried by a position message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CprEncodedPosition {
    format: CprFormat,
    lat: u32,
    lon: u32,
    nbits: u8,
    surface: bool,
    timestamp: f64,
}

impl CprEncodedPosition {
    /// Build an encoded position. `nbits` is the encoding resolution: 17 for
    /// airborne and surface squitters, 14 for intent, 12 for coarse TIS-B.
    pub fn new(
        format: CprFormat,
        lat: u32,
        lon: u32,
        nbits: u8,
        surface: bool,
        timestamp: f64,
    ) -> Result<Self> {
        if !matches!(nbits, 12 | 14 | 17) {
            return Err(ModesError::BadFormat(format!(
                "unsupported CPR resolution: {nbits} bits"
            )));
        }
        let limit = 1u32 << nbits;
        if lat >= limit || lon >= limit {
            return Err(ModesError::BadFormat(format!(
                "CPR value ({lat}, {lon}) exceeds {nbits}-bit range"
            )));
        }
        Ok(CprEncodedPosition {
            format,
            lat,
            lon,
            nbits,
            surface,
            timestamp,
        })
    }

    pub fn format(&self) -> CprFormat {
        self.format
    }

    pub fn encoded_lat(&self) -> u32 {
        self.lat
    }

    pub fn encoded_lon(&self) -> u32 {
        self.lon
    }

    pub fn nbits(&self) -> u8 {
        self.nbits
    }

    pub fn is_surface(&self) -> bool {
        self.surface
    }

    /// Capture time in seconds, as supplied with the frame.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn scale(&self) -> f64 {
        f64::from(1u32 << self.nbits)
    }

    fn lat_fraction(&self) -> f64 {
        f64::from(self.lat) / self.scale()
    }

    fn lon_fraction(&self) -> f64 {
        f64::from(self.lon) / self.scale()
    }

    fn span(&self) -> f64 {
        if self.surface {
            90.0
        } else {
            360.0
        }
    }

    /// Global decode from this frame and one of the opposite format.
    ///
    /// The latitude/longitude of whichever frame was captured last is
    /// returned. Surface pairs need `reference` (receiver or last known
    /// position) to pick among the candidate quadrants; airborne pairs ignore
    /// it.
    pub fn decode_global(
        &self,
        other: &CprEncodedPosition,
        reference: Option<&Position>,
        policy: &CprPolicy,
    ) -> Result<Position> {
        let (even, odd) = match (self.format, other.format) {
            (CprFormat::Even, CprFormat::Odd) => (self, other),
            (CprFormat::Odd, CprFormat::Even) => (other, self),
            _ => return Err(ambiguous("global decode needs one even and one odd frame")),
        };
        if even.surface != odd.surface {
            return Err(ambiguous("cannot pair surface and airborne frames"));
        }
        if even.nbits != odd.nbits {
            return Err(ambiguous("cannot pair frames of different CPR resolution"));
        }

        let surface = even.surface;
        let max_interval = if surface {
            policy.max_surface_interval
        } else {
            policy.max_airborne_interval
        };
        let interval = (even.timestamp - odd.timestamp).abs();
        if interval > max_interval {
            return Err(ambiguous(format!(
                "frames {interval:.1}s apart, limit {max_interval:.1}s"
            )));
        }

        let span = even.span();
        let dlat_even = span / (4.0 * NZ);
        let dlat_odd = span / (4.0 * NZ - 1.0);

        let lat_even_cpr = even.lat_fraction();
        let lon_even_cpr = even.lon_fraction();
        let lat_odd_cpr = odd.lat_fraction();
        let lon_odd_cpr = odd.lon_fraction();

        // Latitude zone index
        let j = (59.0 * lat_even_cpr - 60.0 * lat_odd_cpr + 0.5).floor();

        let mut lat_e = dlat_even * (modulo(j, 60.0) + lat_even_cpr);
        let mut lat_o = dlat_odd * (modulo(j, 59.0) + lat_odd_cpr);

        if surface {
            let reference = reference
                .ok_or_else(|| ambiguous("surface global decode needs a reference position"))?;
            if !reference.is_valid() {
                return Err(ambiguous("invalid surface reference position"));
            }
            lat_e = nearest_surface_latitude(lat_e, reference.latitude)?;
            lat_o = nearest_surface_latitude(lat_o, reference.latitude)?;
        } else {
            if lat_e >= 270.0 {
                lat_e -= 360.0;
            }
            if lat_o >= 270.0 {
                lat_o -= 360.0;
            }
        }

        if lat_e.abs() > 90.0 || lat_o.abs() > 90.0 {
            return Err(ambiguous(format!(
                "latitude out of range (even {lat_e:.4}, odd {lat_o:.4})"
            )));
        }

        // Both latitudes must sit in the same longitude zone count
        if nl(lat_e) != nl(lat_o) {
            return Err(ambiguous("pair straddles an NL zone transition"));
        }

        let latest = if even.timestamp >= odd.timestamp {
            even
        } else {
            odd
        };
        let lat = if latest.format == CprFormat::Even {
            lat_e
        } else {
            lat_o
        };

        let nl_val = f64::from(nl(lat));
        let n_lon = (nl_val - latest.format.index()).max(1.0);
        let dlon = span / n_lon;
        let m = (lon_even_cpr * (nl_val - 1.0) - lon_odd_cpr * nl_val + 0.5).floor();
        let lon = dlon * (modulo(m, n_lon) + latest.lon_fraction());

        let lon = match reference {
            Some(reference) if surface => nearest_surface_longitude(lon, reference.longitude)?,
            _ => wrap_longitude(lon),
        };

        Ok(Position::new(lat, lon))
    }

    /// Local decode against a reference position.
    ///
    /// Picks the latitude zone, then the longitude zone, nearest the
    /// reference. Fails if the reference is invalid, if it sits exactly on a
    /// half-zone boundary, or if the result lies beyond the policy range from
    /// the reference (the reference is too old to be trusted).
    pub fn decode_local(&self, reference: &Position, policy: &CprPolicy) -> Result<Position> {
        if !reference.is_valid() {
            return Err(ambiguous(format!(
                "invalid reference position ({}, {})",
                reference.latitude, reference.longitude
            )));
        }

        let span = self.span();
        let i = self.format.index();
        let dlat = span / (4.0 * NZ - i);
        let lat_cpr = self.lat_fraction();
        let lon_cpr = self.lon_fraction();

        let lat_offset = modulo(reference.latitude, dlat) / dlat - lat_cpr;
        ensure_unique_zone(lat_offset, "latitude")?;
        let j = (reference.latitude / dlat).floor() + (0.5 + lat_offset).floor();
        let lat = dlat * (j + lat_cpr);
        if lat.abs() > 90.0 {
            return Err(ambiguous(format!("latitude {lat:.4} out of range")));
        }

        let nl_val = f64::from(nl(lat));
        let n_lon = (nl_val - i).max(1.0);
        let dlon = span / n_lon;

        let lon_offset = modulo(reference.longitude, dlon) / dlon - lon_cpr;
        ensure_unique_zone(lon_offset, "longitude")?;
        let m = (reference.longitude / dlon).floor() + (0.5 + lon_offset).floor();
        let lon = wrap_longitude(dlon * (m + lon_cpr));

        let position = Position::new(lat, lon);
        let range = if self.surface {
            policy.surface_range_nm
        } else {
            policy.airborne_range_nm
        };
        let distance = position.distance_nm(reference);
        if distance > range {
            return Err(ambiguous(format!(
                "result {distance:.1} NM from reference, limit {range:.1} NM"
            )));
        }

        Ok(position)
    }
}

/// The reference is exactly half a zone from two candidates when
/// `0.5 + offset` lands on an integer.
fn ensure_unique_zone(offset: f64, axis: &str) -> Result<()> {
    let frac = (0.5 + offset).rem_euclid(1.0);
    if frac < TIE_EPSILON || frac > 1.0 - TIE_EPSILON {
        return Err(ambiguous(format!(
            "reference on a {axis} half-zone boundary"
        )));
    }
    Ok(())
}

/// Surface latitudes are only known modulo 90 degrees: pick the northern or
/// southern solution nearest the reference.
fn nearest_surface_latitude(lat: f64, ref_lat: f64) -> Result<f64> {
    let north = lat;
    let south = lat - 90.0;
    let d_north = (north - ref_lat).abs();
    let d_south = (south - ref_lat).abs();
    if (d_north - d_south).abs() < TIE_EPSILON {
        return Err(ambiguous("reference equidistant from both surface latitudes"));
    }
    Ok(if d_north < d_south { north } else { south })
}

/// Surface longitudes are only known modulo 90 degrees: pick the quadrant
/// nearest the reference.
fn nearest_surface_longitude(lon: f64, ref_lon: f64) -> Result<f64> {
    let mut candidates: Vec<(f64, f64)> = (0..4)
        .map(|k| {
            let candidate = wrap_longitude(lon + 90.0 * f64::from(k));
            (longitude_delta(candidate, ref_lon), candidate)
        })
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    if (candidates[1].0 - candidates[0].0).abs() < TIE_EPSILON {
        return Err(ambiguous("reference equidistant from two surface longitudes"));
    }
    Ok(candidates[0].1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
