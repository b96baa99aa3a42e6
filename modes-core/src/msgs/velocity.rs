//! TC 19: airborne velocity.
//!
//! Subtypes 1/2 carry velocity over ground as east/west and north/south
//! components; subtypes 3/4 carry airspeed and magnetic heading. Subtypes 2
//! and 4 are the supersonic variants (4x speed resolution).
//! Both share the vertical rate and GNSS-minus-baro difference tail.

use serde::Serialize;

use super::{FromFrame, SquitterHeader};
use crate::accuracy;
use crate::bits::{me_field, me_flag};
use crate::frame::ModeFrame;
use crate::types::{ModesError, Result};

/// Fields after the speed data, identical in all subtypes (ME bits 36-56).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerticalInfo {
    /// Vertical rate source: barometric if true, GNSS if false
    pub barometric_source: bool,
    pub descending: bool,
    pub rate_code: u16,
    /// GNSS altitude below barometric altitude
    pub geo_below_baro: bool,
    pub geo_minus_baro_code: u8,
}

impl VerticalInfo {
    fn parse(me: u64) -> Self {
        VerticalInfo {
            barometric_source: me_flag(me, 36),
            descending: me_flag(me, 37),
            rate_code: me_field(me, 38, 9) as u16,
            geo_below_baro: me_flag(me, 49),
            geo_minus_baro_code: me_field(me, 50, 7) as u8,
        }
    }

    /// Vertical rate in ft/min, negative when descending.
    pub fn vertical_rate_fpm(&self) -> Option<i32> {
        if self.rate_code == 0 {
            return None;
        }
        let rate = (i32::from(self.rate_code) - 1) * 64;
        Some(if self.descending { -rate } else { rate })
    }

    /// GNSS altitude minus barometric altitude in feet.
    pub fn geo_minus_baro_ft(&self) -> Option<i32> {
        if self.geo_minus_baro_code == 0 {
            return None;
        }
        let diff = (i32::from(self.geo_minus_baro_code) - 1) * 25;
        Some(if self.geo_below_baro { -diff } else { diff })
    }
}

/// ME bits 9-13, common to all subtypes.
fn velocity_flags(me: u64) -> (bool, bool, u8) {
    (me_flag(me, 9), me_flag(me, 10), me_field(me, 11, 3) as u8)
}

fn check_subtype(me: u64, allowed: [u32; 2], what: &str) -> Result<u8> {
    let subtype = me_field(me, 6, 3);
    if !allowed.contains(&subtype) {
        return Err(ModesError::BadFormat(format!(
            "velocity subtype {subtype} is not {what}"
        )));
    }
    Ok(subtype as u8)
}

// ---------------------------------------------------------------------------
// Subtypes 1/2: velocity over ground
// ---------------------------------------------------------------------------

/// Velocity over ground.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityOverGround {
    #[serde(flatten)]
    pub header: SquitterHeader,
    pub subtype: u8,
    /// Intent change flag (IMF for ADS-R and TIS-B)
    pub intent_change: bool,
    pub ifr_capability: bool,
    pub nacv: u8,
    pub west: bool,
    pub east_west_code: u16,
    pub south: bool,
    pub north_south_code: u16,
    pub vertical: VerticalInfo,
}

impl FromFrame for VelocityOverGround {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(frame, &[19..=19], "velocity message")?;
        let subtype = check_subtype(me, [1, 2], "velocity over ground")?;
        let (intent_change, ifr_capability, nacv) = velocity_flags(me);
        Ok(VelocityOverGround {
            header,
            subtype,
            intent_change,
            ifr_capability,
            nacv,
            west: me_flag(me, 14),
            east_west_code: me_field(me, 15, 10) as u16,
            south: me_flag(me, 25),
            north_south_code: me_field(me, 26, 10) as u16,
            vertical: VerticalInfo::parse(me),
        })
    }
}

impl VelocityOverGround {
    pub fn is_supersonic(&self) -> bool {
        self.subtype == 2
    }

    fn component(&self, code: u16, negative: bool) -> Option<i32> {
        if code == 0 {
            return None;
        }
        let mut speed = i32::from(code) - 1;
        if self.is_supersonic() {
            speed *= 4;
        }
        Some(if negative { -speed } else { speed })
    }

    /// Eastward velocity in knots (negative = westward).
    pub fn east_velocity_kts(&self) -> Option<i32> {
        self.component(self.east_west_code, self.west)
    }

    /// Northward velocity in knots (negative = southward).
    pub fn north_velocity_kts(&self) -> Option<i32> {
        self.component(self.north_south_code, self.south)
    }

    pub fn has_velocity_info(&self) -> bool {
        self.east_west_code != 0 && self.north_south_code != 0
    }

    /// Ground speed in knots.
    pub fn ground_speed_kts(&self) -> Option<f64> {
        let east = f64::from(self.east_velocity_kts()?);
        let north = f64::from(self.north_velocity_kts()?);
        Some(east.hypot(north))
    }

    /// Track angle in degrees clockwise from true north, in [0, 360).
    pub fn track_deg(&self) -> Option<f64> {
        let east = f64::from(self.east_velocity_kts()?);
        let north = f64::from(self.north_velocity_kts()?);
        Some(east.atan2(north).to_degrees().rem_euclid(360.0))
    }

    pub fn vertical_rate_fpm(&self) -> Option<i32> {
        self.vertical.vertical_rate_fpm()
    }

    pub fn geo_minus_baro_ft(&self) -> Option<i32> {
        self.vertical.geo_minus_baro_ft()
    }

    /// 95% horizontal velocity error bound in m/s from NACv.
    pub fn velocity_accuracy_bound(&self) -> Option<f64> {
        accuracy::nacv_velocity_bound(self.nacv)
    }
}

// ---------------------------------------------------------------------------
// Subtypes 3/4: airspeed and heading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirspeedType {
    Indicated,
    True,
}

/// Airspeed and heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirspeedHeading {
    #[serde(flatten)]
    pub header: SquitterHeader,
    pub subtype: u8,
    pub intent_change: bool,
    pub ifr_capability: bool,
    pub nacv: u8,
    pub heading_available: bool,
    pub heading_code: u16,
    pub airspeed_type: AirspeedType,
    pub airspeed_code: u16,
    pub vertical: VerticalInfo,
}

impl FromFrame for AirspeedHeading {
    fn from_frame(frame: &ModeFrame) -> Result<Self> {
        let (header, me) = SquitterHeader::parse(frame, &[19..=19], "velocity message")?;
        let subtype = check_subtype(me, [3, 4], "airspeed and heading")?;
        let (intent_change, ifr_capability, nacv) = velocity_flags(me);
        Ok(AirspeedHeading {
            header,
            subtype,
            intent_change,
            ifr_capability,
            nacv,
            heading_available: me_flag(me, 14),
            heading_code: me_field(me, 15, 10) as u16,
            airspeed_type: if me_flag(me, 25) {
                AirspeedType::True
            } else {
                AirspeedType::Indicated
            },
            airspeed_code: me_field(me, 26, 10) as u16,
            vertical: VerticalInfo::parse(me),
        })
    }
}

impl AirspeedHeading {
    pub fn is_supersonic(&self) -> bool {
        self.subtype == 4
    }

    /// Magnetic heading in degrees, 360/1024 steps.
    pub fn heading_deg(&self) -> Option<f64> {
        self.heading_available
            .then(|| f64::from(self.heading_code) * 360.0 / 1024.0)
    }

    /// Airspeed in knots.
    pub fn airspeed_kts(&self) -> Option<u32> {
        if self.airspeed_code == 0 {
            return None;
        }
        let speed = u32::from(self.airspeed_code) - 1;
        Some(if self.is_supersonic() { speed * 4 } else { speed })
    }

    pub fn vertical_rate_fpm(&self) -> Option<i32> {
        self.vertical.vertical_rate_fpm()
    }

    pub fn geo_minus_baro_ft(&self) -> Option<i32> {
        self.vertical.geo_minus_baro_ft()
    }

    pub fn velocity_accuracy_bound(&self) -> Option<f64> {
        accuracy::nacv_velocity_bound(self.nacv)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
