//! Per-aircraft state accumulated while decoding a capture.
//!
//! Pairs even/odd CPR frames per address, falls back to local decoding
//! against the last resolved position or the receiver, and remembers the
//! ADS-B version and NIC supplements announced in Operational Status so
//! later position messages are interpreted correctly.

use std::collections::HashMap;

use tracing::debug;

use modes_core::msgs::position::{AirbornePosition, SurfacePosition};
use modes_core::{AdsbVersion, CprFormat, CprPolicy, DecodedMsg, Icao, NicSupplements, Position};

/// Accumulated aircraft state from decoded messages.
#[derive(Debug, Clone)]
pub struct AircraftState {
    pub icao: Icao,
    pub callsign: Option<String>,
    pub squawk: Option<String>,
    pub altitude_ft: Option<i32>,
    pub speed_kts: Option<f64>,
    pub track_deg: Option<f64>,
    pub vertical_rate: Option<i32>,
    pub position: Option<Position>,
    pub on_ground: bool,
    pub version: Option<AdsbVersion>,
    pub supplements: NicSupplements,
    pub messages: u32,
    // CPR pairing state
    airborne_even: Option<AirbornePosition>,
    airborne_odd: Option<AirbornePosition>,
    surface_even: Option<SurfacePosition>,
    surface_odd: Option<SurfacePosition>,
}

impl AircraftState {
    fn new(icao: Icao) -> Self {
        AircraftState {
            icao,
            callsign: None,
            squawk: None,
            altitude_ft: None,
            speed_kts: None,
            track_deg: None,
            vertical_rate: None,
            position: None,
            on_ground: false,
            version: None,
            supplements: NicSupplements::default(),
            messages: 0,
            airborne_even: None,
            airborne_odd: None,
            surface_even: None,
            surface_odd: None,
        }
    }
}

/// Aircraft table keyed by address.
pub struct Tracker {
    aircraft: HashMap<Icao, AircraftState>,
    policy: CprPolicy,
    receiver: Option<Position>,
    default_version: AdsbVersion,
}

impl Tracker {
    pub fn new(policy: CprPolicy, receiver: Option<Position>, default_version: AdsbVersion) -> Self {
        Tracker {
            aircraft: HashMap::new(),
            policy,
            receiver,
            default_version,
        }
    }

    pub fn aircraft(&self) -> impl Iterator<Item = &AircraftState> {
        self.aircraft.values()
    }

    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    /// Re-interpret a position message with what is known about its sender.
    pub fn refine(&self, msg: DecodedMsg) -> DecodedMsg {
        let Some(state) = msg.icao().and_then(|icao| self.aircraft.get(&icao)) else {
            return msg;
        };
        let version = state.version.unwrap_or(self.default_version);
        match msg {
            DecodedMsg::AirbornePosition(m) => DecodedMsg::AirbornePosition(
                m.with_version(version)
                    .with_nic_supplements(state.supplements),
            ),
            DecodedMsg::SurfacePosition(m) => DecodedMsg::SurfacePosition(
                m.with_version(version)
                    .with_nic_supplements(state.supplements),
            ),
            other => other,
        }
    }

    /// Fold a message into the aircraft table. Returns the position
    /// resolved from it, if any.
    pub fn update(&mut self, msg: &DecodedMsg) -> Option<Position> {
        let icao = msg.icao()?;
        let policy = self.policy;
        let receiver = self.receiver;
        let state = self
            .aircraft
            .entry(icao)
            .or_insert_with(|| AircraftState::new(icao));
        state.messages += 1;

        match msg {
            DecodedMsg::Identification(m) => {
                if m.has_valid_callsign() {
                    state.callsign = Some(m.callsign.clone());
                }
            }
            DecodedMsg::AirbornePosition(m) => {
                state.on_ground = false;
                if let Some(alt) = m.altitude_ft() {
                    state.altitude_ft = Some(alt);
                }
                return resolve_airborne(state, m, &policy, receiver.as_ref());
            }
            DecodedMsg::SurfacePosition(m) => {
                state.on_ground = true;
                state.speed_kts = m.ground_speed_kts().or(state.speed_kts);
                state.track_deg = m.ground_track_deg().or(state.track_deg);
                return resolve_surface(state, m, &policy, receiver.as_ref());
            }
            DecodedMsg::VelocityOverGround(m) => {
                state.speed_kts = m.ground_speed_kts();
                state.track_deg = m.track_deg();
                state.vertical_rate = m.vertical_rate_fpm();
            }
            DecodedMsg::AirspeedHeading(m) => {
                state.speed_kts = m.airspeed_kts().map(f64::from);
                state.track_deg = m.heading_deg();
                state.vertical_rate = m.vertical_rate_fpm();
            }
            DecodedMsg::EmergencyStatus(m) => {
                state.squawk = Some(m.identity());
            }
            DecodedMsg::OperationalStatus(m) => {
                // reserved version numbers come from transmitters newer than V2
                let version = m.version().unwrap_or(AdsbVersion::V2);
                if state.version != Some(version) {
                    debug!(icao = %modes_core::icao_to_string(&icao), version = version.number(), "learned ADS-B version");
                }
                state.version = Some(version);
                // NIC-C is only carried by the surface format
                let learned = m.nic_supplements();
                state.supplements.nic_a = learned.nic_a;
                if m.is_surface() {
                    state.supplements.nic_c = learned.nic_c;
                }
            }
            _ => {}
        }
        None
    }
}

fn resolve_airborne(
    state: &mut AircraftState,
    msg: &AirbornePosition,
    policy: &CprPolicy,
    receiver: Option<&Position>,
) -> Option<Position> {
    let cpr = msg.cpr_position()?;
    let other = match cpr.format() {
        CprFormat::Even => {
            state.airborne_even = Some(msg.clone());
            state.airborne_odd.as_ref()
        }
        CprFormat::Odd => {
            state.airborne_odd = Some(msg.clone());
            state.airborne_even.as_ref()
        }
    };

    let global = other.map(|other| msg.decode_global(other, policy));
    let resolved = match global {
        Some(Ok(pos)) => Some(pos),
        _ => {
            let reference = state.position.as_ref().or(receiver)?;
            match msg.decode_local(reference, policy) {
                Ok(pos) => Some(pos),
                Err(e) => {
                    debug!(icao = %msg.header.icao_hex(), "airborne position unresolved: {e}");
                    None
                }
            }
        }
    };
    if resolved.is_some() {
        state.position = resolved;
    }
    resolved
}

fn resolve_surface(
    state: &mut AircraftState,
    msg: &SurfacePosition,
    policy: &CprPolicy,
    receiver: Option<&Position>,
) -> Option<Position> {
    let other = match msg.cpr.format() {
        CprFormat::Even => {
            state.surface_even = Some(msg.clone());
            state.surface_odd.as_ref()
        }
        CprFormat::Odd => {
            state.surface_odd = Some(msg.clone());
            state.surface_even.as_ref()
        }
    };

    // surface decoding always needs a reference for the quadrant
    let reference = *state.position.as_ref().or(receiver)?;
    let resolved = other
        .and_then(|other| msg.decode_global(other, &reference, policy).ok())
        .or_else(|| match msg.decode_local(&reference, policy) {
            Ok(pos) => Some(pos),
            Err(e) => {
                debug!(icao = %msg.header.icao_hex(), "surface position unresolved: {e}");
                None
            }
        });
    if resolved.is_some() {
        state.position = resolved;
    }
    resolved
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use modes_core::decode_hex;

    fn feed(tracker: &mut Tracker, hex: &str, ts: f64) -> Option<Position> {
        let msg = tracker.refine(decode_hex(hex, ts).unwrap());
        tracker.update(&msg)
    }

    #[test]
    fn test_airborne_pair_resolves() {
        let mut tracker = Tracker::new(CprPolicy::default(), None, AdsbVersion::V0);
        assert!(feed(&mut tracker, "8D40621D58C382D690C8AC2863A7", 1.0).is_none());
        let pos = feed(&mut tracker, "8D40621D58C386435CC412692AD6", 2.0).unwrap();
        assert!((pos.latitude - 52.2657).abs() < 0.001, "lat {}", pos.latitude);
        assert!((pos.longitude - 3.9389).abs() < 0.001, "lon {}", pos.longitude);

        let ac = tracker.aircraft().next().unwrap();
        assert_eq!(ac.altitude_ft, Some(38000));
        assert_eq!(ac.messages, 2);
        assert_eq!(ac.position, Some(pos));
    }

    #[test]
    fn test_single_frame_uses_receiver_reference() {
        let receiver = Position::new(52.0, 4.0);
        let mut tracker = Tracker::new(CprPolicy::default(), Some(receiver), AdsbVersion::V0);
        let pos = feed(&mut tracker, "8D40621D58C382D690C8AC2863A7", 1.0).unwrap();
        assert!((pos.latitude - 52.2572).abs() < 0.001, "lat {}", pos.latitude);
    }

    #[test]
    fn test_surface_needs_reference() {
        let mut tracker = Tracker::new(CprPolicy::default(), None, AdsbVersion::V0);
        assert!(feed(&mut tracker, "8C4841753AAB238733C8CD4020B1", 1.0).is_none());
        assert!(feed(&mut tracker, "8C4841753A8A35323FAEBDAC702D", 2.0).is_none());
        let ac = tracker.aircraft().next().unwrap();
        assert!(ac.on_ground);
        assert_eq!(ac.speed_kts, Some(16.0));

        let mut tracker = Tracker::new(
            CprPolicy::default(),
            Some(Position::new(51.990, 4.375)),
            AdsbVersion::V0,
        );
        feed(&mut tracker, "8C4841753AAB238733C8CD4020B1", 1.0);
        let pos = feed(&mut tracker, "8C4841753A8A35323FAEBDAC702D", 2.0).unwrap();
        assert!((pos.latitude - 52.32061).abs() < 0.001, "lat {}", pos.latitude);
        assert!((pos.longitude - 4.73473).abs() < 0.001, "lon {}", pos.longitude);
    }

    #[test]
    fn test_operational_status_refines_positions() {
        let mut tracker = Tracker::new(CprPolicy::default(), None, AdsbVersion::V0);
        // V2 airborne operational status with NIC-A set, same address
        feed(&mut tracker, "8D4840D6F8330002005AB8000000", 1.0);
        let ac = tracker.aircraft().next().unwrap();
        assert_eq!(ac.version, Some(AdsbVersion::V2));
        assert!(ac.supplements.nic_a);

        // Airborne position from the same address picks up version and NIC-A
        let msg = tracker.refine(decode_hex("8D4840D658C382D690C8AC2863A7", 2.0).unwrap());
        match msg {
            DecodedMsg::AirbornePosition(m) => {
                assert_eq!(m.version(), AdsbVersion::V2);
                assert!(m.supplements().nic_a);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_airborne_status_keeps_surface_nic_c() {
        let mut tracker = Tracker::new(CprPolicy::default(), None, AdsbVersion::V0);
        // surface V2 status: NIC-C set, NIC-A clear
        feed(&mut tracker, "8D4840D6F930550441492C000000", 1.0);
        let ac = tracker.aircraft().next().unwrap();
        assert!(ac.supplements.nic_c);
        assert!(!ac.supplements.nic_a);

        // airborne V2 status: NIC-A set, no NIC-C field
        feed(&mut tracker, "8D4840D6F8330002005AB8000000", 2.0);
        let ac = tracker.aircraft().next().unwrap();
        assert!(ac.supplements.nic_a);
        assert!(ac.supplements.nic_c);
    }

    #[test]
    fn test_identification_and_velocity() {
        let mut tracker = Tracker::new(CprPolicy::default(), None, AdsbVersion::V0);
        feed(&mut tracker, "8D4840D6202CC371C32CE0576098", 1.0);
        feed(&mut tracker, "8D485020994409940838175B284F", 1.5);
        assert_eq!(tracker.len(), 2);

        let mut states: Vec<_> = tracker.aircraft().collect();
        states.sort_by_key(|a| a.icao);
        assert_eq!(states[0].callsign.as_deref(), Some("KLM1023"));
        assert_eq!(states[1].vertical_rate, Some(-832));
        assert!((states[1].speed_kts.unwrap() - 159.2).abs() < 0.1);
    }

    #[test]
    fn test_replies_without_address_are_ignored() {
        let mut tracker = Tracker::new(CprPolicy::default(), None, AdsbVersion::V0);
        assert!(feed(&mut tracker, "20000F1F684A6C", 1.0).is_none());
        assert!(tracker.is_empty());
    }
}
