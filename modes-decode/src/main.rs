//! modes-decode: command-line Mode S / ADS-B frame decoder.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use modes_core::config::{self, Config};
use modes_core::types::icao_from_hex;
use modes_core::{
    decode, icao_to_string, AdsbVersion, DecodeOptions, DecodedMsg, Icao, ModeFrame, ModesError,
    Position,
};

mod tracker;

use tracker::Tracker;

#[derive(Parser)]
#[command(name = "modes", version, about = "Mode S / ADS-B / ADS-R frame decoder")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ~/.modes-decode/config.yaml)
    #[arg(long, global = true, env = "MODES_DECODE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode hex frames from a file ("-" for stdin), one per line
    Decode {
        /// Path to file containing hex frames, optionally "hex;timestamp"
        file: PathBuf,

        /// Print one JSON object per message
        #[arg(long)]
        json: bool,

        /// Print an aircraft table instead of individual messages
        #[arg(short, long)]
        summary: bool,

        /// Only show messages from this address (6 hex digits)
        #[arg(long)]
        icao: Option<String>,

        /// ADS-B version assumed until Operational Status says otherwise
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        version_hint: Option<u8>,
    },

    /// Decode a single hex frame
    Frame {
        hex: String,

        #[arg(long)]
        json: bool,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        version_hint: Option<u8>,
    },

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Decode {
            file,
            json,
            summary,
            icao,
            version_hint,
        } => cmd_decode(&file, &config, json, summary, icao.as_deref(), version_hint),
        Commands::Frame {
            hex,
            json,
            version_hint,
        } => cmd_frame(&hex, &config, json, version_hint),
        Commands::Config { init } => cmd_config(&config, cli.config.as_deref(), init),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` applies unless `-v` is given.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> modes_core::Result<Config> {
    match path {
        Some(p) => config::load_config_from(p),
        None => config::load_config(),
    }
}

fn decode_options(config: &Config, version_hint: Option<u8>) -> DecodeOptions {
    DecodeOptions {
        version: version_hint
            .and_then(AdsbVersion::from_number)
            .unwrap_or(config.decoder.adsb_version),
    }
}

/// Split "hex" or "hex;timestamp". Lines without a timestamp get `fallback`.
fn parse_line(line: &str, fallback: f64) -> Option<(&str, f64)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(match line.split_once(';') {
        Some((h, t)) => (h.trim(), t.trim().parse::<f64>().unwrap_or(fallback)),
        None => (line, fallback),
    })
}

#[derive(Default)]
struct DecodeStats {
    total: u64,
    decoded: u64,
    unspecified: u64,
    malformed: u64,
}

/// JSON line: the message plus the position resolved from it.
#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    msg: &'a DecodedMsg,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

fn cmd_decode(
    file: &Path,
    config: &Config,
    json: bool,
    summary: bool,
    icao: Option<&str>,
    version_hint: Option<u8>,
) -> modes_core::Result<()> {
    let filter: Option<Icao> = match icao {
        Some(hex) => Some(
            icao_from_hex(hex).ok_or_else(|| ModesError::InvalidHex(hex.to_string()))?,
        ),
        None => None,
    };

    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(io::BufReader::new(std::fs::File::open(file)?))
    };

    let opts = decode_options(config, version_hint);
    let mut tracker = Tracker::new(config.cpr_policy(), config.receiver_position(), opts.version);
    let mut stats = DecodeStats::default();
    let mut timestamp = 0.0f64;

    for line in reader.lines() {
        let line = line?;
        let Some((hex, ts)) = parse_line(&line, timestamp) else {
            continue;
        };
        timestamp = ts + 0.1; // Auto-increment for files without timestamps
        stats.total += 1;

        let msg = match ModeFrame::from_hex(hex, ts).and_then(|frame| decode(&frame, &opts)) {
            Ok(msg) => msg,
            Err(e) if e.is_unspecified() => {
                stats.unspecified += 1;
                continue;
            }
            Err(e) => {
                stats.malformed += 1;
                debug!("skipping {hex}: {e}");
                continue;
            }
        };
        stats.decoded += 1;

        let msg = tracker.refine(msg);
        let position = tracker.update(&msg);

        if summary || filter.is_some_and(|f| msg.icao() != Some(f)) {
            continue;
        }
        print_message(&msg, position, json)?;
    }

    if stats.malformed > 0 {
        warn!("{} malformed frames skipped", stats.malformed);
    }
    if summary {
        print_summary(&tracker, &stats, filter);
    }
    Ok(())
}

fn cmd_frame(
    hex: &str,
    config: &Config,
    json: bool,
    version_hint: Option<u8>,
) -> modes_core::Result<()> {
    let frame = ModeFrame::from_hex(hex, 0.0)?;
    let msg = decode(&frame, &decode_options(config, version_hint))?;
    if !json {
        println!(
            "DF{} ({}), {} bits",
            frame.df(),
            frame.df_name(),
            frame.msg_bits()
        );
    }
    print_message(&msg, None, json)
}

fn cmd_config(config: &Config, path: Option<&Path>, init: bool) -> modes_core::Result<()> {
    let path = match (init, path) {
        (true, Some(p)) => {
            config::save_config_to(config, p)?;
            p.to_path_buf()
        }
        (true, None) => config::save_config(config)?,
        (false, Some(p)) => p.to_path_buf(),
        (false, None) => config::config_file(),
    };
    if init {
        println!("# written to {}", path.display());
    } else {
        println!("# {}", path.display());
    }
    print!("{}", config::serialize_config(config));
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_message(msg: &DecodedMsg, position: Option<Position>, json: bool) -> modes_core::Result<()> {
    if json {
        let line = serde_json::to_string(&JsonLine { msg, position })
            .map_err(|e| ModesError::BadFormat(e.to_string()))?;
        println!("{line}");
    } else {
        let mut text = describe(msg);
        if let Some(pos) = position {
            text.push_str(&format!(" pos={:.5},{:.5}", pos.latitude, pos.longitude));
        }
        println!("{text}");
    }
    Ok(())
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn opt1(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".into())
}

/// One-line human readable description of a message.
fn describe(msg: &DecodedMsg) -> String {
    let who = msg
        .icao()
        .map(|icao| icao_to_string(&icao))
        .unwrap_or_else(|| "------".into());
    let detail = match msg {
        DecodedMsg::ShortAcas(m) => format!("alt={}ft sl={}", opt(m.altitude_ft()), m.sensitivity_level),
        DecodedMsg::AltitudeReply(m) => format!("alt={}ft", opt(m.altitude_ft())),
        DecodedMsg::IdentifyReply(m) => format!("squawk={}", m.identity()),
        DecodedMsg::AllCallReply(m) => format!("ca={}", m.capability),
        DecodedMsg::LongAcas(m) => format!(
            "alt={}ft ra={}",
            opt(m.altitude_ft()),
            m.is_resolution_advisory()
        ),
        DecodedMsg::CommBAltitudeReply(m) => format!("alt={}ft", opt(m.altitude_ft())),
        DecodedMsg::CommBIdentifyReply(m) => format!("squawk={}", m.identity()),
        DecodedMsg::CommDExtendedLength(m) => format!("seq={} ack={}", m.sequence_number, m.ack),
        DecodedMsg::MilitaryExtendedSquitter(m) => format!("af={}", m.application_field),
        DecodedMsg::Identification(m) => format!(
            "callsign={} category={}{}",
            m.callsign,
            m.category_set(),
            m.emitter_category
        ),
        DecodedMsg::AirbornePosition(m) => format!(
            "alt={}ft nic={} rc={}m v{}",
            opt(m.altitude_ft()),
            m.nic(),
            opt1(m.containment_radius_m()),
            m.version().number()
        ),
        DecodedMsg::SurfacePosition(m) => format!(
            "gs={}kt trk={} nic={}",
            opt1(m.ground_speed_kts()),
            opt1(m.ground_track_deg()),
            m.nic()
        ),
        DecodedMsg::VelocityOverGround(m) => format!(
            "gs={}kt trk={} vr={}fpm",
            opt1(m.ground_speed_kts()),
            opt1(m.track_deg()),
            opt(m.vertical_rate_fpm())
        ),
        DecodedMsg::AirspeedHeading(m) => format!(
            "{:?}={}kt hdg={} vr={}fpm",
            m.airspeed_type,
            opt(m.airspeed_kts()),
            opt1(m.heading_deg()),
            opt(m.vertical_rate_fpm())
        ),
        DecodedMsg::EmergencyStatus(m) => format!(
            "squawk={} emergency=\"{}\"",
            m.identity(),
            m.emergency_description()
        ),
        DecodedMsg::AcasResolutionAdvisory(m) => format!(
            "ara={:#06x} terminated={}",
            m.active_advisories, m.terminated
        ),
        DecodedMsg::TargetStateAndStatus(m) => format!(
            "sel_alt={}ft baro={}mb sel_hdg={}",
            opt(m.selected_altitude_ft()),
            opt1(m.barometric_setting_mbar()),
            opt1(m.selected_heading_deg())
        ),
        DecodedMsg::OperationalStatus(m) => format!(
            "version={} nacp={} sil={} nic_a={}",
            m.version_number,
            opt(m.nacp()),
            opt(m.sil()),
            m.nic_supplement_a
        ),
    };
    format!("{who} {:?} {detail}", msg.tag())
}

fn print_summary(tracker: &Tracker, stats: &DecodeStats, filter: Option<Icao>) {
    println!();
    println!(
        "Frames: {} read, {} decoded, {} unspecified, {} malformed, {} aircraft",
        stats.total,
        stats.decoded,
        stats.unspecified,
        stats.malformed,
        tracker.len()
    );
    println!();

    if tracker.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ICAO", "Callsign", "Squawk", "Alt (ft)", "Speed (kts)", "Trk", "VRate", "Lat", "Lon",
        "Ver", "Msgs",
    ]);

    let mut sorted: Vec<_> = tracker
        .aircraft()
        .filter(|ac| filter.map_or(true, |f| ac.icao == f))
        .collect();
    sorted.sort_by_key(|a| std::cmp::Reverse(a.messages));

    for ac in sorted {
        table.add_row(vec![
            Cell::new(icao_to_string(&ac.icao)),
            Cell::new(ac.callsign.as_deref().unwrap_or("-")),
            Cell::new(ac.squawk.as_deref().unwrap_or("-")),
            Cell::new(opt(ac.altitude_ft)),
            Cell::new(ac.speed_kts.map(|s| format!("{s:.0}")).unwrap_or("-".into())),
            Cell::new(opt1(ac.track_deg)),
            Cell::new(ac.vertical_rate.map(|v| format!("{v:+}")).unwrap_or("-".into())),
            Cell::new(ac.position.map(|p| format!("{:.4}", p.latitude)).unwrap_or("-".into())),
            Cell::new(ac.position.map(|p| format!("{:.4}", p.longitude)).unwrap_or("-".into())),
            Cell::new(ac.version.map(|v| v.number().to_string()).unwrap_or("-".into())),
            Cell::new(ac.messages),
        ]);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  8D4840D6202CC371C32CE0576098 ", 1.0), Some(("8D4840D6202CC371C32CE0576098", 1.0)));
        assert_eq!(parse_line("20000F1F684A6C;12.5", 1.0), Some(("20000F1F684A6C", 12.5)));
        assert_eq!(parse_line("20000F1F684A6C;garbage", 3.0), Some(("20000F1F684A6C", 3.0)));
        assert_eq!(parse_line("# comment", 1.0), None);
        assert_eq!(parse_line("   ", 1.0), None);
    }

    #[test]
    fn test_version_hint_overrides_config() {
        let mut config = Config::default();
        config.decoder.adsb_version = AdsbVersion::V1;
        assert_eq!(decode_options(&config, None).version, AdsbVersion::V1);
        assert_eq!(decode_options(&config, Some(2)).version, AdsbVersion::V2);
    }

    #[test]
    fn test_describe_identification() {
        let msg = modes_core::decode_hex("8D4840D6202CC371C32CE0576098", 1.0).unwrap();
        assert_eq!(describe(&msg), "4840D6 Identification callsign=KLM1023 category=A0");
    }

    #[test]
    fn test_describe_velocity() {
        let msg = modes_core::decode_hex("8D485020994409940838175B284F", 1.0).unwrap();
        assert_eq!(
            describe(&msg),
            "485020 VelocityOverGround gs=159.2kt trk=182.9 vr=-832fpm"
        );
    }

    #[test]
    fn test_json_line_includes_position() {
        let msg = modes_core::decode_hex("8D40621D58C382D690C8AC2863A7", 1.0).unwrap();
        let line = JsonLine {
            msg: &msg,
            position: Some(Position::new(52.25, 3.92)),
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["type"], "AirbornePosition");
        assert_eq!(value["icao"], "40621D");
        assert_eq!(value["position"]["latitude"], 52.25);
    }

    #[test]
    fn test_cli_parses_decode_flags() {
        let cli = Cli::try_parse_from([
            "modes", "-v", "decode", "-", "--json", "--icao", "4840d6", "--version-hint", "2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Decode {
                json,
                icao,
                version_hint,
                ..
            } => {
                assert!(json);
                assert_eq!(icao.as_deref(), Some("4840d6"));
                assert_eq!(version_hint, Some(2));
            }
            _ => panic!("expected decode"),
        }
        assert!(Cli::try_parse_from(["modes", "frame", "00", "--version-hint", "3"]).is_err());
    }

    #[test]
    fn test_config_file_via_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "decoder:\n  adsb_version: 1\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.decoder.adsb_version, AdsbVersion::V1);
    }
}
