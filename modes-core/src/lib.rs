//! modes-core: Mode S / ADS-B / ADS-R message decoding library.
//!
//! No async, no I/O beyond the config file. Frames go in as hex or bytes and
//! come out as typed, immutable messages; CPR positions are resolved on
//! request from pairs of messages or a reference position.

pub mod accuracy;
pub mod altitude;
pub mod bits;
pub mod config;
pub mod cpr;
pub mod decode;
pub mod frame;
pub mod msgs;
pub mod types;

// Re-export commonly used types at crate root
pub use accuracy::AdsbVersion;
pub use cpr::{CprEncodedPosition, CprFormat, CprPolicy, Position};
pub use decode::{classify, decode, decode_hex, DecodeOptions, DecodedMsg, VariantTag};
pub use frame::{parse_frame, ModeFrame, SquitterSource};
pub use msgs::position::NicSupplements;
pub use msgs::FromFrame;
pub use types::{icao_to_string, Icao, ModesError, Result};
