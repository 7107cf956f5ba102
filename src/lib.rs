//! # EDF → WFDB Converter
//!
//! Converts multi-channel biosignal recordings from EDF (European Data
//! Format) into the WFDB (WaveForm DataBase) record format used by
//! physiological-signal archives.
//!
//! A conversion produces a WFDB record pair:
//!
//! - `<output>.hea` — a text header: one record line (name, signal count,
//!   sampling frequency, sample count, start stamp) followed by one line per
//!   signal carrying its storage format, ADC gain/resolution, initial value
//!   and a 16-bit payload checksum.
//! - `<output>.dat` — the digital samples of all signals interleaved in
//!   time order, each stored as a little-endian signed 16-bit integer.
//!
//! ## Quick Start
//!
//! ```rust
//! use edf2wfdb::{EdfReader, WfdbWriter, Result};
//! # use std::fs;
//!
//! fn main() -> Result<()> {
//!     # edf2wfdb::test_support::create_test_recording("demo_recording.edf")?;
//!     // Open the EDF recording
//!     let mut reader = EdfReader::open("demo_recording.edf")?;
//!
//!     let header = reader.header();
//!     println!("Signals: {}", header.signals.len());
//!     println!("Record name: {}", header.patient);
//!
//!     // Convert it into demo_recording.hea / demo_recording.dat
//!     let writer = WfdbWriter::create("demo_recording")?;
//!     writer.convert(&mut reader)?;
//!
//!     # for f in ["demo_recording.edf", "demo_recording.hea", "demo_recording.dat"] {
//!     #     fs::remove_file(f).ok();
//!     # }
//!     Ok(())
//! }
//! ```
//!
//! ## Digital vs Physical Values
//!
//! EDF stores each sample as a 16-bit ADC integer together with the
//! calibration that maps the digital range onto real-world units. The
//! converter keeps the digital samples untouched and records the calibration
//! in the WFDB header: the gain field is the reciprocal of
//! [`SignalParam::gain`], physical units per digital step.
//!
//! ## Testing Without Real Recordings
//!
//! The conversion core only depends on the [`SignalSource`] trait, so it can
//! be driven by an in-memory recording instead of an EDF file — see the
//! integration tests for the pattern.

pub mod error;
pub mod types;
pub mod utils;
pub mod reader;
pub mod source;
pub mod checksum;
pub mod writer;

#[doc(hidden)]
pub mod test_support; // For internal doctest and integration-test support

// Re-export main types for convenience
pub use error::{ConvertError, Result};
pub use types::{EdfHeader, FileType, SignalParam};
pub use reader::EdfReader;
pub use source::SignalSource;
pub use writer::{ChannelEncoding, WfdbWriter};

// Important constants
pub const EDF_TIME_DIMENSION: i64 = 10_000_000; // 100 nanoseconds unit
pub const EDF_MAX_SIGNALS: usize = 4096;

/// Library version
///
/// # Examples
///
/// ```rust
/// let version = edf2wfdb::version();
/// assert!(!version.is_empty());
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
