use chrono::{NaiveDate, NaiveTime};

use crate::error::Result;
use crate::reader::EdfReader;
use crate::types::SignalParam;

/// Everything the WFDB conversion needs from an opened recording.
///
/// [`EdfReader`] is the production implementation; tests drive the converter
/// with an in-memory implementation instead of real EDF files. The contract
/// assumed by [`WfdbWriter`](crate::WfdbWriter) is the EDF invariant set:
/// all signals share one sample count and one sampling frequency, and
/// repeated `read_digital_samples` calls continue from the previous position.
pub trait SignalSource {
    /// Identifier of the recording, used as the WFDB record name.
    fn recording_name(&self) -> &str;

    /// Signal metadata, in channel order.
    fn signals(&self) -> &[SignalParam];

    /// Start date of the recording.
    fn start_date(&self) -> NaiveDate;

    /// Start time of the recording.
    fn start_time(&self) -> NaiveTime;

    /// Sampling frequency of the given signal in Hz.
    fn sample_frequency(&self, signal: usize) -> f64;

    /// Reads up to `count` digital samples from the given signal, advancing
    /// the per-signal read position.
    fn read_digital_samples(&mut self, signal: usize, count: usize) -> Result<Vec<i32>>;
}

impl SignalSource for EdfReader {
    fn recording_name(&self) -> &str {
        &self.header().patient
    }

    fn signals(&self) -> &[SignalParam] {
        &self.header().signals
    }

    fn start_date(&self) -> NaiveDate {
        self.header().start_date
    }

    fn start_time(&self) -> NaiveTime {
        self.header().start_time
    }

    fn sample_frequency(&self, signal: usize) -> f64 {
        EdfReader::sample_frequency(self, signal)
    }

    fn read_digital_samples(&mut self, signal: usize, count: usize) -> Result<Vec<i32>> {
        EdfReader::read_digital_samples(self, signal, count)
    }
}
