// Internal utilities for documentation and integration tests.
// Builds synthetic EDF inputs so no binary fixtures live in the repository.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use chrono::{NaiveDate, NaiveTime};

use crate::error::{ConvertError, Result};
use crate::source::SignalSource;
use crate::types::SignalParam;

/// Writes a minimal EDF (or EDF+C) file from signal definitions and one
/// digital sample sequence per channel.
///
/// The record count is derived from channel 0's length and samples-per-record
/// value; all channels must honor the shared-length EDF invariant. The start
/// stamp is fixed at 02.08.23 / 09.30.05 so tests can assert the converted
/// header verbatim.
pub fn write_edf_file<P: AsRef<Path>>(
    path: P,
    patient: &str,
    signals: &[SignalParam],
    channels: &[Vec<i32>],
    edfplus: bool,
) -> Result<()> {
    let datarecords = channels
        .first()
        .map_or(0, |c| c.len() / signals[0].samples_per_record as usize);

    let mut file = BufWriter::new(File::create(path)?);

    // 主头部（256字节）
    write_field(&mut file, "0", 8)?;
    write_field(&mut file, patient, 80)?;
    let recording = if edfplus { "Startdate 02-AUG-2023 X X X" } else { "test recording" };
    write_field(&mut file, recording, 80)?;
    write_field(&mut file, "02.08.23", 8)?;
    write_field(&mut file, "09.30.05", 8)?;
    write_field(&mut file, &((signals.len() + 1) * 256).to_string(), 8)?;
    write_field(&mut file, if edfplus { "EDF+C" } else { "" }, 44)?;
    write_field(&mut file, &datarecords.to_string(), 8)?;
    write_field(&mut file, "1", 8)?;
    write_field(&mut file, &signals.len().to_string(), 4)?;

    // 信号头部，按字段成列
    for signal in signals {
        write_field(&mut file, &signal.label, 16)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.transducer, 80)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.physical_dimension, 8)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.physical_min.to_string(), 8)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.physical_max.to_string(), 8)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.digital_min.to_string(), 8)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.digital_max.to_string(), 8)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.prefilter, 80)?;
    }
    for signal in signals {
        write_field(&mut file, &signal.samples_per_record.to_string(), 8)?;
    }
    for _ in signals {
        write_field(&mut file, "", 32)?;
    }

    // 数据记录
    for record in 0..datarecords {
        for (i, signal) in signals.iter().enumerate() {
            let samples_per_record = signal.samples_per_record as usize;
            let start = record * samples_per_record;
            for &sample in &channels[i][start..start + samples_per_record] {
                file.write_all(&(sample as i16).to_le_bytes())?;
            }
        }
    }

    file.flush()?;
    Ok(())
}

fn write_field<W: Write>(writer: &mut W, value: &str, width: usize) -> Result<()> {
    let mut field = vec![b' '; width];
    let bytes = value.as_bytes();
    let len = bytes.len().min(width);
    field[..len].copy_from_slice(&bytes[..len]);
    writer.write_all(&field)?;
    Ok(())
}

/// Builds a signal definition with the given calibration; the remaining
/// fields get test defaults.
pub fn test_signal(label: &str, unit: &str, physical: (f64, f64), digital: (i32, i32), samples_per_record: i32) -> SignalParam {
    SignalParam {
        label: label.to_string(),
        samples_in_file: 0,
        physical_max: physical.1,
        physical_min: physical.0,
        digital_max: digital.1,
        digital_min: digital.0,
        samples_per_record,
        physical_dimension: unit.to_string(),
        prefilter: String::new(),
        transducer: String::new(),
    }
}

/// Creates a small two-signal recording used by documentation examples.
pub fn create_test_recording<P: AsRef<Path>>(path: P) -> Result<()> {
    let signals = vec![
        test_signal("ECG I", "uV", (-100.0, 100.0), (-1000, 1000), 4),
        test_signal("ECG II", "mV", (-5.0, 5.0), (-1000, 1000), 4),
    ];
    let channels = vec![
        vec![10, -5, 0, 3, 7, 2, -8, 1],
        vec![100, 100, 100, 100, 90, 90, 90, 90],
    ];
    write_edf_file(path, "P001 demo", &signals, &channels, false)
}

/// In-memory [`SignalSource`] so converter tests run without EDF files.
pub struct MemorySource {
    name: String,
    signals: Vec<SignalParam>,
    channels: Vec<Vec<i32>>,
    frequency: f64,
    start_date: NaiveDate,
    start_time: NaiveTime,
    positions: Vec<usize>,
}

impl MemorySource {
    /// Wraps per-channel digital sequences as a recording. Each signal's
    /// sample count is taken from its channel's length.
    pub fn new(name: &str, mut signals: Vec<SignalParam>, channels: Vec<Vec<i32>>, frequency: f64) -> Self {
        for (signal, channel) in signals.iter_mut().zip(&channels) {
            signal.samples_in_file = channel.len() as i64;
        }
        let positions = vec![0; channels.len()];
        MemorySource {
            name: name.to_string(),
            signals,
            channels,
            frequency,
            start_date: NaiveDate::from_ymd_opt(2023, 8, 2).unwrap_or_default(),
            start_time: NaiveTime::from_hms_opt(9, 30, 5).unwrap_or_default(),
            positions,
        }
    }
}

impl SignalSource for MemorySource {
    fn recording_name(&self) -> &str {
        &self.name
    }

    fn signals(&self) -> &[SignalParam] {
        &self.signals
    }

    fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    fn sample_frequency(&self, _signal: usize) -> f64 {
        self.frequency
    }

    fn read_digital_samples(&mut self, signal: usize, count: usize) -> Result<Vec<i32>> {
        let channel = self
            .channels
            .get(signal)
            .ok_or(ConvertError::InvalidSignalIndex(signal))?;
        let position = self.positions[signal];
        let end = (position + count).min(channel.len());
        let samples = channel[position..end].to_vec();
        self.positions[signal] = end;
        Ok(samples)
    }
}
