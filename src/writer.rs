use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use chrono::{Datelike, Timelike};
use tracing::{debug, info};

use crate::checksum::signal_checksum;
use crate::error::Result;
use crate::source::SignalSource;

/// Per-signal byproducts of the signal encoder.
///
/// The encoder produces these while writing the binary payload; the signal
/// header builder embeds them in the matching `.hea` line. Both values are
/// computed from the exact sample sequence that went into the `.dat` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEncoding {
    /// First digital sample of the signal.
    pub initial_value: i32,
    /// 16-bit payload checksum, see [`signal_checksum`].
    pub checksum: u16,
}

/// Writer producing a WFDB record pair from a [`SignalSource`].
///
/// A WFDB record is a text header (`.hea`) naming the record and describing
/// each signal's encoding, plus a binary payload (`.dat`) holding all
/// signals' digital samples interleaved in time order as little-endian
/// 16-bit integers.
///
/// One `WfdbWriter` performs exactly one conversion: [`create`] opens the
/// output pair, [`convert`] consumes the writer while draining the source.
///
/// [`create`]: WfdbWriter::create
/// [`convert`]: WfdbWriter::convert
///
/// # Examples
///
/// ```rust
/// use edf2wfdb::{EdfReader, WfdbWriter};
///
/// # edf2wfdb::test_support::create_test_recording("writer_demo.edf")?;
/// let mut reader = EdfReader::open("writer_demo.edf")?;
/// let writer = WfdbWriter::create("writer_demo")?;
/// writer.convert(&mut reader)?;
/// // writer_demo.hea and writer_demo.dat now exist
///
/// # for f in ["writer_demo.edf", "writer_demo.hea", "writer_demo.dat"] {
/// #     std::fs::remove_file(f).ok();
/// # }
/// # Ok::<(), edf2wfdb::ConvertError>(())
/// ```
pub struct WfdbWriter {
    header: BufWriter<File>,
    signal: BufWriter<File>,
}

impl WfdbWriter {
    /// Creates the output pair `<base>.hea` and `<base>.dat`.
    ///
    /// Existing files are truncated. The suffixes are appended to the base
    /// name as given, matching the record layout WFDB tools expect.
    ///
    /// # Errors
    ///
    /// * `ConvertError::Io` - either file cannot be created
    pub fn create<P: AsRef<Path>>(output_base: P) -> Result<Self> {
        let base = output_base.as_ref();
        let header = BufWriter::new(File::create(with_suffix(base, ".hea"))?);
        let signal = BufWriter::new(File::create(with_suffix(base, ".dat"))?);

        Ok(WfdbWriter { header, signal })
    }

    /// Runs the conversion: record header line, binary payload, one header
    /// line per signal. Both output streams are flushed before returning.
    ///
    /// The record name is the source's recording name, whitespace-trimmed.
    /// Sampling frequency and sample count are taken from signal 0 under the
    /// EDF invariant that all signals share them.
    ///
    /// # Errors
    ///
    /// * `ConvertError::Io` - writing either output file failed
    /// * any error the source reports while serving samples
    pub fn convert<S: SignalSource>(mut self, source: &mut S) -> Result<()> {
        let record_name = source.recording_name().trim().to_string();
        let number_of_signals = source.signals().len();
        let samples_per_signal = source.signals()[0].samples_in_file as usize;

        info!(
            record = %record_name,
            signals = number_of_signals,
            samples_per_signal,
            "converting recording"
        );

        self.write_record_header(source, &record_name, number_of_signals, samples_per_signal)?;

        let encodings = self.encode_signals(source, number_of_signals, samples_per_signal)?;

        for (signal, encoding) in encodings.iter().enumerate() {
            self.write_signal_header(source, &record_name, signal, *encoding)?;
        }

        self.header.flush()?;
        self.signal.flush()?;
        Ok(())
    }

    /// Emits the first `.hea` line:
    /// `<record> <signals> <frequency> <samples> <h>:<m>:<s> <d>/<m>/<y>`.
    ///
    /// Date and time fields pass through as plain integers, no zero padding
    /// and no range validation.
    fn write_record_header<S: SignalSource>(
        &mut self,
        source: &S,
        record_name: &str,
        number_of_signals: usize,
        samples_per_signal: usize,
    ) -> Result<()> {
        let time = source.start_time();
        let date = source.start_date();

        let first_line = format!(
            "{} {} {} {} {}:{}:{} {}/{}/{}\n",
            record_name,
            number_of_signals,
            source.sample_frequency(0),
            samples_per_signal,
            time.hour(),
            time.minute(),
            time.second(),
            date.day(),
            date.month(),
            date.year(),
        );

        self.header.write_all(first_line.as_bytes())?;
        Ok(())
    }

    /// Reads every signal front to back, interleaves the samples into the
    /// WFDB multiplexed layout and writes the payload in one pass.
    ///
    /// Sample `j` of signal `i` lands at flat position
    /// `j * number_of_signals + i`; the stride is always the actual signal
    /// count. Each entry is serialized as a 2-byte little-endian signed
    /// value.
    fn encode_signals<S: SignalSource>(
        &mut self,
        source: &mut S,
        number_of_signals: usize,
        samples_per_signal: usize,
    ) -> Result<Vec<ChannelEncoding>> {
        let mut encodings = Vec::with_capacity(number_of_signals);
        let mut interleaved = vec![0i32; samples_per_signal * number_of_signals];

        for signal in 0..number_of_signals {
            let samples = source.read_digital_samples(signal, samples_per_signal)?;

            let encoding = ChannelEncoding {
                initial_value: samples.first().copied().unwrap_or(0),
                checksum: signal_checksum(&samples),
            };
            debug!(
                signal,
                checksum = encoding.checksum,
                initial_value = encoding.initial_value,
                "encoded signal"
            );
            encodings.push(encoding);

            for (j, &sample) in samples.iter().enumerate() {
                interleaved[j * number_of_signals + signal] = sample;
            }
        }

        let mut output_buffer = Vec::with_capacity(interleaved.len() * 2);
        for &value in &interleaved {
            output_buffer.extend_from_slice(&(value as i16).to_le_bytes());
        }

        self.signal.write_all(&output_buffer)?;
        Ok(encodings)
    }

    /// Emits one signal description line:
    /// `<record>.dat <format> <ADCgain>(0)/<unit> <resolution> <zero>
    /// <initial> <checksum> <blocksize> <label>`.
    ///
    /// The gain, baseline and unit are packed into a single field with no
    /// separating spaces, per the WFDB header convention. The `.dat` name
    /// comes from the trimmed record name, not from the path the caller
    /// chose for the actual binary file.
    fn write_signal_header<S: SignalSource>(
        &mut self,
        source: &S,
        record_name: &str,
        signal: usize,
        encoding: ChannelEncoding,
    ) -> Result<()> {
        let signal_param = &source.signals()[signal];

        let file_name = format!("{}.dat", record_name);
        let format = format_code(signal_param.digital_max);
        let adc_gain = 1.0 / signal_param.gain();
        let baseline = "(0)";
        let unit = format!("/{}", signal_param.physical_dimension.trim());
        let adc_resolution = format;
        let adc_zero = 0;
        let block_size = 0;

        let output = format!(
            "{} {} {}{}{} {} {} {} {} {} {}\n",
            file_name,
            format,
            adc_gain,
            baseline,
            unit,
            adc_resolution,
            adc_zero,
            encoding.initial_value,
            encoding.checksum,
            block_size,
            signal_param.label,
        );

        self.header.write_all(output.as_bytes())?;
        Ok(())
    }
}

/// WFDB storage format code for a signal: the bit width of the digital
/// maximum's two's-complement binary rendering, plus one. Reused verbatim
/// for the ADC resolution field.
fn format_code(digital_max: i32) -> u32 {
    let width = if digital_max == 0 {
        1
    } else if digital_max < 0 {
        32
    } else {
        32 - digital_max.leading_zeros()
    };
    width + 1
}

/// Appends a suffix to a path without treating it as an extension swap, so
/// base names containing dots survive intact.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code_widths() {
        assert_eq!(format_code(2047), 12);
        assert_eq!(format_code(2048), 13);
        assert_eq!(format_code(32767), 16);
        assert_eq!(format_code(1), 2);
        assert_eq!(format_code(0), 2);
    }

    #[test]
    fn test_format_code_negative_maximum() {
        // two's-complement rendering of a negative value is 32 bits wide
        assert_eq!(format_code(-1), 33);
    }

    #[test]
    fn test_with_suffix_keeps_dots() {
        assert_eq!(with_suffix(Path::new("foo"), ".hea"), PathBuf::from("foo.hea"));
        assert_eq!(with_suffix(Path::new("v1.2_run"), ".dat"), PathBuf::from("v1.2_run.dat"));
    }
}
