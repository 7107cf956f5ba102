use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use chrono::{NaiveDate, NaiveTime};

use crate::types::{EdfHeader, FileType, SignalParam};
use crate::error::{ConvertError, Result};
use crate::utils::{atoi_nonlocalized, atof_nonlocalized, parse_edf_time};
use crate::EDF_TIME_DIMENSION;

/// Reader for EDF and EDF+C biosignal recordings.
///
/// `EdfReader` parses the file header on open and then serves digital sample
/// reads per signal. It is the upstream side of the WFDB conversion: the
/// [`WfdbWriter`](crate::WfdbWriter) consumes it through the
/// [`SignalSource`](crate::SignalSource) trait.
///
/// # Examples
///
/// ```rust
/// use edf2wfdb::EdfReader;
///
/// # edf2wfdb::test_support::create_test_recording("reader_demo.edf")?;
/// let mut reader = EdfReader::open("reader_demo.edf")?;
///
/// let header = reader.header();
/// println!("Signals: {}", header.signals.len());
/// println!("Records: {}", header.datarecords_in_file);
///
/// let count = header.signals[0].samples_in_file as usize;
/// let samples = reader.read_digital_samples(0, count)?;
/// println!("Read {} samples", samples.len());
///
/// # std::fs::remove_file("reader_demo.edf").ok();
/// # Ok::<(), edf2wfdb::ConvertError>(())
/// ```
pub struct EdfReader {
    file: BufReader<File>,
    header: EdfHeader,
    /// 每个信号在数据记录中的字节偏移
    signal_offsets: Vec<usize>,
    /// 当前每个信号的样本位置指针
    sample_positions: Vec<i64>,
    header_size: usize,
    record_size: usize,
}

impl EdfReader {
    /// Opens an EDF or EDF+C file for reading.
    ///
    /// The header is parsed and validated immediately. Continuous EDF+
    /// (`EDF+C`) and plain EDF files are accepted; discontinuous recordings
    /// (`EDF+D`) are rejected, as the conversion relies on one uninterrupted
    /// sample sequence per signal.
    ///
    /// # Errors
    ///
    /// * `ConvertError::FileNotFound` - File doesn't exist or can't be opened
    /// * `ConvertError::UnsupportedFileType` - Not an EDF file
    /// * `ConvertError::DiscontinuousFile` - EDF+D recording
    /// * `ConvertError::InvalidHeader` - Header size field is inconsistent
    /// * `ConvertError::InvalidSignalCount` - Signal count out of range
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| ConvertError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;

        let mut reader = BufReader::new(file);

        let (header, signal_offsets, record_size, header_size) = Self::parse_header(&mut reader)?;

        let sample_positions = vec![0i64; header.signals.len()];

        Ok(EdfReader {
            file: reader,
            header,
            signal_offsets,
            sample_positions,
            header_size,
            record_size,
        })
    }

    /// Gets a reference to the parsed file header.
    pub fn header(&self) -> &EdfHeader {
        &self.header
    }

    /// Reads digital value samples from the specified signal.
    ///
    /// Digital values are the raw ADC integers stored in the file, widened
    /// to `i32` and clamped to the signal's declared digital range. The read
    /// advances a per-signal cursor, so consecutive calls continue where the
    /// previous one stopped; requesting more samples than remain returns the
    /// remainder.
    ///
    /// # Errors
    ///
    /// * `ConvertError::InvalidSignalIndex` - Signal index is out of bounds
    /// * `ConvertError::Io` - I/O error reading from file
    pub fn read_digital_samples(&mut self, signal: usize, count: usize) -> Result<Vec<i32>> {
        if signal >= self.header.signals.len() {
            return Err(ConvertError::InvalidSignalIndex(signal));
        }

        if count == 0 {
            return Ok(Vec::new());
        }

        let buffer_offset = self.signal_offsets[signal];
        let signal_param = &self.header.signals[signal];

        // 计算可读取的最大样本数
        let samples_in_file = signal_param.samples_per_record as i64 * self.header.datarecords_in_file;
        let available_samples = (samples_in_file - self.sample_positions[signal]).max(0) as usize;
        let actual_count = count.min(available_samples);

        if actual_count == 0 {
            return Ok(Vec::new());
        }

        let mut samples = Vec::with_capacity(actual_count);
        let mut samples_read = 0;

        while samples_read < actual_count {
            let current_pos = self.sample_positions[signal];
            let record_index = current_pos / signal_param.samples_per_record as i64;
            let sample_in_record = current_pos % signal_param.samples_per_record as i64;

            // EDF每个样本2字节
            let file_offset = self.header_size as u64
                + record_index as u64 * self.record_size as u64
                + buffer_offset as u64
                + sample_in_record as u64 * 2;

            self.file.seek(SeekFrom::Start(file_offset))?;

            let samples_in_current_record = (signal_param.samples_per_record as i64 - sample_in_record) as usize;
            let samples_to_read = (actual_count - samples_read).min(samples_in_current_record);

            for _ in 0..samples_to_read {
                let mut buf = [0u8; 2];
                self.file.read_exact(&mut buf)?;

                let digital_value = i16::from_le_bytes(buf) as i32;

                let clamped_value = digital_value
                    .max(signal_param.digital_min)
                    .min(signal_param.digital_max);

                samples.push(clamped_value);
                samples_read += 1;
            }

            self.sample_positions[signal] = current_pos + samples_to_read as i64;
        }

        Ok(samples)
    }

    /// Sampling frequency of the given signal in Hz.
    ///
    /// Derived from the samples-per-record count and the data record
    /// duration. For the common one-second record this is simply the
    /// samples-per-record value.
    pub fn sample_frequency(&self, signal: usize) -> f64 {
        let signal_param = &self.header.signals[signal];
        signal_param.samples_per_record as f64 * EDF_TIME_DIMENSION as f64
            / self.header.datarecord_duration as f64
    }

    /// 解析EDF文件头部
    fn parse_header(reader: &mut BufReader<File>) -> Result<(EdfHeader, Vec<usize>, usize, usize)> {
        // 读取主头部（256字节）
        reader.seek(SeekFrom::Start(0))?;
        let mut main_header = vec![0u8; 256];
        reader.read_exact(&mut main_header)?;

        // 验证EDF版本标识
        let version = String::from_utf8_lossy(&main_header[0..8]);
        if !version.trim().starts_with('0') {
            return Err(ConvertError::UnsupportedFileType(format!("Not an EDF file: {}", version)));
        }

        // 解析信号数量
        let signals_str = String::from_utf8_lossy(&main_header[252..256]);
        let total_signal_count = atoi_nonlocalized(&signals_str);
        if total_signal_count < 1 || total_signal_count > crate::EDF_MAX_SIGNALS as i32 {
            return Err(ConvertError::InvalidSignalCount(total_signal_count));
        }

        // 验证头部大小
        let header_size_str = String::from_utf8_lossy(&main_header[184..192]);
        let expected_header_size = (total_signal_count as usize + 1) * 256;
        let actual_header_size = atoi_nonlocalized(&header_size_str);
        if actual_header_size != expected_header_size as i32 {
            return Err(ConvertError::InvalidHeader);
        }

        // 保留字段区分普通EDF与EDF+
        let reserved = String::from_utf8_lossy(&main_header[192..236]);
        let file_type = if reserved.starts_with("EDF+C") {
            FileType::EdfPlus
        } else if reserved.starts_with("EDF+D") {
            return Err(ConvertError::DiscontinuousFile);
        } else {
            FileType::Edf
        };

        let patient = String::from_utf8_lossy(&main_header[8..88]).trim().to_string();
        let recording = String::from_utf8_lossy(&main_header[88..168]).trim().to_string();

        // 解析日期和时间
        let date_str = String::from_utf8_lossy(&main_header[168..176]);
        let time_str = String::from_utf8_lossy(&main_header[176..184]);

        let (start_date, start_time) = Self::parse_datetime(&date_str, &time_str)?;

        // 解析数据记录信息
        let datarecords_str = String::from_utf8_lossy(&main_header[236..244]);
        let datarecords = atoi_nonlocalized(&datarecords_str) as i64;

        let duration_str = String::from_utf8_lossy(&main_header[244..252]);
        let datarecord_duration = if duration_str.trim() == "1" {
            EDF_TIME_DIMENSION
        } else {
            parse_edf_time(&duration_str)?
        };

        // 读取信号头部信息
        let signal_header_size = total_signal_count as usize * 256;
        let mut signal_header = vec![0u8; signal_header_size];
        reader.read_exact(&mut signal_header)?;

        let (signals, signal_offsets, record_size) = Self::parse_signals(
            &signal_header,
            total_signal_count as usize,
            datarecords,
        )?;

        let header = EdfHeader {
            file_type,
            signals,
            file_duration: datarecord_duration * datarecords,
            start_date,
            start_time,
            datarecords_in_file: datarecords,
            datarecord_duration,
            patient,
            recording,
        };

        Ok((header, signal_offsets, record_size, expected_header_size))
    }

    /// 解析日期时间
    fn parse_datetime(date_str: &str, time_str: &str) -> Result<(NaiveDate, NaiveTime)> {
        // 日期格式 "dd.mm.yy"
        let date_parts: Vec<&str> = date_str.split('.').collect();
        if date_parts.len() != 3 {
            return Err(ConvertError::FormatError);
        }

        let day = atoi_nonlocalized(date_parts[0]);
        let month = atoi_nonlocalized(date_parts[1]);
        let year = {
            let yy = atoi_nonlocalized(date_parts[2]);
            if yy > 84 { 1900 + yy } else { 2000 + yy }
        };

        let start_date = NaiveDate::from_ymd_opt(year, month as u32, day as u32)
            .ok_or(ConvertError::FormatError)?;

        // 时间格式 "hh.mm.ss"
        let time_parts: Vec<&str> = time_str.split('.').collect();
        if time_parts.len() != 3 {
            return Err(ConvertError::FormatError);
        }

        let hour = atoi_nonlocalized(time_parts[0]);
        let minute = atoi_nonlocalized(time_parts[1]);
        let second = atoi_nonlocalized(time_parts[2]);

        let start_time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)
            .ok_or(ConvertError::FormatError)?;

        Ok((start_date, start_time))
    }

    /// 解析信号参数
    ///
    /// Annotation channels ("EDF Annotations") are accounted for in the
    /// record layout but excluded from the visible signal list, so signal
    /// indices seen by callers match `signal_offsets` one to one.
    fn parse_signals(
        signal_header: &[u8],
        total_signal_count: usize,
        datarecords: i64,
    ) -> Result<(Vec<SignalParam>, Vec<usize>, usize)> {
        let mut signals = Vec::new();
        let mut signal_offsets = Vec::new();
        let mut buffer_offset = 0;

        for i in 0..total_signal_count {
            // 标签 (16字节)
            let label_start = i * 16;
            let label = String::from_utf8_lossy(&signal_header[label_start..label_start + 16])
                .trim().to_string();

            let is_annotation = label == "EDF Annotations";

            // 传感器类型 (80字节)
            let transducer_start = total_signal_count * 16 + i * 80;
            let transducer = String::from_utf8_lossy(
                &signal_header[transducer_start..transducer_start + 80]
            ).trim().to_string();

            // 物理单位 (8字节)
            let unit_start = total_signal_count * 96 + i * 8;
            let physical_dimension = String::from_utf8_lossy(
                &signal_header[unit_start..unit_start + 8]
            ).trim().to_string();

            // 物理最小值/最大值 (各8字节)
            let phys_min_start = total_signal_count * 104 + i * 8;
            let physical_min = atof_nonlocalized(&String::from_utf8_lossy(
                &signal_header[phys_min_start..phys_min_start + 8]
            ));

            let phys_max_start = total_signal_count * 112 + i * 8;
            let physical_max = atof_nonlocalized(&String::from_utf8_lossy(
                &signal_header[phys_max_start..phys_max_start + 8]
            ));

            // 数字最小值/最大值 (各8字节)
            let dig_min_start = total_signal_count * 120 + i * 8;
            let digital_min = atoi_nonlocalized(&String::from_utf8_lossy(
                &signal_header[dig_min_start..dig_min_start + 8]
            ));

            let dig_max_start = total_signal_count * 128 + i * 8;
            let digital_max = atoi_nonlocalized(&String::from_utf8_lossy(
                &signal_header[dig_max_start..dig_max_start + 8]
            ));

            // 预滤波 (80字节)
            let prefilter_start = total_signal_count * 136 + i * 80;
            let prefilter = String::from_utf8_lossy(
                &signal_header[prefilter_start..prefilter_start + 80]
            ).trim().to_string();

            // 每个数据记录中的样本数 (8字节)
            let samples_start = total_signal_count * 216 + i * 8;
            let samples_per_record = atoi_nonlocalized(&String::from_utf8_lossy(
                &signal_header[samples_start..samples_start + 8]
            ));

            if !is_annotation {
                if physical_min == physical_max {
                    return Err(ConvertError::PhysicalMinEqualsMax);
                }
                if digital_min == digital_max {
                    return Err(ConvertError::DigitalMinEqualsMax);
                }

                signals.push(SignalParam {
                    label,
                    samples_in_file: samples_per_record as i64 * datarecords,
                    physical_max,
                    physical_min,
                    digital_max,
                    digital_min,
                    samples_per_record,
                    physical_dimension,
                    prefilter,
                    transducer,
                });
                signal_offsets.push(buffer_offset);
            }

            // 更新缓冲区偏移（每个样本2字节）
            buffer_offset += samples_per_record as usize * 2;
        }

        Ok((signals, signal_offsets, buffer_offset))
    }
}
