use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    Edf,
    EdfPlus,
}

/// Per-signal metadata as stored in the EDF signal header block.
#[derive(Debug, Clone)]
pub struct SignalParam {
    pub label: String,
    pub samples_in_file: i64,
    pub physical_max: f64,
    pub physical_min: f64,
    pub digital_max: i32,
    pub digital_min: i32,
    pub samples_per_record: i32,
    pub physical_dimension: String,
    pub prefilter: String,
    pub transducer: String,
}

impl SignalParam {
    /// Physical units per digital step.
    ///
    /// This is the calibration slope between the ADC's integer output range
    /// and the real-world unit range, and it is what WFDB headers record
    /// (in its reciprocal form) as the ADC gain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edf2wfdb::SignalParam;
    ///
    /// let signal = SignalParam {
    ///     label: "ECG I".to_string(),
    ///     samples_in_file: 0,
    ///     physical_max: 100.0,
    ///     physical_min: -100.0,
    ///     digital_max: 1000,
    ///     digital_min: -1000,
    ///     samples_per_record: 500,
    ///     physical_dimension: "uV".to_string(),
    ///     prefilter: "".to_string(),
    ///     transducer: "".to_string(),
    /// };
    ///
    /// assert!((signal.gain() - 0.1).abs() < 1e-12);
    /// ```
    pub fn gain(&self) -> f64 {
        (self.physical_max - self.physical_min) /
        (self.digital_max - self.digital_min) as f64
    }
}

/// File-wide metadata parsed from the 256-byte EDF main header.
#[derive(Debug)]
pub struct EdfHeader {
    pub file_type: FileType,
    pub signals: Vec<SignalParam>,
    pub file_duration: i64,           // in 100 nanosecond units
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub datarecords_in_file: i64,
    pub datarecord_duration: i64,     // in 100 nanosecond units

    /// Local patient identification field, trimmed. Doubles as the WFDB
    /// record name during conversion.
    pub patient: String,
    /// Local recording identification field, trimmed.
    pub recording: String,
}
