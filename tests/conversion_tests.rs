use std::fs;
use std::path::Path;

use edf2wfdb::checksum::signal_checksum;
use edf2wfdb::test_support::{test_signal, write_edf_file, MemorySource};
use edf2wfdb::{ConvertError, EdfReader, FileType, WfdbWriter};

// 清理测试文件的辅助函数
fn cleanup_test_files(filenames: &[&str]) {
    for filename in filenames {
        if Path::new(filename).exists() {
            fs::remove_file(filename).ok();
        }
    }
}

fn read_header_lines(path: &str) -> Vec<String> {
    let text = fs::read_to_string(path).unwrap();
    text.lines().map(str::to_string).collect()
}

// 按通道拆分.dat负载
fn deinterleave(payload: &[u8], signals: usize) -> Vec<Vec<i32>> {
    assert_eq!(payload.len() % (signals * 2), 0);
    let mut channels = vec![Vec::new(); signals];
    for (index, pair) in payload.chunks_exact(2).enumerate() {
        let value = i16::from_le_bytes([pair[0], pair[1]]) as i32;
        channels[index % signals].push(value);
    }
    channels
}

#[test]
fn test_two_channel_interleave_scenario() {
    let signals = vec![
        test_signal("ECG I", "uV", (-100.0, 100.0), (-1000, 1000), 4),
        test_signal("ECG II", "mV", (-5.0, 5.0), (-1000, 1000), 4),
    ];
    let channels = vec![vec![10, -5, 0, 3], vec![100, 100, 100, 100]];
    let mut source = MemorySource::new("rec1", signals, channels, 4.0);

    let writer = WfdbWriter::create("test_scenario").unwrap();
    writer.convert(&mut source).unwrap();

    // 预分字节的交错顺序: [10, 100, -5, 100, 0, 100, 3, 100]
    let payload = fs::read("test_scenario.dat").unwrap();
    assert_eq!(
        payload,
        vec![10, 0, 100, 0, 251, 255, 100, 0, 0, 0, 100, 0, 3, 0, 100, 0]
    );

    let lines = read_header_lines("test_scenario.hea");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "rec1 2 4 4 9:30:5 2/8/2023");
    assert_eq!(lines[1], "rec1.dat 11 10(0)/uV 11 0 10 62195 0 ECG I");
    assert_eq!(lines[2], "rec1.dat 11 200(0)/mV 11 0 100 55126 0 ECG II");

    cleanup_test_files(&["test_scenario.hea", "test_scenario.dat"]);
}

#[test]
fn test_edf_file_conversion_round_trip() {
    let filename = "test_round_trip.edf";
    let channel0 = vec![10, -5, 0, 3, 7, 2, -8, 1];
    let channel1 = vec![100, 100, 100, 100, 90, 90, 90, 90];

    // 写入阶段: 2信号 x 2数据记录 x 每记录4个样本
    let signals = vec![
        test_signal("ECG I", "uV", (-100.0, 100.0), (-1000, 1000), 4),
        test_signal("ECG II", "mV", (-5.0, 5.0), (-1000, 1000), 4),
    ];
    write_edf_file(
        filename,
        "03215_hr",
        &signals,
        &[channel0.clone(), channel1.clone()],
        false,
    )
    .unwrap();

    let mut reader = EdfReader::open(filename).unwrap();
    let writer = WfdbWriter::create("test_round_trip").unwrap();
    writer.convert(&mut reader).unwrap();

    // 头文件验证
    let lines = read_header_lines("test_round_trip.hea");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "03215_hr 2 4 8 9:30:5 2/8/2023");
    assert_eq!(lines[1], "03215_hr.dat 11 10(0)/uV 11 0 10 24742 0 ECG I");
    assert_eq!(lines[2], "03215_hr.dat 11 200(0)/mV 11 0 100 52363 0 ECG II");

    // 负载反交错后必须还原每个通道的原始序列
    let payload = fs::read("test_round_trip.dat").unwrap();
    assert_eq!(payload.len(), 8 * 2 * 2);
    let channels = deinterleave(&payload, 2);
    assert_eq!(channels[0], channel0);
    assert_eq!(channels[1], channel1);

    // 头部校验和必须与负载中的序列一致
    assert_eq!(signal_checksum(&channels[0]), 24742);
    assert_eq!(signal_checksum(&channels[1]), 52363);

    cleanup_test_files(&[filename, "test_round_trip.hea", "test_round_trip.dat"]);
}

#[test]
fn test_header_line_count_matches_signal_count() {
    let filename = "test_line_count.edf";
    let signals = vec![
        test_signal("EEG C3", "uV", (-200.0, 200.0), (-2048, 2047), 2),
        test_signal("EEG C4", "uV", (-200.0, 200.0), (-2048, 2047), 2),
        test_signal("EEG Cz", "uV", (-200.0, 200.0), (-2048, 2047), 2),
    ];
    let channels = vec![vec![1, 2], vec![3, 4], vec![5, 6]];
    write_edf_file(filename, "P010", &signals, &channels, false).unwrap();

    let mut reader = EdfReader::open(filename).unwrap();
    let writer = WfdbWriter::create("test_line_count").unwrap();
    writer.convert(&mut reader).unwrap();

    let lines = read_header_lines("test_line_count.hea");
    assert_eq!(lines.len(), 4);

    // digitalMaximum 2047 占11位, 格式码与ADC分辨率都是12
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields[1], "12");
        assert_eq!(fields[3], "12");
    }

    cleanup_test_files(&[filename, "test_line_count.hea", "test_line_count.dat"]);
}

#[test]
fn test_dat_field_uses_record_name_not_output_path() {
    let signals = vec![test_signal("Resp", "Ohm", (0.0, 50.0), (0, 500), 4)];
    let channels = vec![vec![5, 6, 7, 8]];
    let mut source = MemorySource::new("  subject42  ", signals, channels, 4.0);

    let writer = WfdbWriter::create("test_other_base").unwrap();
    writer.convert(&mut source).unwrap();

    assert!(Path::new("test_other_base.hea").exists());
    assert!(Path::new("test_other_base.dat").exists());

    let lines = read_header_lines("test_other_base.hea");
    assert!(lines[0].starts_with("subject42 "));
    assert!(lines[1].starts_with("subject42.dat "));

    cleanup_test_files(&["test_other_base.hea", "test_other_base.dat"]);
}

#[test]
fn test_reader_parses_metadata() {
    let filename = "test_metadata.edf";
    let signals = vec![
        test_signal("ECG I", "uV", (-100.0, 100.0), (-1000, 1000), 4),
        test_signal("ECG II", "mV", (-5.0, 5.0), (-1000, 1000), 4),
    ];
    let channels = vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]];
    write_edf_file(filename, "P001 metadata", &signals, &channels, false).unwrap();

    let reader = EdfReader::open(filename).unwrap();
    let header = reader.header();

    assert_eq!(header.file_type, FileType::Edf);
    assert_eq!(header.patient, "P001 metadata");
    assert_eq!(header.datarecords_in_file, 1);
    assert_eq!(header.signals.len(), 2);
    assert_eq!(header.signals[0].label, "ECG I");
    assert_eq!(header.signals[0].physical_dimension, "uV");
    assert_eq!(header.signals[0].digital_max, 1000);
    assert_eq!(header.signals[1].label, "ECG II");
    assert_eq!(header.signals[1].samples_in_file, 4);
    assert!((reader.sample_frequency(0) - 4.0).abs() < 1e-9);

    cleanup_test_files(&[filename]);
}

#[test]
fn test_reader_accepts_edfplus_continuous() {
    let filename = "test_edfplus.edf";
    let signals = vec![test_signal("EEG Fp1", "uV", (-200.0, 200.0), (-2048, 2047), 4)];
    let channels = vec![vec![12, -30, 44, 7]];
    write_edf_file(filename, "P002 plus", &signals, &channels, true).unwrap();

    let reader = EdfReader::open(filename).unwrap();
    assert_eq!(reader.header().file_type, FileType::EdfPlus);

    cleanup_test_files(&[filename]);
}

#[test]
fn test_reader_rejects_discontinuous() {
    let filename = "test_edfd.edf";
    let signals = vec![test_signal("EEG Fp1", "uV", (-200.0, 200.0), (-2048, 2047), 4)];
    let channels = vec![vec![1, 2, 3, 4]];
    write_edf_file(filename, "P003", &signals, &channels, false).unwrap();

    // 把保留字段改写为EDF+D
    let mut bytes = fs::read(filename).unwrap();
    bytes[192..197].copy_from_slice(b"EDF+D");
    fs::write(filename, &bytes).unwrap();

    match EdfReader::open(filename) {
        Err(ConvertError::DiscontinuousFile) => {}
        other => panic!("expected DiscontinuousFile, got {:?}", other.map(|_| ())),
    }

    cleanup_test_files(&[filename]);
}

#[test]
fn test_reader_rejects_non_edf() {
    let filename = "test_not_edf.edf";
    fs::write(filename, vec![0xFFu8; 512]).unwrap();

    assert!(EdfReader::open(filename).is_err());

    cleanup_test_files(&[filename]);
}

#[test]
fn test_reader_rejects_zero_digital_range() {
    let filename = "test_zero_range.edf";
    let signals = vec![test_signal("Flat", "uV", (-10.0, 10.0), (700, 700), 4)];
    let channels = vec![vec![700, 700, 700, 700]];
    write_edf_file(filename, "P004", &signals, &channels, false).unwrap();

    match EdfReader::open(filename) {
        Err(ConvertError::DigitalMinEqualsMax) => {}
        other => panic!("expected DigitalMinEqualsMax, got {:?}", other.map(|_| ())),
    }

    cleanup_test_files(&[filename]);
}

#[test]
fn test_reader_clamps_to_digital_range() {
    let filename = "test_clamp.edf";
    // 样本600超出声明的数字最大值500
    let signals = vec![test_signal("Resp", "Ohm", (0.0, 50.0), (-500, 500), 4)];
    let channels = vec![vec![600, -600, 0, 250]];
    write_edf_file(filename, "P005", &signals, &channels, false).unwrap();

    let mut reader = EdfReader::open(filename).unwrap();
    let samples = reader.read_digital_samples(0, 4).unwrap();
    assert_eq!(samples, vec![500, -500, 0, 250]);

    cleanup_test_files(&[filename]);
}

#[test]
fn test_reader_invalid_signal_index() {
    let filename = "test_bad_index.edf";
    let signals = vec![test_signal("ECG I", "uV", (-100.0, 100.0), (-1000, 1000), 4)];
    let channels = vec![vec![1, 2, 3, 4]];
    write_edf_file(filename, "P006", &signals, &channels, false).unwrap();

    let mut reader = EdfReader::open(filename).unwrap();
    match reader.read_digital_samples(3, 4) {
        Err(ConvertError::InvalidSignalIndex(3)) => {}
        other => panic!("expected InvalidSignalIndex, got {:?}", other.map(|_| ())),
    }

    cleanup_test_files(&[filename]);
}

#[test]
fn test_initial_value_is_first_sample() {
    let signals = vec![
        test_signal("A", "uV", (-100.0, 100.0), (-1000, 1000), 4),
        test_signal("B", "uV", (-100.0, 100.0), (-1000, 1000), 4),
    ];
    let channels = vec![vec![-77, 1, 2, 3], vec![42, 9, 9, 9]];
    let mut source = MemorySource::new("init", signals, channels, 4.0);

    let writer = WfdbWriter::create("test_initial").unwrap();
    writer.convert(&mut source).unwrap();

    let lines = read_header_lines("test_initial.hea");
    let first_values: Vec<&str> = lines[1..]
        .iter()
        .map(|line| line.split(' ').nth(5).unwrap())
        .collect();
    assert_eq!(first_values, vec!["-77", "42"]);

    cleanup_test_files(&["test_initial.hea", "test_initial.dat"]);
}

#[test]
fn test_gain_reciprocal_relationship() {
    let signal = test_signal("EEG", "uV", (-2.5, 2.5), (-2048, 2047), 256);
    let gain = signal.gain();
    let adc_gain = 1.0 / gain;
    assert!((adc_gain * gain - 1.0).abs() < 1e-12);
    assert!((adc_gain - 819.0).abs() < 1e-9);
}
