use approx::assert_abs_diff_eq;
use gemstrip_core::{NullSink, Plane, SummarySink};
use gemstrip_io::{
    ClusterFileReader, Error, HitFileWriter, HitFormat, RawFileReader, RawFileWriter, RunProcessor,
    HIT_RECORD_SIZE,
};
use gemstrip_readout::{
    ClusterRecord, EventWindow, RawStripRecord, RunConfig, Waveform, CLUSTER_RECORD_SIZE,
    RECORD_SIZE,
};
use tempfile::NamedTempFile;

fn record(
    event_id: u32,
    timestamp: f64,
    detector: u8,
    plane: Plane,
    strip: u16,
    adc: i16,
) -> RawStripRecord {
    // Peak in bin 3 (1-based).
    let waveform = Waveform::from_slice(&[0, adc / 4, adc, adc / 2, adc / 8, 0]).unwrap();
    RawStripRecord::new(event_id, timestamp, detector, plane, strip, 3, waveform)
}

/// Two events: event 0 has a clean single hit on detector 0 and an isolated
/// strip on detector 1, event 1 has two hits on detector 0 needing the
/// swapped pairing.
fn scenario() -> Vec<RawStripRecord> {
    let mut records = vec![
        record(0, 100.0, 0, Plane::X, 5, 100),
        record(0, 101.0, 0, Plane::X, 6, 150),
        record(0, 102.0, 0, Plane::X, 7, 90),
        record(0, 103.0, 0, Plane::Y, 40, 95),
        record(0, 104.0, 0, Plane::Y, 41, 140),
        record(0, 105.0, 0, Plane::Y, 42, 110),
        record(0, 106.0, 1, Plane::X, 12, 300),
    ];
    records.extend([
        record(1, 900.0, 0, Plane::X, 10, 100),
        record(1, 900.0, 0, Plane::X, 11, 120),
        record(1, 900.0, 0, Plane::X, 12, 80),
        record(1, 900.0, 0, Plane::X, 60, 20),
        record(1, 900.0, 0, Plane::X, 61, 30),
        record(1, 900.0, 0, Plane::Y, 30, 20),
        record(1, 900.0, 0, Plane::Y, 31, 25),
        record(1, 900.0, 0, Plane::Y, 70, 110),
        record(1, 900.0, 0, Plane::Y, 71, 120),
        record(1, 900.0, 0, Plane::Y, 72, 80),
        record(1, 900.0, 7, Plane::Y, 1, 50),
    ]);
    records
}

fn write_scenario() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let mut writer = RawFileWriter::create(file.path()).unwrap();
    writer.write_records(&scenario()).unwrap();
    writer.flush().unwrap();
    file
}

#[test]
fn test_reader_round_trip() {
    let file = write_scenario();
    let reader = RawFileReader::open(file.path()).unwrap();
    assert_eq!(reader.record_count(), 18);
    assert_eq!(reader.file_size(), 18 * RECORD_SIZE);
    assert_eq!(reader.read_all().unwrap(), scenario());
    assert_eq!(reader.record(4).unwrap().peak_amplitude(), 140);
    assert!(reader.record(18).is_err());
}

#[test]
fn test_events_by_id_and_time() {
    let file = write_scenario();
    let reader = RawFileReader::open(file.path()).unwrap();

    let events: Vec<_> = reader.events(EventWindow::ByEventId).unwrap().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].len(), 7);
    assert_eq!(events[1].reference_timestamp, 1.0);

    let events: Vec<_> = reader
        .events(EventWindow::ByTime { duration: 5.0 })
        .unwrap()
        .collect();
    // 100..=105 in the first window, 106 opens a second, 900 a third.
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].len(), 6);
    assert_eq!(events[1].reference_timestamp, 106.0);
}

#[test]
fn test_truncated_file_rejected() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), vec![0u8; RECORD_SIZE + 3]).unwrap();
    assert!(matches!(
        RawFileReader::open(file.path()),
        Err(Error::InvalidFormat(_))
    ));
}

#[test]
fn test_malformed_record_fails_up_front() {
    let file = NamedTempFile::new().unwrap();
    let mut bytes = scenario()[0].to_bytes().to_vec();
    let mut bad = scenario()[1].to_bytes();
    bad[13] = 9;
    bytes.extend_from_slice(&bad);
    std::fs::write(file.path(), bytes).unwrap();

    let reader = RawFileReader::open(file.path()).unwrap();
    assert!(reader.record(0).is_ok());
    assert!(reader.read_all().is_err());
    assert!(reader.events(EventWindow::ByEventId).is_err());
}

#[test]
fn test_process_file_csv() {
    let input = write_scenario();
    let output = NamedTempFile::new().unwrap();
    let reader = RawFileReader::open(input.path()).unwrap();
    let mut writer = HitFileWriter::create(output.path(), HitFormat::Csv).unwrap();

    let run = RunProcessor::new(RunConfig::default()).unwrap();
    let mut sink = SummarySink::new();
    let summary = run
        .process_file(&reader, &mut writer, 0, &mut sink)
        .unwrap();

    assert_eq!(summary.records, 18);
    assert_eq!(summary.unmapped_records, 1);
    assert_eq!(summary.statistics.events, 2);
    // Event 0: detectors 0 and 1, event 1: detector 0.
    assert_eq!(summary.statistics.detector_readouts, 3);
    assert_eq!(summary.statistics.accepted, 2);
    assert_eq!(summary.statistics.no_clusters, 1);
    assert_eq!(summary.hits_written, 3);

    let content = std::fs::read_to_string(output.path()).unwrap();
    let rows = csv_rows(&content);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "0");
    assert_eq!(rows[0][4], "685");
    assert_eq!(rows[0][7], "0");
    assert_eq!(rows[1][4], "610");
    assert_eq!(rows[2][4], "95");
    assert_eq!(rows[2][7], "1");

    // Cluster size and charge ratio of each matched pair.
    assert_eq!(rows[0][5], "6");
    assert_eq!(rows[1][5], "6");
    assert_eq!(rows[2][5], "4");
    let first_ratio: f64 = rows[0][6].parse().unwrap();
    assert_abs_diff_eq!(first_ratio, 345.0 / 340.0, epsilon = 1e-12);
    let last_ratio: f64 = rows[2][6].parse().unwrap();
    assert_abs_diff_eq!(last_ratio, 45.0 / 50.0, epsilon = 1e-12);

    let x: f64 = rows[0][2].parse().unwrap();
    assert!(x > 5.5 && x < 6.5);

    let ratio = sink.get("charge_ratio").unwrap();
    assert_eq!(ratio.count, 3);
    let charge_x = sink.get("cluster_charge_x").unwrap().sum;
    assert_abs_diff_eq!(charge_x, 340.0 + 300.0 + 50.0);
    // Six clusters, each with a six-bin peak waveform.
    assert_eq!(sink.get("waveform_amplitude").unwrap().count, 36);
}

#[test]
fn test_process_file_binary_parallel() {
    let input = write_scenario();
    let output = NamedTempFile::new().unwrap();
    let reader = RawFileReader::open(input.path()).unwrap();
    let mut writer = HitFileWriter::create(output.path(), HitFormat::Binary).unwrap();

    let config = RunConfig::default().with_parallel_detectors(true);
    let run = RunProcessor::new(config).unwrap();
    let summary = run
        .process_file(&reader, &mut writer, 0, &mut NullSink)
        .unwrap();

    let data = std::fs::read(output.path()).unwrap();
    assert_eq!(data.len(), 3 * HIT_RECORD_SIZE);
    assert_eq!(summary.hits_written, 3);
}

#[test]
fn test_invalid_config_rejected() {
    let config = RunConfig::from_json("{}")
        .unwrap()
        .with_event_window(EventWindow::ByTime { duration: -3.0 });
    assert!(matches!(
        RunProcessor::new(config),
        Err(Error::ReadoutError(_))
    ));
}

#[test]
fn test_event_numbers_continue_across_files() {
    let first = write_scenario();
    let second = write_scenario();
    let output = NamedTempFile::new().unwrap();
    let mut writer = HitFileWriter::create(output.path(), HitFormat::Csv).unwrap();
    let run = RunProcessor::new(RunConfig::default()).unwrap();

    let mut events = 0;
    for input in [&first, &second] {
        let reader = RawFileReader::open(input.path()).unwrap();
        let summary = run
            .process_file(&reader, &mut writer, events, &mut NullSink)
            .unwrap();
        events += summary.statistics.events;
    }
    assert_eq!(events, 4);

    let content = std::fs::read_to_string(output.path()).unwrap();
    let numbers: Vec<&str> = content
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(numbers, vec!["0", "1", "1", "2", "3", "3"]);
}

/// Data rows of a CSV hit file, split into fields.
fn csv_rows(content: &str) -> Vec<Vec<&str>> {
    content
        .lines()
        .skip(1)
        .map(|l| l.split(',').collect())
        .collect()
}

fn cluster(detector: u8, time: f64, x: f64, y: f64, charges: (u16, u16)) -> ClusterRecord {
    ClusterRecord {
        time,
        x_position: x,
        y_position: y,
        x_charge: charges.0,
        y_charge: charges.1,
        x_size: 3,
        y_size: 4,
        detector,
    }
}

fn write_clusters(records: &[ClusterRecord]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let bytes: Vec<u8> = records.iter().flat_map(ClusterRecord::to_bytes).collect();
    std::fs::write(file.path(), bytes).unwrap();
    file
}

#[test]
fn test_process_cluster_file() {
    let input = write_clusters(&[
        cluster(0, 1_000.0, 12.5, 40.25, (300, 330)),
        cluster(1, 1_020.0, 0.0, 17.0, (100, 90)),
        cluster(1, 1_030.0, 8.0, 9.0, (200, 180)),
        cluster(9, 1_040.0, 1.0, 1.0, (10, 10)),
        cluster(0, 5_000.0, 30.0, 31.0, (50, 60)),
    ]);
    let reader = ClusterFileReader::open(input.path()).unwrap();
    assert_eq!(reader.record_count(), 5);
    assert_eq!(reader.record(3).unwrap().detector, 9);
    assert!(reader.record(5).is_err());

    let output = NamedTempFile::new().unwrap();
    let mut writer = HitFileWriter::create(output.path(), HitFormat::Csv).unwrap();
    let config = RunConfig::default().with_event_window(EventWindow::ByTime { duration: 500.0 });
    let run = RunProcessor::new(config).unwrap();
    let mut sink = SummarySink::new();
    let summary = run
        .process_cluster_file(&reader, &mut writer, 10, &mut sink)
        .unwrap();

    assert_eq!(summary.records, 5);
    assert_eq!(summary.unmapped_records, 1);
    assert_eq!(summary.statistics.events, 2);
    assert_eq!(summary.statistics.detector_readouts, 3);
    assert_eq!(summary.hits_written, 3);
    assert_eq!(sink.get("charge_ratio").unwrap().count, 3);

    let content = std::fs::read_to_string(output.path()).unwrap();
    let rows = csv_rows(&content);
    assert_eq!(rows.len(), 3);
    let first = ["10", "0", "12.5", "40.25", "630", "7", "1.1", "1000"];
    assert_eq!(rows[0], first);
    // The zero-position cluster on detector 1 is dropped.
    assert_eq!(rows[1][..5], ["10", "1", "8", "9", "380"]);
    assert_eq!(rows[2][0], "11");
    assert_eq!(rows[2][7], "5000");
}

#[test]
fn test_cluster_file_needs_time_window() {
    let input = write_clusters(&[cluster(0, 0.0, 1.0, 1.0, (10, 10))]);
    let reader = ClusterFileReader::open(input.path()).unwrap();
    let output = NamedTempFile::new().unwrap();
    let mut writer = HitFileWriter::create(output.path(), HitFormat::Csv).unwrap();
    let run = RunProcessor::new(RunConfig::default()).unwrap();
    assert!(matches!(
        run.process_cluster_file(&reader, &mut writer, 0, &mut NullSink),
        Err(Error::ReadoutError(_))
    ));

    let truncated = NamedTempFile::new().unwrap();
    std::fs::write(truncated.path(), vec![0u8; CLUSTER_RECORD_SIZE - 1]).unwrap();
    assert!(matches!(
        ClusterFileReader::open(truncated.path()),
        Err(Error::InvalidFormat(_))
    ));
}
