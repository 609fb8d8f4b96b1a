//! End-to-end S1–S7 scenarios from spec.md §8, driven through
//! [`pastvina_core::pipeline::process`].
use pastvina_core::config::{EngineConfig, GeoInputs, ProcessingOptions};
use pastvina_core::record::RawRecord;

fn square(cx: f64, cy: f64, half: f64) -> Vec<(f64, f64)> {
    vec![(cx - half, cy - half), (cx - half, cy + half), (cx + half, cy + half), (cx + half, cy - half)]
}

fn geo_with_zone_a(zone_a: Vec<(f64, f64)>) -> GeoInputs {
    GeoInputs::new(
        vec![("outer", square(50.0, 14.0, 1.0))],
        zone_a,
        (50.0, 14.0),
        square(10.0, 10.0, 0.001),
    )
    .unwrap()
}

fn geo() -> GeoInputs {
    geo_with_zone_a(square(50.0, 14.0, 1.0))
}

#[test]
fn s1_basic_walking_minute() {
    let records = vec![
        RawRecord::default().date("15.03.2024").timestamp("10:00:00").position(50.0, 14.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("10:01:00").position(50.00027, 14.0).accel(0, 0, 1024),
    ];
    let options = ProcessingOptions::new(geo());
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    assert!(!result.empty);
    let intervals = result.intervals.unwrap();
    assert_eq!(intervals.len(), 60);
    assert!((result.total_distance_m - 30.0).abs() < 5.0);
}

#[test]
fn s2_deep_sleep_hour_labeled_lying() {
    let records = vec![
        RawRecord::default().date("15.03.2024").timestamp("12:00:00").position(50.0, 14.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("12:03:00").position(50.0, 14.0).accel(0, 0, 1024),
    ];
    let options = ProcessingOptions::new(geo());
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    assert_eq!(result.sleep_analysis.count, 1);
    assert_eq!(result.sleep_analysis.total_sleep_time_sec, 180);
    assert!(result.lying_sec >= 170);
}

#[test]
fn s3_retry_burst_filtered() {
    let records = vec![
        RawRecord::default().date("15.03.2024").timestamp("10:00:00").position(50.0, 14.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("10:00:05").position(50.0, 14.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("09:40:00").position(50.0, 14.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("10:00:10").position(50.0, 14.0).accel(0, 0, 1024),
    ];
    let options = ProcessingOptions::new(geo());
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    assert_eq!(result.retry_filter_stats.retry_count, 1);
    assert_eq!(result.data_cleaning_summary.lost_packets, 1);
}

#[test]
fn s4_out_of_fence_stray_dropped() {
    let records = vec![
        RawRecord::default().date("15.03.2024").timestamp("10:00:00").position(50.0, 14.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("10:00:05").position(51.0, 15.0).accel(0, 0, 1024),
        RawRecord::default().date("15.03.2024").timestamp("10:00:10").position(50.0, 14.0).accel(0, 0, 1024),
    ];
    let options = ProcessingOptions::new(geo());
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    assert_eq!(result.raw_sample_stats.outside_fence, 1);
    assert_eq!(result.data_cleaning_summary.fake_gps_records, 1);
}

#[test]
fn s5_zone_override_forces_standing() {
    // zone_a is a small square far from the recorded position; any
    // stationary, lying-looking interval there must be overridden.
    let records = vec![
        RawRecord::default().date("15.03.2024").timestamp("03:00:00").position(50.5, 14.5).accel(1024, 0, 0),
        RawRecord::default().date("15.03.2024").timestamp("03:30:00").position(50.5, 14.5).accel(1024, 0, 0),
    ];
    let zone_a = vec![(49.0, 13.0), (49.0, 13.1), (49.1, 13.1), (49.1, 13.0)];
    let options = ProcessingOptions::new(geo_with_zone_a(zone_a));
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    let intervals = result.intervals.unwrap();
    assert!(intervals.iter().all(|iv| !matches!(
        iv.behavior,
        pastvina_core::behavior::Behavior::Lying | pastvina_core::behavior::Behavior::LyingActive
    )));
}

#[test]
fn s6_normal_zero_blip_not_counted_as_outage() {
    let mut records = vec![];
    for (i, sat) in [(0, 10), (2, 0), (4, 10)] {
        records.push(
            RawRecord::default()
                .date("15.03.2024")
                .timestamp(&format!("10:00:{:02}", i))
                .position(50.0, 14.0)
                .accel(0, 0, 1024)
                .altitude(300.0)
                .satellites(sat),
        );
    }
    let options = ProcessingOptions::new(geo());
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    let report = result.gps_outage_report.unwrap();
    assert_eq!(report.real_outage_count, 0);
}

#[test]
fn s7_building_interference_outage() {
    let metal_building_center = (50.0, 14.0);
    let zone_a = square(50.0, 14.0, 1.0);
    let geo = GeoInputs::new(
        vec![("outer", square(50.0, 14.0, 1.0))],
        zone_a,
        (50.0, 14.0),
        vec![
            (metal_building_center.0 - 0.0005, metal_building_center.1 - 0.0005),
            (metal_building_center.0 - 0.0005, metal_building_center.1 + 0.0005),
            (metal_building_center.0 + 0.0005, metal_building_center.1 + 0.0005),
        ],
    )
    .unwrap();

    let mut records = vec![RawRecord::default()
        .date("15.03.2024")
        .timestamp("10:00:00")
        .position(50.0, 14.0)
        .accel(0, 0, 1024)
        .altitude(300.0)
        .satellites(10)];
    for s in (5..50).step_by(5) {
        records.push(
            RawRecord::default()
                .date("15.03.2024")
                .timestamp(&format!("10:00:{:02}", s))
                .position(50.0, 14.0)
                .accel(0, 0, 0)
                .altitude(300.0)
                .satellites(0),
        );
    }
    records.push(
        RawRecord::default()
            .date("15.03.2024")
            .timestamp("10:00:50")
            .position(50.0, 14.0)
            .accel(0, 0, 1024)
            .altitude(300.0)
            .satellites(10),
    );

    let options = ProcessingOptions::new(geo);
    let config = EngineConfig::default();
    let result = pastvina_core::pipeline::process(&records, &options, &config).unwrap();

    let report = result.gps_outage_report.unwrap();
    assert!(report.building_interference_count >= 1);
}
