//! Top-level orchestration: raw records in, a [`DayResult`] out.
use crate::aggregate::DayAggregator;
use crate::behavior::classify_interval;
use crate::config::{EngineConfig, ProcessingOptions};
use crate::dwell::{cluster_greedy, is_day, DwellPoint};
use crate::error::CoreError;
use crate::gravity::process_gravity;
use crate::record::{RawRecord, RawSampleStats};
use crate::resample::resample_1hz;
use crate::result::{DataCleaningSummary, DayResult, DwellClusterSets};
use crate::time_model::{filter_retries, parse_sample, sort_samples};
use crate::zone::{detect_isolation_events, detect_perimeter_crossings, FenceConfig};

/// Runs the full behavioral-reconstruction pipeline over one day's raw
/// records. Returns `Err` only for the narrow set of programming errors
/// in `config`; every data-quality anomaly becomes a counter or status
/// field on the returned [`DayResult`].
pub fn process(
    records: &[RawRecord],
    options: &ProcessingOptions,
    config: &EngineConfig,
) -> Result<DayResult, CoreError> {
    config.validate()?;

    options.report("parsing");
    let mut raw_stats = RawSampleStats::default();
    let mut samples = Vec::with_capacity(records.len());
    for raw in records {
        match parse_sample(raw) {
            Some(sample) => samples.push(sample),
            None => raw_stats.invalid += 1,
        }
    }

    options.report("fence_filtering");
    let before_fence = samples.len();
    samples.retain(|s| {
        options
            .geo
            .fence_polygons
            .iter()
            .any(|fence| fence.contains(s.lat, s.lon))
    });
    raw_stats.outside_fence = (before_fence - samples.len()) as u32;
    raw_stats.valid = samples.len() as u32;
    let fake_gps_records = raw_stats.outside_fence;

    options.report("retry_filtering");
    // Retry detection walks the stream in arrival order, not epoch order:
    // a retried packet is defined by how far it lags the running maximum
    // of records seen so far, which a prior sort would erase.
    let (samples, retry_filter_stats) = filter_retries(samples, config.max_backward_jump_sec);

    options.report("ordering");
    let samples = sort_samples(samples);

    if samples.len() < 2 {
        let mut result = DayResult::empty(options.date_str.clone(), options.dataset_name.clone(), raw_stats);
        result.retry_filter_stats = retry_filter_stats;
        result.data_cleaning_summary = DataCleaningSummary {
            fake_gps_records,
            lost_packets: result.retry_filter_stats.retry_count,
        };
        return Ok(result);
    }

    options.report("outage_analysis");
    let gps_outage_report = if samples.iter().any(|s| s.satellites.is_some()) {
        Some(crate::outage::build_outage_report(&samples, &options.geo.metal_building_polygon, config))
    } else {
        None
    };

    options.report("resampling");
    let (mut resampled, sleep_analysis) = resample_1hz(&samples, config);

    options.report("gravity");
    let (posture_calibration, posture_segments, posture_summary) = process_gravity(&mut resampled);

    options.report("classification");
    let center = options.geo.center_point;
    let mut intervals = Vec::with_capacity(resampled.len().saturating_sub(1));
    for pair in resampled.windows(2) {
        let mid_lat = (pair[0].lat + pair[1].lat) / 2.0;
        let mid_lon = (pair[0].lon + pair[1].lon) / 2.0;
        let zone_a_contains_mid = options.geo.zone_a.contains(mid_lat, mid_lon);
        intervals.push(classify_interval(&pair[0], &pair[1], center, zone_a_contains_mid, &sleep_analysis));
    }

    options.report("dwell_clustering");
    let dwell_clusters = build_dwell_clusters(&intervals, config);

    options.report("zone_analysis");
    let fence_cfg = FenceConfig {
        center,
        isolation_distance_m: config.isolation_distance_m,
        isolation_min_duration_sec: config.isolation_min_duration_sec,
        fences: &options.geo.fence_polygons,
    };
    let isolation_events = detect_isolation_events(&intervals, &fence_cfg);
    let perimeter_crossings = detect_perimeter_crossings(&intervals, &fence_cfg);

    options.report("aggregation");
    let mut aggregator = DayAggregator::new();
    for interval in &intervals {
        aggregator.add_interval(interval);
    }
    let aggregate = aggregator.finalize();

    options.report("done");
    Ok(DayResult {
        date_str: options.date_str.clone(),
        dataset_name: options.dataset_name.clone(),
        total_distance_m: aggregate.total_distance_m,
        day_distance_m: aggregate.day_distance_m,
        night_distance_m: aggregate.night_distance_m,
        lying_sec: aggregate.lying_sec,
        standing_sec: aggregate.standing_sec,
        walking_sec: aggregate.walking_sec,
        unknown_sec: aggregate.unknown_sec,
        rms_dynamic_g: aggregate.rms_dynamic_g,
        mean_energy: aggregate.mean_energy,
        step_frequency_hz: aggregate.step_frequency_hz,
        hourly: aggregate.hourly,
        direction_bins: aggregate.direction_bins,
        speed_bins: aggregate.speed_bins,
        segments: aggregate.segments,
        dwell_clusters,
        isolation_events,
        perimeter_crossings,
        sleep_analysis,
        posture_calibration,
        posture_segments,
        posture_summary,
        cross_validation_stats: aggregate.cross_validation,
        data_cleaning_summary: DataCleaningSummary {
            fake_gps_records,
            lost_packets: retry_filter_stats.retry_count,
        },
        retry_filter_stats,
        raw_sample_stats: raw_stats,
        gps_outage_report,
        intervals: Some(intervals),
        empty: false,
    })
}

fn build_dwell_clusters(intervals: &[crate::behavior::Interval], config: &EngineConfig) -> DwellClusterSets {
    use crate::behavior::SimpleBehavior;

    let mut lying_day = Vec::new();
    let mut lying_night = Vec::new();
    let mut standing_day = Vec::new();
    let mut standing_night = Vec::new();

    for iv in intervals {
        let point = DwellPoint {
            lat: iv.mid_lat,
            lon: iv.mid_lon,
            dt_sec: iv.dt_sec,
            start_sec: iv.start_sec,
            end_sec: iv.end_sec,
        };
        let t_sec = (iv.mid_sec.rem_euclid(86_400)) as u32;
        match iv.behavior.simplify() {
            SimpleBehavior::Lying => {
                if is_day(t_sec) {
                    lying_day.push(point);
                } else {
                    lying_night.push(point);
                }
            }
            SimpleBehavior::Standing => {
                if is_day(t_sec) {
                    standing_day.push(point);
                } else {
                    standing_night.push(point);
                }
            }
            _ => {}
        }
    }

    DwellClusterSets {
        lying_day: cluster_greedy(&lying_day, config.cluster_radius_m, 0),
        lying_night: cluster_greedy(&lying_night, config.cluster_radius_m, 0),
        standing_day: cluster_greedy(&standing_day, config.cluster_radius_m, config.standing_cluster_min_duration_sec),
        standing_night: cluster_greedy(&standing_night, config.cluster_radius_m, config.standing_cluster_min_duration_sec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeoInputs;

    fn square(cx: f64, cy: f64, half: f64) -> Vec<(f64, f64)> {
        vec![(cx - half, cy - half), (cx - half, cy + half), (cx + half, cy + half), (cx + half, cy - half)]
    }

    fn geo() -> GeoInputs {
        GeoInputs::new(
            vec![("outer", square(50.0, 14.0, 1.0))],
            square(50.0, 14.0, 1.0),
            (50.0, 14.0),
            square(10.0, 10.0, 0.001),
        )
        .unwrap()
    }

    #[test]
    fn empty_input_yields_empty_result_without_error() {
        let options = ProcessingOptions::new(geo());
        let config = EngineConfig::default();
        let result = process(&[], &options, &config).unwrap();
        assert!(result.empty);
        assert_eq!(result.unknown_sec, 86_400);
    }

    #[test]
    fn single_record_yields_empty_result() {
        let records = vec![RawRecord::default().date("15.03.2024").timestamp("10:00:00").position(50.0, 14.0)];
        let options = ProcessingOptions::new(geo());
        let config = EngineConfig::default();
        let result = process(&records, &options, &config).unwrap();
        assert!(result.empty);
    }

    #[test]
    fn basic_two_record_walking_minute() {
        let records = vec![
            RawRecord::default()
                .date("15.03.2024")
                .timestamp("10:00:00")
                .position(50.0, 14.0)
                .accel(0, 0, 1024),
            RawRecord::default()
                .date("15.03.2024")
                .timestamp("10:01:00")
                .position(50.0003, 14.0)
                .accel(0, 0, 1024),
        ];
        let options = ProcessingOptions::new(geo());
        let config = EngineConfig::default();
        let result = process(&records, &options, &config).unwrap();
        assert!(!result.empty);
        assert!(result.total_distance_m > 0.0);
        let total = result.lying_sec + result.standing_sec + result.walking_sec + result.unknown_sec;
        assert_eq!(total, 86_400);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let options = ProcessingOptions::new(geo());
        let config = EngineConfig::default().cluster_radius_m(-1.0);
        assert!(process(&[], &options, &config).is_err());
    }
}
