//! Outlier filtering, satellite-pattern analysis and GPS-outage
//! classification (spec.md §4.7).
use strum_macros::{Display, EnumString};

use crate::config::EngineConfig;
use crate::geo::{haversine_m, Polygon};
use crate::record::Sample;

/// Bounding box `(min_lat, max_lat, min_lon, max_lon)` used to reject
/// position outliers that fall outside the monitored country. Default for
/// [`EngineConfig::bounding_box`].
pub const CZECH_REPUBLIC_BBOX: (f64, f64, f64, f64) = (48.5, 51.1, 12.0, 18.9);

/// Drops altitude readings outside `bounds` (min, max), then IQR-trims
/// the remainder (1.5·IQR rule).
pub fn filter_altitude_outliers(samples: &[Sample], bounds: (f64, f64)) -> Vec<f64> {
    let (min, max) = bounds;
    let mut values: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.altitude)
        .filter(|&a| (min..=max).contains(&a))
        .collect();
    if values.len() < 4 {
        return values;
    }
    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo, hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
    values.retain(|&a| a >= lo && a <= hi);
    values
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let idx = (p * (n - 1) as f64).round() as usize;
    sorted[idx.min(n - 1)]
}

/// Walks the sequence, dropping any point whose haversine to the last
/// accepted point exceeds `max_jump_m` or that falls outside `bbox`.
pub fn filter_position_outliers(
    samples: &[Sample],
    bbox: (f64, f64, f64, f64),
    max_jump_m: f64,
) -> Vec<usize> {
    let mut kept = Vec::new();
    let mut last: Option<(f64, f64)> = None;
    for (i, s) in samples.iter().enumerate() {
        let (min_lat, max_lat, min_lon, max_lon) = bbox;
        if !(min_lat..=max_lat).contains(&s.lat) || !(min_lon..=max_lon).contains(&s.lon) {
            continue;
        }
        if let Some((lat, lon)) = last {
            if haversine_m(lat, lon, s.lat, s.lon) > max_jump_m {
                continue;
            }
        }
        last = Some((s.lat, s.lon));
        kept.push(i);
    }
    kept
}

/// Satellite-visibility status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SatelliteStatus {
    Good,
    Marginal,
    Degraded,
    Critical,
}

/// One adjacent-sample drop of ≥ 50% in satellite count.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DegradationEvent {
    pub index: usize,
    pub before: u32,
    pub after: u32,
}

/// Summary of satellite-count behavior across the day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SatellitePattern {
    pub mean: f64,
    pub min: u32,
    pub max: u32,
    pub zero_count: u32,
    pub degradation_events: Vec<DegradationEvent>,
    pub status: SatelliteStatus,
}

pub fn analyze_satellite_pattern(samples: &[Sample]) -> SatellitePattern {
    let non_zero: Vec<u32> = samples.iter().filter_map(|s| s.satellites).filter(|&n| n > 0).collect();
    let zero_count = samples.iter().filter(|s| s.satellites == Some(0)).count() as u32;
    let mean = if non_zero.is_empty() {
        0.0
    } else {
        non_zero.iter().sum::<u32>() as f64 / non_zero.len() as f64
    };
    let min = non_zero.iter().copied().min().unwrap_or(0);
    let max = non_zero.iter().copied().max().unwrap_or(0);

    let mut degradation_events = Vec::new();
    for (i, pair) in samples.windows(2).enumerate() {
        if let (Some(a), Some(b)) = (pair[0].satellites, pair[1].satellites) {
            if a > 0 && (b as f64) <= (a as f64) * 0.5 {
                degradation_events.push(DegradationEvent { index: i, before: a, after: b });
            }
        }
    }

    let status = if mean >= 8.0 {
        SatelliteStatus::Good
    } else if mean >= 5.0 {
        SatelliteStatus::Marginal
    } else if mean >= 3.0 {
        SatelliteStatus::Degraded
    } else {
        SatelliteStatus::Critical
    };

    SatellitePattern { mean, min, max, zero_count, degradation_events, status }
}

/// A maximal contiguous run where `satellites == 0` or `altitude == 0`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZeroRun {
    pub start_index: usize,
    pub end_index: usize,
    pub duration_sec: i64,
    pub has_acc: bool,
    pub sat_before: Option<u32>,
    pub sat_after: Option<u32>,
    pub first_lat: f64,
    pub first_lon: f64,
}

fn is_zero_sample(s: &Sample) -> bool {
    s.satellites == Some(0) || s.altitude == Some(0.0)
}

/// Scans `samples` for maximal zero runs and their surrounding context.
pub fn detect_zero_runs(samples: &[Sample]) -> Vec<ZeroRun> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < samples.len() {
        if !is_zero_sample(&samples[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i;
        while j < samples.len() && is_zero_sample(&samples[j]) {
            j += 1;
        }
        let end = j - 1;
        let duration_sec = samples[end].epoch_sec - samples[start].epoch_sec;
        let has_acc = samples[start..=end].iter().any(|s| s.acc_mag > 0.0);
        let sat_before = if start > 0 { samples[start - 1].satellites } else { None };
        let sat_after = samples.get(end + 1).and_then(|s| s.satellites);
        runs.push(ZeroRun {
            start_index: start,
            end_index: end,
            duration_sec,
            has_acc,
            sat_before,
            sat_after,
            first_lat: samples[start].lat,
            first_lon: samples[start].lon,
        });
        i = j;
    }
    runs
}

/// Outcome of classifying a single [`ZeroRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZeroRunClass {
    Fmb920Normal,
    RealOutage,
    BuildingInterference,
    Undetermined,
}

/// Classifies one zero run per spec.md §4.7's scoring rules. `normal_max_sec`
/// / `outage_min_sec` / `building_proximity_m` come from [`EngineConfig`].
pub fn classify_zero_run(
    run: &ZeroRun,
    metal_building: &Polygon,
    normal_max_sec: i64,
    outage_min_sec: i64,
    building_proximity_m: f64,
) -> (ZeroRunClass, f64) {
    let mut confidence = 0.0f64;
    let mut class = ZeroRunClass::Undetermined;
    let mut set = |c: ZeroRunClass, conf: f64| {
        class = c;
        confidence = (confidence + conf).min(1.0);
    };

    if run.duration_sec <= normal_max_sec {
        set(ZeroRunClass::Fmb920Normal, 0.4);
    }
    if run.has_acc {
        set(ZeroRunClass::Fmb920Normal, 0.3);
    }
    let sat_delta = match (run.sat_before, run.sat_after) {
        (Some(b), Some(a)) => Some((a as i64 - b as i64).abs()),
        _ => None,
    };
    if let Some(after) = run.sat_after {
        if after >= 8 && sat_delta.map(|d| d <= 2).unwrap_or(false) {
            set(ZeroRunClass::Fmb920Normal, 0.3);
        }
        if after < 5 {
            set(ZeroRunClass::RealOutage, 0.3);
        }
    }
    let near_building = haversine_m(
        run.first_lat,
        run.first_lon,
        metal_building.centroid().0,
        metal_building.centroid().1,
    ) <= building_proximity_m;
    if near_building && run.duration_sec > normal_max_sec {
        set(ZeroRunClass::BuildingInterference, 0.4);
    }
    if run.duration_sec > outage_min_sec && class != ZeroRunClass::BuildingInterference {
        set(ZeroRunClass::RealOutage, 0.2);
    }

    (class, confidence.clamp(0.0, 1.0))
}

/// Day-level GPS-outage report.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsOutageReport {
    pub fmb920_normal_count: u32,
    pub real_outage_count: u32,
    pub building_interference_count: u32,
    pub undetermined_count: u32,
    pub total_outage_time_sec: i64,
    pub real_outage_time_sec: i64,
    pub overall_health: OutageHealth,
}

/// Joint outcome of real-outage ratio and satellite-pattern status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Default)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutageHealth {
    #[default]
    Good,
    Acceptable,
    Degraded,
}

/// Builds the full GPS-outage report for a day's samples. Every numeric
/// threshold this pulls in comes from `config`, per spec.md §6.
pub fn build_outage_report(samples: &[Sample], metal_building: &Polygon, config: &EngineConfig) -> GpsOutageReport {
    let runs = detect_zero_runs(samples);
    let day_sec = samples
        .last()
        .zip(samples.first())
        .map(|(l, f)| (l.epoch_sec - f.epoch_sec).max(1))
        .unwrap_or(1);

    let mut report = GpsOutageReport::default();
    for run in &runs {
        let (class, _conf) = classify_zero_run(
            run,
            metal_building,
            config.zero_run_normal_max_sec,
            config.zero_run_outage_min_sec,
            config.metal_building_proximity_m,
        );
        report.total_outage_time_sec += run.duration_sec;
        match class {
            ZeroRunClass::Fmb920Normal => report.fmb920_normal_count += 1,
            ZeroRunClass::RealOutage => {
                report.real_outage_count += 1;
                report.real_outage_time_sec += run.duration_sec;
            }
            ZeroRunClass::BuildingInterference => report.building_interference_count += 1,
            ZeroRunClass::Undetermined => report.undetermined_count += 1,
        }
    }

    let real_outage_pct = report.real_outage_time_sec as f64 / day_sec as f64;
    let pattern = analyze_satellite_pattern(samples);
    report.overall_health = match (real_outage_pct, pattern.status) {
        (pct, SatelliteStatus::Good) if pct < 0.01 => OutageHealth::Good,
        (pct, _) if pct < 0.05 => OutageHealth::Acceptable,
        _ => OutageHealth::Degraded,
    };

    report
}
