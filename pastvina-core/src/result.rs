//! The top-level `DayResult` output type (spec.md §3, §6).
use crate::aggregate::{CrossValidationStats, DirectionBins, HourlyBins, Segment, SpeedBins};
use crate::behavior::Interval;
use crate::dwell::DwellCluster;
use crate::gravity::{PostureCalibration, PostureSegment, PostureSummary};
use crate::outage::GpsOutageReport;
use crate::record::RawSampleStats;
use crate::resample::SleepAnalysis;
use crate::time_model::RetryFilterStats;
use crate::zone::{IsolationEvent, PerimeterCrossing};

/// Counts of records dropped before or during retry filtering — the
/// day's "lost packets" as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataCleaningSummary {
    pub fake_gps_records: u32,
    pub lost_packets: u32,
}

/// The four dwell-cluster sets a day produces.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DwellClusterSets {
    pub lying_day: Vec<DwellCluster>,
    pub lying_night: Vec<DwellCluster>,
    pub standing_day: Vec<DwellCluster>,
    pub standing_night: Vec<DwellCluster>,
}

/// Everything a single `(animal, date)` call to [`crate::pipeline::process`]
/// produces. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DayResult {
    pub date_str: Option<String>,
    pub dataset_name: Option<String>,

    pub total_distance_m: f64,
    pub day_distance_m: f64,
    pub night_distance_m: f64,
    pub lying_sec: i64,
    pub standing_sec: i64,
    pub walking_sec: i64,
    pub unknown_sec: i64,
    pub rms_dynamic_g: f64,
    pub mean_energy: f64,
    pub step_frequency_hz: f64,

    pub hourly: HourlyBins,
    pub direction_bins: DirectionBins,
    pub speed_bins: SpeedBins,
    pub segments: Vec<Segment>,
    pub dwell_clusters: DwellClusterSets,
    pub isolation_events: Vec<IsolationEvent>,
    pub perimeter_crossings: Vec<PerimeterCrossing>,

    pub sleep_analysis: SleepAnalysis,
    pub posture_calibration: PostureCalibration,
    pub posture_segments: Vec<PostureSegment>,
    pub posture_summary: PostureSummary,
    pub cross_validation_stats: CrossValidationStats,
    pub data_cleaning_summary: DataCleaningSummary,
    pub retry_filter_stats: RetryFilterStats,
    pub raw_sample_stats: RawSampleStats,
    pub gps_outage_report: Option<GpsOutageReport>,

    /// Retained only when the caller requested the detailed stream
    /// (default: included).
    pub intervals: Option<Vec<Interval>>,

    /// True for the degenerate "fewer than two valid samples" case —
    /// every scalar above is zeroed, not a partial computation.
    pub empty: bool,
}

impl DayResult {
    /// The result produced for input that never reaches two valid
    /// samples: zeroed metrics, no error.
    pub fn empty(date_str: Option<String>, dataset_name: Option<String>, raw_sample_stats: RawSampleStats) -> Self {
        Self {
            date_str,
            dataset_name,
            total_distance_m: 0.0,
            day_distance_m: 0.0,
            night_distance_m: 0.0,
            lying_sec: 0,
            standing_sec: 0,
            walking_sec: 0,
            unknown_sec: 86_400,
            rms_dynamic_g: 0.0,
            mean_energy: 0.0,
            step_frequency_hz: 0.0,
            hourly: HourlyBins::default(),
            direction_bins: DirectionBins { morning: None, midday: None, afternoon: None },
            speed_bins: SpeedBins::default(),
            segments: Vec::new(),
            dwell_clusters: DwellClusterSets::default(),
            isolation_events: Vec::new(),
            perimeter_crossings: Vec::new(),
            sleep_analysis: SleepAnalysis::default(),
            posture_calibration: PostureCalibration {
                status: crate::gravity::CalibrationState::Uncalibrated,
                reference_vector: (0.0, 0.0, 1.0),
                candidate_windows: 0,
            },
            posture_segments: Vec::new(),
            posture_summary: PostureSummary::default(),
            cross_validation_stats: CrossValidationStats::default(),
            data_cleaning_summary: DataCleaningSummary::default(),
            retry_filter_stats: RetryFilterStats::default(),
            raw_sample_stats,
            gps_outage_report: None,
            intervals: None,
            empty: true,
        }
    }
}
