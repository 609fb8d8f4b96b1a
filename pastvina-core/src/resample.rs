//! Gap-aware 1 Hz resampling and sleep-period inference.
use crate::config::EngineConfig;
use crate::gravity::PostureContext;
use crate::record::Sample;
use crate::time_model::gap_segments;

/// Gaps at or above this length (seconds) are treated as the collar's
/// sleep mode: motion is held constant rather than interpolated. Default
/// for [`EngineConfig::standby_threshold_sec`].
pub const STANDBY_THRESHOLD_SEC: i64 = 60;
/// Gaps longer than this are interpolated normally again — sleep mode
/// tops out around an hour of inactivity. Default for
/// [`EngineConfig::standby_max_duration_sec`].
pub const STANDBY_MAX_DURATION_SEC: i64 = 3600;

/// A sample at an integer 1 Hz epoch, carrying provenance flags and,
/// once the gravity engine has run, posture context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResampledSample {
    pub t_sec: u32,
    pub epoch_sec: i64,
    pub lat: f64,
    pub lon: f64,
    pub acc: (f64, f64, f64),
    pub acc_mag: f64,
    /// True when this sample did not come directly from the raw stream.
    pub interpolated: bool,
    /// True when this sample lies inside an inferred device-sleep gap.
    pub stand_by_sample: bool,
    /// Length of the originating gap, if this sample came from one.
    pub original_gap_duration: Option<i64>,
    /// Filled in by [`crate::gravity`] after resampling.
    pub posture: Option<PostureContext>,
}

impl ResampledSample {
    fn from_source(s: &Sample) -> Self {
        Self {
            t_sec: s.t_sec,
            epoch_sec: s.epoch_sec,
            lat: s.lat,
            lon: s.lon,
            acc: s.acc,
            acc_mag: s.acc_mag,
            interpolated: false,
            stand_by_sample: false,
            original_gap_duration: None,
            posture: None,
        }
    }
}

/// A single qualifying sleep gap.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SleepPeriod {
    pub start_sec: i64,
    pub end_sec: i64,
    pub duration_sec: i64,
}

/// Summary of the device's inferred sleep behavior over the day.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SleepAnalysis {
    pub periods: Vec<SleepPeriod>,
    pub total_sleep_time_sec: i64,
    pub count: u32,
    pub longest_sec: i64,
    pub mean_sec: f64,
}

impl SleepAnalysis {
    fn from_periods(periods: Vec<SleepPeriod>) -> Self {
        let count = periods.len() as u32;
        let total_sleep_time_sec: i64 = periods.iter().map(|p| p.duration_sec).sum();
        let longest_sec = periods.iter().map(|p| p.duration_sec).max().unwrap_or(0);
        let mean_sec = if count > 0 {
            total_sleep_time_sec as f64 / count as f64
        } else {
            0.0
        };
        Self {
            periods,
            total_sleep_time_sec,
            count,
            longest_sec,
            mean_sec,
        }
    }

    /// True if `epoch_sec` falls inside one of the recorded sleep periods.
    pub fn contains(&self, epoch_sec: i64) -> bool {
        self.periods
            .iter()
            .any(|p| epoch_sec >= p.start_sec && epoch_sec < p.end_sec)
    }
}

/// Resamples a retry-filtered, chronologically-ordered stream to 1 Hz,
/// per spec.md §4.2, and derives the day's sleep-period summary. Gap and
/// standby thresholds come from `config`, per spec.md §6's override rule.
pub fn resample_1hz(samples: &[Sample], config: &EngineConfig) -> (Vec<ResampledSample>, SleepAnalysis) {
    let mut out = Vec::new();
    let mut sleep_periods = Vec::new();
    let max_interval_sec = config.max_interval_sec;
    let standby_threshold_sec = config.standby_threshold_sec;
    let standby_max_duration_sec = config.standby_max_duration_sec;

    for segment in gap_segments(samples, max_interval_sec) {
        if segment.is_empty() {
            continue;
        }
        for pair in segment.windows(2) {
            let (s0, s1) = (&pair[0], &pair[1]);
            let gap = s1.epoch_sec - s0.epoch_sec;

            if gap <= 0 {
                // Should not occur post-sort; skip defensively.
                out.push(ResampledSample::from_source(s0));
                continue;
            }
            out.push(ResampledSample::from_source(s0));

            if gap > max_interval_sec || gap <= 1 {
                continue;
            }

            let is_standby = (standby_threshold_sec..=standby_max_duration_sec).contains(&gap);
            if is_standby {
                sleep_periods.push(SleepPeriod {
                    start_sec: s0.epoch_sec,
                    end_sec: s1.epoch_sec,
                    duration_sec: gap,
                });
            }

            for e in (s0.epoch_sec + 1)..s1.epoch_sec {
                let frac = (e - s0.epoch_sec) as f64 / gap as f64;
                let (lat, lon, acc) = if is_standby {
                    (s0.lat, s0.lon, s0.acc)
                } else {
                    (
                        lerp(s0.lat, s1.lat, frac),
                        lerp(s0.lon, s1.lon, frac),
                        (
                            lerp(s0.acc.0, s1.acc.0, frac),
                            lerp(s0.acc.1, s1.acc.1, frac),
                            lerp(s0.acc.2, s1.acc.2, frac),
                        ),
                    )
                };
                let acc_mag = (acc.0 * acc.0 + acc.1 * acc.1 + acc.2 * acc.2).sqrt();
                out.push(ResampledSample {
                    t_sec: (e.rem_euclid(86400)) as u32,
                    epoch_sec: e,
                    lat,
                    lon,
                    acc,
                    acc_mag,
                    interpolated: true,
                    stand_by_sample: is_standby,
                    original_gap_duration: Some(gap),
                    posture: None,
                });
            }
        }
        if let Some(last) = segment.last() {
            out.push(ResampledSample::from_source(last));
        }
    }

    (out, SleepAnalysis::from_periods(sleep_periods))
}

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}
