//! Low-pass gravity extraction, auto-calibration and the tilt-based
//! posture state machine (spec.md §4.3).
use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::record::ACC_SCALE;
use crate::resample::ResampledSample;

/// Cutoff of the gravity low-pass filter, Hz.
pub const LOWPASS_CUTOFF_HZ: f64 = 0.5;
/// Sample rate the filter is designed for: the resampler's 1 Hz output.
pub const SAMPLE_RATE_HZ: f64 = 1.0;

/// Window length (samples) for both calibration candidates and the
/// sliding-variance estimate.
const WINDOW_LEN: usize = 60;
const CALIBRATION_STEP: usize = 30;
const CALIBRATION_MIN_CANDIDATES: usize = 10;
const CALIBRATION_VARIANCE_MAX: f64 = 0.02;
const CALIBRATION_MEAN_RANGE: (f64, f64) = (0.9, 1.1);

const TRANSITION_VARIANCE_THRESHOLD: f64 = 0.05;
const STANDING_TILT_MAX_DEG: f64 = 35.0;
const LYING_TILT_MIN_DEG: f64 = 55.0;
const HYSTERESIS_COMMIT_SEC: i64 = 300;

/// Second-order Butterworth low-pass, direct form II transposed, per
/// spec.md §4.3's exact coefficient derivation.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    pub fn low_pass(cutoff_hz: f64, sample_rate_hz: f64) -> Self {
        let k = (PI * cutoff_hz / sample_rate_hz).tan();
        let norm = 1.0 / (1.0 + std::f64::consts::SQRT_2 * k + k * k);
        Self {
            b0: k * k * norm,
            b1: 2.0 * k * k * norm,
            b2: k * k * norm,
            a1: 2.0 * (k * k - 1.0) * norm,
            a2: (1.0 - std::f64::consts::SQRT_2 * k + k * k) * norm,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Direct form II transposed update: one multiply-add chain, two
    /// state registers, bit-identical across runs for identical input.
    pub fn filter(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// Stable posture as tracked by the hysteresis state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Posture {
    Unknown,
    Standing,
    Lying,
    /// Raw-rule-only classification; never a committed stable state.
    Transition,
}

/// Per-sample gravity and posture context, attached after the gravity
/// engine has run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureContext {
    /// Angle between the filtered gravity vector and the reference
    /// vector, degrees.
    pub tilt_deg: f64,
    /// Variance of gravity magnitude over the trailing window, g^2.
    pub variance: f64,
    pub raw_posture: Posture,
    pub stable_posture: Posture,
    pub confidence: f64,
}

/// Calibration outcome: either a genuine reference vector derived from
/// stable-standing candidate windows, or the identity fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationState {
    Calibrated,
    Uncalibrated,
}

/// Reference-vector calibration report.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureCalibration {
    pub status: CalibrationState,
    pub reference_vector: (f64, f64, f64),
    pub candidate_windows: u32,
}

/// A maximal contiguous run of a single stable posture.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureSegment {
    pub start_sec: i64,
    pub end_sec: i64,
    pub duration_sec: i64,
    pub posture: Posture,
    pub mean_tilt_deg: f64,
}

/// Aggregate time spent in each stable posture, over the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureSummary {
    pub standing_sec: i64,
    pub lying_sec: i64,
    pub unknown_sec: i64,
    pub segment_count: u32,
}

fn normalize(v: (f64, f64, f64)) -> (f64, f64, f64) {
    let norm = (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt();
    if norm.is_finite() && norm > 1e-9 {
        (v.0 / norm, v.1 / norm, v.2 / norm)
    } else {
        (0.0, 0.0, 1.0)
    }
}

fn dot(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

/// Runs the low-pass filter, auto-calibration and hysteresis posture state
/// machine over a resampled stream, writing [`PostureContext`] into every
/// sample and returning the day's calibration and posture-segment reports.
pub fn process_gravity(
    samples: &mut [ResampledSample],
) -> (PostureCalibration, Vec<PostureSegment>, PostureSummary) {
    if samples.is_empty() {
        return (
            PostureCalibration {
                status: CalibrationState::Uncalibrated,
                reference_vector: (0.0, 0.0, 1.0),
                candidate_windows: 0,
            },
            Vec::new(),
            PostureSummary::default(),
        );
    }

    let mut bx = Biquad::low_pass(LOWPASS_CUTOFF_HZ, SAMPLE_RATE_HZ);
    let mut by = Biquad::low_pass(LOWPASS_CUTOFF_HZ, SAMPLE_RATE_HZ);
    let mut bz = Biquad::low_pass(LOWPASS_CUTOFF_HZ, SAMPLE_RATE_HZ);

    // Filtered, unit-less (g) gravity vector per sample, plus its magnitude.
    let mut gravity = Vec::with_capacity(samples.len());
    for s in samples.iter() {
        let gx = bx.filter(s.acc.0 / ACC_SCALE);
        let gy = by.filter(s.acc.1 / ACC_SCALE);
        let gz = bz.filter(s.acc.2 / ACC_SCALE);
        gravity.push((gx, gy, gz));
    }

    let calibration = calibrate(samples, &gravity);

    // Sliding-window variance of gravity magnitude, fixed-window sum form.
    let mut window: VecDeque<f64> = VecDeque::with_capacity(WINDOW_LEN);
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    let mut state = Posture::Unknown;
    let mut pending: Option<(Posture, i64)> = None;

    let mut segments: Vec<PostureSegment> = Vec::new();
    let mut summary = PostureSummary::default();

    for (i, s) in samples.iter_mut().enumerate() {
        let g = gravity[i];
        let mag = (g.0 * g.0 + g.1 * g.1 + g.2 * g.2).sqrt();

        window.push_back(mag);
        sum += mag;
        sum_sq += mag * mag;
        if window.len() > WINDOW_LEN {
            let old = window.pop_front().unwrap();
            sum -= old;
            sum_sq -= old * old;
        }
        let n = window.len() as f64;
        let variance = if n >= 2.0 {
            ((sum_sq / n) - (sum / n).powi(2)).max(0.0)
        } else {
            0.0
        };

        let g_hat = normalize(g);
        let tilt_deg = if mag.is_finite() && mag > 1e-9 {
            dot(g_hat, calibration.reference_vector).abs().clamp(-1.0, 1.0).acos().to_degrees()
        } else {
            f64::NAN
        };

        let raw_posture = raw_posture_rule(tilt_deg, variance);

        // Hysteresis commit.
        if raw_posture == Posture::Standing || raw_posture == Posture::Lying {
            if raw_posture != state {
                let dt = 1i64;
                pending = Some(match pending {
                    Some((p, acc)) if p == raw_posture => (p, acc + dt),
                    _ => (raw_posture, dt),
                });
                if let Some((p, acc)) = pending {
                    if acc >= HYSTERESIS_COMMIT_SEC {
                        state = p;
                        pending = None;
                    }
                }
            } else {
                pending = None;
            }
        }

        let confidence = posture_confidence(state, tilt_deg, variance);

        let ctx = PostureContext {
            tilt_deg,
            variance,
            raw_posture,
            stable_posture: state,
            confidence,
        };
        s.posture = Some(ctx);

        match segments.last_mut() {
            Some(seg) if seg.posture == state => {
                seg.end_sec = s.epoch_sec;
                seg.duration_sec = seg.end_sec - seg.start_sec + 1;
                seg.mean_tilt_deg = running_mean(seg.mean_tilt_deg, tilt_deg, seg.duration_sec);
            }
            _ => segments.push(PostureSegment {
                start_sec: s.epoch_sec,
                end_sec: s.epoch_sec,
                duration_sec: 1,
                posture: state,
                mean_tilt_deg: if tilt_deg.is_finite() { tilt_deg } else { 0.0 },
            }),
        }

        match state {
            Posture::Standing => summary.standing_sec += 1,
            Posture::Lying => summary.lying_sec += 1,
            _ => summary.unknown_sec += 1,
        }
    }
    summary.segment_count = segments.len() as u32;

    (calibration, segments, summary)
}

fn running_mean(mean: f64, x: f64, n: i64) -> f64 {
    if !x.is_finite() || n <= 1 {
        return mean;
    }
    mean + (x - mean) / n as f64
}

fn raw_posture_rule(tilt_deg: f64, variance: f64) -> Posture {
    if variance > TRANSITION_VARIANCE_THRESHOLD || !tilt_deg.is_finite() {
        return Posture::Transition;
    }
    if tilt_deg < STANDING_TILT_MAX_DEG {
        Posture::Standing
    } else if tilt_deg > LYING_TILT_MIN_DEG {
        Posture::Lying
    } else {
        Posture::Transition
    }
}

fn posture_confidence(state: Posture, tilt_deg: f64, variance: f64) -> f64 {
    if !tilt_deg.is_finite() {
        return 0.3;
    }
    let base = match state {
        Posture::Standing => (1.0 - tilt_deg / STANDING_TILT_MAX_DEG).clamp(0.0, 1.0),
        Posture::Lying => ((tilt_deg - LYING_TILT_MIN_DEG) / (90.0 - LYING_TILT_MIN_DEG)).clamp(0.0, 1.0),
        Posture::Unknown | Posture::Transition => 0.3,
    };
    let elevated = variance > CALIBRATION_VARIANCE_MAX;
    let scaled = if elevated { base * 0.5 } else { base };
    scaled.clamp(0.0, 1.0)
}

fn calibrate(samples: &[ResampledSample], gravity: &[(f64, f64, f64)]) -> PostureCalibration {
    let day_end = samples
        .first()
        .map(|s| s.epoch_sec + 86_400)
        .unwrap_or(i64::MAX);

    let mut candidates: Vec<(f64, f64, f64)> = Vec::new();
    let mut start = 0usize;
    while start + WINDOW_LEN <= samples.len() && samples[start].epoch_sec < day_end {
        let window = &gravity[start..start + WINDOW_LEN];
        let n = window.len() as f64;
        let mean = window.iter().fold((0.0, 0.0, 0.0), |acc, v| {
            (acc.0 + v.0, acc.1 + v.1, acc.2 + v.2)
        });
        let mean = (mean.0 / n, mean.1 / n, mean.2 / n);
        let mean_mag = (mean.0 * mean.0 + mean.1 * mean.1 + mean.2 * mean.2).sqrt();

        let var = window
            .iter()
            .map(|v| {
                let mag = (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt();
                (mag - mean_mag).powi(2)
            })
            .sum::<f64>()
            / n;

        if var <= CALIBRATION_VARIANCE_MAX
            && mean_mag >= CALIBRATION_MEAN_RANGE.0
            && mean_mag <= CALIBRATION_MEAN_RANGE.1
        {
            candidates.push(mean);
        }
        start += CALIBRATION_STEP;
    }

    if candidates.len() >= CALIBRATION_MIN_CANDIDATES {
        let reference = normalize((
            median(candidates.iter().map(|v| v.0).collect()),
            median(candidates.iter().map(|v| v.1).collect()),
            median(candidates.iter().map(|v| v.2).collect()),
        ));
        PostureCalibration {
            status: CalibrationState::Calibrated,
            reference_vector: reference,
            candidate_windows: candidates.len() as u32,
        }
    } else {
        PostureCalibration {
            status: CalibrationState::Uncalibrated,
            reference_vector: (0.0, 0.0, 1.0),
            candidate_windows: candidates.len() as u32,
        }
    }
}

fn median(mut xs: Vec<f64>) -> f64 {
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        xs[n / 2]
    } else {
        (xs[n / 2 - 1] + xs[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biquad_is_stable_for_constant_input() {
        let mut bq = Biquad::low_pass(LOWPASS_CUTOFF_HZ, SAMPLE_RATE_HZ);
        let mut last = 0.0;
        for _ in 0..200 {
            last = bq.filter(1.0);
        }
        assert!((last - 1.0).abs() < 1e-6);
    }

    fn standing_sample(epoch_sec: i64) -> ResampledSample {
        ResampledSample {
            t_sec: (epoch_sec.rem_euclid(86400)) as u32,
            epoch_sec,
            lat: 50.0,
            lon: 14.0,
            acc: (0.0, 0.0, ACC_SCALE),
            acc_mag: ACC_SCALE,
            interpolated: false,
            stand_by_sample: false,
            original_gap_duration: None,
            posture: None,
        }
    }

    fn lying_sample(epoch_sec: i64) -> ResampledSample {
        ResampledSample {
            t_sec: (epoch_sec.rem_euclid(86400)) as u32,
            epoch_sec,
            lat: 50.0,
            lon: 14.0,
            acc: (ACC_SCALE, 0.0, 0.0),
            acc_mag: ACC_SCALE,
            interpolated: false,
            stand_by_sample: false,
            original_gap_duration: None,
            posture: None,
        }
    }

    #[test]
    fn sustained_upright_settles_into_standing() {
        let mut samples: Vec<ResampledSample> = (0..3000).map(standing_sample).collect();
        let (calibration, segments, summary) = process_gravity(&mut samples);
        assert_eq!(calibration.status, CalibrationState::Calibrated);
        assert!(summary.standing_sec > 0);
        assert!(segments.iter().any(|s| s.posture == Posture::Standing));
        let last = samples.last().unwrap().posture.unwrap();
        assert_eq!(last.stable_posture, Posture::Standing);
    }

    #[test]
    fn sustained_tilt_settles_into_lying() {
        // Calibrate upright first, then hold a 90-degree tilt for long enough
        // to cross the hysteresis commit threshold.
        let mut samples: Vec<ResampledSample> = (0..2000).map(standing_sample).collect();
        samples.extend((2000..2000 + 1000).map(lying_sample));
        let (_, _, _) = process_gravity(&mut samples);
        let last = samples.last().unwrap().posture.unwrap();
        assert_eq!(last.stable_posture, Posture::Lying);
    }

    #[test]
    fn posture_segments_partition_contiguously() {
        let mut samples: Vec<ResampledSample> = (0..1000).map(standing_sample).collect();
        let (_, segments, _) = process_gravity(&mut samples);
        for pair in segments.windows(2) {
            assert!(pair[0].end_sec < pair[1].start_sec + 1);
        }
    }
}
