//! GPS/ACC cross-validated behavior classification (spec.md §4.4).
use strum_macros::{Display, EnumString};

use crate::geo::{bearing_deg, haversine_m};
use crate::gravity::Posture as StablePosture;
use crate::record::ACC_SCALE;
use crate::resample::{ResampledSample, SleepAnalysis};

/// GPS-derived movement bin, from speed in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GpsMovementBin {
    Stationary,
    Grazing,
    SlowWalk,
    NormalWalk,
    FastWalk,
    Running,
}

impl GpsMovementBin {
    pub fn from_speed(speed_mps: f64) -> (Self, f64) {
        use GpsMovementBin::*;
        match speed_mps {
            s if s < 0.02 => (Stationary, 0.95),
            s if s < 0.08 => (Grazing, 0.9),
            s if s < 0.25 => (SlowWalk, 0.88),
            s if s < 0.8 => (NormalWalk, 0.85),
            s if s < 1.5 => (FastWalk, 0.82),
            _ => (Running, 0.8),
        }
    }

    pub fn is_moving(self) -> bool {
        !matches!(self, GpsMovementBin::Stationary)
    }
}

/// ACC-derived movement bin, from dynamic-g = `|acc_mag/1024 - 1|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccMovementBin {
    Stationary,
    Ruminating,
    Grazing,
    Walking,
    FastWalk,
    Running,
}

impl AccMovementBin {
    pub fn from_dynamic_g(dynamic_g: f64) -> Self {
        use AccMovementBin::*;
        match dynamic_g {
            g if g < 0.05 => Stationary,
            g if g < 0.12 => Ruminating,
            g if g < 0.20 => Grazing,
            g if g < 0.35 => Walking,
            g if g < 0.55 => FastWalk,
            _ => Running,
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, AccMovementBin::Stationary | AccMovementBin::Ruminating)
    }
}

/// Final, fully-qualified behavior label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Behavior {
    Walking,
    Grazing,
    Lying,
    LyingActive,
    Standing,
    StandingRuminating,
    StandingActive,
    Unknown,
}

/// Day-level simplification of [`Behavior`], used for time accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimpleBehavior {
    Lying,
    Standing,
    Walking,
    Unknown,
}

impl Behavior {
    pub fn simplify(self) -> SimpleBehavior {
        match self {
            Behavior::Walking | Behavior::Grazing => SimpleBehavior::Walking,
            Behavior::Lying | Behavior::LyingActive => SimpleBehavior::Lying,
            Behavior::Standing | Behavior::StandingRuminating | Behavior::StandingActive => {
                SimpleBehavior::Standing
            }
            Behavior::Unknown => SimpleBehavior::Unknown,
        }
    }
}

/// Why the cross-validator settled on a given label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConsistencyTag {
    Consistent,
    GpsOverride,
    MinorInconsistency,
    AccOverride,
    Uncertain,
    ZoneOverride,
    StandbyGpsMovement,
    StandbyInferred,
}

/// One classified pair of consecutive resampled samples.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub start_sec: i64,
    pub end_sec: i64,
    pub mid_sec: i64,
    pub dt_sec: i64,
    pub distance_m: f64,
    pub speed_mps: f64,
    pub bearing_deg: f64,
    pub distance_from_center_m: f64,
    pub acc_mag: f64,
    pub dynamic_g: f64,
    pub gps_bin: GpsMovementBin,
    pub acc_bin: AccMovementBin,
    pub posture: StablePosture,
    pub behavior: Behavior,
    pub consistency: ConsistencyTag,
    pub confidence: f64,
    pub mid_lat: f64,
    pub mid_lon: f64,
    pub acc_y: f64,
}

/// Classifies one interval per spec.md §4.4's cross-validation table, the
/// sleep special case, and the zone override.
#[allow(clippy::too_many_arguments)]
pub fn classify_interval(
    s0: &ResampledSample,
    s1: &ResampledSample,
    center: (f64, f64),
    zone_a_contains_mid: bool,
    sleep: &SleepAnalysis,
) -> Interval {
    let dt_sec = (s1.epoch_sec - s0.epoch_sec).max(1);
    let distance_m = haversine_m(s0.lat, s0.lon, s1.lat, s1.lon);
    let speed_mps = distance_m / dt_sec as f64;
    let bearing = bearing_deg(s0.lat, s0.lon, s1.lat, s1.lon);
    let mid_lat = (s0.lat + s1.lat) / 2.0;
    let mid_lon = (s0.lon + s1.lon) / 2.0;
    let mid_sec = (s0.epoch_sec + s1.epoch_sec) / 2;
    let distance_from_center_m = haversine_m(mid_lat, mid_lon, center.0, center.1);
    let acc_mag = (s0.acc_mag + s1.acc_mag) / 2.0;
    let dynamic_g = (acc_mag / ACC_SCALE - 1.0).abs();

    let (gps_bin, gps_conf) = GpsMovementBin::from_speed(speed_mps);
    let acc_bin = AccMovementBin::from_dynamic_g(dynamic_g);

    let posture_ctx = s1.posture.or(s0.posture);
    let stable_posture = posture_ctx.map(|p| p.stable_posture).unwrap_or(StablePosture::Unknown);
    let posture_confidence = posture_ctx.map(|p| p.confidence).unwrap_or(0.3);

    let in_sleep = sleep.contains(mid_sec);

    let (mut behavior, mut consistency, mut confidence) = if in_sleep {
        classify_sleep_interval(gps_bin, stable_posture, posture_confidence)
    } else {
        classify_cross_validated(gps_bin, gps_conf, acc_bin, stable_posture, posture_confidence)
    };

    if matches!(behavior, Behavior::Lying | Behavior::LyingActive) && !zone_a_contains_mid {
        behavior = Behavior::Standing;
        consistency = ConsistencyTag::ZoneOverride;
        confidence = 0.98;
    }

    Interval {
        start_sec: s0.epoch_sec,
        end_sec: s1.epoch_sec,
        mid_sec,
        dt_sec,
        distance_m,
        speed_mps,
        bearing_deg: bearing,
        distance_from_center_m,
        acc_mag,
        dynamic_g,
        gps_bin,
        acc_bin,
        posture: stable_posture,
        behavior,
        consistency,
        confidence,
        mid_lat,
        mid_lon,
        acc_y: (s0.acc.1 + s1.acc.1) / 2.0,
    }
}

fn classify_cross_validated(
    gps_bin: GpsMovementBin,
    gps_conf: f64,
    acc_bin: AccMovementBin,
    posture: StablePosture,
    posture_conf: f64,
) -> (Behavior, ConsistencyTag, f64) {
    let gps_moving = gps_bin.is_moving();
    let acc_active = acc_bin.is_active();

    if gps_moving && acc_active {
        let behavior = if matches!(acc_bin, AccMovementBin::Grazing) {
            Behavior::Grazing
        } else {
            Behavior::Walking
        };
        return (behavior, ConsistencyTag::Consistent, gps_conf.min(0.95));
    }
    if gps_moving && !acc_active {
        let behavior = if matches!(acc_bin, AccMovementBin::Grazing) {
            Behavior::Grazing
        } else {
            Behavior::Walking
        };
        return (behavior, ConsistencyTag::GpsOverride, gps_conf * 0.8);
    }

    // GPS says stationary.
    match (posture, acc_bin) {
        (StablePosture::Lying, AccMovementBin::Stationary | AccMovementBin::Ruminating) => {
            (Behavior::Lying, ConsistencyTag::Consistent, posture_conf)
        }
        (StablePosture::Lying, _) => {
            (Behavior::LyingActive, ConsistencyTag::MinorInconsistency, posture_conf * 0.9)
        }
        (StablePosture::Standing, AccMovementBin::Ruminating) => (
            Behavior::StandingRuminating,
            ConsistencyTag::Consistent,
            posture_conf,
        ),
        (StablePosture::Standing, _) => {
            let behavior = if matches!(acc_bin, AccMovementBin::Stationary) {
                Behavior::Standing
            } else {
                Behavior::StandingActive
            };
            (behavior, ConsistencyTag::Consistent, posture_conf)
        }
        (StablePosture::Unknown | StablePosture::Transition, acc) if acc.is_active() => {
            (Behavior::Walking, ConsistencyTag::AccOverride, 0.7 * 0.7)
        }
        (StablePosture::Unknown | StablePosture::Transition, _) => {
            (Behavior::Standing, ConsistencyTag::Uncertain, 0.5)
        }
    }
}

fn classify_sleep_interval(
    gps_bin: GpsMovementBin,
    posture: StablePosture,
    posture_conf: f64,
) -> (Behavior, ConsistencyTag, f64) {
    if gps_bin.is_moving() {
        let behavior = if matches!(gps_bin, GpsMovementBin::Grazing) {
            Behavior::Grazing
        } else {
            Behavior::Walking
        };
        return (behavior, ConsistencyTag::StandbyGpsMovement, 0.75);
    }
    let behavior = if posture_conf < 0.5 || posture == StablePosture::Lying {
        Behavior::Lying
    } else {
        Behavior::Standing
    };
    (behavior, ConsistencyTag::StandbyInferred, posture_conf.max(0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::PostureContext;

    fn sample(epoch_sec: i64, lat: f64, lon: f64, acc_mag: f64, posture: StablePosture) -> ResampledSample {
        ResampledSample {
            t_sec: (epoch_sec.rem_euclid(86400)) as u32,
            epoch_sec,
            lat,
            lon,
            acc: (0.0, 0.0, acc_mag),
            acc_mag,
            interpolated: false,
            stand_by_sample: false,
            original_gap_duration: None,
            posture: Some(PostureContext {
                tilt_deg: 0.0,
                variance: 0.0,
                raw_posture: posture,
                stable_posture: posture,
                confidence: 0.9,
            }),
        }
    }

    #[test]
    fn s1_moving_interval_is_consistent_walking() {
        let s0 = sample(0, 50.0, 14.0, ACC_SCALE, StablePosture::Standing);
        let s1 = sample(1, 50.00027, 14.0, ACC_SCALE * 1.4, StablePosture::Standing);
        let sleep = SleepAnalysis::default();
        let interval = classify_interval(&s0, &s1, (50.0, 14.0), true, &sleep);
        assert_eq!(interval.behavior.simplify(), SimpleBehavior::Walking);
    }

    #[test]
    fn s5_zone_override_forces_standing() {
        let s0 = sample(0, 50.0, 14.0, ACC_SCALE, StablePosture::Lying);
        let s1 = sample(1, 50.0, 14.0, ACC_SCALE, StablePosture::Lying);
        let sleep = SleepAnalysis::default();
        let interval = classify_interval(&s0, &s1, (50.0, 14.0), false, &sleep);
        assert_eq!(interval.behavior, Behavior::Standing);
        assert_eq!(interval.consistency, ConsistencyTag::ZoneOverride);
        assert!((interval.confidence - 0.98).abs() < 1e-9);
    }

    #[test]
    fn s2_standby_inferred_lying() {
        let s0 = sample(100, 50.0, 14.0, ACC_SCALE, StablePosture::Lying);
        let s1 = sample(101, 50.0, 14.0, ACC_SCALE, StablePosture::Lying);
        let sleep = SleepAnalysis {
            periods: vec![crate::resample::SleepPeriod {
                start_sec: 0,
                end_sec: 200,
                duration_sec: 200,
            }],
            total_sleep_time_sec: 200,
            count: 1,
            longest_sec: 200,
            mean_sec: 200.0,
        };
        let interval = classify_interval(&s0, &s1, (50.0, 14.0), true, &sleep);
        assert_eq!(interval.behavior, Behavior::Lying);
        assert_eq!(interval.consistency, ConsistencyTag::StandbyInferred);
    }
}
