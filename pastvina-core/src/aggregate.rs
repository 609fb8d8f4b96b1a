//! Day-level accumulation over classified intervals (spec.md §4.8).
use crate::behavior::{Behavior, ConsistencyTag, Interval, SimpleBehavior};

const SECONDS_PER_DAY: i64 = 86_400;
const STEP_ZERO_CROSSING_THRESHOLD: f64 = 100.0;
const MIN_STEP_FREQUENCY_HZ: f64 = 0.1;
const MIN_WALKING_TIME_FOR_FALLBACK_SEC: i64 = 60;

/// Consecutive intervals sharing one simplified behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub start_sec: i64,
    pub end_sec: i64,
    pub label: SimpleBehavior,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
}

/// Duration spent in a behavior during each hour of the day, `[0..24)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HourlyBins {
    pub lying_sec: [i64; 24],
    pub standing_sec: [i64; 24],
    pub walking_sec: [i64; 24],
}

/// One of the eight compass points, nearest to a circular-mean bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompassPoint {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl CompassPoint {
    fn from_bearing(bearing_deg: f64) -> Self {
        const POINTS: [CompassPoint; 8] = [
            CompassPoint::N,
            CompassPoint::Ne,
            CompassPoint::E,
            CompassPoint::Se,
            CompassPoint::S,
            CompassPoint::Sw,
            CompassPoint::W,
            CompassPoint::Nw,
        ];
        let idx = ((bearing_deg.rem_euclid(360.0) / 45.0).round() as usize) % 8;
        POINTS[idx]
    }
}

/// Day-part average direction, §4.8's morning/midday/afternoon circular means.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionBins {
    pub morning: Option<CompassPoint>,
    pub midday: Option<CompassPoint>,
    pub afternoon: Option<CompassPoint>,
}

/// Duration-weighted mean speed and accY over 12 two-hour bins.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedBins {
    pub mean_speed_mps: [f64; 12],
    pub mean_acc_y: [f64; 12],
}

impl Default for SpeedBins {
    fn default() -> Self {
        Self { mean_speed_mps: [0.0; 12], mean_acc_y: [0.0; 12] }
    }
}

/// Cross-validation tag counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossValidationStats {
    pub consistent: u32,
    pub gps_override: u32,
    pub minor_inconsistency: u32,
    pub acc_override: u32,
    pub uncertain: u32,
    pub zone_override: u32,
    pub standby_gps_movement: u32,
    pub standby_inferred: u32,
}

impl CrossValidationStats {
    fn record(&mut self, tag: ConsistencyTag) {
        match tag {
            ConsistencyTag::Consistent => self.consistent += 1,
            ConsistencyTag::GpsOverride => self.gps_override += 1,
            ConsistencyTag::MinorInconsistency => self.minor_inconsistency += 1,
            ConsistencyTag::AccOverride => self.acc_override += 1,
            ConsistencyTag::Uncertain => self.uncertain += 1,
            ConsistencyTag::ZoneOverride => self.zone_override += 1,
            ConsistencyTag::StandbyGpsMovement => self.standby_gps_movement += 1,
            ConsistencyTag::StandbyInferred => self.standby_inferred += 1,
        }
    }
}

/// Piecewise-linear speed (m/s) -> plausible step frequency (Hz) fallback,
/// used when zero-crossing detection yields an implausibly low rate
/// despite meaningful walking time.
fn speed_to_step_frequency(mean_speed_mps: f64) -> f64 {
    const TABLE: [(f64, f64); 4] = [(0.0, 0.0), (0.3, 0.6), (0.8, 1.2), (1.5, 2.0)];
    if mean_speed_mps <= TABLE[0].0 {
        return TABLE[0].1;
    }
    for w in TABLE.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        if mean_speed_mps <= x1 {
            let frac = (mean_speed_mps - x0) / (x1 - x0);
            return y0 + (y1 - y0) * frac;
        }
    }
    TABLE.last().unwrap().1
}

/// Full day-level accumulation over a classified interval stream, per
/// spec.md §4.8. One aggregator is built, fed every interval once, then
/// finalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayAggregator {
    pub total_distance_m: f64,
    pub day_distance_m: f64,
    pub night_distance_m: f64,
    pub lying_sec: i64,
    pub standing_sec: i64,
    pub walking_sec: i64,
    pub unknown_sec: i64,
    pub hourly: HourlyBins,
    pub cross_validation: CrossValidationStats,

    sum_dynamic_g2_dt: f64,
    sum_dynamic_g_dt: f64,
    sum_dt: i64,

    step_zero_crossings: u32,
    step_duration_sec: i64,
    walking_time_for_fallback_sec: i64,
    sum_walking_speed_dt: f64,

    segments: Vec<Segment>,
    morning_sin: f64,
    morning_cos: f64,
    midday_sin: f64,
    midday_cos: f64,
    afternoon_sin: f64,
    afternoon_cos: f64,

    speed_bin_sum: [f64; 12],
    speed_bin_dt: [i64; 12],
    acc_y_bin_sum: [f64; 12],
    acc_y_bin_dt: [i64; 12],

    prev_acc_y: Option<f64>,
}

impl DayAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one classified interval into the running accumulation.
    pub fn add_interval(&mut self, interval: &Interval) {
        let dt = interval.dt_sec;
        let is_moving = interval.gps_bin.is_moving();

        if is_moving {
            self.total_distance_m += interval.distance_m;
            let hour = ((interval.mid_sec.rem_euclid(SECONDS_PER_DAY)) / 3600) as usize;
            if (6..18).contains(&hour) {
                self.day_distance_m += interval.distance_m;
            } else {
                self.night_distance_m += interval.distance_m;
            }
        }

        match interval.behavior.simplify() {
            SimpleBehavior::Lying => self.lying_sec += dt,
            SimpleBehavior::Standing => self.standing_sec += dt,
            SimpleBehavior::Walking => self.walking_sec += dt,
            SimpleBehavior::Unknown => self.unknown_sec += dt,
        }

        let hour = ((interval.mid_sec.rem_euclid(SECONDS_PER_DAY)) / 3600) as usize;
        match interval.behavior.simplify() {
            SimpleBehavior::Lying => self.hourly.lying_sec[hour] += dt,
            SimpleBehavior::Standing => self.hourly.standing_sec[hour] += dt,
            SimpleBehavior::Walking => self.hourly.walking_sec[hour] += dt,
            SimpleBehavior::Unknown => {}
        }

        self.sum_dynamic_g2_dt += interval.dynamic_g * interval.dynamic_g * dt as f64;
        self.sum_dynamic_g_dt += interval.dynamic_g * dt as f64;
        self.sum_dt += dt;

        self.cross_validation.record(interval.consistency);

        if matches!(interval.behavior, Behavior::Walking | Behavior::Grazing) {
            self.walking_time_for_fallback_sec += dt;
            self.sum_walking_speed_dt += interval.speed_mps * dt as f64;
        }

        if let Some(prev) = self.prev_acc_y {
            let crossed = prev.signum() != interval.acc_y.signum()
                && prev.abs() >= STEP_ZERO_CROSSING_THRESHOLD
                && interval.acc_y.abs() >= STEP_ZERO_CROSSING_THRESHOLD;
            if crossed {
                self.step_zero_crossings += 1;
            }
        }
        if matches!(interval.behavior, Behavior::Walking | Behavior::Grazing) {
            self.step_duration_sec += dt;
        }
        self.prev_acc_y = Some(interval.acc_y);

        let day_part_rad = interval.bearing_deg.to_radians();
        let hour_f = hour as f64;
        if (6.0..10.0).contains(&hour_f) {
            self.morning_sin += day_part_rad.sin();
            self.morning_cos += day_part_rad.cos();
        } else if (10.0..14.0).contains(&hour_f) {
            self.midday_sin += day_part_rad.sin();
            self.midday_cos += day_part_rad.cos();
        } else if (14.0..18.0).contains(&hour_f) {
            self.afternoon_sin += day_part_rad.sin();
            self.afternoon_cos += day_part_rad.cos();
        }

        let bin = (hour / 2).min(11);
        self.speed_bin_sum[bin] += interval.speed_mps * dt as f64;
        self.speed_bin_dt[bin] += dt;
        self.acc_y_bin_sum[bin] += interval.acc_y * dt as f64;
        self.acc_y_bin_dt[bin] += dt;

        match self.segments.last_mut() {
            Some(seg) if seg.label == interval.behavior.simplify() => {
                seg.end_sec = interval.end_sec;
                let n = (seg.end_sec - seg.start_sec).max(1) as f64;
                seg.centroid_lat += (interval.mid_lat - seg.centroid_lat) * (dt as f64 / n);
                seg.centroid_lon += (interval.mid_lon - seg.centroid_lon) * (dt as f64 / n);
            }
            _ => self.segments.push(Segment {
                start_sec: interval.start_sec,
                end_sec: interval.end_sec,
                label: interval.behavior.simplify(),
                centroid_lat: interval.mid_lat,
                centroid_lon: interval.mid_lon,
            }),
        }
    }

    fn step_frequency_hz(&self) -> f64 {
        if self.step_duration_sec <= 0 {
            return 0.0;
        }
        let freq = (self.step_zero_crossings as f64 / 2.0) / self.step_duration_sec as f64;
        if freq < MIN_STEP_FREQUENCY_HZ && self.walking_time_for_fallback_sec > MIN_WALKING_TIME_FOR_FALLBACK_SEC {
            let mean_speed = self.sum_walking_speed_dt / self.walking_time_for_fallback_sec as f64;
            speed_to_step_frequency(mean_speed)
        } else {
            freq
        }
    }

    fn direction_bins(&self) -> DirectionBins {
        let pick = |sin: f64, cos: f64| {
            if sin == 0.0 && cos == 0.0 {
                None
            } else {
                Some(CompassPoint::from_bearing(sin.atan2(cos).to_degrees()))
            }
        };
        DirectionBins {
            morning: pick(self.morning_sin, self.morning_cos),
            midday: pick(self.midday_sin, self.midday_cos),
            afternoon: pick(self.afternoon_sin, self.afternoon_cos),
        }
    }

    fn speed_bins(&self) -> SpeedBins {
        let mut bins = SpeedBins::default();
        for i in 0..12 {
            if self.speed_bin_dt[i] > 0 {
                bins.mean_speed_mps[i] = self.speed_bin_sum[i] / self.speed_bin_dt[i] as f64;
                bins.mean_acc_y[i] = self.acc_y_bin_sum[i] / self.acc_y_bin_dt[i] as f64;
            }
        }
        bins
    }

    pub fn rms_dynamic_g(&self) -> f64 {
        if self.sum_dt == 0 {
            0.0
        } else {
            (self.sum_dynamic_g2_dt / self.sum_dt as f64).sqrt()
        }
    }

    pub fn mean_energy(&self) -> f64 {
        if self.sum_dt == 0 {
            0.0
        } else {
            self.sum_dynamic_g_dt / self.sum_dt as f64
        }
    }

    /// Finalizes accumulation: reconciles the four behavior-time buckets
    /// against 86400 s, pushing any shortfall into `unknown_sec` —
    /// never into `lying_sec`.
    pub fn finalize(mut self) -> DayAggregate {
        let accounted = self.lying_sec + self.standing_sec + self.walking_sec + self.unknown_sec;
        let shortfall = SECONDS_PER_DAY - accounted;
        if shortfall > 0 {
            self.unknown_sec += shortfall;
        }

        let step_frequency_hz = self.step_frequency_hz();
        let direction_bins = self.direction_bins();
        let speed_bins = self.speed_bins();

        DayAggregate {
            total_distance_m: self.total_distance_m,
            day_distance_m: self.day_distance_m,
            night_distance_m: self.night_distance_m,
            lying_sec: self.lying_sec,
            standing_sec: self.standing_sec,
            walking_sec: self.walking_sec,
            unknown_sec: self.unknown_sec,
            hourly: self.hourly,
            rms_dynamic_g: self.rms_dynamic_g(),
            mean_energy: self.mean_energy(),
            step_frequency_hz,
            cross_validation: self.cross_validation,
            segments: self.segments,
            direction_bins,
            speed_bins,
        }
    }
}

/// Finalized day-level aggregate, ready to fold into `DayResult`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAggregate {
    pub total_distance_m: f64,
    pub day_distance_m: f64,
    pub night_distance_m: f64,
    pub lying_sec: i64,
    pub standing_sec: i64,
    pub walking_sec: i64,
    pub unknown_sec: i64,
    pub hourly: HourlyBins,
    pub rms_dynamic_g: f64,
    pub mean_energy: f64,
    pub step_frequency_hz: f64,
    pub cross_validation: CrossValidationStats,
    pub segments: Vec<Segment>,
    pub direction_bins: DirectionBins,
    pub speed_bins: SpeedBins,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{AccMovementBin, GpsMovementBin};
    use crate::gravity::Posture;

    fn interval(start: i64, behavior: Behavior, speed: f64, distance: f64) -> Interval {
        Interval {
            start_sec: start,
            end_sec: start + 1,
            mid_sec: start,
            dt_sec: 1,
            distance_m: distance,
            speed_mps: speed,
            bearing_deg: 90.0,
            distance_from_center_m: 0.0,
            acc_mag: 1024.0,
            dynamic_g: 0.1,
            gps_bin: if speed > 0.0 { GpsMovementBin::NormalWalk } else { GpsMovementBin::Stationary },
            acc_bin: AccMovementBin::Walking,
            posture: Posture::Standing,
            behavior,
            consistency: ConsistencyTag::Consistent,
            confidence: 1.0,
            mid_lat: 50.0,
            mid_lon: 14.0,
            acc_y: 0.0,
        }
    }

    #[test]
    fn time_reconciliation_invariant_holds() {
        let mut agg = DayAggregator::new();
        for t in 0..SECONDS_PER_DAY - 10 {
            agg.add_interval(&interval(t, Behavior::Standing, 0.0, 0.0));
        }
        let result = agg.finalize();
        let total = result.lying_sec + result.standing_sec + result.walking_sec + result.unknown_sec;
        assert_eq!(total, SECONDS_PER_DAY);
        assert_eq!(result.lying_sec, 0, "shortfall must go to unknown, never lying");
    }

    #[test]
    fn day_plus_night_equals_total_distance() {
        let mut agg = DayAggregator::new();
        for t in 0..SECONDS_PER_DAY {
            agg.add_interval(&interval(t, Behavior::Walking, 1.0, 1.0));
        }
        let result = agg.finalize();
        assert!((result.day_distance_m + result.night_distance_m - result.total_distance_m).abs() < 1e-6);
    }

    #[test]
    fn hourly_bins_never_exceed_one_hour() {
        let mut agg = DayAggregator::new();
        for t in 0..SECONDS_PER_DAY {
            agg.add_interval(&interval(t, Behavior::Lying, 0.0, 0.0));
        }
        let result = agg.finalize();
        for sec in result.hourly.lying_sec {
            assert!(sec <= 3600);
        }
    }

    #[test]
    fn segments_collapse_consecutive_same_label() {
        let mut agg = DayAggregator::new();
        for t in 0..10 {
            agg.add_interval(&interval(t, Behavior::Standing, 0.0, 0.0));
        }
        for t in 10..20 {
            agg.add_interval(&interval(t, Behavior::Walking, 1.0, 1.0));
        }
        let result = agg.finalize();
        assert!(result.segments.len() >= 2);
        for pair in result.segments.windows(2) {
            assert_ne!(pair[0].label, pair[1].label);
        }
    }
}
