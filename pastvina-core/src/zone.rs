//! Isolation detection and fence-perimeter crossings (spec.md §4.6).
use crate::behavior::Interval;
use crate::geo::Polygon;

/// A sustained run beyond [`FenceConfig::isolation_distance_m`] of the
/// facility center.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsolationEvent {
    pub start_sec: i64,
    pub end_sec: i64,
    pub duration_sec: i64,
    pub max_distance_m: f64,
    pub points: Vec<(f64, f64)>,
}

/// A fence-label change between two adjacent intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerimeterCrossing {
    pub mid_sec: i64,
    pub bearing_deg: f64,
    pub from_fence: u8,
    pub to_fence: u8,
}

/// Named concentric fences plus the facility center and isolation
/// threshold, inputs to [`detect_isolation_events`] and
/// [`detect_perimeter_crossings`].
pub struct FenceConfig<'a> {
    pub center: (f64, f64),
    pub isolation_distance_m: f64,
    pub isolation_min_duration_sec: i64,
    /// Fences I, II, III, outermost first, concentric around `center`.
    pub fences: &'a [Polygon],
}

/// Walks `intervals`, emitting one [`IsolationEvent`] per run where the
/// animal stays beyond `isolation_distance_m` from the center for at
/// least `isolation_min_duration_sec`.
pub fn detect_isolation_events(intervals: &[Interval], cfg: &FenceConfig) -> Vec<IsolationEvent> {
    let mut events = Vec::new();
    let mut open: Option<IsolationEvent> = None;

    for iv in intervals {
        if iv.distance_from_center_m > cfg.isolation_distance_m {
            let event = open.get_or_insert(IsolationEvent {
                start_sec: iv.start_sec,
                end_sec: iv.end_sec,
                duration_sec: 0,
                max_distance_m: iv.distance_from_center_m,
                points: Vec::new(),
            });
            event.end_sec = iv.end_sec;
            event.duration_sec = event.end_sec - event.start_sec;
            event.max_distance_m = event.max_distance_m.max(iv.distance_from_center_m);
            event.points.push((iv.mid_lat, iv.mid_lon));
        } else if let Some(event) = open.take() {
            if event.duration_sec >= cfg.isolation_min_duration_sec {
                events.push(event);
            }
        }
    }
    if let Some(event) = open {
        if event.duration_sec >= cfg.isolation_min_duration_sec {
            events.push(event);
        }
    }

    events
}

/// Index (1-based, outermost = 1) of the innermost fence containing
/// `(lat, lon)`, or `0` if outside every fence.
fn fence_index(fences: &[Polygon], lat: f64, lon: f64) -> u8 {
    fences
        .iter()
        .enumerate()
        .filter(|(_, f)| f.contains(lat, lon))
        .map(|(i, _)| i as u8 + 1)
        .max()
        .unwrap_or(0)
}

/// Emits a [`PerimeterCrossing`] whenever consecutive interval midpoints
/// land in different named fences.
pub fn detect_perimeter_crossings(intervals: &[Interval], cfg: &FenceConfig) -> Vec<PerimeterCrossing> {
    let mut crossings = Vec::new();
    for pair in intervals.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let from = fence_index(cfg.fences, a.mid_lat, a.mid_lon);
        let to = fence_index(cfg.fences, b.mid_lat, b.mid_lon);
        if from != to {
            crossings.push(PerimeterCrossing {
                mid_sec: (a.mid_sec + b.mid_sec) / 2,
                bearing_deg: b.bearing_deg,
                from_fence: from,
                to_fence: to,
            });
        }
    }
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{AccMovementBin, Behavior, ConsistencyTag, GpsMovementBin};
    use crate::gravity::Posture;

    fn interval(start: i64, distance_from_center: f64, lat: f64, lon: f64) -> Interval {
        Interval {
            start_sec: start,
            end_sec: start + 1,
            mid_sec: start,
            dt_sec: 1,
            distance_m: 0.0,
            speed_mps: 0.0,
            bearing_deg: 0.0,
            distance_from_center_m: distance_from_center,
            acc_mag: 1024.0,
            dynamic_g: 0.0,
            gps_bin: GpsMovementBin::Stationary,
            acc_bin: AccMovementBin::Stationary,
            posture: Posture::Standing,
            behavior: Behavior::Standing,
            consistency: ConsistencyTag::Consistent,
            confidence: 1.0,
            mid_lat: lat,
            mid_lon: lon,
            acc_y: 0.0,
        }
    }

    #[test]
    fn isolation_event_closes_on_return() {
        let intervals: Vec<Interval> = (0..2000)
            .map(|t| interval(t, if (500..1900).contains(&t) { 60.0 } else { 10.0 }, 50.0, 14.0))
            .collect();
        let cfg = FenceConfig {
            center: (50.0, 14.0),
            isolation_distance_m: 50.0,
            isolation_min_duration_sec: 1800,
            fences: &[],
        };
        let events = detect_isolation_events(&intervals, &cfg);
        assert_eq!(events.len(), 1);
        assert!(events[0].duration_sec >= 1800);
    }

    #[test]
    fn short_excursion_is_not_emitted() {
        let intervals: Vec<Interval> = (0..100)
            .map(|t| interval(t, if (10..50).contains(&t) { 60.0 } else { 10.0 }, 50.0, 14.0))
            .collect();
        let cfg = FenceConfig {
            center: (50.0, 14.0),
            isolation_distance_m: 50.0,
            isolation_min_duration_sec: 1800,
            fences: &[],
        };
        assert!(detect_isolation_events(&intervals, &cfg).is_empty());
    }

    #[test]
    fn perimeter_crossing_detected_between_fences() {
        let inner = Polygon::new("I", vec![(49.999, 13.999), (49.999, 14.001), (50.001, 14.001), (50.001, 13.999)]).unwrap();
        let outer = Polygon::new("II", vec![(49.9, 13.9), (49.9, 14.1), (50.1, 14.1), (50.1, 13.9)]).unwrap();
        let intervals = vec![interval(0, 0.0, 50.0, 14.0), interval(1, 0.0, 49.95, 14.0)];
        let cfg = FenceConfig {
            center: (50.0, 14.0),
            isolation_distance_m: 50.0,
            isolation_min_duration_sec: 1800,
            fences: &[outer, inner],
        };
        let crossings = detect_perimeter_crossings(&intervals, &cfg);
        assert_eq!(crossings.len(), 1);
    }
}
