//! Greedy radius-based dwell clustering (spec.md §4.5).
use crate::geo::haversine_m;

/// A spatial centroid accumulating stationary dwell time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DwellCluster {
    pub lat: f64,
    pub lon: f64,
    pub total_dt_sec: i64,
    pub sample_count: u32,
    pub start_sec: i64,
    pub end_sec: i64,
}

/// One input point feeding the clusterer: a dwell-classified interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellPoint {
    pub lat: f64,
    pub lon: f64,
    pub dt_sec: i64,
    pub start_sec: i64,
    pub end_sec: i64,
}

/// Merges `points` into clusters, preserving the source's sample-count
/// weighting (not `dt`) for the running centroid mean — an intentional
/// bit-compatibility choice, not a time-weighted average.
pub fn cluster_greedy(points: &[DwellPoint], radius_m: f64, min_duration_sec: i64) -> Vec<DwellCluster> {
    let mut clusters: Vec<DwellCluster> = Vec::new();

    for p in points {
        let nearest = clusters
            .iter_mut()
            .map(|c| (haversine_m(c.lat, c.lon, p.lat, p.lon), c))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        match nearest {
            Some((dist, cluster)) if dist <= radius_m => {
                let n = cluster.sample_count as f64;
                cluster.lat = (cluster.lat * n + p.lat) / (n + 1.0);
                cluster.lon = (cluster.lon * n + p.lon) / (n + 1.0);
                cluster.sample_count += 1;
                cluster.total_dt_sec += p.dt_sec;
                cluster.start_sec = cluster.start_sec.min(p.start_sec);
                cluster.end_sec = cluster.end_sec.max(p.end_sec);
            }
            _ => clusters.push(DwellCluster {
                lat: p.lat,
                lon: p.lon,
                total_dt_sec: p.dt_sec,
                sample_count: 1,
                start_sec: p.start_sec,
                end_sec: p.end_sec,
            }),
        }
    }

    clusters.retain(|c| c.total_dt_sec >= min_duration_sec);
    clusters.sort_by(|a, b| b.total_dt_sec.cmp(&a.total_dt_sec));
    clusters
}

/// True when `t_sec` (seconds since midnight) falls in the day window
/// `[6h, 18h)`.
pub fn is_day(t_sec: u32) -> bool {
    (6 * 3600..18 * 3600).contains(&t_sec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64, dt: i64, start: i64) -> DwellPoint {
        DwellPoint { lat, lon, dt_sec: dt, start_sec: start, end_sec: start + dt }
    }

    #[test]
    fn merges_points_within_radius() {
        let points = vec![
            pt(50.0, 14.0, 60, 0),
            pt(50.00001, 14.00001, 60, 60),
            pt(50.0, 14.0, 60, 120),
        ];
        let clusters = cluster_greedy(&points, 10.0, 0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].sample_count, 3);
        assert_eq!(clusters[0].total_dt_sec, 180);
    }

    #[test]
    fn separates_distant_points() {
        let points = vec![pt(50.0, 14.0, 60, 0), pt(51.0, 15.0, 60, 60)];
        let clusters = cluster_greedy(&points, 10.0, 0);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn filters_below_min_duration() {
        let points = vec![pt(50.0, 14.0, 60, 0)];
        let clusters = cluster_greedy(&points, 10.0, 180);
        assert!(clusters.is_empty());
    }

    #[test]
    fn sorted_by_total_dt_descending() {
        let points = vec![
            pt(50.0, 14.0, 60, 0),
            pt(51.0, 15.0, 600, 60),
        ];
        let clusters = cluster_greedy(&points, 10.0, 0);
        assert!(clusters[0].total_dt_sec >= clusters[1].total_dt_sec);
    }

    #[test]
    fn centroid_weighted_by_sample_count_not_dt() {
        // Second point has huge dt but centroid moves by an equal 1/2 share,
        // not weighted toward it by duration.
        let points = vec![pt(50.0, 14.0, 10, 0), pt(50.001, 14.0, 10_000, 10)];
        let clusters = cluster_greedy(&points, 200.0, 0);
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].lat - 50.0005).abs() < 1e-9);
    }
}
