//! Value-type engine configuration and per-call processing options.
//!
//! No process-wide mutable state: every numeric threshold in spec.md §4
//! lives on [`EngineConfig`], built once with [`EngineConfig::default`] and
//! customized through chainable setters in the teacher's `Rcvr`-style
//! builder idiom (clone-and-set, not `&mut self`).
use crate::error::{CoreError, GeometryError};
use crate::geo::Polygon;
use crate::outage::CZECH_REPUBLIC_BBOX;
use crate::time_model::{MAX_BACKWARD_JUMP_SEC, MAX_INTERVAL_SEC};

/// Every numeric threshold named in spec.md §4, collected into one value
/// type so a caller can override any of them without touching process-wide
/// state.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_backward_jump_sec: i64,
    pub max_interval_sec: i64,
    pub standby_threshold_sec: i64,
    pub standby_max_duration_sec: i64,

    pub cluster_radius_m: f64,
    pub standing_cluster_min_duration_sec: i64,

    pub isolation_distance_m: f64,
    pub isolation_min_duration_sec: i64,

    pub altitude_bounds_m: (f64, f64),
    pub position_outlier_distance_m: f64,
    pub bounding_box: (f64, f64, f64, f64),
    pub satellite_degradation_ratio: f64,
    pub metal_building_proximity_m: f64,
    pub zero_run_normal_max_sec: i64,
    pub zero_run_outage_min_sec: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_backward_jump_sec: MAX_BACKWARD_JUMP_SEC,
            max_interval_sec: MAX_INTERVAL_SEC,
            standby_threshold_sec: crate::resample::STANDBY_THRESHOLD_SEC,
            standby_max_duration_sec: crate::resample::STANDBY_MAX_DURATION_SEC,
            cluster_radius_m: 10.0,
            standing_cluster_min_duration_sec: 180,
            isolation_distance_m: 50.0,
            isolation_min_duration_sec: 1800,
            altitude_bounds_m: (50.0, 800.0),
            position_outlier_distance_m: 500.0,
            bounding_box: CZECH_REPUBLIC_BBOX,
            satellite_degradation_ratio: 0.5,
            metal_building_proximity_m: 25.0,
            zero_run_normal_max_sec: 10,
            zero_run_outage_min_sec: 30,
        }
    }
}

impl EngineConfig {
    pub fn max_backward_jump_sec(mut self, v: i64) -> Self {
        self.max_backward_jump_sec = v;
        self
    }
    pub fn max_interval_sec(mut self, v: i64) -> Self {
        self.max_interval_sec = v;
        self
    }
    pub fn standby_threshold_sec(mut self, v: i64) -> Self {
        self.standby_threshold_sec = v;
        self
    }
    pub fn standby_max_duration_sec(mut self, v: i64) -> Self {
        self.standby_max_duration_sec = v;
        self
    }
    pub fn cluster_radius_m(mut self, v: f64) -> Self {
        self.cluster_radius_m = v;
        self
    }
    pub fn standing_cluster_min_duration_sec(mut self, v: i64) -> Self {
        self.standing_cluster_min_duration_sec = v;
        self
    }
    pub fn isolation_distance_m(mut self, v: f64) -> Self {
        self.isolation_distance_m = v;
        self
    }
    pub fn isolation_min_duration_sec(mut self, v: i64) -> Self {
        self.isolation_min_duration_sec = v;
        self
    }
    pub fn altitude_bounds_m(mut self, v: (f64, f64)) -> Self {
        self.altitude_bounds_m = v;
        self
    }
    pub fn position_outlier_distance_m(mut self, v: f64) -> Self {
        self.position_outlier_distance_m = v;
        self
    }
    pub fn bounding_box(mut self, v: (f64, f64, f64, f64)) -> Self {
        self.bounding_box = v;
        self
    }
    pub fn metal_building_proximity_m(mut self, v: f64) -> Self {
        self.metal_building_proximity_m = v;
        self
    }
    pub fn zero_run_normal_max_sec(mut self, v: i64) -> Self {
        self.zero_run_normal_max_sec = v;
        self
    }
    pub fn zero_run_outage_min_sec(mut self, v: i64) -> Self {
        self.zero_run_outage_min_sec = v;
        self
    }

    /// Rejects configurations a real engine could never run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_backward_jump_sec <= 0 {
            return Err(CoreError::InvalidMaxBackwardJump(self.max_backward_jump_sec));
        }
        if self.max_interval_sec <= 0 {
            return Err(CoreError::InvalidMaxIntervalSec(self.max_interval_sec));
        }
        if self.cluster_radius_m <= 0.0 {
            return Err(CoreError::InvalidClusterRadius(self.cluster_radius_m));
        }
        Ok(())
    }
}

/// Geographic inputs the caller supplies; opaque polygons per spec.md §1.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoInputs {
    pub fence_polygons: Vec<Polygon>,
    pub zone_a: Polygon,
    pub center_point: (f64, f64),
    pub metal_building_polygon: Polygon,
}

impl GeoInputs {
    pub fn new(
        fence_polygons: Vec<(&str, Vec<(f64, f64)>)>,
        zone_a: Vec<(f64, f64)>,
        center_point: (f64, f64),
        metal_building_polygon: Vec<(f64, f64)>,
    ) -> Result<Self, GeometryError> {
        let fence_polygons = fence_polygons
            .into_iter()
            .map(|(name, pts)| Polygon::new(name, pts))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            fence_polygons,
            zone_a: Polygon::new("zone_a", zone_a)?,
            center_point,
            metal_building_polygon: Polygon::new("metal_building", metal_building_polygon)?,
        })
    }
}

/// A progress callback, invoked synchronously at phase boundaries. Must
/// not block meaningfully — the core has no suspension points.
pub type ProgressCallback = dyn Fn(&str) + Send + Sync;

/// Per-call inputs that are not numeric thresholds: labels, geometry, and
/// the optional progress hook.
pub struct ProcessingOptions {
    pub calving_date: Option<String>,
    pub date_str: Option<String>,
    pub dataset_name: Option<String>,
    pub geo: GeoInputs,
    pub on_progress: Option<Box<ProgressCallback>>,
}

impl ProcessingOptions {
    pub fn new(geo: GeoInputs) -> Self {
        Self {
            calving_date: None,
            date_str: None,
            dataset_name: None,
            geo,
            on_progress: None,
        }
    }

    pub fn date_str(mut self, date_str: &str) -> Self {
        self.date_str = Some(date_str.to_string());
        self
    }

    pub fn dataset_name(mut self, name: &str) -> Self {
        self.dataset_name = Some(name.to_string());
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub(crate) fn report(&self, phase: &str) {
        if let Some(cb) = &self.on_progress {
            cb(phase);
        }
    }
}
