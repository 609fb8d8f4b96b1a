//! TOML run configuration: geometry inputs plus optional threshold
//! overrides, the CLI's only way to supply the polygons `pastvina_core`
//! treats as opaque.
use pastvina_core::config::{EngineConfig, GeoInputs};
use pastvina_core::error::GeometryError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub fence_polygons: Vec<(String, Vec<(f64, f64)>)>,
    pub zone_a: Vec<(f64, f64)>,
    pub center_point: (f64, f64),
    pub metal_building_polygon: Vec<(f64, f64)>,
    #[serde(default)]
    pub overrides: EngineOverrides,
}

/// Subset of [`EngineConfig`] fields a run config may override; absent
/// fields keep `EngineConfig::default()`'s value.
#[derive(Debug, Default, Deserialize)]
pub struct EngineOverrides {
    pub max_backward_jump_sec: Option<i64>,
    pub max_interval_sec: Option<i64>,
    pub standby_threshold_sec: Option<i64>,
    pub standby_max_duration_sec: Option<i64>,
    pub cluster_radius_m: Option<f64>,
    pub standing_cluster_min_duration_sec: Option<i64>,
    pub isolation_distance_m: Option<f64>,
    pub isolation_min_duration_sec: Option<i64>,
    pub altitude_bounds_m: Option<(f64, f64)>,
    pub position_outlier_distance_m: Option<f64>,
    pub bounding_box: Option<(f64, f64, f64, f64)>,
    pub metal_building_proximity_m: Option<f64>,
    pub zero_run_normal_max_sec: Option<i64>,
    pub zero_run_outage_min_sec: Option<i64>,
}

impl RunConfig {
    pub fn geo_inputs(&self) -> Result<GeoInputs, GeometryError> {
        let fences = self
            .fence_polygons
            .iter()
            .map(|(name, pts)| (name.as_str(), pts.clone()))
            .collect();
        GeoInputs::new(
            fences,
            self.zone_a.clone(),
            self.center_point,
            self.metal_building_polygon.clone(),
        )
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(v) = self.overrides.max_backward_jump_sec {
            config = config.max_backward_jump_sec(v);
        }
        if let Some(v) = self.overrides.max_interval_sec {
            config = config.max_interval_sec(v);
        }
        if let Some(v) = self.overrides.standby_threshold_sec {
            config = config.standby_threshold_sec(v);
        }
        if let Some(v) = self.overrides.standby_max_duration_sec {
            config = config.standby_max_duration_sec(v);
        }
        if let Some(v) = self.overrides.cluster_radius_m {
            config = config.cluster_radius_m(v);
        }
        if let Some(v) = self.overrides.standing_cluster_min_duration_sec {
            config = config.standing_cluster_min_duration_sec(v);
        }
        if let Some(v) = self.overrides.isolation_distance_m {
            config = config.isolation_distance_m(v);
        }
        if let Some(v) = self.overrides.isolation_min_duration_sec {
            config = config.isolation_min_duration_sec(v);
        }
        if let Some(v) = self.overrides.altitude_bounds_m {
            config = config.altitude_bounds_m(v);
        }
        if let Some(v) = self.overrides.position_outlier_distance_m {
            config = config.position_outlier_distance_m(v);
        }
        if let Some(v) = self.overrides.bounding_box {
            config = config.bounding_box(v);
        }
        if let Some(v) = self.overrides.metal_building_proximity_m {
            config = config.metal_building_proximity_m(v);
        }
        if let Some(v) = self.overrides.zero_run_normal_max_sec {
            config = config.zero_run_normal_max_sec(v);
        }
        if let Some(v) = self.overrides.zero_run_outage_min_sec {
            config = config.zero_run_outage_min_sec(v);
        }
        config
    }
}
