//! Raw collar records and the validated, derived `Sample` they parse into.
use crate::geo::haversine_m;

/// Raw accelerometer scale: this many raw units per 1 g.
pub const ACC_SCALE: f64 = 1024.0;

/// One raw telemetry record as transmitted by the collar. Any field may be
/// missing; records lacking time, latitude or longitude are rejected by
/// [`Sample::from_raw`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawRecord {
    /// `"dd.mm.yyyy"`, optional.
    pub date: Option<String>,
    /// `"hh:mm:ss"`, mandatory for a record to be usable.
    pub timestamp: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub acc_x: Option<i32>,
    pub acc_y: Option<i32>,
    pub acc_z: Option<i32>,
    pub gps_altitude: Option<f64>,
    pub gps_satellites: Option<u32>,
    pub gps_speed_kph: Option<f64>,
}

impl RawRecord {
    pub fn date(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }
    pub fn timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = Some(timestamp.to_string());
        self
    }
    pub fn position(mut self, lat: f64, lon: f64) -> Self {
        self.gps_lat = Some(lat);
        self.gps_lon = Some(lon);
        self
    }
    pub fn accel(mut self, x: i32, y: i32, z: i32) -> Self {
        self.acc_x = Some(x);
        self.acc_y = Some(y);
        self.acc_z = Some(z);
        self
    }
    pub fn satellites(mut self, n: u32) -> Self {
        self.gps_satellites = Some(n);
        self
    }
    pub fn altitude(mut self, alt: f64) -> Self {
        self.gps_altitude = Some(alt);
        self
    }
}

/// A validated raw record with derived timing and magnitude fields.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Seconds since midnight, `0..86399`.
    pub t_sec: u32,
    /// Absolute epoch seconds, monotonically non-decreasing after ordering.
    pub epoch_sec: i64,
    pub lat: f64,
    pub lon: f64,
    /// Raw accelerometer triple, 1024 units per g.
    pub acc: (f64, f64, f64),
    /// `sqrt(x^2+y^2+z^2)` of `acc`, still in raw units.
    pub acc_mag: f64,
    pub altitude: Option<f64>,
    pub satellites: Option<u32>,
}

impl Sample {
    /// Accelerometer magnitude expressed in g (1.0 = gravity at rest).
    pub fn acc_mag_g(&self) -> f64 {
        self.acc_mag / ACC_SCALE
    }

    /// Distance in meters from `(lat, lon)` to this sample's position.
    pub fn distance_from(&self, lat: f64, lon: f64) -> f64 {
        haversine_m(lat, lon, self.lat, self.lon)
    }
}

/// Outcome of validating and parsing the raw input stream, independent of
/// the retry filter which runs afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSampleStats {
    /// Records accepted into the sample stream.
    pub valid: u32,
    /// Records dropped for a missing/unparseable timestamp or coordinate.
    pub invalid: u32,
    /// Records dropped because they fell outside every allowed fence.
    pub outside_fence: u32,
}
