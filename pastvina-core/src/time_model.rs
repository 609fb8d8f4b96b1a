//! Timestamp parsing, chronological ordering and the retry-packet filter.
use hifitime::Epoch;
use scan_fmt::scan_fmt;

use crate::record::{RawRecord, Sample};

/// Collar retransmits farther back than this (seconds) are rejected as
/// retry packets rather than accepted as legitimate re-ordering.
pub const MAX_BACKWARD_JUMP_SEC: i64 = 300;

/// Maximal gap (seconds) the resampler will interpolate across; gap
/// segmentation splits the stream at gaps wider than this.
pub const MAX_INTERVAL_SEC: i64 = 3600;

/// Parses `"dd.mm.yyyy"` and `"hh:mm:ss"` into `(epoch_sec, t_sec)`.
///
/// Mirrors the teacher's `scan_fmt!`-based field parsing (see
/// `time_system.rs`'s `UTC(lab,offset)` parser) rather than a hand-rolled
/// splitter. When `date` is absent, only `t_sec` ordering is possible: the
/// epoch is anchored at the Unix epoch plus `t_sec`, so records sharing a
/// day still compare correctly but cross-midnight wraparound cannot be
/// detected.
pub fn parse_timestamp(date: Option<&str>, time: &str) -> Option<(i64, u32)> {
    let (hh, mm, ss) = scan_fmt!(time, "{d}:{d}:{d}", u32, u32, u32).ok()?;
    if hh > 23 || mm > 59 || ss > 59 {
        return None;
    }
    let t_sec = hh * 3600 + mm * 60 + ss;

    let epoch_sec = match date {
        Some(date) => {
            let (day, month, year) = scan_fmt!(date, "{d}.{d}.{d}", u32, u32, i32).ok()?;
            if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
                return None;
            }
            let epoch =
                Epoch::from_gregorian_utc(year, month as u8, day as u8, hh as u8, mm as u8, ss as u8, 0);
            epoch.to_unix_seconds().round() as i64
        }
        None => t_sec as i64,
    };

    Some((epoch_sec, t_sec))
}

/// Parses a raw record into a [`Sample`], returning `None` for any record
/// missing a mandatory field or with an unparseable timestamp/coordinate.
pub fn parse_sample(raw: &RawRecord) -> Option<Sample> {
    let timestamp = raw.timestamp.as_deref()?;
    let lat = raw.gps_lat?;
    let lon = raw.gps_lon?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    let (epoch_sec, t_sec) = parse_timestamp(raw.date.as_deref(), timestamp)?;

    let acc = (
        raw.acc_x.unwrap_or(0) as f64,
        raw.acc_y.unwrap_or(0) as f64,
        raw.acc_z.unwrap_or(0) as f64,
    );
    let acc_mag = (acc.0 * acc.0 + acc.1 * acc.1 + acc.2 * acc.2).sqrt();

    Some(Sample {
        t_sec,
        epoch_sec,
        lat,
        lon,
        acc,
        acc_mag,
        altitude: raw.gps_altitude,
        satellites: raw.gps_satellites,
    })
}

/// Sorts samples by epoch, preserving input order among ties (a stable
/// sort, as the spec requires).
pub fn sort_samples(mut samples: Vec<Sample>) -> Vec<Sample> {
    samples.sort_by_key(|s| s.epoch_sec);
    samples
}

/// Outcome of the retry-packet filter.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryFilterStats {
    /// Count of records rejected as delayed retransmissions.
    pub retry_count: u32,
}

/// Walks the sample stream in arrival order, rejecting any record whose
/// epoch falls more than `max_backward_jump` seconds below the running
/// maximum seen so far. These are the collar's delayed retransmissions —
/// detecting them requires arrival order; sorting by epoch first would
/// erase the very lag this filter looks for. Callers sort the survivors
/// afterward.
pub fn filter_retries(samples: Vec<Sample>, max_backward_jump: i64) -> (Vec<Sample>, RetryFilterStats) {
    let mut kept = Vec::with_capacity(samples.len());
    let mut stats = RetryFilterStats::default();
    let mut last_valid_epoch = i64::MIN;

    for sample in samples {
        if last_valid_epoch != i64::MIN && sample.epoch_sec < last_valid_epoch - max_backward_jump {
            stats.retry_count += 1;
            continue;
        }
        last_valid_epoch = last_valid_epoch.max(sample.epoch_sec);
        kept.push(sample);
    }

    (kept, stats)
}

/// Splits a sample stream into maximal runs where consecutive gaps do not
/// exceed `max_gap_sec`. Used to keep the resampler from interpolating
/// across multi-hour outages.
pub fn gap_segments(samples: &[Sample], max_gap_sec: i64) -> Vec<&[Sample]> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut start = 0usize;
    for i in 1..samples.len() {
        let gap = samples[i].epoch_sec - samples[i - 1].epoch_sec;
        if gap > max_gap_sec {
            segments.push(&samples[start..i]);
            start = i;
        }
    }
    segments.push(&samples[start..]);
    segments
}
