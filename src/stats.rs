//! Descriptive statistics over the station dataset.

use rayon::prelude::*;

use crate::error::{DashboardError, Result};
use crate::records::StationRecord;

pub const LOW_PERCENTILE: f64 = 0.33;
pub const HIGH_PERCENTILE: f64 = 0.67;

/// Quantile of ascending `sorted` with linear interpolation between the two
/// nearest order statistics, `pos = (n - 1) * q`.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let fraction = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
}

/// Cut points separating Low, Medium and High ridership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidershipThresholds {
    pub low: f64,
    pub high: f64,
}

impl RidershipThresholds {
    pub fn new(low: f64, high: f64) -> Self {
        RidershipThresholds { low, high }
    }

    /// 33rd and 67th percentile of historical daily ridership.
    pub fn from_ridership(daily_ridership: &[f64]) -> Result<Self> {
        let mut sorted = daily_ridership.to_vec();
        if sorted.is_empty() {
            return Err(DashboardError::EmptyDataset("daily ridership".into()));
        }
        sorted.sort_by(f64::total_cmp);
        Ok(RidershipThresholds {
            low: quantile_sorted(&sorted, LOW_PERCENTILE),
            high: quantile_sorted(&sorted, HIGH_PERCENTILE),
        })
    }

    pub fn from_stations(stations: &[StationRecord]) -> Result<Self> {
        let ridership: Vec<f64> = stations.iter().map(|s| s.daily_ridership as f64).collect();
        Self::from_ridership(&ridership)
    }
}

/// Figures shown on the home view.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMetrics {
    pub total_stations: usize,
    pub average_daily_ridership: u64,
    pub busiest_station: String,
}

impl KeyMetrics {
    pub fn from_stations(stations: &[StationRecord]) -> Result<Self> {
        // First station wins a tie for the maximum.
        let busiest = stations
            .iter()
            .reduce(|best, s| if s.daily_ridership > best.daily_ridership { s } else { best })
            .ok_or_else(|| DashboardError::EmptyDataset("stations".into()))?;
        let total: u64 = stations.iter().map(|s| s.daily_ridership).sum();
        Ok(KeyMetrics {
            total_stations: stations.len(),
            average_daily_ridership: (total as f64 / stations.len() as f64) as u64,
            busiest_station: busiest.name.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn from_values(column: &str, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        // Sample standard deviation; undefined for a single value.
        let std = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };
        Some(ColumnSummary {
            column: column.to_string(),
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile_sorted(&sorted, 0.25),
            p50: quantile_sorted(&sorted, 0.5),
            p75: quantile_sorted(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

type Extractor = fn(&StationRecord) -> Option<f64>;

static NUMERIC_COLUMNS: [(&str, Extractor); 6] = [
    ("Daily_Ridership", |s| Some(s.daily_ridership as f64)),
    ("Opening_Year", |s| Some(s.opening_year as f64)),
    ("Latitude", |s| Some(s.latitude)),
    ("Longitude", |s| Some(s.longitude)),
    ("Dist. From First Station(km)", |s| Some(s.distance_from_first_km)),
    ("Station_Age", |s| s.station_age),
];

/// Count, mean, std, min, quartiles and max for every numeric column that
/// holds at least one value.
pub fn describe(stations: &[StationRecord]) -> Vec<ColumnSummary> {
    NUMERIC_COLUMNS[..]
        .par_iter()
        .filter_map(|(column, extract)| {
            let values: Vec<f64> = stations.iter().filter_map(extract).collect();
            ColumnSummary::from_values(column, &values)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Range { min: v, max: v }),
            Some(r) => Some(Range {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Ranges of the scenario features as seen in the historical station data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedRanges {
    pub station_age: Option<Range>,
    pub distance_from_first_km: Option<Range>,
    pub latitude: Option<Range>,
    pub longitude: Option<Range>,
}

impl ObservedRanges {
    pub fn from_stations(stations: &[StationRecord]) -> Self {
        ObservedRanges {
            station_age: Range::of(stations.iter().filter_map(|s| s.station_age)),
            distance_from_first_km: Range::of(stations.iter().map(|s| s.distance_from_first_km)),
            latitude: Range::of(stations.iter().map(|s| s.latitude)),
            longitude: Range::of(stations.iter().map(|s| s.longitude)),
        }
    }
}

/// Equal-width histogram: `(bin_start, bin_end, count)` per bin. The last bin
/// is closed on the right so the maximum lands in it.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let Some(range) = Range::of(values.iter().copied()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let width = if range.max > range.min {
        (range.max - range.min) / bins as f64
    } else {
        1.0
    };
    let mut counts = vec![0usize; bins];
    for &value in values {
        let idx = (((value - range.min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = range.min + width * i as f64;
            (start, start + width, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, ridership: u64) -> StationRecord {
        StationRecord {
            name: name.into(),
            daily_ridership: ridership,
            metro_line: "Yellow line".into(),
            opening_year: 2005,
            latitude: 28.6,
            longitude: 77.2,
            distance_from_first_km: 3.0,
            station_age: None,
        }
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.5), 2.5);
        assert_eq!(quantile_sorted(&values, 0.0), 1.0);
        assert_eq!(quantile_sorted(&values, 1.0), 4.0);
        // pos = 3 * 0.33 = 0.99
        assert!((quantile_sorted(&values, 0.33) - 1.99).abs() < 1e-12);
    }

    #[test]
    fn thresholds_are_deterministic_and_ordered() {
        let ridership: Vec<f64> = (1..=100).map(|v| (v * 1000) as f64).collect();
        let mut shuffled = ridership.clone();
        shuffled.reverse();
        let a = RidershipThresholds::from_ridership(&ridership).unwrap();
        let b = RidershipThresholds::from_ridership(&shuffled).unwrap();
        assert_eq!(a.low.to_bits(), b.low.to_bits());
        assert_eq!(a.high.to_bits(), b.high.to_bits());
        // pos = 99 * 0.33 = 32.67 -> 33000 + 0.67 * 1000
        assert!((a.low - 33670.0).abs() < 1e-6);
        assert!((a.high - 67330.0).abs() < 1e-6);
        assert!(a.low <= a.high);
    }

    #[test]
    fn thresholds_need_data() {
        assert!(matches!(
            RidershipThresholds::from_ridership(&[]),
            Err(DashboardError::EmptyDataset(_))
        ));
    }

    #[test]
    fn key_metrics_truncate_mean_and_pick_first_busiest() {
        let stations = vec![station("A", 10), station("B", 30), station("C", 30), station("D", 1)];
        let metrics = KeyMetrics::from_stations(&stations).unwrap();
        assert_eq!(metrics.total_stations, 4);
        assert_eq!(metrics.average_daily_ridership, 17);
        assert_eq!(metrics.busiest_station, "B");
    }

    #[test]
    fn describe_skips_absent_columns() {
        let stations = vec![station("A", 10), station("B", 30)];
        let summary = describe(&stations);
        assert!(summary.iter().all(|c| c.column != "Station_Age"));
        let ridership = summary.iter().find(|c| c.column == "Daily_Ridership").unwrap();
        assert_eq!(ridership.count, 2);
        assert_eq!(ridership.mean, 20.0);
        assert_eq!(ridership.p50, 20.0);
        assert!((ridership.std - 200f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn histogram_puts_maximum_in_last_bin() {
        let bins = histogram(&[0.0, 5.0, 10.0], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].2, 1);
        assert_eq!(bins[1].2, 2);
        assert!(histogram(&[], 30).is_empty());
    }
}
