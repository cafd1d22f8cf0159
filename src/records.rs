//! CSV-backed datasets: stations, hourly ridership and model metrics.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use csv::{Reader, StringRecord};
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::{DashboardError, Result};

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "Station Names")]
    pub name: String,
    #[serde(rename = "Daily_Ridership", deserialize_with = "count_from_number")]
    pub daily_ridership: u64,
    #[serde(rename = "Metro Line")]
    pub metro_line: String,
    #[serde(rename = "Opening_Year")]
    pub opening_year: i32,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Dist. From First Station(km)")]
    pub distance_from_first_km: f64,
    // Only some exports of the station table carry this column.
    #[serde(rename = "Station_Age", default)]
    pub station_age: Option<f64>,
}

/// Ridership columns may be exported as `12345` or `12345.0`.
fn count_from_number<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative count, got {}",
            value
        )));
    }
    Ok(value as u64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRidershipRecord {
    pub station_name: String,
    pub weekday: [u64; HOURS_PER_DAY],
    pub weekend: [u64; HOURS_PER_DAY],
}

#[derive(Debug, Clone, Default)]
pub struct HourlyRidershipTable {
    rows: Vec<HourlyRidershipRecord>,
}

impl HourlyRidershipTable {
    pub fn new(rows: Vec<HourlyRidershipRecord>) -> Self {
        HourlyRidershipTable { rows }
    }

    pub fn rows(&self) -> &[HourlyRidershipRecord] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row whose name matches exactly.
    pub fn find(&self, station_name: &str) -> Option<&HourlyRidershipRecord> {
        self.rows.iter().find(|row| row.station_name == station_name)
    }

    /// Unique station names, sorted for the station selector.
    pub fn station_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.rows.iter().map(|row| row.station_name.as_str()).collect();
        names.into_iter().collect()
    }

    /// Mean weekday and weekend count per hour across all stations.
    pub fn network_average(&self) -> Vec<(usize, f64, f64)> {
        let n = self.rows.len().max(1) as f64;
        (0..HOURS_PER_DAY)
            .map(|hour| {
                let weekday: u64 = self.rows.iter().map(|row| row.weekday[hour]).sum();
                let weekend: u64 = self.rows.iter().map(|row| row.weekend[hour]).sum();
                (hour, weekday as f64 / n, weekend as f64 / n)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelPerformance {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "R2_Score")]
    pub r2_score: f64,
}

fn open_reader(path: &Path) -> Result<Reader<File>> {
    let file = File::open(path).map_err(|err| DashboardError::io(path, err))?;
    Ok(Reader::from_reader(file))
}

fn deserialize_all<T>(path: &Path) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut rdr = open_reader(path)?;
    rdr.deserialize()
        .map(|result| result.map_err(|err| DashboardError::csv(path, err)))
        .collect()
}

pub fn load_stations(path: impl AsRef<Path>) -> Result<Vec<StationRecord>> {
    let path = path.as_ref();
    let stations: Vec<StationRecord> = deserialize_all(path)?;
    info!(path = %path.display(), rows = stations.len(), "loaded station dataset");
    Ok(stations)
}

pub fn load_model_performance(path: impl AsRef<Path>) -> Result<Vec<ModelPerformance>> {
    let path = path.as_ref();
    let metrics: Vec<ModelPerformance> = deserialize_all(path)?;
    info!(path = %path.display(), rows = metrics.len(), "loaded model metrics");
    Ok(metrics)
}

/// Reads `Station_Name, Weekday_0..23, Weekend_0..23`; other columns are ignored.
pub fn load_hourly(path: impl AsRef<Path>) -> Result<HourlyRidershipTable> {
    let path = path.as_ref();
    let mut rdr = open_reader(path)?;
    let headers = rdr
        .headers()
        .map_err(|err| DashboardError::csv(path, err))?
        .clone();

    let index_of = |column: &str| {
        headers
            .iter()
            .position(|header| header.trim() == column)
            .ok_or_else(|| DashboardError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
    };
    let name_idx = index_of("Station_Name")?;
    let weekday_idx = (0..HOURS_PER_DAY)
        .map(|hour| index_of(&format!("Weekday_{}", hour)))
        .collect::<Result<Vec<_>>>()?;
    let weekend_idx = (0..HOURS_PER_DAY)
        .map(|hour| index_of(&format!("Weekend_{}", hour)))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|err| DashboardError::csv(path, err))?;
        let mut weekday = [0u64; HOURS_PER_DAY];
        let mut weekend = [0u64; HOURS_PER_DAY];
        for hour in 0..HOURS_PER_DAY {
            weekday[hour] = parse_count(path, &headers, &record, row, weekday_idx[hour])?;
            weekend[hour] = parse_count(path, &headers, &record, row, weekend_idx[hour])?;
        }
        rows.push(HourlyRidershipRecord {
            station_name: record.get(name_idx).unwrap_or_default().to_string(),
            weekday,
            weekend,
        });
    }
    info!(path = %path.display(), rows = rows.len(), "loaded hourly ridership");
    Ok(HourlyRidershipTable::new(rows))
}

/// Whole, non-negative counts only. `"12.0"` is accepted, `"12.7"` is not.
fn parse_count(
    path: &Path,
    headers: &StringRecord,
    record: &StringRecord,
    row: usize,
    idx: usize,
) -> Result<u64> {
    let raw = record.get(idx).unwrap_or_default().trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => Ok(value as u64),
        _ => Err(DashboardError::InvalidValue {
            path: path.to_path_buf(),
            row: row + 1,
            column: headers.get(idx).unwrap_or_default().to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn hourly_header() -> String {
        let mut columns = vec!["Station_Name".to_string()];
        columns.extend((0..24).map(|h| format!("Weekday_{}", h)));
        columns.extend((0..24).map(|h| format!("Weekend_{}", h)));
        columns.join(",")
    }

    fn hourly_row(name: &str, weekday_base: u64, weekend_base: u64) -> String {
        let mut cells = vec![name.to_string()];
        cells.extend((0..24).map(|h| (weekday_base + h).to_string()));
        cells.extend((0..24).map(|h| (weekend_base + h).to_string()));
        cells.join(",")
    }

    #[test]
    fn stations_ignore_index_column_and_accept_float_ridership() {
        let file = write_csv(
            "Unnamed: 0,Station Names,Daily_Ridership,Metro Line,Opening_Year,Latitude,Longitude,Dist. From First Station(km)\n\
             0,Rajiv Chowk,45000.0,Blue line,2005,28.6328,77.2197,14.2\n\
             1,Dwarka,12000,Blue line,2006,28.6153,77.0229,0\n",
        );
        let stations = load_stations(file.path()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Rajiv Chowk");
        assert_eq!(stations[0].daily_ridership, 45000);
        assert_eq!(stations[1].distance_from_first_km, 0.0);
        assert_eq!(stations[1].station_age, None);
    }

    #[test]
    fn missing_station_file_names_the_path() {
        let err = load_stations("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn hourly_rows_are_indexed_by_header() {
        let file = write_csv(&format!(
            "{}\n{}\n{}\n",
            hourly_header(),
            hourly_row("Kashmere Gate", 100, 50),
            hourly_row("Kashmere Gate", 900, 900)
        ));
        let table = load_hourly(file.path()).unwrap();
        assert_eq!(table.rows().len(), 2);
        let first = table.find("Kashmere Gate").unwrap();
        assert_eq!(first.weekday[14], 114);
        assert_eq!(first.weekend[14], 64);
        assert_eq!(table.station_names(), vec!["Kashmere Gate"]);
    }

    #[test]
    fn hourly_without_weekend_column_is_rejected() {
        let header = hourly_header().replace(",Weekend_23", "");
        let file = write_csv(&format!("{}\n", header));
        match load_hourly(file.path()) {
            Err(DashboardError::MissingColumn { column, .. }) => assert_eq!(column, "Weekend_23"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn network_average_spans_all_hours() {
        let table = HourlyRidershipTable::new(vec![
            HourlyRidershipRecord {
                station_name: "A".into(),
                weekday: [10; 24],
                weekend: [4; 24],
            },
            HourlyRidershipRecord {
                station_name: "B".into(),
                weekday: [20; 24],
                weekend: [6; 24],
            },
        ]);
        let average = table.network_average();
        assert_eq!(average.len(), 24);
        assert_eq!(average[8], (8, 15.0, 5.0));
    }

    #[test]
    fn fractional_hourly_count_is_rejected() {
        let row = hourly_row("Kashmere Gate", 100, 50).replacen(",100,", ",100.0,", 1);
        let good = write_csv(&format!("{}\n{}\n", hourly_header(), row));
        assert_eq!(load_hourly(good.path()).unwrap().rows()[0].weekday[0], 100);

        let row = hourly_row("Kashmere Gate", 100, 50).replacen(",101,", ",12.7,", 1);
        let bad = write_csv(&format!("{}\n{}\n", hourly_header(), row));
        match load_hourly(bad.path()) {
            Err(DashboardError::InvalidValue { row, column, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "Weekday_1");
                assert_eq!(value, "12.7");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
