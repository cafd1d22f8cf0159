//! Current-hour ridership lookup against the hourly profile table.

use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::records::HourlyRidershipTable;

/// Source of "now". Production code uses [`SystemClock`]; tests pin a time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    /// Monday..Friday are weekdays.
    pub fn of(date: &impl Datelike) -> Self {
        if date.weekday().num_days_from_monday() < 5 {
            DayType::Weekday
        } else {
            DayType::Weekend
        }
    }
}

/// Names one of the 48 hourly columns, e.g. `Weekday_14`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RidershipColumn {
    pub day_type: DayType,
    pub hour: u32,
}

impl RidershipColumn {
    pub fn at(local: &DateTime<Tz>) -> Self {
        RidershipColumn {
            day_type: DayType::of(local),
            hour: local.hour(),
        }
    }
}

impl fmt::Display for RidershipColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.day_type {
            DayType::Weekday => "Weekday",
            DayType::Weekend => "Weekend",
        };
        write!(f, "{}_{}", prefix, self.hour)
    }
}

pub fn local_time(clock: &dyn Clock, timezone: Tz) -> DateTime<Tz> {
    clock.now().with_timezone(&timezone)
}

/// Count for `column` at the first row named `station_name`.
pub fn ridership_at(
    station_name: &str,
    hourly: &HourlyRidershipTable,
    column: RidershipColumn,
) -> Result<u64> {
    let row = hourly
        .find(station_name)
        .ok_or_else(|| DashboardError::StationNotFound(station_name.to_string()))?;
    let hour = column.hour as usize;
    let counts = match column.day_type {
        DayType::Weekday => &row.weekday,
        DayType::Weekend => &row.weekend,
    };
    Ok(counts[hour])
}

/// Ridership for the current local hour and day type.
pub fn current_ridership(
    station_name: &str,
    hourly: &HourlyRidershipTable,
    clock: &dyn Clock,
    timezone: Tz,
) -> Result<u64> {
    let column = RidershipColumn::at(&local_time(clock, timezone));
    debug!(station = station_name, %column, "real-time lookup");
    ridership_at(station_name, hourly, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::HourlyRidershipRecord;
    use chrono::TimeZone;

    fn table() -> HourlyRidershipTable {
        let mut weekday = [0u64; 24];
        let mut weekend = [0u64; 24];
        for hour in 0..24 {
            weekday[hour] = 1000 + hour as u64;
            weekend[hour] = 500 + hour as u64;
        }
        HourlyRidershipTable::new(vec![HourlyRidershipRecord {
            station_name: "Rajiv Chowk".into(),
            weekday,
            weekend,
        }])
    }

    fn kolkata(y: i32, m: u32, d: u32, h: u32) -> FixedClock {
        let local = chrono_tz::Asia::Kolkata
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap();
        FixedClock(local.with_timezone(&Utc))
    }

    #[test]
    fn tuesday_afternoon_reads_weekday_column() {
        // 2024-01-02 is a Tuesday.
        let clock = kolkata(2024, 1, 2, 14);
        let tz = chrono_tz::Asia::Kolkata;
        assert_eq!(RidershipColumn::at(&local_time(&clock, tz)).to_string(), "Weekday_14");
        assert_eq!(current_ridership("Rajiv Chowk", &table(), &clock, tz).unwrap(), 1014);
    }

    #[test]
    fn saturday_afternoon_reads_weekend_column() {
        let clock = kolkata(2024, 1, 6, 14);
        let tz = chrono_tz::Asia::Kolkata;
        assert_eq!(current_ridership("Rajiv Chowk", &table(), &clock, tz).unwrap(), 514);
    }

    #[test]
    fn timezone_shifts_the_day() {
        // Friday 20:00 UTC is already Saturday 01:30 in Kolkata.
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 5, 20, 0, 0).single().unwrap());
        let column = RidershipColumn::at(&local_time(&clock, chrono_tz::Asia::Kolkata));
        assert_eq!(column.to_string(), "Weekend_1");
        let column = RidershipColumn::at(&local_time(&clock, chrono_tz::UTC));
        assert_eq!(column.to_string(), "Weekday_20");
    }

    #[test]
    fn unknown_station_is_an_error() {
        let clock = kolkata(2024, 1, 2, 9);
        match current_ridership("Nowhere", &table(), &clock, chrono_tz::Asia::Kolkata) {
            Err(DashboardError::StationNotFound(name)) => assert_eq!(name, "Nowhere"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
