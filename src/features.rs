
pub const FEATURE_COUNT: usize = 7;

/// Scenario features in the column order the regressor and scaler were
/// fitted on: station age, metro line code, distance from the first station
/// (km), latitude, longitude, connectivity, station density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Lays the scenario fields out in fitting order. Values are not checked.
    pub fn build(
        station_age: i64,
        metro_line_code: i64,
        distance_from_first_station: f64,
        latitude: f64,
        longitude: f64,
        connectivity: i64,
        station_density: i64,
    ) -> Self {
        FeatureVector([
            station_age as f64,
            metro_line_code as f64,
            distance_from_first_station,
            latitude,
            longitude,
            connectivity as f64,
            station_density as f64,
        ])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}
