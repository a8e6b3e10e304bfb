//! Fixed column schema of the location-distance exports.

use polars::prelude::DataType;

pub const DATE_TIME: &str = "date_time";
pub const SERVICE: &str = "service";
pub const USER: &str = "user";
pub const USER_UID: &str = "user_uid";
pub const USER_TIME_ZONE: &str = "user_time_zone";
pub const LATITUDE: &str = "app_raw_latitude";
pub const TIMESTAMP: &str = "app_raw_timestamp";
pub const ACCURACY: &str = "app_raw_accuracy";
pub const LONGITUDE: &str = "app_raw_longitude";
pub const DISTANCE: &str = "app_raw_distance";
pub const ALTITUDE: &str = "app_raw_altitude";
pub const SPEED: &str = "app_raw_speed";

/// How a column is typed while the timestamps are still text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Kept as text until the temporal normalizer parses it.
    Temporal,
    /// Integer identifier.
    Integer,
    /// Floating point measurement.
    Float,
}

impl ColumnKind {
    /// Polars dtype the loader produces for this kind.
    pub fn raw_dtype(self) -> DataType {
        match self {
            Self::Temporal => DataType::String,
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
        }
    }
}

/// All required columns in file order.
pub const COLUMNS: [(&str, ColumnKind); 12] = [
    (DATE_TIME, ColumnKind::Temporal),
    (SERVICE, ColumnKind::Integer),
    (USER, ColumnKind::Integer),
    (USER_UID, ColumnKind::Integer),
    (USER_TIME_ZONE, ColumnKind::Float),
    (LATITUDE, ColumnKind::Float),
    (TIMESTAMP, ColumnKind::Temporal),
    (ACCURACY, ColumnKind::Float),
    (LONGITUDE, ColumnKind::Float),
    (DISTANCE, ColumnKind::Float),
    (ALTITUDE, ColumnKind::Float),
    (SPEED, ColumnKind::Float),
];

/// Quantities that are physically positive; a reading <= 0 is sensor error.
pub const POSITIVE_COLUMNS: [&str; 4] = [LATITUDE, LONGITUDE, SPEED, DISTANCE];

/// Filled by order-dependent interpolation.
pub const INTERPOLATED_COLUMNS: [&str; 4] = [LATITUDE, LONGITUDE, SPEED, DISTANCE];

/// Filled with the column median.
pub const MEDIAN_COLUMNS: [&str; 2] = [ACCURACY, ALTITUDE];

/// Names of every float column in the schema.
pub fn float_columns() -> impl Iterator<Item = &'static str> {
    COLUMNS
        .iter()
        .filter(|(_, kind)| *kind == ColumnKind::Float)
        .map(|(name, _)| *name)
}

/// The six measurement columns the cleaner fills.
pub fn measurement_columns() -> impl Iterator<Item = &'static str> {
    INTERPOLATED_COLUMNS
        .iter()
        .chain(MEDIAN_COLUMNS.iter())
        .copied()
}
