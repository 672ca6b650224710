use chrono::NaiveDateTime;

/// One intra-day reading as stored in a per-day input file.
///
/// `datetime` is kept as the raw text from the file; parsing happens in the
/// feature transform so that a bad timestamp fails the whole day at once.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub datetime: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub general_diffuse_flows: f64,
    pub diffuse_flows: f64,
    pub power_consumption: f64,
}

/// A reading whose timestamp has been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub datetime: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub general_diffuse_flows: f64,
    pub diffuse_flows: f64,
    /// Measured consumption, copied verbatim into the forecast result
    pub power_consumption: f64,
}

impl ObservationRow {
    pub fn from_raw(raw: &RawObservation, datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            temperature: raw.temperature,
            humidity: raw.humidity,
            wind_speed: raw.wind_speed,
            general_diffuse_flows: raw.general_diffuse_flows,
            diffuse_flows: raw.diffuse_flows,
            power_consumption: raw.power_consumption,
        }
    }

    /// Time-of-day label, 24-hour and zero padded
    pub fn time_label(&self) -> String {
        self.datetime.format("%H:%M").to_string()
    }
}
