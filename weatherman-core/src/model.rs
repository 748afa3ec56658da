use serde::{Serialize, Serializer};
use std::time::Duration;

/// Offset between the Celsius and Kelvin scales.
pub const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + ZERO_CELSIUS_IN_KELVIN
}

/// Outcome of one successful aggregated query.
///
/// Serialized as `{"city": ..., "temp": ..., "took": ...}` where `took` is a
/// human-readable duration such as `"123.4ms"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResult {
    pub city: String,
    #[serde(rename = "temp")]
    pub temperature_kelvin: f64,
    #[serde(rename = "took", serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

fn serialize_elapsed<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{elapsed:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_is_shifted_by_273_15() {
        assert_eq!(celsius_to_kelvin(0.0), 273.15);
        assert_eq!(celsius_to_kelvin(-273.15), 0.0);
        assert_eq!(celsius_to_kelvin(21.5), 21.5 + 273.15);
    }

    #[test]
    fn result_serializes_with_wire_names() {
        let result = WeatherResult {
            city: "London".to_string(),
            temperature_kelvin: 281.0,
            elapsed: Duration::from_micros(123_400),
        };

        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["city"], "London");
        assert_eq!(json["temp"], 281.0);
        assert_eq!(json["took"], "123.4ms");
        assert_eq!(json.as_object().map(|o| o.len()), Some(3));
    }
}
