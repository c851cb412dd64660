use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A gauge metric as it appears in the OTLP JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name (text before `{` or the first space).
    pub name: String,

    /// Unit, never populated by the parser.
    #[serde(default)]
    pub unit: String,

    /// Description, never populated by the parser.
    #[serde(default)]
    pub description: String,

    pub gauge: Gauge,
}

impl Metric {
    /// Create a gauge metric holding a single data point with a zero timestamp.
    pub fn gauge(name: impl Into<String>, value: NumberValue, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            description: String::new(),
            gauge: Gauge {
                data_points: vec![DataPoint {
                    value,
                    time_unix_nano: 0,
                    attributes,
                }],
            },
        }
    }

    /// Data points of this metric.
    pub fn data_points(&self) -> &[DataPoint] {
        &self.gauge.data_points
    }

    /// Set the capture timestamp on every data point.
    pub fn stamp(&mut self, time_unix_nano: i64) {
        for point in &mut self.gauge.data_points {
            point.time_unix_nano = time_unix_nano;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub data_points: Vec<DataPoint>,
}

/// A single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDataPoint")]
pub struct DataPoint {
    /// Serialized as either `asInt` or `asDouble`, never both.
    #[serde(flatten)]
    pub value: NumberValue,

    /// Unix epoch nanoseconds when the batch was captured.
    #[serde(default)]
    pub time_unix_nano: i64,

    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Numeric sample value.
///
/// Integer literals parse to `Int`, anything else that is a valid float to `Double`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NumberValue {
    #[serde(rename = "asInt")]
    Int(i64),

    #[serde(rename = "asDouble")]
    Double(f64),
}

/// Wire form of [`DataPoint`] before the value keys are checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataPoint {
    as_int: Option<i64>,
    as_double: Option<f64>,
    #[serde(default)]
    time_unix_nano: i64,
    #[serde(default)]
    attributes: Vec<Attribute>,
}

impl TryFrom<RawDataPoint> for DataPoint {
    type Error = &'static str;

    fn try_from(raw: RawDataPoint) -> Result<Self, Self::Error> {
        let value = match (raw.as_int, raw.as_double) {
            (Some(v), None) => NumberValue::Int(v),
            (None, Some(v)) => NumberValue::Double(v),
            (Some(_), Some(_)) => return Err("data point has both asInt and asDouble"),
            (None, None) => return Err("data point has neither asInt nor asDouble"),
        };

        Ok(Self {
            value,
            time_unix_nano: raw.time_unix_nano,
            attributes: raw.attributes,
        })
    }
}

/// A label attached to a data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AttributeValue {
                string_value: value.into(),
            },
        }
    }

    /// The string payload of this attribute.
    pub fn value_str(&self) -> &str {
        &self.value.string_value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub string_value: String,
}

/// Get the current timestamp in nanoseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch.
pub fn current_timestamp_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_creation() {
        let metric = Metric::gauge(
            "http_requests_total",
            NumberValue::Int(1027),
            vec![Attribute::new("method", "GET")],
        );

        assert_eq!(metric.name, "http_requests_total");
        assert!(metric.unit.is_empty());
        assert!(metric.description.is_empty());
        assert_eq!(metric.data_points().len(), 1);
        assert_eq!(metric.data_points()[0].time_unix_nano, 0);
        assert_eq!(metric.data_points()[0].attributes[0].value_str(), "GET");
    }

    #[test]
    fn test_stamp() {
        let mut metric = Metric::gauge("up", NumberValue::Int(1), Vec::new());
        metric.stamp(1_700_000_000_000_000_000);

        assert_eq!(
            metric.data_points()[0].time_unix_nano,
            1_700_000_000_000_000_000
        );
    }

    #[test]
    fn test_int_data_point_json() {
        let point = DataPoint {
            value: NumberValue::Int(1),
            time_unix_nano: 0,
            attributes: Vec::new(),
        };

        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"asInt":1,"timeUnixNano":0,"attributes":[]}"#);
    }

    #[test]
    fn test_double_data_point_json() {
        let point = DataPoint {
            value: NumberValue::Double(2.4),
            time_unix_nano: 0,
            attributes: vec![Attribute::new("host", "a")],
        };

        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(
            json,
            r#"{"asDouble":2.4,"timeUnixNano":0,"attributes":[{"key":"host","value":{"stringValue":"a"}}]}"#
        );
        assert!(!json.contains("asInt"));
    }

    #[test]
    fn test_data_point_decode_keeps_kind() {
        let int: DataPoint =
            serde_json::from_str(r#"{"asInt":-5,"timeUnixNano":7,"attributes":[]}"#).unwrap();
        assert_eq!(int.value, NumberValue::Int(-5));
        assert_eq!(int.time_unix_nano, 7);

        let double: DataPoint = serde_json::from_str(r#"{"asDouble":42.7}"#).unwrap();
        assert_eq!(double.value, NumberValue::Double(42.7));
        assert!(double.attributes.is_empty());
    }

    #[test]
    fn test_data_point_decode_requires_exactly_one_value() {
        let both = serde_json::from_str::<DataPoint>(r#"{"asInt":1,"asDouble":2.0}"#);
        assert!(both.unwrap_err().to_string().contains("both asInt and asDouble"));

        let neither = serde_json::from_str::<DataPoint>(r#"{"timeUnixNano":1}"#);
        assert!(neither.unwrap_err().to_string().contains("neither"));
    }

    #[test]
    fn test_current_timestamp_is_positive() {
        assert!(current_timestamp_nanos() > 0);
    }
}
