use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// MIME type of the encoded document.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encode a value (usually a [`Document`](crate::Document)) as compact JSON.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::from)
}

/// Encode a value as indented JSON, for dry runs and debugging.
pub fn encode_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Error::from)
}

/// Decode JSON bytes into a value.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, assemble};
    use crate::exposition::parse_metric_line;
    use crate::metric::NumberValue;

    #[test]
    fn test_document_roundtrip() {
        let metrics = vec![
            parse_metric_line(r#"http_requests_total{method="GET", status="200"} 1027"#).unwrap(),
            parse_metric_line("cpu_temp_celsius 42.7").unwrap(),
        ];
        let doc = assemble(metrics, 42);

        let encoded = encode(&doc).unwrap();
        let decoded: Document = decode(&encoded).unwrap();

        assert_eq!(doc, decoded);
        let first = decoded.metrics().next().unwrap();
        assert_eq!(first.data_points()[0].attributes[0].key, "method");
        assert_eq!(first.data_points()[0].attributes[1].key, "status");
        assert_eq!(first.data_points()[0].value, NumberValue::Int(1027));
    }

    #[test]
    fn test_wire_shape() {
        let doc = assemble(vec![parse_metric_line("delta -5").unwrap()], 7);

        let value: serde_json::Value = serde_json::from_slice(&encode(&doc).unwrap()).unwrap();
        let metric = &value["resourceMetrics"][0]["scopeMetrics"][0]["metrics"][0];

        assert_eq!(metric["name"], "delta");
        assert_eq!(metric["unit"], "");
        assert_eq!(metric["description"], "");
        let point = &metric["gauge"]["dataPoints"][0];
        assert_eq!(point["asInt"], -5);
        assert!(point.get("asDouble").is_none());
        assert_eq!(point["timeUnixNano"], 7);
        assert_eq!(point["attributes"], serde_json::json!([]));
    }

    #[test]
    fn test_pretty_is_valid_json() {
        let doc = assemble(vec![parse_metric_line("up 1").unwrap()], 1);
        let pretty = encode_pretty(&doc).unwrap();

        assert!(pretty.contains('\n'));
        let decoded: Document = decode(pretty.as_bytes()).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_decode_invalid() {
        let result: Result<Document> = decode(b"not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
