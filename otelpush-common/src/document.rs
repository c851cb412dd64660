//! OTLP metrics document assembly.
//!
//! The nesting (`resourceMetrics` → `scopeMetrics` → `metrics`) mirrors the
//! OTLP/HTTP JSON request body. A document built here always holds exactly one
//! resource group and one scope group.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MalformedLine, Result};
use crate::exposition::{classify, parse_metric_line};
use crate::metric::{Attribute, Metric};

/// Top-level OTLP metrics document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,

    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    pub metrics: Vec<Metric>,
}

/// Instrumentation scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl Document {
    /// Iterate over every metric in the document, in order.
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.resource_metrics
            .iter()
            .flat_map(|r| r.scope_metrics.iter())
            .flat_map(|s| s.metrics.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.metrics().next().is_none()
    }

    /// Attach resource attributes (e.g. `service.name`).
    ///
    /// An empty attribute list leaves the resource unset.
    pub fn with_resource(mut self, attributes: Vec<Attribute>) -> Self {
        if !attributes.is_empty() {
            for group in &mut self.resource_metrics {
                group.resource = Some(Resource {
                    attributes: attributes.clone(),
                });
            }
        }
        self
    }

    /// Attach an instrumentation scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        for group in self
            .resource_metrics
            .iter_mut()
            .flat_map(|r| r.scope_metrics.iter_mut())
        {
            group.scope = Some(scope.clone());
        }
        self
    }
}

/// Fold parsed metrics into a document, stamping every data point with
/// `captured_at` (Unix epoch nanoseconds).
pub fn assemble(metrics: Vec<Metric>, captured_at: i64) -> Document {
    let metrics = metrics
        .into_iter()
        .map(|mut metric| {
            metric.stamp(captured_at);
            metric
        })
        .collect();

    Document {
        resource_metrics: vec![ResourceMetrics {
            resource: None,
            scope_metrics: vec![ScopeMetrics {
                scope: None,
                metrics,
            }],
        }],
    }
}

/// What to do with a line that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Fail the whole batch on the first malformed line.
    #[default]
    Abort,
    /// Log the malformed line and keep going.
    Skip,
}

/// Outcome of parsing a whole exposition body.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// Parsed metrics, in source order.
    pub metrics: Vec<Metric>,
    /// `# TYPE` / `# HELP` lines discarded.
    pub comments: usize,
    /// Lines dropped under [`BatchPolicy::Skip`].
    pub skipped: Vec<MalformedLine>,
}

/// Parse every line of an exposition body.
///
/// Lines are split on `\n` (a trailing `\r` is stripped). Comment lines are
/// counted and dropped, every other line goes through [`parse_metric_line`].
pub fn parse_exposition(body: &str, policy: BatchPolicy) -> Result<ParsedBatch> {
    let mut batch = ParsedBatch::default();

    for (index, line) in body.lines().enumerate() {
        if classify(line).is_comment() {
            batch.comments += 1;
            continue;
        }

        match parse_metric_line(line) {
            Ok(metric) => batch.metrics.push(metric),
            Err(e) => match policy {
                BatchPolicy::Abort => return Err(e.into()),
                BatchPolicy::Skip => {
                    warn!(line_number = index + 1, error = %e, "Skipping malformed metric line");
                    batch.skipped.push(e);
                }
            },
        }
    }

    debug!(
        metrics = batch.metrics.len(),
        comments = batch.comments,
        skipped = batch.skipped.len(),
        "Parsed exposition body"
    );

    Ok(batch)
}

/// Parse an exposition body and assemble it into a document in one step.
pub fn build_document(body: &str, policy: BatchPolicy, captured_at: i64) -> Result<Document> {
    let batch = parse_exposition(body, policy)?;
    Ok(assemble(batch.metrics, captured_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, LineErrorKind};
    use crate::metric::NumberValue;

    const T: i64 = 1_700_000_000_123_456_789;

    #[test]
    fn test_assemble_stamps_every_point() {
        let metrics = vec![
            Metric::gauge("a", NumberValue::Int(1), Vec::new()),
            Metric::gauge("b", NumberValue::Double(2.5), Vec::new()),
        ];

        let doc = assemble(metrics, T);

        assert_eq!(doc.resource_metrics.len(), 1);
        assert_eq!(doc.resource_metrics[0].scope_metrics.len(), 1);
        let names: Vec<_> = doc.metrics().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(
            doc.metrics()
                .all(|m| m.data_points()[0].time_unix_nano == T)
        );
    }

    #[test]
    fn test_assemble_empty() {
        let doc = assemble(Vec::new(), T);

        assert!(doc.is_empty());
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"resourceMetrics":[{"scopeMetrics":[{"metrics":[]}]}]}"#
        );
    }

    #[test]
    fn test_batch_with_comments() {
        let body = "# HELP up Target up\n# TYPE up gauge\nup 1\nload{cpu=\"0\"} 0.5\n";

        let doc = build_document(body, BatchPolicy::Abort, T).unwrap();

        let metrics: Vec<_> = doc.metrics().collect();
        assert_eq!(metrics.len(), 2);
        assert_eq!(
            metrics[0].data_points()[0].time_unix_nano,
            metrics[1].data_points()[0].time_unix_nano
        );
        assert_eq!(metrics[1].data_points()[0].value, NumberValue::Double(0.5));
    }

    #[test]
    fn test_crlf_lines() {
        let batch = parse_exposition("a 1\r\nb 2\r\n", BatchPolicy::Abort).unwrap();
        assert_eq!(batch.metrics.len(), 2);
        assert_eq!(batch.metrics[1].data_points()[0].value, NumberValue::Int(2));
    }

    #[test]
    fn test_abort_policy_fails_batch() {
        let body = "a 1\nmetric_name{foo=bar} 1\nc 3\n";

        let err = parse_exposition(body, BatchPolicy::Abort).unwrap_err();

        match err {
            Error::MalformedLine(e) => {
                assert_eq!(e.line, "metric_name{foo=bar} 1");
                assert_eq!(e.kind, LineErrorKind::ExpectedQuote('b'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_policy_keeps_order() {
        let body = "a 1\nbroken\n# TYPE c gauge\nc 3\n\nd 4.5\n";

        let batch = parse_exposition(body, BatchPolicy::Skip).unwrap();

        let names: Vec<_> = batch.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
        assert_eq!(batch.comments, 1);
        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(batch.skipped[0].line, "broken");
        assert_eq!(batch.skipped[1].line, "");
    }

    #[test]
    fn test_with_resource_and_scope() {
        let doc = assemble(vec![Metric::gauge("up", NumberValue::Int(1), Vec::new())], T)
            .with_resource(vec![Attribute::new("service.name", "node")])
            .with_scope(Scope {
                name: "otelpush".to_string(),
                version: "0.2.0".to_string(),
            });

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json["resourceMetrics"][0]["resource"]["attributes"][0]["value"]["stringValue"],
            "node"
        );
        assert_eq!(
            json["resourceMetrics"][0]["scopeMetrics"][0]["scope"]["name"],
            "otelpush"
        );
    }

    #[test]
    fn test_with_empty_resource_is_omitted() {
        let doc = assemble(Vec::new(), T).with_resource(Vec::new());
        assert!(doc.resource_metrics[0].resource.is_none());
    }

    #[test]
    fn test_policy_deserialize() {
        let policy: BatchPolicy = serde_json::from_str(r#""skip""#).unwrap();
        assert_eq!(policy, BatchPolicy::Skip);
        assert_eq!(BatchPolicy::default(), BatchPolicy::Abort);
    }
}
