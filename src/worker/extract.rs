use crate::worker::WorkerError;
use serde_json::Value;

/// Pulls the structured payload out of raw worker output. Workers log freely
/// around the payload, so this takes the widest brace-delimited span (first
/// `{` to last `}`) and decodes it.
///
/// This is a heuristic, not a protocol guarantee: a diagnostic containing a
/// brace after the real payload widens the span and corrupts extraction.
/// Swap in a framed transport behind `WorkerRunner` to harden.
pub fn extract_payload(raw: &str) -> Result<Value, WorkerError> {
    let start = raw.find('{').ok_or(WorkerError::NoPayloadFound)?;
    let end = raw.rfind('}').ok_or(WorkerError::NoPayloadFound)?;
    if end < start {
        return Err(WorkerError::NoPayloadFound);
    }

    let span = &raw[start..=end];
    serde_json::from_str(span).map_err(|err| WorkerError::MalformedPayload {
        reason: err.to_string(),
    })
}

/// Extraction seam. The default is the brace-span heuristic above; a
/// delimiter- or length-framed worker protocol substitutes here.
pub trait PayloadExtractor: Send + Sync {
    fn extract(&self, raw: &str) -> Result<Value, WorkerError>;
}

pub struct BraceSpanExtractor;

impl PayloadExtractor for BraceSpanExtractor {
    fn extract(&self, raw: &str) -> Result<Value, WorkerError> {
        extract_payload(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_payload_surrounded_by_log_noise() {
        let raw = "loading model\nwarning: deprecated api\n{\"reply\":\"hi\"}\ndone\n";
        let value = extract_payload(raw).expect("payload");
        assert_eq!(value["reply"], "hi");
    }

    #[test]
    fn no_braces_is_no_payload() {
        let err = extract_payload("just diagnostics, nothing structured").expect_err("fail");
        assert!(matches!(err, WorkerError::NoPayloadFound));
    }

    #[test]
    fn close_before_open_is_no_payload() {
        let err = extract_payload("} oops {").expect_err("fail");
        assert!(matches!(err, WorkerError::NoPayloadFound));
    }

    #[test]
    fn undecodable_span_is_malformed() {
        let err = extract_payload("{not json at all}").expect_err("fail");
        assert!(matches!(err, WorkerError::MalformedPayload { .. }));
    }

    #[test]
    fn extraction_is_idempotent() {
        let raw = "log\n{\"a\":1}\n";
        let first = extract_payload(raw).expect("first");
        let second = extract_payload(raw).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn trailing_braced_diagnostic_widens_the_span() {
        // Known fragility of the greedy span: a brace-bearing diagnostic
        // after the payload corrupts extraction rather than being skipped.
        let raw = "{\"a\":1}\ndebug {cache miss}\n";
        let err = extract_payload(raw).expect_err("span is widened past the payload");
        assert!(matches!(err, WorkerError::MalformedPayload { .. }));
    }
}
