use crate::gateway::{ChatPayload, GatewayError, GrowthPayload};
use serde_json::Value;

const DEFAULT_WORKER_FAILURE: &str = "worker reported failure without a message";

fn incomplete(field: &str) -> GatewayError {
    GatewayError::IncompletePayload {
        field: field.to_string(),
    }
}

fn finite_number(payload: &Value, field: &str) -> Result<f64, GatewayError> {
    let value = payload
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| incomplete(field))?;
    if !value.is_finite() {
        return Err(incomplete(field));
    }
    Ok(value)
}

fn non_empty_string(payload: &Value, field: &str) -> Result<String, GatewayError> {
    let value = payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or_else(|| incomplete(field))?;
    if value.is_empty() {
        return Err(incomplete(field));
    }
    Ok(value.to_string())
}

/// Confirms a decoded growth payload carries all four mandatory fields with
/// finite numerics. The prediction label is whatever string the model emits;
/// a bare boolean is normalized to its label form.
pub fn validate_growth(payload: &Value) -> Result<GrowthPayload, GatewayError> {
    let stunting_probability = finite_number(payload, "stunting_probability")?;
    let height_for_age_z_score = finite_number(payload, "height_for_age_z_score")?;
    let who_classification = non_empty_string(payload, "who_classification")?;

    let stunting_prediction = match payload.get("stunting_prediction") {
        Some(Value::String(label)) if !label.trim().is_empty() => label.trim().to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        _ => return Err(incomplete("stunting_prediction")),
    };

    Ok(GrowthPayload {
        stunting_probability,
        stunting_prediction,
        who_classification,
        height_for_age_z_score,
    })
}

/// A chat worker that ran but declined reports `success: false` with a
/// human-readable message; that is a worker-reported failure, not a
/// transport error. Anything short of `success: true` plus a non-empty
/// reply fails validation.
pub fn validate_chat(payload: &Value) -> Result<ChatPayload, GatewayError> {
    let success = payload
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_WORKER_FAILURE);
        return Err(GatewayError::WorkerReportedFailure {
            message: message.to_string(),
        });
    }

    let reply = non_empty_string(payload, "reply")?;
    Ok(ChatPayload { reply })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_growth() -> Value {
        json!({
            "stunting_probability": 0.83,
            "stunting_prediction": "Yes",
            "who_classification": "Stunted (WHO)",
            "height_for_age_z_score": -2.4,
        })
    }

    #[test]
    fn complete_growth_payload_passes() {
        let payload = validate_growth(&full_growth()).expect("valid");
        assert_eq!(payload.stunting_prediction, "Yes");
        assert_eq!(payload.height_for_age_z_score, -2.4);
    }

    #[test]
    fn each_missing_growth_field_is_incomplete() {
        for field in [
            "stunting_probability",
            "stunting_prediction",
            "who_classification",
            "height_for_age_z_score",
        ] {
            let mut payload = full_growth();
            payload.as_object_mut().expect("object").remove(field);
            let err = validate_growth(&payload).expect_err("must fail");
            match err {
                GatewayError::IncompletePayload { field: reported } => {
                    assert_eq!(reported, field)
                }
                other => panic!("unexpected error for {field}: {other}"),
            }
        }
    }

    #[test]
    fn non_numeric_score_is_incomplete() {
        let mut payload = full_growth();
        payload["height_for_age_z_score"] = json!("minus two");
        assert!(matches!(
            validate_growth(&payload),
            Err(GatewayError::IncompletePayload { .. })
        ));
    }

    #[test]
    fn boolean_prediction_is_normalized() {
        let mut payload = full_growth();
        payload["stunting_prediction"] = json!(true);
        assert_eq!(
            validate_growth(&payload).expect("valid").stunting_prediction,
            "Yes"
        );
    }

    #[test]
    fn successful_chat_payload_passes() {
        let payload = json!({"success": true, "reply": "makan bergizi"});
        assert_eq!(validate_chat(&payload).expect("valid").reply, "makan bergizi");
    }

    #[test]
    fn declined_chat_surfaces_worker_message() {
        let payload = json!({"success": false, "message": "no model available"});
        match validate_chat(&payload) {
            Err(GatewayError::WorkerReportedFailure { message }) => {
                assert_eq!(message, "no model available")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn declined_chat_without_message_uses_default() {
        let payload = json!({"success": false});
        match validate_chat(&payload) {
            Err(GatewayError::WorkerReportedFailure { message }) => {
                assert!(!message.is_empty())
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn success_without_reply_is_incomplete() {
        let payload = json!({"success": true, "reply": "  "});
        assert!(matches!(
            validate_chat(&payload),
            Err(GatewayError::IncompletePayload { .. })
        ));
    }
}
