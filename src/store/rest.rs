use crate::config::StoreConfig;
use crate::gateway::classify::RiskTier;
use crate::store::{GrowthCheckRecord, RecommendationRecord, RecordStore, StoreError, StoredCheck};
use serde_json::Value;

/// PostgREST-style client for the hosted record service. Every call is one
/// HTTP round trip; the service owns all consistency concerns.
pub struct RestRecordStore {
    api_base: String,
    api_key: String,
    recommendations_table: String,
    checks_table: String,
}

impl RestRecordStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            recommendations_table: config.recommendations_table.clone(),
            checks_table: config.checks_table.clone(),
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_base.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
    }

    fn write_rows(&self, request: ureq::Request, body: Value) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authorized(request)
            .set("Prefer", "return=representation")
            .send_json(body)
            .map_err(|e| StoreError::Request(e.to_string()))?;
        response
            .into_json::<Vec<Value>>()
            .map_err(|e| StoreError::Response(e.to_string()))
    }
}

fn eq_filter(column: &str, value: &str) -> String {
    format!("{column}=eq.{}", urlencoding::encode(value))
}

fn stored_id(rows: &[Value]) -> Result<StoredCheck, StoreError> {
    let id = rows
        .first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::Response("write returned no row id".to_string()))?;
    Ok(StoredCheck { id })
}

/// Update writes must not touch ownership or creation time.
fn update_body(record: &GrowthCheckRecord) -> Result<Value, StoreError> {
    let mut body =
        serde_json::to_value(record).map_err(|e| StoreError::Request(e.to_string()))?;
    if let Some(fields) = body.as_object_mut() {
        fields.remove("user_id");
        fields.remove("created_at");
    }
    Ok(body)
}

impl RecordStore for RestRecordStore {
    fn recommendation_for(
        &self,
        tier: RiskTier,
    ) -> Result<Option<RecommendationRecord>, StoreError> {
        let url = format!(
            "{}?select=id,risk_type,notes&{}",
            self.endpoint(&self.recommendations_table),
            eq_filter("risk_type", tier.as_str()),
        );
        let response = self
            .authorized(ureq::get(&url))
            .call()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let mut rows: Vec<RecommendationRecord> = response
            .into_json()
            .map_err(|e| StoreError::Response(e.to_string()))?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.remove(0)))
    }

    fn insert_check(&self, record: &GrowthCheckRecord) -> Result<StoredCheck, StoreError> {
        let body =
            serde_json::to_value(record).map_err(|e| StoreError::Request(e.to_string()))?;
        let rows = self.write_rows(
            ureq::post(&self.endpoint(&self.checks_table)),
            Value::Array(vec![body]),
        )?;
        stored_id(&rows)
    }

    fn update_check(
        &self,
        check_id: i64,
        record: &GrowthCheckRecord,
    ) -> Result<StoredCheck, StoreError> {
        let url = format!(
            "{}?{}",
            self.endpoint(&self.checks_table),
            eq_filter("id", &check_id.to_string()),
        );
        let rows = self.write_rows(
            ureq::request("PATCH", &url),
            update_body(record)?,
        )?;
        stored_id(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::gateway::Sex;

    fn store() -> RestRecordStore {
        RestRecordStore::new(&StoreConfig {
            api_base: "https://records.example.com/".to_string(),
            api_key: "key".to_string(),
            recommendations_table: "recommendations".to_string(),
            checks_table: "stunting_checks".to_string(),
        })
    }

    fn sample_record() -> GrowthCheckRecord {
        GrowthCheckRecord {
            user_id: "user-7".to_string(),
            recommendation_id: 3,
            sex: Sex::Male,
            age_months: 24,
            birth_weight_kg: 3.1,
            birth_length_cm: 49.0,
            body_weight_kg: 11.2,
            body_length_cm: 85.0,
            exclusive_breastfeeding: true,
            stunting_probability: 0.9,
            stunting_prediction: "Yes".to_string(),
            who_classification: "Severely stunted (WHO)".to_string(),
            height_for_age_z_score: -3.5,
            created_at: "2025-01-01T00:00:00+07:00".to_string(),
            updated_at: "2025-01-01T00:00:00+07:00".to_string(),
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            store().endpoint("recommendations"),
            "https://records.example.com/rest/v1/recommendations"
        );
    }

    #[test]
    fn eq_filter_encodes_values() {
        assert_eq!(eq_filter("risk_type", "Severe"), "risk_type=eq.Severe");
        assert_eq!(eq_filter("risk_type", "a b"), "risk_type=eq.a%20b");
    }

    #[test]
    fn update_body_drops_ownership_fields() {
        let body = update_body(&sample_record()).expect("body");
        let fields = body.as_object().expect("object");
        assert!(!fields.contains_key("user_id"));
        assert!(!fields.contains_key("created_at"));
        assert!(fields.contains_key("updated_at"));
        assert_eq!(fields["height_for_age_z_score"], -3.5);
    }

    #[test]
    fn stored_id_requires_a_returned_row() {
        let rows = vec![serde_json::json!({"id": 42})];
        assert_eq!(stored_id(&rows).expect("id"), StoredCheck { id: 42 });
        assert!(stored_id(&[]).is_err());
    }
}
