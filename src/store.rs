use crate::gateway::classify::RiskTier;
use crate::gateway::Sex;
use serde::{Deserialize, Serialize};

pub mod rest;

pub use rest::RestRecordStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Request(String),
    #[error("record store response invalid: {0}")]
    Response(String),
}

/// Tier-specific guidance, owned and mutated by the external record store.
/// The gateway only reads these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecommendationRecord {
    pub id: i64,
    pub risk_type: String,
    pub notes: String,
}

/// One composed prediction row, ready for persistence.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthCheckRecord {
    pub user_id: String,
    pub recommendation_id: i64,
    pub sex: Sex,
    pub age_months: u32,
    pub birth_weight_kg: f64,
    pub birth_length_cm: f64,
    pub body_weight_kg: f64,
    pub body_length_cm: f64,
    pub exclusive_breastfeeding: bool,
    pub stunting_probability: f64,
    pub stunting_prediction: String,
    pub who_classification: String,
    pub height_for_age_z_score: f64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredCheck {
    pub id: i64,
}

/// External record store seam. One equality lookup per recommendation
/// resolution; one atomic write per persisted check. Swappable for a fake
/// in orchestrator tests.
pub trait RecordStore: Send + Sync {
    fn recommendation_for(
        &self,
        tier: RiskTier,
    ) -> Result<Option<RecommendationRecord>, StoreError>;

    fn insert_check(&self, record: &GrowthCheckRecord) -> Result<StoredCheck, StoreError>;

    fn update_check(
        &self,
        check_id: i64,
        record: &GrowthCheckRecord,
    ) -> Result<StoredCheck, StoreError>;
}
