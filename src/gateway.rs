use crate::store::StoreError;
use crate::worker::WorkerError;
use serde::{Deserialize, Serialize};

pub mod classify;
pub mod encode;
pub mod orchestrator;
pub mod validate;

pub use classify::RiskTier;
pub use orchestrator::Gateway;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("worker process could not be started: {binary}")]
    Spawn { binary: String },
    #[error("worker exited with code {exit_code}")]
    WorkerExit {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("worker exceeded deadline of {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("no payload found in worker output")]
    NoPayloadFound,
    #[error("worker payload failed to decode: {reason}")]
    MalformedPayload { reason: String },
    #[error("worker payload incomplete: missing or invalid field `{field}`")]
    IncompletePayload { field: String },
    #[error("worker reported failure: {message}")]
    WorkerReportedFailure { message: String },
    #[error("no recommendation configured for tier `{tier}`")]
    RecommendationMissing { tier: RiskTier },
    #[error("worker io failure at {path}: {source}")]
    WorkerIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<WorkerError> for GatewayError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::Spawn { binary } => Self::Spawn { binary },
            WorkerError::NonZeroExit {
                exit_code,
                stdout,
                stderr,
            } => Self::WorkerExit {
                exit_code,
                stdout,
                stderr,
            },
            WorkerError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            WorkerError::NoPayloadFound => Self::NoPayloadFound,
            WorkerError::MalformedPayload { reason } => Self::MalformedPayload { reason },
            WorkerError::Io { path, source } => Self::WorkerIo { path, source },
        }
    }
}

/// Pipeline position at which a failure occurred. Each request moves through
/// these steps linearly; the first failure is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStep {
    Receive,
    Invoke,
    Extract,
    Validate,
    Resolve,
    Persist,
}

impl GatewayStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Invoke => "invoke",
            Self::Extract => "extract",
            Self::Validate => "validate",
            Self::Resolve => "resolve",
            Self::Persist => "persist",
        }
    }
}

impl std::fmt::Display for GatewayStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl GatewayError {
    pub fn step(&self) -> GatewayStep {
        match self {
            Self::InvalidRequest(_) => GatewayStep::Receive,
            Self::Spawn { .. } | Self::WorkerExit { .. } | Self::Timeout { .. }
            | Self::WorkerIo { .. } => GatewayStep::Invoke,
            Self::NoPayloadFound | Self::MalformedPayload { .. } => GatewayStep::Extract,
            Self::IncompletePayload { .. } | Self::WorkerReportedFailure { .. } => {
                GatewayStep::Validate
            }
            Self::RecommendationMissing { .. } => GatewayStep::Resolve,
            Self::Store(_) => GatewayStep::Persist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

/// Growth-measurement inputs for one stunting check. Validated before any
/// worker is spawned.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GrowthCheckInput {
    pub sex: Sex,
    pub age_months: u32,
    pub birth_weight_kg: f64,
    pub birth_length_cm: f64,
    pub body_weight_kg: f64,
    pub body_length_cm: f64,
    pub exclusive_breastfeeding: bool,
}

pub const MAX_AGE_MONTHS: u32 = 60;

impl GrowthCheckInput {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.age_months > MAX_AGE_MONTHS {
            return Err(GatewayError::InvalidRequest(format!(
                "age_months must be between 0 and {MAX_AGE_MONTHS}"
            )));
        }
        let measurements = [
            ("birth_weight_kg", self.birth_weight_kg),
            ("birth_length_cm", self.birth_length_cm),
            ("body_weight_kg", self.body_weight_kg),
            ("body_length_cm", self.body_length_cm),
        ];
        for (name, value) in measurements {
            if !value.is_finite() || value <= 0.0 {
                return Err(GatewayError::InvalidRequest(format!(
                    "{name} must be a positive number"
                )));
            }
        }
        Ok(())
    }
}

/// One request to the gateway, alive for the duration of a single call.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionRequest {
    GrowthCheck(GrowthCheckInput),
    ChatMessage { text: String },
}

/// Decoded and validated growth prediction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPayload {
    pub stunting_probability: f64,
    pub stunting_prediction: String,
    pub who_classification: String,
    pub height_for_age_z_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPayload {
    pub reply: String,
}

/// Success envelope for a growth check: the persisted record plus the
/// resolved guidance.
#[derive(Debug, Clone)]
pub struct GrowthOutcome {
    pub check_id: i64,
    pub input: GrowthCheckInput,
    pub payload: GrowthPayload,
    pub risk_tier: RiskTier,
    pub recommendation_id: i64,
    pub recommendation_notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub reply: String,
}

/// Normalized result for callers that dispatch on [`PredictionRequest`]
/// rather than the per-kind entry points.
#[derive(Debug, Clone)]
pub enum GatewayOutcome {
    Growth(GrowthOutcome),
    Chat(ChatOutcome),
}
