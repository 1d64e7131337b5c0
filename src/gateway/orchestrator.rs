use crate::config::GatewayConfig;
use crate::gateway::classify::RiskTier;
use crate::gateway::encode::{encode_chat, encode_growth};
use crate::gateway::validate::{validate_chat, validate_growth};
use crate::gateway::{
    ChatOutcome, GatewayError, GatewayOutcome, GrowthCheckInput, GrowthOutcome, PredictionRequest,
};
use crate::shared::logging::append_log_line;
use crate::shared::time::jakarta_now_iso;
use crate::store::{GrowthCheckRecord, RecordStore, RestRecordStore, StoredCheck};
use crate::worker::{BraceSpanExtractor, PayloadExtractor, ProcessRunner, WorkerRunner};
use chrono::Utc;

/// Per-request pipeline: invoke → extract → validate → classify → resolve →
/// persist. Linear; the first failure is terminal and tagged with its step.
/// Invocations are independent and safe to run concurrently.
pub struct Gateway {
    config: GatewayConfig,
    runner: Box<dyn WorkerRunner>,
    store: Box<dyn RecordStore>,
    extractor: Box<dyn PayloadExtractor>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        let runner = Box::new(ProcessRunner::new(&config.worker));
        let store = Box::new(RestRecordStore::new(&config.store));
        Self::with_parts(config, runner, store)
    }

    /// Injection seam for alternate worker transports and record stores.
    pub fn with_parts(
        config: GatewayConfig,
        runner: Box<dyn WorkerRunner>,
        store: Box<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            runner,
            store,
            extractor: Box::new(BraceSpanExtractor),
        }
    }

    /// Swaps the default brace-span extractor for a framed protocol.
    pub fn with_extractor(mut self, extractor: Box<dyn PayloadExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Dispatches one request by kind and returns the normalized outcome.
    pub fn handle(
        &self,
        user_id: &str,
        request: PredictionRequest,
    ) -> Result<GatewayOutcome, GatewayError> {
        match request {
            PredictionRequest::GrowthCheck(input) => self
                .check_growth(user_id, input)
                .map(GatewayOutcome::Growth),
            PredictionRequest::ChatMessage { text } => {
                self.chat(&text).map(GatewayOutcome::Chat)
            }
        }
    }

    /// Runs one growth prediction and persists a new check record.
    pub fn check_growth(
        &self,
        user_id: &str,
        input: GrowthCheckInput,
    ) -> Result<GrowthOutcome, GatewayError> {
        let result = self.run_growth(user_id, input, None);
        self.log_growth("growth_check", &result);
        result
    }

    /// Re-runs the prediction for an existing check and updates it in place.
    pub fn recheck_growth(
        &self,
        check_id: i64,
        user_id: &str,
        input: GrowthCheckInput,
    ) -> Result<GrowthOutcome, GatewayError> {
        let result = self.run_growth(user_id, input, Some(check_id));
        self.log_growth("growth_recheck", &result);
        result
    }

    /// Forwards one chat message to the chat worker and returns its reply.
    /// No classification, no persistence.
    pub fn chat(&self, text: &str) -> Result<ChatOutcome, GatewayError> {
        let result = self.run_chat(text);
        match &result {
            Ok(outcome) => self.log("chat", &format!("ok reply_len={}", outcome.reply.len())),
            Err(err) => self.log("chat", &format!("err step={} {err}", err.step())),
        }
        result
    }

    fn run_growth(
        &self,
        user_id: &str,
        input: GrowthCheckInput,
        existing_check: Option<i64>,
    ) -> Result<GrowthOutcome, GatewayError> {
        input.validate()?;

        let encoded = encode_growth(&input);
        let outcome = self
            .runner
            .run(&self.config.worker.growth_script, &encoded)?;
        let decoded = self.extractor.extract(&outcome.stdout)?;
        let payload = validate_growth(&decoded)?;

        let tier = RiskTier::from_z_score(payload.height_for_age_z_score);
        let recommendation = self
            .store
            .recommendation_for(tier)?
            .ok_or(GatewayError::RecommendationMissing { tier })?;

        let now = jakarta_now_iso();
        let record = GrowthCheckRecord {
            user_id: user_id.to_string(),
            recommendation_id: recommendation.id,
            sex: input.sex,
            age_months: input.age_months,
            birth_weight_kg: input.birth_weight_kg,
            birth_length_cm: input.birth_length_cm,
            body_weight_kg: input.body_weight_kg,
            body_length_cm: input.body_length_cm,
            exclusive_breastfeeding: input.exclusive_breastfeeding,
            stunting_probability: payload.stunting_probability,
            stunting_prediction: payload.stunting_prediction.clone(),
            who_classification: payload.who_classification.clone(),
            height_for_age_z_score: payload.height_for_age_z_score,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let StoredCheck { id } = match existing_check {
            None => self.store.insert_check(&record)?,
            Some(check_id) => self.store.update_check(check_id, &record)?,
        };

        Ok(GrowthOutcome {
            check_id: id,
            input,
            payload,
            risk_tier: tier,
            recommendation_id: recommendation.id,
            recommendation_notes: recommendation.notes,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    fn run_chat(&self, text: &str) -> Result<ChatOutcome, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "chat message must not be empty".to_string(),
            ));
        }
        let outcome = self
            .runner
            .run(&self.config.worker.chat_script, &encode_chat(text))?;
        let decoded = self.extractor.extract(&outcome.stdout)?;
        let payload = validate_chat(&decoded)?;
        Ok(ChatOutcome {
            reply: payload.reply,
        })
    }

    fn log_growth(&self, op: &str, result: &Result<GrowthOutcome, GatewayError>) {
        match result {
            Ok(outcome) => self.log(
                op,
                &format!("ok tier={} check_id={}", outcome.risk_tier, outcome.check_id),
            ),
            Err(err) => self.log(op, &format!("err step={} {err}", err.step())),
        }
    }

    // Best effort; a logging failure never fails the request.
    fn log(&self, op: &str, summary: &str) {
        if let Some(path) = &self.config.log_path {
            let line = format!("{} {op} {summary}", Utc::now().to_rfc3339());
            let _ = append_log_line(path, &line);
        }
    }
}
