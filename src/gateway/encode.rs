use crate::gateway::GrowthCheckInput;
use serde_json::json;

/// Wire form expected by the growth model wrapper: one-row columnar JSON,
/// column names fixed by the model's preprocessor.
pub fn encode_growth(input: &GrowthCheckInput) -> String {
    let breastfeeding = if input.exclusive_breastfeeding {
        "Yes"
    } else {
        "No"
    };
    json!({
        "Sex": [input.sex.as_str()],
        "Age": [input.age_months],
        "Birth Weight": [input.birth_weight_kg],
        "Birth Length": [input.birth_length_cm],
        "Body Weight": [input.body_weight_kg],
        "Body Length": [input.body_length_cm],
        "ASI Eksklusif": [breastfeeding],
    })
    .to_string()
}

pub fn encode_chat(text: &str) -> String {
    json!({ "message": text }).to_string()
}
