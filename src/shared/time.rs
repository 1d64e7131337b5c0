use chrono::Utc;
use chrono_tz::Asia::Jakarta;

/// Persisted records carry Jakarta local time, matching the deployment's
/// reporting timezone.
pub fn jakarta_now_iso() -> String {
    Utc::now().with_timezone(&Jakarta).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::jakarta_now_iso;

    #[test]
    fn timestamp_carries_jakarta_offset() {
        let stamp = jakarta_now_iso();
        assert!(stamp.ends_with("+07:00"), "unexpected stamp: {stamp}");
    }
}
