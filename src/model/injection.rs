//! Operator-authored guidance injected into the next iteration's prompt (C2, §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Injection {
    pub id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub consumed: bool,
    #[serde(default)]
    pub consumed_at: Option<DateTime<Utc>>,
}

impl Injection {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            created_at: Utc::now(),
            consumed: false,
            consumed_at: None,
        }
    }

    pub fn mark_consumed(&mut self) {
        self.consumed = true;
        self.consumed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_injection_is_unconsumed() {
        let injection = Injection::new("i1", "slow down and add tests");
        assert!(!injection.consumed);
        assert!(injection.consumed_at.is_none());
    }

    #[test]
    fn mark_consumed_sets_timestamp() {
        let mut injection = Injection::new("i1", "msg");
        injection.mark_consumed();
        assert!(injection.consumed);
        assert!(injection.consumed_at.is_some());
    }
}
