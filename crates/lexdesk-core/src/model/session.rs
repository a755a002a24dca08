use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `sessions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub sid: String,
    pub sess: SessionData,
    pub expire: DateTime<Utc>,
}

/// Payload stored in the `sess` jsonb column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(sid: String, user_id: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sid,
            sess: SessionData {
                user_id: user_id.to_string(),
                created_at: now,
            },
            expire: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire <= now
    }

    pub fn user_id(&self) -> &str {
        &self.sess.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_at_ttl() {
        let now = Utc::now();
        let session = Session::new("s1".to_string(), "u1", now, Duration::hours(1));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(1)));
    }

    #[test]
    fn payload_is_camel_case() {
        let session = Session::new("s1".to_string(), "u1", Utc::now(), Duration::hours(1));
        let json = serde_json::to_value(&session.sess).unwrap();
        assert_eq!(json["userId"], "u1");
    }
}
