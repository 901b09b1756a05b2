//! Share token model: anonymous capability tokens scoped to one event or
//! project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::scope::MediaScope;

/// What a share token is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "token_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Can read media in any status and submit approve/reject decisions.
    Validator,
    /// Can read and download approved media only.
    Media,
}

impl TokenKind {
    /// URL path segment for shareable links (`v` = validator, `d` = download).
    pub fn url_segment(&self) -> &'static str {
        match self {
            TokenKind::Validator => "v",
            TokenKind::Media => "d",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Validator => "VALIDATOR",
            TokenKind::Media => "MEDIA",
        }
    }
}

/// A bearer capability granting access to one scope's media.
///
/// The token string is the sole credential: 32 cryptographically random
/// bytes, hex-encoded. Scope is immutable after creation; deleting the row
/// is the only revocation mechanism.
#[derive(Debug, Clone)]
pub struct ShareToken {
    pub id: Uuid,
    pub token: String,
    pub kind: TokenKind,
    pub scope: MediaScope,
    pub label: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ShareToken {
    /// Expiration is a pure function of `expires_at` vs now, independent of
    /// usage count.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_at: Option<DateTime<Utc>>) -> ShareToken {
        ShareToken {
            id: Uuid::new_v4(),
            token: "a".repeat(64),
            kind: TokenKind::Validator,
            scope: MediaScope::Event(Uuid::new_v4()),
            label: None,
            expires_at,
            last_used_at: None,
            usage_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn never_expires_without_deadline() {
        assert!(!token(None).is_expired_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn expires_strictly_after_deadline() {
        let now = Utc::now();
        let t = token(Some(now));
        assert!(!t.is_expired_at(now));
        assert!(t.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn url_segments() {
        assert_eq!(TokenKind::Validator.url_segment(), "v");
        assert_eq!(TokenKind::Media.url_segment(), "d");
    }
}
