//! Share token generation and validation.
//!
//! The token string is the sole credential: 32 random bytes, hex-encoded.
//! Deleting the row is the only revocation mechanism, so validity is checked
//! against the database on every request and never cached.

use lumen_core::models::{ShareToken, TokenKind};
use lumen_core::AppError;
use lumen_db::ShareTokenRepository;
use rand::RngCore;

/// 64 hex characters of fresh randomness.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shareable URL for a token: `{base}/v/{token}` for validators,
/// `{base}/d/{token}` for downloads.
pub fn share_url(base_url: &str, token: &ShareToken) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        token.kind.url_segment(),
        token.token
    )
}

/// Resolve a token string to a live token, enforcing kind when required.
///
/// Every successful validation bumps the usage counter, including repeat
/// validations within one browsing session.
pub async fn validate_share_token(
    repository: &ShareTokenRepository,
    token_str: &str,
    required_kind: Option<TokenKind>,
) -> Result<ShareToken, AppError> {
    let token = repository
        .find_by_token(token_str)
        .await?
        .ok_or(AppError::InvalidToken)?;

    if token.is_expired_at(chrono::Utc::now()) {
        return Err(AppError::TokenExpired);
    }

    if let Some(required) = required_kind {
        if token.kind != required {
            return Err(AppError::WrongTokenKind {
                required: required.as_str(),
            });
        }
    }

    repository.touch_usage(token.id).await?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lumen_core::models::MediaScope;
    use uuid::Uuid;

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn url_uses_kind_segment_and_trims_base() {
        let mut token = ShareToken {
            id: Uuid::new_v4(),
            token: "ab".repeat(32),
            kind: TokenKind::Validator,
            scope: MediaScope::Event(Uuid::new_v4()),
            label: None,
            expires_at: None,
            last_used_at: None,
            usage_count: 0,
            created_at: Utc::now(),
        };

        let url = share_url("https://lumen.example/", &token);
        assert_eq!(url, format!("https://lumen.example/v/{}", token.token));

        token.kind = TokenKind::Media;
        let url = share_url("https://lumen.example", &token);
        assert_eq!(url, format!("https://lumen.example/d/{}", token.token));
    }
}
