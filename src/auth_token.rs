use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token secret is too short (min {MIN_SECRET_LEN} bytes)")]
    SecretTooShort,

    #[error("invalid token format")]
    InvalidFormat,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("failed to decode token payload")]
    PayloadDecode,

    #[error("failed to parse token payload")]
    PayloadParse,
}

/// Claims carried by a signed token: who the caller is and whether they
/// hold the admin role. The server keeps no session state; everything a
/// protected request needs is re-derived from these claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    pub is_admin: bool,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
}

impl TokenClaims {
    pub fn is_expired(&self, reference_ms: u64) -> bool {
        reference_ms >= self.expires_at_ms
    }
}

#[derive(Clone)]
pub struct TokenService {
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::SecretTooShort);
        }

        Ok(Self {
            secret: Arc::<[u8]>::from(secret),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs `{subject, is_admin}` into a compact `payload.signature` token
    /// expiring `ttl` after `issued_at_ms`.
    pub fn issue(
        &self,
        subject: &str,
        is_admin: bool,
        issued_at_ms: u64,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims {
            subject: subject.to_string(),
            is_admin,
            issued_at_ms,
            expires_at_ms: issued_at_ms.saturating_add(self.ttl.as_millis() as u64),
        };

        let payload =
            serde_json::to_vec(&claims).map_err(|_| TokenError::PayloadParse)?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.sign(payload_b64.as_bytes())?;
        let signature_b64 = URL_SAFE_NO_PAD.encode(signature);
        Ok(format!("{payload_b64}.{signature_b64}"))
    }

    pub fn verify(
        &self,
        token: &str,
        reference_ms: u64,
    ) -> Result<TokenClaims, TokenError> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or(TokenError::InvalidFormat)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::InvalidFormat)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::PayloadDecode)?;

        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::PayloadParse)?;

        if claims.subject.is_empty() || claims.is_expired(reference_ms) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| TokenError::InvalidSignature)?;
        mac.update(bytes);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(
            b"01234567890123456789012345678901".to_vec(),
            Duration::from_secs(30),
        )
        .expect("valid service")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let service = test_service();
        let token = service
            .issue("64f000000000000000000001", false, 1_000)
            .expect("issue token");

        let claims = service.verify(&token, 1_500).expect("verify token");
        assert_eq!(claims.subject, "64f000000000000000000001");
        assert!(!claims.is_admin);
        assert_eq!(claims.expires_at_ms, 31_000);
    }

    #[test]
    fn preserves_admin_flag() {
        let service = test_service();
        let token = service
            .issue("64f000000000000000000002", true, 1_000)
            .expect("issue token");

        let claims = service.verify(&token, 1_500).expect("verify token");
        assert!(claims.is_admin);
    }

    #[test]
    fn rejects_tampered_token() {
        let service = test_service();
        let token = service
            .issue("64f000000000000000000001", false, 10)
            .expect("issue token");
        let (payload, signature) = token.split_once('.').expect("token split");
        let mut chars: Vec<char> = payload.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered_payload: String = chars.into_iter().collect();
        let tampered = format!("{tampered_payload}.{signature}");

        assert!(matches!(
            service.verify(&tampered, 20),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let service = test_service();
        let token = service
            .issue("64f000000000000000000001", false, 1_000)
            .expect("issue token");

        assert!(matches!(
            service.verify(&token, 35_000),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn rejects_malformed_token() {
        let service = test_service();

        assert!(matches!(
            service.verify("no-dot-here", 0),
            Err(TokenError::InvalidFormat)
        ));
        assert!(matches!(
            service.verify("payload.!!!not-base64!!!", 0),
            Err(TokenError::InvalidFormat)
        ));
    }

    #[test]
    fn rejects_short_secret() {
        assert!(matches!(
            TokenService::new(b"short".to_vec(), Duration::from_secs(30)),
            Err(TokenError::SecretTooShort)
        ));
    }

    #[test]
    fn tokens_from_other_secret_fail() {
        let service = test_service();
        let other = TokenService::new(
            b"abcdefghijklmnopqrstuvwxyz012345".to_vec(),
            Duration::from_secs(30),
        )
        .expect("valid service");

        let token = other
            .issue("64f000000000000000000001", true, 1_000)
            .expect("issue token");

        assert!(matches!(
            service.verify(&token, 1_500),
            Err(TokenError::InvalidSignature)
        ));
    }
}
