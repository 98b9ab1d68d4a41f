//! HS256 bearer tokens

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::DateTime;
use chrono::Utc;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::error::AuthError;
use crate::model::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: String,
    /// Issued at, in seconds since the epoch.
    pub iat: i64,
    /// Expiry, in seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// Parses the subject as a user id.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))
    }
}

/// Issues and verifies JWT-shaped tokens signed with HMAC-SHA256.
///
/// Tokens are `base64url(header).base64url(claims).base64url(signature)`.
/// Verification checks the algorithm, the signature (in constant time) and
/// the expiry, in that order.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Creates a signer. An empty secret is rejected.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        Ok(Self {
            secret: Arc::from(secret),
            ttl: DEFAULT_TOKEN_TTL,
        })
    }

    /// Sets the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user`, valid from now.
    pub fn issue(&self, user: UserId) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issues a token for `user` as if the current time were `now`.
    pub fn issue_at(&self, user: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let header = encode_json(&header)?;
        let claims = encode_json(&claims)?;
        let signing_input = format!("{header}.{claims}");
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verifies a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut parts = token.trim().split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken);
        };

        let decoded: Header = decode_json(header)?;
        if decoded.alg != ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm(decoded.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;
        self.mac(&format!("{header}.{claims}"))?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let claims: Claims = decode_json(claims)?;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, input: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::MissingSecret)?;
        mac.update(input.as_bytes());
        Ok(mac)
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let bytes = serde_json::to_vec(value).map_err(|_| AuthError::MalformedToken)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let user = UserId::new();
        let token = signer().issue(user).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenSigner::new(""), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let token = signer().issue_at(UserId::new(), now).unwrap();

        let later = now + chrono::Duration::seconds(3600);
        assert!(matches!(signer().verify_at(&token, later), Err(AuthError::Expired)));
        assert!(signer().verify_at(&token, later - chrono::Duration::seconds(1)).is_ok());
    }

    #[test]
    fn test_other_secret_fails_signature() {
        let token = signer().issue(UserId::new()).unwrap();
        let other = TokenSigner::new("another-secret").unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_claims_fail_signature() {
        let token = signer().issue(UserId::new()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = encode_json(&Claims {
            sub: UserId::new().to_string(),
            iat: 0,
            exp: i64::MAX,
        })
        .unwrap();
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert!(matches!(signer().verify(&tampered), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let header = encode_json(&Header {
            alg: "none".into(),
            typ: "JWT".into(),
        })
        .unwrap();
        let token = format!("{header}.e30.");
        assert!(matches!(
            signer().verify(&token),
            Err(AuthError::UnsupportedAlgorithm(alg)) if alg == "none"
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.##"] {
            assert!(
                matches!(signer().verify(token), Err(AuthError::MalformedToken)),
                "{token:?}"
            );
        }
    }
}
