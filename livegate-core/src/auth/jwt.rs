use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;
use std::sync::Arc;

use super::AuthError;
use crate::config::JwtConfig;

/// Claims carried by an accepted token.
///
/// The control plane does not interpret claims; they are kept as a raw map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims(pub serde_json::Map<String, serde_json::Value>);

/// Bearer token verifier for HMAC-signed JWTs
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    algorithm: Algorithm,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl JwtVerifier {
    /// Build a verifier from configuration.
    ///
    /// Returns `Ok(None)` when no secret is configured: token validation is
    /// disabled rather than failing every request.
    pub fn from_config(config: &JwtConfig) -> Result<Option<Self>, AuthError> {
        if !config.enabled() {
            return Ok(None);
        }
        Self::new(config.secret.as_bytes(), &config.algorithm).map(Some)
    }

    /// Unknown algorithm names fall back to HS256. Known but non-HMAC
    /// algorithms cannot be verified with a shared secret and are rejected.
    pub fn new(secret: &[u8], algorithm: &str) -> Result<Self, AuthError> {
        let algorithm = if algorithm.is_empty() {
            Algorithm::HS256
        } else {
            algorithm.parse::<Algorithm>().unwrap_or_else(|_| {
                tracing::warn!(
                    algorithm = %algorithm,
                    "Unknown JWT signing algorithm, falling back to HS256"
                );
                Algorithm::HS256
            })
        };

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(Self {
                decoding_key: Arc::new(DecodingKey::from_secret(secret)),
                algorithm,
            }),
            other => Err(AuthError::UnsupportedAlgorithm(format!("{other:?}"))),
        }
    }

    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Pick the token from the `Authorization: Bearer <token>` header, then
    /// from the `jwt` query parameter.
    ///
    /// A header that is not a bearer credential (for example the static API
    /// key) is skipped so the query parameter can still supply the token.
    pub fn extract_token<'a>(
        auth_header: Option<&'a str>,
        query_token: Option<&'a str>,
    ) -> Result<&'a str, AuthError> {
        if let Some(token) = auth_header.and_then(parse_bearer) {
            return Ok(token);
        }

        match query_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::Token(
                "Required authorization token not found".to_string(),
            )),
        }
    }

    /// Verify signature, algorithm and (when present) `exp`/`nbf`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::Token(format!("Error parsing token: {e}")))?;

        if header.alg != self.algorithm {
            return Err(AuthError::Token(format!(
                "Expected {:?} signing method but token specified {:?}",
                self.algorithm, header.alg
            )));
        }

        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data: TokenData<TokenClaims> =
            decode(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::Token("Token is expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                    AuthError::Token("Token is not valid yet".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::Token("Error parsing token: signature is invalid".to_string())
                }
                _ => AuthError::Token(format!("Error parsing token: {e}")),
            })?;

        Ok(token_data.claims)
    }
}

fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret";

    fn sign(alg: Algorithm, secret: &[u8], claims: &serde_json::Value) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_from_config_disabled_without_secret() {
        let config = JwtConfig::default();
        assert!(JwtVerifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_algorithm_selection() {
        assert_eq!(
            JwtVerifier::new(SECRET, "").unwrap().algorithm(),
            Algorithm::HS256
        );
        assert_eq!(
            JwtVerifier::new(SECRET, "HS384").unwrap().algorithm(),
            Algorithm::HS384
        );
        assert_eq!(
            JwtVerifier::new(SECRET, "not-an-alg").unwrap().algorithm(),
            Algorithm::HS256
        );
        assert!(matches!(
            JwtVerifier::new(SECRET, "RS256"),
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_verify_valid_token_without_exp() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let token = sign(Algorithm::HS256, SECRET, &json!({"sub": "operator"}));

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.0.get("sub"), Some(&json!("operator")));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let token = sign(Algorithm::HS256, b"other", &json!({"sub": "x"}));

        let err = verifier.verify(&token).unwrap_err();
        assert!(err.to_string().starts_with("Error parsing token"));
    }

    #[test]
    fn test_verify_rejects_algorithm_mismatch() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let token = sign(Algorithm::HS512, SECRET, &json!({"sub": "x"}));

        let err = verifier.verify(&token).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected HS256 signing method but token specified HS512"
        );
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let token = sign(
            Algorithm::HS256,
            SECRET,
            &json!({"sub": "x", "exp": now() - 3600}),
        );

        assert_eq!(
            verifier.verify(&token).unwrap_err(),
            AuthError::Token("Token is expired".to_string())
        );
    }

    #[test]
    fn test_verify_rejects_token_before_nbf() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let future = sign(
            Algorithm::HS256,
            SECRET,
            &json!({"sub": "x", "nbf": now() + 3600}),
        );
        let past = sign(
            Algorithm::HS256,
            SECRET,
            &json!({"sub": "x", "nbf": now() - 60}),
        );

        assert_eq!(
            verifier.verify(&future).unwrap_err(),
            AuthError::Token("Token is not valid yet".to_string())
        );
        assert!(verifier.verify(&past).is_ok());
    }

    #[test]
    fn test_verify_accepts_unexpired_token() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let token = sign(
            Algorithm::HS256,
            SECRET,
            &json!({"sub": "x", "exp": now() + 3600}),
        );

        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
        let err = verifier.verify("not.a.jwt").unwrap_err();
        assert!(err.to_string().starts_with("Error parsing token"));
    }

    #[test]
    fn test_extract_token_order() {
        assert_eq!(
            JwtVerifier::extract_token(Some("Bearer abc"), Some("def")).unwrap(),
            "abc"
        );
        assert_eq!(
            JwtVerifier::extract_token(Some("bearer abc"), None).unwrap(),
            "abc"
        );
        assert_eq!(
            JwtVerifier::extract_token(None, Some("def")).unwrap(),
            "def"
        );
        // static API key in the header does not hide the query token
        assert_eq!(
            JwtVerifier::extract_token(Some("my-api-key"), Some("def")).unwrap(),
            "def"
        );
    }

    #[test]
    fn test_extract_token_missing() {
        let err = JwtVerifier::extract_token(Some("Basic Zm9vOmJhcg=="), Some("")).unwrap_err();
        assert_eq!(err.to_string(), "Required authorization token not found");
        assert!(JwtVerifier::extract_token(None, None).is_err());
    }
}
