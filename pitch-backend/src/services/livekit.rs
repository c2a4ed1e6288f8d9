use crate::config::SigningCredentials;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    #[error("Failed to encode access token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Room permissions carried in the `video` claim. Only join is ever granted;
/// room creation, admin and recording flags are not representable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room_join: bool,
    pub room: String,
}

/// Permission to join exactly one room as exactly one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub identity: String,
    pub video: VideoGrant,
}

impl AccessGrant {
    pub fn join_room(identity: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            video: VideoGrant {
                room_join: true,
                room: room.into(),
            },
        }
    }
}

/// JWT claims in the layout LiveKit servers expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveKitClaims {
    /// API key id
    pub iss: String,
    /// Participant identity
    pub sub: String,
    pub jti: String,
    pub nbf: i64,
    pub exp: i64,
    pub video: VideoGrant,
}

#[async_trait]
pub trait TokenSigner: Send + Sync {
    async fn sign(&self, grant: &AccessGrant) -> Result<String, SigningError>;
}

/// Signs grants as HS256 JWTs with the LiveKit API key and secret.
pub struct LiveKitSigner {
    api_key: String,
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl LiveKitSigner {
    pub fn new(credentials: &SigningCredentials, ttl: Duration) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            encoding_key: EncodingKey::from_secret(
                credentials.api_secret.expose_secret().as_bytes(),
            ),
            ttl,
        }
    }

    fn claims(&self, grant: &AccessGrant) -> Result<LiveKitClaims, SigningError> {
        if grant.identity.is_empty() || grant.video.room.is_empty() {
            return Err(SigningError::InvalidGrant(
                "identity and room must be set".to_string(),
            ));
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|_| SigningError::InvalidGrant("token ttl out of range".to_string()))?;
        let now = Utc::now();

        Ok(LiveKitClaims {
            iss: self.api_key.clone(),
            sub: grant.identity.clone(),
            jti: grant.identity.clone(),
            nbf: 0,
            exp: (now + ttl).timestamp(),
            video: grant.video.clone(),
        })
    }
}

#[async_trait]
impl TokenSigner for LiveKitSigner {
    async fn sign(&self, grant: &AccessGrant) -> Result<String, SigningError> {
        let claims = self.claims(grant)?;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        tracing::debug!(
            identity = %grant.identity,
            room = %grant.video.room,
            "Signed session access token"
        );

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use secrecy::Secret;

    fn signer() -> LiveKitSigner {
        LiveKitSigner::new(
            &SigningCredentials {
                api_key: "APIdevkey".to_string(),
                api_secret: Secret::new("devsecret-devsecret-devsecret".to_string()),
            },
            Duration::from_secs(600),
        )
    }

    fn decode_claims(token: &str) -> serde_json::Value {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.set_issuer(&["APIdevkey"]);
        decode::<serde_json::Value>(
            token,
            &DecodingKey::from_secret(b"devsecret-devsecret-devsecret"),
            &validation,
        )
        .unwrap()
        .claims
    }

    #[tokio::test]
    async fn token_encodes_identity_and_room() {
        let token = signer()
            .sign(&AccessGrant::join_room("alice", "room-42"))
            .await
            .unwrap();

        let claims = decode_claims(&token);
        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["jti"], "alice");
        assert_eq!(claims["iss"], "APIdevkey");
        assert_eq!(
            claims["video"],
            serde_json::json!({ "roomJoin": true, "room": "room-42" })
        );
    }

    #[tokio::test]
    async fn expiry_follows_ttl() {
        let before = Utc::now().timestamp();
        let token = signer()
            .sign(&AccessGrant::join_room("bob", "r"))
            .await
            .unwrap();

        let claims = decode_claims(&token);
        let exp = claims["exp"].as_i64().unwrap();
        assert!(exp >= before + 600 && exp <= Utc::now().timestamp() + 600);
    }

    #[tokio::test]
    async fn token_is_valid_immediately_despite_clock_skew() {
        let token = signer()
            .sign(&AccessGrant::join_room("carol", "r"))
            .await
            .unwrap();

        assert_eq!(decode_claims(&token)["nbf"], 0);
    }

    #[tokio::test]
    async fn wrong_secret_does_not_verify() {
        let token = signer()
            .sign(&AccessGrant::join_room("alice", "room-42"))
            .await
            .unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        assert!(decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &validation
        )
        .is_err());
    }

    #[tokio::test]
    async fn empty_grant_is_refused() {
        let err = signer()
            .sign(&AccessGrant::join_room("", "room-42"))
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::InvalidGrant(_)));
    }
}
