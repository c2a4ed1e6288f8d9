use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Body of `POST /api/voice/token`. Fields stay optional so that absent,
/// `null`, empty and blank values all fail the same `required` check.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "roomName is required"), length(min = 1))]
    pub room_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "participantName is required"), length(min = 1))]
    pub participant_name: Option<String>,
}

impl TokenRequest {
    /// `(room_name, participant_name)` once both are present.
    pub fn into_parts(self) -> Option<(String, String)> {
        Some((self.room_name?, self.participant_name?))
    }
}

/// Whitespace-only strings count as missing; accepted values are kept as sent.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub url: String,
}

impl TokenResponse {
    pub fn issued(token: String, url: String) -> Self {
        Self {
            success: true,
            token,
            url,
        }
    }
}
