use crate::models::{TokenRequest, TokenResponse};
use crate::services::{record_token_outcome, AccessGrant};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use service_core::error::AppError;
use validator::Validate;

pub const MISSING_FIELDS_MESSAGE: &str = "roomName and participantName are required";
pub const CREDENTIALS_MISSING_MESSAGE: &str = "LiveKit credentials not configured";
pub const SIGNING_FAILED_MESSAGE: &str = "Failed to generate voice token";

pub fn router() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}

/// Exchange a room/participant pair for a signed session access token.
///
/// Input is checked before credentials, and both before any signing call, so
/// a rejected request never reaches the signer.
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Unreadable token request body: {}", rejection);
            TokenRequest::default()
        }
    };

    let missing_fields = || {
        record_token_outcome("invalid_request");
        AppError::InvalidArgument(MISSING_FIELDS_MESSAGE.to_string())
    };

    if let Err(errors) = request.validate() {
        tracing::debug!("Token request failed validation: {}", errors);
        return Err(missing_fields());
    }
    let (room_name, participant_name) = request.into_parts().ok_or_else(missing_fields)?;

    let Some(signer) = state.token_signer.as_ref() else {
        record_token_outcome("not_configured");
        return Err(AppError::Configuration(
            CREDENTIALS_MISSING_MESSAGE.to_string(),
        ));
    };

    let grant = AccessGrant::join_room(&participant_name, &room_name);
    let token = signer.sign(&grant).await.map_err(|e| {
        record_token_outcome("signing_failed");
        AppError::upstream(SIGNING_FAILED_MESSAGE, e)
    })?;

    record_token_outcome("issued");
    tracing::info!(
        room = %room_name,
        participant = %participant_name,
        "Issued voice session token"
    );

    Ok(Json(TokenResponse::issued(
        token,
        state.config.livekit.public_url(),
    )))
}
