//! HTTP handlers: decode the request, call the protocol, encode the reply.
//!
//! Each handler does three things and nothing else:
//!   1. Read the session id from the cookie jar
//!   2. Call one [`CsrfProtocol`] operation
//!   3. Map the result to JSON, setting the cookie if a session was minted

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use shieldlab_protocol::{
    ChangeEmailRequest, ChangeEmailResponse, CsrfTokenResponse, ErrorResponse,
    HealthResponse, LoginRequest, LoginResponse, SessionId,
};

use crate::cookies::{SessionCookieJar, SessionCookies};
use crate::service::{CsrfProtocol, EmailChange};
use crate::{CookieConfig, RequestError};

/// State shared by every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) protocol: Arc<CsrfProtocol>,
    pub(crate) cookies: Arc<CookieConfig>,
}

/// `POST /api/login`
pub(crate) async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), RequestError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected login body");
        RequestError::InvalidBody
    })?;
    let mut cookies = SessionCookieJar::new(jar, &state.cookies);
    let presented = cookies.read_session_cookie();

    let auth = state
        .protocol
        .authenticate(presented.as_ref(), &req.username)
        .await?;

    // Always (re)set on login so the cookie's max-age restarts.
    cookies.set_session_cookie(&auth.session_id);

    Ok((
        cookies.into_jar(),
        Json(LoginResponse {
            success: true,
            message: "Logged in successfully".to_string(),
            username: auth.username,
            csrf_token: auth.csrf_token,
        }),
    ))
}

/// `GET /api/csrf-token`
pub(crate) async fn csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfTokenResponse>) {
    let mut cookies = SessionCookieJar::new(jar, &state.cookies);
    let presented = cookies.read_session_cookie();

    let issued = state.protocol.issue_or_fetch_token(presented.as_ref()).await;
    if issued.created {
        cookies.set_session_cookie(&issued.session_id);
    }

    (
        cookies.into_jar(),
        Json(CsrfTokenResponse {
            token: issued.csrf_token,
        }),
    )
}

/// `POST /api/change-email`: requires the session's CSRF token.
pub(crate) async fn change_email(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<ChangeEmailRequest>, JsonRejection>,
) -> Result<Json<ChangeEmailResponse>, RequestError> {
    let session_id = SessionCookieJar::new(jar, &state.cookies).read_session_cookie();
    let req = change_email_body(&state, session_id.as_ref(), payload).await?;

    let changed = state
        .protocol
        .perform_protected_mutation(
            session_id.as_ref(),
            req.csrf_token.as_deref(),
            EmailChange { email: req.email },
        )
        .await?;

    Ok(Json(ChangeEmailResponse {
        success: true,
        message: format!("Email changed to {}", changed.email),
        email: changed.email,
        warning: None,
    }))
}

/// `POST /api/change-email-no-token`: the deliberately vulnerable twin.
pub(crate) async fn change_email_no_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<ChangeEmailRequest>, JsonRejection>,
) -> Result<Json<ChangeEmailResponse>, RequestError> {
    let session_id = SessionCookieJar::new(jar, &state.cookies).read_session_cookie();
    let req = change_email_body(&state, session_id.as_ref(), payload).await?;

    let changed = state
        .protocol
        .perform_unprotected_mutation(session_id.as_ref(), EmailChange { email: req.email })
        .await?;

    Ok(Json(ChangeEmailResponse {
        success: true,
        message: format!("Email changed to {} (NO CSRF PROTECTION!)", changed.email),
        email: changed.email,
        warning: Some("This endpoint is vulnerable to CSRF attacks".to_string()),
    }))
}

/// Unwraps a change-email body.
///
/// A bad body is only reported once the session is known to be logged in;
/// anyone else gets `Unauthenticated` whatever they sent.
async fn change_email_body(
    state: &AppState,
    session_id: Option<&SessionId>,
    payload: Result<Json<ChangeEmailRequest>, JsonRejection>,
) -> Result<ChangeEmailRequest, RequestError> {
    match payload {
        Ok(Json(req)) => Ok(req),
        Err(rejection) => {
            state.protocol.require_login(session_id).await?;
            tracing::debug!(error = %rejection.body_text(), "rejected change-email body");
            Err(RequestError::InvalidBody)
        }
    }
}

/// `GET /api/health`
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Backend is running".to_string(),
    })
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            RequestError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Not authenticated".to_string(),
                    message: None,
                },
            ),
            RequestError::InvalidCsrfToken => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error: "Invalid CSRF token".to_string(),
                    message: Some(
                        "Request blocked: Missing or invalid CSRF token".to_string(),
                    ),
                },
            ),
            RequestError::InvalidUsername => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid username".to_string(),
                    message: Some("Username must not be blank".to_string()),
                },
            ),
            RequestError::InvalidBody => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid request body".to_string(),
                    message: Some("Expected a JSON body with the required fields".to_string()),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
