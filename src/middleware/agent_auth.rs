//! Bearer API-key authentication middleware for print agents.
//!
//! This middleware intercepts every agent-facing job request to:
//! 1. Extract the API key from the Authorization header
//! 2. Verify it against the agent registry (prefix lookup + bcrypt)
//! 3. Inject the agent context into the request
//! 4. Reject unauthorized requests with a uniform HTTP 401

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::AppError, services::agent_service, state::AppState};

/// Agent context attached to authenticated job requests.
///
/// Route handlers extract this with `Extension<AgentContext>` to scope
/// every query to the agent's company.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub agent_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
}

/// Pull the bearer token out of the Authorization header.
///
/// Expected format: `Authorization: Bearer <api-key>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let token = auth.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Agent authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` from the request
/// 2. Verify the key via prefix lookup and bcrypt comparison
/// 3. If valid: fire the detached last-seen touch, inject
///    [`AgentContext`], call the next handler
/// 4. Otherwise: respond 401, with no hint of which check failed
pub async fn agent_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let agent = agent_service::verify_agent_by_api_key(&state.pool, &token)
        .await
        .ok_or(AppError::Unauthorized)?;

    // Liveness marker; the response never waits on it
    agent_service::spawn_touch_last_seen(state.pool.clone(), agent.id);

    request.extensions_mut().insert(AgentContext {
        agent_id: agent.id,
        company_id: agent.company_id,
        name: agent.name,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        let headers = headers_with_auth("Bearer abc123");
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let headers = headers_with_auth("Bearer   abc123  ");
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with_auth("abc123")), None);
        assert_eq!(bearer_token(&headers_with_auth("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with_auth("Bearer ")), None);
    }
}
