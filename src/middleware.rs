use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{self, Request},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, model::CurrentUser, schema::TokenQuery, AppState};

// Authorization header ("Bearer <token>" or the bare token), then ?token=
pub fn request_token<B>(request: &Request<B>) -> Option<String> {
    let from_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|header| header.strip_prefix("Bearer ").unwrap_or(header).trim().to_string())
        .filter(|token| !token.is_empty());

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(query)| query.token)
    })
}

// Guards protected routes: the wrapped handler only runs when the request
// carries the caller's current, unexpired token.
pub async fn mw_require_auth<B>(
    State(data): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let token = request_token(&request);

    let user = match data.tokens.verify(&data.db, token.as_deref()).await {
        Some(user) => user,
        None => {
            tracing::debug!(path = %request.uri().path(), "unauthorized request");
            return Err(AppError::Unauthorized);
        }
    };

    request.extensions_mut().insert(CurrentUser::from(&user));
    Ok(next.run(request).await)
}
