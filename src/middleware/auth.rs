// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::AuthToken,
};

// Aceita "Token <t>" (formato da API WBR) e "Bearer <t>"
pub fn extract_token(header_value: &str) -> Option<AuthToken> {
    let value = header_value.trim();
    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(AuthToken::new)
}

// O token não é validado aqui: a API WBR é quem recusa tokens inválidos.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_token);

    match token {
        Some(token) => {
            request.extensions_mut().insert(token);
            Ok(next.run(request).await)
        }
        None => Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)),
    }
}

// Extrator do token nos handlers (depois do auth_guard)
impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthToken>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_schemes() {
        assert_eq!(extract_token("Token abc"), Some(AuthToken::new("abc")));
        assert_eq!(extract_token("Bearer xyz "), Some(AuthToken::new("xyz")));
        assert_eq!(extract_token("Basic abc"), None);
        assert_eq!(extract_token("Token   "), None);
    }
}
