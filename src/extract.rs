use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::constants::BEARER_PREFIX;
use crate::credentials::find_user;
use crate::error::AppError;
use crate::models::User;
use crate::AppState;

/// Identity of the caller, resolved from the bearer token
///
/// Every protected handler takes this as an argument; extraction fails with
/// `Unauthorized` before the handler runs when the header is missing, the
/// token does not verify, or the user no longer exists.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            tracing::debug!("Request without bearer token");
            AppError::Unauthorized
        })?;

        let user_id = state.tokens.verify(token)?;

        let user = find_user(&state.db, &user_id).await?.ok_or_else(|| {
            tracing::warn!("Valid token for non-existent user: {}", user_id);
            AppError::Unauthorized
        })?;

        Ok(AuthUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/files");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("abc.def"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
