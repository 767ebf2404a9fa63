use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::{Claims, JwtKeys};
use crate::error::ApiError;
use crate::users::repo::UserRole;

/// Requires a valid bearer token. A request with no parseable token fails
/// closed with 401 before any verification work; a token that does not
/// verify fails with 403. On success the decoded claims ride along to the
/// handler.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            // The scheme name is case-insensitive (RFC 7235).
            .and_then(|v| {
                v.strip_prefix("Bearer ")
                    .or_else(|| v.strip_prefix("bearer "))
            })
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("token verification failed");
            ApiError::Forbidden("Invalid or expired token".into())
        })?;
        Ok(AuthUser(claims))
    }
}

/// Composes on top of [`AuthUser`]: the token must additionally carry the
/// admin role.
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != UserRole::Admin {
            warn!(user_id = %claims.sub, "non-admin hit an admin route");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::repo::test_user;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn protected(AuthUser(_): AuthUser) -> &'static str {
        "ok"
    }

    async fn admin_only(AdminUser(_): AdminUser) -> &'static str {
        "ok"
    }

    fn app() -> (Router, JwtKeys) {
        let state = AppState::fake();
        let keys = JwtKeys::new(&state.config.jwt.secret);
        let app = Router::new()
            .route("/protected", get(protected))
            .route("/admin", get(admin_only))
            .with_state(state);
        (app, keys)
    }

    fn get_with_auth(uri: &str, auth: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (app, _) = app();
        let res = app.oneshot(get_with_auth("/protected", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let (app, _) = app();
        let res = app
            .oneshot(get_with_auth("/protected", Some("Basic Zm9vOmJhcg==".into())))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unverifiable_token_is_forbidden() {
        let (app, _) = app();
        let res = app
            .oneshot(get_with_auth("/protected", Some("Bearer garbage".into())))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler() {
        let (app, keys) = app();
        let token = keys.sign(&test_user(UserRole::User)).unwrap();
        let res = app
            .oneshot(get_with_auth("/protected", Some(format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn lowercase_bearer_scheme_is_accepted() {
        let (app, keys) = app();
        let token = keys.sign(&test_user(UserRole::User)).unwrap();
        let res = app
            .oneshot(get_with_auth("/protected", Some(format!("bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_role_cannot_enter_admin_routes() {
        let (app, keys) = app();
        let token = keys.sign(&test_user(UserRole::User)).unwrap();
        let res = app
            .oneshot(get_with_auth("/admin", Some(format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_role_passes_both_guards() {
        let (app, keys) = app();
        let token = keys.sign(&test_user(UserRole::Admin)).unwrap();
        let res = app
            .oneshot(get_with_auth("/admin", Some(format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_on_admin_route_is_unauthorized() {
        let (app, _) = app();
        let res = app.oneshot(get_with_auth("/admin", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
