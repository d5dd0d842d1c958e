use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use placement_types::Role;

use crate::auth::{AppState, blocking, decode_token};
use crate::error::ApiError;

/// The authenticated user behind a request, as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
    pub username: String,
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Extract and validate the bearer token, then resolve its subject against the
/// users table so deleted accounts and role changes apply immediately.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthenticated)?;

    let claims =
        decode_token(&state.jwt_secret, bearer.token()).map_err(|_| ApiError::Unauthenticated)?;

    let user = blocking(&state, move |db| Ok(db.get_user_by_id(claims.sub)?))
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(Actor {
        id: user.id,
        role: user.role,
        username: user.username,
    });
    Ok(next.run(req).await)
}

pub async fn student_only(req: Request, next: Next) -> Result<Response, ApiError> {
    check_role(req.extensions().get::<Actor>(), Role::Student)?;
    Ok(next.run(req).await)
}

pub async fn company_only(req: Request, next: Next) -> Result<Response, ApiError> {
    check_role(req.extensions().get::<Actor>(), Role::Company)?;
    Ok(next.run(req).await)
}

pub async fn admin_only(req: Request, next: Next) -> Result<Response, ApiError> {
    check_role(req.extensions().get::<Actor>(), Role::Admin)?;
    Ok(next.run(req).await)
}

/// Exact role match. Admins do not pass company or student gates; they have
/// their own routes.
pub fn check_role(actor: Option<&Actor>, required: Role) -> Result<(), ApiError> {
    let actor = actor.ok_or(ApiError::Unauthenticated)?;
    if actor.role != required {
        return Err(ApiError::Forbidden(format!(
            "This action requires the {required} role"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: 1,
            role,
            username: "someone".into(),
        }
    }

    #[test]
    fn missing_actor_is_unauthenticated() {
        assert!(matches!(
            check_role(None, Role::Company),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn matching_role_passes() {
        assert!(check_role(Some(&actor(Role::Student)), Role::Student).is_ok());
    }

    #[test]
    fn admin_does_not_pass_company_gate() {
        let err = check_role(Some(&actor(Role::Admin)), Role::Company).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(err.to_string(), "This action requires the company role");
    }
}
