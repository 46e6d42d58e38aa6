use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
    types::{Operation, Resource, UserId},
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{instrument, trace};

/// Pull the token out of an `Authorization: Bearer <token>` header.
/// Returns:
/// - None: no Authorization header, or not a Bearer token
/// - Some(Ok(token)): a Bearer token is present
/// - Some(Err(error)): the header is not valid UTF-8
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let header = parts.headers.get(AUTHORIZATION)?;

    let value = match header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    value.strip_prefix("Bearer ").map(|token| Ok(token.trim()))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match bearer_token(parts) {
            Some(Ok(token)) => {
                let user = session::verify_session_token(token, &state.config)?;
                trace!("Authenticated user {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => Err(e),
            None => {
                trace!("No bearer token in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

impl CurrentUser {
    /// Succeeds only if the caller is `owner`.
    pub fn ensure_owner(&self, owner: UserId, action: Operation, resource: Resource) -> Result<()> {
        if self.id == owner {
            Ok(())
        } else {
            Err(Error::Forbidden { action, resource })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/users/1");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap().unwrap(), "abc.def.ghi");

        assert!(bearer_token(&parts_with(None)).is_none());
        assert!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))).is_none());
    }

    #[test]
    fn test_ensure_owner() {
        let user = CurrentUser {
            id: 5,
            email: "owner@example.com".to_string(),
        };

        assert!(user.ensure_owner(5, Operation::Update, Resource::Ad).is_ok());
        assert!(matches!(
            user.ensure_owner(6, Operation::Delete, Resource::User),
            Err(Error::Forbidden {
                action: Operation::Delete,
                resource: Resource::User
            })
        ));
    }
}
