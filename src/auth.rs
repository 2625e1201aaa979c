//! Request-scoped caller identity
//!
//! The bearer token from an HTTP request is captured into a [`RequestContext`]
//! that is passed explicitly through dispatch into handlers. Tokens are stored
//! for handlers to use, never validated.

use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::errors::ToolError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    bearer_token: Option<String>,
}

impl RequestContext {
    /// Context for callers without credentials (the stream transport, tests).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_bearer_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            bearer_token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn require_bearer_token(&self) -> Result<&str, ToolError> {
        self.bearer_token().ok_or(ToolError::NotAuthenticated)
    }
}

/// Builds the context for one HTTP request.
///
/// A missing header, a non-`Bearer` scheme, or an empty token all yield an
/// anonymous context rather than a rejection.
pub fn context_from_authorization(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> RequestContext {
    match auth_header {
        Ok(TypedHeader(auth)) => RequestContext::with_bearer_token(auth.token()),
        Err(_) => RequestContext::anonymous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_treated_as_absent() {
        assert_eq!(RequestContext::with_bearer_token("   ").bearer_token(), None);
        assert_eq!(
            RequestContext::with_bearer_token(" abc ").bearer_token(),
            Some("abc")
        );
    }

    #[test]
    fn anonymous_context_requires_token() {
        let err = RequestContext::anonymous()
            .require_bearer_token()
            .expect_err("anonymous callers have no token");
        assert!(matches!(err, ToolError::NotAuthenticated));
    }
}
