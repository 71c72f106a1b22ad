//! Per-request context handed to every handler.

use serde::{Deserialize, Serialize};
use tracing::Span;

/// Authenticated caller, as established by an auth handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub token: String,
    pub value: serde_json::Value,
}

/// Audit trail for a request: where to log and on whose behalf.
#[derive(Debug, Clone)]
pub struct Auditor {
    pub span: Span,
    pub identity: Option<Identity>,
}

/// Values carried alongside a request through the handler chain.
///
/// Wrappers derive child contexts with the `with_*` builders; the parent is
/// never mutated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    span: Span,
    token: Option<String>,
    identity: Option<Identity>,
    auditor: Option<Auditor>,
}

impl RequestContext {
    /// Empty context bound to the current span.
    pub fn new() -> Self {
        Self {
            span: Span::current(),
            token: None,
            identity: None,
            auditor: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_auditor(mut self, auditor: Auditor) -> Self {
        self.auditor = Some(auditor);
        self
    }

    /// Span request-scoped events should be recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn auditor(&self) -> Option<&Auditor> {
        self.auditor.as_ref()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Run every setup function in order and collect the errors they raise.
pub fn setup<I, F, E>(funcs: I) -> Vec<E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Result<(), E>,
{
    funcs.into_iter().filter_map(|f| f().err()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_do_not_touch_the_parent() {
        let parent = RequestContext::new().with_token("abc");
        let identity = Identity {
            token: "abc".into(),
            value: serde_json::json!({ "user": "mock" }),
        };
        let child = parent.clone().with_identity(identity.clone());

        assert_eq!(parent.token(), Some("abc"));
        assert!(parent.identity().is_none());
        assert_eq!(child.identity(), Some(&identity));
        assert!(child.auditor().is_none());
    }

    #[test]
    fn auditor_carries_identity() {
        let identity = Identity {
            token: "t".into(),
            value: serde_json::Value::Null,
        };
        let cx = RequestContext::new().with_auditor(Auditor {
            span: Span::none(),
            identity: Some(identity),
        });

        let auditor = cx.auditor().unwrap();
        assert_eq!(auditor.identity.as_ref().unwrap().token, "t");
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("Basic Zm9vOmJhcg=="), None);
    }

    #[test]
    fn setup_collects_every_error() {
        let funcs: Vec<Box<dyn FnOnce() -> Result<(), String>>> = vec![
            Box::new(|| Ok(())),
            Box::new(|| Err("first".to_string())),
            Box::new(|| Ok(())),
            Box::new(|| Err("second".to_string())),
        ];

        assert_eq!(setup(funcs), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn setup_without_failures_is_empty() {
        let errs: Vec<String> = setup(vec![|| Ok(())]);
        assert!(errs.is_empty());
    }
}
