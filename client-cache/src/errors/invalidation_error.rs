use std::{borrow::Cow, fmt};

use crate::{PushKind, Value};

/// Describes an invalidation push whose payload could not be decoded.
///
/// The cache drops such pushes after logging them; the error is surfaced only
/// to callers that decode pushes through
/// [`CacheManager::parse_invalidation`](crate::caching::CacheManager::parse_invalidation).
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidationError {
    pub(crate) kind: PushKind,
    pub(crate) description: Cow<'static, str>,
}

impl InvalidationError {
    pub(crate) fn new(kind: &PushKind, description: impl Into<Cow<'static, str>>) -> Self {
        InvalidationError {
            kind: kind.clone(),
            description: description.into(),
        }
    }

    pub(crate) fn unexpected_value(kind: &PushKind, value: &Value) -> Self {
        Self::new(kind, format!("unexpected payload {value:?}"))
    }

    /// The push kind the rejected payload arrived with.
    pub fn push_kind(&self) -> &PushKind {
        &self.kind
    }
}

impl fmt::Display for InvalidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed `{}` push - ", self.kind)?;
        self.description.fmt(f)
    }
}

impl std::error::Error for InvalidationError {}
