/*! Error types for axwalk operations. */

use serde::Serialize;

use crate::a11y::ActionKind;
use crate::platform::BridgeError;

/// Errors that can occur during axwalk operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AxError {
  #[error("Accessibility permissions not granted")]
  PermissionDenied,

  #[error("Element invalidated: {0}")]
  ElementInvalidated(String),

  #[error("Transient accessibility failure: {0}")]
  Transient(String),

  #[error("Accessibility request failed: {0}")]
  BridgeFailure(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Action '{action}' failed: {reason}")]
  ActionFailed { action: ActionKind, reason: String },

  #[error("Operation cancelled")]
  Cancelled,

  #[error("Internal error: {0}")]
  Internal(String),

  #[error("{context}: {source}")]
  Context {
    context: String,
    #[source]
    source: Box<AxError>,
  },
}

/// Stable error codes for upper layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  #[display("ACCESSIBILITY_DENIED")]
  AccessibilityDenied,
  #[display("ACCESSIBILITY_FAILED")]
  AccessibilityFailed,
  #[display("ELEMENT_INVALIDATED")]
  ElementInvalidated,
  #[display("INVALID_INPUT")]
  InvalidInput,
  #[display("ACTION_FAILED")]
  ActionFailed,
  #[display("CONTEXT_CANCELED")]
  ContextCanceled,
  #[display("INTERNAL")]
  Internal,
}

impl AxError {
  /// Wrap with call-site context. The code of the wrapped error is preserved.
  #[must_use]
  pub fn context(self, context: impl Into<String>) -> Self {
    Self::Context {
      context: context.into(),
      source: Box::new(self),
    }
  }

  /// Innermost error, skipping context wrappers.
  pub fn root(&self) -> &Self {
    match self {
      Self::Context { source, .. } => source.root(),
      other => other,
    }
  }

  pub fn code(&self) -> ErrorCode {
    match self.root() {
      Self::PermissionDenied => ErrorCode::AccessibilityDenied,
      Self::Transient(_) | Self::BridgeFailure(_) => ErrorCode::AccessibilityFailed,
      Self::ElementInvalidated(_) => ErrorCode::ElementInvalidated,
      Self::InvalidInput(_) => ErrorCode::InvalidInput,
      Self::ActionFailed { .. } => ErrorCode::ActionFailed,
      Self::Cancelled => ErrorCode::ContextCanceled,
      Self::Internal(_) | Self::Context { .. } => ErrorCode::Internal,
    }
  }

  /// Errors that only invalidate the element they were raised for.
  pub fn is_skippable(&self) -> bool {
    matches!(
      self.root(),
      Self::ElementInvalidated(_) | Self::Transient(_)
    )
  }

  pub fn is_retryable(&self) -> bool {
    matches!(self.root(), Self::Transient(_))
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self.root(), Self::Cancelled)
  }
}

impl From<BridgeError> for AxError {
  fn from(err: BridgeError) -> Self {
    match err {
      BridgeError::PermissionDenied => Self::PermissionDenied,
      BridgeError::ElementInvalidated => {
        Self::ElementInvalidated("element no longer exists".to_string())
      }
      BridgeError::Transient(reason) => Self::Transient(reason),
      BridgeError::Failed(reason) => Self::BridgeFailure(reason),
    }
  }
}

/// Result type for axwalk operations.
pub type AxResult<T> = Result<T, AxError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn context_preserves_code() {
    let err = AxError::from(BridgeError::Failed("no window".into()))
      .context("failed to get elements from frontmost window");
    assert_eq!(err.code(), ErrorCode::AccessibilityFailed);
    assert_eq!(
      err.to_string(),
      "failed to get elements from frontmost window: Accessibility request failed: no window"
    );
  }

  #[test]
  fn skippable_and_retryable() {
    assert!(AxError::from(BridgeError::ElementInvalidated).is_skippable());
    assert!(AxError::from(BridgeError::Transient("busy".into())).is_retryable());
    assert!(!AxError::PermissionDenied.is_skippable());
    assert!(!AxError::BridgeFailure("x".into()).is_retryable());
    assert!(AxError::Cancelled.context("frontmost").is_cancelled());
  }

  #[test]
  fn codes_render_as_stable_strings() {
    assert_eq!(AxError::PermissionDenied.code().to_string(), "ACCESSIBILITY_DENIED");
    assert_eq!(AxError::Cancelled.code().to_string(), "CONTEXT_CANCELED");
    assert_eq!(
      serde_json::to_value(ErrorCode::InvalidInput).unwrap(),
      "INVALID_INPUT"
    );
  }
}
