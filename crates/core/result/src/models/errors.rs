use std::{error::Error, fmt, sync::Arc};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::context::{Context, ContextError};

pub type BoxedErr = Box<dyn Error + Sync + Send>;
pub type OptionalErr = Option<BoxedErr>;

pub const ERROR_ID_CANCELED: &str = "error.canceled";
pub const ERROR_ID_DEADLINE_EXCEEDED: &str = "error.deadline_exceeded";
pub const ERROR_ID_INTERNAL: &str = "error.internal";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ThisError)]
pub enum ErrorType {
  #[error("Resource not found")]
  NotFound,

  // Existence & uniqueness
  #[error("Unique constraint violation")]
  UniqueViolation,
  #[error("Resource already exists")]
  ResourceExists,

  // Database errors
  #[error("Database error during {operation} on {collection}")]
  DatabaseError { operation: String, collection: String },
  #[error("Database connection error")]
  DBConnectionError,

  #[error("Internal error")]
  InternalError,
  #[error("Configuration error")]
  ConfigError,

  // Task & async errors
  #[error("Operation canceled")]
  Canceled,
  #[error("Operation timed out")]
  TimedOut,
}

impl From<ContextError> for ErrorType {
  fn from(value: ContextError) -> Self {
    match value {
      ContextError::Canceled => ErrorType::Canceled,
      ContextError::DeadlineExceeded => ErrorType::TimedOut,
    }
  }
}

#[derive(Debug)]
pub struct DBError {
  pub err_type: ErrorType,
  pub err: BoxedErr,
  pub msg: String,
  pub path: String,
}

impl Default for DBError {
  fn default() -> Self {
    Self {
      err_type: ErrorType::DatabaseError { operation: String::new(), collection: String::new() },
      err: Box::new(std::io::Error::other("Database error")),
      msg: String::new(),
      path: String::new(),
    }
  }
}

impl fmt::Display for DBError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut parts = Vec::new();

    if !self.path.is_empty() {
      parts.push(format!("path: {}", self.path));
    }
    parts.push(format!("err_type: {}", self.err_type));
    if !self.msg.is_empty() {
      parts.push(format!("msg: {}", self.msg));
    }
    parts.push(format!("err: {}", self.err));

    write!(f, "{}", parts.join(", "))
  }
}

impl Error for DBError {}

#[derive(Debug)]
pub struct SimpleError {
  pub message: String,
  pub _type: ErrorType,
  pub err: BoxedErr,
}

impl fmt::Display for SimpleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self._type, self.message)
  }
}

impl Error for SimpleError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    Some(self.err.as_ref())
  }
}

/// Infrastructure failure, `temp` marks errors worth retrying later
#[derive(Debug, ThisError)]
#[error("{path}: {err_type}: {msg}: {err}")]
pub struct InternalError {
  pub err_type: ErrorType,
  pub temp: bool,
  #[source]
  pub err: BoxedErr,
  pub msg: String,
  pub path: String,
}

#[derive(Debug, Default)]
pub struct AppErrorErrors {
  pub err: OptionalErr,
}

/// Error returned by application services.
///
/// `id` is a stable machine readable key (e.g. `users.email.invalid`), `status_code` is the
/// HTTP status a richer transport could map it to. `details` and the wrapped error are meant for
/// logs only.
#[derive(Debug)]
pub struct AppError {
  pub ctx: Arc<Context>,
  pub id: String,
  pub path: String,
  pub details: String,
  pub status_code: StatusCode,
  pub errors: Option<AppErrorErrors>,
}

impl AppError {
  pub fn new(
    ctx: Arc<Context>,
    path: impl Into<String>,
    id: impl Into<String>,
    details: impl Into<String>,
    status_code: StatusCode,
    errors: Option<AppErrorErrors>,
  ) -> Self {
    Self {
      ctx,
      id: id.into(),
      path: path.into(),
      details: details.into(),
      status_code,
      errors: Some(errors.unwrap_or_default()),
    }
  }

  /// Builds the error a service returns when its context is done
  pub fn from_context(ctx: Arc<Context>, path: impl Into<String>, err: ContextError) -> Self {
    let (id, status_code) = match err {
      ContextError::Canceled => (ERROR_ID_CANCELED, StatusCode::REQUEST_TIMEOUT),
      ContextError::DeadlineExceeded => (ERROR_ID_DEADLINE_EXCEEDED, StatusCode::GATEWAY_TIMEOUT),
    };

    AppError::new(ctx, path, id, "", status_code, None).wrap(Box::new(err))
  }

  pub fn error_string(&self) -> String {
    let mut s = String::new();

    if !self.path.is_empty() {
      s.push_str(&self.path);
      s.push_str(": ");
    }

    s.push_str(&self.id);

    if !self.details.is_empty() {
      s.push_str(&format!(", {}", self.details));
    }

    if let Some(err) = self.errors.as_ref().and_then(|e| e.err.as_ref()) {
      s.push_str(&format!(", {}", err));
    }

    s
  }

  pub fn unwrap(&self) -> Option<&(dyn Error + Send + Sync)> {
    self.errors.as_ref().and_then(|e| e.err.as_deref())
  }

  pub fn wrap(mut self, err: BoxedErr) -> Self {
    if let Some(errors) = &mut self.errors {
      errors.err = Some(err);
    } else {
      self.errors = Some(AppErrorErrors { err: Some(err) });
    }
    self
  }
}

impl fmt::Display for AppError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.error_string())
  }
}

impl Error for AppError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    self.errors.as_ref().and_then(|e| e.err.as_ref()).map(|e| e.as_ref() as &(dyn Error + 'static))
  }
}
