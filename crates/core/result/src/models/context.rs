use std::time::Duration;

use thiserror::Error as ThisError;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ContextError {
  #[error("context canceled")]
  Canceled,
  #[error("context deadline exceeded")]
  DeadlineExceeded,
}

/// Per request data, built from the inbound headers and forwarded to every downstream call.
///
/// Cloning a context shares its cancellation token, cancelling one clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct Context {
  pub request_id: String,
  pub ip_address: String,
  pub x_forwarded_for: String,
  pub path: String,
  pub user_agent: String,
  pub accept_language: String,
  pub timezone: String,
  cancel: CancellationToken,
  deadline: Option<Instant>,
}

impl Context {
  pub fn new(
    request_id: String,
    ip_address: String,
    x_forwarded_for: String,
    path: String,
    user_agent: String,
    accept_language: String,
    timezone: String,
  ) -> Self {
    Self {
      request_id,
      ip_address,
      x_forwarded_for,
      path,
      user_agent,
      accept_language,
      timezone,
      cancel: CancellationToken::new(),
      deadline: None,
    }
  }

  pub fn with_deadline(mut self, deadline: Instant) -> Self {
    self.deadline = Some(match self.deadline {
      Some(current) if current < deadline => current,
      _ => deadline,
    });
    self
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    self.with_deadline(Instant::now() + timeout)
  }

  pub fn accept_language(&self) -> &str {
    &self.accept_language
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  /// Cancels the context once the returned guard is dropped, unless it is disarmed first
  pub fn cancel_on_drop(&self) -> DropGuard {
    self.cancel.clone().drop_guard()
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }

  /// Returns why the context is done, `None` while it is still live
  pub fn err(&self) -> Option<ContextError> {
    if self.cancel.is_cancelled() {
      return Some(ContextError::Canceled);
    }

    match self.deadline {
      Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
      _ => None,
    }
  }

  /// Resolves once the context is cancelled or its deadline passes
  pub async fn done(&self) -> ContextError {
    match self.deadline {
      Some(deadline) => {
        tokio::select! {
          _ = self.cancel.cancelled() => ContextError::Canceled,
          _ = sleep_until(deadline) => ContextError::DeadlineExceeded,
        }
      }
      None => {
        self.cancel.cancelled().await;
        ContextError::Canceled
      }
    }
  }
}
