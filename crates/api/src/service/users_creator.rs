use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use hyper::StatusCode;
use iam_database::{Role, UsersRepository};
use iam_result::{
  context::Context,
  errors::{AppError, AppErrorErrors, ErrorType, ERROR_ID_INTERNAL},
};
use tracing::{info, warn};

use crate::{
  models::users::users_create::{
    users_create_auditable, users_create_pre_save, users_create_validate,
  },
  server::observability::MetricsCollector,
};

/// Creates users. Shared by every in-flight request, so implementations must be safe for
/// concurrent use and should honor the context's cancellation.
#[async_trait]
pub trait UserCreator: Send + Sync {
  async fn add_new_user(&self, ctx: Arc<Context>, email: &str, role: &str) -> Result<(), AppError>;
}

pub struct UserCreatorArgs {
  pub store: Arc<dyn UsersRepository>,
  pub allowed_roles: Vec<String>,
  pub metrics: Arc<MetricsCollector>,
}

pub struct DefaultUserCreator {
  store: Arc<dyn UsersRepository>,
  allowed_roles: Vec<Role>,
  metrics: Arc<MetricsCollector>,
}

impl DefaultUserCreator {
  pub fn new(args: UserCreatorArgs) -> Self {
    let mut allowed_roles = Vec::with_capacity(args.allowed_roles.len());
    for name in &args.allowed_roles {
      match name.parse::<Role>() {
        Ok(role) if !allowed_roles.contains(&role) => allowed_roles.push(role),
        Ok(_) => {}
        Err(err) => warn!("ignoring configured role: {}", err),
      }
    }

    Self { store: args.store, allowed_roles, metrics: args.metrics }
  }
}

#[async_trait]
impl UserCreator for DefaultUserCreator {
  async fn add_new_user(&self, ctx: Arc<Context>, email: &str, role: &str) -> Result<(), AppError> {
    let path = "api.service.users_creator.add_new_user";

    if let Some(err) = ctx.err() {
      return Err(AppError::from_context(ctx.clone(), path, err));
    }

    let role = users_create_validate(ctx.clone(), path, email, role, &self.allowed_roles)?;
    let user = users_create_pre_save(email, role);

    let db_start = Instant::now();
    self.metrics.record_db_operation("users_create");

    let db_res = tokio::select! {
      biased;
      err = ctx.done() => {
        let db_duration = db_start.elapsed().as_secs_f64();
        self.metrics.observe_db_operation_duration("users_create", db_duration);
        self.metrics.record_db_error("users_create", &ErrorType::from(err).to_string());
        return Err(AppError::from_context(ctx.clone(), path, err));
      }
      res = self.store.users_create(ctx.clone(), &user) => res,
    };

    let db_duration = db_start.elapsed().as_secs_f64();
    self.metrics.observe_db_operation_duration("users_create", db_duration);

    if let Err(err) = db_res {
      self.metrics.record_db_error("users_create", &err.err_type.to_string());
      let err_to_return = match err.err_type {
        ErrorType::ResourceExists | ErrorType::UniqueViolation => AppError::new(
          ctx.clone(),
          path,
          "users.email.already_exists",
          err.msg.clone(),
          StatusCode::CONFLICT,
          None,
        ),
        _ => {
          let errors = Some(AppErrorErrors { err: Some(Box::new(err)) });
          AppError::new(
            ctx.clone(),
            path,
            ERROR_ID_INTERNAL,
            "",
            StatusCode::INTERNAL_SERVER_ERROR,
            errors,
          )
        }
      };
      return Err(err_to_return);
    }

    info!(
      target: "audit",
      request_id = %ctx.request_id,
      event = "users_create",
      data = %users_create_auditable(&user),
      "user created"
    );

    Ok(())
  }
}
