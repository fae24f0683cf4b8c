use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hyper::StatusCode;
use iam_database::{Role, User};
use iam_result::{context::Context, errors::AppError};
use serde_json::{json, Value};
use ulid::Ulid;
use validator::ValidateEmail;

const EMAIL_MAX_LEN: usize = 255;

/// Checks the inputs of a user creation and returns the parsed role
pub fn users_create_validate(
  ctx: Arc<Context>,
  path: &str,
  email: &str,
  role: &str,
  allowed_roles: &[Role],
) -> Result<Role, AppError> {
  let ae = |id: &str, details: String| {
    AppError::new(ctx.clone(), path, id, details, StatusCode::BAD_REQUEST, None)
  };

  // Validate email
  let email = email.trim().to_string();
  if email.is_empty() {
    return Err(ae("users.email.required", String::new()));
  }
  if email.len() > EMAIL_MAX_LEN {
    return Err(ae("users.email.too_long", format!("{} bytes", email.len())));
  }
  if !email.validate_email() {
    return Err(ae("users.email.invalid", email));
  }

  // Validate role
  let parsed = role.parse::<Role>().map_err(|err| ae("users.role.invalid", err))?;
  if !allowed_roles.contains(&parsed) {
    return Err(ae("users.role.not_allowed", parsed.to_string()));
  }

  Ok(parsed)
}

/// Populates a new User, generates the id and sets timestamps.
/// Emails are stored trimmed and lowercased.
pub fn users_create_pre_save(email: &str, role: Role) -> User {
  let now_millis =
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;

  User {
    id: Ulid::new().to_string(),
    email: email.trim().to_lowercase(),
    role,
    verified: false,
    created_at: now_millis,
    updated_at: now_millis,
  }
}

// create an auditable record of the saved user
pub fn users_create_auditable(user: &User) -> Value {
  json!({ "id": user.id, "email": user.email, "role": user.role })
}
