mod users;

pub use users::*;

use std::sync::Arc;

use async_trait::async_trait;
use iam_result::{context::Context, errors::DBError};

use crate::{DatabaseSql, ReferenceSqlDb};

pub trait AbstractDatabaseSql: Sync + Send + UsersRepository {}

impl AbstractDatabaseSql for ReferenceSqlDb {}

impl std::ops::Deref for DatabaseSql {
  type Target = dyn AbstractDatabaseSql;

  fn deref(&self) -> &Self::Target {
    match self {
      DatabaseSql::Reference(dummy) => dummy,
    }
  }
}

// Lets callers hold the configured backend as an `Arc<dyn UsersRepository>`
#[async_trait]
impl UsersRepository for DatabaseSql {
  async fn users_create(&self, ctx: Arc<Context>, user: &User) -> Result<(), DBError> {
    (**self).users_create(ctx, user).await
  }

  async fn users_get_by_email(&self, ctx: Arc<Context>, email: &str) -> Result<User, DBError> {
    (**self).users_get_by_email(ctx, email).await
  }

  async fn users_count(&self, ctx: Arc<Context>) -> Result<usize, DBError> {
    (**self).users_count(ctx).await
  }
}

pub trait EnumHelpers: Sized {
  fn to_str(&self) -> &'static str;
  fn from_optional_string(s: Option<String>) -> Option<Self>;
}
