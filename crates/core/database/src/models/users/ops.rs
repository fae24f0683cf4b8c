mod reference_sql;

use std::sync::Arc;

use async_trait::async_trait;
use iam_result::{context::Context, errors::DBError};

use crate::User;

#[async_trait]
pub trait UsersRepository: Sync + Send {
  /// Insert a new user into database, ids and emails are unique
  async fn users_create(&self, ctx: Arc<Context>, user: &User) -> Result<(), DBError>;
  async fn users_get_by_email(&self, ctx: Arc<Context>, email: &str) -> Result<User, DBError>;
  async fn users_count(&self, ctx: Arc<Context>) -> Result<usize, DBError>;
}
