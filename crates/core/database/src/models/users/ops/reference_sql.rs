use std::sync::Arc;

use async_trait::async_trait;
use iam_result::{
  context::Context,
  errors::{DBError, ErrorType},
};

use crate::{ReferenceSqlDb, User, UsersRepository};

#[async_trait()]
impl UsersRepository for ReferenceSqlDb {
  async fn users_create(&self, _ctx: Arc<Context>, user: &User) -> Result<(), DBError> {
    let mut users = self.users.lock().await;
    let path = "database.users.users_create".to_string();

    if users.contains_key(&user.id) {
      let msg = "user id already exists".to_string();
      return Err(DBError { err_type: ErrorType::ResourceExists, msg, path, ..Default::default() });
    }

    if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
      let msg = "user email already exists".to_string();
      return Err(DBError { err_type: ErrorType::ResourceExists, msg, path, ..Default::default() });
    }

    users.insert(user.id.to_string(), user.clone());
    Ok(())
  }

  async fn users_get_by_email(&self, _ctx: Arc<Context>, email: &str) -> Result<User, DBError> {
    let users = self.users.lock().await;
    let path = "database.users.users_get_by_email".to_string();
    let user = users.values().find(|u| u.email.eq_ignore_ascii_case(email));

    match user {
      Some(user) => Ok(user.clone()),
      None => {
        let msg = "user is not exists".to_string();
        Err(DBError { err_type: ErrorType::NotFound, msg, path, ..Default::default() })
      }
    }
  }

  async fn users_count(&self, _ctx: Arc<Context>) -> Result<usize, DBError> {
    Ok(self.users.lock().await.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Role;

  fn user(id: &str, email: &str) -> User {
    User {
      id: id.to_string(),
      email: email.to_string(),
      role: Role::Member,
      verified: false,
      created_at: 0,
      updated_at: 0,
    }
  }

  #[tokio::test]
  async fn test_users_create_then_get() {
    let db = ReferenceSqlDb::default();
    let ctx = Arc::new(Context::default());

    db.users_create(ctx.clone(), &user("1", "a@example.com")).await.unwrap();

    let found = db.users_get_by_email(ctx.clone(), "A@Example.com").await.unwrap();
    assert_eq!(found.id, "1");
    assert_eq!(db.users_count(ctx).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_duplicate_email_is_rejected() {
    let db = ReferenceSqlDb::default();
    let ctx = Arc::new(Context::default());

    db.users_create(ctx.clone(), &user("1", "a@example.com")).await.unwrap();
    let err = db.users_create(ctx.clone(), &user("2", "A@EXAMPLE.COM")).await.unwrap_err();

    assert_eq!(err.err_type, ErrorType::ResourceExists);
    assert!(err.msg.contains("email"));
    assert_eq!(db.users_count(ctx).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_duplicate_id_is_rejected() {
    let db = ReferenceSqlDb::default();
    let ctx = Arc::new(Context::default());

    db.users_create(ctx.clone(), &user("1", "a@example.com")).await.unwrap();
    let err = db.users_create(ctx, &user("1", "b@example.com")).await.unwrap_err();

    assert_eq!(err.err_type, ErrorType::ResourceExists);
    assert!(err.msg.contains("id"));
  }

  #[tokio::test]
  async fn test_get_missing_user() {
    let db = ReferenceSqlDb::default();
    let err = db.users_get_by_email(Arc::new(Context::default()), "x@example.com").await;

    assert_eq!(err.unwrap_err().err_type, ErrorType::NotFound);
  }

  #[tokio::test]
  async fn test_concurrent_creates_of_same_email_yield_one_user() {
    let db = Arc::new(ReferenceSqlDb::default());

    let handles: Vec<_> = (0..16)
      .map(|i| {
        let db = db.clone();
        tokio::spawn(async move {
          let ctx = Arc::new(Context::default());
          db.users_create(ctx, &user(&i.to_string(), "same@example.com")).await.is_ok()
        })
      })
      .collect();

    let mut created = 0;
    for handle in handles {
      if handle.await.unwrap() {
        created += 1;
      }
    }

    assert_eq!(created, 1);
  }
}
