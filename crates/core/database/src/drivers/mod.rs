pub use self::reference_sql::*;

mod reference_sql;

use iam_config::config;

pub enum DatabaseInfoSql {
  /// Pick the store from the `database.backend` setting
  Auto,
  /// Use the in memory store
  Reference,
}

/// Database
#[derive(Debug)]
pub enum DatabaseSql {
  /// In memory database
  Reference(ReferenceSqlDb),
}

impl DatabaseInfoSql {
  fn from_test_env(test_db: &str) -> Result<DatabaseInfoSql, String> {
    match test_db {
      "REFERENCE" => Ok(DatabaseInfoSql::Reference),
      other => Err(format!("`TEST_DB_SQL` must be REFERENCE, got `{}`", other)),
    }
  }

  /// Turns `Auto` into a concrete backend, `TEST_DB_SQL` wins over the config
  async fn resolve(self) -> Result<DatabaseInfoSql, String> {
    match self {
      DatabaseInfoSql::Auto => {
        if let Ok(test_db) = std::env::var("TEST_DB_SQL") {
          return Self::from_test_env(&test_db);
        }

        match config().await.database.backend.as_str() {
          "reference" | "" => Ok(DatabaseInfoSql::Reference),
          other => Err(format!("unsupported database backend: {}", other)),
        }
      }
      DatabaseInfoSql::Reference => Ok(DatabaseInfoSql::Reference),
    }
  }

  /// Create a database client from the given database information
  pub async fn connect(self) -> Result<DatabaseSql, String> {
    match self.resolve().await? {
      DatabaseInfoSql::Reference => Ok(DatabaseSql::Reference(Default::default())),
      _ => Err("database information did not resolve to a backend".to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use iam_result::context::Context;

  use super::*;
  use crate::{Role, User, UsersRepository};

  #[tokio::test]
  async fn test_reference_connects_empty() {
    let db = DatabaseInfoSql::Reference.connect().await.unwrap();
    let DatabaseSql::Reference(reference) = &db;
    assert!(reference.users.lock().await.is_empty());
  }

  #[test]
  fn test_unknown_test_backend_is_rejected() {
    assert!(DatabaseInfoSql::from_test_env("POSTGRES").is_err());
    assert!(matches!(DatabaseInfoSql::from_test_env("REFERENCE"), Ok(DatabaseInfoSql::Reference)));
  }

  #[tokio::test]
  async fn test_connected_database_serves_users() {
    let db: Arc<dyn UsersRepository> =
      Arc::new(DatabaseInfoSql::Reference.connect().await.unwrap());
    let ctx = Arc::new(Context::default());
    let user = User {
      id: "01J9Z3V4M8Q2W6E7R5T1Y0U9I8".into(),
      email: "email@gmail.com".into(),
      role: Role::Admin,
      verified: false,
      created_at: 1,
      updated_at: 1,
    };

    db.users_create(ctx.clone(), &user).await.unwrap();

    assert_eq!(db.users_count(ctx.clone()).await.unwrap(), 1);
    assert_eq!(db.users_get_by_email(ctx, "email@gmail.com").await.unwrap().id, user.id);
  }
}
