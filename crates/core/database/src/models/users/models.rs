use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EnumHelpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Admin,
  Member,
  Viewer,
}

impl EnumHelpers for Role {
  fn to_str(&self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Member => "member",
      Role::Viewer => "viewer",
    }
  }

  fn from_optional_string(s: Option<String>) -> Option<Self> {
    match s.unwrap_or_default().trim().to_lowercase().as_str() {
      "admin" => Some(Role::Admin),
      "member" => Some(Role::Member),
      "viewer" => Some(Role::Viewer),
      _ => None,
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.to_str())
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::from_optional_string(Some(s.to_string())).ok_or_else(|| format!("unknown role: {}", s))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: String,      // VARCHAR(26)
  pub email: String,   // VARCHAR(255) NOT NULL UNIQUE
  pub role: Role,      // VARCHAR(32) NOT NULL
  pub verified: bool,  // BOOLEAN NOT NULL DEFAULT FALSE
  pub created_at: u64, // BIGINT NOT NULL
  pub updated_at: u64, // BIGINT NOT NULL
}
