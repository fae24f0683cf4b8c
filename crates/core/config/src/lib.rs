use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use cached::proc_macro::cached;
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Database {
  /// Which users store to connect to, only `reference` is built in
  pub backend: String,
}

impl Default for Database {
  fn default() -> Self {
    Self { backend: "reference".to_string() }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Hosts {
  pub api: String,
  pub api_metrics: String,
}

impl Default for Hosts {
  fn default() -> Self {
    Self { api: "127.0.0.1:3001".to_string(), api_metrics: "127.0.0.1:9101".to_string() }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Api {
  /// Upper bound for a single request, forwarded downstream as the context deadline.
  /// Unset means the request runs until the client goes away.
  pub request_timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Users {
  pub allowed_roles: Vec<String>,
}

impl Default for Users {
  fn default() -> Self {
    Self {
      allowed_roles: vec!["admin".to_string(), "member".to_string(), "viewer".to_string()],
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
  pub database: Database,
  pub hosts: Hosts,
  pub api: Api,
  pub users: Users,
  pub production: bool,
}

impl Settings {
  pub fn from_yaml(content: &str) -> Result<Settings, serde_yaml::Error> {
    serde_yaml::from_str(content)
  }

  pub fn preflight_checks(&self) {
    if self.users.allowed_roles.is_empty() {
      warn!("No allowed roles configured! Every user creation will be rejected.");
    }

    if self.api.request_timeout_ms == Some(0) {
      warn!("api.request_timeout_ms is 0, requests will expire immediately.");
    }
  }
}

/// Resolves the settings file, `IAM_CONFIG` wins over the `/iam.{ENV}.yaml` convention
fn settings_path() -> String {
  resolve_settings_path(env::var("IAM_CONFIG").ok(), env::var("ENV").ok())
}

fn resolve_settings_path(iam_config: Option<String>, env_mode: Option<String>) -> String {
  if let Some(path) = iam_config.filter(|p| !p.is_empty()) {
    return path;
  }

  format!("/iam.{}.yaml", env_mode.unwrap_or("dev".to_string()))
}

fn load_settings(path: &str) -> Settings {
  if !Path::new(path).exists() {
    return Settings::default();
  }

  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(err) => {
      warn!("failed to read config file {}: {}, using defaults", path, err);
      return Settings::default();
    }
  };

  match Settings::from_yaml(&content) {
    Ok(settings) => settings,
    Err(err) => {
      warn!("failed to parse config file {}: {}, using defaults", path, err);
      Settings::default()
    }
  }
}

/// Configuration builder
static CONFIG_BUILDER: Lazy<RwLock<Settings>> =
  Lazy::new(|| RwLock::new(load_settings(&settings_path())));

pub async fn read() -> Settings {
  CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 300)]
pub async fn config() -> Settings {
  let mut config = read().await;

  // auto-detect production nodes
  if !config.hosts.api.starts_with("127.0.0.1") && !config.hosts.api.starts_with("localhost") {
    config.production = true;
  }

  config
}
