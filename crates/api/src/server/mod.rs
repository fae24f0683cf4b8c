pub mod observability;

use std::io::ErrorKind;
use std::sync::Arc;

use iam_config::{config, Settings};
use iam_database::{DatabaseInfoSql, DatabaseSql, UsersRepository};
use iam_result::errors::{BoxedErr, ErrorType, SimpleError};
use tracing::error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

use crate::{
  controller::{ApiController, ApiControllerArgs},
  server::observability::{MetricsCollector, MetricsCollectorArgs},
  service::{DefaultUserCreator, UserCreatorArgs},
};

#[derive(Debug)]
pub struct ApiServer {
  pub(super) sql_db: Arc<DatabaseSql>,
  pub(super) config: Arc<Settings>,
  pub(super) metrics: Arc<MetricsCollector>,
}

impl ApiServer {
  pub async fn new() -> Result<ApiServer, BoxedErr> {
    let se = |err: BoxedErr, typ: ErrorType, msg: &str| SimpleError {
      err,
      _type: typ,
      message: msg.to_string(),
    };

    setup_logging()
      .map_err(|err| se(err, ErrorType::ConfigError, "failed to set tracing subscriber"))?;
    let config = config().await;
    config.preflight_checks();
    let config = Arc::new(config);

    let sql_db = DatabaseInfoSql::Auto.connect().await.map_err(|err| {
      let err = Box::new(std::io::Error::new(ErrorKind::NotConnected, err));
      se(err, ErrorType::DBConnectionError, "failed to connect to the users store")
    })?;

    let metrics = MetricsCollector::new(MetricsCollectorArgs { config: config.clone() })?;

    Ok(ApiServer { sql_db: Arc::new(sql_db), config, metrics: Arc::new(metrics) })
  }

  /// Starts the metrics listener in the background, then serves the api until shutdown
  pub async fn run(&self) -> Result<(), BoxedErr> {
    let metrics = self.metrics.clone();
    tokio::spawn(async move {
      if let Err(err) = metrics.run().await {
        error!("the metrics server stopped: {}", err);
      }
    });

    let store: Arc<dyn UsersRepository> = self.sql_db.clone();
    let users_creator = DefaultUserCreator::new(UserCreatorArgs {
      store,
      allowed_roles: self.config.users.allowed_roles.clone(),
      metrics: self.metrics.clone(),
    });

    let ctr_args = ApiControllerArgs {
      config: self.config.clone(),
      users_creator: Arc::new(users_creator),
      metrics: self.metrics.clone(),
    };
    let controller = ApiController::new(ctr_args);

    controller.run().await // this will block
  }
}

fn setup_logging() -> Result<(), BoxedErr> {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let subscriber =
    tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer());

  tracing::subscriber::set_global_default(subscriber)?;
  Ok(())
}
