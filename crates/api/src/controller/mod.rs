mod response;
mod router;
pub mod users;

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hyper::{body::Incoming, server::conn::http1::Builder, service::service_fn, Request};
use hyper_util::rt::tokio::TokioIo;
use iam_config::Settings;
use iam_result::errors::BoxedErr;
use tokio::{net::TcpListener, signal::ctrl_c, spawn};
use tracing::{debug, error, info};

use crate::{
  controller::users::users_create::UsersCreateHandler, server::observability::MetricsCollector,
  service::UserCreator,
};

pub use response::text_response;

pub struct ApiControllerArgs {
  pub config: Arc<Settings>,
  pub users_creator: Arc<dyn UserCreator>,
  pub metrics: Arc<MetricsCollector>,
}

pub struct ApiController {
  pub(super) config: Arc<Settings>,
  pub(super) metrics: Arc<MetricsCollector>,
  users_create: UsersCreateHandler,
  request_timeout: Option<Duration>,
}

impl ApiController {
  pub fn new(args: ApiControllerArgs) -> ApiController {
    let request_timeout = args.config.api.request_timeout_ms.map(Duration::from_millis);
    let users_create = UsersCreateHandler::new(args.users_creator, args.metrics.clone());

    ApiController { config: args.config, metrics: args.metrics, users_create, request_timeout }
  }

  /// Binds `hosts.api` and serves until Ctrl+C
  pub async fn run(self) -> Result<(), BoxedErr> {
    let url = self.config.hosts.api.clone();
    let listener = TcpListener::bind(&url).await?;
    info!("the api server is listening on: {}", listener.local_addr()?);

    self
      .serve(listener, async {
        if let Err(err) = ctrl_c().await {
          error!("Error waiting for ctrl_c: {}", err);
        }
      })
      .await
  }

  /// Accepts connections on `listener` until `shutdown` resolves, each connection is served on
  /// its own task
  pub async fn serve(
    self,
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
  ) -> Result<(), BoxedErr> {
    let controller = Arc::new(self);
    tokio::pin!(shutdown);

    loop {
      let (socket, remote) = tokio::select! {
        accepted = listener.accept() => match accepted {
          Ok(accepted) => accepted,
          Err(err) => {
            error!("failed to accept connection: {}", err);
            continue;
          }
        },
        _ = &mut shutdown => {
          info!("Shutdown signal received, the api server stops accepting connections");
          return Ok(());
        }
      };

      let io = TokioIo::new(socket);
      let connection_controller = controller.clone();

      spawn(async move {
        let svc = service_fn(move |req: Request<Incoming>| {
          let request_controller = connection_controller.clone();
          async move { Ok::<_, Infallible>(request_controller.route(req).await) }
        });

        if let Err(err) = Builder::new().serve_connection(io, svc).await {
          debug!("Error serving connection from {}: {}", remote, err);
        }
      });
    }
  }
}
