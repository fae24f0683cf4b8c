use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{
  body::Bytes, server::conn::http1::Builder, service::service_fn, Request, Response, StatusCode,
};
use hyper_util::rt::tokio::TokioIo;
use iam_config::Settings;
use iam_result::errors::{BoxedErr, ErrorType, InternalError};
use prometheus::{CounterVec, HistogramOpts, HistogramVec, IntCounter, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio::spawn;

/// Prometheus metrics collector for API service
#[derive(Clone, Debug)]
pub struct MetricsCollector {
  config: Arc<Settings>,
  registry: Arc<Registry>,
  pub users_create_total: IntCounter,
  pub users_create_failed: IntCounter,
  pub db_operations_total: CounterVec,
  pub db_operations_failed: CounterVec,
  pub request_duration_seconds: HistogramVec,
  pub db_operation_duration_seconds: HistogramVec,
}

pub struct MetricsCollectorArgs {
  pub config: Arc<Settings>,
}

impl MetricsCollector {
  pub fn new(args: MetricsCollectorArgs) -> Result<Self, BoxedErr> {
    let ie = |msg: &str, err: BoxedErr| {
      let path = "api.server.observability".into();
      InternalError { err_type: ErrorType::InternalError, temp: false, err, msg: msg.into(), path }
    };

    let registry = Registry::new();

    // --- Users Metrics ---
    let users_create_total =
      IntCounter::new("api_users_create_total", "Total user creation attempts")
        .map_err(|err| ie("failed to create users_create_total counter", Box::new(err)))?;
    registry
      .register(Box::new(users_create_total.clone()))
      .map_err(|err| ie("failed to register users_create_total", Box::new(err)))?;

    let users_create_failed =
      IntCounter::new("api_users_create_failed_total", "Total failed user creations")
        .map_err(|err| ie("failed to create users_create_failed counter", Box::new(err)))?;
    registry
      .register(Box::new(users_create_failed.clone()))
      .map_err(|err| ie("failed to register users_create_failed", Box::new(err)))?;

    // --- Database Metrics ---
    let db_operations_total = CounterVec::new(
      prometheus::Opts::new("api_db_operations_total", "Total database operations"),
      &["operation"],
    )
    .map_err(|err| ie("failed to create db_operations_total counter", Box::new(err)))?;
    registry
      .register(Box::new(db_operations_total.clone()))
      .map_err(|err| ie("failed to register db_operations_total", Box::new(err)))?;

    let db_operations_failed = CounterVec::new(
      prometheus::Opts::new("api_db_operations_failed_total", "Total failed database operations"),
      &["operation", "error"],
    )
    .map_err(|err| ie("failed to create db_operations_failed counter", Box::new(err)))?;
    registry
      .register(Box::new(db_operations_failed.clone()))
      .map_err(|err| ie("failed to register db_operations_failed", Box::new(err)))?;

    // --- Duration Histograms ---
    let request_duration_seconds = HistogramVec::new(
      HistogramOpts::new("api_request_duration_seconds", "Request duration in seconds"),
      &["endpoint"],
    )
    .map_err(|err| ie("failed to create request_duration histogram", Box::new(err)))?;
    registry
      .register(Box::new(request_duration_seconds.clone()))
      .map_err(|err| ie("failed to register request_duration_seconds", Box::new(err)))?;

    let db_operation_duration_seconds = HistogramVec::new(
      HistogramOpts::new("api_db_operation_duration_seconds", "Database operation duration"),
      &["operation"],
    )
    .map_err(|err| ie("failed to create db_duration histogram", Box::new(err)))?;
    registry
      .register(Box::new(db_operation_duration_seconds.clone()))
      .map_err(|err| ie("failed to register db_operation_duration_seconds", Box::new(err)))?;

    Ok(MetricsCollector {
      registry: Arc::new(registry),
      config: args.config,
      users_create_total,
      users_create_failed,
      db_operations_total,
      db_operations_failed,
      request_duration_seconds,
      db_operation_duration_seconds,
    })
  }

  /// Renders every registered metric in the Prometheus text format
  pub fn encode(&self) -> String {
    TextEncoder::new().encode_to_string(&self.registry.gather()).unwrap_or_else(|err| {
      tracing::error!("failed to encode metrics: {}", err);
      String::new()
    })
  }

  /// Start HTTP server to expose metrics for Prometheus
  pub async fn run(&self) -> Result<(), BoxedErr> {
    let url = self.config.hosts.api_metrics.clone();

    let listener = TcpListener::bind(&url).await?;
    let addr = listener.local_addr()?;
    tracing::info!("API Metrics server listening on {}", addr);

    self.serve(listener).await
  }

  /// Serves `/metrics` and `/health` on an already bound listener, never returns on its own
  pub async fn serve(&self, listener: TcpListener) -> Result<(), BoxedErr> {
    loop {
      let (socket, _) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(err) => {
          tracing::error!("failed to accept metrics connection: {}", err);
          continue;
        }
      };
      let io = TokioIo::new(socket);

      let connection_metrics = self.clone();

      spawn(async move {
        let svc = service_fn(move |req: Request<Incoming>| {
          let request_metrics = connection_metrics.clone();

          async move {
            let res = match req.uri().path() {
              "/metrics" => {
                let mut res = Response::new(Full::new(Bytes::from(request_metrics.encode())));
                res.headers_mut().insert(
                  hyper::header::CONTENT_TYPE,
                  hyper::header::HeaderValue::from_static(
                    "text/plain; version=0.0.4; charset=utf-8",
                  ),
                );
                res
              }
              "/health" => Response::new(Full::new(Bytes::from_static(b"OK"))),
              _ => {
                let mut res = Response::new(Full::new(Bytes::from_static(b"Not Found")));
                *res.status_mut() = StatusCode::NOT_FOUND;
                res
              }
            };

            Ok::<_, Infallible>(res)
          }
        });

        if let Err(err) = Builder::new().serve_connection(io, svc).await {
          tracing::error!("Error serving metrics: {}", err);
        }
      });
    }
  }

  pub fn record_users_create_success(&self) {
    self.users_create_total.inc();
  }

  pub fn record_users_create_failure(&self) {
    self.users_create_total.inc();
    self.users_create_failed.inc();
  }

  pub fn record_db_operation(&self, operation: &str) {
    self.db_operations_total.with_label_values(&[operation]).inc();
  }

  pub fn record_db_error(&self, operation: &str, error: &str) {
    self.db_operations_failed.with_label_values(&[operation, error]).inc();
  }

  pub fn observe_request_duration(&self, endpoint: &str, duration_secs: f64) {
    self.request_duration_seconds.with_label_values(&[endpoint]).observe(duration_secs);
  }

  pub fn observe_db_operation_duration(&self, operation: &str, duration_secs: f64) {
    self.db_operation_duration_seconds.with_label_values(&[operation]).observe(duration_secs);
  }
}
