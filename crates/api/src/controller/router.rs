use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::{body::Bytes, Method, Request, Response, StatusCode};
use iam_result::middleware_context;
use tracing::info;

use super::{text_response, ApiController};

impl ApiController {
  /// Dispatches one request. The body is never read.
  ///
  /// The request context is cancelled when this future completes or is dropped, e.g. because
  /// the client disconnected.
  pub async fn route<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
    let start = Instant::now();
    let (parts, _body) = req.into_parts();
    let path = parts.uri.path();

    let mut ctx = middleware_context(&parts.headers, path);
    if let Some(timeout) = self.request_timeout {
      ctx = ctx.with_timeout(timeout);
    }
    let ctx = Arc::new(ctx);
    let _cancel_guard = ctx.cancel_on_drop();

    let method = &parts.method;
    let (endpoint, res) = match path {
      "/users" if *method == Method::POST => {
        ("users.users_create", self.users_create.handle(ctx.clone()).await)
      }
      "/healthz" if *method == Method::GET || *method == Method::HEAD => {
        ("healthz", text_response(StatusCode::OK))
      }
      "/users" | "/healthz" => {
        ("method_not_allowed", text_response(StatusCode::METHOD_NOT_ALLOWED))
      }
      _ => ("not_found", text_response(StatusCode::NOT_FOUND)),
    };

    let duration = start.elapsed().as_secs_f64();
    self.metrics.observe_request_duration(endpoint, duration);
    info!(
      request_id = %ctx.request_id,
      method = %method,
      path = %path,
      status = res.status().as_u16(),
      "request handled - duration: {:.2}ms",
      duration * 1000.0
    );

    res
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;
  use std::time::Duration;

  use async_trait::async_trait;
  use http_body_util::{BodyExt, Empty};
  use iam_config::Settings;
  use iam_result::{
    context::{Context, ContextError},
    errors::AppError,
  };
  use tokio::sync::oneshot;

  use super::*;
  use crate::{
    controller::ApiControllerArgs,
    server::observability::{MetricsCollector, MetricsCollectorArgs},
    service::UserCreator,
  };

  #[derive(Default)]
  struct RecordingCreator {
    calls: Mutex<Vec<(String, String)>>,
  }

  #[async_trait]
  impl UserCreator for RecordingCreator {
    async fn add_new_user(
      &self,
      _ctx: Arc<Context>,
      email: &str,
      role: &str,
    ) -> Result<(), AppError> {
      self.calls.lock().unwrap().push((email.into(), role.into()));
      Ok(())
    }
  }

  /// Hands the context to a watcher task and waits until the context is done
  struct WaitingCreator {
    watcher: Mutex<Option<oneshot::Sender<ContextError>>>,
  }

  #[async_trait]
  impl UserCreator for WaitingCreator {
    async fn add_new_user(
      &self,
      ctx: Arc<Context>,
      _email: &str,
      _role: &str,
    ) -> Result<(), AppError> {
      if let Some(tx) = self.watcher.lock().unwrap().take() {
        let watched = ctx.clone();
        tokio::spawn(async move {
          let _ = tx.send(watched.done().await);
        });
      }

      let err = ctx.done().await;
      Err(AppError::from_context(ctx, "test", err))
    }
  }

  fn controller(creator: Arc<dyn UserCreator>, settings: Settings) -> ApiController {
    let config = Arc::new(settings);
    let metrics = MetricsCollector::new(MetricsCollectorArgs { config: config.clone() }).unwrap();
    let args = ApiControllerArgs { config, users_creator: creator, metrics: Arc::new(metrics) };
    ApiController::new(args)
  }

  fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
    Request::builder().method(method).uri(uri).body(Empty::new()).unwrap()
  }

  async fn body_string(res: Response<Full<Bytes>>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  #[tokio::test]
  async fn test_post_users_reaches_the_creator() {
    let creator = Arc::new(RecordingCreator::default());
    let ctr = controller(creator.clone(), Settings::default());

    let req = Request::builder()
      .method(Method::POST)
      .uri("/users?email=someone@example.com&role=viewer")
      .header("content-type", "application/json")
      .body(Full::new(Bytes::from(r#"{"email":"other@example.com","role":"member"}"#)))
      .unwrap();
    let res = ctr.route(req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "OK");
    let calls = creator.calls.lock().unwrap();
    assert_eq!(*calls, vec![("email@gmail.com".to_string(), "admin".to_string())]);
  }

  #[tokio::test]
  async fn test_healthz_unknown_and_wrong_method() {
    let creator = Arc::new(RecordingCreator::default());
    let ctr = controller(creator.clone(), Settings::default());

    let res = ctr.route(request(Method::GET, "/healthz")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "OK");

    let res = ctr.route(request(Method::GET, "/nowhere")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(res).await, "Not Found");

    let res = ctr.route(request(Method::GET, "/users")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_string(res).await, "Method Not Allowed");

    assert!(creator.calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_dropped_request_cancels_the_context() {
    let (tx, rx) = oneshot::channel();
    let creator = Arc::new(WaitingCreator { watcher: Mutex::new(Some(tx)) });
    let ctr = controller(creator, Settings::default());

    let timed_out =
      tokio::time::timeout(Duration::from_millis(20), ctr.route(request(Method::POST, "/users")))
        .await;
    assert!(timed_out.is_err());

    assert_eq!(rx.await.unwrap(), ContextError::Canceled);
  }

  #[tokio::test(start_paused = true)]
  async fn test_request_timeout_becomes_the_deadline() {
    let creator = Arc::new(WaitingCreator { watcher: Mutex::new(None) });
    let mut settings = Settings::default();
    settings.api.request_timeout_ms = Some(250);
    let ctr = controller(creator, settings);

    let started = tokio::time::Instant::now();
    let res = ctr.route(request(Method::POST, "/users")).await;

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(res).await, "Bad Request");
  }
}
