use std::sync::Arc;

use http_body_util::Full;
use hyper::{body::Bytes, Response, StatusCode};
use iam_result::context::Context;
use tracing::{info, instrument, warn};

use crate::{
  controller::response::text_response, server::observability::MetricsCollector,
  service::UserCreator,
};

pub const USERS_CREATE_EMAIL: &str = "email@gmail.com";
pub const USERS_CREATE_ROLE: &str = "admin";

/// HTTP adapter in front of a [`UserCreator`].
///
/// The request payload is not read, the creator is always called with [`USERS_CREATE_EMAIL`] and
/// [`USERS_CREATE_ROLE`]. Any error becomes `400 Bad Request` without details.
#[derive(Clone)]
pub struct UsersCreateHandler {
  users_creator: Arc<dyn UserCreator>,
  metrics: Arc<MetricsCollector>,
}

impl UsersCreateHandler {
  pub fn new(users_creator: Arc<dyn UserCreator>, metrics: Arc<MetricsCollector>) -> Self {
    Self { users_creator, metrics }
  }

  #[instrument(skip_all, fields(request_id = %ctx.request_id))]
  pub async fn handle(&self, ctx: Arc<Context>) -> Response<Full<Bytes>> {
    let res =
      self.users_creator.add_new_user(ctx.clone(), USERS_CREATE_EMAIL, USERS_CREATE_ROLE).await;

    match res {
      Ok(()) => {
        self.metrics.record_users_create_success();
        info!("user creation succeeded");
        text_response(StatusCode::OK)
      }
      Err(err) => {
        self.metrics.record_users_create_failure();
        warn!(error_id = %err.id, "user creation failed: {}", err);
        text_response(StatusCode::BAD_REQUEST)
      }
    }
  }
}
