use http::HeaderMap;
use ulid::Ulid;

use crate::{context::Context, network::Header};

/// Builds the request context out of the inbound headers.
///
/// A missing `x-request-id` gets a fresh ULID so every log line of a request can be correlated.
/// `ip_address` falls back to the first hop of `x-forwarded-for`.
pub fn middleware_context(headers: &HeaderMap, path: &str) -> Context {
  let get_string = |key: Header| {
    headers.get(key.to_string()).and_then(|v| v.to_str().ok()).unwrap_or("").trim().to_string()
  };

  let mut request_id = get_string(Header::XRequestID);
  if request_id.is_empty() {
    request_id = Ulid::new().to_string();
  }

  let x_forwarded_for = get_string(Header::XForwardedFor);
  let mut ip_address = get_string(Header::XIPAddress);
  if ip_address.is_empty() {
    ip_address = x_forwarded_for.split(',').next().unwrap_or("").trim().to_string();
  }

  Context::new(
    request_id,
    ip_address,
    x_forwarded_for,
    path.to_string(),
    get_string(Header::UserAgent),
    get_string(Header::AcceptLanguage),
    get_string(Header::XTimezone),
  )
}
