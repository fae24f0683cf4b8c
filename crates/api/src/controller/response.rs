use http_body_util::Full;
use hyper::{
  body::Bytes,
  header::{HeaderValue, CONTENT_TYPE},
  Response, StatusCode,
};

/// Plain text response whose body is the canonical reason phrase of `status`
pub fn text_response(status: StatusCode) -> Response<Full<Bytes>> {
  let reason = status.canonical_reason().unwrap_or_default();

  let mut res = Response::new(Full::new(Bytes::from_static(reason.as_bytes())));
  *res.status_mut() = status;
  res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
  res
}
