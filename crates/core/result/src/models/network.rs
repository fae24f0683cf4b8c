use std::str::FromStr;

use derive_more::Display;
use ulid::Ulid;

pub fn is_valid_ulid(id: &str) -> bool {
  if id.len() != 26 {
    return false;
  }
  Ulid::from_str(id).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Header {
  #[display("x-request-id")]
  XRequestID,
  #[display("x-ip-address")]
  XIPAddress,
  #[display("x-forwarded-for")]
  XForwardedFor,
  #[display("x-timezone")]
  XTimezone,
  // Standard headers
  #[display("user-agent")]
  UserAgent,
  #[display("accept-language")]
  AcceptLanguage,
}
