mod middleware;
mod models;

pub use middleware::*;
pub use models::*;
