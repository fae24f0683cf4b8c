mod users_creator;

pub use users_creator::*;
