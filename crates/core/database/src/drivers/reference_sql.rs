use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::User;

/// In memory store, users are keyed by id
#[derive(Default, Debug)]
pub struct ReferenceSqlDb {
  pub users: Arc<Mutex<HashMap<String, User>>>,
}
