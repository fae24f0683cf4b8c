pub mod users_create;
