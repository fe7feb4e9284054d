pub mod auth;
pub mod delete;
pub mod flag;
pub mod get;
pub mod list;
pub mod message;
pub mod send;
