pub mod client;
pub mod gateway;
pub mod messages;
pub mod models;

pub use client::HttpGateway;
pub use gateway::{MailboxGateway, ProgressFn};
