//! Web application for posting and browsing short-lived text snippets.

pub mod cli;
pub mod forms;
pub mod models;
pub mod snipbin;
pub mod validator;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
