//! Command handlers.
//!
//! Each handler receives an already validated [`AppConfig`](statdesk_core::AppConfig).

pub mod backend;
pub mod paths;
pub mod run;
