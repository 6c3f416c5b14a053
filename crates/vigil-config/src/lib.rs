//! Environment-variable configuration for every vigil component.
//!
//! Centralizes the environment surface §6 describes (replica hosts `S1`,
//! `S2`, `S3`, `GFD_IP`, per-process identifiers, and one typed port per
//! listener) into a `from_env()` constructor per component, replacing the
//! hardcoded module-level host/port constants the original prototype's
//! scripts compiled in.

mod client;
mod env;
mod error;
mod gfd;
mod lfd;
mod rm;
mod server;

pub use client::ClientConfig;
pub use error::{ConfigError, ConfigResult};
pub use gfd::GfdConfig;
pub use lfd::LfdConfig;
pub use rm::RmConfig;
pub use server::ServerConfig;
