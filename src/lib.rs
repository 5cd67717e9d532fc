//! Asynchronous client for the IBM Z / LinuxONE Hardware Management
//! Console (HMC) Web Services API.
//!
//! [`Client`] is the top-level entry point: it owns a [`Session`] and the
//! root-level managers (`cpcs`, `consoles`, `metrics_contexts`). Every
//! concrete resource kind under [`resources`] is a thin wrapper over
//! [`Resource`] that shares its capability surface through `Deref`
//! rather than inheritance, and is reached through a
//! [`manager::Manager<T>`] that knows how to list, find, create, and
//! delete instances of that kind.
//!
//! ```no_run
//! use std::time::Duration;
//! use zhmc::config::RetryTimeoutConfig;
//! use zhmc::session::{PasswordSource, Session, VerifyCert};
//! use zhmc::Client;
//!
//! # async fn run() -> Result<(), zhmc::error::HmcError> {
//! let session = Session::new(
//!     "hmc.example.com",
//!     "apiuser",
//!     PasswordSource::Password("secret".to_string()),
//!     VerifyCert::No,
//!     RetryTimeoutConfig::default(),
//! )?;
//! let client = Client::new(session);
//! let cpcs = client.cpcs().list(false, None).await?;
//! # let _ = cpcs;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod manager;
pub mod metrics_response;
pub mod notification;
pub mod properties;
pub mod resource;
pub mod resources;
pub mod session;
pub mod status_waiter;
pub mod timestats;

pub use client::Client;
pub use error::{HmcError, Result};
