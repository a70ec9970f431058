//! # ukg-bi
//!
//! Async client that fetches UKG Pro (UltiPro) BI reports and returns them as
//! tables.
//!
//! Fetching a report takes four steps, all handled here:
//! - **Authenticate** against the login service to get a session token
//! - **Log on** with the token to get a BI data context
//! - **Execute** the report and **poll** the streaming service until the job
//!   completes, fails, or the poll budget runs out
//! - **Decode** the delimited report stream into a [`Table`]
//!
//! Logon, execute and poll are retried as one unit when any of them fails.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ukg_bi::{Config, Credentials, ReportClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(Credentials::from_env()?).with_report(
//!         "headcount",
//!         "/content/folder[@name='ACME']/folder[@name='UltiPro']/report[@name='Headcount']",
//!     );
//!
//!     let client = ReportClient::new(config)?;
//!     let table = client.get_report("headcount").await?;
//!     println!("{} rows, columns {:?}", table.len(), table.columns());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Report fetching facade
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Report job submission and polling
pub mod job;
/// Outer retry policy
pub mod retry;
/// Session handshake and BI logon
pub mod session;
/// Injectable waiting
pub mod sleeper;
/// Delimited text decoding
pub mod table;
/// Remote report service boundary
pub mod transport;
/// Core types
pub mod types;

// Re-export commonly used types
pub use client::ReportClient;
pub use config::{Config, Credentials, PollConfig, RetryConfig};
pub use error::{Error, Result};
pub use job::{PollOutcome, ReportJobController};
pub use session::SessionManager;
pub use sleeper::{Sleeper, TokioSleeper};
pub use table::Table;
pub use transport::{ReportTransport, SoapTransport};
pub use types::{
    DataContext, ReportKey, ReportParameter, ReportRef, ReportStatus, ReportSummary,
    RetrieveResponse, Session,
};
