//! Remote report service boundary
//!
//! [`ReportTransport`] lists the remote operations the session, job and client
//! layers depend on. [`SoapTransport`] speaks to the real UKG web services;
//! tests substitute scripted implementations.

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::Result;
use crate::types::{DataContext, ReportKey, ReportParameter, ReportSummary, RetrieveResponse};

mod soap;
mod xml;

pub use soap::SoapTransport;

/// Operations exposed by the report service
///
/// Implementations must map every remote failure to an [`Error`](crate::Error)
/// instead of panicking. None of the methods retry on their own.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Login handshake; returns the session token (empty if none was issued)
    async fn authenticate(&self, credentials: &Credentials) -> Result<String>;

    /// Exchange a session token for a BI data context
    async fn log_on_with_token(&self, token: &str, client_access_key: &str)
    -> Result<DataContext>;

    /// Submit a report for execution, asking for `delimiter`-separated output
    async fn execute_report(
        &self,
        context: &DataContext,
        report_path: &str,
        delimiter: char,
    ) -> Result<ReportKey>;

    /// Fetch the current state, and the stream once complete, of a report job
    async fn retrieve_report(&self, report_key: &ReportKey) -> Result<RetrieveResponse>;

    /// List the reports visible under a context
    async fn get_report_list(&self, context: &DataContext) -> Result<Vec<ReportSummary>>;

    /// Describe the prompt parameters of a report
    async fn get_report_parameters(
        &self,
        report_path: &str,
        context: &DataContext,
    ) -> Result<Vec<ReportParameter>>;
}
