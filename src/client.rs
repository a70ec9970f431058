//! Report fetching facade
//!
//! [`ReportClient`] resolves a report reference to a path, authenticates,
//! runs logon, submit and poll under the outer retry policy, and decodes the
//! completed payload into a [`Table`].

use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use crate::job::ReportJobController;
use crate::retry::execute_with_retry;
use crate::session::SessionManager;
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::table::Table;
use crate::transport::{ReportTransport, SoapTransport};
use crate::types::{ReportParameter, ReportRef, ReportSummary, Session};

/// Fetches BI reports as tables
///
/// Each call creates its own session; nothing is cached between calls, so a
/// client can be shared freely across tasks.
#[derive(Clone)]
pub struct ReportClient {
    config: Config,
    transport: Arc<dyn ReportTransport>,
    sessions: SessionManager,
    jobs: ReportJobController,
    sleeper: Arc<dyn Sleeper>,
}

impl ReportClient {
    /// Create a client talking to the UKG SOAP services
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = SoapTransport::new(&config.credentials, config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport), Arc::new(TokioSleeper))
    }

    /// Create a client over a custom transport and sleeper
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn ReportTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: SessionManager::new(transport.clone()),
            jobs: ReportJobController::new(transport.clone(), sleeper.clone()),
            config,
            transport,
            sleeper,
        })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a report reference to a full report path
    pub fn resolve(&self, report: &ReportRef) -> Result<String> {
        match report {
            ReportRef::Path(path) => Ok(path.clone()),
            ReportRef::Name(name) => self
                .config
                .reports
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnknownReport(name.clone())),
        }
    }

    /// Fetch a report as a table using the configured retry budget
    pub async fn get_report(&self, report: impl Into<ReportRef>) -> Result<Table> {
        self.fetch(report.into(), &self.config.retry).await
    }

    /// Fetch a report as a table with an explicit outer retry budget
    pub async fn get_report_with_retries(
        &self,
        report: impl Into<ReportRef>,
        retries: u32,
    ) -> Result<Table> {
        let retry = RetryConfig {
            max_attempts: retries.max(1),
            ..self.config.retry.clone()
        };
        self.fetch(report.into(), &retry).await
    }

    /// Fetch the raw decoded report text without building a table
    pub async fn get_report_text(&self, report: impl Into<ReportRef>) -> Result<String> {
        let report = report.into();
        let path = self.resolve(&report)?;
        let session = self.sessions.authenticate(&self.config.credentials).await?;
        self.execute_and_fetch(&session, &path, &self.config.retry)
            .await
    }

    /// List the reports visible to the web service user
    pub async fn list_reports(&self) -> Result<Vec<ReportSummary>> {
        let session = self.sessions.authenticate(&self.config.credentials).await?;
        let context = self.sessions.log_on_with_token(&session).await?;
        self.transport.get_report_list(&context).await
    }

    /// Describe the prompt parameters of a report
    pub async fn report_parameters(
        &self,
        report: impl Into<ReportRef>,
    ) -> Result<Vec<ReportParameter>> {
        let path = self.resolve(&report.into())?;
        let session = self.sessions.authenticate(&self.config.credentials).await?;
        let context = self.sessions.log_on_with_token(&session).await?;
        self.transport.get_report_parameters(&path, &context).await
    }

    async fn fetch(&self, report: ReportRef, retry: &RetryConfig) -> Result<Table> {
        let path = self.resolve(&report)?;
        tracing::info!(phase = "resolve", %report, report_path = %path, "getting report");

        let session = self.sessions.authenticate(&self.config.credentials).await?;
        let payload = self.execute_and_fetch(&session, &path, retry).await?;

        let table = Table::decode(&payload, self.config.delimiter);
        tracing::info!(
            phase = "decode",
            columns = table.columns().len(),
            rows = table.len(),
            "report decoded"
        );
        Ok(table)
    }

    /// Logon, submit and poll as one retried unit of work
    async fn execute_and_fetch(
        &self,
        session: &Session,
        path: &str,
        retry: &RetryConfig,
    ) -> Result<String> {
        execute_with_retry(retry, self.sleeper.as_ref(), |attempt| async move {
            let started = Instant::now();
            tracing::info!(
                phase = "submit",
                attempt,
                max_attempts = retry.max_attempts,
                "executing report"
            );

            let context = self.sessions.log_on_with_token(session).await?;
            let key = self
                .jobs
                .submit_report(&context, path, self.config.delimiter)
                .await?;
            let outcome = self.jobs.poll(&key, &self.config.poll).await?;

            tracing::info!(
                phase = "poll",
                report_key = %key,
                status = %outcome.status(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "report response returned"
            );
            outcome.into_payload()
        })
        .await
    }
}
