//! Test configuration helpers for mock and live report services

use std::time::Duration;
use ukg_bi::{Config, Credentials};

/// Report name registered by [`mock_config`]
pub const EMPLOYEES: &str = "employees";

/// Report path registered by [`mock_config`]
pub const EMPLOYEES_PATH: &str =
    "/content/folder[@name='ACME']/folder[@name='UltiPro']/report[@name='Employees']";

/// Configuration pointing at a mock server, with no real waiting
pub fn mock_config(server_uri: &str) -> Config {
    let credentials = Credentials::new(
        "svc-user",
        "secret",
        "CAK",
        "UAK",
        format!("{server_uri}/services/"),
    );
    let mut config = Config::new(credentials).with_report(EMPLOYEES, EMPLOYEES_PATH);
    config.poll.max_attempts = 3;
    config.poll.pause = Duration::ZERO;
    config.retry.max_attempts = 3;
    config.retry.delay = Duration::ZERO;
    config.request_timeout = Duration::from_secs(5);
    config
}

/// Whether live tenant credentials are available in `.env` or the environment
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    Credentials::from_env().is_ok()
}

/// Configuration for a live tenant, with the report path taken from `UKG_REPORT_PATH`
pub fn live_config() -> Option<(Config, String)> {
    dotenvy::dotenv().ok();
    let credentials = Credentials::from_env().ok()?;
    let report_path = std::env::var("UKG_REPORT_PATH").ok()?;
    let mut config = Config::new(credentials);
    config.poll.pause = Duration::from_secs(20);
    Some((config, report_path))
}
