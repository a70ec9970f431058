//! Fetch a BI report and print it
//!
//! Credentials are read from the environment (or a `.env` file):
//! `UKG_USERNAME`, `UKG_PASSWORD`, `UKG_CLIENT_ACCESS_KEY`,
//! `UKG_USER_ACCESS_KEY` and optionally `UKG_BASE_URL`.
//!
//! ```bash
//! cargo run --example fetch_report -- "/content/folder[@name='ACME']/report[@name='Headcount']"
//! cargo run --example fetch_report -- --list
//! ```

use ukg_bi::{Config, Credentials, ReportClient, ReportRef};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let config = Config::new(Credentials::from_env()?).with_report(
        "headcount",
        "/content/folder[@name='ACME']/folder[@name='UltiPro']/report[@name='Headcount']",
    );
    let client = ReportClient::new(config)?;

    let arg = std::env::args().nth(1).unwrap_or_else(|| "headcount".to_string());

    if arg == "--list" {
        for report in client.list_reports().await? {
            println!("{}\t{}", report.name, report.path);
        }
        return Ok(());
    }

    // Names go through the mapping, anything starting with '/' is a path
    let report = ReportRef::parse(&arg);
    for parameter in client.report_parameters(report.clone()).await? {
        println!(
            "parameter {} ({}){}",
            parameter.name,
            parameter.data_type,
            if parameter.required { " required" } else { "" }
        );
    }

    let table = client.get_report(report).await?;
    println!("{}", table.columns().join(" | "));
    for row in table.rows() {
        println!("{}", row.join(" | "));
    }
    println!("{} rows", table.len());

    // Records serialize cleanly for downstream tools
    println!("{}", serde_json::to_string_pretty(&table)?);

    Ok(())
}
