mod config;
mod error;

use tracing_subscriber::EnvFilter;

use nightwatch_bigquery::BigQueryClient;
use nightwatch_core::report::{has_section, render_section};
use nightwatch_core::window::{ReportWindow, today_label};
use nightwatch_github::IssueClient;

use config::ReportConfig;
use error::ReportError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Nightly report failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ReportError> {
    let config = ReportConfig::from_env()?;

    let bigquery = BigQueryClient::new(&config.project_id, &config.gcp_access_token);
    let window = ReportWindow::now();
    let rows = bigquery
        .top_errors(&config.dataset, &config.table_prefix, &window)
        .await?;
    tracing::info!(rows = rows.len(), "Top-errors query finished");

    let today = today_label(window.end);
    let section = render_section(&today, &rows);

    let issues = IssueClient::new(&config.github_token);
    let issue = issues
        .fetch_issue(&config.github_owner, &config.github_repo, config.issue_number)
        .await?;
    let current_body = issue.body.unwrap_or_default();

    // Duplicate-append protection for repeated runs on the same date.
    if has_section(&current_body, &today) {
        println!("Section already exists for today. Skipping update.");
        return Ok(());
    }

    let updated = format!("{}\n{}", current_body.trim_end(), section);
    issues
        .update_issue(
            &config.github_owner,
            &config.github_repo,
            config.issue_number,
            &updated,
        )
        .await?;
    println!("Nightly report updated.");
    Ok(())
}
