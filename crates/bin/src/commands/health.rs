//! Health check command - probes a running Userbase server.

use std::time::Duration;

use crate::cli::HealthArgs;
use crate::output::OutputFormat;

/// Normalize a base URL or a full `/health` URL to the probe URL
fn health_url(url: &str) -> String {
    let base = url.trim_end_matches('/');
    if base.ends_with("/health") {
        base.to_string()
    } else {
        format!("{base}/health")
    }
}

/// Run the health check command
pub async fn run(args: &HealthArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => return Err(format!("unhealthy: failed to connect to {url}: {e}").into()),
    };
    if !response.status().is_success() {
        return Err(format!("unhealthy: server returned HTTP status {}", response.status()).into());
    }

    let body: serde_json::Value = response.json().await?;
    let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("");
    if status != "healthy" {
        return Err(format!("unhealthy: server reported status '{status}'").into());
    }

    match format {
        OutputFormat::Human => {
            let backend = body.get("backend").and_then(|b| b.as_str()).unwrap_or("unknown");
            println!("healthy (backend: {backend})");
        }
        OutputFormat::Json => println!("{body}"),
    }
    Ok(())
}
