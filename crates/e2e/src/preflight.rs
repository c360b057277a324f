//! Reachability check of the site before any browser is started

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Lowest HTTP status that counts as the site being down
pub const SERVER_ERROR_STATUS: u16 = 500;

/// Wait until `url` answers with a non-5xx status
///
/// Bot protection may answer plain HTTP clients with 403; that still proves
/// the page is reachable, so only connection errors and server errors count
/// as failures. Browser navigation applies the same threshold.
pub async fn check_reachable(url: &str, timeout_duration: Duration) -> E2eResult<u16> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;
    let mut last_error = String::from("no attempt made");

    while attempts == 0 || start.elapsed() < timeout_duration {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().as_u16() < SERVER_ERROR_STATUS => {
                info!("{} is reachable ({})", url, resp.status());
                return Ok(resp.status().as_u16());
            }
            Ok(resp) => {
                warn!("Reachability check returned {}", resp.status());
                last_error = format!("HTTP {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", url);
                }
                last_error = e.to_string();
            }
        }

        sleep(Duration::from_millis(100)).await;
    }

    Err(E2eError::NavigationFailure {
        url: url.to_string(),
        reason: format!("{} after {} attempt(s)", last_error, attempts),
    })
}
