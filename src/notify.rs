use std::time::Duration;

use tracing::{error, info};

/// Hosted web-hook service the success alerts are delivered through.
pub const DEFAULT_ENDPOINT: &str = "https://sctapi.ftqq.com";

/// Delivery attempts before a notification is dropped.
const MAX_ATTEMPTS: usize = 3;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Outbound notification channel.
///
/// Delivery is best-effort: failures are retried a fixed number of times
/// with a fixed delay, then logged and dropped. `send` never returns an
/// error; a lost alert must not take the watchdog down.
pub struct Notifier {
    url: String,
    client: reqwest::Client,
    retry_delay: Duration,
}

impl Notifier {
    pub fn new(key: &str) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, key, DEFAULT_RETRY_DELAY)
    }

    /// Build against a specific endpoint. Tests point this at a local
    /// server and shorten the retry delay.
    pub fn with_endpoint(endpoint: &str, key: &str, retry_delay: Duration) -> Self {
        Notifier {
            url: format!("{endpoint}/{key}.send"),
            client: reqwest::Client::new(),
            retry_delay,
        }
    }

    /// Deliver a notification with the given title and free-text body.
    pub async fn send(&self, title: &str, body: &str) {
        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = self
                .client
                .post(&self.url)
                .form(&[("text", title), ("desp", body)])
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match outcome {
                Ok(_) => {
                    info!("notification sent: {title}");
                    return;
                }
                Err(e) => {
                    error!("notification delivery failed (attempt {attempt}/{MAX_ATTEMPTS}): {e}");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        error!("notification dropped after {MAX_ATTEMPTS} attempts: {title}");
    }
}
