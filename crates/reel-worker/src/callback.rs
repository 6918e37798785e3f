//! Completion callbacks for background units.

use std::time::Duration;

use tracing::{info, warn};

use reel_models::CompletionNotice;

use crate::error::{WorkerError, WorkerResult};

/// Posts [`CompletionNotice`]s to caller-supplied URLs.
///
/// Delivery is best effort: a failed callback is logged and never changes
/// the unit's own result.
#[derive(Debug, Clone)]
pub struct CallbackNotifier {
    http: reqwest::Client,
    timeout: Duration,
}

impl CallbackNotifier {
    pub fn new(timeout: Duration) -> WorkerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, timeout })
    }

    /// Returns whether the receiver acknowledged with a 2xx status.
    pub async fn notify(&self, url: &str, notice: &CompletionNotice) -> bool {
        let response = self.http.post(url).json(notice).send().await;
        match response.and_then(|r| r.error_for_status()) {
            Ok(_) => {
                info!(scene_id = %notice.scene_id, url, "Delivered completion callback");
                true
            }
            Err(e) => {
                warn!(
                    scene_id = %notice.scene_id,
                    url,
                    timeout_secs = self.timeout.as_secs(),
                    "Completion callback failed: {}", e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{CompletionStatus, UnitResult};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_notify_posts_notice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/scene"))
            .and(body_partial_json(serde_json::json!({
                "scene_id": "s-9",
                "status": "completed",
                "video_url": "https://cdn.example.com/videos/s-9.mp4"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = CallbackNotifier::new(Duration::from_secs(5)).unwrap();
        let result = UnitResult::published("s-9", "https://cdn.example.com/videos/s-9.mp4", Some(10.0));
        let notice = CompletionNotice::from(&result);
        assert_eq!(notice.status, CompletionStatus::Completed);

        assert!(
            notifier
                .notify(&format!("{}/hooks/scene", server.uri()), &notice)
                .await
        );
    }

    #[tokio::test]
    async fn test_notify_failure_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = CallbackNotifier::new(Duration::from_secs(5)).unwrap();
        let notice = CompletionNotice::from(&UnitResult::failed("s-1", "resolution_error", "404"));
        assert!(!notifier.notify(&server.uri(), &notice).await);
        assert!(!notifier.notify("not a url", &notice).await);
    }
}
