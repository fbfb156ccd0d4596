//! Single-platform delivery with retry
//!
//! [`PlatformPoster`] runs the full path for one platform: request
//! validation, account resolution, token pre-flight, then the adapter call.
//! Transient failures (network errors, rate limits) are retried with
//! exponential backoff; everything else fails immediately.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::accounts::AccountResolver;
use crate::config::PublishingConfig;
use crate::db::Database;
use crate::error::{PlatformError, Result, StudioError};
use crate::oauth::TokenManager;
use crate::platforms::{AdapterRegistry, PlatformAdapter, PublishRequest, PublishedPost};
use crate::types::{Platform, SocialAccount};

/// Check if an error is transient and should be retried
fn is_transient_error(error: &StudioError) -> bool {
    matches!(error, StudioError::Platform(e) if e.is_transient())
}

/// Attempt budget and backoff for transient failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PublishingConfig) -> Result<Self> {
        Ok(Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff()?,
        })
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1`: backoff, 2x backoff, 4x backoff...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Post through an adapter, retrying transient errors
///
/// Returns the final result and the number of attempts made.
pub async fn publish_with_retry(
    adapter: &dyn PlatformAdapter,
    account: &SocialAccount,
    request: &PublishRequest,
    policy: RetryPolicy,
) -> (Result<PublishedPost>, u32) {
    let platform = adapter.platform();
    let mut attempt = 1;

    loop {
        match adapter.publish(account, request).await {
            Ok(published) => {
                if attempt > 1 {
                    info!(
                        "Successfully posted to {} on attempt {}",
                        platform, attempt
                    );
                }
                return (Ok(published), attempt);
            }
            Err(e) if is_transient_error(&e) && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Transient error posting to {} (attempt {}/{}): {}. Retrying in {:?}",
                    platform, attempt, policy.max_attempts, e, delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    warn!(
                        "Failed to post to {} after {} attempts: {}",
                        platform, attempt, e
                    );
                }
                return (Err(e), attempt);
            }
        }
    }
}

/// A successful single-platform publish
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub post_id: String,
    pub url: Option<String>,
    pub account_id: String,
    pub account_name: String,
    pub attempts: u32,
}

/// Outcome of [`PlatformPoster::deliver`], keeping the attempt count on failure
#[derive(Debug)]
pub struct DeliveryReport {
    pub result: Result<Delivery>,
    pub attempts: u32,
}

#[derive(Clone)]
pub struct PlatformPoster {
    db: Database,
    tokens: Arc<TokenManager>,
    registry: AdapterRegistry,
    resolver: AccountResolver,
    retry: RetryPolicy,
}

impl PlatformPoster {
    pub fn new(
        db: Database,
        tokens: Arc<TokenManager>,
        registry: AdapterRegistry,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            resolver: AccountResolver::new(db.clone()),
            db,
            tokens,
            registry,
            retry,
        }
    }

    /// Publish to one platform on behalf of `user_id`
    pub async fn publish(
        &self,
        platform: Platform,
        user_id: &str,
        account_id: Option<&str>,
        request: &PublishRequest,
    ) -> Result<Delivery> {
        self.deliver(platform, user_id, account_id, request).await.result
    }

    /// Like [`publish`](Self::publish), also reporting attempts on failure
    pub async fn deliver(
        &self,
        platform: Platform,
        user_id: &str,
        account_id: Option<&str>,
        request: &PublishRequest,
    ) -> DeliveryReport {
        let adapter = match self.registry.get(platform) {
            Some(adapter) => adapter,
            None => {
                return DeliveryReport {
                    result: Err(PlatformError::Posting(format!(
                        "{} publishing is not available",
                        platform.display_name()
                    ))
                    .into()),
                    attempts: 0,
                }
            }
        };

        // Requests the platform can never accept fail before any lookup or network call
        if let Err(e) = adapter.validate(request) {
            return DeliveryReport {
                result: Err(e),
                attempts: 0,
            };
        }

        let account = match self.prepare_account(platform, user_id, account_id).await {
            Ok(account) => account,
            Err(e) => {
                return DeliveryReport {
                    result: Err(e),
                    attempts: 0,
                }
            }
        };

        let (result, attempts) =
            publish_with_retry(adapter.as_ref(), &account, request, self.retry).await;

        DeliveryReport {
            result: result.map(|published| Delivery {
                post_id: published.post_id,
                url: published.url,
                account_id: account.id.clone(),
                account_name: account.account_name.clone(),
                attempts,
            }),
            attempts,
        }
    }

    async fn prepare_account(
        &self,
        platform: Platform,
        user_id: &str,
        account_id: Option<&str>,
    ) -> Result<SocialAccount> {
        let account = self.resolver.resolve(user_id, platform, account_id).await?;
        let now = chrono::Utc::now().timestamp();
        self.tokens.ensure_fresh(&self.db, account, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::platforms::mock::{test_account, MockAdapter};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_is_transient_error() {
        assert!(is_transient_error(
            &PlatformError::Network("Connection timeout".to_string()).into()
        ));
        assert!(is_transient_error(
            &PlatformError::RateLimit("Too many requests".to_string()).into()
        ));
        assert!(!is_transient_error(
            &PlatformError::Authentication("Invalid credentials".to_string()).into()
        ));
        assert!(!is_transient_error(
            &PlatformError::Validation("Content too long".to_string()).into()
        ));
        assert!(!is_transient_error(&StudioError::NotFound("post".to_string())));
    }

    #[test]
    fn test_retry_policy_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            backoff: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryPolicy::from_config(&Config::default_config().publishing).unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_publish_with_retry_success_first_attempt() {
        let adapter = MockAdapter::success(Platform::Twitter);
        let (result, attempts) = publish_with_retry(
            &adapter,
            &test_account(Platform::Twitter),
            &PublishRequest::text("hi"),
            fast_retry(),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_publish_with_retry_success_after_retries() {
        let adapter = MockAdapter::flaky(
            Platform::Twitter,
            2,
            PlatformError::Network("reset".to_string()),
        );
        let (result, attempts) = publish_with_retry(
            &adapter,
            &test_account(Platform::Twitter),
            &PublishRequest::text("hi"),
            fast_retry(),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts, 3);
        assert_eq!(adapter.send_count(), 3);
    }

    #[tokio::test]
    async fn test_publish_with_retry_permanent_failure_not_retried() {
        let adapter = MockAdapter::failure(
            Platform::LinkedIn,
            PlatformError::Authentication("expired".to_string()),
        );
        let (result, attempts) = publish_with_retry(
            &adapter,
            &test_account(Platform::LinkedIn),
            &PublishRequest::text("hi"),
            fast_retry(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
        assert_eq!(adapter.send_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_with_retry_exhausted() {
        let adapter = MockAdapter::failure(
            Platform::Facebook,
            PlatformError::RateLimit("slow down".to_string()),
        );
        let (result, attempts) = publish_with_retry(
            &adapter,
            &test_account(Platform::Facebook),
            &PublishRequest::text("hi"),
            fast_retry(),
        )
        .await;
        assert!(matches!(
            result,
            Err(StudioError::Platform(PlatformError::RateLimit(_)))
        ));
        assert_eq!(attempts, 3);
    }

    async fn poster_with(adapter: Arc<MockAdapter>) -> (Database, PlatformPoster) {
        let db = Database::in_memory().await.unwrap();
        let config = Config::default_config();
        let tokens = Arc::new(TokenManager::from_config(&config, reqwest::Client::new()));
        let registry = AdapterRegistry::new().with_adapter(adapter);
        let poster = PlatformPoster::new(db.clone(), tokens, registry, fast_retry());
        (db, poster)
    }

    #[tokio::test]
    async fn test_poster_resolves_account_and_publishes() {
        let adapter = Arc::new(MockAdapter::success(Platform::LinkedIn));
        let (db, poster) = poster_with(adapter.clone()).await;
        db.insert_social_account(&test_account(Platform::LinkedIn))
            .await
            .unwrap();

        let delivery = poster
            .publish(Platform::LinkedIn, "user-1", None, &PublishRequest::text("hi"))
            .await
            .unwrap();
        assert_eq!(delivery.account_id, "acct-linkedin");
        assert_eq!(delivery.account_name, "LinkedIn Tester");
        assert_eq!(delivery.attempts, 1);
        assert_eq!(adapter.send_count(), 1);
    }

    #[tokio::test]
    async fn test_poster_expired_token_never_reaches_adapter() {
        let adapter = Arc::new(MockAdapter::success(Platform::LinkedIn));
        let (db, poster) = poster_with(adapter.clone()).await;
        let mut account = test_account(Platform::LinkedIn);
        account.token_expiry = Some(1);
        db.insert_social_account(&account).await.unwrap();

        let report = poster
            .deliver(Platform::LinkedIn, "user-1", None, &PublishRequest::text("hi"))
            .await;
        let err = report.result.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(report.attempts, 0);
        assert_eq!(adapter.send_count(), 0);
    }

    #[tokio::test]
    async fn test_poster_validates_before_account_lookup() {
        let adapter = Arc::new(MockAdapter::success(Platform::Instagram));
        let (_db, poster) = poster_with(adapter).await;

        // No Instagram account exists; the image check still wins
        let err = poster
            .publish(Platform::Instagram, "user-1", None, &PublishRequest::text("caption"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("requires an image URL"));
    }

    #[tokio::test]
    async fn test_poster_unregistered_platform() {
        let adapter = Arc::new(MockAdapter::success(Platform::LinkedIn));
        let (_db, poster) = poster_with(adapter).await;
        let err = poster
            .publish(Platform::Twitter, "user-1", None, &PublishRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not available"));
    }
}
