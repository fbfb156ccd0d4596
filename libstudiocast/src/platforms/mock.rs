//! Mock adapter for testing
//!
//! A configurable [`PlatformAdapter`] that can succeed, fail, fail a fixed
//! number of times before succeeding, or stall. It records every call so
//! tests can assert on what would have been sent without network access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{PlatformError, Result};
use crate::platforms::{PlatformAdapter, PublishRequest, PublishedPost};
use crate::types::{Platform, SocialAccount};

/// How a mock adapter answers `send`
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Succeed,
    /// Every call fails with this error
    Fail(PlatformError),
    /// The first `n` calls fail, later calls succeed
    FailTimes(usize, PlatformError),
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub platform: Platform,
    pub outcome: MockOutcome,
    /// Simulated network latency per call
    pub delay: Duration,
}

impl MockConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            outcome: MockOutcome::Succeed,
            delay: Duration::ZERO,
        }
    }
}

/// Mock adapter for testing
pub struct MockAdapter {
    config: MockConfig,
    send_calls: Arc<AtomicUsize>,
    sent_content: Arc<Mutex<Vec<String>>>,
    accounts_used: Arc<Mutex<Vec<String>>>,
}

impl MockAdapter {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            send_calls: Arc::new(AtomicUsize::new(0)),
            sent_content: Arc::new(Mutex::new(Vec::new())),
            accounts_used: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock adapter that always succeeds
    pub fn success(platform: Platform) -> Self {
        Self::new(MockConfig::new(platform))
    }

    /// Create a mock adapter that always fails with `error`
    pub fn failure(platform: Platform, error: PlatformError) -> Self {
        Self::new(MockConfig {
            outcome: MockOutcome::Fail(error),
            ..MockConfig::new(platform)
        })
    }

    /// Create a mock adapter that fails `times` calls before succeeding
    pub fn flaky(platform: Platform, times: usize, error: PlatformError) -> Self {
        Self::new(MockConfig {
            outcome: MockOutcome::FailTimes(times, error),
            ..MockConfig::new(platform)
        })
    }

    /// Create a mock adapter that waits before answering
    pub fn with_delay(platform: Platform, delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..MockConfig::new(platform)
        })
    }

    /// Number of times `send` was reached
    pub fn send_count(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Content passed to `send`, after truncation
    pub fn sent_content(&self) -> Vec<String> {
        self.sent_content
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Access tokens presented on each call
    pub fn tokens_used(&self) -> Vec<String> {
        self.accounts_used
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> Platform {
        self.config.platform
    }

    async fn send(
        &self,
        account: &SocialAccount,
        content: &str,
        _request: &PublishRequest,
    ) -> Result<PublishedPost> {
        let call = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;

        self.sent_content
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(content.to_string());
        self.accounts_used
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(account.access_token.clone());

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        match &self.config.outcome {
            MockOutcome::Fail(error) => Err(error.clone().into()),
            MockOutcome::FailTimes(times, error) if call <= *times => Err(error.clone().into()),
            _ => {
                let post_id = format!("mock-{}-{}", self.config.platform, call);
                Ok(PublishedPost {
                    url: Some(format!("https://mock.invalid/{}", post_id)),
                    post_id,
                })
            }
        }
    }
}

/// Connected account with a non-expiring token, for adapter tests
pub fn test_account(platform: Platform) -> SocialAccount {
    SocialAccount {
        id: format!("acct-{}", platform),
        user_id: "user-1".to_string(),
        platform,
        platform_user_id: format!("{}-user", platform),
        access_token: "test-access-token".to_string(),
        refresh_token: None,
        token_expiry: None,
        account_name: format!("{} Tester", platform.display_name()),
        account_email: None,
        account_image: None,
        created_at: 0,
        updated_at: 0,
    }
}
