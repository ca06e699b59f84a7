//! Page fetching
//!
//! The auditor talks to the network only through [`PageFetcher`]. Native
//! builds get [`ReqwestFetcher`] with the `http` feature; the Cloudflare
//! worker supplies its own implementation, and tests use in-memory doubles.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

/// Everything a transport needs to retrieve one page
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    pub user_agent: &'a str,
    pub timeout: Duration,
}

/// Retrieves the HTML body of a page.
///
/// Implementations must fail on non-success statuses and give up once
/// `request.timeout` has elapsed. Futures are `Send` on native targets so
/// audits can run on spawned tasks; on wasm32 they are not, since the
/// Workers runtime hands out `!Send` JS handles.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PageFetcher {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<String, FetchError>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<T: PageFetcher + Sync + ?Sized> PageFetcher for &T {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<String, FetchError> {
        (**self).fetch(request).await
    }
}

#[cfg(feature = "http")]
pub use self::http::ReqwestFetcher;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::Client;
    use reqwest::header::USER_AGENT;

    use super::{FetchRequest, PageFetcher};
    use crate::error::FetchError;

    /// reqwest transport using the client's default redirect policy
    #[derive(Debug, Clone)]
    pub struct ReqwestFetcher {
        client: Client,
    }

    impl ReqwestFetcher {
        pub fn new() -> Result<Self, FetchError> {
            let client = Client::builder()
                .build()
                .map_err(|e| FetchError::Client(e.to_string()))?;
            Ok(Self { client })
        }
    }

    #[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
    #[cfg_attr(not(target_arch = "wasm32"), async_trait)]
    impl PageFetcher for ReqwestFetcher {
        async fn fetch(&self, request: &FetchRequest<'_>) -> Result<String, FetchError> {
            let response = self
                .client
                .get(request.url)
                .header(USER_AGENT, request.user_agent)
                .timeout(request.timeout)
                .send()
                .await
                .map_err(|e| classify(e, request))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        timeout: request.timeout,
                    }
                } else {
                    FetchError::Body(error_chain(&e))
                }
            })
        }
    }

    fn classify(error: reqwest::Error, request: &FetchRequest<'_>) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                timeout: request.timeout,
            }
        } else {
            FetchError::Transport(error_chain(&error))
        }
    }

    /// reqwest hides the interesting part (DNS, refused, TLS) in `source()`
    fn error_chain(error: &dyn std::error::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
