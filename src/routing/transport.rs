use std::time::Duration;

use anyhow::Context;

use crate::routing::RoutingError;

/// Issues a GET and hands back the raw body. Non-2xx bodies are returned as
/// well since the routing service reports failures in the JSON payload.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<String, RoutingError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build http client")?;

        Ok(Self { inner })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, RoutingError> {
        let body = self.inner.get(url).send().await?.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod canned {
    use std::sync::Mutex;

    use super::*;

    /// Answers every request with the same body and remembers the URLs asked for.
    pub(crate) struct CannedTransport {
        body: Option<String>,
        requests: Mutex<Vec<String>>,
    }

    impl CannedTransport {
        pub(crate) fn ok(body: &str) -> Self {
            Self {
                body: Some(body.to_owned()),
                requests: Mutex::new(vec![]),
            }
        }

        pub(crate) fn unreachable() -> Self {
            Self {
                body: None,
                requests: Mutex::new(vec![]),
            }
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for CannedTransport {
        async fn get(&self, url: &str) -> Result<String, RoutingError> {
            self.requests.lock().unwrap().push(url.to_owned());
            self.body
                .clone()
                .ok_or_else(|| RoutingError::Network("connection refused".to_owned()))
        }
    }
}
