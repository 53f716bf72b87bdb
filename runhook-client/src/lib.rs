//! Runhook HTTP Client
//!
//! Authenticated HTTP access to the orchestrator that triggered a run task.
//!
//! Unlike a base-URL API client, every URL used here is handed to us by the
//! orchestrator inside the run task payload, so methods take absolute URLs
//! together with the run's access token.
//!
//! # Example
//!
//! ```no_run
//! use runhook_client::OrchestratorClient;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> runhook_client::Result<()> {
//!     let client = OrchestratorClient::new();
//!
//!     client
//!         .download_plan(
//!             "https://app.example.com/api/v2/plans/plan-1/json-output",
//!             "token",
//!             Path::new("/tmp/plan.json"),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod artifacts;
mod task_results;

pub use error::{ClientError, Result};

use reqwest::{Client, StatusCode};

/// HTTP client for orchestrator artifact and callback endpoints
///
/// - Artifact retrieval (configuration bundle, plan document)
/// - Task result callbacks
#[derive(Debug, Clone, Default)]
pub struct OrchestratorClient {
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new orchestrator client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use runhook_client::OrchestratorClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .connect_timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = OrchestratorClient::with_client(http_client);
    /// ```
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Ensure the orchestrator answered 200 OK
    ///
    /// Any other status becomes an [`ClientError::ApiError`] carrying the
    /// response body.
    async fn ensure_ok(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serves `router` on an ephemeral local port and returns its base URL
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
