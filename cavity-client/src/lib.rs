//! Cavity HTTP Client
//!
//! A simple, type-safe HTTP client for the Cavity orchestrator API.
//!
//! # Example
//!
//! ```no_run
//! use cavity_client::OrchestratorClient;
//! use cavity_core::dto::simulation::CreateSimulation;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrchestratorClient::new("http://localhost:8080");
//!
//!     let sim = client
//!         .submit_simulation(&CreateSimulation {
//!             reynolds_number: Some(400.0),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let done = client
//!         .wait_for_completion(sim.id, Duration::from_secs(2), None)
//!         .await?;
//!     println!("Simulation {} is {}", done.id, done.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod simulations;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Cavity orchestrator API
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    ///
    /// # Example
    /// ```
    /// use cavity_client::OrchestratorClient;
    ///
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new orchestrator client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a result URL returned by the orchestrator against the base URL
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an error if the request failed,
    /// or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OrchestratorClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = OrchestratorClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_resolve_url() {
        let client = OrchestratorClient::new("http://localhost:8080");
        assert_eq!(
            client.resolve_url("/videos/sim_4.mp4"),
            "http://localhost:8080/videos/sim_4.mp4"
        );
        assert_eq!(
            client.resolve_url("https://cdn.example.com/sim_4.mp4"),
            "https://cdn.example.com/sim_4.mp4"
        );
    }
}
