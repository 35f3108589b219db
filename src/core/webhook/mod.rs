//! Extraction record dispatch.
//!
//! Delivers the extracted customer record after a call ends. With a webhook
//! URL configured the record is POSTed as JSON; without one it is only
//! logged. Delivery is fire-and-forget: failures are logged, never retried.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::core::extract::ExtractionResult;

/// Errors from webhook delivery.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// HTTP request failed
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Webhook returned status {0}")]
    Status(StatusCode),
}

/// Destination for extracted records.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, call_id: &str, record: &ExtractionResult)
    -> Result<(), DispatchError>;
}

/// POSTs the record as JSON to a configured endpoint.
pub struct HttpDispatcher {
    client: reqwest::Client,
    url: String,
}

impl HttpDispatcher {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Dispatch for HttpDispatcher {
    async fn dispatch(
        &self,
        call_id: &str,
        record: &ExtractionResult,
    ) -> Result<(), DispatchError> {
        let response = self.client.post(&self.url).json(record).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }

        tracing::info!(call_id, "Extraction record delivered to webhook");
        Ok(())
    }
}

/// Logs the record instead of delivering it. Used when no webhook URL is
/// configured.
#[derive(Default)]
pub struct LogDispatcher;

#[async_trait]
impl Dispatch for LogDispatcher {
    async fn dispatch(
        &self,
        call_id: &str,
        record: &ExtractionResult,
    ) -> Result<(), DispatchError> {
        tracing::info!(call_id, record = ?record, "Extracted customer details (no webhook configured)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ExtractionResult {
        ExtractionResult {
            customer_name: "Peter".to_string(),
            country: "Belgium".to_string(),
            invoices_due_date: "in 30 days".to_string(),
            service_delivery: "yes".to_string(),
            factoring_contract: "no".to_string(),
            tax_debts: "none".to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_dispatcher_always_succeeds() {
        let dispatcher = LogDispatcher;
        dispatcher
            .dispatch("CA123", &sample_record())
            .await
            .unwrap();
    }
}
