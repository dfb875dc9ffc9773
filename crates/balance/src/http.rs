use common::{Money, OrderId};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dto::{ApiEnvelope, CompleteRequest, PreorderData, PreorderRequest, ProductSnapshot};
use crate::gateway::BalanceGateway;
use crate::resilience::{ResilienceConfig, ResilienceEnvelope};
use crate::GatewayError;

/// HTTP implementation of the balance gateway.
///
/// Every outbound request goes through the [`ResilienceEnvelope`]; the
/// per-attempt timeout lives there, not on the reqwest client.
#[derive(Clone)]
pub struct HttpBalanceGateway {
    client: Client,
    base_url: String,
    envelope: ResilienceEnvelope,
}

impl HttpBalanceGateway {
    /// Creates a gateway for the service at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>, config: ResilienceConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::external("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            envelope: ResilienceEnvelope::new(config),
        })
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &str,
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::external(context, e))?;
        Self::read_envelope(response, context).await
    }

    async fn post_envelope<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::external(context, e))?;
        Self::read_envelope(response, context).await
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::external(context, format!("HTTP {status}")));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::external(context, e))?;

        // A transport-level success that rejects the operation, or that
        // arrives without a payload, is still an external failure.
        match envelope.data {
            Some(data) if envelope.success => Ok(data),
            _ => Err(GatewayError::External(format!(
                "{context}: no valid response from balance service{}",
                envelope
                    .message
                    .map(|m| format!(" ({m})"))
                    .unwrap_or_default()
            ))),
        }
    }
}

#[async_trait]
impl BalanceGateway for HttpBalanceGateway {
    #[tracing::instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<ProductSnapshot>, GatewayError> {
        self.envelope
            .execute("fetch products", || {
                self.get_envelope::<Vec<ProductSnapshot>>("/api/products", "Failed to fetch products")
            })
            .await
    }

    #[tracing::instrument(skip(self, amount), fields(%order_id))]
    async fn place_block(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PreorderData, GatewayError> {
        let request = PreorderRequest {
            order_id: order_id.to_string(),
            amount,
        };
        self.envelope
            .execute("preorder", || {
                self.post_envelope::<_, PreorderData>(
                    "/api/balance/preorder",
                    &request,
                    "Failed to create preorder",
                )
            })
            .await
    }

    #[tracing::instrument(skip(self), fields(%order_id))]
    async fn complete_remote(&self, order_id: OrderId) -> Result<PreorderData, GatewayError> {
        let request = CompleteRequest {
            order_id: order_id.to_string(),
        };
        self.envelope
            .execute("complete", || {
                self.post_envelope::<_, PreorderData>(
                    "/api/balance/complete",
                    &request,
                    "Failed to complete order",
                )
            })
            .await
    }
}
