//! Restaurant API client implementation

use crate::{
    error::ApiError,
    types::{Envelope, MenuItem, NewOrder, Order, OrderId, OrderUpdate},
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Public restaurant API
pub const DEFAULT_API_URL: &str = "https://react-fast-pizza-api.jonas.io/api";

/// Restaurant API client
///
/// Every call is a fresh request; nothing is cached and nothing is retried.
#[derive(Clone, Debug)]
pub struct PizzaApiClient {
    client: Client,
    api_url: String,
}

impl PizzaApiClient {
    /// Create a client for the public restaurant API
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Create a client for the API at `api_url` (no trailing slash needed)
    #[must_use]
    pub fn with_base_url(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `GET /menu`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MenuUnavailable`] for non-success statuses, or
    /// transport and parsing errors.
    #[tracing::instrument(skip(self))]
    pub async fn menu(&self) -> Result<Vec<MenuItem>, ApiError> {
        let response = self
            .client
            .get(format!("{}/menu", self.api_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::error!(status, "Menu request rejected");
            return Err(ApiError::MenuUnavailable { status });
        }

        data(response).await
    }

    /// `GET /order/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::OrderNotFound`] for any non-success status, so
    /// callers can tell an unknown order apart from a network failure
    /// ([`ApiError::RequestFailed`]).
    #[tracing::instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let response = self
            .client
            .get(format!("{}/order/{}", self.api_url, id))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status, "Order lookup rejected");
            return Err(ApiError::OrderNotFound {
                id: id.clone(),
                status,
            });
        }

        data(response).await
    }

    /// `POST /order`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::OrderCreationFailed`] for non-success statuses, or
    /// transport and parsing errors.
    #[tracing::instrument(skip(self, order), fields(items = order.cart.len(), priority = order.priority))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let response = self
            .client
            .post(format!("{}/order", self.api_url))
            .header("content-type", "application/json")
            .json(order)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::error!(status, "Order creation rejected");
            return Err(ApiError::OrderCreationFailed { status });
        }

        let created: Order = data(response).await?;
        tracing::info!(order_id = %created.id, "Order created");
        Ok(created)
    }

    /// `PATCH /order/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::OrderUpdateFailed`] for non-success statuses, or
    /// transport errors.
    #[tracing::instrument(skip(self, update), fields(order_id = %id))]
    pub async fn update_order(&self, id: &OrderId, update: &OrderUpdate) -> Result<(), ApiError> {
        let response = self
            .client
            .patch(format!("{}/order/{}", self.api_url, id))
            .header("content-type", "application/json")
            .json(update)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::error!(status, "Order update rejected");
            return Err(ApiError::OrderUpdateFailed { status });
        }

        Ok(())
    }
}

impl Default for PizzaApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwraps the `{ "data": ... }` envelope
async fn data<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    serde_json::from_slice::<Envelope<T>>(&body)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PizzaApiClient::new();
        assert_eq!(client.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        let client = PizzaApiClient::with_base_url("http://localhost:3000/api/");
        assert_eq!(client.api_url(), "http://localhost:3000/api");
    }
}
