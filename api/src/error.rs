//! Error types for the restaurant and geocoding clients

use crate::types::OrderId;
use thiserror::Error;

/// Errors that can occur when talking to the restaurant or geocoding API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a response
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The response body was not what we expected
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// `GET /menu` returned a non-success status
    #[error("Failed getting menu")]
    MenuUnavailable {
        /// HTTP status code
        status: u16,
    },

    /// `GET /order/{id}` returned a non-success status
    #[error("Couldn't find order #{id}")]
    OrderNotFound {
        /// The order that was looked up
        id: OrderId,
        /// HTTP status code
        status: u16,
    },

    /// `POST /order` returned a non-success status
    #[error("Failed creating your order")]
    OrderCreationFailed {
        /// HTTP status code
        status: u16,
    },

    /// `PATCH /order/{id}` returned a non-success status
    #[error("Failed updating your order")]
    OrderUpdateFailed {
        /// HTTP status code
        status: u16,
    },

    /// Reverse geocoding returned a non-success status
    #[error("Failed getting address")]
    AddressUnavailable {
        /// HTTP status code
        status: u16,
    },
}

impl ApiError {
    /// Whether this is the "unknown order" failure
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound { .. })
    }

    /// HTTP status code, when the server answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
            Self::MenuUnavailable { status }
            | Self::OrderNotFound { status, .. }
            | Self::OrderCreationFailed { status }
            | Self::OrderUpdateFailed { status }
            | Self::AddressUnavailable { status } => Some(*status),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::ResponseParseFailed(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}
