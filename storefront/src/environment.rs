//! Capabilities injected into the storefront reducers.
//!
//! Reducers never talk to the network themselves. They clone the `Arc`s held
//! by [`StorefrontEnvironment`] into the effects they return, and the store
//! runs those effects.

use futures::future::BoxFuture;
use pizza_api::{
    ApiError, GeocodingClient, MenuItem, NewOrder, Order, OrderId, OrderUpdate, PizzaApiClient,
    Position,
};
use pizza_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use thiserror::Error;

/// Future returned by [`OrderApi`] methods
pub type ApiFuture<'a, T> = BoxFuture<'a, Result<T, ApiError>>;

/// Future returned by [`Geolocation`] and [`Geocoder`] methods
pub type LocationFuture<'a, T> = BoxFuture<'a, Result<T, LocationError>>;

/// Why no address could be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user refused to share their position
    #[error("Geolocation permission denied")]
    PermissionDenied,

    /// The device could not determine a position
    #[error("Position unavailable")]
    Unavailable,

    /// The position could not be turned into an address
    #[error("Reverse geocoding failed: {0}")]
    Geocoding(#[from] ApiError),
}

/// Restaurant API as seen by the reducers
pub trait OrderApi: Send + Sync {
    /// All pizzas on the menu
    fn menu(&self) -> ApiFuture<'_, Vec<MenuItem>>;

    /// Look up an order
    fn get_order(&self, id: OrderId) -> ApiFuture<'_, Order>;

    /// Place an order
    fn create_order(&self, order: NewOrder) -> ApiFuture<'_, Order>;

    /// Partially update an order
    fn update_order(&self, id: OrderId, update: OrderUpdate) -> ApiFuture<'_, ()>;
}

impl OrderApi for PizzaApiClient {
    fn menu(&self) -> ApiFuture<'_, Vec<MenuItem>> {
        Box::pin(PizzaApiClient::menu(self))
    }

    fn get_order(&self, id: OrderId) -> ApiFuture<'_, Order> {
        Box::pin(async move { PizzaApiClient::get_order(self, &id).await })
    }

    fn create_order(&self, order: NewOrder) -> ApiFuture<'_, Order> {
        Box::pin(async move { PizzaApiClient::create_order(self, &order).await })
    }

    fn update_order(&self, id: OrderId, update: OrderUpdate) -> ApiFuture<'_, ()> {
        Box::pin(async move { PizzaApiClient::update_order(self, &id, &update).await })
    }
}

/// Source of the device position
pub trait Geolocation: Send + Sync {
    /// Current position of the device
    fn acquire_position(&self) -> LocationFuture<'_, Position>;
}

/// Position to postal address
pub trait Geocoder: Send + Sync {
    /// Address at `position`
    fn reverse_geocode(&self, position: Position) -> LocationFuture<'_, String>;
}

impl Geocoder for GeocodingClient {
    fn reverse_geocode(&self, position: Position) -> LocationFuture<'_, String> {
        Box::pin(async move { Ok(GeocodingClient::reverse_geocode(self, position).await?) })
    }
}

/// Geolocation that always reports the same position
///
/// Used by the binary when `PIZZA_POSITION` is configured.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    position: Position,
}

impl FixedGeolocation {
    /// Creates a geolocation pinned to `position`
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self { position }
    }
}

impl Geolocation for FixedGeolocation {
    fn acquire_position(&self) -> LocationFuture<'_, Position> {
        let position = self.position;
        Box::pin(async move { Ok(position) })
    }
}

/// Geolocation for hosts without a position source
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl Geolocation for NoGeolocation {
    fn acquire_position(&self) -> LocationFuture<'_, Position> {
        Box::pin(async { Err(LocationError::Unavailable) })
    }
}

/// Everything the storefront reducers need from the outside world
#[derive(Clone)]
pub struct StorefrontEnvironment {
    /// Restaurant API
    pub api: Arc<dyn OrderApi>,
    /// Device position
    pub geolocation: Arc<dyn Geolocation>,
    /// Reverse geocoding
    pub geocoder: Arc<dyn Geocoder>,
    /// Time source for delivery estimates
    pub clock: Arc<dyn Clock>,
}

impl StorefrontEnvironment {
    /// Creates an environment from its parts
    #[must_use]
    pub fn new(
        api: Arc<dyn OrderApi>,
        geolocation: Arc<dyn Geolocation>,
        geocoder: Arc<dyn Geocoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            geolocation,
            geocoder,
            clock,
        }
    }

    /// Production environment: real HTTP clients and the wall clock
    #[must_use]
    pub fn live(
        api: PizzaApiClient,
        geocoder: GeocodingClient,
        geolocation: Arc<dyn Geolocation>,
    ) -> Self {
        Self::new(
            Arc::new(api),
            geolocation,
            Arc::new(geocoder),
            Arc::new(SystemClock),
        )
    }
}

impl std::fmt::Debug for StorefrontEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontEnvironment").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_geolocation_reports_its_position() {
        let geolocation = FixedGeolocation::new(Position::new(38.7, -9.1));
        assert_eq!(
            geolocation.acquire_position().await,
            Ok(Position::new(38.7, -9.1))
        );
    }

    #[tokio::test]
    async fn no_geolocation_fails() {
        assert_eq!(
            NoGeolocation.acquire_position().await,
            Err(LocationError::Unavailable)
        );
    }

    #[test]
    fn geocoding_errors_convert() {
        let error = LocationError::from(ApiError::AddressUnavailable { status: 503 });
        assert_eq!(error.to_string(), "Reverse geocoding failed: Failed getting address");
    }
}
