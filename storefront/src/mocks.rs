//! In-memory stand-ins for the restaurant API, geolocation and geocoding.
//!
//! Used by the unit and integration tests of this crate, and handy for
//! running the storefront without a network.

use crate::checkout::priority_price;
use crate::environment::{
    ApiFuture, Geocoder, Geolocation, LocationError, LocationFuture, OrderApi,
    StorefrontEnvironment,
};
use chrono::{DateTime, Utc};
use pizza_api::{ApiError, MenuItem, Money, NewOrder, Order, OrderId, OrderUpdate, Position};
use pizza_core::environment::SystemClock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Delivery estimate given to orders created by [`MockOrderApi`]
pub const MOCK_DELIVERY: &str = "2025-01-01T12:45:00Z";

fn mock_delivery() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(MOCK_DELIVERY)
        .map(|time| time.with_timezone(&Utc))
        .unwrap_or_default()
}

#[derive(Default)]
struct MockApiState {
    menu: Vec<MenuItem>,
    orders: HashMap<OrderId, Order>,
    created: Vec<NewOrder>,
    updates: Vec<(OrderId, OrderUpdate)>,
    lookups: usize,
    fail_menu: bool,
    fail_creation: bool,
    fail_update: bool,
}

/// Restaurant API backed by a map of orders
///
/// Created orders get ids `ORD-1`, `ORD-2`, ... and can be looked up
/// afterwards. Unknown ids answer like the real API does for a 404.
#[derive(Default)]
pub struct MockOrderApi {
    state: Mutex<MockApiState>,
}

impl MockOrderApi {
    /// An API with an empty menu and no orders
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `menu` from `menu()`
    #[must_use]
    pub fn with_menu(self, menu: Vec<MenuItem>) -> Self {
        self.lock().menu = menu;
        self
    }

    /// Make `order` known to `get_order`
    #[must_use]
    pub fn with_order(self, order: Order) -> Self {
        self.lock().orders.insert(order.id.clone(), order);
        self
    }

    /// Answer `menu()` with a server error
    #[must_use]
    pub fn failing_menu(self) -> Self {
        self.lock().fail_menu = true;
        self
    }

    /// Answer `create_order` with a server error
    #[must_use]
    pub fn failing_creation(self) -> Self {
        self.lock().fail_creation = true;
        self
    }

    /// Answer `update_order` with a server error
    #[must_use]
    pub fn failing_update(self) -> Self {
        self.lock().fail_update = true;
        self
    }

    /// Every payload passed to `create_order`, in order
    #[must_use]
    pub fn created_orders(&self) -> Vec<NewOrder> {
        self.lock().created.clone()
    }

    /// Every update passed to `update_order`, in order
    #[must_use]
    pub fn updates(&self) -> Vec<(OrderId, OrderUpdate)> {
        self.lock().updates.clone()
    }

    /// Number of `get_order` calls
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lock().lookups
    }

    fn lock(&self) -> MutexGuard<'_, MockApiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create(&self, order: NewOrder) -> Result<Order, ApiError> {
        let mut state = self.lock();
        state.created.push(order.clone());
        if state.fail_creation {
            return Err(ApiError::OrderCreationFailed { status: 500 });
        }

        let id = OrderId::new(format!("ORD-{}", state.created.len()));
        let order_price: Money = order.cart.iter().map(|item| item.total_price).sum();
        let created = Order {
            id: id.clone(),
            status: "preparing".to_string(),
            priority: order.priority,
            priority_price: priority_price(order_price, order.priority),
            order_price,
            estimated_delivery: mock_delivery(),
            cart: order.cart,
        };
        state.orders.insert(id, created.clone());
        Ok(created)
    }

    fn update(&self, id: OrderId, update: OrderUpdate) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.updates.push((id.clone(), update.clone()));
        if state.fail_update {
            return Err(ApiError::OrderUpdateFailed { status: 500 });
        }

        let order = state
            .orders
            .get_mut(&id)
            .ok_or(ApiError::OrderUpdateFailed { status: 404 })?;
        if let Some(priority) = update.priority {
            order.priority = priority;
            order.priority_price = priority_price(order.order_price, priority);
        }
        Ok(())
    }
}

impl OrderApi for MockOrderApi {
    fn menu(&self) -> ApiFuture<'_, Vec<MenuItem>> {
        let state = self.lock();
        let result = if state.fail_menu {
            Err(ApiError::MenuUnavailable { status: 500 })
        } else {
            Ok(state.menu.clone())
        };
        drop(state);
        Box::pin(async move { result })
    }

    fn get_order(&self, id: OrderId) -> ApiFuture<'_, Order> {
        let mut state = self.lock();
        state.lookups += 1;
        let result = state
            .orders
            .get(&id)
            .cloned()
            .ok_or(ApiError::OrderNotFound { id, status: 404 });
        drop(state);
        Box::pin(async move { result })
    }

    fn create_order(&self, order: NewOrder) -> ApiFuture<'_, Order> {
        let result = self.create(order);
        Box::pin(async move { result })
    }

    fn update_order(&self, id: OrderId, update: OrderUpdate) -> ApiFuture<'_, ()> {
        let result = self.update(id, update);
        Box::pin(async move { result })
    }
}

/// Geolocation that plays back scripted answers
///
/// Each call takes the next scripted `(delay, result)`; once the script is
/// used up every call answers `fallback` immediately.
pub struct MockGeolocation {
    script: Mutex<VecDeque<(Duration, Result<Position, LocationError>)>>,
    fallback: Result<Position, LocationError>,
    calls: AtomicUsize,
}

impl MockGeolocation {
    /// Always answers `position`
    #[must_use]
    pub fn at(position: Position) -> Self {
        Self::answering(Ok(position))
    }

    /// Always refuses
    #[must_use]
    pub fn denied() -> Self {
        Self::answering(Err(LocationError::PermissionDenied))
    }

    fn answering(fallback: Result<Position, LocationError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer the next unscripted call with `result` after `delay`
    #[must_use]
    pub fn then(self, delay: Duration, result: Result<Position, LocationError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((delay, result));
        self
    }

    /// Number of `acquire_position` calls
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geolocation for MockGeolocation {
    fn acquire_position(&self) -> LocationFuture<'_, Position> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| (Duration::ZERO, self.fallback.clone()));

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

/// Geocoder that answers every position with the same address
pub struct MockGeocoder {
    result: Result<String, LocationError>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    /// Always answers `address`
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            result: Ok(address.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails like an unreachable geocoding service
    #[must_use]
    pub fn failing() -> Self {
        Self {
            result: Err(LocationError::Geocoding(ApiError::AddressUnavailable { status: 503 })),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `reverse_geocode` calls
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for MockGeocoder {
    fn reverse_geocode(&self, _position: Position) -> LocationFuture<'_, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

/// Environment with an empty [`MockOrderApi`], no position and a fixed address
#[must_use]
pub fn test_environment() -> StorefrontEnvironment {
    StorefrontEnvironment::new(
        Arc::new(MockOrderApi::new()),
        Arc::new(MockGeolocation::denied()),
        Arc::new(MockGeocoder::new("Unknown")),
        Arc::new(SystemClock),
    )
}

/// Environment whose device sits at `position`, found at `address`
#[must_use]
pub fn test_environment_with_location(
    position: Position,
    address: impl Into<String>,
) -> StorefrontEnvironment {
    StorefrontEnvironment {
        geolocation: Arc::new(MockGeolocation::at(position)),
        geocoder: Arc::new(MockGeocoder::new(address)),
        ..test_environment()
    }
}

/// Four pizzas, the last one sold out
#[must_use]
pub fn sample_menu() -> Vec<MenuItem> {
    let pizza = |id: u32, name: &str, euros: i64, sold_out: bool| MenuItem {
        id,
        name: name.to_string(),
        unit_price: Money::from_euros(euros),
        image_url: format!("https://example.com/pizzas/{id}.jpg"),
        ingredients: vec!["tomato".to_string(), "mozzarella".to_string()],
        sold_out,
    };

    vec![
        pizza(1, "Margherita", 12, false),
        pizza(2, "Capricciosa", 14, false),
        pizza(12, "Mediterranean", 16, false),
        pizza(18, "Diavola", 16, true),
    ]
}

/// A confirmed order for two Mediterranean pizzas
#[must_use]
pub fn sample_order(id: &str, priority: bool) -> Order {
    let cart = vec![
        pizza_api::CartItem::new(12, "Mediterranean", Money::from_euros(16)).with_quantity(2),
    ];
    let order_price: Money = cart.iter().map(|item| item.total_price).sum();
    Order {
        id: OrderId::from(id),
        status: "preparing".to_string(),
        priority,
        priority_price: priority_price(order_price, priority),
        order_price,
        estimated_delivery: mock_delivery(),
        cart,
    }
}
