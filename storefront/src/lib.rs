//! # Fast Pizza Storefront
//!
//! Headless core of the pizza ordering storefront: cart, customer address,
//! order submission, order page and menu, each a slice with its own reducer,
//! composed into one [`AppReducer`] and driven by a
//! [`Store`](pizza_runtime::Store).
//!
//! # Quick Start
//!
//! ```no_run
//! use pizza_api::{GeocodingClient, PizzaApiClient};
//! use storefront::{
//!     storefront_store, AppAction, CheckoutAction, MenuAction, NoGeolocation,
//!     StorefrontEnvironment,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = StorefrontEnvironment::live(
//!     PizzaApiClient::new(),
//!     GeocodingClient::new(),
//!     Arc::new(NoGeolocation),
//! );
//! let store = storefront_store(env);
//!
//! store.send(AppAction::Menu(MenuAction::LoadMenu)).await.wait().await;
//! let pizzas = store.state(|s| s.menu.items().len()).await;
//! println!("{pizzas} pizzas on the menu");
//!
//! let form = store.state(|s| s.checkout_form("+15551234567", false)).await?;
//! store
//!     .send(AppAction::Checkout(CheckoutAction::SubmitOrder(form)))
//!     .await
//!     .wait()
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod environment;
pub mod menu;
pub mod mocks;
pub mod order;
pub mod user;

// Re-export commonly used types
pub use app::{storefront_store, AppAction, AppReducer, AppState, StorefrontStore};
pub use cart::{Cart, CartAction, CartError, CartReducer, CartState};
pub use checkout::{
    order_total, priority_price, submit_order, CheckoutAction, CheckoutReducer, CheckoutState,
    FieldErrors, OrderForm, Redirect, SubmitError,
};
pub use config::Config;
pub use environment::{
    FixedGeolocation, Geocoder, Geolocation, LocationError, NoGeolocation, OrderApi,
    StorefrontEnvironment,
};
pub use menu::{MenuAction, MenuReducer, MenuState};
pub use order::{minutes_left, OrderAction, OrderReducer, OrderState, OrderView};
pub use user::{AddressStatus, UserAction, UserReducer, UserState};
