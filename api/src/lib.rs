//! # Fast Pizza API Client
//!
//! Rust client for the Fast Pizza restaurant API (menu and orders) and for
//! the reverse-geocoding service used to pre-fill delivery addresses.
//!
//! ## Example
//!
//! ```no_run
//! use pizza_api::{OrderId, PizzaApiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PizzaApiClient::new();
//!
//!     let menu = client.menu().await?;
//!     println!("{} pizzas on the menu", menu.len());
//!
//!     match client.get_order(&OrderId::from("IIDSAT")).await {
//!         Ok(order) => println!("Order status: {}", order.status),
//!         Err(e) if e.is_not_found() => println!("{e}"),
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod geocoding;
pub mod types;

// Re-export main types for convenience
pub use client::PizzaApiClient;
pub use error::ApiError;
pub use geocoding::GeocodingClient;
pub use types::{CartItem, MenuItem, Money, NewOrder, Order, OrderId, OrderUpdate, Position};
