//! Wire types for the restaurant and geocoding APIs

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Money amount in euros
///
/// Sent over the wire as a plain JSON number, as the restaurant API does.
/// Whole amounts go out as integers. Fractional amounts go out as `f64`, which
/// is exact up to about 15 significant digits; that covers any menu price
/// but not arbitrary decimals.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Zero euros
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a money amount from a decimal
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from whole euros
    #[must_use]
    pub fn from_euros(euros: i64) -> Self {
        Self(Decimal::from(euros))
    }

    /// Creates a money amount from cents
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns the decimal amount
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiplies by a quantity
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Takes a whole-number percentage of this amount
    #[must_use]
    pub fn percent(self, percent: u32) -> Self {
        Self(self.0 * Decimal::new(i64::from(percent), 2))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{:.2}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero() {
            if let Some(whole) = self.0.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(serde::ser::Error::custom(format!(
                "money amount {} is not representable as a number",
                self.0
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

/// Server-assigned order identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new `OrderId` from a string
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One pizza line in a cart or an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Menu id of the pizza
    pub pizza_id: u32,
    /// Display name
    pub name: String,
    /// Number of pizzas
    pub quantity: u32,
    /// Price of one pizza
    pub unit_price: Money,
    /// `quantity × unit_price`
    pub total_price: Money,
}

impl CartItem {
    /// A single pizza
    #[must_use]
    pub fn new(pizza_id: u32, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            pizza_id,
            name: name.into(),
            quantity: 1,
            unit_price,
            total_price: unit_price,
        }
    }

    /// Same line with a different quantity; the total follows
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self.total_price = self.unit_price.times(quantity);
        self
    }
}

/// A pizza on the menu
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Menu id
    pub id: u32,
    /// Display name
    pub name: String,
    /// Price of one pizza
    pub unit_price: Money,
    /// Picture of the pizza
    #[serde(default)]
    pub image_url: String,
    /// Toppings
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Whether the pizza can currently be ordered
    #[serde(default)]
    pub sold_out: bool,
}

impl MenuItem {
    /// A one-pizza cart line for this menu item
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem::new(self.id, self.name.clone(), self.unit_price)
    }
}

/// Geographic position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Position {
    /// Creates a position
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Body of `POST /order`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Customer name
    pub customer: String,
    /// Contact phone number
    pub phone: String,
    /// Delivery address
    pub address: String,
    /// Priority delivery
    pub priority: bool,
    /// Pizzas ordered
    pub cart: Vec<CartItem>,
    /// `"lat,lng"` of the delivery address, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// An order as confirmed by the restaurant
///
/// Customer name, phone and address are not part of this type; the
/// restaurant does not return them when an order is looked up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned id
    pub id: OrderId,
    /// Kitchen status, e.g. `preparing`
    pub status: String,
    /// Priority delivery
    pub priority: bool,
    /// Surcharge for priority delivery
    #[serde(default)]
    pub priority_price: Money,
    /// Price of the pizzas
    pub order_price: Money,
    /// When the order should arrive
    pub estimated_delivery: DateTime<Utc>,
    /// Pizzas ordered
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

impl Order {
    /// Pizzas plus priority surcharge
    #[must_use]
    pub fn total(&self) -> Money {
        self.order_price + self.priority_price
    }
}

/// Body of `PATCH /order/{id}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Switch priority delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<bool>,
}

impl OrderUpdate {
    /// Upgrade an order to priority delivery
    #[must_use]
    pub const fn make_priority() -> Self {
        Self {
            priority: Some(true),
        }
    }
}

/// `{ "data": ... }` wrapper used by every restaurant endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) data: T,
}
