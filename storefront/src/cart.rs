//! Shopping cart slice.
//!
//! The cart operations are plain functions from a cart to a new cart; the
//! [`CartReducer`] only routes actions to them and records rejected
//! operations.

use crate::environment::StorefrontEnvironment;
use pizza_api::{CartItem, Money};
use pizza_core::{effect::Effect, reducer::Reducer, SmallVec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pizzas the customer is about to order, in the order they were added
///
/// Serializes as a plain JSON array of cart items, the same shape the
/// checkout form carries in its hidden `cart` field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// A cart holding `items` as they are
    #[must_use]
    pub const fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Cart lines in insertion order
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Takes the cart lines out
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Line with `pizza_id`, if present
    #[must_use]
    pub fn get(&self, pizza_id: u32) -> Option<&CartItem> {
        self.items.iter().find(|item| item.pizza_id == pizza_id)
    }

    /// Number of pizzas across all lines
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of every line total
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Whether no pizza is in the cart
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_quantity() == 0
    }

    /// Quantity of `pizza_id` in the cart, 0 when absent
    #[must_use]
    pub fn current_quantity(&self, pizza_id: u32) -> u32 {
        self.get(pizza_id).map_or(0, |item| item.quantity)
    }
}

/// Rejected cart operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantity change for a pizza that is not in the cart
    #[error("Pizza #{0} is not in the cart")]
    ItemNotFound(u32),
    /// Line added with no pizzas on it
    #[error("Pizza #{0} was added with quantity 0")]
    ZeroQuantity(u32),
}

/// Appends `item` to the cart, with its total recomputed from quantity and
/// unit price.
///
/// Adding a pizza that is already in the cart creates a second line; callers
/// offer "add" only for pizzas with no line yet.
///
/// # Errors
///
/// Returns [`CartError::ZeroQuantity`] for a line with no pizzas.
pub fn add_item(cart: &Cart, item: CartItem) -> Result<Cart, CartError> {
    if item.quantity == 0 {
        return Err(CartError::ZeroQuantity(item.pizza_id));
    }

    let quantity = item.quantity;
    let mut items = cart.items.clone();
    items.push(item.with_quantity(quantity));
    Ok(Cart { items })
}

/// Removes every line for `pizza_id`. Absent ids leave the cart as it was.
#[must_use]
pub fn delete_item(cart: &Cart, pizza_id: u32) -> Cart {
    Cart {
        items: cart
            .items
            .iter()
            .filter(|item| item.pizza_id != pizza_id)
            .cloned()
            .collect(),
    }
}

/// Adds one pizza to the line for `pizza_id`.
///
/// # Errors
///
/// Returns [`CartError::ItemNotFound`] when no line has that id.
pub fn increase_item_quantity(cart: &Cart, pizza_id: u32) -> Result<Cart, CartError> {
    let mut next = cart.clone();
    let item = next
        .items
        .iter_mut()
        .find(|item| item.pizza_id == pizza_id)
        .ok_or(CartError::ItemNotFound(pizza_id))?;

    item.quantity += 1;
    item.total_price = item.unit_price.times(item.quantity);
    Ok(next)
}

/// Takes one pizza off the line for `pizza_id`, dropping the line at zero.
///
/// # Errors
///
/// Returns [`CartError::ItemNotFound`] when no line has that id.
pub fn decrease_item_quantity(cart: &Cart, pizza_id: u32) -> Result<Cart, CartError> {
    let mut next = cart.clone();
    let item = next
        .items
        .iter_mut()
        .find(|item| item.pizza_id == pizza_id)
        .ok_or(CartError::ItemNotFound(pizza_id))?;

    item.quantity = item.quantity.saturating_sub(1);
    item.total_price = item.unit_price.times(item.quantity);

    if item.quantity == 0 {
        return Ok(delete_item(&next, pizza_id));
    }
    Ok(next)
}

/// An empty cart, whatever was in it before
#[must_use]
pub const fn clear_cart() -> Cart {
    Cart::new()
}

/// State of the cart slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartState {
    /// Current cart
    pub cart: Cart,
    /// Last rejected operation, cleared by the next accepted one
    pub last_error: Option<CartError>,
}

/// Cart actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Append a line
    AddItem(CartItem),
    /// Remove the line for a pizza
    DeleteItem(u32),
    /// One more of a pizza
    IncreaseItemQuantity(u32),
    /// One less of a pizza
    DecreaseItemQuantity(u32),
    /// Empty the cart
    ClearCart,
}

/// Reducer for the cart slice. Never returns effects.
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn apply(state: &mut CartState, result: Result<Cart, CartError>) {
        match result {
            Ok(cart) => {
                state.cart = cart;
                state.last_error = None;
            },
            Err(error) => {
                tracing::warn!(%error, "Cart operation rejected");
                state.last_error = Some(error);
            },
        }
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let result = match action {
            CartAction::AddItem(item) => add_item(&state.cart, item),
            CartAction::DeleteItem(pizza_id) => Ok(delete_item(&state.cart, pizza_id)),
            CartAction::IncreaseItemQuantity(pizza_id) => {
                increase_item_quantity(&state.cart, pizza_id)
            },
            CartAction::DecreaseItemQuantity(pizza_id) => {
                decrease_item_quantity(&state.cart, pizza_id)
            },
            CartAction::ClearCart => Ok(clear_cart()),
        };

        Self::apply(state, result);
        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::test_environment;
    use pizza_testing::{assertions, ReducerTest};
    use proptest::prelude::*;

    fn mediterranean() -> CartItem {
        CartItem::new(12, "Mediterranean", Money::from_euros(16))
    }

    fn margherita() -> CartItem {
        CartItem::new(1, "Margherita", Money::from_euros(12))
    }

    #[test]
    fn add_appends_without_touching_the_original() {
        let empty = Cart::new();
        let cart = add_item(&empty, mediterranean()).unwrap();

        assert!(empty.is_empty());
        assert_eq!(cart.items(), &[mediterranean()]);
    }

    #[test]
    fn increase_recomputes_total() {
        let cart = add_item(&Cart::new(), mediterranean()).unwrap();
        let cart = increase_item_quantity(&cart, 12).unwrap();

        let item = cart.get(12).unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.total_price, Money::from_euros(32));
    }

    #[test]
    fn decrease_to_zero_removes_the_line() {
        let cart = add_item(&add_item(&Cart::new(), margherita()).unwrap(), mediterranean()).unwrap();
        let cart = decrease_item_quantity(&cart, 12).unwrap();

        assert!(cart.get(12).is_none());
        assert_eq!(cart.items(), &[margherita()]);
    }

    #[test]
    fn quantity_change_for_missing_pizza_is_rejected() {
        let cart = add_item(&Cart::new(), margherita()).unwrap();

        assert_eq!(increase_item_quantity(&cart, 99), Err(CartError::ItemNotFound(99)));
        assert_eq!(decrease_item_quantity(&cart, 99), Err(CartError::ItemNotFound(99)));
    }

    #[test]
    fn delete_missing_pizza_is_a_no_op() {
        let cart = add_item(&Cart::new(), margherita()).unwrap();
        assert_eq!(delete_item(&cart, 99), cart);
    }

    #[test]
    fn delete_removes_duplicate_lines() {
        let cart = add_item(&add_item(&Cart::new(), margherita()).unwrap(), margherita()).unwrap();
        assert!(delete_item(&cart, 1).is_empty());
    }

    #[test]
    fn selectors() {
        let cart = Cart::from_items(vec![
            mediterranean().with_quantity(2),
            margherita().with_quantity(3),
        ]);

        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total_price(), Money::from_euros(68));
        assert_eq!(cart.current_quantity(12), 2);
        assert_eq!(cart.current_quantity(99), 0);
        assert!(!cart.is_empty());
    }

    #[test]
    fn empty_cart_selectors() {
        let cart = clear_cart();
        assert_eq!(cart.total_quantity(), 0);
        assert_eq!(cart.total_price(), Money::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let cart = Cart::from_items(vec![
            mediterranean().with_quantity(2),
            CartItem::new(3, "Spinach", Money::from_cents(1250)),
        ]);

        let json = serde_json::to_string(&cart).unwrap();
        let parsed: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn reducer_adds_and_increases() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_environment())
            .given_state(CartState::default())
            .when_action(CartAction::AddItem(mediterranean()))
            .when_action(CartAction::IncreaseItemQuantity(12))
            .then_state(|state| {
                assert_eq!(state.cart.total_quantity(), 2);
                assert_eq!(state.cart.total_price(), Money::from_euros(32));
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reducer_records_rejected_operation() {
        let cart = add_item(&Cart::new(), margherita()).unwrap();

        ReducerTest::new(CartReducer::new())
            .with_env(test_environment())
            .given_state(CartState {
                cart: cart.clone(),
                last_error: None,
            })
            .when_action(CartAction::DecreaseItemQuantity(42))
            .then_state(move |state| {
                assert_eq!(state.cart, cart);
                assert_eq!(state.last_error, Some(CartError::ItemNotFound(42)));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reducer_rejects_line_without_pizzas() {
        let item = CartItem::new(7, "Quattro Formaggi", Money::from_euros(10)).with_quantity(0);

        ReducerTest::new(CartReducer::new())
            .with_env(test_environment())
            .given_state(CartState::default())
            .when_action(CartAction::AddItem(item))
            .then_state(|state| {
                assert!(state.cart.items().is_empty());
                assert!(state.cart.is_empty());
                assert_eq!(state.last_error, Some(CartError::ZeroQuantity(7)));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reducer_recomputes_stale_line_total() {
        let item = CartItem {
            total_price: Money::from_euros(1),
            ..mediterranean().with_quantity(2)
        };

        ReducerTest::new(CartReducer::new())
            .with_env(test_environment())
            .given_state(CartState::default())
            .when_action(CartAction::AddItem(item))
            .then_state(|state| {
                assert_eq!(state.cart.get(12).unwrap().total_price, Money::from_euros(32));
                assert_eq!(state.cart.total_price(), Money::from_euros(32));
            })
            .run();
    }

    #[test]
    fn emptiness_follows_total_quantity() {
        let cart = Cart::from_items(vec![margherita().with_quantity(0)]);
        assert_eq!(cart.total_quantity(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn reducer_clears_error_on_next_success() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_environment())
            .given_state(CartState::default())
            .when_action(CartAction::IncreaseItemQuantity(1))
            .when_action(CartAction::AddItem(margherita()))
            .then_state(|state| {
                assert!(state.last_error.is_none());
                assert_eq!(state.cart.total_quantity(), 1);
            })
            .run();
    }

    #[test]
    fn clear_is_idempotent() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_environment())
            .given_state(CartState {
                cart: Cart::from_items(vec![mediterranean().with_quantity(2)]),
                last_error: None,
            })
            .when_actions([CartAction::ClearCart, CartAction::ClearCart])
            .then_state(|state| {
                assert!(state.cart.is_empty());
                assert_eq!(state.cart.total_price(), Money::ZERO);
            })
            .run();
    }

    #[derive(Clone, Debug)]
    enum Op {
        Add(u32, i64, u32, i64),
        Delete(u32),
        Increase(u32),
        Decrease(u32),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..5u32, 1..40i64, 0..4u32, 0..200i64)
                .prop_map(|(id, price, quantity, total)| Op::Add(id, price, quantity, total)),
            (0..5u32).prop_map(Op::Delete),
            (0..5u32).prop_map(Op::Increase),
            (0..5u32).prop_map(Op::Decrease),
            Just(Op::Clear),
        ]
    }

    fn run(cart: &Cart, op: Op) -> Cart {
        match op {
            Op::Add(id, price, quantity, total) => {
                if cart.get(id).is_some() {
                    return cart.clone();
                }
                let item = CartItem {
                    pizza_id: id,
                    name: format!("Pizza {id}"),
                    quantity,
                    unit_price: Money::from_euros(price),
                    total_price: Money::from_euros(total),
                };
                add_item(cart, item).unwrap_or_else(|_| cart.clone())
            },
            Op::Delete(id) => delete_item(cart, id),
            Op::Increase(id) => increase_item_quantity(cart, id).unwrap_or_else(|_| cart.clone()),
            Op::Decrease(id) => decrease_item_quantity(cart, id).unwrap_or_else(|_| cart.clone()),
            Op::Clear => clear_cart(),
        }
    }

    proptest! {
        /// Every line total equals quantity times unit price, and no line sits at zero
        #[test]
        fn line_totals_hold_after_any_sequence(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();
            for op in ops {
                cart = run(&cart, op);
                for item in cart.items() {
                    prop_assert!(item.quantity > 0);
                    prop_assert_eq!(item.total_price, item.unit_price.times(item.quantity));
                }
            }
        }

        /// The cart total is always the sum of the line totals
        #[test]
        fn total_price_matches_lines(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();
            for op in ops {
                cart = run(&cart, op);
            }
            let expected: Money = cart.items().iter().map(|i| i.unit_price.times(i.quantity)).sum();
            prop_assert_eq!(cart.total_price(), expected);
        }

        /// Decreasing a single pizza removes it entirely
        #[test]
        fn decrease_of_single_pizza_removes_it(id in 0..100u32, price in 1..50i64) {
            let cart = add_item(&Cart::new(), CartItem::new(id, "Pizza", Money::from_euros(price))).unwrap();
            let cart = decrease_item_quantity(&cart, id).unwrap();
            prop_assert!(cart.get(id).is_none());
            prop_assert!(cart.is_empty());
        }
    }
}
