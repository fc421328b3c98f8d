//! Order submission.
//!
//! A submission goes through two steps. [`prepare_order`] turns the raw form
//! into a [`NewOrder`] and rejects bad input before anything is sent.
//! [`place_order`] sends the order and answers with where to go next.

use crate::cart::Cart;
use crate::environment::{OrderApi, StorefrontEnvironment};
use pizza_api::{CartItem, Money, NewOrder, OrderId};
use pizza_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Shown next to the phone field when it does not look like a phone number
pub const PHONE_ERROR_MESSAGE: &str =
    "Please give us your correct phone number. We might need it to contact you.";

/// Shown when the restaurant does not accept the order
pub const ORDER_FAILED_MESSAGE: &str = "Failed creating your order";

/// Priority delivery surcharge, as a percentage of the cart total
pub const PRIORITY_SURCHARGE_PERCENT: u32 = 20;

#[allow(clippy::expect_used)]
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?\d{1,4}?[-.\s]?\(?\d{1,3}?\)?[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9}$")
        .expect("phone pattern compiles")
});

/// Whether `phone` looks like a phone number
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Surcharge for priority delivery of a cart worth `cart_total`
#[must_use]
pub fn priority_price(cart_total: Money, priority: bool) -> Money {
    if priority {
        cart_total.percent(PRIORITY_SURCHARGE_PERCENT)
    } else {
        Money::ZERO
    }
}

/// What the customer pays for a cart worth `cart_total`
#[must_use]
pub fn order_total(cart_total: Money, priority: bool) -> Money {
    cart_total + priority_price(cart_total, priority)
}

/// The checkout form as submitted, every field still a string
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderForm {
    /// Customer name
    pub customer: String,
    /// Contact phone number
    pub phone: String,
    /// Delivery address
    pub address: String,
    /// Cart serialized as JSON
    pub cart: String,
    /// Checkbox value, `"on"` when ticked
    pub priority: Option<String>,
    /// `"lat,lng"` when the address came from the device position
    pub position: Option<String>,
}

impl OrderForm {
    /// A form with contact details and nothing else
    #[must_use]
    pub fn new(
        customer: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            customer: customer.into(),
            phone: phone.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    /// Fills the hidden cart field
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::MalformedForm`] if the cart cannot be serialized.
    pub fn with_cart(mut self, cart: &Cart) -> Result<Self, SubmitError> {
        self.cart =
            serde_json::to_string(cart).map_err(|e| SubmitError::MalformedForm(e.to_string()))?;
        Ok(self)
    }

    /// Ticks or unticks the priority checkbox
    #[must_use]
    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority.then(|| "on".to_string());
        self
    }

    /// Fills the hidden position field
    #[must_use]
    pub fn with_position(mut self, position: Option<String>) -> Self {
        self.position = position;
        self
    }
}

/// Per-field validation messages
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    /// Message for the phone field
    pub phone: Option<String>,
}

impl FieldErrors {
    /// Whether every field passed
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.phone.is_none()
    }
}

/// Why a submission did not produce an order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The customer has fields to fix; nothing was sent
    #[error("Order form has invalid fields")]
    Validation(FieldErrors),

    /// The restaurant did not accept the order
    #[error("{0}")]
    Api(String),

    /// The form itself is broken, e.g. the cart field is not valid JSON
    #[error("Malformed order form: {0}")]
    MalformedForm(String),
}

/// Where the UI should navigate after a successful submission
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Redirect(String);

impl Redirect {
    const ORDER_PREFIX: &'static str = "/order/";

    /// The confirmation page of order `id`
    #[must_use]
    pub fn to_order(id: &OrderId) -> Self {
        Self(format!("{}{id}", Self::ORDER_PREFIX))
    }

    /// Target path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }

    /// Order id, when this points at an order page
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        self.0
            .strip_prefix(Self::ORDER_PREFIX)
            .filter(|id| !id.is_empty())
            .map(OrderId::from)
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate(form: &OrderForm) -> FieldErrors {
    FieldErrors {
        phone: (!is_valid_phone(&form.phone)).then(|| PHONE_ERROR_MESSAGE.to_string()),
    }
}

/// Turns a submitted form into an order payload.
///
/// # Errors
///
/// - [`SubmitError::MalformedForm`] when the cart field is not a JSON cart
/// - [`SubmitError::Validation`] when a field needs fixing
pub fn prepare_order(form: OrderForm) -> Result<NewOrder, SubmitError> {
    let cart: Vec<CartItem> = serde_json::from_str(&form.cart)
        .map_err(|e| SubmitError::MalformedForm(format!("cart: {e}")))?;

    let errors = validate(&form);
    if !errors.is_empty() {
        return Err(SubmitError::Validation(errors));
    }

    Ok(NewOrder {
        customer: form.customer,
        phone: form.phone,
        address: form.address,
        priority: form.priority.as_deref() == Some("on"),
        cart,
        position: form.position.filter(|position| !position.is_empty()),
    })
}

/// Sends `order` to the restaurant.
///
/// # Errors
///
/// Returns [`SubmitError::Api`] with a generic message if the order was not
/// created. The cause is logged.
pub async fn place_order(api: &dyn OrderApi, order: NewOrder) -> Result<Redirect, SubmitError> {
    match api.create_order(order).await {
        Ok(created) => {
            tracing::info!(order_id = %created.id, "Order placed");
            metrics::counter!("storefront.orders.placed").increment(1);
            Ok(Redirect::to_order(&created.id))
        },
        Err(error) => {
            tracing::error!(%error, "Order creation failed");
            metrics::counter!("storefront.orders.failed").increment(1);
            Err(SubmitError::Api(ORDER_FAILED_MESSAGE.to_string()))
        },
    }
}

/// [`prepare_order`] then [`place_order`]
///
/// # Errors
///
/// See [`prepare_order`] and [`place_order`].
pub async fn submit_order(api: &dyn OrderApi, form: OrderForm) -> Result<Redirect, SubmitError> {
    let order = prepare_order(form)?;
    place_order(api, order).await
}

/// State of the checkout slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Last submission had fields to fix
    Invalid(FieldErrors),
    /// Order is on its way to the restaurant
    Submitting,
    /// Order accepted
    Placed(Redirect),
    /// Order not accepted, or the form was broken
    Failed(String),
}

impl CheckoutState {
    /// Whether a submission is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Validation messages of the last submission
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Checkout actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    /// The customer pressed "order now"
    SubmitOrder(OrderForm),
    /// The restaurant accepted the order
    OrderPlaced(Redirect),
    /// The restaurant did not accept the order
    OrderFailed(String),
}

/// Reducer for the checkout slice
///
/// Clearing the cart after a placed order is done by the root reducer, which
/// owns both slices.
#[derive(Clone, Debug, Default)]
pub struct CheckoutReducer;

impl CheckoutReducer {
    /// Creates a new `CheckoutReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CheckoutReducer {
    type State = CheckoutState;
    type Action = CheckoutAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CheckoutAction::SubmitOrder(form) => {
                if state.is_submitting() {
                    tracing::debug!("Submission already in flight");
                    return SmallVec::new();
                }

                match prepare_order(form) {
                    Ok(order) => {
                        *state = CheckoutState::Submitting;
                        let api = Arc::clone(&env.api);
                        smallvec![Effect::future(async move {
                            Some(match place_order(api.as_ref(), order).await {
                                Ok(redirect) => CheckoutAction::OrderPlaced(redirect),
                                Err(error) => CheckoutAction::OrderFailed(error.to_string()),
                            })
                        })]
                    },
                    Err(SubmitError::Validation(errors)) => {
                        tracing::debug!(?errors, "Order form rejected");
                        *state = CheckoutState::Invalid(errors);
                        SmallVec::new()
                    },
                    Err(error) => {
                        tracing::error!(%error, "Order form could not be read");
                        *state = CheckoutState::Failed(error.to_string());
                        SmallVec::new()
                    },
                }
            },

            CheckoutAction::OrderPlaced(redirect) => {
                *state = CheckoutState::Placed(redirect);
                SmallVec::new()
            },

            CheckoutAction::OrderFailed(message) => {
                *state = CheckoutState::Failed(message);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{test_environment, MockOrderApi};
    use pizza_testing::{assertions, helpers::collect_all, ReducerTest};

    fn cart() -> Cart {
        Cart::from_items(vec![
            CartItem::new(12, "Mediterranean", Money::from_euros(16)).with_quantity(2),
        ])
    }

    fn form(phone: &str) -> OrderForm {
        OrderForm::new("Ana", phone, "1 Main St").with_cart(&cart()).unwrap()
    }

    #[test]
    fn phone_pattern() {
        assert!(is_valid_phone("+15551234567"));
        assert!(is_valid_phone("+1-555-123-4567"));
        assert!(is_valid_phone("555 123 4567"));
        assert!(is_valid_phone("912345678"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn priority_pricing() {
        let total = Money::from_euros(32);
        assert_eq!(priority_price(total, false), Money::ZERO);
        assert_eq!(priority_price(total, true), Money::from_cents(640));
        assert_eq!(order_total(total, true), Money::from_cents(3840));
        assert_eq!(order_total(total, false), total);
    }

    #[test]
    fn prepare_builds_payload() {
        let order = prepare_order(form("+15551234567").with_priority(true)).unwrap();

        assert_eq!(order.customer, "Ana");
        assert_eq!(order.address, "1 Main St");
        assert!(order.priority);
        assert_eq!(order.cart, cart().into_items());
        assert!(order.position.is_none());
    }

    #[test]
    fn priority_is_off_unless_on() {
        let mut raw = form("+15551234567");
        raw.priority = Some("true".to_string());
        assert!(!prepare_order(raw).unwrap().priority);
        assert!(!prepare_order(form("+15551234567")).unwrap().priority);
    }

    #[test]
    fn empty_position_is_dropped() {
        let order =
            prepare_order(form("+15551234567").with_position(Some(String::new()))).unwrap();
        assert!(order.position.is_none());

        let order = prepare_order(form("+15551234567").with_position(Some("38.7,-9.1".into())))
            .unwrap();
        assert_eq!(order.position.as_deref(), Some("38.7,-9.1"));
    }

    #[test]
    fn bad_phone_is_a_field_error() {
        let error = prepare_order(form("123")).unwrap_err();
        assert_eq!(
            error,
            SubmitError::Validation(FieldErrors {
                phone: Some(PHONE_ERROR_MESSAGE.to_string()),
            })
        );
    }

    #[test]
    fn broken_cart_is_not_a_field_error() {
        let mut raw = form("123");
        raw.cart = "[{".to_string();
        assert!(matches!(prepare_order(raw), Err(SubmitError::MalformedForm(_))));
    }

    #[test]
    fn redirect_points_at_order() {
        let redirect = Redirect::to_order(&OrderId::from("ORD-1"));
        assert_eq!(redirect.path(), "/order/ORD-1");
        assert_eq!(redirect.order_id(), Some(OrderId::from("ORD-1")));
    }

    #[tokio::test]
    async fn place_order_hides_cause() {
        let api = MockOrderApi::new().failing_creation();
        let order = prepare_order(form("+15551234567")).unwrap();

        let error = place_order(&api, order).await.unwrap_err();
        assert_eq!(error, SubmitError::Api(ORDER_FAILED_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn submit_with_bad_phone_never_calls_api() {
        let api = MockOrderApi::new();

        let result = submit_order(&api, form("123")).await;

        assert!(matches!(result, Err(SubmitError::Validation(_))));
        assert!(api.created_orders().is_empty());
    }

    #[test]
    fn reducer_rejects_invalid_form_without_effects() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(test_environment())
            .given_state(CheckoutState::Idle)
            .when_action(CheckoutAction::SubmitOrder(form("123")))
            .then_state(|state| {
                assert_eq!(
                    state.field_errors().and_then(|e| e.phone.as_deref()),
                    Some(PHONE_ERROR_MESSAGE)
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reducer_ignores_double_submit() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(test_environment())
            .given_state(CheckoutState::Submitting)
            .when_action(CheckoutAction::SubmitOrder(form("+15551234567")))
            .then_state(|state| assert!(state.is_submitting()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn reducer_reports_broken_form() {
        let mut raw = form("+15551234567");
        raw.cart = "not json".to_string();

        ReducerTest::new(CheckoutReducer::new())
            .with_env(test_environment())
            .given_state(CheckoutState::Idle)
            .when_action(CheckoutAction::SubmitOrder(raw))
            .then_state(|state| assert!(matches!(state, CheckoutState::Failed(_))))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn reducer_submits_valid_form() {
        let env = test_environment();
        let mut state = CheckoutState::Idle;

        let effects = CheckoutReducer::new().reduce(
            &mut state,
            CheckoutAction::SubmitOrder(form("+15551234567")),
            &env,
        );
        assert!(state.is_submitting());
        assertions::assert_has_future_effect(&effects);

        let actions = collect_all(effects).await;
        assert_eq!(
            actions,
            vec![CheckoutAction::OrderPlaced(Redirect::to_order(&OrderId::from("ORD-1")))]
        );
    }

    #[test]
    fn failure_is_recorded() {
        ReducerTest::new(CheckoutReducer::new())
            .with_env(test_environment())
            .given_state(CheckoutState::Submitting)
            .when_action(CheckoutAction::OrderFailed(ORDER_FAILED_MESSAGE.to_string()))
            .then_state(|state| {
                assert_eq!(state, &CheckoutState::Failed(ORDER_FAILED_MESSAGE.to_string()));
            })
            .run();
    }
}
