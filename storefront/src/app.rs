//! Root state, action and reducer of the storefront.
//!
//! Each slice keeps its own reducer; [`AppReducer`] scopes them into
//! [`AppState`] and handles the one interaction between slices: a placed
//! order empties the cart.

use crate::cart::{CartAction, CartReducer, CartState};
use crate::checkout::{CheckoutAction, CheckoutReducer, CheckoutState, OrderForm, SubmitError};
use crate::environment::StorefrontEnvironment;
use crate::menu::{MenuAction, MenuReducer, MenuState};
use crate::order::{OrderAction, OrderReducer, OrderState};
use crate::user::{UserAction, UserReducer, UserState};
use pizza_core::{
    composition::{scope, Scoped},
    effect::Effect,
    reducer::Reducer,
    SmallVec,
};
use pizza_runtime::Store;

/// Whole storefront state
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Shopping cart
    pub cart: CartState,
    /// Customer name and address lookup
    pub user: UserState,
    /// Order submission
    pub checkout: CheckoutState,
    /// Order page
    pub order: OrderState,
    /// Menu page
    pub menu: MenuState,
}

impl AppState {
    /// Checkout form pre-filled from the user and cart slices
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::MalformedForm`] if the cart cannot be serialized.
    pub fn checkout_form(&self, phone: &str, priority: bool) -> Result<OrderForm, SubmitError> {
        Ok(OrderForm::new(
            self.user.username.clone(),
            phone,
            self.user.address.clone().unwrap_or_default(),
        )
        .with_cart(&self.cart.cart)?
        .with_priority(priority)
        .with_position(self.user.position_param()))
    }
}

/// Every storefront action, tagged by slice
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Cart slice
    Cart(CartAction),
    /// User slice
    User(UserAction),
    /// Checkout slice
    Checkout(CheckoutAction),
    /// Order slice
    Order(OrderAction),
    /// Menu slice
    Menu(MenuAction),
}

/// The storefront store
pub type StorefrontStore = Store<AppState, AppAction, StorefrontEnvironment, AppReducer>;

fn cart_slice(state: &mut AppState) -> &mut CartState {
    &mut state.cart
}

fn user_slice(state: &mut AppState) -> &mut UserState {
    &mut state.user
}

fn checkout_slice(state: &mut AppState) -> &mut CheckoutState {
    &mut state.checkout
}

fn order_slice(state: &mut AppState) -> &mut OrderState {
    &mut state.order
}

fn menu_slice(state: &mut AppState) -> &mut MenuState {
    &mut state.menu
}

/// Root reducer
#[derive(Debug)]
pub struct AppReducer {
    cart: Scoped<CartReducer, AppState, AppAction>,
    user: Scoped<UserReducer, AppState, AppAction>,
    checkout: Scoped<CheckoutReducer, AppState, AppAction>,
    order: Scoped<OrderReducer, AppState, AppAction>,
    menu: Scoped<MenuReducer, AppState, AppAction>,
}

impl AppReducer {
    /// Creates the root reducer with every slice scoped in
    #[must_use]
    pub fn new() -> Self {
        Self {
            cart: scope(CartReducer::new(), cart_slice, AppAction::Cart),
            user: scope(UserReducer::new(), user_slice, AppAction::User),
            checkout: scope(CheckoutReducer::new(), checkout_slice, AppAction::Checkout),
            order: scope(OrderReducer::new(), order_slice, AppAction::Order),
            menu: scope(MenuReducer::new(), menu_slice, AppAction::Menu),
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(?action, "Reducing");
        match action {
            AppAction::Cart(action) => self.cart.reduce(state, action, env),
            AppAction::User(action) => self.user.reduce(state, action, env),
            AppAction::Checkout(action) => {
                let placed = matches!(action, CheckoutAction::OrderPlaced(_));
                let mut effects = self.checkout.reduce(state, action, env);
                if placed {
                    effects.extend(self.cart.reduce(state, CartAction::ClearCart, env));
                }
                effects
            },
            AppAction::Order(action) => self.order.reduce(state, action, env),
            AppAction::Menu(action) => self.menu.reduce(state, action, env),
        }
    }
}

/// Builds the store the UI layer talks to
#[must_use]
pub fn storefront_store(environment: StorefrontEnvironment) -> StorefrontStore {
    Store::new(AppState::default(), AppReducer::new(), environment)
}
