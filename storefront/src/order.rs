//! Order lookup and priority upgrade.
//!
//! Every load is a fresh request; nothing is cached between views.

use crate::environment::StorefrontEnvironment;
use pizza_api::{ApiError, Order, OrderId, OrderUpdate};
use pizza_core::{
    effect::{Effect, EffectId},
    environment::Clock,
    reducer::Reducer,
    smallvec, SmallVec,
};
use std::sync::Arc;

/// Registration id of the running order lookup
pub const LOAD_ORDER: EffectId = EffectId::new("load-order");

/// Whole minutes until `order` should arrive, negative once it is late
#[must_use]
pub fn minutes_left(order: &Order, clock: &dyn Clock) -> i64 {
    let seconds = (order.estimated_delivery - clock.now()).num_seconds();
    (seconds + 30).div_euclid(60)
}

/// What the order page shows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OrderView {
    /// No order requested
    #[default]
    Idle,
    /// Lookup in flight
    Loading(OrderId),
    /// Order found
    Loaded(Order),
    /// Lookup failed; [`ApiError::is_not_found`] tells a wrong id apart
    Failed(ApiError),
}

impl OrderView {
    /// The loaded order, if any
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        match self {
            Self::Loaded(order) => Some(order),
            _ => None,
        }
    }
}

/// State of the order slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderState {
    /// Current view
    pub view: OrderView,
    /// A priority upgrade is in flight
    pub updating: bool,
    /// Last failed priority upgrade
    pub update_error: Option<ApiError>,
}

/// Order actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderAction {
    /// Look up an order
    LoadOrder(OrderId),
    /// Lookup succeeded
    OrderLoaded(Order),
    /// Lookup failed
    OrderLoadFailed(ApiError),
    /// Upgrade an order to priority delivery
    MakePriority(OrderId),
    /// Upgrade accepted
    PriorityUpdated(OrderId),
    /// Upgrade rejected
    PriorityUpdateFailed(ApiError),
}

/// Reducer for the order slice
#[derive(Clone, Debug, Default)]
pub struct OrderReducer;

impl OrderReducer {
    /// Creates a new `OrderReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn load(state: &mut OrderState, id: OrderId, env: &StorefrontEnvironment) -> Effect<OrderAction> {
        state.view = OrderView::Loading(id.clone());
        let api = Arc::clone(&env.api);

        Effect::future(async move {
            Some(match api.get_order(id).await {
                Ok(order) => OrderAction::OrderLoaded(order),
                Err(error) => OrderAction::OrderLoadFailed(error),
            })
        })
        .cancellable(LOAD_ORDER)
    }
}

impl Reducer for OrderReducer {
    type State = OrderState;
    type Action = OrderAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            OrderAction::LoadOrder(id) => {
                tracing::debug!(order_id = %id, "Loading order");
                smallvec![Self::load(state, id, env)]
            },

            OrderAction::OrderLoaded(order) => {
                state.view = OrderView::Loaded(order);
                SmallVec::new()
            },

            OrderAction::OrderLoadFailed(error) => {
                if error.is_not_found() {
                    tracing::info!(%error, "Order not found");
                } else {
                    tracing::error!(%error, "Order lookup failed");
                }
                state.view = OrderView::Failed(error);
                SmallVec::new()
            },

            OrderAction::MakePriority(id) => {
                if state.updating {
                    return SmallVec::new();
                }
                state.updating = true;
                state.update_error = None;
                let api = Arc::clone(&env.api);

                smallvec![Effect::future(async move {
                    Some(match api.update_order(id.clone(), OrderUpdate::make_priority()).await {
                        Ok(()) => OrderAction::PriorityUpdated(id),
                        Err(error) => OrderAction::PriorityUpdateFailed(error),
                    })
                })]
            },

            OrderAction::PriorityUpdated(id) => {
                state.updating = false;
                smallvec![Self::load(state, id, env)]
            },

            OrderAction::PriorityUpdateFailed(error) => {
                tracing::error!(%error, "Priority upgrade failed");
                state.updating = false;
                state.update_error = Some(error);
                SmallVec::new()
            },
        }
    }
}
