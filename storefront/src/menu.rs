//! Menu slice.

use crate::environment::StorefrontEnvironment;
use pizza_api::MenuItem;
use pizza_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;

/// State of the menu slice
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuState {
    /// Not requested yet
    #[default]
    Idle,
    /// Request in flight
    Loading,
    /// Pizzas on offer
    Loaded(Vec<MenuItem>),
    /// Request failed
    Failed(String),
}

impl MenuState {
    /// Pizzas on offer, empty until loaded
    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        match self {
            Self::Loaded(items) => items,
            _ => &[],
        }
    }

    /// Pizzas that can be added to the cart right now
    pub fn available(&self) -> impl Iterator<Item = &MenuItem> {
        self.items().iter().filter(|item| !item.sold_out)
    }
}

/// Menu actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuAction {
    /// Fetch the menu
    LoadMenu,
    /// Menu fetched
    MenuLoaded(Vec<MenuItem>),
    /// Menu could not be fetched
    MenuLoadFailed(String),
}

/// Reducer for the menu slice
#[derive(Clone, Debug, Default)]
pub struct MenuReducer;

impl MenuReducer {
    /// Creates a new `MenuReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for MenuReducer {
    type State = MenuState;
    type Action = MenuAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            MenuAction::LoadMenu => {
                *state = MenuState::Loading;
                let api = Arc::clone(&env.api);
                smallvec![Effect::future(async move {
                    Some(match api.menu().await {
                        Ok(items) => MenuAction::MenuLoaded(items),
                        Err(error) => {
                            tracing::error!(%error, "Menu request failed");
                            MenuAction::MenuLoadFailed(error.to_string())
                        },
                    })
                })]
            },
            MenuAction::MenuLoaded(items) => {
                tracing::debug!(pizzas = items.len(), "Menu loaded");
                *state = MenuState::Loaded(items);
                SmallVec::new()
            },
            MenuAction::MenuLoadFailed(message) => {
                *state = MenuState::Failed(message);
                SmallVec::new()
            },
        }
    }
}
