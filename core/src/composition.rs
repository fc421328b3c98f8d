//! Reducer composition utilities
//!
//! A root reducer owns several slices. Each slice reducer is written against
//! its own state and action types; [`scope`] embeds it into the parent by
//! focusing on a field of the parent state and lifting its effects into the
//! parent action type.
//!
//! # Example
//!
//! ```
//! use pizza_core::composition::scope;
//! use pizza_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Default)]
//! struct AppState {
//!     counter: CounterState,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Counter(CounterAction),
//! }
//!
//! let scoped = scope(CounterReducer, |s: &mut AppState| &mut s.counter, AppAction::Counter);
//! let mut state = AppState::default();
//! let _effects = scoped.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.counter.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Embeds a slice reducer into a parent state and action.
///
/// `focus` picks the slice out of the parent state and `embed` wraps the
/// slice's actions (including those produced by its effects) into the parent
/// action type.
pub const fn scope<R, S, A>(
    reducer: R,
    focus: fn(&mut S) -> &mut R::State,
    embed: fn(R::Action) -> A,
) -> Scoped<R, S, A>
where
    R: Reducer,
{
    Scoped {
        reducer,
        focus,
        embed,
    }
}

/// A slice reducer focused on part of a parent state.
///
/// Created by [`scope`].
pub struct Scoped<R, S, A>
where
    R: Reducer,
{
    reducer: R,
    focus: fn(&mut S) -> &mut R::State,
    embed: fn(R::Action) -> A,
}

impl<R, S, A> Scoped<R, S, A>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    /// Runs the slice reducer on its part of `state` and lifts its effects.
    pub fn reduce(
        &self,
        state: &mut S,
        action: R::Action,
        env: &R::Environment,
    ) -> SmallVec<[Effect<A>; 4]> {
        let slice = (self.focus)(state);
        let embed = self.embed;
        self.reducer
            .reduce(slice, action, env)
            .into_iter()
            .filter(|effect| !effect.is_none())
            .map(|effect| effect.map(embed))
            .collect()
    }

    /// The wrapped slice reducer
    pub const fn inner(&self) -> &R {
        &self.reducer
    }
}

impl<R, S, A> Clone for Scoped<R, S, A>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            focus: self.focus,
            embed: self.embed,
        }
    }
}

impl<R, S, A> std::fmt::Debug for Scoped<R, S, A>
where
    R: Reducer + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoped")
            .field("reducer", &self.reducer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{smallvec, SmallVec};

    #[derive(Clone, Debug, Default)]
    struct Badge {
        count: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum BadgeAction {
        Bump,
        Echo,
    }

    #[derive(Debug, Default)]
    struct Root {
        badge: Badge,
        title: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum RootAction {
        Badge(BadgeAction),
    }

    #[derive(Clone, Debug)]
    struct BadgeReducer;

    impl Reducer for BadgeReducer {
        type State = Badge;
        type Action = BadgeAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Badge,
            action: BadgeAction,
            _env: &(),
        ) -> SmallVec<[Effect<BadgeAction>; 4]> {
            match action {
                BadgeAction::Bump => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                BadgeAction::Echo => {
                    smallvec![Effect::future(async { Some(BadgeAction::Bump) })]
                },
            }
        }
    }

    #[test]
    fn scoped_reducer_touches_only_its_slice() {
        let scoped = scope(BadgeReducer, |s: &mut Root| &mut s.badge, RootAction::Badge);
        let mut state = Root {
            title: "menu".to_string(),
            ..Root::default()
        };

        let effects = scoped.reduce(&mut state, BadgeAction::Bump, &());

        assert_eq!(state.badge.count, 1);
        assert_eq!(state.title, "menu");
        assert!(effects.is_empty());
    }

    #[tokio::test]
    async fn scoped_effects_are_lifted() {
        let scoped = scope(BadgeReducer, |s: &mut Root| &mut s.badge, RootAction::Badge);
        let mut state = Root::default();

        let mut effects = scoped.reduce(&mut state, BadgeAction::Echo, &());

        assert_eq!(effects.len(), 1);
        let Some(Effect::Future(fut)) = effects.pop() else {
            unreachable!("echo produces a future");
        };
        assert_eq!(fut.await, Some(RootAction::Badge(BadgeAction::Bump)));
    }
}
