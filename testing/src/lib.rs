//! # Fast Pizza Testing
//!
//! Testing utilities for reducers and effects.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - Effect assertions
//! - [`helpers::collect_actions`] to run an effect tree without a Store
//! - A deterministic [`FixedClock`]
//!
//! ## Example
//!
//! ```ignore
//! use pizza_testing::{assertions, ReducerTest};
//!
//! ReducerTest::new(CartReducer::new())
//!     .with_env(test_environment())
//!     .given_state(CartState::default())
//!     .when_action(CartAction::ClearCart)
//!     .then_state(|state| assert!(state.cart.is_empty()))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use pizza_core::environment::Clock;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of shared environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use pizza_testing::mocks::FixedClock;
    /// use pizza_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 12:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_732_800, 0).unwrap_or_default())
    }
}

/// Test helpers
pub mod helpers {
    use futures::future::BoxFuture;
    use pizza_core::effect::Effect;
    use std::future::Future;
    use std::time::Duration;

    /// Polls `check` until it holds or `timeout` passes.
    ///
    /// Store observers see a fed-back action before the store has reduced
    /// it; use this to wait for the state that action leads to.
    pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if check().await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Runs an effect tree inline and returns the actions it produced.
    ///
    /// Produced actions are not reduced; delays are slept through.
    /// `Cancel` effects are ignored.
    pub fn collect_actions<A>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        Box::pin(async move {
            match effect {
                Effect::None | Effect::Cancel(_) => Vec::new(),
                Effect::Future(fut) => fut.await.into_iter().collect(),
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    vec![*action]
                },
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    let mut actions = Vec::new();
                    for effect in effects {
                        actions.extend(collect_actions(effect).await);
                    }
                    actions
                },
                Effect::Cancellable { effect, .. } => collect_actions(*effect).await,
            }
        })
    }

    /// Runs every effect in order and returns all produced actions.
    pub async fn collect_all<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            actions.extend(collect_actions(effect).await);
        }
        actions
    }
}

pub use mocks::{test_clock, FixedClock};

#[cfg(test)]
mod tests {
    use super::*;
    use pizza_core::effect::{Effect, EffectId};
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn collect_actions_walks_the_tree() {
        let effect = Effect::chain(vec![
            Effect::future(async { Some(1) }),
            Effect::merge(vec![Effect::future(async { None }), Effect::future(async { Some(2) })]),
            Effect::Delay {
                duration: Duration::from_millis(1),
                action: Box::new(3),
            }
            .cancellable(EffectId::new("delay")),
            Effect::Cancel(EffectId::new("delay")),
        ]);

        assert_eq!(helpers::collect_actions(effect).await, vec![1, 2, 3]);
    }

    #[test]
    fn collect_all_keeps_effect_order() {
        let effects = vec![
            Effect::future(async { Some("first") }),
            Effect::None,
            Effect::future(async { Some("second") }),
        ];

        let actions = tokio_test::block_on(helpers::collect_all(effects));
        assert_eq!(actions, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn eventually_waits_for_the_condition() {
        let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let setter = std::sync::Arc::clone(&flag);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            setter.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        let held = helpers::eventually(Duration::from_secs(1), || {
            let flag = std::sync::Arc::clone(&flag);
            async move { flag.load(std::sync::atomic::Ordering::SeqCst) }
        })
        .await;
        assert!(held);
    }

    #[tokio::test]
    async fn eventually_gives_up_after_timeout() {
        let held = helpers::eventually(Duration::from_millis(20), || async { false }).await;
        assert!(!held);
    }
}
