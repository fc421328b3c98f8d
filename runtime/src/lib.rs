//! # Fast Pizza Runtime
//!
//! The [`Store`] owns application state, runs the reducer for every action
//! and executes the effects the reducer returns.
//!
//! ## Core Components
//!
//! - **Store**: Owns state behind a lock; created once at startup and cloned
//!   into whoever needs to dispatch or read
//! - **Effect Executor**: Spawns one task per effect and feeds produced
//!   actions back into the reducer
//! - **Cancellation Registry**: Tracks cancellable effects by id so a newer
//!   effect supersedes an older one
//!
//! ## Example
//!
//! ```ignore
//! use pizza_runtime::Store;
//!
//! let store = Store::new(AppState::default(), AppReducer::new(), environment);
//!
//! // Send an action and wait for every effect it caused
//! store.send(AppAction::Menu(MenuAction::LoadMenu)).await.wait().await;
//!
//! // Read state
//! let pizzas = store.state(|s| s.menu.items().len()).await;
//! ```

use futures::future::{join_all, BoxFuture};
use pizza_core::effect::{Effect, EffectId};
use pizza_core::reducer::Reducer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Timeout waiting for a matching action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires first.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it resolves once every effect
/// started by the action has finished, including effects started by the
/// actions those effects fed back into the store.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        Self::new().0
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: counter shared between a handle and the tasks it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: decrements the effect counter on drop, including on abort
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: counts an effect as started and returns the guard that ends it
fn track(tracking: &EffectTracking) -> DecrementGuard {
    tracking.increment();
    DecrementGuard(tracking.clone())
}

/// Internal: a running cancellable effect
struct Registration {
    token: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct CancellationRegistry {
    next_token: AtomicU64,
    running: Mutex<HashMap<EffectId, Registration>>,
}

impl CancellationRegistry {
    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst)
    }

    /// Registers `handle` under `id`, aborting whatever ran there before.
    ///
    /// A registration older than the one already held under `id` loses and
    /// is aborted itself.
    fn register(&self, id: EffectId, token: u64, handle: AbortHandle) {
        let mut running = match self.running.lock() {
            Ok(running) => running,
            Err(poisoned) => poisoned.into_inner(),
        };
        if running.get(&id).is_some_and(|current| current.token > token) {
            drop(running);
            tracing::debug!(effect_id = %id, "Dropping effect started before the running one");
            metrics::counter!("store.effects.cancelled", "reason" => "superseded").increment(1);
            handle.abort();
            return;
        }
        let previous = running.insert(id.clone(), Registration { token, handle });
        drop(running);

        if let Some(previous) = previous {
            if !previous.handle.is_finished() {
                tracing::debug!(effect_id = %id, "Superseding running effect");
                metrics::counter!("store.effects.cancelled", "reason" => "superseded").increment(1);
                previous.handle.abort();
            }
        }
    }

    /// Aborts the effect under `id`, if still running.
    fn cancel(&self, id: &EffectId) {
        let removed = match self.running.lock() {
            Ok(mut running) => running.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        };

        if let Some(registration) = removed {
            if !registration.handle.is_finished() {
                tracing::debug!(effect_id = %id, "Cancelling running effect");
                metrics::counter!("store.effects.cancelled", "reason" => "explicit").increment(1);
                registration.handle.abort();
            }
        }
    }

    /// Drops the registration under `id` if it still belongs to `token`.
    fn finish(&self, id: &EffectId, token: u64) {
        let mut running = match self.running.lock() {
            Ok(running) => running,
            Err(poisoned) => poisoned.into_inner(),
        };
        if running.get(id).is_some_and(|r| r.token == token) {
            running.remove(id);
        }
    }
}

/// The Store - runtime coordinator for a reducer
///
/// The Store manages:
/// 1. State (behind `RwLock` for concurrent access)
/// 2. Reducer (business logic)
/// 3. Environment (injected dependencies)
/// 4. Effect execution (with feedback loop)
///
/// Cloning a store is cheap; all clones share the same state.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    cancellations: Arc<CancellationRegistry>,
    /// Actions produced by effects, for observers waiting on a result
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        let (action_broadcast, _) = broadcast::channel(64);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            cancellations: Arc::new(CancellationRegistry::default()),
            action_broadcast,
        }
    }

    /// Send an action to the store
    ///
    /// Runs the reducer and starts the returned effects under the write
    /// lock, so cancellable effects register in the order their actions were
    /// reduced. Returns as soon as effects are started; use the returned
    /// [`EffectHandle`] to wait for them.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> EffectHandle {
        metrics::counter!("store.actions.total").increment(1);

        let (handle, tracking) = EffectHandle::new();

        let mut state = self.state.write().await;
        let effects = self.reducer.reduce(&mut *state, action, &self.environment);
        tracing::trace!("Reducer returned {} effects", effects.len());

        for effect in effects {
            self.execute_effect(effect, &tracking);
        }
        drop(state);

        handle
    }

    /// Send an action and wait for a matching action produced by its effects
    ///
    /// Subscribes before sending so a fast effect cannot be missed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action before `timeout`
    /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_broadcast.subscribe();

        let _handle = self.send(action).await;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to all actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let total = store.state(|s| s.cart.total_price()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Start an effect returned by the reducer
    fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Cancel(id) => {
                metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                self.cancellations.cancel(&id);
            },
            Effect::Cancellable { id, effect } => {
                metrics::counter!("store.effects.executed", "type" => "cancellable").increment(1);
                let token = self.cancellations.next_token();
                let registry = Arc::clone(&self.cancellations);
                let finished_id = id.clone();
                let store = self.clone();
                let guard = track(tracking);

                let task = tokio::spawn(async move {
                    let _guard = guard;
                    store.run_effect(*effect).await;
                    registry.finish(&finished_id, token);
                });

                self.cancellations.register(id, token, task.abort_handle());
            },
            effect => {
                metrics::counter!("store.effects.executed", "type" => "spawned").increment(1);
                let store = self.clone();
                let guard = track(tracking);

                tokio::spawn(async move {
                    let _guard = guard;
                    store.run_effect(effect).await;
                });
            },
        }
    }

    /// Run an effect to completion inside the current task
    ///
    /// Everything runs inline so that aborting the task aborts the whole
    /// effect tree.
    fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        self.feed_back(action).await;
                    } else {
                        tracing::trace!("Effect::Future completed with no action");
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    self.feed_back(*action).await;
                },
                Effect::Parallel(effects) => {
                    join_all(effects.into_iter().map(|e| self.run_effect(e))).await;
                },
                Effect::Sequential(effects) => {
                    for effect in effects {
                        self.run_effect(effect).await;
                    }
                },
                Effect::Cancellable { effect, .. } => {
                    self.run_effect(*effect).await;
                },
                Effect::Cancel(id) => self.cancellations.cancel(&id),
            }
        })
    }

    /// Broadcast an effect's action, send it, and wait for what it causes
    async fn feed_back(&self, action: A) {
        let _ = self.action_broadcast.send(action.clone());
        let mut handle = self.send(action).await;
        handle.wait().await;
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            cancellations: Arc::clone(&self.cancellations),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
