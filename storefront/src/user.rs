//! Customer slice: name and the delivery address found from the device position.

use crate::environment::{LocationError, StorefrontEnvironment};
use pizza_api::Position;
use pizza_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
    smallvec, SmallVec,
};
use std::sync::Arc;

/// Registration id of the running address lookup
pub const FETCH_ADDRESS: EffectId = EffectId::new("fetch-address");

/// Shown next to the address field when the lookup fails
pub const ADDRESS_ERROR_MESSAGE: &str =
    "There was a problem getting your address. Make sure to fill this field!";

/// Progress of the address lookup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressStatus {
    /// Never asked
    #[default]
    Idle,
    /// Lookup in flight
    Loading,
    /// Position and address are known
    Success,
    /// Last lookup failed
    Error,
}

/// State of the user slice
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserState {
    /// Customer name
    pub username: String,
    /// Address lookup progress
    pub status: AddressStatus,
    /// Device position from the last successful lookup
    pub position: Option<Position>,
    /// Address from the last successful lookup
    pub address: Option<String>,
    /// User-facing message, set only while `status` is `Error`
    pub error: Option<String>,
    /// Generation of the latest lookup; results of older lookups are dropped
    pub request: u64,
}

impl UserState {
    /// Whether an address lookup is running
    #[must_use]
    pub fn is_loading_address(&self) -> bool {
        self.status == AddressStatus::Loading
    }

    /// Position as the `"lat,lng"` string sent with an order
    #[must_use]
    pub fn position_param(&self) -> Option<String> {
        self.position.map(|position| position.to_string())
    }
}

/// User actions
#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
    /// Overwrite the customer name
    SetUsername(String),
    /// Look up the delivery address from the device position
    FetchAddress,
    /// Lookup `request` succeeded
    AddressFetched {
        /// Lookup generation
        request: u64,
        /// Device position
        position: Position,
        /// Formatted address
        address: String,
    },
    /// Lookup `request` failed
    AddressFetchFailed {
        /// Lookup generation
        request: u64,
        /// Underlying cause, for the logs
        message: String,
    },
}

/// Reducer for the user slice
#[derive(Clone, Debug, Default)]
pub struct UserReducer;

impl UserReducer {
    /// Creates a new `UserReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn fetch_address(request: u64, env: &StorefrontEnvironment) -> Effect<UserAction> {
        let geolocation = Arc::clone(&env.geolocation);
        let geocoder = Arc::clone(&env.geocoder);

        Effect::future(async move {
            let lookup = async {
                let position = geolocation.acquire_position().await?;
                let address = geocoder.reverse_geocode(position).await?;
                Ok::<_, LocationError>((position, address))
            };

            Some(match lookup.await {
                Ok((position, address)) => UserAction::AddressFetched {
                    request,
                    position,
                    address,
                },
                Err(error) => UserAction::AddressFetchFailed {
                    request,
                    message: error.to_string(),
                },
            })
        })
        .cancellable(FETCH_ADDRESS)
    }
}

impl Reducer for UserReducer {
    type State = UserState;
    type Action = UserAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            UserAction::SetUsername(username) => {
                state.username = username;
                SmallVec::new()
            },

            UserAction::FetchAddress => {
                state.request += 1;
                state.status = AddressStatus::Loading;
                state.error = None;
                tracing::debug!(request = state.request, "Fetching address");
                smallvec![Self::fetch_address(state.request, env)]
            },

            UserAction::AddressFetched {
                request,
                position,
                address,
            } => {
                if request != state.request {
                    tracing::debug!(request, current = state.request, "Dropping stale address");
                    return SmallVec::new();
                }
                state.status = AddressStatus::Success;
                state.position = Some(position);
                state.address = Some(address);
                state.error = None;
                SmallVec::new()
            },

            UserAction::AddressFetchFailed { request, message } => {
                if request != state.request {
                    tracing::debug!(request, current = state.request, "Dropping stale address failure");
                    return SmallVec::new();
                }
                tracing::warn!(error = %message, "Address lookup failed");
                state.status = AddressStatus::Error;
                state.error = Some(ADDRESS_ERROR_MESSAGE.to_string());
                SmallVec::new()
            },
        }
    }
}
