//! Address lookup through the store

use pizza_api::Position;
use std::sync::Arc;
use std::time::Duration;
use storefront::environment::LocationError;
use storefront::mocks::{test_environment, MockGeocoder, MockGeolocation};
use storefront::user::ADDRESS_ERROR_MESSAGE;
use storefront::{storefront_store, AddressStatus, AppAction, StorefrontEnvironment, UserAction};

const ADDRESS: &str = "Baixa, Lisbon 1100-148, Portugal";

fn lisbon() -> Position {
    Position::new(38.7, -9.1)
}

fn environment(geolocation: &Arc<MockGeolocation>, geocoder: &Arc<MockGeocoder>) -> StorefrontEnvironment {
    StorefrontEnvironment {
        geolocation: Arc::clone(geolocation) as _,
        geocoder: Arc::clone(geocoder) as _,
        ..test_environment()
    }
}

#[tokio::test]
async fn test_fetch_address() {
    let geolocation = Arc::new(MockGeolocation::at(lisbon()));
    let geocoder = Arc::new(MockGeocoder::new(ADDRESS));
    let store = storefront_store(environment(&geolocation, &geocoder));

    store
        .send(AppAction::User(UserAction::FetchAddress))
        .await
        .wait()
        .await;

    let user = store.state(|s| s.user.clone()).await;
    assert_eq!(user.status, AddressStatus::Success);
    assert_eq!(user.position, Some(lisbon()));
    assert_eq!(user.address.as_deref(), Some(ADDRESS));
    assert!(user.error.is_none());
}

#[tokio::test]
async fn test_refetch_supersedes_running_lookup() {
    let geolocation = Arc::new(
        MockGeolocation::denied()
            .then(Duration::from_millis(500), Ok(Position::new(1.0, 1.0)))
            .then(Duration::ZERO, Ok(lisbon())),
    );
    let geocoder = Arc::new(MockGeocoder::new(ADDRESS));
    let store = storefront_store(environment(&geolocation, &geocoder));

    let mut first = store.send(AppAction::User(UserAction::FetchAddress)).await;
    // Let the first lookup reach the device before asking again
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut second = store.send(AppAction::User(UserAction::FetchAddress)).await;

    second.wait().await;
    first
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    let user = store.state(|s| s.user.clone()).await;
    assert_eq!(user.status, AddressStatus::Success);
    assert_eq!(user.position, Some(lisbon()));
    assert_eq!(user.request, 2);
    assert_eq!(geolocation.calls(), 2);
    // The first lookup was aborted while waiting for a position
    assert_eq!(geocoder.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fetches_settle_on_latest_request() {
    for _ in 0..20 {
        let geolocation = Arc::new(
            MockGeolocation::at(lisbon())
                .then(Duration::from_millis(5), Ok(lisbon()))
                .then(Duration::from_millis(5), Ok(lisbon())),
        );
        let geocoder = Arc::new(MockGeocoder::new(ADDRESS));
        let store = storefront_store(environment(&geolocation, &geocoder));

        let sends = [store.clone(), store.clone()].map(|store| {
            tokio::spawn(async move { store.send(AppAction::User(UserAction::FetchAddress)).await })
        });
        for send in sends {
            let mut handle = tokio_test::assert_ok!(send.await);
            tokio_test::assert_ok!(handle.wait_with_timeout(Duration::from_secs(1)).await);
        }

        let user = store.state(|s| s.user.clone()).await;
        assert_eq!(user.request, 2);
        assert_eq!(user.status, AddressStatus::Success);
        assert_eq!(user.address.as_deref(), Some(ADDRESS));
    }
}

#[tokio::test]
async fn test_retry_after_failure() {
    let geolocation = Arc::new(
        MockGeolocation::at(lisbon()).then(Duration::ZERO, Err(LocationError::PermissionDenied)),
    );
    let geocoder = Arc::new(MockGeocoder::new(ADDRESS));
    let store = storefront_store(environment(&geolocation, &geocoder));

    store
        .send(AppAction::User(UserAction::FetchAddress))
        .await
        .wait()
        .await;
    let user = store.state(|s| s.user.clone()).await;
    assert_eq!(user.status, AddressStatus::Error);
    assert_eq!(user.error.as_deref(), Some(ADDRESS_ERROR_MESSAGE));

    store
        .send(AppAction::User(UserAction::FetchAddress))
        .await
        .wait()
        .await;
    let user = store.state(|s| s.user.clone()).await;
    assert_eq!(user.status, AddressStatus::Success);
    assert_eq!(user.address.as_deref(), Some(ADDRESS));
    assert!(user.error.is_none());
}

#[tokio::test]
async fn test_geocoding_failure_is_an_address_error() {
    let geolocation = Arc::new(MockGeolocation::at(lisbon()));
    let geocoder = Arc::new(MockGeocoder::failing());
    let store = storefront_store(environment(&geolocation, &geocoder));

    store
        .send(AppAction::User(UserAction::FetchAddress))
        .await
        .wait()
        .await;

    let user = store.state(|s| s.user.clone()).await;
    assert_eq!(user.status, AddressStatus::Error);
    assert!(user.address.is_none());
    assert_eq!(geocoder.calls(), 1);
}
