//! Storefront demo.
//!
//! Loads the menu, fills a cart, looks up the address when a position is
//! configured, and places the order when `PIZZA_DEMO_SUBMIT=1`.

use anyhow::{bail, Context};
use pizza_api::{GeocodingClient, PizzaApiClient};
use storefront::{
    config::Config, minutes_left, order_total, storefront_store, AppAction, CartAction,
    CheckoutAction, CheckoutState, MenuAction, OrderAction, OrderView, StorefrontEnvironment,
    UserAction,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=info,pizza_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        api_url = %config.api.base_url,
        geocoding_url = %config.api.geocoding_url,
        position = ?config.location.position,
        "Configuration loaded"
    );

    let environment = StorefrontEnvironment::live(
        PizzaApiClient::with_base_url(&config.api.base_url),
        GeocodingClient::with_url(&config.api.geocoding_url),
        config.geolocation(),
    );
    let clock = std::sync::Arc::clone(&environment.clock);
    let store = storefront_store(environment);

    // Menu
    store.send(AppAction::Menu(MenuAction::LoadMenu)).await.wait().await;
    let menu = store.state(|s| s.menu.clone()).await;
    if let storefront::MenuState::Failed(message) = &menu {
        bail!("{message}");
    }
    println!("=== Menu ===");
    for pizza in menu.items() {
        let marker = if pizza.sold_out { " (sold out)" } else { "" };
        println!("  #{:<3} {:<20} {}{marker}", pizza.id, pizza.name, pizza.unit_price);
    }

    // Cart: the first two pizzas on offer, two of the first one
    let picks: Vec<_> = menu.available().take(2).cloned().collect();
    for pizza in &picks {
        store
            .send(AppAction::Cart(CartAction::AddItem(pizza.to_cart_item())))
            .await;
    }
    if let Some(first) = picks.first() {
        store
            .send(AppAction::Cart(CartAction::IncreaseItemQuantity(first.id)))
            .await;
    }

    let cart = store.state(|s| s.cart.cart.clone()).await;
    println!("\n=== Cart ===");
    for item in cart.items() {
        println!("  {}× {:<20} {}", item.quantity, item.name, item.total_price);
    }
    println!("  {} pizzas, {}", cart.total_quantity(), cart.total_price());
    println!(
        "  with priority delivery: {}",
        order_total(cart.total_price(), true)
    );

    // Customer
    store
        .send(AppAction::User(UserAction::SetUsername("Ana".to_string())))
        .await;
    if config.location.position.is_some() {
        store
            .send(AppAction::User(UserAction::FetchAddress))
            .await
            .wait()
            .await;
        let user = store.state(|s| s.user.clone()).await;
        match (&user.address, &user.error) {
            (Some(address), _) => println!("\nDelivering to {address}"),
            (None, Some(error)) => warn!(%error, "No address"),
            (None, None) => {},
        }
    }

    if !config.demo.submit {
        println!("\nSet PIZZA_DEMO_SUBMIT=1 to place this order.");
        return Ok(());
    }

    // Checkout
    let mut form = store
        .state(|s| s.checkout_form(&config.demo.phone, false))
        .await
        .context("building the checkout form")?;
    if form.address.is_empty() {
        form.address = "1 Main St".to_string();
    }
    store
        .send(AppAction::Checkout(CheckoutAction::SubmitOrder(form)))
        .await
        .wait()
        .await;

    let redirect = match store.state(|s| s.checkout.clone()).await {
        CheckoutState::Placed(redirect) => redirect,
        CheckoutState::Invalid(errors) => bail!("invalid order form: {errors:?}"),
        CheckoutState::Failed(message) => bail!("{message}"),
        state => bail!("order not placed: {state:?}"),
    };
    println!("\nOrder placed, continue at {redirect}");

    // Order page
    let id = redirect
        .order_id()
        .context("redirect does not point at an order")?;
    store
        .send(AppAction::Order(OrderAction::LoadOrder(id)))
        .await
        .wait()
        .await;
    match store.state(|s| s.order.view.clone()).await {
        OrderView::Loaded(order) => {
            println!("=== Order #{} ({}) ===", order.id, order.status);
            let minutes = minutes_left(&order, clock.as_ref());
            if minutes >= 0 {
                println!("  Only {minutes} minutes left");
            } else {
                println!("  Order should have arrived");
            }
            println!("  To pay on delivery: {}", order.total());
        },
        OrderView::Failed(error) => bail!(error),
        view => bail!("order not loaded: {view:?}"),
    }

    Ok(())
}
