//! Service entrypoint: configuration, wiring, and the Axum server.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vital_market::adapters::http::{app_router, billing::BillingAppState};
use vital_market::adapters::postgres::{
    PostgresListingRepository, PostgresPaymentLedger, PostgresSubscriptionRepository,
    PostgresUserRepository, PostgresWebhookEventRepository,
};
use vital_market::adapters::stripe::{StripeClient, StripeClientConfig};
use vital_market::application::handlers::billing::ProcessWebhookHandler;
use vital_market::config::AppConfig;
use vital_market::domain::billing::{
    CheckoutCompletedHandler, HandlerRegistry, IdempotentWebhookProcessor, InvoiceHandler,
    StripeWebhookVerifier, SubscriptionLifecycleHandler, SubscriptionResolver,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    info!(
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "starting vital-market"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let subscriptions = Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let listings = Arc::new(PostgresListingRepository::new(pool.clone()));
    let ledger = Arc::new(PostgresPaymentLedger::new(pool.clone()));
    let events = Arc::new(PostgresWebhookEventRepository::new(pool.clone()));

    let provider = Arc::new(StripeClient::new(StripeClientConfig::new(
        config.payment.stripe_api_key.clone(),
    )));

    let resolver = Arc::new(SubscriptionResolver::new(
        users.clone(),
        subscriptions.clone(),
        provider.clone(),
    ));

    let registry = HandlerRegistry::new()
        .register(Arc::new(CheckoutCompletedHandler::new(
            users.clone(),
            listings,
            ledger.clone(),
            provider.clone(),
        )))
        .register(Arc::new(SubscriptionLifecycleHandler::new(
            users.clone(),
            subscriptions.clone(),
            resolver.clone(),
        )))
        .register(Arc::new(InvoiceHandler::new(
            users,
            subscriptions,
            ledger,
            resolver,
        )));

    let processor = Arc::new(IdempotentWebhookProcessor::new(registry, events));
    let verifier = StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone());

    let state = BillingAppState {
        webhook_handler: Arc::new(ProcessWebhookHandler::new(
            verifier,
            processor,
            config.payment.require_livemode,
        )),
    };

    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
