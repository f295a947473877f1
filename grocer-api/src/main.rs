use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use grocer_api::{app, worker, AppState, CheckoutSettings};
use grocer_order::{OrderHistory, OrderRepository};
use grocer_store::{Config, FunctionsClient, OrderEmailNotifier, PaymobCheckout, PgOrderRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grocer_api=debug,grocer_order=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Grocer API on port {}", config.server.port);

    let orders: Arc<dyn OrderRepository> = match &config.database {
        Some(db) => {
            let repo = PgOrderRepository::connect(&db.url).await?;
            if db.run_migrations {
                repo.migrate().await?;
            }
            Arc::new(repo)
        }
        None => {
            tracing::warn!("No database configured; orders are kept in memory");
            Arc::new(OrderHistory::new())
        }
    };

    let functions = FunctionsClient::new(&config.services)?;

    let app_state = AppState::new(
        orders,
        Arc::new(PaymobCheckout::new(functions.clone())),
        Arc::new(OrderEmailNotifier::new(functions)),
        CheckoutSettings {
            delivery_fee: config.business_rules.delivery_fee,
            timeouts: config.checkout.timeouts(),
            session_idle: config.checkout.session_idle(),
        },
    );

    tokio::spawn(worker::start_session_sweeper(app_state.clone(), Duration::from_secs(60)));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
