//! Ninja account balance entry point.

use ninja_client::banner::BalanceBanner;
use ninja_client::config::ClientConfig;
use ninja_client::controller::BalanceController;
use ninja_client::default_model::DefaultModelResolver;
use ninja_client::error::ClientError;
use ninja_client::feature_flags::StaticFeatureFlags;
use ninja_client::fetcher::HttpBalanceFetcher;
use ninja_client::logging::init_tracing;
use ninja_core::BalanceView;
use ninja_storage::MemoryBalanceStore;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::load()?;
    init_tracing(&config.log_filter)?;

    let models = DefaultModelResolver::new(StaticFeatureFlags::from_payloads(
        config.feature_payloads.clone(),
    ));
    let model = models.resolve().await;
    tracing::info!(model = %model, "Default model resolved");

    let fetcher = HttpBalanceFetcher::from_config(&config)?;
    let controller = BalanceController::new(
        fetcher,
        MemoryBalanceStore::global(),
        config.controller_config(),
    );

    let Some(credentials) = config.credentials() else {
        tracing::warn!("No API base URL or API key configured; balance unavailable");
        return Ok(());
    };
    tracing::info!(fingerprint = credentials.fingerprint().short(), "Binding credentials");
    controller.bind(Some(credentials));

    let mut views = controller.subscribe();
    let view = settled(&mut views).await?;
    print_view(&config, &view);

    let Some(interval) = config.refresh_interval() else {
        controller.shutdown();
        return Ok(());
    };

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => controller.refresh(),
            changed = views.changed() => {
                changed?;
                let view = views.borrow_and_update().clone();
                if !view.is_loading {
                    print_view(&config, &view);
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    controller.shutdown();
    Ok(())
}

/// Wait until the controller is no longer loading.
async fn settled(views: &mut watch::Receiver<BalanceView>) -> Result<BalanceView, ClientError> {
    let view = views
        .wait_for(|view| !view.is_loading)
        .await?;
    Ok(view.clone())
}

fn print_view(config: &ClientConfig, view: &BalanceView) {
    if let Some(error) = &view.error {
        eprintln!("Balance unavailable: {}", error);
    }
    match BalanceBanner::from_view(config.api_base_url.as_deref(), view).text() {
        Some(text) => println!("{}", text),
        None => println!("No balance to show"),
    }
}
