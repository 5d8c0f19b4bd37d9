use media_hub::{AppState, auth::AuthState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置并组装状态
    let state = match AppState::from_env() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Using API at {}", state.config.api_url);

    // 检查本地令牌
    match state.auth.bootstrap().await {
        AuthState::Authenticated(session) => tracing::info!(
            "Signed in as {:?} (admin: {})",
            session.user.map(|u| u.email),
            session.is_admin
        ),
        other => tracing::info!("Session state: {:?}", other),
    }

    // 预热公开数据
    let nav_refresh = state.nav_links.load().await;
    let (settings, featured) = tokio::join!(
        state.settings.fetch(),
        state.publications.fetch_featured(state.config.featured_limit),
    );

    tracing::info!(
        "Nav links: {}",
        state.nav_links.state().data.map_or(0, |links| links.len())
    );
    match settings.data {
        Some(settings) => tracing::info!("Site: {}", settings.site_name),
        None => tracing::warn!("Settings unavailable: {:?}", settings.error),
    }
    tracing::info!(
        "Featured publications: {}",
        featured.data.map_or(0, |items| items.len())
    );

    if state.auth.is_admin() {
        let analytics = state.analytics.fetch().await;
        if let Some(analytics) = analytics.data {
            tracing::info!(
                "Dashboard: {} publications, {} files",
                analytics.total_publications,
                analytics.total_files
            );
        }
    }

    if let Some(task) = nav_refresh {
        task.join().await;
    }

    // --watch: 按配置周期刷新导航，直到 Ctrl-C
    if std::env::args().any(|arg| arg == "--watch") {
        let period = state.config.nav_refresh_interval();
        tracing::info!("Refreshing nav links every {:?}", period);
        let _refresh = state.nav_links.start_auto_refresh(period);
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Shutting down");
    }
}
