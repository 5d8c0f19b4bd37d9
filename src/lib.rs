use std::sync::Arc;

use api::ApiClient;
use auth::{AuthSessionManager, FileTokenStore, TokenStore};
use cache::TtlCache;
use config::Config;
use error::AppError;
use store::{
    AnalyticsSlice, CategoriesSlice, FileManagerSlice, NavLinksSlice, PublicationsSlice,
    ResourceSlice, SettingsSlice,
};
use utils::{Clock, Notifier, SystemClock};

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod store;
pub mod utils;

/// 应用状态
///
/// 所有组件通过它显式传递，不存在全局单例。克隆共享同一份缓存、会话和切片状态。
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub cache: TtlCache,
    pub notifier: Notifier,
    pub auth: Arc<AuthSessionManager>,
    pub nav_links: NavLinksSlice,
    pub analytics: AnalyticsSlice,
    pub settings: SettingsSlice,
    pub publications: PublicationsSlice,
    pub categories: CategoriesSlice,
    pub file_manager: FileManagerSlice,
}

impl AppState {
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// 从环境变量加载配置，令牌保存在 AUTH_TOKEN_PATH
    pub fn from_env() -> Result<Self, AppError> {
        let config = Config::from_env();
        let tokens = Arc::new(FileTokenStore::new(config.auth_token_path.clone()));
        Self::builder().config(config).token_store(tokens).build()
    }
}

/// 组装 [`AppState`]，config 和 token_store 为必填项
#[derive(Default, Debug)]
pub struct AppStateBuilder {
    config: Option<Config>,
    token_store: Option<Arc<dyn TokenStore>>,
    clock: Option<Arc<dyn Clock>>,
    notifier: Option<Notifier>,
}

impl AppStateBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<AppState, AppError> {
        let config = self
            .config
            .ok_or_else(|| AppError::Configuration("缺少 config".into()))?;
        let tokens = self
            .token_store
            .ok_or_else(|| AppError::Configuration("缺少 token_store".into()))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let notifier = self.notifier.unwrap_or_default();

        let cache = TtlCache::with_clock(config.cache_ttl(), clock.clone());
        let api = ApiClient::new(&config, tokens.clone())?;
        let auth = Arc::new(AuthSessionManager::with_clock(api.clone(), tokens, clock));

        let slices = SliceFactory {
            cache: &cache,
            notifier: &notifier,
            auth: &auth,
        };

        tracing::debug!("Building app state for {}", config.api_url);
        Ok(AppState {
            nav_links: NavLinksSlice::new(api.clone(), slices.make("nav_links")),
            analytics: AnalyticsSlice::new(api.clone(), slices.make("analytics")),
            settings: SettingsSlice::new(api.clone(), slices.make("settings")),
            publications: PublicationsSlice::new(
                api.clone(),
                cache.clone(),
                notifier.clone(),
                slices.make("featured_publications"),
                slices.make("publication_search"),
            ),
            categories: CategoriesSlice::new(
                api.clone(),
                notifier.clone(),
                slices.make("categories"),
            ),
            file_manager: FileManagerSlice::new(api.clone(), cache.clone(), notifier.clone())
                .with_auth(auth.clone()),
            config,
            api,
            cache,
            notifier,
            auth,
        })
    }
}

struct SliceFactory<'a> {
    cache: &'a TtlCache,
    notifier: &'a Notifier,
    auth: &'a Arc<AuthSessionManager>,
}

impl SliceFactory<'_> {
    fn make<T>(&self, name: &'static str) -> ResourceSlice<T>
    where
        T: Clone + serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        ResourceSlice::new(name, self.cache.clone(), self.notifier.clone()).with_auth(self.auth.clone())
    }
}
