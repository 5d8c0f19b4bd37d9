use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::{Instant, interval_at};

use crate::api::ApiClient;
use crate::api::schema::NavLink;
use crate::cache::keys::NAV_LINKS;
use crate::store::resource::ResourceState;
use crate::store::slice::{FetchOptions, ResourceSlice};
use crate::store::task::BackgroundTask;

/// 传入的刷新周期无效时使用
pub const FALLBACK_REFRESH_PERIOD: Duration = Duration::from_secs(600);

/// 导航链接
///
/// 命中缓存时直接展示缓存，再在后台静默刷新，不阻塞界面。
#[derive(Debug, Clone)]
pub struct NavLinksSlice {
    api: ApiClient,
    slice: ResourceSlice<Vec<NavLink>>,
}

impl NavLinksSlice {
    pub fn new(api: ApiClient, slice: ResourceSlice<Vec<NavLink>>) -> Self {
        Self { api, slice }
    }

    pub fn slice(&self) -> &ResourceSlice<Vec<NavLink>> {
        &self.slice
    }

    pub fn state(&self) -> ResourceState<Vec<NavLink>> {
        self.slice.state()
    }

    /// 标准请求：预填缓存并切换 loading
    pub fn fetch(&self) -> BoxFuture<'static, ResourceState<Vec<NavLink>>> {
        let api = self.api.clone();
        self.slice
            .fetch(FetchOptions::cached(NAV_LINKS), async move {
                api.get_nav_links().await
            })
    }

    /// 静默刷新，不切换 loading
    pub fn refresh_silently(&self) -> BoxFuture<'static, ResourceState<Vec<NavLink>>> {
        let api = self.api.clone();
        self.slice
            .fetch(FetchOptions::cached(NAV_LINKS).silent(), async move {
                api.get_nav_links().await
            })
    }

    /// 页面加载入口
    ///
    /// 命中缓存时立即返回，并返回后台刷新任务的句柄；未命中时等待标准请求完成。
    pub async fn load(&self) -> Option<BackgroundTask> {
        if self.slice.seed_from_cache(NAV_LINKS) {
            let this = self.clone();
            return Some(BackgroundTask::spawn("nav_links_refresh", async move {
                this.refresh_silently().await;
            }));
        }
        self.fetch().await;
        None
    }

    /// 按固定周期静默刷新，第一次刷新在一个周期之后
    ///
    /// 周期为 0 时改用 [`FALLBACK_REFRESH_PERIOD`]。
    pub fn start_auto_refresh(&self, period: Duration) -> BackgroundTask {
        let period = if period.is_zero() {
            tracing::warn!(
                "Nav refresh period must be non-zero, using {:?}",
                FALLBACK_REFRESH_PERIOD
            );
            FALLBACK_REFRESH_PERIOD
        } else {
            period
        };
        let this = self.clone();
        BackgroundTask::spawn("nav_links_auto_refresh", async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                tracing::debug!("Auto-refreshing nav links");
                this.refresh_silently().await;
            }
        })
    }
}
