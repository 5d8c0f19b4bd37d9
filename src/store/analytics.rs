use futures_util::future::BoxFuture;

use crate::api::ApiClient;
use crate::api::schema::DashboardAnalytics;
use crate::cache::keys::DASHBOARD_ANALYTICS;
use crate::store::resource::ResourceState;
use crate::store::slice::{FetchOptions, ResourceSlice};

/// 仪表盘统计（管理员）
#[derive(Debug, Clone)]
pub struct AnalyticsSlice {
    api: ApiClient,
    slice: ResourceSlice<DashboardAnalytics>,
}

impl AnalyticsSlice {
    pub fn new(api: ApiClient, slice: ResourceSlice<DashboardAnalytics>) -> Self {
        Self { api, slice }
    }

    pub fn slice(&self) -> &ResourceSlice<DashboardAnalytics> {
        &self.slice
    }

    pub fn state(&self) -> ResourceState<DashboardAnalytics> {
        self.slice.state()
    }

    pub fn fetch(&self) -> BoxFuture<'static, ResourceState<DashboardAnalytics>> {
        let api = self.api.clone();
        self.slice
            .fetch(FetchOptions::cached(DASHBOARD_ANALYTICS), async move {
                api.get_dashboard_analytics().await
            })
    }
}
