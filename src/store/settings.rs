use futures_util::future::BoxFuture;

use crate::api::ApiClient;
use crate::api::schema::PublicSettings;
use crate::cache::keys::PUBLIC_SETTINGS;
use crate::store::resource::ResourceState;
use crate::store::slice::{FetchOptions, ResourceSlice};

/// 公开站点设置
#[derive(Debug, Clone)]
pub struct SettingsSlice {
    api: ApiClient,
    slice: ResourceSlice<PublicSettings>,
}

impl SettingsSlice {
    pub fn new(api: ApiClient, slice: ResourceSlice<PublicSettings>) -> Self {
        Self { api, slice }
    }

    pub fn slice(&self) -> &ResourceSlice<PublicSettings> {
        &self.slice
    }

    pub fn state(&self) -> ResourceState<PublicSettings> {
        self.slice.state()
    }

    pub fn fetch(&self) -> BoxFuture<'static, ResourceState<PublicSettings>> {
        let api = self.api.clone();
        self.slice
            .fetch(FetchOptions::cached(PUBLIC_SETTINGS), async move {
                api.get_public_settings().await
            })
    }
}
