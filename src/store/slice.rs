use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::api::ApiResponse;
use crate::auth::AuthSessionManager;
use crate::cache::TtlCache;
use crate::store::resource::{ResourceState, SliceAction};
use crate::utils::Notifier;

/// 一次请求的缓存与加载行为
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// 缓存键，None 表示不读写缓存
    pub key: Option<String>,
    /// 静默请求：不预填、不切换 loading
    pub silent: bool,
}

impl FetchOptions {
    pub fn cached(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn uncached() -> Self {
        Self::default()
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// 通用资源切片
///
/// 状态保存在 watch 通道中，所有修改都经过 [`ResourceState::reduce`]。
/// 克隆得到的是同一个切片的句柄。
pub struct ResourceSlice<T> {
    name: &'static str,
    cache: TtlCache,
    notifier: Notifier,
    auth: Option<Arc<AuthSessionManager>>,
    state: Arc<watch::Sender<ResourceState<T>>>,
}

impl<T> Clone for ResourceSlice<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cache: self.cache.clone(),
            notifier: self.notifier.clone(),
            auth: self.auth.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ResourceSlice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSlice")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> ResourceSlice<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(name: &'static str, cache: TtlCache, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            name,
            cache,
            notifier,
            auth: None,
            state: Arc::new(state),
        }
    }

    /// 401 响应交给会话管理器处理
    pub fn with_auth(mut self, auth: Arc<AuthSessionManager>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: SliceAction<T>) {
        self.state.send_modify(|state| state.reduce(action));
    }

    pub fn reset(&self) {
        self.dispatch(SliceAction::Reset);
    }

    /// 从缓存预填，非空命中时返回 true
    pub fn seed_from_cache(&self, key: &str) -> bool {
        let Some(entry) = self.cache.get_entry(key) else {
            return false;
        };
        if entry.is_empty() {
            return false;
        }
        match serde_json::from_value::<T>(entry.value) {
            Ok(data) => {
                tracing::debug!("{}: seeded from cache", self.name);
                self.dispatch(SliceAction::Seed(data));
                true
            }
            Err(e) => {
                tracing::warn!("{}: cached value has unexpected shape: {}", self.name, e);
                false
            }
        }
    }

    /// 标准的缓存感知请求
    ///
    /// 缓存预填和 loading 切换在本函数返回前同步完成，网络请求在返回的 future 中进行。
    /// 无论缓存是否命中都会发出请求；成功后覆盖状态并重写缓存，
    /// 失败时保留已展示的旧数据。
    pub fn fetch<F>(&self, options: FetchOptions, request: F) -> BoxFuture<'static, ResourceState<T>>
    where
        F: Future<Output = ApiResponse<T>> + Send + 'static,
    {
        if !options.silent {
            if let Some(key) = &options.key {
                self.seed_from_cache(key);
            }
            self.dispatch(SliceAction::Pending);
        }

        let slice = self.clone();
        async move {
            let resp = request.await;
            slice.settle(&options, resp)
        }
        .boxed()
    }

    fn settle(&self, options: &FetchOptions, resp: ApiResponse<T>) -> ResourceState<T> {
        if let Some(auth) = &self.auth {
            auth.handle_unauthorized(&resp);
        }

        match resp.into_result() {
            Ok(data) => {
                if let Some(key) = &options.key {
                    self.cache.set(key, &data);
                }
                self.dispatch(SliceAction::Fulfilled {
                    data,
                    at: Utc::now(),
                });
            }
            Err(e) => {
                let message = e.message();
                if options.silent {
                    // 静默请求失败不改变状态，由调用方决定是否回退
                    tracing::warn!("{}: silent refresh failed: {}", self.name, message);
                    return self.state();
                }
                if self.state.borrow().has_data() {
                    tracing::info!("{}: refresh failed, keeping stale data: {}", self.name, message);
                } else {
                    self.notifier.error(message.clone());
                }
                self.dispatch(SliceAction::Rejected(message));
            }
        }
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::time::Duration;

    fn slice() -> (ResourceSlice<Vec<String>>, TtlCache) {
        let cache = TtlCache::new(Duration::from_secs(60));
        (
            ResourceSlice::new("test", cache.clone(), Notifier::new()),
            cache,
        )
    }

    fn delayed(
        ms: u64,
        value: &str,
    ) -> impl Future<Output = ApiResponse<Vec<String>>> + Send + 'static {
        let value = value.to_string();
        async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ApiResponse::ok(vec![value])
        }
    }

    #[tokio::test]
    async fn warm_cache_seeds_before_request_resolves() {
        let (slice, cache) = slice();
        cache.set("k", &vec!["cached".to_string()]);

        let pending = slice.fetch(FetchOptions::cached("k"), delayed(20, "fresh"));
        let state = slice.state();
        assert_eq!(state.data, Some(vec!["cached".to_string()]));
        assert!(state.loading);

        let state = pending.await;
        assert_eq!(state.data, Some(vec!["fresh".to_string()]));
        assert!(!state.loading);
        assert_eq!(cache.get::<Vec<String>>("k"), Some(vec!["fresh".to_string()]));
    }

    #[tokio::test]
    async fn empty_cache_entry_is_not_seeded() {
        let (slice, cache) = slice();
        cache.set("k", &Vec::<String>::new());
        let _pending = slice.fetch(FetchOptions::cached("k"), delayed(5, "x"));
        assert_eq!(slice.state().data, None);
    }

    #[tokio::test]
    async fn failure_keeps_stale_data() {
        let (slice, cache) = slice();
        cache.set("k", &vec!["cached".to_string()]);
        let state = slice
            .fetch(FetchOptions::cached("k"), async {
                ApiResponse::failure(AppError::Network("offline".into()))
            })
            .await;
        assert_eq!(state.data, Some(vec!["cached".to_string()]));
        assert_eq!(state.error, None);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failure_without_data_sets_error_and_notifies() {
        let (slice, _) = slice();
        let mut notices = slice.notifier.subscribe();
        let state = slice
            .fetch(FetchOptions::cached("k"), async {
                ApiResponse::failure(AppError::Network("offline".into()))
            })
            .await;
        assert_eq!(state.data, None);
        assert!(state.error.unwrap().contains("offline"));
        assert!(notices.try_recv().is_ok());
    }

    #[tokio::test]
    async fn silent_fetch_never_toggles_loading() {
        let (slice, cache) = slice();
        cache.set("k", &vec!["cached".to_string()]);
        let pending = slice.fetch(FetchOptions::cached("k").silent(), delayed(5, "fresh"));
        let state = slice.state();
        assert!(!state.loading);
        assert_eq!(state.data, None);
        assert_eq!(
            pending.await.data,
            Some(vec!["fresh".to_string()])
        );
    }

    #[tokio::test]
    async fn uncached_fetch_leaves_cache_alone() {
        let (slice, cache) = slice();
        slice.fetch(FetchOptions::uncached(), delayed(1, "v")).await;
        assert!(cache.is_empty());
    }

    // 已知问题：没有请求序号，较早发出但较晚完成的请求会覆盖较新的结果。
    // 这里固定当前行为，修复时需要同时修改此测试。
    #[tokio::test]
    async fn last_completed_response_wins() {
        let (slice, _) = slice();
        let first = slice.fetch(FetchOptions::cached("k"), delayed(60, "first"));
        let second = slice.fetch(FetchOptions::cached("k"), delayed(5, "second"));
        let (_, second_state) = futures_util::future::join(first, second).await;
        assert_eq!(second_state.data, Some(vec!["second".to_string()]));
        assert_eq!(slice.state().data, Some(vec!["first".to_string()]));
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let (slice, _) = slice();
        let mut rx = slice.subscribe();
        slice.fetch(FetchOptions::uncached(), delayed(1, "v")).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().data, Some(vec!["v".to_string()]));
    }
}
