use futures_util::future::BoxFuture;

use crate::api::ApiClient;
use crate::api::schema::{PaginatedResponse, Publication, PublicationInput, SearchQuery};
use crate::cache::TtlCache;
use crate::cache::keys::{FEATURED_PUBLICATIONS_PREFIX, featured_publications_key};
use crate::error::AppError;
use crate::store::resource::ResourceState;
use crate::store::slice::{FetchOptions, ResourceSlice};
use crate::utils::{Notifier, validate_slug};

/// 文章：首页推荐、搜索结果以及增删改
#[derive(Debug, Clone)]
pub struct PublicationsSlice {
    api: ApiClient,
    cache: TtlCache,
    notifier: Notifier,
    featured: ResourceSlice<Vec<Publication>>,
    search: ResourceSlice<PaginatedResponse<Publication>>,
}

impl PublicationsSlice {
    pub fn new(
        api: ApiClient,
        cache: TtlCache,
        notifier: Notifier,
        featured: ResourceSlice<Vec<Publication>>,
        search: ResourceSlice<PaginatedResponse<Publication>>,
    ) -> Self {
        Self {
            api,
            cache,
            notifier,
            featured,
            search,
        }
    }

    pub fn featured(&self) -> &ResourceSlice<Vec<Publication>> {
        &self.featured
    }

    pub fn search_results(&self) -> &ResourceSlice<PaginatedResponse<Publication>> {
        &self.search
    }

    pub fn fetch_featured(&self, limit: u32) -> BoxFuture<'static, ResourceState<Vec<Publication>>> {
        let api = self.api.clone();
        self.featured
            .fetch(FetchOptions::cached(featured_publications_key(limit)), async move {
                api.get_featured_publications(limit).await
            })
    }

    /// 搜索结果不缓存
    pub fn search(
        &self,
        query: SearchQuery,
    ) -> BoxFuture<'static, ResourceState<PaginatedResponse<Publication>>> {
        let api = self.api.clone();
        self.search
            .fetch(FetchOptions::uncached(), async move {
                api.search_publications(&query).await
            })
    }

    pub async fn create(&self, input: PublicationInput) -> Result<Publication, AppError> {
        validate_slug(&input.slug).map_err(AppError::Validation)?;
        let created = self.report(self.api.create_publication(&input).await.into_result())?;
        self.notifier.success(format!("已创建文章 {}", created.title));
        self.cache.remove_prefix(FEATURED_PUBLICATIONS_PREFIX);
        Ok(created)
    }

    pub async fn update(&self, id: &str, input: PublicationInput) -> Result<Publication, AppError> {
        validate_slug(&input.slug).map_err(AppError::Validation)?;
        let updated = self.report(self.api.update_publication(id, &input).await.into_result())?;
        self.notifier.success(format!("已更新文章 {}", updated.title));
        self.cache.remove_prefix(FEATURED_PUBLICATIONS_PREFIX);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.report(self.api.delete_publication(id).await.ensure_success())?;
        self.notifier.success("文章已删除");
        self.cache.remove_prefix(FEATURED_PUBLICATIONS_PREFIX);
        Ok(())
    }

    fn report<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            self.notifier.error(e.message());
        }
        result
    }
}
