use futures_util::future::BoxFuture;

use crate::api::ApiClient;
use crate::api::schema::{Category, Subcategory, SubcategoryInput};
use crate::cache::keys::CATEGORIES;
use crate::error::AppError;
use crate::store::resource::ResourceState;
use crate::store::slice::{FetchOptions, ResourceSlice};
use crate::utils::{Notifier, validate_slug};

/// 分类浏览与子分类管理
#[derive(Debug, Clone)]
pub struct CategoriesSlice {
    api: ApiClient,
    notifier: Notifier,
    slice: ResourceSlice<Vec<Category>>,
}

impl CategoriesSlice {
    pub fn new(api: ApiClient, notifier: Notifier, slice: ResourceSlice<Vec<Category>>) -> Self {
        Self {
            api,
            notifier,
            slice,
        }
    }

    pub fn slice(&self) -> &ResourceSlice<Vec<Category>> {
        &self.slice
    }

    pub fn state(&self) -> ResourceState<Vec<Category>> {
        self.slice.state()
    }

    pub fn fetch(&self) -> BoxFuture<'static, ResourceState<Vec<Category>>> {
        let api = self.api.clone();
        self.slice
            .fetch(FetchOptions::cached(CATEGORIES), async move {
                api.get_categories().await
            })
    }

    /// 按 slug 查找已加载的分类
    pub fn find_by_slug(&self, slug: &str) -> Option<Category> {
        self.slice
            .data()
            .and_then(|categories| categories.into_iter().find(|c| c.slug == slug))
    }

    pub async fn create_subcategory(&self, input: SubcategoryInput) -> Result<Subcategory, AppError> {
        validate_slug(&input.slug).map_err(AppError::Validation)?;
        let created = self.report(self.api.create_subcategory(&input).await.into_result())?;
        self.notifier.success(format!("已创建子分类 {}", created.name));
        self.refresh().await;
        Ok(created)
    }

    pub async fn update_subcategory(
        &self,
        id: &str,
        input: SubcategoryInput,
    ) -> Result<Subcategory, AppError> {
        validate_slug(&input.slug).map_err(AppError::Validation)?;
        let updated = self.report(self.api.update_subcategory(id, &input).await.into_result())?;
        self.notifier.success(format!("已更新子分类 {}", updated.name));
        self.refresh().await;
        Ok(updated)
    }

    pub async fn delete_subcategory(&self, id: &str) -> Result<(), AppError> {
        self.report(self.api.delete_subcategory(id).await.ensure_success())?;
        self.notifier.success("子分类已删除");
        self.refresh().await;
        Ok(())
    }

    // 修改后静默刷新分类树
    async fn refresh(&self) {
        let api = self.api.clone();
        self.slice
            .fetch(FetchOptions::cached(CATEGORIES).silent(), async move {
                api.get_categories().await
            })
            .await;
    }

    fn report<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            self.notifier.error(e.message());
        }
        result
    }
}
