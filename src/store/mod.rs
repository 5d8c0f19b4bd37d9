// 状态模块
// 每种资源一个切片，请求前查缓存，请求后通过 reducer 更新状态

pub mod analytics;
pub mod categories;
pub mod file_manager;
pub mod navigation;
pub mod publications;
pub mod resource;
pub mod settings;
pub mod slice;
pub mod task;

pub use analytics::AnalyticsSlice;
pub use categories::CategoriesSlice;
pub use file_manager::{
    FileManagerAction, FileManagerSlice, FileManagerState, UploadBatch, match_uploaded_files,
};
pub use navigation::NavLinksSlice;
pub use publications::PublicationsSlice;
pub use resource::{ResourceState, SliceAction};
pub use settings::SettingsSlice;
pub use slice::{FetchOptions, ResourceSlice};
pub use task::BackgroundTask;
