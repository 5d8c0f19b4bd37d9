use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::api::schema::{ApiResponse, CreateFolderRequest, FileItem, Folder, UploadFile};
use crate::auth::AuthSessionManager;
use crate::cache::TtlCache;
use crate::cache::keys::{files_key, folder_tree_key};
use crate::error::AppError;
use crate::utils::Notifier;

/// 一次提交的文件，只在上传后刷新的过程中存在
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub id: Uuid,
    pub folder_id: Option<String>,
    pub files: Vec<UploadFile>,
}

impl UploadBatch {
    pub fn new(folder_id: Option<String>, files: Vec<UploadFile>) -> Self {
        Self {
            id: Uuid::new_v4(),
            folder_id,
            files,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileManagerState {
    pub tree: Vec<Folder>,
    pub files: Vec<FileItem>,
    /// 当前列出的目录，None 为根目录
    pub current_folder: Option<String>,
    /// 选中的文件 id
    pub selected: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileManagerAction {
    Pending,
    Seed {
        folder: Option<String>,
        tree: Vec<Folder>,
        files: Vec<FileItem>,
    },
    Loaded {
        folder: Option<String>,
        tree: Vec<Folder>,
        files: Vec<FileItem>,
        at: DateTime<Utc>,
    },
    Rejected {
        folder: Option<String>,
        message: String,
    },
    Select(Vec<String>),
    Deselect(String),
    ClearSelection,
    Reset,
}

impl FileManagerState {
    pub fn reduce(&mut self, action: FileManagerAction) {
        match action {
            FileManagerAction::Pending => self.loading = true,
            FileManagerAction::Seed {
                folder,
                tree,
                files,
            } => {
                self.current_folder = folder;
                self.tree = tree;
                self.files = files;
                self.error = None;
            }
            FileManagerAction::Loaded {
                folder,
                tree,
                files,
                at,
            } => {
                self.current_folder = folder;
                self.tree = tree;
                self.files = files;
                self.loading = false;
                self.error = None;
                self.last_updated = Some(at);
                // 已被删除的文件不再保持选中
                let files = &self.files;
                self.selected.retain(|id| files.iter().any(|f| &f.id == id));
            }
            FileManagerAction::Rejected { folder, message } => {
                self.loading = false;
                let has_listing = !(self.tree.is_empty() && self.files.is_empty());
                if has_listing && self.current_folder == folder {
                    return;
                }
                // 没有该目录的旧数据可展示，不能继续显示其他目录的内容
                if self.current_folder != folder {
                    self.current_folder = folder;
                    self.tree.clear();
                    self.files.clear();
                    self.selected.clear();
                }
                self.error = Some(message);
            }
            FileManagerAction::Select(ids) => self.selected = ids,
            FileManagerAction::Deselect(id) => self.selected.retain(|s| s != &id),
            FileManagerAction::ClearSelection => self.selected.clear(),
            FileManagerAction::Reset => *self = Self::default(),
        }
    }
}

/// 在文件列表中查找刚上传的文件
///
/// 文件名逐个精确比较，线性扫描。没有 folder_id 的文件视为属于 `listed_folder`。
pub fn match_uploaded_files(
    files: &[FileItem],
    names: &[String],
    folder: Option<&str>,
    listed_folder: Option<&str>,
) -> Vec<FileItem> {
    files
        .iter()
        .filter(|file| {
            let file_folder = file.folder_id.as_deref().or(listed_folder);
            file_folder == folder && names.iter().any(|name| name == &file.name)
        })
        .cloned()
        .collect()
}

/// 文件管理器状态
///
/// 上传或目录变更后先静默刷新目录树（不显示 loading），失败时回退到普通刷新。
#[derive(Debug, Clone)]
pub struct FileManagerSlice {
    api: ApiClient,
    cache: TtlCache,
    notifier: Notifier,
    auth: Option<Arc<AuthSessionManager>>,
    state: Arc<watch::Sender<FileManagerState>>,
}

impl FileManagerSlice {
    pub fn new(api: ApiClient, cache: TtlCache, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(FileManagerState::default());
        Self {
            api,
            cache,
            notifier,
            auth: None,
            state: Arc::new(state),
        }
    }

    pub fn with_auth(mut self, auth: Arc<AuthSessionManager>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn state(&self) -> FileManagerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FileManagerState> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, action: FileManagerAction) {
        self.state.send_modify(|state| state.reduce(action));
    }

    fn check_auth<T>(&self, resp: &ApiResponse<T>) {
        if let Some(auth) = &self.auth {
            auth.handle_unauthorized(resp);
        }
    }

    async fn load_listing(&self, folder: Option<&str>) -> Result<(Vec<Folder>, Vec<FileItem>), AppError> {
        let (tree, files) = tokio::join!(self.api.get_folder_tree(folder), self.api.get_files(folder));
        self.check_auth(&tree);
        self.check_auth(&files);
        Ok((tree.into_result()?, files.into_result()?))
    }

    fn store_listing(&self, folder: Option<&str>, tree: Vec<Folder>, files: Vec<FileItem>) {
        self.cache.set(&folder_tree_key(folder), &tree);
        self.cache.set(&files_key(folder), &files);
        self.dispatch(FileManagerAction::Loaded {
            folder: folder.map(str::to_string),
            tree,
            files,
            at: Utc::now(),
        });
    }

    /// 打开目录：先用缓存预填，再发请求
    pub async fn open_folder(&self, folder: Option<&str>) -> FileManagerState {
        let tree = self.cache.get::<Vec<Folder>>(&folder_tree_key(folder));
        let files = self.cache.get::<Vec<FileItem>>(&files_key(folder));
        if let (Some(tree), Some(files)) = (tree, files) {
            tracing::debug!("file manager: seeded {:?} from cache", folder);
            self.dispatch(FileManagerAction::Seed {
                folder: folder.map(str::to_string),
                tree,
                files,
            });
        }
        self.refresh(folder).await
    }

    /// 普通刷新，切换 loading
    pub async fn refresh(&self, folder: Option<&str>) -> FileManagerState {
        self.dispatch(FileManagerAction::Pending);
        match self.load_listing(folder).await {
            Ok((tree, files)) => self.store_listing(folder, tree, files),
            Err(e) => {
                let message = e.message();
                self.dispatch(FileManagerAction::Rejected {
                    folder: folder.map(str::to_string),
                    message: message.clone(),
                });
                if self.state.borrow().error.is_some() {
                    self.notifier.error(message);
                }
            }
        }
        self.state()
    }

    /// 静默刷新，失败时回退到普通刷新
    pub async fn silent_refresh(&self, folder: Option<&str>) -> FileManagerState {
        match self.load_listing(folder).await {
            Ok((tree, files)) => {
                self.store_listing(folder, tree, files);
                self.state()
            }
            Err(e) => {
                tracing::warn!("Silent refresh of {:?} failed, falling back: {}", folder, e);
                self.refresh(folder).await
            }
        }
    }

    /// 在当前文件列表中查找指定目录下名称匹配的文件
    pub fn find_uploaded_files(&self, names: &[String], folder: Option<&str>) -> Vec<FileItem> {
        let state = self.state.borrow();
        match_uploaded_files(&state.files, names, folder, state.current_folder.as_deref())
    }

    /// 上传一批文件，刷新后自动选中刚上传的文件
    pub async fn upload(&self, batch: UploadBatch) -> Result<Vec<FileItem>, AppError> {
        tracing::info!(
            "Uploading batch {} ({} files) to {:?}",
            batch.id,
            batch.files.len(),
            batch.folder_id
        );
        let folder = batch.folder_id.as_deref();
        let resp = self.api.upload_files(folder, &batch.files).await;
        self.check_auth(&resp);
        if let Err(e) = resp.ensure_success() {
            self.notifier.error(format!("上传失败: {}", e.message()));
            return Err(e);
        }

        self.silent_refresh(folder).await;
        let uploaded = self.find_uploaded_files(&batch.names(), folder);
        tracing::debug!("Batch {}: {} uploaded files located", batch.id, uploaded.len());
        self.dispatch(FileManagerAction::Select(
            uploaded.iter().map(|f| f.id.clone()).collect(),
        ));
        self.notifier
            .success(format!("已上传 {} 个文件", batch.files.len()));
        Ok(uploaded)
    }

    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Folder, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("目录名称不能为空".into()));
        }

        let req = CreateFolderRequest {
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        let resp = self.api.create_folder(&req).await;
        self.check_auth(&resp);
        let folder = resp.into_result().inspect_err(|e| {
            self.notifier.error(format!("创建目录失败: {}", e.message()));
        })?;

        let current = self.state.borrow().current_folder.clone();
        self.silent_refresh(current.as_deref()).await;
        Ok(folder)
    }

    pub async fn delete_file(&self, id: &str) -> Result<(), AppError> {
        let resp = self.api.delete_file(id).await;
        self.check_auth(&resp);
        resp.ensure_success().inspect_err(|e| {
            self.notifier.error(format!("删除文件失败: {}", e.message()));
        })?;

        self.dispatch(FileManagerAction::Deselect(id.to_string()));
        let current = self.state.borrow().current_folder.clone();
        self.silent_refresh(current.as_deref()).await;
        Ok(())
    }

    pub fn select(&self, ids: Vec<String>) {
        self.dispatch(FileManagerAction::Select(ids));
    }

    pub fn clear_selection(&self) {
        self.dispatch(FileManagerAction::ClearSelection);
    }

    pub fn selected_files(&self) -> Vec<FileItem> {
        let state = self.state.borrow();
        state
            .files
            .iter()
            .filter(|f| state.selected.contains(&f.id))
            .cloned()
            .collect()
    }
}
