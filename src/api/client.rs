// API 客户端
// 所有后端请求的唯一出口，负责附加令牌并把响应统一成 {success, data, error} 信封

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::schema::*;
use crate::auth::TokenStore;
use crate::config::Config;
use crate::error::AppError;

/// 错误响应体截断长度
const ERROR_BODY_LIMIT: usize = 256;

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RawError>,
    #[serde(default)]
    message: Option<String>,
}

// 有的接口 error 直接是字符串
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawError {
    Body(ApiErrorBody),
    Text(String),
}

impl RawEnvelope {
    fn error_message(&self) -> Option<String> {
        match &self.error {
            Some(RawError::Body(body)) => Some(body.message.clone()),
            Some(RawError::Text(text)) => Some(text.clone()),
            None => self.message.clone(),
        }
    }
}

/// 把一次 HTTP 响应解析成类型化数据
///
/// 401 映射为 Unauthorized，非 2xx 为 Http，success=false 为 Api，
/// 信封或 data 的结构不符为 MalformedResponse。
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, AppError> {
    let envelope = serde_json::from_slice::<RawEnvelope>(body);

    if status == StatusCode::UNAUTHORIZED {
        let message = envelope
            .ok()
            .and_then(|e| e.error_message())
            .unwrap_or_else(|| "未授权访问".to_string());
        return Err(AppError::Unauthorized(message));
    }

    let envelope = match envelope {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(AppError::MalformedResponse(e.to_string()));
        }
        Err(_) => {
            return Err(AppError::Http {
                status: status.as_u16(),
                message: body_snippet(status, body),
            });
        }
    };

    if !status.is_success() {
        return Err(AppError::Http {
            status: status.as_u16(),
            message: envelope
                .error_message()
                .unwrap_or_else(|| body_snippet(status, body)),
        });
    }

    if !envelope.success {
        return Err(AppError::Api(
            envelope
                .error_message()
                .unwrap_or_else(|| "请求失败".to_string()),
        ));
    }

    let data = envelope.data.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(data).map_err(|e| AppError::MalformedResponse(e.to_string()))
}

fn body_snippet(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("请求失败")
            .to_string();
    }
    text.chars().take(ERROR_BODY_LIMIT).collect()
}

/// REST 客户端，不保存任何会话有效性状态
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            http,
            base: config.api_base(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base, path))
    }

    /// 附加当前令牌后发送，响应记录本次使用的令牌
    async fn send<T: DeserializeOwned>(&self, label: &str, builder: RequestBuilder) -> ApiResponse<T> {
        let token = self.tokens.load();
        let builder = match &token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        self.dispatch(label, builder, token).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        label: &str,
        builder: RequestBuilder,
        token: Option<String>,
    ) -> ApiResponse<T> {
        let resp = match self.execute(builder).await {
            Ok(data) => ApiResponse::ok(data),
            Err(err) => {
                match &err {
                    AppError::Http { status, .. } if *status >= 500 => {
                        tracing::error!("{} failed: {}", label, err)
                    }
                    _ => tracing::warn!("{} failed: {}", label, err),
                }
                ApiResponse::failure(err)
            }
        };
        resp.with_token(token)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode_envelope(status, &body)
    }

    // ---- 认证 ----

    pub async fn get_current_user(&self) -> ApiResponse<UserProfile> {
        self.send::<CurrentUserPayload>("getCurrentUser", self.request(Method::GET, "/auth/me"))
            .await
            .map(CurrentUserPayload::into_user)
    }

    pub async fn login(&self, req: &LoginRequest) -> ApiResponse<AuthPayload> {
        tracing::debug!("Logging in as {}", req.email);
        self.send("login", self.request(Method::POST, "/auth/login").json(req))
            .await
    }

    pub async fn register(&self, req: &RegisterRequest) -> ApiResponse<AuthPayload> {
        tracing::debug!("Registering {}", req.email);
        self.send("register", self.request(Method::POST, "/auth/register").json(req))
            .await
    }

    /// 通知服务器注销，令牌显式传入，本地令牌此时可能已被清除
    pub async fn logout(&self, token: &str) -> ApiResponse<serde_json::Value> {
        let builder = self
            .request(Method::POST, "/auth/logout")
            .bearer_auth(token);
        self.dispatch("logout", builder, Some(token.to_string()))
            .await
    }

    // ---- 文章 ----

    pub async fn get_featured_publications(&self, limit: u32) -> ApiResponse<Vec<Publication>> {
        let builder = self
            .request(Method::GET, "/publications/featured")
            .query(&[("limit", limit)]);
        self.send("getFeaturedPublications", builder).await
    }

    pub async fn search_publications(
        &self,
        query: &SearchQuery,
    ) -> ApiResponse<PaginatedResponse<Publication>> {
        let builder = self.request(Method::GET, "/publications/search").query(query);
        self.send("searchPublications", builder).await
    }

    pub async fn get_publication(&self, id: &str) -> ApiResponse<Publication> {
        self.send(
            "getPublication",
            self.request(Method::GET, &format!("/publications/{}", id)),
        )
        .await
    }

    pub async fn create_publication(&self, input: &PublicationInput) -> ApiResponse<Publication> {
        self.send(
            "createPublication",
            self.request(Method::POST, "/publications").json(input),
        )
        .await
    }

    pub async fn update_publication(
        &self,
        id: &str,
        input: &PublicationInput,
    ) -> ApiResponse<Publication> {
        self.send(
            "updatePublication",
            self.request(Method::PUT, &format!("/publications/{}", id))
                .json(input),
        )
        .await
    }

    pub async fn delete_publication(&self, id: &str) -> ApiResponse<serde_json::Value> {
        self.send(
            "deletePublication",
            self.request(Method::DELETE, &format!("/publications/{}", id)),
        )
        .await
    }

    // ---- 分类 ----

    pub async fn get_categories(&self) -> ApiResponse<Vec<Category>> {
        self.send("getCategories", self.request(Method::GET, "/categories"))
            .await
    }

    pub async fn create_subcategory(&self, input: &SubcategoryInput) -> ApiResponse<Subcategory> {
        self.send(
            "createSubcategory",
            self.request(Method::POST, "/subcategories").json(input),
        )
        .await
    }

    pub async fn update_subcategory(
        &self,
        id: &str,
        input: &SubcategoryInput,
    ) -> ApiResponse<Subcategory> {
        self.send(
            "updateSubcategory",
            self.request(Method::PUT, &format!("/subcategories/{}", id))
                .json(input),
        )
        .await
    }

    pub async fn delete_subcategory(&self, id: &str) -> ApiResponse<serde_json::Value> {
        self.send(
            "deleteSubcategory",
            self.request(Method::DELETE, &format!("/subcategories/{}", id)),
        )
        .await
    }

    // ---- 文件管理 ----

    pub async fn get_folder_tree(&self, folder_id: Option<&str>) -> ApiResponse<Vec<Folder>> {
        let mut builder = self.request(Method::GET, "/file-manager/folders/tree");
        if let Some(id) = folder_id {
            builder = builder.query(&[("folderId", id)]);
        }
        self.send("getFolderTree", builder).await
    }

    pub async fn get_files(&self, folder_id: Option<&str>) -> ApiResponse<Vec<FileItem>> {
        let mut builder = self.request(Method::GET, "/file-manager/files");
        if let Some(id) = folder_id {
            builder = builder.query(&[("folderId", id)]);
        }
        self.send("getFiles", builder).await
    }

    pub async fn create_folder(&self, req: &CreateFolderRequest) -> ApiResponse<Folder> {
        self.send(
            "createFolder",
            self.request(Method::POST, "/file-manager/folders").json(req),
        )
        .await
    }

    pub async fn delete_file(&self, id: &str) -> ApiResponse<serde_json::Value> {
        self.send(
            "deleteFile",
            self.request(Method::DELETE, &format!("/file-manager/files/{}", id)),
        )
        .await
    }

    pub async fn upload_files(
        &self,
        folder_id: Option<&str>,
        files: &[UploadFile],
    ) -> ApiResponse<Vec<FileItem>> {
        let mut form = multipart::Form::new();
        if let Some(id) = folder_id {
            form = form.text("folderId", id.to_string());
        }
        for file in files {
            let mut part = multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            if let Some(mime) = &file.mime_type {
                part = match part.mime_str(mime) {
                    Ok(part) => part,
                    Err(e) => return ApiResponse::failure(AppError::Network(e.to_string())),
                };
            }
            form = form.part("files", part);
        }

        tracing::debug!("Uploading {} files to {:?}", files.len(), folder_id);
        self.send(
            "uploadFiles",
            self.request(Method::POST, "/file-manager/upload")
                .multipart(form),
        )
        .await
    }

    // ---- 站点 ----

    pub async fn get_nav_links(&self) -> ApiResponse<Vec<NavLink>> {
        self.send("getNavLinks", self.request(Method::GET, "/nav-links"))
            .await
    }

    pub async fn get_dashboard_analytics(&self) -> ApiResponse<DashboardAnalytics> {
        self.send(
            "getDashboardAnalytics",
            self.request(Method::GET, "/analytics/dashboard"),
        )
        .await
    }

    pub async fn get_public_settings(&self) -> ApiResponse<PublicSettings> {
        self.send(
            "getPublicSettings",
            self.request(Method::GET, "/settings/public"),
        )
        .await
    }
}
