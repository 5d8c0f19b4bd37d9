// 通用的数据结构定义

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 错误信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    pub message: String,
}

/// 统一的响应信封 `{success, data, error}`
///
/// 网络和解析错误也会被转换成 success=false 的信封，调用方不会收到 panic 或 Err。
/// 需要按错误分支处理时使用 [`ApiResponse::into_result`]。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    /// 产生失败信封的本地错误，不参与序列化
    #[serde(skip)]
    pub cause: Option<AppError>,
    /// 发出请求时携带的令牌，用于判断 401 针对的是哪个会话
    #[serde(skip)]
    pub token: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            cause: None,
            token: None,
        }
    }

    pub fn failure(err: AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiErrorBody {
                message: err.message(),
            }),
            cause: Some(err),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// 服务器返回了 401
    pub fn is_unauthorized(&self) -> bool {
        self.cause.as_ref().is_some_and(AppError::is_unauthorized)
    }

    /// 转换为 Result，成功但缺少 data 视为格式错误
    pub fn into_result(self) -> Result<T, AppError> {
        if self.success {
            return self
                .data
                .ok_or_else(|| AppError::MalformedResponse("响应缺少 data 字段".into()));
        }
        Err(self.into_error())
    }

    /// 只关心成败、不关心 data 的操作（删除等）
    pub fn ensure_success(self) -> Result<(), AppError> {
        if self.success {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> AppError {
        match (self.cause, self.error) {
            (Some(cause), _) => cause,
            (None, Some(body)) => AppError::Api(body.message),
            (None, None) => AppError::Api("未知错误".into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            cause: self.cause,
            token: self.token,
        }
    }
}

/// 分页信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 当前页码
    pub page: u32,
    /// 每页数量
    pub limit: u32,
    /// 总记录数
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// 带分页的响应数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedResponse<T> {
    /// 数据列表
    pub items: Vec<T>,
    /// 分页信息
    pub pagination: Pagination,
}
