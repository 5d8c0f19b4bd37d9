use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AppError {
    /// 请求未能到达服务器或连接中断
    #[error("网络请求失败: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// 令牌缺失或被服务器拒绝
    #[error("{0}")]
    Unauthorized(String),
    /// 服务器返回 success=false
    #[error("{0}")]
    Api(String),
    /// 表单校验失败，不会发出请求
    #[error("{0}")]
    Validation(String),
    #[error("响应格式错误: {0}")]
    MalformedResponse(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("本地存储错误: {0}")]
    Storage(String),
}

impl AppError {
    /// 展示给用户的错误消息
    ///
    /// 服务端给出的消息原样返回，其余错误使用完整描述。
    pub fn message(&self) -> String {
        match self {
            AppError::Api(msg) | AppError::Unauthorized(msg) | AppError::Validation(msg) => {
                msg.clone()
            }
            AppError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_) | AppError::Http { status: 401, .. })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::MalformedResponse(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
