use std::time::Duration;

use thiserror::Error;

// =========================================================
// API 错误
// =========================================================

/// 所有 API 操作统一的错误类型
///
/// 传输层失败（网络、超时、非 2xx）与应用层失败（2xx 响应体中带 `error` 字段）
/// 都在这里表达，调用方无需再检查响应体。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 请求参数在发送前校验失败（如无法解析的时间）
    #[error("请求参数无效: {0}")]
    InvalidInput(String),
    #[error("网络错误: {0}")]
    Transport(String),
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("响应解析失败: {0}")]
    Decode(String),
    /// 后端在响应体中返回的 `error`，消息原样保留
    #[error("{message}")]
    Backend { message: String },
    /// 获取身份令牌失败
    #[error("身份提供方错误: {0}")]
    Provider(String),
}

impl ApiError {
    pub fn backend(message: impl Into<String>) -> Self {
        ApiError::Backend {
            message: message.into(),
        }
    }

    /// 是否为后端业务错误（区别于传输层错误）
    pub fn is_backend(&self) -> bool {
        matches!(self, ApiError::Backend { .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =========================================================
// 认证错误
// =========================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// 用户关闭了登录弹窗，不视为故障
    #[error("登录已取消")]
    Cancelled,
    #[error("登录正在进行中")]
    InProgress,
    #[error("身份提供方错误: {0}")]
    Provider(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("后端未返回用户 ID")]
    MissingUserId,
}

impl AuthError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }
}
