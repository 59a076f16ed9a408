//! 客户端配置
//!
//! 基础 URL 优先取环境变量，取不到时使用默认值：
//! 浏览器端默认相对路径 `/api`（与页面同源），原生环境默认本地后端。

use std::time::Duration;

use trainlog_shared::{CONTENT_TYPE_JSON, HEADER_CONTENT_TYPE};

pub const ENV_API_BASE_URL: &str = "TRAINLOG_API_BASE_URL";
pub const DEFAULT_API_BASE: &str = "/api";
pub const DEFAULT_LOCAL_API_BASE: &str = "http://localhost:8000/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: REQUEST_TIMEOUT,
            default_headers: vec![(HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string())],
        }
    }

    /// 读取运行时环境变量 `TRAINLOG_API_BASE_URL`
    pub fn from_env() -> Self {
        Self::from_base(std::env::var(ENV_API_BASE_URL).ok().as_deref())
    }

    /// 使用给定的基础 URL，空值时回落到目标平台的默认值
    ///
    /// 浏览器端在编译期通过 `option_env!` 取值后调用此方法。
    pub fn from_base(base: Option<&str>) -> Self {
        match base.map(str::trim).filter(|b| !b.is_empty()) {
            Some(b) => Self::new(b),
            None => Self::new(default_base_url()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 拼接完整 URL：去掉基础 URL 末尾与路径开头多余的 `/`
    pub fn resolve_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_base(None)
    }
}

fn default_base_url() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        DEFAULT_API_BASE
    } else {
        DEFAULT_LOCAL_API_BASE
    }
}
