//! HTTP 客户端适配层
//!
//! `ApiClient` 负责：
//! - 拼接基础 URL 与路由路径、附加默认请求头与超时
//! - 依次执行请求拦截器（URL 日志 -> Bearer 令牌注入）
//! - 将响应统一解码为 `ApiResult<T>`，包括响应体中的 `error` 字段
//!
//! 单次请求语义：不重试、不退避。

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use trainlog_shared::HEADER_AUTHORIZATION;
use trainlog_shared::protocol::ApiRequest;

use crate::auth::IdentityProvider;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

// =========================================================
// 请求拦截器
// =========================================================

#[async_trait::async_trait(?Send)]
pub trait RequestInterceptor {
    async fn intercept(&self, req: &mut HttpRequest) -> ApiResult<()>;
}

/// 记录最终请求 URL 的诊断日志
pub struct UrlLogger;

#[async_trait::async_trait(?Send)]
impl RequestInterceptor for UrlLogger {
    async fn intercept(&self, req: &mut HttpRequest) -> ApiResult<()> {
        log::debug!("[API] → {} {}", req.method.as_str(), req.url);
        Ok(())
    }
}

/// 注入当前身份的 Bearer 令牌
///
/// 有会话时每次请求都向身份提供方取一次新令牌（不缓存），
/// 无会话时移除残留的 `Authorization` 头。
pub struct BearerAuth<P: ?Sized> {
    provider: Rc<P>,
}

impl<P: IdentityProvider + ?Sized> BearerAuth<P> {
    pub fn new(provider: Rc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait(?Send)]
impl<P: IdentityProvider + ?Sized> RequestInterceptor for BearerAuth<P> {
    async fn intercept(&self, req: &mut HttpRequest) -> ApiResult<()> {
        match self.provider.current_session() {
            Some(session) => {
                let token = self
                    .provider
                    .id_token(&session)
                    .await
                    .map_err(|e| ApiError::Provider(e.to_string()))?;
                req.remove_header(HEADER_AUTHORIZATION);
                req.headers
                    .insert(HEADER_AUTHORIZATION.to_string(), format!("Bearer {}", token));
            }
            None => req.remove_header(HEADER_AUTHORIZATION),
        }
        Ok(())
    }
}

// =========================================================
// ApiClient
// =========================================================

pub struct ApiClient<C: HttpClient> {
    config: ClientConfig,
    http: C,
    interceptors: Vec<Rc<dyn RequestInterceptor>>,
}

impl<C: HttpClient> ApiClient<C> {
    /// 创建客户端，默认只挂载 URL 日志拦截器
    pub fn new(config: ClientConfig, http: C) -> Self {
        log::info!("[API] baseURL: {}", config.base_url);
        Self {
            config,
            http,
            interceptors: vec![Rc::new(UrlLogger)],
        }
    }

    /// 挂载 Bearer 令牌拦截器
    pub fn with_identity<P: IdentityProvider + 'static>(self, provider: Rc<P>) -> Self {
        self.with_interceptor(BearerAuth::new(provider))
    }

    /// 在拦截器链末尾追加一个拦截器
    pub fn with_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Rc::new(interceptor));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    /// GET 请求，参数编码为查询字符串
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut url = self.config.resolve_url(path);
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url = format!("{}?{}", url, query);
        }
        self.execute(self.request(&url, HttpMethod::Get)).await
    }

    /// POST 请求，body 序列化为 JSON
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.resolve_url(path);
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidInput(format!("无法序列化请求体: {}", e)))?;
        self.execute(self.request(&url, HttpMethod::Post).with_body(body))
            .await
    }

    /// 按协议声明的方法与路径发送请求
    pub async fn call<R: ApiRequest>(&self, req: &R) -> ApiResult<R::Response> {
        match R::METHOD {
            HttpMethod::Post => self.post(R::PATH, req).await,
            HttpMethod::Get => {
                let params = query_params(req)?;
                let params: Vec<(&str, String)> =
                    params.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
                self.get(R::PATH, &params).await
            }
        }
    }

    fn request(&self, url: &str, method: HttpMethod) -> HttpRequest {
        let mut req = HttpRequest::new(url, method).with_timeout(self.config.timeout);
        for (k, v) in &self.config.default_headers {
            req = req.with_header(k, v);
        }
        req
    }

    async fn execute<T: DeserializeOwned>(&self, mut req: HttpRequest) -> ApiResult<T> {
        for interceptor in &self.interceptors {
            interceptor.intercept(&mut req).await?;
        }
        let resp = self.http.send(req).await?;
        decode(resp)
    }
}

/// 将请求结构体展开为查询参数，null 字段省略
fn query_params<R: Serialize>(req: &R) -> ApiResult<Vec<(String, String)>> {
    let value = serde_json::to_value(req)
        .map_err(|e| ApiError::InvalidInput(format!("无法序列化查询参数: {}", e)))?;

    let Value::Object(map) = value else {
        return Err(ApiError::InvalidInput("查询参数必须是对象".to_string()));
    };

    Ok(map
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}

/// 从响应体中提取后端错误信息
fn backend_error(value: &Value) -> Option<String> {
    let err = value.as_object()?.get("error")?;
    match err {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// 统一解码：非 2xx -> Status；2xx 带 `error` -> Backend；其余反序列化为 T
pub(crate) fn decode<T: DeserializeOwned>(resp: HttpResponse) -> ApiResult<T> {
    let parsed: Option<Value> = if resp.body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(&resp.body).ok()
    };

    if !resp.is_success() {
        let message = parsed
            .as_ref()
            .and_then(backend_error)
            .unwrap_or_else(|| resp.body.clone());
        log::warn!("[API] HTTP {}: {}", resp.status, message);
        return Err(ApiError::Status {
            status: resp.status,
            message,
        });
    }

    let value = parsed.ok_or_else(|| ApiError::Decode(format!("响应不是合法 JSON: {}", resp.body)))?;
    if let Some(message) = backend_error(&value) {
        return Err(ApiError::Backend { message });
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::tests::MockIdentity;
    use crate::request::MockHttpClient;
    use serde_json::json;
    use trainlog_shared::protocol::GetUserRequest;
    use trainlog_shared::{Ack, User};

    pub const BASE: &str = "http://test.local/api";

    pub fn test_client() -> ApiClient<MockHttpClient> {
        ApiClient::new(ClientConfig::new(BASE), MockHttpClient::new())
    }

    pub fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    #[tokio::test]
    async fn test_post_sends_json_with_default_headers() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/TeamMembership/deleteTeam"), 200, json!({}));

        let _: Ack = client
            .post("/TeamMembership/deleteTeam", &json!({ "coachId": "c1", "title": "XC" }))
            .await
            .unwrap();

        let req = client.http().last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.timeout, std::time::Duration::from_secs(20));
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "coachId": "c1", "title": "XC" })
        );
    }

    #[tokio::test]
    async fn test_get_request_encodes_query() {
        let client = test_client();
        client.http().mock_response(
            &url("/UserDirectory/getUser?userId=u%201"),
            200,
            json!({ "_id": "u 1", "name": "Sam" }),
        );

        let user: User = client
            .call(&GetUserRequest {
                user_id: "u 1".into(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, "u 1");
        let req = client.http().last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
    }

    #[tokio::test]
    async fn test_error_field_becomes_backend_error() {
        let client = test_client();
        client.http().mock_response(
            &url("/TeamMembership/addAthlete"),
            200,
            json!({ "error": "Wrong pass key" }),
        );

        let res: ApiResult<Ack> = client.post("/TeamMembership/addAthlete", &json!({})).await;
        assert_eq!(res, Err(ApiError::backend("Wrong pass key")));
    }

    #[tokio::test]
    async fn test_null_error_field_is_success() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/x"), 200, json!({ "error": null, "ok": true }));

        let res: ApiResult<Ack> = client.post("/x", &json!({})).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/x"), 401, json!({ "error": "Unauthorized" }));

        let res: ApiResult<Ack> = client.post("/x", &json!({})).await;
        assert_eq!(
            res,
            Err(ApiError::Status {
                status: 401,
                message: "Unauthorized".into()
            })
        );

        // 未注册的 URL 返回 404 纯文本
        let res: ApiResult<Ack> = client.post("/missing", &json!({})).await;
        assert!(matches!(res, Err(ApiError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_transport_error_propagates_without_retry() {
        let client = test_client();
        client
            .http()
            .fail_with(ApiError::Timeout(std::time::Duration::from_secs(20)));

        let res: ApiResult<Ack> = client.post("/x", &json!({})).await;
        assert!(matches!(res, Err(ApiError::Timeout(_))));
        assert_eq!(client.http().requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let client = test_client();
        client.http().mock_raw(&url("/x"), 200, "<html>");

        let res: ApiResult<Ack> = client.post("/x", &json!({})).await;
        assert!(matches!(res, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_bearer_token_attached_when_signed_in() {
        let identity = Rc::new(MockIdentity::signed_in("fb-uid", "tok-1"));
        let client = test_client().with_identity(identity.clone());
        client.http().mock_response(&url("/x"), 200, json!({}));

        let _: Ack = client.post("/x", &json!({})).await.unwrap();
        let _: Ack = client.post("/x", &json!({})).await.unwrap();

        let req = client.http().last_request().unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer tok-1"));
        // 每次请求都重新取令牌
        assert_eq!(identity.token_fetches.get(), 2);
    }

    #[tokio::test]
    async fn test_stale_authorization_stripped_when_signed_out() {
        struct StaleHeader;

        #[async_trait::async_trait(?Send)]
        impl RequestInterceptor for StaleHeader {
            async fn intercept(&self, req: &mut HttpRequest) -> ApiResult<()> {
                req.headers
                    .insert("authorization".into(), "Bearer old".into());
                Ok(())
            }
        }

        let identity = Rc::new(MockIdentity::new());
        let client = test_client()
            .with_interceptor(StaleHeader)
            .with_identity(identity.clone());
        client.http().mock_response(&url("/x"), 200, json!({}));

        let _: Ack = client.post("/x", &json!({})).await.unwrap();

        let req = client.http().last_request().unwrap();
        assert!(req.header("Authorization").is_none());
        assert_eq!(identity.token_fetches.get(), 0);
    }

    #[tokio::test]
    async fn test_token_failure_aborts_request() {
        let identity = Rc::new(MockIdentity::signed_in("fb-uid", "tok-1"));
        identity.fail_token.set(true);
        let client = test_client().with_identity(identity);

        let res: ApiResult<Ack> = client.post("/x", &json!({})).await;
        assert!(matches!(res, Err(ApiError::Provider(_))));
        assert!(client.http().requests.borrow().is_empty());
    }
}
