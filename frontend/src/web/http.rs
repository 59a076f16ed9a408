//! HTTP 传输实现
//!
//! 使用 `web_sys::fetch` 实现核心库的 `HttpClient`，
//! 超时由 `AbortController` 配合 `setTimeout` 实现。

use trainlog::request::{HttpClient, HttpRequest, HttpResponse};
use trainlog::{ApiError, ApiResult};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, Response};

use super::timer::Timeout;

/// 基于浏览器 fetch 的 HTTP 客户端
#[derive(Clone, Copy, Default)]
pub struct FetchHttpClient;

impl FetchHttpClient {
    fn build_request(req: &HttpRequest, controller: &AbortController) -> ApiResult<Request> {
        let headers = Headers::new()
            .map_err(|e| ApiError::Transport(format!("创建 Headers 失败: {:?}", e)))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| ApiError::Transport(format!("设置 Header 失败: {:?}", e)))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        opts.set_signal(Some(&controller.signal()));
        if let Some(body) = &req.body {
            opts.set_body(&JsValue::from_str(body));
        }

        Request::new_with_str_and_init(&req.url, &opts)
            .map_err(|e| ApiError::Transport(format!("{:?}", e)))
    }
}

#[async_trait::async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let window =
            web_sys::window().ok_or_else(|| ApiError::Transport("无法获取 window 对象".into()))?;
        let controller = AbortController::new()
            .map_err(|e| ApiError::Transport(format!("创建 AbortController 失败: {:?}", e)))?;
        let request = Self::build_request(&req, &controller)?;

        // 超时后中止请求；请求先完成时 drop 会清除定时器
        let abort = controller.clone();
        let _deadline = Timeout::new(req.timeout, move || abort.abort());

        let resp_value = match JsFuture::from(window.fetch_with_request(&request)).await {
            Ok(v) => v,
            Err(_) if controller.signal().aborted() => {
                log::warn!("[HTTP] {} 超时", req.url);
                return Err(ApiError::Timeout(req.timeout));
            }
            Err(e) => return Err(ApiError::Transport(format!("{:?}", e))),
        };

        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| ApiError::Decode(format!("Response 类型转换失败: {:?}", e)))?;
        let status = response.status();

        let promise = response
            .text()
            .map_err(|e| ApiError::Decode(format!("{:?}", e)))?;
        let text = JsFuture::from(promise).await.map_err(|e| {
            if controller.signal().aborted() {
                ApiError::Timeout(req.timeout)
            } else {
                ApiError::Decode(format!("{:?}", e))
            }
        })?;
        let body = text.as_string().unwrap_or_default();

        Ok(HttpResponse { status, body })
    }
}
