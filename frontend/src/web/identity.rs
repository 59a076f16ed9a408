//! 身份提供方绑定
//!
//! 宿主页面在 `window.trainlogIdentity` 上暴露对 Firebase Auth 的薄封装
//! （见 `index.html`），这里把它适配为核心库的 `IdentityProvider`。

use serde::Deserialize;
use trainlog::auth::{
    IdentityProvider, ProviderError, ProviderSession, SessionListener, Subscription,
};
use wasm_bindgen::prelude::*;

/// 用户主动关闭或重复打开弹窗时 Firebase 返回的错误码
const CANCELLED_CODES: [&str; 2] = ["auth/popup-closed-by-user", "auth/cancelled-popup-request"];

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = trainlogIdentity, js_name = signIn, catch)]
    async fn js_sign_in() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = trainlogIdentity, js_name = signOut, catch)]
    async fn js_sign_out() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = trainlogIdentity, js_name = currentUser)]
    fn js_current_user() -> JsValue;

    #[wasm_bindgen(js_namespace = trainlogIdentity, js_name = getIdToken, catch)]
    async fn js_get_id_token() -> Result<JsValue, JsValue>;

    /// 返回取消订阅函数
    #[wasm_bindgen(js_namespace = trainlogIdentity, js_name = onAuthStateChanged)]
    fn js_on_auth_state_changed(callback: &Closure<dyn FnMut(JsValue)>) -> js_sys::Function;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsUser {
    uid: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<JsUser> for ProviderSession {
    fn from(user: JsUser) -> Self {
        ProviderSession {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

fn to_session(value: JsValue) -> Option<ProviderSession> {
    match serde_wasm_bindgen::from_value::<Option<JsUser>>(value) {
        Ok(user) => user.map(Into::into),
        Err(e) => {
            log::warn!("[Identity] 无法解析用户对象: {}", e);
            None
        }
    }
}

fn js_prop(value: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str(key))
        .ok()?
        .as_string()
}

fn to_provider_error(err: JsValue) -> ProviderError {
    let code = js_prop(&err, "code").unwrap_or_default();
    if CANCELLED_CODES.contains(&code.as_str()) {
        return ProviderError::Cancelled;
    }
    let message = js_prop(&err, "message")
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    ProviderError::Failed(message)
}

/// Firebase Auth（Google 登录）
#[derive(Clone, Copy, Default)]
pub struct FirebaseIdentity;

#[async_trait::async_trait(?Send)]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in_with_popup(&self) -> Result<ProviderSession, ProviderError> {
        let user = js_sign_in().await.map_err(to_provider_error)?;
        to_session(user).ok_or_else(|| ProviderError::Failed("登录未返回用户".to_string()))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        js_sign_out().await.map_err(to_provider_error)?;
        Ok(())
    }

    fn current_session(&self) -> Option<ProviderSession> {
        to_session(js_current_user())
    }

    async fn id_token(&self, _session: &ProviderSession) -> Result<String, ProviderError> {
        let token = js_get_id_token().await.map_err(to_provider_error)?;
        token
            .as_string()
            .ok_or_else(|| ProviderError::Failed("ID Token 不是字符串".to_string()))
    }

    fn on_session_change(&self, listener: SessionListener) -> Subscription {
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |user: JsValue| {
            listener(to_session(user));
        });
        let unsubscribe = js_on_auth_state_changed(&callback);

        Subscription::new(move || {
            if let Err(e) = unsubscribe.call0(&JsValue::NULL) {
                log::warn!("[Identity] 取消订阅失败: {:?}", e);
            }
            drop(callback);
        })
    }
}
