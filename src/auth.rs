//! 认证模块
//!
//! 封装身份提供方（Google / Firebase）的登录、登出与会话订阅，
//! 并在登录成功后用提供方令牌向后端换取应用用户 ID。
//!
//! 状态机：`SignedOut -> Authenticating -> SignedIn`。
//! 应用用户 ID 同时写入持久化存储（`tt_userId`）和内存中的 `SessionStore`，
//! 两者都只由 `AuthBridge` 写入。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use trainlog_shared::{LoginOutcome, STORAGE_USER_ID_KEY};

use crate::client::ApiClient;
use crate::error::AuthError;
use crate::request::HttpClient;

// =========================================================
// 身份提供方抽象
// =========================================================

/// 身份提供方的已登录用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// 用户关闭了弹窗
    #[error("popup closed by user")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

pub type SessionListener = Box<dyn Fn(Option<ProviderSession>)>;

/// 会话订阅句柄，drop 时取消订阅
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// 不需要取消的订阅
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[async_trait::async_trait(?Send)]
pub trait IdentityProvider {
    /// 打开交互式登录弹窗，直到用户完成或取消
    async fn sign_in_with_popup(&self) -> Result<ProviderSession, ProviderError>;
    async fn sign_out(&self) -> Result<(), ProviderError>;
    fn current_session(&self) -> Option<ProviderSession>;
    /// 获取一个新的 ID Token（刷新由提供方负责）
    async fn id_token(&self, session: &ProviderSession) -> Result<String, ProviderError>;
    /// 订阅会话变化（登录、登出、令牌刷新）
    fn on_session_change(&self, listener: SessionListener) -> Subscription;
}

// =========================================================
// 持久化存储抽象
// =========================================================

/// 与浏览器 LocalStorage 同形的键值存储
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// 操作成功返回 true
    fn set(&self, key: &str, value: &str) -> bool;
    /// 操作成功返回 true（键不存在也算成功）
    fn delete(&self, key: &str) -> bool;
}

/// 内存实现，用于原生环境与测试
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.data.borrow_mut().remove(key);
        true
    }
}

// =========================================================
// 会话状态
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    SignedOut,
    Authenticating,
    SignedIn {
        user_id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// 身份提供方当前会话，随订阅同步
    pub session: Option<ProviderSession>,
    pub phase: AuthPhase,
}

impl SessionState {
    pub fn user_id(&self) -> Option<&str> {
        match &self.phase {
            AuthPhase::SignedIn { user_id } => Some(user_id),
            _ => None,
        }
    }
}

type StateListener = Rc<dyn Fn(&SessionState)>;

/// 应用级会话存储：单写者（`AuthBridge`）多读者
#[derive(Clone, Default)]
pub struct SessionStore {
    state: Rc<RefCell<SessionState>>,
    listeners: Rc<RefCell<Vec<StateListener>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> AuthPhase {
        self.state.borrow().phase.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().user_id().map(str::to_string)
    }

    pub fn current_session(&self) -> Option<ProviderSession> {
        self.state.borrow().session.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state.borrow().phase, AuthPhase::SignedIn { .. })
    }

    /// 注册状态变化监听
    pub fn on_change(&self, listener: impl Fn(&SessionState) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        // 先释放借用再通知，监听者可以安全地读取 store
        let listeners: Vec<StateListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn set_phase(&self, phase: AuthPhase) {
        self.update(|s| s.phase = phase);
    }

    fn set_session(&self, session: Option<ProviderSession>) {
        self.update(|s| s.session = session);
    }
}

// =========================================================
// AuthBridge
// =========================================================

pub struct AuthBridge<P, S, C>
where
    P: IdentityProvider + 'static,
    S: KeyValueStore,
    C: HttpClient,
{
    provider: Rc<P>,
    store: S,
    api: Rc<ApiClient<C>>,
    sessions: SessionStore,
    subscription: RefCell<Option<Subscription>>,
}

impl<P, S, C> AuthBridge<P, S, C>
where
    P: IdentityProvider + 'static,
    S: KeyValueStore,
    C: HttpClient,
{
    pub fn new(provider: Rc<P>, store: S, api: Rc<ApiClient<C>>, sessions: SessionStore) -> Self {
        Self {
            provider,
            store,
            api,
            sessions,
            subscription: RefCell::new(None),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn api(&self) -> &Rc<ApiClient<C>> {
        &self.api
    }

    /// 启动时从持久化存储恢复应用用户 ID
    pub fn restore(&self) -> Option<String> {
        let session = self.provider.current_session();
        let user_id = self.store.get(STORAGE_USER_ID_KEY).filter(|id| !id.is_empty());

        self.sessions.update(|s| {
            s.session = session;
            if let Some(id) = &user_id {
                s.phase = AuthPhase::SignedIn {
                    user_id: id.clone(),
                };
            }
        });

        if let Some(id) = &user_id {
            log::info!("[Auth] restored user {}", id);
        }
        user_id
    }

    /// 订阅身份提供方的会话变化，重复调用不会重复订阅
    pub fn subscribe(&self) {
        if self.subscription.borrow().is_some() {
            return;
        }

        let sessions = self.sessions.clone();
        let sub = self.provider.on_session_change(Box::new(move |session| {
            sessions.set_session(session);
        }));
        *self.subscription.borrow_mut() = Some(sub);
    }

    /// 弹窗登录并向后端注册/登录
    ///
    /// 成功时持久化应用用户 ID 并返回完整的登录结果（含 `needsName` / `needsRole`）。
    /// 取消、提供方失败、后端拒绝都不会持久化任何 ID。
    pub async fn sign_in_and_register(&self) -> Result<LoginOutcome, AuthError> {
        let previous = self.sessions.phase();
        if previous == AuthPhase::Authenticating {
            return Err(AuthError::InProgress);
        }

        log::info!("[Auth] sign-in started");
        self.sessions.set_phase(AuthPhase::Authenticating);

        match self.register().await {
            Ok(outcome) => {
                self.sessions.set_phase(AuthPhase::SignedIn {
                    user_id: outcome.user_id.clone(),
                });
                log::info!("[Auth] signed in as {}", outcome.user_id);
                Ok(outcome)
            }
            Err(e) => {
                if e.is_cancelled() {
                    log::info!("[Auth] sign-in cancelled");
                } else {
                    log::error!("[Auth] sign-in failed: {}", e);
                }
                match (&e, previous) {
                    // 弹窗被取消时提供方会话未被替换，保留原状态
                    (AuthError::Cancelled, previous @ AuthPhase::SignedIn { .. }) => {
                        self.sessions.set_phase(previous);
                    }
                    (_, AuthPhase::SignedIn { .. }) => {
                        // 提供方会话可能已切换到新账号，旧的应用用户 ID 不再可信
                        if !self.store.delete(STORAGE_USER_ID_KEY) {
                            log::warn!("[Auth] failed to clear stored user id");
                        }
                        self.sessions.set_phase(AuthPhase::SignedOut);
                    }
                    _ => self.sessions.set_phase(AuthPhase::SignedOut),
                }
                Err(e)
            }
        }
    }

    async fn register(&self) -> Result<LoginOutcome, AuthError> {
        let session = self
            .provider
            .sign_in_with_popup()
            .await
            .map_err(|e| match e {
                ProviderError::Cancelled => AuthError::Cancelled,
                ProviderError::Failed(msg) => AuthError::Provider(msg),
            })?;
        self.sessions.set_session(Some(session.clone()));

        let token = self
            .provider
            .id_token(&session)
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let outcome = self.api.users().login_with_google_id_token(&token).await?;
        if outcome.user_id.is_empty() {
            return Err(AuthError::MissingUserId);
        }

        if !self.store.set(STORAGE_USER_ID_KEY, &outcome.user_id) {
            log::warn!("[Auth] failed to persist user id");
        }
        Ok(outcome)
    }

    /// 清除持久化的用户 ID 并登出身份提供方
    ///
    /// 提供方会话只在提供方确认登出后才清除。
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if !self.store.delete(STORAGE_USER_ID_KEY) {
            log::warn!("[Auth] failed to clear stored user id");
        }
        self.sessions.set_phase(AuthPhase::SignedOut);

        self.provider.sign_out().await.map_err(|e| {
            log::error!("[Auth] provider sign-out failed: {}", e);
            AuthError::Provider(e.to_string())
        })?;
        self.sessions.set_session(None);
        Ok(())
    }
}
