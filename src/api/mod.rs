//! 领域 API 模块
//!
//! 每个模块借用同一个 `ApiClient`，负责把类型化参数组装成路由与 JSON 载荷，
//! 并对响应做轻量规范化。所有操作都返回 `ApiResult<T>`。

mod calendar;
mod notifications;
mod teams;
mod training;
mod users;

pub use calendar::{CalendarApi, EventUpdates, NewEvent};
pub use notifications::{NotificationsApi, TeamNotification};
pub use teams::TeamsApi;
pub use training::{TrainingApi, normalize_entries};
pub use users::UsersApi;

use crate::client::ApiClient;
use crate::request::HttpClient;

impl<C: HttpClient> ApiClient<C> {
    pub fn calendar(&self) -> CalendarApi<'_, C> {
        CalendarApi::new(self)
    }

    pub fn teams(&self) -> TeamsApi<'_, C> {
        TeamsApi::new(self)
    }

    pub fn training(&self) -> TrainingApi<'_, C> {
        TrainingApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_, C> {
        UsersApi::new(self)
    }

    pub fn notifications(&self) -> NotificationsApi<'_, C> {
        NotificationsApi::new(self)
    }
}
