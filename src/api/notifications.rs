use trainlog_shared::date::TimeInput;
use trainlog_shared::protocol::SendNotificationRequest;
use trainlog_shared::NotificationReceipt;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;

/// 发往整支队伍的通知
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamNotification {
    pub sender_id: String,
    pub event_ids: Vec<String>,
    /// 附言，缺省为空串
    pub additional_message: String,
    /// 定时发送时间；`None` 表示立即发送
    pub scheduled_at: Option<TimeInput>,
}

pub struct NotificationsApi<'a, C: HttpClient> {
    client: &'a ApiClient<C>,
}

impl<'a, C: HttpClient> NotificationsApi<'a, C> {
    pub fn new(client: &'a ApiClient<C>) -> Self {
        Self { client }
    }

    pub async fn send_notification_to_team(
        &self,
        notification: TeamNotification,
    ) -> ApiResult<NotificationReceipt> {
        // 空白的定时时间视为立即发送
        let scheduled_at = notification
            .scheduled_at
            .as_ref()
            .filter(|t| !t.is_blank())
            .map(|t| {
                t.to_iso_string().ok_or_else(|| {
                    ApiError::InvalidInput(format!("scheduledAt 不是合法的时间: {:?}", t))
                })
            })
            .transpose()?;

        let req = SendNotificationRequest {
            sender_id: notification.sender_id,
            event_ids: notification.event_ids,
            additional_message: notification.additional_message,
            scheduled_at,
        };
        let receipt = self.client.call(&req).await?;
        log::info!("notification sent: {:?}", receipt.id);
        Ok(receipt)
    }
}
