use serde_json::Value;
use trainlog_shared::date::TimeInput;
use trainlog_shared::protocol::{
    CreateEventRequest, DeleteEventRequest, EditEventRequest, EventPatch, GetEventsByDateRequest,
};
use trainlog_shared::{Event, IdOr};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;

/// 新建事件的输入
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub team_id: String,
    pub title: String,
    pub location: String,
    pub start_time: TimeInput,
    pub end_time: TimeInput,
    pub description: Option<String>,
    pub link: Option<String>,
    pub coach_id: Option<String>,
}

/// 事件的部分更新，`None` 表示不修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventUpdates {
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<TimeInput>,
    pub end_time: Option<TimeInput>,
    pub description: Option<String>,
    pub link: Option<String>,
}

pub struct CalendarApi<'a, C: HttpClient> {
    client: &'a ApiClient<C>,
}

impl<'a, C: HttpClient> CalendarApi<'a, C> {
    pub fn new(client: &'a ApiClient<C>) -> Self {
        Self { client }
    }

    /// 创建事件，返回后端生成的事件（ID 或完整记录）
    pub async fn create_event(&self, event: NewEvent) -> ApiResult<IdOr<Event>> {
        let req = create_event_payload(event)?;
        let created = self.client.call(&req).await?;
        Ok(created.event)
    }

    /// 查询某队伍某一天的事件，时间字段已还原为时间值
    pub async fn get_events_by_date(
        &self,
        team_id: &str,
        day: u32,
        month: u32,
        year: i32,
    ) -> ApiResult<Vec<Event>> {
        log::debug!(
            "getEventsByDate called with: day={} month={} year={}",
            day,
            month,
            year
        );
        let req = GetEventsByDateRequest {
            team_id: team_id.to_string(),
            day,
            month,
            year,
        };
        let raw = self.client.call(&req).await?.events;
        Ok(rehydrate_events(raw))
    }

    pub async fn edit_event(
        &self,
        event_id: &str,
        updates: EventUpdates,
        coach_id: Option<&str>,
    ) -> ApiResult<()> {
        let req = EditEventRequest {
            event_id: event_id.to_string(),
            updates: event_patch(updates)?,
            coach_id: coach_id.map(str::to_string),
        };
        self.client.call(&req).await?;
        Ok(())
    }

    pub async fn delete_event(&self, event_id: &str, coach_id: Option<&str>) -> ApiResult<()> {
        let req = DeleteEventRequest {
            event_id: event_id.to_string(),
            coach_id: coach_id.map(str::to_string),
        };
        self.client.call(&req).await?;
        Ok(())
    }
}

/// 组装创建载荷：时间转 ISO 字符串，空的描述与链接直接省略
pub fn create_event_payload(event: NewEvent) -> ApiResult<CreateEventRequest> {
    Ok(CreateEventRequest {
        start_time: iso(&event.start_time, "startTime")?,
        end_time: iso(&event.end_time, "endTime")?,
        team_id: event.team_id,
        title: event.title,
        location: event.location,
        description: non_empty(event.description),
        link: non_empty(event.link),
        coach_id: event.coach_id,
    })
}

fn event_patch(updates: EventUpdates) -> ApiResult<EventPatch> {
    Ok(EventPatch {
        start_time: updates
            .start_time
            .as_ref()
            .map(|t| iso(t, "startTime"))
            .transpose()?,
        end_time: updates
            .end_time
            .as_ref()
            .map(|t| iso(t, "endTime"))
            .transpose()?,
        title: updates.title,
        location: updates.location,
        description: updates.description,
        link: updates.link,
    })
}

/// 逐条还原事件，时间缺失或无法解析的记录被跳过
fn rehydrate_events(raw: Vec<Value>) -> Vec<Event> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<Event>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                log::warn!("skipping malformed event: {}", e);
                None
            }
        })
        .collect()
}

fn iso(input: &TimeInput, field: &str) -> ApiResult<String> {
    input
        .to_iso_string()
        .ok_or_else(|| ApiError::InvalidInput(format!("{} 不是合法的时间: {:?}", field, input)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{test_client, url};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn new_event(description: Option<&str>, link: Option<&str>) -> NewEvent {
        NewEvent {
            team_id: "t1".into(),
            title: "Long run".into(),
            location: "Park".into(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap().into(),
            end_time: "2024-03-05T11:00:00Z".into(),
            description: description.map(str::to_string),
            link: link.map(str::to_string),
            coach_id: Some("c1".into()),
        }
    }

    #[tokio::test]
    async fn test_create_event_omits_empty_optionals() {
        for (description, link) in [(None, None), (Some(""), Some("")), (None, Some(""))] {
            let client = test_client();
            client.http().mock_response(
                &url("/CalanderEvent/createEvent"),
                200,
                json!({ "event": "e1" }),
            );

            let created = client
                .calendar()
                .create_event(new_event(description, link))
                .await
                .unwrap();
            assert_eq!(created, IdOr::Id("e1".into()));

            let body = client.http().last_body().unwrap();
            let obj = body.as_object().unwrap();
            assert!(!obj.contains_key("description"));
            assert!(!obj.contains_key("link"));
            assert_eq!(obj["startTime"], json!("2024-03-05T10:00:00.000Z"));
            assert_eq!(obj["endTime"], json!("2024-03-05T11:00:00.000Z"));
            assert_eq!(obj["coachId"], json!("c1"));
        }
    }

    #[tokio::test]
    async fn test_create_event_keeps_present_optionals() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/CalanderEvent/createEvent"), 200, json!({ "event": "e1" }));

        client
            .calendar()
            .create_event(new_event(Some("Easy pace"), Some("https://maps.example/park")))
            .await
            .unwrap();

        let body = client.http().last_body().unwrap();
        assert_eq!(body["description"], json!("Easy pace"));
        assert_eq!(body["link"], json!("https://maps.example/park"));
    }

    #[tokio::test]
    async fn test_create_event_rejects_unparseable_time_before_sending() {
        let client = test_client();
        let mut event = new_event(None, None);
        event.end_time = "whenever".into();

        let res = client.calendar().create_event(event).await;

        assert!(matches!(res, Err(ApiError::InvalidInput(_))));
        assert!(client.http().requests.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_get_events_by_date_rehydrates_times() {
        let client = test_client();
        client.http().mock_response(
            &url("/CalanderEvent/getEventsByDate"),
            200,
            json!({ "events": [
                { "startTime": "2024-03-05T10:00:00Z", "endTime": "2024-03-05T11:00:00Z" }
            ]}),
        );

        let events = client
            .calendar()
            .get_events_by_date("t1", 5, 3, 2024)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].start_time,
            Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
        );
        assert_eq!(
            events[0].end_time,
            Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap()
        );
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "teamId": "t1", "day": 5, "month": 3, "year": 2024 })
        );
    }

    #[tokio::test]
    async fn test_get_events_by_date_skips_malformed_events() {
        let client = test_client();
        client.http().mock_response(
            &url("/CalanderEvent/getEventsByDate"),
            200,
            json!({ "events": [
                { "_id": "ok", "startTime": "2024-03-05T10:00:00Z", "endTime": "2024-03-05T11:00:00Z" },
                { "_id": "no-end", "startTime": "2024-03-05T12:00:00Z" },
                { "_id": "bad-start", "startTime": "soon", "endTime": "2024-03-05T13:00:00Z" }
            ]}),
        );

        let events = client
            .calendar()
            .get_events_by_date("t1", 5, 3, 2024)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].start_time,
            Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_get_events_by_date_error_passes_through() {
        let client = test_client();
        client.http().mock_response(
            &url("/CalanderEvent/getEventsByDate"),
            200,
            json!({ "error": "Team not found" }),
        );

        let res = client.calendar().get_events_by_date("t1", 5, 3, 2024).await;
        assert_eq!(res, Err(ApiError::backend("Team not found")));
    }

    #[tokio::test]
    async fn test_get_events_by_date_missing_list_is_empty() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/CalanderEvent/getEventsByDate"), 200, json!({}));

        let events = client
            .calendar()
            .get_events_by_date("t1", 1, 1, 2024)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_edit_event_sends_partial_updates() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/CalanderEvent/editEvent"), 200, json!({}));

        let updates = EventUpdates {
            title: Some("Tempo".into()),
            start_time: Some("2024-03-06T07:30".into()),
            ..Default::default()
        };
        client
            .calendar()
            .edit_event("e1", updates, Some("c1"))
            .await
            .unwrap();

        assert_eq!(
            client.http().last_body().unwrap(),
            json!({
                "eventId": "e1",
                "updates": { "title": "Tempo", "startTime": "2024-03-06T07:30:00.000Z" },
                "coachId": "c1"
            })
        );
    }

    #[tokio::test]
    async fn test_delete_event_without_coach() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/CalanderEvent/deleteEvent"), 200, json!({}));

        client.calendar().delete_event("e1", None).await.unwrap();
        assert_eq!(client.http().last_body().unwrap(), json!({ "eventId": "e1" }));
    }
}
