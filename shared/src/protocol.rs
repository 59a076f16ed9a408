//! 后端路由协议
//!
//! 每个后端动作对应一个请求结构体，通过 `ApiRequest` 声明路径、方法和响应类型。
//! 请求体字段与后端保持 camelCase 命名。

use crate::{
    Ack, DailyEntry, Event, Gender, IdOr, LoginOutcome, NotificationReceipt, Role, Team, User,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The URL path, relative to the API base.
    const PATH: &'static str;
    /// The HTTP method. GET requests send their fields as query parameters.
    const METHOD: HttpMethod;
}

macro_rules! api_request {
    ($req:ty => $resp:ty, $method:ident $path:literal) => {
        impl ApiRequest for $req {
            type Response = $resp;
            const PATH: &'static str = $path;
            const METHOD: HttpMethod = HttpMethod::$method;
        }
    };
}

// =========================================================
// CalanderEvent
// =========================================================

/// 创建事件。时间字段已格式化为 ISO 字符串，空的描述与链接不出现在载荷中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub team_id: String,
    pub title: String,
    pub location: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedEvent {
    pub event: IdOr<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEventsByDateRequest {
    pub team_id: String,
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventsByDate {
    /// 原始事件记录，由调用方逐条还原
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

/// 事件的部分更新，缺省字段不出现在载荷中
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEventRequest {
    pub event_id: String,
    pub updates: EventPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventRequest {
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach_id: Option<String>,
}

api_request!(CreateEventRequest => CreatedEvent, Post "/CalanderEvent/createEvent");
api_request!(GetEventsByDateRequest => EventsByDate, Post "/CalanderEvent/getEventsByDate");
api_request!(EditEventRequest => Ack, Post "/CalanderEvent/editEvent");
api_request!(DeleteEventRequest => Ack, Post "/CalanderEvent/deleteEvent");

// =========================================================
// TeamMembership
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub coach_id: String,
    pub title: String,
    pub pass_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTeam {
    pub new_team: IdOr<Team>,
}

/// 运动员通过队名与口令加入队伍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAthleteRequest {
    pub title: String,
    pub athlete_id: String,
    pub pass_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAthleteRequest {
    pub title: String,
    pub athlete_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTeamByCoachRequest {
    pub coach_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTeamByAthleteRequest {
    pub athlete_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAthletesByTeamRequest {
    pub team_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTeamRequest {
    pub coach_id: String,
    pub title: String,
}

api_request!(CreateTeamRequest => CreatedTeam, Post "/TeamMembership/createTeam");
api_request!(AddAthleteRequest => Ack, Post "/TeamMembership/addAthlete");
api_request!(RemoveAthleteRequest => Ack, Post "/TeamMembership/removeAthlete");
api_request!(GetTeamByCoachRequest => Team, Post "/TeamMembership/getTeamByCoach");
api_request!(GetTeamByAthleteRequest => Team, Post "/TeamMembership/getTeamByAthlete");
api_request!(GetAthletesByTeamRequest => Vec<User>, Post "/TeamMembership/getAthletesByTeam");
api_request!(DeleteTeamRequest => Ack, Post "/TeamMembership/deleteTeam");

// =========================================================
// TrainingRecords
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTeamWeeklySummariesRequest {
    pub user_id: String,
    pub date: String,
}

// 记录列表的外形不固定，由客户端做容错规范化
api_request!(DailyEntry => serde_json::Value, Post "/TrainingRecords/logDailyEntry");
api_request!(ListEntriesRequest => serde_json::Value, Post "/TrainingRecords/listEntries");
api_request!(GetTeamWeeklySummariesRequest => serde_json::Value, Post "/TrainingRecords/getTeamWeeklySummaries");

// =========================================================
// UserDirectory
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginWithGoogleIdTokenRequest {
    pub id_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserMileageRequest {
    pub user_id: String,
    pub new_mileage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserRoleRequest {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserGenderRequest {
    pub user_id: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserRequest {
    pub user_id: String,
}

api_request!(LoginWithGoogleIdTokenRequest => LoginOutcome, Post "/UserDirectory/loginWithGoogleIdToken");
api_request!(EditUserMileageRequest => Ack, Post "/UserDirectory/editUserMileage");
api_request!(EditUserRoleRequest => Ack, Post "/UserDirectory/editUserRole");
api_request!(EditUserGenderRequest => Ack, Post "/UserDirectory/editUserGender");
api_request!(GetUserRequest => User, Get "/UserDirectory/getUser");

// =========================================================
// Notifications
// =========================================================

/// 向发送者所在队伍的全部运动员发送邮件通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub sender_id: String,
    pub event_ids: Vec<String>,
    pub additional_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
}

api_request!(SendNotificationRequest => NotificationReceipt, Post "/Notifications/sendNow");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_event_omits_absent_optionals() {
        let req = CreateEventRequest {
            team_id: "t1".into(),
            title: "Tempo".into(),
            location: "Track".into(),
            start_time: "2024-03-05T10:00:00.000Z".into(),
            end_time: "2024-03-05T11:00:00.000Z".into(),
            description: None,
            link: None,
            coach_id: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("description"));
        assert!(!obj.contains_key("link"));
        assert!(!obj.contains_key("coachId"));
        assert_eq!(obj["teamId"], json!("t1"));
    }

    #[test]
    fn test_get_user_is_a_get() {
        assert_eq!(GetUserRequest::METHOD, HttpMethod::Get);
        assert_eq!(<CreateTeamRequest as ApiRequest>::METHOD, HttpMethod::Post);
        assert_eq!(AddAthleteRequest::PATH, "/TeamMembership/addAthlete");
    }

    #[test]
    fn test_created_team_reads_new_team() {
        let created: CreatedTeam = serde_json::from_value(json!({ "newTeam": "t9" })).unwrap();
        assert_eq!(created.new_team, IdOr::Id("t9".into()));
    }
}
