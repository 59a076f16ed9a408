use serde_json::{Map, Value};
use trainlog_shared::protocol::{GetTeamWeeklySummariesRequest, ListEntriesRequest};
use trainlog_shared::{DailyEntry, TrainingEntry};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::HttpClient;

/// 记录日期的候选字段，按优先级排列
const DAY_SOURCES: [&str; 5] = ["day", "date", "dateStr", "createdAt", "updatedAt"];

/// 训练记录
pub struct TrainingApi<'a, C: HttpClient> {
    client: &'a ApiClient<C>,
}

impl<'a, C: HttpClient> TrainingApi<'a, C> {
    pub fn new(client: &'a ApiClient<C>) -> Self {
        Self { client }
    }

    /// 写入某天的训练数据，未填写的指标不出现在载荷中
    pub async fn log_daily_entry(&self, entry: &DailyEntry) -> ApiResult<Value> {
        self.client.call(entry).await
    }

    /// 查询训练记录并规范化，`from`/`to` 为 `YYYY-MM-DD`
    pub async fn list_entries(
        &self,
        user_id: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> ApiResult<Vec<TrainingEntry>> {
        let req = ListEntriesRequest {
            user_id: user_id.to_string(),
            from: from.map(str::to_string),
            to: to.map(str::to_string),
        };
        let raw = self.client.call(&req).await?;
        let entries = normalize_entries(raw);
        log::debug!("listEntries: {} entries for {}", entries.len(), user_id);
        Ok(entries)
    }

    /// 教练视角的队伍周汇总，原样返回
    pub async fn get_team_weekly_summaries(&self, user_id: &str, date: &str) -> ApiResult<Value> {
        self.client
            .call(&GetTeamWeeklySummariesRequest {
                user_id: user_id.to_string(),
                date: date.to_string(),
            })
            .await
    }
}

/// 规范化 `listEntries` 的响应
///
/// 接受 `{entries: [...]}` 或裸数组，其它外形视为空列表。
/// 无法确定日期的记录被丢弃。
pub fn normalize_entries(raw: Value) -> Vec<TrainingEntry> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("entries") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(normalize_entry)
        .collect()
}

fn normalize_entry(obj: &Map<String, Value>) -> Option<TrainingEntry> {
    let day = resolve_day(obj)?;
    Some(TrainingEntry {
        day,
        mileage: to_number(obj.get("mileage")),
        stress: to_number(obj.get("stress")),
        sleep: to_number(obj.get("sleep")),
        resting_heart_rate: to_number(obj.get("restingHeartRate")),
        exercise_heart_rate: to_number(obj.get("exerciseHeartRate")),
        perceived_exertion: to_number(obj.get("perceivedExertion")),
        notes: obj
            .get("notes")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// 取第一个非 null 的日期来源；只有字符串才截取前 10 个字符
fn resolve_day(obj: &Map<String, Value>) -> Option<String> {
    let source = DAY_SOURCES
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())?;

    let day: String = source.as_str()?.chars().take(10).collect();
    if day.is_empty() { None } else { Some(day) }
}

/// 保留空值的数值解析：null、缺失、空串与非数值都得到 `None`
fn to_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{test_client, url};
    use crate::error::ApiError;
    use serde_json::json;

    #[test]
    fn test_normalize_accepts_wrapped_and_bare_lists() {
        let entry = json!({ "day": "2024-03-05", "mileage": 5 });

        let wrapped = normalize_entries(json!({ "entries": [entry.clone()] }));
        let bare = normalize_entries(json!([entry]));

        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped, bare);
        assert!(normalize_entries(json!({ "entries": "nope" })).is_empty());
        assert!(normalize_entries(json!("nope")).is_empty());
        assert!(normalize_entries(Value::Null).is_empty());
    }

    #[test]
    fn test_day_resolution_order_and_truncation() {
        let entries = normalize_entries(json!([
            { "day": null, "date": "2024-03-05T06:00:00.000Z", "createdAt": "2020-01-01" },
            { "dateStr": "2024-03-06" },
            { "updatedAt": "2024-03-07T23:59:59Z" },
        ]));

        let days: Vec<&str> = entries.iter().map(|e| e.day.as_str()).collect();
        assert_eq!(days, vec!["2024-03-05", "2024-03-06", "2024-03-07"]);
    }

    #[test]
    fn test_entries_without_day_are_dropped() {
        let entries = normalize_entries(json!([
            { "mileage": 3 },
            { "day": 20240305 },
            { "day": "" },
            "not an object",
            { "day": "2024-03-05", "mileage": 4 },
        ]));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mileage, Some(4.0));
    }

    #[test]
    fn test_numeric_fields_preserve_absence() {
        let entries = normalize_entries(json!([{
            "day": "2024-03-05",
            "mileage": "6.5",
            "stress": "",
            "sleep": null,
            "restingHeartRate": 52,
            "exerciseHeartRate": "fast",
            "perceivedExertion": true,
        }]));

        let e = &entries[0];
        assert_eq!(e.mileage, Some(6.5));
        assert_eq!(e.stress, None);
        assert_eq!(e.sleep, None);
        assert_eq!(e.resting_heart_rate, Some(52.0));
        assert_eq!(e.exercise_heart_rate, None);
        assert_eq!(e.perceived_exertion, None);
        assert_eq!(e.notes, "");
    }

    #[tokio::test]
    async fn test_list_entries_sends_range() {
        let client = test_client();
        client.http().mock_response(
            &url("/TrainingRecords/listEntries"),
            200,
            json!({ "entries": [{ "date": "2024-03-05", "notes": "hills" }] }),
        );

        let entries = client
            .training()
            .list_entries("u1", Some("2024-03-01"), Some("2024-03-07"))
            .await
            .unwrap();

        assert_eq!(entries[0].notes, "hills");
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "userId": "u1", "from": "2024-03-01", "to": "2024-03-07" })
        );
    }

    #[tokio::test]
    async fn test_list_entries_backend_error() {
        let client = test_client();
        client.http().mock_response(
            &url("/TrainingRecords/listEntries"),
            200,
            json!({ "error": "User not found" }),
        );

        let res = client.training().list_entries("ghost", None, None).await;
        assert_eq!(res, Err(ApiError::backend("User not found")));
    }

    #[tokio::test]
    async fn test_log_daily_entry_omits_absent_metrics() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/TrainingRecords/logDailyEntry"), 200, json!({ "ok": true }));

        let entry = DailyEntry {
            user_id: "u1".into(),
            date: "2024-03-05".into(),
            mileage: Some(8.0),
            sleep: Some(7.5),
            ..Default::default()
        };
        let res = client.training().log_daily_entry(&entry).await.unwrap();

        assert_eq!(res, json!({ "ok": true }));
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "userId": "u1", "date": "2024-03-05", "mileage": 8.0, "sleep": 7.5 })
        );
    }

    #[tokio::test]
    async fn test_weekly_summaries_pass_through() {
        let client = test_client();
        let summary = json!({ "weekStart": "2024-03-04", "athletes": [{ "name": "Ada", "miles": 31 }] });
        client.http().mock_response(
            &url("/TrainingRecords/getTeamWeeklySummaries"),
            200,
            summary.clone(),
        );

        let res = client
            .training()
            .get_team_weekly_summaries("c1", "2024-03-05")
            .await
            .unwrap();
        assert_eq!(res, summary);
    }
}
