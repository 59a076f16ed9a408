use trainlog_shared::protocol::{
    AddAthleteRequest, CreateTeamRequest, DeleteTeamRequest, GetAthletesByTeamRequest,
    GetTeamByAthleteRequest, GetTeamByCoachRequest, RemoveAthleteRequest,
};
use trainlog_shared::{IdOr, Team, User};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::HttpClient;

/// 队伍成员管理
pub struct TeamsApi<'a, C: HttpClient> {
    client: &'a ApiClient<C>,
}

impl<'a, C: HttpClient> TeamsApi<'a, C> {
    pub fn new(client: &'a ApiClient<C>) -> Self {
        Self { client }
    }

    /// 教练创建队伍
    pub async fn create_team(
        &self,
        coach_id: &str,
        title: &str,
        pass_key: &str,
    ) -> ApiResult<IdOr<Team>> {
        let req = CreateTeamRequest {
            coach_id: coach_id.to_string(),
            title: title.to_string(),
            pass_key: pass_key.to_string(),
        };
        Ok(self.client.call(&req).await?.new_team)
    }

    /// 运动员凭队名与口令加入队伍
    pub async fn join_team(&self, athlete_id: &str, title: &str, pass_key: &str) -> ApiResult<()> {
        let req = AddAthleteRequest {
            title: title.to_string(),
            athlete_id: athlete_id.to_string(),
            pass_key: pass_key.to_string(),
        };
        self.client.call(&req).await?;
        Ok(())
    }

    /// 运动员退出队伍
    pub async fn leave_team(&self, athlete_id: &str, title: &str) -> ApiResult<()> {
        let req = RemoveAthleteRequest {
            title: title.to_string(),
            athlete_id: athlete_id.to_string(),
        };
        self.client.call(&req).await?;
        Ok(())
    }

    pub async fn get_team_by_coach(&self, coach_id: &str) -> ApiResult<Team> {
        log::debug!("getTeamByCoach {}", coach_id);
        self.client
            .call(&GetTeamByCoachRequest {
                coach_id: coach_id.to_string(),
            })
            .await
    }

    pub async fn get_team_by_athlete(&self, athlete_id: &str) -> ApiResult<Team> {
        log::debug!("getTeamByAthlete {}", athlete_id);
        self.client
            .call(&GetTeamByAthleteRequest {
                athlete_id: athlete_id.to_string(),
            })
            .await
    }

    pub async fn get_athletes_by_team(&self, team_id: &str) -> ApiResult<Vec<User>> {
        self.client
            .call(&GetAthletesByTeamRequest {
                team_id: team_id.to_string(),
            })
            .await
    }

    /// 教练解散自己的队伍
    pub async fn delete_team(&self, coach_id: &str, title: &str) -> ApiResult<()> {
        let req = DeleteTeamRequest {
            coach_id: coach_id.to_string(),
            title: title.to_string(),
        };
        self.client.call(&req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{test_client, url};
    use crate::error::ApiError;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_team() {
        let client = test_client();
        client.http().mock_response(
            &url("/TeamMembership/createTeam"),
            200,
            json!({ "newTeam": { "_id": "t1", "title": "XC", "coach": "c1", "athletes": [] } }),
        );

        let team = client.teams().create_team("c1", "XC", "secret").await.unwrap();

        assert_eq!(team.record().map(|t| t.id.as_str()), Some("t1"));
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "coachId": "c1", "title": "XC", "passKey": "secret" })
        );
    }

    #[tokio::test]
    async fn test_join_team_uses_add_athlete_route() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/TeamMembership/addAthlete"), 200, json!({}));

        client.teams().join_team("a1", "XC", "secret").await.unwrap();

        let req = client.http().last_request().unwrap();
        assert!(req.url.ends_with("/TeamMembership/addAthlete"));
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "title": "XC", "athleteId": "a1", "passKey": "secret" })
        );
    }

    #[tokio::test]
    async fn test_join_team_wrong_key() {
        let client = test_client();
        client.http().mock_response(
            &url("/TeamMembership/addAthlete"),
            200,
            json!({ "error": "Incorrect passkey" }),
        );

        let res = client.teams().join_team("a1", "XC", "nope").await;
        assert_eq!(res, Err(ApiError::backend("Incorrect passkey")));
    }

    #[tokio::test]
    async fn test_leave_team_uses_remove_athlete_route() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/TeamMembership/removeAthlete"), 200, json!({}));

        client.teams().leave_team("a1", "XC").await.unwrap();
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "title": "XC", "athleteId": "a1" })
        );
    }

    #[tokio::test]
    async fn test_team_lookups() {
        let client = test_client();
        let team = json!({ "_id": "t1", "title": "XC", "coach": "c1", "athletes": ["a1", "a2"] });
        client
            .http()
            .mock_response(&url("/TeamMembership/getTeamByCoach"), 200, team.clone());
        client
            .http()
            .mock_response(&url("/TeamMembership/getTeamByAthlete"), 200, team);
        client.http().mock_response(
            &url("/TeamMembership/getAthletesByTeam"),
            200,
            json!([{ "_id": "a1", "name": "Ada" }, { "_id": "a2" }]),
        );

        let by_coach = client.teams().get_team_by_coach("c1").await.unwrap();
        assert_eq!(by_coach.athletes, vec!["a1".to_string(), "a2".to_string()]);

        let by_athlete = client.teams().get_team_by_athlete("a1").await.unwrap();
        assert_eq!(by_athlete, by_coach);

        let athletes = client.teams().get_athletes_by_team("t1").await.unwrap();
        assert_eq!(athletes.len(), 2);
        assert_eq!(athletes[0].name.as_deref(), Some("Ada"));
        assert_eq!(client.http().last_body().unwrap(), json!({ "teamId": "t1" }));
    }

    #[tokio::test]
    async fn test_delete_team() {
        let client = test_client();
        client
            .http()
            .mock_response(&url("/TeamMembership/deleteTeam"), 200, json!({}));

        client.teams().delete_team("c1", "XC").await.unwrap();
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "coachId": "c1", "title": "XC" })
        );
    }
}
