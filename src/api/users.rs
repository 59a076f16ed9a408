use trainlog_shared::protocol::{
    EditUserGenderRequest, EditUserMileageRequest, EditUserRoleRequest, GetUserRequest,
    LoginWithGoogleIdTokenRequest,
};
use trainlog_shared::{Gender, LoginOutcome, Role, User};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::HttpClient;

/// 用户目录
pub struct UsersApi<'a, C: HttpClient> {
    client: &'a ApiClient<C>,
}

impl<'a, C: HttpClient> UsersApi<'a, C> {
    pub fn new(client: &'a ApiClient<C>) -> Self {
        Self { client }
    }

    /// 用 Google ID Token 登录（不存在则创建）应用用户
    pub async fn login_with_google_id_token(&self, id_token: &str) -> ApiResult<LoginOutcome> {
        log::debug!("loginWithGoogleIdToken");
        self.client
            .call(&LoginWithGoogleIdTokenRequest {
                id_token: id_token.to_string(),
            })
            .await
    }

    pub async fn edit_user_mileage(&self, user_id: &str, new_mileage: f64) -> ApiResult<()> {
        let req = EditUserMileageRequest {
            user_id: user_id.to_string(),
            new_mileage,
        };
        self.client.call(&req).await?;
        Ok(())
    }

    pub async fn edit_user_role(&self, user_id: &str, role: Role) -> ApiResult<()> {
        let req = EditUserRoleRequest {
            user_id: user_id.to_string(),
            role,
        };
        self.client.call(&req).await?;
        Ok(())
    }

    pub async fn edit_user_gender(&self, user_id: &str, gender: Gender) -> ApiResult<()> {
        let req = EditUserGenderRequest {
            user_id: user_id.to_string(),
            gender,
        };
        self.client.call(&req).await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.client
            .call(&GetUserRequest {
                user_id: user_id.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{test_client, url};
    use crate::error::ApiError;
    use crate::request::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_outcome() {
        let client = test_client();
        client.http().mock_response(
            &url("/UserDirectory/loginWithGoogleIdToken"),
            200,
            json!({ "userId": "u1", "needsName": false, "needsRole": true }),
        );

        let outcome = client.users().login_with_google_id_token("idt").await.unwrap();
        assert_eq!(
            outcome,
            LoginOutcome {
                user_id: "u1".into(),
                needs_name: false,
                needs_role: true
            }
        );
    }

    #[tokio::test]
    async fn test_profile_edits() {
        let client = test_client();
        for path in ["editUserMileage", "editUserRole", "editUserGender"] {
            client
                .http()
                .mock_response(&url(&format!("/UserDirectory/{}", path)), 200, json!({}));
        }

        client.users().edit_user_mileage("u1", 35.5).await.unwrap();
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "userId": "u1", "newMileage": 35.5 })
        );

        client.users().edit_user_role("u1", Role::Coach).await.unwrap();
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "userId": "u1", "role": "coach" })
        );

        client
            .users()
            .edit_user_gender("u1", Gender::Female)
            .await
            .unwrap();
        assert_eq!(
            client.http().last_body().unwrap(),
            json!({ "userId": "u1", "gender": "female" })
        );
    }

    #[tokio::test]
    async fn test_get_user_uses_query_string() {
        let client = test_client();
        client.http().mock_response(
            &url("/UserDirectory/getUser?userId=u1"),
            200,
            json!({ "_id": "u1", "role": "athlete", "weeklyMileage": 30 }),
        );

        let user = client.users().get_user("u1").await.unwrap();

        assert_eq!(user.role, Some(Role::Athlete));
        assert_eq!(user.weekly_mileage, Some(30.0));
        let req = client.http().last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let client = test_client();
        client.http().mock_response(
            &url("/UserDirectory/getUser?userId=ghost"),
            200,
            json!({ "error": "User not found" }),
        );

        let res = client.users().get_user("ghost").await;
        assert_eq!(res, Err(ApiError::backend("User not found")));
    }
}
