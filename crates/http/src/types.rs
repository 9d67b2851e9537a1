//! Wire types for the SmartMix backend

use crate::client::error::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use smartmix_core::Profile;

/// Standard backend response wrapper: `{ code, message, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Codes the backend uses for success
    pub fn is_success(&self) -> bool {
        self.code == 0 || (200..300).contains(&self.code)
    }

    /// Unwrap the payload, turning a failure code into [`ClientError::Api`]
    pub fn into_data(self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::Api {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        self.data.ok_or_else(|| ClientError::Api {
            code: self.code,
            message: "response carried no data".to_string(),
        })
    }
}

/// Credentials for `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Always `Bearer` for this backend
    #[serde(default)]
    pub token_type: Option<String>,
    pub username: String,
    #[serde(default)]
    pub real_name: Option<String>,
    pub role: String,
}

impl LoginResponse {
    /// Profile record kept in the session after login
    pub fn profile(&self) -> Profile {
        let mut profile = Profile::new();
        profile.insert("username".into(), JsonValue::from(self.username.clone()));
        profile.insert(
            "realName".into(),
            self.real_name.clone().map_or(JsonValue::Null, JsonValue::from),
        );
        profile.insert("role".into(), JsonValue::from(self.role.clone()));
        profile
    }
}

/// Account creation request for `POST /api/auth/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Current user as reported by `GET /api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: String,
}

impl UserInfo {
    /// Profile record kept in the session
    pub fn profile(&self) -> Profile {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            _ => Profile::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let envelope: ApiEnvelope<String> =
            serde_json::from_value(json!({"code": 200, "message": "ok", "data": "注册成功"}))
                .unwrap();
        assert_eq!(envelope.into_data().unwrap(), "注册成功");
    }

    #[test]
    fn test_envelope_failure_code() {
        let envelope: ApiEnvelope<String> =
            serde_json::from_value(json!({"code": 400, "message": "用户名已存在", "data": null}))
                .unwrap();
        match envelope.into_data() {
            Err(ClientError::Api { code, message }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "用户名已存在");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_missing_data() {
        let envelope: ApiEnvelope<UserInfo> =
            serde_json::from_value(json!({"code": 200})).unwrap();
        assert!(matches!(envelope.into_data(), Err(ClientError::Api { .. })));
    }

    #[test]
    fn test_login_response_profile() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "abc123",
            "tokenType": "Bearer",
            "username": "admin",
            "realName": "系统管理员",
            "role": "ADMIN"
        }))
        .unwrap();

        let profile = response.profile();
        assert_eq!(profile["username"], json!("admin"));
        assert_eq!(profile["realName"], json!("系统管理员"));
        assert_eq!(profile["role"], json!("ADMIN"));
    }

    #[test]
    fn test_register_request_omits_empty_fields() {
        let request = RegisterRequest {
            username: "mixer".to_string(),
            password: "secret".to_string(),
            real_name: Some("Mixer One".to_string()),
            ..RegisterRequest::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"username": "mixer", "password": "secret", "realName": "Mixer One"})
        );
    }

    #[test]
    fn test_user_info_profile_uses_camel_case() {
        let info = UserInfo {
            username: "admin".to_string(),
            real_name: Some("Admin".to_string()),
            email: None,
            phone: None,
            role: "ADMIN".to_string(),
        };
        let profile = info.profile();
        assert_eq!(profile["realName"], json!("Admin"));
        assert_eq!(profile["email"], JsonValue::Null);
    }
}
