//! Classification of endpoint responses that were refused for lack of authorization.
//!
//! The API answers 400 or 401 when a token is missing, expired, or does not
//! grant access, usually with a JSON body carrying `apiResponseMessage`.

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use super::ApiError;

/// Shown when a denial carries no readable message
pub const GENERIC_DENIAL_MESSAGE: &str = "Unable to complete request";

#[derive(Debug, Deserialize)]
struct DenialBody {
    #[serde(rename = "apiResponseMessage")]
    api_response_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Denied { status: u16, message: String },
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized)
    }
}

fn is_denial(status: StatusCode) -> bool {
    status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED
}

/// Classify a response by status and body.
pub fn classify_authorization(status: StatusCode, body: &str) -> Authorization {
    if !is_denial(status) {
        return Authorization::Authorized;
    }

    let message = match serde_json::from_str::<DenialBody>(body) {
        Ok(parsed) => parsed.api_response_message,
        Err(e) => {
            debug!(
                error = %e,
                body = %ApiError::truncate_body(body),
                "Denial body has no apiResponseMessage"
            );
            GENERIC_DENIAL_MESSAGE.to_string()
        }
    };

    error!(status = status.as_u16(), message = %message, "Request not authorized");
    Authorization::Denied {
        status: status.as_u16(),
        message,
    }
}

/// `true` means proceed, `false` means the caller should abort.
pub fn is_authorized(status: StatusCode, body: &str) -> bool {
    classify_authorization(status, body).is_authorized()
}

/// Pass an authorized response through untouched; turn a denial into an error.
/// The body is only read when the status is a denial.
pub async fn check_authorization(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if !is_denial(status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match classify_authorization(status, &body) {
        Authorization::Authorized => Err(ApiError::InvalidResponse(format!("Status {}", status))),
        Authorization::Denied { status, message } => {
            Err(ApiError::AuthorizationFailed { status, message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unauthorized_with_message() {
        let result = classify_authorization(
            StatusCode::UNAUTHORIZED,
            r#"{"apiResponseMessage": "bad creds"}"#,
        );
        assert_eq!(
            result,
            Authorization::Denied {
                status: 401,
                message: "bad creds".to_string()
            }
        );
        assert!(!result.is_authorized());
    }

    #[test]
    fn test_bad_request_without_json_falls_back() {
        let result = classify_authorization(StatusCode::BAD_REQUEST, "<html>nope</html>");
        assert_eq!(
            result,
            Authorization::Denied {
                status: 400,
                message: GENERIC_DENIAL_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn test_denial_json_missing_field_falls_back() {
        let result = classify_authorization(StatusCode::UNAUTHORIZED, r#"{"error": "x"}"#);
        assert_eq!(
            result,
            Authorization::Denied {
                status: 401,
                message: GENERIC_DENIAL_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn test_ok_is_authorized_regardless_of_body() {
        assert!(is_authorized(StatusCode::OK, r#"{"apiResponseMessage": "bad creds"}"#));
        assert!(is_authorized(StatusCode::OK, ""));
    }

    #[test]
    fn test_other_errors_are_not_denials() {
        assert!(is_authorized(StatusCode::FORBIDDEN, ""));
        assert!(is_authorized(StatusCode::INTERNAL_SERVER_ERROR, ""));
    }

    #[tokio::test]
    async fn test_check_authorization_on_live_response() {
        let mut server = mockito::Server::new_async().await;
        let denied = server
            .mock("GET", "/sites")
            .with_status(401)
            .with_body(r#"{"apiResponseMessage": "bad creds"}"#)
            .create_async()
            .await;

        let response = reqwest::get(format!("{}/sites", server.url())).await.unwrap();
        let err = check_authorization(response).await.unwrap_err();
        match err {
            ApiError::AuthorizationFailed { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad creds");
            }
            other => panic!("unexpected error: {other}"),
        }
        denied.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_authorization_passes_success_through() {
        let mut server = mockito::Server::new_async().await;
        let _sites = server
            .mock("GET", "/sites")
            .with_status(200)
            .with_body(r#"{"sites": []}"#)
            .create_async()
            .await;

        let response = reqwest::get(format!("{}/sites", server.url())).await.unwrap();
        let response = check_authorization(response).await.unwrap();
        assert_eq!(response.text().await.unwrap(), r#"{"sites": []}"#);
    }
}
