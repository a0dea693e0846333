//! Login and refresh endpoint calls
//!
//! Both POST a JSON body and expect `{ token, refreshToken }` back. They go
//! through the request transforms but never through the refresh strategy:
//! a rejected login or refresh is reported as-is.

use serde::Deserialize;
use tracing::debug;

use crate::constants::{LOGIN_PATH, REFRESH_PATH};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use transport::Request;

/// Success body of both auth endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    refresh_token: String,
}

impl From<TokenResponse> for Credentials {
    fn from(response: TokenResponse) -> Self {
        Credentials::new(response.token, response.refresh_token)
    }
}

/// Exchange a login/password pair for a token pair.
pub(crate) async fn login(pipeline: &Pipeline, login: &str, password: &str) -> Result<Credentials> {
    let request = Request::post(LOGIN_PATH).with_json(serde_json::json!({
        "login": login,
        "password": password,
    }));
    debug!(login, "sending login request");
    exchange(pipeline, &request).await
}

/// Exchange a refresh token for a new token pair.
pub(crate) async fn refresh(pipeline: &Pipeline, refresh_token: &str) -> Result<Credentials> {
    let request = Request::post(REFRESH_PATH).with_json(serde_json::json!({
        "refreshToken": refresh_token,
    }));
    debug!("sending refresh request");
    exchange(pipeline, &request).await
}

async fn exchange(pipeline: &Pipeline, request: &Request) -> Result<Credentials> {
    let response = pipeline.dispatch(request).await?;
    let tokens: TokenResponse = response.json().map_err(|e| {
        Error::Decode(format!("invalid token response from {}: {e}", request.path()))
    })?;
    Ok(tokens.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTransport, json_response};
    use reqwest::StatusCode;
    use std::sync::Arc;

    #[test]
    fn token_response_uses_camel_case_fields() {
        let json = r#"{"token":"TOKEN","refreshToken":"REFRESH_TOKEN"}"#;
        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        let creds = Credentials::from(tokens);
        assert_eq!(creds.access_token(), "TOKEN");
        assert_eq!(creds.refresh_token(), "REFRESH_TOKEN");
    }

    #[tokio::test]
    async fn login_posts_credentials_to_login_endpoint() {
        let transport = MockTransport::new(|_request| async {
            Ok(json_response(200, serde_json::json!({"token": "TOKEN", "refreshToken": "REFRESH_TOKEN"})))
        });
        let pipeline = Pipeline::new(Vec::new(), transport.clone());

        let creds = login(&pipeline, "foo", "foo").await.unwrap();
        assert_eq!(creds.access_token(), "TOKEN");

        let history = transport.history();
        assert_eq!(history.len(), 1);
        assert_eq!(*history[0].method(), reqwest::Method::POST);
        assert_eq!(history[0].path(), LOGIN_PATH);
        assert_eq!(
            history[0].body().unwrap(),
            &serde_json::json!({"login": "foo", "password": "foo"})
        );
    }

    #[tokio::test]
    async fn refresh_posts_refresh_token() {
        let transport = MockTransport::new(|_request| async {
            Ok(json_response(200, serde_json::json!({"token": "TOKEN2", "refreshToken": "REFRESH_TOKEN2"})))
        });
        let pipeline = Pipeline::new(Vec::new(), transport.clone());

        let creds = refresh(&pipeline, "REFRESH_TOKEN").await.unwrap();
        assert_eq!(creds.access_token(), "TOKEN2");
        assert_eq!(creds.refresh_token(), "REFRESH_TOKEN2");

        let history = transport.history();
        assert_eq!(history[0].path(), REFRESH_PATH);
        assert_eq!(
            history[0].body().unwrap(),
            &serde_json::json!({"refreshToken": "REFRESH_TOKEN"})
        );
    }

    #[tokio::test]
    async fn rejected_refresh_is_status_error() {
        let transport: Arc<MockTransport> =
            MockTransport::new(|_request| async { Ok(json_response(401, serde_json::json!({}))) });
        let pipeline = Pipeline::new(Vec::new(), transport);

        let err = refresh(&pipeline, "expired").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn malformed_token_body_is_decode_error() {
        let transport = MockTransport::new(|_request| async {
            Ok(json_response(200, serde_json::json!({"access_token": "wrong shape"})))
        });
        let pipeline = Pipeline::new(Vec::new(), transport);

        let err = login(&pipeline, "foo", "foo").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "got: {err:?}");
    }
}
