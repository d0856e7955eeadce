use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EduTrackConfig;
use crate::errors::{ApiError, ApiResult};
use crate::request::RequestDescriptor;
use crate::session::{self, FileSessionProvider, SessionProviderRef};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, TransportRef};

/// Client for the EDU Track REST API
///
/// Every call re-reads the session, attaches the bearer token and classifies
/// the response. The client holds no per-call state, so a refreshed session is
/// picked up on the next request and clones can be used concurrently.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    session: SessionProviderRef,
    transport: TransportRef,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: SessionProviderRef,
        transport: TransportRef,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            session,
            transport,
        }
    }

    /// Create a client that talks HTTP and keeps its session in the configured file
    pub fn from_config(config: &EduTrackConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        let session = FileSessionProvider::new(config.session_path()?);
        Ok(Self::new(
            config.base_url(),
            Arc::new(session),
            Arc::new(transport),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionProviderRef {
        &self.session
    }

    /// Resolve the bearer token from the current session
    pub async fn get_token(&self) -> ApiResult<String> {
        session::resolve_token(self.session.as_ref()).await
    }

    /// Send `descriptor` with the session's bearer token and classify the result.
    ///
    /// No network call is made when the session has no usable token.
    #[instrument(
        skip(self, descriptor),
        fields(
            method = %descriptor.method,
            path = %descriptor.path,
            request_id = %Uuid::new_v4(),
        )
    )]
    pub async fn request(&self, descriptor: &RequestDescriptor) -> ApiResult<Value> {
        let token = match self.get_token().await {
            Ok(token) => token,
            Err(e) => {
                debug!("Not sending request: {}", e);
                return Err(e);
            }
        };

        let request = self.build_request(descriptor, &token)?;
        debug!("Sending request to {}", request.url);

        let response = self.transport.send(request).await.map_err(|e| {
            warn!("Transport failure: {}", e);
            ApiError::NetworkError(e.to_string())
        })?;

        classify(response)
    }

    /// Like [`ApiClient::request`], but gives up as soon as `cancel` fires.
    ///
    /// The in-flight call is dropped and `Cancelled` is returned.
    pub async fn request_cancellable(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ApiResult<Value> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Request to {} cancelled", descriptor.path);
                Err(ApiError::Cancelled)
            }
            result = self.request(descriptor) => result,
        }
    }

    /// Send `descriptor` and decode the payload into `T`
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> ApiResult<T> {
        decode(self.request(descriptor).await?)
    }

    pub async fn request_as_cancellable<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ApiResult<T> {
        decode(self.request_cancellable(descriptor, cancel).await?)
    }

    /// Forget the stored session
    pub async fn logout(&self) -> ApiResult<()> {
        self.session.clear().await?;
        info!("Session cleared");
        Ok(())
    }

    fn build_request(&self, descriptor: &RequestDescriptor, token: &str) -> ApiResult<HttpRequest> {
        let url = descriptor.url(&self.base_url)?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ApiError::InvalidRequest("access token contains invalid header characters".to_string())
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let body = match &descriptor.body {
            Some(body) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(body).map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to serialize request body: {}", e))
                })?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body,
        })
    }
}

/// Map a raw response onto the client's result taxonomy
fn classify(response: HttpResponse) -> ApiResult<Value> {
    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&response.body).map_err(|e| {
            ApiError::MalformedResponse(format!("response body is not valid JSON: {}", e))
        });
    }

    if response.status == 401 {
        warn!("Server rejected the session token");
        return Err(ApiError::Unauthorized);
    }

    debug!("Request failed with HTTP {}", response.status);
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body,
    })
}

fn decode<T: DeserializeOwned>(payload: Value) -> ApiResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| ApiError::MalformedResponse(format!("unexpected response shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{InMemorySessionProvider, SessionProvider};
    use crate::transport::{RecordingTransport, TransportError};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    const BASE_URL: &str = "http://localhost:8081";
    const SESSION: &str = r#"{"accessToken":"abc123"}"#;

    fn client_with(
        session: Option<&str>,
        transport: RecordingTransport,
    ) -> (ApiClient, Arc<RecordingTransport>, Arc<InMemorySessionProvider>) {
        let provider = Arc::new(match session {
            Some(raw) => InMemorySessionProvider::with_raw(raw),
            None => InMemorySessionProvider::new(),
        });
        let transport = Arc::new(transport);
        let client = ApiClient::new(BASE_URL, provider.clone(), transport.clone());
        (client, transport, provider)
    }

    fn attendance_request() -> RequestDescriptor {
        RequestDescriptor::get("/api/attendance/section")
            .query("sectionId", "5")
            .query("courseId", "9")
    }

    #[tokio::test]
    async fn test_section_attendance_scenario() {
        let body = r#"[{"attendanceDate":"2024-01-01","present":true}]"#;
        let (client, transport, _) =
            client_with(Some(SESSION), RecordingTransport::new().respond(200, body));

        let payload = client.request(&attendance_request()).await.unwrap();
        assert_eq!(
            payload,
            json!([{"attendanceDate": "2024-01-01", "present": true}])
        );

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, reqwest::Method::GET);
        assert_eq!(
            sent[0].url.as_str(),
            "http://localhost:8081/api/attendance/section?sectionId=5&courseId=9"
        );
        assert_eq!(sent[0].headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
        assert!(sent[0].headers.get(CONTENT_TYPE).is_none());
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn test_no_session_makes_no_network_call() {
        let (client, transport, _) =
            client_with(None, RecordingTransport::new().respond(200, "[]"));

        let result = client.request(&attendance_request()).await;
        assert!(matches!(result, Err(ApiError::NoSession)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_session_without_token_makes_no_network_call() {
        let records = [
            r#"{}"#,
            r#"{"role":"admin"}"#,
            r#"{"accessToken":""}"#,
            r#"{"accessToken":null}"#,
            r#"{"accessToken":42}"#,
        ];

        for record in records {
            let (client, transport, _) =
                client_with(Some(record), RecordingTransport::new().respond(200, "[]"));

            assert!(matches!(client.get_token().await, Err(ApiError::NoToken)));
            let result = client.request(&attendance_request()).await;
            assert!(
                matches!(result, Err(ApiError::NoToken)),
                "record {} gave {:?}",
                record,
                result
            );
            assert_eq!(transport.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_401_is_unauthorized_regardless_of_body() {
        let bodies = ["\"token expired\"", "", "{\"message\":\"bad token\"}", "<html/>"];

        for body in bodies {
            let (client, _, _) =
                client_with(Some(SESSION), RecordingTransport::new().respond(401, body));
            let result = client.request(&attendance_request()).await;
            assert!(
                matches!(result, Err(ApiError::Unauthorized)),
                "body {:?} gave {:?}",
                body,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_success_statuses_return_parsed_json() {
        let payload = json!({
            "id": 3,
            "title": "Sports day",
            "tags": ["grade-10", "outdoor"],
            "nested": {"present": false, "score": 91.5}
        });
        let text = serde_json::to_string(&payload).unwrap();

        for status in [200, 201, 202, 299] {
            let (client, _, _) =
                client_with(Some(SESSION), RecordingTransport::new().respond(status, &text));
            let result = client.request(&RequestDescriptor::get("/api/x")).await.unwrap();
            assert_eq!(result, payload);
        }
    }

    #[tokio::test]
    async fn test_no_content_is_null_payload() {
        let (client, _, _) =
            client_with(Some(SESSION), RecordingTransport::new().respond(204, ""));
        let result = client
            .request(&RequestDescriptor::delete("/api/announcements/4"))
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_non_success_statuses_carry_raw_body() {
        let cases = [
            (400, "Section ID and Course ID are required."),
            (403, "{\"message\":\"forbidden\"}"),
            (404, ""),
            (500, "Internal Server Error"),
            (302, "moved"),
        ];

        for (status, body) in cases {
            let (client, _, _) =
                client_with(Some(SESSION), RecordingTransport::new().respond(status, body));
            match client.request(&attendance_request()).await {
                Err(ApiError::HttpError {
                    status: got_status,
                    body: got_body,
                }) => {
                    assert_eq!(got_status, status);
                    assert_eq!(got_body, body);
                }
                other => panic!("status {} gave {:?}", status, other),
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_json_on_success_is_malformed() {
        let (client, _, _) = client_with(
            Some(SESSION),
            RecordingTransport::new().respond(200, "<html>oops</html>"),
        );
        let result = client.request(&attendance_request()).await;
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let (client, _, _) = client_with(
            Some(SESSION),
            RecordingTransport::new().fail(TransportError::Connect("connection refused".into())),
        );
        let err = client.request(&attendance_request()).await.unwrap_err();
        assert!(err.is_network_error());
        assert_eq!(err.status(), 0);
        assert!(err.message().starts_with("network error"));
    }

    #[tokio::test]
    async fn test_json_body_sets_content_type() {
        let (client, transport, _) = client_with(
            Some(SESSION),
            RecordingTransport::new().respond(201, r#"{"id":1}"#),
        );
        let descriptor = RequestDescriptor::post("/api/announcements/9/A")
            .json(json!({"title": "Exam", "courseId": 9}));

        client.request(&descriptor).await.unwrap();

        let requests = transport.requests();
        let sent = &requests[0];
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"title": "Exam", "courseId": 9}));
    }

    #[tokio::test]
    async fn test_token_is_reread_on_every_call() {
        let (client, transport, provider) = client_with(
            Some(SESSION),
            RecordingTransport::new().respond(200, "[]").respond(200, "[]"),
        );

        client.request(&attendance_request()).await.unwrap();
        provider
            .store(r#"{"accessToken":"refreshed"}"#.to_string())
            .await
            .unwrap();
        client.request(&attendance_request()).await.unwrap();

        let tokens: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.headers[AUTHORIZATION].to_str().unwrap().to_string())
            .collect();
        assert_eq!(tokens, vec!["Bearer abc123", "Bearer refreshed"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_call() {
        let (client, transport, _) =
            client_with(Some(SESSION), RecordingTransport::new().respond(200, "[]"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.request_cancellable(&attendance_request(), &cancel).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_call() {
        let (client, transport, _) = client_with(
            Some(SESSION),
            RecordingTransport::new()
                .with_delay(Duration::from_secs(30))
                .respond(200, "[]"),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.request_cancellable(&attendance_request(), &cancel),
        )
        .await
        .expect("cancellation did not interrupt the call");

        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_uncancelled_request_completes() {
        let (client, _, _) =
            client_with(Some(SESSION), RecordingTransport::new().respond(200, "[1,2]"));
        let cancel = CancellationToken::new();
        let result = client
            .request_cancellable(&attendance_request(), &cancel)
            .await
            .unwrap();
        assert_eq!(result, json!([1, 2]));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        present: bool,
    }

    #[tokio::test]
    async fn test_request_as_decodes_payload() {
        let (client, _, _) = client_with(
            Some(SESSION),
            RecordingTransport::new().respond(200, r#"[{"present":true},{"present":false}]"#),
        );
        let rows: Vec<Row> = client.request_as(&attendance_request()).await.unwrap();
        assert_eq!(rows, vec![Row { present: true }, Row { present: false }]);
    }

    #[tokio::test]
    async fn test_request_as_shape_mismatch_is_malformed() {
        let (client, _, _) = client_with(
            Some(SESSION),
            RecordingTransport::new().respond(200, r#"{"present":"yes"}"#),
        );
        let result: ApiResult<Vec<Row>> = client.request_as(&attendance_request()).await;
        assert!(matches!(result, Err(ApiError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (client, transport, _) =
            client_with(Some(SESSION), RecordingTransport::new().respond(200, "[]"));

        client.logout().await.unwrap();

        assert!(matches!(client.get_token().await, Err(ApiError::NoSession)));
        assert!(matches!(
            client.request(&attendance_request()).await,
            Err(ApiError::NoSession)
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let (client, transport, _) = client_with(
            Some(SESSION),
            RecordingTransport::new()
                .respond(200, "[]")
                .respond(500, "boom"),
        );

        let first = client.clone();
        let second = client.clone();
        let (a, b) = tokio::join!(
            async move { first.request(&RequestDescriptor::get("/api/a")).await },
            async move { second.request(&RequestDescriptor::get("/api/b")).await },
        );

        let outcomes = [a.is_ok(), b.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(transport.call_count(), 2);
    }
}
