use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http_client::{HttpClientTrait, RawResponse};
use crate::domain::{DomainError, GenerationProvider, GenerationRequest, TaskState};

pub const DEFAULT_KIE_BASE_URL: &str = "https://api.kie.ai";
pub const DEFAULT_IMAGE_SIZE: &str = "2:3";

const PROVIDER_NAME: &str = "kie";
const PAYLOAD_TOO_LARGE_MARKER: &str = "Request Entity Too Large";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str =
    "Image too large. Please upload a smaller photo (max ~4MB).";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from AI provider";

#[derive(Debug, Deserialize)]
struct KieEnvelope<T> {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitData {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordInfo {
    success_flag: Option<i64>,
    response: Option<RecordResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordResult {
    result_urls: Option<Vec<String>>,
}

/// KIE gpt4o-image provider
#[derive(Debug)]
pub struct KieImageProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    image_size: String,
}

impl<C: HttpClientTrait> KieImageProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_KIE_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }

    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        self.image_size = size.into();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/v1/gpt4o-image/generate", self.base_url)
    }

    fn record_info_url(&self, task_id: &str) -> Result<String, DomainError> {
        let base = format!("{}/api/v1/gpt4o-image/record-info", self.base_url);

        reqwest::Url::parse_with_params(&base, &[("taskId", task_id)])
            .map(|url| url.to_string())
            .map_err(|e| DomainError::configuration(format!("Invalid provider URL: {}", e)))
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &GenerationRequest) -> serde_json::Value {
        serde_json::json!({
            "filesUrl": request.input_images(),
            "prompt": request.prompt,
            "size": self.image_size,
            "nVariants": request.num_images,
        })
    }

    /// Decodes a provider envelope, mapping HTTP and provider-level failures to errors
    fn decode<T>(&self, raw: RawResponse) -> Result<Option<T>, DomainError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let envelope: KieEnvelope<T> = match serde_json::from_str(&raw.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                if raw.status == 413 || raw.body.contains(PAYLOAD_TOO_LARGE_MARKER) {
                    return Err(DomainError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE));
                }

                warn!(
                    status = raw.status,
                    error = %e,
                    "Provider returned a non-JSON response"
                );
                return Err(DomainError::provider(PROVIDER_NAME, INVALID_RESPONSE_MESSAGE));
            }
        };

        let provider_ok = envelope.code.map(|code| code == 200).unwrap_or(true);

        if !raw.is_success() || !provider_ok {
            let message = envelope
                .msg
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Provider request failed with HTTP {}", raw.status));

            return Err(DomainError::provider(PROVIDER_NAME, message));
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl<C: HttpClientTrait + 'static> GenerationProvider for KieImageProvider<C> {
    async fn submit(&self, request: &GenerationRequest) -> Result<String, DomainError> {
        let body = self.build_request(request);
        let raw = self
            .client
            .post_json(&self.generate_url(), self.headers(), &body)
            .await?;

        let data: Option<SubmitData> = self.decode(raw)?;

        let task_id = data
            .and_then(|d| d.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DomainError::provider(PROVIDER_NAME, "Provider did not return a task id"))?;

        debug!(task_id = %task_id, "Generation task submitted");

        Ok(task_id)
    }

    async fn poll(&self, task_id: &str) -> Result<TaskState, DomainError> {
        let url = self.record_info_url(task_id)?;
        let raw = self.client.get(&url, self.headers()).await?;

        let Some(info) = self.decode::<RecordInfo>(raw)? else {
            return Ok(TaskState::Pending);
        };

        let result_url = info
            .response
            .and_then(|r| r.result_urls)
            .and_then(|urls| urls.into_iter().next());

        Ok(TaskState::from_success_flag(
            info.success_flag,
            result_url,
            info.error_message,
        ))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::provider::http_client::mock::MockHttpClient;
    use crate::infrastructure::provider::HttpClient;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASE: &str = "http://kie.test";

    fn request() -> GenerationRequest {
        GenerationRequest::new("https://img/subject.png", "https://img/garment.png", "wear it")
    }

    fn provider(client: MockHttpClient) -> KieImageProvider<MockHttpClient> {
        KieImageProvider::with_base_url(client, "test-key", BASE)
    }

    #[tokio::test]
    async fn test_submit_returns_task_id() {
        let client = MockHttpClient::new().with_response(
            format!("{BASE}/api/v1/gpt4o-image/generate"),
            RawResponse::new(200, r#"{"code":200,"msg":"success","data":{"taskId":"task-1"}}"#),
        );

        let task_id = provider(client).submit(&request()).await.unwrap();
        assert_eq!(task_id, "task-1");
    }

    #[tokio::test]
    async fn test_submit_surfaces_provider_message() {
        let client = MockHttpClient::new().with_response(
            format!("{BASE}/api/v1/gpt4o-image/generate"),
            RawResponse::new(500, r#"{"code":500,"msg":"internal"}"#),
        );

        let err = provider(client).submit(&request()).await.unwrap_err();
        assert!(matches!(err, DomainError::Provider { .. }));
        assert_eq!(err.public_message(), "internal");
    }

    #[tokio::test]
    async fn test_submit_provider_code_error_with_http_200() {
        let client = MockHttpClient::new().with_response(
            format!("{BASE}/api/v1/gpt4o-image/generate"),
            RawResponse::new(200, r#"{"code":402,"msg":"Insufficient balance"}"#),
        );

        let err = provider(client).submit(&request()).await.unwrap_err();
        assert_eq!(err.public_message(), "Insufficient balance");
    }

    #[tokio::test]
    async fn test_submit_oversized_payload_page() {
        let client = MockHttpClient::new().with_response(
            format!("{BASE}/api/v1/gpt4o-image/generate"),
            RawResponse::new(413, "<html><h1>413 Request Entity Too Large</h1></html>"),
        );

        let err = provider(client).submit(&request()).await.unwrap_err();
        assert!(matches!(err, DomainError::PayloadTooLarge { .. }));
        assert_eq!(err.to_string(), PAYLOAD_TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_other_non_json() {
        let client = MockHttpClient::new().with_response(
            format!("{BASE}/api/v1/gpt4o-image/generate"),
            RawResponse::new(502, "Bad Gateway"),
        );

        let err = provider(client).submit(&request()).await.unwrap_err();
        assert_eq!(err.public_message(), INVALID_RESPONSE_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_without_task_id() {
        let client = MockHttpClient::new().with_response(
            format!("{BASE}/api/v1/gpt4o-image/generate"),
            RawResponse::new(200, r#"{"code":200,"data":{}}"#),
        );

        assert!(provider(client).submit(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_poll_states() {
        let url = format!("{BASE}/api/v1/gpt4o-image/record-info?taskId=task-1");
        let client = MockHttpClient::new()
            .with_response(&url, RawResponse::new(200, r#"{"code":200,"data":{"successFlag":0}}"#))
            .with_response(
                &url,
                RawResponse::new(
                    200,
                    r#"{"code":200,"data":{"successFlag":1,"response":{"resultUrls":["https://cdn/out.png"]}}}"#,
                ),
            );
        let provider = provider(client);

        assert_eq!(provider.poll("task-1").await.unwrap(), TaskState::Pending);
        assert_eq!(
            provider.poll("task-1").await.unwrap(),
            TaskState::Succeeded {
                result_url: "https://cdn/out.png".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_poll_failed_flag() {
        let url = format!("{BASE}/api/v1/gpt4o-image/record-info?taskId=task-2");
        let client = MockHttpClient::new().with_response(
            url,
            RawResponse::new(
                200,
                r#"{"code":200,"data":{"successFlag":2,"errorMessage":"content policy"}}"#,
            ),
        );

        assert_eq!(
            provider(client).poll("task-2").await.unwrap(),
            TaskState::Failed {
                message: "content policy".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_round_trip_against_http_server() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/gpt4o-image/generate"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({
                "filesUrl": ["https://img/subject.png", "https://img/garment.png"],
                "nVariants": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "msg": "success",
                "data": { "taskId": "remote-1" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/gpt4o-image/record-info"))
            .and(query_param("taskId", "remote-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": {
                    "successFlag": 1,
                    "response": { "resultUrls": ["https://cdn/remote.png"] }
                }
            })))
            .mount(&server)
            .await;

        let provider = KieImageProvider::with_base_url(HttpClient::new(), "secret", server.uri());

        let task_id = provider.submit(&request()).await.unwrap();
        assert_eq!(task_id, "remote-1");

        let state = provider.poll(&task_id).await.unwrap();
        assert_eq!(
            state,
            TaskState::Succeeded {
                result_url: "https://cdn/remote.png".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_http_413_from_server() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/gpt4o-image/generate"))
            .respond_with(
                ResponseTemplate::new(413).set_body_string("<html>Request Entity Too Large</html>"),
            )
            .mount(&server)
            .await;

        let provider = KieImageProvider::with_base_url(HttpClient::new(), "secret", server.uri());
        let err = provider.submit(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::PayloadTooLarge { .. }));
    }
}
