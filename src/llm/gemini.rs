use crate::config::{ConfigError, Settings};
use crate::llm::auth::ServiceAccountAuthenticator;
use crate::llm::client::{Generation, GenerativeClient, LLMError};
use crate::llm::credentials::Credentials;
use crate::llm::pricing::{CostCalculator, PricingTable, UsageReport, estimate_tokens};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GLOBAL_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Location value that routes a service account to the global host
pub const GLOBAL_LOCATION: &str = "global";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    // Absent on non-text parts
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
    #[serde(default)]
    thoughts_token_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GenerateContentResponse {
    /// Text parts of every candidate, in order, without separators
    fn text(&self) -> String {
        self.candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .map(|p| p.text.as_str())
            .collect()
    }
}

/// Base URLs of the generation endpoints
///
/// Overridable so tests can point both hosts at a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    global_base: String,
    regional_base: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            global_base: GLOBAL_BASE_URL.to_string(),
            regional_base: None,
        }
    }
}

impl Endpoints {
    pub fn new(global_base: impl Into<String>, regional_base: Option<String>) -> Self {
        Self {
            global_base: global_base.into(),
            regional_base,
        }
    }

    /// `generateContent` on the global hosted endpoint
    pub fn global(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.global_base.trim_end_matches('/'),
            model
        )
    }

    /// `generateContent` on the region-qualified endpoint
    pub fn regional(&self, project: &str, location: &str, model: &str) -> String {
        let base = match &self.regional_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", location),
        };
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base, project, location, model
        )
    }
}

/// How the generation request proves who it is
#[derive(Debug, Clone, PartialEq)]
enum RequestAuth {
    QueryKey(String),
    Bearer(String),
}

/// Client for the Gemini `generateContent` API
pub struct GeminiClient {
    model: String,
    credentials: Option<Credentials>,
    timeout_seconds: u64,
    endpoints: Endpoints,
    pricing: PricingTable,
    http_client: Client,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, LLMError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            model: settings.model.clone(),
            credentials: Credentials::from_settings(settings),
            timeout_seconds: settings.timeout_seconds,
            endpoints: Endpoints::default(),
            pricing: PricingTable::default(),
            http_client,
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Pick the URL and authenticate, minting a bearer token for service accounts
    async fn resolve_target(&self, credentials: &Credentials) -> Result<(String, RequestAuth), LLMError> {
        match credentials {
            Credentials::StaticKey(key) => {
                tracing::debug!("using Google AI Studio endpoint");
                Ok((
                    self.endpoints.global(&self.model),
                    RequestAuth::QueryKey(key.clone()),
                ))
            }
            Credentials::ServiceAccount {
                credentials_json,
                project,
                location,
            } => {
                let authenticator = ServiceAccountAuthenticator::from_json(credentials_json)?;
                let token = authenticator.access_token(&self.http_client).await?;

                let url = if location == GLOBAL_LOCATION {
                    tracing::debug!(project = %project, "using Vertex AI global endpoint");
                    self.endpoints.global(&self.model)
                } else {
                    tracing::debug!(
                        project = %project,
                        location = %location,
                        "using Vertex AI regional endpoint"
                    );
                    self.endpoints.regional(project, location, &self.model)
                };

                Ok((url, RequestAuth::Bearer(token)))
            }
        }
    }

    fn usage_from(
        &self,
        response: &GenerateContentResponse,
        text: &str,
        estimated_input: u64,
    ) -> UsageReport {
        let calculator = CostCalculator::new(&self.pricing, &self.model);

        let report = match &response.usage_metadata {
            Some(usage) => {
                tracing::debug!(
                    prompt = usage.prompt_token_count,
                    candidates = usage.candidates_token_count,
                    thoughts = usage.thoughts_token_count,
                    total = usage.total_token_count,
                    "usage reported by API"
                );
                calculator.calculate(
                    usage.prompt_token_count,
                    usage.candidates_token_count,
                    usage.thoughts_token_count,
                )
            }
            None => {
                tracing::debug!("response has no usage metadata, using local estimates");
                calculator.calculate(estimated_input, estimate_tokens(text), 0)
            }
        };

        report.with_estimated_input(estimated_input)
    }

    fn transport_error(&self, error: reqwest::Error) -> LLMError {
        if error.is_timeout() {
            LLMError::Timeout(self.timeout_seconds)
        } else {
            LLMError::NetworkError(error)
        }
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, LLMError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(LLMError::Config(ConfigError::NoCredentials))?;

        let estimated_input = estimate_tokens(prompt);
        tracing::debug!(estimated_input, "estimated input tokens");

        let (url, auth) = self.resolve_target(credentials).await?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        // The key travels as a query parameter, so the logged URL never contains it
        tracing::debug!(
            url = %url,
            prompt_bytes = prompt.len(),
            timeout_seconds = self.timeout_seconds,
            "sending generateContent request"
        );

        let request = self.http_client.post(&url).json(&body);
        let request = match &auth {
            RequestAuth::QueryKey(key) => request.query(&[("key", key.as_str())]),
            RequestAuth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::debug!(status = status.as_u16(), body_bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(LLMError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        if let Some(error) = &parsed.error {
            tracing::debug!(code = error.code, status = %error.status, "API error object in response");
            return Err(LLMError::ApiError(error.message.clone()));
        }

        let text = parsed.text();
        let usage = self.usage_from(&parsed, &text, estimated_input);

        Ok(Generation { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_endpoint() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.global("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_regional_endpoint() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.regional("my-proj", "us-central1", "gemini-2.5-pro"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/my-proj/locations/us-central1/publishers/google/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_endpoint_overrides() {
        let endpoints = Endpoints::new("http://127.0.0.1:1234/", Some("http://127.0.0.1:5678".to_string()));
        assert_eq!(
            endpoints.global("m"),
            "http://127.0.0.1:1234/v1beta/models/m:generateContent"
        );
        assert_eq!(
            endpoints.regional("p", "europe-west4", "m"),
            "http://127.0.0.1:5678/v1/projects/p/locations/europe-west4/publishers/google/models/m:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_response_text_concatenates_candidates() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "Hello, "}, {"functionCall": {}}, {"text": "world"}]}},
                    {"content": {"parts": [{"text": "!"}]}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), "Hello, world!");
        assert!(response.usage_metadata.is_none());
    }

    #[test]
    fn test_response_usage_metadata() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [],
                "usageMetadata": {"promptTokenCount": 100, "candidatesTokenCount": 20, "totalTokenCount": 120}
            }"#,
        )
        .unwrap();
        let usage = response.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 100);
        assert_eq!(usage.candidates_token_count, 20);
        assert_eq!(usage.thoughts_token_count, 0);
    }

    #[test]
    fn test_response_error_object() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#,
        )
        .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, 400);
        assert_eq!(error.message, "API key not valid");
    }

    #[test]
    fn test_usage_falls_back_to_estimates() {
        let settings = Settings {
            model: "gemini-2.5-flash".to_string(),
            api_key: "key".to_string(),
            ..Settings::default()
        };
        let client = GeminiClient::from_settings(&settings).unwrap();
        let response = GenerateContentResponse::default();

        let usage = client.usage_from(&response, "abcdefghi", 40);
        assert_eq!(usage.input_tokens, 40);
        assert_eq!(usage.output_tokens, 3);
        assert_eq!(usage.thinking_tokens, 0);
        assert_eq!(usage.estimated_input_tokens, 40);
    }

    #[tokio::test]
    async fn test_no_credentials_fails_before_network() {
        // Any request to this endpoint would surface as a network error instead
        let client = GeminiClient::from_settings(&Settings::default())
            .unwrap()
            .with_endpoints(Endpoints::new("http://127.0.0.1:9", None));

        let result = client.generate("hi").await;
        assert!(matches!(
            result,
            Err(LLMError::Config(ConfigError::NoCredentials))
        ));
    }
}
