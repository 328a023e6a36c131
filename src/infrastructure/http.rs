use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{multipart, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    domain::{
        error::ApiError,
        job::{
            JobAccepted, JobId, JobListCursorResponse, JobListing, JobStatusResponse,
            MatchResult, MatchResultsCursorResponse, SavedJobsResponse,
        },
        page::{Page, PageRequest},
        upload::ResumeFile,
    },
    infrastructure::{
        api::{MatchJobs, PageSource, SavedJobsApi},
        config::ApiConfig,
    },
};

/// Characters left as-is in a path segment (same set as `encodeURIComponent`)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const REQUEST_FAILED: &str = "Request failed";
const UPLOAD_FAILED: &str = "Upload failed";
const REMOVE_FAILED: &str = "Failed to remove";

/// Error payload of the backend: FastAPI-style `detail` or a plain `error`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// `detail` is either a string or a validation list `[{ "msg": ... }, ...]`
pub fn message_from_detail(detail: &Value) -> Option<String> {
    match detail {
        Value::String(message) => Some(message.clone()),
        Value::Array(entries) => entries
            .first()
            .and_then(|entry| entry.get("msg"))
            .map(|msg| match msg {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            }),
        _ => None,
    }
}

fn error_message(body: &[u8], fallback: &str) -> String {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    parsed
        .detail
        .as_ref()
        .and_then(message_from_detail)
        .or(parsed.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn status_error(status: StatusCode, body: &[u8], fallback: &str) -> ApiError {
    let message = error_message(body, fallback);
    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(message)
    } else {
        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Transport(err.to_string())
}

/// Backend client over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    domain: Option<String>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            domain: config.domain.clone().filter(|domain| !domain.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body, fallback));
        }
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// For endpoints whose success body is irrelevant
    async fn send_unit(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<(), ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Err(status_error(status, &body, fallback))
    }
}

#[async_trait::async_trait]
impl PageSource<JobListing> for HttpApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<JobListing>, ApiError> {
        let mut query = request.query_pairs();
        if let Some(domain) = &self.domain {
            query.push(("domain", domain.clone()));
        }
        log::debug!("GET /api/jobs {query:?}");
        let response: JobListCursorResponse = self
            .send_json(
                self.client.get(self.url("/api/jobs")).query(&query),
                REQUEST_FAILED,
            )
            .await?;
        Ok(response.into())
    }
}

#[async_trait::async_trait]
impl PageSource<MatchResult> for HttpApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<MatchResult>, ApiError> {
        let query = request.query_pairs();
        log::debug!("GET /api/match/results {query:?}");
        let response: MatchResultsCursorResponse = self
            .send_json(
                self.client.get(self.url("/api/match/results")).query(&query),
                REQUEST_FAILED,
            )
            .await?;
        Ok(response.into())
    }
}

#[async_trait::async_trait]
impl MatchJobs for HttpApi {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<JobAccepted, ApiError> {
        log::info!("uploading {} ({} bytes)", file.name, file.size());
        let part = multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = multipart::Form::new().part("file", part);
        self.send_json(
            self.client
                .post(self.url("/api/match/upload"))
                .multipart(form),
            UPLOAD_FAILED,
        )
        .await
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ApiError> {
        let path = format!(
            "/api/match/status/{}",
            utf8_percent_encode(job_id.as_str(), PATH_SEGMENT)
        );
        self.send_json(self.client.get(self.url(&path)), REQUEST_FAILED)
            .await
    }
}

#[async_trait::async_trait]
impl SavedJobsApi for HttpApi {
    async fn list_saved(&self) -> Result<Vec<JobListing>, ApiError> {
        let response: SavedJobsResponse = self
            .send_json(self.client.get(self.url("/api/saved-jobs")), REQUEST_FAILED)
            .await?;
        Ok(response.jobs)
    }

    async fn save_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.send_unit(
            self.client
                .post(self.url("/api/saved-jobs"))
                .json(&serde_json::json!({ "job_id": job_id })),
            REQUEST_FAILED,
        )
        .await
    }

    async fn unsave_job(&self, job_id: &str) -> Result<(), ApiError> {
        let path = format!(
            "/api/saved-jobs/{}",
            utf8_percent_encode(job_id, PATH_SEGMENT)
        );
        self.send_unit(self.client.delete(self.url(&path)), REMOVE_FAILED)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!("Job not found"), Some("Job not found"))]
    #[case(json!([{ "loc": ["query", "limit"], "msg": "limit too large" }]), Some("limit too large"))]
    #[case(json!([]), None)]
    #[case(json!({ "code": 1 }), None)]
    fn test_message_from_detail(#[case] detail: Value, #[case] expected: Option<&str>) {
        assert_eq!(message_from_detail(&detail).as_deref(), expected);
    }

    #[rstest]
    #[case(br#"{"detail": "No match results"}"#.as_slice(), "No match results")]
    #[case(br#"{"error": "quota exceeded"}"#.as_slice(), "quota exceeded")]
    #[case(b"<html>bad gateway</html>".as_slice(), "Request failed")]
    #[case(b"".as_slice(), "Request failed")]
    fn test_error_message(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(error_message(body, REQUEST_FAILED), expected);
    }

    #[test]
    fn test_status_error_separates_not_found() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, br#"{"detail":"gone"}"#, REQUEST_FAILED),
            ApiError::NotFound("gone".into())
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, b"", REQUEST_FAILED),
            ApiError::Status {
                status: 502,
                message: "Request failed".into()
            }
        );
    }

    #[test]
    fn test_path_segment_encoding() {
        assert_eq!(
            utf8_percent_encode("a b/c?d", PATH_SEGMENT).to_string(),
            "a%20b%2Fc%3Fd"
        );
        assert_eq!(
            utf8_percent_encode("job-1_x.y", PATH_SEGMENT).to_string(),
            "job-1_x.y"
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let api = HttpApi::new(&ApiConfig {
            base_url: "http://localhost:8000/".into(),
            ..ApiConfig::default()
        })
        .unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/api/jobs"), "http://localhost:8000/api/jobs");
    }
}
