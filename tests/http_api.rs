use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobscroll::{
    domain::{
        cursor::Cursor,
        error::ApiError,
        job::{JobId, JobListing, JobStatus, MatchResult},
        page::{Page, PageRequest},
        upload::ResumeFile,
    },
    infrastructure::{
        api::{MatchJobs, PageSource, SavedJobsApi},
        config::ApiConfig,
        http::HttpApi,
    },
};

fn api(server: &MockServer, domain: Option<&str>) -> HttpApi {
    HttpApi::new(&ApiConfig {
        base_url: server.uri(),
        request_timeout_ms: 2_000,
        domain: domain.map(str::to_string),
    })
    .unwrap()
}

fn job_json(id: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Backend Engineer",
        "company_name": "Acme",
        "remote": "remote",
        "years_experience_min": 2,
        "years_experience_max": 5,
        "salary_min": 90000,
        "salary_max": null,
        "created_at": created_at
    })
}

#[tokio::test]
async fn test_jobs_page_sends_cursor_query_and_domain() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .and(query_param("cursor", "2024-06-01T12:00:00Z,job-49"))
        .and(query_param("limit", "50"))
        .and(query_param("dir", "next"))
        .and(query_param("domain", "engineering"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [job_json("job-50", "2024-06-01T11:10:00Z")],
            "next_cursor": "2024-06-01T11:10:00Z,job-50",
            "prev_cursor": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = PageRequest::next(Cursor::new("2024-06-01T12:00:00Z,job-49"), 50);
    let page: Page<JobListing> = api(&server, Some("engineering"))
        .fetch_page(&request)
        .await?;

    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].id, "job-50");
    assert_eq!(
        page.next_cursor,
        Some(Cursor::new("2024-06-01T11:10:00Z,job-50"))
    );
    assert_eq!(page.total_count, None);
    Ok(())
}

#[tokio::test]
async fn test_match_results_page_carries_total() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/match/results"))
        .and(query_param("limit", "50"))
        .and(query_param("dir", "next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_matches": 120,
            "matches": [{
                "job": {"id": "job-3", "title": "SRE", "company_name": "Initech",
                        "salary_min": null, "salary_max": null},
                "score": 0.91
            }],
            "next_cursor": "50",
            "prev_cursor": null
        })))
        .mount(&server)
        .await;

    let page: Page<MatchResult> = api(&server, None)
        .fetch_page(&PageRequest::first(50))
        .await?;
    assert_eq!(page.total_count, Some(120));
    assert_eq!(page.items[0].job.id, "job-3");
    assert_eq!(page.next_cursor, Some(Cursor::from_offset(50)));
    Ok(())
}

#[tokio::test]
async fn test_missing_match_results_are_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/match/results"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "No match results found"})),
        )
        .mount(&server)
        .await;

    let result: Result<Page<MatchResult>, ApiError> = api(&server, None)
        .fetch_page(&PageRequest::first(50))
        .await;
    assert_eq!(
        result.unwrap_err(),
        ApiError::NotFound("No match results found".into())
    );
}

#[tokio::test]
async fn test_validation_detail_becomes_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["query", "cursor"], "msg": "Invalid cursor", "type": "value_error"}]
        })))
        .mount(&server)
        .await;

    let result: Result<Page<JobListing>, ApiError> = api(&server, None)
        .fetch_page(&PageRequest::first(50))
        .await;
    let error = result.unwrap_err();
    assert_eq!(
        error,
        ApiError::Status {
            status: 422,
            message: "Invalid cursor".into()
        }
    );
    assert_eq!(error.user_message("Failed to load jobs."), "Invalid cursor");
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result: Result<Page<JobListing>, ApiError> = api(&server, None)
        .fetch_page(&PageRequest::first(50))
        .await;
    assert!(matches!(result, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_upload_posts_multipart_file() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/match/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"resume.pdf\""))
        .and(body_string_contains("%PDF-1.4 resume"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"job_id": "match-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = ResumeFile::new("resume.pdf", b"%PDF-1.4 resume".to_vec());
    let accepted = api(&server, None).upload_resume(&file).await?;
    assert_eq!(accepted.job_id, JobId::new("match-1"));
    Ok(())
}

#[tokio::test]
async fn test_upload_error_uses_plain_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/match/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({"error": "File too large"})))
        .mount(&server)
        .await;

    let file = ResumeFile::new("resume.pdf", b"%PDF".to_vec());
    let error = api(&server, None).upload_resume(&file).await.unwrap_err();
    assert_eq!(
        error,
        ApiError::Status {
            status: 413,
            message: "File too large".into()
        }
    );
}

#[tokio::test]
async fn test_job_status_encodes_the_id() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/match/status/a%20b%2Fc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "a b/c",
            "status": "failed",
            "error": "Resume could not be parsed"
        })))
        .mount(&server)
        .await;

    let status = api(&server, None).job_status(&JobId::new("a b/c")).await?;
    assert_eq!(status.status, JobStatus::Failed);
    assert_eq!(status.error.as_deref(), Some("Resume could not be parsed"));
    Ok(())
}

#[tokio::test]
async fn test_saved_jobs_round_trip() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/saved-jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [job_json("job-7", "2024-06-01T10:00:00Z")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/saved-jobs"))
        .and(body_json(json!({"job_id": "job-7"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/saved-jobs/job-7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, None);
    api.save_job("job-7").await?;
    let saved = api.list_saved().await?;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, "job-7");
    api.unsave_job("job-7").await?;
    Ok(())
}

#[tokio::test]
async fn test_unsave_failure_falls_back_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/saved-jobs/job-9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let error = api(&server, None).unsave_job("job-9").await.unwrap_err();
    assert_eq!(
        error,
        ApiError::Status {
            status: 500,
            message: "Failed to remove".into()
        }
    );
}
