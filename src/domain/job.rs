use std::{borrow::Cow, fmt};

use derive_deref::Deref;
use serde::{Deserialize, Serialize};

use super::{
    cursor::Cursor,
    page::{Page, WindowItem},
};

/// Identifier of a background match job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A job posting as returned by the jobs listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: String,
    pub title: String,
    pub company_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub years_experience_min: u32,
    #[serde(default)]
    pub years_experience_max: u32,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub remote: String,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    /// Server timestamp, kept verbatim so synthesized cursors match the server's format
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl WindowItem for JobListing {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.created_at)
    }
}

/// Compact job description embedded in a match result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub company_name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub remote: String,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub years_experience_min: u32,
    #[serde(default)]
    pub years_experience_max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub semantic: f64,
    pub yoe: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MatchExplanation {
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_required: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// A job scored against the caller's resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job: JobSummary,
    pub score: f64,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
    #[serde(default)]
    pub explanation: MatchExplanation,
}

impl MatchResult {
    pub fn skills_matched(&self) -> usize {
        self.explanation.matched_skills.len()
    }

    pub fn skills_required(&self) -> usize {
        self.explanation.matched_skills.len() + self.explanation.missing_required.len()
    }
}

impl WindowItem for MatchResult {
    fn id(&self) -> &str {
        &self.job.id
    }

    fn sort_key(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{:.6}", self.score))
    }
}

/// `GET /api/jobs` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListCursorResponse {
    pub jobs: Vec<JobListing>,
    pub next_cursor: Option<Cursor>,
    pub prev_cursor: Option<Cursor>,
}

impl From<JobListCursorResponse> for Page<JobListing> {
    fn from(response: JobListCursorResponse) -> Self {
        Page::new(response.jobs, response.next_cursor).with_prev_cursor(response.prev_cursor)
    }
}

/// `GET /api/match/results` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResultsCursorResponse {
    pub total_matches: u64,
    pub matches: Vec<MatchResult>,
    pub next_cursor: Option<Cursor>,
    pub prev_cursor: Option<Cursor>,
}

impl From<MatchResultsCursorResponse> for Page<MatchResult> {
    fn from(response: MatchResultsCursorResponse) -> Self {
        Page::new(response.matches, response.next_cursor)
            .with_prev_cursor(response.prev_cursor)
            .with_total_count(Some(response.total_matches))
    }
}

/// Lifecycle of a background match job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// `GET /api/match/status/{job_id}` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub error: Option<String>,
}

/// `202 Accepted` body of `POST /api/match/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: JobId,
}

/// `GET /api/saved-jobs` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SavedJobsResponse {
    pub jobs: Vec<JobListing>,
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::Result;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_job_list_response_into_page() -> Result<()> {
        let body = r#"{
            "jobs": [{
                "id": "j1",
                "title": "Backend Engineer",
                "company_name": "Acme",
                "salary_min": 120000,
                "salary_max": null,
                "created_at": "2024-05-01T10:00:00Z"
            }],
            "next_cursor": "2024-05-01T10:00:00Z,j1",
            "prev_cursor": null
        }"#;
        let response: JobListCursorResponse = serde_json::from_str(body)?;
        let page: Page<JobListing> = response.into();

        assert_eq!(page.len(), 1);
        assert_eq!(page.items[0].cursor().as_str(), "2024-05-01T10:00:00Z,j1");
        assert_eq!(page.next_cursor, Some(Cursor::new("2024-05-01T10:00:00Z,j1")));
        assert_eq!(page.prev_cursor, None);
        assert_eq!(page.total_count, None);
        Ok(())
    }

    #[test]
    fn test_match_response_carries_total() -> Result<()> {
        let body = r#"{
            "total_matches": 120,
            "matches": [{
                "job": {"id": "j9", "title": "SRE", "company_name": "Initech", "salary_min": null, "salary_max": null},
                "score": 0.87,
                "breakdown": {"skills": 0.9, "semantic": 0.8, "yoe": 1.0},
                "explanation": {"matched_skills": ["rust", "k8s"], "missing_required": ["go"], "summary": "Strong fit"}
            }],
            "next_cursor": "50",
            "prev_cursor": null
        }"#;
        let response: MatchResultsCursorResponse = serde_json::from_str(body)?;
        let page: Page<MatchResult> = response.into();

        assert_eq!(page.total_count, Some(120));
        assert_eq!(page.items[0].id(), "j9");
        assert_eq!(page.items[0].skills_matched(), 2);
        assert_eq!(page.items[0].skills_required(), 3);
        Ok(())
    }

    #[test]
    fn test_job_status_wire_format() -> Result<()> {
        let status: JobStatusResponse =
            serde_json::from_str(r#"{"job_id": "abc", "status": "processing", "error": null}"#)?;
        assert_eq!(status.job_id.as_str(), "abc");
        assert_eq!(status.status, JobStatus::Processing);
        assert!(!status.status.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert_eq!(JobStatus::Completed.to_string(), "completed");
        Ok(())
    }
}
