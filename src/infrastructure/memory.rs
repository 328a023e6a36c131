//! Deterministic in-process backend
//!
//! Serves the jobs listing with keyset cursors and match results with offset cursors,
//! runs scripted match jobs and keeps a saved-jobs set. Failures can be queued per
//! endpoint and every request is counted, which is what the integration tests and the
//! `--offline` mode rely on.

use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::{
    domain::{
        cursor::{Cursor, Direction},
        error::ApiError,
        job::{
            JobAccepted, JobId, JobListing, JobStatus, JobStatusResponse, JobSummary,
            MatchExplanation, MatchResult, ScoreBreakdown,
        },
        page::{Page, PageRequest},
        upload::ResumeFile,
    },
    infrastructure::api::{MatchJobs, PageSource, SavedJobsApi},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Endpoint {
    Jobs,
    Matches,
    Upload,
    Status,
    ListSaved,
    Save,
    Unsave,
}

const TITLES: [&str; 6] = [
    "Backend Engineer",
    "Data Scientist",
    "Platform Engineer",
    "Product Designer",
    "ML Engineer",
    "Site Reliability Engineer",
];
const COMPANIES: [&str; 4] = ["Acme", "Globex", "Initech", "Umbrella"];
const REMOTE: [&str; 3] = ["remote", "hybrid", "onsite"];
const SKILLS: [&str; 6] = ["rust", "python", "sql", "kubernetes", "react", "go"];

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// The `n`-th listing, newest first
pub fn sample_listing(n: usize) -> JobListing {
    let created_at = (base_time() - chrono::Duration::minutes(n as i64))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    JobListing {
        id: format!("job-{n}"),
        title: TITLES[n % TITLES.len()].to_string(),
        company_name: COMPANIES[n % COMPANIES.len()].to_string(),
        description: format!("Listing number {n}"),
        source: "memory".to_string(),
        domain: if n % 2 == 0 { "engineering" } else { "data" }.to_string(),
        subdomain: String::new(),
        years_experience_min: (n % 7) as u32,
        years_experience_max: (n % 7) as u32 + 3,
        skills_required: SKILLS
            .iter()
            .cycle()
            .skip(n % SKILLS.len())
            .take(3)
            .map(|skill| skill.to_string())
            .collect(),
        location: "Berlin".to_string(),
        remote: REMOTE[n % REMOTE.len()].to_string(),
        salary_min: (n % 4 != 3).then_some(60_000 + (n as u64 % 10) * 5_000),
        salary_max: (n % 4 == 0).then_some(120_000 + (n as u64 % 10) * 5_000),
        updated_at: created_at.clone(),
        created_at,
    }
}

/// The `n`-th match, best score first
pub fn sample_match(n: usize) -> MatchResult {
    let listing = sample_listing(n);
    let (matched, missing) = listing.skills_required.split_at(2);
    MatchResult {
        job: JobSummary {
            id: listing.id,
            title: listing.title,
            company_name: listing.company_name,
            domain: listing.domain,
            subdomain: listing.subdomain,
            location: listing.location,
            remote: listing.remote,
            salary_min: listing.salary_min,
            salary_max: listing.salary_max,
            skills_required: listing.skills_required.clone(),
            years_experience_min: listing.years_experience_min,
            years_experience_max: listing.years_experience_max,
        },
        score: (1.0 - n as f64 / 10_000.0).max(0.0),
        breakdown: ScoreBreakdown {
            skills: 0.5,
            semantic: 0.3,
            yoe: 0.2,
        },
        explanation: MatchExplanation {
            matched_skills: matched.to_vec(),
            missing_required: missing.to_vec(),
            summary: String::new(),
        },
    }
}

#[derive(Debug)]
struct Job {
    script: VecDeque<JobStatus>,
    last: JobStatus,
}

#[derive(Debug)]
struct State {
    jobs: Vec<JobListing>,
    domain: Option<String>,
    matches: Vec<MatchResult>,
    matches_ready: bool,
    matches_on_completion: usize,
    job_script: Vec<JobStatus>,
    job_error: Option<String>,
    running: HashMap<JobId, Job>,
    next_job: usize,
    saved: BTreeSet<String>,
    failures: HashMap<Endpoint, VecDeque<ApiError>>,
    requests: HashMap<Endpoint, usize>,
    latency: Duration,
}

#[derive(Debug)]
pub struct InMemoryApi {
    state: Mutex<State>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    /// No jobs, no match results (404) and a job script of `processing, completed`
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                jobs: Vec::new(),
                domain: None,
                matches: Vec::new(),
                matches_ready: false,
                matches_on_completion: 0,
                job_script: vec![JobStatus::Processing, JobStatus::Completed],
                job_error: None,
                running: HashMap::new(),
                next_job: 1,
                saved: BTreeSet::new(),
                failures: HashMap::new(),
                requests: HashMap::new(),
                latency: Duration::ZERO,
            }),
        }
    }

    /// Data set used by `--offline`
    pub fn demo() -> Self {
        Self::new().with_jobs(1_200).with_matches_on_completion(240)
    }

    pub fn with_jobs(self, count: usize) -> Self {
        self.state().jobs = (0..count).map(sample_listing).collect();
        self
    }

    /// Match results that are already available
    pub fn with_matches(self, count: usize) -> Self {
        {
            let mut state = self.state();
            state.matches = (0..count).map(sample_match).collect();
            state.matches_ready = true;
        }
        self
    }

    /// Match results that appear once a job completes
    pub fn with_matches_on_completion(self, count: usize) -> Self {
        self.state().matches_on_completion = count;
        self
    }

    /// Statuses reported by successive polls of every new job; the last one repeats
    pub fn with_job_script(self, script: Vec<JobStatus>, error: Option<&str>) -> Self {
        {
            let mut state = self.state();
            state.job_script = script;
            state.job_error = error.map(str::to_string);
        }
        self
    }

    pub fn with_domain(self, domain: Option<String>) -> Self {
        self.state().domain = domain;
        self
    }

    /// Delay applied to every response
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = latency;
        self
    }

    /// Make the next call to `endpoint` fail with `error`
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.state()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    pub fn requests(&self, endpoint: Endpoint) -> usize {
        self.state().requests.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn saved_ids(&self) -> Vec<String> {
        self.state().saved.iter().cloned().collect()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the request, then either pop an injected failure or return the latency
    fn begin(&self, endpoint: Endpoint) -> Result<Duration, ApiError> {
        let mut state = self.state();
        *state.requests.entry(endpoint).or_default() += 1;
        if let Some(error) = state
            .failures
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
        {
            log::debug!("{endpoint}: injected failure {error}");
            return Err(error);
        }
        Ok(state.latency)
    }

    async fn enter(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        let latency = self.begin(endpoint)?;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }
}

fn invalid_cursor(cursor: &Cursor) -> ApiError {
    ApiError::Status {
        status: 422,
        message: format!("Invalid cursor: {cursor}"),
    }
}

/// `(created_at, id)` pairs sort the same way as the listing, newest first
fn keyset_page(
    items: Vec<JobListing>,
    request: &PageRequest,
) -> Result<Page<JobListing>, ApiError> {
    let key = |job: &JobListing| (job.created_at.clone(), job.id.clone());
    let position = match &request.cursor {
        None => None,
        Some(cursor) => {
            let (at, id) = cursor.as_keyset().ok_or_else(|| invalid_cursor(cursor))?;
            Some((at.to_string(), id.to_string()))
        }
    };
    let limit = request.limit.max(1);

    let (start, end) = match (request.dir, position) {
        (Direction::Next, None) => (0, limit.min(items.len())),
        (Direction::Next, Some(position)) => {
            let start = items.partition_point(|job| key(job) >= position);
            (start, (start + limit).min(items.len()))
        }
        (Direction::Prev, None) => (0, 0),
        (Direction::Prev, Some(position)) => {
            let end = items.partition_point(|job| key(job) > position);
            (end.saturating_sub(limit), end)
        }
    };

    let page_items = items[start..end].to_vec();
    let next_cursor = (end < items.len())
        .then(|| page_items.last().map(|job| Cursor::synthesized(&job.created_at, &job.id)))
        .flatten();
    let prev_cursor = (start > 0)
        .then(|| page_items.first().map(|job| Cursor::synthesized(&job.created_at, &job.id)))
        .flatten();
    Ok(Page::new(page_items, next_cursor).with_prev_cursor(prev_cursor))
}

fn offset_page(
    items: &[MatchResult],
    request: &PageRequest,
) -> Result<Page<MatchResult>, ApiError> {
    let offset = match &request.cursor {
        None => 0,
        Some(cursor) => cursor.as_offset().ok_or_else(|| invalid_cursor(cursor))?,
    };
    let limit = request.limit.max(1);
    let (start, end) = match request.dir {
        Direction::Next => {
            let start = offset.min(items.len());
            (start, (start + limit).min(items.len()))
        }
        Direction::Prev => {
            let end = offset.min(items.len());
            (end.saturating_sub(limit), end)
        }
    };
    let next_cursor = (end < items.len()).then(|| Cursor::from_offset(end));
    let prev_cursor = (start > 0).then(|| Cursor::from_offset(start));
    Ok(Page::new(items[start..end].to_vec(), next_cursor)
        .with_prev_cursor(prev_cursor)
        .with_total_count(Some(items.len() as u64)))
}

#[async_trait::async_trait]
impl PageSource<JobListing> for InMemoryApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<JobListing>, ApiError> {
        self.enter(Endpoint::Jobs).await?;
        let items: Vec<JobListing> = {
            let state = self.state();
            match &state.domain {
                Some(domain) => state
                    .jobs
                    .iter()
                    .filter(|job| &job.domain == domain)
                    .cloned()
                    .collect(),
                None => state.jobs.clone(),
            }
        };
        keyset_page(items, request)
    }
}

#[async_trait::async_trait]
impl PageSource<MatchResult> for InMemoryApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<MatchResult>, ApiError> {
        self.enter(Endpoint::Matches).await?;
        let state = self.state();
        if !state.matches_ready {
            return Err(ApiError::NotFound("No match results found".to_string()));
        }
        offset_page(&state.matches, request)
    }
}

#[async_trait::async_trait]
impl MatchJobs for InMemoryApi {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<JobAccepted, ApiError> {
        self.enter(Endpoint::Upload).await?;
        let mut state = self.state();
        let job_id = JobId::new(format!("match-{}", state.next_job));
        state.next_job += 1;
        let script: VecDeque<JobStatus> = state.job_script.iter().copied().collect();
        state.running.insert(
            job_id.clone(),
            Job {
                script,
                last: JobStatus::Pending,
            },
        );
        log::info!("accepted {} as {job_id}", file.name);
        Ok(JobAccepted { job_id })
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ApiError> {
        self.enter(Endpoint::Status).await?;
        let mut state = self.state();
        let status = {
            let Some(job) = state.running.get_mut(job_id) else {
                return Err(ApiError::NotFound("Job not found".to_string()));
            };
            if let Some(next) = job.script.pop_front() {
                job.last = next;
            }
            job.last
        };
        if status == JobStatus::Completed && !state.matches_ready {
            state.matches = (0..state.matches_on_completion).map(sample_match).collect();
            state.matches_ready = true;
        }
        Ok(JobStatusResponse {
            job_id: job_id.clone(),
            status,
            error: (status == JobStatus::Failed)
                .then(|| state.job_error.clone())
                .flatten(),
        })
    }
}

#[async_trait::async_trait]
impl SavedJobsApi for InMemoryApi {
    async fn list_saved(&self) -> Result<Vec<JobListing>, ApiError> {
        self.enter(Endpoint::ListSaved).await?;
        let state = self.state();
        Ok(state
            .jobs
            .iter()
            .filter(|job| state.saved.contains(&job.id))
            .cloned()
            .collect())
    }

    async fn save_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.enter(Endpoint::Save).await?;
        let mut state = self.state();
        if !state.jobs.iter().any(|job| job.id == job_id) {
            return Err(ApiError::NotFound("Job not found".to_string()));
        }
        state.saved.insert(job_id.to_string());
        Ok(())
    }

    async fn unsave_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.enter(Endpoint::Unsave).await?;
        if self.state().saved.remove(job_id) {
            Ok(())
        } else {
            Err(ApiError::NotFound("Saved job not found".to_string()))
        }
    }
}
