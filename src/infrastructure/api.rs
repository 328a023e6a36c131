//! Seams between the core and the remote services
//!
//! Every remote collaborator is an `async_trait` object so the command executor can
//! hold them behind `Arc<dyn ...>` and tests can swap in [`super::memory::InMemoryApi`].

use std::sync::Arc;

use crate::domain::{
    error::ApiError,
    job::{JobAccepted, JobId, JobListing, JobStatusResponse, MatchResult},
    page::{Page, PageRequest},
    upload::ResumeFile,
};

/// One cursor-paginated listing
#[async_trait::async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ApiError>;
}

/// Resume upload and match job status
#[async_trait::async_trait]
pub trait MatchJobs: Send + Sync {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<JobAccepted, ApiError>;
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ApiError>;
}

#[async_trait::async_trait]
pub trait SavedJobsApi: Send + Sync {
    async fn list_saved(&self) -> Result<Vec<JobListing>, ApiError>;
    async fn save_job(&self, job_id: &str) -> Result<(), ApiError>;
    async fn unsave_job(&self, job_id: &str) -> Result<(), ApiError>;
}

/// The full set of remote services the executor talks to
#[derive(Clone)]
pub struct Services {
    pub jobs: Arc<dyn PageSource<JobListing>>,
    pub matches: Arc<dyn PageSource<MatchResult>>,
    pub match_jobs: Arc<dyn MatchJobs>,
    pub saved: Arc<dyn SavedJobsApi>,
}

impl Services {
    /// Route every service to one backend
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: PageSource<JobListing> + PageSource<MatchResult> + MatchJobs + SavedJobsApi + 'static,
    {
        Self {
            jobs: backend.clone(),
            matches: backend.clone(),
            match_jobs: backend.clone(),
            saved: backend,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
