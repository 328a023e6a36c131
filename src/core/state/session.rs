use serde::{Deserialize, Serialize};

use crate::domain::job::JobId;

/// State that outlives any single view
///
/// The match job id lives here so that leaving the results view and coming back
/// picks polling up where it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    current_job: Option<JobId>,
    total_matches: Option<u64>,
}

impl Session {
    pub fn current_job(&self) -> Option<&JobId> {
        self.current_job.as_ref()
    }

    pub fn job_in_progress(&self) -> bool {
        self.current_job.is_some()
    }

    pub fn set_job(&mut self, job_id: JobId) {
        self.current_job = Some(job_id);
    }

    /// Clear the job, but only if it is still the one given
    pub fn clear_job(&mut self, job_id: &JobId) -> bool {
        if self.current_job.as_ref() == Some(job_id) {
            self.current_job = None;
            true
        } else {
            false
        }
    }

    pub fn total_matches(&self) -> Option<u64> {
        self.total_matches
    }

    pub fn set_total_matches(&mut self, total: Option<u64>) {
        self.total_matches = total;
    }

    pub fn sign_out(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_job_ignores_other_ids() {
        let mut session = Session::default();
        session.set_job(JobId::new("j2"));
        assert!(!session.clear_job(&JobId::new("j1")));
        assert!(session.job_in_progress());
        assert!(session.clear_job(&JobId::new("j2")));
        assert_eq!(session.current_job(), None);
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let mut session = Session::default();
        session.set_job(JobId::new("j1"));
        session.set_total_matches(Some(42));
        session.sign_out();
        assert_eq!(session, Session::default());
    }
}
