//! Saved-jobs side channel shared by both listing views

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{error::ApiError, job::JobListing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Mutation {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    RefreshRequested,
    Listed(Result<Vec<JobListing>, ApiError>),
    ToggleRequested(String),
    MutationFinished {
        job_id: String,
        result: Result<(), ApiError>,
    },
    ErrorDismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    List,
    Mutate { job_id: String, mutation: Mutation },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedJobs {
    jobs: Vec<JobListing>,
    ids: HashSet<String>,
    pending: HashMap<String, Mutation>,
    listing: bool,
    error: Option<String>,
}

impl SavedJobs {
    pub fn jobs(&self) -> &[JobListing] {
        &self.jobs
    }

    pub fn is_saved(&self, job_id: &str) -> bool {
        self.ids.contains(job_id)
    }

    pub fn is_pending(&self, job_id: &str) -> bool {
        self.pending.contains_key(job_id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_listing(&self) -> bool {
        self.listing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::RefreshRequested => {
                if self.listing {
                    return vec![];
                }
                self.listing = true;
                vec![Effect::List]
            }
            Message::Listed(Ok(jobs)) => {
                self.listing = false;
                self.ids = jobs.iter().map(|job| job.id.clone()).collect();
                self.jobs = jobs;
                vec![]
            }
            Message::Listed(Err(error)) => {
                self.listing = false;
                log::warn!("listing saved jobs failed: {error}");
                self.error = Some(error.user_message("Failed to load saved jobs."));
                vec![]
            }
            Message::ToggleRequested(job_id) => {
                if self.pending.contains_key(&job_id) {
                    return vec![];
                }
                let mutation = if self.ids.contains(&job_id) {
                    Mutation::Remove
                } else {
                    Mutation::Add
                };
                self.pending.insert(job_id.clone(), mutation);
                vec![Effect::Mutate { job_id, mutation }]
            }
            Message::MutationFinished { job_id, result } => {
                let Some(mutation) = self.pending.remove(&job_id) else {
                    return vec![];
                };
                match result {
                    Ok(()) => {
                        match mutation {
                            Mutation::Add => self.ids.insert(job_id),
                            Mutation::Remove => self.ids.remove(&job_id),
                        };
                        // the list is the source of truth; refetch it
                        self.listing = true;
                        vec![Effect::List]
                    }
                    Err(error) => {
                        log::warn!("{mutation} saved job {job_id} failed: {error}");
                        self.error = Some(error.user_message("Failed to update saved jobs."));
                        vec![]
                    }
                }
            }
            Message::ErrorDismissed => {
                self.error = None;
                vec![]
            }
        }
    }
}
