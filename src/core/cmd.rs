use serde::{Deserialize, Serialize};

use crate::{
    core::state::FeedKind,
    domain::{job::JobId, upload::ResumeFile},
    model::feed::FetchTicket,
};

/// Side effects requested by [`crate::core::update::update`]
///
/// Commands describe what should happen; [`crate::integration::cmd_executor::CmdExecutor`]
/// decides how, and reports results back as messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmd {
    // Listing requests
    FetchPage {
        feed: FeedKind,
        ticket: FetchTicket,
    },

    // Match job lifecycle
    UploadResume {
        file: ResumeFile,
    },
    PollJobStatus {
        job_id: JobId,
        /// Poll chain the reply belongs to
        epoch: u64,
        delay_ms: u64,
    },
    CancelJobPolling,

    // Saved jobs
    ListSavedJobs,
    SaveJob {
        job_id: String,
    },
    UnsaveJob {
        job_id: String,
    },

    /// Shift the host's scroll position after rows were inserted above it
    CompensateScroll {
        feed: FeedKind,
        pixels: u64,
    },

    // Logging related
    LogError {
        message: String,
    },
    LogInfo {
        message: String,
    },

    // Batch command (execute multiple commands together)
    Batch(Vec<Cmd>),

    // Do nothing (for testing)
    None,
}

impl Cmd {
    /// Combine multiple commands into one
    pub fn batch(commands: Vec<Cmd>) -> Cmd {
        let mut commands = commands;
        match commands.len() {
            0 => Cmd::None,
            1 => commands.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(commands),
        }
    }

    /// Whether the command requires asynchronous processing
    pub fn is_async(&self) -> bool {
        match self {
            Cmd::FetchPage { .. }
            | Cmd::UploadResume { .. }
            | Cmd::PollJobStatus { .. }
            | Cmd::ListSavedJobs
            | Cmd::SaveJob { .. }
            | Cmd::UnsaveJob { .. } => true,

            Cmd::CancelJobPolling
            | Cmd::CompensateScroll { .. }
            | Cmd::LogError { .. }
            | Cmd::LogInfo { .. }
            | Cmd::None => false,

            Cmd::Batch(cmds) => cmds.iter().any(|cmd| cmd.is_async()),
        }
    }

    /// Get the command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::FetchPage { .. } => "FetchPage",
            Cmd::UploadResume { .. } => "UploadResume",
            Cmd::PollJobStatus { .. } => "PollJobStatus",
            Cmd::CancelJobPolling => "CancelJobPolling",
            Cmd::ListSavedJobs => "ListSavedJobs",
            Cmd::SaveJob { .. } => "SaveJob",
            Cmd::UnsaveJob { .. } => "UnsaveJob",
            Cmd::CompensateScroll { .. } => "CompensateScroll",
            Cmd::LogError { .. } => "LogError",
            Cmd::LogInfo { .. } => "LogInfo",
            Cmd::Batch(_) => "Batch",
            Cmd::None => "None",
        }
    }
}
