pub mod ui;

use serde::{Deserialize, Serialize};

use crate::{
    domain::job::{JobListing, MatchResult},
    model::{feed, job_poller, saved},
};
use ui::UiMsg;

/// Domain messages processed by [`crate::core::update::update`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Msg {
    Jobs(feed::Message<JobListing>),
    Matches(feed::Message<MatchResult>),
    Poller(job_poller::Message),
    Saved(saved::Message),
    Ui(UiMsg),
}

impl Msg {
    /// Helper to exclude frequent messages from debug logging
    pub fn is_frequent(&self) -> bool {
        match self {
            Msg::Ui(ui) => ui.is_frequent(),
            _ => false,
        }
    }

    /// Short label for logs; avoids dumping whole pages
    pub fn name(&self) -> String {
        match self {
            Msg::Jobs(message) => format!("Jobs({})", feed_message_name(message)),
            Msg::Matches(message) => format!("Matches({})", feed_message_name(message)),
            Msg::Poller(job_poller::Message::StatusReceived { job_id, epoch, .. }) => {
                format!("Poller(StatusReceived {job_id}#{epoch})")
            }
            Msg::Poller(message) => format!("Poller({message:?})"),
            Msg::Saved(saved::Message::Listed(_)) => "Saved(Listed)".to_string(),
            Msg::Saved(message) => format!("Saved({message:?})"),
            Msg::Ui(UiMsg::UploadRequested(file)) => format!("Ui(UploadRequested {})", file.name),
            Msg::Ui(message) => format!("Ui({message:?})"),
        }
    }
}

fn feed_message_name<T>(message: &feed::Message<T>) -> String {
    match message {
        feed::Message::InitialLoadRequested => "InitialLoadRequested".to_string(),
        feed::Message::NextPageRequested => "NextPageRequested".to_string(),
        feed::Message::PrevPageRequested => "PrevPageRequested".to_string(),
        feed::Message::PageLoaded { ticket, result } => format!(
            "PageLoaded {} gen={} {}",
            ticket.kind,
            ticket.generation,
            if result.is_ok() { "ok" } else { "err" }
        ),
        feed::Message::ResetRequested => "ResetRequested".to_string(),
        feed::Message::Detached => "Detached".to_string(),
    }
}
