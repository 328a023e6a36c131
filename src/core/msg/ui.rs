use serde::{Deserialize, Serialize};

use crate::{
    core::state::FeedKind,
    domain::{error::ApiError, job::JobId, upload::ResumeFile},
};

/// Events coming from the presentation side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiMsg {
    Mounted(FeedKind),
    Unmounted(FeedKind),
    Scrolled { feed: FeedKind, scroll_top: u64 },
    ViewportResized { feed: FeedKind, height: u64 },
    /// `None` closes the detail panel
    ItemSelected { feed: FeedKind, index: Option<usize> },
    SaveToggled { job_id: String },
    UploadRequested(ResumeFile),
    UploadFinished(Result<JobId, ApiError>),
    /// "Try again" on an error banner
    ErrorDismissed(FeedKind),
    SignedOut,
}

impl UiMsg {
    pub fn is_frequent(&self) -> bool {
        matches!(self, UiMsg::Scrolled { .. })
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::Result;

    use super::*;

    #[test]
    fn ui_msg_serde() -> Result<()> {
        let msg = UiMsg::ItemSelected {
            feed: FeedKind::Matches,
            index: Some(3),
        };
        let s = serde_json::to_string(&msg)?;
        let back: UiMsg = serde_json::from_str(&s)?;
        assert_eq!(msg, back);

        Ok(())
    }
}
