pub mod session;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        cursor::{CursorMode, Direction},
        job::{JobListing, MatchResult},
        page::WindowItem,
        upload::UploadPolicy,
    },
    infrastructure::config::Config,
    model::{
        feed::{Feed, FeedSettings, FeedStatus},
        grid::{load_trigger, GridLayout},
        job_poller::JobPoller,
        page_cache::CacheError,
        saved::SavedJobs,
        viewport::{EstimatedRowVirtualizer, VirtualizationAdapter, Viewport, VisibleRows},
    },
};

pub use session::Session;

/// The two paginated listings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum FeedKind {
    /// All job postings, keyset-paged by creation time
    Jobs,
    /// Results of the last resume match, offset-paged by score
    Matches,
}

impl FeedKind {
    pub fn cursor_mode(self) -> CursorMode {
        match self {
            FeedKind::Jobs => CursorMode::Keyset,
            FeedKind::Matches => CursorMode::Offset,
        }
    }

    /// Banner text when the first page fails without a server message
    pub fn load_failed_message(self) -> &'static str {
        match self {
            FeedKind::Jobs => "Failed to load jobs.",
            FeedKind::Matches => "Failed to load results.",
        }
    }
}

/// A feed plus everything needed to present it as a virtualized grid
#[derive(Debug, Clone)]
pub struct FeedView<T> {
    pub feed: Feed<T>,
    pub grid: GridLayout,
    pub viewport: Viewport,
    pub virtualizer: EstimatedRowVirtualizer,
    selected: Option<String>,
    pub mounted: bool,
    pub error: Option<String>,
    columns: usize,
    columns_with_panel: usize,
    load_threshold_px: u64,
}

impl<T: WindowItem> FeedView<T> {
    pub fn new(settings: FeedSettings, config: &Config) -> Result<Self, CacheError> {
        Ok(Self {
            feed: Feed::new(settings)?,
            grid: GridLayout::new(config.layout.columns, config.paging.estimated_row_height_px),
            viewport: Viewport::new(config.layout.viewport_height_px),
            virtualizer: EstimatedRowVirtualizer {
                overscan: config.paging.overscan_rows,
            },
            selected: None,
            mounted: false,
            error: None,
            columns: config.layout.columns,
            columns_with_panel: config.layout.columns_with_panel,
            load_threshold_px: config.paging.scroll_load_threshold_px,
        })
    }

    /// Open the detail panel for the item at `index`, or close it with `None`
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index
            .and_then(|index| self.feed.items().get(index))
            .map(|item| item.id().to_owned());
        let columns = if self.selected.is_some() {
            self.columns_with_panel
        } else {
            self.columns
        };
        self.grid.set_columns(columns);
    }

    pub fn selected_item(&self) -> Option<&T> {
        let id = self.selected.as_deref()?;
        self.feed.items().iter().find(|item| item.id() == id)
    }

    /// Close the panel if its item has left the window
    pub fn sync_selection(&mut self) {
        if self.selected.is_some() && self.selected_item().is_none() {
            self.select(None);
        }
    }

    pub fn total_extent_px(&self) -> u64 {
        self.grid.total_extent_px(self.feed.items().len())
    }

    pub fn visible_rows(&self) -> VisibleRows {
        self.virtualizer.visible_rows(
            self.grid.row_count(self.feed.items().len()),
            self.grid.row_height_px(),
            &self.viewport,
        )
    }

    /// Rows currently worth rendering, padded to the column count
    pub fn visible_grid(&self) -> Vec<Vec<Option<&T>>> {
        self.grid.rows(self.feed.items(), self.visible_rows().rows)
    }

    pub fn scroll_trigger(&self) -> Option<Direction> {
        load_trigger(
            self.viewport.metrics(self.total_extent_px()),
            self.load_threshold_px,
            !self.feed.items().is_empty(),
        )
    }

    pub fn scroll_to(&mut self, scroll_top: u64) {
        let extent = self.total_extent_px();
        self.viewport.scroll_to(scroll_top, extent);
    }

    /// Neutral "nothing here" state, as opposed to an error
    pub fn shows_empty_state(&self) -> bool {
        matches!(self.feed.status(), FeedStatus::Empty | FeedStatus::NotFound)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub policy: UploadPolicy,
    pub uploading: bool,
}

/// Unified application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Session,
    pub jobs: FeedView<JobListing>,
    pub matches: FeedView<MatchResult>,
    pub poller: JobPoller,
    pub upload: UploadState,
    pub saved: SavedJobs,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, CacheError> {
        Ok(Self {
            session: Session::default(),
            jobs: FeedView::new(
                config.paging.feed_settings(FeedKind::Jobs.cursor_mode()),
                config,
            )?,
            matches: FeedView::new(
                config.paging.feed_settings(FeedKind::Matches.cursor_mode()),
                config,
            )?,
            poller: JobPoller::new(config.paging.poll_interval()),
            upload: UploadState {
                policy: config.upload.clone(),
                uploading: false,
            },
            saved: SavedJobs::default(),
        })
    }

    /// Whether the upload control should accept a file right now
    pub fn can_upload(&self) -> bool {
        !self.session.job_in_progress() && !self.upload.uploading
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::Result;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{cursor::Cursor, page::Page};
    use crate::model::feed::Message as FeedMessage;

    fn listing(n: usize) -> JobListing {
        JobListing {
            id: format!("job-{n}"),
            title: format!("Role {n}"),
            company_name: "Acme".to_string(),
            description: String::new(),
            source: String::new(),
            domain: String::new(),
            subdomain: String::new(),
            years_experience_min: 0,
            years_experience_max: 0,
            skills_required: vec![],
            location: String::new(),
            remote: String::new(),
            salary_min: None,
            salary_max: None,
            created_at: format!("2024-05-01T00:00:{:02}Z", 59 - n),
            updated_at: String::new(),
        }
    }

    fn loaded_view(count: usize) -> Result<FeedView<JobListing>> {
        let config = Config::default();
        let mut view = FeedView::new(config.paging.feed_settings(CursorMode::Keyset), &config)?;
        let effects = view.feed.update(FeedMessage::InitialLoadRequested);
        let Some(crate::model::feed::Effect::Fetch(ticket)) = effects.into_iter().next() else {
            panic!("expected a fetch");
        };
        view.feed.update(FeedMessage::PageLoaded {
            ticket,
            result: Ok(Page::new(
                (0..count).map(listing).collect(),
                Some(Cursor::new("next")),
            )),
        });
        Ok(view)
    }

    #[test]
    fn test_app_state_uses_config() -> Result<()> {
        let state = AppState::new(&Config::default())?;
        assert_eq!(state.jobs.feed.settings().cursor_mode, CursorMode::Keyset);
        assert_eq!(state.matches.feed.settings().cursor_mode, CursorMode::Offset);
        assert_eq!(state.jobs.grid.columns(), 3);
        assert!(state.can_upload());
        Ok(())
    }

    #[test]
    fn test_selection_switches_columns() -> Result<()> {
        let mut view = loaded_view(7)?;
        view.select(Some(4));
        assert_eq!(view.grid.columns(), 2);
        assert_eq!(view.selected_item().map(|job| job.id.as_str()), Some("job-4"));
        assert_eq!(view.feed.items().len(), 7);

        view.select(None);
        assert_eq!(view.grid.columns(), 3);

        view.select(Some(99));
        assert!(view.selected_item().is_none());
        assert_eq!(view.grid.columns(), 3);
        Ok(())
    }

    #[test]
    fn test_scroll_trigger_near_edges() -> Result<()> {
        let mut view = loaded_view(50)?;
        // 17 rows * 280px = 4760px of content in an 800px viewport
        assert_eq!(view.total_extent_px(), 4760);

        view.scroll_to(1500);
        assert_eq!(view.scroll_trigger(), None);
        view.scroll_to(3700);
        assert_eq!(view.scroll_trigger(), Some(Direction::Next));
        view.scroll_to(100);
        assert_eq!(view.scroll_trigger(), Some(Direction::Prev));
        Ok(())
    }

    #[test]
    fn test_visible_grid_is_padded() -> Result<()> {
        let view = loaded_view(4)?;
        let rows = view.visible_grid();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].iter().filter(|cell| cell.is_none()).count(), 2);
        Ok(())
    }
}
