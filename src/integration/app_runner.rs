use std::{
    io::Write,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use color_eyre::eyre::{bail, eyre, Result};

use crate::{
    core::{
        msg::{ui::UiMsg, Msg},
        state::{AppState, FeedKind},
    },
    domain::upload::ResumeFile,
    infrastructure::{
        api::Services,
        cli::{Cli, Command},
        config::Config,
        http::HttpApi,
        memory::InMemoryApi,
    },
    integration::{renderer::Renderer, runtime::Runtime},
    model::saved,
};

/// Upper bound for a single load to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives one CLI command through the runtime and prints what a view would show
pub struct AppRunner {
    config: Config,
    runtime: Runtime,
    renderer: Renderer,
}

impl AppRunner {
    pub fn new(config: Config, services: Services) -> Result<Self> {
        let state = AppState::new(&config)?;
        Ok(Self {
            runtime: Runtime::new_with_executor(state, services),
            renderer: Renderer::default(),
            config,
        })
    }

    /// Apply command-line overrides and pick the backend
    pub fn from_cli(cli: &Cli, mut config: Config) -> Result<Self> {
        if let Some(api_url) = &cli.api_url {
            config.api.base_url = api_url.clone();
        }
        if let Command::Browse {
            domain: Some(domain),
            ..
        } = &cli.command
        {
            config.api.domain = Some(domain.clone());
        }

        let services = if cli.offline {
            log::info!("using the built-in demo backend");
            Services::from_backend(Arc::new(
                InMemoryApi::demo().with_domain(config.api.domain.clone()),
            ))
        } else {
            log::info!("using backend at {}", config.api.base_url);
            Services::from_backend(Arc::new(HttpApi::new(&config.api)?))
        };
        Self::new(config, services)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub async fn run<W: Write>(&mut self, command: &Command, out: &mut W) -> Result<()> {
        match command {
            Command::Browse {
                scrolls,
                back,
                panel,
                ..
            } => self.browse(*scrolls, *back, *panel, out).await,
            Command::Results { scrolls } => self.results(*scrolls, out).await,
            Command::Match { file, timeout_secs } => {
                self.run_match(file, Duration::from_secs(*timeout_secs), out)
                    .await
            }
            Command::Saved { toggle } => self.saved(toggle.as_deref(), out).await,
        }
    }

    async fn settle<F>(&mut self, done: F) -> Result<()>
    where
        F: Fn(&AppState) -> bool,
    {
        if !self.runtime.run_until(SETTLE_TIMEOUT, done).await? {
            bail!("timed out waiting for the backend");
        }
        Ok(())
    }

    async fn settle_feed(&mut self, feed: FeedKind) -> Result<()> {
        self.settle(move |state| match feed {
            FeedKind::Jobs => !state.jobs.feed.is_loading(),
            FeedKind::Matches => !state.matches.feed.is_loading(),
        })
        .await
    }

    /// Scroll so the last row sits at the bottom of the viewport
    async fn scroll_to_end(&mut self, feed: FeedKind) -> Result<()> {
        let scroll_top = {
            let state = self.runtime.state();
            match feed {
                FeedKind::Jobs => state.jobs.total_extent_px(),
                FeedKind::Matches => state.matches.total_extent_px(),
            }
        };
        self.runtime.send_msg(Msg::Ui(UiMsg::Scrolled { feed, scroll_top }));
        self.settle_feed(feed).await
    }

    async fn scroll_to_top(&mut self, feed: FeedKind) -> Result<()> {
        self.runtime.send_msg(Msg::Ui(UiMsg::Scrolled {
            feed,
            scroll_top: 0,
        }));
        self.settle_feed(feed).await
    }

    async fn browse<W: Write>(
        &mut self,
        scrolls: usize,
        back: usize,
        panel: bool,
        out: &mut W,
    ) -> Result<()> {
        self.runtime.send_msg(Msg::Ui(UiMsg::Mounted(FeedKind::Jobs)));
        self.settle_feed(FeedKind::Jobs).await?;
        if let Some(error) = &self.runtime.state().jobs.error {
            bail!("{error}");
        }

        for _ in 0..scrolls {
            if self.runtime.state().jobs.feed.window().reached_end() {
                break;
            }
            self.scroll_to_end(FeedKind::Jobs).await?;
            writeln!(
                out,
                "{}",
                self.renderer.status_line("jobs", &self.runtime.state().jobs)
            )?;
        }
        for _ in 0..back {
            self.scroll_to_top(FeedKind::Jobs).await?;
            writeln!(
                out,
                "{}",
                self.renderer.status_line("jobs", &self.runtime.state().jobs)
            )?;
        }
        if panel {
            self.runtime.send_msg(Msg::Ui(UiMsg::ItemSelected {
                feed: FeedKind::Jobs,
                index: Some(0),
            }));
            self.runtime.run_update_cycle()?;
        }

        let state = self.runtime.state();
        if state.jobs.shows_empty_state() {
            writeln!(out, "No jobs found.")?;
            return Ok(());
        }
        write!(out, "{}", self.renderer.render(&state.jobs, Utc::now()))?;
        writeln!(out, "{}", self.renderer.status_line("jobs", &state.jobs))?;
        Ok(())
    }

    async fn results<W: Write>(&mut self, scrolls: usize, out: &mut W) -> Result<()> {
        self.runtime
            .send_msg(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)));
        self.settle_feed(FeedKind::Matches).await?;
        for _ in 0..scrolls {
            if self.runtime.state().matches.feed.window().reached_end() {
                break;
            }
            self.scroll_to_end(FeedKind::Matches).await?;
        }
        self.print_matches(out)
    }

    fn print_matches<W: Write>(&self, out: &mut W) -> Result<()> {
        let state = self.runtime.state();
        if let Some(error) = &state.matches.error {
            bail!("{error}");
        }
        if state.matches.shows_empty_state() {
            writeln!(
                out,
                "No match results yet. Upload a resume with `jobscroll match <FILE>`."
            )?;
            return Ok(());
        }
        write!(out, "{}", self.renderer.render(&state.matches, Utc::now()))?;
        writeln!(out, "{}", self.renderer.status_line("matches", &state.matches))?;
        Ok(())
    }

    async fn run_match<W: Write>(
        &mut self,
        path: &Path,
        timeout: Duration,
        out: &mut W,
    ) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| eyre!("invalid file name: {}", path.display()))?;
        self.runtime
            .send_msg(Msg::Ui(UiMsg::UploadRequested(ResumeFile::new(name, bytes))));
        self.runtime.run_update_cycle()?;

        let state = self.runtime.state();
        if !state.upload.uploading {
            let message = state
                .matches
                .error
                .clone()
                .unwrap_or_else(|| "Upload was not started".to_string());
            bail!("{message}");
        }
        writeln!(out, "Uploading {name}...")?;

        let started = Instant::now();
        if !self
            .runtime
            .run_until(timeout, |state| !state.upload.uploading)
            .await?
        {
            bail!("upload did not finish within {}s", timeout.as_secs());
        }
        if !self.runtime.state().session.job_in_progress() {
            return self.print_matches(out);
        }

        // polling belongs to the results view, so show it once the job exists
        self.runtime
            .send_msg(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)));
        let finished = self
            .runtime
            .run_until(timeout.saturating_sub(started.elapsed()), |state| {
                !state.session.job_in_progress() && !state.matches.feed.is_loading()
            })
            .await?;
        if !finished {
            bail!("matching did not finish within {}s", timeout.as_secs());
        }
        self.print_matches(out)
    }

    async fn saved<W: Write>(&mut self, toggle: Option<&str>, out: &mut W) -> Result<()> {
        self.runtime
            .send_msg(Msg::Saved(saved::Message::RefreshRequested));
        self.settle(|state| !state.saved.is_listing()).await?;

        // add or remove depends on the listed ids, so toggle after the first listing
        if let Some(job_id) = toggle {
            self.runtime.send_msg(Msg::Ui(UiMsg::SaveToggled {
                job_id: job_id.to_string(),
            }));
            self.settle(|state| !state.saved.is_listing() && !state.saved.has_pending())
                .await?;
        }

        let saved = &self.runtime.state().saved;
        if let Some(error) = saved.error() {
            bail!("{error}");
        }
        if saved.jobs().is_empty() {
            writeln!(out, "No saved jobs.")?;
        }
        for job in saved.jobs() {
            writeln!(out, "{}  {} at {}", job.id, job.title, job.company_name)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
