use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use color_eyre::eyre::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        cmd::Cmd,
        msg::{ui::UiMsg, Msg},
        state::FeedKind,
    },
    domain::job::JobId,
    infrastructure::api::Services,
    model::{
        feed,
        job_poller,
        saved::{self, Mutation},
    },
};

/// A scroll adjustment the host view should apply after a prepend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCompensation {
    pub feed: FeedKind,
    pub pixels: u64,
}

/// Command executor that turns commands into API calls on spawned tasks
///
/// Every task reports back by sending a [`Msg`] on the runtime's channel; nothing
/// here touches application state.
#[derive(Clone)]
pub struct CmdExecutor {
    services: Services,
    msg_tx: mpsc::UnboundedSender<Msg>,
    scroll_tx: Option<mpsc::UnboundedSender<ScrollCompensation>>,
    /// Cancelled and replaced on every `CancelJobPolling`
    poll_token: Arc<Mutex<CancellationToken>>,
    spawned: Arc<AtomicUsize>,
}

impl CmdExecutor {
    pub fn new(services: Services, msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            services,
            msg_tx,
            scroll_tx: None,
            poll_token: Arc::new(Mutex::new(CancellationToken::new())),
            spawned: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Inject a sender for scroll compensation requests
    pub fn set_scroll_sender(&mut self, sender: mpsc::UnboundedSender<ScrollCompensation>) {
        self.scroll_tx = Some(sender);
    }

    fn poll_token(&self) -> CancellationToken {
        self.poll_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cancel_polling(&self) {
        let mut token = self
            .poll_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = Option<Msg>> + Send + 'static,
    {
        self.spawned.fetch_add(1, Ordering::Relaxed);
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            if let Some(msg) = task.await {
                if tx.send(msg).is_err() {
                    log::debug!("runtime gone; dropping command result");
                }
            }
        });
    }

    /// Execute a single command
    pub fn execute_command(&self, cmd: &Cmd) -> Result<()> {
        match cmd {
            Cmd::None => {}

            Cmd::FetchPage { feed, ticket } => {
                let ticket = ticket.clone();
                match feed {
                    FeedKind::Jobs => {
                        let source = Arc::clone(&self.services.jobs);
                        self.spawn(async move {
                            let result = source.fetch_page(&ticket.request).await;
                            Some(Msg::Jobs(feed::Message::PageLoaded { ticket, result }))
                        });
                    }
                    FeedKind::Matches => {
                        let source = Arc::clone(&self.services.matches);
                        self.spawn(async move {
                            let result = source.fetch_page(&ticket.request).await;
                            Some(Msg::Matches(feed::Message::PageLoaded { ticket, result }))
                        });
                    }
                }
            }

            Cmd::UploadResume { file } => {
                let api = Arc::clone(&self.services.match_jobs);
                let file = file.clone();
                self.spawn(async move {
                    let result = api.upload_resume(&file).await.map(|accepted| accepted.job_id);
                    Some(Msg::Ui(UiMsg::UploadFinished(result)))
                });
            }

            Cmd::PollJobStatus {
                job_id,
                epoch,
                delay_ms,
            } => {
                self.spawn_poll(job_id.clone(), *epoch, Duration::from_millis(*delay_ms));
            }

            Cmd::CancelJobPolling => {
                log::debug!("cancelling job polling");
                self.cancel_polling();
            }

            Cmd::ListSavedJobs => {
                let api = Arc::clone(&self.services.saved);
                self.spawn(async move {
                    Some(Msg::Saved(saved::Message::Listed(api.list_saved().await)))
                });
            }

            Cmd::SaveJob { job_id } => self.spawn_mutation(job_id.clone(), Mutation::Add),
            Cmd::UnsaveJob { job_id } => self.spawn_mutation(job_id.clone(), Mutation::Remove),

            Cmd::CompensateScroll { feed, pixels } => {
                log::trace!("compensating {feed} scroll by {pixels}px");
                if let Some(tx) = &self.scroll_tx {
                    tx.send(ScrollCompensation {
                        feed: *feed,
                        pixels: *pixels,
                    })?;
                }
            }

            Cmd::LogError { message } => {
                log::error!("{message}");
            }

            Cmd::LogInfo { message } => {
                log::info!("{message}");
            }

            Cmd::Batch(commands) => {
                for cmd in commands {
                    self.execute_command(cmd)?;
                }
            }
        }

        Ok(())
    }

    /// Wait `delay`, then ask for the job status unless polling was cancelled meanwhile
    fn spawn_poll(&self, job_id: JobId, epoch: u64, delay: Duration) {
        let token = self.poll_token();
        let api = Arc::clone(&self.services.match_jobs);
        self.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            let result = tokio::select! {
                _ = token.cancelled() => return None,
                result = api.job_status(&job_id) => result,
            };
            if token.is_cancelled() {
                return None;
            }
            Some(Msg::Poller(job_poller::Message::StatusReceived {
                job_id,
                epoch,
                result,
            }))
        });
    }

    fn spawn_mutation(&self, job_id: String, mutation: Mutation) {
        let api = Arc::clone(&self.services.saved);
        self.spawn(async move {
            let result = match mutation {
                Mutation::Add => api.save_job(&job_id).await,
                Mutation::Remove => api.unsave_job(&job_id).await,
            };
            Some(Msg::Saved(saved::Message::MutationFinished { job_id, result }))
        });
    }

    /// Execute multiple commands
    pub fn execute_commands(&self, commands: &[Cmd]) -> Result<Vec<String>> {
        let mut execution_log = Vec::new();

        for cmd in commands {
            match self.execute_command(cmd) {
                Ok(()) => {
                    execution_log.push(format!("✓ Executed: {}", cmd.name()));
                }
                Err(e) => {
                    let error_msg = format!("✗ Failed to execute {}: {}", cmd.name(), e);
                    log::error!("{}", error_msg);
                    execution_log.push(error_msg);
                }
            }
        }

        Ok(execution_log)
    }

    /// Get execution statistics
    pub fn get_stats(&self) -> CmdExecutorStats {
        CmdExecutorStats {
            is_msg_sender_closed: self.msg_tx.is_closed(),
            has_scroll_sender: self.scroll_tx.is_some(),
            spawned_tasks: self.spawned.load(Ordering::Relaxed),
        }
    }
}

/// Command executor statistics
#[derive(Debug, Clone)]
pub struct CmdExecutorStats {
    pub is_msg_sender_closed: bool,
    pub has_scroll_sender: bool,
    pub spawned_tasks: usize,
}
