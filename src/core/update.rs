use crate::{
    core::{
        cmd::Cmd,
        msg::{ui::UiMsg, Msg},
        state::{AppState, FeedKind, FeedView},
    },
    domain::{cursor::Direction, job::MatchResult, page::WindowItem},
    model::{
        feed::{self, Effect as FeedEffect, FeedStatus, FetchKind},
        job_poller::{self, Effect as PollerEffect},
        saved::{self, Effect as SavedEffect, Mutation},
    },
};

const UPLOAD_FAILED_FALLBACK: &str = "Upload failed. Please try again.";

/// Elm-like update function
/// Returns new state and list of commands from current state and message
pub fn update(msg: Msg, mut state: AppState) -> (AppState, Vec<Cmd>) {
    let commands = match msg {
        Msg::Jobs(message) => update_feed(FeedKind::Jobs, &mut state.jobs, message),
        Msg::Matches(message) => update_matches(&mut state, message),
        Msg::Poller(message) => {
            let effects = state.poller.update(message);
            apply_poller_effects(&mut state, effects)
        }
        Msg::Saved(message) => saved_commands(state.saved.update(message)),
        Msg::Ui(ui_msg) => update_ui(ui_msg, &mut state),
    };
    (state, commands)
}

/// Run one feed message and translate its effects
fn update_feed<T: WindowItem>(
    kind: FeedKind,
    view: &mut FeedView<T>,
    message: feed::Message<T>,
) -> Vec<Cmd> {
    let initial_result = matches!(
        &message,
        feed::Message::PageLoaded { ticket, .. }
            if ticket.kind == FetchKind::Initial && ticket.generation == view.feed.generation()
    );

    let effects = view.feed.update(message);

    if initial_result {
        view.error = match view.feed.status() {
            FeedStatus::Failed(error) => Some(error.user_message(kind.load_failed_message())),
            _ => None,
        };
    }
    view.sync_selection();

    effects
        .into_iter()
        .map(|effect| match effect {
            FeedEffect::Fetch(ticket) => Cmd::FetchPage { feed: kind, ticket },
            FeedEffect::Prepended { count } => {
                let pixels = view.grid.compensation_px(count);
                view.viewport.scroll_by(pixels);
                Cmd::CompensateScroll { feed: kind, pixels }
            }
        })
        .collect()
}

/// The match feed additionally honours the session: no initial load while a job runs
fn update_matches(state: &mut AppState, message: feed::Message<MatchResult>) -> Vec<Cmd> {
    if matches!(message, feed::Message::InitialLoadRequested) && state.session.job_in_progress() {
        log::debug!("initial match load skipped: job in progress");
        return vec![];
    }
    let page_loaded = matches!(message, feed::Message::PageLoaded { .. });
    let commands = update_feed(FeedKind::Matches, &mut state.matches, message);
    if page_loaded && !state.matches.feed.is_loading_initial() {
        state
            .session
            .set_total_matches(state.matches.feed.total_count());
    }
    commands
}

fn apply_poller_effects(state: &mut AppState, effects: Vec<PollerEffect>) -> Vec<Cmd> {
    let mut commands = Vec::new();
    for effect in effects {
        match effect {
            PollerEffect::SchedulePoll {
                job_id,
                epoch,
                delay,
            } => {
                commands.push(Cmd::PollJobStatus {
                    job_id,
                    epoch,
                    delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                });
            }
            PollerEffect::CancelPolling => commands.push(Cmd::CancelJobPolling),
            PollerEffect::Completed { job_id } => {
                state.session.clear_job(&job_id);
                state.matches.error = None;
                commands.push(Cmd::LogInfo {
                    message: format!("Match job {job_id} completed"),
                });
                commands.extend(update_matches(state, feed::Message::ResetRequested));
            }
            PollerEffect::Failed { job_id, message } => {
                state.session.clear_job(&job_id);
                state.matches.error = Some(message.clone());
                commands.push(Cmd::LogError {
                    message: format!("Match job {job_id} failed: {message}"),
                });
            }
        }
    }
    commands
}

fn saved_commands(effects: Vec<SavedEffect>) -> Vec<Cmd> {
    effects
        .into_iter()
        .map(|effect| match effect {
            SavedEffect::List => Cmd::ListSavedJobs,
            SavedEffect::Mutate {
                job_id,
                mutation: Mutation::Add,
            } => Cmd::SaveJob { job_id },
            SavedEffect::Mutate {
                job_id,
                mutation: Mutation::Remove,
            } => Cmd::UnsaveJob { job_id },
        })
        .collect()
}

fn update_ui(ui_msg: UiMsg, state: &mut AppState) -> Vec<Cmd> {
    match ui_msg {
        UiMsg::Mounted(FeedKind::Jobs) => {
            state.jobs.mounted = true;
            let mut commands = Vec::new();
            if !state.jobs.feed.is_started() {
                commands.extend(update_feed(
                    FeedKind::Jobs,
                    &mut state.jobs,
                    feed::Message::InitialLoadRequested,
                ));
            }
            commands.extend(saved_commands(
                state.saved.update(saved::Message::RefreshRequested),
            ));
            commands
        }
        UiMsg::Mounted(FeedKind::Matches) => {
            state.matches.mounted = true;
            let mut commands = match state.session.current_job().cloned() {
                Some(job_id) => {
                    let effects = state.poller.update(job_poller::Message::Attached(job_id));
                    apply_poller_effects(state, effects)
                }
                None if !state.matches.feed.is_started() => {
                    update_matches(state, feed::Message::InitialLoadRequested)
                }
                None => vec![],
            };
            commands.extend(saved_commands(
                state.saved.update(saved::Message::RefreshRequested),
            ));
            commands
        }
        UiMsg::Unmounted(FeedKind::Jobs) => {
            state.jobs.mounted = false;
            state.jobs.select(None);
            update_feed(FeedKind::Jobs, &mut state.jobs, feed::Message::Detached)
        }
        UiMsg::Unmounted(FeedKind::Matches) => {
            state.matches.mounted = false;
            state.matches.select(None);
            let effects = state.poller.update(job_poller::Message::Detached);
            let mut commands = apply_poller_effects(state, effects);
            commands.extend(update_matches(state, feed::Message::Detached));
            commands
        }
        UiMsg::Scrolled { feed, scroll_top } => match feed {
            FeedKind::Jobs => {
                state.jobs.scroll_to(scroll_top);
                match state.jobs.scroll_trigger() {
                    Some(direction) => {
                        update_feed(FeedKind::Jobs, &mut state.jobs, page_request(direction))
                    }
                    None => vec![],
                }
            }
            FeedKind::Matches => {
                state.matches.scroll_to(scroll_top);
                match state.matches.scroll_trigger() {
                    Some(direction) => update_matches(state, page_request(direction)),
                    None => vec![],
                }
            }
        },
        UiMsg::ViewportResized { feed, height } => {
            match feed {
                FeedKind::Jobs => state.jobs.viewport.height = height,
                FeedKind::Matches => state.matches.viewport.height = height,
            }
            vec![]
        }
        UiMsg::ItemSelected { feed, index } => {
            match feed {
                FeedKind::Jobs => state.jobs.select(index),
                FeedKind::Matches => state.matches.select(index),
            }
            vec![]
        }
        UiMsg::SaveToggled { job_id } => {
            saved_commands(state.saved.update(saved::Message::ToggleRequested(job_id)))
        }
        UiMsg::UploadRequested(file) => {
            if !state.can_upload() {
                return vec![Cmd::LogInfo {
                    message: "Upload ignored: a match job is already running".to_string(),
                }];
            }
            match state.upload.policy.validate(&file) {
                Ok(()) => {
                    state.upload.uploading = true;
                    state.matches.error = None;
                    vec![Cmd::UploadResume { file }]
                }
                Err(error) => {
                    state.matches.error = Some(error.to_string());
                    vec![]
                }
            }
        }
        UiMsg::UploadFinished(Ok(job_id)) => {
            state.upload.uploading = false;
            state.session.set_job(job_id.clone());
            // an unmounted view picks the job up from the session when it attaches
            if !state.matches.mounted {
                log::debug!("job {job_id} accepted while results are not shown");
                return vec![];
            }
            let effects = state.poller.update(job_poller::Message::JobAccepted(job_id));
            apply_poller_effects(state, effects)
        }
        UiMsg::UploadFinished(Err(error)) => {
            state.upload.uploading = false;
            log::warn!("resume upload failed: {error}");
            state.matches.error = Some(error.user_message(UPLOAD_FAILED_FALLBACK));
            vec![]
        }
        UiMsg::ErrorDismissed(FeedKind::Jobs) => {
            state.jobs.error = None;
            if matches!(state.jobs.feed.status(), FeedStatus::Failed(_)) {
                update_feed(FeedKind::Jobs, &mut state.jobs, feed::Message::ResetRequested)
            } else {
                vec![]
            }
        }
        UiMsg::ErrorDismissed(FeedKind::Matches) => {
            state.matches.error = None;
            if matches!(state.matches.feed.status(), FeedStatus::Failed(_))
                && !state.session.job_in_progress()
            {
                update_matches(state, feed::Message::ResetRequested)
            } else {
                vec![]
            }
        }
        UiMsg::SignedOut => {
            state.session.sign_out();
            let effects = state.poller.update(job_poller::Message::Detached);
            let mut commands = apply_poller_effects(state, effects);
            state.jobs.select(None);
            state.matches.select(None);
            commands.extend(update_feed(
                FeedKind::Jobs,
                &mut state.jobs,
                feed::Message::Detached,
            ));
            commands.extend(update_matches(state, feed::Message::Detached));
            state.jobs.error = None;
            state.matches.error = None;
            state.saved = saved::SavedJobs::default();
            state.upload.uploading = false;
            commands
        }
    }
}

fn page_request<T>(direction: Direction) -> feed::Message<T> {
    match direction {
        Direction::Next => feed::Message::NextPageRequested,
        Direction::Prev => feed::Message::PrevPageRequested,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        domain::{
            cursor::Cursor,
            error::ApiError,
            job::{JobId, JobStatus, JobStatusResponse},
            page::Page,
            upload::ResumeFile,
        },
        infrastructure::{
            config::Config,
            memory::{sample_listing, sample_match},
        },
        model::feed::FetchTicket,
    };

    fn create_test_state() -> AppState {
        AppState::new(&Config::default()).unwrap()
    }

    fn only_fetch(commands: &[Cmd]) -> FetchTicket {
        let tickets: Vec<&FetchTicket> = commands
            .iter()
            .filter_map(|cmd| match cmd {
                Cmd::FetchPage { ticket, .. } => Some(ticket),
                _ => None,
            })
            .collect();
        assert_eq!(tickets.len(), 1, "commands: {commands:?}");
        tickets[0].clone()
    }

    /// Results view shown without a feed load in flight
    fn mounted_state() -> AppState {
        let mut state = create_test_state();
        state.matches.mounted = true;
        state
    }

    fn status(job_id: &str, epoch: u64, status: JobStatus) -> Msg {
        Msg::Poller(job_poller::Message::StatusReceived {
            job_id: JobId::new(job_id),
            epoch,
            result: Ok(JobStatusResponse {
                job_id: JobId::new(job_id),
                status,
                error: None,
            }),
        })
    }

    fn matches_page(range: std::ops::Range<usize>, total: u64) -> Page<MatchResult> {
        let next = (range.end < total as usize).then(|| Cursor::from_offset(range.end));
        Page::new(range.map(sample_match).collect(), next).with_total_count(Some(total))
    }

    #[test]
    fn test_mount_jobs_loads_first_page_and_saved() {
        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Jobs)), create_test_state());

        assert!(state.jobs.mounted);
        let ticket = only_fetch(&cmds);
        assert_eq!(ticket.kind, FetchKind::Initial);
        assert!(cmds.contains(&Cmd::ListSavedJobs));

        // remounting does not reload
        let (_, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Jobs)), state);
        assert!(cmds.iter().all(|cmd| !matches!(cmd, Cmd::FetchPage { .. })));
    }

    #[test]
    fn test_scroll_near_bottom_loads_next_page() {
        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Jobs)), create_test_state());
        let ticket = only_fetch(&cmds);
        let page = Page::new(
            (0..50).map(sample_listing).collect(),
            Some(Cursor::new("2024-01-01T00:00:00Z,job-49")),
        );
        let (state, _) = update(
            Msg::Jobs(feed::Message::PageLoaded {
                ticket,
                result: Ok(page),
            }),
            state,
        );

        let (state, cmds) = update(
            Msg::Ui(UiMsg::Scrolled {
                feed: FeedKind::Jobs,
                scroll_top: 4000,
            }),
            state,
        );
        let ticket = only_fetch(&cmds);
        assert_eq!(ticket.kind, FetchKind::Next);
        assert_eq!(
            ticket.request.cursor,
            Some(Cursor::new("2024-01-01T00:00:00Z,job-49"))
        );

        // a second scroll event while pending is deduplicated
        let (_, cmds) = update(
            Msg::Ui(UiMsg::Scrolled {
                feed: FeedKind::Jobs,
                scroll_top: 4100,
            }),
            state,
        );
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_initial_failure_sets_banner_and_dismiss_retries() {
        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Jobs)), create_test_state());
        let ticket = only_fetch(&cmds);
        let (state, _) = update(
            Msg::Jobs(feed::Message::PageLoaded {
                ticket,
                result: Err(ApiError::Transport("refused".into())),
            }),
            state,
        );
        assert_eq!(state.jobs.error.as_deref(), Some("Failed to load jobs."));

        let (state, cmds) = update(Msg::Ui(UiMsg::ErrorDismissed(FeedKind::Jobs)), state);
        assert_eq!(state.jobs.error, None);
        assert_eq!(only_fetch(&cmds).kind, FetchKind::Initial);
    }

    #[test]
    fn test_matches_not_found_is_neutral() {
        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)), create_test_state());
        let ticket = only_fetch(&cmds);
        let (state, _) = update(
            Msg::Matches(feed::Message::PageLoaded {
                ticket,
                result: Err(ApiError::NotFound("No results".into())),
            }),
            state,
        );
        assert_eq!(state.matches.error, None);
        assert!(state.matches.shows_empty_state());
        assert_eq!(state.session.total_matches(), None);
    }

    #[test]
    fn test_upload_validation_never_reaches_network() {
        let file = ResumeFile::new("photo.png", vec![1, 2, 3]);
        let (state, cmds) = update(Msg::Ui(UiMsg::UploadRequested(file)), create_test_state());
        assert!(cmds.is_empty());
        assert_eq!(
            state.matches.error.as_deref(),
            Some("Please upload a PDF, DOCX, or TXT file")
        );
        assert!(!state.upload.uploading);
    }

    #[test]
    fn test_upload_failure_message() {
        let file = ResumeFile::new("cv.pdf", vec![1, 2, 3]);
        let (state, cmds) = update(
            Msg::Ui(UiMsg::UploadRequested(file.clone())),
            create_test_state(),
        );
        assert_eq!(cmds, vec![Cmd::UploadResume { file }]);
        assert!(!state.can_upload());

        let (state, _) = update(
            Msg::Ui(UiMsg::UploadFinished(Err(ApiError::Transport("reset".into())))),
            state,
        );
        assert_eq!(
            state.matches.error.as_deref(),
            Some("Upload failed. Please try again.")
        );
        assert!(state.can_upload());
    }

    #[test]
    fn test_job_lifecycle_completed_reloads_once() {
        let (state, cmds) = update(
            Msg::Ui(UiMsg::UploadFinished(Ok(JobId::new("j1")))),
            mounted_state(),
        );
        assert_eq!(
            cmds,
            vec![Cmd::PollJobStatus {
                job_id: JobId::new("j1"),
                epoch: 1,
                delay_ms: 0
            }]
        );
        assert!(state.session.job_in_progress());

        // initial load is suppressed while the job runs
        let (state, cmds) = update(Msg::Matches(feed::Message::InitialLoadRequested), state);
        assert!(cmds.is_empty());

        let (state, cmds) = update(status("j1", 1, JobStatus::Processing), state);
        assert_eq!(
            cmds,
            vec![Cmd::PollJobStatus {
                job_id: JobId::new("j1"),
                epoch: 1,
                delay_ms: 1500
            }]
        );

        let (state, cmds) = update(status("j1", 1, JobStatus::Completed), state);
        assert!(!state.session.job_in_progress());
        let ticket = only_fetch(&cmds);
        assert_eq!(ticket.kind, FetchKind::Initial);
        assert!(cmds.iter().all(|cmd| !matches!(cmd, Cmd::PollJobStatus { .. })));

        let (state, _) = update(
            Msg::Matches(feed::Message::PageLoaded {
                ticket,
                result: Ok(matches_page(0..50, 120)),
            }),
            state,
        );
        assert_eq!(state.matches.feed.items().len(), 50);
        assert_eq!(state.session.total_matches(), Some(120));

        // a late duplicate completion is ignored
        let (_, cmds) = update(status("j1", 1, JobStatus::Completed), state);
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_job_failure_surfaces_error() {
        let (state, _) = update(
            Msg::Ui(UiMsg::UploadFinished(Ok(JobId::new("j1")))),
            mounted_state(),
        );
        let (state, cmds) = update(
            Msg::Poller(job_poller::Message::StatusReceived {
                job_id: JobId::new("j1"),
                epoch: 1,
                result: Ok(JobStatusResponse {
                    job_id: JobId::new("j1"),
                    status: JobStatus::Failed,
                    error: Some("Could not parse resume".into()),
                }),
            }),
            state,
        );
        assert!(!state.session.job_in_progress());
        assert_eq!(
            state.matches.error.as_deref(),
            Some("Could not parse resume")
        );
        assert!(cmds.iter().all(|cmd| !matches!(
            cmd,
            Cmd::PollJobStatus { .. } | Cmd::FetchPage { .. }
        )));
    }

    #[test]
    fn test_remount_resumes_polling_from_session() {
        let (state, _) = update(
            Msg::Ui(UiMsg::UploadFinished(Ok(JobId::new("j1")))),
            mounted_state(),
        );
        let (state, cmds) = update(Msg::Ui(UiMsg::Unmounted(FeedKind::Matches)), state);
        assert!(cmds.contains(&Cmd::CancelJobPolling));
        assert!(state.session.job_in_progress());

        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)), state);
        assert!(cmds.contains(&Cmd::PollJobStatus {
            job_id: JobId::new("j1"),
            epoch: 2,
            delay_ms: 0
        }));
        assert!(cmds.iter().all(|cmd| !matches!(cmd, Cmd::FetchPage { .. })));
        assert!(state.poller.is_in_flight());
    }

    #[test]
    fn test_status_queued_before_unmount_is_dropped_after_remount() {
        let (state, _) = update(
            Msg::Ui(UiMsg::UploadFinished(Ok(JobId::new("j1")))),
            mounted_state(),
        );
        let (state, _) = update(Msg::Ui(UiMsg::Unmounted(FeedKind::Matches)), state);
        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)), state);
        let polls = |cmds: &[Cmd]| {
            cmds.iter()
                .filter(|cmd| matches!(cmd, Cmd::PollJobStatus { .. }))
                .count()
        };
        assert_eq!(polls(&cmds), 1);

        // answer to the poll scheduled before the unmount
        let (state, cmds) = update(status("j1", 1, JobStatus::Processing), state);
        assert!(cmds.is_empty());
        let (state, cmds) = update(status("j1", 1, JobStatus::Completed), state);
        assert!(cmds.is_empty());
        assert!(state.session.job_in_progress());

        let (state, cmds) = update(status("j1", 2, JobStatus::Processing), state);
        assert_eq!(
            cmds,
            vec![Cmd::PollJobStatus {
                job_id: JobId::new("j1"),
                epoch: 2,
                delay_ms: 1500
            }]
        );
        assert!(state.poller.is_in_flight());
    }

    #[test]
    fn test_upload_finishing_while_unmounted_waits_for_mount() {
        let (state, _) = update(Msg::Ui(UiMsg::Unmounted(FeedKind::Matches)), mounted_state());
        let (state, cmds) = update(
            Msg::Ui(UiMsg::UploadFinished(Ok(JobId::new("j1")))),
            state,
        );
        assert!(cmds.is_empty());
        assert_eq!(state.session.current_job(), Some(&JobId::new("j1")));
        assert!(!state.upload.uploading);
        assert!(!state.poller.is_in_flight());

        let (state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)), state);
        assert!(cmds.contains(&Cmd::PollJobStatus {
            job_id: JobId::new("j1"),
            epoch: 1,
            delay_ms: 0
        }));
        assert!(cmds.iter().all(|cmd| !matches!(cmd, Cmd::FetchPage { .. })));
        assert!(state.poller.is_in_flight());
    }

    #[test]
    fn test_prepend_compensates_scroll() {
        let mut state = create_test_state();
        // matches feed with window cap 500: walk forward until the head is trimmed
        let (next_state, cmds) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Matches)), state);
        state = next_state;
        let mut ticket = only_fetch(&cmds);
        let mut start = 0;
        loop {
            let (next_state, _) = update(
                Msg::Matches(feed::Message::PageLoaded {
                    ticket: ticket.clone(),
                    result: Ok(matches_page(start..start + 50, 1000)),
                }),
                state,
            );
            state = next_state;
            start += 50;
            if start == 550 {
                break;
            }
            let (next_state, cmds) = update(Msg::Matches(feed::Message::NextPageRequested), state);
            state = next_state;
            ticket = only_fetch(&cmds);
        }
        assert_eq!(state.matches.feed.window().start_offset(), 50);

        let before = state.matches.viewport.scroll_top;
        let (state, cmds) = update(Msg::Matches(feed::Message::PrevPageRequested), state);
        let ticket = only_fetch(&cmds);
        assert_eq!(ticket.request.cursor, Some(Cursor::new("50")));
        let (state, cmds) = update(
            Msg::Matches(feed::Message::PageLoaded {
                ticket,
                result: Ok(matches_page(0..50, 1000)),
            }),
            state,
        );
        // 50 items in 3 columns = 17 rows of 280px
        assert_eq!(
            cmds,
            vec![Cmd::CompensateScroll {
                feed: FeedKind::Matches,
                pixels: 4760
            }]
        );
        assert_eq!(state.matches.viewport.scroll_top, before + 4760);
        assert!(state.matches.feed.window().reached_start());
    }

    #[test]
    fn test_sign_out_clears_session_and_cancels() {
        let (state, _) = update(
            Msg::Ui(UiMsg::UploadFinished(Ok(JobId::new("j1")))),
            mounted_state(),
        );
        let (state, cmds) = update(Msg::Ui(UiMsg::SignedOut), state);
        assert!(cmds.contains(&Cmd::CancelJobPolling));
        assert!(!state.session.job_in_progress());
        assert!(!state.poller.is_in_flight());
    }

    #[test]
    fn test_save_toggle_round_trip() {
        let (state, cmds) = update(
            Msg::Ui(UiMsg::SaveToggled {
                job_id: "job-1".into(),
            }),
            create_test_state(),
        );
        assert_eq!(
            cmds,
            vec![Cmd::SaveJob {
                job_id: "job-1".into()
            }]
        );
        let (state, cmds) = update(
            Msg::Saved(saved::Message::MutationFinished {
                job_id: "job-1".into(),
                result: Ok(()),
            }),
            state,
        );
        assert_eq!(cmds, vec![Cmd::ListSavedJobs]);
        assert!(state.saved.is_saved("job-1"));
    }
}
