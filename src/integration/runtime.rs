use std::{collections::VecDeque, time::Duration};

use color_eyre::eyre::{eyre, Result};
use tokio::{sync::mpsc, time::Instant};

use crate::{
    core::{cmd::Cmd, msg::Msg, state::AppState, update::update},
    infrastructure::api::Services,
    integration::cmd_executor::CmdExecutor,
};

/// Owns the application state and applies messages to it, one at a time
pub struct Runtime {
    state: AppState,
    msg_queue: VecDeque<Msg>,
    cmd_queue: VecDeque<Cmd>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    cmd_executor: Option<CmdExecutor>,
    processed_messages: usize,
}

impl Runtime {
    /// Create a new Runtime; commands are queued but never executed
    pub fn new(initial_state: AppState) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        Self {
            state: initial_state,
            msg_queue: VecDeque::new(),
            cmd_queue: VecDeque::new(),
            msg_tx,
            msg_rx,
            cmd_executor: None,
            processed_messages: 0,
        }
    }

    /// Create a new Runtime whose commands run against `services`
    pub fn new_with_executor(initial_state: AppState, services: Services) -> Self {
        let mut runtime = Self::new(initial_state);
        runtime.set_executor(services);
        runtime
    }

    pub fn set_executor(&mut self, services: Services) {
        self.cmd_executor = Some(CmdExecutor::new(services, self.msg_tx.clone()));
    }

    pub fn executor_mut(&mut self) -> Option<&mut CmdExecutor> {
        self.cmd_executor.as_mut()
    }

    /// Get sender for message transmission
    pub fn get_sender(&self) -> mpsc::UnboundedSender<Msg> {
        self.msg_tx.clone()
    }

    /// Get current state (read-only)
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Queue a message for the next cycle
    pub fn send_msg(&mut self, msg: Msg) {
        self.msg_queue.push_back(msg);
    }

    /// Get pending commands
    pub fn pending_commands(&mut self) -> Vec<Cmd> {
        self.cmd_queue.drain(..).collect()
    }

    /// Execute all pending commands using the command executor
    pub fn execute_pending_commands(&mut self) -> Result<Vec<String>> {
        let Some(executor) = self.cmd_executor.clone() else {
            return Err(eyre!(
                "No command executor available. Use set_executor() to configure."
            ));
        };

        let commands = self.pending_commands();
        if commands.is_empty() {
            return Ok(vec![]);
        }
        executor.execute_commands(&commands)
    }

    /// Process a single message
    pub fn process_message(&mut self, msg: Msg) -> Vec<Cmd> {
        if !msg.is_frequent() {
            log::debug!("update: {}", msg.name());
        }
        let (new_state, commands) = update(msg, self.state.clone());
        self.state = new_state;
        self.processed_messages += 1;

        self.cmd_queue.extend(commands.iter().cloned());
        commands
    }

    /// Process all messages in queue
    pub fn process_all_messages(&mut self) -> Vec<Cmd> {
        let mut all_commands = Vec::new();

        // Process domain messages in internal queue
        while let Some(msg) = self.msg_queue.pop_front() {
            all_commands.extend(self.process_message(msg));
        }

        // Process results reported by spawned commands
        while let Ok(msg) = self.msg_rx.try_recv() {
            all_commands.extend(self.process_message(msg));
        }

        all_commands
    }

    /// Process all messages and execute commands in one step
    pub fn run_update_cycle(&mut self) -> Result<Vec<String>> {
        self.process_all_messages();
        self.execute_pending_commands()
    }

    /// Run update cycles until `done` holds, waiting for command results in between
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn run_until<F>(&mut self, timeout: Duration, done: F) -> Result<bool>
    where
        F: Fn(&AppState) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_update_cycle()?;
            if done(&self.state) {
                return Ok(true);
            }
            match tokio::time::timeout_at(deadline, self.msg_rx.recv()).await {
                Ok(Some(msg)) => self.msg_queue.push_back(msg),
                // the runtime holds a sender itself, so the channel never closes
                Ok(None) => return Ok(false),
                Err(_) => return Ok(false),
            }
        }
    }

    /// Get runtime statistics
    pub fn get_stats(&self) -> RuntimeStats {
        RuntimeStats {
            queued_messages: self.msg_queue.len(),
            queued_commands: self.cmd_queue.len(),
            processed_messages: self.processed_messages,
            jobs_count: self.state.jobs.feed.items().len(),
            matches_count: self.state.matches.feed.items().len(),
            job_in_progress: self.state.session.job_in_progress(),
            has_executor: self.cmd_executor.is_some(),
        }
    }
}

/// Runtime statistics
#[derive(Debug, Clone)]
pub struct RuntimeStats {
    pub queued_messages: usize,
    pub queued_commands: usize,
    pub processed_messages: usize,
    pub jobs_count: usize,
    pub matches_count: usize,
    pub job_in_progress: bool,
    pub has_executor: bool,
}
