//! Console loopback platform: prints outbound traffic to stdout and hands
//! out platform-style message ids from one monotonic counter.
//!
//! The counter is shared with the input loop so user and bot messages draw
//! from the same id space, keeping id order chronological.

use std::sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
};

use {async_trait::async_trait, tracing::debug};

use weft_platform::{
    CommandSpec, Error, FileUpload, MAX_MESSAGE_LEN, PlatformClient, RegisteredCommand,
    ReplyTarget, Result,
};

pub struct ConsoleClient {
    next_id: AtomicI64,
    next_command_id: AtomicI64,
    commands: Mutex<Vec<RegisteredCommand>>,
}

impl Default for ConsoleClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleClient {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            next_command_id: AtomicI64::new(1),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Claim the next message id. Also used by the input loop for inbound
    /// messages.
    pub fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn marker(target: &ReplyTarget) -> &'static str {
        if target.is_ephemeral() { " (only you)" } else { "" }
    }
}

#[async_trait]
impl PlatformClient for ConsoleClient {
    async fn defer(&self, invocation_id: i64, ephemeral: bool) -> Result<()> {
        debug!(invocation_id, ephemeral, "deferred acknowledgment");
        println!("... thinking ...");
        Ok(())
    }

    async fn send_text(&self, target: &ReplyTarget, text: &str) -> Result<i64> {
        // Enforce the hard cap the way a real platform would.
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(Error::invalid_input("message exceeds the platform cap"));
        }
        let id = self.allocate_id();
        println!("[{id}]{} {text}", Self::marker(target));
        Ok(id)
    }

    async fn send_file(
        &self,
        target: &ReplyTarget,
        file: FileUpload,
        caption: Option<&str>,
    ) -> Result<i64> {
        let id = self.allocate_id();
        println!(
            "[{id}]{} <attachment {} ({} bytes)> {}",
            Self::marker(target),
            file.filename,
            file.data.len(),
            caption.unwrap_or_default()
        );
        Ok(id)
    }

    async fn register_command(&self, guild_id: i64, spec: &CommandSpec) -> Result<i64> {
        let id = self.next_command_id.fetch_add(1, Ordering::SeqCst);
        let mut commands = self
            .commands
            .lock()
            .map_err(|_| Error::unavailable("command list lock poisoned"))?;
        commands.push(RegisteredCommand {
            id,
            name: spec.name.clone(),
        });
        debug!(guild_id, command = %spec.name, command_id = id, "registered console command");
        Ok(id)
    }

    async fn list_commands(&self, _guild_id: i64) -> Result<Vec<RegisteredCommand>> {
        let commands = self
            .commands
            .lock()
            .map_err(|_| Error::unavailable("command list lock poisoned"))?;
        Ok(commands.clone())
    }

    async fn delete_command(&self, _guild_id: i64, command_id: i64) -> Result<()> {
        let mut commands = self
            .commands
            .lock()
            .map_err(|_| Error::unavailable("command list lock poisoned"))?;
        commands.retain(|c| c.id != command_id);
        Ok(())
    }
}
