//! Shared stubs for handler tests.

use {
    async_trait::async_trait,
    std::sync::Mutex,
    weft_platform::{
        CommandSpec, FileUpload, PlatformClient, RegisteredCommand, ReplyTarget, Result,
    },
};

/// Platform stub that records command management calls and answers
/// everything else with fixed ids.
#[derive(Default)]
pub(crate) struct StubPlatform {
    pub registered: Mutex<Vec<(i64, String)>>,
    pub deleted: Mutex<Vec<(i64, i64)>>,
    pub existing: Vec<RegisteredCommand>,
}

#[async_trait]
impl PlatformClient for StubPlatform {
    async fn defer(&self, _invocation_id: i64, _ephemeral: bool) -> Result<()> {
        Ok(())
    }

    async fn send_text(&self, _target: &ReplyTarget, _text: &str) -> Result<i64> {
        Ok(1)
    }

    async fn send_file(
        &self,
        _target: &ReplyTarget,
        _file: FileUpload,
        _caption: Option<&str>,
    ) -> Result<i64> {
        Ok(1)
    }

    async fn register_command(&self, guild_id: i64, spec: &CommandSpec) -> Result<i64> {
        self.registered
            .lock()
            .unwrap()
            .push((guild_id, spec.name.clone()));
        Ok(42)
    }

    async fn list_commands(&self, _guild_id: i64) -> Result<Vec<RegisteredCommand>> {
        Ok(self.existing.clone())
    }

    async fn delete_command(&self, guild_id: i64, command_id: i64) -> Result<()> {
        self.deleted.lock().unwrap().push((guild_id, command_id));
        Ok(())
    }
}
