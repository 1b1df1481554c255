use {super::command::Command, std::collections::HashMap};

/// Registry of all loaded command handlers, keyed by lowercase name.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, command: Box<dyn Command>) {
        self.commands.insert(name.to_lowercase(), command);
    }

    /// Resolve a handler by name. An unknown name is not an error here;
    /// the dispatcher decides whether silence or a visible message is due.
    pub fn resolve(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn list(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        weft_common::{CommandArgs, Response},
        weft_platform::PlatformClient,
    };

    struct Echo;

    #[async_trait]
    impl Command for Echo {
        fn is_private(&self, _args: &CommandArgs) -> bool {
            false
        }

        async fn execute(
            &self,
            _client: &dyn PlatformClient,
            args: &CommandArgs,
        ) -> weft_common::Result<Response> {
            Ok(Response::text(args.command().to_string()))
        }
    }

    #[test]
    fn resolve_is_case_normalized_at_registration() {
        let mut registry = CommandRegistry::new();
        registry.register("AI", Box::new(Echo));

        assert!(registry.resolve("ai").is_some());
        assert!(registry.resolve("track").is_none());
    }

    #[test]
    fn list_names_registered_commands() {
        let mut registry = CommandRegistry::new();
        registry.register("ai", Box::new(Echo));
        registry.register("track", Box::new(Echo));

        let mut names = registry.list();
        names.sort_unstable();
        assert_eq!(names, vec!["ai", "track"]);
    }
}
