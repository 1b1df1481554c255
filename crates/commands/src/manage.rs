//! The `manage-command` command: register or delete named platform commands
//! in a guild scope.

use {
    async_trait::async_trait,
    tracing::info,
    weft_common::{keys, CommandArgs, Error, Response},
    weft_platform::{CommandSpec, OptionKind, OptionSpec, PlatformClient},
};

use crate::command::Command;

pub struct ManageCommand;

#[async_trait]
impl Command for ManageCommand {
    fn is_private(&self, _args: &CommandArgs) -> bool {
        true
    }

    async fn execute(
        &self,
        client: &dyn PlatformClient,
        args: &CommandArgs,
    ) -> weft_common::Result<Response> {
        let guild_id = args
            .opt_str(keys::OPT_GUILD_ID)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(0);
        if guild_id <= 0 {
            return Ok(Response::failure(format!(
                "Guild {guild_id} is an invalid guild"
            )));
        }

        let Ok(Some(name)) = args.opt_str(keys::OPT_COMMAND_NAME) else {
            return Ok(Response::failure(format!(
                "{} is required.",
                keys::OPT_COMMAND_NAME
            )));
        };
        let action = args.opt_str(keys::OPT_ACTION).ok().flatten().unwrap_or("");

        match action {
            keys::ACTION_ADD => add_command(client, guild_id, name).await,
            keys::ACTION_DELETE => delete_command(client, guild_id, name).await,
            other => Ok(Response::failure(format!("Invalid action {other}"))),
        }
    }
}

async fn add_command(
    client: &dyn PlatformClient,
    guild_id: i64,
    name: &str,
) -> weft_common::Result<Response> {
    let Some(spec) = registrable_commands().into_iter().find(|s| s.name == name) else {
        return Ok(Response::failure(format!(
            "Command {name} can't be added to a guild"
        )));
    };

    let command_id = client
        .register_command(guild_id, &spec)
        .await
        .map_err(Error::other)?;
    info!(guild_id, command_id, name, "registered guild command");
    Ok(Response::text(format!(
        "Command {name} created for guild {guild_id}"
    )))
}

async fn delete_command(
    client: &dyn PlatformClient,
    guild_id: i64,
    name: &str,
) -> weft_common::Result<Response> {
    if name.eq_ignore_ascii_case(keys::CMD_MANAGE) {
        return Ok(Response::failure(format!(
            "{name} is a required command and can't be deleted"
        )));
    }

    let commands = client.list_commands(guild_id).await.map_err(Error::other)?;
    if let Some(command) = commands.into_iter().find(|c| c.name == name) {
        client
            .delete_command(guild_id, command.id)
            .await
            .map_err(Error::other)?;
        info!(guild_id, command_id = command.id, name, "deleted guild command");
    }
    Ok(Response::text("Command deleted"))
}

/// Declarations for the commands an administrator may add to a guild.
fn registrable_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: keys::CMD_AI.into(),
            description: "Talk or ask to draw an image. This command supports reply \
                          continuation."
                .into(),
            options: vec![
                OptionSpec {
                    name: keys::OPT_MESSAGE.into(),
                    description: "What do you want to ask?".into(),
                    required: true,
                    kind: OptionKind::String,
                    choices: vec![],
                },
                OptionSpec {
                    name: keys::OPT_PRIVATE.into(),
                    description: "Show the reply only to you?".into(),
                    required: false,
                    kind: OptionKind::Boolean,
                    choices: vec![],
                },
                OptionSpec {
                    name: keys::OPT_MODEL.into(),
                    description: "Language model. Default is the 3.5 tier".into(),
                    required: false,
                    kind: OptionKind::String,
                    choices: vec![
                        ("GPT 3.5 Turbo".into(), keys::MODEL_DEFAULT.into()),
                        ("GPT 4 Turbo".into(), keys::MODEL_LARGE.into()),
                    ],
                },
            ],
        },
        CommandSpec {
            name: keys::CMD_TRACK.into(),
            description: "Track a shipment by waybill number".into(),
            options: vec![OptionSpec {
                name: keys::OPT_TRACKING_NUMBER.into(),
                description: "Tracking number".into(),
                required: true,
                kind: OptionKind::String,
                choices: vec![],
            }],
        },
    ]
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_util::StubPlatform,
        weft_common::ArgValue,
        weft_platform::RegisteredCommand,
    };

    fn args(guild: &str, action: &str, name: &str) -> CommandArgs {
        let mut args = CommandArgs::new(keys::CMD_MANAGE);
        args.insert(keys::OPT_GUILD_ID, ArgValue::Str(guild.into()));
        args.insert(keys::OPT_ACTION, ArgValue::Str(action.into()));
        args.insert(keys::OPT_COMMAND_NAME, ArgValue::Str(name.into()));
        args
    }

    #[tokio::test]
    async fn add_registers_a_known_command() {
        let platform = StubPlatform::default();
        let response = ManageCommand
            .execute(&platform, &args("42", keys::ACTION_ADD, keys::CMD_AI))
            .await
            .unwrap();

        assert_eq!(
            response,
            Response::text("Command ai created for guild 42")
        );
        assert_eq!(
            platform.registered.lock().unwrap().as_slice(),
            &[(42, "ai".to_string())]
        );
    }

    #[tokio::test]
    async fn delete_refuses_the_management_command() {
        let platform = StubPlatform::default();
        let response = ManageCommand
            .execute(&platform, &args("42", keys::ACTION_DELETE, keys::CMD_MANAGE))
            .await
            .unwrap();

        assert_eq!(
            response,
            Response::failure("manage-command is a required command and can't be deleted")
        );
        assert!(platform.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_a_listed_command() {
        let platform = StubPlatform {
            existing: vec![RegisteredCommand {
                id: 7,
                name: "track".into(),
            }],
            ..StubPlatform::default()
        };
        let response = ManageCommand
            .execute(&platform, &args("42", keys::ACTION_DELETE, keys::CMD_TRACK))
            .await
            .unwrap();

        assert_eq!(response, Response::text("Command deleted"));
        assert_eq!(platform.deleted.lock().unwrap().as_slice(), &[(42, 7)]);
    }

    #[tokio::test]
    async fn invalid_guild_is_rejected() {
        let platform = StubPlatform::default();
        let response = ManageCommand
            .execute(&platform, &args("not-a-guild", keys::ACTION_ADD, keys::CMD_AI))
            .await
            .unwrap();

        assert_eq!(response, Response::failure("Guild 0 is an invalid guild"));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let platform = StubPlatform::default();
        let response = ManageCommand
            .execute(&platform, &args("42", "Rename", keys::CMD_AI))
            .await
            .unwrap();

        assert_eq!(response, Response::failure("Invalid action Rename"));
    }
}
