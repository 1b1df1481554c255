//! Fixed vocabulary for command names and argument-bag keys.
//!
//! Downstream steps (attachment detection, quoted-context injection, thread
//! reconstruction) add keys to the bag without removing existing ones, so the
//! full set of keys any handler can observe is listed here.

// Command names
pub const CMD_AI: &str = "ai";
pub const CMD_TRANSLATE: &str = "translate";
pub const CMD_TRACK: &str = "track";
pub const CMD_MANAGE: &str = "manage-command";

// Options shared across commands
pub const OPT_MESSAGE: &str = "message";
pub const OPT_PRIVATE: &str = "private";
pub const OPT_MODEL: &str = "model";

// Injected by the dispatcher/thread reconstructor
pub const OPT_CONVERSATION: &str = "conversation";
pub const OPT_QUOTED_TEXT: &str = "quoted-message-text";
pub const OPT_IMAGE_URL: &str = "image-url";

// manage-command options
pub const OPT_ACTION: &str = "action";
pub const OPT_GUILD_ID: &str = "guild-id";
pub const OPT_COMMAND_NAME: &str = "command-name";
pub const ACTION_ADD: &str = "Add";
pub const ACTION_DELETE: &str = "Delete";

// track options
pub const OPT_TRACKING_NUMBER: &str = "tracking-number";

// Language model choices
pub const MODEL_DEFAULT: &str = "gpt-3.5-turbo-1106";
pub const MODEL_LARGE: &str = "gpt-4-1106-preview";
