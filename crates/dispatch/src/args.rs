//! Normalization of raw invocation shapes into the argument bag.

use {
    weft_common::{ArgValue, CommandArgs, keys},
    weft_platform::{CommandOption, OptionValue},
};

const SEPARATORS: [char; 3] = [',', ' ', ':'];

/// The command name of a free-text message: the first non-empty token on
/// comma/space/colon boundaries, lowercased. `None` when the text carries
/// no token at all.
pub fn command_token(text: &str) -> Option<String> {
    text.split(SEPARATORS)
        .find(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Everything after the first space, trimmed: the `message` argument of a
/// free-text invocation. `None` when blank.
pub fn message_remainder(text: &str) -> Option<&str> {
    let (_, rest) = text.trim_start().split_once(' ')?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Bag for a free-text invocation.
pub fn free_text_args(command: &str, message: &str) -> CommandArgs {
    let mut args = CommandArgs::new(command);
    args.insert(keys::OPT_MESSAGE, ArgValue::Str(message.to_string()));
    args
}

/// Direct projection of a structured invocation's ordered option list.
pub fn from_options(name: &str, options: &[CommandOption]) -> CommandArgs {
    let mut args = CommandArgs::new(name.to_lowercase());
    for option in options {
        let value = match &option.value {
            OptionValue::Str(s) => ArgValue::Str(s.clone()),
            OptionValue::Bool(b) => ArgValue::Bool(*b),
            OptionValue::Int(i) => ArgValue::Int(*i),
            OptionValue::Float(f) => ArgValue::Float(*f),
        };
        args.insert(option.name.clone(), value);
    }
    args
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_token_lowercases_and_skips_leading_separators() {
        assert_eq!(command_token("AI hello"), Some("ai".into()));
        assert_eq!(command_token(" ,ai: hello"), Some("ai".into()));
        assert_eq!(command_token("ai"), Some("ai".into()));
        assert_eq!(command_token("   "), None);
        assert_eq!(command_token(""), None);
    }

    #[test]
    fn message_remainder_is_everything_after_the_first_space() {
        assert_eq!(message_remainder("ai what is rust?"), Some("what is rust?"));
        assert_eq!(message_remainder("ai: tell me, more"), Some("tell me, more"));
        assert_eq!(message_remainder("ai"), None);
        assert_eq!(message_remainder("ai    "), None);
    }

    #[test]
    fn options_project_with_their_types() {
        let options = vec![
            CommandOption {
                name: keys::OPT_MESSAGE.into(),
                value: OptionValue::Str("hello".into()),
            },
            CommandOption {
                name: keys::OPT_PRIVATE.into(),
                value: OptionValue::Bool(true),
            },
        ];

        let args = from_options("AI", &options);
        assert_eq!(args.command(), "ai");
        assert_eq!(args.str(keys::OPT_MESSAGE).unwrap(), "hello");
        assert!(args.is_private());
    }

    #[test]
    fn later_options_overwrite_earlier_ones() {
        let options = vec![
            CommandOption {
                name: keys::OPT_MODEL.into(),
                value: OptionValue::Str(keys::MODEL_DEFAULT.into()),
            },
            CommandOption {
                name: keys::OPT_MODEL.into(),
                value: OptionValue::Str(keys::MODEL_LARGE.into()),
            },
        ];

        let args = from_options("ai", &options);
        assert_eq!(args.str(keys::OPT_MODEL).unwrap(), keys::MODEL_LARGE);
    }
}
