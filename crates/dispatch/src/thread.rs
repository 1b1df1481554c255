//! Reply-chain reconstruction. The reply graph is the session index: no
//! explicit session or expiry mechanism exists, a reply either extends a
//! tracked conversation or it does not.

use tracing::warn;

use {
    weft_common::{ArgValue, CommandArgs, HistoryEntry, Role, keys},
    weft_platform::MessageRef,
    weft_store::{Conversation, ConversationStore},
};

/// What an inbound reply event turned out to be.
#[derive(Debug)]
pub enum ThreadDecision {
    /// Not a continuation. The referenced message's content/attachment is
    /// carried along as one-shot quoted context; no history is read or
    /// written.
    Fresh {
        quoted_text: Option<String>,
        quoted_image: Option<String>,
    },
    /// Extends a tracked conversation: all of its turns ordered ascending
    /// by id, with the inbound text appended as the final user entry.
    Continuation {
        conversation: Conversation,
        history: Vec<HistoryEntry>,
    },
}

/// Classify a reply event against the store.
///
/// `Ok(None)` means the referenced assistant turn points at a conversation
/// that no longer exists; the event is dropped as a non-fatal inconsistency.
/// An absent turn (store reset, or the message predates the bot) falls back
/// to a fresh invocation deliberately.
pub async fn reconstruct(
    store: &ConversationStore,
    reply_to: &MessageRef,
    inbound_text: &str,
) -> weft_store::Result<Option<ThreadDecision>> {
    let replied = store.find_turn(reply_to.id).await?;

    let assistant_turn = match replied {
        Some(turn) if turn.role == Role::Assistant => turn,
        _ => {
            return Ok(Some(ThreadDecision::Fresh {
                quoted_text: reply_to.content.clone(),
                quoted_image: reply_to.attachment_url.clone(),
            }));
        },
    };

    let Some(conversation) = store
        .find_conversation(assistant_turn.conversation_id)
        .await?
    else {
        warn!(
            turn_id = assistant_turn.id,
            conversation_id = assistant_turn.conversation_id,
            "assistant turn references a missing conversation, dropping event"
        );
        return Ok(None);
    };

    let turns = store.list_turns(conversation.id).await?;
    let mut history: Vec<HistoryEntry> = turns
        .into_iter()
        .filter_map(|turn| {
            turn.content
                .map(|content| HistoryEntry::new(turn.role, content))
        })
        .collect();
    history.push(HistoryEntry::new(Role::User, inbound_text));

    Ok(Some(ThreadDecision::Continuation {
        conversation,
        history,
    }))
}

/// Bag for a continuation. The command and model are sticky for the life of
/// the thread: both come from the conversation row, never from re-parsing
/// the inbound text.
pub fn continuation_args(conversation: &Conversation, history: Vec<HistoryEntry>) -> CommandArgs {
    let mut args = CommandArgs::new(conversation.command.clone());
    if let Some(model) = &conversation.model {
        args.insert(keys::OPT_MODEL, ArgValue::Str(model.clone()));
    }
    args.insert(keys::OPT_CONVERSATION, ArgValue::History(history));
    args
}
