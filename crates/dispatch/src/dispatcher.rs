//! The per-event state machine: classify, normalize, resolve, invoke,
//! reply, persist.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use {
    weft_commands::CommandRegistry,
    weft_common::{ArgValue, CommandArgs, Role, keys},
    weft_platform::{
        CommandInvocation, ContextMenuInvocation, InboundEvent, InboundMessage, MessageAttachment,
        PlatformClient, ReplyTarget,
    },
    weft_store::{Conversation, ConversationStore},
};

use crate::{
    args,
    error::{Error, Result},
    reply::Replier,
    thread::{self, ThreadDecision},
};

/// Routes inbound events to handlers. One instance serves the whole
/// connection; each event runs in its own task.
pub struct Dispatcher {
    registry: CommandRegistry,
    store: ConversationStore,
    client: Arc<dyn PlatformClient>,
    replier: Replier,
}

impl Dispatcher {
    pub fn new(
        registry: CommandRegistry,
        store: ConversationStore,
        client: Arc<dyn PlatformClient>,
    ) -> Self {
        let replier = Replier::new(store.clone());
        Self {
            registry,
            store,
            client,
            replier,
        }
    }

    /// Entry point from the gateway. Spawns so a slow handler never delays
    /// the next inbound event.
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.handle_event(event).await })
    }

    /// Run one event to completion. Terminal on reply-sent or logged
    /// failure; errors never escape to the delivery loop.
    pub async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::Invocation(invocation) => {
                if let Err(err) = self.handle_invocation(&invocation).await {
                    warn!(command = %invocation.name, error = %err, "invocation failed");
                    let target = ReplyTarget::Invocation {
                        id: invocation.id,
                        ephemeral: true,
                    };
                    self.send_error(&target, &err, &invocation.name).await;
                }
            },
            InboundEvent::Message(message) => {
                if message.author_is_bot {
                    debug!(message_id = message.id, "ignoring bot-authored message");
                    return;
                }
                if let Err(err) = self.handle_message(&message).await {
                    // Free-text chatter that resolves to no handler stays
                    // silent; everything else earns a visible reply.
                    if matches!(err, Error::UnknownCommand { .. }) {
                        debug!(message_id = message.id, "no handler for free-text message");
                        return;
                    }
                    warn!(message_id = message.id, error = %err, "message dispatch failed");
                    let target = ReplyTarget::Channel {
                        channel_id: message.channel_id,
                        reply_to: Some(message.id),
                    };
                    let command = args::command_token(&message.content).unwrap_or_default();
                    self.send_error(&target, &err, &command).await;
                }
            },
            InboundEvent::ContextMenu(menu) => {
                if let Err(err) = self.handle_context_menu(&menu).await {
                    warn!(command = %menu.command, error = %err, "context-menu invocation failed");
                    let target = ReplyTarget::Invocation {
                        id: menu.id,
                        ephemeral: true,
                    };
                    self.send_error(&target, &err, &menu.command).await;
                }
            },
        }
    }

    async fn handle_invocation(&self, invocation: &CommandInvocation) -> Result<()> {
        let bag = args::from_options(&invocation.name, &invocation.options);
        let command = self
            .registry
            .resolve(bag.command())
            .ok_or_else(|| Error::UnknownCommand {
                name: bag.command().to_string(),
            })?;

        // Privacy is fixed by the deferred ack and cannot change mid-flight.
        let ephemeral = command.is_private(&bag);
        self.client.defer(invocation.id, ephemeral).await?;
        info!(command = %bag.command(), invocation_id = invocation.id, ephemeral, "dispatching invocation");

        if !ephemeral && !self.seed_conversation(invocation.id, &bag, &[]).await {
            return Ok(());
        }

        let target = ReplyTarget::Invocation {
            id: invocation.id,
            ephemeral,
        };
        let response = command.execute(self.client.as_ref(), &bag).await?;
        self.replier
            .deliver(self.client.as_ref(), &target, &response)
            .await
    }

    async fn handle_message(&self, message: &InboundMessage) -> Result<()> {
        // Redelivery guard: a message id already persisted as a turn was
        // fully handled. Best-effort, the seed transaction backstops races.
        match self.store.find_turn(message.id).await {
            Ok(Some(_)) => {
                debug!(message_id = message.id, "duplicate delivery, already handled");
                return Ok(());
            },
            Ok(None) => {},
            Err(err) => {
                warn!(message_id = message.id, error = %err, "redelivery check failed");
            },
        }

        if let Some(reply_to) = &message.reply_to {
            return match thread::reconstruct(&self.store, reply_to, &message.content).await? {
                None => Ok(()),
                Some(ThreadDecision::Continuation {
                    conversation,
                    history,
                }) => {
                    self.handle_continuation(message, conversation, history)
                        .await
                },
                Some(ThreadDecision::Fresh {
                    quoted_text,
                    quoted_image,
                }) => {
                    self.handle_free_text(message, quoted_text, quoted_image, true)
                        .await
                },
            };
        }
        self.handle_free_text(message, None, None, false).await
    }

    async fn handle_free_text(
        &self,
        message: &InboundMessage,
        quoted_text: Option<String>,
        quoted_image: Option<String>,
        quoted_context: bool,
    ) -> Result<()> {
        // A message with no token at all is not addressed to anyone.
        let Some(name) = args::command_token(&message.content) else {
            return Ok(());
        };
        let command = self
            .registry
            .resolve(&name)
            .ok_or(Error::UnknownCommand { name: name.clone() })?;
        let body = args::message_remainder(&message.content).ok_or(Error::EmptyMessage)?;

        let mut bag = args::free_text_args(&name, body);
        if let Some(text) = quoted_text {
            bag.insert(keys::OPT_QUOTED_TEXT, ArgValue::Str(text));
        }
        if let Some(url) = quoted_image {
            bag.insert(keys::OPT_IMAGE_URL, ArgValue::Str(url));
        }
        info!(command = %name, message_id = message.id, quoted_context, "dispatching free-text message");

        // Quoted-context invocations are one-shot: no history read or written.
        if !quoted_context
            && !self
                .seed_conversation(message.id, &bag, &message.attachments)
                .await
        {
            return Ok(());
        }

        let target = ReplyTarget::Channel {
            channel_id: message.channel_id,
            reply_to: Some(message.id),
        };
        let response = command.execute(self.client.as_ref(), &bag).await?;
        self.replier
            .deliver(self.client.as_ref(), &target, &response)
            .await
    }

    async fn handle_continuation(
        &self,
        message: &InboundMessage,
        conversation: Conversation,
        history: Vec<weft_common::HistoryEntry>,
    ) -> Result<()> {
        // The command is sticky for the life of the thread.
        let command = self.registry.resolve(&conversation.command).ok_or_else(|| {
            Error::UnknownCommand {
                name: conversation.command.clone(),
            }
        })?;
        let bag = thread::continuation_args(&conversation, history);
        info!(command = %conversation.command, conversation_id = conversation.id, message_id = message.id, "dispatching continuation");

        let response = command.execute(self.client.as_ref(), &bag).await?;

        // Only a successful invocation extends the thread. Ordering by id is
        // authoritative, so a failed write leaves a recoverable gap.
        if let Err(err) = self
            .store
            .append_turn(
                message.id,
                conversation.id,
                Role::User,
                Some(&message.content),
                None,
            )
            .await
        {
            warn!(message_id = message.id, error = %err, "failed to persist continuation turn");
        }

        let target = ReplyTarget::Channel {
            channel_id: message.channel_id,
            reply_to: Some(message.id),
        };
        self.replier
            .deliver(self.client.as_ref(), &target, &response)
            .await
    }

    /// Context-menu invocations are one-shot: the target message's content
    /// becomes the `message` argument and nothing is persisted.
    async fn handle_context_menu(&self, menu: &ContextMenuInvocation) -> Result<()> {
        let name = menu.command.to_lowercase();
        let command = self
            .registry
            .resolve(&name)
            .ok_or(Error::UnknownCommand { name: name.clone() })?;

        let mut bag = CommandArgs::new(name.clone());
        bag.insert(
            keys::OPT_MESSAGE,
            ArgValue::Str(menu.target_content.clone()),
        );

        let ephemeral = command.is_private(&bag);
        self.client.defer(menu.id, ephemeral).await?;
        info!(command = %name, invocation_id = menu.id, "dispatching context-menu invocation");

        let target = ReplyTarget::Invocation {
            id: menu.id,
            ephemeral,
        };
        let response = command.execute(self.client.as_ref(), &bag).await?;
        self.replier
            .deliver(self.client.as_ref(), &target, &response)
            .await
    }

    /// Create the conversation and its seed user turn before the handler
    /// runs. Returns `false` when the turn id already exists: the platform
    /// redelivered an event that was fully handled, so the caller stops
    /// without invoking the handler or sending a second reply. A store
    /// failure only degrades continuation; the reply is still sent.
    async fn seed_conversation(
        &self,
        origin_id: i64,
        bag: &CommandArgs,
        attachments: &[MessageAttachment],
    ) -> bool {
        let model = bag.opt_str(keys::OPT_MODEL).ok().flatten();
        let content = bag.opt_str(keys::OPT_MESSAGE).ok().flatten();

        match self
            .store
            .seed_conversation(bag.command(), model, origin_id, content)
            .await
        {
            Ok(Some(_)) => {},
            Ok(None) => {
                info!(origin_id, "duplicate delivery, event already handled");
                return false;
            },
            Err(err) => {
                warn!(origin_id, error = %err, "failed to seed conversation");
                return true;
            },
        }
        for attachment in attachments {
            if let Err(err) = self
                .store
                .append_attachment(attachment.id, origin_id, &attachment.url)
                .await
            {
                warn!(origin_id, attachment_id = attachment.id, error = %err, "failed to persist attachment");
            }
        }
        true
    }

    async fn send_error(&self, target: &ReplyTarget, err: &Error, command: &str) {
        let text = err.user_message(command);
        if let Err(send_err) = self.client.send_text(target, &text).await {
            error!(error = %send_err, "failed to send error reply");
        }
    }
}
