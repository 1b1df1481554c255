use std::path::Path;

use {
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use weft_common::Role;

use crate::{
    error::{Error, Result},
    model::{Attachment, Conversation, Turn},
};

/// SQLite-backed conversation store.
///
/// Cloning is cheap; clones share the underlying pool.
#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Create the schema. Idempotent; also used by tests against
    /// in-memory databases.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS conversations (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                command TEXT    NOT NULL,
                model   TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS turns (
                id              INTEGER PRIMARY KEY,
                conversation_id INTEGER NOT NULL REFERENCES conversations (id),
                role            TEXT    NOT NULL,
                content         TEXT,
                reply_to_id     INTEGER
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS attachments (
                id      INTEGER PRIMARY KEY,
                turn_id INTEGER NOT NULL REFERENCES turns (id),
                url     TEXT    NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_turns_conversation
             ON turns (conversation_id, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a conversation and return its id.
    pub async fn create_conversation(
        &self,
        command: &str,
        model: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query("INSERT INTO conversations (command, model) VALUES (?, ?)")
            .bind(command)
            .bind(model)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Create a conversation and its first user turn in one transaction.
    ///
    /// Returns `None` when a turn with this platform message id already
    /// exists (redelivered event); the conversation insert is rolled back
    /// and nothing is written.
    pub async fn seed_conversation(
        &self,
        command: &str,
        model: Option<&str>,
        turn_id: i64,
        content: Option<&str>,
    ) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let conversation_id =
            sqlx::query("INSERT INTO conversations (command, model) VALUES (?, ?)")
                .bind(command)
                .bind(model)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

        let inserted = sqlx::query(
            "INSERT INTO turns (id, conversation_id, role, content, reply_to_id)
             VALUES (?, ?, ?, ?, NULL)",
        )
        .bind(turn_id)
        .bind(conversation_id)
        .bind(Role::User.as_str())
        .bind(content)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                Ok(Some(conversation_id))
            },
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                debug!(turn_id, "duplicate seed turn, conversation rolled back");
                Ok(None)
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        let row = sqlx::query_as::<_, (i64, String, Option<String>)>(
            "SELECT id, command, model FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, command, model)| Conversation { id, command, model }))
    }

    /// Look up a turn by its platform message id, attachments included.
    pub async fn find_turn(&self, id: i64) -> Result<Option<Turn>> {
        let row = sqlx::query_as::<_, (i64, i64, String, Option<String>, Option<i64>)>(
            "SELECT id, conversation_id, role, content, reply_to_id
             FROM turns WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut turn = turn_from_row(row)?;
        turn.attachments = self.attachments_for(turn.id).await?;
        Ok(Some(turn))
    }

    /// All turns of a conversation ordered by id ascending (chronological).
    pub async fn list_turns(&self, conversation_id: i64) -> Result<Vec<Turn>> {
        let rows = sqlx::query_as::<_, (i64, i64, String, Option<String>, Option<i64>)>(
            "SELECT id, conversation_id, role, content, reply_to_id
             FROM turns
             WHERE conversation_id = ?
             ORDER BY id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in rows {
            turns.push(turn_from_row(row)?);
        }

        let attachment_rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT a.id, a.turn_id, a.url
             FROM attachments a
             JOIN turns t ON t.id = a.turn_id
             WHERE t.conversation_id = ?
             ORDER BY a.id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        for (id, turn_id, url) in attachment_rows {
            if let Some(turn) = turns.iter_mut().find(|t| t.id == turn_id) {
                turn.attachments.push(Attachment { id, turn_id, url });
            }
        }

        Ok(turns)
    }

    /// Append a turn. Returns `false` when a turn with the same platform
    /// message id already exists, a benign conflict from platform
    /// redelivery, swallowed rather than propagated.
    pub async fn append_turn(
        &self,
        id: i64,
        conversation_id: i64,
        role: Role,
        content: Option<&str>,
        reply_to_id: Option<i64>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO turns (id, conversation_id, role, content, reply_to_id)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(reply_to_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => {
                debug!(turn_id = id, "duplicate turn insert ignored");
                Ok(false)
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Record a quoted attachment on an inbound turn. Duplicate attachment
    /// ids are swallowed like duplicate turns.
    pub async fn append_attachment(&self, id: i64, turn_id: i64, url: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO attachments (id, turn_id, url) VALUES (?, ?, ?)")
            .bind(id)
            .bind(turn_id)
            .bind(url)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => {
                debug!(attachment_id = id, "duplicate attachment insert ignored");
                Ok(false)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn attachments_for(&self, turn_id: i64) -> Result<Vec<Attachment>> {
        let rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT id, turn_id, url FROM attachments WHERE turn_id = ? ORDER BY id ASC",
        )
        .bind(turn_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, turn_id, url)| Attachment { id, turn_id, url })
            .collect())
    }
}

fn turn_from_row(
    (id, conversation_id, role, content, reply_to_id): (i64, i64, String, Option<String>, Option<i64>),
) -> Result<Turn> {
    let role = Role::parse(&role).ok_or(Error::InvalidRole { turn_id: id, role })?;
    Ok(Turn {
        id,
        conversation_id,
        role,
        content,
        reply_to_id,
        attachments: Vec::new(),
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> ConversationStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let store = ConversationStore::new(pool);
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn persist_then_reload_preserves_order() {
        let store = test_store().await;
        let conv = store.create_conversation("ai", Some("gpt-4-1106-preview")).await.unwrap();

        // Insert out of order; reload must come back ordered by id ascending.
        store.append_turn(300, conv, Role::User, Some("third"), None).await.unwrap();
        store.append_turn(100, conv, Role::User, Some("first"), None).await.unwrap();
        store.append_turn(200, conv, Role::Assistant, Some("second"), Some(100)).await.unwrap();

        let turns = store.list_turns(conv).await.unwrap();
        let ids: Vec<i64> = turns.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![100, 200, 300]);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].reply_to_id, Some(100));

        // Idempotent re-read.
        let again = store.list_turns(conv).await.unwrap();
        assert_eq!(turns, again);
    }

    #[tokio::test]
    async fn duplicate_seed_rolls_back_the_conversation_row() {
        let store = test_store().await;

        let first = store
            .seed_conversation("ai", None, 100, Some("hello"))
            .await
            .unwrap()
            .unwrap();

        let second = store
            .seed_conversation("ai", None, 100, Some("hello again"))
            .await
            .unwrap();
        assert!(second.is_none());

        // The rolled-back attempt leaves no conversation row behind and the
        // original seed turn keeps its content.
        assert!(store.find_conversation(first + 1).await.unwrap().is_none());
        let turn = store.find_turn(100).await.unwrap().unwrap();
        assert_eq!(turn.conversation_id, first);
        assert_eq!(turn.content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn duplicate_turn_id_is_swallowed() {
        let store = test_store().await;
        let conv = store.create_conversation("ai", None).await.unwrap();

        assert!(store.append_turn(1, conv, Role::User, Some("hello"), None).await.unwrap());
        assert!(!store.append_turn(1, conv, Role::User, Some("hello"), None).await.unwrap());

        let turns = store.list_turns(conv).await.unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn find_turn_includes_attachments() {
        let store = test_store().await;
        let conv = store.create_conversation("ai", None).await.unwrap();
        store.append_turn(10, conv, Role::User, Some("look"), None).await.unwrap();
        store.append_attachment(7, 10, "https://cdn.example/cat.png").await.unwrap();

        let turn = store.find_turn(10).await.unwrap().unwrap();
        assert_eq!(turn.attachments.len(), 1);
        assert_eq!(turn.attachments[0].url, "https://cdn.example/cat.png");
    }

    #[tokio::test]
    async fn find_turn_unknown_id_is_none() {
        let store = test_store().await;
        assert!(store.find_turn(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_conversation_roundtrip() {
        let store = test_store().await;
        let id = store.create_conversation("ai", Some("gpt-3.5-turbo-1106")).await.unwrap();

        let conv = store.find_conversation(id).await.unwrap().unwrap();
        assert_eq!(conv.command, "ai");
        assert_eq!(conv.model.as_deref(), Some("gpt-3.5-turbo-1106"));
        assert!(store.find_conversation(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_attachment_is_swallowed() {
        let store = test_store().await;
        let conv = store.create_conversation("ai", None).await.unwrap();
        store.append_turn(10, conv, Role::User, None, None).await.unwrap();

        assert!(store.append_attachment(5, 10, "https://cdn.example/a.png").await.unwrap());
        assert!(!store.append_attachment(5, 10, "https://cdn.example/a.png").await.unwrap());
    }
}
