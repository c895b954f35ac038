// Runs against a real Postgres: DATABASE_URL=postgres://... cargo test -- --ignored
use chrono::{Duration as ChronoDuration, Utc};
use prompt_refinery::db;
use prompt_refinery::models::chat::{Role, UNTITLED_CHAT};
use prompt_refinery::services::{ChatStore, PgChatStore, StorageError};
use sqlx::PgPool;
use uuid::Uuid;

async fn connect() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };
    Some(db::create_pool(&database_url).await.expect("Failed to connect to Postgres"))
}

fn unique_user() -> String {
    format!("pg-test-{}", Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_messages_break_timestamp_ties_by_insertion() {
    let Some(pool) = connect().await else { return };
    let store = PgChatStore::new(pool.clone());
    let chat_id = store.create_chat(&unique_user()).await.unwrap();

    let stamp = Utc::now();
    for (role, content) in [("user", "first"), ("assistant", "second"), ("user", "third")] {
        sqlx::query("INSERT INTO messages (id, chat_id, role, content, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(Uuid::new_v4().to_string())
            .bind(&chat_id)
            .bind(role)
            .bind(content)
            .bind(stamp)
            .execute(&pool)
            .await
            .unwrap();
    }

    let messages = store.get_messages(&chat_id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(store.get_messages("no-such-chat").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_list_chats_titles_and_order() {
    let Some(pool) = connect().await else { return };
    let store = PgChatStore::new(pool.clone());
    let user_id = unique_user();

    let older = store.create_chat(&user_id).await.unwrap();
    // Backdate so ordering does not depend on clock resolution
    sqlx::query("UPDATE chats SET created_at = $1 WHERE id = $2")
        .bind(Utc::now() - ChronoDuration::minutes(5))
        .bind(&older)
        .execute(&pool)
        .await
        .unwrap();
    store.add_message(&older, Role::Assistant, "greeting").await.unwrap();
    store.add_message(&older, Role::User, "todo app react").await.unwrap();
    store.add_message(&older, Role::User, "make it typed").await.unwrap();

    let newer = store.create_chat(&user_id).await.unwrap();
    store.create_chat(&unique_user()).await.unwrap();

    let chats = store.list_chats(&user_id, 50).await.unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].id, newer);
    assert_eq!(chats[0].title, UNTITLED_CHAT);
    assert_eq!(chats[1].id, older);
    assert_eq!(chats[1].title, "todo app react");

    assert_eq!(store.chat_owner(&older).await.unwrap().as_deref(), Some(user_id.as_str()));
    assert_eq!(store.chat_owner("no-such-chat").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_rejects_orphan_and_system_messages() {
    let Some(pool) = connect().await else { return };
    let store = PgChatStore::new(pool);

    let err = store.add_message("no-such-chat", Role::User, "x").await.unwrap_err();
    assert!(matches!(err, StorageError::Database(_)));

    let chat_id = store.create_chat(&unique_user()).await.unwrap();
    let err = store.add_message(&chat_id, Role::System, "x").await.unwrap_err();
    assert!(matches!(err, StorageError::UnstorableRole(Role::System)));
}
