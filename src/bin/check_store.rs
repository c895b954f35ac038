use prompt_refinery::config::{Config, StoreConfig};
use prompt_refinery::services;

/// Usage: check-store <user-id>
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let user_id = std::env::args().nth(1).unwrap_or_else(|| "healthcheck".to_string());

    println!("Chat store backend: {}", config.store.name());
    if config.store == StoreConfig::Disabled {
        println!("❌ No storage credentials. Set DATABASE_URL, or SUPABASE_URL and SUPABASE_KEY.");
        return Ok(());
    }

    println!("Connecting to chat store...");
    let store = services::build_store(&config.store).await?;

    println!("Listing chats for user {}...", user_id);
    match store.list_chats(&user_id, 20).await {
        Ok(chats) => {
            println!("✅ Store reachable, {} chat(s) found", chats.len());
            for chat in chats {
                println!("  - {} {} {}", chat.id, chat.created_at, chat.title);
            }
        }
        Err(e) => println!("❌ Store query failed: {}", e),
    }

    Ok(())
}
