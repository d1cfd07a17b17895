use anyhow::Result;
use std::env;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plates::assistant::Assistant;
use plates::models::{ModelConfig, ProviderKind};
use plates::storage::{JsonFileStore, KeyValueStore, MemoryStore, TieredStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    info!("Starting plates assistant");

    // File-backed store when a data dir is configured, memory-only otherwise.
    // The file tier is primary with memory as the degradation fallback.
    let store: Arc<dyn KeyValueStore> = match env::var("PLATES_DATA_DIR") {
        Ok(dir) => {
            info!("Persisting to: {}", dir);
            Arc::new(TieredStore::new(
                Arc::new(JsonFileStore::new(dir)),
                Arc::new(MemoryStore::new()),
            ))
        }
        Err(_) => Arc::new(MemoryStore::new()),
    };

    let assistant = Assistant::new(store);

    // Seed the provider configuration from the environment.
    let provider = match env::var("PLATES_PROVIDER").as_deref() {
        Ok("mock") => ProviderKind::Mock,
        Ok("gemini") => ProviderKind::Gemini,
        _ => ProviderKind::Default,
    };
    let config = ModelConfig {
        provider,
        api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
        ..ModelConfig::default()
    };
    assistant.config().set_model_config(&config).await;

    let user_id = env::var("PLATES_USER").unwrap_or_else(|_| "default-user".to_string());
    let user = assistant.users().get_or_create_user(&user_id).await;
    info!("Chatting as {} ({})", user.username, user.id);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let message = line.trim();
        if message.is_empty() {
            print!("> ");
            stdout.flush()?;
            continue;
        }
        if message == "/quit" {
            break;
        }

        let response = assistant.handle_message(&user_id, message).await;
        println!("[{}] {}", response.intent, response.ai_response);
        if let Some(recipe) = &response.recipe {
            println!("  recipe: {} ({} ingredients)", recipe.title, recipe.ingredients.len());
        }
        print!("> ");
        stdout.flush()?;
    }

    Ok(())
}
