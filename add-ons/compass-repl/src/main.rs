//! compass-repl: interactive terminal loop over the routing core.
//!
//! Stands in for the transport and ingestion collaborators: stdin lines are
//! user turns (serialized, one in flight at a time), `/doc <path>` feeds a
//! text file into the conversation as the reference document, and an
//! in-memory store plays the persistence collaborator.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use compass_bridge::{OpenRouterClient, TavilyClient};
use compass_core::{
    ConversationState, CoreError, MemoryTurnStore, SearchProvider, SearchSnippet, Services,
    Turn, TurnRouter,
};

/// Placeholder search used when `TAVILY_API_KEY` is unset; the search pipeline
/// then reports that nothing was found instead of erroring.
struct UnconfiguredSearch;

#[async_trait::async_trait]
impl SearchProvider for UnconfiguredSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchSnippet>, CoreError> {
        Ok(Vec::new())
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "compass_core=info,compass_bridge=info".into()),
        )
        .init();

    let Some(oracle) = OpenRouterClient::from_env() else {
        eprintln!("Set COMPASS_LLM_API_KEY or OPENROUTER_API_KEY to start the assistant.");
        std::process::exit(1);
    };
    let search: Arc<dyn SearchProvider> = match TavilyClient::from_env() {
        Some(client) => Arc::new(client),
        None => {
            warn!("TAVILY_API_KEY not set; job searches will return no listings");
            Arc::new(UnconfiguredSearch)
        }
    };
    let store = Arc::new(MemoryTurnStore::new());
    let services = Services::new(Arc::new(oracle), search, store);
    let router = TurnRouter::with_defaults(services);

    let conversation_id = uuid::Uuid::new_v4().to_string();
    let mut state = ConversationState::new();

    println!("compass career assistant. /doc <path> loads a document, /quit exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush().ok();
        let Ok(Some(line)) = lines.next_line().await else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }
        if let Some(path) = line.strip_prefix("/doc ") {
            match std::fs::read_to_string(path.trim()) {
                Ok(text) => {
                    state.set_reference_document(text);
                    println!("document loaded; ask for a review or follow-up questions");
                }
                Err(e) => eprintln!("could not read {}: {}", path.trim(), e),
            }
            continue;
        }

        let (tx, mut rx) = mpsc::channel::<String>(32);
        let printer = tokio::spawn(async move {
            while let Some(fragment) = rx.recv().await {
                print!("{}", fragment);
                std::io::stdout().flush().ok();
            }
            println!();
        });

        if let Err(e) = router
            .process_turn(&conversation_id, &mut state, Turn::user(&line), tx)
            .await
        {
            eprintln!("turn failed: {}", e);
        }
        printer.await.ok();
    }
}
