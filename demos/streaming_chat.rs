//! Streaming completion: prints deltas as they arrive.
//! Run with e.g. `PROVIDER=local cargo run --example streaming_chat`.

use chat_providers::{ChatOptions, ChatProvider, Message, ProviderFactory};
use futures_util::StreamExt;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let provider = ProviderFactory::from_env()?;
    println!("Using model: {}", provider.model());

    let messages = vec![Message::user("Tell me a short story about a lighthouse.")];

    let mut deltas = provider
        .completion_stream(&messages, &ChatOptions::default())
        .await?;

    while let Some(delta) = deltas.next().await {
        let delta = delta?;
        print!("{}", delta.content);
        std::io::stdout().flush()?;
        if delta.done {
            if let Some(usage) = delta.usage {
                println!("\n({} tokens generated)", usage.completion_tokens);
            }
        }
    }
    println!();

    Ok(())
}
