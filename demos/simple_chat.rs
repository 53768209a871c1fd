//! Minimal one-shot completion against whichever provider the environment
//! selects. Run with e.g. `PROVIDER=local cargo run --example simple_chat`.

use chat_providers::{ChatOptions, ChatProvider, Message, ProviderFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let provider = ProviderFactory::from_env()?;
    println!("Using model: {}", provider.model());

    let messages = vec![
        Message::system("You are a helpful assistant."),
        Message::user("What is the capital of France?"),
    ];

    let options = ChatOptions {
        temperature: Some(0.7),
        max_tokens: Some(200),
        ..Default::default()
    };

    let response = provider.completion(&messages, &options).await?;
    println!("{}", response.content);
    println!(
        "({} prompt + {} completion = {} tokens)",
        response.usage.prompt_tokens,
        response.usage.completion_tokens,
        response.usage.total_tokens
    );

    Ok(())
}
