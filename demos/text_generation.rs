use dotenv::dotenv;
use tracing_subscriber::EnvFilter;
use xai_client::{ChatClient, CompletionRequest, GenerationConfig, Message};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = ChatClient::from_env()?;

    let request = CompletionRequest::with_default_model(vec![
        Message::system(
            "You are Grok, a chatbot inspired by the Hitchhiker's Guide to the Galaxy.",
        ),
        Message::user("What is the meaning of life, the universe, and everything?"),
    ])
    .with_generation_config(GenerationConfig {
        temperature: Some(0.7),
        max_tokens: Some(512),
        ..Default::default()
    });

    let completion = client.create_completion(request).await?;

    println!("Assistant:\n{}", completion.content);
    if let Some(usage) = completion.usage {
        println!(
            "\n[{} prompt + {} completion = {} tokens]",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }

    Ok(())
}
