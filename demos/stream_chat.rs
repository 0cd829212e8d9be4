use std::io::{self, Write};

use dotenv::dotenv;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;
use xai_client::{ChatClient, CompletionRequest, Message};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = ChatClient::from_env()?;

    let mut stream = client
        .stream_completion(CompletionRequest::with_default_model(vec![
            Message::system(
                "You are Grok, a chatbot inspired by the Hitchhiker's Guide to the Galaxy.",
            ),
            Message::user("What is the meaning of life, the universe, and everything?"),
        ]))
        .await?;

    // Print fragments as they arrive
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        print!("{}", delta.delta);
        io::stdout().flush()?;

        if let Some(reason) = delta.finish_reason {
            println!("\n\n[finished: {reason:?}]");
        }
    }

    Ok(())
}
