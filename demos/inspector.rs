//! Prints the raw JSON of every request and response, including the turns of
//! the tool calling loop.
//!
//! Run with: cargo run --example inspector
use dotenv::dotenv;
use serde::Deserialize;
use xai_client::{ChatClient, CompletionRequest, Credentials, Message, ToolRegistry};

#[derive(Deserialize, schemars::JsonSchema)]
struct WeatherRequest {
    /// The city to get weather for
    city: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let mut tools = ToolRegistry::new();
    tools.register_fn(
        "get_weather",
        "Get current weather for a city",
        |req: WeatherRequest| format!("Weather in {}: 22°C, sunny", req.city),
    )?;

    let client = ChatClient::builder(Credentials::from_env()?)
        .inspect_request(|req| {
            println!("━━━ REQUEST ━━━");
            println!("{}", serde_json::to_string_pretty(req).unwrap_or_default());
            println!();
        })
        .inspect_response(|res| {
            println!("━━━ RESPONSE ━━━");
            println!("{}", serde_json::to_string_pretty(res).unwrap_or_default());
            println!();
        })
        .build()?;

    let completion = client
        .complete_with_tools(
            CompletionRequest::with_default_model(vec![
                Message::system("You are a helpful assistant."),
                Message::user("What's the weather in Paris?"),
            ]),
            &tools,
        )
        .await?;

    println!("━━━ FINAL RESULT ━━━");
    println!("{}", completion.content);

    Ok(())
}
