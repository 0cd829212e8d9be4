use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use xai_client::{ChatClient, CompletionRequest, Message, ToolRegistry};

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

#[derive(Deserialize, schemars::JsonSchema)]
struct TemperatureRequest {
    /// The city and state, e.g. San Francisco, CA
    location: String,
    unit: Option<TemperatureUnit>,
}

#[derive(Serialize)]
struct Temperature {
    location: String,
    temperature: i32,
    unit: TemperatureUnit,
}

#[derive(Deserialize, schemars::JsonSchema)]
struct CeilingRequest {
    /// The city and state, e.g. San Francisco, CA
    location: String,
}

#[derive(Serialize)]
struct Ceiling {
    location: String,
    ceiling: u32,
    ceiling_type: &'static str,
    unit: &'static str,
}

fn get_current_temperature(req: TemperatureRequest) -> Temperature {
    let unit = req.unit.unwrap_or(TemperatureUnit::Fahrenheit);
    let temperature = match unit {
        TemperatureUnit::Celsius => 15,
        TemperatureUnit::Fahrenheit => 59,
    };
    Temperature {
        location: req.location,
        temperature,
        unit,
    }
}

fn get_current_ceiling(req: CeilingRequest) -> Ceiling {
    Ceiling {
        location: req.location,
        ceiling: 15000,
        ceiling_type: "broken",
        unit: "ft",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tools = ToolRegistry::new();
    tools.register_fn(
        "get_current_temperature",
        "Get the current temperature in a given location",
        get_current_temperature,
    )?;
    tools.register_fn(
        "get_current_ceiling",
        "Get the current cloud ceiling in a given location",
        get_current_ceiling,
    )?;

    let client = ChatClient::from_env()?;
    let completion = client
        .complete_with_tools(
            CompletionRequest::with_default_model(vec![Message::user(
                "What's the temperature and cloud ceiling like in San Francisco?",
            )]),
            &tools,
        )
        .await?;

    println!("Assistant:\n{}", completion.content);

    Ok(())
}
