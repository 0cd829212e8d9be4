use dotenv::dotenv;
use tracing_subscriber::EnvFilter;
use xai_client::{ChatClient, ImageRequest, constants};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = ChatClient::from_env()?;

    let generation = client
        .generate_image(ImageRequest::new(
            constants::DEFAULT_IMAGE_MODEL,
            "A girl in a tree",
        ))
        .await?;

    for (index, image) in generation.images.iter().enumerate() {
        println!("#{index}: {}", image.url_or_data());
        if let Some(revised) = &image.revised_prompt {
            println!("    revised prompt: {revised}");
        }
    }

    Ok(())
}
