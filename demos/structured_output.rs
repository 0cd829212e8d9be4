use dotenv::dotenv;
use tracing_subscriber::EnvFilter;
use xai_client::{ChatClient, CompletionRequest, Message, completion_schema};

#[completion_schema]
#[derive(Debug)]
enum Currency {
    USD,
    EUR,
    GBP,
}

#[completion_schema]
#[derive(Debug)]
struct LineItem {
    /// Description of the item or service
    description: String,
    /// Number of units
    #[schemars(range(min = 1))]
    quantity: u32,
    /// Price per unit
    #[schemars(range(min = 0))]
    unit_price: f64,
}

#[completion_schema]
#[derive(Debug)]
struct Address {
    /// Street address
    street: String,
    /// City
    city: String,
    /// Postal/ZIP code
    postal_code: String,
    /// Country
    country: String,
}

#[completion_schema(name = "invoice")]
#[derive(Debug)]
struct Invoice {
    /// Name of the vendor
    vendor_name: String,
    /// Vendor's address
    vendor_address: Address,
    /// Unique invoice identifier
    invoice_number: String,
    /// Date the invoice was issued (YYYY-MM-DD)
    invoice_date: String,
    /// List of purchased items/services
    line_items: Vec<LineItem>,
    /// Total amount due
    #[schemars(range(min = 0))]
    total_amount: f64,
    /// Currency of the invoice
    currency: Currency,
}

const RAW_INVOICE: &str = "
    Vendor: Acme Corp, 123 Main St, Springfield, IL 62704
    Invoice Number: INV-2025-001
    Date: 2025-02-10
    Items:
    - Widget A, 5 units, $10.00 each
    - Widget B, 2 units, $15.00 each
    Total: $80.00 USD
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = ChatClient::from_env()?;

    let response = client
        .create_structured_completion::<Invoice>(CompletionRequest::with_default_model(vec![
            Message::system(
                "Given a raw invoice, carefully analyze the text and extract the invoice data into JSON format.",
            ),
            Message::user(RAW_INVOICE),
        ]))
        .await?;

    println!("{:#?}", response.content);

    Ok(())
}
