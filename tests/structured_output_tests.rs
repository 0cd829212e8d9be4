use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};
use xai_client::{
    ApiKey, ChatClient, CompletionRequest, Credentials, LlmError, Message, completion_schema,
};

#[completion_schema(name = "invoice")]
#[derive(Debug, PartialEq)]
struct Invoice {
    /// Unique invoice identifier
    invoice_number: String,
    vendor: Address,
    line_items: Vec<LineItem>,
    /// Total amount due
    #[schemars(range(min = 0))]
    total_amount: f64,
    currency: Currency,
}

#[completion_schema]
#[derive(Debug, PartialEq)]
struct Address {
    name: String,
    city: String,
}

#[completion_schema]
#[derive(Debug, PartialEq)]
struct LineItem {
    description: String,
    #[schemars(range(min = 1))]
    quantity: u32,
    unit_price: f64,
}

#[completion_schema]
#[derive(Debug, PartialEq)]
enum Currency {
    USD,
    EUR,
    GBP,
}

const INVOICE_TEXT: &str = "Invoice INV-2025-001 from Acme Corp, Springfield. \
    2 x Widget at $25.00, 1 x Gadget at $30.00. Total: $80.00";

fn request() -> CompletionRequest {
    CompletionRequest::new(
        "grok-2-latest",
        vec![
            Message::system("Extract the invoice details."),
            Message::user(INVOICE_TEXT),
        ],
    )
}

fn client(server: &MockServer) -> ChatClient {
    let credentials = Credentials::with_base_url(
        ApiKey::Custom("xai-test-key".to_string()),
        format!("{}/v1", server.uri()),
    )
    .unwrap();
    ChatClient::new(credentials).unwrap()
}

fn completion_with(content: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-7",
        "model": "grok-2-latest",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content.to_string() },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 60, "total_tokens": 180 }
    }))
}

fn valid_invoice() -> Value {
    json!({
        "invoice_number": "INV-2025-001",
        "vendor": { "name": "Acme Corp", "city": "Springfield" },
        "line_items": [
            { "description": "Widget", "quantity": 2, "unit_price": 25.0 },
            { "description": "Gadget", "quantity": 1, "unit_price": 30.0 }
        ],
        "total_amount": 80.0,
        "currency": "USD"
    })
}

async fn mount(server: &MockServer, content: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion_with(&content))
        .mount(server)
        .await;
}

#[tokio::test]
async fn valid_invoice_is_decoded() {
    let server = MockServer::start().await;
    mount(&server, valid_invoice()).await;

    let response = client(&server)
        .create_structured_completion::<Invoice>(request())
        .await
        .unwrap();

    let invoice = response.content;
    assert_eq!(invoice.invoice_number, "INV-2025-001");
    assert_eq!(invoice.vendor.name, "Acme Corp");
    assert_eq!(invoice.line_items.len(), 2);
    assert_eq!(invoice.total_amount, 80.0);
    assert_eq!(invoice.currency, Currency::USD);
    assert_eq!(response.metadata.id, "chatcmpl-7");
    assert_eq!(response.usage.unwrap().total_tokens, 180);
}

#[tokio::test]
async fn request_carries_the_json_schema() {
    let server = MockServer::start().await;
    mount(&server, valid_invoice()).await;

    client(&server)
        .create_structured_completion::<Invoice>(request().with_stream(true))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let format = &body["response_format"];

    assert_eq!(body["stream"], false);
    assert_eq!(format["type"], "json_schema");
    assert_eq!(format["json_schema"]["name"], "invoice");

    let schema = &format["json_schema"]["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["additionalProperties"], false);
    let required = schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("total_amount")));
    assert!(required.contains(&json!("line_items")));
}

#[tokio::test]
async fn missing_field_is_a_schema_validation_error() {
    let server = MockServer::start().await;
    let mut invoice = valid_invoice();
    invoice.as_object_mut().unwrap().remove("total_amount");
    mount(&server, invoice).await;

    let err = client(&server)
        .create_structured_completion::<Invoice>(request())
        .await
        .unwrap_err();

    match err {
        LlmError::SchemaValidation { errors, .. } => {
            assert!(errors.iter().any(|e| e.contains("total_amount")));
        }
        other => panic!("expected schema validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn negative_amount_is_a_schema_validation_error() {
    let server = MockServer::start().await;
    let mut invoice = valid_invoice();
    invoice["total_amount"] = json!(-80.0);
    mount(&server, invoice).await;

    let err = client(&server)
        .create_structured_completion::<Invoice>(request())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::SchemaValidation { .. }));
}

#[tokio::test]
async fn unknown_enum_value_is_a_schema_validation_error() {
    let server = MockServer::start().await;
    let mut invoice = valid_invoice();
    invoice["currency"] = json!("JPY");
    mount(&server, invoice).await;

    let err = client(&server)
        .create_structured_completion::<Invoice>(request())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::SchemaValidation { .. }));
}

#[tokio::test]
async fn prose_reply_is_a_schema_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Here is your invoice: INV-2025-001" } }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_structured_completion::<Invoice>(request())
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::SchemaValidation { .. }));
}

#[tokio::test]
async fn refusal_is_a_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": null, "refusal": "I can't help with that." },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_structured_completion::<Invoice>(request())
        .await
        .unwrap_err();

    match err {
        LlmError::Provider { message, .. } => assert!(message.contains("can't help")),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_object_targets_are_wrapped() {
    let server = MockServer::start().await;
    mount(&server, json!({ "value": "GBP" })).await;

    let response = client(&server)
        .create_structured_completion::<Currency>(request())
        .await
        .unwrap();
    assert_eq!(response.content, Currency::GBP);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let schema = &body["response_format"]["json_schema"]["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["required"], json!(["value"]));
}
