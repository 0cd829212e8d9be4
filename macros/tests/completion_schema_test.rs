use schemars::schema_for;
use serde_json::json;
use xai_client::StructuredFormat;
use xai_client_macros::completion_schema;

#[completion_schema(name = "weather report")]
#[derive(Debug)]
struct WeatherReport {
    /// City the report is for
    city: String,
    temperature: f64,
    conditions: Vec<String>,
}

#[completion_schema]
#[derive(Debug, PartialEq)]
enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[test]
fn struct_schema_is_strict_and_titled() {
    let schema = serde_json::to_value(schema_for!(WeatherReport)).unwrap();

    assert_eq!(schema["title"], "weather report");
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["additionalProperties"], false);
    assert_eq!(
        schema["properties"]["city"]["description"],
        "City the report is for"
    );
}

#[test]
fn title_is_sanitized_into_format_name() {
    let format = StructuredFormat::for_type::<WeatherReport>().unwrap();
    assert_eq!(format.name(), "weather_report");
}

#[test]
fn derived_deserialize_accepts_model_output() {
    let report: WeatherReport = serde_json::from_value(json!({
        "city": "Lisbon",
        "temperature": 21.5,
        "conditions": ["sunny", "breezy"]
    }))
    .unwrap();
    assert_eq!(report.city, "Lisbon");
    assert_eq!(report.conditions.len(), 2);
}

#[test]
fn enum_without_name_uses_type_name() {
    let schema = serde_json::to_value(schema_for!(Sentiment)).unwrap();
    assert_eq!(schema["title"], "Sentiment");

    let format = StructuredFormat::for_type::<Sentiment>().unwrap();
    assert!(format.is_wrapped());
    let sentiment: Sentiment = format.parse(r#"{"value":"Neutral"}"#).unwrap();
    assert_eq!(sentiment, Sentiment::Neutral);
}
