//! Post-call structured extraction.
//!
//! After a call ends, the full transcript is sent to the chat completions
//! endpoint with a JSON-schema response format that forces the model to
//! return exactly the six customer fields. Extraction runs once per call,
//! after teardown, off the call path.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// System prompt for the extraction request.
const EXTRACTION_SYSTEM_PROMPT: &str = "Extract customer details: name, country (double check this to be an actual country), invoices due date, services delivery, factoring contract, tax debts";

/// Errors from the extraction pipeline. All of them are logged at the
/// teardown site; none of them affect the telephony side.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// HTTP request to the completions endpoint failed
    #[error("Extraction request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response did not have the expected completions shape
    #[error("Unexpected completions response shape: {0}")]
    UnexpectedShape(String),

    /// The model's content string was not valid JSON for the schema
    #[error("Malformed extraction content: {0}")]
    MalformedContent(#[from] serde_json::Error),
}

/// The six customer fields extracted from a call transcript.
///
/// Field names double as the wire names, both in the response schema handed
/// to the model and in the webhook payload.
///
/// The response schema marks every field required, so the model always
/// returns all six, empty or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Customer name
    pub customer_name: String,
    /// Customer country
    pub country: String,
    /// Due date of outstanding invoices
    pub invoices_due_date: String,
    /// Whether services/goods have been delivered
    pub service_delivery: String,
    /// Whether a factoring contract already exists
    pub factoring_contract: String,
    /// Whether the customer has tax debts
    pub tax_debts: String,
}

/// Chat message in a completions request.
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: serde_json::Value,
}

/// Minimal view of a chat completions response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for the chat completions extraction call.
pub struct TranscriptExtractor {
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
}

impl TranscriptExtractor {
    pub fn new(api_key: String, url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            url,
            model,
        }
    }

    /// Run the extraction over a rendered transcript.
    pub async fn extract(&self, transcript: &str) -> Result<ExtractionResult, ExtractionError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: EXTRACTION_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: transcript.to_string(),
                },
            ],
            response_format: response_format(),
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatCompletionResponse>()
            .await?;

        parse_extraction(&response)
    }
}

/// JSON-schema response format forcing the six-field shape.
fn response_format() -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "customer_details_extraction",
            "schema": {
                "type": "object",
                "properties": {
                    "customer_name": { "type": "string" },
                    "country": { "type": "string" },
                    "invoices_due_date": { "type": "string" },
                    "service_delivery": { "type": "string" },
                    "factoring_contract": { "type": "string" },
                    "tax_debts": { "type": "string" }
                },
                "required": [
                    "customer_name",
                    "country",
                    "invoices_due_date",
                    "service_delivery",
                    "factoring_contract",
                    "tax_debts"
                ]
            }
        }
    })
}

/// Pull the structured result out of a completions response. The content
/// string is itself JSON and is parsed a second time.
fn parse_extraction(
    response: &ChatCompletionResponse,
) -> Result<ExtractionResult, ExtractionError> {
    let content = response
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .ok_or_else(|| ExtractionError::UnexpectedShape("no choices in response".to_string()))?;

    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completions_response(content: &str) -> ChatCompletionResponse {
        ChatCompletionResponse {
            choices: vec![ChatChoice {
                message: ChatChoiceMessage {
                    content: content.to_string(),
                },
            }],
        }
    }

    #[test]
    fn test_parse_extraction_success() {
        let content = r#"{
            "customer_name": "Peter",
            "country": "Belgium",
            "invoices_due_date": "in 30 days",
            "service_delivery": "yes",
            "factoring_contract": "no",
            "tax_debts": "none"
        }"#;
        let result = parse_extraction(&completions_response(content)).unwrap();
        assert_eq!(result.customer_name, "Peter");
        assert_eq!(result.country, "Belgium");
        assert_eq!(result.tax_debts, "none");
    }

    #[test]
    fn test_parse_extraction_empty_choices() {
        let response = ChatCompletionResponse { choices: vec![] };
        match parse_extraction(&response) {
            Err(ExtractionError::UnexpectedShape(_)) => {}
            _ => panic!("Expected UnexpectedShape error"),
        }
    }

    #[test]
    fn test_parse_extraction_malformed_content_is_an_error_not_a_panic() {
        let response = completions_response("I could not extract anything, sorry.");
        match parse_extraction(&response) {
            Err(ExtractionError::MalformedContent(_)) => {}
            _ => panic!("Expected MalformedContent error"),
        }
    }

    #[test]
    fn test_parse_extraction_missing_field_is_an_error() {
        let content = r#"{"customer_name": "Peter", "country": "Belgium"}"#;
        match parse_extraction(&completions_response(content)) {
            Err(ExtractionError::MalformedContent(_)) => {}
            _ => panic!("Expected MalformedContent error"),
        }
    }

    #[test]
    fn test_result_serializes_with_wire_names() {
        let result = ExtractionResult {
            customer_name: "Peter".to_string(),
            country: "Belgium".to_string(),
            invoices_due_date: "in 30 days".to_string(),
            service_delivery: "yes".to_string(),
            factoring_contract: "no".to_string(),
            tax_debts: "none".to_string(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&result).unwrap()).unwrap();
        assert_eq!(json["customer_name"], "Peter");
        assert_eq!(json["invoices_due_date"], "in 30 days");
        assert_eq!(json["tax_debts"], "none");
    }

    #[test]
    fn test_response_format_requires_all_six_fields() {
        let format = response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "customer_details_extraction");
        let required = format["json_schema"]["schema"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 6);
        // Wire names are the snake_case ones webhook consumers key on
        assert!(required.contains(&serde_json::Value::from("customer_name")));
        assert!(required.contains(&serde_json::Value::from("invoices_due_date")));
        assert!(required.contains(&serde_json::Value::from("tax_debts")));
    }
}
