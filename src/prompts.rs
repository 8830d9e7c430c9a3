//! System prompts and the user directive for purchase-order extraction.
//!
//! All prompt text lives here so tests can inspect it without a live model.
//! The advanced prompt is the basic prompt with extra categories appended,
//! never a rewrite of it.

use crate::config::ExtractionMode;

/// Rule set used in [`ExtractionMode::Basic`].
pub const BASIC_SYSTEM_PROMPT: &str = r#"You are an expert document extraction system specializing in Purchase Order extraction.
Extract the following information from the provided purchase order document in a structured JSON format:

1. Purchase order information: PO number, date, expiry date (if available), total amount
2. Customer information: Customer name, address, email ID, contact number
3. Vendor information: Vendor name, address, contact, email
4. Table data: Products/items with their details (convert tables to JSON format)

Rules:
- If any information is not present in the document, use null for that field
- Be precise with field names and values
- Maintain the structure of tables when converting to JSON
- For numerical values, preserve the original format (including currency symbols if present)
- Intelligently handle different PO layouts and formatting anomalies

Provide ONLY the JSON output with no additional explanation.
Format the JSON using appropriate indentation for readability.
"#;

/// Categories appended to the basic rules in [`ExtractionMode::Advanced`].
pub const ADVANCED_SUFFIX: &str = r#"
Additionally, extract any other fields that might be present in the document, such as:
- Shipping information
- Payment terms
- Discounts
- Tax information
- Notes or additional comments
"#;

/// Text block sent after the page images. Identical in both modes.
pub const USER_DIRECTIVE: &str = "Extract the purchase order information as specified in your instructions. This is a PDF document converted to images.";

/// Build the system prompt for the given mode.
pub fn system_prompt(mode: ExtractionMode) -> String {
    match mode {
        ExtractionMode::Basic => BASIC_SYSTEM_PROMPT.to_string(),
        ExtractionMode::Advanced => format!("{BASIC_SYSTEM_PROMPT}{ADVANCED_SUFFIX}"),
    }
}
