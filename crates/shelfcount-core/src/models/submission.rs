use serde::{Deserialize, Serialize};

/// Stock-count record sent to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSubmission {
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_product_name: Option<String>,
    /// Optional photo as a base64 data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}
