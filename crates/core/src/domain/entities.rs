use serde::{Deserialize, Serialize};

/// Identifiers found in one query. Computed per call and never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    pub part_numbers: Vec<String>,
    pub model_number: Option<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.part_numbers.is_empty() && self.model_number.is_none()
    }

    pub fn primary_part_number(&self) -> Option<&str> {
        self.part_numbers.first().map(String::as_str)
    }

    pub fn model_number(&self) -> Option<&str> {
        self.model_number.as_deref()
    }
}
