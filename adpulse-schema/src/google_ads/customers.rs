use serde::{Deserialize, Serialize};

/// Response of `GET customers:listAccessibleCustomers`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListAccessibleCustomersResponse {
    #[serde(default)]
    pub resource_names: Vec<String>,
}

impl ListAccessibleCustomersResponse {
    /// Customer ids (digits only) extracted from `customers/{id}` resource names.
    pub fn customer_ids(&self) -> Vec<String> {
        self.resource_names
            .iter()
            .filter_map(|name| name.strip_prefix("customers/"))
            .map(str::to_string)
            .collect()
    }
}
