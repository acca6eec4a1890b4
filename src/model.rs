//! Core data types shared across the engine.
//!
//! Address records are owned by the external persistence layer; the engine
//! treats them as immutable values for the duration of one query cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One address on file for a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Store-assigned record id.
    pub id: i64,
    /// Owning customer.
    pub customer_name: String,
    /// Optional named location ("Chicago Yard", "Dock 4").
    pub location_name: Option<String>,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// Two-letter state code as stored.
    pub state: String,
    /// Optional ZIP code.
    pub zip: Option<String>,
    /// Whether this is the customer's default pickup address.
    pub is_default_pickup: bool,
    /// Whether this is the customer's default drop address.
    pub is_default_drop: bool,
}

/// Shape of a manually entered address handed to the provider for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub customer_name: String,
    pub location_name: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
}

/// Which side of a load an address serves, as stored by the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Pickup,
    Drop,
    Both,
}

/// An address record paired with its relevance score for one query.
///
/// Ephemeral: produced per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSuggestion {
    pub record: AddressRecord,
    pub score: f64,
}

/// Identifies one debounced lookup attempt for a field.
///
/// A token is stale iff a token with a higher `sequence` has since been
/// issued for the same field; stale results are discarded, never delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryToken {
    /// The input field this lookup belongs to.
    pub field_id: String,
    /// Monotonically increasing per field.
    pub sequence: u64,
    /// Raw query text as typed.
    pub text: String,
    /// Wall-clock issue time, for logging.
    pub issued_at: DateTime<Utc>,
}

impl QueryToken {
    pub fn new(field_id: &str, sequence: u64, text: &str) -> Self {
        Self {
            field_id: field_id.to_string(),
            sequence,
            text: text.to_string(),
            issued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
pub(crate) fn record(
    id: i64,
    customer: &str,
    location_name: Option<&str>,
    street: &str,
    city: &str,
    state: &str,
) -> AddressRecord {
    AddressRecord {
        id,
        customer_name: customer.to_string(),
        location_name: location_name.map(|s| s.to_string()),
        street: street.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        zip: None,
        is_default_pickup: false,
        is_default_drop: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_token_sequence_ordering() {
        let t1 = QueryToken::new("pickup", 1, "123 m");
        let t2 = QueryToken::new("pickup", 2, "123 ma");
        assert!(t2.sequence > t1.sequence);
        assert_eq!(t1.field_id, t2.field_id);
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let rec = record(7, "Acme Freight", Some("Yard"), "123 Main St", "Chicago", "IL");
        let json = serde_json::to_string(&rec).unwrap();
        let back: AddressRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }

    #[test]
    fn test_location_type_serde_names() {
        assert_eq!(serde_json::to_string(&LocationType::Pickup).unwrap(), "\"pickup\"");
        assert_eq!(serde_json::to_string(&LocationType::Both).unwrap(), "\"both\"");
    }
}
