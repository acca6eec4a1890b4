//! The seam to the external persistence collaborator.
//!
//! The engine never talks to the store directly; everything goes through
//! `RecordProvider`. Implementations are expected to be backed by a database
//! or DAO layer. Fetch methods may fail transiently; the engine recovers
//! locally (empty suggestions, last-good index snapshot) and never panics on
//! a provider error.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AddressDraft, AddressRecord, LocationType};

/// Read/write access to customer and address records.
///
/// The mutation-notification contract is the inverse direction: after any
/// add/update/delete of an address, the owning layer must call
/// [`LocationIndex::invalidate`](crate::index::LocationIndex::invalidate) so
/// reverse lookups do not serve stale data beyond the TTL bound.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// All addresses on file for one customer.
    async fn fetch_customer_addresses(&self, customer: &str) -> Result<Vec<AddressRecord>>;

    /// The full customer roster. Used only by index rebuilds.
    async fn fetch_all_customers(&self) -> Result<Vec<String>>;

    /// Every location string for a customer, keyed by location type.
    /// Used only by index rebuilds.
    async fn fetch_customer_locations(
        &self,
        customer: &str,
    ) -> Result<HashMap<LocationType, Vec<String>>>;

    /// Persists a manually entered address and returns its new record id.
    async fn persist_new_address(&self, draft: &AddressDraft) -> Result<i64>;
}


#[cfg(test)]
mod tests {
    use super::testing::InMemoryProvider;
    use super::*;
    use crate::model::record;

    #[tokio::test]
    async fn test_in_memory_provider_round_trip() {
        let provider = InMemoryProvider::new();
        provider.seed_addresses(
            "Acme Freight",
            vec![record(1, "Acme Freight", None, "123 Main St", "Chicago", "IL")],
        );

        let records = provider
            .fetch_customer_addresses("Acme Freight")
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].street, "123 Main St");

        let none = provider.fetch_customer_addresses("Unknown").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mock_provider_compiles_with_expectations() {
        let mut mock = MockRecordProvider::new();
        mock.expect_fetch_all_customers()
            .times(1)
            .returning(|| Ok(vec!["Acme Freight".to_string()]));

        let roster = mock.fetch_all_customers().await.unwrap();
        assert_eq!(roster, vec!["Acme Freight".to_string()]);
    }
}
