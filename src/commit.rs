//! Manual-address commit path.
//!
//! When a user commits a typed-in address instead of picking a suggestion,
//! the engine decides whether it already exists for that customer. The
//! decision uses the dedup-normalized key and nothing else, so manual entry
//! and import paths cannot drift into different ideas of "the same address".

use tracing::{debug, info};

use crate::error::Result;
use crate::model::{AddressDraft, AddressRecord};
use crate::normalize::{dedup_normalize, record_dedup_key};
use crate::provider::RecordProvider;

/// What happened to a committed manual address.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// An address with the same dedup key already existed; no write issued.
    Existing(i64),
    /// The address was new and has been persisted under the returned id.
    Persisted(i64),
}

/// Commits a manually typed address, persisting it only when no existing
/// record for the customer has the same dedup-normalized key.
pub async fn commit_manual_address(
    provider: &dyn RecordProvider,
    draft: &AddressDraft,
) -> Result<CommitOutcome> {
    let draft_key = dedup_normalize(&format!(
        "{} {} {}",
        draft.street, draft.city, draft.state
    ));

    let existing = provider
        .fetch_customer_addresses(&draft.customer_name)
        .await?;
    if let Some(record) = find_duplicate(&existing, draft_key.as_str()) {
        debug!(
            customer = %draft.customer_name,
            id = record.id,
            "manual address matches existing record, skipping persist"
        );
        return Ok(CommitOutcome::Existing(record.id));
    }

    let id = provider.persist_new_address(draft).await?;
    info!(customer = %draft.customer_name, id, "persisted manually entered address");
    Ok(CommitOutcome::Persisted(id))
}

fn find_duplicate<'a>(records: &'a [AddressRecord], draft_key: &str) -> Option<&'a AddressRecord> {
    records
        .iter()
        .find(|record| record_dedup_key(record).as_str() == draft_key)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::record;
    use crate::provider::testing::InMemoryProvider;

    fn draft(street: &str, city: &str, state: &str) -> AddressDraft {
        AddressDraft {
            customer_name: "Acme Freight".to_string(),
            location_name: None,
            street: street.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        }
    }

    fn provider_with_main_st() -> Arc<InMemoryProvider> {
        let provider = Arc::new(InMemoryProvider::new());
        provider.seed_addresses(
            "Acme Freight",
            vec![record(42, "Acme Freight", None, "123 Main St", "Chicago", "IL")],
        );
        provider
    }

    #[tokio::test]
    async fn test_exact_duplicate_is_not_persisted() {
        let provider = provider_with_main_st();
        let outcome =
            commit_manual_address(provider.as_ref(), &draft("123 Main St", "Chicago", "IL"))
                .await
                .unwrap();
        assert_eq!(outcome, CommitOutcome::Existing(42));
        assert!(provider.persisted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suffix_variant_counts_as_duplicate() {
        let provider = provider_with_main_st();
        let outcome =
            commit_manual_address(provider.as_ref(), &draft("123 Main Street", "Chicago", "IL"))
                .await
                .unwrap();
        assert_eq!(outcome, CommitOutcome::Existing(42));
    }

    #[tokio::test]
    async fn test_new_address_is_persisted() {
        let provider = provider_with_main_st();
        let outcome =
            commit_manual_address(provider.as_ref(), &draft("77 Harbor Blvd", "Gary", "IN"))
                .await
                .unwrap();
        assert!(matches!(outcome, CommitOutcome::Persisted(_)));
        assert_eq!(provider.persisted.lock().unwrap().len(), 1);
    }
}
