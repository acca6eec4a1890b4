//! Location → customer auto-linking.
//!
//! When a user picks a location, the paired customer field can often be
//! filled in without asking: one owning customer means auto-select, several
//! mean "show a list with the owners on top".

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::index::LocationIndex;
use crate::normalize::NormalizedKey;

/// Outcome of resolving a selected location to its owning customer(s).
#[derive(Debug, Clone, PartialEq)]
pub enum AutoLinkResult {
    /// No customer has this location on file.
    NoMatch,
    /// Exactly one owner; the caller auto-fills the paired field.
    SingleMatch(String),
    /// Several owners. The list holds the matching customers first
    /// (alphabetical), then the rest of the roster (alphabetical), so the
    /// UI can show matches on top without hiding anyone.
    MultipleMatches(Vec<String>),
}

/// Resolves selected locations against the location index.
pub struct AutoLinkResolver {
    index: Arc<LocationIndex>,
}

impl AutoLinkResolver {
    pub fn new(index: Arc<LocationIndex>) -> Self {
        Self { index }
    }

    pub async fn resolve(&self, location: &NormalizedKey) -> Result<AutoLinkResult> {
        let snapshot = self.index.current().await?;
        let matches = snapshot.customers_for(location);

        let result = match matches.len() {
            0 => AutoLinkResult::NoMatch,
            1 => AutoLinkResult::SingleMatch(
                matches.into_iter().next().unwrap_or_default(),
            ),
            _ => {
                // BTreeSet iteration keeps both segments alphabetical.
                let mut ordered: Vec<String> = matches.iter().cloned().collect();
                ordered.extend(
                    snapshot
                        .roster()
                        .iter()
                        .filter(|customer| !matches.contains(*customer))
                        .cloned(),
                );
                AutoLinkResult::MultipleMatches(ordered)
            }
        };

        debug!(location = %location, ?result, "auto-link resolved");
        Ok(result)
    }
}
