//! Waylink - address resolution engine for dispatch tooling.
//!
//! Turns partial text typed into customer/location fields into ranked
//! address suggestions, auto-links locations to customers, and keeps a
//! TTL-cached location index fresh without full rescans per keystroke.

pub mod autolink;
pub mod commit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod rank;
pub mod score;

pub use autolink::{AutoLinkResolver, AutoLinkResult};
pub use commit::{commit_manual_address, CommitOutcome};
pub use config::EngineConfig;
pub use dispatch::{FieldDispatcher, FieldTarget, SuggestionSink, SuggestionUpdate};
pub use error::{EngineError, Result};
pub use index::LocationIndex;
pub use model::{AddressDraft, AddressRecord, LocationType, QueryToken, ScoredSuggestion};
pub use normalize::{dedup_normalize, search_normalize, NormalizedKey};
pub use provider::RecordProvider;
