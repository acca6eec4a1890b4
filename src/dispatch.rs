//! Per-field debounced query dispatch.
//!
//! Each input field gets one long-lived [`FieldDispatcher`] that owns the
//! field's sequence counter and pending debounce timer. A field moves through
//! `Idle -> Pending -> InFlight -> Idle`: a keystroke cancels any pending
//! timer and arms a new one (cancel-on-replace); when the timer fires, the
//! fetch/score/rank pipeline runs on its own task so the interactive path
//! never blocks; a completing pipeline delivers only if its token is still
//! the latest issued for the field.
//!
//! Cancellation of in-flight work is advisory: the external fetch is allowed
//! to finish and its result is discarded by the sequence check. Both layers
//! are kept on purpose - timer aborts are best-effort, the sequence check is
//! the authority. Worst case wasted work is one external call per abandoned
//! keystroke burst, not per keystroke.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::index::LocationIndex;
use crate::model::{AddressRecord, QueryToken, ScoredSuggestion};
use crate::normalize::search_normalize;
use crate::provider::RecordProvider;
use crate::rank::rank;
use crate::score::ScoreContext;

/// Where a field's candidate records come from.
#[derive(Debug, Clone)]
pub enum FieldTarget {
    /// Addresses on file for one (already selected) customer.
    CustomerAddresses { customer: String },
    /// Any indexed location; owning customers' records are pooled.
    Locations,
}

/// One delivery of ranked suggestions for a field.
#[derive(Debug, Clone)]
pub struct SuggestionUpdate {
    pub field_id: String,
    pub sequence: u64,
    /// Empty means "hide suggestions".
    pub suggestions: Vec<ScoredSuggestion>,
}

/// Receives ranked suggestions for a field.
///
/// The engine calls `deliver` from the pipeline task that won the sequence
/// race; marshalling onto a UI context is the implementation's job. At most
/// one delivery per field is ever in progress, and delivered sequence
/// numbers are strictly increasing. A sink whose field no longer exists
/// (dialog closed) should simply drop the update.
///
/// `deliver` must not synchronously call back into the dispatcher; queue
/// the follow-up input instead.
pub trait SuggestionSink: Send + Sync {
    fn deliver(&self, update: SuggestionUpdate);
}

/// Debounced query dispatcher for one input field.
pub struct FieldDispatcher {
    field_id: String,
    is_pickup: bool,
    debounce: Duration,
    max_suggestions: usize,
    provider: Arc<dyn RecordProvider>,
    index: Arc<LocationIndex>,
    sink: Arc<dyn SuggestionSink>,
    sequence: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Serializes deliveries and pins them to increasing sequence numbers.
    delivered: Arc<Mutex<u64>>,
}

impl FieldDispatcher {
    pub fn new(
        field_id: &str,
        is_pickup: bool,
        debounce: Duration,
        max_suggestions: usize,
        provider: Arc<dyn RecordProvider>,
        index: Arc<LocationIndex>,
        sink: Arc<dyn SuggestionSink>,
    ) -> Self {
        Self {
            field_id: field_id.to_string(),
            is_pickup,
            debounce,
            max_suggestions,
            provider,
            index,
            sink,
            sequence: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            delivered: Arc::new(Mutex::new(0)),
        }
    }

    /// Dispatcher for a customer-address field, debounce and cap taken
    /// from `config`.
    pub fn customer_field(
        field_id: &str,
        is_pickup: bool,
        config: &EngineConfig,
        provider: Arc<dyn RecordProvider>,
        index: Arc<LocationIndex>,
        sink: Arc<dyn SuggestionSink>,
    ) -> Self {
        Self::new(
            field_id,
            is_pickup,
            config.dispatch.customer_debounce(),
            config.max_suggestions,
            provider,
            index,
            sink,
        )
    }

    /// Dispatcher for a location field, debounce and cap taken from
    /// `config`. Location fields get the longer window.
    pub fn location_field(
        field_id: &str,
        is_pickup: bool,
        config: &EngineConfig,
        provider: Arc<dyn RecordProvider>,
        index: Arc<LocationIndex>,
        sink: Arc<dyn SuggestionSink>,
    ) -> Self {
        Self::new(
            field_id,
            is_pickup,
            config.dispatch.location_debounce(),
            config.max_suggestions,
            provider,
            index,
            sink,
        )
    }

    /// Handles one text change for the field. Must be called from within a
    /// tokio runtime; returns immediately.
    pub fn on_input(&self, text: &str, target: FieldTarget) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let token = QueryToken::new(&self.field_id, sequence, text);

        // Cancel-on-replace: the pending debounce timer dies here. The
        // sequence bump above already doomed any in-flight pipeline.
        if let Some(handle) = self.pending.lock().unwrap().take() {
            handle.abort();
        }

        if text.trim().is_empty() {
            // Cleared field: hide suggestions right away, no debounce.
            self.try_deliver(token, Vec::new());
            return;
        }

        let handle = tokio::spawn(Self::debounce_then_dispatch(
            token,
            target,
            self.pipeline_context(),
        ));
        *self.pending.lock().unwrap() = Some(handle);
    }

    /// The sequence number of the most recently issued token.
    pub fn latest_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn pipeline_context(&self) -> PipelineContext {
        PipelineContext {
            is_pickup: self.is_pickup,
            debounce: self.debounce,
            max_suggestions: self.max_suggestions,
            provider: Arc::clone(&self.provider),
            index: Arc::clone(&self.index),
            sink: Arc::clone(&self.sink),
            sequence: Arc::clone(&self.sequence),
            delivered: Arc::clone(&self.delivered),
        }
    }

    async fn debounce_then_dispatch(token: QueryToken, target: FieldTarget, ctx: PipelineContext) {
        tokio::time::sleep(ctx.debounce).await;
        if ctx.sequence.load(Ordering::SeqCst) != token.sequence {
            return;
        }
        // Detach the pipeline so a later cancel-on-replace cannot abort
        // mid-fetch; superseded results are discarded, not interrupted.
        tokio::spawn(ctx.run(token, target));
    }

    fn try_deliver(&self, token: QueryToken, suggestions: Vec<ScoredSuggestion>) {
        deliver_if_latest(
            &self.sequence,
            &self.delivered,
            self.sink.as_ref(),
            token,
            suggestions,
        );
    }
}

struct PipelineContext {
    is_pickup: bool,
    debounce: Duration,
    max_suggestions: usize,
    provider: Arc<dyn RecordProvider>,
    index: Arc<LocationIndex>,
    sink: Arc<dyn SuggestionSink>,
    sequence: Arc<AtomicU64>,
    delivered: Arc<Mutex<u64>>,
}

impl PipelineContext {
    async fn run(self, token: QueryToken, target: FieldTarget) {
        let candidates = match self.fetch_candidates(&token, &target).await {
            Ok(candidates) => candidates,
            Err(e) => {
                // Transient store trouble is not a UI error: log, hide
                // suggestions, move on.
                warn!(field = %token.field_id, "suggestion fetch failed: {}", e);
                self.finish(token, Vec::new());
                return;
            }
        };

        let context = ScoreContext {
            is_pickup: self.is_pickup,
        };
        let ranked = rank(candidates, &token.text, context, self.max_suggestions);
        self.finish(token, ranked);
    }

    async fn fetch_candidates(
        &self,
        token: &QueryToken,
        target: &FieldTarget,
    ) -> crate::error::Result<Vec<AddressRecord>> {
        match target {
            FieldTarget::CustomerAddresses { customer } => {
                self.provider.fetch_customer_addresses(customer).await
            }
            FieldTarget::Locations => {
                let snapshot = self.index.current().await?;
                let query_key = search_normalize(&token.text);

                // Coarse prefilter over index keys; the ranker does the
                // real relevance ordering.
                let mut owners: BTreeSet<String> = BTreeSet::new();
                for key in snapshot.location_keys() {
                    if query_key.tokens().any(|t| key.as_str().contains(t)) {
                        owners.extend(snapshot.customers_for(key));
                    }
                }

                let fetches = owners
                    .iter()
                    .map(|customer| self.provider.fetch_customer_addresses(customer));
                let mut pooled = Vec::new();
                for result in join_all(fetches).await {
                    pooled.extend(result?);
                }
                Ok(pooled)
            }
        }
    }

    fn finish(&self, token: QueryToken, suggestions: Vec<ScoredSuggestion>) {
        deliver_if_latest(
            &self.sequence,
            &self.delivered,
            self.sink.as_ref(),
            token,
            suggestions,
        );
    }
}

/// Delivers unless a newer token has been issued for the field. Holding
/// `delivered` across the check and the sink call keeps deliveries
/// serialized and their sequence numbers strictly increasing.
fn deliver_if_latest(
    sequence: &AtomicU64,
    delivered: &Mutex<u64>,
    sink: &dyn SuggestionSink,
    token: QueryToken,
    suggestions: Vec<ScoredSuggestion>,
) {
    let mut last = delivered.lock().unwrap();
    if sequence.load(Ordering::SeqCst) != token.sequence || *last >= token.sequence {
        debug!(
            field = %token.field_id,
            sequence = token.sequence,
            "discarding stale suggestion result"
        );
        return;
    }
    *last = token.sequence;
    sink.deliver(SuggestionUpdate {
        field_id: token.field_id,
        sequence: token.sequence,
        suggestions,
    });
}
