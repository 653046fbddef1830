//! Terminal events for `catch_up`

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use domain_mandate::Product;

use crate::listener::TRANSFER_COMPLETED;

/// Decides whether an event ends a tracked product's catch-up
///
/// The predicate is handed the tracked product as loaded before the event was
/// handled, never the product the event resolved to. Catch-up follows the
/// tracked product's lifecycle, and for an event whose object is missing
/// locally the tracked product is the only entity there is.
#[derive(Clone)]
pub struct TerminalPredicate {
    predicate: Arc<dyn Fn(&str, &Product) -> bool + Send + Sync>,
}

impl TerminalPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str, &Product) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Terminal when the transaction type is one of `types`
    pub fn transaction_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types: HashSet<String> = types.into_iter().map(Into::into).collect();
        Self::new(move |transaction_type, _| types.contains(transaction_type))
    }

    /// Never terminal; catch-up runs until the stream is drained
    pub fn never() -> Self {
        Self::new(|_, _| false)
    }

    pub fn is_terminal(&self, transaction_type: &str, product: &Product) -> bool {
        (self.predicate)(transaction_type, product)
    }
}

impl Default for TerminalPredicate {
    fn default() -> Self {
        Self::transaction_types([TRANSFER_COMPLETED])
    }
}

impl fmt::Debug for TerminalPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalPredicate").finish_non_exhaustive()
    }
}
