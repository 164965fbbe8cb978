use std::sync::Arc;

use typewire_core::collaborators::{CalculusProvider, DictionaryProvider, TopScoreSink};
use typewire_core::time::Clock;

use crate::dictionary::{LoggingTopScoreSink, SimpleCalculusProvider, StaticDictionaryProvider};

/// The concrete external collaborators wired into the running server.
/// Bundled behind one `Arc` so spawning a game worker is a single clone.
pub struct Collaborators {
    pub dictionary: Arc<dyn DictionaryProvider>,
    pub calculus: Arc<dyn CalculusProvider>,
    pub top_scores: Arc<dyn TopScoreSink>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn defaults(clock: Arc<dyn Clock>) -> Self {
        Self {
            dictionary: Arc::new(StaticDictionaryProvider),
            calculus: Arc::new(SimpleCalculusProvider),
            top_scores: Arc::new(LoggingTopScoreSink),
            clock,
        }
    }
}
