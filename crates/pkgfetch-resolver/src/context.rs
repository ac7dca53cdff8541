//! Pass-scoped bookkeeping shared by every node resolved in one run.

use std::collections::HashMap;

/// Which providers have been cloned during the current pass, and where they
/// came from.
///
/// Created at the start of a driver run and dropped at its end; never shared
/// between runs.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    fetched: HashMap<String, bool>,
    prebuilt: HashMap<String, bool>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `provider` was already cloned in this pass.
    pub fn is_fetched(&self, provider: &str) -> bool {
        self.fetched.get(provider).copied().unwrap_or(false)
    }

    /// Record a successful clone of `provider`.
    pub fn mark_fetched(&mut self, provider: &str, prebuilt: bool) {
        self.fetched.insert(provider.to_string(), true);
        self.prebuilt.insert(provider.to_string(), prebuilt);
    }

    /// Whether the clone of `provider` came from pre-built artifacts.
    /// Unknown providers are treated as upstream.
    pub fn is_prebuilt(&self, provider: &str) -> bool {
        self.prebuilt.get(provider).copied().unwrap_or(false)
    }

    /// Number of distinct providers cloned so far.
    pub fn fetched_count(&self) -> usize {
        self.fetched.values().filter(|&&f| f).count()
    }
}
