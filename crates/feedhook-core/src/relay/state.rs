use crate::feed::Feed;

/// What the relay remembers about one feed between cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub feed: Feed,
    last_seen: Option<String>,
}

impl FeedState {
    pub fn new(feed: Feed) -> Self {
        Self {
            feed,
            last_seen: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.feed.name
    }

    pub fn endpoint(&self) -> &str {
        &self.feed.endpoint
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Whether a marker has been recorded yet
    pub fn is_tracking(&self) -> bool {
        self.last_seen.is_some()
    }

    /// Move the marker to `newest`. An empty listing (`None`) keeps the old marker.
    pub fn advance(&mut self, newest: Option<String>) {
        if let Some(id) = newest {
            self.last_seen = Some(id);
        }
    }
}

/// Every feed the relay watches, populated once at startup
#[derive(Debug, Default)]
pub struct FeedRegistry {
    states: Vec<FeedState>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: FeedState) {
        self.states.push(state);
    }

    pub fn get(&self, name: &str) -> Option<&FeedState> {
        self.states.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Hand each state to its own owner (one scheduler worker per feed)
    pub fn into_states(self) -> Vec<FeedState> {
        self.states
    }
}
