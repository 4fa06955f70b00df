pub mod compiler;
pub mod entry;

pub use compiler::{compile, CompileError, CompileFailure};
pub use entry::{FilterAction, FilterEntry, MatchMethod, Matcher};

use crate::pipeline::event::RawEvent;

/// Include and exclude rules for one configuration.
///
/// With no rules every event passes. Include-only rules pass what matches;
/// exclude-only rules pass what does not. With both, an event must match an
/// include rule and no exclude rule.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    includes: Vec<FilterEntry>,
    excludes: Vec<FilterEntry>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a rule and adds it to the matching collection.
    pub fn add(&mut self, criteria: &str, pattern: &str) -> Result<FilterAction, CompileError> {
        let (entry, action) = compile(criteria, pattern)?;

        tracing::debug!(
            "Event filter: {} = {} (event_name={}, header={}, match={}, action={})",
            criteria,
            pattern,
            entry.event_name().unwrap_or("<any>"),
            entry.header().unwrap_or("<body>"),
            entry.method(),
            action
        );

        self.insert(entry, action);
        Ok(action)
    }

    pub fn insert(&mut self, entry: FilterEntry, action: FilterAction) {
        match action {
            FilterAction::Include => self.includes.push(entry),
            FilterAction::Exclude => self.excludes.push(entry),
        }
    }

    pub fn includes(&self) -> &[FilterEntry] {
        &self.includes
    }

    pub fn excludes(&self) -> &[FilterEntry] {
        &self.excludes
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Returns true when the event should be published.
    pub fn decide(&self, event: &RawEvent<'_>) -> bool {
        match (self.includes.is_empty(), self.excludes.is_empty()) {
            (true, true) => true,
            (false, true) => any_matches(&self.includes, event),
            (true, false) => !any_matches(&self.excludes, event),
            (false, false) => {
                any_matches(&self.includes, event) && !any_matches(&self.excludes, event)
            }
        }
    }
}

pub fn any_matches(entries: &[FilterEntry], event: &RawEvent<'_>) -> bool {
    entries
        .iter()
        .any(|entry| entry.matches_event(event.name, event.body))
}
