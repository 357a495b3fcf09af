//! Per-message processing results.

use crate::domain::errors::SkipReason;
use shared_types::EventCategory;

/// Result of one event inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Loaded,
    Skipped(SkipReason),
}

/// What a handler did with one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReport {
    pub category: EventCategory,
    /// Count reported to the activity log; zero records nothing.
    pub recorded: u64,
    pub outcomes: Vec<EventOutcome>,
}

impl HandlerReport {
    pub fn new(category: EventCategory) -> Self {
        Self {
            category,
            recorded: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn with_recorded(mut self, recorded: u64) -> Self {
        self.recorded = recorded;
        self
    }

    pub fn loaded(&mut self) {
        self.outcomes.push(EventOutcome::Loaded);
    }

    pub fn skip(&mut self, reason: SkipReason) {
        self.outcomes.push(EventOutcome::Skipped(reason));
    }

    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EventOutcome::Loaded))
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkipReason> {
        self.outcomes.iter().filter_map(|o| match o {
            EventOutcome::Skipped(reason) => Some(reason),
            EventOutcome::Loaded => None,
        })
    }
}
