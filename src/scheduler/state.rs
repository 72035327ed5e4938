//! Scheduler state tracking
//!
//! Loop state, per-persona conversation history and run statistics.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

// ─────────────────────────────────────────────────────────────────
// Loop State
// ─────────────────────────────────────────────────────────────────

/// State of a persona's scheduling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Idle until the next post is due
    #[default]
    Waiting,
    /// A post is being assembled and persisted
    Posting,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The configured duration elapsed
    Completed,
    /// Shutdown was requested
    Interrupted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Conversation History
// ─────────────────────────────────────────────────────────────────

/// The most recent post texts of one persona, oldest first.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl ConversationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a text, dropping the oldest one when full
    pub fn push(&mut self, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.into());
    }

    pub fn as_slice(&mut self) -> &[String] {
        self.entries.make_contiguous()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(10)
    }
}

// ─────────────────────────────────────────────────────────────────
// Statistics
// ─────────────────────────────────────────────────────────────────

/// Summary of one persona's run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
    pub persona_id: String,
    pub posts_created: u32,
    pub failed_cycles: u32,
    pub outcome: Outcome,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl SimulationStats {
    pub fn new(persona_id: impl Into<String>) -> Self {
        Self {
            persona_id: persona_id.into(),
            posts_created: 0,
            failed_cycles: 0,
            outcome: Outcome::Completed,
            elapsed: Duration::ZERO,
        }
    }

    /// Cycles attempted, successful or not
    pub fn cycles(&self) -> u32 {
        self.posts_created + self.failed_cycles
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut history = ConversationHistory::new(3);
        for i in 0..5 {
            history.push(format!("post {}", i));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.as_slice(), &["post 2", "post 3", "post 4"]);
    }

    #[test]
    fn test_history_zero_capacity_keeps_one() {
        let mut history = ConversationHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.as_slice(), &["b"]);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = SimulationStats::new("indian");
        stats.posts_created = 2;
        stats.failed_cycles = 1;
        stats.elapsed = Duration::from_millis(1500);
        assert_eq!(stats.cycles(), 3);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["elapsed"], 1.5);
    }
}
