use std::fmt;

use serde::Serialize;

/// Time spent at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub frequency: u64,
    pub time_in_state: u64,
}

impl Stat {
    pub fn new(frequency: u64, time_in_state: u64) -> Self {
        Self {
            frequency,
            time_in_state,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stat{{freq: {}, time_in_state: {}}}",
            self.frequency, self.time_in_state
        )
    }
}

/// Sum of `time_in_state` over a stats list.
pub fn total_time<'a>(stats: impl IntoIterator<Item = &'a Stat>) -> u64 {
    stats
        .into_iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.time_in_state))
}
