use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

/// Work counters for one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Facts taken off the forward queue or opened by the backward engine.
    pub facts_expanded: usize,
    pub rules_examined: usize,
    /// Antecedent occurrences whose value was read during a rule scan.
    pub antecedents_visited: usize,
    pub rules_fired: usize,
    pub cycles_collapsed: usize,
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.facts_expanded += rhs.facts_expanded;
        self.rules_examined += rhs.rules_examined;
        self.antecedents_visited += rhs.antecedents_visited;
        self.rules_fired += rhs.rules_fired;
        self.cycles_collapsed += rhs.cycles_collapsed;
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "facts={} rules={} antecedents={} fired={} cycles={}",
            self.facts_expanded,
            self.rules_examined,
            self.antecedents_visited,
            self.rules_fired,
            self.cycles_collapsed
        )
    }
}
