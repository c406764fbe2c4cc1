use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::formula::{Formula, Oracle, TriState};
use crate::model::{FactId, Model, Truth};
use crate::stats::Stats;

/// Bottom-up evaluation: fire rules from the fact base until the goal shows
/// up or nothing new can be derived.
///
/// Every antecedent occurrence is decremented exactly once, so a full run is
/// linear in the size of the rule set.
pub struct ForwardEngine<'m> {
    model: &'m mut Model,
    queue: VecDeque<FactId>,
    stats: Stats,
}

impl<'m> ForwardEngine<'m> {
    /// Reset the model, index rules by antecedent and assert the fact base.
    pub fn new(model: &'m mut Model) -> Self {
        model.reset();
        model.link_dependents();

        let mut queue = VecDeque::with_capacity(model.facts_base().len());
        for i in 0..model.facts_base().len() {
            let fact = model.facts_base()[i];
            model.fact_mut(fact).truth = Truth::True;
            queue.push_back(fact);
        }

        ForwardEngine { model, queue, stats: Stats::default() }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn model(&self) -> &Model {
        self.model
    }

    /// True once the work list is empty: nothing more is derivable.
    pub fn is_saturated(&self) -> bool {
        self.queue.is_empty()
    }

    /// Is `goal` derivable? Stops as soon as it is.
    pub fn prove(&mut self, goal: FactId) -> bool {
        debug!(goal = self.model.name(goal), "forward query");
        self.run(Some(goal))
    }

    /// Derive everything derivable.
    pub fn saturate(&mut self) {
        self.run(None);
    }

    /// Does the formula hold? Leaves are pursued left to right and the loop
    /// only runs as far as they need.
    pub fn holds(&mut self, formula: &Formula) -> bool {
        formula.decide(self) == TriState::True
    }

    fn run(&mut self, goal: Option<FactId>) -> bool {
        if let Some(g) = goal {
            if self.model.truth(g).is_true() {
                return true;
            }
        }

        while let Some(fact) = self.queue.pop_front() {
            if self.model.fact(fact).consumed {
                continue;
            }
            self.model.fact_mut(fact).consumed = true;
            self.stats.facts_expanded += 1;
            trace!(fact = self.model.name(fact), "expanding");

            // finish this fact's rules before answering; it will not be expanded again
            let mut reached = false;
            for k in 0..self.model.fact(fact).dependent_rules.len() {
                let rid = self.model.fact(fact).dependent_rules[k];
                self.stats.rules_examined += 1;
                self.stats.antecedents_visited += 1;

                let rule = self.model.rule_mut(rid);
                rule.remaining -= 1;
                if rule.remaining > 0 {
                    continue;
                }

                let consequent = rule.consequent();
                if self.model.truth(consequent).is_true() {
                    continue;
                }
                self.model.fact_mut(consequent).truth = Truth::True;
                self.stats.rules_fired += 1;
                trace!(rule = %self.model.describe_rule(rid), "fired");
                self.queue.push_back(consequent);

                reached |= goal == Some(consequent);
            }

            if reached {
                debug!(stats = %self.stats, "goal derived");
                return true;
            }
        }

        debug!(stats = %self.stats, "saturated");
        goal.map_or(false, |g| self.model.truth(g).is_true())
    }
}

impl Oracle for ForwardEngine<'_> {
    fn peek(&self, fact: FactId) -> TriState {
        if self.model.truth(fact).is_true() {
            TriState::True
        } else if self.is_saturated() {
            TriState::False
        } else {
            TriState::Unknown
        }
    }

    fn resolve(&mut self, fact: FactId) -> TriState {
        self.run(Some(fact)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Description;
    use crate::builder::build_model;

    fn model(rules: &[(&str, &str)], facts: &[&str], question: &str) -> Model {
        build_model(&Description::new(rules.iter().copied(), facts.iter().copied(), question))
            .unwrap()
    }

    #[test]
    fn conjunction_fires_once_all_antecedents_hold() {
        let mut m = model(&[("A∧B", "C")], &["A", "B"], "C");
        let c = m.lookup("C").unwrap();
        let mut engine = ForwardEngine::new(&mut m);
        assert!(engine.prove(c));
        assert_eq!(engine.stats().rules_fired, 1);
    }

    #[test]
    fn missing_antecedent_answers_false() {
        let mut m = model(&[("A∧B", "C")], &["A"], "C");
        let c = m.lookup("C").unwrap();
        let mut engine = ForwardEngine::new(&mut m);
        assert!(!engine.prove(c));
        assert!(engine.is_saturated());
        let b = engine.model().lookup("B").unwrap();
        assert_eq!(engine.model().truth(b), Truth::Unknown);
    }

    #[test]
    fn base_fact_answers_without_work() {
        let mut m = model(&[("A", "B")], &["A"], "A");
        let a = m.lookup("A").unwrap();
        let mut engine = ForwardEngine::new(&mut m);
        assert!(engine.prove(a));
        assert_eq!(engine.stats().facts_expanded, 0);
    }

    #[test]
    fn repeated_antecedent_counts_each_occurrence() {
        let mut m = model(&[("A∧A", "B")], &["A"], "B");
        let b = m.lookup("B").unwrap();
        let mut engine = ForwardEngine::new(&mut m);
        assert!(engine.prove(b));
        let (_, rule) = engine.model().rules().next().unwrap();
        assert_eq!(rule.remaining(), 0);
    }

    #[test]
    fn stops_at_goal() {
        let mut m = model(&[("A", "B"), ("B", "C"), ("C", "D")], &["A"], "B");
        let b = m.lookup("B").unwrap();
        let d = m.lookup("D").unwrap();
        let mut engine = ForwardEngine::new(&mut m);
        assert!(engine.prove(b));
        assert!(!engine.is_saturated());
        assert_eq!(engine.model().truth(d), Truth::Unknown);
        engine.saturate();
        assert_eq!(engine.model().truth(d), Truth::True);
    }

    #[test]
    fn compound_question() {
        let mut m = model(&[("A", "B")], &["A"], "(C∨B)∧A");
        let q = m.question().clone();
        let mut engine = ForwardEngine::new(&mut m);
        assert!(engine.holds(&q));

        let mut m = model(&[("A", "B")], &["A"], "(C∧B)");
        let q = m.question().clone();
        assert!(!ForwardEngine::new(&mut m).holds(&q));
    }

    #[test]
    fn cycles_without_grounding_stay_underived() {
        let mut m = model(&[("A", "B"), ("B", "A")], &[], "A");
        let a = m.lookup("A").unwrap();
        assert!(!ForwardEngine::new(&mut m).prove(a));
    }
}
