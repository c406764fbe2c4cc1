//! Goal-driven evaluation that terminates on cyclic rule graphs.
//!
//! Each fact moves Unknown -> Pending -> {True, False}. A fact is Pending
//! while it sits on the current search path. A rule whose antecedents are
//! all True or Pending cannot be decided yet; it is parked on its Pending
//! antecedents and fires by propagation if they all turn True later.
//!
//! Facts get a discovery order when they are opened, and `cycle_root` tracks
//! the smallest order any parked rule waits on (a reduced Tarjan low-link).
//! When the fact carrying that order closes, nothing outside the facts
//! opened since can still prove them, so every one of them still Pending
//! is False.

use tracing::{debug, trace};

use crate::formula::{Formula, Oracle, TriState};
use crate::model::{FactId, Model, RuleId, Truth};
use crate::stats::Stats;

/// How the backward engine walks the rule graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Descent {
    /// Explicit frame stack; depth bounded only by memory.
    #[default]
    Iterative,
    /// Native recursion; for inputs of modest depth.
    Recursive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleOutcome {
    Proven,
    Refuted,
    /// No antecedent False, these ones still Pending (repeats included).
    AwaitingCycle(Vec<FactId>),
}

enum Step {
    Descend(FactId),
    Done(RuleOutcome),
}

enum Frame {
    Resolve { fact: FactId, next_rule: usize, awaiting: bool },
    Scan { fact: FactId, rule: RuleId, next: usize },
}

pub struct BackwardEngine<'m> {
    model: &'m mut Model,
    descent: Descent,
    next_order: usize,
    cycle_root: Option<usize>,
    frontier: Vec<FactId>,
    stats: Stats,
}

impl<'m> BackwardEngine<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Self::with_descent(model, Descent::default())
    }

    /// Reset the model and assert its fact base.
    pub fn with_descent(model: &'m mut Model, descent: Descent) -> Self {
        model.reset();
        for i in 0..model.facts_base().len() {
            let fact = model.facts_base()[i];
            model.fact_mut(fact).truth = Truth::True;
        }

        BackwardEngine {
            model,
            descent,
            next_order: 0,
            cycle_root: None,
            frontier: vec![],
            stats: Stats::default(),
        }
    }

    pub fn descent(&self) -> Descent {
        self.descent
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn model(&self) -> &Model {
        self.model
    }

    /// Is `fact` derivable?
    pub fn prove(&mut self, fact: FactId) -> bool {
        debug!(goal = self.model.name(fact), descent = ?self.descent, "backward query");
        self.settle_fact(fact);
        self.model.truth(fact).is_true()
    }

    /// Does the formula hold? Leaves are resolved lazily.
    pub fn holds(&mut self, formula: &Formula) -> bool {
        debug!(
            question = %self.model.describe_formula(formula),
            descent = ?self.descent,
            "backward query"
        );
        let answer = formula.decide(self) == TriState::True;
        debug!(answer, stats = %self.stats, "backward query done");
        answer
    }

    fn settle_fact(&mut self, fact: FactId) {
        if self.model.truth(fact) != Truth::Unknown {
            return;
        }
        match self.descent {
            Descent::Iterative => self.resolve_iterative(fact),
            Descent::Recursive => self.resolve_recursive(fact),
        }
    }

    // ---- Descents ----

    fn resolve_iterative(&mut self, goal: FactId) {
        self.open(goal);
        let mut stack = vec![Frame::Resolve { fact: goal, next_rule: 0, awaiting: false }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Resolve { fact, next_rule, awaiting } => {
                    let rule = self.next_justification(fact, next_rule);
                    match rule {
                        Some(rule) => {
                            stack.push(Frame::Resolve { fact, next_rule: next_rule + 1, awaiting });
                            stack.push(Frame::Scan { fact, rule, next: 0 });
                        }
                        None => self.close(fact, awaiting),
                    }
                }
                Frame::Scan { fact, rule, mut next } => match self.scan(rule, &mut next) {
                    Step::Descend(antecedent) => {
                        stack.push(Frame::Scan { fact, rule, next });
                        self.open(antecedent);
                        stack.push(Frame::Resolve {
                            fact: antecedent,
                            next_rule: 0,
                            awaiting: false,
                        });
                    }
                    Step::Done(outcome) => {
                        // the owning Resolve frame sits right below
                        if let Some(Frame::Resolve { awaiting, .. }) = stack.last_mut() {
                            self.settle(fact, rule, outcome, awaiting);
                        }
                    }
                },
            }
        }
    }

    fn resolve_recursive(&mut self, fact: FactId) {
        self.open(fact);
        let mut awaiting = false;
        let mut next_rule = 0;

        while let Some(rule) = self.next_justification(fact, next_rule) {
            next_rule += 1;
            let mut cursor = 0;
            let outcome = loop {
                match self.scan(rule, &mut cursor) {
                    Step::Descend(antecedent) => self.resolve_recursive(antecedent),
                    Step::Done(outcome) => break outcome,
                }
            };
            self.settle(fact, rule, outcome, &mut awaiting);
        }

        self.close(fact, awaiting);
    }

    // ---- Shared steps ----

    fn open(&mut self, fact: FactId) {
        let order = self.next_order;
        self.next_order += 1;

        let f = self.model.fact_mut(fact);
        f.truth = Truth::Pending;
        f.order = Some(order);
        self.frontier.push(fact);
        self.stats.facts_expanded += 1;
        trace!(fact = self.model.name(fact), order, "resolving");
    }

    /// The `index`th rule concluding `fact`, unless the fact is already True.
    fn next_justification(&mut self, fact: FactId, index: usize) -> Option<RuleId> {
        if self.model.truth(fact).is_true() {
            return None;
        }
        let rule = self.model.fact(fact).justifications().get(index).copied()?;
        self.stats.rules_examined += 1;
        trace!(rule = %self.model.describe_rule(rule), "examining");
        Some(rule)
    }

    /// Walk antecedents from `cursor` until one needs resolving or the rule
    /// is decided.
    fn scan(&mut self, rule: RuleId, cursor: &mut usize) -> Step {
        loop {
            let Some(&antecedent) = self.model.rule(rule).antecedents().get(*cursor) else {
                return Step::Done(self.classify(rule));
            };
            match self.model.truth(antecedent) {
                Truth::True | Truth::Pending => {
                    self.stats.antecedents_visited += 1;
                    *cursor += 1;
                }
                Truth::False => {
                    self.stats.antecedents_visited += 1;
                    return Step::Done(RuleOutcome::Refuted);
                }
                Truth::Unknown => return Step::Descend(antecedent),
            }
        }
    }

    /// Re-read every antecedent: one seen Pending earlier may have settled
    /// during a later descent.
    fn classify(&self, rule: RuleId) -> RuleOutcome {
        let mut pending = vec![];
        for &a in self.model.rule(rule).antecedents() {
            match self.model.truth(a) {
                Truth::False => return RuleOutcome::Refuted,
                Truth::Pending => pending.push(a),
                Truth::True | Truth::Unknown => {}
            }
        }
        if pending.is_empty() {
            RuleOutcome::Proven
        } else {
            RuleOutcome::AwaitingCycle(pending)
        }
    }

    fn settle(&mut self, fact: FactId, rule: RuleId, outcome: RuleOutcome, awaiting: &mut bool) {
        if self.model.truth(fact).is_true() {
            return;
        }

        match outcome {
            RuleOutcome::Proven => {
                self.model.fact_mut(fact).truth = Truth::True;
                self.stats.rules_fired += 1;
                trace!(rule = %self.model.describe_rule(rule), "fired");
                self.propagate(fact);
            }
            RuleOutcome::Refuted => {}
            RuleOutcome::AwaitingCycle(pending) => {
                self.model.rule_mut(rule).pending_count = pending.len();
                let mut low = usize::MAX;
                for &p in &pending {
                    let f = self.model.fact_mut(p);
                    f.pending_obligations.push(rule);
                    low = low.min(f.order.unwrap_or(usize::MAX));
                }
                self.cycle_root = Some(self.cycle_root.map_or(low, |root| root.min(low)));
                *awaiting = true;
                trace!(
                    rule = %self.model.describe_rule(rule),
                    waiting_on = pending.len(),
                    "memorized"
                );
            }
        }
    }

    /// Fire every parked rule whose last Pending antecedent just turned True.
    fn propagate(&mut self, from: FactId) {
        let mut work = vec![from];

        while let Some(fact) = work.pop() {
            let obligations = std::mem::take(&mut self.model.fact_mut(fact).pending_obligations);
            for rule in obligations {
                let r = self.model.rule_mut(rule);
                r.pending_count -= 1;
                if r.pending_count > 0 {
                    continue;
                }
                let consequent = r.consequent();
                if self.model.truth(consequent).is_true() {
                    continue;
                }
                self.model.fact_mut(consequent).truth = Truth::True;
                self.stats.rules_fired += 1;
                trace!(rule = %self.model.describe_rule(rule), "propagated");
                work.push(consequent);
            }
        }
    }

    fn close(&mut self, fact: FactId, awaiting: bool) {
        if self.model.truth(fact) == Truth::Pending && !awaiting {
            self.model.fact_mut(fact).truth = Truth::False;
            trace!(fact = self.model.name(fact), "refuted");
        }
        if self.cycle_root.is_some() && self.model.fact(fact).order == self.cycle_root {
            self.collapse_open_cycle();
        }
    }

    /// Everything opened at or after the cycle root and still Pending has no
    /// way left to become True.
    fn collapse_open_cycle(&mut self) {
        let Some(root) = self.cycle_root.take() else {
            return;
        };

        let mut collapsed = 0;
        for &f in &self.frontier {
            let fact = self.model.fact_mut(f);
            if fact.truth == Truth::Pending && fact.order.is_some_and(|o| o >= root) {
                fact.truth = Truth::False;
                collapsed += 1;
            }
        }

        let model = &*self.model;
        self.frontier.retain(|&f| model.truth(f) == Truth::Pending);
        self.stats.cycles_collapsed += 1;
        debug!(root, collapsed, still_open = self.frontier.len(), "cycle collapsed");
    }
}

impl Oracle for BackwardEngine<'_> {
    fn peek(&self, fact: FactId) -> TriState {
        self.model.truth(fact).into()
    }

    fn resolve(&mut self, fact: FactId) -> TriState {
        self.settle_fact(fact);
        self.peek(fact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Description;
    use crate::builder::build_model;

    const DESCENTS: [Descent; 2] = [Descent::Iterative, Descent::Recursive];

    fn model(rules: &[(&str, &str)], facts: &[&str], question: &str) -> Model {
        build_model(&Description::new(rules.iter().copied(), facts.iter().copied(), question))
            .unwrap()
    }

    fn ask(m: &mut Model, descent: Descent, name: &str) -> bool {
        let fact = m.lookup(name).unwrap();
        let answer = BackwardEngine::with_descent(m, descent).prove(fact);
        assert!(m.pending_facts().is_empty(), "{descent:?} left facts pending");
        answer
    }

    #[test]
    fn two_cycle_without_support_is_false() {
        for descent in DESCENTS {
            let mut m = model(&[("A", "B"), ("B", "A")], &[], "A");
            assert!(!ask(&mut m, descent, "A"));
            let b = m.lookup("B").unwrap();
            assert_eq!(m.truth(b), Truth::False);
        }
    }

    #[test]
    fn cycle_with_outside_support_is_true() {
        for descent in DESCENTS {
            let mut m = model(&[("A", "B"), ("B", "C"), ("C", "A"), ("D", "C")], &["D"], "A");
            assert!(ask(&mut m, descent, "A"));
            for name in ["A", "B", "C"] {
                let id = m.lookup(name).unwrap();
                assert_eq!(m.truth(id), Truth::True, "{descent:?} {name}");
            }
        }
    }

    #[test]
    fn later_rule_proves_a_parked_fact() {
        // A parks `B ⇒ A` on B, then `E ⇒ A` proves it directly
        for descent in DESCENTS {
            let mut m = model(&[("B", "A"), ("A", "B"), ("E", "A")], &["E"], "B");
            assert!(ask(&mut m, descent, "B"));
            let a = m.lookup("A").unwrap();
            assert_eq!(m.truth(a), Truth::True);
        }
    }

    #[test]
    fn nested_cycles_collapse_at_their_root() {
        for descent in DESCENTS {
            let mut m = model(
                &[("B", "A"), ("C", "B"), ("B", "C"), ("X", "A")],
                &["X"],
                "A",
            );
            assert!(ask(&mut m, descent, "A"));
            let b = m.lookup("B").unwrap();
            assert_eq!(m.truth(b), Truth::False);
        }
    }

    #[test]
    fn false_antecedent_stops_the_scan() {
        for descent in DESCENTS {
            let mut m = model(&[("A∧B∧C", "Q")], &["B", "C"], "Q");
            let q = m.lookup("Q").unwrap();
            let mut engine = BackwardEngine::with_descent(&mut m, descent);
            assert!(!engine.prove(q));
            // A is visited once it is known False; B and C never are
            assert_eq!(engine.stats().antecedents_visited, 1);
            assert_eq!(engine.stats().rules_examined, 1);
        }
    }

    #[test]
    fn rules_after_a_proof_are_not_examined() {
        let mut m = model(&[("A", "Q"), ("B", "Q")], &["A"], "Q");
        let q = m.lookup("Q").unwrap();
        let mut engine = BackwardEngine::new(&mut m);
        assert!(engine.prove(q));
        assert_eq!(engine.stats().rules_examined, 1);
        let b = engine.model().lookup("B").unwrap();
        assert_eq!(engine.model().truth(b), Truth::Unknown);
    }

    #[test]
    fn discovery_order_follows_the_search() {
        let mut m = model(&[("B∧C", "A"), ("D", "B")], &["C", "D"], "A");
        let a = m.lookup("A").unwrap();
        assert!(BackwardEngine::new(&mut m).prove(a));
        let order = |name: &str| m.fact(m.lookup(name).unwrap()).discovery_order();
        assert_eq!(order("A"), Some(0));
        assert_eq!(order("B"), Some(1));
        assert_eq!(order("C"), None);
    }

    #[test]
    fn compound_question_short_circuits() {
        let mut m = model(&[], &["B"], "(A∨B)");
        let q = m.question().clone();
        let mut engine = BackwardEngine::new(&mut m);
        assert!(engine.holds(&q));
        assert_eq!(engine.stats().facts_expanded, 0);
        let a = engine.model().lookup("A").unwrap();
        assert_eq!(engine.model().truth(a), Truth::Unknown);
    }
}
