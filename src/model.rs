//! Facts, rules and the model that owns them.
//!
//! Facts and rules live in arenas and are addressed by copyable handles.
//! Structure (names, antecedents, consequents, which rules conclude a fact)
//! is fixed at construction; everything else is per-query evaluation state
//! that [`Model::reset`] puts back to its initial values.

use std::fmt;

use crate::error::Error;
use crate::formula::Formula;
use crate::parser::parse_question;
use crate::resolve::FactTable;

/// Handle of a fact inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub(crate) usize);

impl FactId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a rule inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Evaluation state of a fact.
///
/// The forward engine only ever moves Unknown -> True. The backward engine
/// moves Unknown -> Pending -> {True, False}; Pending never outlives a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Truth {
    #[default]
    Unknown,
    Pending,
    True,
    False,
}

impl Truth {
    pub fn is_true(self) -> bool {
        self == Truth::True
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Truth::Unknown => "unknown",
            Truth::Pending => "pending",
            Truth::True => "true",
            Truth::False => "false",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Fact {
    name: String,
    justifications: Vec<RuleId>,

    pub(crate) truth: Truth,
    pub(crate) order: Option<usize>,
    pub(crate) consumed: bool,
    pub(crate) dependent_rules: Vec<RuleId>,
    pub(crate) pending_obligations: Vec<RuleId>,
}

impl Fact {
    pub(crate) fn new(name: &str) -> Self {
        Fact {
            name: name.to_string(),
            justifications: vec![],
            truth: Truth::Unknown,
            order: None,
            consumed: false,
            dependent_rules: vec![],
            pending_obligations: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn truth(&self) -> Truth {
        self.truth
    }

    /// Order in which the backward engine first visited this fact.
    pub fn discovery_order(&self) -> Option<usize> {
        self.order
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Rules that conclude this fact, in declaration order.
    pub fn justifications(&self) -> &[RuleId] {
        &self.justifications
    }

    /// Rules using this fact as an antecedent (forward pre-processing).
    pub fn dependent_rules(&self) -> &[RuleId] {
        &self.dependent_rules
    }

    /// Rules waiting for this fact to leave the Pending state.
    pub fn pending_obligations(&self) -> &[RuleId] {
        &self.pending_obligations
    }

    fn reset(&mut self) {
        self.truth = Truth::Unknown;
        self.order = None;
        self.consumed = false;
        self.dependent_rules.clear();
        self.pending_obligations.clear();
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    antecedents: Vec<FactId>,
    consequent: FactId,

    pub(crate) remaining: usize,
    pub(crate) pending_count: usize,
}

impl Rule {
    pub(crate) fn new(antecedents: Vec<FactId>, consequent: FactId) -> Self {
        let remaining = antecedents.len();
        Rule { antecedents, consequent, remaining, pending_count: 0 }
    }

    pub fn antecedents(&self) -> &[FactId] {
        &self.antecedents
    }

    pub fn consequent(&self) -> FactId {
        self.consequent
    }

    /// Forward engine: antecedent occurrences not yet seen true.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Backward engine: antecedent occurrences still Pending.
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    fn reset(&mut self) {
        self.remaining = self.antecedents.len();
        self.pending_count = 0;
    }
}

/// A rule set, its fact base and its question, ready for evaluation.
#[derive(Debug, Clone)]
pub struct Model {
    table: FactTable,
    rules: Vec<Rule>,
    base: Vec<FactId>,
    question: Formula,
}

impl Model {
    pub(crate) fn new(
        mut table: FactTable,
        rules: Vec<Rule>,
        base: Vec<FactId>,
        question: Formula,
    ) -> Self {
        for (i, rule) in rules.iter().enumerate() {
            table.fact_mut(rule.consequent).justifications.push(RuleId(i));
        }
        Model { table, rules, base, question }
    }

    pub fn fact(&self, id: FactId) -> &Fact {
        self.table.fact(id)
    }

    pub(crate) fn fact_mut(&mut self, id: FactId) -> &mut Fact {
        self.table.fact_mut(id)
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub(crate) fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id.0]
    }

    pub fn truth(&self, id: FactId) -> Truth {
        self.fact(id).truth
    }

    pub fn name(&self, id: FactId) -> &str {
        self.table.name(id)
    }

    pub fn fact_count(&self) -> usize {
        self.table.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.table.iter()
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    /// Facts assumed true before inference, in description order.
    pub fn facts_base(&self) -> &[FactId] {
        &self.base
    }

    /// The question the model was built with.
    pub fn question(&self) -> &Formula {
        &self.question
    }

    /// Resolve a fact by name; unknown names are malformed input.
    pub fn lookup(&self, name: &str) -> Result<FactId, Error> {
        self.table
            .get(name.trim())
            .ok_or_else(|| Error::MalformedInput(format!("no fact named `{}`", name.trim())))
    }

    /// Parse a further question against this model's existing facts.
    pub fn parse_question(&self, text: &str) -> Result<Formula, Error> {
        if text.trim().is_empty() {
            return Err(Error::MalformedInput("question references no facts".into()));
        }
        let expr = parse_question(text)?;
        Formula::from_expr(&expr, &mut |name| self.lookup(name))
    }

    /// Facts currently in the Pending state.
    pub fn pending_facts(&self) -> Vec<FactId> {
        self.facts()
            .filter(|(_, f)| f.truth == Truth::Pending)
            .map(|(id, _)| id)
            .collect()
    }

    /// Record every rule in the `dependent_rules` of each of its antecedents,
    /// once per occurrence.
    pub(crate) fn link_dependents(&mut self) {
        for (i, rule) in self.rules.iter().enumerate() {
            for &a in &rule.antecedents {
                self.table.fact_mut(a).dependent_rules.push(RuleId(i));
            }
        }
    }

    /// Put every fact and rule back to its pre-query state.
    pub fn reset(&mut self) {
        for fact in self.table.iter_mut() {
            fact.reset();
        }
        for rule in &mut self.rules {
            rule.reset();
        }
    }

    /// `A ∧ B ⇒ C`
    pub fn describe_rule(&self, id: RuleId) -> String {
        let rule = self.rule(id);
        let body = rule
            .antecedents
            .iter()
            .map(|&a| self.name(a))
            .collect::<Vec<_>>()
            .join(" ∧ ");
        format!("{body} ⇒ {}", self.name(rule.consequent))
    }

    /// Render a formula with this model's fact names.
    pub fn describe_formula(&self, formula: &Formula) -> String {
        match formula {
            Formula::Fact(id) => self.name(*id).to_string(),
            Formula::All(ops) | Formula::Any(ops) => {
                let sep = if matches!(formula, Formula::All(_)) { "∧" } else { "∨" };
                let inner = ops
                    .iter()
                    .map(|op| self.describe_formula(op))
                    .collect::<Vec<_>>()
                    .join(sep);
                format!("({inner})")
            }
        }
    }
}
