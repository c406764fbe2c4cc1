//! Questions over facts and their three-valued evaluation.

use crate::ast::{Connective, Expr};
use crate::error::Error;
use crate::model::{FactId, Truth};

/// Three-valued truth for formula evaluation (strong Kleene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriState {
    True,
    False,
    Unknown,
}

impl TriState {
    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }

    /// False wins, then Unknown.
    pub fn and(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::False, _) | (_, TriState::False) => TriState::False,
            (TriState::True, TriState::True) => TriState::True,
            _ => TriState::Unknown,
        }
    }

    /// True wins, then Unknown.
    pub fn or(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::True, _) | (_, TriState::True) => TriState::True,
            (TriState::False, TriState::False) => TriState::False,
            _ => TriState::Unknown,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { TriState::True } else { TriState::False }
    }
}

impl From<Truth> for TriState {
    fn from(value: Truth) -> Self {
        match value {
            Truth::True => TriState::True,
            Truth::False => TriState::False,
            Truth::Unknown | Truth::Pending => TriState::Unknown,
        }
    }
}

/// Something that can report a fact's current value and, on demand,
/// work out an unknown one.
pub trait Oracle {
    fn peek(&self, fact: FactId) -> TriState;
    fn resolve(&mut self, fact: FactId) -> TriState;
}

/// A question: a fact, or a conjunction/disjunction of sub-formulas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Fact(FactId),
    All(Vec<Formula>),
    Any(Vec<Formula>),
}

impl Formula {
    /// Build from a parsed expression, mapping each name through `fact`.
    pub fn from_expr<F>(expr: &Expr, fact: &mut F) -> Result<Formula, Error>
    where
        F: FnMut(&str) -> Result<FactId, Error>,
    {
        match expr {
            Expr::Fact(name) => Ok(Formula::Fact(fact(name)?)),
            Expr::Compound { connective, operands } => {
                let ops = operands
                    .iter()
                    .map(|op| Formula::from_expr(op, fact))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match connective {
                    Connective::And => Formula::All(ops),
                    Connective::Or => Formula::Any(ops),
                })
            }
        }
    }

    pub fn as_fact(&self) -> Option<FactId> {
        match self {
            Formula::Fact(id) => Some(*id),
            _ => None,
        }
    }

    /// Referenced facts, left to right, repetitions included.
    pub fn facts(&self) -> Vec<FactId> {
        let mut out = vec![];
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<FactId>) {
        match self {
            Formula::Fact(id) => out.push(*id),
            Formula::All(ops) | Formula::Any(ops) => {
                for op in ops {
                    op.collect(out);
                }
            }
        }
    }

    /// Value under the current state, without resolving anything.
    pub fn peek<O: Oracle + ?Sized>(&self, oracle: &O) -> TriState {
        match self {
            Formula::Fact(id) => oracle.peek(*id),
            Formula::All(ops) => ops
                .iter()
                .fold(TriState::True, |acc, op| acc.and(op.peek(oracle))),
            Formula::Any(ops) => ops
                .iter()
                .fold(TriState::False, |acc, op| acc.or(op.peek(oracle))),
        }
    }

    /// Value with unknown leaves resolved lazily.
    ///
    /// At every connective the current state is consulted first, so an
    /// operand that already decides the result short-circuits before any
    /// sibling is resolved. Otherwise operands are resolved left to right and
    /// the scan stops at the first deciding one.
    pub fn decide<O: Oracle + ?Sized>(&self, oracle: &mut O) -> TriState {
        let now = self.peek(oracle);
        if now.is_known() {
            return now;
        }

        match self {
            Formula::Fact(id) => oracle.resolve(*id),
            Formula::All(ops) => {
                let mut acc = TriState::True;
                for op in ops {
                    acc = acc.and(op.decide(oracle));
                    if acc == TriState::False {
                        break;
                    }
                }
                acc
            }
            Formula::Any(ops) => {
                let mut acc = TriState::False;
                for op in ops {
                    acc = acc.or(op.decide(oracle));
                    if acc == TriState::True {
                        break;
                    }
                }
                acc
            }
        }
    }
}
