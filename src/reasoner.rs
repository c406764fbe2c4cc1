use crate::backward::{BackwardEngine, Descent};
use crate::formula::Formula;
use crate::forward::ForwardEngine;
use crate::model::{FactId, Model};
use crate::stats::Stats;

/// Which engine answers a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Forward,
    Backward(Descent),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Backward(Descent::Iterative)
    }
}

/// Outcome of [`query`]: the answer and the work it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub holds: bool,
    pub stats: Stats,
}

/// Forward chaining on a single fact.
pub fn forward_query(model: &mut Model, fact: FactId) -> bool {
    ForwardEngine::new(model).prove(fact)
}

/// Backward chaining with the explicit-stack descent.
pub fn backward_query(model: &mut Model, question: &Formula) -> bool {
    BackwardEngine::new(model).holds(question)
}

/// Answer `question` with the chosen engine. The model is reset first.
pub fn query(model: &mut Model, question: &Formula, strategy: Strategy) -> Answer {
    match strategy {
        Strategy::Forward => {
            let mut engine = ForwardEngine::new(model);
            let holds = match question.as_fact() {
                Some(fact) => engine.prove(fact),
                None => engine.holds(question),
            };
            Answer { holds, stats: *engine.stats() }
        }
        Strategy::Backward(descent) => {
            let mut engine = BackwardEngine::with_descent(model, descent);
            let holds = engine.holds(question);
            Answer { holds, stats: *engine.stats() }
        }
    }
}

/// Answer the model's own question.
pub fn ask(model: &mut Model, strategy: Strategy) -> Answer {
    let question = model.question().clone();
    query(model, &question, strategy)
}
