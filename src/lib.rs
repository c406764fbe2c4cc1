mod ast;
mod backward;
mod builder;
mod error;
mod formula;
mod forward;
mod generator;
mod model;
mod normalize;
mod parser;
mod reasoner;
mod resolve;
mod stats;

pub use ast::*;
pub use backward::{BackwardEngine, Descent};
pub use builder::{build_model, build_model_from_json};
pub use error::Error;
pub use formula::{Formula, Oracle, TriState};
pub use forward::ForwardEngine;
pub use generator::{fact_name, generate, generate_seeded, GeneratorConfig, Shape, ROOT};
pub use model::{Fact, FactId, Model, Rule, RuleId, Truth};
pub use parser::{parse_antecedents, parse_fact, parse_question, parse_rule_line, ParseError};
pub use reasoner::{ask, backward_query, forward_query, query, Answer, Strategy};
pub use resolve::FactTable;
pub use stats::Stats;
