//! Random rooted AND-OR instances for exercising the engines.

use std::collections::VecDeque;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ast::{Description, RuleText};

/// Name of the root fact; every generated question asks for it.
pub const ROOT: &str = "Q";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Shape {
    /// Every antecedent slot gets a fresh fact: the rule graph is a tree.
    #[default]
    Acyclic,
    /// Antecedent slots may point back at facts already in the graph.
    Cyclic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Upper bound on the number of rules.
    pub rules: usize,
    pub max_antecedents: usize,
    pub shape: Shape,
    /// Chance that a cyclic-shape slot reuses an existing fact.
    pub back_edge_probability: f64,
    /// Chance that a leaf is put in the fact base.
    pub grounding: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            rules: 10,
            max_antecedents: 3,
            shape: Shape::Acyclic,
            back_edge_probability: 0.4,
            grounding: 1.0,
        }
    }
}

/// Grow an instance breadth first from [`ROOT`].
///
/// Each expanded fact gets between 1 and `max(1, rules / 4)` rules, each rule
/// between 1 and `max_antecedents` antecedents. A rule never lists its own
/// consequent. Facts that end up without rules form the fact base, minus the
/// root and minus whatever `grounding` drops.
pub fn generate<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Description {
    let per_node = (config.rules / 4).max(1);
    let width = config.max_antecedents.max(1);
    let back_edge = probability(config.back_edge_probability);

    let mut names = vec![ROOT.to_string()];
    let mut concluded = vec![false];
    let mut rules: Vec<(Vec<usize>, usize)> = Vec::with_capacity(config.rules);
    let mut queue = VecDeque::from([0usize]);

    while rules.len() < config.rules {
        let Some(node) = queue.pop_front() else {
            break;
        };

        let count = rng.gen_range(1..=per_node).min(config.rules - rules.len());
        for _ in 0..count {
            let slots = rng.gen_range(1..=width);
            let mut antecedents = Vec::with_capacity(slots);

            for _ in 0..slots {
                let reuse = config.shape == Shape::Cyclic
                    && names.len() > 1
                    && rng.gen_bool(back_edge);

                let fact = if reuse {
                    // any existing fact except `node`
                    let k = rng.gen_range(0..names.len() - 1);
                    if k >= node { k + 1 } else { k }
                } else {
                    let fresh = names.len();
                    names.push(fact_name(fresh - 1));
                    concluded.push(false);
                    queue.push_back(fresh);
                    fresh
                };
                antecedents.push(fact);
            }

            rules.push((antecedents, node));
            concluded[node] = true;
        }
    }

    let grounding = probability(config.grounding);
    let facts_base = (1..names.len())
        .filter(|&i| !concluded[i])
        .filter(|_| rng.gen_bool(grounding))
        .map(|i| names[i].clone())
        .collect();

    let rules = rules
        .into_iter()
        .map(|(antecedents, consequent)| {
            let body = antecedents
                .iter()
                .map(|&i| names[i].as_str())
                .collect::<Vec<_>>()
                .join("∧");
            RuleText::new(body, names[consequent].clone())
        })
        .collect();

    Description { rules, facts_base, question: ROOT.to_string() }
}

/// Same as [`generate`] with a seeded [`StdRng`].
pub fn generate_seeded(config: &GeneratorConfig, seed: u64) -> Description {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(config, &mut rng)
}

/// `A1..A20, B1..B20, .. Z1..Z20, A21..A40, ..`
pub fn fact_name(index: usize) -> String {
    let letter = (b'A' + ((index / 20) % 26) as u8) as char;
    let number = index % 20 + 1 + 20 * (index / 520);
    format!("{letter}{number}")
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_model;
    use std::collections::HashSet;

    #[test]
    fn names() {
        assert_eq!(fact_name(0), "A1");
        assert_eq!(fact_name(19), "A20");
        assert_eq!(fact_name(20), "B1");
        assert_eq!(fact_name(519), "Z20");
        assert_eq!(fact_name(520), "A21");
        let all: HashSet<_> = (0..2000).map(fact_name).collect();
        assert_eq!(all.len(), 2000);
    }

    #[test]
    fn acyclic_uses_the_whole_budget() {
        let config = GeneratorConfig { rules: 40, ..GeneratorConfig::default() };
        let d = generate_seeded(&config, 7);
        assert_eq!(d.rules.len(), 40);
        assert_eq!(d.question, ROOT);
        assert!(d.rules.iter().all(|r| r.antecedents.split('∧').count() <= 3));
        assert!(!d.facts_base.is_empty());
        assert!(!d.facts_base.iter().any(|f| f == ROOT));
        build_model(&d).unwrap();
    }

    #[test]
    fn seeds_are_reproducible() {
        let config = GeneratorConfig { rules: 25, shape: Shape::Cyclic, ..Default::default() };
        assert_eq!(generate_seeded(&config, 3), generate_seeded(&config, 3));
    }

    #[test]
    fn cyclic_instances_never_conclude_an_antecedent() {
        let config = GeneratorConfig {
            rules: 60,
            max_antecedents: 4,
            shape: Shape::Cyclic,
            back_edge_probability: 0.8,
            grounding: 0.5,
        };
        for seed in 0..20 {
            let d = generate_seeded(&config, seed);
            for rule in &d.rules {
                assert!(!rule.antecedents.split('∧').any(|a| a == rule.consequent));
            }
            build_model(&d).unwrap();
        }
    }

    #[test]
    fn no_rules_leaves_a_bare_question() {
        let config = GeneratorConfig { rules: 0, ..Default::default() };
        let d = generate_seeded(&config, 1);
        assert!(d.rules.is_empty());
        assert!(d.facts_base.is_empty());
    }
}
