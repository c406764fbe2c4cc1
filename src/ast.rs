use std::fmt;

use serde::{Deserialize, Serialize};

/// Boolean connective joining the operands of a compound expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And, // ∧
    Or,  // ∨
}

impl Connective {
    pub fn symbol(self) -> &'static str {
        match self {
            Connective::And => "∧",
            Connective::Or => "∨",
        }
    }
}

/// Parsed question or antecedent expression, still keyed by fact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Fact(String),
    Compound { connective: Connective, operands: Vec<Expr> },
}

impl Expr {
    pub fn and(operands: Vec<Expr>) -> Self {
        Expr::Compound { connective: Connective::And, operands }
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Expr::Compound { connective: Connective::Or, operands }
    }

    /// Fact names in left-to-right order, repetitions included.
    pub fn fact_names(&self) -> Vec<&str> {
        let mut out = vec![];
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Fact(name) => out.push(name),
            Expr::Compound { operands, .. } => {
                for op in operands {
                    op.collect_names(out);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Fact(name) => write!(f, "{name}"),
            Expr::Compound { connective, operands } => {
                write!(f, "(")?;
                for (i, op) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", connective.symbol())?;
                    }
                    write!(f, "{op}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// External rule-set description: rules, fact base and question as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(alias = "base_of_rules")]
    pub rules: Vec<RuleText>,
    #[serde(alias = "facts base", alias = "base_of_facts", default)]
    pub facts_base: Vec<String>,
    pub question: String,
}

impl Description {
    pub fn new<'a, R, F>(rules: R, facts_base: F, question: impl Into<String>) -> Self
    where
        R: IntoIterator<Item = (&'a str, &'a str)>,
        F: IntoIterator<Item = &'a str>,
    {
        Description {
            rules: rules.into_iter().map(|(a, c)| RuleText::new(a, c)).collect(),
            facts_base: facts_base.into_iter().map(String::from).collect(),
            question: question.into(),
        }
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One rule as text: an antecedent conjunction and a consequent name.
///
/// Deserializes from either `["A∧B", "C"]` or `"A∧B=>C"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct RuleText {
    pub antecedents: String,
    pub consequent: String,
}

impl RuleText {
    pub fn new(antecedents: impl Into<String>, consequent: impl Into<String>) -> Self {
        RuleText { antecedents: antecedents.into(), consequent: consequent.into() }
    }
}

impl fmt::Display for RuleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.antecedents, self.consequent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Pair(String, String),
    Line(String),
}

const ARROWS: [&str; 2] = ["=>", "⇒"];

impl TryFrom<RawRule> for RuleText {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        match raw {
            RawRule::Pair(antecedents, consequent) => Ok(RuleText { antecedents, consequent }),
            RawRule::Line(line) => ARROWS
                .iter()
                .find_map(|arrow| line.split_once(arrow))
                .map(|(a, c)| RuleText::new(a.trim(), c.trim()))
                .ok_or_else(|| format!("rule `{line}` has no `=>`")),
        }
    }
}

impl From<RuleText> for RawRule {
    fn from(rule: RuleText) -> Self {
        RawRule::Pair(rule.antecedents, rule.consequent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_rule_shapes_and_key_aliases() {
        let json = r#"{
            "base_of_rules": [["A∧B", "C"], "C ∧ D => E", "F⇒G"],
            "base_of_facts": ["A", "B"],
            "question": "E"
        }"#;
        let d = Description::from_json(json).unwrap();
        assert_eq!(d.rules[0], RuleText::new("A∧B", "C"));
        assert_eq!(d.rules[1], RuleText::new("C ∧ D", "E"));
        assert_eq!(d.rules[2], RuleText::new("F", "G"));
        assert_eq!(d.facts_base, vec!["A", "B"]);
    }

    #[test]
    fn rule_line_without_arrow_is_rejected() {
        let json = r#"{"rules": ["A B"], "facts_base": [], "question": "A"}"#;
        assert!(Description::from_json(json).is_err());
    }

    #[test]
    fn writes_pairs() {
        let d = Description::new([("A", "B")], ["A"], "B");
        let json = d.to_json().unwrap();
        assert!(!json.contains("=>"));
        assert_eq!(Description::from_json(&json).unwrap(), d);
    }

    #[test]
    fn display_brackets_compounds() {
        let e = Expr::and(vec![
            Expr::or(vec![Expr::Fact("A".into()), Expr::Fact("B".into())]),
            Expr::Fact("C".into()),
        ]);
        assert_eq!(e.to_string(), "((A∨B)∧C)");
        assert_eq!(e.fact_names(), vec!["A", "B", "C"]);
    }
}
