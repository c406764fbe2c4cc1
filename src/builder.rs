use tracing::debug;

use crate::ast::{Description, RuleText};
use crate::error::Error;
use crate::formula::Formula;
use crate::model::{FactId, Model, Rule};
use crate::normalize::strip_whitespace;
use crate::parser::{parse_antecedents, parse_fact, parse_question};
use crate::resolve::FactTable;

/// Turn a rule-set description into a model ready for evaluation.
///
/// Every name goes through one [`FactTable`], so a fact mentioned in several
/// rules, the fact base and the question is a single arena entry.
pub fn build_model(description: &Description) -> Result<Model, Error> {
    if strip_whitespace(&description.question).is_empty() {
        return Err(Error::MalformedInput("question references no facts".into()));
    }

    let mut table = FactTable::new();

    let rules = description
        .rules
        .iter()
        .enumerate()
        .map(|(i, text)| build_rule(&mut table, i, text))
        .collect::<Result<Vec<_>, _>>()?;

    let base = description
        .facts_base
        .iter()
        .map(|name| Ok(table.intern(&parse_fact(name)?)))
        .collect::<Result<Vec<FactId>, Error>>()?;

    let expr = parse_question(&description.question)?;
    let question = Formula::from_expr(&expr, &mut |name| Ok(table.intern(name)))?;

    debug!(
        facts = table.len(),
        rules = rules.len(),
        base = base.len(),
        question = %expr,
        "model built"
    );

    Ok(Model::new(table, rules, base, question))
}

/// Parse the description as JSON and build it.
pub fn build_model_from_json(input: &str) -> Result<Model, Error> {
    build_model(&Description::from_json(input)?)
}

fn build_rule(table: &mut FactTable, index: usize, text: &RuleText) -> Result<Rule, Error> {
    if strip_whitespace(&text.antecedents).is_empty() {
        return Err(Error::MalformedInput(format!("rule {index} has no antecedents")));
    }
    if strip_whitespace(&text.consequent).is_empty() {
        return Err(Error::MalformedInput(format!("rule {index} has no consequent")));
    }

    let names = parse_antecedents(&text.antecedents)?;
    let consequent = parse_fact(&text.consequent)?;

    if names.iter().any(|n| *n == consequent) {
        return Err(Error::CycleInvariant { rule: index, fact: consequent });
    }

    let antecedents = names.iter().map(|n| table.intern(n)).collect();
    Ok(Rule::new(antecedents, table.intern(&consequent)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseError;

    #[test]
    fn names_resolve_to_one_fact() {
        let d = Description::new([("A∧B", "C"), ("C ∧ A", "D")], ["A", "B"], "(C∨D)");
        let m = build_model(&d).unwrap();
        assert_eq!(m.fact_count(), 4);

        let a = m.lookup("A").unwrap();
        let c = m.lookup("C").unwrap();
        let (_, r1) = m.rules().nth(1).unwrap();
        assert_eq!(r1.antecedents(), &[c, a]);
        assert_eq!(m.facts_base()[0], a);
        assert_eq!(m.fact(c).justifications().len(), 1);
        assert_eq!(m.describe_formula(m.question()), "(C∨D)");
    }

    #[test]
    fn repeated_antecedents_are_kept() {
        let d = Description::new([("A∧A∧B", "C")], [], "C");
        let m = build_model(&d).unwrap();
        let (id, rule) = m.rules().next().unwrap();
        assert_eq!(rule.antecedents().len(), 3);
        assert_eq!(rule.remaining(), 3);
        assert_eq!(m.describe_rule(id), "A ∧ A ∧ B ⇒ C");
    }

    #[test]
    fn empty_question_is_malformed() {
        let d = Description::new([("A", "B")], ["A"], "  ");
        assert!(matches!(build_model(&d), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn rule_without_antecedents_or_consequent() {
        let d = Description::new([(" ", "B")], [], "B");
        assert!(matches!(build_model(&d), Err(Error::MalformedInput(_))));
        let d = Description::new([("A", "")], [], "A");
        assert!(matches!(build_model(&d), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn self_concluding_rule_is_rejected() {
        let d = Description::new([("A", "B"), ("B∧C", "C")], [], "C");
        match build_model(&d) {
            Err(Error::CycleInvariant { rule, fact }) => {
                assert_eq!(rule, 1);
                assert_eq!(fact, "C");
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        let d = Description::new([("A∨B", "C")], [], "C");
        assert!(matches!(build_model(&d), Err(Error::Parse(ParseError::Syntax(_)))));
        let d = Description::new([("A", "B")], [], "(A∨B");
        assert!(matches!(
            build_model(&d),
            Err(Error::Parse(ParseError::Unbalanced { .. }))
        ));
    }

    #[test]
    fn lookup_and_later_questions() {
        let d = Description::new([("A", "B")], ["A"], "B");
        let m = build_model(&d).unwrap();
        assert!(m.parse_question("(A∧B)").is_ok());
        assert!(matches!(m.lookup("Z"), Err(Error::MalformedInput(_))));
        assert!(matches!(m.parse_question("(A∨Z)"), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn from_json() {
        let m = build_model_from_json(r#"{"rules": ["A => B"], "facts base": ["A"], "question": "B"}"#)
            .unwrap();
        assert_eq!(m.rule_count(), 1);
        assert!(matches!(build_model_from_json("{"), Err(Error::Json(_))));
    }
}
