use pest::iterators::Pair;
use pest::Parser as PestParser; // <- trait (gives HornParser::parse)
use pest_derive::Parser;        // <- derive macro (generates Rule enum + impl)
use thiserror::Error;

use crate::ast::*;
use crate::normalize::{check_balance, flatten, strip_whitespace};

#[derive(Parser)]
#[grammar = "horn.pest"]
struct HornParser;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Syntax(#[from] pest::error::Error<Rule>),
    #[error("unbalanced parentheses at column {column}")]
    Unbalanced { column: usize },
    #[error("unexpected rule: {0:?}")]
    Unexpected(Rule),
}

/// Parse a question: a bare fact name or a parenthesized AND/OR expression.
///
/// The result is flattened; an empty input is a syntax error here, the
/// builder reports it as malformed input before calling in.
pub fn parse_question(input: &str) -> Result<Expr, ParseError> {
    let text = prepare(input)?;
    let mut pairs = HornParser::parse(Rule::question, &text)?;
    let top = first_inner(pairs.next(), Rule::question)?;
    Ok(flatten(build_expr(top)?))
}

/// Parse an antecedent conjunction `A∧B∧C` into its names, order and
/// repetitions preserved.
pub fn parse_antecedents(input: &str) -> Result<Vec<String>, ParseError> {
    let text = strip_whitespace(input);
    let mut pairs = HornParser::parse(Rule::antecedents, &text)?;
    let list = pairs.next().ok_or(ParseError::Unexpected(Rule::antecedents))?;
    Ok(fact_names(list))
}

/// Parse a single fact name.
pub fn parse_fact(input: &str) -> Result<String, ParseError> {
    let text = strip_whitespace(input);
    let mut pairs = HornParser::parse(Rule::single_fact, &text)?;
    let single = first_inner(pairs.next(), Rule::single_fact)?;
    Ok(single.as_str().to_string())
}

/// Parse a rule line `A∧B=>C` into antecedent names and consequent.
pub fn parse_rule_line(input: &str) -> Result<(Vec<String>, String), ParseError> {
    let text = strip_whitespace(input);
    let mut pairs = HornParser::parse(Rule::rule_line, &text)?;
    let line = pairs.next().ok_or(ParseError::Unexpected(Rule::rule_line))?;
    let mut names = fact_names(line);
    let consequent = names.pop().ok_or(ParseError::Unexpected(Rule::rule_line))?;
    Ok((names, consequent))
}

fn prepare(input: &str) -> Result<String, ParseError> {
    let text = strip_whitespace(input);
    check_balance(&text)?;
    Ok(text)
}

fn first_inner(pair: Option<Pair<Rule>>, expected: Rule) -> Result<Pair<Rule>, ParseError> {
    pair.and_then(|p| p.into_inner().next())
        .ok_or(ParseError::Unexpected(expected))
}

fn fact_names(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::fact)
        .map(|p| p.as_str().to_string())
        .collect()
}

fn build_expr(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    match pair.as_rule() {
        Rule::fact => Ok(Expr::Fact(pair.as_str().to_string())),
        Rule::expr => {
            let inner = pair.into_inner().next().ok_or(ParseError::Unexpected(Rule::expr))?;
            build_expr(inner)
        }
        Rule::conj => Ok(Expr::and(build_operands(pair)?)),
        Rule::disj => Ok(Expr::or(build_operands(pair)?)),
        r => Err(ParseError::Unexpected(r)),
    }
}

fn build_operands(pair: Pair<Rule>) -> Result<Vec<Expr>, ParseError> {
    pair.into_inner().map(build_expr).collect()
}
