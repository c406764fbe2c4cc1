use crate::ast::Expr;
use crate::parser::ParseError;

/// Drop every whitespace character; names never contain any.
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Reject unbalanced parentheses before the grammar sees the text.
///
/// The reported column is 1-based and counts characters of `input`.
pub fn check_balance(input: &str) -> Result<(), ParseError> {
    let mut open: Vec<usize> = vec![];

    for (i, c) in input.chars().enumerate() {
        match c {
            '(' => open.push(i + 1),
            ')' => {
                if open.pop().is_none() {
                    return Err(ParseError::Unbalanced { column: i + 1 });
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(column) => Err(ParseError::Unbalanced { column }),
        None => Ok(()),
    }
}

/// Merge nested groups that repeat their parent's connective, and unwrap
/// single-operand groups.
///
/// `((A∨B)∨C)∧D` becomes `(A∨B∨C)∧D`, so a compound question reads as a flat
/// list of groups under one top-level connective.
pub fn flatten(expr: Expr) -> Expr {
    match expr {
        Expr::Fact(_) => expr,
        Expr::Compound { connective, operands } => {
            let mut flat = Vec::with_capacity(operands.len());
            for op in operands {
                match flatten(op) {
                    Expr::Compound { connective: inner, operands: nested }
                        if inner == connective =>
                    {
                        flat.extend(nested)
                    }
                    other => flat.push(other),
                }
            }

            if flat.len() == 1 {
                flat.pop().unwrap_or(Expr::Compound { connective, operands: vec![] })
            } else {
                Expr::Compound { connective, operands: flat }
            }
        }
    }
}
