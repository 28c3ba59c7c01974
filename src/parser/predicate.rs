//! WHERE clauses of DELETE statements applied to in-memory rows
//!
//! Supported forms are comparisons of a column against a literal, `IS [NOT]
//! NULL`, `[NOT] IN (...)`, combined with AND, OR, NOT, and parentheses.
//! Evaluation uses three-valued logic; a row is affected only when the
//! predicate is true.

use std::cmp::Ordering;

use super::token_parser_base::{split_on_separators, TokenParser};
use super::tokenizer::{Token, TokenType};
use crate::model::name::split_identifier_parts;
use crate::model::{Row, SqlValue, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn from_operator(op: &str) -> Option<Self> {
        match op {
            "=" => Some(CompareOp::Eq),
            "<>" | "!=" => Some(CompareOp::NotEq),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::LtEq),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::GtEq),
            _ => None,
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    Compare {
        column: String,
        op: CompareOp,
        value: SqlValue,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    In {
        column: String,
        values: Vec<SqlValue>,
        negated: bool,
    },
}

/// Parse a WHERE clause. Returns `None` for anything outside the supported forms.
pub fn parse_predicate(tokens: &[Token]) -> Option<Predicate> {
    let mut parser = TokenParser::new(tokens);
    let predicate = parse_or(&mut parser)?;
    parser.is_at_end().then_some(predicate)
}

fn parse_or(parser: &mut TokenParser) -> Option<Predicate> {
    let mut left = parse_and(parser)?;
    while parser.accept_word("OR") {
        let right = parse_and(parser)?;
        left = Predicate::Or(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_and(parser: &mut TokenParser) -> Option<Predicate> {
    let mut left = parse_unary(parser)?;
    while parser.accept_word("AND") {
        let right = parse_unary(parser)?;
        left = Predicate::And(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_unary(parser: &mut TokenParser) -> Option<Predicate> {
    if parser.accept_word("NOT") {
        return Some(Predicate::Not(Box::new(parse_unary(parser)?)));
    }
    if let Some(group) = parser.parse_paren_group() {
        return parse_predicate(group.inner());
    }
    parse_condition(parser)
}

fn parse_condition(parser: &mut TokenParser) -> Option<Predicate> {
    let token = parser.next_token()?;
    if !token.is_name_like() {
        return None;
    }
    // `t.col` refers to the column of the only table in scope
    let column = split_identifier_parts(token.value()).pop()?;

    if parser.accept_word("IS") {
        let negated = parser.accept_word("NOT");
        parser.expect_word("NULL")?;
        return Some(Predicate::IsNull { column, negated });
    }

    let negated = parser.accept_word("NOT");
    if parser.accept_word("IN") {
        let group = parser.parse_paren_group()?;
        let values = split_on_separators(group.inner())
            .into_iter()
            .map(parse_literal)
            .collect::<Option<Vec<_>>>()?;
        return Some(Predicate::In {
            column,
            values,
            negated,
        });
    }
    if negated {
        return None;
    }

    let op = parser.expect_type(TokenType::Operator)?;
    let op = CompareOp::from_operator(op.value())?;
    // a literal is one token, or a sign and a number
    let remaining = parser.remaining();
    let len = match remaining {
        [sign, number, ..]
            if sign.token_type() == TokenType::Operator
                && number.token_type() == TokenType::Number =>
        {
            2
        }
        [_, ..] => 1,
        [] => return None,
    };
    let value = parse_literal(&remaining[..len])?;
    parser.set_pos(parser.pos() + len);
    Some(Predicate::Compare { column, op, value })
}

fn parse_literal(tokens: &[Token]) -> Option<SqlValue> {
    match SqlValue::from_tokens(tokens) {
        SqlValue::Expression(_) => None,
        value => Some(value),
    }
}

impl Predicate {
    /// Evaluate against a row of `table`. `None` means unknown (SQL NULL semantics).
    pub fn evaluate(&self, table: &Table, row: &Row) -> Option<bool> {
        match self {
            Predicate::And(a, b) => match (a.evaluate(table, row), b.evaluate(table, row)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Predicate::Or(a, b) => match (a.evaluate(table, row), b.evaluate(table, row)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            Predicate::Not(p) => p.evaluate(table, row).map(|b| !b),
            Predicate::IsNull { column, negated } => {
                let is_null = cell(table, row, column)?.0.is_null();
                Some(is_null != *negated)
            }
            Predicate::Compare { column, op, value } => compare(table, row, column, value)
                .map(|ordering| op.holds(ordering)),
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let mut unknown = false;
                for value in values {
                    match compare(table, row, column, value) {
                        Some(Ordering::Equal) => return Some(!negated),
                        None => unknown = true,
                        Some(_) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(*negated)
                }
            }
        }
    }
}

fn cell<'a>(table: &'a Table, row: &'a Row, column: &str) -> Option<(&'a SqlValue, usize)> {
    let index = table.column_index(column)?;
    Some((row.get(index).unwrap_or(&SqlValue::Null), index))
}

fn compare(table: &Table, row: &Row, column: &str, value: &SqlValue) -> Option<Ordering> {
    let (cell_value, index) = cell(table, row, column)?;
    let data_type = Some(&table.columns[index].data_type);
    let left = cell_value.comparison_key(data_type);
    let right = value.comparison_key(data_type);
    left.compare(&right).or_else(|| {
        // keys that have no order can still be equal
        (!cell_value.is_null() && !value.is_null() && left == right).then_some(Ordering::Equal)
    })
}
