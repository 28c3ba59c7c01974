//! Cell values and type-aware comparison

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use super::data_type::DataType;
use crate::parser::TokenSet;
use crate::parser::tokenizer::{Token, TokenType};
use crate::util::quote_string;

/// A literal as written in a script or read from a live database.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    /// Numeric literal text including sign (`-1.50`, `0x1F`)
    Number(String),
    String { value: String, unicode: bool },
    /// Anything that is not a plain literal (`getdate()`, `newid()`)
    Expression(String),
}

/// Normalized form of a value used for equality and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Integer(i128),
    Decimal(String),
    DateTime(String),
    Text(String),
    Binary(String),
    Expression(String),
}

static HEX_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]*$").expect("Invalid hex regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%d %H:%M:%S%.f",
    "%Y%m%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"];

impl SqlValue {
    pub fn string(value: &str) -> Self {
        Self::String {
            value: value.to_string(),
            unicode: false,
        }
    }

    pub fn number(value: impl ToString) -> Self {
        Self::Number(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Interpret a value expression. Redundant parentheses are ignored and a
    /// sign applied to a number folds into the literal.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut tokens = tokens;
        while tokens.len() == 1 && tokens[0].is_paren_group() {
            tokens = tokens[0].inner();
        }
        match tokens {
            [] => Self::Null,
            [token] => match token.token_type() {
                TokenType::Number => Self::Number(token.value().to_string()),
                TokenType::StringValue => Self::String {
                    value: token.value().to_string(),
                    unicode: token.is_unicode(),
                },
                _ if token.is_word("NULL") => Self::Null,
                _ => Self::Expression(token.render()),
            },
            [sign, number]
                if sign.token_type() == TokenType::Operator
                    && (sign.value() == "-" || sign.value() == "+")
                    && number.token_type() == TokenType::Number =>
            {
                if sign.value() == "-" {
                    Self::Number(format!("-{}", number.value()))
                } else {
                    Self::Number(number.value().to_string())
                }
            }
            _ => Self::Expression(TokenSet::from_tokens(tokens.to_vec()).render()),
        }
    }

    /// Render as a SQL literal for a column of `data_type`.
    pub fn to_sql(&self, data_type: Option<&DataType>) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Number(n) => n.clone(),
            Self::String { value, unicode } => {
                let unicode = *unicode || data_type.is_some_and(|t| t.is_unicode());
                quote_string(value, unicode)
            }
            Self::Expression(e) => e.clone(),
        }
    }

    /// Raw text of a literal, `None` for NULL.
    fn literal_text(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Number(n) => Some(n),
            Self::String { value, .. } => Some(value),
            Self::Expression(e) => Some(e),
        }
    }

    /// Comparison key under the semantics of `data_type`.
    ///
    /// `'1'` and `1` are the same int; datetimes are compared after rounding
    /// to the precision SQL Server stores; strings ignore trailing spaces.
    pub fn comparison_key(&self, data_type: Option<&DataType>) -> ValueKey {
        if let Self::Expression(e) = self {
            return ValueKey::Expression(TokenSet::parse(e).render().to_lowercase());
        }
        let Some(text) = self.literal_text() else {
            return ValueKey::Null;
        };
        let is_number = matches!(self, Self::Number(_));
        let Some(data_type) = data_type else {
            return if is_number {
                ValueKey::Decimal(normalize_decimal(text))
            } else {
                ValueKey::Text(text.to_string())
            };
        };

        if data_type.is_integer() || data_type.is_bit() {
            if let Some(n) = parse_integer(text, data_type.is_bit()) {
                return ValueKey::Integer(n);
            }
        } else if data_type.is_decimal() {
            return ValueKey::Decimal(normalize_decimal(text));
        } else if data_type.is_legacy_datetime() {
            if let Some(dt) = parse_datetime(text) {
                let rounded = if data_type.name == "smalldatetime" {
                    round_to_minute(dt)
                } else {
                    round_to_datetime_tick(dt)
                };
                return ValueKey::DateTime(rounded.format("%Y-%m-%d %H:%M:%S%.3f").to_string());
            }
        } else if data_type.name == "date" {
            if let Some(dt) = parse_datetime(text) {
                return ValueKey::DateTime(dt.format("%Y-%m-%d").to_string());
            }
        } else if data_type.name == "datetime2" {
            if let Some(dt) = parse_datetime(text) {
                return ValueKey::DateTime(dt.format("%Y-%m-%d %H:%M:%S%.9f").to_string());
            }
        } else if data_type.name == "time" {
            if let Ok(t) = NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f") {
                return ValueKey::DateTime(t.format("%H:%M:%S%.9f").to_string());
            }
        } else if data_type.name == "uniqueidentifier" {
            return ValueKey::Text(text.trim().to_ascii_lowercase());
        } else if data_type.is_binary() && HEX_LITERAL.is_match(text) {
            return ValueKey::Binary(text[2..].to_ascii_lowercase());
        } else if data_type.is_character() {
            return ValueKey::Text(text.trim_end_matches(' ').to_string());
        }

        if is_number {
            ValueKey::Decimal(normalize_decimal(text))
        } else {
            ValueKey::Text(text.to_string())
        }
    }
}

impl ValueKey {
    /// Ordering between two keys of the same kind, as used by `<`/`>` predicates.
    /// Keys of different kinds are unordered.
    pub fn compare(&self, other: &ValueKey) -> Option<Ordering> {
        match (self, other) {
            (ValueKey::Null, _) | (_, ValueKey::Null) => None,
            (ValueKey::Integer(a), ValueKey::Integer(b)) => Some(a.cmp(b)),
            (ValueKey::Decimal(a), ValueKey::Decimal(b)) => {
                let a = a.parse::<f64>().ok()?;
                let b = b.parse::<f64>().ok()?;
                a.partial_cmp(&b)
            }
            (ValueKey::Integer(a), ValueKey::Decimal(b)) => (*a as f64).partial_cmp(&b.parse().ok()?),
            (ValueKey::Decimal(a), ValueKey::Integer(b)) => a.parse::<f64>().ok()?.partial_cmp(&(*b as f64)),
            (ValueKey::DateTime(a), ValueKey::DateTime(b))
            | (ValueKey::Text(a), ValueKey::Text(b))
            | (ValueKey::Binary(a), ValueKey::Binary(b)) => Some(a.to_lowercase().cmp(&b.to_lowercase())),
            _ => None,
        }
    }
}

fn parse_integer(text: &str, bit: bool) -> Option<i128> {
    let text = text.trim();
    if bit {
        if text.eq_ignore_ascii_case("true") {
            return Some(1);
        }
        if text.eq_ignore_ascii_case("false") {
            return Some(0);
        }
    }
    let value = match text.parse::<i128>() {
        Ok(v) => v,
        // `1.0` stored in an int column
        Err(_) => {
            let normalized = normalize_decimal(text);
            if normalized.contains('.') {
                return None;
            }
            normalized.parse::<i128>().ok()?
        }
    };
    Some(if bit && value != 0 { 1 } else { value })
}

/// Canonical decimal text: no leading `+`, no redundant zeros, `-0` is `0`.
fn normalize_decimal(text: &str) -> String {
    let text = text.trim();
    if text.contains(['e', 'E']) && !HEX_LITERAL.is_match(text) {
        if let Ok(f) = text.parse::<f64>() {
            return normalize_decimal(&f.to_string());
        }
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return text.to_ascii_lowercase();
    }
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let mut out = String::new();
    if negative && !(int_part == "0" && frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(int_part);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// `datetime` stores time in ticks of 1/300 second (.000, .003, .007).
fn round_to_datetime_tick(dt: NaiveDateTime) -> NaiveDateTime {
    let nanos = dt.nanosecond().min(999_999_999) as i64;
    let ticks = (nanos * 300 + 500_000_000) / 1_000_000_000;
    let millis = (ticks * 10 + 1) / 3;
    match dt.with_nanosecond(0) {
        Some(base) => base + Duration::milliseconds(millis),
        None => dt,
    }
}

/// `smalldatetime` rounds to the minute; 29.998 seconds rounds down.
fn round_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    let sub_minute = dt.second() as i64 * 1_000_000_000 + dt.nanosecond().min(999_999_999) as i64;
    let truncated = dt.with_second(0).and_then(|d| d.with_nanosecond(0)).unwrap_or(dt);
    if sub_minute >= 29_999_000_000 {
        truncated + Duration::minutes(1)
    } else {
        truncated
    }
}
