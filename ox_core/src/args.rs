//! Flag-string parsing for report and generator invocations.
//!
//! ```text
//! report volume -m squat --bin monthly
//! generate wendler531 -m "bench-press" -t 200
//! ```
//!
//! Tokens are split with shell-style quoting, then matched against a list
//! of [`ParamSpec`]s by long name (`--movement`) or short alias (`-m`).

use crate::error::ArgError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Type a flag value is coerced to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Str,
    Int,
    Float,
    Date,
}

impl ValueType {
    fn expected(self) -> &'static str {
        match self {
            ValueType::Str => "text",
            ValueType::Int => "an integer",
            ValueType::Float => "a number",
            ValueType::Date => "a date (YYYY-MM-DD)",
        }
    }

    fn coerce(self, flag: &str, raw: &str) -> Result<ParamValue, ArgError> {
        let invalid = || ArgError::InvalidValue {
            flag: flag.to_string(),
            value: raw.to_string(),
            expected: self.expected(),
        };
        match self {
            ValueType::Str => Ok(ParamValue::Str(raw.to_string())),
            ValueType::Int => raw.parse().map(ParamValue::Int).map_err(|_| invalid()),
            ValueType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(ParamValue::Float)
                .ok_or_else(invalid),
            ValueType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(ParamValue::Date)
                .map_err(|_| invalid()),
        }
    }
}

/// A coerced flag value
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Date(d) => write!(f, "{}", d),
        }
    }
}

/// Declared parameter of a report or generator
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    pub default: Option<ParamValue>,
    pub short: Option<char>,
}

impl ParamSpec {
    /// Required parameter with no default
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            default: None,
            short: None,
        }
    }

    /// Optional parameter; `default` may be `None`
    pub fn optional(
        name: impl Into<String>,
        value_type: ValueType,
        default: Option<ParamValue>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: false,
            default,
            short: None,
        }
    }

    pub fn short(mut self, alias: char) -> Self {
        self.short = Some(alias);
        self
    }

    fn long_flag(&self) -> String {
        format!("--{}", self.name)
    }

    /// `-m/--movement <movement>`
    fn usage(&self) -> String {
        let short = self.short.map(|c| format!("-{}/", c)).unwrap_or_default();
        format!("{}--{} <{}>", short, self.name, self.name)
    }
}

/// Parsed flags, one entry per declared parameter
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedArgs {
    values: BTreeMap<String, Option<ParamValue>>,
}

impl ParsedArgs {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value; integers widen
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name)? {
            ParamValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Like [`ParsedArgs::str`] but reports the flag as missing
    pub fn require_str(&self, name: &str) -> Result<&str, ArgError> {
        self.str(name)
            .ok_or_else(|| ArgError::MissingRequired(vec![format!("--{}", name)]))
    }

    pub fn require_float(&self, name: &str) -> Result<f64, ArgError> {
        self.float(name)
            .ok_or_else(|| ArgError::MissingRequired(vec![format!("--{}", name)]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<ParamValue>) {
        self.values.insert(name.into(), value);
    }
}

/// Parse `input` against `params`
pub fn parse_args(params: &[ParamSpec], input: &str) -> Result<ParsedArgs, ArgError> {
    let tokens = split_shell(input)?;
    let mut supplied: BTreeMap<String, ParamValue> = BTreeMap::new();

    let mut tokens = tokens.iter();
    while let Some(token) = tokens.next() {
        let param = if let Some(long) = token.strip_prefix("--") {
            params.iter().find(|p| p.name == long)
        } else if token.len() == 2 && token.starts_with('-') {
            let alias = token.chars().nth(1);
            params.iter().find(|p| p.short.is_some() && p.short == alias)
        } else {
            return Err(ArgError::UnexpectedArgument(token.clone()));
        };
        let param = param.ok_or_else(|| ArgError::UnknownFlag(token.clone()))?;

        let raw = tokens
            .next()
            .ok_or_else(|| ArgError::MissingFlagValue(token.clone()))?;
        let value = param.value_type.coerce(token, raw)?;
        supplied.insert(param.name.clone(), value);
    }

    let missing: Vec<String> = params
        .iter()
        .filter(|p| p.required && !supplied.contains_key(&p.name))
        .map(ParamSpec::long_flag)
        .collect();
    if !missing.is_empty() {
        return Err(ArgError::MissingRequired(missing));
    }

    let mut parsed = ParsedArgs::default();
    for param in params {
        let value = supplied
            .remove(&param.name)
            .or_else(|| param.default.clone());
        parsed.insert(param.name.clone(), value);
    }
    Ok(parsed)
}

/// `report volume -m/--movement <movement> [-b/--bin <bin>]`
pub fn usage(command: &str, name: &str, params: &[ParamSpec]) -> String {
    let mut parts = vec![format!("{} {}", command, name)];
    for param in params {
        if param.required {
            parts.push(param.usage());
        } else {
            parts.push(format!("[{}]", param.usage()));
        }
    }
    parts.join(" ")
}

/// Split on unquoted whitespace. Single quotes are literal; double quotes
/// allow `\"` and `\\` escapes; a backslash outside quotes escapes the next
/// character.
pub fn split_shell(input: &str) -> Result<Vec<String>, ArgError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(ArgError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(ArgError::UnterminatedQuote),
                        },
                        Some(c) => current.push(c),
                        None => return Err(ArgError::UnterminatedQuote),
                    }
                }
            }
            '\\' => {
                in_token = true;
                if let Some(c) = chars.next() {
                    current.push(c);
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
