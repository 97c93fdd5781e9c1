//! Per-report invoice options.
//!
//! Options arrive as a flat key-value map, either JSON or an Org dynamic-block
//! parameter line (see [`parse_params`]). Parsing is lenient: a malformed
//! optional value falls back to its default. The one exception is `formula`,
//! which must be a string.

use serde_json::{Map, Number, Value};

use crate::display::TimeDisplay;
use crate::report::ReportError;

/// Property-backed columns a report can add to its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalColumn {
    /// `Est`, rendered from the `Effort` property.
    Effort,
    /// `Comment`, copied from the `Comment` property.
    Comment,
}

impl OptionalColumn {
    /// The entry property the column reads.
    pub const fn property(self) -> &'static str {
        match self {
            Self::Effort => "Effort",
            Self::Comment => "Comment",
        }
    }

    pub const fn header(self) -> &'static str {
        match self {
            Self::Effort => "Est",
            Self::Comment => "Comment",
        }
    }

    fn from_property(name: &str) -> Option<Self> {
        match name {
            "Effort" => Some(Self::Effort),
            "Comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

/// The optional columns present in a report, resolved once per report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    pub effort: bool,
    pub comment: bool,
}

impl ColumnSchema {
    pub fn from_properties<S: AsRef<str>>(properties: &[S]) -> Self {
        let mut schema = Self::default();
        for column in properties
            .iter()
            .filter_map(|p| OptionalColumn::from_property(p.as_ref()))
        {
            match column {
                OptionalColumn::Effort => schema.effort = true,
                OptionalColumn::Comment => schema.comment = true,
            }
        }
        schema
    }

    pub const fn contains(self, column: OptionalColumn) -> bool {
        match column {
            OptionalColumn::Effort => self.effort,
            OptionalColumn::Comment => self.comment,
        }
    }

    /// Column titles in table order.
    pub fn headers(self) -> Vec<&'static str> {
        let mut headers = vec!["Task"];
        if self.effort {
            headers.push(OptionalColumn::Effort.header());
        }
        headers.extend(["Time", "Billable"]);
        if self.comment {
            headers.push(OptionalColumn::Comment.header());
        }
        headers
    }
}

/// Options for one invoice report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceConfig {
    pub rate: Option<f64>,
    pub accuracy: Option<u32>,
    pub time_display: Option<TimeDisplay>,
    pub emphasize: bool,
    pub properties: Vec<String>,
    pub formula: Option<String>,
    pub header: Option<String>,
    pub lang: Option<String>,
    pub block: Option<String>,
    pub wstart: Option<u32>,
    pub mstart: Option<u32>,
}

impl InvoiceConfig {
    /// Reads the recognized options from a flat map. Unknown keys are ignored.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ReportError> {
        let formula = match options.get("formula") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(ReportError::FormulaNotString {
                    found: other.to_string(),
                });
            }
        };

        let time_display = ["timeDisplay", "time-display", "time_display"]
            .iter()
            .find_map(|key| options.get(*key))
            .and_then(Value::as_str)
            .and_then(|s| match s.parse::<TimeDisplay>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!(%e, "ignoring time display option");
                    None
                }
            });

        Ok(Self {
            rate: options.get("rate").and_then(Value::as_f64),
            accuracy: options.get("accuracy").and_then(non_negative_integer),
            time_display,
            emphasize: options.get("emphasize").is_some_and(truthy),
            properties: options.get("properties").map(string_list).unwrap_or_default(),
            formula,
            header: options.get("header").and_then(Value::as_str).map(String::from),
            lang: options.get("lang").and_then(Value::as_str).map(String::from),
            block: options.get("block").and_then(text_or_number),
            wstart: options.get("wstart").and_then(non_negative_integer),
            mstart: options.get("mstart").and_then(non_negative_integer),
        })
    }

    pub fn columns(&self) -> ColumnSchema {
        ColumnSchema::from_properties(self.properties.as_slice())
    }
}

/// Anything but `false` and null counts as set.
const fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn non_negative_integer(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then(|| f as u32)
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn text_or_number(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// "Clock summary at" in the caption language, English when unknown.
pub fn caption_phrase(lang: Option<&str>) -> &'static str {
    match lang.unwrap_or("en") {
        "fr" => "Horodatage sommaire à",
        "nl" => "Tijd totaal",
        "de" => "Erstellt am",
        _ => "Clock summary at",
    }
}

/// Parses an Org dynamic-block parameter line into an option map.
///
/// Anything before the first `:key` (such as `#+BEGIN: invoice`) is skipped.
/// Values: `"quoted"` strings, numbers, `( ... )` lists, `nil` (null), `t`
/// (true); other bare words become strings. A key with no value maps to null.
pub fn parse_params(line: &str) -> Result<Map<String, Value>, ReportError> {
    let tokens = tokenize(line)?;
    let mut options = Map::new();
    let mut iter = tokens.into_iter().skip_while(|t| !t.is_key()).peekable();

    while let Some(token) = iter.next() {
        let Token::Key(key) = token else {
            continue;
        };
        let value = if iter.peek().is_some_and(|t| !t.is_key()) {
            match iter.next() {
                Some(Token::Value(value)) => value,
                _ => Value::Null,
            }
        } else {
            Value::Null
        };
        options.insert(key, value);
    }

    Ok(options)
}

#[derive(Debug)]
enum Token {
    Key(String),
    Value(Value),
}

impl Token {
    const fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }
}

fn tokenize(line: &str) -> Result<Vec<Token>, ReportError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == ':' {
            chars.next();
            tokens.push(Token::Key(bare_word(&mut chars)));
        } else if c == ')' {
            return Err(ReportError::InvalidParams("unexpected ')'".to_string()));
        } else {
            tokens.push(Token::Value(read_value(&mut chars)?));
        }
    }

    Ok(tokens)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn read_value(chars: &mut Chars<'_>) -> Result<Value, ReportError> {
    match chars.peek() {
        Some('"') => {
            chars.next();
            read_string(chars).map(Value::String)
        }
        Some('(') => {
            chars.next();
            let mut items = Vec::new();
            loop {
                match chars.peek() {
                    None => {
                        return Err(ReportError::InvalidParams(
                            "unterminated list".to_string(),
                        ));
                    }
                    Some(')') => {
                        chars.next();
                        break;
                    }
                    Some(c) if c.is_whitespace() => {
                        chars.next();
                    }
                    Some(_) => items.push(read_value(chars)?),
                }
            }
            Ok(Value::Array(items))
        }
        _ => Ok(atom(&bare_word(chars))),
    }
}

fn read_string(chars: &mut Chars<'_>) -> Result<String, ReportError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => {
                return Err(ReportError::InvalidParams(
                    "unterminated string".to_string(),
                ));
            }
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => {
                    return Err(ReportError::InvalidParams(
                        "unterminated string".to_string(),
                    ));
                }
            },
            Some(c) => out.push(c),
        }
    }
}

fn bare_word(chars: &mut Chars<'_>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

fn atom(word: &str) -> Value {
    match word {
        "nil" => Value::Null,
        "t" => Value::Bool(true),
        _ => {
            if let Ok(n) = word.parse::<i64>() {
                Value::Number(n.into())
            } else if let Some(n) = word.parse::<f64>().ok().and_then(Number::from_f64) {
                Value::Number(n)
            } else {
                Value::String(word.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn options(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = InvoiceConfig::from_options(&Map::new()).unwrap();
        assert_eq!(config, InvoiceConfig::default());
        assert_eq!(config.columns(), ColumnSchema::default());
    }

    #[test]
    fn test_reads_recognized_options() {
        let config = InvoiceConfig::from_options(&options(json!({
            "rate": 95.5,
            "accuracy": 2,
            "timeDisplay": "duration",
            "emphasize": true,
            "properties": ["Effort", "Comment", "Owner"],
            "formula": "$4=vsum(@I..@II)",
            "header": "#+CAPTION: March",
            "lang": "de",
            "block": "thismonth",
            "wstart": 7,
            "mstart": 15
        })))
        .unwrap();

        assert_eq!(config.rate, Some(95.5));
        assert_eq!(config.accuracy, Some(2));
        assert_eq!(config.time_display, Some(TimeDisplay::Duration));
        assert!(config.emphasize);
        assert_eq!(config.formula.as_deref(), Some("$4=vsum(@I..@II)"));
        assert_eq!(config.header.as_deref(), Some("#+CAPTION: March"));
        assert_eq!(config.block.as_deref(), Some("thismonth"));
        assert_eq!(config.wstart, Some(7));
        assert_eq!(config.mstart, Some(15));
        assert_eq!(
            config.columns(),
            ColumnSchema {
                effort: true,
                comment: true
            }
        );
    }

    #[test]
    fn test_formula_must_be_a_string() {
        let err = InvoiceConfig::from_options(&options(json!({"formula": 42}))).unwrap_err();
        assert!(matches!(err, ReportError::FormulaNotString { ref found } if found == "42"));
    }

    #[test]
    fn test_null_formula_is_absent() {
        let config = InvoiceConfig::from_options(&options(json!({"formula": null}))).unwrap();
        assert_eq!(config.formula, None);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = InvoiceConfig::from_options(&options(json!({
            "rate": "ninety",
            "accuracy": -1,
            "timeDisplay": "minutes",
            "emphasize": false,
            "properties": 3
        })))
        .unwrap();

        assert_eq!(config.rate, None);
        assert_eq!(config.accuracy, None);
        assert_eq!(config.time_display, None);
        assert!(!config.emphasize);
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_time_display_aliases() {
        let config =
            InvoiceConfig::from_options(&options(json!({"time-display": "duration"}))).unwrap();
        assert_eq!(config.time_display, Some(TimeDisplay::Duration));
    }

    #[test]
    fn test_schema_headers() {
        assert_eq!(
            ColumnSchema::from_properties(&["Comment"]).headers(),
            vec!["Task", "Time", "Billable", "Comment"]
        );
        assert_eq!(
            ColumnSchema::from_properties(&["Effort"]).headers(),
            vec!["Task", "Est", "Time", "Billable"]
        );
        assert_eq!(
            ColumnSchema::from_properties::<&str>(&[]).headers(),
            vec!["Task", "Time", "Billable"]
        );
    }

    #[test]
    fn test_schema_ignores_other_properties() {
        let schema = ColumnSchema::from_properties(&["Owner", "effort"]);
        assert!(!schema.contains(OptionalColumn::Effort));
        assert!(!schema.contains(OptionalColumn::Comment));
    }

    #[test]
    fn test_caption_phrase_languages() {
        assert_eq!(caption_phrase(None), "Clock summary at");
        assert_eq!(caption_phrase(Some("de")), "Erstellt am");
        assert_eq!(caption_phrase(Some("xx")), "Clock summary at");
    }

    #[test]
    fn test_parse_params_block_line() {
        let params = parse_params(
            r#"#+BEGIN: invoice :rate 90 :accuracy 2 :properties ("Effort" "Comment") :formula "$4=vsum(@2..@-1)" :emphasize t :block thisweek"#,
        )
        .unwrap();

        assert_eq!(params["rate"], json!(90));
        assert_eq!(params["accuracy"], json!(2));
        assert_eq!(params["properties"], json!(["Effort", "Comment"]));
        assert_eq!(params["formula"], json!("$4=vsum(@2..@-1)"));
        assert_eq!(params["emphasize"], json!(true));
        assert_eq!(params["block"], json!("thisweek"));
    }

    #[test]
    fn test_parse_params_values() {
        let params = parse_params(r#":rate 72.5 :header "Say \"hi\"" :lang nil :flag"#).unwrap();

        assert_eq!(params["rate"], json!(72.5));
        assert_eq!(params["header"], json!("Say \"hi\""));
        assert_eq!(params["lang"], Value::Null);
        assert_eq!(params["flag"], Value::Null);
    }

    #[test]
    fn test_parse_params_numeric_formula_fails_later() {
        let params = parse_params(":formula 42").unwrap();
        assert!(InvoiceConfig::from_options(&params).is_err());
    }

    #[test]
    fn test_parse_params_unterminated() {
        assert!(parse_params(r#":header "open"#).is_err());
        assert!(parse_params(r#":properties ("Effort""#).is_err());
    }

    #[test]
    fn test_parse_params_stray_paren() {
        let err = parse_params(":rate 90)").unwrap_err();
        assert!(matches!(err, ReportError::InvalidParams(ref msg) if msg == "unexpected ')'"));
        assert!(parse_params(r#":properties ("Effort")) :rate 90"#).is_err());
        assert!(parse_params(")").is_err());
    }
}
