//! Parser for the simplified Prometheus text exposition format.
//!
//! A metric line has the shape
//!
//! ```text
//! name{key="value",other="value"} 42
//! name 42.5
//! ```
//!
//! Label values are taken verbatim: there is no escape processing, so a `"`
//! always closes the value.

use crate::error::{LineErrorKind, MalformedLine};
use crate::metric::{Attribute, Metric, NumberValue};

const TYPE_PREFIX: &str = "# TYPE";
const HELP_PREFIX: &str = "# HELP";

/// Disposition of a raw exposition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `# TYPE ...`, ignored.
    TypeComment,
    /// `# HELP ...`, ignored.
    HelpComment,
    /// Anything else, including blank lines.
    MetricLine,
}

impl LineKind {
    /// `# TYPE` and `# HELP` lines carry no sample.
    pub fn is_comment(&self) -> bool {
        !matches!(self, LineKind::MetricLine)
    }
}

/// Classify a line without parsing it.
pub fn classify(line: &str) -> LineKind {
    if line.starts_with(TYPE_PREFIX) {
        LineKind::TypeComment
    } else if line.starts_with(HELP_PREFIX) {
        LineKind::HelpComment
    } else {
        LineKind::MetricLine
    }
}

/// Scanner states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    Labels,
    LabelKey,
    LabelValue,
    Separator,
    Number,
}

/// Forward-only cursor over the scalar values of a line.
struct Cursor<'a> {
    line: &'a str,
    offset: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            offset: 0,
            column: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.line[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        self.column += 1;
        Some(c)
    }

    fn rest(&self) -> &'a str {
        &self.line[self.offset..]
    }

    /// Errors point at the character under the cursor, which has not been consumed.
    fn error(&self, kind: LineErrorKind) -> MalformedLine {
        MalformedLine::new(self.line, self.column, kind)
    }
}

/// Parse one metric line into a gauge [`Metric`] with a single data point.
///
/// The returned data point has a zero timestamp; the assembler stamps it.
/// Comment lines must be filtered with [`classify`] first, they are not
/// special-cased here.
pub fn parse_metric_line(line: &str) -> Result<Metric, MalformedLine> {
    let mut cursor = Cursor::new(line);
    let mut state = State::Name;

    let mut name = String::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut attributes = Vec::new();

    loop {
        state = match state {
            State::Name => match cursor.peek() {
                Some(c @ ('{' | ' ')) => {
                    if name.is_empty() {
                        return Err(cursor.error(LineErrorKind::EmptyName));
                    }
                    cursor.bump();
                    if c == '{' {
                        State::Labels
                    } else {
                        State::Number
                    }
                }
                Some(c) => {
                    cursor.bump();
                    name.push(c);
                    State::Name
                }
                None => return Err(cursor.error(LineErrorKind::UnterminatedName)),
            },

            State::Labels => match cursor.peek() {
                Some(',' | ' ') => {
                    cursor.bump();
                    State::Labels
                }
                Some('}') => {
                    cursor.bump();
                    State::Separator
                }
                Some(c @ ('"' | '=')) => {
                    return Err(cursor.error(LineErrorKind::UnexpectedLabelStart(c)));
                }
                Some(_) => State::LabelKey,
                None => return Err(cursor.error(LineErrorKind::UnterminatedLabels)),
            },

            State::LabelKey => match cursor.bump() {
                Some('=') => match cursor.peek() {
                    Some('"') => {
                        cursor.bump();
                        State::LabelValue
                    }
                    Some(c) => return Err(cursor.error(LineErrorKind::ExpectedQuote(c))),
                    None => return Err(cursor.error(LineErrorKind::UnterminatedLabelValue)),
                },
                Some(c) => {
                    key.push(c);
                    State::LabelKey
                }
                None => return Err(cursor.error(LineErrorKind::UnterminatedLabelKey)),
            },

            State::LabelValue => match cursor.bump() {
                Some('"') => {
                    attributes.push(Attribute::new(
                        std::mem::take(&mut key),
                        std::mem::take(&mut value),
                    ));
                    State::Labels
                }
                Some(c) => {
                    value.push(c);
                    State::LabelValue
                }
                None => return Err(cursor.error(LineErrorKind::UnterminatedLabelValue)),
            },

            State::Separator => match cursor.peek() {
                Some(' ') => {
                    cursor.bump();
                    State::Number
                }
                Some(c) => return Err(cursor.error(LineErrorKind::ExpectedSpace(c))),
                None => return Err(cursor.error(LineErrorKind::MissingValue)),
            },

            State::Number => {
                let number = parse_number(cursor.rest()).map_err(|kind| cursor.error(kind))?;
                return Ok(Metric::gauge(name, number, attributes));
            }
        };
    }
}

/// Integer first, then float.
fn parse_number(literal: &str) -> Result<NumberValue, LineErrorKind> {
    if literal.is_empty() {
        return Err(LineErrorKind::MissingValue);
    }

    if let Ok(v) = literal.parse::<i64>() {
        return Ok(NumberValue::Int(v));
    }

    match literal.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(NumberValue::Double(v)),
        Ok(_) => Err(LineErrorKind::NonFiniteNumber(literal.to_string())),
        Err(_) => Err(LineErrorKind::InvalidNumber(literal.to_string())),
    }
}
