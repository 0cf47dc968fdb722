//! Prometheus text exposition (format 0.0.4): deterministic encoder and a parser for
//! the same format.

use crate::domain::errors::ExpositionError;
use crate::domain::metrics::definition::{is_valid_label_name, is_valid_metric_name};
use crate::domain::metrics::snapshot::{format_value, RegistrySnapshot, Sample};
use crate::domain::metrics::LabelSet;
use std::fmt::Write;

/// Content type served by the scrape endpoint.
pub const SCRAPE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
/// Content type sent to the push collector.
pub const PUSH_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a snapshot: families by name, series by canonical key, labels by name.
pub fn encode_text(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();

    for family in &snapshot.families {
        let definition = &family.definition;
        let _ = writeln!(
            out,
            "# HELP {} {}",
            definition.name(),
            escape_help(definition.help())
        );
        let _ = writeln!(
            out,
            "# TYPE {} {}",
            definition.name(),
            definition.kind().as_str()
        );
        for sample in family.samples() {
            write_sample(&mut out, &sample);
        }
    }

    out
}

/// Byte form of [`encode_text`], as served and pushed.
pub fn export_text(snapshot: &RegistrySnapshot) -> Vec<u8> {
    encode_text(snapshot).into_bytes()
}

fn write_sample(out: &mut String, sample: &Sample) {
    out.push_str(&sample.name);
    if !sample.labels.is_empty() {
        out.push('{');
        for (i, (name, value)) in sample.labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}=\"{}\"", name, escape_label_value(value));
        }
        out.push('}');
    }
    out.push(' ');
    out.push_str(&format_value(sample.value));
    out.push('\n');
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Parse exposition text back into samples. Comment and blank lines are skipped;
/// trailing timestamps are accepted and dropped.
pub fn parse_text(input: &str) -> Result<Vec<Sample>, ExpositionError> {
    let mut samples = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        samples.push(parse_sample(line, idx + 1)?);
    }
    Ok(samples)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn malformed(&self, reason: &str) -> ExpositionError {
        ExpositionError::Malformed {
            line: self.line,
            reason: reason.to_string(),
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), ExpositionError> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            _ => Err(self.malformed(&format!("expected '{}'", wanted))),
        }
    }
}

fn parse_sample(line: &str, line_no: usize) -> Result<Sample, ExpositionError> {
    let mut cursor = Cursor {
        input: line,
        pos: 0,
        line: line_no,
    };

    let name = cursor.take_while(|c| c != '{' && !c.is_whitespace());
    if !is_valid_metric_name(name) {
        return Err(cursor.malformed("invalid metric name"));
    }

    let labels = if cursor.peek() == Some('{') {
        cursor.bump();
        parse_labels(&mut cursor)?
    } else {
        LabelSet::new()
    };

    let mut fields = cursor.rest().split_whitespace();
    let raw_value = fields
        .next()
        .ok_or_else(|| cursor.malformed("missing sample value"))?;
    let value = parse_value(raw_value).ok_or_else(|| ExpositionError::InvalidValue {
        line: line_no,
        value: raw_value.to_string(),
    })?;

    if let Some(timestamp) = fields.next() {
        if timestamp.parse::<i64>().is_err() {
            return Err(cursor.malformed("invalid timestamp"));
        }
    }
    if fields.next().is_some() {
        return Err(cursor.malformed("unexpected trailing data"));
    }

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
    })
}

fn parse_labels(cursor: &mut Cursor<'_>) -> Result<LabelSet, ExpositionError> {
    let mut labels = LabelSet::new();

    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('}') => {
                cursor.bump();
                return Ok(labels);
            }
            None => return Err(cursor.malformed("unterminated label set")),
            _ => {}
        }

        let name = cursor.take_while(|c| c != '=' && !c.is_whitespace());
        if !is_valid_label_name(name) {
            return Err(cursor.malformed(&format!("invalid label name {:?}", name)));
        }
        cursor.skip_whitespace();
        cursor.expect('=')?;
        cursor.skip_whitespace();
        cursor.expect('"')?;

        let mut value = String::new();
        loop {
            match cursor.bump() {
                Some('"') => break,
                Some('\\') => match cursor.bump() {
                    Some('n') => value.push('\n'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(cursor.malformed("unterminated escape")),
                },
                Some(c) => value.push(c),
                None => return Err(cursor.malformed("unterminated label value")),
            }
        }
        labels.insert(name, value);

        cursor.skip_whitespace();
        match cursor.peek() {
            Some(',') => {
                cursor.bump();
            }
            Some('}') => {}
            _ => return Err(cursor.malformed("expected ',' or '}'")),
        }
    }
}

fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}
