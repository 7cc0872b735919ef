//! Assignment forms and their expansion into scalar bindings.
//!
//! ```text
//! a = 2            scalar
//! a[0] = 2         scalar (single element)
//! a = [1,2,3]      vector literal, also `a = 1,2,3`
//! a[:2] = b[1:3]   slice
//! ```

use super::scanner::{self, Segment};
use crate::error::DeckError;

/// One `local = rhs` pair ready for the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub local: String,
    pub rhs: String,
}

/// Shape of a logical line that is not a suit header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    /// No assignment `=`: handed to the evaluator as is.
    Bare(String),
    Scalar { lhs: String, rhs: String },
    Vector { lhs: String, elements: Vec<String> },
    Slice { lhs: String, rhs: String },
}

impl Form {
    /// Expand into scalar bindings, in evaluation order.
    pub fn bindings(self, line: usize) -> Result<Vec<Binding>, DeckError> {
        match self {
            Form::Bare(_) => Ok(Vec::new()),
            Form::Scalar { lhs, rhs } => Ok(vec![Binding { local: lhs, rhs }]),
            Form::Vector { lhs, elements } => Ok(elements
                .into_iter()
                .enumerate()
                .map(|(i, rhs)| Binding { local: format!("{lhs}[{i}]"), rhs })
                .collect()),
            Form::Slice { lhs, rhs } => expand_slice(&lhs, &rhs, line),
        }
    }
}

/// Decide which form `text` takes.
pub fn classify(text: &str, line: usize) -> Result<Form, DeckError> {
    let Some(eq) = scanner::find_assignment(text) else {
        return Ok(Form::Bare(text.to_string()));
    };
    let lhs: String = text
        .get(..eq)
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let raw_rhs = text.get(eq + 1..).unwrap_or_default();

    if lhs.is_empty() {
        return Err(DeckError::card(line, "empty card name"));
    }
    if lhs.contains(',') {
        return Err(DeckError::card(line, format!("cannot have ',' in card name '{lhs}'")));
    }
    let rhs = scanner::strip_whitespace(raw_rhs)
        .ok_or_else(|| DeckError::card(line, format!("unterminated string in '{}'", raw_rhs.trim())))?;
    if rhs.is_empty() {
        return Err(DeckError::card(line, format!("empty value for card '{lhs}'")));
    }
    scanner::check_balanced(&lhs).map_err(|m| DeckError::card(line, m))?;
    scanner::check_balanced(&rhs).map_err(|m| DeckError::card(line, m))?;

    if scanner::has_range(&lhs) || scanner::has_range(&rhs) {
        return Ok(Form::Slice { lhs, rhs });
    }
    match list_elements(&rhs, line)? {
        Some(_) if lhs.contains('[') => Err(DeckError::card(
            line,
            format!("cannot assign a list to the single element '{lhs}'"),
        )),
        Some(elements) => Ok(Form::Vector { lhs, elements }),
        None => Ok(Form::Scalar { lhs, rhs }),
    }
}

/// Elements of a list value (`[a,b]` or `a,b`), or `None` for a scalar.
/// Without a comma there is no list: `[5]` is left to the evaluator.
fn list_elements(rhs: &str, line: usize) -> Result<Option<Vec<String>>, DeckError> {
    let body = scanner::bracketed_body(rhs).unwrap_or(rhs);
    if !scanner::has_top_level(body, ',') {
        return Ok(None);
    }
    scanner::split_top_level(body, ',')
        .into_iter()
        .map(|element| {
            let element = element.trim();
            if element.is_empty() {
                Err(DeckError::card(line, format!("empty element in list '{rhs}'")))
            } else {
                Ok(element.to_string())
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Concrete names of a slice expression, `count` of them where `count` is
/// the shortest range. Open upper bounds take `max`.
fn expand_ranges(text: &str, max: Option<usize>, line: usize) -> Result<Vec<String>, DeckError> {
    let parts = scanner::segments(text).map_err(|m| DeckError::card(line, m))?;

    let mut count: Option<usize> = None;
    for part in &parts {
        if let Segment::Range { lower, upper } = part {
            let upper = upper.or(max).ok_or_else(|| {
                DeckError::card(line, format!("must give an upper bound in slice '{text}'"))
            })?;
            let Some(span) = upper.checked_sub(*lower) else {
                return Err(DeckError::card(line, format!("slice in '{text}' starts past its end ({upper})")));
            };
            count = Some(count.map_or(span, |c| c.min(span)));
        }
    }

    let Some(count) = count else {
        return Err(DeckError::card(line, format!("no slice range at the top level of '{text}'")));
    };
    Ok((0..count)
        .map(|i| {
            parts
                .iter()
                .map(|part| match part {
                    Segment::Text(t) => t.clone(),
                    Segment::Range { lower, .. } => format!("[{}]", lower + i),
                })
                .collect()
        })
        .collect())
}

fn expand_slice(lhs: &str, rhs: &str, line: usize) -> Result<Vec<Binding>, DeckError> {
    let values = if scanner::has_range(rhs) {
        expand_ranges(rhs, None, line)?
    } else {
        list_elements(rhs, line)?.unwrap_or_else(|| vec![rhs.to_string()])
    };

    let names = if scanner::has_range(lhs) {
        expand_ranges(lhs, Some(values.len()), line)?
    } else if lhs.contains('[') {
        vec![lhs.to_string()]
    } else {
        // A bare name takes the whole slice as a new vector.
        (0..values.len()).map(|i| format!("{lhs}[{i}]")).collect()
    };

    if names.len() > values.len() {
        return Err(DeckError::card(
            line,
            format!("more card names ({}) than values ({}) in '{lhs} = {rhs}'", names.len(), values.len()),
        ));
    }
    Ok(names
        .into_iter()
        .zip(values)
        .map(|(local, rhs)| Binding { local, rhs })
        .collect())
}
