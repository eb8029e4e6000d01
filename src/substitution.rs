//! Output-path templates: literals interleaved with capture-group
//! references, e.g. `dist/($1).o`.  Resolving one against a captured input
//! produces a concrete path; the parenthesized groups of the template then
//! become capture groups of that path, so a later rule can consume it.

use crate::captured_string::CapturedString;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub literal: String,
    /// Input capture group whose text is appended after the literal.
    pub captured_group_ix: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub segments: Vec<Segment>,
    /// Capture groups of the resolved string, as pairs of segment boundary
    /// indices.  A boundary of `segments.len()` is the end of the value.
    pub capture_groups: Vec<(usize, usize)>,
}

fn parse_error(text: &str, message: impl Into<String>) -> Error {
    Error::PatternParse {
        pattern: text.to_string(),
        message: message.into(),
    }
}

pub fn parse(text: &str) -> Result<Pattern> {
    let mut segments = Vec::new();
    let mut groups: Vec<(usize, Option<usize>)> = Vec::new();
    let mut open_groups: Vec<usize> = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => {
                let mut digits = String::new();
                while let Some(digit) = chars.peek().filter(|c| c.is_ascii_digit()) {
                    digits.push(*digit);
                    chars.next();
                }
                let reference: usize = digits
                    .parse()
                    .map_err(|_| parse_error(text, "`$` must be followed by a group number"))?;
                if reference == 0 {
                    return Err(parse_error(text, "capture groups are numbered from $1"));
                }
                segments.push(Segment {
                    literal: std::mem::take(&mut literal),
                    captured_group_ix: Some(reference - 1),
                });
            }
            '(' | ')' => {
                if !literal.is_empty() {
                    segments.push(Segment {
                        literal: std::mem::take(&mut literal),
                        captured_group_ix: None,
                    });
                }
                let boundary = segments.len();
                if c == '(' {
                    open_groups.push(groups.len());
                    groups.push((boundary, None));
                } else {
                    let ix = open_groups
                        .pop()
                        .ok_or_else(|| parse_error(text, "unbalanced `)`"))?;
                    groups[ix].1 = Some(boundary);
                }
            }
            c => literal.push(c),
        }
    }
    if !open_groups.is_empty() {
        return Err(parse_error(text, "unbalanced `(`"));
    }
    if !literal.is_empty() {
        segments.push(Segment {
            literal,
            captured_group_ix: None,
        });
    }
    Ok(Pattern {
        segments,
        capture_groups: groups
            .into_iter()
            .map(|(from, to)| (from, to.expect("closed group")))
            .collect(),
    })
}

/// A substitution pattern expanded against one captured input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    /// Offset at which each segment begins in `value`, with one trailing
    /// entry for the end of the string so a capture boundary may sit past
    /// the last segment.
    pub segment_starts: Vec<usize>,
}

pub fn resolve(segments: &[Segment], input: &CapturedString) -> Result<Resolved> {
    let mut value = String::new();
    let mut segment_starts = Vec::with_capacity(segments.len() + 1);
    for segment in segments {
        segment_starts.push(value.len());
        value.push_str(&segment.literal);
        if let Some(ix) = segment.captured_group_ix {
            let text = input.group(ix).ok_or_else(|| Error::PatternParse {
                pattern: format!("${}", ix + 1),
                message: format!(
                    "refers to a capture group the input `{}` does not have",
                    input.value
                ),
            })?;
            value.push_str(text);
        }
    }
    segment_starts.push(value.len());
    Ok(Resolved {
        value,
        segment_starts,
    })
}

/// Re-derive a captured string from a resolved value, so the output of one
/// rule can serve as the captured input of a later rule.
pub fn capture(
    capture_groups: &[(usize, usize)],
    value: &str,
    segment_starts: &[usize],
) -> CapturedString {
    CapturedString {
        value: value.to_string(),
        captured_groups: capture_groups
            .iter()
            .map(|&(from, to)| (segment_starts[from], segment_starts[to]))
            .collect(),
    }
}
