//! Matching of a single path component against a wildcard pattern, e.g.
//! `foo_*.cpp`.  A wildcard matches any run of bytes except `/`.

/// One run of literal characters, possibly preceded by a `*` wildcard.
/// Segments not prefixed by a wildcard arise when capture markers split a
/// literal in two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub prefixed_by_wildcard: bool,
    pub literal: String,
}

/// A pattern is a sequence of literals separated by wildcards: `foo_*.cpp`
/// is represented as `foo_` followed by a wildcard-prefixed `.cpp`.
pub type Pattern = Vec<Segment>;

/// Assembles a pattern character by character.  The path-glob parser drives
/// this directly so it can interleave capture markers; `parse` below covers
/// plain pattern text.
#[derive(Default)]
pub struct PatternBuilder {
    segments: Vec<Segment>,
    pending_literal: String,
    pending_wildcard: bool,
    pending_started: bool,
}

impl PatternBuilder {
    pub fn push_char(&mut self, c: char) {
        self.pending_literal.push(c);
        self.pending_started = true;
    }

    pub fn push_wildcard(&mut self) {
        if self.pending_started {
            self.flush();
        }
        self.pending_wildcard = true;
        self.pending_started = true;
    }

    /// Record a segment boundary for a capture endpoint, returning the index
    /// the endpoint refers to.  A boundary equal to the final segment count
    /// designates the end of the matched name.
    pub fn mark(&mut self) -> usize {
        if self.pending_started {
            self.flush();
        }
        self.segments.len()
    }

    fn flush(&mut self) {
        self.segments.push(Segment {
            prefixed_by_wildcard: self.pending_wildcard,
            literal: std::mem::take(&mut self.pending_literal),
        });
        self.pending_wildcard = false;
        self.pending_started = false;
    }

    pub fn finish(mut self) -> Pattern {
        if self.pending_started || self.segments.is_empty() {
            self.flush();
        }
        self.segments
    }
}

pub fn parse(text: &str) -> Pattern {
    let mut builder = PatternBuilder::default();
    for c in text.chars() {
        match c {
            '*' => builder.push_wildcard(),
            c => builder.push_char(c),
        }
    }
    builder.finish()
}

fn match_literal(literal: &str, candidate: &[u8], candidate_ix: &mut usize) -> bool {
    let literal = literal.as_bytes();
    if *candidate_ix + literal.len() > candidate.len() {
        return false;
    }
    if &candidate[*candidate_ix..*candidate_ix + literal.len()] == literal {
        *candidate_ix += literal.len();
        return true;
    }
    false
}

pub fn matches(pattern: &Pattern, candidate: &str) -> bool {
    match_positions(pattern, candidate).is_some()
}

/// Bookmark/backtrack matching.  On success, reports for each segment the
/// candidate offset at which its literal matched; capture extraction derives
/// group boundaries from these offsets.
pub fn match_positions(pattern: &Pattern, candidate: &str) -> Option<Vec<usize>> {
    if pattern.is_empty() {
        return None;
    }
    let candidate = candidate.as_bytes();
    let mut positions = vec![0usize; pattern.len()];
    let mut segment_ix = 0;
    let mut candidate_ix = 0;
    // The most recent wildcard seen: (segment index, offset to retry from).
    let mut bookmark: Option<(usize, usize)> = None;
    loop {
        if segment_ix < pattern.len() {
            let segment = &pattern[segment_ix];
            if segment.prefixed_by_wildcard {
                bookmark = Some((segment_ix, candidate_ix));
            }
            if match_literal(&segment.literal, candidate, &mut candidate_ix) {
                positions[segment_ix] = candidate_ix - segment.literal.len();
                segment_ix += 1;
                continue;
            }
        } else if candidate_ix == candidate.len() {
            return Some(positions);
        }
        // Literal mismatch, or segments exhausted with input left over:
        // restore the last wildcard and let it swallow one more byte.
        let (wildcard_ix, retry_ix) = bookmark?;
        let retry_ix = retry_ix + 1;
        if retry_ix + pattern[wildcard_ix].literal.len() > candidate.len() {
            return None;
        }
        bookmark = Some((wildcard_ix, retry_ix));
        segment_ix = wildcard_ix;
        candidate_ix = retry_ix;
    }
}

/// Candidate offset of segment boundary `ix`: 0 at the start, the candidate
/// length past the final segment, and otherwise the end of the preceding
/// literal (which is where segment `ix`'s own wildcard begins consuming).
pub fn boundary_offset(
    pattern: &Pattern,
    positions: &[usize],
    candidate: &str,
    ix: usize,
) -> usize {
    if ix == 0 {
        0
    } else if ix >= pattern.len() {
        candidate.len()
    } else {
        positions[ix - 1] + pattern[ix - 1].literal.len()
    }
}
