//! Path-glob patterns and the matcher that walks the project tree looking
//! for the files they select, capturing path components along the way.
//!
//! A pattern such as `(src/**/*).c` is split on `/` into path segments.
//! `**` consumes zero or more directory levels and is folded onto the
//! segment that follows it; `(` and `)` delimit capture groups, which may
//! span several segments.  Matching `src/sub/y.c` captures `src/sub/y`.

use crate::captured_string::CapturedString;
use crate::error::{Error, Result};
use crate::glob;
use crate::io::{DirEnt, DirEntKind, DirReader};
use std::collections::VecDeque;
use std::path::Path;

/// Where a capture-group boundary sits within a path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Adjacent to a `**`: the boundary snaps to the directory prefix as the
    /// recursive wildcard is entered or extended.
    Wildcard { segment_ix: usize },
    /// Inside an entity name: the boundary snaps to an offset within the
    /// name the segment matches.
    EntName { segment_ix: usize, ent_ix: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGroup {
    pub from: Boundary,
    pub to: Boundary,
}

/// One path component to match: an entity-name glob, optionally preceded by
/// a `**` consuming any number of directory levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub has_wildcard: bool,
    pub ent_name: glob::Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub segments: Vec<PathSegment>,
    pub capture_groups: Vec<CaptureGroup>,
}

fn parse_error(text: &str, message: impl Into<String>) -> Error {
    Error::PatternParse {
        pattern: text.to_string(),
        message: message.into(),
    }
}

pub fn parse(text: &str) -> Result<Pattern> {
    let mut segments: Vec<PathSegment> = Vec::new();
    let mut groups: Vec<(Option<Boundary>, Option<Boundary>)> = Vec::new();
    let mut open_groups: Vec<usize> = Vec::new();
    let mut pending_wildcard = false;

    let open = |groups: &mut Vec<(Option<Boundary>, Option<Boundary>)>,
                    open_groups: &mut Vec<usize>,
                    boundary: Boundary| {
        open_groups.push(groups.len());
        groups.push((Some(boundary), None));
    };
    let close = |groups: &mut Vec<(Option<Boundary>, Option<Boundary>)>,
                 open_groups: &mut Vec<usize>,
                 boundary: Boundary|
     -> Result<()> {
        let ix = open_groups
            .pop()
            .ok_or_else(|| parse_error(text, "unbalanced `)`"))?;
        groups[ix].1 = Some(boundary);
        Ok(())
    };

    for component in text.split('/') {
        if component.is_empty() {
            return Err(parse_error(text, "empty path component"));
        }
        let stripped: String = component.chars().filter(|c| !"()".contains(*c)).collect();
        if stripped == "**" {
            // Folded onto the next segment; markers around it snap to the
            // directory prefix while that segment's wildcard runs.
            let segment_ix = segments.len();
            for c in component.chars() {
                match c {
                    '(' => open(&mut groups, &mut open_groups, Boundary::Wildcard { segment_ix }),
                    ')' => close(&mut groups, &mut open_groups, Boundary::Wildcard { segment_ix })?,
                    '*' => {}
                    _ => unreachable!(),
                }
            }
            pending_wildcard = true;
            continue;
        }
        let segment_ix = segments.len();
        let mut builder = glob::PatternBuilder::default();
        for c in component.chars() {
            match c {
                '(' => {
                    let ent_ix = builder.mark();
                    open(
                        &mut groups,
                        &mut open_groups,
                        Boundary::EntName { segment_ix, ent_ix },
                    );
                }
                ')' => {
                    let ent_ix = builder.mark();
                    close(
                        &mut groups,
                        &mut open_groups,
                        Boundary::EntName { segment_ix, ent_ix },
                    )?;
                }
                '*' => builder.push_wildcard(),
                c => builder.push_char(c),
            }
        }
        segments.push(PathSegment {
            has_wildcard: std::mem::take(&mut pending_wildcard),
            ent_name: builder.finish(),
        });
    }
    if pending_wildcard {
        return Err(parse_error(text, "pattern cannot end with `**`"));
    }
    if segments.is_empty() {
        return Err(parse_error(text, "empty pattern"));
    }
    if !open_groups.is_empty() {
        return Err(parse_error(text, "unbalanced `(`"));
    }
    Ok(Pattern {
        segments,
        capture_groups: groups
            .into_iter()
            .map(|(from, to)| CaptureGroup {
                from: from.expect("opened group"),
                to: to.expect("closed group"),
            })
            .collect(),
    })
}

/// A file one of the patterns selected; `captured_path.value` is the local
/// path relative to the crawl root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub pattern_ix: usize,
    pub captured_path: CapturedString,
}

/// An in-flight match attempt: which segment of which pattern applies to the
/// directory the bookmark is attached to, plus the capture boundaries
/// resolved so far.
#[derive(Debug, Clone)]
struct Bookmark {
    pattern_ix: usize,
    segment_ix: usize,
    captures: Vec<(usize, usize)>,
}

struct PendingDir {
    prefix: String,
    bookmarks: Vec<Bookmark>,
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Offset at which the next component appended to `prefix` begins.
fn component_start(prefix: &str) -> usize {
    if prefix.is_empty() {
        0
    } else {
        prefix.len() + 1
    }
}

/// Enumerates the files matched by one or more path-glob patterns under a
/// root directory.  Directories are visited breadth-first; `next` lazily
/// pulls one match at a time.
pub struct Matcher<'a, R: DirReader> {
    root: &'a Path,
    patterns: &'a [Pattern],
    reader: &'a R,
    pending_dirs: VecDeque<PendingDir>,
    buffered: VecDeque<PathMatch>,
}

impl<'a, R: DirReader> Matcher<'a, R> {
    pub fn new(root: &'a Path, patterns: &'a [Pattern], reader: &'a R) -> Self {
        let bookmarks = patterns
            .iter()
            .enumerate()
            .map(|(pattern_ix, pattern)| {
                let mut bookmark = Bookmark {
                    pattern_ix,
                    segment_ix: 0,
                    captures: vec![(0, 0); pattern.capture_groups.len()],
                };
                snap_wildcard_entry(&mut bookmark, pattern, "");
                bookmark
            })
            .collect();
        Matcher {
            root,
            patterns,
            reader,
            pending_dirs: VecDeque::from([PendingDir {
                prefix: String::new(),
                bookmarks,
            }]),
            buffered: VecDeque::new(),
        }
    }

    /// Produce the next match, or `None` once the tree is exhausted.
    pub fn next(&mut self) -> Result<Option<PathMatch>> {
        loop {
            if let Some(found) = self.buffered.pop_front() {
                return Ok(Some(found));
            }
            let dir = match self.pending_dirs.pop_front() {
                Some(dir) => dir,
                None => return Ok(None),
            };
            self.process_dir(dir)?;
        }
    }

    fn process_dir(&mut self, dir: PendingDir) -> Result<()> {
        let dir_path = self.root.join(&dir.prefix);
        let entries = self.reader.read_dir(&dir_path)?;
        for ent in &entries {
            if ent.name.starts_with('.') {
                continue;
            }
            for bookmark in &dir.bookmarks {
                self.process_entry(&dir.prefix, bookmark, ent);
            }
        }
        Ok(())
    }

    fn process_entry(&mut self, prefix: &str, bookmark: &Bookmark, ent: &DirEnt) {
        let patterns = self.patterns;
        let pattern = &patterns[bookmark.pattern_ix];
        let segment = &pattern.segments[bookmark.segment_ix];
        let is_last = bookmark.segment_ix + 1 == pattern.segments.len();

        if segment.has_wildcard && ent.kind == DirEntKind::Directory {
            // `**` consumes this level; the same segment continues below.
            let sub_prefix = join_path(prefix, &ent.name);
            let mut descended = bookmark.clone();
            extend_wildcard(&mut descended, pattern, &sub_prefix);
            self.enqueue(sub_prefix, descended);
        }

        let positions = match glob::match_positions(&segment.ent_name, &ent.name) {
            Some(positions) => positions,
            None => return,
        };
        match ent.kind {
            DirEntKind::Directory if !is_last => {
                let sub_prefix = join_path(prefix, &ent.name);
                let mut advanced = bookmark.clone();
                resolve_ent_boundaries(&mut advanced, pattern, segment, prefix, ent, &positions);
                advanced.segment_ix += 1;
                snap_wildcard_entry(&mut advanced, pattern, &sub_prefix);
                self.enqueue(sub_prefix, advanced);
            }
            DirEntKind::Regular if is_last => {
                let mut done = bookmark.clone();
                resolve_ent_boundaries(&mut done, pattern, segment, prefix, ent, &positions);
                self.buffered.push_back(PathMatch {
                    pattern_ix: bookmark.pattern_ix,
                    captured_path: CapturedString {
                        value: join_path(prefix, &ent.name),
                        captured_groups: done.captures,
                    },
                });
            }
            _ => {}
        }
    }

    fn enqueue(&mut self, prefix: String, bookmark: Bookmark) {
        // Directories reached by several patterns or segments are listed once.
        for pending in self.pending_dirs.iter_mut() {
            if pending.prefix == prefix {
                pending.bookmarks.push(bookmark);
                return;
            }
        }
        self.pending_dirs.push_back(PendingDir {
            prefix,
            bookmarks: vec![bookmark],
        });
    }
}

/// Snap wildcard boundaries of the segment the bookmark just entered: a
/// `from` opens where the next component will start, a `to` closes at the
/// current prefix end (zero levels consumed so far).
fn snap_wildcard_entry(bookmark: &mut Bookmark, pattern: &Pattern, prefix: &str) {
    for (group_ix, group) in pattern.capture_groups.iter().enumerate() {
        if group.from == (Boundary::Wildcard { segment_ix: bookmark.segment_ix }) {
            bookmark.captures[group_ix].0 = component_start(prefix);
        }
        if group.to == (Boundary::Wildcard { segment_ix: bookmark.segment_ix }) {
            bookmark.captures[group_ix].1 = prefix.len();
        }
    }
}

/// Push a closing wildcard boundary one level deeper as `**` consumes a
/// directory.  Opening boundaries keep the position they snapped on entry.
fn extend_wildcard(bookmark: &mut Bookmark, pattern: &Pattern, sub_prefix: &str) {
    for (group_ix, group) in pattern.capture_groups.iter().enumerate() {
        if group.to == (Boundary::Wildcard { segment_ix: bookmark.segment_ix }) {
            bookmark.captures[group_ix].1 = sub_prefix.len();
        }
    }
}

/// Resolve entity-name boundaries of `segment` against the name it matched.
fn resolve_ent_boundaries(
    bookmark: &mut Bookmark,
    pattern: &Pattern,
    segment: &PathSegment,
    prefix: &str,
    ent: &DirEnt,
    positions: &[usize],
) {
    let base = component_start(prefix);
    for (group_ix, group) in pattern.capture_groups.iter().enumerate() {
        if let Boundary::EntName { segment_ix, ent_ix } = group.from {
            if segment_ix == bookmark.segment_ix {
                bookmark.captures[group_ix].0 =
                    base + glob::boundary_offset(&segment.ent_name, positions, &ent.name, ent_ix);
            }
        }
        if let Boundary::EntName { segment_ix, ent_ix } = group.to {
            if segment_ix == bookmark.segment_ix {
                bookmark.captures[group_ix].1 =
                    base + glob::boundary_offset(&segment.ent_name, positions, &ent.name, ent_ix);
            }
        }
    }
}
