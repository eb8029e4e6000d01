//! Materializing the update map: every output file the manifest can
//! produce, keyed by local path, with the command and inputs producing it.
//!
//! Rules are expanded in declaration order.  Each rule resolves its output
//! pattern once per input capture; several inputs may funnel into the same
//! output (a link step), but two rules may not produce the same path.

use crate::captured_string::CapturedString;
use crate::error::{Error, Result};
use crate::io::DirReader;
use crate::manifest::{Manifest, RuleInput};
use crate::{path_glob, substitution};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// How to produce one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub command_line_ix: usize,
    pub local_input_file_paths: Vec<String>,
}

/// All output files the manifest describes.  `local_paths` preserves the
/// order outputs were declared in, which keeps planning and `--dot-graph`
/// output reproducible.
#[derive(Debug, Default, PartialEq)]
pub struct UpdateMap {
    output_files_by_path: HashMap<String, OutputFile>,
    local_paths: Vec<String>,
}

impl UpdateMap {
    pub fn get(&self, local_path: &str) -> Option<&OutputFile> {
        self.output_files_by_path.get(local_path)
    }

    pub fn contains(&self, local_path: &str) -> bool {
        self.output_files_by_path.contains_key(local_path)
    }

    pub fn local_paths(&self) -> &[String] {
        &self.local_paths
    }

    pub fn len(&self) -> usize {
        self.local_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_paths.is_empty()
    }

    fn insert(&mut self, local_path: String, output_file: OutputFile) {
        self.local_paths.push(local_path.clone());
        self.output_files_by_path.insert(local_path, output_file);
    }
}

/// Inputs accumulated for one resolved output path of a rule.
struct OutputGroup {
    local_path: String,
    input_paths: Vec<String>,
    segment_starts: Vec<usize>,
}

/// Crawl the source patterns once, then expand every rule.
pub fn from_manifest<R: DirReader>(
    root: &Path,
    manifest: &Manifest,
    reader: &R,
) -> Result<UpdateMap> {
    let mut source_captures: Vec<Vec<CapturedString>> =
        vec![Vec::new(); manifest.source_patterns.len()];
    let mut matcher = path_glob::Matcher::new(root, &manifest.source_patterns, reader);
    while let Some(path_match) = matcher.next()? {
        source_captures[path_match.pattern_ix].push(path_match.captured_path);
    }
    log::debug!(
        "crawled {} source file(s) for {} pattern(s)",
        source_captures.iter().map(Vec::len).sum::<usize>(),
        source_captures.len()
    );

    let mut map = UpdateMap::default();
    // Output captures of each expanded rule, for consumption by later rules.
    let mut rule_captures: Vec<Vec<CapturedString>> = Vec::with_capacity(manifest.rules.len());
    for (rule_ix, rule) in manifest.rules.iter().enumerate() {
        if rule.command_line_ix >= manifest.command_line_templates.len() {
            return Err(Error::ManifestParse(format!(
                "rule #{rule_ix} refers to unknown command line #{}",
                rule.command_line_ix
            )));
        }
        let mut groups: Vec<OutputGroup> = Vec::new();
        let mut group_ix_by_path: HashMap<String, usize> = HashMap::new();
        for input in &rule.inputs {
            let captures = match *input {
                RuleInput::Source { source_ix } => {
                    source_captures.get(source_ix).ok_or_else(|| {
                        Error::ManifestParse(format!(
                            "rule #{rule_ix} refers to unknown source pattern #{source_ix}"
                        ))
                    })?
                }
                RuleInput::Rule { rule_ix: input_ix } => {
                    if input_ix >= rule_ix {
                        return Err(Error::RuleOrder { rule_ix, input_ix });
                    }
                    &rule_captures[input_ix]
                }
            };
            for captured in captures {
                let resolved = substitution::resolve(&rule.output.segments, captured)?;
                match group_ix_by_path.get(&resolved.value) {
                    Some(&group_ix) => groups[group_ix].input_paths.push(captured.value.clone()),
                    None => {
                        group_ix_by_path.insert(resolved.value.clone(), groups.len());
                        groups.push(OutputGroup {
                            local_path: resolved.value,
                            input_paths: vec![captured.value.clone()],
                            segment_starts: resolved.segment_starts,
                        });
                    }
                }
            }
        }
        let mut captures_out = Vec::with_capacity(groups.len());
        for group in groups {
            if map.contains(&group.local_path) {
                return Err(Error::OutputCollision {
                    path: group.local_path,
                });
            }
            captures_out.push(substitution::capture(
                &rule.output.capture_groups,
                &group.local_path,
                &group.segment_starts,
            ));
            map.insert(
                group.local_path,
                OutputFile {
                    command_line_ix: rule.command_line_ix,
                    local_input_file_paths: group.input_paths,
                },
            );
        }
        rule_captures.push(captures_out);
    }
    Ok(map)
}

/// Render the dependency graph in Graphviz DOT form, one edge per
/// input/output pair.
pub fn write_dot(map: &UpdateMap, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "digraph upd {{")?;
    for local_path in map.local_paths() {
        if let Some(output_file) = map.get(local_path) {
            for input in &output_file.local_input_file_paths {
                writeln!(out, "  \"{input}\" -> \"{local_path}\";")?;
            }
        }
    }
    writeln!(out, "}}")
}
