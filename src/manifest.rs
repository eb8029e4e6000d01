//! The manifest: what `Updfile` declares.  Source patterns find the files to
//! build from, command-line templates describe how to invoke tools, and
//! rules tie the two together through output substitution patterns.

use crate::command_line::CommandLineTemplate;
use crate::error::{Error, Result};
use crate::io::UPDFILE_NAME;
use crate::{path_glob, substitution};
use serde::Deserialize;
use std::path::Path;

/// One input set of an update rule: either the files matched by a source
/// pattern, or the outputs of an earlier rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleInput {
    Source { source_ix: usize },
    Rule { rule_ix: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRule {
    pub command_line_ix: usize,
    pub inputs: Vec<RuleInput>,
    pub output: substitution::Pattern,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub source_patterns: Vec<path_glob::Pattern>,
    pub command_line_templates: Vec<CommandLineTemplate>,
    pub rules: Vec<UpdateRule>,
}

/// The raw JSON shape.  Pattern strings are parsed into their typed form in
/// a second step; serde_json is the external parser and enforces that index
/// fields are integer-valued.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    source_patterns: Vec<String>,
    #[serde(default)]
    command_line_templates: Vec<CommandLineTemplate>,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    command_line_ix: usize,
    inputs: Vec<RuleInput>,
    output: String,
}

pub fn parse(text: &str) -> Result<Manifest> {
    let raw: RawManifest =
        serde_json::from_str(text).map_err(|err| Error::ManifestParse(err.to_string()))?;
    let source_patterns = raw
        .source_patterns
        .iter()
        .map(|pattern| path_glob::parse(pattern))
        .collect::<Result<Vec<_>>>()?;
    let rules = raw
        .rules
        .into_iter()
        .map(|rule| {
            Ok(UpdateRule {
                command_line_ix: rule.command_line_ix,
                inputs: rule.inputs,
                output: substitution::parse(&rule.output)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Manifest {
        source_patterns,
        command_line_templates: raw.command_line_templates,
        rules,
    })
}

/// Load `<root>/Updfile`.
pub fn read(root: &Path) -> Result<Manifest> {
    let path = root.join(UPDFILE_NAME);
    let text = std::fs::read_to_string(&path).map_err(Error::io(&path))?;
    parse(&text)
}
