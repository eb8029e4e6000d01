//! Command-line templates and their expansion into concrete argv vectors.
//!
//! A template is an alternance of literal and variable args, arranged as
//! "parts" that each carry a run of literals followed by a run of variables:
//!
//! ```text
//! clang++ -c -o $outputs -MMD -MF $depfile $inputs
//! ```
//!
//! Reifying a template replaces the variables with the paths of a particular
//! update.  The result is executed directly; no shell is involved.

use serde::Deserialize;

/// A slot in a template, filled at reification time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateVariable {
    InputFiles,
    OutputFiles,
    Depfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatePart {
    #[serde(default)]
    pub literal_args: Vec<String>,
    #[serde(default)]
    pub variable_args: Vec<TemplateVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandLineTemplate {
    pub binary_path: String,
    pub parts: Vec<TemplatePart>,
}

/// A binary path and arguments, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub binary_path: String,
    pub args: Vec<String>,
}

/// The paths substituted for the variables of one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLineParameters {
    pub depfile: String,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
}

pub fn reify(
    template: &CommandLineTemplate,
    parameters: &CommandLineParameters,
) -> CommandLine {
    let mut args = Vec::new();
    for part in &template.parts {
        args.extend(part.literal_args.iter().cloned());
        for variable in &part.variable_args {
            match variable {
                TemplateVariable::InputFiles => {
                    args.extend(parameters.input_files.iter().cloned())
                }
                TemplateVariable::OutputFiles => {
                    args.extend(parameters.output_files.iter().cloned())
                }
                TemplateVariable::Depfile => args.push(parameters.depfile.clone()),
            }
        }
    }
    CommandLine {
        binary_path: template.binary_path.clone(),
        args,
    }
}
