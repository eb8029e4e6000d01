//! Updating a single file: freshness check, subprocess execution, depfile
//! ingestion, and imprint recording.

use crate::command_line::{self, CommandLine, CommandLineParameters};
use crate::error::{Error, Result};
use crate::hash::{self, FileHashCache};
use crate::manifest::Manifest;
use crate::update_log::{FileRecord, LogCache};
use crate::update_map::UpdateMap;
use crate::{depfile, io};
use std::path::{Path, PathBuf};
use std::process::Command;

pub enum UpdateOutcome {
    UpToDate,
    Updated,
}

/// Everything one run's executor needs.  The update map and manifest are
/// frozen; the log and hash caches accumulate as targets complete.
pub struct UpdateContext<'a> {
    pub root: &'a Path,
    pub manifest: &'a Manifest,
    pub update_map: &'a UpdateMap,
    pub log_cache: LogCache,
    pub hash_cache: FileHashCache,
    /// Depfile FIFO path as passed to commands, relative to the root.
    pub local_depfile_path: String,
    /// The same FIFO as an absolute path, for opening it ourselves.
    pub depfile_path: PathBuf,
}

impl<'a> UpdateContext<'a> {
    /// A target is up to date when its recorded imprint matches the
    /// recomputed one and the artifact on disk still carries the recorded
    /// content hash.  A missing artifact or a missing recorded dependency
    /// just means stale.
    fn is_file_up_to_date(
        &mut self,
        local_target_path: &str,
        local_src_paths: &[String],
        command_line: &CommandLine,
    ) -> Result<bool> {
        let record = match self.log_cache.find(local_target_path) {
            Some(record) => record.clone(),
            None => return Ok(false),
        };
        let imprint = match hash::target_imprint(
            &mut self.hash_cache,
            self.root,
            local_src_paths,
            &record.dependency_local_paths,
            command_line,
        ) {
            Ok(imprint) => imprint,
            Err(err) if err.is_not_found() => return Ok(false),
            Err(err) => return Err(err),
        };
        if imprint != record.imprint {
            return Ok(false);
        }
        match self.hash_cache.hash(&self.root.join(local_target_path)) {
            Ok(content_hash) => Ok(content_hash == record.content_hash),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Bring one output file up to date, running its command if needed.
    pub fn update_file(&mut self, local_target_path: &str) -> Result<UpdateOutcome> {
        let update_map = self.update_map;
        let manifest = self.manifest;
        let output_file = update_map.get(local_target_path).ok_or_else(|| {
            Error::InternalInvariant(format!("`{local_target_path}` is not in the update map"))
        })?;
        let template = manifest
            .command_line_templates
            .get(output_file.command_line_ix)
            .ok_or_else(|| {
                Error::InternalInvariant(format!(
                    "unknown command line #{}",
                    output_file.command_line_ix
                ))
            })?;
        let command_line = command_line::reify(
            template,
            &CommandLineParameters {
                depfile: self.local_depfile_path.clone(),
                input_files: output_file.local_input_file_paths.clone(),
                output_files: vec![local_target_path.to_string()],
            },
        );

        if self.is_file_up_to_date(
            local_target_path,
            &output_file.local_input_file_paths,
            &command_line,
        )? {
            log::debug!("up to date: {local_target_path}");
            return Ok(UpdateOutcome::UpToDate);
        }

        println!("updating {local_target_path}");
        if let Some(parent) = Path::new(local_target_path).parent() {
            if !parent.as_os_str().is_empty() {
                let dir = self.root.join(parent);
                std::fs::create_dir_all(&dir).map_err(Error::io(&dir))?;
            }
        }

        let depfile_data = self.run_with_depfile(&command_line)?;
        let mut dependency_local_paths = Vec::new();
        if let Some(data) = depfile_data {
            for dep_path in data.dependency_paths {
                dependency_local_paths.push(io::localize_path(self.root, &dep_path)?);
            }
        }

        let target_path = self.root.join(local_target_path);
        self.hash_cache.invalidate(&target_path);
        let imprint = hash::target_imprint(
            &mut self.hash_cache,
            self.root,
            &output_file.local_input_file_paths,
            &dependency_local_paths,
            &command_line,
        )?;
        let content_hash = self.hash_cache.hash(&target_path)?;
        self.log_cache.record(
            local_target_path.to_string(),
            FileRecord {
                imprint,
                content_hash,
                dependency_local_paths,
            },
        )?;
        Ok(UpdateOutcome::Updated)
    }

    /// Run the command while a worker drains the depfile FIFO, so the tool
    /// can write it without blocking.  We hold a write end open for the
    /// duration of the run: when the command never touches the depfile, the
    /// worker still observes end-of-file once the command exits.
    fn run_with_depfile(
        &mut self,
        command_line: &CommandLine,
    ) -> Result<Option<depfile::DepfileData>> {
        let reader = {
            let depfile_path = self.depfile_path.clone();
            std::thread::spawn(move || depfile::read(&depfile_path))
        };
        let writer = std::fs::OpenOptions::new()
            .write(true)
            .open(&self.depfile_path)
            .map_err(Error::io(&self.depfile_path))?;
        let run_result = run_command_line(self.root, command_line);
        drop(writer);
        // Always join the worker, even on failure, so it cannot leak.
        let depfile_result = reader.join().map_err(|_| {
            Error::InternalInvariant("depfile reader thread panicked".to_string())
        })?;
        run_result?;
        depfile_result
    }
}

fn run_command_line(root: &Path, command_line: &CommandLine) -> Result<()> {
    log::debug!(
        "spawning {} {:?} in {}",
        command_line.binary_path,
        command_line.args,
        root.display()
    );
    let status = Command::new(&command_line.binary_path)
        .args(&command_line.args)
        .current_dir(root)
        .status()
        .map_err(|err| Error::ProcessFailure {
            binary: command_line.binary_path.clone(),
            status: err.to_string(),
        })?;
    if !status.success() {
        return Err(Error::ProcessFailure {
            binary: command_line.binary_path.clone(),
            status: status.to_string(),
        });
    }
    Ok(())
}
