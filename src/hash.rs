//! Hashing of file contents and command lines, from which target imprints
//! are derived.  An imprint is compared against the one recorded in the
//! update log to decide whether a target must be updated again.

use crate::command_line::CommandLine;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh64::Xxh64;

/// Separates logically distinct fields fed into one hasher, so that
/// ["ab", "c"] and ["a", "bc"] produce different digests.
const UNIT_SEPARATOR: u8 = 0x1F;

const SEED: u64 = 0;

/// A 64-bit digest, of either a file's content or a target's inputs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Hash(pub u64);

/// Hash a whole file by streaming fixed-size blocks through XXH64.
pub fn hash_file(path: &Path) -> Result<Hash> {
    let mut file = File::open(path).map_err(Error::io(path))?;
    let mut hasher = Xxh64::new(SEED);
    let mut block = [0u8; 4096];
    loop {
        let read = file.read(&mut block).map_err(Error::io(path))?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    Ok(Hash(hasher.digest()))
}

/// Memoizes file digests for the duration of one run.  Not persisted; the
/// update log carries digests across runs.
#[derive(Default)]
pub struct FileHashCache {
    digests: HashMap<PathBuf, Hash>,
}

impl FileHashCache {
    pub fn new() -> Self {
        FileHashCache::default()
    }

    pub fn hash(&mut self, path: &Path) -> Result<Hash> {
        if let Some(&digest) = self.digests.get(path) {
            return Ok(digest);
        }
        let digest = hash_file(path)?;
        self.digests.insert(path.to_owned(), digest);
        Ok(digest)
    }

    /// Drop a memoized digest, after the file has been rewritten.
    pub fn invalidate(&mut self, path: &Path) {
        self.digests.remove(path);
    }
}

pub fn hash_command_line(command_line: &CommandLine) -> Hash {
    let mut hasher = Xxh64::new(SEED);
    hasher.update(command_line.binary_path.as_bytes());
    hasher.update(&[UNIT_SEPARATOR]);
    for arg in &command_line.args {
        hasher.update(arg.as_bytes());
        hasher.update(&[UNIT_SEPARATOR]);
    }
    Hash(hasher.digest())
}

/// Reduce the content digests of `local_paths`, relative to `root`, into a
/// single hash.  Order is significant.
pub fn hash_files(
    cache: &mut FileHashCache,
    root: &Path,
    local_paths: &[String],
) -> Result<Hash> {
    let mut hasher = Xxh64::new(SEED);
    for local_path in local_paths {
        let digest = cache.hash(&root.join(local_path))?;
        hasher.update(&digest.0.to_le_bytes());
    }
    Ok(Hash(hasher.digest()))
}

/// The imprint summarizes everything that went into producing a target: the
/// exact command line, the declared inputs in order, and the dependencies
/// discovered through the depfile in recorded order.
pub fn target_imprint(
    cache: &mut FileHashCache,
    root: &Path,
    local_src_paths: &[String],
    dependency_local_paths: &[String],
    command_line: &CommandLine,
) -> Result<Hash> {
    let mut hasher = Xxh64::new(SEED);
    hasher.update(&hash_command_line(command_line).0.to_le_bytes());
    hasher.update(&hash_files(cache, root, local_src_paths)?.0.to_le_bytes());
    hasher.update(&hash_files(cache, root, dependency_local_paths)?.0.to_le_bytes());
    Ok(Hash(hasher.digest()))
}
