//! Top-level entry point: argument parsing, orchestration, diagnostics, and
//! exit codes.

use argh::FromArgs;
use crate::error::{Error, Result};
use crate::hash::FileHashCache;
use crate::update::UpdateContext;
use crate::update_log::{self, LogCache};
use crate::update_map;
use crate::work::{Plan, Work};
use crate::{io, manifest};

#[derive(argh::FromArgs, Debug)]
/// upd, an incremental build tool driven by a declarative manifest.
struct Opts {
    /// print the version and exit
    #[argh(switch)]
    version: bool,

    /// print the project root path and exit
    #[argh(switch)]
    root: bool,

    /// print a Graphviz DOT rendition of the update graph instead of
    /// executing it
    #[argh(switch)]
    dot_graph: bool,

    /// update every output the manifest describes
    #[argh(switch)]
    all: bool,

    /// color diagnostics on stderr with ANSI escapes
    #[argh(switch)]
    color_diagnostics: bool,

    /// output files to update, as paths relative to the project root
    #[argh(positional)]
    targets: Vec<String>,
}

fn report_fatal(message: &str, color: bool) {
    if color {
        eprintln!("\x1b[1;31mupd: fatal:\x1b[0m {message}");
    } else {
        eprintln!("upd: fatal: {message}");
    }
}

pub fn run() -> i32 {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("UPD_LOG", "warn"))
        .format_timestamp(None)
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let mut args: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();
    // Everything after `--` is a target, whatever it looks like.
    let late_targets: Vec<String> = match args.iter().position(|&arg| arg == "--") {
        Some(ix) => {
            let rest = args.split_off(ix);
            rest[1..].iter().map(|arg| arg.to_string()).collect()
        }
        None => Vec::new(),
    };
    let mut opts = match Opts::from_args(&["upd"], &args) {
        Ok(opts) => opts,
        Err(early_exit) => match early_exit.status {
            Ok(()) => {
                println!("{}", early_exit.output);
                return 0;
            }
            Err(()) => {
                eprintln!("{}", early_exit.output);
                return 1;
            }
        },
    };
    opts.targets.extend(late_targets);

    if opts.version {
        println!("upd {}", env!("CARGO_PKG_VERSION"));
        return 0;
    }
    if opts.all && !opts.targets.is_empty() {
        report_fatal(
            "explicit targets cannot be combined with `--all`",
            opts.color_diagnostics,
        );
        return 1;
    }
    let executes = !opts.root && !opts.dot_graph;
    if executes && !opts.all && opts.targets.is_empty() {
        report_fatal(
            "no targets given; name some outputs or pass `--all`",
            opts.color_diagnostics,
        );
        return 1;
    }

    match run_with(&opts) {
        Ok(()) => 0,
        Err(err) => {
            report_fatal(&err.to_string(), opts.color_diagnostics);
            err.exit_code()
        }
    }
}

fn run_with(opts: &Opts) -> Result<()> {
    let cwd = std::env::current_dir().map_err(Error::io("."))?;
    let root = io::find_root_path_from(&cwd)?;
    log::debug!("project root: {}", root.display());
    if opts.root {
        println!("{}", root.display());
        return Ok(());
    }

    let manifest = manifest::read(&root)?;
    let reader = io::FsDirReader;
    let map = update_map::from_manifest(&root, &manifest, &reader)?;

    if opts.dot_graph {
        let stdout = std::io::stdout();
        return update_map::write_dot(&map, &mut stdout.lock()).map_err(Error::io("<stdout>"));
    }

    let targets: Vec<String> = if opts.all {
        map.local_paths().to_vec()
    } else {
        opts.targets
            .iter()
            .map(|target| io::localize_path(&root, target))
            .collect::<Result<_>>()?
    };

    let cache_dir = root.join(io::CACHE_DIR_NAME);
    std::fs::create_dir_all(&cache_dir).map_err(Error::io(&cache_dir))?;
    let log_path = cache_dir.join(io::LOG_FILE_NAME);
    let depfile_path = cache_dir.join(io::DEPFILE_NAME);
    io::ensure_fifo(&depfile_path)?;

    let plan = Plan::new(&map, &targets)?;
    let context = UpdateContext {
        root: &root,
        manifest: &manifest,
        update_map: &map,
        log_cache: LogCache::from_log_file(&log_path)?,
        hash_cache: FileHashCache::new(),
        local_depfile_path: format!("{}/{}", io::CACHE_DIR_NAME, io::DEPFILE_NAME),
        depfile_path,
    };
    let mut work = Work::new(plan, context);
    let updated = work.run()?;

    let rewrite_path = cache_dir.join(io::LOG_REWRITE_FILE_NAME);
    update_log::rewrite_file(&log_path, &rewrite_path, work.context.log_cache.records())?;

    if updated == 0 {
        println!("upd: no work to do");
    } else {
        println!(
            "upd: ran {} update{}, now up to date",
            updated,
            if updated == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
