pub mod canon;
pub mod captured_string;
pub mod command_line;
pub mod depfile;
pub mod error;
pub mod glob;
pub mod hash;
pub mod io;
pub mod manifest;
pub mod path_glob;
pub mod run;
pub mod smallmap;
pub mod substitution;
pub mod update;
pub mod update_log;
pub mod update_map;
pub mod work;

#[cfg(not(windows))]
use jemallocator::Jemalloc;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;
