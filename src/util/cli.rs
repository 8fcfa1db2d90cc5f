//! Command-line plumbing shared by the `mwe-*` binaries
use clap::Args;
use log::{error, LevelFilter};
use std::env;
use std::io::Write;
use std::process;

use crate::error::Result;

/// Options accepted by every binary
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
  /// Print progress messages on stderr
  #[arg(short, long)]
  pub verbose: bool,
  /// Print full error details on failure
  #[arg(short = 'D', long)]
  pub debug: bool,
}

/// Sets up `env_logger`: warnings by default, progress with `-v`, everything with `-D`.
/// `RUST_LOG` still has the last word.
pub fn init_logging(common: &CommonArgs) {
  let level = if common.debug {
    LevelFilter::Debug
  } else if common.verbose {
    LevelFilter::Info
  } else {
    LevelFilter::Warn
  };
  let mut builder = env_logger::Builder::new();
  builder
    .filter_level(level)
    .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()));
  if let Ok(spec) = env::var("RUST_LOG") {
    builder.parse_filters(&spec);
  }
  let _ = builder.try_init();
}

/// A closed downstream pipe ends the process silently instead of panicking in `print!`
pub fn reset_sigpipe() {
  unsafe {
    libc::signal(libc::SIGPIPE, libc::SIG_DFL);
  }
}

/// Common prologue of every binary
pub fn setup(common: &CommonArgs) {
  reset_sigpipe();
  init_logging(common);
}

/// Maps the outcome of a run to the process exit code:
/// 0 on success, 2 on bad options, 1 on any other error
pub fn exit_with(common: &CommonArgs, result: Result<()>) -> ! {
  let code = match result {
    Ok(()) => 0,
    Err(ref err) if err.is_broken_pipe() => 0,
    Err(err) => {
      if common.debug {
        error!("{:?}", err);
      } else {
        error!("{}", err);
      }
      if err.is_usage() {
        2
      } else {
        1
      }
    },
  };
  process::exit(code)
}
