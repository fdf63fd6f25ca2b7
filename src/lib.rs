//! # ffi-pointer
//!
//! Typed, cursor-based access to raw process memory.
//!
//! The [`Pointer`] accessor reads and writes fixed-width integers, floats,
//! NUL-terminated strings and stored addresses at a raw address, optionally
//! advancing its cursor after each access. The [`host`] adapter exposes it to
//! a dynamically typed script host, and [`script`] is a small such host that
//! the `ffi-pointer` binary runs.
//!
//! ## Feature Flags
//!
//! - `strict-range`: the host adapter range-checks every integer put, not
//!   only the 8-bit kinds.
//! - `terminated-cstring-advance`: CString puts and gets advance past the
//!   terminator of the string written or read.
//!
//! ## Logging
//!
//! The binary reads its `tracing` filter from `FFI_POINTER_LOG` (default `warn`).
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};

pub mod error;
pub mod host;
pub mod pointer;
pub mod script;
pub mod utils;

pub use error::{PointerError, ScriptError};
pub use pointer::{CStringAdvance, Pointer};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Runs a Pointer script against raw process memory"
)]
pub struct Args {
    /// Script to run; reads standard input when omitted.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,
}

pub fn run_cli() -> ExitCode {
    utils::init_tracing();
    let args = Args::parse();

    let source = match utils::read_script(args.script.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading script: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut interpreter = script::Interpreter::new();
    let stdout = std::io::stdout();
    match interpreter.run(&source, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
