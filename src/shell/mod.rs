//! A compact POSIX-flavoured shell engine with a pluggable exec hook.
//!
//! [`parse`] turns source text into a [`Program`]; a [`Runner`] executes it
//! and hands every non-builtin command to an [`ExecHook`] instead of
//! spawning it directly.

pub mod ast;
mod builtins;
mod expand;
mod interp;
mod io;
mod parser;
mod status;

pub use ast::Program;
pub use interp::{
    EngineError, Environment, ExecContext, ExecHook, Runner, RunnerConfig, ScriptError,
};
pub use io::{Capture, Input, Output, OutputBuffer, StdStreams};
pub use parser::{parse, ParseError};
pub use status::ExitStatus;
