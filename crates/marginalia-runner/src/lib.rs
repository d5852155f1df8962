//! Process execution for marginalia
//!
//! Commands are described argv-style by [`CommandSpec`] and executed either
//! asynchronously by [`TokioRunner`] (the Claude CLI backend) or blocking by
//! [`NativeRunner`] (short lookups during binary discovery). Both enforce a
//! timeout and kill the child when it elapses.

mod command_spec;
mod error;
mod io;
mod native;
mod platform;
mod process;
mod tokio_runner;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use native::NativeRunner;
pub use process::{AsyncProcessRunner, ProcessOutput, ProcessRunner};
pub use tokio_runner::TokioRunner;
