// Launch: invocation assembly and child process start-up.

pub mod assembler;
pub mod process;
