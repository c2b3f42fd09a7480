//! # CLI Command Implementations
//!
//! Each subcommand of the `volt` tool lives in its own file, with an `Args`
//! struct derived using `clap` and an `execute` function that takes the
//! parsed arguments and the resolved layout.
//!
//! Commands own the process-wide transaction: they take it before calling
//! into the build engine and release it when they return.

pub mod build;
pub mod rebuild;
