//! Driving adapters: the operator command line.

pub mod cli;
