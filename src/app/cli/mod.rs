//! Command-line surface: argument parsing and configuration loading

pub mod args;
pub mod config;

#[cfg(test)]
mod tests;
