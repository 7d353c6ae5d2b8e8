//! Terminal color support for table output.
//!
//! With the `ansi` feature (default) this uses the `colored` crate, which
//! respects `NO_COLOR`, `TERM` and TTY detection. Without it every helper
//! returns the input unchanged.

#[cfg(feature = "ansi")]
use colored::Colorize;

#[cfg(feature = "ansi")]
pub fn green(s: &str) -> String {
    s.green().to_string()
}

#[cfg(feature = "ansi")]
pub fn red(s: &str) -> String {
    s.red().to_string()
}

#[cfg(feature = "ansi")]
pub fn yellow(s: &str) -> String {
    s.yellow().to_string()
}

#[cfg(feature = "ansi")]
pub fn bold(s: &str) -> String {
    s.bold().to_string()
}

#[cfg(feature = "ansi")]
pub fn dim(s: &str) -> String {
    s.dimmed().to_string()
}

#[cfg(not(feature = "ansi"))]
pub fn green(s: &str) -> String {
    String::from(s)
}

#[cfg(not(feature = "ansi"))]
pub fn red(s: &str) -> String {
    String::from(s)
}

#[cfg(not(feature = "ansi"))]
pub fn yellow(s: &str) -> String {
    String::from(s)
}

#[cfg(not(feature = "ansi"))]
pub fn bold(s: &str) -> String {
    String::from(s)
}

#[cfg(not(feature = "ansi"))]
pub fn dim(s: &str) -> String {
    String::from(s)
}
