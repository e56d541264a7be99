//! User-facing side effects of the login flows.
//!
//! Flows never print or spawn processes directly; they go through these
//! capabilities so tests can observe what the user would have seen.

use std::io;

/// Where flow messages and warnings go.
pub trait Console: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Prints informational lines to stdout and warnings to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("⚠️  {message}");
    }
}

/// Opens URLs for the user.
pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Platform default browser via the `open` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}
