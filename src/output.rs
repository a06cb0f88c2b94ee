use clap::ValueEnum;
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// Console progress for long-running commands.
///
/// Pretty is the only chatty mode; json and minimal stay quiet until the
/// final report so their stdout remains machine-parseable.
pub struct Progress {
    format: Format,
}

impl Progress {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    fn chatty(&self) -> bool {
        self.format == Format::Pretty
    }

    pub fn phase(&self, message: &str) {
        if self.chatty() {
            println!("{} {}", "[migrate]".bold(), message);
        }
    }

    pub fn record(&self, kind: &str, key: &str) {
        if self.chatty() {
            println!("  {} {}", format!("[{kind}]").dimmed(), key);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.chatty() {
            println!("    {}", format!("warning: {message}").yellow());
        }
    }

    pub fn error(&self, message: &str) {
        if self.chatty() {
            println!("    {}", format!("error: {message}").red());
        }
    }
}
