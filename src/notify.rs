//! User-facing notifications and confirmations.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use owo_colors::OwoColorize;
use parking_lot::Mutex;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for short messages and yes/no questions.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: &str);

    /// Ask the user to confirm. `false` means "do nothing".
    fn confirm(&self, message: &str) -> bool;
}

/// Prints to stderr so stdout stays machine-readable.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    assume_yes: bool,
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            quiet: false,
        }
    }

    /// Suppress everything except errors. Used with `--json`.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: ToastLevel, message: &str) {
        if self.quiet && level != ToastLevel::Error {
            return;
        }
        match level {
            ToastLevel::Info => eprintln!("{}", message),
            ToastLevel::Success => eprintln!("{} {}", "✓".green(), message),
            ToastLevel::Warning => eprintln!("{} {}", "!".yellow(), message.yellow()),
            ToastLevel::Error => eprintln!("{} {}", "error:".red().bold(), message),
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        eprint!("{} [y/N] ", message);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Records everything and answers confirmations from a script.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(ToastLevel, String)>>,
    prompts: Mutex<Vec<String>>,
    answers: Mutex<VecDeque<bool>>,
    default_answer: bool,
}

impl RecordingNotifier {
    /// Confirms everything unless answers are queued.
    pub fn new() -> Self {
        Self {
            default_answer: true,
            ..Self::default()
        }
    }

    /// Declines everything unless answers are queued.
    pub fn declining() -> Self {
        Self::default()
    }

    pub fn push_answer(&self, answer: bool) {
        self.answers.lock().push_back(answer);
    }

    pub fn messages(&self) -> Vec<(ToastLevel, String)> {
        self.messages.lock().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last(&self) -> Option<(ToastLevel, String)> {
        self.messages.lock().last().cloned()
    }

    pub fn count(&self, level: ToastLevel) -> usize {
        self.messages.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
        self.prompts.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: ToastLevel, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }

    fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().push(message.to_string());
        self.answers.lock().pop_front().unwrap_or(self.default_answer)
    }
}
