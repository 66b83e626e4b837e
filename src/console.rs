//! Line-based user interaction
//!
//! Operations talk to the user only through [`Console`]: one line in, plain
//! lines out. Styling and layout belong to whichever implementation is plugged in.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub trait Console {
    /// Show `prompt` and read one line without its line ending. `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    fn info(&mut self, message: &str);

    fn success(&mut self, message: &str);

    fn error(&mut self, message: &str);

    /// Cosmetic progress for long-running children.
    fn progress(&mut self, _label: &str, _elapsed: Duration) {}

    /// Ask a yes/no question; only "y" (any case) counts as yes.
    fn confirm(&mut self, question: &str) -> bool {
        self.read_line(&format!("{} (y/n): ", question))
            .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Console on the process's stdin/stdout.
#[derive(Debug, Default)]
pub struct StdConsole {
    progress_shown: bool,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish_progress(&mut self) {
        if self.progress_shown {
            println!();
            self.progress_shown = false;
        }
    }
}

impl Console for StdConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.finish_progress();
        print!("{}", prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        }
    }

    fn info(&mut self, message: &str) {
        self.finish_progress();
        println!("{}", message);
    }

    fn success(&mut self, message: &str) {
        self.finish_progress();
        println!("✓ {}", message);
    }

    fn error(&mut self, message: &str) {
        self.finish_progress();
        eprintln!("✗ {}", message);
    }

    fn progress(&mut self, label: &str, elapsed: Duration) {
        print!("\r{} {}s", label, elapsed.as_secs());
        let _ = io::stdout().flush();
        self.progress_shown = true;
    }
}

/// Which channel an output line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Prompt,
    Info,
    Success,
    Error,
}

/// Console fed from a fixed list of answers, recording everything written.
/// Used for batch runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: Vec<(Channel, String)>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[(Channel, String)] {
        &self.transcript
    }

    /// Lines written to `channel`.
    pub fn lines(&self, channel: Channel) -> Vec<&str> {
        self.transcript
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| line.as_str())
            .collect()
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.transcript.push((Channel::Prompt, prompt.to_string()));
        self.answers.pop_front()
    }

    fn info(&mut self, message: &str) {
        self.transcript.push((Channel::Info, message.to_string()));
    }

    fn success(&mut self, message: &str) {
        self.transcript.push((Channel::Success, message.to_string()));
    }

    fn error(&mut self, message: &str) {
        self.transcript.push((Channel::Error, message.to_string()));
    }
}
