//! Command tokens accepted at the shell prompt

/// A validated shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    HardResetDefault,
    HardResetUnstable,
    SoftReset,
    Rebase,
    CreateBranch,
    SwitchBranch,
    ChangePrefix,
    ShowLog,
    ShowStatus,
    DeleteBranch,
    ChangeDirectory,
    SetRemote,
    ChangeLocale,
    Profiles,
    Scripts,
    ClearHistory,
    Help,
    Quit,
    Unknown(String),
}

/// Key and description, in the order the help screen shows them.
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("1", "Hard reset to the default branch"),
    ("2", "Hard reset to unstable"),
    ("3", "Soft reset to the default branch"),
    ("4", "Rebase onto the default branch"),
    ("5", "Create a branch from the default branch"),
    ("6", "List and switch branches"),
    ("7", "Change branch prefix"),
    ("8", "Show log"),
    ("9", "Help"),
    ("s", "Show status"),
    ("d", "Delete a branch"),
    ("w", "Change working directory"),
    ("r", "Set default remote"),
    ("l", "Change language"),
    ("p", "Profiles"),
    ("n", "Run a package.json script"),
    ("c", "Clear histories"),
    ("q", "Quit"),
];

impl Command {
    /// Parse the first token of `line`; `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let token = line.split_whitespace().next()?.to_ascii_lowercase();
        let command = match token.as_str() {
            "1" => Command::HardResetDefault,
            "2" => Command::HardResetUnstable,
            "3" => Command::SoftReset,
            "4" => Command::Rebase,
            "5" => Command::CreateBranch,
            "6" => Command::SwitchBranch,
            "7" => Command::ChangePrefix,
            "8" => Command::ShowLog,
            "9" | "h" | "help" | "m" => Command::Help,
            "s" => Command::ShowStatus,
            "d" => Command::DeleteBranch,
            "w" => Command::ChangeDirectory,
            "r" => Command::SetRemote,
            "l" => Command::ChangeLocale,
            "p" => Command::Profiles,
            "n" => Command::Scripts,
            "c" => Command::ClearHistory,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(token),
        };
        Some(command)
    }
}
