use serde::{Deserialize, Serialize};

/// Identity of a remote user; a Telegram user id.
pub type UserId = i64;

/// The commands a remote user can issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    ShowMenu,
    GetCurrent,
    GetWeekStats,
    GetMonthStats,
}

impl Command {
    /// Maps a button payload to a query command.
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            "current" => Some(Command::GetCurrent),
            "week" => Some(Command::GetWeekStats),
            "month" => Some(Command::GetMonthStats),
            _ => None,
        }
    }

    /// Maps a chat command such as `/start` or `/menu@plant_bot` to a command.
    pub fn from_text(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "start" | "menu" => Some(Command::ShowMenu),
            "current" => Some(Command::GetCurrent),
            "week" => Some(Command::GetWeekStats),
            "month" => Some(Command::GetMonthStats),
            _ => None,
        }
    }

    pub fn callback_data(&self) -> &'static str {
        match self {
            Command::ShowMenu => "menu",
            Command::GetCurrent => "current",
            Command::GetWeekStats => "week",
            Command::GetMonthStats => "month",
        }
    }
}

/// A command together with who sent it and how.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCommand {
    pub requester: UserId,
    pub command: Command,
    /// Set when the command came from pressing a menu button
    pub callback_id: Option<String>,
}

impl InboundCommand {
    pub fn new(requester: UserId, command: Command) -> Self {
        Self {
            requester,
            command,
            callback_id: None,
        }
    }

    pub fn with_callback(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = Some(callback_id.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub command: Command,
}

/// Query options offered by the menu, in display order.
pub const MENU: [MenuEntry; 3] = [
    MenuEntry {
        label: "Current readings",
        command: Command::GetCurrent,
    },
    MenuEntry {
        label: "Weekly statistics",
        command: Command::GetWeekStats,
    },
    MenuEntry {
        label: "Monthly statistics",
        command: Command::GetMonthStats,
    },
];
