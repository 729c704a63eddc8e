//! Parsing typed commands.

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Discover once.
    Discover,
    /// Show the shop.
    Shop,
    /// Buy the named item.
    Buy(String),
    /// Show the stats panel.
    Stats,
    /// Show the leaderboard.
    Leaderboard,
    /// Write a save, optionally to a specific path.
    Export(Option<String>),
    /// Load a save, optionally from a specific path.
    Import(Option<String>),
    /// Wipe progress.
    Reset,
    /// Change the player name.
    Name(String),
    /// Toggle music.
    Music,
    /// Print the command list.
    Help,
    /// Leave the game.
    Quit,
    /// Blank line.
    Empty,
    /// Anything else, with a reason.
    Invalid(String),
}

/// The text printed by `help`.
pub const HELP: &str = "\
Commands:
  d, discover        discover once
  shop               list the shop
  buy <item>         buy an item (e.g. buy autoClicker)
  stats              stats for nerds
  leaderboard        show the leaderboard
  export [path]      write a save file
  import [path]      load a save file
  reset              wipe all progress
  name <new name>    change your username
  music              toggle music
  help               this list
  quit               leave";

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(h, r)| (h, r.trim()));
        let arg = (!rest.is_empty()).then(|| rest.to_owned());

        match head.to_ascii_lowercase().as_str() {
            "" => Self::Empty,
            "d" | "discover" => Self::Discover,
            "shop" => Self::Shop,
            "buy" => arg.map_or_else(|| Self::Invalid("buy what?".to_owned()), Self::Buy),
            "stats" => Self::Stats,
            "leaderboard" => Self::Leaderboard,
            "export" | "save" => Self::Export(arg),
            "import" | "load" => Self::Import(arg),
            "reset" => Self::Reset,
            "name" => {
                arg.map_or_else(|| Self::Invalid("name needs a value".to_owned()), Self::Name)
            }
            "music" => Self::Music,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Invalid(format!("unknown command `{other}`")),
        }
    }
}
