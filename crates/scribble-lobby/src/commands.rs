//! Slash commands typed into the chat.
//!
//! A chat line starting with [`COMMAND_PREFIX`] is tokenized, parsed into
//! a [`Command`], and executed against the lobby's game. Execution never
//! talks to clients directly; it returns [`Reply`] values the lobby loop
//! fans out. Permission failures and bad numbers come back as
//! [`CommandError`], which the loop logs and otherwise ignores.

use std::collections::BTreeMap;
use std::sync::Arc;

use scribble_game::{Game, GameError};
use scribble_presence::Presence;

/// Marks a chat line as a command.
pub const COMMAND_PREFIX: char = '/';

/// What the lobby should say in response to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reply {
    /// Only to whoever issued the command.
    Private(String),
    /// To the whole room.
    Room(String),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CommandError {
    #[error("not allowed")]
    Unauthorized,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown command: {0}")]
    Unknown(String),
}

/// Word bank edits available through `/words`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WordsEdit {
    Set(Vec<String>),
    Add(String),
    AddAll(Vec<String>),
    Remove(String),
    RemoveAll(Vec<String>),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// `/time [secs]`
    Time(Option<u32>),
    /// `/rounds [n]`
    Rounds(Option<u32>),
    Players,
    /// `/words [edit]`
    Words(Option<WordsEdit>),
    Start,
    Next,
    /// `/draw [name]`
    Draw(Option<String>),
}

/// Splits on whitespace. A double-quoted run is one token with the quotes
/// stripped, so `add "ice cream"` yields `["add", "ice cream"]`.
pub(crate) fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' => {
                if quoted && !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = !quoted;
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

impl Command {
    /// Parses a command line with the prefix already stripped.
    pub(crate) fn parse(line: &str) -> Result<Self, CommandError> {
        let tokens = tokenize(line);
        let Some((verb, args)) = tokens.split_first() else {
            return Err(CommandError::Unknown(String::new()));
        };

        match verb.to_lowercase().as_str() {
            "time" => Ok(Self::Time(number(args)?)),
            "rounds" => Ok(Self::Rounds(number(args)?)),
            "players" => Ok(Self::Players),
            "words" => Ok(Self::Words(words_edit(args)?)),
            "start" => Ok(Self::Start),
            "next" => Ok(Self::Next),
            "draw" => Ok(Self::Draw(args.first().cloned())),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }

    /// Returns `true` if only the host may run this form of the command.
    pub(crate) fn is_host_only(&self) -> bool {
        matches!(
            self,
            Self::Time(Some(_))
                | Self::Rounds(Some(_))
                | Self::Words(Some(_))
                | Self::Start
                | Self::Draw(_)
        )
    }
}

fn number(args: &[String]) -> Result<Option<u32>, CommandError> {
    match args.first() {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CommandError::InvalidArgument(raw.clone())),
    }
}

fn words_edit(args: &[String]) -> Result<Option<WordsEdit>, CommandError> {
    let Some((action, rest)) = args.split_first() else {
        return Ok(None);
    };
    let joined = || {
        let word = rest.join(" ");
        if word.trim().is_empty() {
            Err(CommandError::InvalidArgument(format!("{action} needs a word")))
        } else {
            Ok(word)
        }
    };

    let edit = match action.to_lowercase().as_str() {
        "set" => WordsEdit::Set(rest.to_vec()),
        "add" => WordsEdit::Add(joined()?),
        "add-all" => WordsEdit::AddAll(rest.to_vec()),
        "remove" => WordsEdit::Remove(joined()?),
        "remove-all" => WordsEdit::RemoveAll(rest.to_vec()),
        "clear" => WordsEdit::Clear,
        other => return Err(CommandError::InvalidArgument(other.to_owned())),
    };
    Ok(Some(edit))
}

/// Everything a command may look at, borrowed from the lobby loop.
pub(crate) struct Invocation<'a> {
    pub(crate) sender: &'a str,
    pub(crate) host: Option<&'a str>,
    pub(crate) game: &'a Game,
    pub(crate) presences: &'a BTreeMap<String, Arc<Presence>>,
}

impl Invocation<'_> {
    fn is_host(&self) -> bool {
        self.host == Some(self.sender)
    }

    pub(crate) fn execute(&self, command: Command) -> Result<Vec<Reply>, CommandError> {
        if command.is_host_only() && !self.is_host() {
            return Err(CommandError::Unauthorized);
        }

        match command {
            Command::Time(None) => Ok(vec![Reply::Private(format!(
                "Each turn lasts {} seconds.",
                self.game.round_duration()
            ))]),
            Command::Time(Some(secs)) => {
                self.game.set_round_duration(secs).map_err(invalid)?;
                Ok(vec![Reply::Room(format!(
                    "Each turn now lasts {secs} seconds."
                ))])
            }
            Command::Rounds(None) => Ok(vec![Reply::Private(format!(
                "The game has {} rounds.",
                self.game.rounds()
            ))]),
            Command::Rounds(Some(n)) => {
                self.game.set_rounds(n).map_err(invalid)?;
                Ok(vec![Reply::Room(format!("The game now has {n} rounds."))])
            }
            Command::Players => Ok(vec![Reply::Private(self.players())]),
            Command::Words(None) => {
                let words = self.game.words();
                Ok(vec![Reply::Private(format!(
                    "Words ({}): {}",
                    words.len(),
                    words.join(", ")
                ))])
            }
            Command::Words(Some(edit)) => Ok(vec![Reply::Private(self.edit_words(edit))]),
            Command::Start => match self.game.start() {
                Ok(()) => Ok(Vec::new()),
                Err(e) => Ok(vec![Reply::Private(rejection(&e))]),
            },
            Command::Next => {
                let allowed = self.is_host() || self.game.is_current_artist(self.sender);
                if !allowed {
                    return Err(CommandError::Unauthorized);
                }
                if !self.game.skip_turn() {
                    return Err(CommandError::InvalidArgument("no turn to skip".into()));
                }
                Ok(Vec::new())
            }
            Command::Draw(name) => {
                let name = name.as_deref().unwrap_or(self.sender);
                if !self.presences.contains_key(name) {
                    return Err(CommandError::InvalidArgument(name.to_owned()));
                }
                match self.game.set_current_artist(name) {
                    Ok(()) => Ok(Vec::new()),
                    Err(e) => Ok(vec![Reply::Private(rejection(&e))]),
                }
            }
        }
    }

    /// One line per presence, best score first.
    fn players(&self) -> String {
        let mut rows: Vec<(&str, u32)> = self
            .presences
            .values()
            .map(|p| (p.name(), p.score()))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut lines = vec![format!("Players ({}):", rows.len())];
        for (name, score) in rows {
            let marker = if Some(name) == self.host { " (host)" } else { "" };
            lines.push(format!("{name}{marker}: {score}"));
        }
        lines.join("\n")
    }

    fn edit_words(&self, edit: WordsEdit) -> String {
        let count = self.game.edit_words(|bank| {
            match edit {
                WordsEdit::Set(words) => bank.set(words),
                WordsEdit::Add(word) => {
                    bank.add(word);
                }
                WordsEdit::AddAll(words) => {
                    bank.add_all(words);
                }
                WordsEdit::Remove(word) => {
                    bank.remove(&word);
                }
                WordsEdit::RemoveAll(words) => {
                    bank.remove_all(words);
                }
                WordsEdit::Clear => bank.clear(),
            }
            bank.len()
        });
        format!("The word bank now has {count} words.")
    }
}

fn invalid(e: GameError) -> CommandError {
    CommandError::InvalidArgument(e.to_string())
}

fn rejection(e: &GameError) -> String {
    match e {
        GameError::AlreadyLive => "A game is already in progress.".to_owned(),
        GameError::NotEnoughWords { have, need } => format!(
            "Add more words first: the bank needs more than {need}, it has {have}."
        ),
        GameError::NoArtists => "There is nobody to draw.".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_game::GameConfig;
    use scribble_presence::Handles;
    use tokio::sync::mpsc;

    #[test]
    fn test_tokenize_splits_on_spaces() {
        assert_eq!(tokenize("words add  cat"), ["words", "add", "cat"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_quoted_run_together() {
        assert_eq!(
            tokenize(r#"words add-all "ice cream" dog "hot air balloon""#),
            ["words", "add-all", "ice cream", "dog", "hot air balloon"]
        );
    }

    #[test]
    fn test_tokenize_unterminated_quote_runs_to_end() {
        assert_eq!(tokenize(r#"draw "mary jane"#), ["draw", "mary jane"]);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(Command::parse("time").unwrap(), Command::Time(None));
        assert_eq!(Command::parse("time 45").unwrap(), Command::Time(Some(45)));
        assert_eq!(Command::parse("ROUNDS 4").unwrap(), Command::Rounds(Some(4)));
        assert!(matches!(
            Command::parse("time soon"),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(
            Command::parse("rounds -1"),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_words_edits() {
        assert_eq!(Command::parse("words").unwrap(), Command::Words(None));
        assert_eq!(
            Command::parse("words add ice cream").unwrap(),
            Command::Words(Some(WordsEdit::Add("ice cream".into())))
        );
        assert_eq!(
            Command::parse(r#"words remove-all cat "hot dog""#).unwrap(),
            Command::Words(Some(WordsEdit::RemoveAll(vec!["cat".into(), "hot dog".into()])))
        );
        assert_eq!(
            Command::parse("words clear").unwrap(),
            Command::Words(Some(WordsEdit::Clear))
        );
        assert!(Command::parse("words add").is_err());
        assert!(Command::parse("words shuffle").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(Command::parse("dance"), Err(CommandError::Unknown(_))));
        assert!(matches!(Command::parse(""), Err(CommandError::Unknown(_))));
    }

    #[test]
    fn test_host_only_forms() {
        assert!(!Command::Time(None).is_host_only());
        assert!(Command::Time(Some(30)).is_host_only());
        assert!(!Command::Words(None).is_host_only());
        assert!(Command::Words(Some(WordsEdit::Clear)).is_host_only());
        assert!(Command::Start.is_host_only());
        assert!(!Command::Players.is_host_only());
        assert!(!Command::Next.is_host_only());
    }

    fn roster(names: &[&str]) -> BTreeMap<String, Arc<Presence>> {
        names
            .iter()
            .map(|n| (n.to_string(), Arc::new(Presence::new(*n, Handles::default()))))
            .collect()
    }

    fn game() -> Game {
        Game::spawn("cmds", GameConfig::default(), mpsc::unbounded_channel().0)
    }

    #[tokio::test]
    async fn test_non_host_cannot_change_settings() {
        let game = game();
        let presences = roster(&["alice", "bob"]);
        let bob = Invocation {
            sender: "bob",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        assert!(matches!(
            bob.execute(Command::Time(Some(30))),
            Err(CommandError::Unauthorized)
        ));
        assert!(matches!(
            bob.execute(Command::Words(Some(WordsEdit::Clear))),
            Err(CommandError::Unauthorized)
        ));
        assert_eq!(game.round_duration(), 80);

        // Queries stay open to everyone.
        let replies = bob.execute(Command::Time(None)).unwrap();
        assert_eq!(replies, [Reply::Private("Each turn lasts 80 seconds.".into())]);
    }

    #[tokio::test]
    async fn test_host_settings_out_of_range_are_invalid() {
        let game = game();
        let presences = roster(&["alice"]);
        let alice = Invocation {
            sender: "alice",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        assert!(matches!(
            alice.execute(Command::Time(Some(5))),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(
            alice.execute(Command::Rounds(Some(99))),
            Err(CommandError::InvalidArgument(_))
        ));

        let replies = alice.execute(Command::Rounds(Some(5))).unwrap();
        assert_eq!(replies, [Reply::Room("The game now has 5 rounds.".into())]);
        assert_eq!(game.rounds(), 5);
    }

    #[tokio::test]
    async fn test_words_edits_reply_privately() {
        let game = game();
        let presences = roster(&["alice"]);
        let alice = Invocation {
            sender: "alice",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        alice
            .execute(Command::parse(r#"words set cat dog "ice cream""#).unwrap())
            .unwrap();
        let replies = alice
            .execute(Command::parse("words remove CAT").unwrap())
            .unwrap();
        assert_eq!(
            replies,
            [Reply::Private("The word bank now has 2 words.".into())]
        );
        assert_eq!(game.words(), ["dog", "ice cream"]);
    }

    #[tokio::test]
    async fn test_start_rejection_is_private() {
        let game = game();
        let presences = roster(&["alice"]);
        let alice = Invocation {
            sender: "alice",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        let replies = alice.execute(Command::Start).unwrap();
        assert!(matches!(&replies[..], [Reply::Private(msg)] if msg.starts_with("Add more words")));
        assert!(!game.is_live());
    }

    #[tokio::test]
    async fn test_players_lists_scores_with_host_marker() {
        let game = game();
        let presences = roster(&["alice", "bob"]);
        presences["bob"].award(100);
        let alice = Invocation {
            sender: "alice",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        let replies = alice.execute(Command::Players).unwrap();
        assert_eq!(
            replies,
            [Reply::Private("Players (2):\nbob: 100\nalice (host): 0".into())]
        );
    }

    #[tokio::test]
    async fn test_next_requires_host_or_artist() {
        let game = game();
        let presences = roster(&["alice", "bob"]);
        let bob = Invocation {
            sender: "bob",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        assert!(matches!(
            bob.execute(Command::Next),
            Err(CommandError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_draw_unknown_name_is_invalid() {
        let game = game();
        let presences = roster(&["alice"]);
        let alice = Invocation {
            sender: "alice",
            host: Some("alice"),
            game: &game,
            presences: &presences,
        };
        assert!(matches!(
            alice.execute(Command::Draw(Some("zed".into()))),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(alice.execute(Command::Draw(None)).unwrap().is_empty());
    }
}
