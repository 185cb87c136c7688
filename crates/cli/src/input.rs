/// One line typed at the quiz prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Answer(String),
    Hint(usize),
    Round(i64),
    History,
    Suggest(String),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Answer(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "hint" | "h" => match arg.parse::<usize>() {
                Ok(n) => Command::Hint(n),
                Err(_) => Command::Invalid(format!("usage: :hint <number> (got {arg:?})")),
            },
            "round" | "r" => match arg.parse::<i64>() {
                Ok(n) => Command::Round(n),
                Err(_) => Command::Invalid(format!("usage: :round <number> (got {arg:?})")),
            },
            "history" => Command::History,
            "suggest" | "s" => Command::Suggest(arg.to_string()),
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command :{other}")),
        }
    }
}

pub const HELP: &str = "\
Type a company name to answer.
  :hint N      reveal hint N (in order)
  :round N     open past round N
  :history     list past rounds
  :suggest T   list company names containing T
  :quit        leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_an_answer() {
        assert_eq!(
            Command::parse("  Samsung Electronics \n"),
            Command::Answer("Samsung Electronics".to_string())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(Command::parse(":hint 2"), Command::Hint(2));
        assert_eq!(Command::parse(":R 12"), Command::Round(12));
        assert_eq!(Command::parse(":suggest sam"), Command::Suggest("sam".to_string()));
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(Command::parse(":history"), Command::History);
    }

    #[test]
    fn reports_bad_arguments() {
        assert!(matches!(Command::parse(":hint two"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":round"), Command::Invalid(_)));
        assert!(matches!(Command::parse(":dance"), Command::Invalid(_)));
    }
}
