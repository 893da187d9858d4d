use regex::Regex;
use std::sync::LazyLock;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)@(\S+)").expect("mention pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// Blank line.
    Empty,
    /// A lone `/`, asking for the command palette.
    Palette,
    Command { name: String, args: String },
    /// Free text for the agent with its `@path` mentions.
    Message { text: String, mentions: Vec<String> },
}

pub fn parse_input(raw: &str) -> ParsedInput {
    let input = raw.trim();
    if input.is_empty() {
        return ParsedInput::Empty;
    }
    if input == "/" {
        return ParsedInput::Palette;
    }

    if let Some(rest) = input.strip_prefix('/')
        && rest.chars().next().is_some_and(|c| !c.is_whitespace())
    {
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        return ParsedInput::Command {
            name: name.to_string(),
            args: args.to_string(),
        };
    }

    let mentions = MENTION
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .collect();
    ParsedInput::Message {
        text: input.to_string(),
        mentions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(name: &str, args: &str) -> ParsedInput {
        ParsedInput::Command {
            name: name.to_string(),
            args: args.to_string(),
        }
    }

    #[test]
    fn test_blank_and_palette() {
        assert_eq!(parse_input("   "), ParsedInput::Empty);
        assert_eq!(parse_input(" / "), ParsedInput::Palette);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_input("/help"), command("help", ""));
        assert_eq!(parse_input("  /help   spawn  "), command("help", "spawn"));
        assert_eq!(
            parse_input("/spawn review  the diff"),
            command("spawn", "review  the diff")
        );
    }

    #[test]
    fn test_slash_followed_by_space_is_text() {
        assert_eq!(
            parse_input("/ not a command"),
            ParsedInput::Message {
                text: "/ not a command".to_string(),
                mentions: vec![],
            }
        );
    }

    #[test]
    fn test_mentions_are_extracted_in_order() {
        let parsed = parse_input("compare @src/lib.rs with @Cargo.toml please");
        assert_eq!(
            parsed,
            ParsedInput::Message {
                text: "compare @src/lib.rs with @Cargo.toml please".to_string(),
                mentions: vec!["src/lib.rs".to_string(), "Cargo.toml".to_string()],
            }
        );
    }

    #[test]
    fn test_email_addresses_are_not_mentions() {
        let ParsedInput::Message { mentions, .. } = parse_input("mail ops@example.com") else {
            panic!("expected a message");
        };
        assert!(mentions.is_empty());
    }
}
