//! Command tokenizer.
//!
//! A token is either a double-quoted span or a maximal run of non-whitespace.
//! The first token names the command; the rest become arguments with their
//! quotes stripped. The remainder keeps the original spacing of everything
//! after the command token.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]+"|\S+"#).expect("token pattern is valid"));

const REMAINDER_TRIM: &[char] = &['"', ' ', '\n'];

/// A tokenized command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// First token, exactly as written.
    pub command: String,
    /// Text from the second token on, trimmed of quotes, spaces and newlines.
    pub remainder: String,
    /// Tokens after the command, quotes stripped. Empty when there are none.
    pub arguments: Vec<String>,
}

impl ParsedCommand {
    /// Lowercase command key used for lookups.
    pub fn key(&self) -> String {
        self.command.to_lowercase()
    }
}

/// Tokenizes `input`, which is the message text with the prefix removed.
pub fn parse(input: &str) -> ParsedCommand {
    let mut tokens = TOKEN.find_iter(input);

    let Some(first) = tokens.next() else {
        return ParsedCommand {
            command: input.trim().to_string(),
            ..Default::default()
        };
    };

    let mut parsed = ParsedCommand {
        command: first.as_str().to_string(),
        ..Default::default()
    };

    for (index, token) in tokens.enumerate() {
        if index == 0 {
            parsed.remainder = input[token.start()..].trim_matches(REMAINDER_TRIM).to_string();
        }
        parsed.arguments.push(token.as_str().trim_matches('"').to_string());
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_argument_is_one_token() {
        let parsed = parse(r#"say "hello world" extra"#);
        assert_eq!(parsed.command, "say");
        assert_eq!(parsed.arguments, vec!["hello world", "extra"]);
        assert_eq!(parsed.remainder, r#"hello world" extra"#);
    }

    #[test]
    fn test_remainder_keeps_inner_whitespace() {
        let parsed = parse("say  one   two\n");
        assert_eq!(parsed.remainder, "one   two");
        assert_eq!(parsed.arguments, vec!["one", "two"]);
    }

    #[test]
    fn test_command_only() {
        let parsed = parse("Help");
        assert_eq!(parsed.command, "Help");
        assert_eq!(parsed.key(), "help");
        assert!(parsed.remainder.is_empty());
        assert!(parsed.arguments.is_empty());
    }

    #[test]
    fn test_blank_input_yields_trimmed_command() {
        let parsed = parse("   \n ");
        assert_eq!(parsed.command, "");
        assert!(parsed.arguments.is_empty());
        assert!(parsed.remainder.is_empty());
    }

    #[test]
    fn test_quoted_command_token_is_kept_verbatim() {
        let parsed = parse(r#""odd name" arg"#);
        assert_eq!(parsed.command, r#""odd name""#);
        assert_eq!(parsed.arguments, vec!["arg"]);
    }

    #[test]
    fn test_unbalanced_quote_falls_back_to_whitespace_runs() {
        let parsed = parse(r#"echo "open ended"#);
        assert_eq!(parsed.arguments, vec!["open", "ended"]);
    }

    #[test]
    fn test_reparsing_reconstructed_arguments_is_stable() {
        let inputs = [
            r#"say "hello world" extra"#,
            "ban 123 456 spamming",
            r#"alias create "long name" say"#,
            "cmdChannelBlock say add 42",
        ];
        for input in inputs {
            let first = parse(input);
            let rebuilt = std::iter::once(first.command.clone())
                .chain(first.arguments.iter().map(|arg| {
                    if arg.chars().any(char::is_whitespace) {
                        format!("\"{arg}\"")
                    } else {
                        arg.clone()
                    }
                }))
                .collect::<Vec<_>>()
                .join(" ");
            assert_eq!(parse(&rebuilt).arguments, first.arguments, "input: {input}");
        }
    }
}
