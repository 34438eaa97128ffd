/// Leading command token and the trimmed remainder of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub command: &'a str,
    /// Bot named by a `/command@botname` token.
    pub mention: Option<&'a str>,
    pub rest: &'a str,
}

/// Splits `text` at the first whitespace or `:`. A `@botname` suffix on a
/// slash command is split off into `mention`.
pub fn parse_command(text: &str) -> ParsedCommand<'_> {
    let text = text.trim();
    let (token, rest) = match text.find(|c: char| c.is_whitespace() || c == ':') {
        Some(idx) => {
            let sep_len = text[idx..].chars().next().map_or(1, char::len_utf8);
            (&text[..idx], &text[idx + sep_len..])
        }
        None => (text, ""),
    };

    let (command, mention) = match token.split_once('@') {
        Some((command, bot)) if command.starts_with('/') => (command, Some(bot)),
        _ => (token, None),
    };

    ParsedCommand {
        command,
        mention,
        rest: rest.trim(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Task(String),
    Continue(String),
    Resume(String),
    History(String),
    Status,
    Cancel,
    AllowedTools(String),
    Help,
}

impl Command {
    /// Returns `None` for anything that is not a known command, or for a
    /// command addressed to a bot other than `bot_username`. The task prefix
    /// is checked first so it may shadow a fixed command.
    pub fn parse(text: &str, task_prefix: &str, bot_username: Option<&str>) -> Option<Command> {
        let ParsedCommand {
            command,
            mention,
            rest,
        } = parse_command(text);

        if let (Some(mention), Some(own)) = (mention, bot_username) {
            if !mention.eq_ignore_ascii_case(own.trim_start_matches('@')) {
                return None;
            }
        }
        let rest = rest.to_string();

        if command == task_prefix {
            return Some(Command::Task(rest));
        }

        match command {
            "/continue" => Some(Command::Continue(rest)),
            "/resume" => Some(Command::Resume(rest)),
            "/history" => Some(Command::History(rest)),
            "/status" => Some(Command::Status),
            "/cancel" => Some(Command::Cancel),
            "/allowed_tools" => Some(Command::AllowedTools(rest)),
            "/help" | "/start" => Some(Command::Help),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_space_and_colon() {
        assert_eq!(
            parse_command("/task fix the login bug"),
            ParsedCommand { command: "/task", mention: None, rest: "fix the login bug" }
        );
        assert_eq!(
            parse_command("/task:  fix it  "),
            ParsedCommand { command: "/task", mention: None, rest: "fix it" }
        );
        assert_eq!(
            parse_command("/status"),
            ParsedCommand { command: "/status", mention: None, rest: "" }
        );
    }

    #[test]
    fn test_parse_command_keeps_inner_formatting() {
        let parsed = parse_command("/continue line one\nline two");
        assert_eq!(parsed.command, "/continue");
        assert_eq!(parsed.rest, "line one\nline two");

        let parsed = parse_command("/task\nmultiline prompt");
        assert_eq!(parsed.command, "/task");
        assert_eq!(parsed.rest, "multiline prompt");
    }

    #[test]
    fn test_parse_command_strips_bot_mention() {
        assert_eq!(parse_command("/status@reachout_bot").command, "/status");
        assert_eq!(parse_command("/status@reachout_bot").mention, Some("reachout_bot"));
        assert_eq!(parse_command("/task@reachout_bot do it").rest, "do it");
        assert_eq!(parse_command("hello@example.com").command, "hello@example.com");
    }

    #[test]
    fn test_command_parse_known_commands() {
        assert_eq!(
            Command::parse("/task fix bug", "/task", None),
            Some(Command::Task("fix bug".to_string()))
        );
        assert_eq!(
            Command::parse("/continue and add tests", "/task", None),
            Some(Command::Continue("and add tests".to_string()))
        );
        assert_eq!(
            Command::parse("/resume abc-123 pick it up", "/task", None),
            Some(Command::Resume("abc-123 pick it up".to_string()))
        );
        assert_eq!(
            Command::parse("/history 10", "/task", None),
            Some(Command::History("10".to_string()))
        );
        assert_eq!(Command::parse("/status", "/task", None), Some(Command::Status));
        assert_eq!(Command::parse("/cancel now", "/task", None), Some(Command::Cancel));
        assert_eq!(
            Command::parse("/allowed_tools", "/task", None),
            Some(Command::AllowedTools(String::new()))
        );
        assert_eq!(Command::parse("/help", "/task", None), Some(Command::Help));
    }

    #[test]
    fn test_command_parse_custom_prefix() {
        assert_eq!(
            Command::parse("/do refactor", "/do", None),
            Some(Command::Task("refactor".to_string()))
        );
        assert_eq!(Command::parse("/task refactor", "/do", None), None);
    }

    #[test]
    fn test_command_parse_checks_addressed_bot() {
        let own = Some("reachout_bot");
        assert_eq!(Command::parse("/cancel@reachout_bot", "/task", own), Some(Command::Cancel));
        assert_eq!(Command::parse("/cancel@Reachout_Bot", "/task", own), Some(Command::Cancel));
        assert_eq!(Command::parse("/cancel@some_other_bot", "/task", own), None);
        assert_eq!(Command::parse("/task@some_other_bot fix", "/task", own), None);
        assert_eq!(Command::parse("/cancel", "/task", own), Some(Command::Cancel));
        assert_eq!(
            Command::parse("/cancel@some_other_bot", "/task", None),
            Some(Command::Cancel)
        );
    }

    #[test]
    fn test_command_parse_ignores_unknown() {
        assert_eq!(Command::parse("/unknown thing", "/task", None), None);
        assert_eq!(Command::parse("just chatting", "/task", None), None);
        assert_eq!(Command::parse("", "/task", None), None);
        assert_eq!(Command::parse("/tasks fix", "/task", None), None);
    }
}
