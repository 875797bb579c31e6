//! Chat Command - 聊天命令解析
//!
//! 前缀匹配，区分大小写；除截取子串外不做参数校验

/// 支持的聊天命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `<p>play <query>`
    Play(String),
    /// `<p>stop`
    Stop,
    /// `<p>help`
    Help,
    /// `<p>test`
    Test,
}

impl ChatCommand {
    /// 解析消息内容，不是命令时返回 None
    pub fn parse(content: &str, prefix: &str) -> Option<Self> {
        let body = content.strip_prefix(prefix)?;

        if let Some(query) = body.strip_prefix("play ") {
            return Some(ChatCommand::Play(query.to_string()));
        }

        match body {
            "stop" => Some(ChatCommand::Stop),
            "help" => Some(ChatCommand::Help),
            "test" => Some(ChatCommand::Test),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatCommand::Play(_) => "play",
            ChatCommand::Stop => "stop",
            ChatCommand::Help => "help",
            ChatCommand::Test => "test",
        }
    }
}

/// 命令用法与说明，顺序即帮助文本中的顺序
const COMMAND_DOCS: &[(&str, &str)] = &[
    (
        "play <song>",
        "Plays a song from Spotify by searching for it on YouTube",
    ),
    (
        "stop",
        "Stops the current playback and disconnects the bot from the voice channel",
    ),
    ("help", "Lists all available commands"),
    (
        "test",
        "Plays a local test file to check that voice playback works",
    ),
];

/// 帮助文本，与机器人状态无关
pub fn help_text(prefix: &str) -> String {
    let mut text = String::from("Available commands:\n");
    for (usage, description) in COMMAND_DOCS {
        text.push_str(&format!("`{}{}`: {}\n", prefix, usage, description));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_takes_remainder() {
        assert_eq!(
            ChatCommand::parse("!play Bohemian Rhapsody", "!"),
            Some(ChatCommand::Play("Bohemian Rhapsody".to_string()))
        );
        assert_eq!(
            ChatCommand::parse("!play  spaced", "!"),
            Some(ChatCommand::Play(" spaced".to_string()))
        );
    }

    #[test]
    fn test_parse_exact_commands() {
        assert_eq!(ChatCommand::parse("!stop", "!"), Some(ChatCommand::Stop));
        assert_eq!(ChatCommand::parse("!help", "!"), Some(ChatCommand::Help));
        assert_eq!(ChatCommand::parse("!test", "!"), Some(ChatCommand::Test));
    }

    #[test]
    fn test_parse_is_case_sensitive_and_exact() {
        assert_eq!(ChatCommand::parse("!Stop", "!"), None);
        assert_eq!(ChatCommand::parse("!stop now", "!"), None);
        assert_eq!(ChatCommand::parse("!play", "!"), None);
        assert_eq!(ChatCommand::parse("play Imagine", "!"), None);
        assert_eq!(ChatCommand::parse("hello !play Imagine", "!"), None);
    }

    #[test]
    fn test_parse_custom_prefix() {
        assert_eq!(
            ChatCommand::parse("$$play Imagine", "$$"),
            Some(ChatCommand::Play("Imagine".to_string()))
        );
        assert_eq!(ChatCommand::parse("!play Imagine", "$$"), None);
    }

    #[test]
    fn test_help_lists_exactly_four_commands() {
        let text = help_text("!");
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("`!play <song>`: "));
        assert!(lines[1].starts_with("`!stop`: "));
        assert!(lines[2].starts_with("`!help`: "));
        assert!(lines[3].starts_with("`!test`: "));
    }
}
