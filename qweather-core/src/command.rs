//! Trigger-word command parsing (`天气 北京`).

use crate::model::LocationQuery;

pub const DEFAULT_TRIGGER: &str = "天气";

/// Splits message text into tokens.
///
/// Implementations may emit whitespace tokens; the parser ignores them when
/// counting segments.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Whitespace splitter that also separates a trigger word glued to the
/// following text (`天气北京` → `天气`, `北京`).
#[derive(Debug, Clone)]
pub struct SimpleSegmenter {
    trigger: String,
}

impl SimpleSegmenter {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self { trigger: trigger.into() }
    }
}

impl Default for SimpleSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER)
    }
}

impl Segmenter for SimpleSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        if self.trigger.is_empty() {
            return text.split_whitespace().map(str::to_string).collect();
        }

        let mut tokens = Vec::new();

        for word in text.split_whitespace() {
            let mut rest = word;
            while !rest.is_empty() {
                match rest.find(self.trigger.as_str()) {
                    Some(0) => {
                        tokens.push(self.trigger.clone());
                        rest = &rest[self.trigger.len()..];
                    }
                    Some(idx) => {
                        tokens.push(rest[..idx].to_string());
                        rest = &rest[idx..];
                    }
                    None => {
                        tokens.push(rest.to_string());
                        rest = "";
                    }
                }
            }
        }

        tokens
    }
}

/// What a message asks of the weather plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Not a weather command, or too long to be one.
    NotForUs,
    /// Only the trigger word was sent.
    MissingLocation,
    Lookup(LocationQuery),
}

pub struct CommandParser {
    trigger: String,
    segmenter: Box<dyn Segmenter>,
}

impl std::fmt::Debug for CommandParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandParser").field("trigger", &self.trigger).finish_non_exhaustive()
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER, Box::new(SimpleSegmenter::default()))
    }
}

impl CommandParser {
    /// Longest message, in meaningful segments, treated as a command.
    const MAX_SEGMENTS: usize = 2;

    pub fn new(trigger: impl Into<String>, segmenter: Box<dyn Segmenter>) -> Self {
        Self { trigger: trigger.into(), segmenter }
    }

    /// Parser with the default segmenter for a custom trigger word.
    pub fn with_trigger(trigger: impl Into<String>) -> Self {
        let trigger = trigger.into();
        let segmenter = Box::new(SimpleSegmenter::new(trigger.clone()));
        Self::new(trigger, segmenter)
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn parse(&self, text: &str) -> Command {
        if !text.contains(self.trigger.as_str()) {
            return Command::NotForUs;
        }

        let segments: Vec<String> = self
            .segmenter
            .segment(text)
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();

        if segments.len() > Self::MAX_SEGMENTS {
            return Command::NotForUs;
        }

        let location: String = segments
            .iter()
            .filter(|s| s.trim() != self.trigger)
            .map(|s| s.trim())
            .collect();

        if location.is_empty() {
            Command::MissingLocation
        } else {
            Command::Lookup(LocationQuery::new(location))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(s: &str) -> Command {
        Command::Lookup(LocationQuery::new(s))
    }

    #[test]
    fn trigger_and_city() {
        let parser = CommandParser::default();
        assert_eq!(parser.parse("天气 北京"), lookup("北京"));
        assert_eq!(parser.parse("  天气   上海  "), lookup("上海"));
        assert_eq!(parser.parse("天气北京"), lookup("北京"));
        assert_eq!(parser.parse("北京天气"), lookup("北京"));
    }

    #[test]
    fn trigger_alone_asks_for_location() {
        let parser = CommandParser::default();
        assert_eq!(parser.parse("天气"), Command::MissingLocation);
        assert_eq!(parser.parse(" 天气 "), Command::MissingLocation);
        assert_eq!(parser.parse("天气天气"), Command::MissingLocation);
    }

    #[test]
    fn unrelated_or_long_messages_are_ignored() {
        let parser = CommandParser::default();
        assert_eq!(parser.parse("hello there"), Command::NotForUs);
        assert_eq!(parser.parse("今天 天气 真好 啊"), Command::NotForUs);
        assert_eq!(parser.parse("天气 new york"), Command::NotForUs);
    }

    #[test]
    fn segmenter_splits_glued_trigger() {
        let seg = SimpleSegmenter::default();
        assert_eq!(seg.segment("天气北京"), vec!["天气", "北京"]);
        assert_eq!(seg.segment("北京天气 好"), vec!["北京", "天气", "好"]);
        assert!(seg.segment("   ").is_empty());
    }

    /// Stand-in for a dictionary-based segmenter that emits whitespace tokens.
    struct SpacedSegmenter;

    impl Segmenter for SpacedSegmenter {
        fn segment(&self, text: &str) -> Vec<String> {
            text.split_inclusive(' ')
                .flat_map(|w| {
                    let trimmed = w.trim_end();
                    let mut out = vec![trimmed.to_string()];
                    if trimmed.len() != w.len() {
                        out.push(" ".to_string());
                    }
                    out
                })
                .collect()
        }
    }

    #[test]
    fn whitespace_tokens_are_not_meaningful() {
        let parser = CommandParser::new(DEFAULT_TRIGGER, Box::new(SpacedSegmenter));
        assert_eq!(parser.parse("天气 广州"), lookup("广州"));
    }

    #[test]
    fn custom_trigger_word() {
        let parser = CommandParser::with_trigger("weather");
        assert_eq!(parser.parse("weather Paris"), lookup("Paris"));
        assert_eq!(parser.parse("weatherParis"), lookup("Paris"));
        assert_eq!(parser.parse("天气 北京"), Command::NotForUs);
        assert_eq!(parser.trigger(), "weather");
    }
}
