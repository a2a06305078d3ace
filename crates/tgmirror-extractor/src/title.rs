//! Post title heuristic
//!
//! The preferred title is a bold run (`*...*`) at the very start of the
//! MarkdownV2 text, allowing at most one leading character. Without one, the
//! title degrades to the first words of the plain text's first line.

use regex::Regex;

/// Number of plain-text words kept for a fallback title
const FALLBACK_WORDS: usize = 10;

/// Leading bold run; `.` never crosses a newline and the run is non-greedy
const BOLD_TITLE_PATTERN: &str = r"^[^\n]?\*(?P<title>.+?)\*";

/// A resolved post title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub text: String,
    /// Set when the plain-text fallback was used
    pub is_fallback: bool,
}

/// Compiled title matcher
#[derive(Debug, Clone)]
pub struct TitleParser {
    pattern: Regex,
}

impl TitleParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(BOLD_TITLE_PATTERN)?,
        })
    }

    /// Bold run at the start of the markdown, without its `*` markers
    pub fn bold_title(&self, markdown: &str) -> Option<String> {
        self.pattern
            .captures(markdown)
            .and_then(|caps| caps.name("title"))
            .map(|m| m.as_str().to_string())
    }

    /// Resolve the title of a message.
    ///
    /// `plain` must be the unescaped text: word counting on the markdown
    /// variant would be skewed by escapes such as `\.`.
    pub fn parse(&self, markdown: &str, plain: &str) -> Title {
        let bold = self.bold_title(markdown);

        let fallback = match bold {
            Some(_) => String::new(),
            None => fallback_title(plain),
        };

        if !fallback.is_empty() {
            return Title {
                text: fallback,
                is_fallback: true,
            };
        }

        Title {
            text: bold.unwrap_or_default(),
            is_fallback: false,
        }
    }
}

/// First words of the first line of `plain`, joined by single spaces
pub fn fallback_title(plain: &str) -> String {
    plain
        .lines()
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .take(FALLBACK_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}
