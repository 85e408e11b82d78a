//! Work mode classification.
//!
//! Every inbound message is assigned exactly one [`WorkMode`] by plain
//! keyword matching. Rules are checked in declaration order and the first
//! rule with a matching keyword wins, so a message mentioning both "plan"
//! and "draft" is always a plan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of work a message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    /// Expand ideas and explore angles.
    Brainstorm,
    /// Break work into ordered steps.
    Plan,
    /// Produce text ready for refinement.
    Draft,
    /// List issues and suggest fixes.
    Review,
    /// Compare options and recommend one.
    Decide,
    /// Anything that matched no rule.
    General,
}

impl WorkMode {
    /// All modes, rule-bearing ones first.
    pub const ALL: [WorkMode; 6] = [
        WorkMode::Brainstorm,
        WorkMode::Plan,
        WorkMode::Draft,
        WorkMode::Review,
        WorkMode::Decide,
        WorkMode::General,
    ];

    /// Lowercase identifier, as used in logs and config.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brainstorm => "brainstorm",
            Self::Plan => "plan",
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Decide => "decide",
            Self::General => "general",
        }
    }

    /// Capitalized name shown in reply headers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Brainstorm => "Brainstorm",
            Self::Plan => "Plan",
            Self::Draft => "Draft",
            Self::Review => "Review",
            Self::Decide => "Decide",
            Self::General => "General",
        }
    }

    /// Emoji shown next to the label.
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Brainstorm => "💡",
            Self::Plan => "📋",
            Self::Draft => "✍️",
            Self::Review => "🔍",
            Self::Decide => "⚖️",
            Self::General => "📩",
        }
    }

    /// Reply header, or `None` for [`WorkMode::General`].
    pub fn header(self) -> Option<String> {
        match self {
            Self::General => None,
            mode => Some(format!("{} *Mode: {}*", mode.emoji(), mode.label())),
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown work mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for WorkMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        WorkMode::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or(UnknownMode(lower))
    }
}

/// A mode together with the lowercase substrings that select it.
#[derive(Debug, Clone, Copy)]
pub struct ModeRule {
    pub mode: WorkMode,
    pub keywords: &'static [&'static str],
}

impl ModeRule {
    /// Whether any keyword occurs in already-lowercased text.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw))
    }
}

/// Classification rules in precedence order.
pub const MODE_RULES: &[ModeRule] = &[
    ModeRule {
        mode: WorkMode::Brainstorm,
        keywords: &["brainstorm", "ideas", "explore", "what if", "possibilities"],
    },
    ModeRule {
        mode: WorkMode::Plan,
        keywords: &["plan", "steps", "roadmap", "timeline", "schedule", "how to"],
    },
    ModeRule {
        mode: WorkMode::Draft,
        keywords: &["draft", "write", "compose", "outline", "template"],
    },
    ModeRule {
        mode: WorkMode::Review,
        keywords: &["review", "check", "feedback", "issues", "fix"],
    },
    ModeRule {
        mode: WorkMode::Decide,
        keywords: &["decide", "compare", "choose", "option", "recommend", "pros cons"],
    },
];

/// Classify a message. Never fails; unmatched text is [`WorkMode::General`].
pub fn detect_mode(text: &str) -> WorkMode {
    let lowered = text.to_lowercase();
    MODE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(WorkMode::General, |rule| rule.mode)
}
