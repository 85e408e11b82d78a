//! System instructions sent ahead of the user's text.
//!
//! Every prompt is a shared identity preamble followed by a mode-specific
//! suffix. The concatenation happens at compile time, so each entry is a
//! complete, self-contained `&'static str`.

use crate::mode::WorkMode;

macro_rules! identity {
    () => {
        "You are Antigravity, a Telegram-based mobile work assistant. \
         You help your user think, plan, decide, write, and build incrementally. \
         The user is a developer who often works away from their computer, \
         using Telegram as a low-friction workspace for REAL work.\n\n\
         RULES:\n\
         - Be concise. Prefer bullet points and numbered steps.\n\
         - No chit-chat. You are a focused work tool.\n\
         - If something is complex, split into parts.\n\
         - Optimize for momentum, not perfection.\n\
         - Tone: professional, calm, direct.\n"
    };
}

/// Shared persona preamble.
pub const IDENTITY: &str = identity!();

const BRAINSTORM: &str = concat!(
    identity!(),
    "MODE: Brainstorming.\nExpand ideas, suggest variations, explore angles."
);
const PLAN: &str = concat!(
    identity!(),
    "MODE: Planning.\nBreak into numbered steps. Flag dependencies."
);
const DRAFT: &str = concat!(
    identity!(),
    "MODE: Drafting.\nProduce clean text ready for refinement."
);
const REVIEW: &str = concat!(
    identity!(),
    "MODE: Reviewing.\nList issues, suggest fixes. Be constructive."
);
const DECIDE: &str = concat!(
    identity!(),
    "MODE: Decision support.\nCompare options with pros/cons. Recommend."
);
const GENERAL: &str = concat!(
    identity!(),
    "MODE: General assistant.\nAnswer helpfully and concisely."
);

/// System instruction for a mode.
pub fn system_prompt_for(mode: WorkMode) -> &'static str {
    match mode {
        WorkMode::Brainstorm => BRAINSTORM,
        WorkMode::Plan => PLAN,
        WorkMode::Draft => DRAFT,
        WorkMode::Review => REVIEW,
        WorkMode::Decide => DECIDE,
        WorkMode::General => GENERAL,
    }
}

/// System instruction looked up by mode name.
///
/// Unknown names get the general instruction.
pub fn system_prompt_for_name(name: &str) -> &'static str {
    name.parse::<WorkMode>().map_or(GENERAL, system_prompt_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_has_a_complete_prompt() {
        for mode in WorkMode::ALL {
            let prompt = system_prompt_for(mode);
            assert!(prompt.starts_with(IDENTITY), "{mode} lacks identity");
            assert!(prompt.len() > IDENTITY.len(), "{mode} lacks a suffix");
            assert!(prompt.contains("MODE:"));
        }
    }

    #[test]
    fn test_prompts_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for mode in WorkMode::ALL {
            assert!(seen.insert(system_prompt_for(mode)));
        }
    }

    #[test]
    fn test_mode_framing() {
        assert!(system_prompt_for(WorkMode::Plan).contains("numbered steps"));
        assert!(system_prompt_for(WorkMode::Decide).contains("pros/cons"));
    }

    #[test]
    fn test_unknown_name_falls_back_to_general() {
        assert_eq!(
            system_prompt_for_name("haiku"),
            system_prompt_for(WorkMode::General)
        );
        assert_eq!(system_prompt_for_name(""), system_prompt_for(WorkMode::General));
        assert_eq!(
            system_prompt_for_name("review"),
            system_prompt_for(WorkMode::Review)
        );
    }
}
