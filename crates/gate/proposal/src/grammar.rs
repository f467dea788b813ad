//! The closed phrase grammar.
//!
//! Each rule is a fixed sequence of tokens matched word-for-word against the
//! whitespace-split input. Literal words compare with ASCII case folding;
//! nothing else about the input is normalized.

use crate::model::Proposal;
use routegate_contract::{Intent, Mode, Target};

#[derive(Debug, Clone, Copy)]
pub enum Token {
    Word(&'static str),
    /// One of the target names.
    Target,
    /// `gracefully` or `immediately`, supplying the mode.
    Adverb,
}

#[derive(Debug)]
pub struct Rule {
    pub intent: Intent,
    pub tokens: &'static [Token],
    /// Mode fixed by the phrase itself.
    pub mode: Option<Mode>,
}

use Token::{Adverb, Target as T, Word as W};

pub const RULES: &[Rule] = &[
    Rule {
        intent: Intent::RestartSubsystem,
        tokens: &[W("restart"), T, W("subsystem"), Adverb],
        mode: None,
    },
    Rule {
        intent: Intent::RestartSubsystem,
        tokens: &[W("graceful"), W("restart"), W("of"), T],
        mode: Some(Mode::Graceful),
    },
    Rule {
        intent: Intent::RestartSubsystem,
        tokens: &[W("immediate"), W("restart"), W("of"), T],
        mode: Some(Mode::Immediate),
    },
    Rule {
        intent: Intent::StopSubsystem,
        tokens: &[W("stop"), T, W("subsystem"), Adverb],
        mode: None,
    },
    Rule {
        intent: Intent::StopSubsystem,
        tokens: &[W("graceful"), W("stop"), W("of"), T],
        mode: Some(Mode::Graceful),
    },
    Rule {
        intent: Intent::StopSubsystem,
        tokens: &[W("immediate"), W("stop"), W("of"), T],
        mode: Some(Mode::Immediate),
    },
    Rule {
        intent: Intent::StatusQuery,
        tokens: &[W("status"), W("of"), T],
        mode: None,
    },
    Rule {
        intent: Intent::StatusQuery,
        tokens: &[W("query"), W("status"), W("of"), T],
        mode: None,
    },
    Rule {
        intent: Intent::StatusQuery,
        tokens: &[T, W("status")],
        mode: None,
    },
];

fn adverb_mode(word: &str) -> Option<Mode> {
    if word.eq_ignore_ascii_case("gracefully") {
        Some(Mode::Graceful)
    } else if word.eq_ignore_ascii_case("immediately") {
        Some(Mode::Immediate)
    } else {
        None
    }
}

impl Rule {
    /// Match the whole word sequence, returning the proposal it describes.
    pub fn matches(&self, words: &[&str]) -> Option<Proposal> {
        if words.len() != self.tokens.len() {
            return None;
        }
        let mut target: Option<Target> = None;
        let mut mode = self.mode;
        for (token, word) in self.tokens.iter().zip(words) {
            match token {
                Token::Word(expected) => {
                    if !expected.eq_ignore_ascii_case(word) {
                        return None;
                    }
                }
                Token::Target => target = Some(Target::from_word(word)?),
                Token::Adverb => mode = Some(adverb_mode(word)?),
            }
        }
        Some(Proposal::route(self.intent, target?, mode))
    }
}
