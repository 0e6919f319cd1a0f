//! Weak Pattern Dictionary
//!
//! Known weak substrings (sequential digit runs, keyboard walks, common
//! words) compiled into a single case-insensitive alternation, plus the
//! repeated-character rule.
//!
//! The built-in dictionary is compiled once per process and shared
//! read-only between request handlers.

use regex::Regex;
use std::sync::LazyLock;

/// Reference substrings, lowercase.
pub const COMMON_PATTERNS: &[&str] = &[
    // Digit sequences
    "123456",
    "234567",
    "345678",
    "456789",
    "654321",
    "54321",
    "4321",
    "321",
    "111111",
    "222222",
    "000000",
    // Keyboard walks
    "qwerty",
    "azerty",
    "qwert",
    "asdfg",
    "zxcvb",
    "mnbvc",
    // Common words
    "password",
    "admin",
    "iloveyou",
    "p@ssword",
    "user",
    "princess",
    "rockyou",
];

/// Minimum run of identical consecutive characters that counts as a pattern
pub const MIN_REPEAT_RUN: usize = 3;

static BUILTIN_DICTIONARY: LazyLock<PatternDictionary> = LazyLock::new(|| {
    // Literal, escaped alternation of constant substrings
    PatternDictionary::with_patterns(COMMON_PATTERNS).unwrap()
});

/// Precompiled weak-pattern matcher
#[derive(Debug, Clone)]
pub struct PatternDictionary {
    /// `None` for an empty dictionary
    substrings: Option<Regex>,
    pattern_count: usize,
}

impl PatternDictionary {
    /// Built-in dictionary
    pub fn new() -> Self {
        BUILTIN_DICTIONARY.clone()
    }

    /// Compile a dictionary from custom substrings.
    ///
    /// Substrings are matched literally and case-insensitively.
    pub fn with_patterns(patterns: &[&str]) -> Result<Self, regex::Error> {
        let substrings = if patterns.is_empty() {
            None
        } else {
            let alternation = patterns
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i){}", alternation))?)
        };

        Ok(Self {
            substrings,
            pattern_count: patterns.len(),
        })
    }

    /// Check the substring list
    pub fn contains_listed(&self, password: &str) -> bool {
        self.substrings
            .as_ref()
            .is_some_and(|re| re.is_match(password))
    }

    /// Check for a run of [`MIN_REPEAT_RUN`] identical characters.
    ///
    /// Comparison is exact (case-sensitive). Line feeds never form a run.
    pub fn has_repetition(&self, password: &str) -> bool {
        let mut previous: Option<char> = None;
        let mut run = 0usize;

        for c in password.chars() {
            if c == '\n' {
                previous = None;
                run = 0;
                continue;
            }

            if previous == Some(c) {
                run += 1;
            } else {
                previous = Some(c);
                run = 1;
            }

            if run >= MIN_REPEAT_RUN {
                return true;
            }
        }

        false
    }

    /// Either rule
    pub fn is_common(&self, password: &str) -> bool {
        self.contains_listed(password) || self.has_repetition(password)
    }

    /// Number of listed substrings in the alternation
    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}

impl Default for PatternDictionary {
    fn default() -> Self {
        Self::new()
    }
}
