//! Feature Extraction
//!
//! Turns a raw password into the fixed-order numeric vector the trained
//! classifier consumes.
//!
//! # Entropy
//!
//! `shannon_entropy` is an alphabet-size estimate: every present character
//! class contributes a fixed alphabet size (lower 26, upper 26, digit 10,
//! symbol 32) and the entropy is `length * log2(alphabet_size)`. It does not
//! look at the observed character frequencies, so two passwords with the same
//! class composition and length always score the same. The trained model was
//! fit on exactly this estimate.

use crate::patterns::PatternDictionary;

/// Number of features in a [`FeatureVector`]
pub const FEATURE_COUNT: usize = 8;

/// Feature names in classifier input order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "length",
    "count_lower",
    "count_upper",
    "count_digit",
    "count_symbol",
    "char_classes",
    "shannon_entropy",
    "is_common_pattern",
];

/// Per-class alphabet contributions
pub const LOWER_ALPHABET: u32 = 26;
pub const UPPER_ALPHABET: u32 = 26;
pub const DIGIT_ALPHABET: u32 = 10;
pub const SYMBOL_ALPHABET: u32 = 32;

/// Character class of a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    /// Anything that is not an ASCII letter or digit
    Symbol,
}

impl CharClass {
    /// Classify one character
    pub fn of(c: char) -> Self {
        if c.is_ascii_lowercase() {
            CharClass::Lower
        } else if c.is_ascii_uppercase() {
            CharClass::Upper
        } else if c.is_ascii_digit() {
            CharClass::Digit
        } else {
            CharClass::Symbol
        }
    }

    /// Worst-case alphabet size attributed to this class
    pub fn alphabet_size(&self) -> u32 {
        match self {
            CharClass::Lower => LOWER_ALPHABET,
            CharClass::Upper => UPPER_ALPHABET,
            CharClass::Digit => DIGIT_ALPHABET,
            CharClass::Symbol => SYMBOL_ALPHABET,
        }
    }
}

/// Classifier input vector.
///
/// Field order matches [`FEATURE_NAMES`]; [`FeatureVector::to_array`] is the
/// only conversion into model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    /// Number of characters (Unicode scalar values)
    pub length: usize,
    pub count_lower: usize,
    pub count_upper: usize,
    pub count_digit: usize,
    pub count_symbol: usize,
    /// Number of non-zero class counts (0-4)
    pub char_classes: usize,
    /// Alphabet-size entropy estimate in bits
    pub shannon_entropy: f64,
    /// 1 if a weak pattern was found, else 0
    pub is_common_pattern: u8,
}

impl FeatureVector {
    /// Estimated alphabet size from the classes present
    pub fn alphabet_size(&self) -> u32 {
        [
            (self.count_lower, CharClass::Lower),
            (self.count_upper, CharClass::Upper),
            (self.count_digit, CharClass::Digit),
            (self.count_symbol, CharClass::Symbol),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(_, class)| class.alphabet_size())
        .sum()
    }

    /// Model input in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.length as f64,
            self.count_lower as f64,
            self.count_upper as f64,
            self.count_digit as f64,
            self.count_symbol as f64,
            self.char_classes as f64,
            self.shannon_entropy,
            f64::from(self.is_common_pattern),
        ]
    }

    /// Entropy rounded for display
    pub fn entropy_display(&self) -> String {
        format!("{:.2}", self.shannon_entropy)
    }
}

/// Alphabet-size entropy: `length * log2(alphabet_size)`, or 0 for an
/// alphabet of 0 or 1 symbols
pub fn alphabet_entropy(length: usize, alphabet_size: u32) -> f64 {
    if alphabet_size > 1 {
        length as f64 * f64::from(alphabet_size).log2()
    } else {
        0.0
    }
}

/// Password feature extractor
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    dictionary: PatternDictionary,
}

impl FeatureExtractor {
    /// Create an extractor with the built-in pattern dictionary
    pub fn new() -> Self {
        Self::with_dictionary(PatternDictionary::new())
    }

    /// Create an extractor with a custom dictionary
    pub fn with_dictionary(dictionary: PatternDictionary) -> Self {
        Self { dictionary }
    }

    /// Pattern dictionary in use
    pub fn dictionary(&self) -> &PatternDictionary {
        &self.dictionary
    }

    /// Extract the feature vector. Total over all inputs.
    pub fn extract(&self, password: &str) -> FeatureVector {
        let mut length = 0;
        let mut counts = [0usize; 4];

        for c in password.chars() {
            length += 1;
            let slot = match CharClass::of(c) {
                CharClass::Lower => 0,
                CharClass::Upper => 1,
                CharClass::Digit => 2,
                CharClass::Symbol => 3,
            };
            counts[slot] += 1;
        }

        let [count_lower, count_upper, count_digit, count_symbol] = counts;
        let char_classes = counts.iter().filter(|&&n| n > 0).count();

        let mut vector = FeatureVector {
            length,
            count_lower,
            count_upper,
            count_digit,
            count_symbol,
            char_classes,
            shannon_entropy: 0.0,
            is_common_pattern: u8::from(self.dictionary.is_common(password)),
        };
        vector.shannon_entropy = alphabet_entropy(length, vector.alphabet_size());

        vector
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new()
    }

    fn assert_counts_partition(v: &FeatureVector) {
        assert_eq!(
            v.count_lower + v.count_upper + v.count_digit + v.count_symbol,
            v.length
        );
        let positive = [v.count_lower, v.count_upper, v.count_digit, v.count_symbol]
            .iter()
            .filter(|&&n| n > 0)
            .count();
        assert_eq!(v.char_classes, positive);
        assert!(v.char_classes <= 4);
        assert!(v.shannon_entropy >= 0.0);
        assert!(v.is_common_pattern <= 1);
    }

    #[test]
    fn test_empty_password() {
        let v = extractor().extract("");
        assert_eq!(
            v,
            FeatureVector {
                length: 0,
                count_lower: 0,
                count_upper: 0,
                count_digit: 0,
                count_symbol: 0,
                char_classes: 0,
                shannon_entropy: 0.0,
                is_common_pattern: 0,
            }
        );
        assert_eq!(v.alphabet_size(), 0);
    }

    #[test]
    fn test_all_four_classes() {
        let v = extractor().extract("Ab1!");
        assert_eq!(v.count_lower, 1);
        assert_eq!(v.count_upper, 1);
        assert_eq!(v.count_digit, 1);
        assert_eq!(v.count_symbol, 1);
        assert_eq!(v.char_classes, 4);
        assert_eq!(v.alphabet_size(), 94);
        assert_eq!(v.shannon_entropy, 4.0 * 94f64.log2());
        assert_eq!(v.entropy_display(), "26.22");
        assert_eq!(v.is_common_pattern, 0);
    }

    #[test]
    fn test_repetition_flags_pattern() {
        let v = extractor().extract("aaab");
        assert_eq!(v.is_common_pattern, 1);
        assert_eq!(v.char_classes, 1);
    }

    #[test]
    fn test_dictionary_flags_pattern() {
        let e = extractor();
        assert_eq!(e.extract("password").is_common_pattern, 1);
        assert_eq!(e.extract("MyPASSWORD").is_common_pattern, 1);
        assert_eq!(e.extract("Zebra!Lamp").is_common_pattern, 0);
    }

    #[test]
    fn test_entropy_ignores_character_diversity() {
        let e = extractor();
        let repeated = e.extract("abababab");
        let diverse = e.extract("hqzkwmfe");
        assert_eq!(repeated.shannon_entropy, diverse.shannon_entropy);
        assert_eq!(repeated.shannon_entropy, 8.0 * 26f64.log2());
    }

    #[test]
    fn test_single_digit_class() {
        let v = extractor().extract("90");
        assert_eq!(v.alphabet_size(), 10);
        assert_eq!(v.shannon_entropy, 2.0 * 10f64.log2());
    }

    #[test]
    fn test_non_ascii_counts_as_symbol() {
        let v = extractor().extract("café Ω");
        assert_eq!(v.length, 6);
        assert_eq!(v.count_lower, 3);
        assert_eq!(v.count_symbol, 3);
        assert_eq!(v.char_classes, 2);
        assert_eq!(v.alphabet_size(), 58);
        assert_counts_partition(&v);
    }

    #[test]
    fn test_whitespace_only() {
        let v = extractor().extract("   ");
        assert_eq!(v.count_symbol, 3);
        assert_eq!(v.is_common_pattern, 1);
        assert_eq!(v.shannon_entropy, 3.0 * 32f64.log2());
    }

    #[test]
    fn test_partition_invariants() {
        let e = extractor();
        let samples = [
            "",
            "a",
            "Z",
            "7",
            "~",
            "hunter2",
            "Tr0ub4dor&3",
            "correct horse battery staple",
            "日本語パスワード",
            "\t\n\r",
            "MiXeD-123_case!",
        ];
        for password in samples {
            assert_counts_partition(&e.extract(password));
        }

        let long = "xY9#".repeat(10_000);
        let v = e.extract(&long);
        assert_eq!(v.length, 40_000);
        assert_counts_partition(&v);
    }

    #[test]
    fn test_deterministic() {
        let e = extractor();
        for password in ["", "password", "Ab1!", "ééé"] {
            assert_eq!(e.extract(password), e.extract(password));
        }
    }

    #[test]
    fn test_array_follows_feature_order() {
        let v = extractor().extract("Aa1!!!");
        let array = v.to_array();
        assert_eq!(array.len(), FEATURE_NAMES.len());
        assert_eq!(array[0], 6.0);
        assert_eq!(array[1], 1.0);
        assert_eq!(array[2], 1.0);
        assert_eq!(array[3], 1.0);
        assert_eq!(array[4], 3.0);
        assert_eq!(array[5], 4.0);
        assert_eq!(array[6], v.shannon_entropy);
        assert_eq!(array[7], 1.0);
    }
}
