//! Password strength analysis
//!
//! A scoring heuristic over character classes, length and a short list of
//! well-known patterns. The score, strength bands, feedback strings and
//! crack-time estimate are part of the public API of `/api/check-password`
//! and are kept stable.

use serde::{Deserialize, Serialize};

/// Characters counted as "special"
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

const COMMON_PATTERNS: [&str; 6] = ["123456", "password", "qwerty", "abc123", "admin", "welcome"];

/// Assumed attacker speed for the crack-time estimate
const GUESSES_PER_SECOND: f64 = 1_000_000_000.0;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const MONTH: f64 = 2_592_000.0;
const YEAR: f64 = 31_536_000.0;

/// Character-class breakdown of an analysed password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordDetails {
    pub length: usize,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_numbers: bool,
    pub has_special_chars: bool,
    pub has_common_patterns: bool,
    pub estimated_crack_time: String,
}

/// Result of analysing a non-empty password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordAnalysis {
    pub score: u32,
    pub strength: Strength,
    pub feedback: Vec<String>,
    pub details: PasswordDetails,
}

/// Strength band derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    #[serde(rename = "Very Weak")]
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    #[serde(rename = "Very Strong")]
    VeryStrong,
}

impl Strength {
    pub fn from_score(score: u32) -> Self {
        match score {
            85.. => Self::VeryStrong,
            70..=84 => Self::Strong,
            50..=69 => Self::Moderate,
            30..=49 => Self::Weak,
            _ => Self::VeryWeak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryWeak => "Very Weak",
            Self::Weak => "Weak",
            Self::Moderate => "Moderate",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very Strong",
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_special(c: char) -> bool {
    SPECIAL_CHARS.contains(c)
}

/// True when the password contains one of the well-known weak patterns
pub fn has_common_patterns(password: &str) -> bool {
    let lowered = password.to_lowercase();
    COMMON_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}

/// Size of the alphabet an attacker would have to search
pub fn charset_size(password: &str) -> u32 {
    let mut size = 0;
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        size += 26;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        size += 26;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        size += 10;
    }
    if password.chars().any(is_special) {
        size += 32;
    }
    size
}

/// Password length in UTF-16 code units, so astral characters count twice
fn length_units(password: &str) -> usize {
    password.encode_utf16().count()
}

/// Human-readable time to brute-force half the keyspace
pub fn estimate_crack_time(password: &str) -> String {
    let length = length_units(password) as f64;
    let combinations = f64::from(charset_size(password)).powf(length);
    format_duration(combinations / (2.0 * GUESSES_PER_SECOND))
}

/// Format a number of seconds into the coarsest sensible unit, rounding up
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_infinite() {
        return "Infinity years".to_string();
    }
    if seconds < MINUTE {
        return "Less than a minute".to_string();
    }
    let (unit, name) = if seconds < HOUR {
        (MINUTE, "minutes")
    } else if seconds < DAY {
        (HOUR, "hours")
    } else if seconds < MONTH {
        (DAY, "days")
    } else if seconds < YEAR {
        (MONTH, "months")
    } else {
        (YEAR, "years")
    };
    format!("{} {}", (seconds / unit).ceil(), name)
}

/// Analyse a password; `None` for the empty string
pub fn analyze_password(password: &str) -> Option<PasswordAnalysis> {
    if password.is_empty() {
        return None;
    }

    let details = PasswordDetails {
        length: length_units(password),
        has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
        has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
        has_numbers: password.chars().any(|c| c.is_ascii_digit()),
        has_special_chars: password.chars().any(is_special),
        has_common_patterns: has_common_patterns(password),
        estimated_crack_time: estimate_crack_time(password),
    };

    let mut score = 0;
    if details.length >= 8 {
        score += 20;
    }
    if details.length >= 12 {
        score += 10;
    }
    if details.has_uppercase {
        score += 15;
    }
    if details.has_lowercase {
        score += 15;
    }
    if details.has_numbers {
        score += 15;
    }
    if details.has_special_chars {
        score += 20;
    }
    if !details.has_common_patterns {
        score += 5;
    }

    Some(PasswordAnalysis {
        score,
        strength: Strength::from_score(score),
        feedback: feedback_for(&details),
        details,
    })
}

fn feedback_for(details: &PasswordDetails) -> Vec<String> {
    let checks = [
        (details.length < 8, "Use at least 8 characters"),
        (!details.has_uppercase, "Add uppercase letters (A-Z)"),
        (!details.has_lowercase, "Add lowercase letters (a-z)"),
        (!details.has_numbers, "Add numbers (0-9)"),
        (!details.has_special_chars, "Add special characters (!@#$%^&*)"),
        (details.has_common_patterns, "Avoid common patterns and dictionary words"),
        (details.length < 12, "Consider using 12+ characters for better security"),
    ];
    checks
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, message)| message.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_password() {
        assert!(analyze_password("").is_none());
    }

    #[test]
    fn test_common_password_is_weak() {
        let analysis = analyze_password("password").unwrap();
        // 20 (length 8) + 15 (lowercase), common pattern present
        assert_eq!(analysis.score, 35);
        assert_eq!(analysis.strength, Strength::Weak);
        assert!(analysis.details.has_common_patterns);
        assert_eq!(
            analysis.feedback,
            vec![
                "Add uppercase letters (A-Z)",
                "Add numbers (0-9)",
                "Add special characters (!@#$%^&*)",
                "Avoid common patterns and dictionary words",
                "Consider using 12+ characters for better security",
            ]
        );
    }

    #[test]
    fn test_full_marks() {
        let analysis = analyze_password("Tr0ub4dor&3xyz").unwrap();
        assert_eq!(analysis.score, 100);
        assert_eq!(analysis.strength, Strength::VeryStrong);
        assert!(analysis.feedback.is_empty());
        assert_eq!(analysis.details.estimated_crack_time.split(' ').last(), Some("years"));
    }

    #[test]
    fn test_short_digits() {
        let analysis = analyze_password("1234").unwrap();
        assert_eq!(analysis.score, 20);
        assert_eq!(analysis.strength, Strength::VeryWeak);
        assert_eq!(analysis.details.estimated_crack_time, "Less than a minute");
        assert_eq!(analysis.feedback.first().map(String::as_str), Some("Use at least 8 characters"));
    }

    #[test]
    fn test_length_counts_utf16_units() {
        let analysis = analyze_password("\u{1F600}\u{1F600}\u{1F600}\u{1F600}").unwrap();
        assert_eq!(analysis.details.length, 8);
        assert_eq!(analysis.score, 25);
        assert_eq!(analyze_password("caf\u{e9}").unwrap().details.length, 4);
    }

    #[test]
    fn test_huge_keyspace_overflows_to_infinity() {
        let password = "aB3$".repeat(60);
        assert_eq!(estimate_crack_time(&password), "Infinity years");
    }

    #[test]
    fn test_common_patterns_case_insensitive() {
        assert!(has_common_patterns("MyQWERTYpass"));
        assert!(has_common_patterns("x123456x"));
        assert!(!has_common_patterns("12345"));
    }

    #[test]
    fn test_charset_size() {
        assert_eq!(charset_size("abc"), 26);
        assert_eq!(charset_size("aB1!"), 94);
        assert_eq!(charset_size("   "), 0);
    }

    #[test]
    fn test_format_duration_bands() {
        assert_eq!(format_duration(59.0), "Less than a minute");
        assert_eq!(format_duration(61.0), "2 minutes");
        assert_eq!(format_duration(3_600.0), "1 hours");
        assert_eq!(format_duration(86_400.0 * 3.5), "4 days");
        assert_eq!(format_duration(2_592_000.0 * 2.0), "2 months");
        assert_eq!(format_duration(31_536_000.0 * 10.0), "10 years");
        assert_eq!(format_duration(f64::INFINITY), "Infinity years");
    }

    #[test]
    fn test_strength_serializes_with_spaces() {
        assert_eq!(serde_json::to_string(&Strength::VeryStrong).unwrap(), "\"Very Strong\"");
        assert_eq!(serde_json::to_string(&Strength::Moderate).unwrap(), "\"Moderate\"");
    }

    #[test]
    fn test_details_serialize_camel_case() {
        let value = serde_json::to_value(analyze_password("abc").unwrap()).unwrap();
        assert_eq!(value["details"]["hasUppercase"], false);
        assert_eq!(value["details"]["estimatedCrackTime"], "Less than a minute");
    }

    proptest! {
        #[test]
        fn score_is_bounded_and_matches_band(password in "\\PC{1,40}") {
            let analysis = analyze_password(&password).unwrap();
            prop_assert!(analysis.score <= 100);
            prop_assert_eq!(analysis.strength, Strength::from_score(analysis.score));
        }

        #[test]
        fn adding_a_special_char_never_lowers_score(password in "[a-zA-Z0-9]{1,20}") {
            let before = analyze_password(&password).unwrap().score;
            let after = analyze_password(&format!("{}!", password)).unwrap().score;
            prop_assert!(after >= before);
        }
    }
}
