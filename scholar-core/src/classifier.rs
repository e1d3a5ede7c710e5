//! Subject classifier: keyword scoring over a fixed category table
//!
//! Each category owns an ordered keyword list. A question scores one point per
//! whole-word keyword hit, plus one bonus point for every distinct keyword longer
//! than [`STRONG_KEYWORD_LEN`] characters that hits at least once. The best
//! category wins (ties go to the earlier table entry) if it passes the
//! confidence gate:
//!
//! - score ≥ 2, or
//! - score == 1 and one of the matched keywords is a strong keyword.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keywords strictly longer than this count as strong, domain-specific terms.
pub const STRONG_KEYWORD_LEN: usize = 6;

/// Minimum score accepted without a strong keyword.
const CONFIDENT_SCORE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Mathematics,
    Science,
    History,
    Geography,
    Literature,
    #[serde(rename = "Computer Science")]
    ComputerScience,
    #[serde(rename = "Language Arts")]
    LanguageArts,
    #[serde(rename = "Social Studies")]
    SocialStudies,
}

impl Subject {
    /// Every subject, in table order.
    pub const ALL: [Subject; 8] = [
        Subject::Mathematics,
        Subject::Science,
        Subject::History,
        Subject::Geography,
        Subject::Literature,
        Subject::ComputerScience,
        Subject::LanguageArts,
        Subject::SocialStudies,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Science => "Science",
            Subject::History => "History",
            Subject::Geography => "Geography",
            Subject::Literature => "Literature",
            Subject::ComputerScience => "Computer Science",
            Subject::LanguageArts => "Language Arts",
            Subject::SocialStudies => "Social Studies",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Subject::Mathematics => &[
                "math", "algebra", "geometry", "calculus", "trigonometry", "arithmetic",
                "equation", "formula", "theorem", "proof", "derivative", "integral", "matrix",
                "vector", "probability", "statistics", "graph", "function", "polynomial",
                "logarithm", "sine", "cosine", "tangent", "quadratic", "linear", "exponential",
            ],
            Subject::Science => &[
                "physics", "chemistry", "biology", "science", "atom", "molecule", "cell",
                "organism", "evolution", "genetics", "DNA", "photosynthesis", "respiration",
                "gravity", "force", "energy", "momentum", "wave", "light", "electricity",
                "magnetism", "chemical", "reaction", "element", "compound", "ecosystem",
            ],
            Subject::History => &[
                "history", "historical", "ancient", "medieval", "revolution", "war", "empire",
                "civilization", "culture", "democracy", "monarchy", "republic", "treaty",
                "constitution", "independence", "colonial", "renaissance", "reformation",
            ],
            Subject::Geography => &[
                "geography", "continent", "country", "capital", "mountain", "river", "ocean",
                "climate", "weather", "latitude", "longitude", "population", "map", "atlas",
                "desert", "forest", "plateau", "valley", "island", "peninsula",
            ],
            Subject::Literature => &[
                "literature", "poem", "poetry", "novel", "story", "author", "writer", "book",
                "character", "plot", "theme", "metaphor", "symbolism", "alliteration",
                "shakespeare", "prose", "verse", "narrative", "fiction", "non-fiction",
            ],
            Subject::ComputerScience => &[
                "programming", "computer", "software", "hardware", "algorithm", "coding", "code",
                "python", "javascript", "java", "data structure", "database", "network",
                "internet", "website", "app", "application", "debugging", "variable",
                "function", "loop", "array", "object", "class",
            ],
            Subject::LanguageArts => &[
                "grammar", "vocabulary", "spelling", "writing", "reading", "comprehension",
                "sentence", "paragraph", "essay", "verb", "noun", "adjective", "adverb",
                "punctuation", "comma", "period", "question mark", "exclamation",
            ],
            Subject::SocialStudies => &[
                "government", "politics", "economics", "society", "community", "citizenship",
                "rights", "law", "justice", "democracy", "election", "vote", "tax", "economy",
                "market", "trade", "currency", "inflation",
            ],
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown subject category: {0}")]
pub struct UnknownSubject(pub String);

impl FromStr for Subject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSubject(s.to_string()))
    }
}

struct CompiledKeyword {
    pattern: Regex,
    strong: bool,
}

struct CompiledCategory {
    subject: Subject,
    keywords: Vec<CompiledKeyword>,
}

static CATEGORY_TABLE: LazyLock<Vec<CompiledCategory>> = LazyLock::new(|| {
    Subject::ALL
        .into_iter()
        .map(|subject| CompiledCategory {
            subject,
            keywords: subject
                .keywords()
                .iter()
                .map(|keyword| {
                    let lowered = keyword.to_lowercase();
                    CompiledKeyword {
                        pattern: Regex::new(&format!(r"\b{}\b", regex::escape(&lowered)))
                            .expect("escaped keyword is a valid pattern"),
                        strong: keyword.chars().count() > STRONG_KEYWORD_LEN,
                    }
                })
                .collect(),
        })
        .collect()
});

/// Score breakdown for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScore {
    pub subject: Subject,
    pub score: u32,
    pub strong_match: bool,
}

/// Per-category scores for a question, in table order, zero scores omitted.
pub fn score_question(question: &str) -> Vec<CategoryScore> {
    let lowered = question.to_lowercase();

    CATEGORY_TABLE
        .iter()
        .filter_map(|category| {
            let mut score = 0;
            let mut strong_match = false;
            for keyword in &category.keywords {
                let hits = keyword.pattern.find_iter(&lowered).count() as u32;
                score += hits;
                if hits > 0 && keyword.strong {
                    score += 1;
                    strong_match = true;
                }
            }
            (score > 0).then_some(CategoryScore {
                subject: category.subject,
                score,
                strong_match,
            })
        })
        .collect()
}

/// Classify a question, or `None` when no category is confident enough.
pub fn categorize_question(question: &str) -> Option<Subject> {
    if question.trim().is_empty() {
        return None;
    }

    let best = score_question(question)
        .into_iter()
        .fold(None::<CategoryScore>, |best, candidate| match best {
            Some(current) if current.score >= candidate.score => Some(current),
            _ => Some(candidate),
        })?;

    let confident =
        best.score >= CONFIDENT_SCORE || (best.score == 1 && best.strong_match);
    confident.then_some(best.subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_questions() {
        assert_eq!(
            categorize_question("What is the quadratic formula?"),
            Some(Subject::Mathematics)
        );
        assert_eq!(categorize_question("Explain photosynthesis"), Some(Subject::Science));
        assert_eq!(
            categorize_question("What is the capital of France?"),
            Some(Subject::Geography)
        );
        assert_eq!(categorize_question("Hello there"), None);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(categorize_question(""), None);
        assert_eq!(categorize_question("   \n\t"), None);
    }

    #[test]
    fn test_single_short_keyword_is_not_confident() {
        // "math" scores 1 with no strong keyword
        assert_eq!(categorize_question("How do you solve this math problem?"), None);
        assert_eq!(categorize_question("Why does my code fail?"), None);
    }

    #[test]
    fn test_two_short_keywords_are_confident() {
        assert_eq!(
            categorize_question("Is a poem the same as a book?"),
            Some(Subject::Literature)
        );
    }

    #[test]
    fn test_repeated_keyword_counts_every_occurrence() {
        let scores = score_question("war and more war");
        assert_eq!(
            scores,
            vec![CategoryScore {
                subject: Subject::History,
                score: 2,
                strong_match: false,
            }]
        );
        assert_eq!(categorize_question("war and more war"), Some(Subject::History));
    }

    #[test]
    fn test_strong_keyword_bonus_applies_once_per_keyword() {
        let scores = score_question("photosynthesis, photosynthesis");
        assert_eq!(scores[0].subject, Subject::Science);
        assert_eq!(scores[0].score, 3);
        assert!(scores[0].strong_match);
    }

    #[test]
    fn test_whole_word_matching_only() {
        // "cell" must not match inside "excellent", "map" not inside "mapping"
        assert!(score_question("an excellent mapping").is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(categorize_question("What is DNA? And dna again"), Some(Subject::Science));
        assert_eq!(categorize_question("EXPLAIN PHOTOSYNTHESIS"), Some(Subject::Science));
    }

    #[test]
    fn test_multi_word_and_hyphenated_keywords() {
        let scores = score_question("Which data structure fits?");
        assert!(scores
            .iter()
            .any(|s| s.subject == Subject::ComputerScience && s.score == 2));

        let scores = score_question("Is this non-fiction?");
        assert!(scores
            .iter()
            .any(|s| s.subject == Subject::Literature && s.strong_match));
    }

    #[test]
    fn test_tie_goes_to_first_category_in_table() {
        // "function" belongs to both Mathematics and Computer Science
        let scores = score_question("function function");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].score, scores[1].score);
        assert_eq!(categorize_question("function function"), Some(Subject::Mathematics));

        // "democracy" belongs to both History and Social Studies
        assert_eq!(categorize_question("What is democracy?"), Some(Subject::History));
    }

    #[test]
    fn test_highest_score_wins_over_table_order() {
        assert_eq!(
            categorize_question("Solve the equation in python with a loop over an array"),
            Some(Subject::ComputerScience)
        );
    }

    #[test]
    fn test_subject_labels_round_trip_through_from_str() {
        for subject in Subject::ALL {
            assert_eq!(subject.label().parse::<Subject>(), Ok(subject));
        }
        assert_eq!(
            "Astrology".parse::<Subject>(),
            Err(UnknownSubject("Astrology".to_string()))
        );
        assert_eq!(
            UnknownSubject("Astrology".to_string()).to_string(),
            "unknown subject category: Astrology"
        );
    }

    #[test]
    fn test_subject_serializes_as_label() {
        let json = serde_json::to_string(&Subject::ComputerScience).unwrap();
        assert_eq!(json, "\"Computer Science\"");
    }
}
