// ********* Input data structures ***********

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::Display;

/// One question record from either side of the reconciliation.
///
/// The normalized key is computed once at construction and never re-derived,
/// so both matching stages see the same view of the record.
#[derive(PartialEq, Debug, Clone)]
pub struct LabeledValue {
    original_text: String,
    mean: f64,
    n: Option<u64>,
    normalized_key: String,
}

impl LabeledValue {
    /// A backend record: question text, mean score and sample count.
    pub fn backend(original_text: &str, mean: f64, n: Option<u64>) -> LabeledValue {
        LabeledValue {
            original_text: original_text.to_string(),
            mean,
            n,
            normalized_key: crate::normalize(original_text),
        }
    }

    /// A teacher record. The teacher sheet carries no sample count.
    pub fn teacher(original_text: &str, mean: f64) -> LabeledValue {
        LabeledValue::backend(original_text, mean, None)
    }

    /// A record read from a table cell that may be missing or hold a
    /// non-text value. Such a record keeps an empty text and an empty key.
    pub fn from_cell(side: Side, cell: Option<&str>, mean: f64, n: Option<u64>) -> LabeledValue {
        LabeledValue {
            original_text: cell.unwrap_or_default().to_string(),
            mean,
            n: match side {
                Side::Backend => n,
                Side::Teacher => None,
            },
            normalized_key: crate::normalize_cell(cell),
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn n(&self) -> Option<u64> {
        self.n
    }

    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }
}

// ******** Output data structures *********

/// Which input collection a record comes from.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Side {
    Backend,
    Teacher,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Backend => write!(f, "backend"),
            Side::Teacher => write!(f, "teacher"),
        }
    }
}

/// An edit-distance similarity, kept as the exact fraction `matched / total`.
///
/// `total` is the summed length (in characters) of both strings and `matched`
/// is `total` minus the insertion/deletion distance, that is twice the longest
/// common subsequence. Two empty strings are identical.
///
/// Equality and ordering compare the fractions, so `3/4` equals `6/8`.
#[derive(Debug, Clone, Copy)]
pub struct Similarity {
    pub matched: usize,
    pub total: usize,
}

impl Similarity {
    pub const IDENTICAL: Similarity = Similarity {
        matched: 0,
        total: 0,
    };

    /// The score on the 0-100 scale.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * (self.matched as f64) / (self.total as f64)
        }
    }

    /// True if the score is strictly above the threshold (0-100).
    pub fn exceeds(&self, threshold: u8) -> bool {
        if self.total == 0 {
            return 100 > u64::from(threshold);
        }
        (self.matched as u64) * 100 > u64::from(threshold) * (self.total as u64)
    }
}

impl Ord for Similarity {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare matched/total fractions without leaving the integers.
        let (a_num, a_den) = if self.total == 0 { (1, 1) } else { (self.matched, self.total) };
        let (b_num, b_den) = if other.total == 0 { (1, 1) } else { (other.matched, other.total) };
        ((a_num as u128) * (b_den as u128)).cmp(&((b_num as u128) * (a_den as u128)))
    }
}

impl PartialEq for Similarity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Similarity {}

impl PartialOrd for Similarity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Two records whose normalized keys are identical.
#[derive(PartialEq, Debug, Clone)]
pub struct ExactMatch {
    pub backend_text: String,
    pub backend_mean: f64,
    pub backend_n: Option<u64>,
    pub teacher_text: String,
    pub teacher_mean: f64,
    pub key: String,
}

/// A proposed pairing for human review: no shared key, but similar text.
#[derive(PartialEq, Debug, Clone)]
pub struct FuzzySuggestion {
    pub score: Similarity,
    pub backend_text: String,
    pub backend_mean: f64,
    pub teacher_text: String,
    pub teacher_mean: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct UnmatchedBackend {
    pub text: String,
    pub mean: f64,
    pub n: Option<u64>,
    pub key: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct UnmatchedTeacher {
    pub text: String,
    pub mean: f64,
    pub key: String,
}

/// The outcome for a record, or pair of records.
#[derive(PartialEq, Debug, Clone)]
pub enum MatchResult {
    Exact(ExactMatch),
    Fuzzy(FuzzySuggestion),
    UnmatchedBackend(UnmatchedBackend),
    UnmatchedTeacher(UnmatchedTeacher),
}

/// Output of the exact stage: the matches, and the records of each side whose
/// key took part in no match, in input order.
#[derive(PartialEq, Debug, Clone)]
pub struct ExactStage {
    pub matches: Vec<ExactMatch>,
    pub backend_remaining: Vec<LabeledValue>,
    pub teacher_remaining: Vec<LabeledValue>,
}

/// Output of the fuzzy stage. Suggestions are sorted by decreasing score.
#[derive(PartialEq, Debug, Clone)]
pub struct FuzzyStage {
    pub suggestions: Vec<FuzzySuggestion>,
    pub backend_still_remaining: Vec<LabeledValue>,
    pub teacher_still_remaining: Vec<LabeledValue>,
}

/// Counts for each output category.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct PartitionCounts {
    pub backend_total: usize,
    pub teacher_total: usize,
    /// Distinct backend records taking part in an exact match.
    pub backend_exact: usize,
    /// Distinct teacher records taking part in an exact match.
    pub teacher_exact: usize,
    pub exact_rows: usize,
    pub fuzzy_suggestions: usize,
    pub backend_unmatched: usize,
    pub teacher_unmatched: usize,
}

impl PartitionCounts {
    /// Every record of each side is in exactly one category.
    pub fn is_partition(&self) -> bool {
        self.backend_total == self.backend_exact + self.fuzzy_suggestions + self.backend_unmatched
            && self.teacher_total
                == self.teacher_exact + self.fuzzy_suggestions + self.teacher_unmatched
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Reconciliation {
    pub threshold: u8,
    pub exact_matches: Vec<ExactMatch>,
    pub fuzzy_suggestions: Vec<FuzzySuggestion>,
    pub backend_unmatched: Vec<UnmatchedBackend>,
    pub teacher_unmatched: Vec<UnmatchedTeacher>,
    pub counts: PartitionCounts,
}

impl Reconciliation {
    /// All the results, flattened in report order.
    pub fn results(&self) -> Vec<MatchResult> {
        let mut res: Vec<MatchResult> = Vec::new();
        res.extend(self.exact_matches.iter().cloned().map(MatchResult::Exact));
        res.extend(self.fuzzy_suggestions.iter().cloned().map(MatchResult::Fuzzy));
        res.extend(
            self.backend_unmatched
                .iter()
                .cloned()
                .map(MatchResult::UnmatchedBackend),
        );
        res.extend(
            self.teacher_unmatched
                .iter()
                .cloned()
                .map(MatchResult::UnmatchedTeacher),
        );
        res
    }
}

/// Errors that prevent the reconciliation from running.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MatchingErrors {
    /// The fuzzy threshold must be within 0..=100.
    InvalidThreshold(u8),
    /// A normalized key appears twice on one side while duplicates are rejected.
    DuplicateKey { side: Side, key: String },
    /// A mean that is NaN or infinite.
    NonFiniteMean { side: Side, text: String },
}

impl Error for MatchingErrors {}

impl Display for MatchingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchingErrors::InvalidThreshold(t) => {
                write!(f, "fuzzy threshold must be between 0 and 100, got {}", t)
            }
            MatchingErrors::DuplicateKey { side, key } => {
                write!(f, "duplicate normalized key {:?} in {} data", key, side)
            }
            MatchingErrors::NonFiniteMean { side, text } => {
                write!(f, "{} question {:?} has a mean that is not a number", side, text)
            }
        }
    }
}

// ********* Configuration **********

/// What to do when several records of one side share a normalized key.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateKeyMode {
    /// Join semantics: every backend x teacher combination is emitted.
    CrossProduct,
    /// Fail before matching.
    Reject,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatchRules {
    /// Similarity (0-100) that a fuzzy candidate must strictly exceed.
    pub fuzzy_threshold: u8,
    pub duplicate_key_mode: DuplicateKeyMode,
}

impl MatchRules {
    pub const DEFAULT_THRESHOLD: u8 = 80;

    pub const DEFAULT_RULES: MatchRules = MatchRules {
        fuzzy_threshold: MatchRules::DEFAULT_THRESHOLD,
        duplicate_key_mode: DuplicateKeyMode::CrossProduct,
    };

    pub fn validate(&self) -> Result<(), MatchingErrors> {
        if self.fuzzy_threshold > 100 {
            return Err(MatchingErrors::InvalidThreshold(self.fuzzy_threshold));
        }
        Ok(())
    }
}
