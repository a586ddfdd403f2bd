// Tabular rendering of a reconciliation, independent of the output format.

use crate::config::*;

pub const EXACT_COLUMNS: [&str; 6] = [
    "Original_Column_Backend",
    "Mean_Backend",
    "N_Backend",
    "Original_Column_Teacher",
    "Mean_Teacher",
    "normalized_key",
];

pub const FUZZY_COLUMNS: [&str; 5] = [
    "Similarity_Score",
    "Backend_Question",
    "Mean_Backend",
    "Suggested_Teacher_Question",
    "Mean_Teacher",
];

pub const BACKEND_COLUMNS: [&str; 4] = ["Original_Column", "Mean_Backend", "N_Backend", "normalized_key"];

pub const TEACHER_COLUMNS: [&str; 3] = ["Original_Column", "Mean_Teacher", "normalized_key"];

#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Integer(u64),
    Empty,
}

impl From<Option<u64>> for Cell {
    fn from(x: Option<u64>) -> Cell {
        x.map(Cell::Integer).unwrap_or(Cell::Empty)
    }
}

/// The kind of records held by a section.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SectionKind {
    ExactMatches,
    FuzzySuggestions,
    BackendOnly,
    TeacherOnly,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ReportSection {
    pub kind: SectionKind,
    /// Sheet name.
    pub name: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

/// The four sections of the report, in output order.
#[derive(PartialEq, Debug, Clone)]
pub struct ReportBundle {
    pub sections: Vec<ReportSection>,
}

impl ReportBundle {
    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

/// Lays out the matching results as four tables with fixed columns.
///
/// Rows keep the order of their inputs; the fuzzy suggestions are expected
/// to be already sorted by decreasing score.
pub fn build_report(
    matches: &[ExactMatch],
    suggestions: &[FuzzySuggestion],
    backend_leftover: &[UnmatchedBackend],
    teacher_leftover: &[UnmatchedTeacher],
    threshold: u8,
) -> ReportBundle {
    let exact = ReportSection {
        kind: SectionKind::ExactMatches,
        name: "1_Normalized_Match (高信心)".to_string(),
        columns: EXACT_COLUMNS.to_vec(),
        rows: matches
            .iter()
            .map(|m| {
                vec![
                    text(&m.backend_text),
                    Cell::Number(m.backend_mean),
                    m.backend_n.into(),
                    text(&m.teacher_text),
                    Cell::Number(m.teacher_mean),
                    text(&m.key),
                ]
            })
            .collect(),
    };

    let fuzzy = ReportSection {
        kind: SectionKind::FuzzySuggestions,
        name: format!("2_Fuzzy_Suggestions (>{}%)", threshold),
        columns: FUZZY_COLUMNS.to_vec(),
        rows: suggestions
            .iter()
            .map(|s| {
                vec![
                    Cell::Number(round2(s.score.percent())),
                    text(&s.backend_text),
                    Cell::Number(s.backend_mean),
                    text(&s.teacher_text),
                    Cell::Number(s.teacher_mean),
                ]
            })
            .collect(),
    };

    let backend = ReportSection {
        kind: SectionKind::BackendOnly,
        name: "3_Backend_Only (最終未匹配)".to_string(),
        columns: BACKEND_COLUMNS.to_vec(),
        rows: backend_leftover
            .iter()
            .map(|u| vec![text(&u.text), Cell::Number(u.mean), u.n.into(), text(&u.key)])
            .collect(),
    };

    let teacher = ReportSection {
        kind: SectionKind::TeacherOnly,
        name: "4_Teacher_Only (最終未匹配)".to_string(),
        columns: TEACHER_COLUMNS.to_vec(),
        rows: teacher_leftover
            .iter()
            .map(|u| vec![text(&u.text), Cell::Number(u.mean), text(&u.key)])
            .collect(),
    };

    ReportBundle {
        sections: vec![exact, fuzzy, backend, teacher],
    }
}

impl Reconciliation {
    pub fn report(&self) -> ReportBundle {
        build_report(
            &self.exact_matches,
            &self.fuzzy_suggestions,
            &self.backend_unmatched,
            &self.teacher_unmatched,
            self.threshold,
        )
    }
}
