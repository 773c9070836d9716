//! Clinical section detection.
//!
//! Splits a transcript on line boundaries, opening a new section whenever a
//! line contains one of the clinical section markers. Sections are byte
//! ranges over the original text and exactly partition it; the lossless
//! reconstruction invariant of segmentation depends on that.

use std::ops::Range;

/// Default section marker phrases, English and Spanish pairs.
pub const DEFAULT_SECTION_MARKERS: &[&str] = &[
    "chief complaint",
    "motivo de consulta",
    "present illness",
    "history",
    "antecedentes",
    "medication",
    "medicación",
    "medicamentos",
    "allergy",
    "allergies",
    "alergia",
    "physical exam",
    "examination",
    "examen",
    "exploración",
    "assessment",
    "evaluación",
    "plan",
];

/// Split `text` into section ranges at lines containing a marker.
///
/// Markers are matched case-insensitively anywhere in the line. A text with
/// no markers comes back as a single section, as a fallback, not an error.
/// The returned ranges are ordered and partition `0..text.len()` exactly.
pub fn detect_sections(text: &str, markers: &[String]) -> Vec<Range<usize>> {
    if text.is_empty() {
        return Vec::new();
    }

    let lowered_markers: Vec<String> = markers.iter().map(|m| m.to_lowercase()).collect();

    let mut sections = Vec::new();
    let mut section_start = 0usize;
    let mut offset = 0usize;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line_start == section_start {
            // First line of the current section never re-opens it.
            continue;
        }

        let lowered = line.to_lowercase();
        if lowered_markers.iter().any(|m| lowered.contains(m)) {
            sections.push(section_start..line_start);
            section_start = line_start;
        }
    }

    sections.push(section_start..text.len());
    sections
}
