// Identifier and grade canonicalization. Pure, locale-independent.

/// Identifiers are numeric; compared as exact strings after trimming.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_string()
}

/// Trim + uppercase, then fold the Pass and Absent spellings.
/// Everything else (letter grades, `W`, `I`, empty) passes through.
pub fn normalize_grade_token(raw: &str) -> String {
    let g = raw.trim().to_uppercase();
    match g.as_str() {
        "P" | "PASS" => "PASS".to_string(),
        "ABSENT" | "ABS" => "ABSENT".to_string(),
        _ => g,
    }
}

/// Display form of a grade cell: trimmed and uppercased, no folding.
pub fn clean_grade(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One or more ASCII decimal digits after trimming.
pub fn is_numeric_id(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Row-admission filter for a resolved identifier. Blank trailing rows and
/// footer text surface as empty, `nan` or non-numeric identifiers.
pub fn admits_identifier(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && !id.eq_ignore_ascii_case("nan") && is_numeric_id(id)
}
