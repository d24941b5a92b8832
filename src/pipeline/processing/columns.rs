use std::collections::HashMap;

/// Separator between segments of a hierarchical header string.
pub const HEADER_SEPARATOR: &str = " > ";

/// Reconciles the header strings the schema discovery expected against the
/// headers actually present after re-parsing the sheet.
///
/// Discovery and extraction concatenate multi-row headers independently, so
/// the two sides can disagree on whitespace or segment ordering. Resolution
/// runs a 4-tier fallback per expected header, first match wins:
/// exact match, unique last-segment match, last-segment match disambiguated
/// by the parent segment, then whitespace-normalized substring containment.
/// An unresolved header gets no entry; callers fall back to the expected
/// string verbatim.
pub fn resolve_headers(actual: &[String], expected: &[String]) -> HashMap<String, String> {
    let mut resolved = HashMap::new();
    for wanted in expected {
        if let Some(found) = resolve_one(actual, wanted) {
            resolved.insert(wanted.clone(), found);
        }
    }
    resolved
}

fn resolve_one(actual: &[String], wanted: &str) -> Option<String> {
    // Tier 1: exact match
    if actual.iter().any(|h| h == wanted) {
        return Some(wanted.to_string());
    }

    // Tier 2: match on the final hierarchy segment
    let wanted_segments: Vec<&str> = wanted.split(HEADER_SEPARATOR).collect();
    let wanted_last = *wanted_segments.last()?;
    let candidates: Vec<&String> = actual
        .iter()
        .filter(|h| h.rsplit(HEADER_SEPARATOR).next() == Some(wanted_last))
        .collect();
    if candidates.len() == 1 {
        return Some(candidates[0].clone());
    }

    // Tier 3: several candidates share the last segment, disambiguate by the
    // second-to-last segment of the expected header
    if candidates.len() > 1 && wanted_segments.len() >= 2 {
        let wanted_parent = wanted_segments[wanted_segments.len() - 2];
        if let Some(found) = candidates.iter().find(|h| {
            let segments: Vec<&str> = h.split(HEADER_SEPARATOR).collect();
            segments.len() >= 2 && segments[segments.len() - 2].contains(wanted_parent)
        }) {
            return Some((*found).clone());
        }
    }

    // Tier 4: whitespace-insensitive substring containment
    let wanted_normalized = strip_whitespace(wanted);
    actual
        .iter()
        .find(|h| {
            let normalized = strip_whitespace(h);
            normalized.contains(&wanted_normalized) || wanted_normalized.contains(&normalized)
        })
        .cloned()
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_wins_over_fuzzy_candidates() {
        let actual = headers(&["금액", "합계 > 금액"]);
        let resolved = resolve_headers(&actual, &headers(&["금액"]));
        assert_eq!(resolved.get("금액").unwrap(), "금액");
    }

    #[test]
    fn unique_last_segment_matches() {
        let actual = headers(&["수입 > 입금액", "비고"]);
        let resolved = resolve_headers(&actual, &headers(&["금액 > 입금액"]));
        assert_eq!(resolved.get("금액 > 입금액").unwrap(), "수입 > 입금액");
    }

    #[test]
    fn ambiguous_last_segment_disambiguates_by_parent() {
        let actual = headers(&["수입 내역 > 금액", "지출 내역 > 금액"]);
        let resolved = resolve_headers(&actual, &headers(&["내역 > 지출 > 금액"]));
        // The expected parent segment "지출" picks the second candidate.
        assert_eq!(resolved.get("내역 > 지출 > 금액").unwrap(), "지출 내역 > 금액");
    }

    #[test]
    fn whitespace_normalized_containment_is_the_final_tier() {
        let actual = headers(&["프로젝트  명 (전체)"]);
        let resolved = resolve_headers(&actual, &headers(&["프로젝트 명"]));
        assert_eq!(resolved.get("프로젝트 명").unwrap(), "프로젝트  명 (전체)");
    }

    #[test]
    fn unresolved_headers_get_no_entry() {
        let actual = headers(&["날짜", "금액"]);
        let resolved = resolve_headers(&actual, &headers(&["담당자"]));
        assert!(resolved.is_empty());
    }
}
