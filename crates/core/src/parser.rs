//! C2: regex-driven normalization of raw calendar text into structured
//! fields. Must be total (never fails, falls through to pass-through on
//! mismatch) and idempotent (re-parsing an already-normalized title is a
//! no-op).

use regex::Regex;
use std::sync::OnceLock;

/// Parsed fields extracted from a raw event title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTitle {
    pub subject: String,
    pub display_title: String,
    pub professor: String,
    pub group_display: String,
}

/// Parsed fields extracted from a raw event location string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLocation {
    pub room: String,
    pub building: String,
}

fn professor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:prof\.?|conf\.?|dr\.?|lect\.?|asist\.?)\s*(?:univ\.?\s*)?((?:[A-ZȘȚĂÂÎ][\wȘȚĂÂÎșțăâî'-]*\.?\s*){1,4})",
        )
        .expect("static regex is valid")
    })
}

fn group_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:year|an(?:ul)?)\s*([1-8])\b").expect("static regex is valid")
    })
}

fn group_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:grup[ae]?|group|seri[ae]?)\s*([a-z0-9]{1,4})\b")
            .expect("static regex is valid")
    })
}

fn compact_group_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-8])([A-Za-z])\b").expect("static regex is valid"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

fn room_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:sala|room)\s*[:.]?\s*([A-Za-z0-9.\-]+)").expect("static regex is valid")
    })
}

fn trailing_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+[A-Za-z]?)\s*$").expect("static regex is valid"))
}

fn collapse_whitespace(s: &str) -> String {
    whitespace_re().replace_all(s.trim(), " ").trim().to_string()
}

fn strip_institution_prefix(s: &str) -> &str {
    let trimmed = s.trim_start();
    for prefix in ["FMI:", "FMI -", "Curs:", "Laborator:", "Seminar:"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Normalizes a raw title into subject/professor/group/display fields.
///
/// Total: a title with none of the recognized patterns simply becomes its
/// own subject and display_title, with empty professor/group. Idempotent:
/// `parse_title(parse_title(x).display_title) == parse_title(x)` holds
/// because a `display_title` never contains the stripped tokens.
pub fn parse_title(raw: &str) -> ParsedTitle {
    let mut text = collapse_whitespace(strip_institution_prefix(raw));

    let professor = professor_re()
        .captures(&text)
        .map(|c| collapse_whitespace(c.get(1).map_or("", |m| m.as_str())))
        .unwrap_or_default();
    if let Some(m) = professor_re().find(&text) {
        text = format!("{}{}", &text[..m.start()], &text[m.end()..]);
        text = collapse_whitespace(&text);
    }

    let year = group_year_re()
        .captures(&text)
        .map(|c| c[1].to_string());
    if let Some(m) = group_year_re().find(&text) {
        text = format!("{}{}", &text[..m.start()], &text[m.end()..]);
        text = collapse_whitespace(&text);
    }

    let mut group_label = group_label_re()
        .captures(&text)
        .map(|c| c[1].to_uppercase());
    if let Some(m) = group_label_re().find(&text) {
        text = format!("{}{}", &text[..m.start()], &text[m.end()..]);
        text = collapse_whitespace(&text);
    }

    let mut year_from_compact = year.clone();
    if group_label.is_none() {
        if let Some(c) = compact_group_re().captures(&text) {
            if year_from_compact.is_none() {
                year_from_compact = Some(c[1].to_string());
            }
            group_label = Some(c[2].to_uppercase());
            if let Some(m) = compact_group_re().find(&text) {
                text = format!("{}{}", &text[..m.start()], &text[m.end()..]);
                text = collapse_whitespace(&text);
            }
        }
    }
    let year = year_from_compact;

    let group_display = match (&year, &group_label) {
        (Some(y), Some(g)) => format!("Year {y} • Group {g}"),
        (Some(y), None) => format!("Year {y}"),
        (None, Some(g)) => format!("Group {g}"),
        (None, None) => String::new(),
    };

    let subject = collapse_whitespace(text.trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ',' || c == '|'));

    let display_title = subject
        .split(['-', '–', '|', '/', ','])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&subject)
        .to_string();

    ParsedTitle {
        subject,
        display_title,
        professor,
        group_display,
    }
}

/// Longest-match-first building alias table. Matching is case-insensitive
/// substring search over the raw location; the first (longest) alias whose
/// pattern appears wins.
const BUILDING_ALIASES: &[(&str, &str)] = &[
    ("corp central", "Central"),
    ("corpul central", "Central"),
    ("campus nord", "Nord"),
    ("campus sud", "Sud"),
    ("corp a", "A"),
    ("corp b", "B"),
    ("corp c", "C"),
    ("cladirea tudor", "Tudor"),
    ("clădirea tudor", "Tudor"),
    ("tudor", "Tudor"),
];

/// Normalizes a raw location into room/building fields. Total: an
/// unrecognized location yields empty room and building.
pub fn parse_location(raw: &str) -> ParsedLocation {
    let text = collapse_whitespace(raw);
    let lower = text.to_lowercase();

    let room = room_re()
        .captures(&text)
        .map(|c| c[1].to_string())
        .or_else(|| trailing_number_re().captures(&text).map(|c| c[1].to_string()))
        .unwrap_or_default();

    let mut building = BUILDING_ALIASES
        .iter()
        .filter(|(alias, _)| lower.contains(alias))
        .max_by_key(|(alias, _)| alias.len())
        .map(|(_, canon)| canon.to_string())
        .unwrap_or_default();

    // "Tudor" alone is ambiguous between two wings; disambiguate using the
    // room number when the more specific aliases didn't already match.
    if building == "Tudor" && !room.is_empty() {
        if let Ok(n) = room.trim_end_matches(|c: char| c.is_alphabetic()).parse::<u32>() {
            building = if n < 200 { "Tudor A".to_string() } else { "Tudor B".to_string() };
        }
    }

    ParsedLocation { room, building }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_title_extracts_professor_and_strips_it_from_subject() {
        let p = parse_title("Algebra Liniara - Prof. Ion Popescu");
        assert_eq!(p.professor, "Ion Popescu");
        assert!(!p.subject.to_lowercase().contains("popescu"));
    }

    #[test]
    fn parse_title_extracts_year_and_group() {
        let p = parse_title("Structuri de date, Anul 2, Grupa A");
        assert_eq!(p.group_display, "Year 2 • Group A");
    }

    #[test]
    fn parse_title_extracts_compact_group_token() {
        let p = parse_title("Retele 3A Curs");
        assert_eq!(p.group_display, "Year 3 • Group A");
    }

    #[test]
    fn parse_title_display_title_is_first_clause() {
        let p = parse_title("Algebra Liniara - curs, sala 101");
        assert_eq!(p.display_title, "Algebra Liniara");
    }

    #[test]
    fn parse_title_is_total_on_plain_text() {
        let p = parse_title("Consultatii");
        assert_eq!(p.subject, "Consultatii");
        assert_eq!(p.professor, "");
        assert_eq!(p.group_display, "");
    }

    #[test]
    fn parse_title_is_idempotent_on_display_title() {
        let once = parse_title("Algebra Liniara - Prof. Ion Popescu, Anul 1");
        let twice = parse_title(&once.display_title);
        assert_eq!(twice, parse_title(&twice.display_title));
        assert_eq!(once.display_title, twice.display_title);
    }

    #[test]
    fn parse_location_extracts_explicit_room() {
        let l = parse_location("Sala 204, Corp A");
        assert_eq!(l.room, "204");
        assert_eq!(l.building, "A");
    }

    #[test]
    fn parse_location_falls_back_to_trailing_number() {
        let l = parse_location("Amfiteatrul 305");
        assert_eq!(l.room, "305");
    }

    #[test]
    fn parse_location_disambiguates_ambiguous_building_by_room() {
        let low = parse_location("Sala 120, Tudor");
        let high = parse_location("Sala 320, Tudor");
        assert_eq!(low.building, "Tudor A");
        assert_eq!(high.building, "Tudor B");
    }

    #[test]
    fn parse_location_is_total_on_unrecognized_text() {
        let l = parse_location("");
        assert_eq!(l.room, "");
        assert_eq!(l.building, "");
    }
}
