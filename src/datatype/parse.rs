//! Reverse direction: strip decorations from a display type.
//!
//! This is text surgery, not a grammar. It is lossy and only aims at
//! recovering a name that can be matched against the selectable types.

use regex::Regex;
use std::sync::LazyLock;

static TIME_PRECISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\(\d+\))").expect("valid regex"));
static LENGTH_AND_PRECISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+),(\d+)").expect("valid regex"));
static LENGTH_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("valid regex"));

/// Type name without length or precision.
///
/// `bit(1)` becomes `bit`, `timestamp(3) with time zone` becomes
/// `timestamp with time zone`, any `interval ...` becomes `interval`.
/// A trailing array suffix survives as a single `[]`.
///
/// An opening parenthesis at position 0 counts as "no parenthesis", and a
/// name ending in `)` without any `(` loses that last character.
pub fn parse_type_name(type_name: &str) -> String {
    let mut is_array = false;
    let mut name = type_name;
    if name.ends_with("[]") {
        is_array = true;
        name = name.trim_end_matches(['[', ']']);
    }

    let open = name.find('(');
    let has_open = open != Some(0);

    let mut parsed = if has_open && name.ends_with(')') {
        let cut = open.unwrap_or(name.len() - 1);
        name[..cut].to_string()
    } else if has_open && name.starts_with("time") {
        if name.find(')') != Some(1) {
            TIME_PRECISION.replace_all(name, "").into_owned()
        } else {
            name.to_string()
        }
    } else if name.starts_with("interval") {
        "interval".to_string()
    } else {
        name.to_string()
    };

    if is_array {
        parsed.push_str("[]");
    }
    parsed
}

/// Length and precision digits of a display type.
///
/// Returns `(None, None)` when `is_tlength` is false or nothing matches.
/// With `is_precision` both numbers must be present as `len,prec`. Digits
/// that do not fit an `i64` count as no match, so the result is never half
/// filled.
pub fn parse_length_precision(
    fulltype: &str,
    is_tlength: bool,
    is_precision: bool,
) -> (Option<i64>, Option<i64>) {
    if !is_tlength {
        return (None, None);
    }

    if is_precision {
        let Some(caps) = LENGTH_AND_PRECISION.captures(fulltype) else {
            return (None, None);
        };
        match (caps[1].parse::<i64>(), caps[2].parse::<i64>()) {
            (Ok(length), Ok(precision)) => (Some(length), Some(precision)),
            _ => (None, None),
        }
    } else {
        match LENGTH_ONLY.captures(fulltype) {
            Some(caps) => (caps[1].parse().ok(), None),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_lengths() {
        assert_eq!(parse_type_name("bit(1)"), "bit");
        assert_eq!(parse_type_name("character varying(50)"), "character varying");
        assert_eq!(parse_type_name("numeric(10,2)"), "numeric");
        assert_eq!(parse_type_name("integer"), "integer");
    }

    #[test]
    fn test_parse_array_suffix() {
        assert_eq!(parse_type_name("character varying(50)[]"), "character varying[]");
        assert_eq!(parse_type_name("integer[][]"), "integer[]");
    }

    #[test]
    fn test_parse_time_precision_inside() {
        assert_eq!(
            parse_type_name("timestamp(3) with time zone"),
            "timestamp with time zone"
        );
        assert_eq!(
            parse_type_name("time(6) without time zone[]"),
            "time without time zone[]"
        );
        assert_eq!(parse_type_name("timestamp(3)"), "timestamp");
    }

    #[test]
    fn test_parse_interval_variants() {
        assert_eq!(parse_type_name("interval day to second"), "interval");
        assert_eq!(parse_type_name("interval(3)"), "interval");
        assert_eq!(parse_type_name("interval[]"), "interval[]");
    }

    #[test]
    fn test_parse_leading_paren_left_alone() {
        assert_eq!(parse_type_name("(foo)"), "(foo)");
    }

    #[test]
    fn test_parse_close_without_open() {
        assert_eq!(parse_type_name("foo)"), "foo");
    }

    #[test]
    fn test_length_precision() {
        assert_eq!(
            parse_length_precision("numeric(10,2)", true, true),
            (Some(10), Some(2))
        );
        assert_eq!(
            parse_length_precision("character varying(50)", true, false),
            (Some(50), None)
        );
        assert_eq!(parse_length_precision("numeric(10)", true, true), (None, None));
        assert_eq!(parse_length_precision("text", true, false), (None, None));
        assert_eq!(parse_length_precision("numeric(10,2)", false, true), (None, None));
    }

    #[test]
    fn test_length_precision_overflow_is_no_match() {
        assert_eq!(
            parse_length_precision("numeric(99999999999999999999,2)", true, true),
            (None, None)
        );
        assert_eq!(
            parse_length_precision("numeric(10,99999999999999999999)", true, true),
            (None, None)
        );
        assert_eq!(
            parse_length_precision("character varying(99999999999999999999)", true, false),
            (None, None)
        );
        assert_eq!(
            parse_length_precision("numeric(9223372036854775807,0)", true, true),
            (Some(i64::MAX), Some(0))
        );
    }
}
