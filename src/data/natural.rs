//! Natural Ordering Module
//! Orders names the way a person reads them: "2hr" before "10hr".

use std::cmp::Ordering;

/// A run of either digits or non-digits.
#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Number(s)
    } else {
        Chunk::Text(s)
    }
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        if let Some(prev) = in_digits {
            if prev != is_digit {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

/// Compare two digit runs by numeric value without parsing (no overflow).
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        // "007" after "7" so that distinct strings never compare equal
        .then_with(|| a.len().cmp(&b.len()))
}

/// Natural comparison of two strings.
///
/// Digit runs compare by value, text runs compare ordinally, and a number
/// sorts before text at the same position.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ca = chunks(a);
    let cb = chunks(b);

    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Number(x), Chunk::Number(y)) => compare_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len())
}

/// Sort a list of names in natural order.
pub fn natsort(items: &mut [String]) {
    items.sort_by(|a, b| natural_cmp(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_sort_by_hour_value() {
        let mut v: Vec<String> = ["24hr", "0hr", "10hr", "2hr", "48hr"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        natsort(&mut v);
        assert_eq!(v, vec!["0hr", "2hr", "10hr", "24hr", "48hr"]);
    }

    #[test]
    fn device_names_sort_by_trailing_number() {
        let mut v: Vec<String> = ["Device10", "Control", "Device2", "Device1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        natsort(&mut v);
        assert_eq!(v, vec!["Control", "Device1", "Device2", "Device10"]);
    }

    #[test]
    fn leading_zeros_are_ordered_but_not_equal() {
        assert_eq!(natural_cmp("7", "007"), Ordering::Less);
        assert_eq!(natural_cmp("008", "7"), Ordering::Greater);
        assert_eq!(natural_cmp("a7", "a7"), Ordering::Equal);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("abc", "abc1"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        assert_eq!(
            natural_cmp("x99999999999999999999999", "x100000000000000000000000"),
            Ordering::Less
        );
    }
}
