pub fn normalize(text: &str) -> String {
    strip_trailing_page_tokens(clean_line(text))
}

/// Quote mapping, backslash stripping, and whitespace collapse; leaves any
/// trailing page token in place.
pub fn clean_line(text: &str) -> String {
    let mapped: String = text
        .chars()
        .filter_map(|character| match character {
            '\u{201C}' | '\u{201D}' | '\u{2033}' => Some('"'),
            '\u{2018}' | '\u{2019}' | '\u{2032}' => Some('\''),
            '\\' => None,
            other => Some(other),
        })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn is_roman_numeral(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }

    let mut rest = token;
    let mut thousands = 0;
    while let Some(next) = rest.strip_prefix('m') {
        rest = next;
        thousands += 1;
        if thousands == 3 {
            break;
        }
    }
    rest = consume_roman_group(rest, "cm", "cd", "d", 'c');
    rest = consume_roman_group(rest, "xc", "xl", "l", 'x');
    rest = consume_roman_group(rest, "ix", "iv", "v", 'i');
    rest.is_empty()
}

pub fn fuzzy_title_match(line: &str, title: &str) -> bool {
    let line_normalized = normalize(line).to_lowercase();
    let title_normalized = normalize(title).to_lowercase();
    if line_normalized.is_empty() || title_normalized.is_empty() {
        return false;
    }

    if line_normalized == title_normalized || line_normalized.starts_with(&title_normalized) {
        return true;
    }

    if title_normalized.chars().count() > 10 {
        for skip in 1..=3 {
            let shifted: String = title_normalized.chars().skip(skip).collect();
            if line_normalized.starts_with(&shifted) {
                return true;
            }
        }
    }

    false
}

fn strip_trailing_page_tokens(mut text: String) -> String {
    loop {
        let Some((head, tail)) = text.rsplit_once(' ') else {
            return text;
        };
        let keep = head.len();
        if is_page_token(tail) {
            text.truncate(keep);
        } else {
            return text;
        }
    }
}

fn is_page_token(token: &str) -> bool {
    let decimal = !token.is_empty()
        && token.len() <= 4
        && token.chars().all(|character| character.is_ascii_digit());
    decimal || is_roman_numeral(token)
}

fn consume_roman_group<'a>(
    text: &'a str,
    nine: &str,
    four: &str,
    five: &str,
    unit: char,
) -> &'a str {
    if let Some(rest) = text.strip_prefix(nine) {
        return rest;
    }
    if let Some(rest) = text.strip_prefix(four) {
        return rest;
    }

    let mut rest = text.strip_prefix(five).unwrap_or(text);
    for _ in 0..3 {
        match rest.strip_prefix(unit) {
            Some(next) => rest = next,
            None => break,
        }
    }
    rest
}
