//! Shell-style wildcards for the last component of a listed path.

use regex::Regex;

/// True when `component` contains a wildcard character.
pub fn is_glob(component: &str) -> bool {
    component.contains(['*', '?', '[', ']'])
}

/// Split `path` into the directory to list and the wildcard to filter by.
/// Returns `None` when the last component has no wildcard.
pub fn split_pattern(path: &str) -> Option<(&str, &str)> {
    let (dir, base) = match path.rsplit_once('/') {
        Some((dir, base)) => (dir, base),
        None => ("", path),
    };
    if !is_glob(base) {
        return None;
    }
    Some((if dir.is_empty() { "/" } else { dir }, base))
}

/// Compile a wildcard into an anchored regex.
///
/// `*` matches any run, `?` one character, `[...]` a class (`[!...]`
/// negates). An unterminated `[` is literal.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&class(&chars[i + 1..end]));
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }
    out.push('$');
    Regex::new(&out)
}

/// Index of the `]` closing the class opened at `start`. A `]` right after
/// the opening (or after `!`) belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

fn class(body: &[char]) -> String {
    let (negate, body) = match body.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, body),
    };
    let mut out = String::from(if negate { "[^" } else { "[" });
    for &c in body {
        match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(']');
    out
}
