use lazy_regex::regex;

/// Best-effort display form for a cleaned problem statement.
///
/// A leading `N.` becomes a bold label. When the rest holds two or more
/// equation-like segments they are pulled out of the prose into one display
/// block, separated by `\quad`. Anything it cannot make sense of comes back as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexFormatter;

impl LatexFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_display_form(&self, cleaned_text: &str) -> String {
        let text = cleaned_text.trim();
        if text.is_empty() {
            return cleaned_text.to_string();
        }

        let (label, rest) = match regex!(r"(?s)^(\d+)\.(?:\s+(.*))?$").captures(text) {
            Some(caps) => (
                Some(caps[1].to_string()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => (None, text),
        };

        let starts = equation_starts(rest);
        if label.is_none() && starts.len() < 2 {
            return cleaned_text.to_string();
        }

        let mut out = String::new();
        if let Some(number) = label {
            out.push_str(&format!("\\textbf{{{}.}}", number));
        }

        if starts.len() < 2 {
            push_part(&mut out, rest);
            return out;
        }

        push_part(&mut out, rest[..starts[0]].trim());

        let mut segments = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(rest.len());
            let segment = trim_connectors(&rest[start..end]);
            if !segment.is_empty() {
                segments.push(segment);
            }
        }
        push_part(&mut out, &format!("$${}$$", segments.join(" \\quad ")));
        out
    }
}

fn push_part(out: &mut String, part: &str) {
    if part.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(part);
}

/// Byte offsets where equation-like segments begin.
fn equation_starts(text: &str) -> Vec<usize> {
    let boundary = regex!(r"\b(?:[a-z]\s*=|\d+(?:\.\d+)?\s*(?:\*|/|:|\\times|\\div|\\cdot))");

    let mut starts: Vec<usize> = Vec::new();
    for m in boundary.find_iter(text) {
        let floor = starts.last().copied().unwrap_or(0);
        let start = extend_left(text, m.start(), floor);
        if let Some(&previous) = starts.last() {
            if start <= previous || !is_complete(&text[previous..start]) {
                continue;
            }
        }
        starts.push(start);
    }
    starts
}

/// Pull a boundary back over the operands that belong to it ("x + y = 5"
/// starts at the x, not at the y), stopping at prose words and punctuation.
fn extend_left(text: &str, pos: usize, floor: usize) -> usize {
    let mut cursor = pos;
    loop {
        let before = text[floor..cursor].trim_end();
        if before.is_empty() {
            break;
        }
        let token_start = before.rfind(' ').map_or(0, |i| i + 1);
        if !is_math_token(&before[token_start..]) {
            break;
        }
        cursor = floor + token_start;
    }
    cursor
}

fn is_math_token(token: &str) -> bool {
    if token.starts_with('\\') {
        return true;
    }
    let mut letters_in_row = 0;
    for c in token.chars() {
        if c.is_alphabetic() {
            letters_in_row += 1;
            if letters_in_row > 1 {
                return false;
            }
        } else {
            letters_in_row = 0;
            if !(c.is_ascii_digit() || "+-*/^().".contains(c)) {
                return false;
            }
        }
    }
    true
}

/// A segment may close once it holds a relation or a finished operation.
fn is_complete(segment: &str) -> bool {
    ["=", "<", ">", "\\leq", "\\geq", "\\neq", "\\approx"]
        .iter()
        .any(|rel| segment.contains(rel))
        || regex!(r"\d\s*(?:\*|/|:|\\times|\\div|\\cdot)\s*[\w\\(]").is_match(segment)
}

fn trim_connectors(segment: &str) -> String {
    let mut s = segment.trim().trim_end_matches([',', ';']).trim_end();
    for connector in [" și", " si", " and"] {
        if let Some(stripped) = s.strip_suffix(connector) {
            s = stripped.trim_end().trim_end_matches([',', ';']).trim_end();
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(text: &str) -> String {
        LatexFormatter::new().to_display_form(text)
    }

    #[test]
    fn groups_a_system_into_one_display_block() {
        assert_eq!(
            display("1. rezolvați sistemul: x + y = 5, x - y = 1"),
            "\\textbf{1.} rezolvați sistemul: $$x + y = 5 \\quad x - y = 1$$"
        );
    }

    #[test]
    fn groups_arithmetic_operations() {
        assert_eq!(
            display("calculați 12 : 4 și 3 * 5"),
            "calculați $$12 : 4 \\quad 3 * 5$$"
        );
    }

    #[test]
    fn single_equation_is_returned_unchanged() {
        assert_eq!(display("2 * x + 3 = 7"), "2 * x + 3 = 7");
        assert_eq!(display("aflați x dacă 2 * x = 4"), "aflați x dacă 2 * x = 4");
    }

    #[test]
    fn labels_numbered_statements() {
        assert_eq!(display("3. 2.5 * x = 5"), "\\textbf{3.} 2.5 * x = 5");
        assert_eq!(display("7."), "\\textbf{7.}");
    }

    #[test]
    fn decimal_prefix_is_not_a_label() {
        assert_eq!(display("2.5 * x = 5"), "2.5 * x = 5");
    }

    #[test]
    fn unparseable_input_passes_through() {
        assert_eq!(display(""), "");
        assert_eq!(display("!!! ???"), "!!! ???");
        assert_eq!(display("= = ="), "= = =");
    }
}
