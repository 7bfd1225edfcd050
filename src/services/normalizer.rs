//! OCR text cleanup for math problems.
//!
//! Stages run in a fixed order, each one `&str -> String`:
//!
//! 1. lowercase, except LaTeX commands (`\Delta` stays as written)
//! 2. whole-word vocabulary corrections
//! 3. structural rewrites ([`structural_rules`], ordered)
//! 4. character substitution from the [`SymbolTable`], then the digit/letter
//!    adjacency rules again ([`post_substitution_rules`]) for pairs the
//!    substitution created (`½x`, `２x`)
//! 5. spacing: collapse whitespace, space binary operators, tighten brackets and punctuation
//!
//! Operator spacing runs last so nothing after it can undo it; its output is a
//! fixed point of [`normalize_spacing`], and `normalize` is stable on its own output.

use lazy_regex::regex;
use regex::{Captures, Regex};

use crate::services::symbols::{SymbolCorrector, SymbolTable};

/// How a rule rewrites a match.
#[derive(Clone, Copy)]
pub enum Replacement {
    /// `regex` replacement template (`$1`, `${name}` ...)
    Template(&'static str),
    With(fn(&Captures) -> String),
}

/// One named `(pattern, replacement)` step of the rewrite pipeline.
#[derive(Clone, Copy)]
pub struct RewriteRule {
    pub name: &'static str,
    pattern: &'static Regex,
    replacement: Replacement,
    /// Re-apply until the text stops changing (for patterns whose matches overlap).
    until_stable: bool,
}

impl RewriteRule {
    pub fn apply(&self, text: &str) -> String {
        let mut current = self.apply_once(text);
        if self.until_stable {
            // every pass shrinks or rewrites a finite set of matches; cap it anyway
            for _ in 0..8 {
                let next = self.apply_once(&current);
                if next == current {
                    break;
                }
                current = next;
            }
        }
        current
    }

    fn apply_once(&self, text: &str) -> String {
        match self.replacement {
            Replacement::Template(template) => self.pattern.replace_all(text, template).into_owned(),
            Replacement::With(f) => self.pattern.replace_all(text, f).into_owned(),
        }
    }
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Stage 3 rules, in application order.
pub fn structural_rules() -> Vec<RewriteRule> {
    vec![
        // "1o5" -> "105", "2l0" -> "210": letters trapped between digits are digits
        RewriteRule {
            name: "digit-embedded-zero",
            pattern: regex!(r"(\d)o(\d)"),
            replacement: Replacement::Template("${1}0${2}"),
            until_stable: true,
        },
        RewriteRule {
            name: "digit-embedded-one",
            pattern: regex!(r"(\d)[il|](\d)"),
            replacement: Replacement::Template("${1}1${2}"),
            until_stable: true,
        },
        implicit_multiplication(),
        letter_digit_space(),
        RewriteRule {
            name: "arrow",
            pattern: regex!(r"[-=]{1,2}>"),
            replacement: Replacement::Template("→"),
            until_stable: false,
        },
        // "x = ___" -> "x = \square"
        RewriteRule {
            name: "blank-placeholder",
            pattern: regex!(r"=\s*_+"),
            replacement: Replacement::Template("= \\square"),
            until_stable: false,
        },
    ]
}

/// Re-run after character substitution.
pub fn post_substitution_rules() -> Vec<RewriteRule> {
    vec![implicit_multiplication(), letter_digit_space()]
}

// "2x" -> "2*x"
fn implicit_multiplication() -> RewriteRule {
    RewriteRule {
        name: "implicit-multiplication",
        pattern: regex!(r"(\d)([a-zăâîșțş])"),
        replacement: Replacement::Template("${1}*${2}"),
        until_stable: false,
    }
}

// "x2" -> "x 2", leaving LaTeX commands such as \sqrt2 alone
fn letter_digit_space() -> RewriteRule {
    RewriteRule {
        name: "letter-digit-space",
        pattern: regex!(r"(\\[a-zA-Z]+)|([a-zăâîșțş])(\d)"),
        replacement: Replacement::With(split_letter_digit),
        until_stable: false,
    }
}

fn split_letter_digit(caps: &Captures) -> String {
    if let Some(command) = caps.get(1) {
        return command.as_str().to_string();
    }
    format!("{} {}", &caps[2], &caps[3])
}

/// Turns raw OCR text into a canonical expression string. Never fails.
pub struct MathTextNormalizer<'a> {
    corrector: SymbolCorrector<'a>,
    rules: Vec<RewriteRule>,
    post_rules: Vec<RewriteRule>,
}

impl<'a> MathTextNormalizer<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            corrector: SymbolCorrector::new(table),
            rules: structural_rules(),
            post_rules: post_substitution_rules(),
        }
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn normalize(&self, raw_text: &str) -> String {
        if raw_text.trim().is_empty() {
            return String::new();
        }

        let text = lowercase_outside_commands(raw_text);
        let text = self.corrector.correct_words(&text);
        let text = self.apply_structural(&text);
        let text = self.corrector.substitute_chars(&text);
        let text = apply_rules(&self.post_rules, &text);
        normalize_spacing(&text)
    }

    pub fn apply_structural(&self, text: &str) -> String {
        apply_rules(&self.rules, text)
    }
}

fn apply_rules(rules: &[RewriteRule], text: &str) -> String {
    rules.iter().fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

fn lowercase_outside_commands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for command in regex!(r"\\[A-Za-z]+").find_iter(text) {
        out.push_str(&text[last..command.start()].to_lowercase());
        out.push_str(command.as_str());
        last = command.end();
    }
    out.push_str(&text[last..].to_lowercase());
    out
}

/// Stage 5. Idempotent: `normalize_spacing(normalize_spacing(x)) == normalize_spacing(x)`.
pub fn normalize_spacing(text: &str) -> String {
    let collapsed = regex!(r"\s+").replace_all(text.trim(), " ");
    let spaced = space_operators(&collapsed);
    let spaced = regex!(r"([(\[])\s+").replace_all(&spaced, "$1");
    let spaced = regex!(r"\s+([)\],.])").replace_all(&spaced, "$1");
    regex!(r" {2,}").replace_all(spaced.trim(), " ").into_owned()
}

fn space_operators(text: &str) -> String {
    let operators: &Regex = regex!(
        r"\s*(<=|>=|!=|~=|\\leq|\\geq|\\neq|\\approx|\\times|\\div|\\cdot|\\pm|→|=|<|>|\*|/|\+|-)\s*"
    );
    operators
        .replace_all(text, |caps: &Captures| {
            let op = &caps[1];
            let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
            if &caps[0] == "-" && is_word_hyphen(&text[..start], &text[end..]) {
                return op.to_string();
            }
            if (op == "-" || op == "+") && is_unary(&text[..start]) {
                // keep the space we swallowed on the left, attach the sign to its operand
                return if caps[0].starts_with(char::is_whitespace) {
                    format!(" {}", op)
                } else {
                    op.to_string()
                };
            }
            format!(" {} ", op)
        })
        .into_owned()
}

/// A sign is unary when nothing, an operator, or an opening bracket precedes it.
fn is_unary(before: &str) -> bool {
    let before = before.trim_end();
    if regex!(r"\\(?:leq|geq|neq|approx|times|div|cdot|pm|mp|le|ge|in|to)$").is_match(before) {
        return true;
    }
    match before.chars().next_back() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || matches!(c, ')' | ']' | '}' | '!' | '\'')),
    }
}

/// `într-un`, `dintr-o`, `n-are`: an unspaced hyphen joining letters where one
/// side is a word of three or more letters. `a-b` and `ax-by` stay subtraction.
fn is_word_hyphen(before: &str, after: &str) -> bool {
    let left_start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .last()
        .map(|(i, _)| i);
    let Some(left_start) = left_start else {
        return false;
    };
    if before[..left_start].ends_with('\\') {
        return false;
    }
    let left = before[left_start..].chars().count();
    let right = after.chars().take_while(|c| c.is_alphabetic()).count();
    right > 0 && (left >= 3 || right >= 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        let table = SymbolTable::romanian_math();
        MathTextNormalizer::new(&table).normalize(text)
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t"), "");
    }

    #[test]
    fn inserts_implicit_multiplication_and_spaces_operators() {
        assert_eq!(normalize("2x+3=7"), "2 * x + 3 = 7");
    }

    #[test]
    fn splits_letter_followed_by_digit() {
        assert_eq!(normalize("x2+y"), "x 2 + y");
    }

    #[test]
    fn converts_glyphs_to_markup() {
        assert_eq!(normalize("6÷2≤x"), "6 \\div 2 \\leq x");
        assert_eq!(normalize("A = π·r²"), "a = \\pi \\cdot r^2");
    }

    #[test]
    fn fixes_letters_trapped_between_digits() {
        assert_eq!(normalize("1o5 + 2l0"), "105 + 210");
        assert_eq!(normalize("1o0o5"), "10005");
    }

    #[test]
    fn normalizes_arrows_and_blanks() {
        assert_eq!(normalize("x=2 => y=__"), "x = 2 → y = \\square");
        assert_eq!(normalize("a-->b"), "a → b");
    }

    #[test]
    fn keeps_unary_minus_attached() {
        assert_eq!(normalize("x=-3"), "x = -3");
        assert_eq!(normalize("-x+1"), "-x + 1");
        assert_eq!(normalize("( -2 )*3"), "(-2) * 3");
        assert_eq!(normalize("5--2"), "5 - -2");
        assert_eq!(normalize("x≥-2"), "x \\geq -2");
        assert_eq!(normalize("3×-2"), "3 \\times -2");
        assert_eq!(normalize("y=±-1"), "y = \\pm -1");
        assert_eq!(normalize("\\pi-2"), "\\pi - 2");
    }

    #[test]
    fn keeps_romanian_hyphenated_words() {
        assert_eq!(normalize("Într-un triunghi, x-y=2"), "într-un triunghi, x - y = 2");
        assert_eq!(normalize("dintr-o mulțime"), "dintr-o mulțime");
        assert_eq!(normalize("ax-by"), "ax - by");
    }

    #[test]
    fn latex_commands_keep_their_case() {
        assert_eq!(normalize("∆=b²-4ac"), "\\Delta = b^2 - 4 * ac");
        assert_eq!(normalize("\\Delta>0"), "\\Delta > 0");
    }

    #[test]
    fn substituted_digits_get_implicit_multiplication() {
        assert_eq!(normalize("½x"), "1 / 2 * x");
        assert_eq!(normalize("３x²"), "3 * x^2");
    }

    #[test]
    fn tightens_brackets_and_punctuation() {
        assert_eq!(normalize("f( x ) , g ( y ) ."), "f(x), g (y).");
    }

    #[test]
    fn word_corrections_survive_later_stages() {
        // without the word layer, "calcu1ați" would be split by the letter-digit rule
        assert_eq!(normalize("Calcu1ati 2x"), "calculați 2 * x");
        assert_eq!(normalize("Rezo1vati ecuatia: x2=4"), "rezolvați ecuația: x 2 = 4");
    }

    #[test]
    fn leaves_latex_commands_intact() {
        assert_eq!(normalize("√2"), "\\sqrt2");
        assert_eq!(normalize("3√2"), "3\\sqrt2");
    }

    #[test]
    fn output_has_no_confusable_glyphs() {
        let table = SymbolTable::romanian_math();
        let normalizer = MathTextNormalizer::new(&table);
        let noisy = "Ｘ×２ − ５ ≥ ο, ş ţ ã ∞ ÷ ½ ⇒ б ց ƽ ӏ";

        let out = normalizer.normalize(noisy);
        assert!(!out.chars().any(|c| table.is_confusable(c)), "{}", out);
    }

    #[test]
    fn spacing_stage_is_a_fixed_point() {
        let samples = [
            "2x+3=7",
            "x=-3 , y>=2",
            "( a+b )*( a-b )=a²-b²",
            "1. calculati 3·4÷2",
            "5--2",
            "∆=b²-4ac",
            "½x",
            "x≥-2",
            "într-un pătrat",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize_spacing(&once), once);
            assert_eq!(normalize(&once), once, "normalize is not stable on {:?}", sample);
        }
    }

    #[test]
    fn rules_are_listed_in_pipeline_order() {
        let names: Vec<_> = structural_rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "digit-embedded-zero",
                "digit-embedded-one",
                "implicit-multiplication",
                "letter-digit-space",
                "arrow",
                "blank-placeholder",
            ]
        );
    }
}
