//! Lookup tables for OCR glyph confusions and Romanian math vocabulary.
//!
//! The table is plain immutable data: build it once at startup and hand out
//! references. [`SymbolCorrector`] applies the word layer before the character
//! layer, always in that order, because character substitution is lossy.

use lazy_regex::regex;
use regex::Regex;
use std::collections::HashMap;

/// Whole-word correction for a known vocabulary term.
#[derive(Debug, Clone)]
pub struct WordCorrection {
    pub pattern: &'static Regex,
    pub replacement: &'static str,
}

/// Character and word substitution tables.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    chars: HashMap<char, &'static str>,
    words: Vec<WordCorrection>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::romanian_math()
    }
}

impl SymbolTable {
    /// Tables tuned for Romanian school-math worksheets.
    ///
    /// Keys are lowercase (input is lowercased before lookup) and no replacement
    /// contains a key, so one substitution pass is enough.
    pub fn romanian_math() -> Self {
        let pairs: &[(char, &'static str)] = &[
            // operators
            ('×', "\\times"),
            ('✕', "\\times"),
            ('·', "\\cdot"),
            ('∙', "\\cdot"),
            ('⋅', "\\cdot"),
            ('÷', "\\div"),
            ('−', "-"),
            ('–', "-"),
            ('‒', "-"),
            ('—', "-"),
            ('＋', "+"),
            ('＝', "="),
            ('≤', "\\leq"),
            ('⩽', "\\leq"),
            ('≥', "\\geq"),
            ('⩾', "\\geq"),
            ('≠', "\\neq"),
            ('≈', "\\approx"),
            ('±', "\\pm"),
            ('√', "\\sqrt"),
            ('∛', "\\sqrt[3]"),
            ('π', "\\pi"),
            ('∞', "\\infty"),
            ('∈', "\\in"),
            ('∆', "\\Delta"),
            // 'Δ' arrives lowercased
            ('δ', "\\Delta"),
            ('°', "^\\circ"),
            ('²', "^2"),
            ('³', "^3"),
            ('½', "1/2"),
            ('¼', "1/4"),
            ('¾', "3/4"),
            ('⇒', "→"),
            ('⟶', "→"),
            ('⟹', "→"),
            // digit lookalikes
            ('ο', "0"),
            ('о', "0"),
            ('ӏ', "1"),
            ('ǀ', "1"),
            ('ƨ', "2"),
            ('ƽ', "5"),
            ('б', "6"),
            ('ց', "9"),
            ('０', "0"),
            ('１', "1"),
            ('２', "2"),
            ('３', "3"),
            ('４', "4"),
            ('５', "5"),
            ('６', "6"),
            ('７', "7"),
            ('８', "8"),
            ('９', "9"),
            // Romanian diacritics: cedilla forms and the common ã misread
            ('ş', "ș"),
            ('ţ', "ț"),
            ('ã', "ă"),
        ];

        let words = vec![
            WordCorrection { pattern: regex!(r"(?i)\bcalcu[l1|]a[tțţ][i1l]\b"), replacement: "calculați" },
            WordCorrection { pattern: regex!(r"(?i)\brez[o0][l1|]va[tțţ][i1l]\b"), replacement: "rezolvați" },
            WordCorrection { pattern: regex!(r"(?i)\baf[l1|]a[tțţ][i1l]\b"), replacement: "aflați" },
            WordCorrection { pattern: regex!(r"(?i)\bdeterm[i1l]na[tțţ][i1l]\b"), replacement: "determinați" },
            WordCorrection { pattern: regex!(r"(?i)\bar[aăã]ta[tțţ][i1l]\b"), replacement: "arătați" },
            WordCorrection { pattern: regex!(r"(?i)\bsimp[l1|][i1l]f[i1l]ca[tțţ][i1l]\b"), replacement: "simplificați" },
            WordCorrection { pattern: regex!(r"(?i)\bver[i1l]f[i1l]ca[tțţ][i1l]\b"), replacement: "verificați" },
            WordCorrection { pattern: regex!(r"(?i)\becua[tțţ][i1l][i1l][l1|]e\b"), replacement: "ecuațiile" },
            WordCorrection { pattern: regex!(r"(?i)\becua[tțţ][i1l]a\b"), replacement: "ecuația" },
            WordCorrection { pattern: regex!(r"(?i)\becua[tțţ][i1l]e\b"), replacement: "ecuație" },
            WordCorrection { pattern: regex!(r"(?i)\bso[l1|]u[tțţ][i1l]a\b"), replacement: "soluția" },
            WordCorrection { pattern: regex!(r"(?i)\bfunc[tțţ][i1l]a\b"), replacement: "funcția" },
            WordCorrection { pattern: regex!(r"(?i)\bfrac[tțţ][i1l]a\b"), replacement: "fracția" },
            WordCorrection { pattern: regex!(r"(?i)\br[aăã]d[aăã]c[i1l]n[aăã]\b"), replacement: "rădăcina" },
            WordCorrection { pattern: regex!(r"(?i)\bnum[aăã]ru[l1|]\b"), replacement: "numărul" },
            WordCorrection { pattern: regex!(r"(?i)\bmu[l1|][tțţ][i1l]mea\b"), replacement: "mulțimea" },
            WordCorrection { pattern: regex!(r"(?i)\b[i1l]nega[l1|][i1l]ta[tțţ]ea\b"), replacement: "inegalitatea" },
            WordCorrection { pattern: regex!(r"(?i)\bs[i1l]stemu[l1|]\b"), replacement: "sistemul" },
            WordCorrection { pattern: regex!(r"(?i)\btr[i1l]ungh[i1l]u[l1|]\b"), replacement: "triunghiul" },
            WordCorrection { pattern: regex!(r"(?i)\bper[i1l]metru[l1|]\b"), replacement: "perimetrul" },
        ];

        Self {
            chars: pairs.iter().copied().collect(),
            words,
        }
    }

    pub fn lookup(&self, c: char) -> Option<&'static str> {
        self.chars.get(&c).copied()
    }

    pub fn is_confusable(&self, c: char) -> bool {
        self.chars.contains_key(&c)
    }

    pub fn confusable_glyphs(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.keys().copied()
    }

    pub fn word_corrections(&self) -> &[WordCorrection] {
        &self.words
    }
}

/// Applies a [`SymbolTable`] to text.
#[derive(Debug, Clone, Copy)]
pub struct SymbolCorrector<'a> {
    table: &'a SymbolTable,
}

impl<'a> SymbolCorrector<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// Correct a character or short token: word layer first, then characters.
    /// Unmapped input comes back unchanged.
    pub fn correct(&self, token: &str) -> String {
        let words = self.correct_words(token);
        self.substitute_chars(&words)
    }

    pub fn correct_words(&self, text: &str) -> String {
        let mut out = text.to_string();
        for word in &self.table.words {
            if word.pattern.is_match(&out) {
                out = word.pattern.replace_all(&out, word.replacement).into_owned();
            }
        }
        out
    }

    pub fn substitute_chars(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            let Some(replacement) = self.table.lookup(c) else {
                out.push(c);
                continue;
            };
            out.push_str(replacement);
            // "\pir" would read as one unknown command
            let is_command = replacement.starts_with('\\')
                && replacement.ends_with(|r: char| r.is_ascii_alphabetic());
            if is_command && chars.peek().is_some_and(|next| next.is_alphabetic()) {
                out.push(' ');
            }
        }
        out
    }
}
