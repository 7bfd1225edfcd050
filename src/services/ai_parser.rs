use lazy_regex::regex;
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_STEP_TITLE, DEFAULT_TIME_ESTIMATE, ELLIPSIS, EMPTY_RESPONSE_NOTE, FALLBACK_EXCERPT_CHARS,
    FALLBACK_STEP_TITLE, MAX_MODEL_RESPONSE_BYTES, PARSE_ERROR_EXPLANATION, PARSE_ERROR_TITLE,
};
use crate::models::{Difficulty, ParseOutcome, PedagogicalAnalysis, PedagogicalStep};

/// Turns free-form model output into a [`PedagogicalAnalysis`].
///
/// Strict JSON first, then a deterministic line builder. Whatever the model
/// sends back, the caller gets an analysis with at least one step.
#[derive(Debug, Clone)]
pub struct PedagogicalResponseParser {
    excerpt_chars: usize,
    max_input_bytes: usize,
}

impl Default for PedagogicalResponseParser {
    fn default() -> Self {
        Self {
            excerpt_chars: FALLBACK_EXCERPT_CHARS,
            max_input_bytes: MAX_MODEL_RESPONSE_BYTES,
        }
    }
}

impl PedagogicalResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(excerpt_chars: usize, max_input_bytes: usize) -> Self {
        Self {
            excerpt_chars,
            max_input_bytes,
        }
    }

    pub fn parse(&self, raw: &str, problem_text: &str) -> PedagogicalAnalysis {
        self.parse_outcome(raw, problem_text).into_analysis()
    }

    /// Same as [`parse`](Self::parse) but keeps track of which path produced the result.
    pub fn parse_outcome(&self, raw: &str, problem_text: &str) -> ParseOutcome {
        match self.try_parse(raw, problem_text) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("❌ Model response could not be processed: {}", e);
                ParseOutcome::Degraded(error_analysis(problem_text))
            }
        }
    }

    fn try_parse(&self, raw: &str, problem_text: &str) -> anyhow::Result<ParseOutcome> {
        if raw.len() > self.max_input_bytes {
            anyhow::bail!(
                "response is {} bytes, limit is {}",
                raw.len(),
                self.max_input_bytes
            );
        }

        match parse_strict(extract_json_candidate(raw), problem_text) {
            Ok(analysis) => {
                log::info!("✅ Model returned structured analysis with {} steps", analysis.steps.len());
                Ok(ParseOutcome::Valid(analysis))
            }
            Err(e) => {
                log::warn!("⚠️ Structured parse failed, falling back to line parser: {}", e);
                Ok(ParseOutcome::Degraded(self.parse_lines(raw, problem_text)))
            }
        }
    }

    /// Line-oriented fallback: enumerated lines open steps, other lines extend
    /// the open step's explanation.
    fn parse_lines(&self, raw: &str, problem_text: &str) -> PedagogicalAnalysis {
        let mut steps: Vec<StepBuilder> = Vec::new();
        let mut final_answer = None;

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("```") {
                continue;
            }

            if let Some(caps) =
                regex!(r"(?i)^(?:[-*•]\s+)?\**răspuns(?:ul)?\s+final\**\s*:\s*\**(.*?)\**$").captures(line)
            {
                let answer = caps[1].trim();
                if !answer.is_empty() {
                    final_answer = Some(answer.to_string());
                }
                continue;
            }

            if let Some(heading) = strip_enumerator(line) {
                steps.push(StepBuilder::from_heading(heading, steps.len() + 1));
                continue;
            }

            // text before the first enumerated line is preamble
            if let Some(step) = steps.last_mut() {
                step.push_line(line);
            }
        }

        let steps = if steps.is_empty() {
            vec![PedagogicalStep::new(FALLBACK_STEP_TITLE, self.excerpt(raw))]
        } else {
            steps.into_iter().map(StepBuilder::finish).collect()
        };

        PedagogicalAnalysis {
            final_answer,
            ..PedagogicalAnalysis::bare(problem_text, steps)
        }
    }

    fn excerpt(&self, raw: &str) -> String {
        let text = raw.trim();
        if text.is_empty() {
            return EMPTY_RESPONSE_NOTE.to_string();
        }
        if text.chars().count() <= self.excerpt_chars {
            return text.to_string();
        }
        let mut out: String = text.chars().take(self.excerpt_chars).collect();
        out.push_str(ELLIPSIS);
        out
    }
}

/// Convenience wrapper with the default limits.
pub fn parse_model_response(raw: &str, problem_text: &str) -> PedagogicalAnalysis {
    PedagogicalResponseParser::new().parse(raw, problem_text)
}

/// The slice of `raw` most likely to hold the JSON object: a fenced block if
/// there is one, otherwise the outermost braces, otherwise the trimmed text.
pub fn extract_json_candidate(raw: &str) -> &str {
    if let Some(caps) = regex!(r"(?s)```(?:json|JSON)?\s*(.*?)```").captures(raw) {
        if let Some(inner) = caps.get(1) {
            let inner = inner.as_str().trim();
            if inner.starts_with('{') {
                return inner;
            }
        }
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return &raw[start..=end];
        }
    }

    raw.trim()
}

fn parse_strict(candidate: &str, problem_text: &str) -> anyhow::Result<PedagogicalAnalysis> {
    let value: Value = serde_json::from_str(candidate)?;
    let object = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("top-level value is not an object"))?;

    let steps = object
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("missing steps array"))?;
    if steps.is_empty() {
        anyhow::bail!("steps array is empty");
    }

    let key_concepts = field(object, &["keyConcepts", "key_concepts"])
        .map(text_list)
        .unwrap_or_default();

    let difficulty = field(object, &["difficulty"])
        .and_then(Value::as_str)
        .and_then(Difficulty::from_label)
        .unwrap_or_default();

    let time_estimate = field(object, &["timeEstimate", "time_estimate"])
        .and_then(as_text)
        .unwrap_or_else(|| DEFAULT_TIME_ESTIMATE.to_string());

    Ok(PedagogicalAnalysis {
        problem_text: problem_text.to_string(),
        steps: steps.iter().map(coerce_step).collect(),
        final_answer: field(object, &["finalAnswer", "final_answer"]).and_then(as_text),
        key_concepts: Some(key_concepts),
        difficulty: Some(difficulty),
        time_estimate: Some(time_estimate),
        caveats: field(object, &["caveats"]).map(text_list),
    })
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| object.get(*k))
        .find(|v| !v.is_null())
}

/// Text from a string, number or bool. Strings pass through untouched; blank ones count as missing.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(other).into_iter().collect(),
    }
}

fn coerce_step(value: &Value) -> PedagogicalStep {
    match value {
        Value::Object(step) => {
            let title = field(step, &["title", "description", "name"])
                .and_then(as_text)
                .unwrap_or_else(|| DEFAULT_STEP_TITLE.to_string());
            let explanation = field(step, &["explanation", "details", "content"])
                .and_then(as_text)
                .unwrap_or_default();
            PedagogicalStep::new(title, explanation)
        }
        other => PedagogicalStep::new(
            as_text(other).unwrap_or_else(|| DEFAULT_STEP_TITLE.to_string()),
            "",
        ),
    }
}

/// Heading text of an enumerated line (`1.`, `2)`, `-`, `•`, `Pas 3:`), or `None`.
///
/// A number enumerator may touch its heading (`1.Find X`), but not a digit:
/// `3.5` and `12 : 4` stay prose.
fn strip_enumerator(line: &str) -> Option<&str> {
    if let Some(caps) = regex!(r"^\d{1,3}\s*([.):\]])(.*)$").captures(line) {
        let rest = caps.get(2).map_or("", |m| m.as_str());
        let next = if &caps[1] == ":" { rest.trim_start() } else { rest };
        if !next.starts_with(|c: char| c.is_ascii_digit()) {
            return Some(rest.trim_start());
        }
        return None;
    }
    if let Some(caps) = regex!(r"^[-*•–](?:\s+|$)(.*)$").captures(line) {
        return caps.get(1).map(|m| m.as_str());
    }
    if regex!(r"(?i)^\**pas(?:ul)?\s*\d+\b").is_match(line) {
        return Some(line);
    }
    None
}

fn error_analysis(problem_text: &str) -> PedagogicalAnalysis {
    PedagogicalAnalysis::bare(
        problem_text,
        vec![PedagogicalStep::new(PARSE_ERROR_TITLE, PARSE_ERROR_EXPLANATION)],
    )
}

#[derive(Debug)]
struct StepBuilder {
    title: String,
    lines: Vec<String>,
}

impl StepBuilder {
    /// `number` names the step when the heading itself is empty.
    fn from_heading(heading: &str, number: usize) -> Self {
        let heading = heading.replace("**", "");
        let heading = heading.trim();

        let mut title = heading.to_string();
        let mut lines = Vec::new();

        // "Pas 2: Izolează x — împarte ambii membri la 2"
        if let Some(caps) =
            regex!(r"(?i)^pas(?:ul)?(?:\s*(\d+)\s*[:.)]?|\s*[:.)])\s*(.*)$").captures(heading)
        {
            let body = caps[2].trim();
            match split_title(body) {
                Some((t, e)) => {
                    title = t.to_string();
                    lines.push(e.to_string());
                }
                None if body.is_empty() => {
                    let label = caps.get(1).map_or_else(|| number.to_string(), |m| m.as_str().to_string());
                    title = format!("Pas {}", label);
                }
                None => title = body.to_string(),
            }
        }

        if title.is_empty() {
            title = format!("Pas {}", number);
        }
        Self { title, lines }
    }

    fn push_line(&mut self, line: &str) {
        self.lines.push(line.replace("**", ""));
    }

    fn finish(self) -> PedagogicalStep {
        PedagogicalStep::new(self.title, self.lines.join("\n").trim())
    }
}

fn split_title(body: &str) -> Option<(&str, &str)> {
    [" — ", " – ", " - ", ": "].iter().find_map(|sep| {
        let (title, rest) = body.split_once(sep)?;
        let (title, rest) = (title.trim(), rest.trim());
        (!title.is_empty() && !rest.is_empty()).then_some((title, rest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParseOutcome {
        PedagogicalResponseParser::new().parse_outcome(raw, "2x + 3 = 7")
    }

    #[test]
    fn parses_fenced_json() {
        let raw = r#"Iată analiza:
```json
{
  "steps": [
    {"title": "Scade 3", "explanation": "2x = 4"},
    {"title": "Împarte la 2", "explanation": "x = 2"}
  ],
  "finalAnswer": "x = 2",
  "keyConcepts": ["ecuații liniare"],
  "difficulty": "easy",
  "timeEstimate": "2 minute"
}
```
Succes!"#;

        let outcome = parse(raw);
        assert!(outcome.is_valid());
        let analysis = outcome.analysis();
        assert_eq!(analysis.problem_text, "2x + 3 = 7");
        assert_eq!(analysis.steps.len(), 2);
        assert_eq!(analysis.steps[1], PedagogicalStep::new("Împarte la 2", "x = 2"));
        assert_eq!(analysis.final_answer.as_deref(), Some("x = 2"));
        assert_eq!(analysis.key_concepts, Some(vec!["ecuații liniare".to_string()]));
        assert_eq!(analysis.difficulty, Some(Difficulty::Easy));
        assert_eq!(analysis.time_estimate.as_deref(), Some("2 minute"));
        assert_eq!(analysis.caveats, None);
    }

    #[test]
    fn finds_json_between_braces_in_prose() {
        let raw = r#"Sigur! {"steps": [{"title": "Observă"}]} Sper că ajută."#;

        let outcome = parse(raw);
        assert!(outcome.is_valid());
        assert_eq!(outcome.analysis().steps, vec![PedagogicalStep::new("Observă", "")]);
    }

    #[test]
    fn fills_defaults_for_missing_fields() {
        let analysis = parse(r#"{"steps": [{"explanation": "ceva"}, "Verifică"]}"#).into_analysis();

        assert_eq!(analysis.steps[0], PedagogicalStep::new(DEFAULT_STEP_TITLE, "ceva"));
        assert_eq!(analysis.steps[1], PedagogicalStep::new("Verifică", ""));
        assert_eq!(analysis.key_concepts, Some(vec![]));
        assert_eq!(analysis.difficulty, Some(Difficulty::Medium));
        assert_eq!(analysis.time_estimate.as_deref(), Some(DEFAULT_TIME_ESTIMATE));
        assert_eq!(analysis.final_answer, None);
    }

    #[test]
    fn accepts_snake_case_and_description_aliases() {
        let raw = r#"{
            "steps": [{"description": "Identifică termenii", "details": "2x și 3"}],
            "final_answer": 2,
            "key_concepts": "ecuații",
            "difficulty": "greu",
            "caveats": ["verifică semnul"]
        }"#;

        let analysis = parse(raw).into_analysis();
        assert_eq!(
            analysis.steps[0],
            PedagogicalStep::new("Identifică termenii", "2x și 3")
        );
        assert_eq!(analysis.final_answer.as_deref(), Some("2"));
        assert_eq!(analysis.key_concepts, Some(vec!["ecuații".to_string()]));
        assert_eq!(analysis.difficulty, Some(Difficulty::Hard));
        assert_eq!(analysis.caveats, Some(vec!["verifică semnul".to_string()]));
    }

    #[test]
    fn numbered_lines_open_steps_and_other_lines_extend_them() {
        let outcome = parse("1. Find X\nDo the thing\n2. Solve Y");

        assert!(!outcome.is_valid());
        assert_eq!(
            outcome.analysis().steps,
            vec![
                PedagogicalStep::new("Find X", "Do the thing"),
                PedagogicalStep::new("Solve Y", ""),
            ]
        );
    }

    #[test]
    fn empty_steps_array_falls_back_to_lines() {
        let outcome = parse(r#"{"steps": []}"#);

        assert!(!outcome.is_valid());
        assert_eq!(outcome.analysis().steps.len(), 1);
        assert_eq!(outcome.analysis().steps[0].title, FALLBACK_STEP_TITLE);
    }

    #[test]
    fn heuristic_handles_pas_lines_bullets_and_final_answer() {
        let raw = "Să rezolvăm.\n\
                   - Pas 1: Scade 3 — obținem 2x = 4\n\
                   **Pas 2:** Împarte la 2\n\
                   rezultă x = 2\n\
                   • Verifică\n\
                   Răspuns final: x = 2";

        let analysis = parse(raw).into_analysis();
        assert_eq!(
            analysis.steps,
            vec![
                PedagogicalStep::new("Scade 3", "obținem 2x = 4"),
                PedagogicalStep::new("Împarte la 2", "rezultă x = 2"),
                PedagogicalStep::new("Verifică", ""),
            ]
        );
        assert_eq!(analysis.final_answer.as_deref(), Some("x = 2"));
        assert_eq!(analysis.difficulty, None);
    }

    #[test]
    fn number_enumerator_may_touch_its_heading() {
        let outcome = parse("1.Find X\nDo the thing\n2)Solve Y");

        assert_eq!(
            outcome.analysis().steps,
            vec![
                PedagogicalStep::new("Find X", "Do the thing"),
                PedagogicalStep::new("Solve Y", ""),
            ]
        );
    }

    #[test]
    fn bare_pas_headings_keep_their_number() {
        let analysis = parse("Pas 1:\nIdentifică datele\nPasul 12\nRezolvă").into_analysis();

        assert_eq!(
            analysis.steps,
            vec![
                PedagogicalStep::new("Pas 1", "Identifică datele"),
                PedagogicalStep::new("Pas 12", "Rezolvă"),
            ]
        );
    }

    #[test]
    fn words_starting_with_pas_are_not_headings() {
        let analysis = parse("1. Calculează\nPastrează semnul").into_analysis();

        assert_eq!(analysis.steps, vec![PedagogicalStep::new("Calculează", "Pastrează semnul")]);
    }

    #[test]
    fn json_title_and_explanation_pass_through_verbatim() {
        let analysis = parse(r#"{"steps": [{"title": " Scade 3 ", "explanation": "2x = 4\n"}, {"title": "  "}]}"#)
            .into_analysis();

        assert_eq!(analysis.steps[0], PedagogicalStep::new(" Scade 3 ", "2x = 4\n"));
        assert_eq!(analysis.steps[1].title, DEFAULT_STEP_TITLE);
    }

    #[test]
    fn decimals_do_not_start_steps() {
        let analysis = parse("1. Calculează\n3.5 este jumătatea lui 7\n12 : 4 = 3").into_analysis();

        assert_eq!(analysis.steps.len(), 1);
        assert_eq!(analysis.steps[0].explanation, "3.5 este jumătatea lui 7\n12 : 4 = 3");
    }

    #[test]
    fn unstructured_text_becomes_single_truncated_step() {
        let raw = "a".repeat(500);
        let analysis = parse(&raw).into_analysis();

        assert_eq!(analysis.steps.len(), 1);
        let step = &analysis.steps[0];
        assert_eq!(step.title, FALLBACK_STEP_TITLE);
        assert!(step.explanation.ends_with(ELLIPSIS));
        assert_eq!(step.explanation.chars().count(), FALLBACK_EXCERPT_CHARS + 1);
    }

    #[test]
    fn empty_input_still_yields_a_step() {
        for raw in ["", "   \n  "] {
            let analysis = parse(raw).into_analysis();
            assert_eq!(analysis.steps.len(), 1);
            assert_eq!(analysis.steps[0].explanation, EMPTY_RESPONSE_NOTE);
        }
    }

    #[test]
    fn malformed_json_degrades_instead_of_failing() {
        let outcome = parse(r#"{"steps": [{"title": "Scade 3", "#);

        assert!(!outcome.is_valid());
        assert!(!outcome.analysis().steps.is_empty());
    }

    #[test]
    fn oversized_input_yields_error_step_only() {
        let parser = PedagogicalResponseParser::with_limits(FALLBACK_EXCERPT_CHARS, 16);
        let outcome = parser.parse_outcome(r#"{"steps": [{"title": "Prea lung"}]}"#, "x");

        assert!(!outcome.is_valid());
        let analysis = outcome.analysis();
        assert_eq!(analysis.steps, vec![PedagogicalStep::new(PARSE_ERROR_TITLE, PARSE_ERROR_EXPLANATION)]);
        assert_eq!(analysis.final_answer, None);
        assert_eq!(analysis.key_concepts, None);
        assert_eq!(analysis.time_estimate, None);
    }

    #[test]
    fn extracts_candidate_from_unterminated_fence() {
        let raw = "```json\n{\"steps\": [\"A\"]}";
        assert_eq!(extract_json_candidate(raw), "{\"steps\": [\"A\"]}");
    }
}
