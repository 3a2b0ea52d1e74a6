//! Decides whether new input corrects existing knowledge or adds to it.
//!
//! The model is asked for a JSON object. Its reply is scanned for balanced
//! `{...}` candidates and the first one carrying all three fields wins. Any
//! failure yields a "not an update" classification; [`IntentClassifier::classify`]
//! never returns an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::generation::GenerationProvider;

pub(crate) const INTENT_PROMPT_HEADER: &str = "You classify personal knowledge-base input.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateIntent {
    pub is_update: bool,
    pub topic: String,
    pub reason: String,
}

impl UpdateIntent {
    fn fallback(reason: impl Into<String>) -> Self {
        Self {
            is_update: false,
            topic: String::new(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum IntentParseError {
    #[error("model reply contained no JSON object")]
    NoObject,
    #[error("no JSON object in the model reply had is_update, topic and reason: {0}")]
    MissingFields(String),
}

pub struct IntentClassifier {
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn GenerationProvider>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    pub fn classify(&self, input: &str) -> UpdateIntent {
        let reply = match self.generator.generate(&intent_prompt(input), self.temperature) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "intent classification failed; treating input as new");
                return UpdateIntent::fallback(format!("classification unavailable: {e}"));
            }
        };

        match parse_intent(&reply) {
            Ok(intent) => {
                debug!(is_update = intent.is_update, topic = %intent.topic, "classified input");
                intent
            }
            Err(e) => {
                warn!(error = %e, "unparseable intent reply; treating input as new");
                UpdateIntent::fallback(e.to_string())
            }
        }
    }
}

fn intent_prompt(input: &str) -> String {
    format!(
        "{INTENT_PROMPT_HEADER}\n\
         Decide whether the input UPDATES or CORRECTS something the user already recorded, \
         or is NEW information.\n\n\
         Input: \"{input}\"\n\n\
         Signals of an update (guidance, not rules):\n\
         - temporal or change words such as \"now\", \"recently\", \"since\", \"changed\", \
         \"increased\", \"decreased\", \"updated\"\n\
         - references to a fact stated before (\"my rent is now ...\")\n\
         - explicit corrections (\"actually it's ...\")\n\n\
         Reply with one JSON object and nothing else:\n\
         {{\"is_update\": true or false, \"topic\": \"the fact being changed, e.g. house_rent\", \
         \"reason\": \"one short sentence\"}}\n\n\
         If the input is new information, set is_update to false."
    )
}

fn parse_intent(reply: &str) -> Result<UpdateIntent, IntentParseError> {
    let candidates = balanced_objects(reply);
    if candidates.is_empty() {
        return Err(IntentParseError::NoObject);
    }
    candidates
        .iter()
        .find_map(|c| serde_json::from_str::<UpdateIntent>(c).ok())
        .ok_or_else(|| IntentParseError::MissingFields(truncate(reply, 120)))
}

/// Every top-level balanced `{...}` span, in order. Braces inside JSON
/// strings are ignored.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    spans
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::{FailingGenerator, StaticGenerator};

    fn classify_reply(reply: &str) -> UpdateIntent {
        IntentClassifier::new(Arc::new(StaticGenerator::new(reply)), 0.2).classify("my rent is now 1400")
    }

    #[test]
    fn parses_object_wrapped_in_prose() {
        let intent = classify_reply(
            "Sure! Here you go:\n```json\n{\"is_update\": true, \"topic\": \"rent\", \"reason\": \"says now\"}\n```",
        );
        assert!(intent.is_update);
        assert_eq!(intent.topic, "rent");
    }

    #[test]
    fn skips_candidates_missing_fields() {
        let intent = classify_reply(
            "{\"note\": \"thinking\"} then {\"is_update\": true, \"topic\": \"job\", \"reason\": \"changed\"}",
        );
        assert!(intent.is_update);
        assert_eq!(intent.topic, "job");
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let objects = balanced_objects(r#"x {"reason": "a } b {", "k": "\"}"} y"#);
        assert_eq!(objects, vec![r#"{"reason": "a } b {", "k": "\"}"}"#]);
    }

    #[test]
    fn missing_field_falls_back() {
        let intent = classify_reply("{\"is_update\": true, \"topic\": \"rent\"}");
        assert!(!intent.is_update);
        assert_eq!(intent.topic, "");
        assert!(!intent.reason.is_empty());
    }

    #[test]
    fn no_json_falls_back() {
        let intent = classify_reply("I think this is an update.");
        assert!(!intent.is_update);
    }

    #[test]
    fn unreachable_model_falls_back() {
        let intent = IntentClassifier::new(Arc::new(FailingGenerator), 0.2).classify("anything");
        assert!(!intent.is_update);
        assert!(intent.reason.contains("unavailable"));
    }

    #[test]
    fn prompt_carries_input() {
        let generator = Arc::new(StaticGenerator::new("{}"));
        IntentClassifier::new(generator.clone(), 0.2).classify("moved to Berlin");
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].starts_with(INTENT_PROMPT_HEADER));
        assert!(prompts[0].contains("moved to Berlin"));
    }
}
