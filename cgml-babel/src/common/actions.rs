//! Trigger/action micro-grammar
//!
//! Payloads of states and transitions are blank-line separated records:
//!
//! ```text
//! entry/
//! led.on()
//!
//! timer.timeout[counter > 3] propagate/
//! counter.reset()
//! ```
//!
//! Each record is split on its first `/` into a trigger phrase and a body.
//! The phrase is matched against the grammars below, in order, and the first
//! match wins:
//!
//! 1. `trigger[condition] postfix`
//! 2. `trigger postfix`
//! 3. `trigger[condition]`
//! 4. `[condition]`
//! 5. `trigger`
//!
//! State records must carry a trigger. Transition records may leave the phrase
//! empty, but a non-empty phrase must match.

use crate::error::{CgmlError, Result};
use crate::model::{Action, Actions, Document, Mode, TransitionAction, Trigger};
use once_cell::sync::Lazy;
use regex::Regex;

static TRIGGER_GRAMMARS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(?P<trigger>[^\[\]]+)\[(?P<condition>.+)\] (?P<postfix>\w+)$",
        r"^(?P<trigger>[^\[\]\s]+) (?P<postfix>.+)$",
        r"^(?P<trigger>[^\[\]]+)\[(?P<condition>.+)\]$",
        r"^\[(?P<condition>.+)\]$",
        r"^(?P<trigger>[^\[\]]+)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("trigger grammar is a valid regex"))
    .collect()
});

const RECORD_SEPARATOR: &str = "\n\n";

/// Match a trigger phrase against the grammars. `None` when nothing matches.
pub fn parse_trigger(phrase: &str) -> Option<Trigger> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }
    TRIGGER_GRAMMARS.iter().find_map(|grammar| {
        grammar.captures(phrase).map(|captures| {
            let group = |name: &str| captures.name(name).map(|m| m.as_str().to_string());
            Trigger {
                event: group("trigger"),
                condition: group("condition"),
                postfix: group("postfix"),
            }
        })
    })
}

/// Parse a state payload. Every record needs a trigger.
pub fn parse_actions(text: &str, element: &str) -> Result<Vec<Action>> {
    records(text)
        .map(|(phrase, action)| match parse_trigger(phrase) {
            Some(trigger) => Ok(Action { trigger, action }),
            None => Err(CgmlError::MissingTrigger {
                element: element.to_string(),
                record: phrase.to_string(),
            }),
        })
        .collect()
}

/// Parse a transition payload. An empty phrase means no trigger; a phrase
/// that matches no grammar is an error, since exporting it would lose the text.
pub fn parse_transition_actions(text: &str, element: &str) -> Result<Vec<TransitionAction>> {
    records(text)
        .map(|(phrase, action)| {
            let trigger = parse_trigger(phrase);
            if trigger.is_none() && !phrase.trim().is_empty() {
                return Err(CgmlError::MissingTrigger {
                    element: element.to_string(),
                    record: phrase.to_string(),
                });
            }
            Ok(TransitionAction { trigger, action })
        })
        .collect()
}

pub fn serialize_actions(actions: &[Action]) -> String {
    let mut output = String::new();
    for action in actions {
        write_record(&mut output, Some(&action.trigger), action.action.as_deref());
    }
    output
}

pub fn serialize_transition_actions(actions: &[TransitionAction]) -> String {
    let mut output = String::new();
    for action in actions {
        write_record(&mut output, action.trigger.as_ref(), action.action.as_deref());
    }
    output
}

fn write_record(output: &mut String, trigger: Option<&Trigger>, action: Option<&str>) {
    if let Some(trigger) = trigger {
        if let Some(event) = &trigger.event {
            output.push_str(event);
        }
        if let Some(condition) = &trigger.condition {
            output.push_str(&format!("[{condition}]"));
        }
        if let Some(postfix) = &trigger.postfix {
            output.push(' ');
            output.push_str(postfix);
        }
    }
    output.push_str("/\n");
    if let Some(action) = action.filter(|a| !a.is_empty()) {
        output.push_str(action);
        output.push('\n');
    }
    output.push('\n');
}

/// Copy of `document` with every action field in the shape of `mode`.
///
/// Text payloads are parsed when going structured, so a record without a
/// usable trigger fails here just as it would on import.
pub fn convert_mode(document: &Document, mode: Mode) -> Result<Document> {
    let mut converted = document.clone();
    for machine in converted.state_machines.values_mut() {
        for (id, state) in machine.states.iter_mut() {
            state.actions = match (&state.actions, mode) {
                (Actions::Structured(actions), Mode::Text) => {
                    Actions::Text(serialize_actions(actions))
                }
                (Actions::Text(text), Mode::Structured) => {
                    Actions::Structured(parse_actions(text, id)?)
                }
                (unchanged, _) => unchanged.clone(),
            };
        }
        for (id, transition) in machine.transitions.iter_mut() {
            transition.actions = match (&transition.actions, mode) {
                (Actions::Structured(actions), Mode::Text) => {
                    Actions::Text(serialize_transition_actions(actions))
                }
                (Actions::Text(text), Mode::Structured) => {
                    Actions::Structured(parse_transition_actions(text, id)?)
                }
                (unchanged, _) => unchanged.clone(),
            };
        }
    }
    Ok(converted)
}

/// Non-blank records as (phrase, trimmed body). A record without `/` is all phrase.
fn records(text: &str) -> impl Iterator<Item = (&str, Option<String>)> {
    text.split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .map(|record| match record.split_once('/') {
            Some((phrase, body)) => {
                let body = body.trim();
                (phrase, (!body.is_empty()).then(|| body.to_string()))
            }
            None => (record, None),
        })
}
