use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

/// What kind of answer a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    Text,
    Numeric,
    SingleChoice,
    MultipleChoice,
    Date,
}

impl QuestionType {
    /// Is the answer picked from a list of possible answers?
    pub fn has_choices(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

/// How a question is rendered to respondents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayType {
    Input,
    TextArea,
    Radio,
    Checkbox,
    Dropdown,
}

/// Normalize the possible answers for a question of the given type: keep
/// the first occurrence of each answer in order, or nothing at all if the
/// type has no choices.
pub fn normalize_answers(question_type: QuestionType, answers: Vec<String>) -> Vec<String> {
    if !question_type.has_choices() {
        return Vec::new();
    }
    let mut unique: Vec<String> = Vec::with_capacity(answers.len());
    for answer in answers {
        if !unique.contains(&answer) {
            unique.push(answer);
        }
    }
    unique
}

/// The responses collected for a question.
///
/// Responses are opaque values and the log is append-only: this backend
/// creates it empty and only ever reads it, so it exposes no way to modify
/// or remove existing entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseLog(Vec<Value>);
