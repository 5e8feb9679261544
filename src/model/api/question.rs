use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::question::{DisplayType, QuestionType, ResponseLog},
    db::question::{NewQuestion, Question},
    mongodb::Id,
};

/// A question specification, as submitted by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Prompt shown to respondents.
    pub title: String,
    #[serde(alias = "type")]
    pub question_type: QuestionType,
    #[serde(alias = "display")]
    pub display_type: DisplayType,
    /// Only meaningful for choice-type questions.
    #[serde(default)]
    pub possible_answers: Vec<String>,
}

impl QuestionSpec {
    /// Convert this spec into a storable question owned by `created_by`.
    pub fn into_question(self, created_by: String, survey_id: Option<Id>) -> NewQuestion {
        NewQuestion::new(
            self.title,
            self.question_type,
            self.display_type,
            self.possible_answers,
            created_by,
            survey_id,
        )
    }
}

/// A question as shown to its owner. The creator identity is deliberately
/// absent: it only ever serves as an access check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: ApiId,
    pub title: String,
    pub question_type: QuestionType,
    pub display_type: DisplayType,
    pub possible_answers: Vec<String>,
    pub responses: ResponseLog,
    pub modified_on: DateTime<Utc>,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        let id = question.id.into();
        let core = question.question;
        Self {
            id,
            title: core.title,
            question_type: core.question_type,
            display_type: core.display_type,
            possible_answers: core.possible_answers,
            responses: core.responses,
            modified_on: core.modified_on,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionSpec {
        pub fn example() -> Self {
            Self {
                title: "Age".to_string(),
                question_type: QuestionType::Numeric,
                display_type: DisplayType::Input,
                possible_answers: Vec::new(),
            }
        }

        pub fn choice_example() -> Self {
            Self {
                title: "Favourite colour".to_string(),
                question_type: QuestionType::SingleChoice,
                display_type: DisplayType::Radio,
                possible_answers: vec!["Red".to_string(), "Blue".to_string()],
            }
        }
    }
}
