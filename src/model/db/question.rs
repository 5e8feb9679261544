use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{
    doc, serde_helpers::chrono_datetime_as_bson_datetime, DateTime as BsonDateTime, Document,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    auth::Owned,
    common::question::{normalize_answers, DisplayType, QuestionType, ResponseLog},
    mongodb::Id,
    store::{Patch, Record},
};

/// Core question data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCore {
    /// Prompt shown to respondents.
    pub title: String,
    pub question_type: QuestionType,
    pub display_type: DisplayType,
    /// Ordered, duplicate-free answers. Empty unless the type has choices.
    pub possible_answers: Vec<String>,
    pub responses: ResponseLog,
    /// Identity of the creator; inherited from the survey when attached.
    pub created_by: String,
    /// Owning survey, absent for a standalone question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<Id>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub modified_on: DateTime<Utc>,
}

impl QuestionCore {
    /// A fresh question with no responses, stamped with the current time.
    pub fn new(
        title: String,
        question_type: QuestionType,
        display_type: DisplayType,
        possible_answers: Vec<String>,
        created_by: String,
        survey_id: Option<Id>,
    ) -> Self {
        Self {
            title,
            question_type,
            display_type,
            possible_answers: normalize_answers(question_type, possible_answers),
            responses: ResponseLog::default(),
            created_by,
            survey_id,
            modified_on: Utc::now(),
        }
    }
}

/// A question without an ID.
pub type NewQuestion = QuestionCore;

/// A question from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub question: QuestionCore,
}

impl Deref for Question {
    type Target = QuestionCore;

    fn deref(&self) -> &Self::Target {
        &self.question
    }
}

impl DerefMut for Question {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.question
    }
}

impl Owned for Question {
    fn owner(&self) -> &str {
        &self.created_by
    }
}

impl Record for Question {
    const KIND: &'static str = "Question";
    type New = NewQuestion;
    type Patch = QuestionPatch;

    fn id(&self) -> Id {
        self.id
    }

    fn survey_id(&self) -> Option<Id> {
        self.question.survey_id
    }

    fn with_id(id: Id, question: NewQuestion) -> Self {
        Self { id, question }
    }
}

/// The in-place modifications supported on stored questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionPatch {
    /// Replace only the title.
    Title {
        title: String,
        modified_on: DateTime<Utc>,
    },
}

impl QuestionPatch {
    /// Set a new title, stamped with the current time.
    pub fn retitle(title: impl Into<String>) -> Self {
        Self::Title {
            title: title.into(),
            modified_on: Utc::now(),
        }
    }
}

impl Patch<Question> for QuestionPatch {
    fn apply(&self, question: &mut Question) {
        match self {
            Self::Title { title, modified_on } => {
                question.title = title.clone();
                question.modified_on = *modified_on;
            }
        }
    }

    fn to_update(&self) -> Document {
        match self {
            Self::Title { title, modified_on } => doc! {
                "$set": {
                    "title": title.as_str(),
                    "modified_on": BsonDateTime::from_chrono(*modified_on),
                }
            },
        }
    }
}
