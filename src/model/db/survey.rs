use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{
    doc, serde_helpers::chrono_datetime_as_bson_datetime, Bson, DateTime as BsonDateTime,
    Document,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{
    auth::Owned,
    mongodb::Id,
    store::{Patch, Record},
};

/// Characters used in share codes; omits the easily-confused `0`, `O`, `1`, `I`.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

/// Generate a short, human-shareable survey code.
pub fn generate_code(rng: &mut impl Rng) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Core survey data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyCore {
    pub name: String,
    pub description: String,
    /// Short code respondents can use to find the survey.
    pub code: String,
    /// Nothing sets this yet; every survey is a draft.
    pub published: bool,
    /// IDs of the questions owned by this survey, in display order.
    pub questions_list: Vec<Id>,
    /// Identity of the creator.
    pub created_by: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub modified_on: DateTime<Utc>,
}

impl SurveyCore {
    /// A fresh, unpublished survey with no questions yet.
    pub fn new(
        name: String,
        description: String,
        created_by: String,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            name,
            description,
            code: generate_code(rng),
            published: false,
            questions_list: Vec::new(),
            created_by,
            modified_on: Utc::now(),
        }
    }
}

/// A survey without an ID.
pub type NewSurvey = SurveyCore;

/// A survey from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub survey: SurveyCore,
}

impl Survey {
    /// Does this survey currently own the given question?
    pub fn owns_question(&self, question_id: Id) -> bool {
        self.questions_list.contains(&question_id)
    }
}

impl Deref for Survey {
    type Target = SurveyCore;

    fn deref(&self) -> &Self::Target {
        &self.survey
    }
}

impl DerefMut for Survey {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.survey
    }
}

impl Owned for Survey {
    fn owner(&self) -> &str {
        &self.created_by
    }
}

impl Record for Survey {
    const KIND: &'static str = "Survey";
    type New = NewSurvey;
    type Patch = SurveyPatch;

    fn id(&self) -> Id {
        self.id
    }

    fn with_id(id: Id, survey: NewSurvey) -> Self {
        Self { id, survey }
    }
}

/// The in-place modifications supported on stored surveys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyPatch {
    /// Overwrite the descriptive metadata.
    Metadata {
        name: String,
        description: String,
        modified_on: DateTime<Utc>,
    },
    /// Replace the whole question list.
    QuestionsList(Vec<Id>),
    /// Append one question reference.
    PushQuestion(Id),
    /// Remove every reference to one question.
    PullQuestion(Id),
}

impl SurveyPatch {
    /// Set new metadata, stamped with the current time.
    pub fn metadata(name: String, description: String) -> Self {
        Self::Metadata {
            name,
            description,
            modified_on: Utc::now(),
        }
    }
}

impl Patch<Survey> for SurveyPatch {
    fn apply(&self, survey: &mut Survey) {
        match self {
            Self::Metadata {
                name,
                description,
                modified_on,
            } => {
                survey.name = name.clone();
                survey.description = description.clone();
                survey.modified_on = *modified_on;
            }
            Self::QuestionsList(ids) => survey.questions_list = ids.clone(),
            Self::PushQuestion(id) => survey.questions_list.push(*id),
            Self::PullQuestion(id) => survey.questions_list.retain(|q| q != id),
        }
    }

    fn to_update(&self) -> Document {
        match self {
            Self::Metadata {
                name,
                description,
                modified_on,
            } => doc! {
                "$set": {
                    "name": name.as_str(),
                    "description": description.as_str(),
                    "modified_on": BsonDateTime::from_chrono(*modified_on),
                }
            },
            Self::QuestionsList(ids) => {
                let ids: Vec<Bson> = ids.iter().copied().map(Bson::from).collect();
                doc! { "$set": { "questions_list": ids } }
            }
            Self::PushQuestion(id) => doc! { "$push": { "questions_list": *id } },
            Self::PullQuestion(id) => doc! { "$pull": { "questions_list": *id } },
        }
    }
}
