use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    api::{
        id::ApiId,
        question::{QuestionSpec, QuestionView},
    },
    common::question::{DisplayType, QuestionType},
    db::survey::Survey,
    mongodb::Id,
};

/// A survey specification, with the questions to create alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Questions in display order.
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

/// A survey as shown to its owner, with its current questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyView {
    pub id: ApiId,
    pub name: String,
    pub description: String,
    pub code: String,
    pub published: bool,
    pub questions: Vec<QuestionView>,
    pub modified_on: DateTime<Utc>,
}

impl SurveyView {
    /// Combine a stored survey with its freshly-queried questions.
    pub fn new(survey: Survey, questions: Vec<QuestionView>) -> Self {
        let id = survey.id.into();
        let core = survey.survey;
        Self {
            id,
            name: core.name,
            description: core.description,
            code: core.code,
            published: core.published,
            questions,
            modified_on: core.modified_on,
        }
    }
}

/// List-view of a survey: metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySummary {
    pub id: ApiId,
    pub name: String,
    pub description: String,
    pub code: String,
    pub published: bool,
    pub modified_on: DateTime<Utc>,
}

impl From<Survey> for SurveySummary {
    fn from(survey: Survey) -> Self {
        let id = survey.id.into();
        let core = survey.survey;
        Self {
            id,
            name: core.name,
            description: core.description,
            code: core.code,
            published: core.published,
            modified_on: core.modified_on,
        }
    }
}

/// A partial update to a survey.
///
/// Metadata is always overwritten; questions are touched only through the
/// directive list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyUpdate {
    /// The survey to update.
    pub id: Option<Id>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuestionDirective>,
    /// The owner the client believes the survey has. If present, it must
    /// match the caller.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// What to do with one question during a survey update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectiveAction {
    New,
    Update,
    Delete,
}

/// A per-question instruction inside a [`SurveyUpdate`], as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDirective {
    /// Required for `UPDATE` and `DELETE`.
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub title: String,
    /// Required for `NEW`.
    #[serde(default, alias = "type")]
    pub question_type: Option<QuestionType>,
    /// Required for `NEW`.
    #[serde(default, alias = "display")]
    pub display_type: Option<DisplayType>,
    #[serde(default)]
    pub possible_answers: Vec<String>,
    pub action: DirectiveAction,
}

/// A validated [`QuestionDirective`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Create a question and attach it to the survey.
    New(QuestionSpec),
    /// Set only the title of an attached question.
    Update { id: Id, title: String },
    /// Remove an attached question.
    Delete(Id),
}

impl TryFrom<QuestionDirective> for Directive {
    type Error = Error;

    fn try_from(directive: QuestionDirective) -> Result<Self, Self::Error> {
        let missing = |field: &str| {
            Error::InvalidInput(format!(
                "{:?} question directive is missing `{field}`",
                directive.action
            ))
        };
        match directive.action {
            DirectiveAction::New => {
                let question_type = directive
                    .question_type
                    .ok_or_else(|| missing("question_type"))?;
                let display_type = directive
                    .display_type
                    .ok_or_else(|| missing("display_type"))?;
                Ok(Self::New(QuestionSpec {
                    title: directive.title,
                    question_type,
                    display_type,
                    possible_answers: directive.possible_answers,
                }))
            }
            DirectiveAction::Update => {
                let id = directive.id.ok_or_else(|| missing("id"))?;
                Ok(Self::Update {
                    id,
                    title: directive.title,
                })
            }
            DirectiveAction::Delete => {
                let id = directive.id.ok_or_else(|| missing("id"))?;
                Ok(Self::Delete(id))
            }
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl SurveySpec {
        pub fn example() -> Self {
            Self {
                name: "Census".to_string(),
                description: "x".to_string(),
                questions: vec![QuestionSpec::example()],
            }
        }
    }

    impl SurveyUpdate {
        pub fn rename(id: Id, name: &str) -> Self {
            Self {
                id: Some(id),
                name: name.to_string(),
                description: "Updated".to_string(),
                questions: Vec::new(),
                created_by: None,
            }
        }
    }

    impl QuestionDirective {
        pub fn new(spec: QuestionSpec) -> Self {
            Self {
                id: None,
                title: spec.title,
                question_type: Some(spec.question_type),
                display_type: Some(spec.display_type),
                possible_answers: spec.possible_answers,
                action: DirectiveAction::New,
            }
        }

        pub fn update(id: Id, title: &str) -> Self {
            Self {
                id: Some(id),
                title: title.to_string(),
                question_type: None,
                display_type: None,
                possible_answers: Vec::new(),
                action: DirectiveAction::Update,
            }
        }

        pub fn delete(id: Id) -> Self {
            Self {
                id: Some(id),
                title: String::new(),
                question_type: None,
                display_type: None,
                possible_answers: Vec::new(),
                action: DirectiveAction::Delete,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use super::*;

    #[test]
    fn directive_actions_are_upper_case() {
        let directive: QuestionDirective = serde_json::from_value(json!({
            "id": Id::new().to_string(),
            "action": "DELETE",
        }))
        .unwrap();
        assert_eq!(DirectiveAction::Delete, directive.action);
    }

    #[test]
    fn update_and_delete_need_an_id() {
        let mut update = QuestionDirective::update(Id::new(), "Title");
        update.id = None;
        assert!(matches!(
            Directive::try_from(update),
            Err(Error::InvalidInput(_))
        ));

        let mut delete = QuestionDirective::delete(Id::new());
        delete.id = None;
        assert!(matches!(
            Directive::try_from(delete),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn new_needs_types() {
        let mut new = QuestionDirective::new(QuestionSpec::example());
        assert_eq!(
            Directive::New(QuestionSpec::example()),
            Directive::try_from(new.clone()).unwrap()
        );
        new.display_type = None;
        assert!(matches!(Directive::try_from(new), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn update_keeps_only_the_title() {
        let id = Id::new();
        let mut update = QuestionDirective::update(id, "Renamed");
        update.possible_answers = vec!["ignored".to_string()];
        assert_eq!(
            Directive::Update {
                id,
                title: "Renamed".to_string()
            },
            Directive::try_from(update).unwrap()
        );
    }
}
