use std::sync::Arc;

use log::debug;
use rocket::{
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::question::{QuestionSpec, QuestionView},
    auth::guard::{fetch_owned, require_caller},
    cancel::Cancellation,
    db::question::{Question, QuestionPatch},
    mongodb::Id,
    store::{DocumentStore, Filter, Store},
};

/// Commands and queries over questions. The single owner of question
/// invariants: nothing else writes to the question collection.
#[derive(Clone)]
pub struct QuestionService {
    questions: Arc<dyn DocumentStore<Question>>,
}

impl QuestionService {
    pub fn new(store: &Store) -> Self {
        Self {
            questions: Arc::clone(&store.questions),
        }
    }

    /// Create a question owned by `caller`, optionally attached to a survey.
    ///
    /// The survey reference is recorded as given; attaching the question to
    /// the survey's own list is the survey service's job.
    pub async fn create(
        &self,
        spec: QuestionSpec,
        caller: &str,
        survey_id: Option<Id>,
        cancel: &Cancellation,
    ) -> Result<Id> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let question = spec.into_question(caller.to_string(), survey_id);
        let id = self.questions.insert_one(question).await?;
        debug!("Created question {id} for {caller}");
        Ok(id)
    }

    /// Get a single question owned by `caller`.
    pub async fn get_by_id(
        &self,
        id: Id,
        caller: &str,
        cancel: &Cancellation,
    ) -> Result<QuestionView> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let question = fetch_owned(self.questions.as_ref(), id, caller).await?;
        Ok(question.into())
    }

    /// Get every question owned by `caller`, or only those in the given survey.
    ///
    /// The owner filter is the access check, so no match is simply empty.
    pub async fn get_all(
        &self,
        caller: &str,
        survey_id: Option<Id>,
        cancel: &Cancellation,
    ) -> Result<Vec<QuestionView>> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let mut filter = Filter::by_owner(caller);
        if let Some(survey_id) = survey_id {
            filter = filter.in_survey(survey_id);
        }
        let questions = self.questions.find_many(&filter).await?;
        Ok(questions.into_iter().map(QuestionView::from).collect())
    }

    /// Delete a question owned by `caller`.
    pub async fn delete(&self, id: Id, caller: &str, cancel: &Cancellation) -> Result<()> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        fetch_owned(self.questions.as_ref(), id, caller).await?;
        cancel.check()?;
        if self.questions.delete_one(&Filter::by_id(id)).await? {
            debug!("Deleted question {id}");
            Ok(())
        } else {
            // Lost a race with another delete.
            Err(Error::NotFound(format!("Question {id}")))
        }
    }

    /// Replace the title of a question owned by `caller`, leaving everything
    /// else untouched.
    pub async fn retitle(
        &self,
        id: Id,
        title: String,
        caller: &str,
        cancel: &Cancellation,
    ) -> Result<()> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        fetch_owned(self.questions.as_ref(), id, caller).await?;
        cancel.check()?;
        let patch = QuestionPatch::retitle(title);
        if self.questions.update_one(&Filter::by_id(id), &patch).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Question {id}")))
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for QuestionService {
    type Error = ();

    /// Build the service on top of the managed store.
    ///
    /// Panics iff the [`Store`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let store = req.guard::<&State<Store>>().await.unwrap();
        Outcome::Success(QuestionService::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{cancel::Canceller, common::question::{QuestionType, ResponseLog}};

    fn never() -> Cancellation {
        Cancellation::never()
    }

    #[backend_test]
    async fn create_then_get(store: Store) {
        let service = QuestionService::new(&store);
        let id = service
            .create(QuestionSpec::choice_example(), "alice", None, &never())
            .await
            .unwrap();

        let view = service.get_by_id(id, "alice", &never()).await.unwrap();
        assert_eq!(id, *view.id);
        assert_eq!("Favourite colour", view.title);
        assert_eq!(QuestionType::SingleChoice, view.question_type);
        assert_eq!(vec!["Red", "Blue"], view.possible_answers);
        assert_eq!(ResponseLog::default(), view.responses);

        // The creator is stamped from the caller.
        let stored = store
            .questions
            .find_one(&Filter::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!("alice", stored.created_by);
        assert_eq!(None, stored.survey_id);
    }

    #[backend_test]
    async fn get_by_id_forbidden_vs_not_found(store: Store) {
        let service = QuestionService::new(&store);
        let id = service
            .create(QuestionSpec::example(), "alice", None, &never())
            .await
            .unwrap();

        assert!(matches!(
            service.get_by_id(id, "bob", &never()).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            service.get_by_id(Id::new(), "alice", &never()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service.get_by_id(id, "", &never()).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[backend_test]
    async fn get_all_scopes_by_owner_and_survey(store: Store) {
        let service = QuestionService::new(&store);
        let survey = Id::new();
        let standalone = service
            .create(QuestionSpec::example(), "alice", None, &never())
            .await
            .unwrap();
        let attached = service
            .create(QuestionSpec::example(), "alice", Some(survey), &never())
            .await
            .unwrap();
        service
            .create(QuestionSpec::example(), "bob", Some(survey), &never())
            .await
            .unwrap();

        let all: Vec<Id> = service
            .get_all("alice", None, &never())
            .await
            .unwrap()
            .into_iter()
            .map(|q| *q.id)
            .collect();
        assert_eq!(vec![standalone, attached], all);

        let in_survey: Vec<Id> = service
            .get_all("alice", Some(survey), &never())
            .await
            .unwrap()
            .into_iter()
            .map(|q| *q.id)
            .collect();
        assert_eq!(vec![attached], in_survey);

        // No match is empty, not an error.
        assert!(service
            .get_all("carol", Some(survey), &never())
            .await
            .unwrap()
            .is_empty());
    }

    #[backend_test]
    async fn delete_checks_owner_and_is_not_silently_repeatable(store: Store) {
        let service = QuestionService::new(&store);
        let id = service
            .create(QuestionSpec::example(), "alice", None, &never())
            .await
            .unwrap();

        assert!(matches!(
            service.delete(id, "bob", &never()).await,
            Err(Error::Forbidden(_))
        ));
        service.delete(id, "alice", &never()).await.unwrap();
        assert!(matches!(
            service.delete(id, "alice", &never()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[backend_test]
    async fn retitle_changes_only_the_title(store: Store) {
        let service = QuestionService::new(&store);
        let id = service
            .create(QuestionSpec::choice_example(), "alice", None, &never())
            .await
            .unwrap();
        let before = service.get_by_id(id, "alice", &never()).await.unwrap();

        service
            .retitle(id, "Colour?".to_string(), "alice", &never())
            .await
            .unwrap();
        let after = service.get_by_id(id, "alice", &never()).await.unwrap();
        assert_eq!("Colour?", after.title);
        assert_eq!(before.possible_answers, after.possible_answers);
        assert_eq!(before.question_type, after.question_type);

        assert!(matches!(
            service
                .retitle(id, "Mine now".to_string(), "bob", &never())
                .await,
            Err(Error::Forbidden(_))
        ));
    }

    #[backend_test]
    async fn cancelled_create_writes_nothing(store: Store) {
        let service = QuestionService::new(&store);
        let canceller = Canceller::new();
        canceller.cancel();

        assert!(matches!(
            service
                .create(QuestionSpec::example(), "alice", None, &canceller.signal())
                .await,
            Err(Error::Cancelled)
        ));
        assert!(service
            .get_all("alice", None, &never())
            .await
            .unwrap()
            .is_empty());
    }
}
