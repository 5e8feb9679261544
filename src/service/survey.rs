use std::sync::Arc;

use log::{debug, info, warn};
use rocket::{
    request::{FromRequest, Outcome},
    Request, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::survey::{Directive, SurveySpec, SurveySummary, SurveyUpdate, SurveyView},
    auth::guard::{fetch_owned, require_caller},
    cancel::Cancellation,
    db::survey::{NewSurvey, Survey, SurveyPatch},
    mongodb::Id,
    store::{DocumentStore, Filter, Patch, Store},
};

use super::question::QuestionService;

/// Commands and queries over surveys.
///
/// A survey and its questions live in separate collections and there are no
/// transactions, so every multi-step operation is sequenced so that a
/// failure part-way leaves, at worst, orphaned questions:
///
/// - create inserts the survey, then each question, then writes the
///   question list back onto the survey;
/// - delete removes each listed question, then the survey.
///
/// Nothing is rolled back. Question-level work always goes through the
/// [`QuestionService`].
#[derive(Clone)]
pub struct SurveyService {
    surveys: Arc<dyn DocumentStore<Survey>>,
    questions: QuestionService,
}

impl SurveyService {
    pub fn new(store: &Store) -> Self {
        Self {
            surveys: Arc::clone(&store.surveys),
            questions: QuestionService::new(store),
        }
    }

    /// Create a survey owned by `caller`, together with its questions in the
    /// given order.
    pub async fn create(
        &self,
        spec: SurveySpec,
        caller: &str,
        cancel: &Cancellation,
    ) -> Result<Id> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let survey = NewSurvey::new(
            spec.name,
            spec.description,
            caller.to_string(),
            &mut rand::thread_rng(),
        );
        let id = self.surveys.insert_one(survey).await?;

        // Questions inherit the survey's owner.
        let mut question_ids = Vec::with_capacity(spec.questions.len());
        for question in spec.questions {
            let question_id = self
                .questions
                .create(question, caller, Some(id), cancel)
                .await?;
            question_ids.push(question_id);
        }

        cancel.check()?;
        let count = question_ids.len();
        self.surveys
            .update_one(&Filter::by_id(id), &SurveyPatch::QuestionsList(question_ids))
            .await?;
        info!("Created survey {id} with {count} questions for {caller}");
        Ok(id)
    }

    /// Get a single survey owned by `caller`, with its current questions.
    ///
    /// Questions are queried fresh rather than read through the survey's
    /// question list, and are returned in list order.
    pub async fn get_by_id(
        &self,
        id: Id,
        caller: &str,
        cancel: &Cancellation,
    ) -> Result<SurveyView> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let survey = fetch_owned(self.surveys.as_ref(), id, caller).await?;
        let mut questions = self.questions.get_all(caller, Some(id), cancel).await?;
        // Stable, so unlisted questions keep store order at the end.
        questions.sort_by_key(|question| {
            survey
                .questions_list
                .iter()
                .position(|listed| *listed == *question.id)
                .unwrap_or(usize::MAX)
        });
        Ok(SurveyView::new(survey, questions))
    }

    /// Summaries of every survey owned by `caller`.
    pub async fn get_all(&self, caller: &str, cancel: &Cancellation) -> Result<Vec<SurveySummary>> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let surveys = self.surveys.find_many(&Filter::by_owner(caller)).await?;
        Ok(surveys.into_iter().map(SurveySummary::from).collect())
    }

    /// Overwrite a survey's metadata and apply its question directives in
    /// order. Each step is an independent write; a failure part-way leaves
    /// the earlier steps applied.
    pub async fn update(
        &self,
        update: SurveyUpdate,
        caller: &str,
        cancel: &Cancellation,
    ) -> Result<()> {
        // Validate everything before touching the store.
        let caller = require_caller(caller)?;
        let id = update
            .id
            .ok_or_else(|| Error::InvalidInput("Survey update is missing `id`".to_string()))?;
        let directives = update
            .questions
            .into_iter()
            .map(Directive::try_from)
            .collect::<Result<Vec<_>>>()?;
        if let Some(claimed) = &update.created_by {
            if claimed != caller {
                return Err(Error::Forbidden(format!("Survey {id} is owned by another user")));
            }
        }

        // Ownership comes from the stored survey, not just the payload.
        cancel.check()?;
        let mut survey = fetch_owned(self.surveys.as_ref(), id, caller).await?;
        let filter = Filter::by_id(id);

        cancel.check()?;
        let metadata = SurveyPatch::metadata(update.name, update.description);
        self.surveys.update_one(&filter, &metadata).await?;

        // The loaded survey tracks each list change, so later directives see
        // questions added or removed by earlier ones.
        for directive in directives {
            cancel.check()?;
            match directive {
                Directive::New(spec) => {
                    let question_id = self
                        .questions
                        .create(spec, caller, Some(id), cancel)
                        .await?;
                    cancel.check()?;
                    let push = SurveyPatch::PushQuestion(question_id);
                    self.surveys.update_one(&filter, &push).await?;
                    push.apply(&mut survey);
                }
                Directive::Update {
                    id: question_id,
                    title,
                } => {
                    if !survey.owns_question(question_id) {
                        debug!("Ignoring update of question {question_id} not in survey {id}");
                        continue;
                    }
                    match self
                        .questions
                        .retitle(question_id, title, caller, cancel)
                        .await
                    {
                        Ok(()) => {}
                        // Listed but already gone: nothing to retitle.
                        Err(Error::NotFound(_)) => {
                            debug!("Ignoring update of deleted question {question_id} in survey {id}");
                        }
                        Err(err) => return Err(err),
                    }
                }
                Directive::Delete(question_id) => {
                    if !survey.owns_question(question_id) {
                        debug!("Ignoring delete of question {question_id} not in survey {id}");
                        continue;
                    }
                    match self.questions.delete(question_id, caller, cancel).await {
                        // Already gone: just drop the dangling reference.
                        Ok(()) | Err(Error::NotFound(_)) => {}
                        Err(err) => return Err(err),
                    }
                    cancel.check()?;
                    let pull = SurveyPatch::PullQuestion(question_id);
                    self.surveys.update_one(&filter, &pull).await?;
                    pull.apply(&mut survey);
                }
            }
        }

        info!("Updated survey {id}");
        Ok(())
    }

    /// Delete a survey owned by `caller` and every question it lists.
    ///
    /// A question that cannot be deleted is logged and left behind as an
    /// orphan; the survey itself is still deleted.
    pub async fn delete(&self, id: Id, caller: &str, cancel: &Cancellation) -> Result<()> {
        let caller = require_caller(caller)?;
        cancel.check()?;
        let survey = fetch_owned(self.surveys.as_ref(), id, caller).await?;

        for &question_id in &survey.questions_list {
            match self.questions.delete(question_id, caller, cancel).await {
                Ok(()) => {}
                Err(Error::NotFound(_)) => {
                    debug!("Question {question_id} of survey {id} was already deleted");
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    warn!("Orphaning question {question_id} of survey {id}: {err}");
                }
            }
        }

        cancel.check()?;
        if self.surveys.delete_one(&Filter::by_id(id)).await? {
            info!("Deleted survey {id}");
            Ok(())
        } else {
            Err(Error::NotFound(format!("Survey {id}")))
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SurveyService {
    type Error = ();

    /// Build the service on top of the managed store.
    ///
    /// Panics iff the [`Store`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let store = req.guard::<&State<Store>>().await.unwrap();
        Outcome::Success(SurveyService::new(store))
    }
}
