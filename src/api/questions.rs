use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            id::Created,
            question::{QuestionSpec, QuestionView},
        },
        auth::Caller,
        cancel::Cancellation,
        mongodb::Id,
    },
    service::QuestionService,
};

pub fn routes() -> Vec<Route> {
    routes![get_questions, get_question, create_question, delete_question]
}

/// All of the caller's questions, or only those in `survey`.
#[get("/questions?<survey>")]
async fn get_questions(
    caller: Caller,
    survey: Option<Id>,
    questions: QuestionService,
    cancel: Cancellation,
) -> Result<Json<Vec<QuestionView>>> {
    let views = questions.get_all(caller.id(), survey, &cancel).await?;
    Ok(Json(views))
}

#[get("/questions/<question_id>")]
async fn get_question(
    caller: Caller,
    question_id: Id,
    questions: QuestionService,
    cancel: Cancellation,
) -> Result<Json<QuestionView>> {
    let view = questions.get_by_id(question_id, caller.id(), &cancel).await?;
    Ok(Json(view))
}

/// Create a standalone question. A `survey` reference is recorded on the
/// question but does not add it to that survey's question list.
#[post("/questions?<survey>", data = "<spec>", format = "json")]
async fn create_question(
    caller: Caller,
    survey: Option<Id>,
    spec: Json<QuestionSpec>,
    questions: QuestionService,
    cancel: Cancellation,
) -> Result<Json<Created>> {
    let id = questions
        .create(spec.0, caller.id(), survey, &cancel)
        .await?;
    Ok(Json(id.into()))
}

#[delete("/questions/<question_id>")]
async fn delete_question(
    caller: Caller,
    question_id: Id,
    questions: QuestionService,
    cancel: Cancellation,
) -> Result<()> {
    questions.delete(question_id, caller.id(), &cancel).await
}
