use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            id::Created,
            survey::{SurveySpec, SurveySummary, SurveyUpdate, SurveyView},
        },
        auth::Caller,
        cancel::Cancellation,
        mongodb::Id,
    },
    service::SurveyService,
};

pub fn routes() -> Vec<Route> {
    routes![
        get_surveys,
        get_survey,
        create_survey,
        update_survey,
        delete_survey,
    ]
}

#[get("/surveys")]
async fn get_surveys(
    caller: Caller,
    surveys: SurveyService,
    cancel: Cancellation,
) -> Result<Json<Vec<SurveySummary>>> {
    let summaries = surveys.get_all(caller.id(), &cancel).await?;
    Ok(Json(summaries))
}

#[get("/surveys/<survey_id>")]
async fn get_survey(
    caller: Caller,
    survey_id: Id,
    surveys: SurveyService,
    cancel: Cancellation,
) -> Result<Json<SurveyView>> {
    let survey = surveys.get_by_id(survey_id, caller.id(), &cancel).await?;
    Ok(Json(survey))
}

#[post("/surveys", data = "<spec>", format = "json")]
async fn create_survey(
    caller: Caller,
    spec: Json<SurveySpec>,
    surveys: SurveyService,
    cancel: Cancellation,
) -> Result<Json<Created>> {
    let id = surveys.create(spec.0, caller.id(), &cancel).await?;
    Ok(Json(id.into()))
}

#[put("/surveys", data = "<update>", format = "json")]
async fn update_survey(
    caller: Caller,
    update: Json<SurveyUpdate>,
    surveys: SurveyService,
    cancel: Cancellation,
) -> Result<()> {
    surveys.update(update.0, caller.id(), &cancel).await
}

#[delete("/surveys/<survey_id>")]
async fn delete_survey(
    caller: Caller,
    survey_id: Id,
    surveys: SurveyService,
    cancel: Cancellation,
) -> Result<()> {
    surveys.delete(survey_id, caller.id(), &cancel).await
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::config::Config;
    use crate::model::{
        auth::examples::bearer_for,
        store::{DocumentStore, Filter, Store},
    };

    use super::*;

    #[backend_test]
    async fn census_round_trip(client: Client, store: Store) {
        let config = client.rocket().state::<Config>().unwrap();

        // Create.
        let response = client
            .post(uri!(create_survey))
            .header(bearer_for("u1", config))
            .header(ContentType::JSON)
            .body(
                json!({
                    "name": "Census",
                    "description": "x",
                    "questions": [
                        { "title": "Age", "type": "Numeric", "display": "Input" }
                    ],
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let created: Created = response.into_json().await.unwrap();
        let id = *created.id;

        // List.
        let response = client
            .get(uri!(get_surveys))
            .header(bearer_for("u1", config))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let summaries: Vec<SurveySummary> = response.into_json().await.unwrap();
        assert_eq!(1, summaries.len());
        assert_eq!(id, *summaries[0].id);

        // Read.
        let response = client
            .get(uri!(get_survey(id)))
            .header(bearer_for("u1", config))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let view: SurveyView = response.into_json().await.unwrap();
        assert_eq!("Census", view.name);
        assert_eq!(1, view.questions.len());
        assert_eq!("Age", view.questions[0].title);

        // Delete.
        let response = client
            .delete(uri!(delete_survey(id)))
            .header(bearer_for("u1", config))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert!(store
            .surveys
            .find_one(&Filter::by_id(id))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .questions
            .find_many(&Filter::by_owner("u1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[backend_test]
    async fn requests_need_a_valid_bearer_token(client: Client) {
        let response = client.get(uri!(get_surveys)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .get(uri!(get_surveys))
            .header(bearer_for("u1", &Config::example2()))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn other_users_surveys_are_forbidden(client: Client) {
        let config = client.rocket().state::<Config>().unwrap();
        let response = client
            .post(uri!(create_survey))
            .header(bearer_for("alice", config))
            .header(ContentType::JSON)
            .body(json!(SurveySpec::example()).to_string())
            .dispatch()
            .await;
        let id = *response.into_json::<Created>().await.unwrap().id;

        let response = client
            .get(uri!(get_survey(id)))
            .header(bearer_for("bob", config))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client
            .delete(uri!(delete_survey(id)))
            .header(bearer_for("bob", config))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client
            .get(uri!(get_survey(Id::new())))
            .header(bearer_for("alice", config))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn update_applies_directives(client: Client, store: Store) {
        let config = client.rocket().state::<Config>().unwrap();
        let response = client
            .post(uri!(create_survey))
            .header(bearer_for("alice", config))
            .header(ContentType::JSON)
            .body(json!(SurveySpec::example()).to_string())
            .dispatch()
            .await;
        let id = *response.into_json::<Created>().await.unwrap().id;
        let age = store
            .surveys
            .find_one(&Filter::by_id(id))
            .await
            .unwrap()
            .unwrap()
            .questions_list[0];

        // IDs arrive as hex strings.
        let update = json!({
            "id": id.to_string(),
            "name": "Census 2",
            "questions": [
                { "id": age.to_string(), "title": "Age in years", "action": "UPDATE" }
            ],
        });
        let response = client
            .put(uri!(update_survey))
            .header(bearer_for("alice", config))
            .header(ContentType::JSON)
            .body(update.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client
            .get(uri!(get_survey(id)))
            .header(bearer_for("alice", config))
            .dispatch()
            .await;
        let view: SurveyView = response.into_json().await.unwrap();
        assert_eq!("Census 2", view.name);
        assert_eq!("Age in years", view.questions[0].title);
    }

    #[backend_test]
    async fn update_without_id_is_a_bad_request(client: Client) {
        let config = client.rocket().state::<Config>().unwrap();
        let response = client
            .put(uri!(update_survey))
            .header(bearer_for("alice", config))
            .header(ContentType::JSON)
            .body(json!({ "name": "Nameless" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }
}
