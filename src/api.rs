use rocket::Route;

mod questions;
mod surveys;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(surveys::routes());
    routes.extend(questions::routes());
    routes
}
