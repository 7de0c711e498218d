use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

mod allocations;
mod catalog;
mod organisation;
mod people;
mod roster;

#[cfg(test)]
mod tests;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/institutes",
            post(organisation::create_institute).get(organisation::list_institutes),
        )
        .route(
            "/institutes/:id",
            put(organisation::update_institute).delete(organisation::delete_institute),
        )
        .route(
            "/departments",
            post(organisation::create_department).get(organisation::list_departments),
        )
        .route(
            "/departments/:id",
            put(organisation::update_department).delete(organisation::delete_department),
        )
        .route("/years", post(organisation::create_year).get(organisation::list_years))
        .route("/years/:id", put(organisation::update_year).delete(organisation::delete_year))
        .route("/years/:id/status", put(organisation::set_year_status))
        .route(
            "/semesters",
            post(organisation::create_semester).get(organisation::list_semesters),
        )
        .route(
            "/semesters/:id",
            put(organisation::update_semester).delete(organisation::delete_semester),
        )
        .route("/semesters/:id/status", put(organisation::set_semester_status))
        .route("/classes", post(organisation::create_class).get(organisation::list_classes))
        .route(
            "/classes/:id",
            put(organisation::update_class).delete(organisation::delete_class),
        )
        .route("/subjects", post(catalog::create_subject).get(catalog::list_subjects))
        .route("/subjects/:id", put(catalog::update_subject).delete(catalog::delete_subject))
        .route("/teachers", get(people::list_teachers))
        .route("/teachers/:id", put(people::update_teacher).delete(people::delete_teacher))
        .route("/students", get(people::list_students))
        .route("/students/:id", put(people::update_student).delete(people::delete_student))
        .route(
            "/allocations",
            post(allocations::create_allocation).get(allocations::list_allocations),
        )
        .route(
            "/allocations/:id",
            put(allocations::update_allocation).delete(allocations::delete_allocation),
        )
        .route("/upload/users", post(roster::upload_users))
        .route("/hierarchy", get(organisation::hierarchy))
}
