pub mod activity;
pub mod auth;
pub mod events;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::me),
    )
    .service(
        web::scope("/tasks")
            // Literal paths must be registered before the `{id}` matcher
            .service(tasks::stats_summary)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task)
            .service(tasks::add_comment)
            .service(tasks::assign_task),
    )
    .service(
        web::scope("/projects")
            .service(projects::create_project)
            .service(projects::list_projects)
            .service(projects::get_project)
            .service(projects::add_member),
    )
    .service(activity::recent_activity)
    .service(events::events);
}
