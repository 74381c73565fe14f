// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{MethodRouter, delete, get, patch, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        admin, announcement, assignment, auth, course, home, instructor, question, quiz, ticket,
        user,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, author_middleware},
};

/// Restricts a method router to instructors and admins.
fn authored(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn(author_middleware))
}

/// Restricts a method router to admins.
fn administered(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn(admin_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public routes: auth, home and the news proxy.
/// * Everything else requires a bearer token; author and admin routes add
///   a capability gate on top.
/// * Applies global middleware (Trace, CORS) and injects the state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/home", get(home::home))
        .route("/api/home/check-role", get(home::check_role))
        .route("/api/news/external", get(home::external_news));

    let user_routes = Router::new()
        .route("/profile", get(user::get_profile))
        .route("/instructors", get(user::list_instructors))
        .route("/search", get(user::search_users))
        .route("/username/{username}", get(user::get_user_by_username))
        .route("/{id}", get(user::get_user))
        .route("/{id}/enrolled-courses", get(user::enrolled_courses))
        .route("/{id}/certificates", get(user::user_certificates));

    let course_routes = Router::new()
        .route("/", get(course::list_courses).merge(authored(post(course::create_course))))
        .route("/top3", get(course::top3_courses))
        .route("/category/{category}", get(course::list_by_category))
        .route("/student/{id}", get(course::student_courses))
        .route("/{id}", get(course::get_course))
        .route("/{id}/name", authored(patch(course::update_course_name)))
        .route(
            "/{id}/description",
            authored(patch(course::update_course_description)),
        )
        .route("/{id}/start", post(course::start_course))
        .route("/{id}/highscores", get(course::course_highscores))
        .route("/{id}/lessons", authored(post(course::create_lesson)))
        .route("/{id}/lessons/{lesson_id}", get(course::get_lesson))
        .route(
            "/{id}/lessons/{lesson_id}/complete",
            post(course::complete_lesson),
        );

    let question_routes = Router::new()
        .route("/", authored(post(question::create_question)))
        .route("/course/{course_id}", get(question::list_course_questions))
        .route("/{question_id}", authored(delete(question::delete_question)));

    let quiz_routes = Router::new()
        .route("/create", authored(post(quiz::create_quiz)))
        .route("/submit", post(quiz::submit_quiz))
        .route("/course/{course_id}", get(quiz::get_course_quiz))
        .route("/{quiz_id}", authored(put(quiz::update_quiz)))
        .route("/{quiz_id}/details", authored(get(quiz::get_quiz_details)));

    let announcement_routes = Router::new()
        .route(
            "/",
            get(announcement::list_announcements)
                .merge(administered(post(announcement::create_announcement))),
        )
        .route("/strings", get(announcement::list_announcement_strings))
        .route("/{id}", administered(delete(announcement::delete_announcement)));

    let ticket_routes = Router::new()
        .route("/", get(ticket::list_tickets).post(ticket::create_ticket))
        .route("/{id}/resolve", authored(patch(ticket::resolve_ticket)));

    let assignment_routes = Router::new()
        .route(
            "/",
            get(assignment::list_my_assignments)
                .merge(authored(post(assignment::create_assignment))),
        )
        .route("/course/{course_id}", get(assignment::list_course_assignments))
        .route(
            "/{id}",
            get(assignment::get_assignment)
                .merge(authored(delete(assignment::delete_assignment))),
        );

    let instructor_routes = Router::new()
        .route("/courses", get(instructor::list_courses))
        .route("/dashboard", get(instructor::dashboard))
        .route_layer(middleware::from_fn(author_middleware));

    let admin_routes = Router::new()
        .route("/register", post(admin::register_user))
        .route("/users", get(admin::list_users))
        .route("/users/all", get(admin::list_all_users))
        .route("/users/{id}/roles", patch(admin::update_roles))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/courses", get(admin::list_courses))
        .route("/activity-log", get(admin::activity_log))
        .route("/roles", get(admin::list_roles))
        .route_layer(middleware::from_fn(admin_middleware));

    // Auth first (outermost), then the capability gates inside each router.
    let protected_routes = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/announcements", announcement_routes)
        .nest("/api/tickets", ticket_routes)
        .nest("/api/assignments", assignment_routes)
        .nest("/api/instructor", instructor_routes)
        .nest("/api/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
