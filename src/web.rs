use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::http::{header, StatusCode};
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::Deserialize;

use crate::config::Curriculum;
use crate::display::{csv_bytes, export_filename, TimetableDocument, TimetableView};
use crate::error::TimetableError;
use crate::parser::{bindings_from_csv, bindings_from_json, TeacherBindings};
use crate::schedule::{generate_timetable, validate_grid, GeneratedTimetable, Grid, SeededRng};

/// Read-only server state; every request builds its own grid and rng
pub struct AppState {
    pub curriculum: Curriculum,
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
pub struct GenerateQuery {
    seed: Option<u64>,
}

/// Export body carrying a timetable previously returned by `/api/generate`
#[derive(Deserialize)]
struct ExportRequest {
    timetable: TimetableDocument,
}

fn error_response(status: StatusCode, error: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({"success": false, "error": error.to_string()}))
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected query: {}", err);
    let response = error_response(StatusCode::BAD_REQUEST, &err);
    InternalError::from_response(err, response).into()
}

fn is_csv(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("csv"))
        .unwrap_or(false)
}

// Bindings arrive as JSON ({"teachers": {...}} or a bare map) or as CSV when
// the content type says so. An empty body means no bindings.
fn parse_bindings(req: &HttpRequest, body: &[u8]) -> std::result::Result<TeacherBindings, TimetableError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(TeacherBindings::new());
    }
    if is_csv(req) {
        bindings_from_csv(body)
    } else {
        bindings_from_json(&String::from_utf8_lossy(body))
    }
}

fn run_generation(
    req: &HttpRequest,
    body: &[u8],
    query: &GenerateQuery,
    state: &AppState,
) -> std::result::Result<(GeneratedTimetable, u64), TimetableError> {
    let bindings = parse_bindings(req, body)?;
    let mut rng = match query.seed.or(state.seed) {
        Some(seed) => SeededRng::from_seed(seed),
        None => SeededRng::from_entropy(),
    };
    let seed = rng.seed();
    log::info!("Generating timetable for {} bindings (seed {})", bindings.len(), seed);
    Ok((generate_timetable(&state.curriculum, &bindings, &mut rng)?, seed))
}

// Generate endpoint: bindings in, grid view and shortfalls out
async fn generate(
    req: HttpRequest,
    body: web::Bytes,
    query: web::Query<GenerateQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (timetable, seed) = match run_generation(&req, &body, &query, &state) {
        Ok(generated) => generated,
        Err(e) => {
            log::warn!("Rejected bindings: {}", e);
            return Ok(error_response(StatusCode::BAD_REQUEST, e));
        }
    };

    let violations: Vec<String> = match validate_grid(&timetable.grid, &state.curriculum) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    };
    if !violations.is_empty() {
        log::error!("Generated grid failed validation: {:?}", violations);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "seed": seed,
        "complete": timetable.is_complete(),
        "timetable": TimetableView::new(&timetable.grid),
        "shortfalls": timetable.shortfalls,
        "violations": violations,
    })))
}

// A JSON body with a "timetable" key is the grid returned by /api/generate and
// is exported as-is. Anything else is read as bindings for a fresh generation.
fn export_grid(
    req: &HttpRequest,
    body: &[u8],
    query: &GenerateQuery,
    state: &AppState,
) -> std::result::Result<Grid, TimetableError> {
    if !is_csv(req) {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body) {
            if map.contains_key("timetable") {
                let request: ExportRequest = serde_json::from_value(serde_json::Value::Object(map))?;
                return request.timetable.into_grid(state.curriculum.teacher_match);
            }
        }
    }
    run_generation(req, body, query, state).map(|(timetable, _)| timetable.grid)
}

// Export endpoint: generated timetable (or bindings) in, CSV attachment out
async fn export(
    req: HttpRequest,
    body: web::Bytes,
    query: web::Query<GenerateQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let csv = export_grid(&req, &body, &query, &state).and_then(|grid| csv_bytes(&grid));
    match csv {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_filename()),
            ))
            .body(bytes)),
        Err(e) => {
            log::warn!("Export failed: {}", e);
            Ok(error_response(StatusCode::BAD_REQUEST, e))
        }
    }
}

async fn get_curriculum(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&state.curriculum))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/api/generate", web::post().to(generate))
        .route("/api/export", web::post().to(export))
        .route("/api/curriculum", web::get().to(get_curriculum));
}

pub async fn start_server(port: u16, curriculum: Curriculum, seed: Option<u64>) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState { curriculum, seed });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    const BINDINGS: &str = r#"{"teachers": {
        "IM51": "Dr. Rao", "IM52": "Prof Kumar", "IM53": "Meena", "IM54": "Suresh",
        "HS510": "Latha", "IMAEC59": "Gita", "AL58": "Vikram",
        "IM551": "Asha", "IM552": "Bala", "IM555": "Chitra"
    }}"#;

    fn state(seed: Option<u64>) -> web::Data<AppState> {
        web::Data::new(AppState {
            curriculum: Curriculum::default(),
            seed,
        })
    }

    #[actix_web::test]
    async fn test_generate_returns_grid_view() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/generate?seed=11")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(BINDINGS)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["seed"], 11);
        assert_eq!(body["complete"], true);
        assert_eq!(body["timetable"]["main"]["Monday"].as_array().unwrap().len(), 8);
        assert_eq!(body["timetable"]["batches"].as_object().unwrap().len(), 3);
        assert!(body["violations"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_server_seed_makes_requests_repeatable() {
        let app = test::init_service(App::new().app_data(state(Some(5))).configure(configure)).await;
        let mut bodies = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::post().uri("/api/generate").set_payload(BINDINGS).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            bodies.push(body);
        }
        assert_eq!(bodies[0]["timetable"], bodies[1]["timetable"]);
    }

    #[actix_web::test]
    async fn test_csv_bindings_and_empty_body() {
        let app = test::init_service(App::new().app_data(state(Some(3))).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header((header::CONTENT_TYPE, "text/csv"))
            .set_payload("subject,teacher\nIM51,Dr. Rao\n")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        // Every elective falls back to the same placeholder teacher
        let req = test::TestRequest::post().uri("/api/generate").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["complete"], false);
        let shortfalls = body["shortfalls"].as_array().unwrap();
        assert!(shortfalls.iter().any(|s| s["kind"] == "elective" && s["missing"] == 3));
    }

    #[actix_web::test]
    async fn test_bad_json_is_rejected() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::post().uri("/api/generate").set_payload("{not json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_export_returns_csv_attachment() {
        let app = test::init_service(App::new().app_data(state(Some(8))).configure(configure)).await;
        let req = test::TestRequest::post().uri("/api/export").set_payload(BINDINGS).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"timetable_"));
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("track,time,Monday"));
        assert_eq!(text.lines().count(), 33);
    }

    #[actix_web::test]
    async fn test_export_returns_the_generated_grid() {
        // No fixed seed: a second generation would almost surely differ
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::post().uri("/api/generate").set_payload(BINDINGS).to_request();
        let generated: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let document: TimetableDocument = serde_json::from_value(generated["timetable"].clone()).unwrap();
        let expected = csv_bytes(&document.into_grid(Default::default()).unwrap()).unwrap();

        let req = test::TestRequest::post()
            .uri("/api/export")
            .set_json(serde_json::json!({"timetable": generated["timetable"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert_eq!(body.to_vec(), expected);
    }

    #[actix_web::test]
    async fn test_export_rejects_timetable_with_break_session() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let cell = serde_json::json!({"subject": "X", "name": "X", "teacher": "T", "type": "core"});
        let row = serde_json::json!([null, null, null, null, cell, null, null, null]);
        let req = test::TestRequest::post()
            .uri("/api/export")
            .set_json(serde_json::json!({"timetable": {"main": {"Monday": row}}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_malformed_seed_gets_json_error() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::post().uri("/api/generate?seed=abc").set_payload(BINDINGS).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_curriculum_endpoint() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/curriculum").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["electives"].as_array().unwrap().len(), 3);
        assert_eq!(body["placeholder_teacher"], "Teacher");
    }
}
