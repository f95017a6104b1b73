//! HTTP Server for the Maintdesk import/export API.
//!
//! # API Endpoints
//!
//! | Method | Path                      | Description                              |
//! |--------|---------------------------|------------------------------------------|
//! | GET    | `/health`                 | Health check                             |
//! | GET    | `/api/entities`           | Entity kinds and their columns           |
//! | POST   | `/api/preview/{entity}`   | Upload CSV, validate and map it          |
//! | POST   | `/api/import/{entity}`    | Upload CSV and commit it to the store    |
//! | POST   | `/api/export/{entity}`    | Records in the body, CSV out             |
//! | GET    | `/api/export/{entity}`    | Stored records as CSV                    |
//! | GET    | `/api/template/{entity}`  | Example CSV for the entity               |
//! | GET    | `/api/logs`               | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, invalid_response, ImportResponse};
use crate::config::Config;
use crate::error::{PipelineError, ServerError, ServerResult, StoreError};
use crate::export::{export_entity, export_filename_today, template_artifact, ExportArtifact};
use crate::models::{EntityKind, MappedRecord};
use crate::parser::ParseOptions;
use crate::schema::catalogue;
use crate::store::{MemoryStore, RecordStore, RestStore};
use crate::transform::pipeline::{commit, export_from_store, prepare_bytes, ImportPreview};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState<S> {
    pub store: S,
    pub max_upload_bytes: usize,
}

impl<S> AppState<S> {
    pub fn new(store: S, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExportQuery {
    filename: Option<String>,
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Pipeline(err) => match err {
                PipelineError::Parse(_) | PipelineError::Registry(_) => StatusCode::BAD_REQUEST,
                PipelineError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Store(StoreError::Unsupported(_)) => StatusCode::BAD_REQUEST,
                PipelineError::Store(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Export(_) | PipelineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServerError::Pipeline(PipelineError::Invalid(validation)) => invalid_response(validation),
            ServerError::Pipeline(err) => error_response(&err.to_string()),
            other => error_response(&other.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the API router around a store.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: RecordStore + Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/entities", get(entities))
        .route("/api/preview/{entity}", post(preview))
        .route("/api/import/{entity}", post(import::<S>))
        .route("/api/export/{entity}", post(export_body).get(export_stored::<S>))
        .route("/api/template/{entity}", get(template))
        .route("/api/logs", get(sse_logs))
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server, backed by the REST store when one is configured.
pub async fn start_server(config: &Config) -> ServerResult<()> {
    if config.has_store() {
        let store = RestStore::from_config(config).map_err(PipelineError::from)?;
        serve(store, config).await
    } else {
        log::warn!("No store configured, imports are kept in memory");
        serve(MemoryStore::new(), config).await
    }
}

async fn serve<S>(store: S, config: &Config) -> ServerResult<()>
where
    S: RecordStore + Clone + Send + Sync + 'static,
{
    let app = router(AppState::new(store, config.max_upload_bytes));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    log::info!("🚀 Maintdesk server running on http://localhost:{}", config.port);
    log::info!("   POST /api/preview/{{entity}} - Validate a CSV file");
    log::info!("   POST /api/import/{{entity}}  - Import a CSV file");
    log::info!("   GET  /api/logs              - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "maintdesk",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "entities": "GET /api/entities",
            "preview": "POST /api/preview/{entity}",
            "import": "POST /api/import/{entity}",
            "export": "POST|GET /api/export/{entity}",
            "template": "GET /api/template/{entity}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn entities() -> Json<Value> {
    Json(json!(catalogue()))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn preview(Path(entity): Path<String>, multipart: Multipart) -> ServerResult<Json<ImportPreview>> {
    let kind = entity_kind(&entity)?;
    let bytes = read_upload(multipart).await?;
    Ok(Json(prepare_bytes(&bytes, kind, &ParseOptions::default())?))
}

async fn import<S>(
    State(state): State<AppState<S>>,
    Path(entity): Path<String>,
    multipart: Multipart,
) -> ServerResult<Json<ImportResponse>>
where
    S: RecordStore + Clone + Send + Sync + 'static,
{
    let kind = entity_kind(&entity)?;
    let bytes = read_upload(multipart).await?;
    let preview = prepare_bytes(&bytes, kind, &ParseOptions::default())?;
    let report = commit(&state.store, preview).await?;
    Ok(Json(ImportResponse::from(report)))
}

async fn export_body(
    Path(entity): Path<String>,
    Query(query): Query<ExportQuery>,
    Json(records): Json<Vec<MappedRecord>>,
) -> ServerResult<Response> {
    let kind = entity_kind(&entity)?;
    let filename = query.filename.unwrap_or_else(|| export_filename_today(kind));
    let artifact = export_entity(&records, kind, filename).map_err(PipelineError::from)?;
    Ok(csv_response(artifact))
}

async fn export_stored<S>(State(state): State<AppState<S>>, Path(entity): Path<String>) -> ServerResult<Response>
where
    S: RecordStore + Clone + Send + Sync + 'static,
{
    let kind = entity_kind(&entity)?;
    let artifact = export_from_store(&state.store, kind).await?;
    Ok(csv_response(artifact))
}

async fn template(Path(entity): Path<String>) -> ServerResult<Response> {
    let kind = entity_kind(&entity)?;
    let artifact = template_artifact(kind).map_err(PipelineError::from)?;
    Ok(csv_response(artifact))
}

fn entity_kind(name: &str) -> ServerResult<EntityKind> {
    Ok(name.parse::<EntityKind>().map_err(PipelineError::from)?)
}

/// Bytes of the `file` field.
async fn read_upload(mut multipart: Multipart) -> ServerResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("unknown").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        log_info(format!("📄 New upload: {} ({} bytes)", file_name, bytes.len()));
        return Ok(bytes.to_vec());
    }
    Err(ServerError::BadRequest("No file provided".to_string()))
}

fn csv_response(artifact: ExportArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, artifact.content_type()),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.content,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-MAINTDESK-BOUNDARY";

    fn app(store: MemoryStore) -> Router {
        router(AppState::new(store, 1024 * 1024))
    }

    fn upload(uri: &str, csv: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
            b = BOUNDARY,
            csv = csv
        );
        Request::post(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MemoryStore::new())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "maintdesk");
    }

    #[tokio::test]
    async fn test_entities_lists_all_kinds() {
        let response = app(MemoryStore::new())
            .oneshot(Request::get("/api/entities").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), EntityKind::ALL.len());
        assert_eq!(json[0]["key"], "customers");
    }

    #[tokio::test]
    async fn test_preview_upload() {
        let response = app(MemoryStore::new())
            .oneshot(upload(
                "/api/preview/spare_parts",
                "code,name,price,warranty\nSP001,Screen,150.00,true",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["validation"]["isValid"], true);
        assert_eq!(json["data"][0]["price"], 150.0);
        assert_eq!(json["data"][0]["warranty"], true);
    }

    #[tokio::test]
    async fn test_import_writes_to_store() {
        let store = MemoryStore::new();
        let response = app(store.clone())
            .oneshot(upload(
                "/api/import/customers",
                "name,phone,address,type\nJohn Doe,+966501234567,Riyadh,consumer",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["imported"], 1);
        assert_eq!(store.count(EntityKind::Customers), 1);
    }

    #[tokio::test]
    async fn test_invalid_import_is_unprocessable() {
        let store = MemoryStore::new();
        let response = app(store.clone())
            .oneshot(upload(
                "/api/import/customers",
                "name,phone,address,type\nX,not-a-phone,Riyadh,consumer",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["validation"]["errors"][0], "Row 1: Invalid phone value");
        assert_eq!(store.count(EntityKind::Customers), 0);
    }

    #[tokio::test]
    async fn test_unknown_entity_is_bad_request() {
        let response = app(MemoryStore::new())
            .oneshot(Request::get("/api/template/invoices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("invoices"));
    }

    #[tokio::test]
    async fn test_parse_error_is_bad_request() {
        let response = app(MemoryStore::new())
            .oneshot(upload("/api/preview/spare_parts", "code,name,price,warranty\nSP001,Screen"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().starts_with("CSV parsing errors"));
    }

    #[tokio::test]
    async fn test_template_download() {
        let response = app(MemoryStore::new())
            .oneshot(Request::get("/api/template/inventory").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"inventory_template.csv\""
        );
        assert!(body_text(response).await.starts_with("part_code,center_name,"));
    }

    #[tokio::test]
    async fn test_export_posted_records() {
        let records = json!([{ "code": "SP001", "name": "Screen", "price": 150.0, "warranty": true }]);
        let response = app(MemoryStore::new())
            .oneshot(
                Request::post("/api/export/spare_parts?filename=parts.csv")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(records.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"parts.csv\""
        );
        assert_eq!(body_text(response).await, "code,name,price,warranty\nSP001,Screen,150,true\n");
    }

    #[tokio::test]
    async fn test_export_stored_records() {
        let store = MemoryStore::new();
        store.seed(
            EntityKind::Customers,
            vec![json!({ "name": "A", "phone": "+966501234567", "address": "Riyadh", "type": "consumer" })
                .as_object()
                .cloned()
                .unwrap()],
        );
        let response = app(store)
            .oneshot(Request::get("/api/export/customers").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "name,phone,address,type\nA,+966501234567,Riyadh,consumer\n"
        );
    }

    #[test]
    fn test_status_mapping() {
        let store_err = ServerError::from(PipelineError::from(StoreError::Status {
            status: 500,
            body: "boom".into(),
        }));
        assert_eq!(store_err.status(), StatusCode::BAD_GATEWAY);

        let unsupported = ServerError::from(PipelineError::from(StoreError::Unsupported(EntityKind::Devices)));
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ServerError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    }
}
