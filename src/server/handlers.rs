//! HTTP handlers and routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use sima::autocomplete::suggest_states;
use sima::geojson::feature_collection;
use sima::models::Resolution;
use sima::resolver::{BoundaryProvider, ResolutionError};
use sima::session::{SearchSession, SessionStore, SessionView};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Application state shared across handlers
pub struct AppState<P> {
    pub sessions: SessionStore<P>,
    pub api_key_configured: bool,
}

type SharedState<P> = State<Arc<AppState<P>>>;
type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct TextParams {
    /// Search text
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    api_key: bool,
    sessions: usize,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    suggestions: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct SessionCreated {
    id: Uuid,
    view: SessionView,
}

/// All routes, with the map page at `/`
pub fn router<P>(state: Arc<AppState<P>>) -> Router
where
    P: BoundaryProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/health", get(health_handler::<P>))
        .route("/v1/suggest", get(suggest_handler))
        .route("/v1/resolve", get(resolve_handler::<P>))
        .route("/v1/resolve.geojson", get(resolve_geojson_handler::<P>))
        .route("/v1/sessions", post(create_session_handler::<P>))
        .route(
            "/v1/sessions/{id}",
            get(session_handler::<P>).delete(delete_session_handler::<P>),
        )
        .route("/v1/sessions/{id}/text", post(session_text_handler::<P>))
        .route("/v1/sessions/{id}/select", post(session_select_handler::<P>))
        .route("/v1/sessions/{id}/search", post(session_search_handler::<P>))
        .with_state(state)
}

/// HTTP status for each resolution failure
pub fn status_for(error: &ResolutionError) -> StatusCode {
    match error {
        ResolutionError::EmptyQuery => StatusCode::BAD_REQUEST,
        ResolutionError::NotFound(_)
        | ResolutionError::NoBoundaries { .. }
        | ResolutionError::BoundaryNotFound(_) => StatusCode::NOT_FOUND,
        ResolutionError::CoordinatesMissing(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ResolutionError::Network(_) => StatusCode::BAD_GATEWAY,
    }
}

fn to_response(error: ResolutionError) -> ApiError {
    tracing::error!("State boundary search failed: {}", error);
    (status_for(&error), error.to_string())
}

fn session_for<P: BoundaryProvider>(
    state: &AppState<P>,
    id: Uuid,
) -> Result<Arc<SearchSession<P>>, ApiError> {
    state
        .sessions
        .get(&id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown session {}", id)))
}

/// Health check endpoint
pub async fn health_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.api_key_configured { "ok" } else { "degraded" },
        api_key: state.api_key_configured,
        sessions: state.sessions.len(),
    })
}

/// Autocomplete over the known state names
pub async fn suggest_handler(Query(params): Query<TextParams>) -> Json<SuggestResponse> {
    Json(SuggestResponse {
        suggestions: suggest_states(&params.text),
    })
}

/// Resolve a query without touching any session
pub async fn resolve_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Query(params): Query<TextParams>,
) -> Result<Json<Resolution>, ApiError> {
    state
        .sessions
        .resolver()
        .resolve(&params.text)
        .await
        .map(Json)
        .map_err(to_response)
}

/// Same as [`resolve_handler`], rendered as GeoJSON
pub async fn resolve_geojson_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Query(params): Query<TextParams>,
) -> Result<Json<Value>, ApiError> {
    let resolution = state
        .sessions
        .resolver()
        .resolve(&params.text)
        .await
        .map_err(to_response)?;

    Ok(Json(feature_collection(&resolution)))
}

/// Start a session for one map client
pub async fn create_session_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
) -> (StatusCode, Json<SessionCreated>) {
    let (id, session) = state.sessions.create();
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            id,
            view: session.view(),
        }),
    )
}

pub async fn session_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(session_for(&state, id)?.view()))
}

pub async fn delete_session_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Typing in the search box
pub async fn session_text_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Path(id): Path<Uuid>,
    Json(params): Json<TextParams>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(session_for(&state, id)?.set_search_text(&params.text)))
}

/// Picking a suggestion
pub async fn session_select_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Path(id): Path<Uuid>,
    Json(params): Json<TextParams>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(session_for(&state, id)?.select_suggestion(&params.text)))
}

/// Run a search. The body is JSON; `{}` or an empty `text` searches the
/// session's current text.
pub async fn session_search_handler<P: BoundaryProvider>(
    State(state): SharedState<P>,
    Path(id): Path<Uuid>,
    Json(params): Json<TextParams>,
) -> Result<Json<SessionView>, ApiError> {
    let session = session_for(&state, id)?;
    let view = if params.text.is_empty() {
        session.search().await
    } else {
        session.search_for(&params.text).await
    };
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use sima::models::{BoundaryFeature, BoundaryGeometry, GeocodeMatch, LatLon};
    use sima::resolver::BoundaryResolver;
    use std::time::Duration;
    use tower::ServiceExt;

    /// "Kerala" answers slowly, "Atlantis" is unknown, anything else
    /// resolves to the name it was asked for
    struct StubProvider;

    impl BoundaryProvider for StubProvider {
        async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>, ResolutionError> {
            if query == "Kerala" {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            if query == "Atlantis" {
                return Ok(None);
            }
            Ok(Some(GeocodeMatch {
                name: Some(query.to_string()),
                lat: Some(10.0),
                lon: Some(76.0),
            }))
        }

        async fn boundaries_around(
            &self,
            _point: LatLon,
        ) -> Result<Vec<BoundaryFeature>, ResolutionError> {
            Ok(vec![BoundaryFeature {
                name: Some("any".to_string()),
                admin_level: Some(4),
                geometry: Some(BoundaryGeometry::Polygon(vec![vec![
                    [75.0, 9.0],
                    [77.0, 9.0],
                    [77.0, 12.0],
                    [75.0, 9.0],
                ]])),
            }])
        }
    }

    fn app() -> Router {
        router(Arc::new(AppState {
            sessions: SessionStore::new(
                BoundaryResolver::new(StubProvider),
                Duration::from_secs(60),
            ),
            api_key_configured: true,
        }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["phase"], "cleared");
        body["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ResolutionError::EmptyQuery), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&ResolutionError::NotFound("Atlantis".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ResolutionError::BoundaryNotFound("Kerala".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ResolutionError::CoordinatesMissing("Kerala".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ResolutionError::Network("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_suggest_route() {
        let app = app();
        let (status, body) = send(&app, "GET", "/v1/suggest?text=bengal", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"], json!(["West Bengal"]));
    }

    #[tokio::test]
    async fn test_resolve_routes() {
        let app = app();

        let (status, body) = send(&app, "GET", "/v1/resolve?text=Goa", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display_name"], "Goa");
        assert_eq!(body["boundary"][0][0], json!([9.0, 75.0]));

        let (status, _) = send(&app, "GET", "/v1/resolve?text=Atlantis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/v1/resolve?text=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/v1/resolve.geojson?text=Goa", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");
    }

    #[tokio::test]
    async fn test_search_body_without_text_uses_current_text() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/v1/sessions/{}/select", id),
            Some(json!({ "text": "Goa" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["search"], "Goa");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/v1/sessions/{}/search", id),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "resolved");
        assert_eq!(body["place_name"], "Goa");

        // A search needs a JSON body, even an empty object
        let (status, _) = send(&app, "POST", &format!("/v1/sessions/{}/search", id), None).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_clients_do_not_share_a_session() {
        let app = app();
        let first = new_session(&app).await;
        let second = new_session(&app).await;
        assert_ne!(first, second);

        let slow = {
            let app = app.clone();
            let uri = format!("/v1/sessions/{}/search", first);
            tokio::spawn(async move {
                send(&app, "POST", &uri, Some(json!({ "text": "Kerala" }))).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/v1/sessions/{}/search", second),
            Some(json!({ "text": "Goa" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["place_name"], "Goa");

        let (status, body) = slow.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "resolved");
        assert_eq!(body["place_name"], "Kerala");

        let (_, body) = send(&app, "GET", &format!("/v1/sessions/{}", first), None).await;
        assert_eq!(body["place_name"], "Kerala");
        let (_, body) = send(&app, "GET", &format!("/v1/sessions/{}", second), None).await;
        assert_eq!(body["place_name"], "Goa");
    }

    #[tokio::test]
    async fn test_typing_stays_in_one_session() {
        let app = app();
        let first = new_session(&app).await;
        let second = new_session(&app).await;

        let (_, body) = send(
            &app,
            "POST",
            &format!("/v1/sessions/{}/text", first),
            Some(json!({ "text": "ut" })),
        )
        .await;
        assert_eq!(body["suggestions"], json!(["Uttar Pradesh", "Uttarakhand"]));

        let (_, body) = send(&app, "GET", &format!("/v1/sessions/{}", second), None).await;
        assert_eq!(body["search"], "");
        assert_eq!(body["suggestions"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_sessions() {
        let app = app();
        let missing = format!("/v1/sessions/{}", Uuid::new_v4());
        let (status, _) = send(&app, "GET", &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/v1/sessions/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let id = new_session(&app).await;
        let uri = format!("/v1/sessions/{}", id);
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "POST", &format!("{}/text", uri), Some(json!({ "text": "go" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);

        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_str().unwrap().contains("/v1/sessions"));
    }
}
