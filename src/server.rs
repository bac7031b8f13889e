// HTTP surface for the markdown generator, saved trips and activity search

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::budget::BudgetSummary;
use crate::config::GenerationConfig;
use crate::error::{ErrorKind, GenerationError};
use crate::itinerary::ItineraryGenerator;
use crate::llm::GenerativeModel;
use crate::markdown::MarkdownGenerator;
use crate::model::{
    Activity, GeneratedItinerary, NewItinerary, PublicProfile, TravelRequest, TripPreferences,
};
use crate::search::{attach_presentation, ActivitySearch};
use crate::storage::{MemStorage, Storage, StoreError, TripStore};

pub const HEALTH_PATH: &str = "/health";
pub const GENERATE_ITINERARY_PATH: &str = "/api/generate-itinerary";
pub const ITINERARY_PATH: &str = "/api/itinerary/:id";
pub const TRIPS_PATH: &str = "/api/trips";
pub const TRIP_PATH: &str = "/api/trips/:id";
pub const TRIP_BUDGET_PATH: &str = "/api/trips/:id/budget";
pub const DAY_ACTIVITIES_PATH: &str = "/api/trips/:id/days/:day_id/activities";
pub const ACTIVITY_PATH: &str = "/api/trips/:id/days/:day_id/activities/:activity_id";
pub const SEARCH_PATH: &str = "/api/search";

const GENERATE_FAILED_MESSAGE: &str = "Failed to generate itinerary. Please try again.";

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<ItineraryGenerator>,
    pub search: Arc<ActivitySearch>,
    pub markdown: Arc<MarkdownGenerator>,
    pub storage: Arc<dyn Storage>,
    pub trips: Arc<TripStore>,
}

impl AppState {
    pub fn new(model: Arc<dyn GenerativeModel>, generation: GenerationConfig) -> Self {
        Self {
            planner: Arc::new(ItineraryGenerator::new(model.clone(), generation.clone())),
            search: Arc::new(ActivitySearch::new(model.clone(), generation.clone())),
            markdown: Arc::new(MarkdownGenerator::new(model, generation)),
            storage: Arc::new(MemStorage::new()),
            trips: Arc::new(TripStore::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input data")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Generation { status: StatusCode, message: String },

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Validation(errors) => {
                let body = json!({ "success": false, "message": message, "errors": errors });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            other => {
                let code = match other {
                    ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                    ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
                    ApiError::Generation { status, .. } => status,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = json!({ "success": false, "message": message });
                (code, Json(body)).into_response()
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        let status = match e.kind() {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::SafetyBlock => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Quota => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Data | ErrorKind::Transport => StatusCode::BAD_GATEWAY,
            ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::Generation {
            status,
            message: e.user_message().to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TripNotFound(_)
            | StoreError::DayNotFound { .. }
            | StoreError::ActivityNotFound(_) => ApiError::NotFound(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

fn malformed_body(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(GENERATE_ITINERARY_PATH, post(generate_itinerary))
        .route(ITINERARY_PATH, get(get_itinerary))
        .route(TRIPS_PATH, get(list_trips).post(plan_trip))
        .route(TRIP_PATH, get(get_trip).put(update_trip).delete(delete_trip))
        .route(TRIP_BUDGET_PATH, get(trip_budget))
        .route(DAY_ACTIVITIES_PATH, put(upsert_activity))
        .route(ACTIVITY_PATH, axum::routing::delete(delete_activity))
        .route(SEARCH_PATH, get(search_activities))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

// Every field optional so missing ones become field errors rather than a rejection
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TravelRequestBody {
    origin: Option<String>,
    destination: Option<String>,
    stops: Option<String>,
    duration: Option<String>,
    notes: Option<String>,
}

impl TravelRequestBody {
    fn validate(self) -> Result<TravelRequest, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut required = |field: &str, label: &str, value: Option<String>| -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v,
                _ => {
                    errors.push(FieldError::new(field, format!("{} is required", label)));
                    String::new()
                }
            }
        };

        let origin = required("origin", "Origin", self.origin);
        let destination = required("destination", "Destination", self.destination);
        let duration = required("duration", "Duration", self.duration);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(TravelRequest {
            origin,
            destination,
            stops: self.stops,
            duration,
            notes: self.notes,
        })
    }
}

async fn generate_itinerary(
    State(st): State<AppState>,
    payload: Result<Json<TravelRequestBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload.map_err(malformed_body)?;
    let request = body.validate().map_err(ApiError::Validation)?;

    let content = st.markdown.generate(&request).await.map_err(|e| {
        error!(error = %e, kind = ?e.kind(), "error generating itinerary");
        ApiError::Internal(GENERATE_FAILED_MESSAGE.to_string())
    })?;

    let saved = st
        .storage
        .create_itinerary(NewItinerary {
            request,
            generated_content: content.clone(),
        })
        .await;
    info!(itinerary_id = %saved.id, "markdown itinerary generated");

    Ok(Json(json!({ "success": true, "id": saved.id, "content": content })))
}

async fn get_itinerary(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let Some(itinerary) = st.storage.get_itinerary(&id).await else {
        return Err(ApiError::NotFound("Itinerary not found".to_string()));
    };
    Ok(Json(json!({ "success": true, "itinerary": itinerary })))
}

#[derive(Debug, Deserialize)]
struct PlanTripRequest {
    #[serde(flatten)]
    preferences: TripPreferences,
    #[serde(default)]
    author: Option<PublicProfile>,
}

async fn plan_trip(
    State(st): State<AppState>,
    payload: Result<Json<PlanTripRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(malformed_body)?;
    let author = request.author.unwrap_or_else(PublicProfile::anonymous);

    let trip = st.planner.generate(&request.preferences, author).await?;
    let trip = st.trips.save(trip);
    Ok(Json(json!({ "success": true, "trip": trip })))
}

async fn list_trips(State(st): State<AppState>) -> Json<Value> {
    Json(json!({ "success": true, "trips": st.trips.list() }))
}

fn find_trip(st: &AppState, id: &str) -> Result<GeneratedItinerary, ApiError> {
    st.trips
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Trip not found".to_string()))
}

async fn get_trip(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let trip = find_trip(&st, &id)?;
    Ok(Json(json!({ "success": true, "trip": trip })))
}

async fn update_trip(
    State(st): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GeneratedItinerary>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(trip) = payload.map_err(malformed_body)?;
    if trip.id != id {
        return Err(ApiError::BadRequest(format!(
            "trip id {} does not match path {}",
            trip.id, id
        )));
    }
    let trip = st.trips.update(trip)?;
    Ok(Json(json!({ "success": true, "trip": trip })))
}

async fn delete_trip(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    st.trips.delete(&id)?;
    info!(trip_id = %id, "trip deleted");
    Ok(Json(json!({ "success": true })))
}

async fn trip_budget(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let trip = find_trip(&st, &id)?;
    let budget = BudgetSummary::from_itinerary(&trip);
    Ok(Json(json!({ "success": true, "budget": budget })))
}

async fn upsert_activity(
    State(st): State<AppState>,
    Path((id, day_id)): Path<(String, String)>,
    payload: Result<Json<Activity>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(activity) = payload.map_err(malformed_body)?;
    let activity = st.trips.upsert_activity(&id, &day_id, activity)?;
    Ok(Json(json!({ "success": true, "activity": activity })))
}

async fn delete_activity(
    State(st): State<AppState>,
    Path((id, day_id, activity_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    st.trips.delete_activity(&id, &day_id, &activity_id)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search_activities(
    State(st): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let results = st.search.search(&params.q).await.map_err(|e| {
        warn!(query = %params.q, kind = ?e.kind(), "search request failed");
        ApiError::from(e)
    })?;
    Ok(Json(json!({ "success": true, "results": attach_presentation(results) })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock_model::ScriptedModel;
    use crate::llm::ModelError;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(model: ScriptedModel) -> Router {
        router(AppState::new(Arc::new(model), GenerationConfig::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn markdown_reply() -> String {
        "Your Trip: Goa Getaway\nVibe Check: Sun.\n\n### Day 1: Arrive\n\n### Day 2: Beach\n\n### Day 3: Home".to_string()
    }

    fn trip_reply() -> String {
        json!({
            "trip_name": "Coastal Drive",
            "est_total_cost": 2400.0,
            "currency": "USD",
            "days": [{
                "date": "2025-07-01",
                "day_summary": "Big Sur.",
                "activities": [{
                    "title": "McWay Falls",
                    "start_time": "10:00",
                    "end_time": "11:00",
                    "duration_minutes": 60,
                    "cost": 10.0,
                    "currency": "USD",
                    "location": "Big Sur",
                    "notes": "Short walk.",
                    "confidence": "high",
                    "category": "Attraction"
                }]
            }]
        })
        .to_string()
    }

    fn trip_request() -> Value {
        json!({
            "trip_name": "California",
            "start_date": "2025-07-01",
            "end_date": "2025-07-02",
            "locations": "California, USA",
            "interests": "Nature",
            "pace": "relaxed",
            "budget_per_person": 1200,
            "num_travelers": 2,
            "must_visits": "Big Sur",
            "author": {"id": "user-3", "name": "Mike Johnson", "profilePhotoUrl": ""}
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(ScriptedModel::new());
        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generate_then_fetch_markdown_itinerary() {
        let app = test_app(ScriptedModel::replying(markdown_reply()));
        let (status, body) = send(
            &app,
            "POST",
            "/api/generate-itinerary",
            Some(json!({"origin": "Bhopal", "destination": "Goa", "duration": "3 Days"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], markdown_reply());
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", &format!("/api/itinerary/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["itinerary"]["id"], id.as_str());
        assert_eq!(body["itinerary"]["generatedContent"], markdown_reply());
        assert_eq!(body["itinerary"]["stops"], Value::Null);
    }

    #[tokio::test]
    async fn test_generate_validation_errors() {
        let model = ScriptedModel::replying(markdown_reply());
        let app = test_app(model);

        let (status, body) = send(
            &app,
            "POST",
            "/api/generate-itinerary",
            Some(json!({"destination": "Goa", "duration": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid input data");
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["origin", "duration"]);

        let (status, _) = send(&app, "POST", "/api/generate-itinerary", Some(json!({"origin": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_failure_is_generic_500() {
        let app = test_app(ScriptedModel::failing(ModelError::QuotaExceeded("quota".into())));
        let (status, body) = send(
            &app,
            "POST",
            "/api/generate-itinerary",
            Some(json!({"origin": "Bhopal", "destination": "Goa", "duration": "3 Days"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], GENERATE_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_unknown_itinerary_is_404() {
        let app = test_app(ScriptedModel::new());
        let (status, body) = send(&app, "GET", "/api/itinerary/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Itinerary not found");
    }

    #[tokio::test]
    async fn test_trip_lifecycle() {
        let app = test_app(ScriptedModel::replying(trip_reply()));

        let (status, body) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        assert_eq!(status, StatusCode::OK);
        let trip = &body["trip"];
        assert_eq!(trip["trip_name"], "Coastal Drive");
        assert_eq!(trip["must_visits"], "Big Sur");
        assert_eq!(trip["author"]["name"], "Mike Johnson");
        let trip_id = trip["id"].as_str().unwrap().to_string();
        let day_id = trip["days"][0]["id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, "GET", "/api/trips", None).await;
        assert_eq!(body["trips"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "GET", &format!("/api/trips/{}/budget", trip_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["budget"]["total_traveler_cost"], 20.0);

        let activity = serde_json::to_value(Activity::new_default()).unwrap();
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/trips/{}/days/{}/activities", trip_id, day_id),
            Some(activity.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/api/trips/{}", trip_id), None).await;
        assert_eq!(body["trip"]["days"][0]["activities"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!(
                "/api/trips/{}/days/{}/activities/{}",
                trip_id,
                day_id,
                activity["id"].as_str().unwrap()
            ),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "DELETE", &format!("/api/trips/{}", trip_id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &format!("/api/trips/{}", trip_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_trip_rejects_mismatched_id() {
        let app = test_app(ScriptedModel::replying(trip_reply()));
        let (_, body) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        let mut trip = body["trip"].clone();
        trip["id"] = Value::from("other");

        let (status, _) = send(&app, "PUT", "/api/trips/trip-x", Some(trip)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_trip_round_trip() {
        let app = test_app(ScriptedModel::replying(trip_reply()));
        let (_, body) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        let mut trip = body["trip"].clone();
        let trip_id = trip["id"].as_str().unwrap().to_string();
        let uri = format!("/api/trips/{}", trip_id);

        trip["trip_name"] = Value::from("Pacific Coast Highway");
        trip["isPublic"] = Value::from(true);
        let (status, body) = send(&app, "PUT", &uri, Some(trip)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trip"]["trip_name"], "Pacific Coast Highway");

        let (_, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(body["trip"]["trip_name"], "Pacific Coast Highway");
        assert_eq!(body["trip"]["isPublic"], true);
    }

    #[tokio::test]
    async fn test_update_trip_rejects_broken_days_and_dates() {
        let app = test_app(ScriptedModel::replying(trip_reply()));
        let (_, body) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        let original = body["trip"].clone();
        let uri = format!("/api/trips/{}", original["id"].as_str().unwrap());

        let mut repeated_day = original.clone();
        let mut copy = repeated_day["days"][0].clone();
        copy["date"] = Value::from("2025-07-02");
        repeated_day["days"].as_array_mut().unwrap().push(copy);
        let (status, _) = send(&app, "PUT", &uri, Some(repeated_day)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut reversed = original.clone();
        reversed["end_date"] = Value::from("2025-06-01");
        let (status, _) = send(&app, "PUT", &uri, Some(reversed)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(body["trip"], original);
    }

    #[tokio::test]
    async fn test_activity_with_blank_id_gets_one() {
        let app = test_app(ScriptedModel::replying(trip_reply()));
        let (_, body) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        let trip_id = body["trip"]["id"].as_str().unwrap().to_string();
        let day_id = body["trip"]["days"][0]["id"].as_str().unwrap().to_string();

        let mut activity = serde_json::to_value(Activity::new_default()).unwrap();
        activity["id"] = Value::from("");
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/trips/{}/days/{}/activities", trip_id, day_id),
            Some(activity),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["activity"]["id"].as_str().unwrap().starts_with("activity-"));
    }

    #[tokio::test]
    async fn test_trip_generation_errors_map_to_status() {
        let app = test_app(ScriptedModel::failing(ModelError::Blocked("SAFETY".into())));
        let (status, body) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["message"],
            "The request was blocked due to safety settings. Please adjust your input."
        );

        let app = test_app(ScriptedModel::replying("{\"days\": []}"));
        let (status, _) = send(&app, "POST", "/api/trips", Some(trip_request())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let reply = json!({"results": [
            {"title": "Alfama", "description": "Old town lanes.", "category": "Attraction"}
        ]});
        let app = test_app(ScriptedModel::replying(reply.to_string()));

        let (status, body) = send(&app, "GET", "/api/search?q=Lisbon", None).await;
        assert_eq!(status, StatusCode::OK);
        let item = &body["results"][0];
        assert_eq!(item["title"], "Alfama");
        assert!(item["id"].as_str().unwrap().starts_with("search-"));
        assert_eq!(item["imageUrl"], "https://source.unsplash.com/400x300/?Alfama");

        let (status, _) = send(&app, "GET", "/api/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
