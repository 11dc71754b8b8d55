use std::sync::{Arc, PoisonError};

use anyhow::Context;
use axum::{
    Extension, Json, Router,
    body::{Body, Bytes},
    extract::{Query, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use fourm_core::models::{
    ActionResponse, DEFAULT_FOOD_LIMIT, FoodFilter, FoodPatch, NewFood, NewInsightRequest,
    NewMeal, User, WellnessEntry, validate_date, validate_food, validate_meal_type,
    validate_nutrients, validate_user_token, validate_wellness,
};
use fourm_core::workbook::{SharedWorkbook, Workbooks};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
pub struct AppState {
    workbooks: Arc<Workbooks>,
}

impl AppState {
    pub fn new(workbooks: Workbooks) -> Self {
        Self {
            workbooks: Arc::new(workbooks),
        }
    }

    fn workbook(&self, user: &User) -> Result<SharedWorkbook, ApiError> {
        Ok(self
            .workbooks
            .open_for(&user.id)
            .context("failed to open workbook")?)
    }
}

// --- Request / Response types ---

#[derive(Deserialize, Default)]
struct ActionParams {
    action: Option<String>,
    date: Option<String>,
    category: Option<String>,
    verified: Option<String>,
    limit: Option<String>,
    query: Option<String>,
}

#[derive(Deserialize)]
struct TokenParam {
    token: Option<String>,
}

#[derive(Deserialize)]
struct FoodIdRequest {
    food_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized,
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("{err}"))
}

fn invalid_action(action: &str) -> ApiError {
    ApiError::BadRequest(format!("Invalid action: {action}"))
}

// --- Middleware ---

/// Resolve the caller from `?token=` or `Authorization: Bearer`.
/// The resolved [`User`] is attached to the request extensions.
async fn require_user(mut request: Request, next: Next) -> Response {
    let from_query = Query::<TokenParam>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(p)| p.token);
    let from_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    match from_query
        .or(from_header)
        .as_deref()
        .and_then(validate_user_token)
    {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}

/// OPTIONS requests are answered by the CORS layer with an empty body;
/// give them the `{"success":true}` acknowledgement clients expect.
async fn acknowledge_options(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let response = next.run(request).await;
    if !is_options || !response.status().is_success() {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(r#"{"success":true}"#))
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Helpers ---

/// A date parameter, defaulting to today when absent or blank.
fn date_or_today(date: Option<&str>) -> Result<NaiveDate, ApiError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => validate_date(d).map_err(bad_request),
        None => Ok(Local::now().date_naive()),
    }
}

fn check_optional_date(date: Option<&str>) -> Result<(), ApiError> {
    date_or_today(date).map(|_| ())
}

fn parse_body<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value).context("failed to serialize response")?)
}

fn food_filter(params: &ActionParams) -> FoodFilter {
    FoodFilter {
        category: params
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        verified_only: params.verified.as_deref() == Some("true"),
        limit: params
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_FOOD_LIMIT),
    }
}

// --- Handlers ---

async fn handle_get(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ActionParams>,
) -> Result<Json<Value>, ApiError> {
    let action = params
        .action
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Missing action".to_string()))?;
    tracing::info!(user = %user.id, action = %action, "GET");

    let workbook = state.workbook(&user)?;
    let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);

    let value = match action.as_str() {
        "getDailyStats" => {
            let date = date_or_today(params.date.as_deref())?;
            to_json(&db.get_daily_stats(date).context("database error")?)?
        }
        "getFoodDatabase" => {
            let foods = db
                .get_food_database(&food_filter(&params))
                .context("database error")?;
            json!({ "foods": foods })
        }
        "getMeals" => {
            let date = date_or_today(params.date.as_deref())?;
            json!({ "meals": db.get_meals(date).context("database error")? })
        }
        "searchFoods" => {
            let query = params
                .query
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("Missing query".to_string()))?;
            json!({ "foods": db.search_foods(query).context("database error")? })
        }
        "getUserSettings" => Value::Object(db.get_user_settings().context("database error")?),
        "getAIInsights" => {
            let date = date_or_today(params.date.as_deref())?;
            json!({ "insights": db.get_ai_insights(date).context("database error")? })
        }
        "getCorrelations" => {
            json!({ "correlations": db.list_correlations().context("database error")? })
        }
        other => return Err(invalid_action(other)),
    };
    Ok(Json(value))
}

async fn handle_post(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<ActionParams>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let mut body: Map<String, Value> = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?
    };
    let body_action = body.remove("action");
    body.remove("token");
    let action = params
        .action
        .clone()
        .or_else(|| body_action.as_ref().and_then(Value::as_str).map(str::to_string))
        .ok_or_else(|| ApiError::BadRequest("Missing action".to_string()))?;
    tracing::info!(user = %user.id, action = %action, "POST");

    let workbook = state.workbook(&user)?;

    let response = match action.as_str() {
        "logMeal" => {
            let mut meal: NewMeal = parse_body(body)?;
            meal.meal_type = validate_meal_type(&meal.meal_type).map_err(bad_request)?;
            check_optional_date(meal.date.as_deref())?;
            validate_nutrients(&meal.nutrients).map_err(bad_request)?;
            if meal.amount.is_some_and(|a| a < 0.0 || !a.is_finite()) {
                return Err(bad_request("amount must not be negative"));
            }
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            let logged = db.log_meal(&meal).context("failed to log meal")?;
            ActionResponse {
                meal_id: Some(logged.meal_id),
                ..ActionResponse::ok("Meal logged successfully")
            }
        }
        "addFood" => {
            let food: NewFood = parse_body(body)?;
            validate_food(&food).map_err(bad_request)?;
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            let added = db.add_food(&food).context("failed to add food")?;
            ActionResponse {
                food_id: Some(added.food_id),
                ..ActionResponse::ok("Food added to database")
            }
        }
        "updateFood" => {
            let patch: FoodPatch = parse_body(body)?;
            patch.validate().map_err(bad_request)?;
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            db.update_food(&patch.food_id, &patch)
                .context("failed to update food")?
                .ok_or_else(|| ApiError::NotFound("Food not found".to_string()))?;
            ActionResponse::ok("Food updated")
        }
        "deleteFood" => {
            let req: FoodIdRequest = parse_body(body)?;
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            if !db.delete_food(&req.food_id).context("failed to delete food")? {
                return Err(ApiError::NotFound("Food not found".to_string()));
            }
            ActionResponse::ok("Food deleted")
        }
        "updateUserSettings" => {
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            db.update_user_settings(&body)
                .context("failed to update settings")?;
            ActionResponse::ok("Settings updated")
        }
        "logWellness" => {
            let entry: WellnessEntry = parse_body(body)?;
            check_optional_date(entry.date.as_deref())?;
            validate_wellness(&entry).map_err(bad_request)?;
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            db.log_wellness(&entry)
                .context("failed to log wellness")?;
            ActionResponse::ok("Wellness data logged")
        }
        "generateAIInsight" => {
            let request: NewInsightRequest = parse_body(body)?;
            check_optional_date(request.date.as_deref())?;
            let db = workbook.lock().unwrap_or_else(PoisonError::into_inner);
            let insight = db
                .generate_ai_insight(&request)
                .context("failed to generate insight")?;
            ActionResponse {
                insight_id: Some(insight.insight_id),
                ..ActionResponse::ok("AI analysis scheduled")
            }
        }
        other => return Err(invalid_action(other)),
    };
    Ok(Json(to_json(&response)?))
}

fn action_routes() -> MethodRouter<AppState> {
    get(handle_get).post(handle_post)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", action_routes())
        .route("/exec", action_routes())
        .route_layer(middleware::from_fn(require_user))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(allowed_origins))
        .layer(middleware::from_fn(acknowledge_options))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    workbooks: Workbooks,
    port: u16,
    bind: &str,
    allowed_origins: &[String],
) -> anyhow::Result<()> {
    let app = build_router(AppState::new(workbooks), allowed_origins);

    if bind != "127.0.0.1" && bind != "localhost" {
        tracing::warn!(
            "Listening on {bind}. Tokens are only checked for an email shape; any device on your network can read or write any workbook."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    tracing::info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const TOKEN: &str = "ana@example.com";

    fn test_app() -> Router {
        build_router(
            AppState::new(Workbooks::in_memory()),
            &["http://localhost:5173".to_string()],
        )
    }

    async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    async fn get_action(app: &Router, query: &str) -> (StatusCode, Value) {
        send(
            app,
            axum::http::Request::get(format!("/?token={TOKEN}&{query}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn post_action(app: &Router, action: &str, body: Value) -> (StatusCode, Value) {
        send(
            app,
            axum::http::Request::post(format!("/exec?token={TOKEN}&action={action}"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    #[tokio::test]
    async fn missing_token_returns_401() {
        let app = test_app();
        let (status, json) = send(
            &app,
            axum::http::Request::get("/?action=getUserSettings")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn non_email_token_returns_401() {
        let app = test_app();
        let (status, _) = send(
            &app,
            axum::http::Request::get("/?action=getUserSettings&token=abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_header_authenticates() {
        let app = test_app();
        let (status, json) = send(
            &app,
            axum::http::Request::get("/?action=getUserSettings")
                .header("Authorization", format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["user_id"], TOKEN);
    }

    #[tokio::test]
    async fn options_succeeds_without_token() {
        let app = test_app();
        let (status, json) = send(
            &app,
            axum::http::Request::options("/exec")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let app = test_app();
        let response = app
            .oneshot(
                axum::http::Request::options("/")
                    .header("Origin", "http://localhost:5173")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app();
        let response = app
            .oneshot(
                axum::http::Request::get("/?action=getUserSettings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let app = test_app();
        let (status, json) = get_action(&app, "action=dropTables").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid action: dropTables");

        // GET actions are not POST actions.
        let (status, json) = post_action(&app, "getMeals", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid action: getMeals");

        let (status, json) = get_action(&app, "action=logMeal").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid action: logMeal");
    }

    #[tokio::test]
    async fn food_database_filters() {
        let app = test_app();
        let (status, json) = get_action(&app, "action=getFoodDatabase").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["foods"].as_array().unwrap().len(), 3);
        assert_eq!(json["foods"][0]["food_id"], "F001");
        assert_eq!(json["foods"][0]["calories"], 165.0);

        let (_, json) = get_action(&app, "action=getFoodDatabase&category=Fruit").await;
        assert_eq!(json["foods"].as_array().unwrap().len(), 1);
        assert_eq!(json["foods"][0]["food_name"], "Banana");

        let (_, json) = get_action(&app, "action=getFoodDatabase&limit=2").await;
        assert_eq!(json["foods"].as_array().unwrap().len(), 2);

        let (_, json) = get_action(&app, "action=getFoodDatabase&limit=abc").await;
        assert_eq!(json["foods"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn search_foods_is_case_insensitive() {
        let app = test_app();
        let (status, json) = get_action(&app, "action=searchFoods&query=CHICKEN").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["foods"].as_array().unwrap().len(), 1);
        assert_eq!(json["foods"][0]["food_id"], "F001");

        let (status, _) = get_action(&app, "action=searchFoods").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn log_meal_updates_daily_stats() {
        let app = test_app();
        let (status, json) = post_action(
            &app,
            "logMeal",
            json!({
                "date": "2024-06-15",
                "meal_type": "breakfast",
                "food_id": "F003",
                "food_name": "Banana",
                "amount": 120,
                "unit": "g",
                "calories": 106.8,
                "protein_g": 1.32,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Meal logged successfully");
        assert!(json["meal_id"].as_str().unwrap().starts_with('M'));

        let (_, meals) = get_action(&app, "action=getMeals&date=2024-06-15").await;
        assert_eq!(meals["meals"].as_array().unwrap().len(), 1);
        assert_eq!(meals["meals"][0]["meal_type"], "Breakfast");

        let (_, stats) = get_action(&app, "action=getDailyStats&date=2024-06-15").await;
        assert_eq!(stats["calories"], 106.8);
        assert_eq!(stats["day_of_week"], "Sat");
    }

    #[tokio::test]
    async fn log_meal_rejects_bad_meal_type_and_date() {
        let app = test_app();
        let (status, json) =
            post_action(&app, "logMeal", json!({ "meal_type": "brunch" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("Invalid meal type"));

        let (status, _) = post_action(
            &app,
            "logMeal",
            json!({ "meal_type": "lunch", "date": "June 1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_action_may_come_from_body() {
        let app = test_app();
        let (status, json) = send(
            &app,
            axum::http::Request::post(format!("/?token={TOKEN}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "action": "updateUserSettings", "calorie_goal": 2100 }).to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Settings updated");

        let (_, settings) = get_action(&app, "action=getUserSettings").await;
        assert_eq!(settings["calorie_goal"], 2100);
        assert!(settings.get("action").is_none());
        assert!(settings.get("token").is_none());
    }

    #[tokio::test]
    async fn malformed_body_returns_400() {
        let app = test_app();
        let (status, json) = send(
            &app,
            axum::http::Request::post(format!("/?token={TOKEN}&action=addFood"))
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn food_crud() {
        let app = test_app();
        let (status, json) = post_action(
            &app,
            "addFood",
            json!({ "food_name": "Greek Yogurt", "category": "Dairy", "calories": "59", "protein_g": 10.2 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Food added to database");
        let food_id = json["food_id"].as_str().unwrap().to_string();

        let (status, json) = post_action(
            &app,
            "updateFood",
            json!({ "food_id": food_id, "calories": 61 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Food updated");

        let (_, json) = get_action(&app, "action=getFoodDatabase&category=Dairy").await;
        assert_eq!(json["foods"][0]["calories"], 61.0);
        assert_eq!(json["foods"][0]["is_verified"], false);

        let (status, json) =
            post_action(&app, "deleteFood", json!({ "food_id": food_id })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Food deleted");

        let (status, json) =
            post_action(&app, "deleteFood", json!({ "food_id": food_id })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Food not found");

        let (status, _) =
            post_action(&app, "updateFood", json!({ "food_id": "F404", "calories": 1 })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_food_validation() {
        let app = test_app();
        let (status, _) = post_action(&app, "addFood", json!({ "food_name": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_action(
            &app,
            "addFood",
            json!({ "food_name": "Oil", "fat_g": -5 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wellness_lands_on_daily_stats() {
        let app = test_app();
        let (status, json) = post_action(
            &app,
            "logWellness",
            json!({ "date": "2024-06-15", "weight_kg": 74.8, "hydration_l": 2.5, "steps": 9000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Wellness data logged");

        let (_, stats) = get_action(&app, "action=getDailyStats&date=2024-06-15").await;
        assert_eq!(stats["weight_kg"], 74.8);
        assert_eq!(stats["water_l"], 2.5);
        assert_eq!(stats["steps"], 9000.0);
    }

    #[tokio::test]
    async fn wellness_out_of_range_is_rejected() {
        let app = test_app();
        let (status, json) = post_action(
            &app,
            "logWellness",
            json!({ "date": "2024-06-15", "mood": 50 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("mood"));

        let (status, _) = post_action(
            &app,
            "logWellness",
            json!({ "date": "2024-06-15", "weight_kg": -70 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, stats) = get_action(&app, "action=getDailyStats&date=2024-06-15").await;
        assert!(stats["mood"].is_null());
        assert!(stats["weight_kg"].is_null());
    }

    #[tokio::test]
    async fn generate_and_list_insights() {
        let app = test_app();
        let (status, json) =
            post_action(&app, "generateAIInsight", json!({ "date": "2024-06-15" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "AI analysis scheduled");
        let insight_id = json["insight_id"].as_str().unwrap().to_string();
        assert!(insight_id.starts_with('I'));

        let (_, json) = get_action(&app, "action=getAIInsights&date=2024-06-15").await;
        assert_eq!(json["insights"][0]["insight_id"], insight_id.as_str());
        assert_eq!(json["insights"][0]["type"], "daily_review");

        let (status, json) = get_action(&app, "action=getCorrelations").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["correlations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn workbooks_are_per_user() {
        let app = test_app();
        post_action(&app, "deleteFood", json!({ "food_id": "F001" })).await;

        let (_, mine) = get_action(&app, "action=getFoodDatabase").await;
        assert_eq!(mine["foods"].as_array().unwrap().len(), 2);

        let (_, theirs) = send(
            &app,
            axum::http::Request::get("/?token=bo@example.com&action=getFoodDatabase")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(theirs["foods"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app();
        let big_body = vec![b' '; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post(format!("/?token={TOKEN}&action=logMeal"))
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!("secret workbook path /home/ana/4M.db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}
