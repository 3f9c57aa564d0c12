use std::sync::{Mutex, MutexGuard};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use anyhow::Context;
use halal_finder::{
    config::Config,
    data::{self, Restaurant, Shelter, ShelterPatch},
    directory,
    rating::StarRating,
    recipe::{self, Category, IngredientSelection, RecipeClient},
    search, ListStore, RecipeError, RecordId, StoreError,
};

/// Shared by all workers. Each store sits behind its own lock and a request
/// holds it for the whole operation.
pub(super) struct ApiState {
    restaurants: Mutex<ListStore<Restaurant>>,
    shelters: Mutex<ListStore<Shelter>>,
    recipes: Option<RecipeClient>,
}

impl ApiState {
    pub(super) fn new(config: &Config) -> anyhow::Result<Self> {
        let recipes = match RecipeClient::new(&config.openai) {
            Ok(client) => {
                tracing::info!("recipe generation enabled with model {}", client.model());
                Some(client)
            }
            Err(RecipeError::MissingApiKey) => {
                tracing::warn!("OPENAI_API_KEY not set, recipe generation disabled");
                None
            }
            Err(e) => return Err(e).context("fail to build recipe client"),
        };
        Self::seeded(recipes)
    }

    fn seeded(recipes: Option<RecipeClient>) -> anyhow::Result<Self> {
        let restaurant_store = ListStore::with_records(data::initial_restaurants())
            .context("fail to seed restaurants")?;
        let shelter_store =
            ListStore::with_records(data::initial_shelters()).context("fail to seed shelters")?;
        Ok(Self {
            restaurants: Mutex::new(restaurant_store),
            shelters: Mutex::new(shelter_store),
            recipes,
        })
    }
}

#[derive(serde::Serialize)]
struct ErrJsonResp {
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub(super) enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),

    #[error("{0}")]
    BadRequest(String),

    #[error("recipe generation is not configured")]
    RecipesDisabled,

    #[error("state lock poisoned")]
    Poisoned,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::Validation { .. }) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::IndexOutOfRange { .. } | StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Recipe(RecipeError::NoIngredients) => StatusCode::BAD_REQUEST,
            Self::Recipe(RecipeError::MissingApiKey) | Self::RecipesDisabled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Recipe(_) => StatusCode::BAD_GATEWAY,
            Self::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!("request failed: {self}");
        HttpResponse::build(self.status_code()).json(ErrJsonResp {
            message: self.to_string(),
        })
    }
}

fn lock<T>(store: &Mutex<T>) -> Result<MutexGuard<'_, T>, ApiError> {
    store.lock().map_err(|_| {
        tracing::error!("a handler panicked while holding a store lock");
        ApiError::Poisoned
    })
}

pub(super) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(restaurants)
    .service(favorites)
    .service(search_restaurants)
    .service(restaurant)
    .service(toggle_favorite)
    .service(rate_restaurant)
    .service(shelters)
    .service(add_shelter)
    .service(edit_shelter)
    .service(delete_shelter)
    .service(donation_points)
    .service(ingredients)
    .service(generate_recipe);
}

#[derive(serde::Deserialize)]
pub(super) struct RecordPath {
    id: u64,
}

#[derive(serde::Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[actix_web::get("/api/v1/restaurants")]
pub(super) async fn restaurants(
    data: web::Data<ApiState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let store = lock(&data.restaurants)?;
    Ok(HttpResponse::Ok().json(search::search_by_name(&*store, &query.q)))
}

#[actix_web::get("/api/v1/restaurants/favorites")]
pub(super) async fn favorites(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let store = lock(&data.restaurants)?;
    Ok(HttpResponse::Ok().json(store.favorites()))
}

#[actix_web::get("/api/v1/restaurants/search")]
pub(super) async fn search_restaurants(
    data: web::Data<ApiState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let store = lock(&data.restaurants)?;
    Ok(HttpResponse::Ok().json(search::fuzzy_search(&*store, &query.q)))
}

#[actix_web::get("/api/v1/restaurants/{id}")]
pub(super) async fn restaurant(
    data: web::Data<ApiState>,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, ApiError> {
    let id = RecordId(path.id);
    let store = lock(&data.restaurants)?;
    let entry = store.get(id).ok_or(StoreError::NotFound(id))?;
    Ok(HttpResponse::Ok().json(entry))
}

#[actix_web::post("/api/v1/restaurants/{id}/favorite")]
pub(super) async fn toggle_favorite(
    data: web::Data<ApiState>,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, ApiError> {
    let mut store = lock(&data.restaurants)?;
    let is_favorite = store.toggle_favorite(RecordId(path.id))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "isFavorite": is_favorite })))
}

#[derive(serde::Deserialize)]
pub(super) struct RateBody {
    stars: StarRating,
}

#[actix_web::post("/api/v1/restaurants/{id}/rating")]
pub(super) async fn rate_restaurant(
    data: web::Data<ApiState>,
    path: web::Path<RecordPath>,
    body: web::Json<RateBody>,
) -> Result<HttpResponse, ApiError> {
    let mut store = lock(&data.restaurants)?;
    let entry = store.rate(RecordId(path.id), body.stars)?;
    Ok(HttpResponse::Ok().json(entry))
}

#[actix_web::get("/api/v1/shelters")]
pub(super) async fn shelters(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let store = lock(&data.shelters)?;
    Ok(HttpResponse::Ok().json(store.read_all()))
}

#[actix_web::post("/api/v1/shelters")]
pub(super) async fn add_shelter(
    data: web::Data<ApiState>,
    body: web::Json<Shelter>,
) -> Result<HttpResponse, ApiError> {
    let mut store = lock(&data.shelters)?;
    let id = store.create(body.into_inner())?;
    tracing::info!("added shelter {id}");
    Ok(HttpResponse::Created().json(store.get(id)))
}

#[actix_web::patch("/api/v1/shelters/{id}")]
pub(super) async fn edit_shelter(
    data: web::Data<ApiState>,
    path: web::Path<RecordPath>,
    body: web::Json<ShelterPatch>,
) -> Result<HttpResponse, ApiError> {
    let mut store = lock(&data.shelters)?;
    let entry = store.update_by_id(RecordId(path.id), body.into_inner())?;
    Ok(HttpResponse::Ok().json(entry))
}

#[actix_web::delete("/api/v1/shelters/{id}")]
pub(super) async fn delete_shelter(
    data: web::Data<ApiState>,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, ApiError> {
    let mut store = lock(&data.shelters)?;
    let removed = store.delete_by_id(RecordId(path.id))?;
    tracing::info!("deleted shelter {}", removed.id);
    Ok(HttpResponse::Ok().json(removed))
}

#[derive(serde::Deserialize)]
pub(super) struct CityQuery {
    #[serde(default)]
    city: String,
}

#[actix_web::get("/api/v1/donation-points")]
pub(super) async fn donation_points(query: web::Query<CityQuery>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "cities": directory::cities(),
        "points": directory::donation_points(&query.city),
    }))
}

#[derive(serde::Deserialize)]
pub(super) struct CategoryQuery {
    category: Option<String>,
}

#[actix_web::get("/api/v1/ingredients")]
pub(super) async fn ingredients(query: web::Query<CategoryQuery>) -> Result<HttpResponse, ApiError> {
    let category = match query.category.as_deref() {
        None | Some("All") => None,
        Some(name) => Some(
            Category::from_name(name)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown category {name}")))?,
        ),
    };
    Ok(HttpResponse::Ok().json(recipe::ingredients_in(category)))
}

#[derive(serde::Deserialize)]
pub(super) struct RecipeBody {
    ingredients: Vec<String>,
}

#[actix_web::post("/api/v1/recipes")]
pub(super) async fn generate_recipe(
    data: web::Data<ApiState>,
    body: web::Json<RecipeBody>,
) -> Result<HttpResponse, ApiError> {
    let client = data.recipes.as_ref().ok_or(ApiError::RecipesDisabled)?;
    let selection: IngredientSelection = body.ingredients.iter().collect();
    let recipe = client.generate(selection.as_slice()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "recipe": recipe })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use halal_finder::config::OpenAiConfig;
    use serde_json::{json, Value};

    fn state(recipes: Option<RecipeClient>) -> web::Data<ApiState> {
        web::Data::new(ApiState::seeded(recipes).unwrap())
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn test_list_and_search_restaurants() {
        let app = app!(state(None));

        let req = test::TestRequest::get().uri("/api/v1/restaurants").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["name"], "AL-Baik");
        assert_eq!(body[0]["id"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/restaurants?q=kebab")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Uncle Kebab");

        let req = test::TestRequest::get()
            .uri("/api/v1/restaurants/search?q=albk")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["name"], "AL-Baik");
    }

    #[actix_web::test]
    async fn test_favorite_and_rate() {
        let app = app!(state(None));

        let req = test::TestRequest::post()
            .uri("/api/v1/restaurants/2/favorite")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["isFavorite"], true);

        let req = test::TestRequest::get()
            .uri("/api/v1/restaurants/favorites")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["name"], "Uncle Kebab");

        let req = test::TestRequest::post()
            .uri("/api/v1/restaurants/1/rating")
            .set_json(json!({ "stars": 5 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["rating"], 4.5);
        assert_eq!(body["userRatings"], 101);
    }

    #[actix_web::test]
    async fn test_rejects_bad_stars_and_unknown_ids() {
        let app = app!(state(None));

        let req = test::TestRequest::post()
            .uri("/api/v1/restaurants/1/rating")
            .set_json(json!({ "stars": 4.2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/restaurants/42")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "no record with id 42");
    }

    #[actix_web::test]
    async fn test_shelter_crud() {
        let app = app!(state(None));

        let req = test::TestRequest::post()
            .uri("/api/v1/shelters")
            .set_json(json!({
                "name": "Night Shelter",
                "description": "Beds for the night",
                "location": "2400 Cypress St",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["id"], 3);

        let req = test::TestRequest::post()
            .uri("/api/v1/shelters")
            .set_json(json!({ "name": "No Place", "description": "", "location": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri("/api/v1/shelters/3")
            .set_json(json!({ "capacity": "80 people" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["capacity"], "80 people");
        assert_eq!(body["name"], "Night Shelter");

        let req = test::TestRequest::delete()
            .uri("/api/v1/shelters/1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/api/v1/shelters/1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/v1/shelters").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Safe Haven", "Night Shelter"]);
    }

    #[actix_web::test]
    async fn test_shelter_errors_are_json() {
        let app = app!(state(None));

        let req = test::TestRequest::patch()
            .uri("/api/v1/shelters/2")
            .set_json(json!({ "location": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "required field `location` is empty");

        let req = test::TestRequest::patch()
            .uri("/api/v1/shelters/9")
            .set_json(json!({ "capacity": "10" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/v1/shelters").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[1]["location"], "456 Elm Street, Townsville");
    }

    #[actix_web::test]
    async fn test_directory_and_ingredients() {
        let app = app!(state(None));

        let req = test::TestRequest::get()
            .uri("/api/v1/donation-points?city=Denton")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["points"][1]["name"], "Giving Grace");
        assert!(body["points"][1]["mapLink"].is_string());
        assert_eq!(body["cities"].as_array().unwrap().len(), 3);

        let req = test::TestRequest::get()
            .uri("/api/v1/ingredients?category=Dairy")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
        assert_eq!(body[0]["name"], "Milk");

        let req = test::TestRequest::get()
            .uri("/api/v1/ingredients?category=Sweets")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_recipe_disabled_without_key() {
        let app = app!(state(None));

        let req = test::TestRequest::post()
            .uri("/api/v1/recipes")
            .set_json(json!({ "ingredients": ["Rice"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_recipe_generation() {
        use wiremock::{
            matchers::{body_partial_json, method},
            Mock, MockServer, ResponseTemplate,
        };

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "messages": [{
                    "role": "user",
                    "content": recipe::recipe_prompt(&["Chickpeas", "Garlic"]),
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hummus" } }],
            })))
            .mount(&server)
            .await;

        let client = RecipeClient::new(&OpenAiConfig {
            api_key: Some("test-key".to_string()),
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();
        let app = app!(state(Some(client)));

        let req = test::TestRequest::post()
            .uri("/api/v1/recipes")
            .set_json(json!({ "ingredients": ["Chickpeas", "Garlic", "Chickpeas"] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["recipe"], "Hummus");

        let req = test::TestRequest::post()
            .uri("/api/v1/recipes")
            .set_json(json!({ "ingredients": ["", " "] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
