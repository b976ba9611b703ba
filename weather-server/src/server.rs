use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{net::SocketAddr, path::PathBuf};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use weather_core::{
    AllWeather, Forecast, ToolResult, WeatherSnapshot,
    tools::{self, GET_ALL_WEATHER, GET_CURRENT_WEATHER, GET_WEATHER_FORECAST, ToolsDefinition},
};

use crate::{
    chat::{AppState, ChatRequest, ChatResponse},
    error::ApiError,
};

pub const SERVICE_NAME: &str = "Weather LLM Demo";

#[derive(Debug, Clone)]
struct ServerState {
    app: AppState,
    static_dir: PathBuf,
}

pub fn router(app: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/weather/current", get(current_weather))
        .route("/api/weather/forecast", get(forecast))
        .route("/api/weather/all", get(all_weather))
        .route("/api/mcp/tools", get(mcp_tools))
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .route("/api/config", get(config))
        .layer(CorsLayer::permissive())
        .with_state(ServerState { app, static_dir })
}

pub async fn serve(app: AppState, static_dir: PathBuf, addr: SocketAddr) -> anyhow::Result<()> {
    let station = app.dispatcher.agent().station_id().to_string();
    let model = app.llm.model().to_string();
    let demo = app.llm.is_demo();

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!("🌤️  Starting {SERVICE_NAME} server");
    tracing::info!("📍 Station: {station}");
    tracing::info!("🤖 Model: {model}");
    if demo {
        tracing::info!("🧪 No API key configured, chat replies come from demo mode");
    }
    tracing::info!("🔗 Open http://{local_addr} in your browser");

    axum::serve(listener, router(app, static_dir)).await?;
    Ok(())
}

async fn index(State(state): State<ServerState>) -> Response {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => Json(json!({ "message": "Weather LLM Demo API - Please create index.html" }))
            .into_response(),
    }
}

async fn current_weather(State(state): State<ServerState>) -> Result<Json<WeatherSnapshot>, ApiError> {
    match state.app.dispatcher.call_tool(GET_CURRENT_WEATHER, None).await.result {
        ToolResult::Current(snapshot) => Ok(Json(snapshot)),
        _ => Err(ApiError::UnexpectedToolResult {
            tool: GET_CURRENT_WEATHER.to_string(),
        }),
    }
}

async fn forecast(State(state): State<ServerState>) -> Result<Json<Forecast>, ApiError> {
    match state.app.dispatcher.call_tool(GET_WEATHER_FORECAST, None).await.result {
        ToolResult::Forecast(forecast) => Ok(Json(forecast)),
        _ => Err(ApiError::UnexpectedToolResult {
            tool: GET_WEATHER_FORECAST.to_string(),
        }),
    }
}

async fn all_weather(State(state): State<ServerState>) -> Result<Json<AllWeather>, ApiError> {
    match state.app.dispatcher.call_tool(GET_ALL_WEATHER, None).await.result {
        ToolResult::All(all) => Ok(Json(all)),
        _ => Err(ApiError::UnexpectedToolResult {
            tool: GET_ALL_WEATHER.to_string(),
        }),
    }
}

async fn mcp_tools() -> Json<ToolsDefinition> {
    Json(tools::tools_definition())
}

async fn chat(
    State(state): State<ServerState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!(include_forecast = request.include_forecast, "chat request");
    state.app.answer(&request).await.map(Json)
}

async fn health(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "station": state.app.config.station_id,
    }))
}

async fn config(State(state): State<ServerState>) -> Json<Value> {
    let config = &state.app.config;
    Json(json!({
        "llm_model": config.llm.model,
        "station_id": config.station_id,
        "location": config.location,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;
    use weather_core::{CompletionClient, Config, ToolDispatcher, WeatherAgent, WeatherSource};

    #[derive(Debug)]
    struct OfflineSource;

    #[async_trait]
    impl WeatherSource for OfflineSource {
        async fn fetch_current(&self) -> anyhow::Result<WeatherSnapshot> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn fetch_forecast(&self) -> anyhow::Result<Forecast> {
            Err(anyhow::anyhow!("timed out"))
        }
    }

    fn app(static_dir: PathBuf) -> Router {
        let config = Config::default();
        let agent = WeatherAgent::new(
            Arc::new(OfflineSource),
            config.station_id.clone(),
            config.location.clone(),
        );
        let llm = CompletionClient::new(None, &config.llm.base_url, &config.llm.model, Duration::from_secs(1))
            .unwrap();

        router(AppState::new(config, ToolDispatcher::new(agent), llm), static_dir)
    }

    fn empty_dir() -> PathBuf {
        PathBuf::from("/nonexistent/weather-llm-static")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        send(app(empty_dir()), Request::get(uri).body(Body::empty()).unwrap()).await
    }

    fn post_chat(body: Value) -> Request<Body> {
        Request::post("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn chat_in_demo_mode_answers_with_weather() {
        let (status, body) = send(
            app(empty_dir()),
            post_chat(json!({ "message": "Ciao, come mi vesto oggi?", "include_forecast": true })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body["response"].as_str().unwrap().is_empty());
        assert!(body["weather_data"]["current"]["temperature_c"].is_number());
        assert_eq!(body["tool_calls"], json!(["get_all_weather"]));
        assert!(body["response"].as_str().unwrap().contains("Giornata piacevole"));
    }

    #[tokio::test]
    async fn english_question_gets_english_reply_with_default_forecast() {
        let (status, body) = send(
            app(empty_dir()),
            post_chat(json!({ "message": "Hello, what's the weather?" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["response"],
            "It's 24.5°C in Rome, Italy with Partly Cloudy. Pleasant weather!"
        );
    }

    #[tokio::test]
    async fn english_question_without_forecast_gets_english_reply() {
        let (_, body) = send(
            app(empty_dir()),
            post_chat(json!({ "message": "Hello, what's the weather?", "include_forecast": false })),
        )
        .await;

        assert!(body["response"].as_str().unwrap().starts_with("It's 24.5°C"));
    }

    #[tokio::test]
    async fn weather_endpoints_serve_fallback_data() {
        let (status, current) = get_json("/api/weather/current").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(current["temperature_c"], 24.5);
        assert_eq!(current["note"], "Using fallback data");

        let (status, forecast) = get_json("/api/weather/forecast").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(forecast["today"]["high_c"], 28.0);

        let (status, all) = get_json("/api/weather/all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["location"], "Rome, Italy");
        assert_eq!(all["station_id"], "IROME8278");
    }

    #[tokio::test]
    async fn lists_tools() {
        let (status, body) = get_json("/api/mcp/tools").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "1.0");
        assert_eq!(body["tools"].as_array().unwrap().len(), 3);
        assert_eq!(body["tools"][2]["name"], "get_all_weather");
    }

    #[tokio::test]
    async fn health_and_config() {
        let (_, health) = get_json("/api/health").await;
        assert_eq!(health, json!({ "status": "healthy", "service": SERVICE_NAME, "station": "IROME8278" }));

        let (_, config) = get_json("/api/config").await;
        assert_eq!(config["llm_model"], "openai/gpt-3.5-turbo");
        assert_eq!(config["location"], "Rome, Italy");
    }

    #[tokio::test]
    async fn index_placeholder_without_page() {
        let (status, body) = get_json("/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Weather LLM Demo API - Please create index.html");
    }

    #[tokio::test]
    async fn index_serves_page_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Meteo</h1>").unwrap();

        let response = app(dir.path().to_path_buf())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Meteo</h1>");
    }
}
