//! survey-sherpa - HTTP server for conversational survey filling.
//!
//! Reads configuration from `SURVEY_SHERPA__*` environment variables (and a
//! `.env` file when present); see `survey_sherpa::config`.

use std::error::Error;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use survey_sherpa::adapters::ai::{AnthropicConfig, AnthropicProvider, OpenAIConfig, OpenAIProvider};
use survey_sherpa::adapters::auth::{GoogleOAuthConfig, GoogleOAuthExchanger, StaticTokenExchanger};
use survey_sherpa::adapters::forms::{DemoFormSource, GoogleFormsConfig, GoogleFormsSource};
use survey_sherpa::adapters::http::{api_router, AuthHandlers, SurveyHandlers};
use survey_sherpa::adapters::storage::{FileResultExporter, InMemorySessionRepository};
use survey_sherpa::adapters::transcript::TracingTranscriptSink;
use survey_sherpa::application::{
    ExchangeCodeHandler, ExportResultsHandler, GetSessionHandler, OrchestratorConfig,
    PromptTemplates, QuestionGenerator, Reconciler, StartSurveyHandler, SubmitAnswerHandler,
    SurveyOrchestrator,
};
use survey_sherpa::config::{AiConfig, AiProvider, AppConfig, FormsConfig, ServerConfig};
use survey_sherpa::ports::{AIError, AIProvider, FormSource, SessionRepository, TokenExchanger};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let app = build_app(&config)?;
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        environment = ?config.server.environment,
        demo_form = config.forms.use_demo_form,
        "survey-sherpa listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_app(config: &AppConfig) -> Result<Router, BoxError> {
    let ai = build_ai_provider(&config.ai)?;
    let provider = ai.provider_info();
    info!(
        provider = %provider.name,
        model = %provider.model,
        max_context_tokens = provider.max_context_tokens,
        "AI provider ready"
    );
    let templates = Arc::new(match &config.session.prompt_file {
        Some(path) => {
            info!(path = %path.display(), "Loading prompt templates");
            PromptTemplates::from_yaml_file(path)?
        }
        None => PromptTemplates::default(),
    });

    let generator = QuestionGenerator::new(
        ai.clone(),
        templates.clone(),
        config.session.batch_size,
        config.ai.max_tokens,
    );
    let reconciler = Reconciler::new(ai, templates, config.ai.max_tokens);
    let orchestrator = Arc::new(SurveyOrchestrator::new(
        generator,
        reconciler,
        Arc::new(TracingTranscriptSink::new()),
        Arc::new(FileResultExporter::new(
            &config.session.export_dir,
            config.session.export_format,
        )),
        OrchestratorConfig {
            llm_timeout: config.session.llm_timeout(),
            malformed_retries: config.session.malformed_output_retries,
            max_iterations: config.session.max_iterations,
        },
    ));

    let store = match config.session.max_sessions {
        Some(max) => InMemorySessionRepository::with_capacity(max),
        None => InMemorySessionRepository::new(),
    };
    let repository: Arc<dyn SessionRepository> =
        Arc::new(store.with_retention(config.session.finished_retention()));
    let (form_source, exchanger) = build_form_access(&config.forms)?;

    let survey = SurveyHandlers::new(
        Arc::new(StartSurveyHandler::new(form_source, repository.clone(), orchestrator.clone())),
        Arc::new(SubmitAnswerHandler::new(repository.clone(), orchestrator)),
        Arc::new(GetSessionHandler::new(repository.clone())),
        Arc::new(ExportResultsHandler::new(repository)),
    );
    let auth = AuthHandlers::new(Arc::new(ExchangeCodeHandler::new(exchanger)));

    Ok(api_router(survey, auth)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
}

fn build_ai_provider(ai: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    match ai.primary_provider {
        AiProvider::Anthropic => {
            let mut config = AnthropicConfig::new(ai.anthropic_api_key.clone().unwrap_or_default())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries)
                .with_default_max_tokens(ai.max_tokens);
            if let Some(model) = &ai.model {
                config = config.with_model(model.clone());
            }
            if let Some(url) = &ai.base_url {
                config = config.with_base_url(url.clone());
            }
            Ok(Arc::new(AnthropicProvider::new(config)?))
        }
        AiProvider::OpenAI => {
            let mut config = OpenAIConfig::new(ai.openai_api_key.clone().unwrap_or_default())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries);
            if let Some(model) = &ai.model {
                config = config.with_model(model.clone());
            }
            if let Some(url) = &ai.base_url {
                config = config.with_base_url(url.clone());
            }
            Ok(Arc::new(OpenAIProvider::new(config)?))
        }
    }
}

fn build_form_access(
    forms: &FormsConfig,
) -> Result<(Arc<dyn FormSource>, Arc<dyn TokenExchanger>), BoxError> {
    if forms.use_demo_form {
        info!("Serving the built-in demo form");
        let source: Arc<dyn FormSource> = Arc::new(DemoFormSource::new());
        let exchanger: Arc<dyn TokenExchanger> = Arc::new(StaticTokenExchanger::default());
        return Ok((source, exchanger));
    }

    if !forms.has_oauth_client() {
        warn!("Google OAuth client is not configured; code exchange will be refused");
    }
    let timeout = std::time::Duration::from_secs(forms.timeout_secs);
    let source: Arc<dyn FormSource> = Arc::new(GoogleFormsSource::new(
        GoogleFormsConfig::default()
            .with_api_base_url(forms.api_base_url.clone())
            .with_timeout(timeout),
    )?);
    let exchanger: Arc<dyn TokenExchanger> = Arc::new(GoogleOAuthExchanger::new(
        GoogleOAuthConfig::new(
            forms.google_client_id.clone().unwrap_or_default(),
            forms.google_client_secret.clone().unwrap_or_default(),
            forms.redirect_uri.clone(),
        )
        .with_token_url(forms.token_url.clone())
        .with_timeout(timeout),
    )?);
    Ok((source, exchanger))
}

/// Listed origins only; any origin when none are configured outside production.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() && !server.is_production() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
