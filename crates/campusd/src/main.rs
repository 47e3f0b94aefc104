//! Campus assistant daemon entry point.

use anyhow::Result;
use campusd::config::Config;
use campusd::evaluator::ResponseEvaluator;
use campusd::graph::RoutingGraph;
use campusd::handlers::StudentHandlers;
use campusd::intent::IntentClassifier;
use campusd::llm::OllamaGenerator;
use campusd::orchestrator::Orchestrator;
use campusd::retrieval::RetrievalPipeline;
use campusd::server::{self, AppState};
use campusd::store::{
    open_database, SqliteDocumentIndex, SqliteStudentStore, SqliteTurnStore,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("campusd v{} starting", campus_common::VERSION);

    let config = Config::load();

    // Store unreachable at startup is the one fatal failure
    let db = open_database(Path::new(&config.storage.db_path))?;

    let generator: Arc<OllamaGenerator> = Arc::new(OllamaGenerator::new(&config.llm));
    if !generator.is_available().await {
        warn!(
            "Ollama not reachable at {} - answers will degrade until it is",
            config.llm.ollama_url
        );
    }

    let students = Arc::new(SqliteStudentStore::new(db.clone()));
    let index = Arc::new(SqliteDocumentIndex::new(db.clone(), generator.clone()));
    let turns = Arc::new(SqliteTurnStore::new(db));

    let orchestrator = Arc::new(Orchestrator::new(
        RetrievalPipeline::new(generator.clone(), index, &config.retrieval),
        ResponseEvaluator::new(generator.clone()),
        RoutingGraph::new(
            IntentClassifier::new(generator.clone()),
            StudentHandlers::new(generator, students),
        ),
        turns.clone(),
    ));

    info!("campusd ready");
    server::run(AppState::new(orchestrator, turns), &config.server.bind_addr).await
}
