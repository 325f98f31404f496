// Oxidized Research - agentic research assistant over arXiv and the web

pub mod config;
pub mod models;
pub mod types;
pub mod stream;
pub mod session;
pub mod agents;
pub mod llm;
pub mod search;    // Paper and web search (arXiv, DuckDuckGo, SerpAPI)
pub mod tools;
pub mod routes;
pub mod middleware;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
