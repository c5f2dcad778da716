// Templar Language Server Protocol implementation
//
// Provides IDE features for templates with host-type hints:
// - Parse and type-reference diagnostics
// - Hover information (field, method, and function types)
// - Code completion (fields, methods, variables, functions)
// - Semantic tokens (full document and range)

mod convert;
mod documents;
mod server;

use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(server::TemplarLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
