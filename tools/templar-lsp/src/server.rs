//! Templar language server.
//!
//! Routes document lifecycle notifications into the store, re-validates on
//! every mutation, and serves hover, completion, and semantic tokens from
//! the analysis engine. The initialize/shutdown state machine, message
//! framing, and unknown-method replies are handled by the tower-lsp
//! runtime; everything behind the `LanguageServer` trait below runs in the
//! `Initialized` state.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use templar_analysis::{semantic, CompletionKind};
use templar_parse::parse;
use templar_registry::{StaticRegistry, TypeRegistry, WorkspaceSnapshot};
use templar_source::{offset_from_protocol, Span};
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::convert;
use crate::documents::DocumentStore;

/// Per-connection server state. Constructed once per connection; the
/// tower-lsp runtime tears it down on `exit`.
pub struct TemplarLanguageServer {
    client: Client,
    documents: DocumentStore,
    registry: RwLock<Arc<dyn TypeRegistry>>,
    root: RwLock<PathBuf>,
}

impl TemplarLanguageServer {
    pub fn new(client: Client) -> Self {
        TemplarLanguageServer {
            client,
            documents: DocumentStore::new(),
            registry: RwLock::new(Arc::new(StaticRegistry::new())),
            root: RwLock::new(PathBuf::from(".")),
        }
    }

    /// Snapshot the pieces one analysis pass needs. The locks are released
    /// before any await point.
    fn analysis_context(&self) -> (Arc<dyn TypeRegistry>, PathBuf) {
        let registry = Arc::clone(&*self.registry.read());
        let root = self.root.read().clone();
        (registry, root)
    }

    fn compute_diagnostics(&self, text: &str) -> Vec<Diagnostic> {
        match parse(text) {
            Err(e) => vec![convert::parse_error(text, &e)],
            Ok(parsed) => {
                let (registry, root) = self.analysis_context();
                let overlay = self.documents.overlay();
                let snap = WorkspaceSnapshot {
                    root: &root,
                    overlay: &overlay,
                };
                templar_analysis::check(&parsed, registry.as_ref(), snap)
                    .iter()
                    .map(|d| convert::diagnostic(text, d))
                    .collect()
            }
        }
    }

    /// Re-validate a document and publish the full replacement set.
    async fn refresh_diagnostics(&self, uri: Url) {
        let version = self.documents.version(&uri);
        let content = match self.documents.get(&uri) {
            Ok(content) => content,
            Err(e) => {
                // Notifications for unknown documents are dropped with a log.
                tracing::warn!(error = %e, "skipping diagnostics");
                return;
            }
        };
        let diagnostics = self.compute_diagnostics(&content);
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }

    /// Snapshot a document for a request; a miss anywhere is a request
    /// error, per the document-not-found policy.
    fn document_for_request(&self, uri: &Url) -> Result<Arc<str>> {
        self.documents
            .get(uri)
            .map_err(|e| Error::invalid_params(e.to_string()))
    }

    fn encoded_tokens(&self, content: &str, range: Option<Span>) -> Option<Vec<SemanticToken>> {
        let parsed = parse(content).ok()?;
        let raw = semantic::collect(content, &parsed);
        let encoded = match range {
            Some(span) => semantic::encode_range(content, &raw, span),
            None => semantic::encode(content, &raw),
        };
        Some(convert::semantic_tokens(&encoded))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for TemplarLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root) = params.root_uri.as_ref().and_then(|u| u.to_file_path().ok()) {
            *self.registry.write() = Arc::new(StaticRegistry::load(&root));
            *self.root.write() = root;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_owned(), "$".to_owned()]),
                    ..Default::default()
                }),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: convert::legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: Some(true),
                            ..Default::default()
                        },
                    ),
                ),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "templar-lsp".to_owned(),
                version: Some(env!("CARGO_PKG_VERSION").to_owned()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "templar language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        tracing::debug!(uri = %doc.uri, version = doc.version, "didOpen");
        self.documents
            .open(&doc.uri, &doc.language_id, doc.version, doc.text);
        self.refresh_diagnostics(doc.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Err(e) = self.documents.change(
            &uri,
            params.text_document.version,
            &params.content_changes,
        ) {
            tracing::warn!(error = %e, "dropping didChange");
            return;
        }
        self.refresh_diagnostics(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(text) = params.text {
            let replace = TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text,
            };
            if let Err(e) = self
                .documents
                .change(&uri, self.documents.version(&uri).unwrap_or(0), &[replace])
            {
                tracing::warn!(error = %e, "dropping didSave text");
            }
        }
        self.refresh_diagnostics(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        // Closing clears the published set; later requests re-read from disk.
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let content = self.document_for_request(&uri)?;
        let Ok(parsed) = parse(&content) else {
            return Ok(None);
        };

        let offset = offset_from_protocol(&content, position.line, position.character);
        let (registry, root) = self.analysis_context();
        let overlay = self.documents.overlay();
        let snap = WorkspaceSnapshot {
            root: &root,
            overlay: &overlay,
        };
        let Some(result) = templar_analysis::hover(
            &parsed,
            registry.as_ref(),
            snap,
            u32::try_from(offset).unwrap_or(u32::MAX),
        ) else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: result.contents.join("\n\n"),
            }),
            range: Some(convert::span_to_range(&content, result.span)),
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let content = self.document_for_request(&uri)?;
        let Ok(parsed) = parse(&content) else {
            return Ok(None);
        };

        let offset = offset_from_protocol(&content, position.line, position.character);
        let (registry, root) = self.analysis_context();
        let overlay = self.documents.overlay();
        let snap = WorkspaceSnapshot {
            root: &root,
            overlay: &overlay,
        };
        let items: Vec<CompletionItem> =
            templar_analysis::completions(&parsed, registry.as_ref(), snap, &content, offset)
                .into_iter()
                .map(|item| CompletionItem {
                    label: item.label,
                    kind: Some(match item.kind {
                        CompletionKind::Field => CompletionItemKind::FIELD,
                        CompletionKind::Method => CompletionItemKind::METHOD,
                        CompletionKind::Variable => CompletionItemKind::VARIABLE,
                        CompletionKind::Function => CompletionItemKind::FUNCTION,
                    }),
                    detail: (!item.detail.is_empty()).then_some(item.detail),
                    ..Default::default()
                })
                .collect();

        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let content = self.document_for_request(&params.text_document.uri)?;
        Ok(self.encoded_tokens(&content, None).map(|data| {
            SemanticTokensResult::Tokens(SemanticTokens {
                result_id: None,
                data,
            })
        }))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        let content = self.document_for_request(&params.text_document.uri)?;
        let start = offset_from_protocol(&content, params.range.start.line, params.range.start.character);
        let end = offset_from_protocol(&content, params.range.end.line, params.range.end.character);
        let span = Span::try_from_range(start..end).unwrap_or(Span::new(0, 0));
        Ok(self.encoded_tokens(&content, Some(span)).map(|data| {
            SemanticTokensRangeResult::Tokens(SemanticTokens {
                result_id: None,
                data,
            })
        }))
    }
}
