//! In-memory document store.
//!
//! Documents are keyed by normalized URI so scheme-qualified and bare-path
//! callers observe the same entry. Content is held as `Arc<str>` snapshots:
//! every edit builds a fresh value and swaps it in, so a concurrent reader
//! observes either the pre-edit or the fully post-edit content, never a
//! partial splice.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use templar_source::offset_from_protocol;
use thiserror::Error;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

/// Operation against a URI with no stored or filesystem-readable content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no document or readable file for {uri}")]
pub struct DocumentNotFound {
    pub uri: String,
}

/// One tracked document.
#[derive(Debug, Clone)]
pub struct Document {
    pub language_id: String,
    pub version: i32,
    pub content: Arc<str>,
}

/// Concurrency-safe store of open documents, with filesystem fallback for
/// files the client never opened.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: DashMap<String, Document>,
}

/// Strip the URI down to the key the store indexes by: file URIs become
/// plain paths, anything else keeps its string form minus the scheme tag.
pub fn normalize_uri(uri: &Url) -> String {
    match uri.to_file_path() {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(()) => uri.as_str().trim_start_matches("file://").to_owned(),
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore::default()
    }

    /// Track a newly opened document.
    pub fn open(&self, uri: &Url, language_id: &str, version: i32, text: String) {
        self.docs.insert(
            normalize_uri(uri),
            Document {
                language_id: language_id.to_owned(),
                version,
                content: text.into(),
            },
        );
    }

    /// Apply a change batch: each entry is either a full-text replacement
    /// or a (range, text) splice in protocol coordinates. Returns the
    /// post-edit snapshot.
    pub fn change(
        &self,
        uri: &Url,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<Arc<str>, DocumentNotFound> {
        let key = normalize_uri(uri);
        let Some(existing) = self.docs.get(&key).map(|d| d.value().clone()) else {
            return Err(DocumentNotFound { uri: key });
        };

        let mut content = existing.content.to_string();
        for change in changes {
            match change.range {
                Some(range) => {
                    let start =
                        offset_from_protocol(&content, range.start.line, range.start.character);
                    let end = offset_from_protocol(&content, range.end.line, range.end.character);
                    let (start, end) = if start <= end { (start, end) } else { (end, start) };
                    content = format!("{}{}{}", &content[..start], change.text, &content[end..]);
                }
                None => content.clone_from(&change.text),
            }
        }

        let snapshot: Arc<str> = content.into();
        self.docs.insert(
            key,
            Document {
                language_id: existing.language_id,
                version,
                content: Arc::clone(&snapshot),
            },
        );
        Ok(snapshot)
    }

    /// Drop a document from the store. Later reads go back to disk.
    pub fn close(&self, uri: &Url) {
        self.docs.remove(&normalize_uri(uri));
    }

    /// Current snapshot. A miss falls back to reading the file behind the
    /// URI and caching it (version 0), so analysis works for files that
    /// were never opened in the editor.
    pub fn get(&self, uri: &Url) -> Result<Arc<str>, DocumentNotFound> {
        let key = normalize_uri(uri);
        if let Some(doc) = self.docs.get(&key) {
            return Ok(Arc::clone(&doc.content));
        }
        match std::fs::read_to_string(Path::new(&key)) {
            Ok(text) => {
                let content: Arc<str> = text.into();
                self.docs.insert(
                    key,
                    Document {
                        language_id: String::new(),
                        version: 0,
                        content: Arc::clone(&content),
                    },
                );
                Ok(content)
            }
            Err(_) => Err(DocumentNotFound { uri: key }),
        }
    }

    /// Stored version of a document, if any.
    pub fn version(&self, uri: &Url) -> Option<i32> {
        self.docs.get(&normalize_uri(uri)).map(|d| d.version)
    }

    /// URI-to-content overlay handed to the type registry so unsaved edits
    /// shadow on-disk files during resolution.
    pub fn overlay(&self) -> FxHashMap<String, Arc<str>> {
        self.docs
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.value().content)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tower_lsp::lsp_types::{Position, Range};

    fn url(path: &str) -> Url {
        let Ok(url) = Url::parse(&format!("file://{path}")) else {
            panic!("bad test url");
        };
        url
    }

    fn full_change(text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_owned(),
        }
    }

    fn splice(range: Range, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(range),
            range_length: None,
            text: text.to_owned(),
        }
    }

    #[test]
    fn uri_normalization_strips_scheme() {
        assert_eq!(normalize_uri(&url("/ws/page.tmpl")), "/ws/page.tmpl");
    }

    #[test]
    fn open_then_get() {
        let store = DocumentStore::new();
        let uri = url("/ws/a.tmpl");
        store.open(&uri, "templar", 1, "{{ .Name }}".to_owned());
        let Ok(content) = store.get(&uri) else {
            panic!("expected stored document");
        };
        assert_eq!(&*content, "{{ .Name }}");
        assert_eq!(store.version(&uri), Some(1));
    }

    #[test]
    fn full_replace_change() {
        let store = DocumentStore::new();
        let uri = url("/ws/a.tmpl");
        store.open(&uri, "templar", 1, "old".to_owned());
        let Ok(content) = store.change(&uri, 2, &[full_change("new")]) else {
            panic!("expected change to apply");
        };
        assert_eq!(&*content, "new");
        assert_eq!(store.version(&uri), Some(2));
    }

    #[test]
    fn range_splice_change() {
        let store = DocumentStore::new();
        let uri = url("/ws/a.tmpl");
        store.open(&uri, "templar", 1, "{{ .Nome }}\nrest".to_owned());
        let range = Range {
            start: Position::new(0, 4),
            end: Position::new(0, 8),
        };
        let Ok(content) = store.change(&uri, 2, &[splice(range, "Name")]) else {
            panic!("expected change to apply");
        };
        assert_eq!(&*content, "{{ .Name }}\nrest");
    }

    #[test]
    fn splice_reproduces_prefix_and_suffix_exactly() {
        let store = DocumentStore::new();
        let uri = url("/ws/a.tmpl");
        store.open(&uri, "templar", 1, "ab\ncd".to_owned());
        let range = Range {
            start: Position::new(1, 0),
            end: Position::new(1, 0),
        };
        let Ok(content) = store.change(&uri, 2, &[splice(range, "X")]) else {
            panic!("expected change to apply");
        };
        assert_eq!(&*content, "ab\nXcd");
    }

    #[test]
    fn change_on_unknown_uri_fails() {
        let store = DocumentStore::new();
        assert!(store.change(&url("/ws/nope.tmpl"), 1, &[full_change("x")]).is_err());
    }

    #[test]
    fn snapshots_are_immutable() {
        let store = DocumentStore::new();
        let uri = url("/ws/a.tmpl");
        store.open(&uri, "templar", 1, "before".to_owned());
        let Ok(before) = store.get(&uri) else {
            panic!("expected stored document");
        };
        let Ok(_) = store.change(&uri, 2, &[full_change("after")]) else {
            panic!("expected change to apply");
        };
        // The earlier snapshot is untouched by the edit.
        assert_eq!(&*before, "before");
        let Ok(after) = store.get(&uri) else {
            panic!("expected stored document");
        };
        assert_eq!(&*after, "after");
    }

    #[test]
    fn close_evicts_and_falls_back_to_disk() {
        let dir = std::env::temp_dir().join("templar-lsp-doc-tests");
        let Ok(()) = std::fs::create_dir_all(&dir) else {
            panic!("could not create temp dir");
        };
        let path = dir.join("fallback.tmpl");
        let Ok(()) = std::fs::write(&path, "on disk") else {
            panic!("could not write temp file");
        };
        let Ok(uri) = Url::from_file_path(&path) else {
            panic!("could not build file url");
        };

        let store = DocumentStore::new();
        store.open(&uri, "templar", 1, "in memory".to_owned());
        store.close(&uri);

        // After close, the in-memory version is gone for good: the next
        // read comes from disk.
        let Ok(content) = store.get(&uri) else {
            panic!("expected filesystem fallback");
        };
        assert_eq!(&*content, "on disk");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let store = DocumentStore::new();
        let uri = url("/definitely/not/here.tmpl");
        assert!(store.get(&uri).is_err());
    }
}
