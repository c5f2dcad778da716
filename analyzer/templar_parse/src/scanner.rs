//! Action delimiter scanner.
//!
//! First layer of the parser: walks the raw text for `{{ ... }}` actions,
//! honoring trim markers (`{{- `, ` -}}`) and comment actions
//! (`{{/* ... */}}`). Everything between actions is plain template text and
//! is not examined further.

use templar_source::Span;

use crate::ParseError;

/// One scanned action, before tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAction {
    /// Full span including both delimiters.
    pub span: Span,
    /// Interior span, exclusive of delimiters and trim markers.
    pub inner: Span,
    /// Body span between `/*` and `*/` when this is a comment action.
    pub comment: Option<Span>,
}

/// Scan the text for actions.
///
/// Fails on the first unbalanced `{{`: either no `}}` follows before the
/// next `{{` or end of text, or a comment never closes. A stray `}}` with no
/// opener is plain text.
pub fn scan(text: &str) -> Result<Vec<RawAction>, ParseError> {
    let mut actions = Vec::new();
    let mut pos = 0usize;

    while let Some(found) = text[pos..].find("{{") {
        let start = pos + found;
        let open_span = Span::from_range(start..start + 2);
        let mut inner_start = start + 2;

        // Left trim marker: `{{-` followed by whitespace.
        if text[inner_start..].starts_with('-')
            && text[inner_start + 1..]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
        {
            inner_start += 1;
        }

        let body = text[inner_start..].trim_start();
        let ws = text[inner_start..].len() - body.len();

        let (end, inner_end, comment) = if body.starts_with("/*") {
            let comment_open = inner_start + ws;
            let Some(close_rel) = text[comment_open + 2..].find("*/") else {
                return Err(ParseError::UnterminatedComment { span: open_span });
            };
            let comment_close = comment_open + 2 + close_rel;
            let Some(shut_rel) = text[comment_close + 2..].find("}}") else {
                return Err(ParseError::UnclosedAction { span: open_span });
            };
            let shut = comment_close + 2 + shut_rel;
            (
                shut + 2,
                shut,
                Some(Span::from_range(comment_open + 2..comment_close)),
            )
        } else {
            let rest = &text[inner_start..];
            match find_close(rest) {
                Some(c) => (inner_start + c + 2, inner_start + c, None),
                None => return Err(ParseError::UnclosedAction { span: open_span }),
            }
        };

        // Right trim marker: whitespace then `-` directly before `}}`.
        let mut inner_end = inner_end;
        if comment.is_none()
            && text[inner_start..inner_end].ends_with('-')
            && text[inner_start..inner_end - 1]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace)
        {
            inner_end -= 1;
        }

        actions.push(RawAction {
            span: Span::from_range(start..end),
            inner: Span::from_range(inner_start..inner_end),
            comment,
        });
        pos = end;
    }

    Ok(actions)
}

/// Find the closing `}}` of a non-comment action body. Delimiters inside
/// quoted (`"..."`, with backslash escapes) and raw (`` `...` ``) string
/// literals are template data, not structure, and are stepped over. `None`
/// when the action reopens with `{{` or never closes.
fn find_close(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    i += 1;
                }
                i += 1;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            b'{' if bytes.get(i + 1) == Some(&b'{') => return None,
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use templar_source::range_text;

    #[test]
    fn plain_text_has_no_actions() {
        let Ok(actions) = scan("no actions here }}") else {
            panic!("stray `}}}}` is plain text");
        };
        assert!(actions.is_empty());
    }

    #[test]
    fn simple_action() {
        let text = "a {{ .Name }} b";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(range_text(text, actions[0].span), "{{ .Name }}");
        assert_eq!(range_text(text, actions[0].inner), " .Name ");
    }

    #[test]
    fn trim_markers_excluded_from_inner() {
        let text = "{{- .Name -}}";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(range_text(text, actions[0].inner), " .Name ");
        assert_eq!(range_text(text, actions[0].span), text);
    }

    #[test]
    fn negative_number_is_not_a_trim_marker() {
        let text = "{{-3}}";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(range_text(text, actions[0].inner), "-3");
    }

    #[test]
    fn comment_action() {
        let text = "{{/* a comment */}}";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        let Some(body) = actions[0].comment else {
            panic!("expected comment body");
        };
        assert_eq!(range_text(text, body), " a comment ");
    }

    #[test]
    fn comment_may_contain_delimiters() {
        let text = "{{/* {{ not an action }} */}}x";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].span.end as usize, text.len() - 1);
    }

    #[test]
    fn string_may_contain_open_delimiter() {
        let text = r#"{{ printf "{{" }}"#;
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(range_text(text, actions[0].span), text);
    }

    #[test]
    fn string_may_contain_close_delimiter() {
        let text = r#"{{ printf "}}" }}"#;
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(range_text(text, actions[0].inner), r#" printf "}}" "#);
    }

    #[test]
    fn raw_string_may_contain_delimiters() {
        let text = "{{ printf `{{ }}` }}";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(range_text(text, actions[0].inner), " printf `{{ }}` ");
    }

    #[test]
    fn escaped_quote_does_not_end_a_string() {
        let text = r#"{{ printf "a\"}}b" }}"#;
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(range_text(text, actions[0].inner), r#" printf "a\"}}b" "#);
    }

    #[test]
    fn unclosed_action_is_an_error() {
        assert!(matches!(
            scan("text {{ .Name"),
            Err(ParseError::UnclosedAction { .. })
        ));
        assert!(matches!(
            scan("{{ .A {{ .B }}"),
            Err(ParseError::UnclosedAction { .. })
        ));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        assert!(matches!(
            scan("{{/* never closed }}"),
            Err(ParseError::UnterminatedComment { .. })
        ));
    }

    #[test]
    fn several_actions_in_order() {
        let text = "{{ .A }} mid {{ .B }}";
        let Ok(actions) = scan(text) else {
            panic!("expected scan to succeed");
        };
        assert_eq!(actions.len(), 2);
        assert!(actions[0].span.end <= actions[1].span.start);
    }
}
