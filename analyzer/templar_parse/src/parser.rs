//! Template parser.
//!
//! Second layer: tokenizes each scanned action and extracts the entities the
//! analysis engine works with — type hints, dotted field chains, variable
//! references, and pipeline call sites — each tagged with a byte span into
//! the exact source text.
//!
//! Scope rules: `define` and `block` push the block name as the lexical
//! scope; `if`/`range`/`with` nest for `end`-matching but do not change the
//! scope string, so a reference inside them resolves against the nearest
//! enclosing `define` (or the root). A reference in a scope with no type
//! hint stays unresolved: it is skipped by diagnostics but still feeds the
//! semantic-token encoder.

use logos::Logos as _;
use templar_source::{range_text, Span};

use crate::{scan, ActionToken, ParseError, RawAction};

/// A comment-embedded declaration binding a scope to a host-language type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHint {
    /// Dotted path of the host-language type, e.g. `example.com/pkg.Person`.
    pub type_path: String,
    /// Span of the dotted path inside the comment.
    pub span: Span,
    /// Enclosing `define` block name, empty for the root scope.
    pub scope: String,
}

/// A field chain or variable reference.
///
/// A dotted chain is one location spanning the whole path: `.Address.Street`
/// yields a single entry named `Address.Street` whose span covers the
/// leading dot, so `range_text(span) == "." + name`. Variable references
/// keep their `$` in the name and the covered text equals the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLocation {
    /// Dotted path without the leading dot, or a `$`-prefixed variable name.
    pub name: String,
    /// Span of the full chain, including the leading dot or `$`.
    pub span: Span,
    /// Enclosing `define` block name, empty for the root scope.
    pub scope: String,
}

/// Kind of a recorded call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    FieldChain,
    Variable,
    String,
    Number,
    Bool,
    Nil,
    Ident,
}

/// One positional argument at a call site.
///
/// Arguments are recorded syntactically; the analysis engine resolves field
/// chains and variables to type descriptors when registry context is
/// available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArg {
    pub text: String,
    pub span: Span,
    pub kind: ArgKind,
}

/// A pipeline call site: `name arg1 arg2`, or a segment after `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCallSite {
    pub name: String,
    /// Enclosing `define` block name, empty for the root scope.
    pub scope: String,
    /// Span of the function name.
    pub span: Span,
    pub args: Vec<CallArg>,
}

/// Span and scope of one action's interior, kept for cursor-context queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpan {
    /// Full span including delimiters.
    pub span: Span,
    /// Interior span, exclusive of delimiters and trim markers.
    pub inner: Span,
    /// Scope governing this action.
    pub scope: String,
    /// True for `{{/* ... */}}` actions.
    pub comment: bool,
}

/// Result of one successful parse. Immutable; rebuilt wholesale per parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTemplateFile {
    pub type_hints: Vec<TypeHint>,
    pub variables: Vec<VariableLocation>,
    pub functions: Vec<FunctionCallSite>,
    pub actions: Vec<ActionSpan>,
}

impl ParsedTemplateFile {
    /// The hint governing a scope, if one was declared.
    pub fn hint_for_scope(&self, scope: &str) -> Option<&TypeHint> {
        self.type_hints.iter().find(|h| h.scope == scope)
    }

    /// The action whose interior contains the offset. The boundary just
    /// after the last interior byte counts as inside, so a cursor at the
    /// very end of `{{ .Name` context still gets completions.
    pub fn action_at(&self, offset: u32) -> Option<&ActionSpan> {
        self.actions
            .iter()
            .find(|a| a.inner.contains(offset) || a.inner.end == offset)
    }
}

enum Frame {
    Define(String),
    Control,
}

/// Parse template source.
///
/// On a delimiter error the whole parse fails; no partial result is
/// produced.
pub fn parse(text: &str) -> Result<ParsedTemplateFile, ParseError> {
    let actions = scan(text)?;
    let mut parsed = ParsedTemplateFile::default();
    let mut stack: Vec<Frame> = Vec::new();

    for action in &actions {
        let scope = current_scope(&stack);

        if let Some(body) = action.comment {
            collect_type_hint(text, body, &scope, &mut parsed.type_hints);
            parsed.actions.push(ActionSpan {
                span: action.span,
                inner: action.inner,
                scope,
                comment: true,
            });
            continue;
        }

        parsed.actions.push(ActionSpan {
            span: action.span,
            inner: action.inner,
            scope: scope.clone(),
            comment: false,
        });

        let tokens = tokenize(text, action);
        match tokens.first() {
            Some((ActionToken::Define | ActionToken::Block, _)) => {
                let is_block = matches!(tokens[0].0, ActionToken::Block);
                let name = tokens
                    .get(1)
                    .filter(|(t, _)| matches!(t, ActionToken::Str | ActionToken::RawStr))
                    .map(|(_, span)| unquote(range_text(text, *span)));
                // A block's pipeline argument runs in the enclosing scope.
                if is_block && tokens.len() > 2 {
                    extract_pipeline(text, &tokens[2..], &scope, &mut parsed);
                }
                stack.push(Frame::Define(name.unwrap_or_default()));
            }
            Some((ActionToken::Template, _)) => {
                if tokens.len() > 2 {
                    extract_pipeline(text, &tokens[2..], &scope, &mut parsed);
                }
            }
            Some((ActionToken::If | ActionToken::Range | ActionToken::With, _)) => {
                extract_pipeline(text, &tokens[1..], &scope, &mut parsed);
                stack.push(Frame::Control);
            }
            Some((ActionToken::Else, _)) => {
                // `{{else}}` or `{{else if pipeline}}`; the open frame stays.
                let rest = match tokens.get(1) {
                    Some((ActionToken::If, _)) => &tokens[2..],
                    _ => &tokens[1..],
                };
                extract_pipeline(text, rest, &scope, &mut parsed);
            }
            Some((ActionToken::End, _)) => {
                // A stray `end` with nothing open is tolerated.
                stack.pop();
            }
            Some(_) => extract_pipeline(text, &tokens, &scope, &mut parsed),
            None => {}
        }
    }

    Ok(parsed)
}

fn current_scope(stack: &[Frame]) -> String {
    stack
        .iter()
        .rev()
        .find_map(|f| match f {
            Frame::Define(name) => Some(name.clone()),
            Frame::Control => None,
        })
        .unwrap_or_default()
}

fn tokenize(text: &str, action: &RawAction) -> Vec<(ActionToken, Span)> {
    let inner = range_text(text, action.inner);
    let base = action.inner.start as usize;
    ActionToken::lexer(inner)
        .spanned()
        .filter_map(|(tok, range)| {
            // Unknown characters are skipped; they are not a parse error.
            tok.ok()
                .map(|t| (t, Span::from_range(base + range.start..base + range.end)))
        })
        .collect()
}

/// Recognize `gotype:` hints in a comment body. The first hint per scope
/// wins; later ones in the same scope are ignored.
fn collect_type_hint(text: &str, body: Span, scope: &str, hints: &mut Vec<TypeHint>) {
    let body_text = range_text(text, body);
    let Some(idx) = body_text.find("gotype:") else {
        return;
    };
    let after = idx + "gotype:".len();
    let rest = &body_text[after..];
    let leading_ws = rest.len() - rest.trim_start().len();
    let path_start = body.start as usize + after + leading_ws;
    let path: String = text[path_start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
        .collect();
    if path.is_empty() || hints.iter().any(|h| h.scope == scope) {
        return;
    }
    hints.push(TypeHint {
        span: Span::from_range(path_start..path_start + path.len()),
        type_path: path,
        scope: scope.to_owned(),
    });
}

fn unquote(quoted: &str) -> String {
    quoted
        .trim_matches('"')
        .trim_matches('`')
        .to_owned()
}

/// Walk one pipeline's token stream, recording field chains, variables, and
/// call sites. `|` and `(` start a new command; the first non-keyword
/// identifier of a command is a call site and the rest of the command feeds
/// its argument list.
fn extract_pipeline(
    text: &str,
    tokens: &[(ActionToken, Span)],
    scope: &str,
    parsed: &mut ParsedTemplateFile,
) {
    let mut i = 0;
    let mut command_head = true;
    let mut open_call: Option<usize> = None;

    while i < tokens.len() {
        let (tok, span) = tokens[i];
        match tok {
            ActionToken::Pipe | ActionToken::LParen => {
                command_head = true;
                open_call = None;
                i += 1;
            }
            ActionToken::Declare | ActionToken::Assign | ActionToken::Comma => {
                command_head = true;
                open_call = None;
                i += 1;
            }
            ActionToken::RParen => {
                command_head = false;
                open_call = None;
                i += 1;
            }
            ActionToken::Field | ActionToken::Dot | ActionToken::Variable | ActionToken::Dollar => {
                let (name, chain_span, kind) = collect_chain(text, tokens, &mut i);
                if !name.is_empty() {
                    parsed.variables.push(VariableLocation {
                        name: name.clone(),
                        span: chain_span,
                        scope: scope.to_owned(),
                    });
                }
                push_arg(parsed, open_call, name, chain_span, kind, text);
                command_head = false;
            }
            ActionToken::Ident => {
                let name = range_text(text, span).to_owned();
                if command_head {
                    parsed.functions.push(FunctionCallSite {
                        name,
                        scope: scope.to_owned(),
                        span,
                        args: Vec::new(),
                    });
                    open_call = Some(parsed.functions.len() - 1);
                } else {
                    push_arg(parsed, open_call, name, span, ArgKind::Ident, text);
                }
                command_head = false;
                i += 1;
            }
            ActionToken::Str | ActionToken::RawStr => {
                push_arg(parsed, open_call, String::new(), span, ArgKind::String, text);
                command_head = false;
                i += 1;
            }
            ActionToken::Number => {
                push_arg(parsed, open_call, String::new(), span, ArgKind::Number, text);
                command_head = false;
                i += 1;
            }
            ActionToken::True | ActionToken::False => {
                push_arg(parsed, open_call, String::new(), span, ArgKind::Bool, text);
                command_head = false;
                i += 1;
            }
            ActionToken::Nil => {
                push_arg(parsed, open_call, String::new(), span, ArgKind::Nil, text);
                command_head = false;
                i += 1;
            }
            // Control keywords have no business mid-pipeline; skip them.
            _ => {
                i += 1;
            }
        }
    }
}

fn push_arg(
    parsed: &mut ParsedTemplateFile,
    open_call: Option<usize>,
    name: String,
    span: Span,
    kind: ArgKind,
    text: &str,
) {
    if let Some(call) = open_call.and_then(|i| parsed.functions.get_mut(i)) {
        let text_value = if name.is_empty() {
            range_text(text, span).to_owned()
        } else {
            name
        };
        call.args.push(CallArg {
            text: text_value,
            span,
            kind,
        });
    }
}

/// Accumulate a dotted chain starting at `tokens[i]`, merging span-adjacent
/// `.Field` segments into one location. Advances `i` past the chain.
fn collect_chain(
    text: &str,
    tokens: &[(ActionToken, Span)],
    i: &mut usize,
) -> (String, Span, ArgKind) {
    let (first, first_span) = tokens[*i];
    let mut span = first_span;
    let mut name = match first {
        ActionToken::Field => range_text(text, first_span)[1..].to_owned(),
        ActionToken::Variable | ActionToken::Dollar => range_text(text, first_span).to_owned(),
        // Bare dot: the context value itself, no name to resolve.
        _ => String::new(),
    };
    let kind = match first {
        ActionToken::Variable | ActionToken::Dollar => ArgKind::Variable,
        _ => ArgKind::FieldChain,
    };
    *i += 1;

    while let Some(&(ActionToken::Field, seg_span)) = tokens.get(*i) {
        if seg_span.start != span.end {
            break;
        }
        let segment = &range_text(text, seg_span)[1..];
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(segment);
        span = span.merge(seg_span);
        *i += 1;
    }

    (name, span, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(text: &str) -> ParsedTemplateFile {
        match parse(text) {
            Ok(parsed) => parsed,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn root_type_hint() {
        let text = "{{- /*gotype: example.com/demo.Person*/ -}}\n{{ .Name }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.type_hints.len(), 1);
        let hint = &parsed.type_hints[0];
        assert_eq!(hint.type_path, "example.com/demo.Person");
        assert_eq!(hint.scope, "");
        assert_eq!(range_text(text, hint.span), "example.com/demo.Person");
    }

    #[test]
    fn dotted_chain_is_one_location() {
        let text = "{{ .Address.Street }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.variables.len(), 1);
        let var = &parsed.variables[0];
        assert_eq!(var.name, "Address.Street");
        assert_eq!(range_text(text, var.span), ".Address.Street");
    }

    #[test]
    fn chain_round_trip_convention() {
        let text = "head {{ if .User.Active }}on{{ end }}";
        let parsed = parse_ok(text);
        let var = &parsed.variables[0];
        assert_eq!(range_text(text, var.span), format!(".{}", var.name));
    }

    #[test]
    fn define_scopes_references() {
        let text = concat!(
            "{{ define \"header\" }}",
            "{{- /*gotype: demo.Header*/ -}}",
            "{{ .Title }}",
            "{{ end }}",
            "{{ .Root }}"
        );
        let parsed = parse_ok(text);
        assert_eq!(parsed.type_hints.len(), 1);
        assert_eq!(parsed.type_hints[0].scope, "header");
        let scopes: Vec<&str> = parsed.variables.iter().map(|v| v.scope.as_str()).collect();
        assert_eq!(scopes, vec!["header", ""]);
    }

    #[test]
    fn control_blocks_keep_the_enclosing_scope() {
        let text = "{{ if .Ready }}{{ range .Items }}{{ .Name }}{{ end }}{{ end }}";
        let parsed = parse_ok(text);
        for var in &parsed.variables {
            assert_eq!(var.scope, "");
        }
        assert_eq!(parsed.variables.len(), 3);
    }

    #[test]
    fn pipeline_call_sites() {
        let text = r#"{{ printf "%s" .Name | upper }}"#;
        let parsed = parse_ok(text);
        let names: Vec<&str> = parsed.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["printf", "upper"]);
        let printf = &parsed.functions[0];
        assert_eq!(printf.args.len(), 2);
        assert_eq!(printf.args[1].kind, ArgKind::FieldChain);
        assert_eq!(printf.args[1].text, "Name");
        // The chain argument is also a variable reference in its own right.
        assert_eq!(parsed.variables[0].name, "Name");
    }

    #[test]
    fn nested_call_in_parens() {
        let text = "{{ if (len .Items) }}x{{ end }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].name, "len");
        assert_eq!(parsed.functions[0].args.len(), 1);
    }

    #[test]
    fn variable_declaration_and_use() {
        let text = "{{ $name := .Name }}{{ $name }}";
        let parsed = parse_ok(text);
        let names: Vec<&str> = parsed.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["$name", "Name", "$name"]);
        let var = &parsed.variables[0];
        assert_eq!(range_text(text, var.span), "$name");
    }

    #[test]
    fn dollar_root_chain() {
        let text = "{{ range .Items }}{{ $.Title }}{{ end }}";
        let parsed = parse_ok(text);
        let names: Vec<&str> = parsed.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Items", "$.Title"]);
    }

    #[test]
    fn bare_dot_emits_nothing() {
        let text = "{{ range .Items }}{{ . }}{{ end }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.variables.len(), 1);
    }

    #[test]
    fn one_hint_per_scope_first_wins() {
        let text = "{{/*gotype: demo.A*/}}{{/*gotype: demo.B*/}}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.type_hints.len(), 1);
        assert_eq!(parsed.type_hints[0].type_path, "demo.A");
    }

    #[test]
    fn parse_error_yields_no_partial_result() {
        assert!(parse("{{ define \"x\" }}{{ .Name").is_err());
    }

    #[test]
    fn stray_end_is_tolerated() {
        let text = "{{ end }}{{ .Name }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.variables[0].scope, "");
    }

    #[test]
    fn unclosed_define_closes_implicitly() {
        let text = "{{ define \"partial\" }}{{ .Field }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.variables[0].scope, "partial");
    }

    #[test]
    fn action_at_boundaries() {
        let text = "{{ .Name }} tail";
        let parsed = parse_ok(text);
        assert!(parsed.action_at(3).is_some());
        // One past the interior still counts (cursor right before `}}`).
        assert!(parsed.action_at(parsed.actions[0].inner.end).is_some());
        assert!(parsed.action_at(14).is_none());
    }

    #[test]
    fn block_pipeline_runs_in_enclosing_scope() {
        let text = "{{ block \"side\" .User }}{{ .Name }}{{ end }}";
        let parsed = parse_ok(text);
        assert_eq!(parsed.variables[0].name, "User");
        assert_eq!(parsed.variables[0].scope, "");
        assert_eq!(parsed.variables[1].scope, "side");
    }
}
