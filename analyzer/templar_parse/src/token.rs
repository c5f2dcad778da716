//! Action-interior tokens.
//!
//! The logos-derived [`ActionToken`] lexes the text between `{{` and `}}`.
//! Raw template text outside actions is never tokenized.

use logos::Logos;

/// Token inside an action.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum ActionToken {
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("range")]
    Range,
    #[token("with")]
    With,
    #[token("define")]
    Define,
    #[token("template")]
    Template,
    #[token("block")]
    Block,
    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[token("|")]
    Pipe,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(":=")]
    Declare,
    #[token("=")]
    Assign,

    /// One field segment including its leading dot: `.Name`.
    #[regex(r"\.[A-Za-z_][A-Za-z0-9_]*")]
    Field,
    /// The bare dot: the current context value.
    #[token(".")]
    Dot,
    /// A named variable: `$name`.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    Variable,
    /// The bare `$`: the root context value.
    #[token("$")]
    Dollar,
    /// A function or constant name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[regex(r"`[^`]*`")]
    RawStr,
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,
}

impl ActionToken {
    /// Control keywords of the template language.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            ActionToken::If
                | ActionToken::Else
                | ActionToken::End
                | ActionToken::Range
                | ActionToken::With
                | ActionToken::Define
                | ActionToken::Template
                | ActionToken::Block
                | ActionToken::Nil
                | ActionToken::True
                | ActionToken::False
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<ActionToken> {
        ActionToken::lexer(input).flatten().collect()
    }

    #[test]
    fn field_segments_keep_dots() {
        assert_eq!(
            lex(".Address.Street"),
            vec![ActionToken::Field, ActionToken::Field]
        );
    }

    #[test]
    fn bare_dot_and_dollar() {
        assert_eq!(lex(". $"), vec![ActionToken::Dot, ActionToken::Dollar]);
        assert_eq!(
            lex("$x.F"),
            vec![ActionToken::Variable, ActionToken::Field]
        );
    }

    #[test]
    fn keywords_beat_idents() {
        assert_eq!(
            lex("if ifx range"),
            vec![ActionToken::If, ActionToken::Ident, ActionToken::Range]
        );
    }

    #[test]
    fn pipeline_tokens() {
        assert_eq!(
            lex(r#".Name | printf "%s" 42"#),
            vec![
                ActionToken::Field,
                ActionToken::Pipe,
                ActionToken::Ident,
                ActionToken::Str,
                ActionToken::Number,
            ]
        );
    }

    #[test]
    fn declare_vs_assign() {
        assert_eq!(
            lex("$x := 1"),
            vec![ActionToken::Variable, ActionToken::Declare, ActionToken::Number]
        );
    }
}
