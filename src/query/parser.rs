//! Query parser for converting query strings to [`Query`] objects.
//!
//! Supported syntax:
//!
//! - terms, analyzed against the default field: `melancholy`
//! - field-specific terms: `TITLE:lilies`
//! - phrases: `"vibrant colors"` (every analyzed word must occur)
//! - required / prohibited clauses: `+sea -storm`, `NOT storm`
//! - `AND` / `&&`, `OR` / `||` between clauses
//! - groups: `(sea OR lake) AND boat`
//! - boosts: `sadness^0.8`, `"vibrant colors"^2`
//!
//! Clauses without an operator are optional (SHOULD), so a plain list of words is a
//! disjunction. A backslash makes the next character literal; [`QueryParser::escape`]
//! applies this to arbitrary user text.

use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::error::{CuratorError, Result};
use crate::query::{BooleanClause, BooleanQuery, Occur, Query, TermQuery};

/// Characters with a meaning in the query syntax.
const SPECIAL_CHARS: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
    '/',
];

/// Parses query strings against a default field.
#[derive(Debug, Clone)]
pub struct QueryParser {
    /// Field used for terms without a `field:` prefix.
    default_field: String,
    /// Analyzer applied to term and phrase text.
    analyzer: Arc<dyn Analyzer>,
}

impl QueryParser {
    /// Create a parser for `default_field`, analyzing terms with `analyzer`.
    ///
    /// Use the same analyzer the index was written with, or terms will not match.
    pub fn new<S: Into<String>>(default_field: S, analyzer: Arc<dyn Analyzer>) -> Self {
        QueryParser {
            default_field: default_field.into(),
            analyzer,
        }
    }

    /// Get the default field.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Parse a query string.
    ///
    /// An empty query, or one whose words all analyze away, yields an empty
    /// [`BooleanQuery`] that matches nothing.
    ///
    /// # Errors
    ///
    /// [`CuratorError::Query`] for unbalanced parentheses or quotes, an operator
    /// with nothing to apply to, a trailing backslash, or a malformed boost.
    pub fn parse(&self, query_str: &str) -> Result<Box<dyn Query>> {
        let lexemes = Lexer::new(query_str).lex()?;
        let mut parser = ClauseParser {
            lexemes: lexemes.into_iter().peekable(),
            query_parser: self,
        };
        parser.parse_group(false)
    }

    /// Escape `text` so that [`parse`](Self::parse) treats all of it as plain words.
    ///
    /// Every syntax character gets a backslash, and so do the bare words `AND`,
    /// `OR` and `NOT`, which would otherwise be read as operators.
    pub fn escape(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len() + 8);
        for piece in text.split_inclusive(char::is_whitespace) {
            let word = piece.trim_end_matches(char::is_whitespace);
            if matches!(word, "AND" | "OR" | "NOT") {
                escaped.push('\\');
            }
            for ch in piece.chars() {
                if SPECIAL_CHARS.contains(&ch) {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
        }
        escaped
    }

    fn text_query(
        &self,
        field: Option<&str>,
        text: &str,
        phrase: bool,
    ) -> Result<Option<Box<dyn Query>>> {
        let field = field.unwrap_or(&self.default_field);
        let mut terms: Vec<Box<dyn Query>> = self
            .analyzer
            .analyze(text)?
            .map(|token| Box::new(TermQuery::new(field, token.text)) as Box<dyn Query>)
            .collect();

        Ok(match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => {
                let occur = if phrase { Occur::Must } else { Occur::Should };
                let mut query = BooleanQuery::new();
                for term in terms {
                    query.add_clause(BooleanClause::new(term, occur));
                }
                Some(Box::new(query))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Word { field: Option<String>, text: String },
    Phrase { field: Option<String>, text: String },
    Boost(f32),
    Plus,
    Minus,
    Not,
    And,
    Or,
    LParen,
    RParen,
}

#[derive(Debug, Default)]
struct RawWord {
    field: Option<String>,
    text: String,
    escaped: bool,
    phrase_follows: bool,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
        }
    }

    fn lex(mut self) -> Result<Vec<Lexeme>> {
        let mut lexemes = Vec::new();

        while let Some(&ch) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '(' => {
                    self.chars.next();
                    lexemes.push(Lexeme::LParen);
                }
                ')' => {
                    self.chars.next();
                    lexemes.push(Lexeme::RParen);
                    self.lex_boost(&mut lexemes)?;
                }
                '+' => {
                    self.chars.next();
                    lexemes.push(Lexeme::Plus);
                }
                '-' => {
                    self.chars.next();
                    lexemes.push(Lexeme::Minus);
                }
                '!' => {
                    self.chars.next();
                    lexemes.push(Lexeme::Not);
                }
                '"' => {
                    let text = self.lex_phrase()?;
                    lexemes.push(Lexeme::Phrase { field: None, text });
                    self.lex_boost(&mut lexemes)?;
                }
                _ => {
                    let word = self.lex_word()?;
                    let operator = if word.field.is_none() && !word.escaped {
                        match word.text.as_str() {
                            "AND" | "&&" => Some(Lexeme::And),
                            "OR" | "||" => Some(Lexeme::Or),
                            "NOT" => Some(Lexeme::Not),
                            _ => None,
                        }
                    } else {
                        None
                    };

                    if let Some(operator) = operator {
                        lexemes.push(operator);
                        continue;
                    }
                    if word.phrase_follows {
                        let text = self.lex_phrase()?;
                        lexemes.push(Lexeme::Phrase {
                            field: word.field,
                            text,
                        });
                    } else {
                        lexemes.push(Lexeme::Word {
                            field: word.field,
                            text: word.text,
                        });
                    }
                    self.lex_boost(&mut lexemes)?;
                }
            }
        }

        Ok(lexemes)
    }

    /// Read a word up to whitespace or an unescaped `(`, `)`, `^`, `"`.
    ///
    /// The first unescaped `:` after some text ends the field name.
    fn lex_word(&mut self) -> Result<RawWord> {
        let mut word = RawWord::default();

        while let Some(&ch) = self.chars.peek() {
            match ch {
                '\\' => {
                    self.chars.next();
                    let next = self.chars.next().ok_or_else(|| {
                        CuratorError::query("query ends with an escape character")
                    })?;
                    word.text.push(next);
                    word.escaped = true;
                }
                ':' if word.field.is_none() && !word.text.is_empty() => {
                    self.chars.next();
                    word.field = Some(std::mem::take(&mut word.text));
                    if self.chars.peek() == Some(&'"') {
                        word.phrase_follows = true;
                        break;
                    }
                }
                c if c.is_whitespace() || matches!(c, '(' | ')' | '^' | '"') => break,
                _ => {
                    self.chars.next();
                    word.text.push(ch);
                }
            }
        }

        Ok(word)
    }

    fn lex_phrase(&mut self) -> Result<String> {
        // opening quote
        self.chars.next();
        let mut phrase = String::new();

        loop {
            match self.chars.next() {
                Some('"') => return Ok(phrase),
                Some('\\') => match self.chars.next() {
                    Some(c) => phrase.push(c),
                    None => {
                        return Err(CuratorError::query("query ends with an escape character"));
                    }
                },
                Some(c) => phrase.push(c),
                None => return Err(CuratorError::query("unterminated phrase")),
            }
        }
    }

    fn lex_boost(&mut self, lexemes: &mut Vec<Lexeme>) -> Result<()> {
        if self.chars.peek() != Some(&'^') {
            return Ok(());
        }
        self.chars.next();

        let mut number = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        let boost: f32 = number
            .parse()
            .map_err(|_| CuratorError::query(format!("invalid boost '^{number}'")))?;
        lexemes.push(Lexeme::Boost(boost));
        Ok(())
    }
}

struct ClauseParser<'p> {
    lexemes: Peekable<std::vec::IntoIter<Lexeme>>,
    query_parser: &'p QueryParser,
}

impl ClauseParser<'_> {
    fn parse_group(&mut self, nested: bool) -> Result<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Option<Box<dyn Query>>)> = Vec::new();
        let mut conjunction = false;

        loop {
            match self.lexemes.peek() {
                None if nested => return Err(CuratorError::query("missing closing parenthesis")),
                None => break,
                Some(Lexeme::RParen) if nested => {
                    self.lexemes.next();
                    break;
                }
                Some(Lexeme::RParen) => {
                    return Err(CuratorError::query("unbalanced closing parenthesis"));
                }
                Some(Lexeme::And) | Some(Lexeme::Or) => {
                    let is_and = matches!(self.lexemes.next(), Some(Lexeme::And));
                    if clauses.is_empty() || !self.clause_follows() {
                        return Err(CuratorError::query(format!(
                            "'{}' needs a clause on both sides",
                            if is_and { "AND" } else { "OR" }
                        )));
                    }
                    conjunction = is_and;
                }
                Some(Lexeme::Boost(_)) => {
                    return Err(CuratorError::query("boost without a clause"));
                }
                Some(_) => {
                    let (mut occur, query) = self.parse_clause()?;
                    if conjunction {
                        if let Some(last) = clauses.last_mut() {
                            if last.0 == Occur::Should {
                                last.0 = Occur::Must;
                            }
                        }
                        if occur == Occur::Should {
                            occur = Occur::Must;
                        }
                        conjunction = false;
                    }
                    clauses.push((occur, query));
                }
            }
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = clauses
            .into_iter()
            .filter_map(|(occur, query)| query.map(|q| (occur, q)))
            .collect();

        if clauses.len() == 1 && clauses[0].0 == Occur::Should {
            if let Some((_, query)) = clauses.pop() {
                return Ok(query);
            }
        }

        let mut query = BooleanQuery::new();
        for (occur, clause) in clauses {
            query.add_clause(BooleanClause::new(clause, occur));
        }
        Ok(Box::new(query))
    }

    fn clause_follows(&mut self) -> bool {
        matches!(
            self.lexemes.peek(),
            Some(
                Lexeme::Word { .. }
                    | Lexeme::Phrase { .. }
                    | Lexeme::LParen
                    | Lexeme::Plus
                    | Lexeme::Minus
                    | Lexeme::Not
            )
        )
    }

    fn parse_clause(&mut self) -> Result<(Occur, Option<Box<dyn Query>>)> {
        let occur = match self.lexemes.peek() {
            Some(Lexeme::Plus) => Occur::Must,
            Some(Lexeme::Minus) | Some(Lexeme::Not) => Occur::MustNot,
            _ => Occur::Should,
        };
        if occur != Occur::Should {
            self.lexemes.next();
            if !self.clause_follows() {
                return Err(CuratorError::query("operator without a clause"));
            }
        }

        let mut query = match self.lexemes.next() {
            Some(Lexeme::Word { field, text }) => {
                self.query_parser
                    .text_query(field.as_deref(), &text, false)?
            }
            Some(Lexeme::Phrase { field, text }) => {
                self.query_parser.text_query(field.as_deref(), &text, true)?
            }
            Some(Lexeme::LParen) => Some(self.parse_group(true)?),
            Some(Lexeme::Plus) | Some(Lexeme::Minus) | Some(Lexeme::Not) => {
                return Err(CuratorError::query("repeated clause operator"));
            }
            other => {
                return Err(CuratorError::query(format!(
                    "unexpected {other:?} where a clause was expected"
                )));
            }
        };

        if let Some(Lexeme::Boost(boost)) = self.lexemes.peek() {
            let boost = *boost;
            self.lexemes.next();
            if let Some(q) = query.as_mut() {
                q.set_boost(q.boost() * boost);
            }
        }

        Ok((occur, query))
    }
}
