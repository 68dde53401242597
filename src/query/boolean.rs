//! Boolean query implementation for combining multiple queries.

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::query::{DocScores, Query};

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
}

/// A clause in a boolean query.
#[derive(Debug, Clone)]
pub struct BooleanClause {
    /// The query for this clause.
    pub query: Box<dyn Query>,
    /// The occurrence requirement.
    pub occur: Occur,
}

impl BooleanClause {
    /// Create a new boolean clause.
    pub fn new(query: Box<dyn Query>, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }
}

/// A boolean query that combines multiple queries with boolean logic.
///
/// Scores of matching clauses are summed and multiplied by the query's own boost.
/// SHOULD clauses are optional when any MUST clause is present; otherwise a
/// document has to match at least one of them.
#[derive(Debug, Clone)]
pub struct BooleanQuery {
    /// The clauses in this boolean query.
    clauses: Vec<BooleanClause>,
    /// The boost factor for this query.
    boost: f32,
}

impl BooleanQuery {
    /// Create a new empty boolean query. An empty query matches nothing.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            boost: 1.0,
        }
    }

    /// Add a clause to this boolean query.
    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    /// Add a MUST clause.
    pub fn add_must(&mut self, query: Box<dyn Query>) {
        self.add_clause(BooleanClause::new(query, Occur::Must));
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: Box<dyn Query>) {
        self.add_clause(BooleanClause::new(query, Occur::Should));
    }

    /// Add a MUST_NOT clause.
    pub fn add_must_not(&mut self, query: Box<dyn Query>) {
        self.add_clause(BooleanClause::new(query, Occur::MustNot));
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// Check if this query has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Get clauses by occurrence type.
    pub fn clauses_by_occur(&self, occur: Occur) -> impl Iterator<Item = &BooleanClause> {
        self.clauses.iter().filter(move |c| c.occur == occur)
    }
}

impl Default for BooleanQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl Query for BooleanQuery {
    fn execute(&self, reader: &dyn IndexReader) -> Result<DocScores> {
        if self.clauses.is_empty() {
            return Ok(DocScores::new());
        }

        let mut required: Option<DocScores> = None;
        for clause in self.clauses_by_occur(Occur::Must) {
            let scores = clause.query.execute(reader)?;
            required = Some(match required {
                None => scores,
                Some(acc) => acc
                    .into_iter()
                    .filter_map(|(doc, score)| scores.get(&doc).map(|s| (doc, score + s)))
                    .collect(),
            });
        }

        let mut optional = DocScores::new();
        let mut has_should = false;
        for clause in self.clauses_by_occur(Occur::Should) {
            has_should = true;
            for (doc, score) in clause.query.execute(reader)? {
                *optional.entry(doc).or_insert(0.0) += score;
            }
        }

        let mut matched = match required {
            Some(mut required) => {
                for (doc, score) in required.iter_mut() {
                    if let Some(extra) = optional.get(doc) {
                        *score += extra;
                    }
                }
                required
            }
            None if has_should => optional,
            // Only MUST_NOT clauses: start from every document.
            None => (0..reader.max_doc()).map(|doc| (doc, 0.0)).collect(),
        };

        for clause in self.clauses_by_occur(Occur::MustNot) {
            for doc in clause.query.execute(reader)?.keys() {
                matched.remove(doc);
            }
        }

        if self.boost != 1.0 {
            for score in matched.values_mut() {
                *score *= self.boost;
            }
        }
        Ok(matched)
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn description(&self) -> String {
        let parts: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| {
                let prefix = match clause.occur {
                    Occur::Must => "+",
                    Occur::Should => "",
                    Occur::MustNot => "-",
                };
                let inner = clause.query.description();
                if clause.query.as_any().is::<BooleanQuery>() {
                    format!("{prefix}({inner})")
                } else {
                    format!("{prefix}{inner}")
                }
            })
            .collect();

        let body = parts.join(" ");
        if self.boost == 1.0 {
            body
        } else {
            format!("({body})^{}", self.boost)
        }
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
