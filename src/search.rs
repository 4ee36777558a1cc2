//! Filtered document search.
//!
//! A [`SearchFilter`] carries up to four optional fields. Each present,
//! non-blank field adds one conjunctive predicate; the predicate text and
//! its bound values are produced together by [`SearchFilter::to_query`] so
//! that filter values only ever reach SQLite as bind parameters.
//!
//! Results are ordered by `added_date` descending with null dates last,
//! then by id descending.

use serde::Deserialize;
use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::models::DocumentView;

const BASE_QUERY: &str = r#"
SELECT d.ecli_id, d.court, d.year, d.added_date, m.page_count, m.file_size
FROM documents d
LEFT JOIN document_metrics m ON d.id = m.document_id
"#;

const ORDER_CLAUSE: &str = " ORDER BY d.added_date DESC NULLS LAST, d.id DESC";

/// Optional filter fields, as received from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub court: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub min_pages: Option<String>,
    #[serde(default)]
    pub max_pages: Option<String>,
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterParam {
    Text(String),
    Int(i64),
}

/// Predicate text with its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub where_clause: String,
    pub params: Vec<FilterParam>,
}

impl FilterQuery {
    fn new() -> Self {
        Self {
            where_clause: "WHERE 1=1".to_string(),
            params: Vec::new(),
        }
    }

    fn and(mut self, predicate: &str, param: FilterParam) -> Self {
        self.where_clause.push_str(" AND ");
        self.where_clause.push_str(predicate);
        self.params.push(param);
        self
    }

    /// Full statement text including the select list and ordering.
    pub fn sql(&self) -> String {
        format!("{}{}{}", BASE_QUERY, self.where_clause, ORDER_CLAUSE)
    }
}

impl SearchFilter {
    /// Validate the filter and build its predicate.
    ///
    /// Page bounds must parse as integers; anything else is
    /// [`Error::InvalidFilterValue`] and nothing is executed.
    pub fn to_query(&self) -> Result<FilterQuery> {
        let min_pages = parse_bound("min_pages", self.min_pages.as_deref())?;
        let max_pages = parse_bound("max_pages", self.max_pages.as_deref())?;

        let mut query = FilterQuery::new();

        if let Some(court) = non_blank(self.court.as_deref()) {
            query = query.and("d.court = ?", FilterParam::Text(court.to_string()));
        }
        if let Some(year) = non_blank(self.year.as_deref()) {
            query = query.and("d.year = ?", FilterParam::Text(year.to_string()));
        }
        if let Some(min) = min_pages {
            query = query.and("m.page_count >= ?", FilterParam::Int(min));
        }
        if let Some(max) = max_pages {
            query = query.and("m.page_count <= ?", FilterParam::Int(max));
        }

        Ok(query)
    }

    pub fn is_empty(&self) -> bool {
        non_blank(self.court.as_deref()).is_none()
            && non_blank(self.year.as_deref()).is_none()
            && non_blank(self.min_pages.as_deref()).is_none()
            && non_blank(self.max_pages.as_deref()).is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(field: &'static str, value: Option<&str>) -> Result<Option<i64>> {
    match non_blank(value) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Error::InvalidFilterValue {
                field,
                value: v.to_string(),
            }),
    }
}

/// Return every document matching all supplied filter fields.
///
/// An empty filter returns the whole corpus, including documents that
/// have no metrics row.
pub async fn search_documents(config: &Config, filter: &SearchFilter) -> Result<Vec<DocumentView>> {
    // Validate before touching the store.
    let query = filter.to_query()?;

    let mut conn = db::open(config).await?;
    let result = execute(&mut conn, &query).await;
    db::release(conn).await;
    result
}

async fn execute(conn: &mut SqliteConnection, query: &FilterQuery) -> Result<Vec<DocumentView>> {
    let sql = query.sql();
    tracing::debug!(predicate = %query.where_clause, params = query.params.len(), "search");

    let mut q = sqlx::query_as::<_, DocumentView>(&sql);
    for param in &query.params {
        q = match param {
            FilterParam::Text(s) => q.bind(s.clone()),
            FilterParam::Int(n) => q.bind(*n),
        };
    }

    Ok(q.fetch_all(&mut *conn).await?)
}

/// CLI entry point for `ecli search`.
pub async fn run_search(config: &Config, filter: &SearchFilter) -> anyhow::Result<()> {
    let results = search_documents(config, filter).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, doc) in results.iter().enumerate() {
        println!("{}. {}", i + 1, doc.ecli_id);
        println!(
            "    court: {}  year: {}",
            doc.court.as_deref().unwrap_or("-"),
            doc.year.as_deref().unwrap_or("-")
        );
        if let Some(pages) = doc.page_count {
            println!("    pages: {}", pages);
        }
        if let Some(size) = doc.file_size {
            println!("    size: {} bytes", size);
        }
        if let Some(ref added) = doc.added_date {
            println!("    added: {}", added);
        }
    }
    println!();
    println!("{} document(s)", results.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(court: &str, year: &str, min: &str, max: &str) -> SearchFilter {
        let opt = |s: &str| Some(s.to_string());
        SearchFilter {
            court: opt(court),
            year: opt(year),
            min_pages: opt(min),
            max_pages: opt(max),
        }
    }

    #[test]
    fn test_empty_filter_has_no_predicates() {
        let query = SearchFilter::default().to_query().unwrap();
        assert_eq!(query.where_clause, "WHERE 1=1");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_blank_fields_are_ignored() {
        let f = filter("", "  ", "", "");
        assert!(f.is_empty());
        let query = f.to_query().unwrap();
        assert_eq!(query.where_clause, "WHERE 1=1");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_all_fields_in_lockstep() {
        let query = filter("STJ", "2020", "5", "20").to_query().unwrap();
        assert_eq!(
            query.where_clause,
            "WHERE 1=1 AND d.court = ? AND d.year = ? AND m.page_count >= ? AND m.page_count <= ?"
        );
        assert_eq!(
            query.params,
            vec![
                FilterParam::Text("STJ".to_string()),
                FilterParam::Text("2020".to_string()),
                FilterParam::Int(5),
                FilterParam::Int(20),
            ]
        );
        assert_eq!(query.where_clause.matches('?').count(), query.params.len());
    }

    #[test]
    fn test_values_never_reach_sql_text() {
        let hostile = "STJ' OR '1'='1";
        let f = SearchFilter {
            court: Some(hostile.to_string()),
            year: Some("2020; DROP TABLE documents".to_string()),
            ..Default::default()
        };
        let query = f.to_query().unwrap();
        let sql = query.sql();
        assert!(!sql.contains(hostile));
        assert!(!sql.contains("DROP TABLE"));
        assert_eq!(query.params.len(), 2);
    }

    #[test]
    fn test_non_numeric_min_pages_rejected() {
        let f = SearchFilter {
            min_pages: Some("ten".to_string()),
            ..Default::default()
        };
        match f.to_query() {
            Err(Error::InvalidFilterValue { field, value }) => {
                assert_eq!(field, "min_pages");
                assert_eq!(value, "ten");
            }
            other => panic!("expected InvalidFilterValue, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_max_pages_rejected() {
        let f = SearchFilter {
            court: Some("STJ".to_string()),
            max_pages: Some("12.5".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            f.to_query(),
            Err(Error::InvalidFilterValue {
                field: "max_pages",
                ..
            })
        ));
    }

    #[test]
    fn test_bounds_are_trimmed() {
        let f = SearchFilter {
            min_pages: Some(" 3 ".to_string()),
            ..Default::default()
        };
        let query = f.to_query().unwrap();
        assert_eq!(query.params, vec![FilterParam::Int(3)]);
    }

    #[test]
    fn test_ordering_is_added_date_desc_nulls_last() {
        let sql = SearchFilter::default().to_query().unwrap().sql();
        assert!(sql.ends_with("ORDER BY d.added_date DESC NULLS LAST, d.id DESC"));
    }
}
