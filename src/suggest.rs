/// Suggestion Index for autocomplete.
///
/// A derived mapping from qualified table name to its column names, rebuilt
/// wholesale from a silent catalog query. Candidates are the known table
/// names, plus the columns of any table whose name appears anywhere in the
/// accumulated statement context. The partial token is normalized to bracket
/// quoting before prefix matching.
use crate::driver::{RowSet, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Catalog query feeding the index: one row per column, with the table in
/// qualified quoted form.
pub const COLLECTOR_SQL: &str = "\
SELECT '[main].[' || m.[name] || ']' AS [table], '[' || p.[name] || ']' AS [column]
FROM [sqlite_master] AS m, pragma_table_info(m.[name]) AS p
WHERE m.[type] IN ('table', 'view')
ORDER BY m.[name], p.[cid];";

/// Outcome of a completion request: replace the token in place, show a list,
/// or do nothing (no match, or too ambiguous).
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Single(String),
    List(Vec<String>),
    Empty,
}

#[derive(Debug, Default)]
pub struct SuggestionIndex {
    /// Qualified table names in catalog order
    tables: Vec<String>,
    columns: HashMap<String, Vec<String>>,
}

impl SuggestionIndex {
    pub fn new() -> Self {
        SuggestionIndex::default()
    }

    /// Replaces the whole mapping with the contents of a collector row-set
    /// (column 0 = qualified table, column 1 = quoted column).
    pub fn rebuild(&mut self, rowset: &RowSet) {
        self.tables.clear();
        self.columns.clear();
        for row in &rowset.rows {
            let (Some(Value::Text(table)), Some(Value::Text(column))) =
                (row.first(), row.get(1))
            else {
                continue;
            };
            match self.columns.get_mut(table) {
                Some(cols) => cols.push(column.clone()),
                None => {
                    self.tables.push(table.clone());
                    self.columns.insert(table.clone(), vec![column.clone()]);
                }
            }
        }
    }

    /// All table names, plus the columns of tables mentioned in `context`,
    /// deduplicated preserving first-seen order.
    pub fn candidates(&self, context: &str) -> Vec<String> {
        let mut out: Vec<String> = self.tables.clone();
        for table in &self.tables {
            if context.contains(table.as_str()) {
                if let Some(cols) = self.columns.get(table) {
                    out.extend(cols.iter().cloned());
                }
            }
        }
        let mut seen = HashSet::new();
        out.retain(|c| seen.insert(c.clone()));
        out
    }

    /// Completion policy: exactly one prefix hit replaces the token, two to
    /// ten hits become a suggestion list, anything else yields nothing.
    pub fn complete(&self, partial: &str, context: &str) -> Completion {
        let normalized = normalize_partial(partial);
        let hits: Vec<String> = self
            .candidates(context)
            .into_iter()
            .filter(|c| c.starts_with(&normalized))
            .collect();
        match hits.len() {
            1 => Completion::Single(hits.into_iter().next().unwrap()),
            2..=10 => Completion::List(hits),
            _ => Completion::Empty,
        }
    }
}

static UNQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[*([^\[\]]+)\]*").unwrap());

/// Rewrites a partial token to bracket-quoted form, one segment per `.`,
/// with the trailing `]` removed so the unfinished segment stays a prefix:
/// `dbo.us` and `[dbo].[us` both become `[dbo].[us`.
fn normalize_partial(word: &str) -> String {
    let quoted: Vec<String> = word
        .split('.')
        .map(|segment| {
            let inner = UNQUOTE
                .captures(segment)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .unwrap_or("");
            format!("[{}]", inner)
        })
        .collect();
    let mut joined = quoted.join(".");
    joined.pop();
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Column, TypeInfo};

    fn collector_rowset(pairs: &[(&str, &str)]) -> RowSet {
        RowSet {
            columns: vec![
                Column {
                    name: "table".to_string(),
                    type_info: TypeInfo::Other,
                },
                Column {
                    name: "column".to_string(),
                    type_info: TypeInfo::Other,
                },
            ],
            rows: pairs
                .iter()
                .map(|(t, c)| {
                    vec![
                        Value::Text(t.to_string()),
                        Value::Text(c.to_string()),
                    ]
                })
                .collect(),
        }
    }

    fn sample_index() -> SuggestionIndex {
        let mut index = SuggestionIndex::new();
        index.rebuild(&collector_rowset(&[
            ("[dbo].[users]", "[id]"),
            ("[dbo].[users]", "[name]"),
            ("[dbo].[orders]", "[id]"),
            ("[dbo].[orders]", "[total]"),
        ]));
        index
    }

    #[test]
    fn test_normalize_partial() {
        assert_eq!(normalize_partial("[dbo].[us"), "[dbo].[us");
        assert_eq!(normalize_partial("dbo.us"), "[dbo].[us");
        assert_eq!(normalize_partial("us"), "[us");
        assert_eq!(normalize_partial("[dbo]."), "[dbo].[");
    }

    #[test]
    fn test_single_hit_replaces_token() {
        let index = sample_index();
        assert_eq!(
            index.complete("[dbo].[us", ""),
            Completion::Single("[dbo].[users]".to_string())
        );
    }

    #[test]
    fn test_zero_hits_yields_nothing() {
        let index = sample_index();
        assert_eq!(index.complete("[dbo].[zz", ""), Completion::Empty);
    }

    #[test]
    fn test_more_than_ten_hits_yields_nothing() {
        let mut index = SuggestionIndex::new();
        let pairs: Vec<(String, String)> = (0..12)
            .map(|i| (format!("[dbo].[t{:02}]", i), "[id]".to_string()))
            .collect();
        let borrowed: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(t, c)| (t.as_str(), c.as_str()))
            .collect();
        index.rebuild(&collector_rowset(&borrowed));
        assert_eq!(index.complete("[dbo].[t", ""), Completion::Empty);
    }

    #[test]
    fn test_few_hits_are_listed() {
        let index = sample_index();
        match index.complete("[dbo].[", "") {
            Completion::List(hits) => {
                assert_eq!(hits, vec!["[dbo].[users]", "[dbo].[orders]"]);
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_columns_require_table_in_context() {
        let index = sample_index();
        // without context the column names of users are not candidates
        assert_eq!(index.complete("[na", ""), Completion::Empty);
        // once the statement mentions the table, its columns join in
        assert_eq!(
            index.complete("[na", "select * from [dbo].[users] where "),
            Completion::Single("[name]".to_string())
        );
    }

    #[test]
    fn test_candidates_deduplicate_preserving_order() {
        let index = sample_index();
        let context = "select * from [dbo].[users], [dbo].[orders]";
        let candidates = index.candidates(context);
        assert_eq!(
            candidates,
            vec!["[dbo].[users]", "[dbo].[orders]", "[id]", "[name]", "[total]"]
        );
    }

    #[test]
    fn test_rebuild_discards_previous_mapping() {
        let mut index = sample_index();
        index.rebuild(&collector_rowset(&[("[main].[logs]", "[ts]")]));
        assert_eq!(
            index.complete("[main].[lo", ""),
            Completion::Single("[main].[logs]".to_string())
        );
        assert_eq!(index.complete("[dbo].[us", ""), Completion::Empty);
    }
}
