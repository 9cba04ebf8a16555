use chrono::{Datelike, Utc};
use regex::Regex;
use sqlparser::ast::{Expr, LimitClause, Statement, Value};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::api::middleware::AppError;
use crate::models::{GeneratedSql, SafeSql};

/// Write/DDL/privilege verbs that must never appear in a generated statement,
/// matched as whole words anywhere in the text. `into` covers SELECT INTO.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "truncate", "create", "grant", "revoke",
    "execute", "into",
];

/// System catalogs the generator has no business reading.
const FORBIDDEN_CATALOGS: &[&str] = &["pg_catalog", "information_schema"];

/// The primary transactional table and its category semantics. Revenue math is
/// only correct over purchase records; top-ups and returns must be excluded.
pub const TRANSACTION_TABLE: &str = "member_transactions";
pub const CATEGORY_COLUMN: &str = "transaction_type";
pub const PURCHASE_CATEGORY: &str = "消費";
pub const VALID_CATEGORIES: &[&str] = &["消費", "儲值", "退貨"];

/// Category literals the generator keeps inventing for "purchase".
const WRONG_CATEGORY_ALIASES: &[&str] = &[
    "消费", "購買", "购买", "交易", "purchase", "purchases", "sale", "sales", "buy",
];

/// SQL safety validator and rewriter.
///
/// The generator is assumed adversarial: this is the single trust boundary
/// between generated text and the database. `validate` is pure and total:
/// for any input it terminates with a [`SafeSql`] or a rejection reason, and
/// it never executes anything itself.
pub struct SqlGuard;

impl SqlGuard {
    pub fn validate(raw: &GeneratedSql, row_limit: u64) -> Result<SafeSql, AppError> {
        Self::validate_with_year(raw, row_limit, Utc::now().year())
    }

    /// `year` anchors month-equality rewrites; injected so tests stay stable.
    pub fn validate_with_year(
        raw: &GeneratedSql,
        row_limit: u64,
        year: i32,
    ) -> Result<SafeSql, AppError> {
        let text = raw.as_str().trim();
        // A single trailing separator is harmless formatting; strip it before the gates.
        let text = text.strip_suffix(';').unwrap_or(text).trim_end();

        if text.is_empty() {
            return Err(AppError::RejectedSql("Empty statement".to_string()));
        }

        let lowered = text.to_lowercase();

        // Denylist runs first so the rejection reason names the offending token.
        for keyword in FORBIDDEN_KEYWORDS {
            if contains_word(&lowered, keyword) {
                return Err(AppError::RejectedSql(format!(
                    "Forbidden keyword: {}",
                    keyword.to_uppercase()
                )));
            }
        }
        for catalog in FORBIDDEN_CATALOGS {
            if lowered.contains(catalog) {
                return Err(AppError::RejectedSql(format!(
                    "Forbidden reference: {}",
                    catalog
                )));
            }
        }

        let introducer = lowered.split_whitespace().next().unwrap_or("");
        if introducer != "select" && introducer != "with" {
            return Err(AppError::RejectedSql(
                "Only read-only SELECT queries are allowed".to_string(),
            ));
        }

        // Any separator left in the body smells like a smuggled second statement.
        if text.contains(';') {
            return Err(AppError::RejectedSql(
                "Statement separator ';' is not allowed".to_string(),
            ));
        }
        if text.contains("--") || text.contains("/*") {
            return Err(AppError::RejectedSql(
                "SQL comments are not allowed".to_string(),
            ));
        }

        // Compensating rewrites, applied only once every gate has passed.
        let rewritten = rewrite_month_filters(text, year);
        let rewritten = enforce_purchase_filter(&rewritten);

        let capped = enforce_row_limit(&rewritten, row_limit)?;

        Ok(SafeSql::new(capped))
    }
}

/// Whole-word, ASCII-identifier-boundary match. `create` must not fire on
/// `created_at`.
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(index, _)| {
        let before = haystack[..index].chars().next_back();
        let after = haystack[index + word.len()..].chars().next();
        let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
        !before.map_or(false, is_ident) && !after.map_or(false, is_ident)
    })
}

/// Rewrite `EXTRACT(MONTH FROM col) = N` / `DATE_PART('month', col) = N` into
/// an explicit date range anchored to `year`. Naive month-equality filters
/// silently match the same month of every year in the table.
fn rewrite_month_filters(sql: &str, year: i32) -> String {
    let re = Regex::new(
        r"(?i)(?:EXTRACT\s*\(\s*MONTH\s+FROM\s+([A-Za-z_][A-Za-z0-9_.]*)\s*\)|DATE_PART\s*\(\s*'month'\s*,\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\))\s*=\s*([0-9]{1,2})",
    )
    .unwrap();

    re.replace_all(sql, |caps: &regex::Captures| {
        let column = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let month: u32 = caps[3].parse().unwrap_or(0);
        if !(1..=12).contains(&month) {
            return caps[0].to_string();
        }
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        format!(
            "{col} >= '{year:04}-{month:02}-01' AND {col} < '{next_year:04}-{next_month:02}-01'",
            col = column
        )
    })
    .into_owned()
}

/// Keep statements over the transactional table on the correct category.
///
/// Known-wrong category literals are normalized to the purchase value, and a
/// statement that filters rows but never mentions the category column gets the
/// purchase filter injected right after WHERE. Statements with no WHERE clause
/// at all are left as-is.
fn enforce_purchase_filter(sql: &str) -> String {
    if !contains_word(&sql.to_lowercase(), TRANSACTION_TABLE) {
        return sql.to_string();
    }

    let value_re = Regex::new(&format!(r"(?i)\b{}\s*=\s*'([^']*)'", CATEGORY_COLUMN)).unwrap();
    let normalized = value_re
        .replace_all(sql, |caps: &regex::Captures| {
            let value = &caps[1];
            if WRONG_CATEGORY_ALIASES
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(value))
            {
                format!("{} = '{}'", CATEGORY_COLUMN, PURCHASE_CATEGORY)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    // Column referenced anywhere (filter, grouping, projection) means the
    // generator made a deliberate choice; only inject when it is absent.
    if contains_word(&normalized.to_lowercase(), CATEGORY_COLUMN) {
        return normalized;
    }

    let where_re = Regex::new(r"(?i)\bWHERE\b").unwrap();
    match where_re.find(&normalized) {
        Some(found) => {
            let mut injected = String::with_capacity(normalized.len() + 40);
            injected.push_str(&normalized[..found.end()]);
            injected.push_str(&format!(" {} = '{}' AND", CATEGORY_COLUMN, PURCHASE_CATEGORY));
            injected.push_str(&normalized[found.end()..]);
            injected
        }
        None => normalized,
    }
}

/// Enforce the hard row cap: append a LIMIT when missing, clamp one that
/// exceeds the cap. Detection parses the AST so identifiers like
/// `table_limit` cannot fool it.
fn enforce_row_limit(sql: &str, row_limit: u64) -> Result<String, AppError> {
    let dialect = PostgreSqlDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(sql)
        .map_err(|e| AppError::RejectedSql(format!("SQL parsing error: {}", e)))?;

    let statements = parser
        .parse_statements()
        .map_err(|e| AppError::RejectedSql(format!("SQL parsing error: {}", e)))?;

    let statement = statements
        .first()
        .ok_or_else(|| AppError::RejectedSql("Empty statement".to_string()))?;

    let Statement::Query(query) = statement else {
        return Err(AppError::RejectedSql(
            "Only read-only SELECT queries are allowed".to_string(),
        ));
    };

    match query.limit_clause.as_ref() {
        None => Ok(format!("{} LIMIT {}", sql.trim_end(), row_limit)),
        Some(clause) => match limit_clause_value(clause) {
            Some(value) if value <= row_limit => Ok(sql.to_string()),
            // Over the cap, or non-numeric (LIMIT ALL): clamp to the cap.
            _ => Ok(replace_final_limit(sql, row_limit)),
        },
    }
}

fn limit_clause_value(clause: &LimitClause) -> Option<u64> {
    match clause {
        LimitClause::LimitOffset { limit, .. } => limit.as_ref().and_then(expr_number),
        LimitClause::OffsetCommaLimit { limit, .. } => expr_number(limit),
    }
}

fn expr_number(expr: &Expr) -> Option<u64> {
    if let Expr::Value(value) = expr {
        if let Value::Number(number, _) = &value.value {
            return number.parse().ok();
        }
    }
    None
}

/// The top-level LIMIT is textually the last one in the statement.
fn replace_final_limit(sql: &str, row_limit: u64) -> String {
    let re = Regex::new(r"(?i)\bLIMIT\s+(?:ALL|[0-9]+)").unwrap();
    match re.find_iter(sql).last() {
        Some(found) => {
            let mut replaced = String::with_capacity(sql.len());
            replaced.push_str(&sql[..found.start()]);
            replaced.push_str(&format!("LIMIT {}", row_limit));
            replaced.push_str(&sql[found.end()..]);
            replaced
        }
        None => format!("{} LIMIT {}", sql.trim_end(), row_limit),
    }
}
