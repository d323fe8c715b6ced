//! Query guard: static-text SQL injection signatures.
//!
//! The guard inspects the literal SQL template of a statement, never bound
//! parameter values. Every statement the write pipeline runs binds user input
//! as parameters, so the guard is a tripwire for regressions in
//! developer-authored SQL text.
//!
//! Normalization strips all whitespace and lowercases the text, so
//! `UNION  SELECT` and `union\nselect` hit the same signature.

use once_cell::sync::Lazy;
use regex::RegexSet;
use tracing::warn;

use crate::error::{Error, Result};

/// Named signatures matched against normalized SQL text.
pub const SIGNATURES: &[(&str, &str)] = &[
    ("tautology", r"(?:or|and)\d+=\d+"),
    ("quoted_tautology", r#"(?:or|and)(?:'[^']*'='|"[^"]*"=")"#),
    ("comment_after_quote", r"'(?:--|#|/\*)"),
    ("union_select", r"union(?:all)?select"),
    ("time_probe", r"(?:pg_)?sleep\(|benchmark\(\d+,|waitfordelay"),
    ("destructive_ddl", r"drop(?:table|database|schema)|truncatetable"),
    (
        "privilege_escalation",
        r"xp_cmdshell|exec(?:ute)?(?:\(|xp_|sp_|master\.|immediate)",
    ),
    ("schema_probe", r"information_schema|pg_catalog"),
    (
        "file_exfiltration",
        r"load_file\(|into(?:out|dump)file|pg_read_(?:binary_)?file\(",
    ),
    ("stacked_statement", r";."),
];

static SIGNATURE_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(SIGNATURES.iter().map(|(_, pattern)| *pattern))
        .expect("query guard signatures are valid regexes")
});

/// Strip all whitespace and lowercase.
pub fn normalize(sql: &str) -> String {
    sql.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Name of the first signature the statement matches, if any.
pub fn detect(sql: &str) -> Option<&'static str> {
    let normalized = normalize(sql);
    SIGNATURE_SET
        .matches(&normalized)
        .iter()
        .next()
        .map(|idx| SIGNATURES[idx].0)
}

/// Returns `true` when the statement must be rejected.
pub fn validate(sql: &str) -> bool {
    detect(sql).is_some()
}

/// Check every statement, failing on the first one the guard flags.
///
/// Only the signature name is logged; statement bodies stay out of logs.
pub fn check<'a, I>(statements: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for (position, sql) in statements.into_iter().enumerate() {
        if let Some(signature) = detect(sql) {
            warn!(
                subsystem = "guard",
                signature,
                statement_index = position,
                "Statement rejected by query guard"
            );
            return Err(Error::GuardRejection(format!(
                "statement {} matched signature '{}'",
                position, signature
            )));
        }
    }
    Ok(())
}
