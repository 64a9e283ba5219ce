//! Detection of table-like rows in technical books.
//!
//! Tables flattened by the classifier keep a two-space gap between cells.
//! A gap alone is too weak (prose after a sentence often has two spaces),
//! so a gapped row also needs technical vocabulary. A file path marks a
//! row on its own.

const TECH_KEYWORDS: &[&str] = &[
    "component",
    "url",
    "route",
    "path",
    "api",
    "endpoint",
    "method",
    "function",
    "class",
    "import",
    "export",
    "next.js",
    "remix",
    "react",
    "javascript",
    "typescript",
];

const PATH_TOKENS: &[&str] = &[
    "/pages", "/app/", "/routes", "/src/", "/components", ".js", ".jsx", ".ts", ".tsx", ".html",
];

fn has_column_gap(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.contains("  ") || trimmed.contains('\t')
}

/// Whether a prose group reads as a table row.
pub fn is_table_row(text: &str) -> bool {
    let lower = text.to_lowercase();
    if PATH_TOKENS.iter().any(|p| lower.contains(p)) {
        return true;
    }
    has_column_gap(text) && TECH_KEYWORDS.iter().any(|k| lower.contains(k))
}
