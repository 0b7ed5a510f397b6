//! SQL DDL reading for schema extraction.
//!
//! Only what ordering needs is extracted from CREATE TABLE and ALTER TABLE:
//! - Table names (with an optional schema qualifier)
//! - FOREIGN KEY ... REFERENCES constraints, table-level and inline on columns

use super::{ForeignKey, Schema, TableId, TableSchema};
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex to extract the (optional) schema and table name from CREATE TABLE
/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table (unquoted), schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[`"]?(\w+)[\]`"]?\s*\.\s*)?[\[`"]?([^\[\]`"\s(.]+)[\]`"]?"#)
        .unwrap()
});

/// Regex to extract the (optional) schema and table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)ALTER\s+TABLE\s+(?:ONLY\s+)?(?:[\[`"]?(\w+)[\]`"]?\s*\.\s*)?[\[`"]?([^\[\]`"\s.]+)[\]`"]?"#).unwrap()
});

/// Regex for FOREIGN KEY constraint with optional constraint name
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*\([^)]+\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#,
    )
    .unwrap()
});

/// Regex for an inline column reference: `member_id INT REFERENCES member(id)`
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*[\[`"]?\w+[\]`"]?\s+\w+.*?\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Builder for constructing schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            schema: Schema::new(),
        }
    }

    /// Feed a whole SQL script, statement by statement
    pub fn parse_script(&mut self, sql: &str) {
        for stmt in split_statements(sql) {
            let upper = stmt.trim_start().to_uppercase();
            if upper.starts_with("CREATE TABLE") {
                self.parse_create_table(&stmt);
            } else if upper.starts_with("ALTER TABLE") {
                self.parse_alter_table(&stmt);
            }
        }
    }

    /// Parse a CREATE TABLE statement and add to schema
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<TableId> {
        let (schema_name, table_name) = extract_create_table_name(stmt)?;

        let mut table = TableSchema::new(table_name, TableId(0));
        table.schema = schema_name;
        if let Some(id) = self.schema.find_qualified(&table.qualified_name()) {
            return Some(id);
        }

        let body = extract_table_body(stmt)?;
        for part in split_table_body(&body) {
            let upper = part.to_uppercase();
            if upper.starts_with("CONSTRAINT") || upper.starts_with("FOREIGN KEY") {
                table.foreign_keys.extend(parse_foreign_keys(&part));
            } else if let Some(caps) = INLINE_REFERENCES_RE.captures(&part) {
                table
                    .foreign_keys
                    .push(ForeignKey::new(caps[1].to_string()));
            }
        }

        Some(self.schema.add_table(table))
    }

    /// Parse an ALTER TABLE statement and attach any FK it adds
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_alter_table_name(stmt)?;
        let table_id = self.schema.get_table_id(&table_name)?;

        let fks = parse_foreign_keys(stmt);
        if let Some(table) = self.schema.table_mut(table_id) {
            table.foreign_keys.extend(fks);
        }

        Some(table_id)
    }

    /// Finalize the schema, resolving all FK references
    pub fn build(mut self) -> Schema {
        self.schema.resolve_foreign_keys();
        self.schema
    }
}

/// Extract `(schema, table)` from a CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<(Option<String>, String)> {
    let caps = CREATE_TABLE_NAME_RE.captures(stmt)?;
    let schema = caps.get(1).map(|m| m.as_str().to_string());
    let table = caps.get(2)?.as_str().to_string();
    Some((schema, table))
}

/// Extract the table name from an ALTER TABLE statement, schema-qualified when
/// the statement qualifies it
pub fn extract_alter_table_name(stmt: &str) -> Option<String> {
    let caps = ALTER_TABLE_NAME_RE.captures(stmt)?;
    let table = caps.get(2)?.as_str();
    Some(match caps.get(1) {
        Some(schema) => format!("{}.{}", schema.as_str(), table),
        None => table.to_string(),
    })
}

/// Split a script on top-level semicolons, ignoring those inside quotes
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    for ch in sql.chars() {
        if ch == '\'' {
            in_string = !in_string;
        }
        if ch == ';' && !in_string {
            if !current.trim().is_empty() {
                statements.push(current.trim().to_string());
            }
            current.clear();
            continue;
        }
        current.push(ch);
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let bytes = stmt.as_bytes();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\'' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Split table body by commas, respecting nested parentheses
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;

    for ch in body.chars() {
        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse FOREIGN KEY constraints from a statement
fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKey> {
    FOREIGN_KEY_RE
        .captures_iter(stmt)
        .filter_map(|caps| {
            let ref_table = caps.get(2)?.as_str().to_string();
            let mut fk = ForeignKey::new(ref_table);
            fk.name = caps.get(1).map(|m| m.as_str().to_string());
            Some(fk)
        })
        .collect()
}
