//! `SchemaBackend` over a SQL DDL dump.
//!
//! Parses `CREATE TABLE` and `CREATE INDEX` statements from a schema dump
//! file with conservative regexes, the same style the model scanner uses.
//! This is the stand-in for live-connection introspection: point it at the
//! schema dump the application already ships.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::GraphError;
use crate::schema::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, SchemaBackend, TableSchema,
};

#[derive(Debug)]
struct DdlPatterns {
    create_table: Regex,
    create_index: Regex,
    primary_key: Regex,
    unique_key: Regex,
    plain_key: Regex,
    foreign_key: Regex,
    on_delete: Regex,
    on_update: Regex,
    column_def: Regex,
    not_null: Regex,
    default_value: Regex,
}

impl DdlPatterns {
    fn compile() -> Self {
        // Conservative patterns; identifiers may be bare, backticked, or double-quoted.
        let create_table = Regex::new(
            r#"(?is)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?["`]?(?P<name>[A-Za-z_][A-Za-z0-9_]*)["`]?\s*\((?P<body>.*)\)"#,
        )
        .unwrap();
        let create_index = Regex::new(
            r#"(?is)^\s*CREATE\s+(?P<unique>UNIQUE\s+)?INDEX\s+["`]?(?P<name>[A-Za-z_][A-Za-z0-9_]*)["`]?\s+ON\s+["`]?(?P<table>[A-Za-z_][A-Za-z0-9_]*)["`]?\s*\((?P<cols>[^)]*)\)"#,
        )
        .unwrap();
        let primary_key = Regex::new(r"(?i)^PRIMARY\s+KEY\s*\((?P<cols>[^)]*)\)").unwrap();
        let unique_key = Regex::new(
            r#"(?i)^UNIQUE\s+(?:KEY|INDEX)?\s*["`]?(?P<name>[A-Za-z_][A-Za-z0-9_]*)?["`]?\s*\((?P<cols>[^)]*)\)"#,
        )
        .unwrap();
        let plain_key = Regex::new(
            r#"(?i)^(?:KEY|INDEX)\s+["`]?(?P<name>[A-Za-z_][A-Za-z0-9_]*)["`]?\s*\((?P<cols>[^)]*)\)"#,
        )
        .unwrap();
        let foreign_key = Regex::new(
            r#"(?is)^(?:CONSTRAINT\s+["`]?(?P<name>[A-Za-z_][A-Za-z0-9_]*)["`]?\s+)?FOREIGN\s+KEY\s*\((?P<cols>[^)]*)\)\s*REFERENCES\s+["`]?(?P<ftable>[A-Za-z_][A-Za-z0-9_]*)["`]?\s*\((?P<fcols>[^)]*)\)(?P<rest>.*)$"#,
        )
        .unwrap();
        let on_delete = Regex::new(
            r"(?i)ON\s+DELETE\s+(?P<action>CASCADE|RESTRICT|SET\s+NULL|SET\s+DEFAULT|NO\s+ACTION)",
        )
        .unwrap();
        let on_update = Regex::new(
            r"(?i)ON\s+UPDATE\s+(?P<action>CASCADE|RESTRICT|SET\s+NULL|SET\s+DEFAULT|NO\s+ACTION)",
        )
        .unwrap();
        let column_def = Regex::new(
            r#"(?i)^["`]?(?P<name>[A-Za-z_][A-Za-z0-9_]*)["`]?\s+(?P<type>[A-Za-z]+(?:\s+(?:varying|precision))?(?:\([^)]*\))?)"#,
        )
        .unwrap();
        let not_null = Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap();
        let default_value =
            Regex::new(r"(?i)\bDEFAULT\s+(?P<value>'[^']*'|[A-Za-z0-9_.]+(?:\(\))?)").unwrap();
        Self {
            create_table,
            create_index,
            primary_key,
            unique_key,
            plain_key,
            foreign_key,
            on_delete,
            on_update,
            column_def,
            not_null,
            default_value,
        }
    }
}

/// Schema backend parsed from a DDL dump.
#[derive(Debug, Default)]
pub struct DdlSchema {
    tables: HashMap<String, TableSchema>,
}

impl DdlSchema {
    /// Parse a schema dump from a file.
    ///
    /// # Errors
    /// Returns `GraphError::Io` when the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, GraphError> {
        let sql = std::fs::read_to_string(path)?;
        Ok(Self::from_sql(&sql))
    }

    /// Parse a schema dump from a string. Statements that are not
    /// `CREATE TABLE` / `CREATE INDEX`, and table entries that match no
    /// known shape, are skipped.
    #[must_use]
    pub fn from_sql(sql: &str) -> Self {
        let patterns = DdlPatterns::compile();
        let mut tables: HashMap<String, TableSchema> = HashMap::new();

        for statement in split_statements(&strip_comments(sql)) {
            if let Some(cap) = patterns.create_table.captures(&statement) {
                let name = cap["name"].to_string();
                let body = cap.name("body").map_or("", |m| m.as_str());
                let table = parse_table_body(&patterns, &name, body);
                tables.insert(name, table);
            } else if let Some(cap) = patterns.create_index.captures(&statement) {
                let table_name = cap["table"].to_string();
                let index = IndexDescriptor {
                    name: cap["name"].to_string(),
                    columns: parse_column_list(&cap["cols"]),
                    unique: cap.name("unique").is_some(),
                };
                tables.entry(table_name).or_default().indexes.push(index);
            }
        }
        Self { tables }
    }

    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl SchemaBackend for DdlSchema {
    fn table_exists(&self, table: &str) -> Result<bool, GraphError> {
        Ok(self.tables.contains_key(table))
    }

    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, GraphError> {
        Ok(self.tables.get(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>, GraphError> {
        Ok(self.tables.get(table).map(|t| t.indexes.clone()).unwrap_or_default())
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyDescriptor>, GraphError> {
        Ok(self.tables.get(table).map(|t| t.foreign_keys.clone()).unwrap_or_default())
    }
}

fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);

    out.lines()
        .map(|line| {
            let line = line.split_once("--").map_or(line, |(head, _)| head);
            line.split_once('#').map_or(line, |(head, _)| head)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

// Split a CREATE TABLE body on commas outside parentheses.
fn split_top_level(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in body.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

fn parse_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| {
            // Strip quoting and prefix-length specs like `name(10)`.
            let c = c.trim().trim_matches(|ch| ch == '`' || ch == '"');
            c.split('(').next().unwrap_or(c).trim().to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}

fn normalize_action(action: &str) -> String {
    action.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

fn parse_table_body(patterns: &DdlPatterns, table: &str, body: &str) -> TableSchema {
    let mut schema = TableSchema::default();
    let mut unnamed_fk = 0usize;

    for entry in split_top_level(body) {
        if let Some(cap) = patterns.primary_key.captures(&entry) {
            schema.indexes.push(IndexDescriptor {
                name: "primary".to_string(),
                columns: parse_column_list(&cap["cols"]),
                unique: true,
            });
        } else if let Some(cap) = patterns.foreign_key.captures(&entry) {
            unnamed_fk += 1;
            let name = cap
                .name("name")
                .map_or_else(|| format!("{table}_fk_{unnamed_fk}"), |m| m.as_str().to_string());
            let rest = cap.name("rest").map_or("", |m| m.as_str());
            schema.foreign_keys.push(ForeignKeyDescriptor {
                name,
                columns: parse_column_list(&cap["cols"]),
                foreign_table: cap["ftable"].to_string(),
                foreign_columns: parse_column_list(&cap["fcols"]),
                on_update: patterns
                    .on_update
                    .captures(rest)
                    .map(|c| normalize_action(&c["action"])),
                on_delete: patterns
                    .on_delete
                    .captures(rest)
                    .map(|c| normalize_action(&c["action"])),
            });
        } else if let Some(cap) = patterns.unique_key.captures(&entry) {
            let columns = parse_column_list(&cap["cols"]);
            let name = cap.name("name").map_or_else(
                || format!("{table}_{}_unique", columns.join("_")),
                |m| m.as_str().to_string(),
            );
            schema.indexes.push(IndexDescriptor { name, columns, unique: true });
        } else if let Some(cap) = patterns.plain_key.captures(&entry) {
            schema.indexes.push(IndexDescriptor {
                name: cap["name"].to_string(),
                columns: parse_column_list(&cap["cols"]),
                unique: false,
            });
        } else if entry.get(..10).is_some_and(|p| p.eq_ignore_ascii_case("constraint")) {
            // Non-FK constraints (e.g. CHECK) are not column definitions.
        } else if let Some(cap) = patterns.column_def.captures(&entry) {
            let mut column = ColumnDescriptor::new(&cap["name"], cap["type"].trim());
            if patterns.not_null.is_match(&entry) {
                column.nullable = false;
            }
            if let Some(dc) = patterns.default_value.captures(&entry) {
                column.default = Some(dc["value"].trim_matches('\'').to_string());
            }
            schema.columns.push(column);
        }
        // Unrecognized entries (CHECK constraints, engine options) are skipped.
    }
    schema
}
