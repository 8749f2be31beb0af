use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::core::env::{ANON_KEY, Credentials, EnvFile, SERVICE_ROLE_KEY, URL_KEY};
use crate::core::rpc::{RpcClient, RpcError};

/// Server-side function that executes an arbitrary SQL string.
pub const EXEC_SQL: &str = "exec_sql";

/// How the column list is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// One row of `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Result of a single-column existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    pub column: String,
    pub exists: bool,
    pub error: Option<String>,
}

/// What to ask the service for.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub table: String,
    pub schema: String,
    pub format: OutputFormat,
    /// Columns to check one by one if the RPC call fails.
    pub check_columns: Vec<String>,
}

/// How a probe run ended. Every variant is a normal, non-fatal end.
#[derive(Debug)]
pub enum ProbeOutcome {
    MissingConfig,
    Columns(Vec<ColumnInfo>),
    Failed {
        error: String,
        checks: Vec<ColumnCheck>,
    },
}

/// Builds the `information_schema` query for `schema.table`.
pub fn column_query(table: &str, schema: &str) -> String {
    format!(
        "SELECT column_name, data_type FROM information_schema.columns WHERE table_name = '{}' AND table_schema = '{}'",
        sql_literal(table),
        sql_literal(schema)
    )
}

fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Runs the schema probe.
///
/// Reads credentials from `env_path`, builds a client through `connect` and
/// issues exactly one `exec_sql` call. Missing configuration and call
/// failures are written to `out` and reported through the returned
/// `ProbeOutcome`; only a failure to write to `out` is returned as an error.
pub fn run_probe<C, F, W>(
    env_path: &Path,
    request: &ProbeRequest,
    connect: F,
    out: &mut W,
) -> Result<ProbeOutcome>
where
    C: RpcClient,
    F: FnOnce(&Credentials) -> Result<C>,
    W: Write,
{
    let credentials = match EnvFile::load(env_path) {
        Ok(env) => env.privileged_credentials(),
        Err(e) => {
            debug!("{e:#}");
            None
        }
    };

    let Some(credentials) = credentials else {
        writeln!(
            out,
            "❌ Missing database credentials in {} (need {URL_KEY} and {SERVICE_ROLE_KEY} or {ANON_KEY})",
            env_path.display()
        )?;
        return Ok(ProbeOutcome::MissingConfig);
    };
    debug!(
        "using {:?} key for {}",
        credentials.key_kind, credentials.url
    );

    let client = match connect(&credentials) {
        Ok(client) => client,
        Err(e) => {
            writeln!(out, "RPC Error: {e:#}")?;
            return Ok(ProbeOutcome::Failed {
                error: format!("{e:#}"),
                checks: Vec::new(),
            });
        }
    };

    writeln!(
        out,
        "Checking columns of '{}' via {EXEC_SQL}...",
        request.table
    )?;

    let args = json!({ "sql": column_query(&request.table, &request.schema) });
    match client.rpc(EXEC_SQL, &args).and_then(parse_columns) {
        Ok(columns) => {
            print_columns(out, &request.table, &columns, request.format)?;
            Ok(ProbeOutcome::Columns(columns))
        }
        Err(e) => {
            writeln!(out, "RPC Error: {e}")?;
            let checks = check_columns(&client, &request.table, &request.check_columns, out)?;
            Ok(ProbeOutcome::Failed {
                error: e.to_string(),
                checks,
            })
        }
    }
}

fn parse_columns(value: Value) -> Result<Vec<ColumnInfo>, RpcError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value)?)
}

fn print_columns<W: Write>(
    out: &mut W,
    table: &str,
    columns: &[ColumnInfo],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "Columns in '{table}':")?;
            for column in columns {
                match &column.data_type {
                    Some(data_type) => writeln!(out, " - {} ({data_type})", column.column_name)?,
                    None => writeln!(out, " - {}", column.column_name)?,
                }
            }
        }
        OutputFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(columns).context("Failed to serialize to JSON")?;
            writeln!(out, "{rendered}")?;
        }
        OutputFormat::Yaml => {
            let rendered = serde_yaml::to_string(columns).context("Failed to serialize to YAML")?;
            write!(out, "{rendered}")?;
        }
    }
    Ok(())
}

fn check_columns<C: RpcClient, W: Write>(
    client: &C,
    table: &str,
    columns: &[String],
    out: &mut W,
) -> Result<Vec<ColumnCheck>> {
    let mut checks = Vec::with_capacity(columns.len());

    for column in columns {
        let check = match client.select_column(table, column) {
            Ok(_) => ColumnCheck {
                column: column.clone(),
                exists: true,
                error: None,
            },
            Err(e) => ColumnCheck {
                column: column.clone(),
                exists: false,
                error: Some(e.to_string()),
            },
        };

        writeln!(out, "{} exists: {}", check.column, check.exists)?;
        if let Some(error) = &check.error {
            writeln!(out, "{} Error: {error}", check.column)?;
        }
        checks.push(check);
    }

    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_query_for_defaults() {
        assert_eq!(
            column_query("disputes", "public"),
            "SELECT column_name, data_type FROM information_schema.columns WHERE table_name = 'disputes' AND table_schema = 'public'"
        );
    }

    #[test]
    fn test_column_query_escapes_quotes() {
        assert!(column_query("o'brien", "public").contains("table_name = 'o''brien'"));
    }

    #[test]
    fn test_parse_columns_accepts_null_and_rows() {
        assert!(parse_columns(Value::Null).unwrap().is_empty());

        let rows = json!([
            { "column_name": "id", "data_type": "uuid" },
            { "column_name": "status" }
        ]);
        let columns = parse_columns(rows).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].data_type.as_deref(), Some("uuid"));
        assert_eq!(columns[1].data_type, None);
    }

    #[test]
    fn test_parse_columns_rejects_unexpected_shape() {
        assert!(matches!(
            parse_columns(json!({ "rows": 3 })),
            Err(RpcError::Decode(_))
        ));
    }

    #[test]
    fn test_text_output() {
        let columns = vec![
            ColumnInfo {
                column_name: "id".into(),
                data_type: Some("uuid".into()),
            },
            ColumnInfo {
                column_name: "status".into(),
                data_type: None,
            },
        ];
        let mut out = Vec::new();
        print_columns(&mut out, "disputes", &columns, OutputFormat::Text).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Columns in 'disputes':\n - id (uuid)\n - status\n"
        );
    }

    #[test]
    fn test_json_output() {
        let columns = vec![ColumnInfo {
            column_name: "id".into(),
            data_type: Some("uuid".into()),
        }];
        let mut out = Vec::new();
        print_columns(&mut out, "disputes", &columns, OutputFormat::Json).unwrap();
        let parsed: Vec<ColumnInfo> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, columns);
    }
}
