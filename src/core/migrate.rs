use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::core::env::{ANON_KEY, Credentials, EnvFile, URL_KEY};
use crate::core::probe::EXEC_SQL;
use crate::core::rpc::RpcClient;

/// How the migration file is sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationMode {
    /// One `exec_sql` call carrying the whole file.
    Whole,
    /// One call per `;`-terminated statement.
    Split,
}

/// Counters reported at the end of a split run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl MigrationSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// A migration ready to run: where it goes and what it says.
#[derive(Debug)]
pub struct Migration {
    pub credentials: Credentials,
    pub name: String,
    pub sql: String,
}

impl Migration {
    /// Reads the anon credentials and the SQL file. Both are required.
    pub fn load(env_path: &Path, migration_path: &Path) -> Result<Self> {
        let env = EnvFile::load(env_path)?;
        let credentials = env.anon_credentials().with_context(|| {
            format!(
                "Missing database credentials in {} (need {URL_KEY} and {ANON_KEY})",
                env_path.display()
            )
        })?;

        if !migration_path.exists() {
            anyhow::bail!("Migration file not found: {}", migration_path.display());
        }
        let sql = fs::read_to_string(migration_path).context("Failed to read migration file")?;
        let name = migration_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| migration_path.display().to_string());

        Ok(Self {
            credentials,
            name,
            sql,
        })
    }
}

/// Splits SQL on `;` into trimmed statements, each re-terminated with `;`.
///
/// Leading `--` comment lines are dropped from every statement, and
/// statements left empty are skipped.
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .filter_map(|chunk| {
            let body = chunk
                .trim()
                .lines()
                .skip_while(|line| {
                    let line = line.trim();
                    line.is_empty() || line.starts_with("--")
                })
                .collect::<Vec<_>>()
                .join("\n");
            let body = body.trim();
            (!body.is_empty()).then(|| format!("{body};"))
        })
        .collect()
}

/// Sends the migration through `client` and prints progress to `out`.
///
/// In `Whole` mode a remote error aborts the run. In `Split` mode errors are
/// counted per statement; "already exists" errors count as skipped.
pub fn run_migration<C: RpcClient, W: Write>(
    client: &C,
    sql: &str,
    mode: MigrationMode,
    out: &mut W,
) -> Result<MigrationSummary> {
    writeln!(out, "⚙️  Executing migration SQL...")?;

    match mode {
        MigrationMode::Whole => {
            client
                .rpc(EXEC_SQL, &json!({ "sql": sql }))
                .map_err(|e| anyhow::anyhow!("Error executing SQL: {e}"))?;
            writeln!(out, "✨ Migration completed successfully!")?;
            Ok(MigrationSummary {
                succeeded: 1,
                total: 1,
                ..MigrationSummary::default()
            })
        }
        MigrationMode::Split => {
            let statements = split_statements(sql);
            let mut summary = MigrationSummary {
                total: statements.len(),
                ..MigrationSummary::default()
            };

            for (i, statement) in statements.iter().enumerate() {
                let n = i + 1;
                debug!("statement {n}: {statement}");
                match client.rpc(EXEC_SQL, &json!({ "sql": statement })) {
                    Ok(_) => summary.succeeded += 1,
                    Err(e) if e.is_already_exists() => {
                        writeln!(out, "⚠️  Skipped (already exists): Statement {n}")?;
                        summary.skipped += 1;
                    }
                    Err(e) => {
                        writeln!(out, "❌ Error in statement {n}: {e}")?;
                        summary.failed += 1;
                    }
                }
            }

            writeln!(out, "\n📊 Migration Summary:")?;
            writeln!(out, "   ✅ Successful: {}", summary.succeeded)?;
            writeln!(out, "   ⚠️  Skipped: {}", summary.skipped)?;
            writeln!(out, "   ❌ Errors: {}", summary.failed)?;
            writeln!(out, "   📝 Total statements: {}", summary.total)?;

            if summary.is_clean() {
                writeln!(out, "\n✨ Migration completed successfully!")?;
            } else {
                writeln!(out, "\n⚠️  Migration completed with some errors.")?;
            }
            Ok(summary)
        }
    }
}
