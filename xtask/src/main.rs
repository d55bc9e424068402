// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation
//!
//! - `cargo xtask ci` runs lint, dependency checks, build, tests and
//!   constraint verification.
//! - `cargo xtask verify-constraints` applies the persistence migrations to
//!   a scratch `SQLite` database and checks that every scheduling rule the
//!   store relies on is enforced by the schema itself.
//!
//! Standard `cargo test` stays fast and needs no infrastructure.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{io, process::Output, vec};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    eyre::{bail, Context},
    Result,
};
use diesel::sql_types::{Integer, Text};
use diesel::{QueryableByName, RunQueryDsl, SqliteConnection};
use duct::cmd;
use std::collections::{BTreeMap, BTreeSet};
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test, constraints)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Generate code coverage report
    #[command(visible_alias = "cov")]
    Coverage,

    /// Check dependencies
    #[command(visible_alias = "cd")]
    Deny,

    // Check unused dependencies
    #[command(visible_alias = "m")]
    Machete,

    /// Lint formatting, typos, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Lint markdown files
    #[command(visible_alias = "md")]
    LintMarkdown,

    /// Check for typos in the project
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Fix clippy warnings in the project
    #[command(visible_alias = "fc")]
    FixClippy,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Fix typos in the project
    #[command(visible_alias = "typos")]
    FixTypos,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Run doc tests
    #[command(visible_alias = "td")]
    TestDocs,

    /// Run lib tests
    #[command(visible_alias = "tl")]
    TestLibs,

    /// Verify the schema enforces the scheduling constraints
    #[command(visible_alias = "vc")]
    VerifyConstraints,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Deny => deny(),
            Self::Machete => machete(),
            Self::Coverage => coverage(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::LintTypos => lint_typos(),
            Self::LintMarkdown => lint_markdown(),
            Self::FixClippy => fix_clippy(),
            Self::FixFormatting => fix_format(),
            Self::FixTypos => fix_typos(),
            Self::Test => test(),
            Self::TestDocs => test_docs(),
            Self::TestLibs => test_libs(),
            Self::VerifyConstraints => verify_constraints(),
        }
    }
}

/// Run CI checks (lint, build, test, constraints)
fn ci() -> Result<()> {
    lint()?;
    deny()?;
    machete()?;
    build()?;
    test()?;
    verify_constraints()?;
    Ok(())
}

fn deny() -> Result<()> {
    run_cargo(vec!["deny", "check"])
}

fn machete() -> Result<()> {
    cmd!("cargo-machete").run_with_trace()?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

/// Generate code coverage report
fn coverage() -> Result<()> {
    run_cargo(vec![
        "llvm-cov",
        "--lcov",
        "--output-path",
        "target/lcov.info",
        "--all-features",
    ])
}

/// Lint formatting, typos, clippy, and docs (and a soft fail on markdown)
fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()?;
    lint_typos()?;
    if let Err(err) = lint_markdown() {
        tracing::warn!("markdownlint reported issues: {err}");
    }
    Ok(())
}

/// Run clippy on the project
fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

/// Fix clippy warnings in the project
fn fix_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--fix",
        "--allow-dirty",
        "--allow-staged",
        "--",
        "-D",
        "warnings",
    ])
}

/// Check that docs build without errors using docs.rs-equivalent flags
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cmd(
            "cargo",
            [
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
        .run_with_trace()?;
    }

    Ok(())
}

/// Lint formatting issues in the project
fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

/// Fix formatting issues in the project
fn fix_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all"])
}

/// Lint markdown files using [markdownlint-cli2](https://github.com/DavidAnson/markdownlint-cli2)
fn lint_markdown() -> Result<()> {
    cmd!("markdownlint-cli2", "**/*.md", "!target", "!**/target").run_with_trace()?;

    Ok(())
}

/// Check for typos in the project using [typos-cli](https://github.com/crate-ci/typos/)
fn lint_typos() -> Result<()> {
    cmd!("typos").run_with_trace()?;
    Ok(())
}

/// Fix typos in the project
fn fix_typos() -> Result<()> {
    cmd!("typos", "-w").run_with_trace()?;
    Ok(())
}

/// Run tests for libs and docs
fn test() -> Result<()> {
    test_libs()?;
    test_docs()?; // run last because it's slow
    Ok(())
}

/// Run doc tests for the workspace's default packages
fn test_docs() -> Result<()> {
    run_cargo(vec!["test", "--doc", "--all-features"])
}

/// Run lib tests for the workspace's default packages
fn test_libs() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Run a cargo subcommand with the nightly toolchain
fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // CARGO env var is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// A uniqueness rule that must be enforced by a (possibly partial) index.
struct RequiredUnique {
    table: &'static str,
    columns: &'static [&'static str],
    /// Required `WHERE` fragment for partial indexes.
    predicate: Option<&'static str>,
}

/// A foreign key that must exist with the given delete action.
struct RequiredForeignKey {
    table: &'static str,
    from: &'static str,
    to_table: &'static str,
    on_delete: &'static str,
}

const REQUIRED_UNIQUE: &[RequiredUnique] = &[
    RequiredUnique {
        table: "users",
        columns: &["email"],
        predicate: None,
    },
    RequiredUnique {
        table: "shifts",
        columns: &["apartment_id", "scheduled_date"],
        predicate: Some("status <> 'cancelled'"),
    },
    RequiredUnique {
        table: "shifts",
        columns: &["operator_id"],
        predicate: Some("actual_end_time is null"),
    },
    RequiredUnique {
        table: "time_change_requests",
        columns: &["shift_id"],
        predicate: Some("closed_at is null"),
    },
    RequiredUnique {
        table: "cleaning_schedules",
        columns: &["apartment_id", "year", "month"],
        predicate: None,
    },
];

/// Triggers guarding the operator daily cap on both write paths.
const REQUIRED_TRIGGERS: &[(&str, &str)] = &[
    ("shifts", "shifts_operator_daily_limit_insert"),
    ("shifts", "shifts_operator_daily_limit_update"),
];

const REQUIRED_FOREIGN_KEYS: &[RequiredForeignKey] = &[
    RequiredForeignKey {
        table: "apartments",
        from: "owner_id",
        to_table: "users",
        on_delete: "NO ACTION",
    },
    RequiredForeignKey {
        table: "shifts",
        from: "apartment_id",
        to_table: "apartments",
        on_delete: "NO ACTION",
    },
    RequiredForeignKey {
        table: "shifts",
        from: "operator_id",
        to_table: "users",
        on_delete: "NO ACTION",
    },
    RequiredForeignKey {
        table: "time_change_requests",
        from: "shift_id",
        to_table: "shifts",
        on_delete: "CASCADE",
    },
    RequiredForeignKey {
        table: "shift_comments",
        from: "shift_id",
        to_table: "shifts",
        on_delete: "CASCADE",
    },
    RequiredForeignKey {
        table: "shift_problems",
        from: "shift_id",
        to_table: "shifts",
        on_delete: "CASCADE",
    },
    RequiredForeignKey {
        table: "instruction_photos",
        from: "shift_id",
        to_table: "shifts",
        on_delete: "CASCADE",
    },
    RequiredForeignKey {
        table: "notifications",
        from: "related_shift_id",
        to_table: "shifts",
        on_delete: "SET NULL",
    },
    RequiredForeignKey {
        table: "unavailability_days",
        from: "request_id",
        to_table: "unavailability_requests",
        on_delete: "CASCADE",
    },
];

/// Verify that the schema enforces the scheduling constraints
///
/// The store treats the database as the final arbiter for the rules that
/// race under concurrent writers: one live shift per apartment and day, one
/// active shift per operator, the operator daily cap, and one live
/// time-change request per shift. This command:
///
/// 1. Applies the persistence migrations to an in-memory `SQLite` database
/// 2. Introspects tables, indexes, triggers and foreign keys
/// 3. Checks every required constraint is present with the right shape
/// 4. Checks that `audit_events` keeps no foreign key to `shifts`, so
///    history survives shift deletion
///
/// ## Usage
///
/// ```bash
/// cargo xtask verify-constraints
/// ```
///
/// ## Failures
///
/// Fails if the migrations do not apply or any constraint is missing.
/// All missing constraints are reported before failing.
fn verify_constraints() -> Result<()> {
    use diesel::Connection;
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

    tracing::info!("Starting schema constraint verification");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to open in-memory SQLite database")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to apply migrations: {e}"))?;
    tracing::info!("Migrations applied");

    let schema = introspect_sqlite_schema(&mut conn)?;
    let problems = check_constraints(&schema);

    if problems.is_empty() {
        tracing::info!(
            tables = schema.tables.len(),
            "All scheduling constraints are enforced by the schema"
        );
        return Ok(());
    }

    for problem in &problems {
        tracing::error!("{problem}");
    }
    bail!("{} constraint(s) missing from the schema", problems.len())
}

/// Returns one message per missing or misshapen constraint.
fn check_constraints(schema: &Schema) -> Vec<String> {
    let mut problems: Vec<String> = Vec::new();

    for required in REQUIRED_UNIQUE {
        let Some(table) = schema.tables.get(required.table) else {
            problems.push(format!("missing table {}", required.table));
            continue;
        };
        let columns: Vec<String> = required.columns.iter().map(|c| (*c).to_string()).collect();
        let found = table.unique_indexes.iter().any(|index| {
            index.columns == columns
                && required.predicate.is_none_or(|predicate| {
                    index
                        .predicate
                        .as_deref()
                        .is_some_and(|actual| actual.contains(predicate))
                })
        });
        if !found {
            problems.push(format!(
                "{}: no unique index on ({}){}",
                required.table,
                required.columns.join(", "),
                required
                    .predicate
                    .map(|p| format!(" where {p}"))
                    .unwrap_or_default()
            ));
        }
    }

    for (table_name, trigger) in REQUIRED_TRIGGERS {
        let present = schema
            .tables
            .get(*table_name)
            .is_some_and(|table| table.triggers.contains(*trigger));
        if !present {
            problems.push(format!("{table_name}: missing trigger {trigger}"));
        }
    }

    for required in REQUIRED_FOREIGN_KEYS {
        let present = schema.tables.get(required.table).is_some_and(|table| {
            table.foreign_keys.contains(&ForeignKey {
                from_column: required.from.to_string(),
                to_table: required.to_table.to_string(),
                on_delete: required.on_delete.to_string(),
            })
        });
        if !present {
            problems.push(format!(
                "{}.{}: missing foreign key to {} (on delete {})",
                required.table, required.from, required.to_table, required.on_delete
            ));
        }
    }

    if let Some(audit) = schema.tables.get("audit_events") {
        if audit
            .foreign_keys
            .iter()
            .any(|fk| fk.to_table == "shifts")
        {
            problems.push(String::from(
                "audit_events must not reference shifts; history would be lost on deletion",
            ));
        }
    } else {
        problems.push(String::from("missing table audit_events"));
    }

    problems
}

/// Normalized schema representation
#[derive(Debug, Clone, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Table {
    foreign_keys: BTreeSet<ForeignKey>,
    unique_indexes: BTreeSet<UniqueIndex>,
    triggers: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    on_delete: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct UniqueIndex {
    columns: Vec<String>,
    /// Lowercased `WHERE` clause of a partial index.
    predicate: Option<String>,
}

/// Introspect `SQLite` schema
fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        on_delete: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Integer)]
        unique: i32,
        #[diesel(sql_type = Integer)]
        partial: i32,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct SchemaObject {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        tbl_name: String,
        #[diesel(sql_type = Text)]
        sql: String,
    }

    let mut schema = Schema {
        tables: BTreeMap::new(),
    };

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name"
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    // Partial index predicates only survive in the original DDL.
    let index_sql: Vec<SchemaObject> = diesel::sql_query(
        "SELECT name, tbl_name, sql FROM sqlite_master WHERE type='index' AND sql IS NOT NULL",
    )
    .load(conn)
    .wrap_err("Failed to query SQLite index definitions")?;
    let index_sql: BTreeMap<String, String> = index_sql
        .into_iter()
        .map(|object| {
            let sql: String = object.sql.split_whitespace().collect::<Vec<_>>().join(" ");
            (object.name, sql.to_lowercase())
        })
        .collect();

    for table in tables {
        let mut table_info = Table::default();

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err(format!(
                    "Failed to get foreign keys for table {}",
                    table.name
                ))?;
        for fk in fks {
            table_info.foreign_keys.insert(ForeignKey {
                from_column: fk.from,
                to_table: fk.table,
                on_delete: fk.on_delete.to_uppercase(),
            });
        }

        let indexes: Vec<IndexInfo> =
            diesel::sql_query(format!("PRAGMA index_list({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get indexes for table {}", table.name))?;
        for idx in indexes.into_iter().filter(|idx| idx.unique == 1) {
            let index_columns: Vec<IndexColumnInfo> =
                diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                    .load(conn)
                    .wrap_err(format!("Failed to get index columns for {}", idx.name))?;

            let predicate: Option<String> = if idx.partial == 1 {
                index_sql
                    .get(&idx.name)
                    .and_then(|sql| sql.split_once(" where "))
                    .map(|(_, clause)| clause.to_string())
            } else {
                None
            };

            table_info.unique_indexes.insert(UniqueIndex {
                columns: index_columns.into_iter().map(|c| c.name).collect(),
                predicate,
            });
        }

        schema.tables.insert(table.name, table_info);
    }

    let triggers: Vec<SchemaObject> = diesel::sql_query(
        "SELECT name, tbl_name, sql FROM sqlite_master WHERE type='trigger' AND sql IS NOT NULL",
    )
    .load(conn)
    .wrap_err("Failed to query SQLite triggers")?;
    for trigger in triggers {
        if let Some(table) = schema.tables.get_mut(&trigger.tbl_name) {
            table.triggers.insert(trigger.name);
        }
    }

    Ok(schema)
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
