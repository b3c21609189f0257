//! Batch migration generation
//!
//! Drives the create and update flows over a list of tables: fetch the
//! live structure, fetch or skip history, plan, render, write. Each table
//! is handled on its own; a failure is reported in the [`BatchReport`] and
//! the batch moves on. Migrations of tables handled before a failure stay
//! in place.

use chrono::NaiveDateTime;
use driftguard::migration::VersionClock;
use driftguard::plan::Blueprint;
use driftguard::source::{HistorySource, SchemaSource};
use driftguard::{DriftError, GeneratorConfig, Result, Table};
use std::path::PathBuf;

use crate::comparator::compare;
use crate::dependency_ordering::{arrange, missing_references, TableInfo};
use crate::journal::Journal;
use crate::planner::{plan_create, plan_foreign_keys};
use crate::renderer::{MigrationTemplate, Renderer};
use crate::writer::{HistoryLedger, MigrationWriter};

/// Requested table list entry meaning "every table the source knows"
pub const ALL_TABLES: &str = "*";

/// What happened to one table (or one follow-up migration)
#[derive(Debug)]
pub enum Outcome {
    Generated { path: PathBuf },
    /// History already matches the database
    Unchanged,
    /// Differences reported without writing anything
    Shown { differences: Vec<String> },
    Failed { error: DriftError },
}

#[derive(Debug)]
pub struct TableOutcome {
    pub table: String,
    pub outcome: Outcome,
}

/// Per-table results of one batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TableOutcome>,
    pub generated: usize,
}

impl BatchReport {
    fn push(&mut self, table: impl Into<String>, outcome: Outcome) {
        if matches!(outcome, Outcome::Generated { .. }) {
            self.generated += 1;
        }
        self.outcomes.push(TableOutcome {
            table: table.into(),
            outcome,
        });
    }

    fn fail(&mut self, table: impl Into<String>, error: DriftError) {
        let table = table.into();
        log::warn!("Skipping table '{}': {}", table, error);
        self.push(table, Outcome::Failed { error });
    }

    pub fn failures(&self) -> impl Iterator<Item = &TableOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Generator wired to its collaborators
pub struct Generator<'a> {
    config: &'a GeneratorConfig,
    schema: &'a dyn SchemaSource,
    writer: &'a mut dyn MigrationWriter,
    ledger: Option<&'a mut dyn HistoryLedger>,
    renderer: Renderer,
    clock: VersionClock,
    generated_at: NaiveDateTime,
}

impl<'a> Generator<'a> {
    /// `clock` hands out versions; `generated_at` is stamped into file headers
    pub fn new(
        config: &'a GeneratorConfig,
        schema: &'a dyn SchemaSource,
        writer: &'a mut dyn MigrationWriter,
        clock: VersionClock,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            config,
            schema,
            writer,
            ledger: None,
            renderer: Renderer::new(config.dialect, config.table_options()),
            clock,
            generated_at,
        }
    }

    /// Record every generated version in `ledger` when the config asks for it
    pub fn with_ledger(mut self, ledger: &'a mut dyn HistoryLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Generate create migrations for `tables`, ordered by their references
    ///
    /// Foreign keys that would close a reference cycle are added by one
    /// follow-up migration after every table exists.
    ///
    /// # Errors
    ///
    /// Only fails when `*` is requested and the table list cannot be read;
    /// per-table problems land in the report.
    pub fn create(&mut self, tables: &[String]) -> Result<BatchReport> {
        let names = self.resolve(tables)?;
        let mut report = BatchReport::default();

        let mut loaded: Vec<Table> = Vec::new();
        for name in &names {
            match self.schema.current_table(name) {
                Ok(table) => loaded.push(table),
                Err(error) => report.fail(name, error),
            }
        }

        let infos: Vec<TableInfo> = loaded.iter().map(TableInfo::from_table).collect();
        for missing in missing_references(&infos) {
            log::warn!(
                "Table '{}' references '{}', which is not part of this batch",
                missing.table,
                missing.referenced
            );
        }
        let arrangement = arrange(&infos);

        for name in &arrangement.order {
            let Some(table) = loaded.iter().find(|t| &t.name == name) else {
                continue;
            };
            let postponed = arrangement.suppressed.get(name).cloned().unwrap_or_default();
            let result = plan_create(table, &postponed)
                .and_then(|blueprint| self.emit(&format!("create_table_{}", table.short_name()), &blueprint));
            match result {
                Ok(path) => report.push(name, Outcome::Generated { path }),
                Err(error) => report.fail(name, error),
            }
        }

        if arrangement.has_suppressed() {
            let label = arrangement
                .suppressed
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            let result = plan_foreign_keys(&loaded, &arrangement.suppressed).and_then(|blueprint| {
                match blueprint {
                    Some(blueprint) => self.emit("create_foreign_keys", &blueprint).map(Some),
                    None => Ok(None),
                }
            });
            match result {
                Ok(Some(path)) => report.push(label, Outcome::Generated { path }),
                Ok(None) => {}
                Err(error) => report.fail(label, error),
            }
        }

        Ok(report)
    }

    /// Generate update migrations bringing history in line with the database
    ///
    /// Tables without history get a create migration. With `only_show` the
    /// differences are reported and nothing is written.
    ///
    /// # Errors
    ///
    /// Only fails when `*` is requested and the table list cannot be read.
    pub fn update(
        &mut self,
        tables: &[String],
        history: &dyn HistorySource,
        only_show: bool,
    ) -> Result<BatchReport> {
        let names = self.resolve(tables)?;
        let mut report = BatchReport::default();

        for name in &names {
            match self.update_table(name, history, only_show) {
                Ok(outcome) => report.push(name, outcome),
                Err(error) => report.fail(name, error),
            }
        }

        Ok(report)
    }

    fn update_table(&mut self, name: &str, history: &dyn HistorySource, only_show: bool) -> Result<Outcome> {
        let current = self.schema.current_table(name)?;
        let historical = history.historical_table(name, &self.config.skip_migrations)?;

        let (migration, blueprint) = match historical {
            Some(historical) => {
                log::debug!("Comparing '{}' with its history", name);
                (format!("update_table_{}", current.short_name()), compare(&current, &historical)?)
            }
            None => {
                log::debug!("Table '{}' has no history, planning a create migration", name);
                (format!("create_table_{}", current.short_name()), plan_create(&current, &[])?)
            }
        };

        if blueprint.is_empty() {
            log::info!("Table '{}' is up to date", name);
            return Ok(Outcome::Unchanged);
        }
        if only_show {
            return Ok(Outcome::Shown {
                differences: blueprint.differences().to_vec(),
            });
        }

        let path = self.emit(&migration, &blueprint)?;
        Ok(Outcome::Generated { path })
    }

    /// Render, write the journal and the migration, and record the version
    ///
    /// The journal goes first; when a later step fails, everything this call
    /// wrote is removed again.
    fn emit(&mut self, name: &str, blueprint: &Blueprint) -> Result<PathBuf> {
        let version = self.clock.next_version();
        let body = self.renderer.render_blueprint(blueprint);
        let template = MigrationTemplate::new(name, version, self.generated_at, body);
        let path = self.config.migrations_dir.join(template.file_name());

        let journal = Journal::new(version, name, blueprint.up().to_vec());
        let journal_path = journal.path_in(&self.config.migrations_dir);
        self.writer.write(&journal_path, &journal.to_json()?)?;

        if let Err(error) = self.writer.write(&path, &template.render()) {
            self.discard(&[&path, &journal_path]);
            return Err(error);
        }

        let recorded = match self.ledger.as_deref_mut() {
            Some(ledger) if self.config.record_history => {
                ledger.record(version, self.config.namespace.as_deref())
            }
            _ => Ok(()),
        };
        if let Err(error) = recorded {
            self.discard(&[&path, &journal_path]);
            return Err(error);
        }

        log::info!("Generated migration {}", path.display());
        Ok(path)
    }

    fn discard(&mut self, paths: &[&PathBuf]) {
        for path in paths {
            match self.writer.remove(path) {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(error) => log::warn!("Could not remove {}: {}", path.display(), error),
            }
        }
    }

    fn resolve(&self, tables: &[String]) -> Result<Vec<String>> {
        if tables.iter().any(|t| t == ALL_TABLES) {
            return self.schema.table_names();
        }
        let mut names: Vec<String> = Vec::new();
        for table in tables {
            for name in table.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}
