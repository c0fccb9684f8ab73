//! Schema resolution: catalog rows in, ER graph out.
//!
//! Resolution runs in two passes over a [`ModelBuilder`]:
//!
//! 1. [`SchemaResolver::ingest`] consumes rows in delivery order. A change of
//!    table name starts a new entity; each row becomes a column. Foreign keys
//!    whose target is already known by its exact name are folded into a
//!    relationship at once, the rest are queued as [`PendingReference`]s.
//! 2. [`SchemaResolver::reconcile`] retries every queued reference once all
//!    entities exist. References that still cannot be resolved are reported
//!    as warnings and left empty.
//!
//! Foreign key columns sharing a constraint name within one entity collapse
//! into a single relationship whose referencing label lists the columns in
//! first-seen order.

use crate::catalog::CatalogRow;
use crate::error::{AnalyzeError, Result};
use crate::model::{ColumnRef, EntityId, ErModel, ForeignKeyTarget, ModelBuilder, NameMatch};
use ahash::AHashSet;
use tracing::{debug, warn};

/// A foreign key column whose target was not known when the column was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReference {
    pub column: ColumnRef,
    pub target: ForeignKeyTarget,
}

/// Counters and warnings collected during one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub rows: usize,
    pub entities_created: usize,
    pub columns_created: usize,
    pub relationships_created: usize,
    pub relationships_merged: usize,
    pub pending_recorded: usize,
    pub pending_resolved: usize,
    pub unresolved: usize,
    /// Non-fatal data-quality findings, in the order they were found
    pub warnings: Vec<String>,
}

impl ResolveReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Drives a [`ModelBuilder`] from a stream of catalog rows.
pub struct SchemaResolver<'m> {
    builder: ModelBuilder<'m>,
    pending: Vec<PendingReference>,
    /// Tables that got an entity during this run
    seen_tables: AHashSet<String>,
    report: ResolveReport,
}

impl<'m> SchemaResolver<'m> {
    pub fn new(model: &'m mut ErModel) -> Self {
        Self {
            builder: ModelBuilder::new(model),
            pending: Vec::new(),
            seen_tables: AHashSet::new(),
            report: ResolveReport::default(),
        }
    }

    /// Run both phases over an ordered row sequence.
    pub fn resolve<I>(model: &'m mut ErModel, rows: I) -> Result<ResolveReport>
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut resolver = SchemaResolver::new(model);
        let mut active = None;
        for row in rows {
            active = Some(resolver.ingest(active, &row)?);
        }
        resolver.reconcile()?;
        Ok(resolver.finish())
    }

    /// Phase 1: process one row.
    ///
    /// `active` is the entity returned for the previous row (`None` before
    /// the first row). Returns the entity this row belongs to, which the
    /// caller passes back for the next row.
    pub fn ingest(&mut self, active: Option<EntityId>, row: &CatalogRow) -> Result<EntityId> {
        self.report.rows += 1;

        let entity = self.enter_table(active, &row.table_name)?;
        let target = self.foreign_key_target(row);

        let existing = self
            .builder
            .model()
            .entity(entity)
            .and_then(|e| e.columns.iter().find(|c| c.name == row.column_name))
            .map(|c| ColumnRef::new(entity, c.ordinal));

        match existing {
            Some(column) => {
                // Same column listed again under another key or constraint
                self.builder.merge_column_flags(column, row);
                if let Some(target) = target {
                    match self.builder.resolve_reference(&target, NameMatch::Exact) {
                        Some(to) => {
                            self.builder.attach_reference(column, to);
                            self.fold_relationship(entity, column, Some(to), &target.name)?;
                        }
                        None => self.defer(column, target),
                    }
                }
            }
            None => {
                let new = self.builder.create_column(entity, row, target.clone())?;
                let reference = new.column.reference;
                let column = self.builder.add_column(entity, new.column)?;
                self.report.columns_created += 1;

                match (new.unresolved, target) {
                    (Some(unresolved), _) => self.defer(column, unresolved),
                    (None, Some(target)) => {
                        self.fold_relationship(entity, column, reference, &target.name)?;
                    }
                    (None, None) => {}
                }
            }
        }

        Ok(entity)
    }

    /// Phase 2: retry every pending reference in the order it was recorded.
    ///
    /// Phase 1 matches names exactly, since a table that differs only in
    /// case may arrive before the real target. Once every entity exists the
    /// case-insensitive fallback is safe.
    pub fn reconcile(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);

        for reference in pending {
            match self
                .builder
                .resolve_reference(&reference.target, NameMatch::IgnoreCase)
            {
                Some(to) => {
                    self.builder.attach_reference(reference.column, to);
                    self.fold_relationship(
                        reference.column.entity,
                        reference.column,
                        Some(to),
                        &reference.target.name,
                    )?;
                    self.report.pending_resolved += 1;
                }
                None => {
                    let message = self.describe_unresolved(&reference);
                    warn!(
                        constraint = %reference.target.name,
                        referenced = %format!("{}.{}", reference.target.entity, reference.target.column),
                        "{}",
                        message
                    );
                    self.report.warnings.push(message);
                    self.report.unresolved += 1;
                }
            }
        }

        Ok(())
    }

    /// References still waiting for phase 2
    pub fn pending(&self) -> &[PendingReference] {
        &self.pending
    }

    pub fn report(&self) -> &ResolveReport {
        &self.report
    }

    pub fn model(&self) -> &ErModel {
        self.builder.model()
    }

    pub fn finish(self) -> ResolveReport {
        self.report
    }

    /// Return the entity for `table`, creating it when the table name changes.
    fn enter_table(&mut self, active: Option<EntityId>, table: &str) -> Result<EntityId> {
        if let Some(id) = active {
            if self.builder.model().entity(id).map(|e| e.name.as_str()) == Some(table) {
                return Ok(id);
            }
        }

        if self.seen_tables.contains(table) {
            return Err(AnalyzeError::NonContiguousTable {
                table: table.to_string(),
            });
        }
        if self.builder.model().contains_entity(table) {
            return Err(AnalyzeError::EntityExists {
                name: table.to_string(),
            });
        }

        let entity = self.builder.create_entity(table);
        let id = self.builder.add_entity(entity);
        self.seen_tables.insert(table.to_string());
        self.report.entities_created += 1;
        debug!(entity = %table, "created entity");
        Ok(id)
    }

    /// Foreign key target named by a row, if the row carries one.
    fn foreign_key_target(&mut self, row: &CatalogRow) -> Option<ForeignKeyTarget> {
        if !row.is_foreign_key {
            return None;
        }

        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);
        let name = non_empty(&row.foreign_key_name)
            .unwrap_or_else(|| format!("{}_{}_fkey", row.table_name, row.column_name));

        match (
            non_empty(&row.referenced_table_name),
            non_empty(&row.referenced_column_name),
        ) {
            (Some(entity), Some(column)) => Some(ForeignKeyTarget {
                name,
                entity,
                column,
            }),
            _ => {
                let message = format!(
                    "foreign key '{}' on {}.{} has no referenced table or column",
                    name, row.table_name, row.column_name
                );
                warn!(constraint = %name, "{}", message);
                self.report.warnings.push(message);
                None
            }
        }
    }

    fn defer(&mut self, column: ColumnRef, target: ForeignKeyTarget) {
        debug!(
            constraint = %target.name,
            referenced = %target.entity,
            "deferring forward reference"
        );
        self.pending.push(PendingReference { column, target });
        self.report.pending_recorded += 1;
    }

    /// Create the relationship named `name` under `namespace`, or add the
    /// column pair to it if it already exists.
    fn fold_relationship(
        &mut self,
        namespace: EntityId,
        from: ColumnRef,
        to: Option<ColumnRef>,
        name: &str,
    ) -> Result<()> {
        match self.builder.find_relationship(namespace, name) {
            Some(id) => {
                self.builder.extend_relationship(id, from, to)?;
                self.report.relationships_merged += 1;
                debug!(relationship = %name, "merged column into relationship");
            }
            None => {
                let relationship = self.builder.create_relationship(namespace, from, to, name)?;
                self.builder.add_relationship(namespace, relationship);
                self.report.relationships_created += 1;
                debug!(relationship = %name, "created relationship");
            }
        }
        Ok(())
    }

    fn describe_unresolved(&self, reference: &PendingReference) -> String {
        let model = self.builder.model();
        let source = model
            .entity(reference.column.entity)
            .and_then(|e| e.column(reference.column.column).map(|c| (e, c)))
            .map(|(e, c)| format!("{}.{}", e.name, c.name))
            .unwrap_or_else(|| "?".to_string());
        format!(
            "reference '{}' cannot be resolved: {} -> {}.{}",
            reference.target.name, source, reference.target.entity, reference.target.column
        )
    }
}
