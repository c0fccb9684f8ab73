//! Factory and mutator operations over an [`ErModel`].
//!
//! The builder creates entities, columns and relationships and inserts them
//! into the model. It makes no ordering or identity decisions; those belong
//! to the resolver.

use super::{
    Column, ColumnId, ColumnRef, DataType, Entity, EntityId, ErModel, NameMatch, Relationship,
    RelationshipEnd, RelationshipId,
};
use crate::catalog::CatalogRow;
use crate::error::{AnalyzeError, Result};

/// Where a foreign key column points, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyTarget {
    /// Constraint name
    pub name: String,
    /// Referenced table
    pub entity: String,
    /// Referenced column
    pub column: String,
}

/// A freshly created column, not yet inserted into its entity.
#[derive(Debug, Clone)]
pub struct NewColumn {
    pub column: Column,
    /// Foreign key target that could not be resolved at creation time
    pub unresolved: Option<ForeignKeyTarget>,
}

/// Mutating view over a model.
pub struct ModelBuilder<'m> {
    model: &'m mut ErModel,
}

impl<'m> ModelBuilder<'m> {
    pub fn new(model: &'m mut ErModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ErModel {
        self.model
    }

    /// Create an entity for a table. It is not visible to lookups until added.
    pub fn create_entity(&self, name: &str) -> Entity {
        Entity {
            id: EntityId(u32::MAX),
            name: name.to_string(),
            columns: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Register an entity in the model namespace.
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.model.push_entity(entity)
    }

    /// Build a column from catalog metadata.
    ///
    /// When `foreign_key` is given, its target is resolved immediately by
    /// exact name; if the target is not in the model yet it is handed back
    /// in [`NewColumn::unresolved`].
    pub fn create_column(
        &self,
        entity: EntityId,
        row: &CatalogRow,
        foreign_key: Option<ForeignKeyTarget>,
    ) -> Result<NewColumn> {
        let ordinal = match self.model.entity(entity) {
            Some(e) => next_ordinal(e)?,
            None => ColumnId(0),
        };

        let mut column = Column {
            name: row.column_name.clone(),
            ordinal,
            position: row.ordinal_position,
            data_type: DataType {
                name: row.data_type.clone(),
                length: row.max_length,
                precision: row.precision,
            },
            default_value: row.default_value.clone(),
            is_nullable: row.is_nullable,
            is_primary_key: row.is_primary_key,
            is_unique: row.is_unique || row.is_primary_key,
            is_foreign_key: row.is_foreign_key,
            reference: None,
        };

        let mut unresolved = None;
        if let Some(target) = foreign_key {
            column.reference = self.resolve_reference(&target, NameMatch::Exact);
            if column.reference.is_none() {
                unresolved = Some(target);
            }
        }

        Ok(NewColumn { column, unresolved })
    }

    /// Append a column to its entity, returning its stable address.
    pub fn add_column(&mut self, entity: EntityId, mut column: Column) -> Result<ColumnRef> {
        let owner = self.model.entity_mut(entity).ok_or_else(|| {
            AnalyzeError::Internal(format!(
                "column '{}' added to unknown {}",
                column.name, entity
            ))
        })?;
        let ordinal = next_ordinal(owner)?;
        column.ordinal = ordinal;
        owner.columns.push(column);
        Ok(ColumnRef::new(entity, ordinal))
    }

    /// Fold key flags from a repeated catalog row into an existing column.
    pub fn merge_column_flags(&mut self, column: ColumnRef, row: &CatalogRow) {
        if let Some(col) = self.model.column_mut(column) {
            col.is_primary_key |= row.is_primary_key;
            col.is_unique |= row.is_unique || row.is_primary_key;
            col.is_foreign_key |= row.is_foreign_key;
            col.is_nullable &= row.is_nullable;
        }
    }

    /// Attach a resolved reference, keeping any reference already present.
    pub fn attach_reference(&mut self, column: ColumnRef, target: ColumnRef) {
        if let Some(col) = self.model.column_mut(column) {
            col.reference.get_or_insert(target);
        }
    }

    /// Look up the target entity and column of a foreign key by name.
    pub fn resolve_reference(
        &self,
        target: &ForeignKeyTarget,
        mode: NameMatch,
    ) -> Option<ColumnRef> {
        let id = self.model.find_entity_id(&target.entity, mode)?;
        let column = self.model.entity(id)?.find_column(&target.column, mode)?;
        Some(ColumnRef::new(id, column.ordinal))
    }

    /// Create a relationship from a foreign key column to its target.
    ///
    /// Fails if `from` is not a foreign key column or `to` is absent: both
    /// indicate a caller bug, not bad catalog data.
    pub fn create_relationship(
        &self,
        namespace: EntityId,
        from: ColumnRef,
        to: Option<ColumnRef>,
        name: &str,
    ) -> Result<Relationship> {
        let from_column = self.require_foreign_key(from, name)?;
        let to = self.require_target(to, name)?;

        Ok(Relationship {
            id: RelationshipId(u32::MAX),
            name: name.to_string(),
            from: RelationshipEnd {
                entity: namespace,
                label: from_column.name.clone(),
            },
            to: RelationshipEnd {
                entity: to.entity,
                label: String::new(),
            },
            columns: vec![(from, to)],
        })
    }

    /// Register a relationship under its owning entity.
    pub fn add_relationship(
        &mut self,
        namespace: EntityId,
        relationship: Relationship,
    ) -> RelationshipId {
        self.model.push_relationship(namespace, relationship)
    }

    pub fn find_relationship(&self, namespace: EntityId, name: &str) -> Option<RelationshipId> {
        self.model.find_relationship(namespace, name)
    }

    /// Add another column pair to an existing relationship, appending the
    /// column name to the referencing end's label.
    pub fn extend_relationship(
        &mut self,
        id: RelationshipId,
        from: ColumnRef,
        to: Option<ColumnRef>,
    ) -> Result<()> {
        let name = self
            .model
            .relationship(id)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        let column_name = self.require_foreign_key(from, &name)?.name.clone();
        let to = self.require_target(to, &name)?;

        let relationship = self.model.relationship_mut(id).ok_or_else(|| {
            AnalyzeError::InvalidRelationship {
                name: name.clone(),
                reason: "relationship is not registered in the model".to_string(),
            }
        })?;
        if relationship.columns.iter().any(|(f, t)| *f == from && *t == to) {
            return Ok(());
        }
        if !relationship.from.label.is_empty() {
            relationship.from.label.push_str(", ");
        }
        relationship.from.label.push_str(&column_name);
        relationship.columns.push((from, to));
        Ok(())
    }

    fn require_foreign_key(&self, from: ColumnRef, name: &str) -> Result<&Column> {
        match self.model.column(from) {
            Some(col) if col.is_foreign_key => Ok(col),
            Some(col) => Err(AnalyzeError::InvalidRelationship {
                name: name.to_string(),
                reason: format!("column '{}' is not a foreign key", col.name),
            }),
            None => Err(AnalyzeError::InvalidRelationship {
                name: name.to_string(),
                reason: "referencing column is not in the model".to_string(),
            }),
        }
    }

    fn require_target(&self, to: Option<ColumnRef>, name: &str) -> Result<ColumnRef> {
        match to {
            Some(r) if self.model.column(r).is_some() => Ok(r),
            _ => Err(AnalyzeError::InvalidRelationship {
                name: name.to_string(),
                reason: "referenced column is undefined".to_string(),
            }),
        }
    }
}

fn next_ordinal(entity: &Entity) -> Result<ColumnId> {
    u16::try_from(entity.columns.len()).map(ColumnId).map_err(|_| {
        AnalyzeError::Internal(format!(
            "entity '{}' has more than {} columns",
            entity.name,
            u16::MAX
        ))
    })
}
