//! Entity-relationship data model.
//!
//! The model is append-only during a run:
//! - Entities are stored in creation order and addressed by [`EntityId`]
//! - Columns are owned by their entity and addressed by [`ColumnRef`]
//! - Relationships are stored in creation order and indexed by
//!   (owning entity, constraint name)
//!
//! Name lookups go through explicit maps rather than scanning the graph.

mod builder;

pub use builder::{ForeignKeyTarget, ModelBuilder, NewColumn};

use ahash::AHashMap;
use std::fmt;

/// Unique identifier for an entity within a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// Position of a column within its entity (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

/// How a name lookup compares names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    /// Byte-for-byte
    Exact,
    /// Exact first, then ASCII case-insensitive
    #[default]
    IgnoreCase,
}

/// Unique identifier for a relationship within a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipId(pub u32);

/// Stable address of a column: owning entity plus position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub entity: EntityId,
    pub column: ColumnId,
}

impl ColumnRef {
    pub fn new(entity: EntityId, column: ColumnId) -> Self {
        Self { entity, column }
    }
}

/// Declared column type with optional length and precision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataType {
    pub name: String,
    pub length: Option<i64>,
    pub precision: Option<i64>,
}

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: None,
            precision: None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.to_uppercase();
        // Catalogs report a default precision for temporal types; only lengths are shown.
        match self.length {
            Some(len) if len > 0 => write!(f, "{}({})", name, len),
            _ => write!(f, "{}", name),
        }
    }
}

/// A table column, owned by exactly one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, unique within its entity
    pub name: String,
    /// Position in the entity's column list
    pub ordinal: ColumnId,
    /// Ordinal position reported by the catalog (1-based)
    pub position: i64,
    pub data_type: DataType,
    pub default_value: Option<String>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_foreign_key: bool,
    /// Resolved target of a foreign key; `None` until resolution succeeds
    pub reference: Option<ColumnRef>,
}

/// A table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<Column>,
    /// Relationships this entity takes part in, in creation order
    pub relationships: Vec<RelationshipId>,
}

impl Entity {
    /// Get a column by name (exact match, then case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column(name, NameMatch::IgnoreCase)
    }

    pub fn find_column(&self, name: &str, mode: NameMatch) -> Option<&Column> {
        let exact = self.columns.iter().find(|c| c.name == name);
        match mode {
            NameMatch::Exact => exact,
            NameMatch::IgnoreCase => exact
                .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))),
        }
    }

    /// Get column ID by name
    pub fn get_column_id(&self, name: &str) -> Option<ColumnId> {
        self.get_column(name).map(|c| c.ordinal)
    }

    /// Get column by ID
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }
}

/// Relationship cardinality, seen from the referencing side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    #[default]
    ManyToOne,
    OneToOne,
}

impl Cardinality {
    /// Mermaid ERD notation
    pub fn as_mermaid(self) -> &'static str {
        match self {
            Cardinality::ManyToOne => "}o--||",
            Cardinality::OneToOne => "||--||",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ManyToOne => write!(f, "ManyToOne"),
            Cardinality::OneToOne => write!(f, "OneToOne"),
        }
    }
}

/// One end of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEnd {
    pub entity: EntityId,
    /// Comma-separated participating column names (empty on the referenced end)
    pub label: String,
}

/// A named connection between two entities, built from the foreign key
/// columns that share one constraint name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: RelationshipId,
    /// Constraint name
    pub name: String,
    /// Referencing end (owns the FK columns)
    pub from: RelationshipEnd,
    /// Referenced end
    pub to: RelationshipEnd,
    /// (referencing column, referenced column) pairs in first-seen order
    pub columns: Vec<(ColumnRef, ColumnRef)>,
}

/// The ER graph built by one or more analysis runs.
#[derive(Debug, Default, Clone)]
pub struct ErModel {
    /// Model name (used as diagram title)
    pub name: String,
    entities: Vec<Entity>,
    entity_index: AHashMap<String, EntityId>,
    relationships: Vec<Relationship>,
    relationship_index: AHashMap<(EntityId, String), RelationshipId>,
}

impl ErModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get entity ID by name (exact match, then case-insensitive)
    pub fn get_entity_id(&self, name: &str) -> Option<EntityId> {
        self.find_entity_id(name, NameMatch::IgnoreCase)
    }

    /// Case-insensitive matches resolve to the earliest created entity.
    pub fn find_entity_id(&self, name: &str, mode: NameMatch) -> Option<EntityId> {
        if let Some(&id) = self.entity_index.get(name) {
            return Some(id);
        }
        match mode {
            NameMatch::Exact => None,
            NameMatch::IgnoreCase => self
                .entity_index
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, &id)| id)
                .min(),
        }
    }

    /// Whether an entity with exactly this name is registered
    pub fn contains_entity(&self, name: &str) -> bool {
        self.entity_index.contains_key(name)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0 as usize)
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.get_entity_id(name).and_then(|id| self.entity(id))
    }

    pub fn column(&self, r: ColumnRef) -> Option<&Column> {
        self.entity(r.entity).and_then(|e| e.column(r.column))
    }

    pub(crate) fn column_mut(&mut self, r: ColumnRef) -> Option<&mut Column> {
        self.entity_mut(r.entity)
            .and_then(|e| e.columns.get_mut(r.column.0 as usize))
    }

    /// Find a relationship by constraint name within an owning entity
    pub fn find_relationship(&self, namespace: EntityId, name: &str) -> Option<RelationshipId> {
        self.relationship_index
            .get(&(namespace, name.to_string()))
            .copied()
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(id.0 as usize)
    }

    pub(crate) fn relationship_mut(&mut self, id: RelationshipId) -> Option<&mut Relationship> {
        self.relationships.get_mut(id.0 as usize)
    }

    /// Cardinality of a relationship, derived from its referencing columns.
    ///
    /// One-to-one when the referencing columns are exactly the owning
    /// entity's primary key, or a single unique non-key column.
    pub fn cardinality(&self, relationship: &Relationship) -> Cardinality {
        let Some(owner) = self.entity(relationship.from.entity) else {
            return Cardinality::ManyToOne;
        };
        let from: Vec<ColumnId> = relationship.columns.iter().map(|(f, _)| f.column).collect();
        let pk: Vec<ColumnId> = owner.primary_key().map(|c| c.ordinal).collect();

        if !pk.is_empty() && pk.len() == from.len() && from.iter().all(|c| pk.contains(c)) {
            return Cardinality::OneToOne;
        }
        if let [single] = from.as_slice() {
            if let Some(col) = owner.column(*single) {
                if col.is_unique && !col.is_primary_key {
                    return Cardinality::OneToOne;
                }
            }
        }
        Cardinality::ManyToOne
    }

    /// Relationships owned by (referencing from) an entity
    pub fn relationships_of(&self, id: EntityId) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.from.entity == id)
    }

    pub(crate) fn push_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        entity.id = id;
        self.entity_index.insert(entity.name.clone(), id);
        self.entities.push(entity);
        id
    }

    pub(crate) fn push_relationship(
        &mut self,
        namespace: EntityId,
        mut relationship: Relationship,
    ) -> RelationshipId {
        let id = RelationshipId(self.relationships.len() as u32);
        relationship.id = id;
        self.relationship_index
            .insert((namespace, relationship.name.clone()), id);
        relationship.from.entity = namespace;
        let to = relationship.to.entity;
        self.relationships.push(relationship);

        if let Some(owner) = self.entity_mut(namespace) {
            owner.relationships.push(id);
        }
        if to != namespace {
            if let Some(target) = self.entity_mut(to) {
                target.relationships.push(id);
            }
        }
        id
    }

    /// All entities in creation order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// All relationships in creation order
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn column_count(&self) -> usize {
        self.entities.iter().map(|e| e.columns.len()).sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
