//! Row-to-object-graph assembly: flat result rows in, nested records
//! out. Entities declare their key column, their column-to-field map
//! and their belongs-to relations; the mapper hydrates parents,
//! deduplicates by entity key within one invocation, and fails fast
//! on relation cycles.

pub mod value;

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use smol_str::SmolStr;
use thiserror::Error;

pub use crate::value::{CellValue, coerce};

pub type Row = indexmap::IndexMap<SmolStr, CellValue>;

/// A hydrated record. Records are shared: rows with the same entity
/// key hold the same reference within one `map_rows` call.
pub type MappedRecord = Rc<RefCell<MappedObject>>;

pub type MappedObject = indexmap::IndexMap<SmolStr, MappedValue>;

#[derive(Debug, Clone)]
pub enum MappedValue {
    Cell(CellValue),
    Record(MappedRecord),
}

impl MappedValue {
    pub fn as_cell(&self) -> Option<&CellValue> {
        if let Self::Cell(v) = self { Some(v) } else { None }
    }

    pub fn as_record(&self) -> Option<&MappedRecord> {
        if let Self::Record(v) = self { Some(v) } else { None }
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum MappingError {
    #[error("row is missing the key column {0:?}")]
    MissingKeyColumn(SmolStr),

    #[error("row is missing the local key column {column:?} required by relation {relation:?}")]
    MissingLocalKeyColumn { column: SmolStr, relation: SmolStr },

    #[error("local key {column:?} for relation {relation:?} on entity {entity:?} is null")]
    NullLocalKey {
        column: SmolStr,
        relation: SmolStr,
        entity: SmolStr,
    },

    #[error("circular entity mapping: {path}")]
    CircularEntityMapping { path: String },

    #[error("mapping references unknown entity {0:?}")]
    UnknownEntity(SmolStr),
}

#[derive(Debug, Clone)]
pub struct EntityMapping {
    pub name: SmolStr,
    /// The row column holding this entity's key.
    pub key_column: SmolStr,
    /// Row column to output field, in declaration order.
    pub columns: indexmap::IndexMap<SmolStr, SmolStr>,
    pub relations: Vec<Relation>,
}

impl EntityMapping {
    pub fn new(name: &str, key_column: &str) -> Self {
        EntityMapping {
            name: SmolStr::new(name),
            key_column: SmolStr::new(key_column),
            columns: indexmap::IndexMap::new(),
            relations: Vec::new(),
        }
    }

    pub fn column(mut self, column: &str, field: &str) -> Self {
        self.columns.insert(SmolStr::new(column), SmolStr::new(field));
        self
    }

    pub fn belongs_to(mut self, field: &str, parent: &str, local_key_column: &str) -> Self {
        self.relations.push(Relation {
            field: SmolStr::new(field),
            parent: SmolStr::new(parent),
            local_key_column: SmolStr::new(local_key_column),
            optional: false,
        });
        self
    }

    pub fn belongs_to_optional(
        mut self,
        field: &str,
        parent: &str,
        local_key_column: &str,
    ) -> Self {
        self.relations.push(Relation {
            field: SmolStr::new(field),
            parent: SmolStr::new(parent),
            local_key_column: SmolStr::new(local_key_column),
            optional: true,
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct Relation {
    /// The output field that holds the parent record.
    pub field: SmolStr,
    pub parent: SmolStr,
    /// The row column holding the parent's key.
    pub local_key_column: SmolStr,
    pub optional: bool,
}

pub struct RowMapper {
    root: SmolStr,
    entities: AHashMap<SmolStr, EntityMapping>,
    coerce_values: bool,
}

impl RowMapper {
    pub fn new(root: &str, entities: impl IntoIterator<Item = EntityMapping>) -> Self {
        RowMapper {
            root: SmolStr::new(root),
            entities: entities
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
            coerce_values: false,
        }
    }

    /// Enable string coercion (numbers, booleans, strict ISO dates).
    pub fn with_coercion(mut self) -> Self {
        self.coerce_values = true;
        self
    }

    /// Assemble one record per input row. The identity cache is fresh
    /// for every call: the same key in two invocations yields two
    /// independent records.
    pub fn map_rows(&self, rows: &[Row]) -> Result<Vec<MappedRecord>, MappingError> {
        log::trace!("assembling {} rows rooted at {:?}", rows.len(), self.root);
        let mut cache: AHashMap<(SmolStr, String), MappedRecord> = AHashMap::new();
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut path = Vec::new();
            let record = self.assemble(&self.root, row, &mut cache, &mut path, true)?;
            records.push(record);
        }
        Ok(records)
    }

    fn assemble(
        &self,
        entity_name: &SmolStr,
        row: &Row,
        cache: &mut AHashMap<(SmolStr, String), MappedRecord>,
        path: &mut Vec<(SmolStr, String)>,
        is_root: bool,
    ) -> Result<MappedRecord, MappingError> {
        let entity = self
            .entities
            .get(entity_name)
            .ok_or_else(|| MappingError::UnknownEntity(entity_name.clone()))?;

        let key = match row.get(&entity.key_column) {
            Some(value) => self.maybe_coerce(value.clone()),
            None if is_root => {
                return Err(MappingError::MissingKeyColumn(entity.key_column.clone()));
            }
            None => CellValue::Null,
        };
        let key_repr = key.key_repr();
        let cache_key = (entity.name.clone(), key_repr.clone());

        if let Some(existing) = cache.get(&cache_key) {
            return Ok(Rc::clone(existing));
        }

        let frame = (entity.name.clone(), key_repr);
        if path.contains(&frame) {
            let mut chain: Vec<String> = path
                .iter()
                .map(|(name, key)| format!("{name}({key})"))
                .collect();
            chain.push(format!("{}({})", frame.0, frame.1));
            return Err(MappingError::CircularEntityMapping {
                path: chain.join(" -> "),
            });
        }
        path.push(frame);

        let result = self.hydrate(entity, row, cache, path);
        path.pop();
        let record = result?;

        cache.insert(cache_key, Rc::clone(&record));
        Ok(record)
    }

    fn hydrate(
        &self,
        entity: &EntityMapping,
        row: &Row,
        cache: &mut AHashMap<(SmolStr, String), MappedRecord>,
        path: &mut Vec<(SmolStr, String)>,
    ) -> Result<MappedRecord, MappingError> {
        let mut object = MappedObject::new();
        for (column, field) in &entity.columns {
            let value = row.get(column).cloned().unwrap_or(CellValue::Null);
            object.insert(field.clone(), MappedValue::Cell(self.maybe_coerce(value)));
        }

        for relation in &entity.relations {
            match row.get(&relation.local_key_column) {
                None => {
                    if relation.optional {
                        continue;
                    }
                    return Err(MappingError::MissingLocalKeyColumn {
                        column: relation.local_key_column.clone(),
                        relation: relation.field.clone(),
                    });
                }
                Some(CellValue::Null) => {
                    if relation.optional {
                        continue;
                    }
                    return Err(MappingError::NullLocalKey {
                        column: relation.local_key_column.clone(),
                        relation: relation.field.clone(),
                        entity: entity.name.clone(),
                    });
                }
                Some(_) => {}
            }

            // An optional parent whose own key columns are all null in
            // this row is absent, not an empty shell.
            if relation.optional && self.parent_key_is_null(&relation.parent, row) {
                continue;
            }

            let parent = self.assemble(&relation.parent, row, cache, path, false)?;
            object.insert(relation.field.clone(), MappedValue::Record(parent));
        }

        Ok(Rc::new(RefCell::new(object)))
    }

    fn parent_key_is_null(&self, parent: &SmolStr, row: &Row) -> bool {
        let Some(entity) = self.entities.get(parent) else {
            return false;
        };
        match row.get(&entity.key_column) {
            Some(value) => value.is_null(),
            None => true,
        }
    }

    fn maybe_coerce(&self, value: CellValue) -> CellValue {
        if self.coerce_values {
            coerce(value)
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn row(cells: &[(&str, CellValue)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (SmolStr::new(*k), v.clone()))
            .collect()
    }

    fn order_mapping() -> Vec<EntityMapping> {
        vec![
            EntityMapping::new("order", "order_id")
                .column("order_id", "id")
                .column("total", "total")
                .belongs_to("customer", "customer", "customer_id"),
            EntityMapping::new("customer", "customer_id")
                .column("customer_id", "id")
                .column("customer_name", "name"),
        ]
    }

    #[test]
    fn hydrates_nested_parent() {
        let mapper = RowMapper::new("order", order_mapping());
        let rows = vec![row(&[
            ("order_id", CellValue::Int(1)),
            ("total", CellValue::Int(90)),
            ("customer_id", CellValue::Int(7)),
            ("customer_name", CellValue::from("Kim")),
        ])];
        let records = mapper.map_rows(&rows).unwrap();
        let order = records[0].borrow();
        let customer = order["customer"].as_record().unwrap().borrow();
        assert_eq!(customer["name"].as_cell(), Some(&CellValue::from("Kim")));
    }

    #[test]
    fn missing_root_key_column_fails() {
        let mapper = RowMapper::new("order", order_mapping());
        let rows = vec![row(&[("total", CellValue::Int(5))])];
        let err = mapper.map_rows(&rows).unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingKeyColumn(SmolStr::new("order_id"))
        );
    }

    #[test]
    fn required_relation_errors() {
        let mapper = RowMapper::new("order", order_mapping());

        let missing = vec![row(&[("order_id", CellValue::Int(1))])];
        let err = mapper.map_rows(&missing).unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingLocalKeyColumn {
                column: SmolStr::new("customer_id"),
                relation: SmolStr::new("customer"),
            }
        );

        let null_key = vec![row(&[
            ("order_id", CellValue::Int(1)),
            ("customer_id", CellValue::Null),
        ])];
        let err = mapper.map_rows(&null_key).unwrap_err();
        assert_eq!(
            err,
            MappingError::NullLocalKey {
                column: SmolStr::new("customer_id"),
                relation: SmolStr::new("customer"),
                entity: SmolStr::new("order"),
            }
        );
    }

    #[test]
    fn optional_parent_omitted_on_null_keys() {
        let entities = vec![
            EntityMapping::new("order", "order_id")
                .column("order_id", "id")
                .belongs_to_optional("customer", "customer", "customer_id"),
            EntityMapping::new("customer", "customer_id").column("customer_id", "id"),
        ];
        let mapper = RowMapper::new("order", entities);

        let rows = vec![
            row(&[
                ("order_id", CellValue::Int(1)),
                ("customer_id", CellValue::Null),
            ]),
            row(&[("order_id", CellValue::Int(2))]),
        ];
        let records = mapper.map_rows(&rows).unwrap();
        assert!(!records[0].borrow().contains_key("customer"));
        assert!(!records[1].borrow().contains_key("customer"));
    }

    #[test]
    fn zero_valued_keys_hydrate() {
        let entities = vec![
            EntityMapping::new("order", "order_id")
                .column("order_id", "id")
                .belongs_to_optional("customer", "customer", "customer_id"),
            EntityMapping::new("customer", "customer_id").column("customer_id", "id"),
        ];
        let mapper = RowMapper::new("order", entities);
        let rows = vec![row(&[
            ("order_id", CellValue::Int(1)),
            ("customer_id", CellValue::Int(0)),
        ])];
        let records = mapper.map_rows(&rows).unwrap();
        assert!(records[0].borrow().contains_key("customer"));
    }

    #[test]
    fn identity_dedup_within_one_invocation() {
        let mapper = RowMapper::new("order", order_mapping());
        let rows = vec![
            row(&[
                ("order_id", CellValue::Int(1)),
                ("total", CellValue::Int(10)),
                ("customer_id", CellValue::Int(7)),
                ("customer_name", CellValue::from("Kim")),
            ]),
            row(&[
                ("order_id", CellValue::Int(2)),
                ("total", CellValue::Int(20)),
                ("customer_id", CellValue::Int(7)),
                ("customer_name", CellValue::from("Kim")),
            ]),
        ];

        let records = mapper.map_rows(&rows).unwrap();
        let customer_a = records[0].borrow()["customer"].as_record().unwrap().clone();
        let customer_b = records[1].borrow()["customer"].as_record().unwrap().clone();
        assert!(Rc::ptr_eq(&customer_a, &customer_b));

        // Caches are per invocation.
        let again = mapper.map_rows(&rows).unwrap();
        let customer_c = again[0].borrow()["customer"].as_record().unwrap().clone();
        assert!(!Rc::ptr_eq(&customer_a, &customer_c));
    }

    #[test]
    fn relation_cycle_reports_full_path() {
        let entities = vec![
            EntityMapping::new("node", "node_id")
                .column("node_id", "id")
                .belongs_to("parent", "node", "node_id"),
        ];
        let mapper = RowMapper::new("node", entities);
        let rows = vec![row(&[("node_id", CellValue::Int(1))])];

        let err = mapper.map_rows(&rows).unwrap_err();
        let MappingError::CircularEntityMapping { path } = err else {
            panic!("expected cycle error");
        };
        assert_eq!(path, "node(i:1) -> node(i:1)");
    }

    #[test]
    fn coercion_is_opt_in() {
        let entities = vec![
            EntityMapping::new("event", "event_id")
                .column("event_id", "id")
                .column("count", "count"),
        ];
        let rows = vec![row(&[
            ("event_id", CellValue::from("1")),
            ("count", CellValue::from("42")),
        ])];

        let plain = RowMapper::new("event", entities.clone());
        let records = plain.map_rows(&rows).unwrap();
        assert_eq!(
            records[0].borrow()["count"].as_cell(),
            Some(&CellValue::from("42"))
        );

        let coercing = RowMapper::new("event", entities).with_coercion();
        let records = coercing.map_rows(&rows).unwrap();
        assert_eq!(
            records[0].borrow()["count"].as_cell(),
            Some(&CellValue::Int(42))
        );
    }
}
