use std::collections::{HashMap, HashSet};

use cdc_common::change_event::ChangeEventHeader;

/// Wrap a record Id in single quotes for use in a SOQL `IN` list.
pub fn quote_identifier(id: &str) -> String {
    format!("'{}'", id.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[derive(Debug, Default)]
struct EntityIdentifiers {
    entity_name: String,
    ids: Vec<String>,
    seen: HashSet<String>,
}

/// Quoted record Ids grouped by entity name.
///
/// Each Id appears at most once per entity, in the order it was first collected. Entities are
/// iterated in the order they were first collected too.
#[derive(Debug, Default)]
pub struct EntityIdentifierSet {
    entities: Vec<EntityIdentifiers>,
    index: HashMap<String, usize>,
}

impl EntityIdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_header(header: &ChangeEventHeader) -> Self {
        let mut set = Self::new();
        set.collect(&header.entity_name, &header.record_ids);
        set
    }

    /// Merge `ids` into the identifiers of `entity_name`, skipping any already collected.
    pub fn collect<S: AsRef<str>>(&mut self, entity_name: &str, ids: &[S]) {
        let position = match self.index.get(entity_name) {
            Some(position) => *position,
            None => {
                self.entities.push(EntityIdentifiers {
                    entity_name: entity_name.to_owned(),
                    ..Default::default()
                });
                self.index
                    .insert(entity_name.to_owned(), self.entities.len() - 1);
                self.entities.len() - 1
            }
        };

        let entity = &mut self.entities[position];
        for id in ids {
            let quoted = quote_identifier(id.as_ref());
            if entity.seen.insert(quoted.clone()) {
                entity.ids.push(quoted);
            }
        }
    }

    pub fn get(&self, entity_name: &str) -> Option<&[String]> {
        self.index
            .get(entity_name)
            .map(|position| self.entities[*position].ids.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entities
            .iter()
            .map(|entity| (entity.entity_name.as_str(), entity.ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
