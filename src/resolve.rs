use std::collections::HashMap;

use crate::model::{Fact, FactId};

/// Name table: the only place facts are minted.
///
/// Every name maps to exactly one arena slot, so two mentions of `"X"`
/// anywhere in a description end up as the same `FactId`.
#[derive(Debug, Clone, Default)]
pub struct FactTable {
    index: HashMap<String, FactId>,
    facts: Vec<Fact>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the fact called `name`.
    pub fn intern(&mut self, name: &str) -> FactId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = FactId(self.facts.len());
        self.facts.push(Fact::new(name));
        self.index.insert(name.to_string(), id);
        id
    }

    /// Id of an already-interned name.
    pub fn get(&self, name: &str) -> Option<FactId> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn name(&self, id: FactId) -> &str {
        self.facts[id.0].name()
    }

    pub(crate) fn fact(&self, id: FactId) -> &Fact {
        &self.facts[id.0]
    }

    pub(crate) fn fact_mut(&mut self, id: FactId) -> &mut Fact {
        &mut self.facts[id.0]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts.iter().enumerate().map(|(i, f)| (FactId(i), f))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Fact> {
        self.facts.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        let mut t = FactTable::new();
        let a = t.intern("A");
        let b = t.intern("B");
        assert_ne!(a, b);
        assert_eq!(t.intern("A"), a);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("B"), Some(b));
        assert_eq!(t.get("C"), None);
        assert_eq!(t.name(a), "A");
    }
}
