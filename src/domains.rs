use bit_set::BitSet;
use std::fmt::{Debug, Formatter};

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// The live candidate sets for every slot, indexed by `SlotId`. Each domain is a set of ids into
/// the `WordList`. This is the only state the consistency and search code mutates.
#[derive(Clone, PartialEq, Eq)]
pub struct Domains {
    domains: Vec<BitSet>,
}

/// A deep copy of every domain, taken before a trial choice so the choice's effects can be
/// undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSnapshot {
    domains: Vec<BitSet>,
}

impl Debug for Domains {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.domains.iter().map(|domain| domain.len())).finish()
    }
}

impl Domains {
    /// Seed each slot's domain with every word of the right length, which makes the grid
    /// node-consistent. A slot with no words of its length simply gets an empty domain.
    pub fn initialize(config: &GridConfig, word_list: &WordList) -> Domains {
        let domains = config
            .slot_configs
            .iter()
            .map(|slot_config| {
                let mut domain = BitSet::with_capacity(word_list.len());
                for &word_id in word_list.ids_of_length(slot_config.slot.length) {
                    domain.insert(word_id);
                }
                domain
            })
            .collect();

        Domains { domains }
    }

    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain(&self, slot_id: SlotId) -> &BitSet {
        &self.domains[slot_id]
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.domains[slot_id].len()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    /// Replace a slot's domain wholesale; used by the consistency code after revising it.
    pub(crate) fn set_domain(&mut self, slot_id: SlotId, domain: BitSet) {
        self.domains[slot_id] = domain;
    }

    /// Narrow a slot's domain to exactly one word.
    pub fn restrict_to(&mut self, slot_id: SlotId, word_id: WordId) {
        let domain = &mut self.domains[slot_id];
        domain.clear();
        domain.insert(word_id);
    }

    /// The first slot (if any) whose domain has been wiped out.
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.domains.iter().position(|domain| domain.is_empty())
    }

    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot { domains: self.domains.clone() }
    }

    pub fn restore(&mut self, snapshot: &DomainSnapshot) {
        self.domains.clone_from(&snapshot.domains);
    }
}
