//! This module implements grid-filling as a backtracking search over partial assignments. Slots
//! are chosen with the minimum-remaining-values heuristic (breaking ties by degree) and words are
//! tried in least-constraining-value order. In `SearchMode::Interleaved`, every tentative choice is
//! followed by a round of arc consistency, and the domains are rolled back if the choice doesn't
//! work out.

use instant::{Duration, Instant};
use log::{debug, info, trace};
use std::cmp::Reverse;
use std::fmt::{Display, Formatter};

use crate::arc_consistency::{
    count_glyphs, count_supports, enforce_arc_consistency, overlap_satisfied, Arc,
    ArcConsistencyFailure,
};
use crate::domains::Domains;
use crate::grid_config::{GridConfig, Slot, SlotId};
use crate::word_list::{WordId, WordList};

/// How the search uses arc consistency once it's underway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Establish arc consistency once up front, then search without any further propagation.
    #[default]
    Plain,

    /// Re-establish arc consistency after every tentative choice ("maintaining arc consistency").
    Interleaved,
}

/// Settings for a fill operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillOptions {
    pub mode: SearchMode,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Number of search nodes visited.
    pub states: u64,

    /// Number of tentative slot/word bindings made.
    pub words_tried: u64,

    /// Number of times a slot ran out of options and the search stepped back.
    pub backtracks: u64,

    /// Number of bindings rejected because propagating them wiped out a domain.
    pub propagation_failures: u64,

    pub duration: Duration,
}

/// A partial mapping from slots to words, indexed by `SlotId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    choices: Vec<Option<WordId>>,
}

impl Assignment {
    pub fn new(slot_count: usize) -> Assignment {
        Assignment { choices: vec![None; slot_count] }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.choices.get(slot_id).copied().flatten()
    }

    pub fn insert(&mut self, slot_id: SlotId, word_id: WordId) {
        self.choices[slot_id] = Some(word_id);
    }

    pub fn remove(&mut self, slot_id: SlotId) -> Option<WordId> {
        self.choices[slot_id].take()
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.get(slot_id).is_some()
    }

    /// Number of slots that currently have a word.
    pub fn len(&self) -> usize {
        self.choices.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if every slot has a word.
    pub fn is_complete(&self) -> bool {
        self.choices.iter().all(|choice| choice.is_some())
    }

    /// Iterate over the `(slot id, word id)` pairs that have been chosen.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.choices
            .iter()
            .enumerate()
            .filter_map(|(slot_id, choice)| choice.map(|word_id| (slot_id, word_id)))
    }

    /// Iterate over the chosen slots and words by value.
    pub fn entries<'a>(
        &'a self,
        config: &'a GridConfig,
        word_list: &'a WordList,
    ) -> impl Iterator<Item = (&'a Slot, &'a str)> + 'a {
        self.iter().map(move |(slot_id, word_id)| {
            (config.slot(slot_id), word_list.word(word_id).string.as_str())
        })
    }
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Ways a fill can come up empty. Callers generally don't need to tell these apart; both mean the
/// grid can't be filled from the given word list.
#[derive(Debug)]
pub enum FillFailure {
    /// Some slot had no usable words before the search even started.
    UnsatisfiableDomain { slot_id: SlotId },

    /// The search tried everything without finding a fill.
    NoSolution { statistics: Statistics },
}

impl Display for FillFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FillFailure::UnsatisfiableDomain { slot_id } => {
                write!(f, "no solution (slot {} has no possible words)", slot_id)
            }
            FillFailure::NoSolution { .. } => write!(f, "no solution"),
        }
    }
}

impl std::error::Error for FillFailure {}

/// Is the assignment free of conflicts? That means no word is used twice, every word fits its
/// slot, and every pair of assigned crossing slots agrees on the shared letter.
pub fn consistent(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> bool {
    assignment
        .iter()
        .all(|(slot_id, _)| consistent_choice(config, word_list, assignment, slot_id))
}

/// Is the word assigned to `slot_id` compatible with the rest of the assignment? If the rest of
/// the assignment was already consistent, this is equivalent to calling `consistent` after adding
/// the choice, but only looks at the pairs the choice is part of.
pub fn consistent_choice(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    slot_id: SlotId,
) -> bool {
    let word_id = match assignment.get(slot_id) {
        Some(word_id) => word_id,
        None => return true,
    };

    if word_list.word(word_id).glyphs.len() != config.slot(slot_id).length {
        return false;
    }

    let reused = assignment
        .iter()
        .any(|(other_slot_id, other_word_id)| other_word_id == word_id && other_slot_id != slot_id);
    if reused {
        return false;
    }

    config.neighbors(slot_id).iter().all(|&neighbor_id| match assignment.get(neighbor_id) {
        Some(neighbor_word_id) => {
            overlap_satisfied(config, word_list, slot_id, neighbor_id, word_id, neighbor_word_id)
        }
        None => true,
    })
}

/// Pick the next slot to fill: the unassigned slot with the fewest remaining options, preferring
/// slots that cross more other slots, and then lower ids. Returns None once everything is
/// assigned.
pub fn select_unassigned_variable(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| {
            (domains.len(slot_id), Reverse(config.neighbors(slot_id).len()), slot_id)
        })
}

/// Return the words in `slot_id`'s domain ordered by how many options each would rule out for the
/// unassigned slots crossing it, fewest first. Ties keep word list order.
pub fn order_domain_values(
    config: &GridConfig,
    word_list: &WordList,
    domains: &Domains,
    assignment: &Assignment,
    slot_id: SlotId,
) -> Vec<WordId> {
    // For each open crossing, precompute how many of its options put each glyph in the shared
    // cell. A candidate rules out every option in the crossing's domain except its supports.
    let crossings: Vec<_> = config
        .neighbors(slot_id)
        .iter()
        .filter(|&&neighbor_id| !assignment.is_assigned(neighbor_id))
        .filter_map(|&neighbor_id| {
            let (slot_cell, neighbor_cell) = config.overlap(slot_id, neighbor_id)?;
            let neighbor_domain = domains.domain(neighbor_id);
            let glyph_counts = count_glyphs(word_list, neighbor_domain, neighbor_cell);
            Some((slot_cell, neighbor_domain, neighbor_cell, glyph_counts))
        })
        .collect();

    let mut values: Vec<WordId> = domains.domain(slot_id).iter().collect();
    values.sort_by_cached_key(|&word_id| {
        crossings
            .iter()
            .map(|(slot_cell, neighbor_domain, neighbor_cell, glyph_counts)| {
                let supports = count_supports(
                    word_list,
                    glyph_counts,
                    word_id,
                    *slot_cell,
                    neighbor_domain,
                    *neighbor_cell,
                );
                neighbor_domain.len() - supports
            })
            .sum::<usize>()
    });
    values
}

/// The live state of a single search: the domains being narrowed, the partial assignment, and
/// the counters reported back to the caller.
struct Search<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: Domains,
    assignment: Assignment,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    fn new(config: &'a GridConfig, word_list: &'a WordList, domains: Domains) -> Search<'a> {
        Search {
            config,
            word_list,
            domains,
            assignment: Assignment::new(config.slot_count()),
            statistics: Statistics::default(),
        }
    }

    /// Tentatively bind `word_id` to `slot_id` and report whether it conflicts with anything
    /// already assigned. The binding stays in place either way.
    fn try_choice(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.statistics.words_tried += 1;
        trace!(
            "trying {} for slot {} ({} assigned)",
            self.word_list.word(word_id).string,
            slot_id,
            self.assignment.len()
        );

        self.assignment.insert(slot_id, word_id);
        consistent_choice(self.config, self.word_list, &self.assignment, slot_id)
    }

    /// Plain recursive backtracking. Domains aren't touched once the search is underway.
    fn backtrack(&mut self) -> bool {
        self.statistics.states += 1;

        let slot_id =
            match select_unassigned_variable(self.config, &self.domains, &self.assignment) {
                Some(slot_id) => slot_id,
                None => return true,
            };

        let values = order_domain_values(
            self.config,
            self.word_list,
            &self.domains,
            &self.assignment,
            slot_id,
        );

        for word_id in values {
            if self.try_choice(slot_id, word_id) && self.backtrack() {
                return true;
            }
            self.assignment.remove(slot_id);
        }

        self.statistics.backtracks += 1;
        false
    }

    /// Backtracking that re-establishes arc consistency after each consistent choice, restoring
    /// the domains from a snapshot whenever a choice is abandoned.
    fn backtrack_with_propagation(&mut self) -> bool {
        self.statistics.states += 1;

        let slot_id =
            match select_unassigned_variable(self.config, &self.domains, &self.assignment) {
                Some(slot_id) => slot_id,
                None => return true,
            };

        let values = order_domain_values(
            self.config,
            self.word_list,
            &self.domains,
            &self.assignment,
            slot_id,
        );
        let snapshot = self.domains.snapshot();

        for word_id in values {
            // Domains are only modified once a choice passes the consistency check, so that's the
            // only case that needs a restore.
            if self.try_choice(slot_id, word_id) {
                self.domains.restrict_to(slot_id, word_id);

                // The slot is down to one word, so every other slot has to be checked against it,
                // not just the ones crossing it.
                let arcs: Vec<Arc> = (0..self.config.slot_count())
                    .filter(|&other_id| other_id != slot_id)
                    .map(|other_id| (other_id, slot_id))
                    .collect();

                let propagated = enforce_arc_consistency(
                    self.config,
                    self.word_list,
                    &mut self.domains,
                    Some(arcs),
                );

                match propagated {
                    Ok(()) => {
                        if self.backtrack_with_propagation() {
                            return true;
                        }
                    }
                    Err(ArcConsistencyFailure { slot_id: emptied_slot_id }) => {
                        self.statistics.propagation_failures += 1;
                        debug!(
                            "choosing {} for slot {} leaves slot {} without options",
                            self.word_list.word(word_id).string,
                            slot_id,
                            emptied_slot_id
                        );
                    }
                }

                self.domains.restore(&snapshot);
            }
            self.assignment.remove(slot_id);
        }

        self.statistics.backtracks += 1;
        false
    }
}

/// Search for a valid fill for the given grid: make every slot node- and arc-consistent, then run
/// the backtracking search selected by `options`.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    info!(
        "filling {} slots from {} words ({:?} search)",
        config.slot_count(),
        word_list.len(),
        options.mode
    );

    let mut domains = Domains::initialize(config, word_list);

    if let Some(slot_id) = domains.first_empty_slot() {
        info!("slot {} ({}) has no words of the right length", slot_id, config.slot(slot_id));
        return Err(FillFailure::UnsatisfiableDomain { slot_id });
    }

    if let Err(ArcConsistencyFailure { slot_id }) =
        enforce_arc_consistency(config, word_list, &mut domains, None)
    {
        info!("initial arc consistency left slot {} ({}) empty", slot_id, config.slot(slot_id));
        return Err(FillFailure::UnsatisfiableDomain { slot_id });
    }

    let mut search = Search::new(config, word_list, domains);
    let found = match options.mode {
        SearchMode::Plain => search.backtrack(),
        SearchMode::Interleaved => search.backtrack_with_propagation(),
    };

    let mut statistics = search.statistics;
    statistics.duration = start.elapsed();

    info!("search finished ({}): {:?}", if found { "filled" } else { "no fill" }, statistics);

    if found {
        Ok(FillSuccess { statistics, assignment: search.assignment })
    } else {
        Err(FillFailure::NoSolution { statistics })
    }
}

#[cfg(test)]
mod tests {
    use crate::backtracking_search::{
        consistent, order_domain_values, select_unassigned_variable, Assignment,
    };
    use crate::grid_config::{Direction::*, GridConfig, Slot};
    use crate::{find_fill, render_grid, Domains, FillFailure, FillOptions, SearchMode, WordList};

    const MODES: [SearchMode; 2] = [SearchMode::Plain, SearchMode::Interleaved];

    fn options(mode: SearchMode) -> FillOptions {
        FillOptions { mode }
    }

    fn open_config(width: usize, height: usize, slots: Vec<Slot>) -> GridConfig {
        GridConfig::new(width, height, vec![vec![true; width]; height], slots).unwrap()
    }

    fn assigned_words(
        config: &GridConfig,
        word_list: &WordList,
        assignment: &Assignment,
    ) -> Vec<String> {
        assignment.entries(config, word_list).map(|(_, word)| word.to_string()).collect()
    }

    #[test]
    fn test_single_slot() {
        let config = open_config(3, 1, vec![Slot::new(0, 0, Across, 3)]);
        let word_list = WordList::new(["cat", "dog"]);

        for mode in MODES {
            let result = find_fill(&config, &word_list, &options(mode))
                .expect("Failed to find a fill");

            let words = assigned_words(&config, &word_list, &result.assignment);
            assert_eq!(words.len(), 1);
            assert!(words[0] == "CAT" || words[0] == "DOG");
        }
    }

    #[test]
    fn test_mismatched_crossing_has_no_solution() {
        // 1-across's middle letter is 1-down's first letter.
        let config = open_config(3, 3, vec![Slot::new(0, 0, Across, 3), Slot::new(0, 1, Down, 3)]);
        let word_list = WordList::new(["bat", "ten"]);

        for mode in MODES {
            let result = find_fill(&config, &word_list, &options(mode));
            assert!(result.is_err(), "Found an impossible fill??");
        }
    }

    #[test]
    fn test_disjoint_slots_use_distinct_words() {
        let config =
            open_config(3, 2, vec![Slot::new(0, 0, Across, 3), Slot::new(1, 0, Across, 3)]);
        let word_list = WordList::new(["cat", "dog"]);

        for mode in MODES {
            let result = find_fill(&config, &word_list, &options(mode))
                .expect("Failed to find a fill");

            let mut words = assigned_words(&config, &word_list, &result.assignment);
            words.sort();
            assert_eq!(words, vec!["CAT", "DOG"]);
        }
    }

    #[test]
    fn test_not_enough_distinct_words() {
        let config = open_config(3, 3, vec![
            Slot::new(0, 0, Across, 3),
            Slot::new(1, 0, Across, 3),
            Slot::new(2, 0, Across, 3),
        ]);
        let word_list = WordList::new(["cat", "dog"]);

        for mode in MODES {
            assert!(find_fill(&config, &word_list, &options(mode)).is_err());
        }
    }

    #[test]
    fn test_missing_length_fails_before_search() {
        let config = open_config(4, 1, vec![Slot::new(0, 0, Across, 4)]);
        let word_list = WordList::new(["cat", "dog"]);

        match find_fill(&config, &word_list, &FillOptions::default()) {
            Err(FillFailure::UnsatisfiableDomain { slot_id }) => assert_eq!(slot_id, 0),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    /// _____
    /// _#_#_
    /// _____
    /// _#_#_
    /// _____
    #[test]
    fn test_find_fill_for_5x5_lattice() {
        let config = GridConfig::from_template(
            "_____\n\
             _#_#_\n\
             _____\n\
             _#_#_\n\
             _____",
        )
        .unwrap();
        let word_list = WordList::new([
            "steer", "there", "error", "scree", "trees", "rarer", "taste", "stare", "eater",
            "rents", "terse", "roses", "easel", "aster", "otter",
        ]);

        for mode in MODES {
            let result = find_fill(&config, &word_list, &options(mode));

            if let Ok(result) = &result {
                assert!(result.assignment.is_complete());
                assert!(consistent(&config, &word_list, &result.assignment));
                println!("{:?}", result.statistics);
                println!("{}", render_grid(&config, &word_list, &result.assignment));
            }

            // Both modes have to agree on whether a fill exists.
            let other_mode = if mode == SearchMode::Plain {
                SearchMode::Interleaved
            } else {
                SearchMode::Plain
            };
            assert_eq!(
                result.is_ok(),
                find_fill(&config, &word_list, &options(other_mode)).is_ok()
            );
        }
    }

    /// ____
    /// _##_
    /// _##_
    /// ____
    #[test]
    fn test_find_fill_for_ring() {
        let config = GridConfig::from_template(
            "____\n\
             _##_\n\
             _##_\n\
             ____",
        )
        .unwrap();
        // ABCD and AEFG can go either way round the top-left corner, but the words are forced.
        let word_list = WordList::new(["abcd", "aefg", "dhij", "gklj", "wxyz"]);

        for mode in MODES {
            let result = find_fill(&config, &word_list, &options(mode))
                .expect("Failed to find a fill");

            assert!(consistent(&config, &word_list, &result.assignment));
            let mut words = assigned_words(&config, &word_list, &result.assignment);
            words.sort();
            assert_eq!(words, vec!["ABCD", "AEFG", "DHIJ", "GKLJ"]);
            assert!(result.statistics.words_tried >= 4);
        }
    }

    /// ___
    /// #__
    #[test]
    fn test_interleaved_search_recovers_from_propagation_failure() {
        let config = GridConfig::from_template("___\n#__").unwrap();
        // QAA survives the initial pass, but it forces AB into both down slots.
        let word_list = WordList::new(["qaa", "qcd", "ab", "bb", "ce", "df", "ef"]);

        let result = find_fill(&config, &word_list, &options(SearchMode::Interleaved))
            .expect("Failed to find a fill");

        assert_eq!(render_grid(&config, &word_list, &result.assignment), "QCD\n█EF");
        assert_eq!(result.statistics.propagation_failures, 1);
        assert_eq!(result.statistics.backtracks, 0);

        // Plain search gets there too, without ever propagating.
        let result = find_fill(&config, &word_list, &options(SearchMode::Plain))
            .expect("Failed to find a fill");
        assert_eq!(render_grid(&config, &word_list, &result.assignment), "QCD\n█EF");
        assert_eq!(result.statistics.propagation_failures, 0);
    }

    #[test]
    fn test_consistent() {
        let config = open_config(3, 3, vec![Slot::new(0, 0, Across, 3), Slot::new(0, 1, Down, 3)]);
        let word_list = WordList::new(["cat", "ace", "dog", "tree"]);

        let mut assignment = Assignment::new(2);
        assert!(consistent(&config, &word_list, &assignment));

        assignment.insert(0, 0);
        assignment.insert(1, 1);
        assert!(consistent(&config, &word_list, &assignment));

        // Overlap mismatch: DOG's middle O against ACE's A.
        assignment.insert(0, 2);
        assert!(!consistent(&config, &word_list, &assignment));

        // Same word twice.
        assignment.insert(0, 1);
        assert!(!consistent(&config, &word_list, &assignment));

        // Wrong length.
        assignment.remove(1);
        assignment.insert(0, 3);
        assert!(!consistent(&config, &word_list, &assignment));
    }

    #[test]
    fn test_select_unassigned_variable_prefers_small_domains_then_degree() {
        // Two across and two down slots, each crossing both slots of the other direction.
        let config = GridConfig::from_template(
            "___\n\
             _#_\n\
             ___",
        )
        .unwrap();
        let word_list = WordList::new(["abc", "cde", "aec", "ccc"]);
        let mut domains = Domains::initialize(&config, &word_list);
        let mut assignment = Assignment::new(config.slot_count());

        // Everything ties on domain size and degree, so the lowest id wins.
        assert_eq!(select_unassigned_variable(&config, &domains, &assignment), Some(0));

        domains.restrict_to(3, 1);
        assert_eq!(select_unassigned_variable(&config, &domains, &assignment), Some(3));

        assignment.insert(3, 1);
        assignment.insert(0, 0);
        assert_eq!(select_unassigned_variable(&config, &domains, &assignment), Some(1));

        assignment.insert(1, 2);
        assignment.insert(2, 3);
        assert_eq!(select_unassigned_variable(&config, &domains, &assignment), None);
    }

    #[test]
    fn test_select_unassigned_variable_breaks_ties_by_degree() {
        // 0: across, crosses nothing; 1: across, crosses 2; 2: down.
        let config = GridConfig::new(
            3,
            4,
            vec![vec![true; 3]; 4],
            vec![
                Slot::new(0, 0, Across, 3),
                Slot::new(2, 0, Across, 3),
                Slot::new(1, 1, Down, 3),
            ],
        )
        .unwrap();
        let word_list = WordList::new(["abc", "def"]);
        let domains = Domains::initialize(&config, &word_list);

        let assignment = Assignment::new(3);
        assert_eq!(select_unassigned_variable(&config, &domains, &assignment), Some(1));
    }

    #[test]
    fn test_order_domain_values_least_constraining_first() {
        let config = open_config(3, 3, vec![Slot::new(0, 0, Across, 3), Slot::new(0, 1, Down, 3)]);
        // 1-across's middle letter has to start 1-down.
        let word_list = WordList::new(["xbx", "ace", "xax", "bee", "ant"]);
        let domains = Domains::initialize(&config, &word_list);
        let assignment = Assignment::new(2);

        let ordered: Vec<String> =
            order_domain_values(&config, &word_list, &domains, &assignment, 0)
                .into_iter()
                .map(|word_id| word_list.word(word_id).string.clone())
                .collect();

        // XAX is supported by ACE and ANT, XBX only by BEE, everything else by nothing.
        assert_eq!(ordered, vec!["XAX", "XBX", "ACE", "BEE", "ANT"]);
    }

    #[test]
    fn test_order_domain_values_ignores_assigned_neighbors() {
        let config = open_config(3, 3, vec![Slot::new(0, 0, Across, 3), Slot::new(0, 1, Down, 3)]);
        let word_list = WordList::new(["xbx", "xax", "ace", "ant"]);
        let domains = Domains::initialize(&config, &word_list);
        let mut assignment = Assignment::new(2);
        assignment.insert(1, 2);

        // With 1-down assigned, no candidate constrains anything, so word list order stands.
        let ordered = order_domain_values(&config, &word_list, &domains, &assignment, 0);
        assert_eq!(ordered, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_statistics_are_reported() {
        let config =
            open_config(3, 2, vec![Slot::new(0, 0, Across, 3), Slot::new(1, 0, Across, 3)]);
        let word_list = WordList::new(["cat", "dog"]);

        let result = find_fill(&config, &word_list, &FillOptions::default()).unwrap();

        assert_eq!(result.statistics.states, 3);
        assert_eq!(result.statistics.backtracks, 0);
        assert!(result.statistics.words_tried >= 2);
    }

    #[test]
    fn test_empty_grid_is_trivially_filled() {
        let config = GridConfig::from_template("#_#\n###").unwrap();
        let word_list = WordList::new(["cat"]);

        for mode in MODES {
            let result = find_fill(&config, &word_list, &options(mode)).unwrap();
            assert!(result.assignment.is_empty());
            assert!(result.assignment.is_complete());
        }
    }
}
