//! This module contains a crossword-specific implementation of the AC-3 algorithm. For our
//! purposes, a pair of slots (x, y) is arc-consistent when every word left in x's domain has at
//! least one partner in y's domain that is a different word and, if the slots cross, puts the same
//! letter in the shared cell.

use bit_set::BitSet;
use log::{debug, trace};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// A directed arc `(x, y)`: revising it prunes x's domain against y's.
pub type Arc = (SlotId, SlotId);

/// Result from a failed call to `enforce_arc_consistency`, naming the slot whose domain was wiped
/// out. Domains are left in whatever partially-pruned state they were in at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<(), ArcConsistencyFailure>;

/// Do `x_word` in `x` and `y_word` in `y` agree on the cell the slots share? Slots that don't cross
/// are trivially compatible.
pub fn overlap_satisfied(
    config: &GridConfig,
    word_list: &WordList,
    x: SlotId,
    y: SlotId,
    x_word: WordId,
    y_word: WordId,
) -> bool {
    match config.overlap(x, y) {
        None => true,
        Some((x_cell, y_cell)) => {
            let x_glyph = word_list.word(x_word).glyphs.get(x_cell);
            let y_glyph = word_list.word(y_word).glyphs.get(y_cell);
            matches!((x_glyph, y_glyph), (Some(a), Some(b)) if a == b)
        }
    }
}

/// How many words in `domain` put each glyph in cell `cell`.
pub(crate) fn count_glyphs(
    word_list: &WordList,
    domain: &BitSet,
    cell: usize,
) -> HashMap<char, usize> {
    let mut glyph_counts: HashMap<char, usize> = HashMap::new();
    for word_id in domain.iter() {
        if let Some(&glyph) = word_list.word(word_id).glyphs.get(cell) {
            *glyph_counts.entry(glyph).or_insert(0) += 1;
        }
    }
    glyph_counts
}

/// How many words in `y_domain` could sit alongside `x_word`, given the glyph counts for
/// `y_domain` at `y_cell`. `x_word` itself never counts, since a word can only be used once.
pub(crate) fn count_supports(
    word_list: &WordList,
    y_glyph_counts: &HashMap<char, usize>,
    x_word: WordId,
    x_cell: usize,
    y_domain: &BitSet,
    y_cell: usize,
) -> usize {
    let glyphs = &word_list.word(x_word).glyphs;
    let glyph = match glyphs.get(x_cell) {
        Some(glyph) => glyph,
        None => return 0,
    };

    let count = y_glyph_counts.get(glyph).copied().unwrap_or(0);
    if y_domain.contains(x_word) && glyphs.get(y_cell) == Some(glyph) {
        count - 1
    } else {
        count
    }
}

/// Make `x` arc-consistent with respect to `y`, removing every word from x's domain that has no
/// compatible word left in y's domain. Returns whether x's domain changed.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> bool {
    let x_domain = domains.domain(x);
    let y_domain = domains.domain(y);

    let revised: BitSet = match config.overlap(x, y) {
        // Without a crossing, the only thing that can rule out a word is y being forced to use
        // that same word.
        None => {
            if y_domain.len() > 1 {
                return false;
            }
            x_domain
                .iter()
                .filter(|&x_word| y_domain.iter().any(|y_word| y_word != x_word))
                .collect()
        }

        // Otherwise count how many of y's options put each glyph in the shared cell, and keep the
        // words in x that still have at least one partner.
        Some((x_cell, y_cell)) => {
            let glyph_counts = count_glyphs(word_list, y_domain, y_cell);
            x_domain
                .iter()
                .filter(|&x_word| {
                    count_supports(word_list, &glyph_counts, x_word, x_cell, y_domain, y_cell) > 0
                })
                .collect()
        }
    };

    if revised.len() == x_domain.len() {
        return false;
    }

    trace!("revising {} against {}: {} -> {} options", x, y, x_domain.len(), revised.len());
    domains.set_domain(x, revised);
    true
}

/// Worklist of arcs waiting to be revised. An arc that's already waiting isn't queued again.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<Arc>,
    queued: HashSet<Arc>,
}

impl ConsistencyQueue {
    fn with_initial_queue<Items>(items: Items) -> ConsistencyQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ConsistencyQueue { queue: VecDeque::new(), queued: HashSet::new() };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Every ordered pair of distinct slots.
pub fn all_arcs(config: &GridConfig) -> Vec<Arc> {
    let slot_count = config.slot_count();
    (0..slot_count)
        .flat_map(|x| (0..slot_count).filter(move |&y| y != x).map(move |y| (x, y)))
        .collect()
}

/// Prune domains until every arc is consistent. If `initial_arcs` is None, we start from every
/// ordered pair of distinct slots; otherwise only the given arcs (plus whatever their revisions
/// knock loose) are examined. Fails as soon as any domain is emptied.
pub fn enforce_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    initial_arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    let mut queue =
        ConsistencyQueue::with_initial_queue(initial_arcs.unwrap_or_else(|| all_arcs(config)));

    while let Some((x, y)) = queue.pop_front() {
        if !revise(config, word_list, domains, x, y) {
            continue;
        }

        if domains.len(x) == 0 {
            debug!("arc consistency wiped out slot {} ({})", x, config.slot(x));
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        // Shrinking x may have removed the only support some neighbor's words had. Once x is down
        // to a single word, every other slot also has to give that word up.
        if domains.len(x) == 1 {
            for z in (0..config.slot_count()).filter(|&z| z != x && z != y) {
                queue.enqueue((z, x));
            }
        } else {
            for &z in config.neighbors(x) {
                if z != y {
                    queue.enqueue((z, x));
                }
            }
        }
    }

    Ok(())
}
