//! The static description of a puzzle: the grid's shape, the slots that need to be filled, and
//! which slots cross which. Nothing in here changes once a `GridConfig` has been built.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A slot variable: a run of cells that will be filled with one word. Two slots are the same
/// variable iff all four fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub start_row: usize,
    pub start_col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    pub fn new(start_row: usize, start_col: usize, direction: Direction, length: usize) -> Slot {
        Slot { start_row, start_col, direction, length }
    }

    /// The coords of the `cell_idx`th cell of this slot.
    pub fn cell_coord(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.start_row, self.start_col + cell_idx),
            Direction::Down => (self.start_row + cell_idx, self.start_col),
        }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| self.cell_coord(cell_idx))
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        write!(f, "({}, {}) {} {}", self.start_row, self.start_col, direction, self.length)
    }
}

/// A struct representing a slot along with the derived information about the slots it crosses.
#[derive(Debug)]
pub struct SlotConfig {
    pub id: SlotId,
    pub slot: Slot,
    pub neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]>,
}

/// Problems with the shape of a puzzle. These are only produced while building a `GridConfig`;
/// once one exists, the solver can assume it's well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    EmptyTemplate,
    DimensionMismatch { width: usize, height: usize },
    EmptySlot(Slot),
    SlotOutOfBounds(Slot),
    SlotCoversBlock(Slot),
    DuplicateSlot(Slot),
    OverlappingSlots(Slot, Slot),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::EmptyTemplate => write!(f, "grid template has no rows"),
            GridError::DimensionMismatch { width, height } => {
                write!(f, "grid structure doesn't match declared size {}x{}", width, height)
            }
            GridError::EmptySlot(slot) => write!(f, "slot {} has no cells", slot),
            GridError::SlotOutOfBounds(slot) => write!(f, "slot {} extends past the grid", slot),
            GridError::SlotCoversBlock(slot) => write!(f, "slot {} covers a blocked cell", slot),
            GridError::DuplicateSlot(slot) => write!(f, "slot {} appears more than once", slot),
            GridError::OverlappingSlots(a, b) => {
                write!(f, "slots {} and {} can't share cells that way", a, b)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// A struct representing the aspects of a grid that are static during filling.
pub struct GridConfig {
    pub width: usize,
    pub height: usize,

    /// `structure[row][col]` is true iff the cell can hold a letter.
    pub structure: Vec<Vec<bool>>,

    pub slot_configs: Vec<SlotConfig>,

    /// Overlaps keyed by `(lower slot id, higher slot id)`, with the value giving the cell index
    /// within each slot in the same order. Each crossing is stored exactly once; `overlap` swaps
    /// the indices when asked about the reversed pair.
    overlaps: HashMap<(SlotId, SlotId), (usize, usize)>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("overlaps", &(["(", &self.overlaps.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl GridConfig {
    /// Build a GridConfig from explicit slots, deriving the overlap map and neighbor sets from the
    /// cells the slots cover.
    pub fn new(
        width: usize,
        height: usize,
        structure: Vec<Vec<bool>>,
        slots: Vec<Slot>,
    ) -> Result<GridConfig, GridError> {
        if structure.len() != height || structure.iter().any(|row| row.len() != width) {
            return Err(GridError::DimensionMismatch { width, height });
        }

        // Map each cell to the (slot id, cell index) pairs covering it; crossings fall out of the
        // cells with two entries.
        let mut cell_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();

        for (slot_id, slot) in slots.iter().enumerate() {
            if slot.length == 0 {
                return Err(GridError::EmptySlot(slot.clone()));
            }
            if slots[..slot_id].contains(slot) {
                return Err(GridError::DuplicateSlot(slot.clone()));
            }

            for (cell_idx, (row, col)) in slot.cell_coords().enumerate() {
                if row >= height || col >= width {
                    return Err(GridError::SlotOutOfBounds(slot.clone()));
                }
                if !structure[row][col] {
                    return Err(GridError::SlotCoversBlock(slot.clone()));
                }
                cell_by_loc.entry((row, col)).or_default().push((slot_id, cell_idx));
            }
        }

        let mut overlaps: HashMap<(SlotId, SlotId), (usize, usize)> = HashMap::new();
        let mut neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>> =
            slots.iter().map(|_| SmallVec::new()).collect();

        for entries in cell_by_loc.values() {
            let (first, second) = match entries.as_slice() {
                [_] => continue,
                [first, second] => (*first, *second),
                _ => {
                    return Err(GridError::OverlappingSlots(
                        slots[entries[0].0].clone(),
                        slots[entries[2].0].clone(),
                    ))
                }
            };

            let ((x, x_cell), (y, y_cell)) =
                if first.0 < second.0 { (first, second) } else { (second, first) };

            // Two slots may only meet in one cell, and only at right angles.
            if slots[x].direction == slots[y].direction || overlaps.contains_key(&(x, y)) {
                return Err(GridError::OverlappingSlots(slots[x].clone(), slots[y].clone()));
            }

            overlaps.insert((x, y), (x_cell, y_cell));
            neighbors[x].push(y);
            neighbors[y].push(x);
        }

        for slot_neighbors in &mut neighbors {
            slot_neighbors.sort_unstable();
        }

        let slot_configs = slots
            .into_iter()
            .zip(neighbors)
            .enumerate()
            .map(|(id, (slot, neighbors))| SlotConfig { id, slot, neighbors })
            .collect();

        Ok(GridConfig { width, height, structure, slot_configs, overlaps })
    }

    /// Generate a GridConfig from a string template, with `_` or `.` representing fillable cells
    /// and anything else (conventionally `#`) representing blocks. Each line is one row, so a
    /// blank line in the middle is a row of blocks; only blank lines before the first row and
    /// after the last one are skipped. Every maximal run of two or more fillable cells becomes a
    /// slot: across slots first, row by row, then down slots.
    pub fn from_template(template: &str) -> Result<GridConfig, GridError> {
        let lines: Vec<&str> = template.lines().map(|line| line.trim_end()).collect();
        let first_row =
            lines.iter().position(|line| !line.is_empty()).ok_or(GridError::EmptyTemplate)?;
        let last_row = lines.iter().rposition(|line| !line.is_empty()).unwrap_or(first_row);

        let rows: Vec<Vec<bool>> = lines[first_row..=last_row]
            .iter()
            .map(|line| line.chars().map(|c| c == '_' || c == '.').collect())
            .collect();

        let height = rows.len();
        let width = rows.iter().map(|row| row.len()).max().ok_or(GridError::EmptyTemplate)?;

        let structure: Vec<Vec<bool>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, false);
                row
            })
            .collect();

        fn build_slots(
            line_count: usize,
            line_length: usize,
            is_fillable: impl Fn(usize, usize) -> bool,
            make_slot: impl Fn(usize, usize, usize) -> Slot,
        ) -> Vec<Slot> {
            let mut result = vec![];

            for line in 0..line_count {
                let mut run_start = 0;
                for pos in 0..=line_length {
                    if pos < line_length && is_fillable(line, pos) {
                        continue;
                    }
                    if pos - run_start > 1 {
                        result.push(make_slot(line, run_start, pos - run_start));
                    }
                    run_start = pos + 1;
                }
            }

            result
        }

        let mut slots = build_slots(
            height,
            width,
            |row, col| structure[row][col],
            |row, col, length| Slot::new(row, col, Direction::Across, length),
        );
        slots.extend(build_slots(
            width,
            height,
            |col, row| structure[row][col],
            |col, row, length| Slot::new(row, col, Direction::Down, length),
        ));

        GridConfig::new(width, height, structure, slots)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slot_configs[slot_id].slot
    }

    /// Find the id of a slot by value.
    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.slot_configs.iter().position(|slot_config| &slot_config.slot == slot)
    }

    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.slot_configs[slot_id].neighbors
    }

    /// If `x` and `y` cross, return `(index in x, index in y)` of the shared cell.
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        if x < y {
            self.overlaps.get(&(x, y)).copied()
        } else {
            self.overlaps.get(&(y, x)).map(|&(y_cell, x_cell)| (x_cell, y_cell))
        }
    }

    pub fn is_fillable(&self, row: usize, col: usize) -> bool {
        self.structure.get(row).and_then(|cells| cells.get(col)).copied().unwrap_or(false)
    }
}
