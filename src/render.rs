use crate::backtracking_search::Assignment;
use crate::grid_config::GridConfig;
use crate::word_list::WordList;

/// Character used for blocked cells.
pub const BLOCK: char = '█';

/// Turn the given grid config and assignment into a rendered string, one line per row. Fillable
/// cells that no assigned word covers are left blank.
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let mut grid: Vec<Vec<char>> = config
        .structure
        .iter()
        .map(|row| row.iter().map(|&fillable| if fillable { ' ' } else { BLOCK }).collect())
        .collect();

    for (slot_id, word_id) in assignment.iter() {
        let slot = config.slot(slot_id);
        for (cell_idx, &glyph) in word_list.word(word_id).glyphs.iter().enumerate() {
            let (row, col) = slot.cell_coord(cell_idx);
            if let Some(cell) = grid.get_mut(row).and_then(|cells| cells.get_mut(col)) {
                *cell = glyph;
            }
        }
    }

    grid.into_iter().map(|row| row.into_iter().collect::<String>()).collect::<Vec<_>>().join("\n")
}
