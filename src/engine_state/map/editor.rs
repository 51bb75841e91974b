//! # Map Editor
//!
//! Turns a picked grid cell plus the current [`SelectionMode`] into a [`TileMap`]
//! mutation, then asks the [`RebuildSink`] to regenerate every visual from scratch.
//!
//! Every operation either applies a mutation or does nothing. "Nothing to do" (an
//! empty pick, an occupied cell when placing, an empty cell when decorating) is
//! the normal outcome of most pointer events and is never reported as an error.

use std::fmt;

use super::{Tile, TileCoord, TileMap};

/// Receives the full tile snapshot after every committed mutation.
///
/// Implementors drop all visuals they built previously and create one per tile.
pub trait RebuildSink {
    /// Regenerates all visuals from `tiles`.
    fn rebuild(&mut self, tiles: &[Tile]);
}

/// Which part of a cell the next add/remove acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Place or delete whole columns
    #[default]
    Tile,
    /// Decorate or strip the bush on existing columns
    Bush,
}

impl SelectionMode {
    /// Resolves a mode-select command (`"1"` or `"2"`). Other keys are not mode commands.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "1" => Some(SelectionMode::Tile),
            "2" => Some(SelectionMode::Bush),
            _ => None,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Tile => write!(f, "tile"),
            SelectionMode::Bush => write!(f, "bush"),
        }
    }
}

/// Result of an editor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The map changed and the visuals were rebuilt
    Applied,
    /// Nothing changed
    NoOp,
}

impl EditOutcome {
    /// Whether the operation changed the map.
    pub fn is_applied(self) -> bool {
        self == EditOutcome::Applied
    }
}

/// Owns the tile map of an editing session and mediates every change to it.
pub struct MapEditor<R: RebuildSink> {
    map: TileMap,
    mode: SelectionMode,
    rebuild_sink: R,
}

impl<R: RebuildSink> MapEditor<R> {
    /// Starts a session on `map` in [`SelectionMode::Tile`] and builds the initial visuals.
    pub fn new(map: TileMap, rebuild_sink: R) -> Self {
        let mut editor = Self {
            map,
            mode: SelectionMode::default(),
            rebuild_sink,
        };
        editor.rebuild();
        editor
    }

    /// The current selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switches the selection mode. Touches nothing else.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if self.mode != mode {
            log::debug!("Selection mode: {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Read-only access to the edited map.
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// The collaborator that receives rebuilds.
    pub fn rebuild_sink(&self) -> &R {
        &self.rebuild_sink
    }

    /// Mutable access to the rebuild collaborator, e.g. to refresh its hover state.
    pub fn rebuild_sink_mut(&mut self) -> &mut R {
        &mut self.rebuild_sink
    }

    /// Replaces the whole map, typically with freshly imported data, and rebuilds.
    pub fn replace_map(&mut self, map: TileMap) {
        log::info!("Loaded map with {} tiles", map.len());
        self.map = map;
        self.rebuild();
    }

    /// Places a tile (tile mode) or a bush (bush mode) at `pick`.
    ///
    /// Placing never overwrites an existing tile and a bush needs a tile to sit on.
    pub fn add_at(&mut self, pick: Option<TileCoord>) -> EditOutcome {
        let Some(coord) = pick else {
            return EditOutcome::NoOp;
        };

        let outcome = match self.mode {
            SelectionMode::Tile => {
                if self.map.contains(coord.x, coord.y) {
                    EditOutcome::NoOp
                } else {
                    self.map.insert(Tile::new(coord));
                    EditOutcome::Applied
                }
            }
            SelectionMode::Bush => self.set_bush(coord, true),
        };

        self.commit(outcome)
    }

    /// Deletes the tile (tile mode, its bush goes with it) or strips its bush
    /// (bush mode, the column stays) at `pick`.
    pub fn remove_at(&mut self, pick: Option<TileCoord>) -> EditOutcome {
        let Some(coord) = pick else {
            return EditOutcome::NoOp;
        };

        let outcome = match self.mode {
            SelectionMode::Tile => match self.map.remove_at(coord.x, coord.y) {
                Some(_) => EditOutcome::Applied,
                None => EditOutcome::NoOp,
            },
            SelectionMode::Bush => self.set_bush(coord, false),
        };

        self.commit(outcome)
    }

    fn set_bush(&mut self, coord: TileCoord, has_bush: bool) -> EditOutcome {
        match self.map.find_at_mut(coord.x, coord.y) {
            Some(tile) if tile.has_bush != has_bush => {
                tile.has_bush = has_bush;
                EditOutcome::Applied
            }
            _ => EditOutcome::NoOp,
        }
    }

    fn commit(&mut self, outcome: EditOutcome) -> EditOutcome {
        if outcome.is_applied() {
            self.rebuild();
        }
        outcome
    }

    fn rebuild(&mut self) {
        self.rebuild_sink.rebuild(self.map.all());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        rebuilds: usize,
        last_snapshot: Vec<Tile>,
    }

    impl RebuildSink for RecordingSink {
        fn rebuild(&mut self, tiles: &[Tile]) {
            self.rebuilds += 1;
            self.last_snapshot = tiles.to_vec();
        }
    }

    fn editor() -> MapEditor<RecordingSink> {
        MapEditor::new(TileMap::new(), RecordingSink::default())
    }

    fn at(x: i32, y: i32) -> Option<TileCoord> {
        Some(TileCoord::new(x, y))
    }

    #[test]
    fn construction_builds_the_initial_visuals_in_tile_mode() {
        let editor = editor();

        assert_eq!(editor.mode(), SelectionMode::Tile);
        assert_eq!(editor.rebuild_sink().rebuilds, 1);
    }

    #[test]
    fn adding_a_tile_uses_default_height_and_no_bush() {
        let mut editor = editor();

        assert_eq!(editor.add_at(at(7, -4)), EditOutcome::Applied);

        let tile = editor.map().find_at(7, -4).unwrap();
        assert_eq!(tile.height, 1.0);
        assert!(!tile.has_bush);
    }

    #[test]
    fn adding_twice_keeps_a_single_tile() {
        let mut editor = editor();

        editor.add_at(at(0, 0));
        editor.add_at(at(1, 0));
        assert_eq!(editor.add_at(at(0, 0)), EditOutcome::NoOp);

        assert_eq!(editor.map().len(), 2);
    }

    #[test]
    fn removing_an_empty_cell_in_tile_mode_is_a_no_op() {
        let mut editor = editor();
        editor.add_at(at(3, 3));
        let before = editor.map().clone();

        assert_eq!(editor.remove_at(at(9, 9)), EditOutcome::NoOp);
        assert_eq!(editor.map(), &before);
    }

    #[test]
    fn remove_directly_after_add_restores_the_map() {
        let mut editor = editor();
        editor.add_at(at(0, 0));
        editor.add_at(at(0, 1));
        let before = editor.map().clone();

        editor.add_at(at(5, 5));
        editor.remove_at(at(5, 5));

        assert_eq!(editor.map(), &before);
    }

    #[test]
    fn bush_mode_cannot_decorate_empty_cells() {
        let mut editor = editor();
        editor.set_mode(SelectionMode::Bush);

        assert_eq!(editor.add_at(at(1, 1)), EditOutcome::NoOp);
        assert!(editor.map().is_empty());
    }

    #[test]
    fn bush_removal_keeps_the_column() {
        let mut editor = editor();
        editor.add_at(at(1, 1));
        editor.set_mode(SelectionMode::Bush);

        editor.add_at(at(1, 1));
        assert!(editor.map().find_at(1, 1).unwrap().has_bush);

        assert_eq!(editor.remove_at(at(1, 1)), EditOutcome::Applied);
        let tile = editor.map().find_at(1, 1).unwrap();
        assert!(!tile.has_bush);
        assert_eq!(editor.map().len(), 1);
    }

    #[test]
    fn removing_a_tile_takes_its_bush_with_it() {
        let mut editor = editor();
        editor.add_at(at(2, 2));
        editor.set_mode(SelectionMode::Bush);
        editor.add_at(at(2, 2));
        editor.set_mode(SelectionMode::Tile);

        editor.remove_at(at(2, 2));
        editor.add_at(at(2, 2));

        assert!(!editor.map().find_at(2, 2).unwrap().has_bush);
    }

    #[test]
    fn full_editing_scenario() {
        let mut editor = editor();

        editor.set_mode(SelectionMode::Tile);
        editor.add_at(at(2, 3));
        assert_eq!(
            editor.map().all(),
            &[Tile {
                x: 2,
                y: 3,
                height: 1.0,
                has_bush: false
            }]
        );

        editor.set_mode(SelectionMode::Bush);
        editor.add_at(at(2, 3));
        assert!(editor.map().find_at(2, 3).unwrap().has_bush);

        editor.remove_at(at(2, 3));
        assert!(!editor.map().find_at(2, 3).unwrap().has_bush);

        editor.set_mode(SelectionMode::Tile);
        editor.remove_at(at(2, 3));
        assert!(editor.map().is_empty());
    }

    #[test]
    fn empty_picks_never_touch_the_map() {
        let mut editor = editor();
        editor.add_at(at(0, 0));
        let before = editor.map().clone();

        for mode in [SelectionMode::Tile, SelectionMode::Bush] {
            editor.set_mode(mode);
            assert_eq!(editor.add_at(None), EditOutcome::NoOp);
            assert_eq!(editor.remove_at(None), EditOutcome::NoOp);
        }

        assert_eq!(editor.map(), &before);
    }

    #[test]
    fn rebuilds_only_follow_applied_mutations() {
        let mut editor = editor();

        editor.add_at(at(0, 0));
        editor.add_at(at(0, 0));
        editor.remove_at(at(4, 4));
        editor.set_mode(SelectionMode::Bush);
        editor.add_at(at(0, 0));
        editor.add_at(at(0, 0));
        editor.add_at(None);

        // construction, first tile, first bush
        assert_eq!(editor.rebuild_sink().rebuilds, 3);
        assert_eq!(editor.rebuild_sink().last_snapshot.len(), 1);
        assert!(editor.rebuild_sink().last_snapshot[0].has_bush);
    }

    #[test]
    fn replacing_the_map_rebuilds() {
        let mut editor = editor();
        let map = TileMap::from_json(r#"[{"x": 1, "y": 1, "height": 2}]"#).unwrap();

        editor.replace_map(map);

        assert_eq!(editor.rebuild_sink().rebuilds, 2);
        assert_eq!(editor.rebuild_sink().last_snapshot.len(), 1);
    }

    #[test]
    fn bush_removal_on_an_empty_cell_is_a_no_op() {
        let mut editor = editor();
        editor.add_at(at(0, 0));
        editor.set_mode(SelectionMode::Bush);
        let before = editor.map().clone();
        let rebuilds = editor.rebuild_sink().rebuilds;

        assert_eq!(editor.remove_at(at(3, 3)), EditOutcome::NoOp);

        assert_eq!(editor.map(), &before);
        assert!(!editor.map().contains(3, 3));
        assert_eq!(editor.rebuild_sink().rebuilds, rebuilds);
    }

    #[test]
    fn bush_removal_on_a_bare_tile_is_a_no_op() {
        let mut editor = editor();
        editor.add_at(at(2, 2));
        editor.set_mode(SelectionMode::Bush);
        let before = editor.map().clone();
        let rebuilds = editor.rebuild_sink().rebuilds;

        assert_eq!(editor.remove_at(at(2, 2)), EditOutcome::NoOp);

        assert_eq!(editor.map(), &before);
        assert_eq!(editor.rebuild_sink().rebuilds, rebuilds);
    }

    #[test]
    fn mode_commands_map_one_and_two() {
        assert_eq!(SelectionMode::from_key("1"), Some(SelectionMode::Tile));
        assert_eq!(SelectionMode::from_key("2"), Some(SelectionMode::Bush));
        assert_eq!(SelectionMode::from_key("3"), None);
    }
}
