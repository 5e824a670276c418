//! Plain-text map layouts.
//!
//! One character per tile, one line per row:
//!
//! | char | tile |
//! |---|---|
//! | `.` | grass |
//! | `~` | water |
//! | `f` | water with a fishing spot |
//! | `^` | mountain |
//! | `T` | forest |
//! | `M` | metal deposit |
//! | `O` | oil deposit |
//! | `1`-`8` | grass; origin of that player's completed city center |
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fmt;

use crate::game::{
    BuildingKind, Coord, GameState, Map, Mobility, Player, PlayerId, Tile, UnitKind, is_passable,
};

/// Citizens each player starts with.
pub const STARTING_CITIZENS: usize = 2;

/// Forest density written for `T` tiles.
const LAYOUT_FOREST_DENSITY: u8 = 80;

/// Two-player 40x28 map used when no layout file is given.
pub const DEFAULT_LAYOUT: &str = "\
........................................
..........TTTT..........................
..........TTTT..........................
.....................................O..
....1...................................
........................................
...........MM...........................
........................................
..............................^.........
..............................^^........
TTT.....................................
TTT...............~~~~..................
TTT.............TT~~~~..................
TTT.............TT~f~~...............TTT
TTT...............~~f~TT.............TTT
..................~~~~TT.............TTT
..................~~~~...............TTT
.....................................TTT
........^^..............................
.........^..............................
........................................
...........................MM....2......
........................................
........................................
..O.....................................
..........................TTTT..........
..........................TTTT..........
........................................
";

/// Error type for layout parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// No tile rows.
    Empty,
    /// More rows or columns than a map can hold.
    TooLarge,
    /// A row's width differs from the first row's.
    Ragged {
        /// 1-based line number.
        line: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },
    /// A character outside the legend.
    UnknownTile {
        /// 1-based line number.
        line: usize,
        /// 1-based column.
        column: usize,
        /// The character.
        ch: char,
    },
    /// The same player digit appears twice.
    DuplicatePlayer(PlayerId),
    /// No player digit at all.
    NoPlayers,
    /// A city center footprint leaves the map or covers a non-grass tile.
    CityCenterBlocked {
        /// Player whose city center does not fit.
        player: PlayerId,
        /// Its origin.
        coord: Coord,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Layout has no rows"),
            Self::TooLarge => write!(f, "Layout exceeds {} tiles per side", u16::MAX),
            Self::Ragged {
                line,
                expected,
                found,
            } => write!(f, "Line {line} has {found} tiles, expected {expected}"),
            Self::UnknownTile { line, column, ch } => {
                write!(f, "Unknown tile '{ch}' at line {line}, column {column}")
            }
            Self::DuplicatePlayer(id) => write!(f, "Player {id} appears more than once"),
            Self::NoPlayers => write!(f, "Layout places no players"),
            Self::CityCenterBlocked { player, coord } => {
                write!(f, "City center of player {player} does not fit at {coord}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

fn tile_for(ch: char) -> Option<Tile> {
    match ch {
        '.' | '1'..='8' => Some(Tile::grass()),
        '~' => Some(Tile::water()),
        'f' => Some(Tile::fishing_water()),
        '^' => Some(Tile::mountain()),
        'T' => Some(Tile::forest(LAYOUT_FOREST_DENSITY)),
        'M' => Some(Tile::metal()),
        'O' => Some(Tile::oil()),
        _ => None,
    }
}

/// Build a ready-to-play game from a text layout.
///
/// Every digit becomes a scripted player with a completed city center at
/// that tile and [`STARTING_CITIZENS`] idle citizens beside it.
///
/// # Errors
///
/// Returns a [`LayoutError`] describing the first problem found.
pub fn parse_layout(text: &str, seed: u64) -> Result<GameState, LayoutError> {
    let rows: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();
    let Some(&(_, first)) = rows.first() else {
        return Err(LayoutError::Empty);
    };
    let width = first.chars().count();
    let w = u16::try_from(width).map_err(|_| LayoutError::TooLarge)?;
    let h = u16::try_from(rows.len()).map_err(|_| LayoutError::TooLarge)?;
    let mut map = Map::new(w, h).ok_or(LayoutError::Empty)?;

    let mut origins: Vec<(PlayerId, Coord)> = Vec::new();
    for (y, &(line, row)) in (0u16..).zip(&rows) {
        let found = row.chars().count();
        if found != width {
            return Err(LayoutError::Ragged {
                line,
                expected: width,
                found,
            });
        }
        for (x, ch) in (0u16..).zip(row.chars()) {
            let tile = tile_for(ch).ok_or(LayoutError::UnknownTile {
                line,
                column: usize::from(x) + 1,
                ch,
            })?;
            let coord = Coord::new(x, y);
            map.set(coord, tile);
            if let Some(digit) = ch.to_digit(10) {
                let player = u8::try_from(digit).map_err(|_| LayoutError::TooLarge)?;
                if origins.iter().any(|(p, _)| *p == player) {
                    return Err(LayoutError::DuplicatePlayer(player));
                }
                origins.push((player, coord));
            }
        }
    }
    if origins.is_empty() {
        return Err(LayoutError::NoPlayers);
    }
    origins.sort_unstable();

    for &(player, coord) in &origins {
        let fits = map.footprint_fits(coord, BuildingKind::CityCenter)
            && map
                .footprint(coord, BuildingKind::CityCenter)
                .all(|c| map.build_blocker(c).is_none());
        let id = fits
            .then(|| map.place_building(coord, BuildingKind::CityCenter, player))
            .flatten()
            .ok_or(LayoutError::CityCenterBlocked { player, coord })?;
        if let Some(building) = map.building_mut(id) {
            building.progress = 100.0;
        }
    }

    let players = origins
        .iter()
        .map(|&(id, _)| Player::scripted(id, format!("Player {id}")))
        .collect();
    let mut state = GameState::with_seed(map, players, seed);
    for &(player, origin) in &origins {
        let spots: Vec<Coord> = state
            .map
            .surrounding(origin, BuildingKind::CityCenter)
            .into_iter()
            .filter(|&c| is_passable(&state.map, c, Mobility::Land))
            .take(STARTING_CITIZENS)
            .collect();
        for spot in spots {
            state.spawn_unit(UnitKind::Citizen, player, spot.center());
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Terrain;

    #[test]
    fn test_default_layout_parses() {
        let state = parse_layout(DEFAULT_LAYOUT, 1).unwrap();
        assert_eq!(state.map.width(), 40);
        assert_eq!(state.map.height(), 28);
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.units.len(), 2 * STARTING_CITIZENS);
        assert_eq!(state.player(1).unwrap().population, 2);
        let (_, center) = state.map.building_at(Coord::new(5, 5)).unwrap();
        assert_eq!(center.kind, BuildingKind::CityCenter);
        assert!(center.is_complete());
        assert_eq!(state.map.get(Coord::new(8, 8)).unwrap().owner, Some(1));
    }

    #[test]
    fn test_legend() {
        let state = parse_layout("1..~f\n...^T\n...MO\n", 1).unwrap();
        let at = |x, y| state.map.get(Coord::new(x, y)).unwrap();
        assert_eq!(at(3, 0).terrain, Terrain::Water);
        assert!(at(4, 0).has_fishing_spot);
        assert_eq!(at(3, 1).terrain, Terrain::Mountain);
        assert_eq!(at(4, 1).terrain, Terrain::Forest);
        assert!(at(3, 2).has_metal);
        assert!(at(4, 2).has_oil);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let state = parse_layout("# test map\n\n1...\n....\n....\n", 1).unwrap();
        assert_eq!(state.map.height(), 3);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = parse_layout("1...\n...\n....\n", 1).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Ragged {
                line: 2,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_unknown_tile_rejected() {
        let err = parse_layout("1..x\n....\n....\n", 1).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownTile {
                line: 1,
                column: 4,
                ch: 'x'
            }
        );
    }

    #[test]
    fn test_player_errors() {
        assert_eq!(parse_layout("....\n", 1).unwrap_err(), LayoutError::NoPlayers);
        assert_eq!(parse_layout("", 1).unwrap_err(), LayoutError::Empty);
        assert_eq!(
            parse_layout("1..1\n....\n....\n", 1).unwrap_err(),
            LayoutError::DuplicatePlayer(1)
        );
        assert!(matches!(
            parse_layout("..1\n...\n", 1).unwrap_err(),
            LayoutError::CityCenterBlocked { player: 1, .. }
        ));
    }
}
