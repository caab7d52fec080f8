// ============================================================================
// BACKGROUND GENERATORS — procedural viewport-sized patterns
// ============================================================================

use rand::Rng;
use rand::seq::SliceRandom;

use crate::canvas::DenseGrid;
use crate::components::colors::{Color, PALETTE, RAINBOW_PALETTE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Generator {
    HorizontalRainbow,
    VerticalRainbow,
    HorizontalBands,
    VerticalBands,
    Checkerboard,
    Border,
    RandomRects,
    Tetris,
}

impl Generator {
    pub fn all() -> &'static [Generator] {
        &[
            Generator::HorizontalRainbow,
            Generator::VerticalRainbow,
            Generator::HorizontalBands,
            Generator::VerticalBands,
            Generator::Checkerboard,
            Generator::Border,
            Generator::RandomRects,
            Generator::Tetris,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Generator::HorizontalRainbow => "Horizontal Rainbow",
            Generator::VerticalRainbow => "Vertical Rainbow",
            Generator::HorizontalBands => "Horizontal Bands",
            Generator::VerticalBands => "Vertical Bands",
            Generator::Checkerboard => "Checkerboard",
            Generator::Border => "Border",
            Generator::RandomRects => "Random Rectangles",
            Generator::Tetris => "Tetris",
        }
    }

    /// Uniform choice over every generator.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Generator {
        let all = Self::all();
        all[rng.gen_range(0..all.len())]
    }
}

/// Fill a `width × height` grid with the given pattern. The grid starts as
/// the default color; every generator then covers every cell.
pub fn generate<R: Rng + ?Sized>(kind: Generator, width: u32, height: u32, rng: &mut R) -> DenseGrid {
    let mut grid = DenseGrid::new_filled(width, height, Color::DEFAULT);
    if width == 0 || height == 0 {
        return grid;
    }
    match kind {
        Generator::HorizontalRainbow => horizontal_rainbow(&mut grid),
        Generator::VerticalRainbow => vertical_rainbow(&mut grid),
        Generator::HorizontalBands => horizontal_bands(&mut grid, rng),
        Generator::VerticalBands => vertical_bands(&mut grid, rng),
        Generator::Checkerboard => checkerboard(&mut grid, rng),
        Generator::Border => border(&mut grid, rng),
        Generator::RandomRects => random_rects(&mut grid, rng),
        Generator::Tetris => {
            for tile in tetris_tiles(width, height, rng) {
                for &(x, y) in &tile.cells {
                    grid.set(x, y, tile.color);
                }
            }
        }
    }
    grid
}

/// Pick a generator at random and run it.
pub fn random_pattern<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> (Generator, DenseGrid) {
    let kind = Generator::choose(rng);
    (kind, generate(kind, width, height, rng))
}

fn pick<R: Rng + ?Sized>(rng: &mut R, colors: &[Color]) -> Color {
    colors.choose(rng).copied().unwrap_or(Color::DEFAULT)
}

/// Two distinct palette colors.
fn pick_pair<R: Rng + ?Sized>(rng: &mut R) -> (Color, Color) {
    let first = pick(rng, &PALETTE);
    let mut second = pick(rng, &PALETTE);
    while second == first {
        second = pick(rng, &PALETTE);
    }
    (first, second)
}

// ============================================================================
// FIXED PATTERNS
// ============================================================================

fn rainbow_at(pos: u32, len: u32) -> Color {
    let idx = (pos as usize * RAINBOW_PALETTE.len()) / len as usize;
    RAINBOW_PALETTE[idx.min(RAINBOW_PALETTE.len() - 1)]
}

fn horizontal_rainbow(grid: &mut DenseGrid) {
    let (w, h) = (grid.width(), grid.height());
    for x in 0..w {
        let color = rainbow_at(x, w);
        for y in 0..h {
            grid.set(x, y, color);
        }
    }
}

fn vertical_rainbow(grid: &mut DenseGrid) {
    let (w, h) = (grid.width(), grid.height());
    for y in 0..h {
        let color = rainbow_at(y, h);
        for x in 0..w {
            grid.set(x, y, color);
        }
    }
}

// ============================================================================
// RANDOMIZED PATTERNS
// ============================================================================

/// Random extent in `1..=span/bands` cells.
fn band_extent<R: Rng + ?Sized>(rng: &mut R, span: u32, bands: u32) -> u32 {
    (rng.r#gen::<f64>() * (span as f64 / bands as f64)).floor() as u32 + 1
}

fn horizontal_bands<R: Rng + ?Sized>(grid: &mut DenseGrid, rng: &mut R) {
    let (w, h) = (grid.width(), grid.height());
    let bands = rng.gen_range(2..=6);
    let mut y = 0;
    while y < h {
        let band = band_extent(rng, h, bands);
        let color = pick(rng, &PALETTE);
        for row in y..(y + band).min(h) {
            for x in 0..w {
                grid.set(x, row, color);
            }
        }
        y += band;
    }
}

fn vertical_bands<R: Rng + ?Sized>(grid: &mut DenseGrid, rng: &mut R) {
    let (w, h) = (grid.width(), grid.height());
    let bands = rng.gen_range(2..=6);
    let mut x = 0;
    while x < w {
        let band = band_extent(rng, w, bands);
        let color = pick(rng, &PALETTE);
        for col in x..(x + band).min(w) {
            for y in 0..h {
                grid.set(col, y, color);
            }
        }
        x += band;
    }
}

fn checkerboard<R: Rng + ?Sized>(grid: &mut DenseGrid, rng: &mut R) {
    let (a, b) = pick_pair(rng);
    let tile = rng.gen_range(1..=4);
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let color = if (x / tile + y / tile) % 2 == 0 { a } else { b };
            grid.set(x, y, color);
        }
    }
}

fn border<R: Rng + ?Sized>(grid: &mut DenseGrid, rng: &mut R) {
    let (border_color, fill_color) = pick_pair(rng);
    let thickness = rng.gen_range(1..=3);
    let (w, h) = (grid.width(), grid.height());
    for y in 0..h {
        for x in 0..w {
            let edge = x < thickness
                || x + thickness >= w
                || y < thickness
                || y + thickness >= h;
            grid.set(x, y, if edge { border_color } else { fill_color });
        }
    }
}

fn random_rects<R: Rng + ?Sized>(grid: &mut DenseGrid, rng: &mut R) {
    let (w, h) = (grid.width(), grid.height());
    let mut base = pick(rng, &PALETTE);
    if base.is_default() {
        base = PALETTE[0];
    }
    grid.fill(base);

    let shapes = (rng.r#gen::<f64>() * (w as f64 / 2.0)).floor() + w as f64 / 4.0;
    let mut i = 0.0;
    while i < shapes {
        i += 1.0;
        let color = pick(rng, &PALETTE);
        if color == base {
            continue;
        }
        let start_x = rng.gen_range(0..w);
        let start_y = rng.gen_range(0..h);
        let shape_w = (rng.r#gen::<f64>() * (w as f64 / 3.0)).floor() as u32 + 2;
        let shape_h = (rng.r#gen::<f64>() * (h as f64 / 3.0)).floor() as u32 + 2;
        for y in start_y..(start_y + shape_h).min(h) {
            for x in start_x..(start_x + shape_w).min(w) {
                grid.set(x, y, color);
            }
        }
    }
}

// ============================================================================
// TETRIS TILING
// ============================================================================

/// The 19 fixed tetromino orientations, as cell offsets inside a 4×4 box.
const TETROMINOES: [[(i32, i32); 4]; 19] = [
    // I
    [(0, 0), (1, 0), (2, 0), (3, 0)],
    [(0, 0), (0, 1), (0, 2), (0, 3)],
    // O
    [(0, 0), (1, 0), (0, 1), (1, 1)],
    // T
    [(1, 0), (0, 1), (1, 1), (2, 1)],
    [(0, 0), (1, 0), (2, 0), (1, 1)],
    [(1, 0), (0, 1), (1, 1), (1, 2)],
    [(0, 0), (0, 1), (1, 1), (0, 2)],
    // S
    [(1, 0), (2, 0), (0, 1), (1, 1)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
    // Z
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(1, 0), (0, 1), (1, 1), (0, 2)],
    // J
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(0, 0), (1, 0), (0, 1), (0, 2)],
    [(0, 0), (1, 0), (2, 0), (2, 1)],
    [(1, 0), (1, 1), (0, 2), (1, 2)],
    // L
    [(2, 0), (0, 1), (1, 1), (2, 1)],
    [(0, 0), (0, 1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (2, 0), (0, 1)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
];

/// Offsets relative to the shape's first cell in row-major order, so the
/// shape can be anchored at the first empty cell of a row-major scan.
fn anchored(shape: &[(i32, i32); 4]) -> [(i32, i32); 4] {
    let anchor = shape
        .iter()
        .copied()
        .min_by_key(|&(x, y)| (y, x))
        .unwrap_or((0, 0));
    shape.map(|(x, y)| (x - anchor.0, y - anchor.1))
}

/// One placed piece: a tetromino or a single filler cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub cells: Vec<(u32, u32)>,
    pub color: Color,
}

/// Tile the grid with tetrominoes, falling back to single cells where no
/// orientation fits. Each tile takes a color not used by any orthogonally
/// adjacent tile placed before it.
pub fn tetris_tiles<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Vec<Tile> {
    let (w, h) = (width as usize, height as usize);
    let mut owner: Vec<Option<usize>> = vec![None; w * h];
    let mut tiles: Vec<Tile> = Vec::new();
    let shapes: Vec<[(i32, i32); 4]> = TETROMINOES.iter().map(anchored).collect();
    let mut order: Vec<usize> = (0..shapes.len()).collect();

    for y in 0..h {
        for x in 0..w {
            if owner[y * w + x].is_some() {
                continue;
            }

            order.shuffle(rng);
            let fit = order.iter().find_map(|&i| {
                let cells: Option<Vec<(u32, u32)>> = shapes[i]
                    .iter()
                    .map(|&(dx, dy)| {
                        let cx = x as i64 + dx as i64;
                        let cy = y as i64 + dy as i64;
                        let free = cx >= 0
                            && cy >= 0
                            && (cx as usize) < w
                            && (cy as usize) < h
                            && owner[cy as usize * w + cx as usize].is_none();
                        free.then_some((cx as u32, cy as u32))
                    })
                    .collect();
                cells
            });
            let cells = fit.unwrap_or_else(|| vec![(x as u32, y as u32)]);

            let id = tiles.len();
            for &(cx, cy) in &cells {
                owner[cy as usize * w + cx as usize] = Some(id);
            }

            let mut used: Vec<Color> = Vec::new();
            for &(cx, cy) in &cells {
                let (cx, cy) = (cx as i64, cy as i64);
                for (nx, ny) in [(cx, cy - 1), (cx, cy + 1), (cx - 1, cy), (cx + 1, cy)] {
                    if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                        continue;
                    }
                    if let Some(other) = owner[ny as usize * w + nx as usize]
                        && other != id
                        && !used.contains(&tiles[other].color)
                    {
                        used.push(tiles[other].color);
                    }
                }
            }
            let free: Vec<Color> = PALETTE.iter().copied().filter(|c| !used.contains(c)).collect();
            let color = if free.is_empty() {
                pick(rng, &PALETTE)
            } else {
                pick(rng, &free)
            };

            tiles.push(Tile { cells, color });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn palette_only(grid: &DenseGrid) -> bool {
        grid.as_slice().iter().all(|c| PALETTE.contains(c))
    }

    #[test]
    fn every_generator_covers_grid_with_palette_colors() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            for &kind in Generator::all() {
                for (w, h) in [(1, 1), (7, 3), (51, 26)] {
                    let grid = generate(kind, w, h, &mut rng);
                    assert_eq!(grid.as_slice().len(), (w * h) as usize);
                    assert!(palette_only(&grid), "{:?} {}x{}", kind, w, h);
                }
            }
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = random_pattern(20, 10, &mut StdRng::seed_from_u64(42));
        let b = random_pattern(20, 10, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn rainbow_spans_all_six_colors() {
        let mut rng = StdRng::seed_from_u64(0);
        let grid = generate(Generator::HorizontalRainbow, 12, 2, &mut rng);
        assert_eq!(grid.get(0, 1), Color::Red);
        assert_eq!(grid.get(2, 0), Color::Orange);
        assert_eq!(grid.get(11, 0), Color::Purple);

        let grid = generate(Generator::VerticalRainbow, 2, 6, &mut rng);
        for (y, &color) in RAINBOW_PALETTE.iter().enumerate() {
            assert_eq!(grid.get(1, y as u32), color);
        }
    }

    #[test]
    fn border_and_checker_use_two_colors() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = generate(Generator::Border, 10, 10, &mut rng);
        assert_ne!(grid.get(0, 0), grid.get(5, 5));

        let grid = generate(Generator::Checkerboard, 8, 8, &mut rng);
        let mut colors: Vec<Color> = grid.as_slice().to_vec();
        colors.sort_by_key(|c| c.palette_index());
        colors.dedup();
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn anchoring_puts_first_cell_at_origin() {
        for shape in &TETROMINOES {
            let a = anchored(shape);
            assert!(a.contains(&(0, 0)));
            assert!(a.iter().all(|&(x, y)| y > 0 || (y == 0 && x >= 0)));
        }
    }

    #[test]
    fn tetris_partitions_grid_and_separates_neighbors() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (w, h) = (13u32, 9u32);
            let tiles = tetris_tiles(w, h, &mut rng);

            let mut owner = vec![usize::MAX; (w * h) as usize];
            for (id, tile) in tiles.iter().enumerate() {
                assert!(tile.cells.len() == 4 || tile.cells.len() == 1);
                for &(x, y) in &tile.cells {
                    let slot = &mut owner[(y * w + x) as usize];
                    assert_eq!(*slot, usize::MAX, "cell claimed twice");
                    *slot = id;
                }
            }
            assert!(owner.iter().all(|&o| o != usize::MAX));

            for y in 0..h {
                for x in 0..w {
                    let a = owner[(y * w + x) as usize];
                    for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                        if nx < w && ny < h {
                            let b = owner[(ny * w + nx) as usize];
                            if a != b {
                                assert_ne!(tiles[a].color, tiles[b].color);
                            }
                        }
                    }
                }
            }
        }
    }
}
