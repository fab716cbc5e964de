use std::io;

use anyhow::Context;
use anyhow::bail;
use crossterm::cursor;
use crossterm::execute;
use crossterm::style;
use tracing_subscriber::EnvFilter;

use quadgrid::Coord;
use quadgrid::QuadTree;

const DEFAULT_LENGTH: Coord = 9;
const DEFAULT_WIDTH: Coord = 5;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let (length, width) = parse_args()?;

    let mut tree = QuadTree::new(length, width, '.')?;
    sketch(&mut tree)?;

    let mut stdout = io::stdout();

    draw(&mut stdout, &tree)?;

    for tile in tree.tiles() {
        let r = tile.region;

        execute!(
            stdout,
            style::Print(format!(
                "'{}' ({}, {}) -> ({}, {})",
                tile.value, r.left, r.top, r.right, r.bottom
            )),
            cursor::MoveToNextLine(1)
        )?;
    }

    let tiles = tree.tiles().count();
    execute!(
        stdout,
        style::Print(format!("{tiles} tiles for {} cells", tree.area())),
        cursor::MoveToNextLine(1)
    )?;

    Ok(())
}

/// Reads `[LENGTH WIDTH]` from the command line.
fn parse_args() -> anyhow::Result<(Coord, Coord)> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [] => Ok((DEFAULT_LENGTH, DEFAULT_WIDTH)),
        [length, width] => {
            let length = length.parse().context("Failed to parse length")?;
            let width = width.parse().context("Failed to parse width")?;

            Ok((length, width))
        }
        _ => bail!("Usage: quadgrid [LENGTH WIDTH]"),
    }
}

/// Draws a border around the grid and fills the center.
fn sketch(tree: &mut QuadTree<char>) -> anyhow::Result<()> {
    let (length, width) = tree.dimensions();

    for x in 0..length {
        tree.set((x, 0), '#')?;
        tree.set((x, width - 1), '#')?;
    }

    for y in 0..width {
        tree.set((0, y), '#')?;
        tree.set((length - 1, y), '#')?;
    }

    for y in 1..width - 1 {
        for x in 1..length - 1 {
            tree.set((x, y), 'o')?;
        }
    }

    Ok(())
}

fn draw(stdout: &mut io::Stdout, tree: &QuadTree<char>) -> io::Result<()> {
    let (length, _) = tree.dimensions();
    let cells = tree.row_major();

    for row in cells.chunks(length as usize) {
        let line: String = row.iter().copied().collect();

        execute!(stdout, style::Print(line), cursor::MoveToNextLine(1))?;
    }

    Ok(())
}
