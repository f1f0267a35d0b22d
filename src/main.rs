//! Pixel Placer - Entry Point
//!
//! Keeps a stocked population of food on a grid, paints the grid through a
//! color view onto a canvas, and draws each frame's dirty cells to the
//! terminal. A grazer eats food at random so the stock keeps churning.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use pixel_placer::core::config::PlacerConfig;
use pixel_placer::core::error::Result;
use pixel_placer::core::types::Vector;
use pixel_placer::render::canvas::{self, Canvas, FramePacer};
use pixel_placer::render::colors::{self, Color};
use pixel_placer::render::terminal::{self, TerminalSession};
use pixel_placer::spatial::grid::Grid;
use pixel_placer::spatial::view::GridView;
use pixel_placer::stock::{StockController, TendReport};

/// Pixel Placer - stocked grid demo
#[derive(Parser, Debug)]
#[command(name = "pixel-placer")]
#[command(about = "Keep a random stock of food on a grid and paint it")]
struct Args {
    /// TOML file with [stock] and [canvas] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 300)]
    ticks: u64,

    #[arg(long)]
    min_stock: Option<usize>,

    #[arg(long)]
    max_stock: Option<usize>,

    /// Skip the terminal surface and print one line per tick
    #[arg(long, default_value_t = false)]
    headless: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Food,
    Wall,
}

fn cell_color(cell: &Cell) -> Color {
    match cell {
        Cell::Empty => colors::WHITE,
        Cell::Food => colors::GREEN,
        Cell::Wall => colors::BLACK,
    }
}

/// Wall across the left half of the middle row
fn build_walls(grid: &mut Grid<Cell>) -> Result<()> {
    let y = grid.height() / 2;
    for x in 0..grid.width() / 2 {
        grid.set(Vector::new(x, y), Cell::Wall)?;
    }
    Ok(())
}

/// Eat a random food item now and then, and drop in a stray one, so both
/// breeding and culling get exercised.
fn graze<R: Rng>(
    stock: &mut StockController<Cell>,
    grid: &mut Grid<Cell>,
    rng: &mut R,
) -> Result<()> {
    if stock.population() > 0 && rng.gen_bool(0.4) {
        let idx = rng.gen_range(0..stock.population());
        let eaten = stock.positions().nth(idx);
        if let Some(pos) = eaten {
            stock.remove_at(grid, pos)?;
        }
    }
    if rng.gen_bool(0.25) {
        stock.place_random(grid, 3)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pixel_placer=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlacerConfig::load(path)?,
        None => PlacerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.stock.seed = seed;
    }
    if args.min_stock.is_some() {
        config.stock.min_stock = args.min_stock;
    }
    if args.max_stock.is_some() {
        config.stock.max_stock = args.max_stock;
    }
    config.resolve_stock_bounds()?;

    tracing::info!(
        width = config.canvas.width,
        height = config.canvas.height,
        seed = config.stock.seed,
        "Pixel Placer starting"
    );

    let canvas = Rc::new(RefCell::new(Canvas::new(&config.canvas)?));
    let mut grid = Grid::new(config.canvas.width, config.canvas.height, Cell::Empty)?;
    let mut view = GridView::new(&mut grid, cell_color);
    view.set_hook(canvas::observer(Rc::clone(&canvas)));

    build_walls(view.base_mut())?;

    let mut food = StockController::from_config(Cell::Food, &config.stock)?;
    let mut grazer = ChaCha8Rng::seed_from_u64(config.stock.seed.wrapping_add(1));
    let mut pacer = FramePacer::new(if args.headless { 0 } else { config.canvas.fps });

    let mut session = if args.headless {
        None
    } else {
        let mut session = TerminalSession::enter()?;
        let canvas = canvas.borrow();
        terminal::draw_all(session.out(), &canvas)?;
        Some(session)
    };
    canvas.borrow_mut().frame();

    let mut totals = TendReport::default();
    for tick in 0..args.ticks {
        let report = food.tend_stock(view.base_mut(), config.stock.breed_attempts)?;
        totals.culled += report.culled;
        totals.bred += report.bred;
        graze(&mut food, view.base_mut(), &mut grazer)?;

        let status = format!(
            "tick {:>4}  food {:>3}  short {:>2}",
            tick,
            food.population(),
            food.deficit()
        );
        let dirty = canvas.borrow_mut().frame();

        match session.as_mut() {
            Some(session) => {
                let canvas = canvas.borrow();
                terminal::draw_dirty(session.out(), &canvas, &dirty)?;
                terminal::draw_caption(session.out(), canvas.caption(), &status)?;
                if session.quit_requested()? {
                    break;
                }
            }
            None => println!("{status}  repainted {:>3}", dirty.len()),
        }

        pacer.tick();
    }
    drop(session);

    tracing::info!(
        population = food.population(),
        culled = totals.culled,
        bred = totals.bred,
        "Pixel Placer finished"
    );
    Ok(())
}
