//! Stock controller - keeps a bounded, randomly placed population of one
//! item kind on a grid
//!
//! Placement order is tracked so the oldest item is evicted first whenever
//! the population exceeds `max_stock`. `min_stock` is a target: breeding
//! draws random cells and stops quietly when it runs out of attempts.
//!
//! The controller does not own the grid. Every operation borrows it, so two
//! controllers sharing one grid are serialized by the borrow checker. The
//! controller assumes nothing else writes to the cells it has claimed.

use std::collections::VecDeque;

use ahash::AHashSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::StockConfig;
use crate::core::error::{PlacerError, Result};
use crate::core::types::Vector;
use crate::spatial::grid::Grid;

/// Outcome of one tend pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TendReport {
    pub culled: usize,
    pub bred: usize,
}

#[derive(Debug)]
pub struct StockController<T, R = ChaCha8Rng> {
    item: T,
    min_stock: Option<usize>,
    max_stock: Option<usize>,
    /// Oldest first
    positions: VecDeque<Vector>,
    tracked: AHashSet<Vector>,
    rng: R,
}

impl<T: Clone + PartialEq> StockController<T, ChaCha8Rng> {
    pub fn seeded(item: T, seed: u64) -> Self {
        Self::new(item, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_config(item: T, config: &StockConfig) -> Result<Self> {
        config.validate()?;
        let mut controller = Self::seeded(item, config.seed);
        controller.min_stock = config.min_stock;
        controller.max_stock = config.max_stock;
        Ok(controller)
    }
}

impl<T: Clone + PartialEq, R: Rng> StockController<T, R> {
    pub fn new(item: T, rng: R) -> Self {
        Self {
            item,
            min_stock: None,
            max_stock: None,
            positions: VecDeque::new(),
            tracked: AHashSet::new(),
            rng,
        }
    }

    pub fn with_min_stock(mut self, min_stock: usize) -> Self {
        self.min_stock = Some(min_stock);
        self
    }

    pub fn with_max_stock(mut self, max_stock: usize) -> Self {
        self.max_stock = Some(max_stock);
        self
    }

    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn min_stock(&self) -> Option<usize> {
        self.min_stock
    }

    pub fn max_stock(&self) -> Option<usize> {
        self.max_stock
    }

    /// Tracked positions in placement order, oldest first
    pub fn positions(&self) -> impl ExactSizeIterator<Item = Vector> + '_ {
        self.positions.iter().copied()
    }

    pub fn population(&self) -> usize {
        self.positions.len()
    }

    pub fn contains(&self, pos: Vector) -> bool {
        self.tracked.contains(&pos)
    }

    /// How many items short of `min_stock` the population currently is
    pub fn deficit(&self) -> usize {
        self.min_stock
            .map(|min| min.saturating_sub(self.positions.len()))
            .unwrap_or(0)
    }

    /// Try up to `max_attempts` random cells. Only an occupied cell counts as
    /// a miss; any other error is returned.
    pub fn place_random(&mut self, grid: &mut Grid<T>, max_attempts: u32) -> Result<Option<Vector>> {
        for _ in 0..max_attempts {
            let pos = grid.random_location(&mut self.rng);
            match self.place_at(grid, pos) {
                Ok(pos) => return Ok(Some(pos)),
                Err(PlacerError::Occupied(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Write the item at `pos` and track it. A cell whose hook stores
    /// something other than the item is reported as `Occupied` and left
    /// untracked.
    pub fn place_at(&mut self, grid: &mut Grid<T>, pos: Vector) -> Result<Vector> {
        if *grid.blank() == self.item {
            return Err(PlacerError::InvalidConfig(
                "stock item is indistinguishable from the grid's blank value".into(),
            ));
        }
        if self.tracked.contains(&pos) || !grid.is_blank(pos)? {
            return Err(PlacerError::Occupied(pos));
        }
        if *grid.set(pos, self.item.clone())? != self.item {
            tracing::trace!(%pos, "hook refused stock placement");
            return Err(PlacerError::Occupied(pos));
        }
        self.positions.push_back(pos);
        self.tracked.insert(pos);
        tracing::trace!(%pos, population = self.positions.len(), "placed stock");

        self.cull_stock(grid)?;
        Ok(pos)
    }

    pub fn remove_at(&mut self, grid: &mut Grid<T>, pos: Vector) -> Result<()> {
        if !self.tracked.contains(&pos) {
            return Err(PlacerError::NotFound(pos));
        }
        grid.clear(pos)?;
        if let Some(idx) = self.positions.iter().position(|&p| p == pos) {
            self.positions.remove(idx);
        }
        self.tracked.remove(&pos);
        tracing::trace!(%pos, population = self.positions.len(), "removed stock");

        self.breed_stock(grid, 1)?;
        Ok(())
    }

    /// Evict oldest items until the population is within `max_stock`.
    /// Returns how many were evicted.
    pub fn cull_stock(&mut self, grid: &mut Grid<T>) -> Result<usize> {
        let Some(max) = self.max_stock else {
            return Ok(0);
        };

        let mut culled = 0;
        while self.positions.len() > max {
            let oldest = self.positions[0];
            grid.clear(oldest)?;
            self.positions.pop_front();
            self.tracked.remove(&oldest);
            culled += 1;
        }

        if culled > 0 {
            tracing::debug!(culled, max, "culled oldest stock");
        }
        Ok(culled)
    }

    /// Place random items until `min_stock` is reached or a placement runs
    /// out of attempts. Falling short is not an error; check `deficit()`.
    pub fn breed_stock(&mut self, grid: &mut Grid<T>, max_attempts: u32) -> Result<usize> {
        let Some(min) = self.min_stock else {
            return Ok(0);
        };
        // Breeding past the cap would only feed the cull
        let target = self.max_stock.map_or(min, |max| min.min(max));

        let mut bred = 0;
        while self.positions.len() < target {
            match self.place_random(grid, max_attempts)? {
                Some(_) => bred += 1,
                None => {
                    tracing::debug!(
                        population = self.positions.len(),
                        min,
                        "breeding stopped short of minimum"
                    );
                    break;
                }
            }
        }
        Ok(bred)
    }

    /// Cull then breed. Meant to be called once per external tick.
    pub fn tend_stock(&mut self, grid: &mut Grid<T>, max_attempts: u32) -> Result<TendReport> {
        let culled = self.cull_stock(grid)?;
        let bred = self.breed_stock(grid, max_attempts)?;
        Ok(TendReport { culled, bred })
    }

    /// Remove every tracked item without breeding replacements
    pub fn clear_stock(&mut self, grid: &mut Grid<T>) -> Result<()> {
        while let Some(&pos) = self.positions.front() {
            grid.clear(pos)?;
            self.positions.pop_front();
            self.tracked.remove(&pos);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Cell = Option<char>;

    fn grid(width: i32, height: i32) -> Grid<Cell> {
        Grid::new(width, height, None).unwrap()
    }

    fn food(seed: u64) -> StockController<Cell> {
        StockController::seeded(Some('f'), seed)
    }

    #[test]
    fn test_place_at_tracks_and_writes() {
        let mut g = grid(3, 3);
        let mut stock = food(1);
        let p = Vector::new(1, 2);

        assert_eq!(stock.place_at(&mut g, p).unwrap(), p);
        assert_eq!(*g.get(p).unwrap(), Some('f'));
        assert_eq!(stock.positions().collect::<Vec<_>>(), vec![p]);
        assert!(stock.contains(p));
    }

    #[test]
    fn test_place_at_occupied_leaves_state() {
        let mut g = grid(2, 2);
        let mut stock = food(1);
        let p = Vector::new(0, 1);
        stock.place_at(&mut g, p).unwrap();

        let err = stock.place_at(&mut g, p).unwrap_err();
        assert!(matches!(err, PlacerError::Occupied(q) if q == p));
        assert_eq!(stock.population(), 1);

        // A cell filled by someone else is occupied too
        g.set(Vector::new(1, 1), Some('#')).unwrap();
        assert!(stock.place_at(&mut g, Vector::new(1, 1)).unwrap_err().is_occupied());
        assert_eq!(stock.population(), 1);
    }

    #[test]
    fn test_place_at_refused_by_hook_is_untracked() {
        let mut g = grid(3, 3);
        g.set_hook(|pos, value| if pos.x == 0 { None } else { value });
        let mut stock = food(1);

        let err = stock.place_at(&mut g, Vector::new(0, 0)).unwrap_err();
        assert!(err.is_occupied());
        assert!(!stock.contains(Vector::new(0, 0)));
        assert!(g.is_blank(Vector::new(0, 0)).unwrap());

        stock.place_at(&mut g, Vector::new(1, 0)).unwrap();
        assert_eq!(stock.positions().collect::<Vec<_>>(), vec![Vector::new(1, 0)]);
    }

    #[test]
    fn test_breed_skips_refused_cells() {
        let mut g = grid(4, 4);
        g.set_hook(|pos, value| if pos.x < 2 { None } else { value });
        let mut stock = food(6).with_min_stock(5);

        stock.breed_stock(&mut g, 200).unwrap();
        assert_eq!(stock.population(), 5);
        for p in stock.positions() {
            assert!(p.x >= 2);
            assert_eq!(*g.get(p).unwrap(), Some('f'));
        }
    }

    #[test]
    fn test_item_equal_to_blank_rejected() {
        let mut g = Grid::new(2, 2, 0u8).unwrap();
        let mut stock = StockController::seeded(0u8, 1).with_min_stock(1);

        let err = stock.place_at(&mut g, Vector::ZERO).unwrap_err();
        assert!(matches!(err, PlacerError::InvalidConfig(_)));
        assert!(matches!(stock.breed_stock(&mut g, 5), Err(PlacerError::InvalidConfig(_))));
        assert_eq!(stock.population(), 0);
    }

    #[test]
    fn test_place_at_out_of_bounds() {
        let mut g = grid(2, 2);
        let mut stock = food(1);
        let err = stock.place_at(&mut g, Vector::new(2, 0)).unwrap_err();
        assert!(matches!(err, PlacerError::OutOfBounds { .. }));
        assert_eq!(stock.population(), 0);
    }

    #[test]
    fn test_max_stock_evicts_oldest() {
        let mut g = grid(1, 4);
        let mut stock = food(1).with_max_stock(2);
        let (a, b, c) = (Vector::new(0, 0), Vector::new(0, 1), Vector::new(0, 2));

        stock.place_at(&mut g, a).unwrap();
        stock.place_at(&mut g, b).unwrap();
        stock.place_at(&mut g, c).unwrap();

        assert_eq!(stock.population(), 2);
        assert_eq!(stock.positions().collect::<Vec<_>>(), vec![b, c]);
        assert!(g.is_blank(a).unwrap());
        assert_eq!(*g.get(b).unwrap(), Some('f'));
        assert_eq!(*g.get(c).unwrap(), Some('f'));
        assert!(!stock.contains(a));
    }

    #[test]
    fn test_max_stock_zero_keeps_grid_empty() {
        let mut g = grid(2, 2);
        let mut stock = food(1).with_max_stock(0);
        let p = Vector::new(1, 1);
        assert_eq!(stock.place_at(&mut g, p).unwrap(), p);
        assert_eq!(stock.population(), 0);
        assert!(g.is_blank(p).unwrap());
    }

    #[test]
    fn test_remove_unknown() {
        let mut g = grid(2, 2);
        let mut stock = food(1);
        stock.place_at(&mut g, Vector::new(0, 0)).unwrap();

        let err = stock.remove_at(&mut g, Vector::new(1, 1)).unwrap_err();
        assert!(matches!(err, PlacerError::NotFound(_)));
        assert_eq!(stock.population(), 1);
        assert_eq!(*g.get(Vector::new(0, 0)).unwrap(), Some('f'));
    }

    #[test]
    fn test_remove_clears_cell() {
        let mut g = grid(2, 2);
        let mut stock = food(1);
        let p = Vector::new(1, 0);
        stock.place_at(&mut g, p).unwrap();
        stock.remove_at(&mut g, p).unwrap();
        assert_eq!(stock.population(), 0);
        assert!(g.is_blank(p).unwrap());
    }

    #[test]
    fn test_remove_breeds_replacement() {
        let mut g = grid(4, 4);
        let mut stock = food(3).with_min_stock(1);
        let p = Vector::new(2, 2);
        stock.place_at(&mut g, p).unwrap();

        // One attempt per missing item, so retry until a draw lands
        stock.remove_at(&mut g, p).unwrap();
        while stock.deficit() > 0 {
            stock.breed_stock(&mut g, 1).unwrap();
        }
        assert_eq!(stock.population(), 1);
    }

    #[test]
    fn test_remove_propagates_grid_errors() {
        let mut big = grid(8, 8);
        let mut small = grid(2, 2);
        let mut stock = food(1);
        let p = Vector::new(5, 5);
        stock.place_at(&mut big, p).unwrap();

        let err = stock.remove_at(&mut small, p).unwrap_err();
        assert!(matches!(err, PlacerError::OutOfBounds { .. }));
        assert!(stock.contains(p));
    }

    #[test]
    fn test_place_random_zero_attempts() {
        let mut g = grid(3, 3);
        let mut stock = food(1);
        assert_eq!(stock.place_random(&mut g, 0).unwrap(), None);
        assert_eq!(stock.population(), 0);
    }

    #[test]
    fn test_place_random_full_grid_returns_none() {
        let mut g = grid(2, 2);
        let mut stock = food(1);
        for p in g.all_positions().collect::<Vec<_>>() {
            stock.place_at(&mut g, p).unwrap();
        }
        assert_eq!(stock.place_random(&mut g, 50).unwrap(), None);
        assert_eq!(stock.population(), 4);
    }

    #[test]
    fn test_place_random_single_free_cell() {
        let mut g = grid(3, 1);
        g.set(Vector::new(0, 0), Some('#')).unwrap();
        g.set(Vector::new(2, 0), Some('#')).unwrap();
        let mut stock = food(9);

        let placed = stock.place_random(&mut g, 1000).unwrap();
        assert_eq!(placed, Some(Vector::new(1, 0)));
    }

    #[test]
    fn test_breed_reaches_minimum() {
        let mut g = grid(10, 10);
        let mut stock = food(5).with_min_stock(20);
        let bred = stock.breed_stock(&mut g, 100).unwrap();
        assert_eq!(bred, 20);
        assert_eq!(stock.population(), 20);
        assert_eq!(stock.deficit(), 0);

        let occupied = g.all_positions().filter(|&p| !g.is_blank(p).unwrap()).count();
        assert_eq!(occupied, 20);
    }

    #[test]
    fn test_breed_best_effort_on_full_grid() {
        let mut g = grid(1, 2);
        g.set(Vector::new(0, 0), Some('#')).unwrap();
        g.set(Vector::new(0, 1), Some('#')).unwrap();
        let mut stock = food(1).with_min_stock(3);

        assert_eq!(stock.breed_stock(&mut g, 5).unwrap(), 0);
        assert_eq!(stock.population(), 0);
        assert_eq!(stock.deficit(), 3);
    }

    #[test]
    fn test_breed_without_min_is_noop() {
        let mut g = grid(3, 3);
        let mut stock = food(1);
        assert_eq!(stock.breed_stock(&mut g, 10).unwrap(), 0);
        assert_eq!(stock.deficit(), 0);
    }

    #[test]
    fn test_breed_never_exceeds_max() {
        let mut g = grid(5, 5);
        let mut stock = food(1).with_min_stock(10).with_max_stock(4);
        stock.breed_stock(&mut g, 100).unwrap();
        assert_eq!(stock.population(), 4);
    }

    #[test]
    fn test_tend_culls_then_breeds() {
        let mut g = grid(6, 6);
        let mut stock = food(11).with_min_stock(3);
        for y in 0..5 {
            stock.place_at(&mut g, Vector::new(0, y)).unwrap();
        }
        // Lowering the cap only takes effect on the next tend
        stock.max_stock = Some(4);
        assert_eq!(stock.population(), 5);

        let report = stock.tend_stock(&mut g, 100).unwrap();
        assert_eq!(report, TendReport { culled: 1, bred: 0 });
        assert!(g.is_blank(Vector::new(0, 0)).unwrap());

        stock.clear_stock(&mut g).unwrap();
        assert_eq!(stock.population(), 0);
        let report = stock.tend_stock(&mut g, 100).unwrap();
        assert_eq!(report, TendReport { culled: 0, bred: 3 });
    }

    #[test]
    fn test_clear_stock_blanks_cells() {
        let mut g = grid(3, 3);
        let mut stock = food(2).with_min_stock(5);
        stock.breed_stock(&mut g, 100).unwrap();
        stock.clear_stock(&mut g).unwrap();
        assert!(g.all_positions().all(|p| g.is_blank(p).unwrap()));
        assert_eq!(stock.deficit(), 5);
    }

    #[test]
    fn test_same_seed_same_placements() {
        let mut g1 = grid(16, 16);
        let mut g2 = grid(16, 16);
        let mut s1 = food(77).with_min_stock(12);
        let mut s2 = food(77).with_min_stock(12);
        s1.breed_stock(&mut g1, 10).unwrap();
        s2.breed_stock(&mut g2, 10).unwrap();
        assert_eq!(s1.positions().collect::<Vec<_>>(), s2.positions().collect::<Vec<_>>());
    }

    #[test]
    fn test_from_config() {
        let config = StockConfig {
            min_stock: Some(2),
            max_stock: Some(5),
            seed: 3,
            breed_attempts: 4,
        };
        let stock = StockController::from_config(Some('f'), &config).unwrap();
        assert_eq!(stock.min_stock(), Some(2));
        assert_eq!(stock.max_stock(), Some(5));
        assert_eq!(*stock.item(), Some('f'));

        let bad = StockConfig { min_stock: Some(6), ..config };
        assert!(StockController::from_config(Some('f'), &bad).is_err());
    }
}
