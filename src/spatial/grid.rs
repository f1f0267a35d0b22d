//! Dense 2D grid with a single write-interception hook

use std::fmt;

use rand::Rng;

use crate::core::error::{PlacerError, Result};
use crate::core::types::Vector;

/// Write hook: receives the target position and the value being written,
/// returns the value that is actually stored.
pub type Hook<T> = Box<dyn FnMut(Vector, T) -> T>;

/// Dense 2D array of arbitrary values indexed by `Vector`.
///
/// Every write goes through `set`, which hands the value to the installed
/// hook (if any) and stores whatever the hook returns. The hook slot holds
/// at most one observer; installing a new one returns the old one so the
/// caller can chain or restore it.
pub struct Grid<T> {
    width: i32,
    height: i32,
    /// Initial fill value, also what `clear` writes back
    blank: T,
    /// Column-major: cell (x, y) lives at `x * height + y`
    data: Vec<T>,
    hook: Option<Hook<T>>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: i32, height: i32, initial: T) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(PlacerError::InvalidSize { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![initial.clone(); (width as usize) * (height as usize)],
            blank: initial,
            hook: None,
        })
    }

    /// Write the blank value back into a cell. Routed through the hook.
    pub fn clear(&mut self, pos: Vector) -> Result<&T> {
        let blank = self.blank.clone();
        self.set(pos, blank)
    }
}

impl<T> Grid<T> {
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Vector {
        Vector::new(self.width, self.height)
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn contains(&self, pos: Vector) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: Vector) -> Result<usize> {
        if !self.contains(pos) {
            return Err(PlacerError::OutOfBounds {
                position: pos,
                size: self.size(),
            });
        }
        Ok(pos.x as usize * self.height as usize + pos.y as usize)
    }

    pub fn get(&self, pos: Vector) -> Result<&T> {
        let idx = self.index(pos)?;
        Ok(&self.data[idx])
    }

    /// Store a value, letting the hook veto, transform, or observe it.
    ///
    /// Returns the value that ended up in the cell.
    pub fn set(&mut self, pos: Vector, value: T) -> Result<&T> {
        let idx = self.index(pos)?;
        let effective = match self.hook.as_mut() {
            Some(hook) => hook(pos, value),
            None => value,
        };
        self.data[idx] = effective;
        Ok(&self.data[idx])
    }

    pub fn blank(&self) -> &T {
        &self.blank
    }

    /// Install a hook, returning whichever hook it displaced
    pub fn set_hook<F>(&mut self, hook: F) -> Option<Hook<T>>
    where
        F: FnMut(Vector, T) -> T + 'static,
    {
        self.hook.replace(Box::new(hook))
    }

    /// Put an already boxed hook (or nothing) into the slot
    pub fn replace_hook(&mut self, hook: Option<Hook<T>>) -> Option<Hook<T>> {
        std::mem::replace(&mut self.hook, hook)
    }

    pub fn take_hook(&mut self) -> Option<Hook<T>> {
        self.hook.take()
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// All valid positions, x outer and y inner:
    /// `(0,0), (0,1), .., (0,h-1), (1,0), ..`
    pub fn all_positions(&self) -> AllPositions {
        AllPositions::new(self.width, self.height)
    }

    /// Uniform over the whole grid, occupied cells included
    pub fn random_location<R: Rng>(&self, rng: &mut R) -> Vector {
        Vector::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height))
    }
}

impl<T: PartialEq> Grid<T> {
    pub fn is_blank(&self, pos: Vector) -> Result<bool> {
        Ok(*self.get(pos)? == self.blank)
    }
}

impl<T: fmt::Debug> fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("blank", &self.blank)
            .field("hooked", &self.hook.is_some())
            .finish()
    }
}

/// Restartable iterator over grid positions; clone it to start over
#[derive(Debug, Clone)]
pub struct AllPositions {
    height: i32,
    next: usize,
    total: usize,
}

impl AllPositions {
    fn new(width: i32, height: i32) -> Self {
        Self {
            height,
            next: 0,
            total: (width.max(0) as usize) * (height.max(0) as usize),
        }
    }
}

impl Iterator for AllPositions {
    type Item = Vector;

    fn next(&mut self) -> Option<Vector> {
        if self.next >= self.total {
            return None;
        }
        let h = self.height as usize;
        let pos = Vector::new((self.next / h) as i32, (self.next % h) as i32);
        self.next += 1;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AllPositions {}
