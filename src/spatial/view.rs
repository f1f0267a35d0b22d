//! Read-mapped view over a grid
//!
//! A `GridView` presents every cell of its base grid through a transform
//! (for example cell state -> display color) and forwards each write on the
//! base, already transformed, to its own observer. The base keeps storing the
//! raw value the writer supplied.
//!
//! The view claims the base's single hook slot when it is built. Whatever hook
//! was there before is held by the view and only goes back on `restore()`;
//! dropping a view leaves its hook installed. Building a second view on the
//! same base therefore silences the first one's observer until the second is
//! restored.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rand::Rng;

use crate::core::error::Result;
use crate::core::types::Vector;
use crate::spatial::grid::{AllPositions, Grid, Hook};

/// Observer of transformed writes
pub type ViewHook<D> = Box<dyn FnMut(Vector, D)>;

type Transform<T, D> = Rc<dyn Fn(&T) -> D>;
type ObserverSlot<D> = Rc<RefCell<Option<ViewHook<D>>>>;

pub struct GridView<'a, T, D> {
    base: &'a mut Grid<T>,
    transform: Transform<T, D>,
    observer: ObserverSlot<D>,
    displaced: Option<Hook<T>>,
}

impl<'a, T: 'static, D: 'static> GridView<'a, T, D> {
    /// Wrap `base`, installing the view as its hook
    pub fn new<F>(base: &'a mut Grid<T>, transform: F) -> Self
    where
        F: Fn(&T) -> D + 'static,
    {
        let transform: Transform<T, D> = Rc::new(transform);
        let observer: ObserverSlot<D> = Rc::new(RefCell::new(None));

        let hook_transform = Rc::clone(&transform);
        let hook_observer = Rc::clone(&observer);
        let displaced = base.set_hook(move |pos, raw: T| {
            if let Some(observe) = hook_observer.borrow_mut().as_mut() {
                observe(pos, hook_transform(&raw));
            }
            raw
        });

        if displaced.is_some() {
            tracing::debug!("grid view displaced an existing hook");
        }

        Self {
            base,
            transform,
            observer,
            displaced,
        }
    }
}

impl<'a, T, D> GridView<'a, T, D> {
    pub fn get(&self, pos: Vector) -> Result<D> {
        let raw = self.base.get(pos)?;
        Ok((self.transform)(raw))
    }

    /// Apply the view's transform to an arbitrary value
    pub fn map(&self, raw: &T) -> D {
        (self.transform)(raw)
    }

    pub fn size(&self) -> Vector {
        self.base.size()
    }

    pub fn all_positions(&self) -> AllPositions {
        self.base.all_positions()
    }

    pub fn random_location<R: Rng>(&self, rng: &mut R) -> Vector {
        self.base.random_location(rng)
    }

    /// Attach the observer that receives `(position, transform(raw))` for
    /// every write on the base. Returns the observer it replaced.
    pub fn set_hook<F>(&mut self, observer: F) -> Option<ViewHook<D>>
    where
        F: FnMut(Vector, D) + 'static,
    {
        self.observer.borrow_mut().replace(Box::new(observer))
    }

    pub fn clear_hook(&mut self) -> Option<ViewHook<D>> {
        self.observer.borrow_mut().take()
    }

    pub fn has_hook(&self) -> bool {
        self.observer.borrow().is_some()
    }

    /// Whether building this view pushed another hook out of the base
    pub fn has_displaced(&self) -> bool {
        self.displaced.is_some()
    }

    pub fn base(&self) -> &Grid<T> {
        &*self.base
    }

    pub fn base_mut(&mut self) -> &mut Grid<T> {
        &mut *self.base
    }

    /// Detach the view, put the displaced hook back, and return the base
    pub fn restore(self) -> &'a mut Grid<T> {
        let GridView { base, displaced, .. } = self;
        base.replace_hook(displaced);
        base
    }
}

impl<'a, T, D> fmt::Debug for GridView<'a, T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridView")
            .field("size", &self.base.size())
            .field("observed", &self.has_hook())
            .field("displaced", &self.displaced.is_some())
            .finish()
    }
}
