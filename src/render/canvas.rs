//! Headless pixel surface
//!
//! Each grid cell is drawn as a `pixel_size` square. Painted cells are
//! remembered as dirty rects until the next `frame()`, which is the point
//! where a real display would push them to the screen.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::config::CanvasConfig;
use crate::core::error::{PlacerError, Result};
use crate::core::types::Vector;
use crate::render::colors::{Color, BACKGROUND};

/// Pixel-space rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct Canvas {
    width: i32,
    height: i32,
    pixel_size: u32,
    caption: String,
    /// Row-major, `pixel_width() * pixel_height()` entries
    pixels: Vec<Color>,
    dirty: Vec<Rect>,
}

impl Canvas {
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        config.validate()?;
        let px = config.width as usize * config.pixel_size as usize;
        let py = config.height as usize * config.pixel_size as usize;
        Ok(Self {
            width: config.width,
            height: config.height,
            pixel_size: config.pixel_size,
            caption: config.caption.clone(),
            pixels: vec![BACKGROUND; px * py],
            dirty: Vec::new(),
        })
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn size(&self) -> Vector {
        Vector::new(self.width, self.height)
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn pixel_width(&self) -> u32 {
        self.width as u32 * self.pixel_size
    }

    pub fn pixel_height(&self) -> u32 {
        self.height as u32 * self.pixel_size
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return None;
        }
        Some(self.pixels[(y * self.pixel_width() + x) as usize])
    }

    /// Color currently shown for a grid cell
    pub fn cell_color(&self, pos: Vector) -> Option<Color> {
        let rect = self.cell_rect(pos)?;
        self.pixel(rect.x, rect.y)
    }

    pub fn cell_rect(&self, pos: Vector) -> Option<Rect> {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        Some(Rect {
            x: pos.x as u32 * self.pixel_size,
            y: pos.y as u32 * self.pixel_size,
            width: self.pixel_size,
            height: self.pixel_size,
        })
    }

    /// Fill one cell and mark it dirty
    pub fn paint(&mut self, pos: Vector, color: Color) -> Result<Rect> {
        let rect = self.cell_rect(pos).ok_or(PlacerError::OutOfBounds {
            position: pos,
            size: self.size(),
        })?;
        let stride = self.pixel_width();
        for py in rect.y..rect.y + rect.height {
            let row = (py * stride) as usize;
            self.pixels[row + rect.x as usize..row + (rect.x + rect.width) as usize].fill(color);
        }
        self.dirty.push(rect);
        Ok(rect)
    }

    /// Rects painted since the last frame
    pub fn dirty(&self) -> &[Rect] {
        &self.dirty
    }

    /// End the frame: hand back the dirty rects and start a fresh list
    pub fn frame(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.dirty)
    }
}

/// Observer for a `GridView<_, Color>` that paints into a shared canvas
pub fn observer(canvas: Rc<RefCell<Canvas>>) -> impl FnMut(Vector, Color) + 'static {
    move |pos: Vector, color: Color| {
        if let Err(e) = canvas.borrow_mut().paint(pos, color) {
            tracing::warn!("canvas observer dropped write: {}", e);
        }
    }
}

/// Hook for a `Grid<Color>` that paints every write and stores it unchanged
pub fn pixel_hook(canvas: Rc<RefCell<Canvas>>) -> impl FnMut(Vector, Color) -> Color + 'static {
    let mut paint = observer(canvas);
    move |pos: Vector, color: Color| {
        paint(pos, color);
        color
    }
}

/// Keeps successive `tick()` calls at least one frame apart
#[derive(Debug)]
pub struct FramePacer {
    frame_time: Option<Duration>,
    last: Option<Instant>,
}

impl FramePacer {
    /// `fps == 0` disables pacing
    pub fn new(fps: u32) -> Self {
        Self {
            frame_time: (fps > 0).then(|| Duration::from_secs(1) / fps),
            last: None,
        }
    }

    /// Sleep out the rest of the current frame. Returns the time slept.
    pub fn tick(&mut self) -> Duration {
        let mut slept = Duration::ZERO;
        if let (Some(frame_time), Some(last)) = (self.frame_time, self.last) {
            let elapsed = last.elapsed();
            if elapsed < frame_time {
                slept = frame_time - elapsed;
                thread::sleep(slept);
            }
        }
        self.last = Some(Instant::now());
        slept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colors::{BLUE, RED};
    use crate::spatial::grid::Grid;
    use crate::spatial::view::GridView;

    fn config(width: i32, height: i32, pixel_size: u32) -> CanvasConfig {
        CanvasConfig {
            width,
            height,
            pixel_size,
            fps: 0,
            ..CanvasConfig::default()
        }
    }

    #[test]
    fn test_new_canvas_is_background() {
        let canvas = Canvas::new(&config(3, 2, 4)).unwrap();
        assert_eq!(canvas.pixel_width(), 12);
        assert_eq!(canvas.pixel_height(), 8);
        assert_eq!(canvas.pixel(11, 7), Some(BACKGROUND));
        assert_eq!(canvas.pixel(12, 0), None);
        assert!(canvas.dirty().is_empty());
    }

    #[test]
    fn test_paint_fills_cell_square() {
        let mut canvas = Canvas::new(&config(3, 3, 2)).unwrap();
        let rect = canvas.paint(Vector::new(1, 2), RED).unwrap();
        assert_eq!(rect, Rect { x: 2, y: 4, width: 2, height: 2 });

        for (x, y) in [(2, 4), (3, 4), (2, 5), (3, 5)] {
            assert_eq!(canvas.pixel(x, y), Some(RED));
        }
        assert_eq!(canvas.pixel(1, 4), Some(BACKGROUND));
        assert_eq!(canvas.pixel(4, 4), Some(BACKGROUND));
        assert_eq!(canvas.cell_color(Vector::new(1, 2)), Some(RED));
    }

    #[test]
    fn test_paint_out_of_bounds() {
        let mut canvas = Canvas::new(&config(2, 2, 1)).unwrap();
        assert!(canvas.paint(Vector::new(2, 0), RED).is_err());
        assert!(canvas.dirty().is_empty());
    }

    #[test]
    fn test_frame_drains_dirty() {
        let mut canvas = Canvas::new(&config(2, 2, 1)).unwrap();
        canvas.paint(Vector::new(0, 0), RED).unwrap();
        canvas.paint(Vector::new(1, 1), BLUE).unwrap();
        assert_eq!(canvas.frame().len(), 2);
        assert!(canvas.frame().is_empty());
    }

    #[test]
    fn test_pixel_hook_on_color_grid() {
        let canvas = Rc::new(RefCell::new(Canvas::new(&config(4, 4, 2)).unwrap()));
        let mut grid = Grid::new(4, 4, BACKGROUND).unwrap();
        grid.set_hook(pixel_hook(Rc::clone(&canvas)));

        let stored = *grid.set(Vector::new(3, 0), BLUE).unwrap();
        assert_eq!(stored, BLUE);
        assert_eq!(canvas.borrow().cell_color(Vector::new(3, 0)), Some(BLUE));
        assert_eq!(canvas.borrow().dirty().len(), 1);
    }

    #[test]
    fn test_view_observer_paints_mapped_color() {
        let canvas = Rc::new(RefCell::new(Canvas::new(&config(3, 3, 1)).unwrap()));
        let mut grid = Grid::new(3, 3, false).unwrap();
        let mut view = GridView::new(&mut grid, |alive: &bool| if *alive { RED } else { BACKGROUND });
        view.set_hook(observer(Rc::clone(&canvas)));

        view.base_mut().set(Vector::new(2, 2), true).unwrap();
        assert_eq!(canvas.borrow().cell_color(Vector::new(2, 2)), Some(RED));
        assert!(*view.base().get(Vector::new(2, 2)).unwrap());
    }

    #[test]
    fn test_observer_ignores_writes_outside_canvas() {
        let canvas = Rc::new(RefCell::new(Canvas::new(&config(1, 1, 1)).unwrap()));
        let mut observe = observer(Rc::clone(&canvas));
        observe(Vector::new(4, 4), RED);
        assert!(canvas.borrow().dirty().is_empty());
    }

    #[test]
    fn test_caption() {
        let mut canvas = Canvas::new(&config(1, 1, 1)).unwrap();
        assert_eq!(canvas.caption(), CanvasConfig::default().caption);
        canvas.set_caption("Stock demo");
        assert_eq!(canvas.caption(), "Stock demo");
    }

    #[test]
    fn test_pacer_disabled() {
        let mut pacer = FramePacer::new(0);
        assert_eq!(pacer.tick(), Duration::ZERO);
        assert_eq!(pacer.tick(), Duration::ZERO);
    }

    #[test]
    fn test_pacer_spaces_frames() {
        let mut pacer = FramePacer::new(50);
        let start = Instant::now();
        pacer.tick();
        pacer.tick();
        pacer.tick();
        // Two full frames at 20ms each
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
