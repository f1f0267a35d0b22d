//! Configuration for the stock controller and the canvas surface
//!
//! Loaded from TOML. Every key is optional; anything missing falls back to
//! the `Default` impl of its section.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core::error::{PlacerError, Result};

/// Population bounds and random source for a stock controller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    /// Target population pursued by breed/tend. `None` disables breeding.
    pub min_stock: Option<usize>,

    /// Hard cap enforced after every placement. `None` disables culling.
    pub max_stock: Option<usize>,

    /// Seed for the controller's `ChaCha8Rng`
    pub seed: u64,

    /// Random draws per missing item during a tend pass
    pub breed_attempts: u32,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            min_stock: None,
            max_stock: None,
            seed: 42,
            breed_attempts: 1,
        }
    }
}

impl StockConfig {
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_stock, self.max_stock) {
            if min > max {
                return Err(PlacerError::InvalidConfig(format!(
                    "min_stock ({}) must be <= max_stock ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Geometry and pacing of the pixel surface
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Grid width in cells
    pub width: i32,
    /// Grid height in cells
    pub height: i32,
    /// Edge length of one cell in pixels
    pub pixel_size: u32,
    pub caption: String,
    /// Target frames per second; 0 disables pacing
    pub fps: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 16,
            pixel_size: 4,
            caption: "Big Pixel Placer - Unnamed Project".into(),
            fps: 30,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(PlacerError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.pixel_size == 0 {
            return Err(PlacerError::InvalidConfig("pixel_size must be positive".into()));
        }
        Ok(())
    }
}

/// Top-level config file: `[stock]` and `[canvas]` tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlacerConfig {
    pub stock: StockConfig,
    pub canvas: CanvasConfig,
}

impl PlacerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlacerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.stock.validate()?;
        self.canvas.validate()
    }

    /// Fill unset stock bounds from the canvas area: a tenth of the cells as
    /// the minimum and a fifth as the maximum. A bound that is already set is
    /// kept, and the filled-in one is clamped so the pair stays ordered.
    pub fn resolve_stock_bounds(&mut self) -> Result<()> {
        self.canvas.validate()?;
        let cells = (self.canvas.width as usize).saturating_mul(self.canvas.height as usize);

        let min = match (self.stock.min_stock, self.stock.max_stock) {
            (Some(min), _) => min,
            (None, Some(max)) => (cells / 10).min(max),
            (None, None) => cells / 10,
        };
        self.stock.min_stock = Some(min);
        self.stock.max_stock = Some(self.stock.max_stock.unwrap_or(min.max(cells / 5)));
        self.validate()
    }
}
