//! Terminal output for a canvas
//!
//! Every grid cell becomes two background-colored terminal columns. Row 0 is
//! reserved for the caption line.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::style::{self, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use crate::core::error::Result;
use crate::core::types::Vector;
use crate::render::canvas::{Canvas, Rect};
use crate::render::colors::Color;

const CELL_COLUMNS: u16 = 2;
const CAPTION_ROWS: u16 = 1;

pub fn to_term_color(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Terminal (column, row) of a cell, if it is addressable at all
fn cell_origin(pos: Vector) -> Option<(u16, u16)> {
    let column = u16::try_from(pos.x).ok()?.checked_mul(CELL_COLUMNS)?;
    let row = u16::try_from(pos.y).ok()?.checked_add(CAPTION_ROWS)?;
    Some((column, row))
}

/// Returns false when the cell lies beyond the terminal's coordinate range
fn draw_cell<W: Write>(out: &mut W, pos: Vector, color: Color) -> io::Result<bool> {
    let Some((column, row)) = cell_origin(pos) else {
        return Ok(false);
    };
    queue!(
        out,
        MoveTo(column, row),
        SetBackgroundColor(to_term_color(color)),
        Print("  ")
    )?;
    Ok(true)
}

/// Redraw the cells covered by `rects`. Returns the number of cells drawn.
pub fn draw_dirty<W: Write>(out: &mut W, canvas: &Canvas, rects: &[Rect]) -> Result<usize> {
    let pixel_size = canvas.pixel_size();
    let mut drawn = 0;
    for rect in rects {
        let pos = Vector::new((rect.x / pixel_size) as i32, (rect.y / pixel_size) as i32);
        if let Some(color) = canvas.cell_color(pos) {
            if draw_cell(out, pos, color)? {
                drawn += 1;
            }
        }
    }
    queue!(out, ResetColor)?;
    out.flush()?;
    Ok(drawn)
}

/// Redraw every cell of the canvas
pub fn draw_all<W: Write>(out: &mut W, canvas: &Canvas) -> Result<usize> {
    let size = canvas.size();
    let mut drawn = 0;
    for x in 0..size.x {
        for y in 0..size.y {
            let pos = Vector::new(x, y);
            if let Some(color) = canvas.cell_color(pos) {
                if draw_cell(out, pos, color)? {
                    drawn += 1;
                }
            }
        }
    }
    queue!(out, ResetColor)?;
    out.flush()?;
    Ok(drawn)
}

pub fn draw_caption<W: Write>(out: &mut W, caption: &str, status: &str) -> Result<()> {
    queue!(
        out,
        MoveTo(0, 0),
        ResetColor,
        Clear(ClearType::CurrentLine),
        Print(format!("{caption}  {status}"))
    )?;
    out.flush()?;
    Ok(())
}

/// Raw-mode alternate screen, restored on drop
pub struct TerminalSession {
    stdout: Stdout,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(Self { stdout })
    }

    pub fn out(&mut self) -> &mut Stdout {
        &mut self.stdout
    }

    /// Drain pending input; true once q, Esc or Ctrl-C was pressed
    pub fn quit_requested(&self) -> Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                match (key.code, key.modifiers) {
                    (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => return Ok(true),
                    (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => return Ok(true),
                    _ => {}
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.stdout, ResetColor, Show, LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
    }
}
