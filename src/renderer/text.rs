//! Character-grid renderer for terminals and logs
//!
//! Each cell covers a fixed patch of the arena. Shapes are stamped back to
//! front (obstacles, powerups, projectiles, players) so nearer layers win.

use std::io::Write;

use glam::Vec2;

use super::Renderer;
use crate::sim::{MapTheme, MatchPhase, PowerupKind, RenderSnapshot, Rect, Side};

struct Grid {
    cols: usize,
    rows: usize,
    cell: Vec2,
    cells: Vec<char>,
}

impl Grid {
    fn new(cols: usize, rows: usize, arena: Vec2) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            cell: Vec2::new(arena.x / cols as f32, arena.y / rows as f32),
            cells: vec![' '; cols * rows],
        }
    }

    /// Cell range covering `[lo, hi)` along one axis; at least one cell
    fn span(lo: f32, hi: f32, cell: f32, count: usize) -> Option<(usize, usize)> {
        let last = count as f32 - 1.0;
        let a = (lo / cell).floor();
        let b = ((hi / cell).ceil() - 1.0).max(a);
        if b < 0.0 || a > last {
            return None;
        }
        Some((a.max(0.0) as usize, b.min(last) as usize))
    }

    fn row(&mut self, r: usize, ch: char) {
        let start = r * self.cols;
        self.cells[start..start + self.cols].fill(ch);
    }

    fn rect(&mut self, rect: &Rect, ch: char) {
        let Some((c0, c1)) = Self::span(rect.left(), rect.right(), self.cell.x, self.cols) else {
            return;
        };
        let Some((r0, r1)) = Self::span(rect.top(), rect.bottom(), self.cell.y, self.rows) else {
            return;
        };
        for r in r0..=r1 {
            for c in c0..=c1 {
                self.cells[r * self.cols + c] = ch;
            }
        }
    }

    fn circle(&mut self, center: Vec2, radius: f32, ch: char) {
        let bounds = Rect::centered(center, Vec2::splat(radius * 2.0));
        let Some((c0, c1)) = Self::span(bounds.left(), bounds.right(), self.cell.x, self.cols) else {
            return;
        };
        let Some((r0, r1)) = Self::span(bounds.top(), bounds.bottom(), self.cell.y, self.rows) else {
            return;
        };
        for r in r0..=r1 {
            for c in c0..=c1 {
                let p = Vec2::new((c as f32 + 0.5) * self.cell.x, (r as f32 + 0.5) * self.cell.y);
                if p.distance_squared(center) <= radius * radius {
                    self.cells[r * self.cols + c] = ch;
                }
            }
        }
        // Small circles still show up
        let c = ((center.x / self.cell.x) as usize).min(self.cols - 1);
        let r = ((center.y / self.cell.y) as usize).min(self.rows - 1);
        self.cells[r * self.cols + c] = ch;
    }

    fn into_string(self) -> String {
        let mut out = String::with_capacity((self.cols + 1) * self.rows);
        for row in self.cells.chunks(self.cols) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

fn obstacle_glyph(theme: MapTheme) -> char {
    match theme {
        // Bush
        MapTheme::Grass => '*',
        // Igloo
        MapTheme::Snow => 'n',
        // Boulder
        MapTheme::Dirt => 'O',
    }
}

fn powerup_glyph(kind: PowerupKind, armed: bool) -> char {
    let ch = match kind {
        PowerupKind::Bomb => 'B',
        PowerupKind::Freeze => 'F',
        PowerupKind::BigBullet => 'G',
    };
    if armed { ch } else { ch.to_ascii_lowercase() }
}

fn status_line(frame: &RenderSnapshot) -> String {
    let phase = match frame.phase {
        MatchPhase::Playing => "playing".to_string(),
        MatchPhase::Paused => "PAUSED".to_string(),
        MatchPhase::Over { winner } => format!("{:?} WINS", winner),
    };
    let gun = |side: Side| if frame.players[side.index()].has_gun { "armed" } else { "empty" };
    format!(
        "tick {:>6} | L {:>2} - {:<2} R | {:?} | L {} / R {} | {}\n",
        frame.tick,
        frame.score.left,
        frame.score.right,
        frame.theme,
        gun(Side::Left),
        gun(Side::Right),
        phase
    )
}

/// Draw one snapshot onto a `cols` x `rows` grid covering `arena`
pub fn render_frame(frame: &RenderSnapshot, arena: Vec2, top_margin: f32, cols: usize, rows: usize) -> String {
    let mut grid = Grid::new(cols, rows, arena);

    // Everything above the margin line is off limits
    let margin_rows = (top_margin / grid.cell.y).round() as usize;
    for r in 0..margin_rows.min(grid.rows) {
        grid.row(r, '.');
    }

    let rock = obstacle_glyph(frame.theme);
    for obstacle in &frame.obstacles {
        grid.circle(obstacle.center, obstacle.radius, rock);
    }
    for powerup in &frame.powerups {
        grid.circle(powerup.center, powerup.radius, powerup_glyph(powerup.kind, powerup.armed));
    }
    for projectile in &frame.projectiles {
        let ch = if projectile.freezing {
            '~'
        } else if projectile.rotation.cos() >= 0.0 {
            '>'
        } else {
            '<'
        };
        grid.rect(&projectile.rect, ch);
    }
    for player in &frame.players {
        let ch = if player.frozen {
            '='
        } else if player.invincible && frame.tick % 8 < 4 {
            // Blink
            ':'
        } else if player.targeted {
            '@'
        } else {
            '#'
        };
        grid.rect(&player.rect, ch);
    }

    let mut out = status_line(frame);
    out.push_str(&grid.into_string());
    out
}

/// Writes every `every`-th snapshot as a character grid
pub struct TextRenderer<W: Write> {
    out: W,
    arena: Vec2,
    top_margin: f32,
    cols: usize,
    rows: usize,
    every: u64,
    frames: u64,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, arena: Vec2, top_margin: f32) -> Self {
        Self {
            out,
            arena,
            top_margin,
            cols: 80,
            rows: 24,
            every: 1,
            frames: 0,
        }
    }

    pub fn with_grid(mut self, cols: usize, rows: usize) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    /// Only draw one snapshot in `every`
    pub fn with_stride(mut self, every: u64) -> Self {
        self.every = every.max(1);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn draw(&mut self, frame: &RenderSnapshot) -> std::io::Result<()> {
        self.frames += 1;
        // Always show how a match ended
        if (self.frames - 1) % self.every != 0 && !matches!(frame.phase, MatchPhase::Over { .. }) {
            return Ok(());
        }
        let text = render_frame(frame, self.arena, self.top_margin, self.cols, self.rows);
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}
