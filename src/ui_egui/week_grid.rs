//! Week time grid: an hour gutter and seven day columns.
//!
//! Layout is computed once per frame from the visible items, then used both
//! to hit-test presses and to paint. Painting reads the published
//! [`DragState`] so every column draws the in-flight ghost consistently.

use std::str::FromStr;
use std::time::Instant;

use chrono::{Datelike, NaiveDate, Timelike};
use chrono_tz::Tz;
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Rounding, Stroke, Vec2};

use crate::interaction::position::{GridGeometry, MINUTES_PER_DAY};
use crate::interaction::session::{BlockGeometry, DragState, GestureKind, GestureTarget};
use crate::interaction::snap_back::SnapBackAnimation;
use crate::models::event::{ItemKind, ScheduledEvent};

pub const TIME_LABEL_WIDTH: f32 = 56.0;
pub const HEADER_HEIGHT: f32 = 28.0;
/// Tallest bottom-edge strip that starts a resize instead of a move
pub const RESIZE_ZONE_HEIGHT: f32 = 10.0;
const BLOCK_INSET: f32 = 2.0;

/// Screen placement of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub event: ScheduledEvent,
    pub geometry: BlockGeometry,
    pub rect: Rect,
}

impl BlockLayout {
    /// Bottom strip of the block; short blocks give it a third of their
    /// height so the move zone stays reachable.
    pub fn resize_zone(&self) -> Rect {
        let zone = (self.rect.height() / 3.0).min(RESIZE_ZONE_HEIGHT);
        Rect::from_min_max(
            Pos2::new(self.rect.left(), self.rect.bottom() - zone),
            self.rect.max,
        )
    }

    pub fn target_at(&self, pos: Pos2) -> Option<GestureTarget> {
        if !self.rect.contains(pos) {
            return None;
        }
        let kind = if self.resize_zone().contains(pos) {
            GestureKind::ResizeBottom
        } else {
            GestureKind::Move
        };
        Some(GestureTarget::new(self.event.clone(), kind, self.geometry))
    }
}

#[derive(Debug, Clone)]
pub struct WeekLayout {
    pub geometry: GridGeometry,
    pub header: Rect,
    pub gutter: Rect,
    pub blocks: Vec<BlockLayout>,
}

impl WeekLayout {
    /// Total height the grid needs for a given hour height.
    pub fn content_height(hour_height: f32) -> f32 {
        HEADER_HEIGHT + 24.0 * hour_height
    }

    pub fn compute(
        rect: Rect,
        dates: &[NaiveDate],
        hour_height: f32,
        timezone: &str,
        events: &[ScheduledEvent],
    ) -> Self {
        let surface = Rect::from_min_size(
            Pos2::new(rect.left() + TIME_LABEL_WIDTH, rect.top() + HEADER_HEIGHT),
            Vec2::new(
                (rect.width() - TIME_LABEL_WIDTH).max(0.0),
                24.0 * hour_height,
            ),
        );
        let column_width = if dates.is_empty() {
            0.0
        } else {
            surface.width() / dates.len() as f32
        };
        let geometry = GridGeometry {
            surface,
            column_width,
            hour_height,
            column_dates: dates.to_vec(),
            timezone: timezone.to_string(),
        };

        let tz = Tz::from_str(timezone).unwrap_or(Tz::UTC);
        let blocks = events
            .iter()
            .filter_map(|event| place_block(&geometry, tz, event))
            .collect();

        Self {
            header: Rect::from_min_max(
                Pos2::new(surface.left(), rect.top()),
                Pos2::new(surface.right(), surface.top()),
            ),
            gutter: Rect::from_min_max(
                Pos2::new(rect.left(), surface.top()),
                Pos2::new(surface.left(), surface.bottom()),
            ),
            geometry,
            blocks,
        }
    }

    /// Topmost block under `pos`, with the gesture a press there starts.
    pub fn hit_test(&self, pos: Pos2) -> Option<GestureTarget> {
        self.blocks.iter().rev().find_map(|block| block.target_at(pos))
    }

    pub fn block(&self, event_id: i64) -> Option<&BlockLayout> {
        self.blocks.iter().find(|b| b.event.id == Some(event_id))
    }

    fn rect_for(&self, geometry: &BlockGeometry) -> Rect {
        self.geometry
            .block_rect(geometry.column, geometry.top, geometry.height)
            .shrink2(Vec2::new(BLOCK_INSET, 0.0))
    }

    fn rect_for_frame(&self, column: f32, top: f32, height: f32) -> Rect {
        let left = self.geometry.surface.left() + column * self.geometry.column_width;
        Rect::from_min_size(
            Pos2::new(left, self.geometry.surface.top() + top),
            Vec2::new(self.geometry.column_width, height),
        )
        .shrink2(Vec2::new(BLOCK_INSET, 0.0))
    }
}

fn place_block(geometry: &GridGeometry, tz: Tz, event: &ScheduledEvent) -> Option<BlockLayout> {
    let local_start = event.start.with_timezone(&tz);
    let column = geometry
        .column_dates
        .iter()
        .position(|date| *date == local_start.date_naive())?;

    let start_minutes = i64::from(local_start.hour()) * 60 + i64::from(local_start.minute());
    let minutes = event
        .duration()
        .num_minutes()
        .clamp(1, MINUTES_PER_DAY - start_minutes);

    let block = BlockGeometry {
        column,
        top: geometry.offset_for_minutes(start_minutes),
        height: geometry.offset_for_minutes(minutes),
    };
    let rect = geometry
        .block_rect(column, block.top, block.height)
        .shrink2(Vec2::new(BLOCK_INSET, 0.0));

    Some(BlockLayout {
        event: event.clone(),
        geometry: block,
        rect,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct GridPalette {
    pub background: Color32,
    pub hour_line: Color32,
    pub text: Color32,
    pub muted_text: Color32,
    pub event: Color32,
    pub task: Color32,
    pub ghost: Color32,
    pub overlap: Color32,
    pub today: Color32,
}

impl GridPalette {
    pub fn from_visuals(visuals: &egui::Visuals) -> Self {
        if visuals.dark_mode {
            Self {
                background: Color32::from_gray(24),
                hour_line: Color32::from_gray(50),
                text: Color32::from_gray(230),
                muted_text: Color32::from_gray(140),
                event: Color32::from_rgb(60, 110, 190),
                task: Color32::from_rgb(60, 150, 100),
                ghost: Color32::from_rgb(120, 170, 255),
                overlap: Color32::from_rgb(220, 70, 70),
                today: Color32::from_rgb(255, 100, 100),
            }
        } else {
            Self {
                background: Color32::WHITE,
                hour_line: Color32::from_gray(225),
                text: Color32::from_gray(20),
                muted_text: Color32::GRAY,
                event: Color32::from_rgb(70, 130, 220),
                task: Color32::from_rgb(70, 170, 110),
                ghost: Color32::from_rgb(40, 100, 220),
                overlap: Color32::from_rgb(210, 50, 50),
                today: Color32::from_rgb(255, 100, 100),
            }
        }
    }

    fn block_color(&self, kind: ItemKind) -> Color32 {
        match kind {
            ItemKind::Event => self.event,
            ItemKind::Task => self.task,
        }
    }
}

/// What the painter needs besides the layout.
pub struct PaintState<'a> {
    pub drag: Option<&'a DragState>,
    pub snap_back: Option<&'a SnapBackAnimation>,
    pub today: NaiveDate,
    pub now: Instant,
}

pub fn paint(painter: &Painter, layout: &WeekLayout, state: &PaintState<'_>, palette: &GridPalette) {
    let geometry = &layout.geometry;
    painter.rect_filled(geometry.surface, Rounding::ZERO, palette.background);
    paint_gutter_and_lines(painter, layout, palette);
    paint_headers(painter, layout, state.today, palette);

    let tz = Tz::from_str(&geometry.timezone).unwrap_or(Tz::UTC);
    let clip = painter.with_clip_rect(geometry.surface);

    for block in &layout.blocks {
        let Some(id) = block.event.id else {
            paint_block(&clip, block.rect, &block.event, tz, palette.block_color(block.event.kind), palette);
            continue;
        };

        if let Some(anim) = state.snap_back.filter(|a| a.event_id == id) {
            let frame = anim.frame_at(state.now);
            let rect = layout.rect_for_frame(frame.column, frame.top, frame.height);
            paint_block(&clip, rect, &block.event, tz, palette.block_color(block.event.kind), palette);
            continue;
        }

        match state.drag.filter(|d| d.event_id == id && d.shows_preview()) {
            Some(drag) if drag.is_committing() => {
                // The ghost stands in for the block until the commit settles
            }
            Some(_) => {
                let faded = palette.block_color(block.event.kind).gamma_multiply(0.35);
                paint_block(&clip, block.rect, &block.event, tz, faded, palette);
            }
            None => {
                paint_block(&clip, block.rect, &block.event, tz, palette.block_color(block.event.kind), palette);
            }
        }
    }

    if let Some(drag) = state.drag.filter(|d| d.shows_preview()) {
        paint_ghost(&clip, layout, drag, tz, palette);
    }

    paint_now_line(painter, layout, state.today, tz, palette);
}

fn paint_gutter_and_lines(painter: &Painter, layout: &WeekLayout, palette: &GridPalette) {
    let geometry = &layout.geometry;
    let surface = geometry.surface;

    for hour in 0..24 {
        let y = surface.top() + hour as f32 * geometry.hour_height;
        painter.line_segment(
            [Pos2::new(surface.left(), y), Pos2::new(surface.right(), y)],
            Stroke::new(1.0, palette.hour_line),
        );
        painter.text(
            Pos2::new(layout.gutter.right() - 6.0, y + 2.0),
            Align2::RIGHT_TOP,
            format!("{:02}:00", hour),
            FontId::proportional(12.0),
            palette.muted_text,
        );
    }

    for column in 0..=geometry.column_count() {
        let x = geometry.column_left(column);
        painter.line_segment(
            [Pos2::new(x, layout.header.top()), Pos2::new(x, surface.bottom())],
            Stroke::new(1.0, palette.hour_line),
        );
    }
}

fn paint_headers(painter: &Painter, layout: &WeekLayout, today: NaiveDate, palette: &GridPalette) {
    let geometry = &layout.geometry;
    for (column, date) in geometry.column_dates.iter().enumerate() {
        let center = Pos2::new(
            geometry.column_left(column) + geometry.column_width / 2.0,
            layout.header.center().y,
        );
        let color = if *date == today {
            palette.today
        } else {
            palette.text
        };
        painter.text(
            center,
            Align2::CENTER_CENTER,
            format!("{} {}", date.format("%a"), date.day()),
            FontId::proportional(13.0),
            color,
        );
    }
}

fn paint_block(
    painter: &Painter,
    rect: Rect,
    event: &ScheduledEvent,
    tz: Tz,
    fill: Color32,
    palette: &GridPalette,
) {
    painter.rect_filled(rect, Rounding::same(4.0), fill);

    let text_painter = painter.with_clip_rect(rect.intersect(painter.clip_rect()));
    let start = event.start.with_timezone(&tz);
    let end = event.end.with_timezone(&tz);
    text_painter.text(
        rect.left_top() + Vec2::new(4.0, 2.0),
        Align2::LEFT_TOP,
        &event.title,
        FontId::proportional(12.0),
        Color32::WHITE,
    );
    if rect.height() >= 30.0 {
        text_painter.text(
            rect.left_top() + Vec2::new(4.0, 16.0),
            Align2::LEFT_TOP,
            format!("{} - {}", start.format("%H:%M"), end.format("%H:%M")),
            FontId::proportional(11.0),
            Color32::WHITE.gamma_multiply(0.85),
        );
    }

    // Bottom-edge grip, as a hint that the block can be resized
    let grip_y = rect.bottom() - 3.0;
    let grip_half = (rect.width() / 2.0).min(20.0) / 2.0;
    painter.line_segment(
        [
            Pos2::new(rect.center().x - grip_half, grip_y),
            Pos2::new(rect.center().x + grip_half, grip_y),
        ],
        Stroke::new(2.0, palette.background.gamma_multiply(0.7)),
    );
}

fn paint_ghost(painter: &Painter, layout: &WeekLayout, drag: &DragState, tz: Tz, palette: &GridPalette) {
    let rect = layout.rect_for(&drag.preview_geometry);
    let accent = if drag.is_overlapping {
        palette.overlap
    } else {
        palette.ghost
    };

    painter.rect_filled(rect, Rounding::same(4.0), accent.gamma_multiply(0.25));
    painter.rect_stroke(rect, Rounding::same(4.0), Stroke::new(2.0, accent));

    if let Some(preview) = drag.preview {
        let start = preview.start.with_timezone(&tz);
        let end = preview.end.with_timezone(&tz);
        let label = if drag.is_overlapping {
            format!("{} - {} (overlaps)", start.format("%H:%M"), end.format("%H:%M"))
        } else {
            format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
        };
        painter.text(
            rect.left_top() + Vec2::new(4.0, 2.0),
            Align2::LEFT_TOP,
            label,
            FontId::proportional(12.0),
            accent,
        );
    }
}

fn paint_now_line(painter: &Painter, layout: &WeekLayout, today: NaiveDate, tz: Tz, palette: &GridPalette) {
    let geometry = &layout.geometry;
    let Some(column) = geometry.column_dates.iter().position(|d| *d == today) else {
        return;
    };

    let now = chrono::Utc::now().with_timezone(&tz);
    let minutes = i64::from(now.hour()) * 60 + i64::from(now.minute());
    let y = geometry.surface.top() + geometry.offset_for_minutes(minutes);
    let x_start = geometry.column_left(column);
    let x_end = x_start + geometry.column_width;

    painter.circle_filled(Pos2::new(x_start, y), 3.0, palette.today);
    painter.line_segment(
        [Pos2::new(x_start, y), Pos2::new(x_end, y)],
        Stroke::new(2.0, palette.today),
    );
}
