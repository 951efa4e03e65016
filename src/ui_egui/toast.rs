//! Toast notifications, and the feedback sink that feeds them.
//!
//! The commit pipeline runs on a worker thread, so its feedback is sent
//! over a channel and turned into toasts on the UI thread.

use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use egui::{Color32, Context, Pos2, RichText};

use crate::interaction::commit::{FeedbackSink, UndoRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Success => "✓",
            ToastLevel::Info => "ℹ",
            ToastLevel::Warning => "⚠",
            ToastLevel::Error => "✗",
        }
    }

    pub fn background_color(&self, is_dark_theme: bool) -> Color32 {
        match (self, is_dark_theme) {
            (ToastLevel::Success, true) => Color32::from_rgb(30, 70, 40),
            (ToastLevel::Info, true) => Color32::from_rgb(30, 50, 80),
            (ToastLevel::Warning, true) => Color32::from_rgb(80, 60, 20),
            (ToastLevel::Error, true) => Color32::from_rgb(80, 30, 30),
            (ToastLevel::Success, false) => Color32::from_rgb(220, 255, 220),
            (ToastLevel::Info, false) => Color32::from_rgb(220, 235, 255),
            (ToastLevel::Warning, false) => Color32::from_rgb(255, 245, 200),
            (ToastLevel::Error, false) => Color32::from_rgb(255, 220, 220),
        }
    }

    pub fn text_color(&self, is_dark_theme: bool) -> Color32 {
        match (self, is_dark_theme) {
            (ToastLevel::Success, true) => Color32::from_rgb(100, 220, 120),
            (ToastLevel::Info, true) => Color32::from_rgb(100, 180, 255),
            (ToastLevel::Warning, true) => Color32::from_rgb(255, 200, 80),
            (ToastLevel::Error, true) => Color32::from_rgb(255, 120, 120),
            (ToastLevel::Success, false) => Color32::from_rgb(30, 120, 50),
            (ToastLevel::Info, false) => Color32::from_rgb(30, 80, 150),
            (ToastLevel::Warning, false) => Color32::from_rgb(150, 100, 0),
            (ToastLevel::Error, false) => Color32::from_rgb(180, 40, 40),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub created_at: Instant,
    pub duration: Duration,
    /// Set on "moved" toasts; clicking Undo reverts this move
    pub undo: Option<UndoRecord>,
}

impl Toast {
    pub fn new(message: impl Into<String>, level: ToastLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
            undo: None,
        }
    }

    pub fn with_undo(mut self, undo: UndoRecord) -> Self {
        self.undo = Some(undo);
        self.duration = Duration::from_secs(6);
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.duration
    }

    /// Fades out over the last half second.
    pub fn opacity(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.created_at);
        let fade_start = self.duration.saturating_sub(Duration::from_millis(500));

        if elapsed >= self.duration {
            0.0
        } else if elapsed >= fade_start {
            ((self.duration - elapsed).as_secs_f32() / 0.5).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[derive(Debug, Default)]
pub struct ToastManager {
    toasts: Vec<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.add(Toast::new(message, ToastLevel::Success));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Toast::new(message, ToastLevel::Info));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(Toast::new(message, ToastLevel::Warning));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.add(Toast::new(message, ToastLevel::Error));
    }

    pub fn cleanup(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    pub fn has_toasts(&self) -> bool {
        !self.toasts.is_empty()
    }

    /// Most recent undo offer still on screen.
    pub fn latest_undo(&self) -> Option<UndoRecord> {
        self.toasts.iter().rev().find_map(|t| t.undo)
    }

    /// Remove the undo offer for `event_id` once it has been used.
    pub fn clear_undo(&mut self, event_id: i64) {
        self.toasts
            .retain(|t| t.undo.map_or(true, |u| u.event_id != event_id));
    }

    /// Drain feedback from the commit worker into toasts.
    pub fn absorb(&mut self, feedback: &Receiver<FeedbackMessage>) {
        for message in feedback.try_iter() {
            match message {
                FeedbackMessage::OverlapBlocked(_) => {
                    self.warning("That time overlaps another event");
                }
                FeedbackMessage::Committed(undo) => {
                    self.add(Toast::new("Event moved", ToastLevel::Success).with_undo(undo));
                }
                FeedbackMessage::Failed { message, .. } => self.error(message),
            }
        }
    }

    /// Render all active toasts. Returns the undo record if an Undo
    /// button was clicked this frame.
    pub fn render(&mut self, ctx: &Context, is_dark_theme: bool) -> Option<UndoRecord> {
        let now = Instant::now();
        self.cleanup(now);

        if self.toasts.is_empty() {
            return None;
        }

        ctx.request_repaint();

        // Stack from the bottom-right corner upwards
        let screen_rect = ctx.screen_rect();
        let toast_width = 300.0;
        let toast_height = 40.0;
        let margin = 10.0;
        let spacing = 5.0;
        let mut clicked = None;

        for (i, toast) in self.toasts.iter().enumerate() {
            let opacity = toast.opacity(now);
            if opacity <= 0.0 {
                continue;
            }

            let y_offset = (i as f32) * (toast_height + spacing);
            let pos = Pos2::new(
                screen_rect.right() - toast_width - margin,
                screen_rect.bottom() - toast_height - margin - y_offset,
            );

            egui::Area::new(egui::Id::new(("toast", i)))
                .fixed_pos(pos)
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    let bg_color = toast.level.background_color(is_dark_theme);
                    let text_color = toast.level.text_color(is_dark_theme);
                    let bg_color = Color32::from_rgba_unmultiplied(
                        bg_color.r(),
                        bg_color.g(),
                        bg_color.b(),
                        (230.0 * opacity) as u8,
                    );
                    let text_color = text_color.gamma_multiply(opacity);

                    egui::Frame::none()
                        .fill(bg_color)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .stroke(egui::Stroke::new(1.0, text_color.gamma_multiply(0.3)))
                        .show(ui, |ui| {
                            ui.set_min_width(toast_width - 24.0);
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(toast.level.icon()).color(text_color).strong());
                                ui.label(RichText::new(&toast.message).color(text_color));
                                if let Some(undo) = toast.undo {
                                    if ui.small_button("Undo").clicked() {
                                        clicked = Some(undo);
                                    }
                                }
                            });
                        });
                });
        }

        clicked
    }
}

/// Feedback from the commit pipeline, sent to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackMessage {
    OverlapBlocked(i64),
    Committed(UndoRecord),
    Failed { event_id: i64, message: String },
}

/// [`FeedbackSink`] that forwards to a channel drained by [`ToastManager::absorb`].
#[derive(Debug)]
pub struct ChannelFeedback {
    sender: Sender<FeedbackMessage>,
}

impl ChannelFeedback {
    pub fn new(sender: Sender<FeedbackMessage>) -> Self {
        Self { sender }
    }

    fn send(&self, message: FeedbackMessage) {
        if self.sender.send(message).is_err() {
            log::debug!("Feedback receiver dropped, discarding message");
        }
    }
}

impl FeedbackSink for ChannelFeedback {
    fn overlap_blocked(&self, event_id: i64) {
        self.send(FeedbackMessage::OverlapBlocked(event_id));
    }

    fn committed(&self, undo: &UndoRecord) {
        self.send(FeedbackMessage::Committed(*undo));
    }

    fn failed(&self, event_id: i64, message: &str) {
        self.send(FeedbackMessage::Failed {
            event_id,
            message: message.to_string(),
        });
    }
}
