//! The planner window: a week grid wired to the drag engine.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context as _, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use egui::{Context, CursorIcon, Key, Modifiers, Sense, Vec2};

use super::input::{EguiInputAdapter, GlobalPointerCapture, InputAction};
use super::toast::{ChannelFeedback, FeedbackMessage, Toast, ToastLevel, ToastManager};
use super::week_grid::{self, GridPalette, PaintState, WeekLayout};
use crate::interaction::commit::{
    CommitAck, CommitError, CommitPipeline, CommitReport, CommitRequest, UndoRecord,
};
use crate::interaction::input::PointerSource;
use crate::interaction::machine::{GestureOutcome, GestureStateMachine};
use crate::interaction::session::GestureKind;
use crate::interaction::source::VisibleEventSet;
use crate::interaction::store::DragSessionStore;
use crate::interaction::timezone::{ChronoTzConverter, TimezoneConverter};
use crate::models::event::{ScheduledEvent, TimeRange};
use crate::models::settings::InteractionSettings;
use crate::services::event::SqliteEventStore;

/// Results coming back from the commit worker.
#[derive(Debug)]
enum WorkerMessage {
    Report(CommitReport),
    Undone {
        event_id: i64,
        result: std::result::Result<CommitAck, CommitError>,
    },
}

pub struct PlannerApp {
    settings: InteractionSettings,
    events: Arc<SqliteEventStore>,
    pipeline: Arc<CommitPipeline<SqliteEventStore>>,
    runtime: tokio::runtime::Runtime,
    machine: GestureStateMachine,
    input: EguiInputAdapter,
    capture: Arc<GlobalPointerCapture>,
    drag_store: DragSessionStore,
    worker_tx: Sender<WorkerMessage>,
    worker_rx: Receiver<WorkerMessage>,
    feedback: Receiver<FeedbackMessage>,
    toasts: ToastManager,
    week_start: NaiveDate,
    visible: VisibleEventSet,
    selected: Option<i64>,
}

impl PlannerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: InteractionSettings,
        db_path: &Path,
    ) -> Result<Self> {
        let path = db_path.to_string_lossy();
        let events = Arc::new(SqliteEventStore::open(&path)?);
        log::info!("Opened planner database at {}", path);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("planner-commit")
            .enable_all()
            .build()
            .context("Failed to start commit runtime")?;

        let (feedback_tx, feedback) = mpsc::channel();
        let pipeline = Arc::new(CommitPipeline::new(
            Arc::clone(&events),
            Arc::new(ChannelFeedback::new(feedback_tx)),
            settings.commit_timeout(),
        ));

        let capture = Arc::new(GlobalPointerCapture::default());
        let drag_store = DragSessionStore::global().clone();
        let machine = GestureStateMachine::new(
            settings.clone(),
            &drag_store,
            Arc::new(ChronoTzConverter),
            capture.clone(),
        );

        // Columns repaint whenever the drag projection changes
        let repaint_ctx = cc.egui_ctx.clone();
        drag_store.subscribe(move |_| repaint_ctx.request_repaint());

        let (worker_tx, worker_rx) = mpsc::channel();
        let week_start = week_start_for(today_in(&settings.timezone));

        let mut app = Self {
            input: EguiInputAdapter::new(&settings),
            settings,
            events,
            pipeline,
            runtime,
            machine,
            capture,
            drag_store,
            worker_tx,
            worker_rx,
            feedback,
            toasts: ToastManager::new(),
            week_start,
            visible: VisibleEventSet::default(),
            selected: None,
        };

        app.seed_if_empty();
        app.reload_visible();
        Ok(app)
    }

    fn week_dates(&self) -> Vec<NaiveDate> {
        (0..7).map(|d| self.week_start + Duration::days(d)).collect()
    }

    fn week_range(&self) -> TimeRange {
        let start = local_midnight(self.week_start, &self.settings.timezone);
        let end = local_midnight(self.week_start + Duration::days(7), &self.settings.timezone);
        TimeRange::new(start, end)
    }

    fn reload_visible(&mut self) {
        match self
            .events
            .load_visible(self.week_range(), &self.settings.timezone)
        {
            Ok(visible) => self.visible = visible,
            Err(e) => {
                log::error!("Failed to load events: {:#}", e);
                self.toasts.error("Could not load events");
            }
        }
    }

    fn seed_if_empty(&mut self) {
        let existing = self.events.with_service(|service| service.list_all());
        match existing {
            Ok(items) if items.is_empty() => {
                for event in demo_events(self.week_start, &self.settings.timezone) {
                    if let Err(e) = self.events.create(event) {
                        log::warn!("Failed to seed demo event: {:#}", e);
                    }
                }
                log::info!("Seeded demo events for the week of {}", self.week_start);
            }
            Ok(_) => {}
            Err(e) => log::error!("Failed to inspect events table: {:#}", e),
        }
    }

    fn set_week(&mut self, week_start: NaiveDate) {
        if !self.machine.is_idle() {
            self.machine.cancel();
        }
        self.input.reset();
        self.week_start = week_start;
        self.reload_visible();
    }

    fn drain_worker(&mut self, now: Instant) {
        while let Ok(message) = self.worker_rx.try_recv() {
            match message {
                WorkerMessage::Report(report) => {
                    let success = report.resolution.is_success();
                    self.machine.complete_commit(report, now);
                    if success {
                        self.reload_visible();
                    }
                }
                WorkerMessage::Undone { event_id, result } => {
                    if result.is_ok() {
                        self.toasts.clear_undo(event_id);
                        self.toasts.info("Move undone");
                        self.reload_visible();
                    }
                }
            }
        }
    }

    fn spawn_commit(&self, ctx: &Context, request: CommitRequest) {
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.worker_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let report = pipeline.run(request).await;
            if tx.send(WorkerMessage::Report(report)).is_err() {
                log::debug!("UI gone before commit report arrived");
            }
            ctx.request_repaint();
        });
    }

    fn spawn_undo(&self, ctx: &Context, record: UndoRecord) {
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.worker_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = pipeline.undo(&record).await;
            let _ = tx.send(WorkerMessage::Undone {
                event_id: record.event_id,
                result,
            });
            ctx.request_repaint();
        });
    }

    fn apply_action(&mut self, action: InputAction, layout: &WeekLayout, ctx: &Context, now: Instant) {
        match action {
            InputAction::Begin { target, event } => {
                let started = self
                    .machine
                    .begin(target, event, layout.geometry.clone(), &self.visible);
                if !started && event.source == PointerSource::Touch {
                    self.input.reject_touch();
                }
            }
            InputAction::Pointer(event) => {
                if let Some(outcome) = self.machine.handle(event) {
                    self.on_outcome(outcome, ctx, now);
                }
            }
            InputAction::Tap(target) => self.select(&target.event, now),
            InputAction::Cancel => {
                if let Some(outcome) = self.machine.cancel() {
                    self.on_outcome(outcome, ctx, now);
                }
            }
        }
    }

    fn on_outcome(&mut self, outcome: GestureOutcome, ctx: &Context, now: Instant) {
        match outcome {
            GestureOutcome::Click(event) => self.select(&event, now),
            GestureOutcome::Commit(request) => self.spawn_commit(ctx, request),
            GestureOutcome::Cancelled { event_id } => {
                log::debug!("Gesture on event {} cancelled", event_id);
            }
            GestureOutcome::Unchanged { event_id } => {
                log::debug!("Event {} dropped back on its own slot", event_id);
            }
        }
    }

    fn select(&mut self, event: &ScheduledEvent, now: Instant) {
        let Some(id) = event.id else {
            return;
        };
        if self.drag_store.was_recently_completed(id, now) {
            return;
        }
        self.selected = Some(id);
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("◀").clicked() {
                self.set_week(self.week_start - Duration::days(7));
            }
            if ui.button("Today").clicked() {
                self.set_week(week_start_for(today_in(&self.settings.timezone)));
            }
            if ui.button("▶").clicked() {
                self.set_week(self.week_start + Duration::days(7));
            }
            ui.separator();
            ui.heading(format!(
                "Week of {}",
                self.week_start.format("%B %-d, %Y")
            ));
            ui.separator();

            let selected = self.selected.and_then(|id| self.visible.get(id));
            if let Some(event) = selected {
                ui.label(format!("Selected: {}", event.title));
            }
        });
    }

    fn show_grid(&mut self, ui: &mut egui::Ui, now: Instant) {
        let hour_height = self.settings.hour_height_px;
        let size = Vec2::new(ui.available_width(), WeekLayout::content_height(hour_height));
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

        let layout = WeekLayout::compute(
            rect,
            &self.week_dates(),
            hour_height,
            &self.settings.timezone,
            self.visible.items(),
        );

        let clip = ui.clip_rect();
        let events = ui.input(|i| i.events.clone());
        let actions = self.input.collect(
            &events,
            |pos| {
                if clip.contains(pos) {
                    layout.hit_test(pos)
                } else {
                    None
                }
            },
            now,
        );
        for action in actions {
            self.apply_action(action, &layout, ui.ctx(), now);
        }

        let drag = self.drag_store.current();
        match drag.as_ref() {
            Some(state) if state.is_dragging() => ui.ctx().set_cursor_icon(CursorIcon::Grabbing),
            Some(state) if state.is_resizing() => {
                ui.ctx().set_cursor_icon(CursorIcon::ResizeVertical)
            }
            _ => {
                if let Some(target) = response.hover_pos().and_then(|pos| layout.hit_test(pos)) {
                    let icon = match target.kind {
                        GestureKind::Move => CursorIcon::Grab,
                        GestureKind::ResizeBottom => CursorIcon::ResizeVertical,
                    };
                    ui.ctx().set_cursor_icon(icon);
                }
            }
        }

        let snap_back = self.drag_store.snap_back(now);
        let state = PaintState {
            drag: drag.as_ref(),
            snap_back: snap_back.as_ref(),
            today: today_in(&self.settings.timezone),
            now,
        };
        week_grid::paint(ui.painter(), &layout, &state, &GridPalette::from_visuals(ui.visuals()));

        if snap_back.is_some() {
            ui.ctx().request_repaint();
        }
    }

    fn show_confirmation(&mut self, ctx: &Context) {
        let Some(pending) = self.events.pending_confirmation() else {
            return;
        };

        let tz = &self.settings.timezone;
        let when = format_local(pending.requested, tz);
        let mut decision = None;

        egui::Window::new("Move recurring event")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "\"{}\" repeats. Move the whole series to {}?",
                    pending.title, when
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Move series").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });

        match decision {
            Some(true) => {
                match self.events.confirm_pending(pending.event_id) {
                    Ok(undo) => {
                        self.toasts
                            .add(Toast::new("Series moved", ToastLevel::Success).with_undo(undo));
                    }
                    Err(e) if e.is_overlap() => self.toasts.warning("That time overlaps another event"),
                    Err(e) => {
                        log::error!("Failed to move series {}: {}", pending.event_id, e);
                        self.toasts.error(e.to_string());
                    }
                }
                self.reload_visible();
            }
            Some(false) => {
                self.events.dismiss_pending(pending.event_id);
            }
            None => {}
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        let undo_pressed = ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Z));
        if undo_pressed && self.machine.is_idle() {
            if let Some(record) = self.toasts.latest_undo() {
                self.spawn_undo(ctx, record);
            }
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_worker(now);
        self.toasts.absorb(&self.feedback);
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.show_toolbar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .enable_scrolling(!self.capture.is_active())
                .auto_shrink([false, false])
                .show(ui, |ui| self.show_grid(ui, now));
        });

        self.show_confirmation(ctx);

        if let Some(record) = self.toasts.render(ctx, ctx.style().visuals.dark_mode) {
            self.spawn_undo(ctx, record);
        }

        if !self.machine.is_idle() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.input.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

fn today_in(timezone: &str) -> NaiveDate {
    match timezone.parse::<chrono_tz::Tz>() {
        Ok(tz) => Utc::now().with_timezone(&tz).date_naive(),
        Err(_) => Utc::now().date_naive(),
    }
}

fn week_start_for(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn local_midnight(date: NaiveDate, timezone: &str) -> chrono::DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    ChronoTzConverter
        .to_instant(local, timezone)
        .unwrap_or_else(|| local.and_utc())
}

fn format_local(range: TimeRange, timezone: &str) -> String {
    match timezone.parse::<chrono_tz::Tz>() {
        Ok(tz) => {
            let start = range.start.with_timezone(&tz);
            let end = range.end.with_timezone(&tz);
            format!("{} {} - {}", start.format("%a %-d %b"), start.format("%H:%M"), end.format("%H:%M"))
        }
        Err(_) => format!("{} - {}", range.start, range.end),
    }
}

fn demo_events(week_start: NaiveDate, timezone: &str) -> Vec<ScheduledEvent> {
    let slot = |day: i64, hour: u32, minutes: i64| {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let local = (week_start + Duration::days(day)).and_time(time);
        let start = ChronoTzConverter
            .to_instant(local, timezone)
            .unwrap_or_else(|| local.and_utc());
        (start, start + Duration::minutes(minutes))
    };

    let specs: [(&str, i64, u32, i64, Option<&str>); 5] = [
        ("Team standup", 0, 9, 30, Some("FREQ=DAILY")),
        ("Design review", 1, 10, 60, None),
        ("Lunch with Sam", 2, 12, 60, None),
        ("Write report", 2, 14, 90, None),
        ("Planning", 4, 15, 45, None),
    ];

    specs
        .iter()
        .filter_map(|(title, day, hour, minutes, rule)| {
            let (start, end) = slot(*day, *hour, *minutes);
            let mut builder = ScheduledEvent::builder().title(*title).start(start).end(end);
            if let Some(rule) = rule {
                builder = builder.recurrence_rule(*rule);
            }
            builder.build().ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_starts_on_monday() {
        let thursday = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();
        assert_eq!(
            week_start_for(thursday),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(week_start_for(monday), monday);
    }

    #[test]
    fn test_local_midnight_uses_zone() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(local_midnight(date, "UTC"), date.and_time(NaiveTime::MIN).and_utc());
        assert_eq!(
            local_midnight(date, "Europe/Berlin"),
            date.and_hms_opt(0, 0, 0).unwrap().and_utc() - Duration::hours(1)
        );
        assert_eq!(local_midnight(date, "Nowhere/Else"), date.and_time(NaiveTime::MIN).and_utc());
    }

    #[test]
    fn test_demo_events_are_valid_and_in_week() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let events = demo_events(monday, "UTC");
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| e.validate().is_ok()));
        assert!(events.iter().any(|e| e.is_recurring()));
        assert!(events
            .iter()
            .all(|e| e.start.date_naive() >= monday && e.start.date_naive() < monday + Duration::days(7)));
    }
}
