//! One application row: its view state machine, the mapping from gestures
//! to package operations, and its egui rendering.

use eframe::epaint::StrokeKind;
use egui::{
    Align, Button, Color32, CornerRadius, Frame, Layout, Margin, Rect, Response, RichText, Sense,
    Stroke, Ui, UiBuilder, Vec2,
};
use tracing::{debug, info};

use crate::operation::{OperationHandle, PackageBackend, Settlement};
use crate::shell::Shell;
use crate::types::{ApplicationEntry, ProgressData, StateColors};

pub const INSTALLING: &str = "Installing";
pub const REMOVING: &str = "Removing";
pub const WAITING: &str = "Waiting for other programs to finish";

const ROW_HEIGHT: f32 = 52.0;
const ROW_HEIGHT_WITH_ERROR: f32 = 84.0;
const NAME_WIDTH: f32 = 200.0;
const ACTION_WIDTH: f32 = 110.0;

const ERROR_FILL: Color32 = Color32::from_rgb(253, 236, 234);
const ERROR_TEXT: Color32 = Color32::from_rgb(163, 28, 28);
const DANGER_FILL: Color32 = Color32::from_rgb(201, 25, 11);

const ROW_COLORS: StateColors = StateColors {
    default: Color32::WHITE,
    hover: Color32::from_rgb(245, 247, 250),
    busy: Color32::from_rgb(250, 250, 244),
};

pub enum RowViewState {
    /// No operation in flight; `error` lingers from the last failed attempt.
    Idle { error: Option<String> },
    Busy {
        title: &'static str,
        progress: Option<ProgressData>,
        operation: OperationHandle,
    },
}

impl Default for RowViewState {
    fn default() -> Self {
        RowViewState::Idle { error: None }
    }
}

#[derive(Debug, PartialEq)]
pub enum NameCell<'a> {
    Plain(&'a str),
    /// Clicking launches the installed application.
    Launch(&'a str),
}

#[derive(Debug, PartialEq)]
pub enum SummaryCell<'a> {
    Summary {
        text: &'a str,
        error: Option<&'a str>,
    },
    Progress {
        title: &'a str,
        progress: Option<&'a ProgressData>,
    },
}

#[derive(Debug, PartialEq)]
pub enum ActionCell {
    Install,
    Remove,
    /// Enabled only while the payload carries a cancellation capability.
    Cancel { enabled: bool },
}

#[derive(Debug, PartialEq)]
pub struct RowView<'a> {
    pub name: NameCell<'a>,
    pub summary: SummaryCell<'a>,
    pub action: ActionCell,
}

/// Gestures collected while drawing one row.
///
/// Every inner control marks the click as consumed; the row-level handler
/// only runs for clicks nothing else consumed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RowInput {
    pub name_clicked: bool,
    pub action_clicked: bool,
    pub dismiss_clicked: bool,
    pub cancel_clicked: bool,
    pub row_clicked: bool,
}

impl RowInput {
    pub fn consumed(&self) -> bool {
        self.name_clicked || self.action_clicked || self.dismiss_clicked || self.cancel_clicked
    }
}

pub struct RowContext<'a> {
    pub backend: &'a dyn PackageBackend,
    pub shell: &'a mut dyn Shell,
}

#[derive(Default)]
pub struct RowController {
    state: RowViewState,
}

impl RowController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RowViewState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, RowViewState::Busy { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RowViewState::Idle { error } => error.as_deref(),
            RowViewState::Busy { .. } => None,
        }
    }

    /// Launch the application if it is installed.
    pub fn on_activate_row(&self, entry: &ApplicationEntry, shell: &mut dyn Shell) {
        if entry.installed {
            shell.launch(entry);
        }
    }

    /// Install or remove depending on the entry's install state.
    pub fn on_action_button_press(&mut self, entry: &ApplicationEntry, backend: &dyn PackageBackend) {
        if self.is_busy() {
            debug!(id = %entry.id, "operation already running, ignoring press");
            return;
        }
        let (title, operation) = if entry.installed {
            (REMOVING, backend.remove(&entry.file))
        } else {
            (INSTALLING, backend.install(&entry.pkgname))
        };
        info!(id = %entry.id, "{title} {}", entry.name);
        self.state = RowViewState::Busy {
            title,
            progress: None,
            operation,
        };
    }

    pub fn on_dismiss_error(&mut self) {
        if let RowViewState::Idle { error } = &mut self.state {
            error.take();
        }
    }

    /// Forward a cancellation request through the current progress payload.
    pub fn on_cancel_press(&self) {
        if let RowViewState::Busy {
            progress: Some(ProgressData {
                cancel: Some(cancel),
                ..
            }),
            ..
        } = &self.state
        {
            cancel.request();
        }
    }

    /// Apply pending operation events. Returns the settlement when the
    /// in-flight operation finished during this call.
    pub fn pump(&mut self, shell: &mut dyn Shell) -> Option<Settlement> {
        let RowViewState::Busy {
            progress,
            operation,
            ..
        } = &mut self.state
        else {
            return None;
        };
        let result = operation.drain(progress)?;
        report_settlement(&result, shell);
        self.state = RowViewState::Idle {
            error: failure_message(&result),
        };
        Some(result)
    }

    /// Describe the cells according to the install state and view state.
    pub fn view<'a>(&'a self, entry: &'a ApplicationEntry) -> RowView<'a> {
        let name = if entry.installed {
            NameCell::Launch(&entry.name)
        } else {
            NameCell::Plain(&entry.name)
        };
        match &self.state {
            RowViewState::Busy {
                title, progress, ..
            } => RowView {
                name,
                summary: SummaryCell::Progress {
                    title: *title,
                    progress: progress.as_ref(),
                },
                action: ActionCell::Cancel {
                    enabled: progress.as_ref().is_some_and(|p| p.cancel.is_some()),
                },
            },
            RowViewState::Idle { error } => RowView {
                name,
                summary: SummaryCell::Summary {
                    text: &entry.summary,
                    error: error.as_deref(),
                },
                action: if entry.installed {
                    ActionCell::Remove
                } else {
                    ActionCell::Install
                },
            },
        }
    }

    /// Dispatch collected gestures.
    pub fn apply(
        &mut self,
        input: RowInput,
        entry: &ApplicationEntry,
        backend: &dyn PackageBackend,
        shell: &mut dyn Shell,
    ) {
        if input.name_clicked {
            self.on_activate_row(entry, shell);
        }
        if input.dismiss_clicked {
            self.on_dismiss_error();
        }
        if input.cancel_clicked {
            self.on_cancel_press();
        }
        if input.action_clicked {
            self.on_action_button_press(entry, backend);
        }
        if input.row_clicked && !input.consumed() {
            shell.navigate(&entry.id);
        }
    }

    pub fn show(&mut self, ui: &mut Ui, entry: &ApplicationEntry, ctx: &mut RowContext<'_>) {
        let input = self.draw(ui, entry);
        self.apply(input, entry, ctx.backend, &mut *ctx.shell);
    }

    fn draw(&self, ui: &mut Ui, entry: &ApplicationEntry) -> RowInput {
        let view = self.view(entry);
        let height = match view.summary {
            SummaryCell::Summary { error: Some(_), .. } => ROW_HEIGHT_WITH_ERROR,
            _ => ROW_HEIGHT,
        };

        // Row background first so the cells drawn afterwards sit on top of it
        // for hit testing.
        let size = Vec2::new(ui.available_width(), height);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());
        let mut input = RowInput {
            row_clicked: response.clicked(),
            ..Default::default()
        };
        if !ui.is_rect_visible(rect) {
            return input;
        }
        paint_background(ui, rect, &response, &ROW_COLORS, self.is_busy());

        let mut cells = ui.new_child(
            UiBuilder::new()
                .max_rect(rect.shrink2(Vec2::new(10.0, 6.0)))
                .layout(Layout::left_to_right(Align::Center)),
        );
        let inner_height = cells.available_height();

        cells.allocate_ui_with_layout(
            Vec2::new(NAME_WIDTH, inner_height),
            Layout::left_to_right(Align::Center),
            |ui| {
                ui.set_min_width(NAME_WIDTH);
                match view.name {
                    NameCell::Plain(name) => {
                        ui.label(RichText::new(name).strong());
                    }
                    NameCell::Launch(name) => {
                        if ui
                            .link(RichText::new(name).strong())
                            .on_hover_text("Launch")
                            .clicked()
                        {
                            input.name_clicked = true;
                        }
                    }
                }
            },
        );

        let summary_width = (cells.available_width() - ACTION_WIDTH).max(80.0);
        cells.allocate_ui_with_layout(
            Vec2::new(summary_width, inner_height),
            Layout::top_down(Align::Min),
            |ui| {
                ui.set_min_width(summary_width);
                match view.summary {
                    SummaryCell::Summary { text, error } => {
                        ui.label(text);
                        if let Some(message) = error {
                            if error_banner(ui, message) {
                                input.dismiss_clicked = true;
                            }
                        }
                    }
                    SummaryCell::Progress { title, progress } => {
                        progress_bar(ui, title, progress);
                    }
                }
            },
        );

        cells.with_layout(Layout::right_to_left(Align::Center), |ui| match view.action {
            ActionCell::Install => {
                if ui.button("Install").clicked() {
                    input.action_clicked = true;
                }
            }
            ActionCell::Remove => {
                let remove = Button::new(RichText::new("Remove").color(Color32::WHITE)).fill(DANGER_FILL);
                if ui.add(remove).clicked() {
                    input.action_clicked = true;
                }
            }
            ActionCell::Cancel { enabled } => {
                if ui.add_enabled(enabled, Button::new("Cancel")).clicked() {
                    input.cancel_clicked = true;
                }
            }
        });

        input
    }
}

/// Error text a settlement leaves on its component. Cancellation is
/// user-initiated and leaves none.
pub(crate) fn failure_message(result: &Settlement) -> Option<String> {
    match result {
        Err(e) if !e.is_cancelled() => Some(e.to_string()),
        _ => None,
    }
}

/// Send a failed settlement to the shell; cancellation is only logged.
pub(crate) fn report_settlement(result: &Settlement, shell: &mut dyn Shell) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => info!("operation cancelled"),
        Err(e) => shell.report_error(&e.to_string()),
    }
}

/// Progress bar shared by rows and the list header.
pub(crate) fn progress_bar(ui: &mut Ui, title: &str, progress: Option<&ProgressData>) {
    let waiting = progress.is_some_and(|p| p.waiting);
    let fraction = progress.and_then(ProgressData::fraction);
    let text = match (waiting, fraction) {
        (true, _) => WAITING.to_string(),
        (false, Some(f)) => format!("{title} {:.0}%", f * 100.0),
        (false, None) => title.to_string(),
    };
    let bar = egui::ProgressBar::new(fraction.unwrap_or(0.0))
        .text(text)
        .desired_height(18.0)
        .animate(waiting || fraction.is_none());
    let response = ui.add(bar);
    if let Some(message) = progress.and_then(|p| p.message.as_deref()) {
        response.on_hover_text(message);
    }
}

/// Inline dismissible error. Returns true when dismissed.
fn error_banner(ui: &mut Ui, message: &str) -> bool {
    let mut dismissed = false;
    Frame::new()
        .fill(ERROR_FILL)
        .stroke(Stroke::new(1.0, ERROR_TEXT))
        .corner_radius(CornerRadius::same(3))
        .inner_margin(Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(ERROR_TEXT, format!("⚠ {message}"));
                if ui.small_button("✖").on_hover_text("Dismiss").clicked() {
                    dismissed = true;
                }
            });
        });
    dismissed
}

fn row_fill(colors: &StateColors, hovered: bool, busy: bool) -> Color32 {
    if busy {
        colors.busy
    } else if hovered {
        colors.hover
    } else {
        colors.default
    }
}

fn paint_background(ui: &Ui, rect: Rect, response: &Response, colors: &StateColors, busy: bool) {
    let fill = row_fill(colors, response.hovered(), busy);
    let stroke = ui.visuals().widgets.noninteractive.bg_stroke;
    ui.painter().rect_filled(rect, 2.0, fill);
    ui.painter().rect_stroke(rect, 2.0, stroke, StrokeKind::Middle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::test_support::{Call, FakeBackend, FakeShell, entry, progress};
    use crate::types::CancelHandle;
    use std::path::PathBuf;

    fn start_install(row: &mut RowController, backend: &FakeBackend) -> ApplicationEntry {
        let app = entry("a", "App", false);
        row.on_action_button_press(&app, backend);
        app
    }

    #[test]
    fn install_press_goes_busy_before_any_progress() {
        let backend = FakeBackend::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        match row.state() {
            RowViewState::Busy {
                title, progress, ..
            } => {
                assert_eq!(*title, "Installing");
                assert!(progress.is_none());
            }
            RowViewState::Idle { .. } => panic!("row should be busy"),
        }
        assert_eq!(*backend.calls.borrow(), vec![Call::Install("a-pkg".into())]);
    }

    #[test]
    fn install_success_returns_to_idle_without_error() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        backend.take_last().settle(Ok(()));
        assert_eq!(row.pump(&mut shell), Some(Ok(())));
        assert!(matches!(row.state(), RowViewState::Idle { error: None }));
        assert!(shell.errors.is_empty());
    }

    #[test]
    fn install_failure_keeps_error_and_reports_once() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        backend
            .take_last()
            .settle(Err(OperationError::Failed("disk full".into())));
        row.pump(&mut shell);

        assert!(!row.is_busy());
        assert_eq!(row.error(), Some("disk full"));
        assert_eq!(shell.errors, vec!["disk full".to_string()]);

        // nothing left to settle
        assert_eq!(row.pump(&mut shell), None);
        assert_eq!(shell.errors.len(), 1);
    }

    #[test]
    fn installed_entry_press_removes_by_file() {
        let backend = FakeBackend::default();
        let mut row = RowController::new();
        let app = entry("a", "App", true);
        row.on_action_button_press(&app, &backend);

        assert!(matches!(
            row.state(),
            RowViewState::Busy { title: "Removing", .. }
        ));
        assert_eq!(
            *backend.calls.borrow(),
            vec![Call::Remove(PathBuf::from("/usr/share/metainfo/a.metainfo.xml"))]
        );
    }

    #[test]
    fn press_while_busy_is_ignored() {
        let backend = FakeBackend::default();
        let mut row = RowController::new();
        let app = start_install(&mut row, &backend);
        row.on_action_button_press(&app, &backend);

        assert_eq!(backend.call_count(), 1);
        assert!(row.is_busy());
    }

    #[test]
    fn latest_progress_wins() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        let settler = backend.take_last();
        settler.progress(progress(10));
        settler.progress(progress(60));
        assert_eq!(row.pump(&mut shell), None);

        match row.state() {
            RowViewState::Busy { progress, .. } => {
                assert_eq!(progress.as_ref().and_then(|p| p.percentage), Some(60));
            }
            RowViewState::Idle { .. } => panic!("row should still be busy"),
        }
    }

    #[test]
    fn abandoned_operation_still_settles_to_idle() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        drop(backend.take_last());
        assert_eq!(row.pump(&mut shell), Some(Err(OperationError::Aborted)));
        assert!(!row.is_busy());
        assert_eq!(shell.errors.len(), 1);
    }

    #[test]
    fn cancellation_settles_quietly() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        let settler = backend.take_last();
        let mut payload = progress(30);
        payload.cancel = Some(settler.cancel_handle().clone());
        settler.progress(payload);
        row.pump(&mut shell);

        row.on_cancel_press();
        assert!(settler.is_cancelled());

        settler.settle(Err(OperationError::Cancelled));
        row.pump(&mut shell);
        assert!(matches!(row.state(), RowViewState::Idle { error: None }));
        assert!(shell.errors.is_empty());
    }

    #[test]
    fn cancel_without_capability_does_nothing() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);

        let settler = backend.take_last();
        settler.progress(progress(30));
        row.pump(&mut shell);
        assert_eq!(
            row.view(&entry("gimp", "GIMP", false)).action,
            ActionCell::Cancel { enabled: false }
        );

        row.on_cancel_press();
        assert!(!settler.is_cancelled());
        assert!(row.is_busy());
    }

    #[test]
    fn settlement_helpers_keep_cancellation_quiet() {
        let mut shell = FakeShell::default();
        let cancelled: Settlement = Err(OperationError::Cancelled);
        let failed: Settlement = Err(OperationError::Failed("disk full".into()));

        report_settlement(&Ok(()), &mut shell);
        report_settlement(&cancelled, &mut shell);
        assert!(shell.errors.is_empty());
        assert_eq!(failure_message(&cancelled), None);

        report_settlement(&failed, &mut shell);
        assert_eq!(shell.errors, vec!["disk full".to_string()]);
        assert_eq!(failure_message(&failed).as_deref(), Some("disk full"));
    }

    #[test]
    fn busy_fill_wins_over_hover() {
        assert_eq!(row_fill(&ROW_COLORS, false, false), ROW_COLORS.default);
        assert_eq!(row_fill(&ROW_COLORS, true, false), ROW_COLORS.hover);
        assert_eq!(row_fill(&ROW_COLORS, true, true), ROW_COLORS.busy);
        assert_ne!(ROW_COLORS.busy, ROW_COLORS.hover);
    }

    #[test]
    fn dismiss_error_clears_only_the_error() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();

        row.on_dismiss_error();
        assert!(matches!(row.state(), RowViewState::Idle { error: None }));

        start_install(&mut row, &backend);
        backend
            .take_last()
            .settle(Err(OperationError::Failed("disk full".into())));
        row.pump(&mut shell);

        row.on_dismiss_error();
        assert!(matches!(row.state(), RowViewState::Idle { error: None }));
    }

    #[test]
    fn dismiss_while_busy_keeps_busy() {
        let backend = FakeBackend::default();
        let mut row = RowController::new();
        start_install(&mut row, &backend);
        row.on_dismiss_error();
        assert!(row.is_busy());
    }

    #[test]
    fn activate_launches_only_installed_entries() {
        let row = RowController::new();
        let mut shell = FakeShell::default();
        row.on_activate_row(&entry("a", "App", false), &mut shell);
        assert!(shell.launched.is_empty());
        row.on_activate_row(&entry("b", "Other", true), &mut shell);
        assert_eq!(shell.launched, vec!["b".to_string()]);
    }

    #[test]
    fn view_follows_rendering_table() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let available = entry("a", "App", false);
        let installed = entry("b", "Other", true);
        let mut row = RowController::new();

        assert_eq!(
            row.view(&available),
            RowView {
                name: NameCell::Plain("App"),
                summary: SummaryCell::Summary {
                    text: "App summary",
                    error: None
                },
                action: ActionCell::Install,
            }
        );
        assert_eq!(
            row.view(&installed),
            RowView {
                name: NameCell::Launch("Other"),
                summary: SummaryCell::Summary {
                    text: "Other summary",
                    error: None
                },
                action: ActionCell::Remove,
            }
        );

        row.on_action_button_press(&available, &backend);
        let settler = backend.take_last();
        let busy = row.view(&available);
        assert_eq!(
            busy.summary,
            SummaryCell::Progress {
                title: "Installing",
                progress: None
            }
        );
        assert_eq!(busy.action, ActionCell::Cancel { enabled: false });

        let mut payload = progress(5);
        payload.cancel = Some(CancelHandle::new());
        settler.progress(payload);
        row.pump(&mut shell);
        assert_eq!(row.view(&available).action, ActionCell::Cancel { enabled: true });

        settler.settle(Err(OperationError::Failed("disk full".into())));
        row.pump(&mut shell);
        assert_eq!(
            row.view(&available).summary,
            SummaryCell::Summary {
                text: "App summary",
                error: Some("disk full")
            }
        );
        assert_eq!(row.view(&available).action, ActionCell::Install);
    }

    #[test]
    fn inner_controls_stop_row_navigation() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        let app = entry("a", "App", false);

        let press = RowInput {
            action_clicked: true,
            row_clicked: true,
            ..Default::default()
        };
        row.apply(press, &app, &backend, &mut shell);
        assert!(shell.navigated.is_empty());
        assert!(row.is_busy());
    }

    #[test]
    fn plain_row_click_navigates() {
        let backend = FakeBackend::default();
        let mut shell = FakeShell::default();
        let mut row = RowController::new();
        let app = entry("a", "App", true);

        let click = RowInput {
            row_clicked: true,
            ..Default::default()
        };
        row.apply(click, &app, &backend, &mut shell);
        assert_eq!(shell.navigated, vec!["a".to_string()]);
        assert!(shell.launched.is_empty());

        let name = RowInput {
            name_clicked: true,
            row_clicked: true,
            ..Default::default()
        };
        row.apply(name, &app, &backend, &mut shell);
        assert_eq!(shell.launched, vec!["a".to_string()]);
        assert_eq!(shell.navigated.len(), 1);
    }
}
