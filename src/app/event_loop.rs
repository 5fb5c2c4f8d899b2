use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::document::is_markdown_file;
use crate::gateway::{FsGateway, resolve_path};
use crate::pipeline::RenderPipeline;
use crate::session::{FileSnapshotStore, SessionManager};
use crate::ui::TerminalSurface;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop hits
    /// an I/O failure. Document failures are shown as toasts instead.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; mkreader requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let model = self.build_model((size.width, size.height));

        execute!(stdout(), EnableMouseCapture)?;
        let result = self.event_loop(&mut terminal, model);

        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Create the session, restore or open the startup documents and wrap
    /// everything in a model sized for the terminal.
    pub(super) fn build_model(&self, terminal_size: (u16, u16)) -> Model {
        let surface = TerminalSurface::new(terminal_size.0, terminal_size.1);
        let mut session = SessionManager::new(
            FsGateway::new(),
            FileSnapshotStore::new(&self.snapshot_path),
            surface,
            self.options.clone(),
        )
        .with_pipeline(RenderPipeline::standard(self.diagrams, self.highlight));
        session.outline_mut().set_visible(self.outline_visible);

        let startup_scope = crate::perf::scope("app.startup");
        let report = session.startup(&self.files, self.restore);
        drop(startup_scope);
        tracing::info!(
            restored = report.restore.restored.len(),
            skipped = report.restore.skipped.len(),
            opened = report.opened.is_some(),
            "session started"
        );

        // Extra command-line files open as background tabs.
        if let Some(first) = report.opened {
            let rest: Vec<&PathBuf> = self
                .files
                .iter()
                .filter(|path| is_markdown_file(path))
                .filter(|path| session.registry().find_by_path(&resolve_path(path)) != Some(first))
                .collect();
            for (path, result) in session.open_many(&rest) {
                if let Err(err) = result {
                    tracing::warn!(path = %path.display(), error = %err, "could not open file");
                }
            }
            if let Err(err) = session.switch_to(first) {
                tracing::warn!(error = %err, "could not reactivate startup document");
            }
        }

        let mut model = Model::new(session, terminal_size);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model.report_session_events();
        if let Some(err) = report.error {
            model.show_toast(ToastLevel::Error, err.to_string());
        }
        model
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, mut model: Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                model = update(model, Message::Resize(width, height));
                needs_render = true;
            }

            // Watch signals and queued render passes run between events.
            let tick = model.session.tick();
            if tick.changed() {
                crate::perf::log_event(
                    "session.tick",
                    format!(
                        "frame={frame_idx} reloaded={} passes={} stale={}",
                        tick.reloaded.len(),
                        tick.passes_run,
                        tick.stale_dropped
                    ),
                );
                needs_render = true;
            }
            if model.report_session_events() {
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if resize_debouncer.is_pending() || model.session.is_busy() {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let msg =
                    self.handle_event(&event::read()?, &model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    model = self.dispatch(model, msg, frame_idx);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        self.handle_event(&event::read()?, &model, drain_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        drained += 1;
                        model = self.dispatch(model, msg, frame_idx);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(&model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        model.session.persist();
        Ok(())
    }

    /// Run one message through `update` and its side effects.
    pub(super) fn dispatch(&self, model: Model, msg: Message, frame_idx: u64) -> Model {
        crate::perf::log_event("event.message", format!("frame={frame_idx} msg={msg:?}"));
        let side_msg = msg.clone();
        let mut model = update(model, msg);
        self.handle_message_side_effects(&mut model, &side_msg);
        model
    }
}
