//! The session context object: open documents, the active one, and the
//! collaborators that display and persist them.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::Result;

use super::debounce::ReloadDebouncer;
use super::snapshot::{SessionSnapshot, SnapshotEntry, SnapshotStore};
use super::{
    Command, Dispatched, Document, DocumentId, Registry, SessionError, SessionEvent,
    SessionWarning, SkipReason, registry::DEFAULT_MAX_DOCUMENTS,
};
use crate::document::{RenderedFile, is_markdown_file};
use crate::gateway::{FileGateway, resolve_path};
use crate::outline::{DEFAULT_LOOKAHEAD, OutlineIndex};
use crate::pipeline::{PendingStage, RenderPipeline, RenderTicket};
use crate::view::ContentSurface;

/// Tunables for a [`SessionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub max_documents: usize,
    pub watch_enabled: bool,
    pub watch_debounce: Duration,
    pub outline_lookahead: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_documents: DEFAULT_MAX_DOCUMENTS,
            watch_enabled: true,
            watch_debounce: Duration::from_millis(200),
            outline_lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

/// Asked before closing a document with unsaved changes. Returning false
/// cancels the close.
pub type ConfirmClose = Box<dyn FnMut(&Document) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum CloseOutcome {
    Closed {
        /// The document that became active in its place, if any.
        activated: Option<DocumentId>,
    },
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Restored documents in snapshot order.
    pub restored: Vec<DocumentId>,
    pub skipped: Vec<SessionWarning>,
    pub active: Option<DocumentId>,
}

#[derive(Debug, Default)]
pub struct StartupReport {
    pub restore: RestoreReport,
    /// Document opened from the command line.
    pub opened: Option<DocumentId>,
    pub error: Option<SessionError>,
}

/// Work done by one [`SessionManager::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub reloaded: Vec<DocumentId>,
    pub passes_run: usize,
    pub stale_dropped: usize,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        !self.reloaded.is_empty() || self.passes_run > 0
    }
}

/// Owns the open documents and drives the view.
///
/// All mutation happens through `&mut self` on the host's thread. File
/// watchers only send document ids over a channel; [`tick`] turns them into
/// reloads and runs queued render stages, checking each against the current
/// state first.
///
/// [`tick`]: SessionManager::tick
pub struct SessionManager<S: ContentSurface> {
    registry: Registry,
    gateway: Box<dyn FileGateway>,
    store: Box<dyn SnapshotStore>,
    surface: S,
    outline: OutlineIndex,
    pipeline: RenderPipeline,
    options: SessionOptions,
    next_id: u64,
    events: Vec<SessionEvent>,
    /// Change signals stamped with the moment the watcher saw them
    watch_tx: Sender<(DocumentId, Instant)>,
    watch_rx: Receiver<(DocumentId, Instant)>,
    debouncer: ReloadDebouncer,
    confirm_close: Option<ConfirmClose>,
    restoring: bool,
    started: Instant,
}

impl<S: ContentSurface> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: ContentSurface> SessionManager<S> {
    pub fn new(
        gateway: impl FileGateway + 'static,
        store: impl SnapshotStore + 'static,
        surface: S,
        options: SessionOptions,
    ) -> Self {
        let (watch_tx, watch_rx) = mpsc::channel();
        let debounce_ms = u64::try_from(options.watch_debounce.as_millis()).unwrap_or(u64::MAX);
        Self {
            registry: Registry::new(options.max_documents),
            gateway: Box::new(gateway),
            store: Box::new(store),
            surface,
            outline: OutlineIndex::new(options.outline_lookahead),
            pipeline: RenderPipeline::new(),
            options,
            next_id: 1,
            events: Vec::new(),
            watch_tx,
            watch_rx,
            debouncer: ReloadDebouncer::new(debounce_ms),
            confirm_close: None,
            restoring: false,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: RenderPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn set_confirm_close(&mut self, confirm: impl FnMut(&Document) -> bool + 'static) {
        self.confirm_close = Some(Box::new(confirm));
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub const fn active_id(&self) -> Option<DocumentId> {
        self.registry.active()
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.registry.active_document()
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.registry.get(id)
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for host-level changes such as resizing. Scroll
    /// changes should go through [`scroll_to`](Self::scroll_to) so the
    /// outline follows.
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub const fn outline(&self) -> &OutlineIndex {
        &self.outline
    }

    pub const fn outline_mut(&mut self) -> &mut OutlineIndex {
        &mut self.outline
    }

    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// True while render stages or reloads are waiting to run.
    pub fn is_busy(&self) -> bool {
        !self.pipeline.is_idle() || self.debouncer.is_pending()
    }

    /// Open the file at `path` and make it active.
    ///
    /// A path that is already open is switched to instead; the existing id is
    /// returned.
    ///
    /// # Errors
    /// [`SessionError::CapacityExceeded`] when the registry is full and
    /// [`SessionError::LoadFailure`] when the file cannot be read. Neither
    /// changes the registry.
    pub fn open(&mut self, path: &Path) -> Result<DocumentId, SessionError> {
        let (id, created) = self.load(Some(path), None)?;
        if created {
            self.capture_scroll();
            self.activate(id);
            self.persist();
        } else {
            self.switch_to(id)?;
        }
        Ok(id)
    }

    /// Open content the caller already rendered, such as a dropped file.
    ///
    /// Without a path the document is never deduplicated and never watched.
    ///
    /// # Errors
    /// [`SessionError::CapacityExceeded`] when the registry is full.
    pub fn open_supplied(
        &mut self,
        path: Option<&Path>,
        content: RenderedFile,
    ) -> Result<DocumentId, SessionError> {
        let (id, created) = self.load(path, Some(content))?;
        if created {
            self.capture_scroll();
            self.activate(id);
            self.persist();
        } else {
            self.switch_to(id)?;
        }
        Ok(id)
    }

    /// Open each path in order. A failure does not stop the rest.
    pub fn open_many<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Vec<(PathBuf, Result<DocumentId, SessionError>)> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                (path.to_path_buf(), self.open(path))
            })
            .collect()
    }

    /// Make `id` the active document.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if `id` is not open.
    pub fn switch_to(&mut self, id: DocumentId) -> Result<(), SessionError> {
        if !self.registry.contains(id) {
            tracing::debug!(%id, "switch to unknown document");
            return Err(SessionError::NotFound(id));
        }
        if self.registry.active() == Some(id) && !self.surface.is_welcome() {
            return Ok(());
        }
        self.capture_scroll();
        self.activate(id);
        self.persist();
        Ok(())
    }

    /// Close `id`, releasing its watch subscription.
    ///
    /// A modified document is only closed when `force` is set or the
    /// confirmation hook agrees. If the closed document was active, the first
    /// remaining document becomes active, or the welcome page is shown.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if `id` is not open.
    pub fn close(&mut self, id: DocumentId, force: bool) -> Result<CloseOutcome, SessionError> {
        let Some(document) = self.registry.get(id) else {
            tracing::debug!(%id, "close of unknown document");
            return Err(SessionError::NotFound(id));
        };

        if document.is_modified() && !force {
            let confirmed = self
                .confirm_close
                .as_mut()
                .is_some_and(|confirm| confirm(document));
            if !confirmed {
                tracing::debug!(%id, "close cancelled for modified document");
                return Ok(CloseOutcome::Cancelled);
            }
        }

        let was_active = self.registry.active() == Some(id);
        let Some(mut document) = self.registry.remove(id) else {
            return Err(SessionError::NotFound(id));
        };
        let released = document.close();
        self.pipeline.cancel(id);
        self.debouncer.cancel(id);
        tracing::info!(%id, name = document.display_name(), released, "closed document");
        crate::perf::log_event("session.close", format!("id={id}"));
        self.events.push(SessionEvent::Closed(id));
        drop(document);

        if was_active {
            match self.registry.first() {
                Some(next) => self.activate(next),
                None => self.show_welcome(),
            }
        }
        self.persist();

        Ok(CloseOutcome::Closed {
            activated: if was_active {
                self.registry.active()
            } else {
                None
            },
        })
    }

    /// Rebuild the registry from `snapshot`.
    ///
    /// Entries are opened in stored order. Entries without a path, whose
    /// file is gone, that fail to load, that exceed capacity, or whose file
    /// is already open are skipped and reported. The stored active entry becomes active if it was
    /// restored; otherwise nothing is active and the welcome page is shown.
    pub fn restore_from_snapshot(&mut self, snapshot: &SessionSnapshot) -> RestoreReport {
        let _scope = crate::perf::scope("session.restore");
        let mut report = RestoreReport::default();
        let mut active = None;
        self.restoring = true;

        for (index, entry) in snapshot.tabs.iter().enumerate() {
            match self.restore_entry(entry) {
                Ok(id) => {
                    report.restored.push(id);
                    if snapshot.active_tab_id.as_deref() == Some(entry.id.as_str()) {
                        active = Some(id);
                    }
                }
                Err(reason) => {
                    if let SkipReason::Duplicate(existing) = &reason
                        && snapshot.active_tab_id.as_deref() == Some(entry.id.as_str())
                    {
                        active = Some(*existing);
                    }
                    tracing::info!(index, path = ?entry.file_path, %reason, "skipped restoring document");
                    let warning = SessionWarning::RestoreSkipped {
                        index,
                        path: entry.file_path.clone(),
                        reason,
                    };
                    self.events.push(SessionEvent::Warning(warning.clone()));
                    report.skipped.push(warning);
                }
            }
        }

        self.restoring = false;
        match active {
            Some(id) => {
                self.capture_scroll();
                self.activate(id);
            }
            None => self.show_welcome(),
        }
        report.active = self.registry.active();
        tracing::info!(
            restored = report.restored.len(),
            skipped = report.skipped.len(),
            active = ?report.active,
            "restored session"
        );
        self.persist();
        report
    }

    fn restore_entry(&mut self, entry: &SnapshotEntry) -> Result<DocumentId, SkipReason> {
        let Some(path) = entry.file_path.as_deref() else {
            return Err(SkipReason::NoPath);
        };
        if !self.gateway.file_exists(path) {
            return Err(SkipReason::Missing);
        }
        let (id, created) = self.load(Some(path), None).map_err(|err| match err {
            SessionError::CapacityExceeded { .. } => SkipReason::Capacity,
            other => SkipReason::LoadFailed(other.to_string()),
        })?;
        // The first entry for a path owns its scroll and modified state.
        if !created {
            return Err(SkipReason::Duplicate(id));
        }
        if let Some(document) = self.registry.get_mut(id) {
            document.set_scroll_offset(entry.scroll_position);
            document.set_modified(entry.is_modified);
        }
        Ok(id)
    }

    /// Load the stored snapshot and restore it.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read. Nothing is changed in
    /// that case.
    pub fn restore_saved(&mut self) -> Result<RestoreReport> {
        match self.store.load()? {
            Some(snapshot) => Ok(self.restore_from_snapshot(&snapshot)),
            None => {
                if self.registry.active().is_none() {
                    self.show_welcome();
                }
                Ok(RestoreReport::default())
            }
        }
    }

    /// Bring the session up: optionally restore the saved snapshot, then open
    /// the first argument that names an existing markdown file. The welcome
    /// page is shown if nothing ends up active.
    pub fn startup<P: AsRef<Path>>(&mut self, args: &[P], restore: bool) -> StartupReport {
        let mut report = StartupReport::default();
        if restore {
            match self.restore_saved() {
                Ok(restored) => report.restore = restored,
                Err(err) => {
                    let message = format!("{err:#}");
                    tracing::warn!(error = %message, "could not read saved session");
                }
            }
        }

        let candidate: Option<&Path> = args
            .iter()
            .map(AsRef::as_ref)
            .find(|path| is_markdown_file(path) && self.gateway.file_exists(path));
        if let Some(path) = candidate {
            match self.open(path) {
                Ok(id) => report.opened = Some(id),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "could not open startup file");
                    report.error = Some(err);
                }
            }
        }

        if self.registry.active().is_none() && !self.surface.is_welcome() {
            self.show_welcome();
        }
        report
    }

    /// Activate the next document, wrapping around.
    pub fn next(&mut self) -> Option<DocumentId> {
        let id = self.registry.next_after_active()?;
        self.switch_to(id).ok().map(|()| id)
    }

    /// Activate the previous document, wrapping around.
    pub fn previous(&mut self) -> Option<DocumentId> {
        let id = self.registry.previous_before_active()?;
        self.switch_to(id).ok().map(|()| id)
    }

    /// Activate the document at 1-based `position`. Out of range is a no-op.
    pub fn switch_to_position(&mut self, position: usize) -> Option<DocumentId> {
        let id = self.registry.at_position(position)?;
        self.switch_to(id).ok().map(|()| id)
    }

    /// Set or clear the unsaved-changes flag.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if `id` is not open.
    pub fn mark_modified(&mut self, id: DocumentId, modified: bool) -> Result<(), SessionError> {
        let document = self
            .registry
            .get_mut(id)
            .ok_or(SessionError::NotFound(id))?;
        document.set_modified(modified);
        self.persist();
        Ok(())
    }

    pub fn dispatch(&mut self, command: Command) -> Dispatched {
        match command {
            Command::NewDocument => Dispatched::OpenRequested,
            Command::CloseActive => {
                let Some(id) = self.registry.active() else {
                    return Dispatched::Ignored;
                };
                match self.close(id, false) {
                    Ok(CloseOutcome::Closed { .. }) => Dispatched::Closed(id),
                    Ok(CloseOutcome::Cancelled) => Dispatched::CloseDeclined(id),
                    Err(_) => Dispatched::Ignored,
                }
            }
            Command::Next => self.next().map_or(Dispatched::Ignored, Dispatched::Activated),
            Command::Previous => self
                .previous()
                .map_or(Dispatched::Ignored, Dispatched::Activated),
            Command::JumpTo(position) => self
                .switch_to_position(position)
                .map_or(Dispatched::Ignored, Dispatched::Activated),
            Command::ToggleOutline => Dispatched::OutlineToggled(self.outline.toggle_visible()),
        }
    }

    /// Scroll the content and move the outline's active marker with it.
    pub fn scroll_to(&mut self, offset: usize) {
        self.surface.set_scroll_offset(offset);
        self.refresh_outline();
    }

    /// Scroll to the outline entry at `index` and mark it active.
    pub fn jump_to_header(&mut self, index: usize) -> bool {
        let Some(entry) = self.outline.entry(index) else {
            return false;
        };
        let id = entry.header.id.clone();
        let Some(position) = self.surface.header_position(&id) else {
            return false;
        };
        self.surface.set_scroll_offset(position);
        self.outline.set_active_id(&id);
        true
    }

    /// Recompute the outline's active entry from the current scroll offset.
    pub fn refresh_outline(&mut self) -> Option<usize> {
        let surface = &self.surface;
        self.outline
            .update_active(surface.scroll_offset(), |id| surface.header_position(id))
    }

    /// Process watch signals and run at most one queued render stage.
    pub fn tick(&mut self) -> TickReport {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        self.process_reloads(now, &mut report);
        self.run_next_stage(&mut report);
        report
    }

    /// Run everything that is ready now: due reloads and every queued stage.
    pub fn settle(&mut self) -> TickReport {
        self.settle_at(Instant::now())
    }

    pub fn settle_at(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        self.process_reloads(now, &mut report);
        while self.run_next_stage(&mut report) {}
        report
    }

    /// Snapshot of the current registry. The active document's scroll
    /// position is read from the surface.
    pub fn snapshot(&self) -> SessionSnapshot {
        let active = self.registry.active();
        let tabs = self
            .registry
            .iter()
            .map(|document| {
                let scroll_position = if Some(document.id()) == active && !self.surface.is_welcome()
                {
                    self.surface.scroll_offset()
                } else {
                    document.scroll_offset()
                };
                SnapshotEntry {
                    id: document.id().to_string(),
                    file_path: document.source_path().map(Path::to_path_buf),
                    display_name: document.display_name().to_string(),
                    is_modified: document.is_modified(),
                    scroll_position,
                }
            })
            .collect();
        SessionSnapshot {
            tabs,
            active_tab_id: active.map(|id| id.to_string()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Write the snapshot now. Failures are logged, not returned.
    pub fn persist(&mut self) {
        if self.restoring {
            return;
        }
        let snapshot = self.snapshot();
        if let Err(err) = self.store.save(&snapshot) {
            let message = format!("{err:#}");
            tracing::warn!(error = %message, "failed to persist session");
        }
    }

    fn allocate_id(&mut self) -> DocumentId {
        let id = DocumentId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create and register a document without activating it. Returns the
    /// existing id and `false` if the path is already open.
    fn load(
        &mut self,
        path: Option<&Path>,
        supplied: Option<RenderedFile>,
    ) -> Result<(DocumentId, bool), SessionError> {
        let resolved = path.map(resolve_path);
        if let Some(resolved) = resolved.as_deref()
            && let Some(existing) = self.registry.find_by_path(resolved)
        {
            return Ok((existing, false));
        }
        if self.registry.is_full() {
            tracing::info!(max = self.registry.max_documents(), "document limit reached");
            return Err(SessionError::CapacityExceeded {
                max: self.registry.max_documents(),
            });
        }

        let id = self.allocate_id();
        let mut document = Document::loading(id, resolved.clone());
        let rendered = match (supplied, resolved.as_deref()) {
            (Some(content), _) => content,
            (None, Some(path)) => match self.gateway.render_file(path) {
                Ok(rendered) => rendered,
                Err(source) => {
                    document.close();
                    tracing::warn!(%id, path = %path.display(), error = %source, "failed to load document");
                    return Err(SessionError::LoadFailure {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            },
            (None, None) => RenderedFile::default(),
        };
        document.finish_loading(rendered);

        if self.options.watch_enabled
            && let Some(path) = resolved.as_deref()
        {
            self.attach_watch(&mut document, path);
        }

        tracing::info!(%id, name = document.display_name(), path = ?resolved, "opened document");
        crate::perf::log_event("session.open", format!("id={id} path={resolved:?}"));
        self.registry.insert(document)?;
        self.events.push(SessionEvent::Opened(id));
        Ok((id, true))
    }

    fn attach_watch(&mut self, document: &mut Document, path: &Path) {
        let id = document.id();
        let tx = self.watch_tx.clone();
        let on_change = Box::new(move || {
            let _ = tx.send((id, Instant::now()));
        });
        match self.gateway.watch_file(path, on_change) {
            Ok(handle) => document.set_watch(handle),
            Err(err) => {
                tracing::warn!(%id, error = %err, "live reload unavailable");
                self.events.push(SessionEvent::Warning(SessionWarning::WatchError {
                    id,
                    path: path.to_path_buf(),
                    message: err.to_string(),
                }));
            }
        }
    }

    fn capture_scroll(&mut self) {
        if self.surface.is_welcome() {
            return;
        }
        let offset = self.surface.scroll_offset();
        if let Some(id) = self.registry.active()
            && let Some(document) = self.registry.get_mut(id)
        {
            document.set_scroll_offset(offset);
        }
    }

    /// Hand the surface and outline to `id`, then queue its render stages.
    fn activate(&mut self, id: DocumentId) {
        let Ok(previous) = self.registry.set_active(id) else {
            return;
        };
        let Some(document) = self.registry.get(id) else {
            return;
        };

        let install = self.surface.install(document.html());
        self.surface.set_scroll_offset(document.scroll_offset());
        self.outline.rebuild(document.headers());
        let ticket = RenderTicket {
            document: id,
            generation: document.generation(),
            install,
        };
        self.pipeline.schedule(ticket);
        self.refresh_outline();

        tracing::debug!(%id, ?previous, "activated document");
        self.events.push(SessionEvent::Activated { id, previous });
    }

    fn show_welcome(&mut self) {
        self.registry.clear_active();
        self.surface.show_welcome();
        self.outline.reset();
        tracing::debug!("showing welcome page");
        self.events.push(SessionEvent::Welcome);
    }

    fn process_reloads(&mut self, now: Instant, report: &mut TickReport) {
        let now_ms = self.elapsed_ms(now);
        while let Ok((id, seen_at)) = self.watch_rx.try_recv() {
            if self.registry.contains(id) {
                // The quiet window runs from when the watcher saw the change.
                self.debouncer.queue(id, self.elapsed_ms(seen_at.min(now)));
            } else {
                tracing::debug!(%id, "dropped change signal for closed document");
            }
        }
        for id in self.debouncer.take_ready(now_ms) {
            if self.reload(id) {
                report.reloaded.push(id);
            }
        }
    }

    fn elapsed_ms(&self, at: Instant) -> u64 {
        u64::try_from(at.saturating_duration_since(self.started).as_millis()).unwrap_or(u64::MAX)
    }

    /// Re-read `id` from disk. The active document keeps its scroll offset.
    fn reload(&mut self, id: DocumentId) -> bool {
        let Some(document) = self.registry.get_mut(id) else {
            tracing::debug!(%id, "reload of closed document ignored");
            return false;
        };
        let Some(path) = document.source_path().map(Path::to_path_buf) else {
            return false;
        };
        if !document.begin_rerender() {
            return false;
        }

        match self.gateway.render_file(&path) {
            Ok(rendered) => {
                document.finish_rerender(rendered);
            }
            Err(err) => {
                document.abort_rerender();
                tracing::warn!(%id, error = %err, "reload failed, keeping previous content");
                return false;
            }
        }
        tracing::info!(%id, path = %path.display(), "reloaded document");
        self.events.push(SessionEvent::Reloaded(id));

        if self.registry.active() == Some(id) {
            let scroll = self.surface.scroll_offset();
            if let Some(document) = self.registry.get_mut(id) {
                document.set_scroll_offset(scroll);
            }
            self.activate(id);
        }
        true
    }

    fn run_next_stage(&mut self, report: &mut TickReport) -> bool {
        let Some(pending) = self.pipeline.pop() else {
            return false;
        };
        if self.is_stale(&pending) {
            tracing::debug!(
                document = %pending.ticket.document,
                stage = %pending.stage,
                "dropped stale render stage"
            );
            crate::perf::log_event(
                "pipeline.stale",
                format!("doc={} stage={}", pending.ticket.document, pending.stage),
            );
            report.stale_dropped += 1;
            return true;
        }

        let output = self.pipeline.run(pending.stage, self.surface.html());
        if let Some(html) = output.html {
            self.surface.replace(html);
            self.refresh_outline();
        }
        if output.failed > 0 {
            tracing::debug!(stage = %pending.stage, failed = output.failed, "render blocks failed");
        }
        self.pipeline.complete(pending);
        report.passes_run += 1;
        true
    }

    fn is_stale(&self, pending: &PendingStage) -> bool {
        let ticket = pending.ticket;
        self.registry.active() != Some(ticket.document)
            || self.surface.install_seq() != ticket.install
            || self.registry.get(ticket.document).is_none_or(|document| {
                document.generation() != ticket.generation
                    || document.state() != super::DocumentState::Ready
            })
    }
}
