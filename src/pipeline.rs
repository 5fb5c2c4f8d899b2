//! Post-render passes over installed HTML.
//!
//! Two stages run in a fixed order: diagram rendering, then code
//! highlighting. A highlight stage is only queued once the diagram stage for
//! the same content has completed, so highlighting never sees unrendered
//! diagram blocks. Queued stages carry a [`RenderTicket`]; the session checks
//! it before applying a stage and drops stages whose content has since been
//! replaced.

use std::collections::VecDeque;
use std::fmt;

use crate::session::DocumentId;

/// Result of running one pass over a document's HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutput {
    /// Rewritten HTML, or `None` when no block matched and nothing changed.
    pub html: Option<String>,
    /// Blocks rewritten successfully.
    pub rendered: usize,
    /// Blocks that failed and were replaced by an inline error.
    pub failed: usize,
}

impl PassOutput {
    pub const fn unchanged() -> Self {
        Self {
            html: None,
            rendered: 0,
            failed: 0,
        }
    }
}

/// A post-processing step over rendered HTML.
///
/// Passes must be idempotent: running a pass over its own output, or over
/// HTML with no matching blocks, leaves the content unchanged. A failure in
/// one block must not affect the others.
pub trait RenderPass {
    fn name(&self) -> &'static str;
    fn apply(&self, html: &str) -> PassOutput;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Diagrams,
    Highlight,
}

impl Stage {
    /// The stage allowed to start once this one completes.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Diagrams => Some(Self::Highlight),
            Self::Highlight => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagrams => f.write_str("diagrams"),
            Self::Highlight => f.write_str("highlight"),
        }
    }
}

/// Identifies the content a queued stage was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub document: DocumentId,
    /// Document generation at scheduling time; bumped on every re-render.
    pub generation: u64,
    /// Surface install sequence at scheduling time.
    pub install: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStage {
    pub ticket: RenderTicket,
    pub stage: Stage,
}

/// The diagram → highlight stage queue and the passes that back it.
#[derive(Default)]
pub struct RenderPipeline {
    diagrams: Option<Box<dyn RenderPass>>,
    highlight: Option<Box<dyn RenderPass>>,
    queue: VecDeque<PendingStage>,
}

impl fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("diagrams", &self.diagrams.as_ref().map(|p| p.name()))
            .field("highlight", &self.highlight.as_ref().map(|p| p.name()))
            .field("queue", &self.queue)
            .finish()
    }
}

impl RenderPipeline {
    /// A pipeline with no passes; stages still run in order and complete
    /// without touching the content.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in passes, each optional.
    pub fn standard(diagrams: bool, highlight: bool) -> Self {
        let mut pipeline = Self::new();
        if diagrams {
            match crate::mermaid::DiagramPass::standard() {
                Some(pass) => pipeline = pipeline.with_diagrams(pass),
                None => tracing::debug!("diagram rendering not compiled in"),
            }
        }
        if highlight {
            pipeline = pipeline.with_highlight(crate::highlight::HighlightPass);
        }
        pipeline
    }

    #[must_use]
    pub fn with_diagrams(mut self, pass: impl RenderPass + 'static) -> Self {
        self.diagrams = Some(Box::new(pass));
        self
    }

    #[must_use]
    pub fn with_highlight(mut self, pass: impl RenderPass + 'static) -> Self {
        self.highlight = Some(Box::new(pass));
        self
    }

    /// Queue the first stage for freshly installed content.
    pub fn schedule(&mut self, ticket: RenderTicket) {
        crate::perf::log_event(
            "pipeline.schedule",
            format!("doc={} gen={} install={}", ticket.document, ticket.generation, ticket.install),
        );
        self.queue.push_back(PendingStage {
            ticket,
            stage: Stage::Diagrams,
        });
    }

    pub fn pop(&mut self) -> Option<PendingStage> {
        self.queue.pop_front()
    }

    /// Mark `pending` as settled and queue the stage that follows it.
    pub fn complete(&mut self, pending: PendingStage) {
        if let Some(stage) = pending.stage.next() {
            self.queue.push_back(PendingStage {
                ticket: pending.ticket,
                stage,
            });
        }
    }

    /// Run the pass backing `stage`. Disabled stages leave the HTML as is.
    pub fn run(&self, stage: Stage, html: &str) -> PassOutput {
        let pass = match stage {
            Stage::Diagrams => self.diagrams.as_deref(),
            Stage::Highlight => self.highlight.as_deref(),
        };
        let Some(pass) = pass else {
            return PassOutput::unchanged();
        };
        let _scope = crate::perf::scope("pipeline.run");
        let output = pass.apply(html);
        crate::perf::log_event(
            "pipeline.pass",
            format!(
                "pass={} rendered={} failed={}",
                pass.name(),
                output.rendered,
                output.failed
            ),
        );
        output
    }

    /// Drop every queued stage that targets `document`.
    pub fn cancel(&mut self, document: DocumentId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|pending| pending.ticket.document != document);
        before - self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
