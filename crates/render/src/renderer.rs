use std::fmt::Write;

use tracing::trace;

use crate::scene::Container;

/// Errors a rendering backend may report.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render backend failed: {0}")]
    Backend(String),
    #[error("formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Renderer-agnostic interface. All backends implement this trait.
///
/// A renderer reads the scene graph and produces output. It never touches the
/// world; views have already mirrored world state into the graph.
pub trait Renderer {
    /// Render the current state of `stage` once.
    fn render(&mut self, stage: &Container) -> Result<(), RenderError>;

    /// Current output size in pixels, consumed by layout code.
    fn output_size(&self) -> (u32, u32);
}

/// Text renderer for the CLI, logs and tests.
///
/// Produces one line per visible node, indented by depth, with absolute
/// positions.
#[derive(Debug)]
pub struct DebugTextRenderer {
    size: (u32, u32),
    frames: u64,
    last: String,
}

impl DebugTextRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: 0,
            last: String::new(),
        }
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Output of the most recent frame.
    pub fn last_frame(&self) -> &str {
        &self.last
    }
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new(700, 700)
    }
}

impl Renderer for DebugTextRenderer {
    fn render(&mut self, stage: &Container) -> Result<(), RenderError> {
        let mut out = String::new();
        writeln!(
            out,
            "=== frame {} ({}x{}) ===",
            self.frames + 1,
            self.size.0,
            self.size.1
        )?;

        let mut result = Ok(());
        let mut hidden_depth: Option<usize> = None;
        stage.walk(&mut |depth, at, node| {
            if let Some(limit) = hidden_depth {
                if depth > limit {
                    return;
                }
                hidden_depth = None;
            }
            if !node.visible {
                hidden_depth = Some(depth);
                return;
            }
            let indent = "  ".repeat(depth);
            let label = node.label.as_deref().unwrap_or("");
            if result.is_ok() {
                result = writeln!(out, "{indent}{} ({:.2}, {:.2}) {label}", node.name, at.x, at.y);
            }
        });
        result?;

        self.frames += 1;
        trace!(frame = self.frames, bytes = out.len(), "debug frame rendered");
        self.last = out;
        Ok(())
    }

    fn output_size(&self) -> (u32, u32) {
        self.size
    }
}
