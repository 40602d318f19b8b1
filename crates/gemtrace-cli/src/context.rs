use anyhow::{Context, Result};
use gemtrace_kb::{KbOverlay, KnowledgeBase};
use is_terminal::IsTerminal;
use once_cell::sync::OnceCell;
use std::path::PathBuf;

/// Shared state for one CLI invocation.
///
/// The knowledge base is built lazily so commands that fail argument
/// validation never touch the overlay file, and built exactly once so
/// every handler resolves codes against the same tables.
pub struct ExecutionContext {
    overlay_path: Option<PathBuf>,
    kb: OnceCell<KnowledgeBase>,
    no_color: bool,
}

impl ExecutionContext {
    pub fn new(overlay_path: Option<PathBuf>, no_color: bool) -> Self {
        Self {
            overlay_path,
            kb: OnceCell::new(),
            no_color,
        }
    }

    pub fn kb(&self) -> Result<&KnowledgeBase> {
        self.kb.get_or_try_init(|| match &self.overlay_path {
            Some(path) => {
                let overlay = KbOverlay::load(path).with_context(|| {
                    format!("failed to load knowledge-base overlay: {}", path.display())
                })?;
                KnowledgeBase::with_overlay(&overlay).map_err(anyhow::Error::from)
            }
            None => Ok(KnowledgeBase::builtin()),
        })
    }

    /// Whether output rendering should use ANSI colors.
    pub fn enable_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
