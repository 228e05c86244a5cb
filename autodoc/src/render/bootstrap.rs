//! One-time start of the render engine.

use anyhow::Context as _;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Identifies the module whose resources the engine should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContext {
    module: String,
}

impl ResourceContext {
    /// Creates a context for a module path.
    #[must_use]
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }

    /// Returns the module path.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

/// The start-up hooks of a render engine.
#[cfg_attr(test, mockall::automock)]
pub trait RenderEngine: Send + Sync {
    /// Points resource lookups at the hosting module.
    fn set_resource_context(&self, context: &ResourceContext);

    /// Starts the resource loader.
    fn start_resource_loader(&self) -> anyhow::Result<()>;

    /// Registers fonts.
    fn start_fonts(&self) -> anyhow::Result<()>;

    /// Starts the core engine.
    fn start_core(&self) -> anyhow::Result<()>;
}

/// Starts a render engine at most once.
///
/// Hosts share one bootstrap (behind an `Arc`) across all runs of the
/// process. The booted flag is set only after every start hook succeeded, so
/// a failed start is attempted again by the next caller.
pub struct RenderEngineBootstrap {
    engine: Arc<dyn RenderEngine>,
    booted: Mutex<bool>,
}

impl fmt::Debug for RenderEngineBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngineBootstrap")
            .field("booted", &*self.booted.lock())
            .finish_non_exhaustive()
    }
}

impl RenderEngineBootstrap {
    /// Creates a bootstrap for `engine`.
    #[must_use]
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine,
            booted: Mutex::new(false),
        }
    }

    /// Returns true once the engine has been started.
    #[must_use]
    pub fn is_booted(&self) -> bool {
        *self.booted.lock()
    }

    /// Starts the engine unless it is already running.
    ///
    /// The lock is held for the whole start sequence; concurrent callers wait
    /// and then see the flag.
    pub fn ensure_started(&self) -> anyhow::Result<()> {
        let mut booted = self.booted.lock();
        if *booted {
            debug!("Render engine already started");
            return Ok(());
        }

        let context = ResourceContext::for_module(module_path!());
        self.engine.set_resource_context(&context);
        self.engine
            .start_resource_loader()
            .context("resource loader failed to start")?;
        self.engine.start_fonts().context("font registry failed to start")?;
        self.engine.start_core().context("core engine failed to start")?;

        *booted = true;
        info!(module = context.module(), "Render engine started");
        Ok(())
    }
}
