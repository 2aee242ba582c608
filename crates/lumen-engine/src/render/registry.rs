use std::panic::{catch_unwind, AssertUnwindSafe};

/// Cleanup callback for one GPU object.
pub type Disposer = Box<dyn FnOnce() -> anyhow::Result<()>>;

/// LIFO list of disposers for everything a renderer allocated.
///
/// Once [`dispose_all`](Self::dispose_all) has run, late registrations are
/// disposed on the spot instead of being queued.
#[derive(Default)]
pub struct ResourceRegistry {
    disposers: Vec<Disposer>,
    disposed: bool,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, disposer: F)
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        if self.disposed {
            log::debug!("registry already disposed; running late disposer now");
            run_disposer(Box::new(disposer));
            return;
        }
        self.disposers.push(Box::new(disposer));
    }

    /// Runs every disposer, most recent first. A failing disposer is logged
    /// and the rest still run.
    pub fn dispose_all(&mut self) {
        self.disposed = true;
        let count = self.disposers.len();
        while let Some(disposer) = self.disposers.pop() {
            run_disposer(disposer);
        }
        log::debug!("disposed {count} resources");
    }

    /// Makes the registry usable again. Pending disposers are dropped unrun.
    pub fn reset(&mut self) {
        if !self.disposers.is_empty() {
            log::warn!("registry reset with {} pending disposers", self.disposers.len());
        }
        self.disposers.clear();
        self.disposed = false;
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("pending", &self.disposers.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn run_disposer(disposer: Disposer) {
    match catch_unwind(AssertUnwindSafe(disposer)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::error!("disposer failed: {err:#}"),
        Err(_) => log::error!("disposer panicked"),
    }
}
