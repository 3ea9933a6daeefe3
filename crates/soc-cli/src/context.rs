//! The explicit value threaded through every command handler in place of
//! global state: the resolved store, the configured item list, and the
//! already-loaded present-day engine.

use std::path::PathBuf;

use soc_config::StreamConfig;
use soc_core::present::{default_items, Item, PresentEngine};
use soc_core::ArenaBacking;

use crate::store::FileStore;

pub struct Context {
    pub store: FileStore,
    pub engine: PresentEngine,
}

impl Context {
    /// Resolves the stream file (an explicit override, or a walk-up search
    /// from `cwd`), loads any sidecar `.soc.toml` item-type override, and
    /// scans the store once.
    pub fn open(file_override: Option<PathBuf>, cwd: &std::path::Path) -> anyhow::Result<Self> {
        let stream_path = soc_config::resolve_stream_path(file_override.as_deref(), cwd);
        tracing::debug!(path = %stream_path.display(), "resolved stream path");

        let items = resolve_items(cwd)?;
        let store = FileStore::new(stream_path);
        let mut engine = PresentEngine::new(items)?;
        engine.load(&store)?;
        Ok(Context { store, engine })
    }

    /// Whether the store has never been scanned into anything (no file, or
    /// an empty file) — the "empty stream" read-only hint case.
    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.store.open()?.size() == 0)
    }
}

fn resolve_items(cwd: &std::path::Path) -> anyhow::Result<Vec<Item>> {
    match StreamConfig::discover(cwd)? {
        Some(StreamConfig { items: Some(items) }) if !items.is_empty() => Ok(items
            .into_iter()
            .map(|i| Item { name: i.name, remains: i.remains })
            .collect()),
        _ => Ok(default_items()),
    }
}
