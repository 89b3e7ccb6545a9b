// Copyright 2025 Noctua Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The RecoveryAgent turns a raw loading failure into one of three
//! outcomes: a successfully retried asset, a placeholder, or a definitive
//! `None` — never a propagated error.
//!
//! Routing by failure kind:
//! - `network` retries with exponential backoff, then falls through to
//!   substitution;
//! - `format`, `dependency`, and `unknown` go straight to substitution;
//! - `size` and `license` are hard blocks — no retry, no placeholder.
//!
//! Every terminal outcome notifies the registered listeners; that listener
//! interface, not logging, is the reporting surface the UI consumes.

use noctua_core::asset::{AssetType, LoadedAsset};
use noctua_core::cancel::CancelToken;
use noctua_core::error::{
    ErrorEvent, ErrorKind, ErrorListener, ErrorRecord, FnListener, LoadError,
};
use noctua_core::loader::AssetLoader;
use noctua_core::utils::clock::now_millis;
use noctua_lanes::fallback_lane::{FallbackContext, FallbackFactory, FallbackSet};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// Retry tuning for `network`-classified failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries attempted per path before falling through to substitution.
    pub max_retries: u32,
    /// The first retry delay; each further retry doubles it.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// A handle identifying a registered error listener, for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Everything a recovery attempt may need from its caller.
pub struct RecoveryContext<'a> {
    /// The failed asset's declared type; selects the fallback factory.
    pub asset_type: Option<AssetType>,
    /// The loader to re-invoke on retries. Without one, retries are skipped.
    pub loader: Option<&'a dyn AssetLoader>,
    /// Environment handed to the fallback factory.
    pub fallback: FallbackContext,
    /// Cancellation flag, checked before every retry and before
    /// substitution.
    pub cancel: Option<&'a CancelToken>,
}

impl Default for RecoveryContext<'_> {
    fn default() -> Self {
        Self {
            asset_type: None,
            loader: None,
            fallback: FallbackContext::new(),
            cancel: None,
        }
    }
}

impl<'a> RecoveryContext<'a> {
    /// An empty context: no retries, no typed fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the asset type used for fallback selection.
    pub fn with_asset_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = Some(asset_type);
        self
    }

    /// Sets the loader to re-invoke on retries.
    pub fn with_loader(mut self, loader: &'a dyn AssetLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Sets the fallback environment.
    pub fn with_fallback(mut self, fallback: FallbackContext) -> Self {
        self.fallback = fallback;
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|token| token.is_cancelled())
    }
}

#[derive(Default)]
struct RecoveryState {
    attempts: HashMap<String, u32>,
    errors: HashMap<String, ErrorRecord>,
}

/// The recovery orchestrator. All methods take `&self`; internal state is
/// guarded by short-lived locks that are never held across a suspension
/// point.
pub struct RecoveryAgent {
    policy: RetryPolicy,
    fallbacks_enabled: AtomicBool,
    fallbacks: Mutex<FallbackSet>,
    state: Mutex<RecoveryState>,
    listeners: Mutex<Vec<(ListenerId, Box<dyn ErrorListener>)>>,
    next_listener_id: AtomicU64,
}

impl RecoveryAgent {
    /// Creates an agent with no fallback factories registered.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            fallbacks_enabled: AtomicBool::new(true),
            fallbacks: Mutex::new(FallbackSet::new()),
            state: Mutex::new(RecoveryState::default()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Creates an agent pre-wired with the built-in placeholder factories.
    pub fn with_defaults(policy: RetryPolicy) -> Self {
        let agent = Self::new(policy);
        *agent.fallbacks.lock().unwrap() = FallbackSet::with_defaults();
        agent
    }

    /// Registers (or replaces) the fallback factory for `asset_type`.
    pub fn register_fallback(
        &self,
        asset_type: AssetType,
        factory: impl FallbackFactory + 'static,
    ) {
        self.fallbacks.lock().unwrap().register(asset_type, factory);
    }

    /// Globally enables or disables fallback substitution.
    pub fn set_fallbacks_enabled(&self, enabled: bool) {
        self.fallbacks_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Subscribes a listener to terminal recovery outcomes.
    pub fn on_error(&self, listener: impl ErrorListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap().push((id, Box::new(listener)));
        id
    }

    /// Subscribes a plain closure to terminal recovery outcomes.
    pub fn on_error_fn(
        &self,
        listener: impl Fn(&ErrorEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.on_error(FnListener(listener))
    }

    /// Removes a previously registered listener.
    pub fn off_error(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Resolves a loading failure into an asset, a placeholder, or `None`.
    ///
    /// This is the only suspending entry point of the core; it sleeps at its
    /// own backoff delays and inside the caller's loader, and touches no
    /// shared state across those suspensions. It never panics and never
    /// returns an error.
    pub async fn handle_error(
        &self,
        path: &str,
        error: LoadError,
        ctx: RecoveryContext<'_>,
    ) -> Option<Arc<dyn LoadedAsset>> {
        eprintln!("DBG handle_error enter {path}");
        let kind = error.kind();
        eprintln!("DBG handle_error kind={kind:?} {path}");
        self.record_failure(path, kind, &error.to_string());
        eprintln!("DBG handle_error recorded {path}");
        log::warn!("recovery: '{path}' failed ({kind}): {error}");

        match kind {
            // Hard blocks: a placeholder would hide a condition that has to
            // be fixed at the source.
            ErrorKind::Size | ErrorKind::License => {
                self.notify(path);
                None
            }
            ErrorKind::Network => {
                if let Some(asset) = self.retry(path, &ctx).await {
                    return Some(asset);
                }
                // A retry may have surfaced a harder failure; re-route on
                // the latest recorded kind.
                match self.recorded_kind(path) {
                    Some(ErrorKind::Size) | Some(ErrorKind::License) => {
                        self.notify(path);
                        None
                    }
                    _ => self.substitute(path, &ctx),
                }
            }
            ErrorKind::Format | ErrorKind::Dependency | ErrorKind::Unknown => {
                eprintln!("DBG substitute branch {path}");
                let r = self.substitute(path, &ctx);
                eprintln!("DBG substitute done {path}");
                r
            }
        }
    }

    /// Cumulative load attempts recorded for `path`.
    pub fn attempts(&self, path: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// The error currently recorded for `path`, if any.
    pub fn error_for(&self, path: &str) -> Option<ErrorRecord> {
        self.state.lock().unwrap().errors.get(path).cloned()
    }

    /// Every recorded error, ordered by path.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<ErrorRecord> = state.errors.values().cloned().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    /// Clears the recorded error and attempt counter for `path`.
    pub fn clear_error(&self, path: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let had_error = state.errors.remove(path).is_some();
        let had_attempts = state.attempts.remove(path).is_some();
        had_error || had_attempts
    }

    /// Clears every recorded error and attempt counter.
    pub fn clear_all(&self) {
        let mut state = self.state.lock().unwrap();
        state.errors.clear();
        state.attempts.clear();
    }

    /// Resets the attempt counter for `path`, re-arming its retries.
    pub fn reset_attempts(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        state.attempts.remove(path);
        if let Some(record) = state.errors.get_mut(path) {
            record.attempts = 0;
        }
    }

    /// One human-readable sentence for the error recorded at `path`.
    ///
    /// This is the only user-facing error text the core defines; everything
    /// else is data for the UI layer to render.
    pub fn user_friendly_message(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        let record = state.errors.get(path)?;
        Some(match record.kind {
            ErrorKind::Network => {
                "The asset could not be downloaded. Check the connection and try again.".to_string()
            }
            ErrorKind::Format => {
                "The asset uses a file format this player does not support.".to_string()
            }
            ErrorKind::Size => "The asset is too large to load safely.".to_string(),
            ErrorKind::License => {
                "The asset is blocked until its license terms are resolved.".to_string()
            }
            ErrorKind::Dependency => "A resource this asset depends on is missing.".to_string(),
            ErrorKind::Unknown => record.message.clone(),
        })
    }

    async fn retry(
        &self,
        path: &str,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Arc<dyn LoadedAsset>> {
        let Some(loader) = ctx.loader else {
            log::debug!("recovery: no loader supplied for '{path}', skipping retries");
            return None;
        };

        loop {
            let attempts = self.attempts(path);
            if attempts >= self.policy.max_retries {
                log::warn!("recovery: '{path}' exhausted its {attempts} retries");
                return None;
            }
            if ctx.is_cancelled() {
                log::debug!("recovery: load of '{path}' cancelled before retry");
                return None;
            }

            let delay = self.policy.base_delay * 2u32.saturating_pow(attempts);
            log::debug!(
                "recovery: retrying '{path}' in {delay:?} (attempt {})",
                attempts + 1
            );
            sleep(delay).await;
            if ctx.is_cancelled() {
                log::debug!("recovery: load of '{path}' cancelled during backoff");
                return None;
            }

            self.bump_attempts(path);
            match loader.load(path).await {
                Ok(asset) => {
                    log::info!("recovery: '{path}' recovered on retry");
                    self.clear_error(path);
                    return Some(asset);
                }
                Err(error) => {
                    let kind = error.kind();
                    self.record_failure(path, kind, &error.to_string());
                    if kind != ErrorKind::Network {
                        // Not transient anymore; stop burning retries.
                        return None;
                    }
                }
            }
        }
    }

    /// Substitution is itself a terminal outcome: listeners are notified
    /// whether or not a placeholder could be built.
    fn substitute(
        &self,
        path: &str,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Arc<dyn LoadedAsset>> {
        let substituted = self.build_fallback(path, ctx);
        self.notify(path);
        substituted
    }

    fn build_fallback(
        &self,
        path: &str,
        ctx: &RecoveryContext<'_>,
    ) -> Option<Arc<dyn LoadedAsset>> {
        if !self.fallbacks_enabled.load(Ordering::Relaxed) {
            log::debug!("recovery: fallbacks are disabled, skipping '{path}'");
            return None;
        }
        if ctx.is_cancelled() {
            log::debug!("recovery: load of '{path}' cancelled before substitution");
            return None;
        }
        let Some(asset_type) = ctx.asset_type else {
            log::debug!("recovery: '{path}' has no declared type to substitute for");
            return None;
        };

        match self
            .fallbacks
            .lock()
            .unwrap()
            .build_for(asset_type, &ctx.fallback)
        {
            Ok(asset) => {
                log::info!("recovery: substituted a {asset_type} placeholder for '{path}'");
                Some(asset)
            }
            Err(error) => {
                log::error!("recovery: fallback for '{path}' failed: {error}");
                None
            }
        }
    }

    fn record_failure(&self, path: &str, kind: ErrorKind, message: &str) {
        let mut state = self.state.lock().unwrap();
        let attempts = state.attempts.get(path).copied().unwrap_or(0);
        state.errors.insert(
            path.to_string(),
            ErrorRecord {
                path: path.to_string(),
                kind,
                message: message.to_string(),
                timestamp: now_millis(),
                attempts,
            },
        );
    }

    fn bump_attempts(&self, path: &str) {
        let mut state = self.state.lock().unwrap();
        let attempts = {
            let counter = state.attempts.entry(path.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        if let Some(record) = state.errors.get_mut(path) {
            record.attempts = attempts;
        }
    }

    fn recorded_kind(&self, path: &str) -> Option<ErrorKind> {
        self.state
            .lock()
            .unwrap()
            .errors
            .get(path)
            .map(|record| record.kind)
    }

    /// Delivers the recorded error for `path` to every listener. A panicking
    /// listener is isolated so the rest still hear the event.
    fn notify(&self, path: &str) {
        let event = {
            let state = self.state.lock().unwrap();
            let Some(record) = state.errors.get(path) else {
                return;
            };
            ErrorEvent {
                path: record.path.clone(),
                message: record.message.clone(),
                kind: record.kind,
                timestamp: record.timestamp,
            }
        };

        let listeners = self.listeners.lock().unwrap();
        for (id, listener) in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener.on_error(&event))).is_err() {
                log::error!("recovery: error listener {id:?} panicked on '{path}'");
            }
        }
    }
}
