//! Startup settings merge loader and settings facade.
//!
//! Three sources can disagree at startup: the local cache, the remote store
//! and a legacy flat key-value blob from the pre-migration storage format.
//! The loader applies them in that order (local first for a fast paint,
//! remote overwriting it, legacy only when both are empty), reconciling
//! fields tolerantly under both their camelCase and snake_case spellings.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use serde_json::Value;

use crate::categories::{decode_categories_value, default_categories, Category};
use crate::errors::{Error, Result};
use crate::identity::UserIdentity;
use crate::serde_util::value_as_bool;
use crate::settings::{hash_pin, is_plaintext_pin, Settings, SettingsRepositoryTrait};
use crate::sync::{RemoteStore, SyncReconciler, SyncStateRepositoryTrait, SyncStatus};
use crate::time;

/// Local store handles present on platforms with an embedded database.
#[derive(Clone)]
pub struct LocalSettingsStores {
    pub repo: Arc<dyn SettingsRepositoryTrait>,
    pub sync_state: Arc<dyn SyncStateRepositoryTrait>,
}

/// Settings facade: owns the in-memory settings record and runs the startup
/// merge sequence.
pub struct SettingsService {
    local: Option<LocalSettingsStores>,
    remote: Arc<dyn RemoteStore>,
    reconciler: Option<Arc<SyncReconciler>>,
    identity: UserIdentity,
    current: RwLock<Settings>,
}

impl SettingsService {
    pub fn new(
        local: Option<LocalSettingsStores>,
        remote: Arc<dyn RemoteStore>,
        reconciler: Option<Arc<SyncReconciler>>,
        identity: UserIdentity,
    ) -> Self {
        let current = RwLock::new(Settings::defaults_for(&identity.user_id));
        Self {
            local,
            remote,
            reconciler,
            identity,
            current,
        }
    }

    /// Snapshot of the in-memory settings record.
    pub fn current(&self) -> Settings {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn apply(&self, settings: Settings) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }

    /// Reset the in-memory record to defaults (sign-out).
    pub fn reset(&self) {
        self.apply(Settings::defaults_for(&self.identity.user_id));
    }

    fn trigger_background_push(&self) {
        if let Some(reconciler) = &self.reconciler {
            let reconciler = Arc::clone(reconciler);
            tokio::spawn(async move {
                if let Err(err) = reconciler.push().await {
                    log::warn!("[Sync] background settings push failed: {err}");
                }
            });
        }
    }

    /// Run the startup merge sequence and return the reconciled record.
    ///
    /// Each stage updates the in-memory record as soon as it lands, so a UI
    /// observing [`current`](Self::current) paints cached state before the
    /// remote fetch completes.
    pub async fn load(&self) -> Result<Settings> {
        let user_id = self.identity.user_id.clone();
        let mut loaded: Option<Settings> = None;

        if let Some(local) = &self.local {
            match local.repo.get(&user_id).await {
                Ok(Some(mut cached)) => {
                    if migrate_security_pin(&mut cached) {
                        if let Err(err) = local.repo.upsert_pending(cached.clone()).await {
                            log::warn!("[Sync] persisting migrated pin failed: {err}");
                        }
                    }
                    self.apply(cached.clone());
                    loaded = Some(cached);
                }
                Ok(None) => {}
                Err(err) => log::warn!("[Sync] settings cache read failed: {err}"),
            }
        }

        match self.remote.get_settings(&user_id).await {
            Ok(Some(raw)) => {
                let mut merged = reconcile_settings_value(&user_id, &raw);
                merged.sync_status = SyncStatus::Synced;
                let pin_migrated = migrate_security_pin(&mut merged);
                if let Some(local) = &self.local {
                    if let Err(err) = local.repo.upsert_synced(merged.clone()).await {
                        log::warn!("[Sync] settings cache refresh failed: {err}");
                    }
                }
                if pin_migrated {
                    if let Err(err) = self.remote.upsert_settings(merged.clone()).await {
                        log::warn!("[Sync] storing hashed pin remotely failed: {err}");
                    }
                }
                self.apply(merged.clone());
                loaded = Some(merged);
            }
            Ok(None) => {}
            Err(err) => log::warn!("[Sync] remote settings fetch failed: {err}"),
        }

        if loaded.is_none() {
            loaded = self.load_legacy_fallback(&user_id).await;
        }

        let settings = match loaded {
            Some(settings) => settings,
            None => {
                let defaults = Settings::defaults_for(&user_id);
                if let Some(local) = &self.local {
                    if let Err(err) = local.repo.upsert_pending(defaults.clone()).await {
                        log::warn!("[Sync] seeding default settings failed: {err}");
                    }
                }
                self.apply(defaults.clone());
                defaults
            }
        };
        Ok(settings)
    }

    /// Pre-migration flat blob. Persisted forward on first use so the
    /// fallback never applies twice per install.
    async fn load_legacy_fallback(&self, user_id: &str) -> Option<Settings> {
        let local = self.local.as_ref()?;
        let blob = match local.sync_state.get_legacy_settings().await {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("[Sync] legacy settings read failed: {err}");
                return None;
            }
        };
        let raw: Value = match serde_json::from_str(&blob) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("[Sync] legacy settings blob is malformed: {err}");
                return None;
            }
        };
        let mut merged = reconcile_settings_value(user_id, &raw);
        migrate_security_pin(&mut merged);
        merged.sync_status = SyncStatus::Pending;
        if let Err(err) = local.repo.upsert_pending(merged.clone()).await {
            log::warn!("[Sync] persisting legacy settings forward failed: {err}");
        }
        self.apply(merged.clone());
        self.trigger_background_push();
        Some(merged)
    }

    /// Persist an edited record: pending locally with a background push on
    /// local-first platforms, straight to the remote store otherwise.
    pub async fn save(&self, mut settings: Settings) -> Result<()> {
        if settings.categories.is_empty() {
            return Err(Error::validation("settings must keep at least one category"));
        }
        if let Some(pin) = settings.security_pin.as_deref() {
            if is_plaintext_pin(pin) {
                settings.security_pin = Some(hash_pin(pin));
            }
        }
        settings.updated_at = time::now_rfc3339();
        match &self.local {
            Some(local) => {
                settings.sync_status = SyncStatus::Pending;
                local.repo.upsert_pending(settings.clone()).await?;
                self.apply(settings);
                self.trigger_background_push();
            }
            None => {
                settings.sync_status = SyncStatus::Synced;
                self.remote.upsert_settings(settings.clone()).await?;
                self.apply(settings);
            }
        }
        Ok(())
    }

    pub async fn add_category(&self, category: Category) -> Result<()> {
        let mut settings = self.current();
        if settings
            .categories
            .iter()
            .any(|existing| existing.name == category.name)
        {
            return Err(Error::validation(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        settings.categories.push(category);
        self.save(settings).await
    }

    pub async fn update_category(&self, category: Category) -> Result<()> {
        let mut settings = self.current();
        let slot = settings
            .categories
            .iter_mut()
            .find(|existing| existing.name == category.name)
            .ok_or_else(|| Error::validation(format!("unknown category '{}'", category.name)))?;
        *slot = category;
        self.save(settings).await
    }

    pub async fn remove_category(&self, name: &str) -> Result<()> {
        let mut settings = self.current();
        crate::categories::remove_category(&mut settings.categories, name)?;
        self.save(settings).await
    }
}

/// Migrate a legacy plaintext PIN into its hash. Returns whether the record
/// changed; an already-hashed value is left untouched.
fn migrate_security_pin(settings: &mut Settings) -> bool {
    match settings.security_pin.as_deref() {
        Some(pin) if is_plaintext_pin(pin) => {
            settings.security_pin = Some(hash_pin(pin));
            true
        }
        _ => false,
    }
}

fn pick<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = raw.as_object()?;
    keys.iter()
        .find_map(|key| object.get(*key))
        .filter(|value| !value.is_null())
}

fn pick_string(raw: &Value, keys: &[&str]) -> Option<String> {
    pick(raw, keys)?.as_str().map(str::to_string)
}

fn pick_bool(raw: &Value, keys: &[&str]) -> Option<bool> {
    pick(raw, keys).and_then(value_as_bool)
}

fn pick_decimal(raw: &Value, keys: &[&str]) -> Option<Decimal> {
    match pick(raw, keys)? {
        Value::Number(number) => number.as_f64().and_then(|v| Decimal::try_from(v).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Build a settings record from a raw source row, reading every field under
/// both its camelCase domain spelling and its snake_case storage spelling;
/// the first present value wins. Missing fields keep their defaults.
pub fn reconcile_settings_value(user_id: &str, raw: &Value) -> Settings {
    let mut settings = Settings::defaults_for(user_id);

    if let Some(value) = pick_string(raw, &["currency"]) {
        settings.currency = value;
    }
    if let Some(value) = pick_string(raw, &["locale"]) {
        settings.locale = value;
    }
    if let Some(value) = pick_string(raw, &["name", "displayName", "display_name"]) {
        settings.name = value;
    }
    settings.avatar = pick_string(raw, &["avatar"]).or(settings.avatar);
    settings.budget = pick_decimal(raw, &["budget"]).or(settings.budget);
    settings.max_amount = pick_decimal(raw, &["maxAmount", "max_amount"]).or(settings.max_amount);
    if let Some(value) = pick_bool(raw, &["notificationsEnabled", "notifications_enabled"]) {
        settings.notifications_enabled = value;
    }
    settings.reminder_time =
        pick_string(raw, &["reminderTime", "reminder_time"]).or(settings.reminder_time);
    if let Some(value) = pick_bool(raw, &["appLockEnabled", "app_lock_enabled"]) {
        settings.app_lock_enabled = value;
    }
    settings.security_pin =
        pick_string(raw, &["securityPin", "security_pin"]).or(settings.security_pin);
    if let Some(value) = pick_bool(raw, &["biometricsEnabled", "biometrics_enabled"]) {
        settings.biometrics_enabled = value;
    }
    if let Some(value) = pick_string(raw, &["theme"]) {
        settings.theme = value;
    }
    settings.accent_color =
        pick_string(raw, &["accentColor", "accent_color"]).or(settings.accent_color);
    if let Some(value) = pick(raw, &["categories"]) {
        settings.categories = decode_categories_value(value);
    } else {
        settings.categories = default_categories();
    }
    if let Some(value) = pick_bool(raw, &["isPremium", "is_premium"]) {
        settings.is_premium = value;
    }
    if let Some(value) = pick_bool(raw, &["automaticCloudSync", "automatic_cloud_sync"]) {
        settings.automatic_cloud_sync = value;
    }
    if let Some(value) = pick_string(raw, &["updatedAt", "updated_at"]) {
        settings.updated_at = value;
    }

    settings
}
