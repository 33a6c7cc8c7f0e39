//! Database row for the settings table.

use diesel::prelude::*;

use pocketledger_core::categories::{decode_categories_blob, encode_categories_blob};
use pocketledger_core::settings::Settings;
use pocketledger_core::sync::SyncStatus;

use crate::mapper::{amount_from_db, amount_to_db, bool_from_db, bool_to_db};

/// `treat_none_as_null` keeps upserts exact overwrites: a field cleared to
/// `None` in the domain record clears the column instead of being skipped.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(primary_key(user_id))]
#[diesel(table_name = crate::schema::settings)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SettingsDB {
    pub user_id: String,
    pub currency: String,
    pub locale: String,
    pub name: String,
    pub avatar: Option<String>,
    pub budget: Option<String>,
    pub max_amount: Option<String>,
    pub notifications_enabled: i32,
    pub reminder_time: Option<String>,
    pub app_lock_enabled: i32,
    pub security_pin: Option<String>,
    pub biometrics_enabled: i32,
    pub theme: String,
    pub accent_color: Option<String>,
    pub categories: String,
    pub is_premium: i32,
    pub automatic_cloud_sync: i32,
    pub updated_at: String,
    pub sync_status: String,
}

impl SettingsDB {
    pub fn from_domain(settings: &Settings) -> Self {
        Self {
            user_id: settings.user_id.clone(),
            currency: settings.currency.clone(),
            locale: settings.locale.clone(),
            name: settings.name.clone(),
            avatar: settings.avatar.clone(),
            budget: settings.budget.map(amount_to_db),
            max_amount: settings.max_amount.map(amount_to_db),
            notifications_enabled: bool_to_db(settings.notifications_enabled),
            reminder_time: settings.reminder_time.clone(),
            app_lock_enabled: bool_to_db(settings.app_lock_enabled),
            security_pin: settings.security_pin.clone(),
            biometrics_enabled: bool_to_db(settings.biometrics_enabled),
            theme: settings.theme.clone(),
            accent_color: settings.accent_color.clone(),
            categories: encode_categories_blob(&settings.categories),
            is_premium: bool_to_db(settings.is_premium),
            automatic_cloud_sync: bool_to_db(settings.automatic_cloud_sync),
            updated_at: settings.updated_at.clone(),
            sync_status: settings.sync_status.as_str().to_string(),
        }
    }

    pub fn into_domain(self) -> Settings {
        Settings {
            user_id: self.user_id,
            currency: self.currency,
            locale: self.locale,
            name: self.name,
            avatar: self.avatar,
            budget: self.budget.as_deref().map(amount_from_db),
            max_amount: self.max_amount.as_deref().map(amount_from_db),
            notifications_enabled: bool_from_db(self.notifications_enabled),
            reminder_time: self.reminder_time,
            app_lock_enabled: bool_from_db(self.app_lock_enabled),
            security_pin: self.security_pin,
            biometrics_enabled: bool_from_db(self.biometrics_enabled),
            theme: self.theme,
            accent_color: self.accent_color,
            categories: decode_categories_blob(&self.categories),
            is_premium: bool_from_db(self.is_premium),
            automatic_cloud_sync: bool_from_db(self.automatic_cloud_sync),
            updated_at: self.updated_at,
            sync_status: SyncStatus::parse(&self.sync_status).unwrap_or(SyncStatus::Pending),
        }
    }
}
