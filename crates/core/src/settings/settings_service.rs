use super::{SettingsRepositoryTrait, SettlementSettings};
use crate::errors::{DatabaseError, Error, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    /// Settlement policy for a fund, falling back to defaults when unset.
    fn get_settlement_settings(&self, fund_id: &str) -> Result<SettlementSettings>;

    async fn update_settlement_settings(
        &self,
        fund_id: &str,
        settings: SettlementSettings,
    ) -> Result<SettlementSettings>;
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        SettingsService {
            settings_repository,
        }
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settlement_settings(&self, fund_id: &str) -> Result<SettlementSettings> {
        let key = SettlementSettings::storage_key(fund_id);
        match self.settings_repository.get_setting(&key) {
            Ok(value) => match serde_json::from_str::<SettlementSettings>(&value) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    warn!(
                        "Ignoring unreadable settlement settings for fund {}: {}",
                        fund_id, e
                    );
                    Ok(SettlementSettings::default())
                }
            },
            Err(Error::Database(DatabaseError::NotFound(_))) => {
                Ok(SettlementSettings::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn update_settlement_settings(
        &self,
        fund_id: &str,
        settings: SettlementSettings,
    ) -> Result<SettlementSettings> {
        settings.validate()?;
        let value = serde_json::to_string(&settings)?;
        debug!("Updating settlement settings for fund {}: {}", fund_id, value);
        self.settings_repository
            .update_setting(&SettlementSettings::storage_key(fund_id), &value)
            .await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ReminderSchedule;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSettingsRepository {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SettingsRepositoryTrait for MockSettingsRepository {
        fn get_setting(&self, setting_key: &str) -> Result<String> {
            self.values
                .lock()
                .unwrap()
                .get(setting_key)
                .cloned()
                .ok_or_else(|| DatabaseError::NotFound(setting_key.to_string()).into())
        }

        async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(setting_key.to_string(), setting_value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_defaults_until_updated() {
        let repo = Arc::new(MockSettingsRepository::default());
        let service = SettingsService::new(repo);

        assert_eq!(
            service.get_settlement_settings("fund-1").unwrap(),
            SettlementSettings::default()
        );

        let custom = SettlementSettings {
            match_tolerance: dec!(100),
            reminder_schedule: ReminderSchedule::WindowFraction([0.5, 0.93]),
            ..SettlementSettings::default()
        };
        service
            .update_settlement_settings("fund-1", custom.clone())
            .await
            .unwrap();

        assert_eq!(service.get_settlement_settings("fund-1").unwrap(), custom);
        assert_eq!(
            service.get_settlement_settings("fund-2").unwrap(),
            SettlementSettings::default()
        );
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_stored() {
        let repo = Arc::new(MockSettingsRepository::default());
        let service = SettingsService::new(repo.clone());

        let bad = SettlementSettings {
            reconciliation_window_days: 0,
            ..SettlementSettings::default()
        };
        let err = service
            .update_settlement_settings("fund-1", bad)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue(_)));
        assert!(repo.values.lock().unwrap().is_empty());
    }
}
