use crate::domain::compliance::signals::ALL_SIGNALS;
use crate::domain::compliance::OperationalSignals;
use crate::domain::ports::SignalProvider;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Last reported state of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    pub healthy: bool,
    pub updated_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Centralized board of component health, read by `/health` and scored by the
/// compliance cycle as operational signals.
pub struct ComponentHealthService {
    components: RwLock<BTreeMap<String, ComponentStatus>>,
}

impl ComponentHealthService {
    pub fn new() -> Self {
        Self {
            components: RwLock::new(BTreeMap::new()),
        }
    }

    /// Board with every compliance signal reporting healthy.
    pub async fn with_compliance_signals() -> Self {
        let service = Self::new();
        for signal in ALL_SIGNALS {
            service.set_status(signal, true, None).await;
        }
        service
    }

    /// Update one component. Transitions are logged; repeated reports only refresh
    /// the timestamp.
    pub async fn set_status(&self, component: &str, healthy: bool, reason: Option<String>) {
        let mut lock = self.components.write().await;
        let previous = lock.get(component).map(|s| s.healthy);

        if previous != Some(healthy) {
            let suffix = reason
                .as_ref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default();
            if healthy {
                info!("ComponentHealthService: {} is healthy{}", component, suffix);
            } else {
                warn!("ComponentHealthService: {} is unhealthy{}", component, suffix);
            }
        }

        lock.insert(
            component.to_string(),
            ComponentStatus {
                healthy,
                updated_at: Utc::now(),
                reason,
            },
        );
    }

    pub async fn status(&self, component: &str) -> Option<ComponentStatus> {
        self.components.read().await.get(component).cloned()
    }

    /// Component name to health flag.
    pub async fn snapshot(&self) -> BTreeMap<String, bool> {
        self.components
            .read()
            .await
            .iter()
            .map(|(name, status)| (name.clone(), status.healthy))
            .collect()
    }

    pub async fn all_healthy(&self) -> bool {
        self.components.read().await.values().all(|s| s.healthy)
    }
}

impl Default for ComponentHealthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalProvider for ComponentHealthService {
    async fn collect(&self) -> Result<OperationalSignals> {
        let components = self.components.read().await;
        Ok(components
            .iter()
            .map(|(name, status)| (name.as_str(), status.healthy))
            .collect())
    }
}
