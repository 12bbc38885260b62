//! Process entry: service selection and launch-mode dispatch.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use thiserror::Error;

use crate::config::{ConfigError, EnvOverlay, ObservabilityConfig};
use crate::launcher::{LaunchError, Launcher, RunningInstance};
use crate::observability::SharedLogger;
use crate::services::notification::{self, NotificationStore};

/// Services this binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Notification,
}

impl ServiceKind {
    pub const ALL: &'static [ServiceKind] = &[ServiceKind::Notification];

    pub fn id(self) -> &'static str {
        match self {
            ServiceKind::Notification => notification::SERVICE_ID,
        }
    }

    /// Other accepted spellings, kept for existing deployments.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ServiceKind::Notification => &["notifacation-service"],
        }
    }

    fn available() -> String {
        Self::ALL.iter().map(|k| k.id()).collect::<Vec<_>>().join(", ")
    }
}

impl FromStr for ServiceKind {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == s.trim() || kind.aliases().contains(&s.trim()))
            .ok_or_else(|| EntryError::UnknownService {
                name: s.to_string(),
                available: Self::available(),
            })
    }
}

/// How to expose the selected service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LaunchMode {
    /// Point-to-point socket transport.
    #[default]
    Service,
    /// HTTP application.
    App,
    /// HTTP application plus broker subscriptions.
    Hybrid,
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("SERVICE is not set; available services: {available}")]
    MissingService { available: String },

    #[error("Unknown service '{name}'; available services: {available}")]
    UnknownService { name: String, available: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Launch failed: {0}")]
    Launch(#[from] LaunchError),
}

/// What to run, as parsed from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub service: Option<String>,
    pub mode: LaunchMode,
    pub config_path: Option<PathBuf>,
}

impl Selection {
    /// Resolve the service name. Fails before anything is constructed.
    pub fn service_kind(&self) -> Result<ServiceKind, EntryError> {
        match self.service.as_deref().map(str::trim) {
            None | Some("") => Err(EntryError::MissingService {
                available: ServiceKind::available(),
            }),
            Some(name) => name.parse(),
        }
    }
}

/// A selected service. Configuration is read at launch.
pub struct Prepared<F> {
    kind: ServiceKind,
    mode: LaunchMode,
    config_path: Option<PathBuf>,
    env: EnvOverlay<F>,
}

/// Select the service. Configuration is not read yet.
pub fn prepare<F>(selection: &Selection, env: EnvOverlay<F>) -> Result<Prepared<F>, EntryError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind = selection.service_kind()?;
    Ok(Prepared {
        kind,
        mode: selection.mode,
        config_path: selection.config_path.clone(),
        env,
    })
}

impl<F> Prepared<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// Logging settings the selected service would run with.
    pub fn observability(&self) -> Result<ObservabilityConfig, EntryError> {
        let path = self.config_path.as_deref();
        Ok(match self.kind {
            ServiceKind::Notification => notification::config::service_config(path, &self.env)?.observability,
        })
    }

    /// Load configuration and start the instance in the selected mode.
    pub async fn launch(self, logger: Option<SharedLogger>) -> Result<RunningInstance, EntryError> {
        let path = self.config_path.as_deref();
        match self.kind {
            ServiceKind::Notification => {
                let descriptor = notification::descriptor(Arc::new(NotificationStore::new()));
                let instance = match self.mode {
                    LaunchMode::Service => {
                        let config = notification::config::service_config(path, &self.env)?;
                        Launcher::service(descriptor, &config, logger).await?
                    }
                    LaunchMode::App => {
                        let config = notification::config::app_config(path, &self.env)?;
                        Launcher::application(descriptor, &config, logger).await?
                    }
                    LaunchMode::Hybrid => {
                        let config = notification::config::app_config(path, &self.env)?;
                        Launcher::hybrid(descriptor, &config, logger).await?
                    }
                };
                Ok(instance)
            }
        }
    }
}

/// Select, configure and launch in one step.
pub async fn run<F>(
    selection: &Selection,
    env: EnvOverlay<F>,
    logger: Option<SharedLogger>,
) -> Result<RunningInstance, EntryError>
where
    F: Fn(&str) -> Option<String>,
{
    prepare(selection, env)?.launch(logger).await
}
