//! Per-invocation wiring: settings, logging, database and request context

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use saverestore_core::errors::ExError;
use saverestore_core::logging_facility;
use saverestore_core::pv_source::{PvSource, StaticPvSource};
use saverestore_core::settings::Settings;
use saverestore_core_types::RequestContext;
use saverestore_engine::{
    apply_engine_command, EngineCommand, EngineCommandResult, SnapshotOrchestrator,
};
use saverestore_store::{db, migrations};

pub struct Session {
    conn: Connection,
    settings: Settings,
    ctx: RequestContext,
}

impl Session {
    /// Load settings, install logging, open and migrate the database
    pub fn open(config: Option<&Path>, db_override: Option<PathBuf>) -> Result<Self, ExError> {
        let mut settings = Settings::load(config)?;
        if let Some(path) = db_override {
            settings.database_path = path;
        }
        logging_facility::init(settings.log_profile);

        let mut conn = db::open(&settings.database_path)?;
        db::configure(&conn, settings.storage_busy_timeout())?;
        migrations::apply_migrations(&mut conn)?;

        let ctx = RequestContext::new();
        tracing::debug!(
            request_id = ctx.request_id.as_str(),
            database = %settings.database_path.display(),
            "session opened"
        );
        Ok(Self {
            conn,
            settings,
            ctx,
        })
    }

    /// Run a command that never reads PVs
    pub async fn run(&mut self, cmd: EngineCommand) -> Result<EngineCommandResult, ExError> {
        self.run_with_source(cmd, Arc::new(StaticPvSource::new())).await
    }

    pub async fn run_with_source(
        &mut self,
        cmd: EngineCommand,
        source: Arc<dyn PvSource>,
    ) -> Result<EngineCommandResult, ExError> {
        let orchestrator = SnapshotOrchestrator::from_settings(source, &self.settings);
        apply_engine_command(cmd, &mut self.conn, &orchestrator, &self.ctx).await
    }
}

/// Print a command result as pretty JSON on stdout
pub fn print_json(result: &EngineCommandResult) -> Result<(), ExError> {
    let rendered = serde_json::to_string_pretty(result).map_err(|e| {
        ExError::new(saverestore_core::errors::ExErrorKind::Serialization)
            .with_op("print_result")
            .with_message(e.to_string())
    })?;
    println!("{}", rendered);
    Ok(())
}
