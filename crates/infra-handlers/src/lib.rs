// Taskhive Infrastructure - Reference Handlers
// Implements: TaskHandler for every TaskType

pub mod challenge;
pub mod delay;
pub mod simulated;

pub use challenge::GenerateChallengeHandler;
pub use delay::SimulatedDelay;
pub use simulated::{
    CleanupDataHandler, GenerateReportHandler, ProcessSubmissionHandler, SendNotificationHandler,
    Simulation, UpdateLeaderboardHandler,
};

use std::sync::Arc;
use taskhive_core::application::HandlerRegistry;
use taskhive_core::domain::TaskType;
use taskhive_core::error::Result;
use taskhive_core::port::TimeProvider;

/// Default content backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Handler settings
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub backend_url: String,
    pub backend_api_key: Option<String>,
    pub simulated_delay: SimulatedDelay,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_api_key: None,
            simulated_delay: SimulatedDelay::between(500, 3000),
        }
    }
}

/// Register one reference handler per task type
///
/// # Errors
/// - `AppError::Conflict` if a type is already bound in `registry`
/// - `AppError::Config` if the HTTP client cannot be built
pub fn register_defaults(
    registry: &mut HandlerRegistry,
    config: &HandlerConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<()> {
    let simulation = Simulation::new(time_provider, config.simulated_delay);

    registry.register(
        TaskType::GenerateChallenge,
        Arc::new(GenerateChallengeHandler::new(
            &config.backend_url,
            config.backend_api_key.clone(),
        )?),
    )?;
    registry.register(
        TaskType::ProcessSubmission,
        Arc::new(ProcessSubmissionHandler(simulation.clone())),
    )?;
    registry.register(
        TaskType::SendNotification,
        Arc::new(SendNotificationHandler(simulation.clone())),
    )?;
    registry.register(
        TaskType::UpdateLeaderboard,
        Arc::new(UpdateLeaderboardHandler(simulation.clone())),
    )?;
    registry.register(
        TaskType::GenerateReport,
        Arc::new(GenerateReportHandler(simulation.clone())),
    )?;
    registry.register(TaskType::CleanupData, Arc::new(CleanupDataHandler(simulation)))?;

    Ok(())
}
