//! Structured unit logging utilities.
//!
//! Provides consistent, structured logging for pipeline units with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

/// Logger bound to one unit (a scene, merge, concatenation or load test).
#[derive(Debug, Clone)]
pub struct UnitLogger {
    unit_id: String,
    operation: String,
}

impl UnitLogger {
    /// Create a new logger for a unit and operation.
    pub fn new(unit_id: &str, operation: &str) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            unit_id = %self.unit_id,
            operation = %self.operation,
            "Unit started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            unit_id = %self.unit_id,
            operation = %self.operation,
            "Unit progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            unit_id = %self.unit_id,
            operation = %self.operation,
            "Unit warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            unit_id = %self.unit_id,
            operation = %self.operation,
            "Unit error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            unit_id = %self.unit_id,
            operation = %self.operation,
            "Unit completed: {}", message
        );
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this unit.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "unit",
            unit_id = %self.unit_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_logger_creation() {
        let logger = UnitLogger::new("scene-7", "image_to_video");
        assert_eq!(logger.unit_id(), "scene-7");
        assert_eq!(logger.operation(), "image_to_video");
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = UnitLogger::new("p1", "concatenate");
        logger.log_start("start");
        logger.log_progress("half");
        logger.log_warning("warn");
        logger.log_error("err");
        logger.log_completion("done");
        let _span = logger.create_span();
    }
}
