use kinloop_events::EmitError;
use kinloop_render::RenderError;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{field} must be positive and finite, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },
    #[error("driver has not been started")]
    NotStarted,
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Ceiling on the seconds a single frame may feed the accumulator.
    pub max_frame_time: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_frame_time: 0.25,
        }
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, DriverError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(DriverError::InvalidConfig { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: DriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(positive("dt", 0.5).is_ok());
        assert!(positive("dt", 0.0).is_err());
        assert!(positive("dt", f64::NAN).is_err());
        assert!(positive("dt", f64::INFINITY).is_err());
    }
}
