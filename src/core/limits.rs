//! # Resource Guards
//!
//! Length checks applied to attacker-controlled size fields before anything
//! proportional to them is allocated or iterated.
//!
//! Every string/binary length and every map/list/set element count decoded by
//! the generic codec or the bulk fast path goes through [`DecodeLimits`], at
//! every nesting depth.

use crate::config::ProtocolConfig;
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;
use tracing::warn;

/// Decode-time ceilings copied out of a [`ProtocolConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub string_length: Option<usize>,
    pub container_length: Option<usize>,
    pub recursion: usize,
}

impl DecodeLimits {
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self {
            string_length: config.string_length_limit,
            container_length: config.container_length_limit,
            recursion: config.recursion_limit,
        }
    }

    /// No ceilings beyond the default recursion depth
    pub fn unlimited() -> Self {
        Self::from_config(&ProtocolConfig::default())
    }

    /// Validate a decoded string/binary length prefix
    pub fn check_string_length(&self, length: i32) -> Result<usize> {
        let length = non_negative(length)?;
        if let Some(limit) = self.string_length {
            if length > limit {
                warn!(length, limit, "String length exceeds configured limit");
                global_metrics().limit_rejection();
                return Err(ProtocolError::StringLimitExceeded { length, limit });
            }
        }
        Ok(length)
    }

    /// Validate a decoded container element count
    pub fn check_container_length(&self, length: i32) -> Result<usize> {
        let length = non_negative(length)?;
        if let Some(limit) = self.container_length {
            if length > limit {
                warn!(length, limit, "Container length exceeds configured limit");
                global_metrics().limit_rejection();
                return Err(ProtocolError::ContainerLimitExceeded { length, limit });
            }
        }
        Ok(length)
    }

    /// Validate the depth of a nested value about to be decoded
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.recursion {
            warn!(depth, limit = self.recursion, "Nesting depth exceeds limit");
            return Err(ProtocolError::DepthLimitExceeded(self.recursion));
        }
        Ok(())
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

fn non_negative(length: i32) -> Result<usize> {
    usize::try_from(length).map_err(|_| ProtocolError::NegativeLength(length))
}

/// Length of an outgoing string/container as a wire length prefix
pub(crate) fn wire_length(length: usize) -> Result<i32> {
    i32::try_from(length).map_err(|_| {
        ProtocolError::InvalidValue(format!(
            "{}: {length}",
            crate::error::constants::ERR_LENGTH_OVERFLOW
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(string: usize, container: usize) -> DecodeLimits {
        DecodeLimits {
            string_length: Some(string),
            container_length: Some(container),
            recursion: 4,
        }
    }

    #[test]
    fn test_no_limit_is_noop() {
        let limits = DecodeLimits::unlimited();
        assert_eq!(limits.check_string_length(i32::MAX).ok(), Some(i32::MAX as usize));
        assert_eq!(limits.check_container_length(0).ok(), Some(0));
    }

    #[test]
    fn test_limit_boundary() {
        let limits = limited(10, 3);
        assert_eq!(limits.check_string_length(10).ok(), Some(10));
        assert!(matches!(
            limits.check_string_length(11),
            Err(ProtocolError::StringLimitExceeded { length: 11, limit: 10 })
        ));
        assert_eq!(limits.check_container_length(3).ok(), Some(3));
        assert!(matches!(
            limits.check_container_length(4),
            Err(ProtocolError::ContainerLimitExceeded { length: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_zero_limit() {
        let limits = limited(0, 0);
        assert!(limits.check_string_length(0).is_ok());
        assert!(limits.check_string_length(1).is_err());
        assert!(limits.check_container_length(1).is_err());
    }

    #[test]
    fn test_negative_lengths_rejected() {
        let limits = DecodeLimits::unlimited();
        assert!(matches!(
            limits.check_string_length(-1),
            Err(ProtocolError::NegativeLength(-1))
        ));
        assert!(matches!(
            limits.check_container_length(i32::MIN),
            Err(ProtocolError::NegativeLength(i32::MIN))
        ));
    }

    #[test]
    fn test_depth() {
        let limits = limited(0, 0);
        assert!(limits.check_depth(4).is_ok());
        assert!(matches!(
            limits.check_depth(5),
            Err(ProtocolError::DepthLimitExceeded(4))
        ));
    }

    #[test]
    fn test_wire_length_overflow() {
        assert_eq!(wire_length(5).ok(), Some(5));
        assert!(matches!(
            wire_length(i32::MAX as usize + 1),
            Err(ProtocolError::InvalidValue(_))
        ));
    }
}
