//! Protocol factories.
//!
//! A factory holds one immutable configuration and stamps out a protocol per
//! transport, e.g. one per accepted connection. Protocol instances are never
//! pooled or shared.

use crate::accel::{native_loader, AcceleratedProtocol, FastCodecLoader};
use crate::config::{AcceleratedConfig, ProtocolConfig};
use crate::core::protocol::BinaryProtocol;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct BinaryProtocolFactory {
    config: ProtocolConfig,
}

impl BinaryProtocolFactory {
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    /// Build a factory only if `config` passes validation
    pub fn try_new(config: ProtocolConfig) -> Result<Self> {
        config.validate_strict()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn get_protocol<T>(&self, transport: T) -> BinaryProtocol<T> {
        BinaryProtocol::new(transport, self.config.clone())
    }
}

#[derive(Debug, Clone)]
pub struct AcceleratedProtocolFactory {
    config: AcceleratedConfig,
    loader: FastCodecLoader,
}

impl AcceleratedProtocolFactory {
    pub fn new(config: AcceleratedConfig) -> Self {
        Self::with_loader(config, native_loader)
    }

    pub fn with_loader(config: AcceleratedConfig, loader: FastCodecLoader) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &AcceleratedConfig {
        &self.config
    }

    /// Fails when no fast path binds and fallback is disabled
    pub fn get_protocol<T>(&self, transport: T) -> Result<AcceleratedProtocol<T>> {
        AcceleratedProtocol::with_loader(transport, self.config.clone(), self.loader)
    }
}

impl Default for AcceleratedProtocolFactory {
    fn default() -> Self {
        Self::new(AcceleratedConfig::default())
    }
}
