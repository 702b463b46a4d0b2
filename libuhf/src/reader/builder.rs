// libuhf-rs/libuhf/src/reader/builder.rs

use crate::params::{MemoryParams, ParamStore};
use crate::read::stream::AuthCallback;
use crate::reader::handle::{Connected, Disconnected, Reader};
use crate::transport::Transport;
use crate::{Error, Result};

/// Helper to construct a Reader with optional configuration.
#[derive(Default)]
pub struct ReaderBuilder {
    transport: Option<Box<dyn Transport>>,
    params: Option<Box<dyn ParamStore>>,
    auth: Option<AuthCallback>,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide an already-created transport instance (e.g. MockTransport)
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a serial port transport. The port itself is opened by `connect`.
    #[cfg(feature = "serial")]
    pub fn with_serial_port(self) -> Self {
        self.with_transport(Box::new(crate::transport::SerialTransport::new()))
    }

    /// Parameter store to read settings from; defaults to [`MemoryParams`].
    pub fn with_params(mut self, params: Box<dyn ParamStore>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_auth_callback(mut self, callback: AuthCallback) -> Self {
        self.auth = Some(callback);
        self
    }

    /// Consume the builder and return a disconnected Reader.
    /// Requires a transport to be provided.
    pub fn build(self) -> Result<Reader<Disconnected>> {
        let transport = self
            .transport
            .ok_or_else(|| Error::InvalidState("no transport configured".into()))?;
        let params = self
            .params
            .unwrap_or_else(|| Box::new(MemoryParams::new()));
        let mut reader = Reader::new_with_transport(transport, params);
        if let Some(cb) = self.auth {
            reader.set_auth_callback(cb);
        }
        Ok(reader)
    }

    /// Build and connect in one step.
    pub fn connect(self, port: &str) -> Result<Reader<Connected>> {
        self.build()?.connect(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamValue, keys};
    use crate::test_support::script_connect;
    use crate::transport::MockTransport;
    use crate::types::PowerMode;

    #[test]
    fn builder_requires_transport() {
        assert!(matches!(
            ReaderBuilder::new().build(),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn builder_with_mock_transport() {
        let mock = MockTransport::new();
        script_connect(&mock, 0x30, PowerMode::Sleep);
        let mut params = MemoryParams::new();
        params.set(keys::COMMAND_TIMEOUT, ParamValue::U32(100)).unwrap();
        let reader = ReaderBuilder::new()
            .with_transport(Box::new(mock.clone()))
            .with_params(Box::new(params))
            .connect("mock")
            .unwrap();
        assert_eq!(reader.model().name(), "M6e Nano");
        // asleep after the power-mode query: the next frame carries a preamble
        let before = mock.wakeup_count();
        reader.commands().unwrap().clear_tag_buffer().ok();
        assert_eq!(mock.wakeup_count(), before + 1);
    }
}
