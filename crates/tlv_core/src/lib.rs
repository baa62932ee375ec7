//! # TLV Core
//!
//! Crate compartilhada que define o protocolo TLV do link serial de
//! telemetria do veículo, o registro de tipos e a configuração TOML.
//!
//! ## Módulos
//! - [`registry`] – IDs de sinal, schema (largura/sinal) e escalares
//! - [`types`] – Registro TLV, status flags e snapshot do veículo
//! - [`protocol`] – Encoder e decoder incremental `[type][len][value]`
//! - [`config`] – Configuração unificada via TOML
//! - [`transport`] – Abertura de porta serial raw, arquivo ou stdio

pub mod registry;
pub mod types;
pub mod protocol;
pub mod config;
pub mod transport;

// Re-exports convenientes
pub use registry::{Scalar, SignalType, ValueKind};
pub use types::{StatusFlags, TlvRecord, VehicleData};
pub use protocol::{
    DecodeState, ProtocolError, TlvDecoder, encode_frame, encode_scalar, encode_signal, interpret,
};
pub use config::{AppConfig, ConfigError, ReceiverConfig, SenderConfig};
