//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável serve sender e receiver.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Caminho que significa stdin/stdout em vez de um dispositivo.
pub const STDIO_DEVICE: &str = "-";

/// Baud rate padrão da UART do firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Erros ao persistir a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro de serialização TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao escrever {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuração do Sender (gerador de dados mock).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Dispositivo de saída ("-" = stdout)
    pub device: String,
    /// Baud rate quando `device` é uma porta serial
    pub baud_rate: u32,
    /// Intervalo entre ciclos (ms)
    pub interval_ms: u64,
    /// Envia pressão/temperatura dos pneus além dos 10 sinais base
    pub include_tyres: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            device: STDIO_DEVICE.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            interval_ms: 50,
            include_tyres: true,
        }
    }
}

impl SenderConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Configuração do Receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Dispositivo de entrada ("-" = stdin)
    pub device: String,
    /// Baud rate quando `device` é uma porta serial
    pub baud_rate: u32,
    /// Tamanho do buffer de leitura (bytes)
    pub read_buffer: usize,
    /// Capacidade do channel entre thread de leitura e consumidor
    pub channel_capacity: usize,
    /// Sem registros por este tempo = link parado (ms)
    pub stale_after_ms: u64,
    /// Intervalo entre resumos no log (ms)
    pub summary_interval_ms: u64,
    /// Espera antes de reabrir o dispositivo após erro (ms)
    pub reconnect_delay_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyAMA0".into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_buffer: 256,
            channel_capacity: 64,
            stale_after_ms: 1000,
            summary_interval_ms: 1000,
            reconnect_delay_ms: 1000,
        }
    }
}

impl ReceiverConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_millis(self.summary_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Configuração raiz do aplicativo (unifica sender e receiver).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
    pub receiver: ReceiverConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sender.device.is_empty() {
            errors.push("Dispositivo do sender não pode ser vazio".into());
        }
        if self.sender.interval_ms < 10 || self.sender.interval_ms > 60_000 {
            errors.push(format!(
                "Intervalo do sender inválido: {} ms (10–60000)",
                self.sender.interval_ms
            ));
        }
        if self.sender.baud_rate == 0 {
            errors.push("Baud rate do sender não pode ser 0".into());
        }
        if self.receiver.device.is_empty() {
            errors.push("Dispositivo do receiver não pode ser vazio".into());
        }
        if self.receiver.baud_rate == 0 {
            errors.push("Baud rate do receiver não pode ser 0".into());
        }
        if self.receiver.read_buffer == 0 {
            errors.push("Buffer de leitura do receiver não pode ser 0".into());
        }
        if self.receiver.channel_capacity == 0 {
            errors.push("Capacidade do channel não pode ser 0".into());
        }

        errors
    }
}
