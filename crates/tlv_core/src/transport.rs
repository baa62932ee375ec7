//! Abertura do transporte de bytes do link.
//!
//! - `"-"` → stdin/stdout
//! - arquivo regular ou FIFO → `File` (captura/replay)
//! - qualquer outro caminho → porta serial em modo raw 8N1, sem controle
//!   de fluxo
//!
//! Um tty aberto como arquivo comum fica em modo "cooked": `0x04` vira EOF,
//! `0x0D` vira `0x0A` na entrada e `0x0A` ganha um `0x0D` na saída. Qualquer
//! um desses quebra o framing TLV, então dispositivos sempre passam pelo
//! `serialport`.

use crate::config::STDIO_DEVICE;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Timeout de leitura da porta serial. Leituras que expiram retornam
/// `ErrorKind::TimedOut` e o chamador tenta de novo.
pub const SERIAL_TIMEOUT: Duration = Duration::from_millis(100);

/// Abre uma porta serial em modo raw 8N1.
pub fn open_serial(device: &str, baud_rate: u32) -> io::Result<Box<dyn SerialPort>> {
    let port = serialport::new(device, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(SERIAL_TIMEOUT)
        .open()?;

    info!("Porta serial aberta: {device} a {baud_rate} baud");
    Ok(port)
}

/// Abre a origem do stream para leitura.
pub fn open_reader(device: &str, baud_rate: u32) -> io::Result<Box<dyn Read + Send>> {
    if device == STDIO_DEVICE {
        return Ok(Box::new(io::stdin()));
    }
    if is_plain_file(Path::new(device)) {
        return Ok(Box::new(File::open(device)?));
    }
    Ok(Box::new(open_serial(device, baud_rate)?))
}

/// Abre o destino do stream para escrita.
///
/// Caminho inexistente vira arquivo de captura.
pub fn open_writer(device: &str, baud_rate: u32) -> io::Result<Box<dyn Write + Send>> {
    if device == STDIO_DEVICE {
        return Ok(Box::new(io::stdout()));
    }
    let path = Path::new(device);
    if !path.exists() || is_plain_file(path) {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        return Ok(Box::new(file));
    }
    Ok(Box::new(open_serial(device, baud_rate)?))
}

/// Arquivo regular ou FIFO: não tem disciplina de linha.
fn is_plain_file(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        meta.is_file() || meta.file_type().is_fifo()
    }
    #[cfg(not(unix))]
    {
        meta.is_file()
    }
}
