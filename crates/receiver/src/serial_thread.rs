//! Thread de leitura que decodifica o stream serial e envia registros
//! para o consumidor via channel.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::io::{self, Read};
use std::time::Instant;
use tlv_core::config::ReceiverConfig;
use tlv_core::protocol::TlvDecoder;
use tlv_core::transport::open_reader;
use tlv_core::types::TlvRecord;
use tracing::{debug, error, info, warn};

/// Mensagem enviada da thread de leitura para o consumidor.
#[derive(Debug, Clone)]
pub struct SerialMessage {
    pub record: TlvRecord,
    pub received_at: Instant,
}

/// Como uma sessão de leitura terminou.
#[derive(Debug)]
pub enum PumpEnd {
    /// Fonte chegou ao fim (EOF).
    Eof,
    /// Consumidor descartou o channel.
    Closed,
    /// Erro de I/O; vale tentar reabrir.
    Failed(io::Error),
}

/// Inicia a thread de leitura. Retorna o receiver do channel.
///
/// O channel desconecta quando a fonte chega ao fim.
pub fn spawn_reader_thread(config: ReceiverConfig) -> io::Result<Receiver<SerialMessage>> {
    let (tx, rx) = bounded::<SerialMessage>(config.channel_capacity.max(1));

    std::thread::Builder::new()
        .name("serial-reader".into())
        .spawn(move || {
            reader_loop(&tx, &config);
        })?;

    Ok(rx)
}

fn reader_loop(tx: &Sender<SerialMessage>, config: &ReceiverConfig) {
    let mut decoder = TlvDecoder::new();

    loop {
        match open_reader(&config.device, config.baud_rate) {
            Ok(source) => {
                info!("Receiver lendo de {}", config.device);

                match pump(source, &mut decoder, tx, config.read_buffer) {
                    PumpEnd::Eof => {
                        if !decoder.is_idle() {
                            debug!(
                                "Fim do stream com registro parcial ({} bytes)",
                                decoder.pending_len()
                            );
                        }
                        info!("Fim do stream em {}", config.device);
                        return;
                    }
                    PumpEnd::Closed => return,
                    PumpEnd::Failed(e) => {
                        warn!("Erro ao ler {}: {e}", config.device);
                        // Stream novo após reabrir: framing recomeça do zero.
                        decoder.reset();
                    }
                }
            }
            Err(e) => {
                error!(
                    "Falha ao abrir {}: {e}. Tentando novamente em {} ms...",
                    config.device, config.reconnect_delay_ms
                );
            }
        }

        std::thread::sleep(config.reconnect_delay());
    }
}

/// Lê `source` em chunks, decodifica e encaminha registros até EOF/erro.
///
/// O estado do decoder sobrevive entre chunks: registros partidos no meio
/// de uma leitura são completados na próxima.
pub fn pump<R: Read>(
    mut source: R,
    decoder: &mut TlvDecoder,
    tx: &Sender<SerialMessage>,
    buf_size: usize,
) -> PumpEnd {
    let mut buf = vec![0u8; buf_size.max(1)];

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => return PumpEnd::Eof,
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                // Timeout normal, continua
                continue;
            }
            Err(e) => return PumpEnd::Failed(e),
        };

        let received_at = Instant::now();
        for record in decoder.decode(&buf[..n]) {
            let msg = SerialMessage {
                record,
                received_at,
            };
            match tx.try_send(msg) {
                Ok(()) => {}
                // Non-blocking: se o consumidor está lento, descarta
                Err(TrySendError::Full(_)) => debug!("Channel cheio, descartando registro"),
                Err(TrySendError::Disconnected(_)) => return PumpEnd::Closed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Fonte que entrega os bytes em pedaços fixos, como uma UART lenta.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Fonte que falha depois de entregar seus bytes.
    struct Flaky(Cursor<Vec<u8>>);

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "uart caiu")),
                n => Ok(n),
            }
        }
    }

    const STREAM: [u8; 7] = [0x05, 0x02, 0x50, 0x00, 0x0A, 0x01, 0x03];

    #[test]
    fn pump_forwards_records_until_eof() {
        let (tx, rx) = bounded(16);
        let mut decoder = TlvDecoder::new();
        let end = pump(Cursor::new(STREAM.to_vec()), &mut decoder, &tx, 64);
        assert!(matches!(end, PumpEnd::Eof));

        let types: Vec<u8> = rx.try_iter().map(|m| m.record.tlv_type()).collect();
        assert_eq!(types, vec![0x05, 0x0A]);
    }

    #[test]
    fn pump_handles_records_split_across_reads() {
        let (tx, rx) = bounded(16);
        let mut decoder = TlvDecoder::new();
        let source = Trickle {
            data: STREAM.repeat(3),
            pos: 0,
            step: 3,
        };
        assert!(matches!(pump(source, &mut decoder, &tx, 64), PumpEnd::Eof));
        assert_eq!(rx.try_iter().count(), 6);
        assert!(decoder.is_idle());
    }

    #[test]
    fn pump_drops_when_channel_is_full() {
        let (tx, rx) = bounded(1);
        let mut decoder = TlvDecoder::new();
        let end = pump(Cursor::new(STREAM.to_vec()), &mut decoder, &tx, 64);
        assert!(matches!(end, PumpEnd::Eof));
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn pump_stops_when_consumer_is_gone() {
        let (tx, rx) = bounded(4);
        drop(rx);
        let mut decoder = TlvDecoder::new();
        let end = pump(Cursor::new(STREAM.to_vec()), &mut decoder, &tx, 64);
        assert!(matches!(end, PumpEnd::Closed));
    }

    #[test]
    fn pump_reports_io_failure_with_partial_record() {
        let (tx, rx) = bounded(4);
        let mut decoder = TlvDecoder::new();
        let source = Flaky(Cursor::new(vec![0x05, 0x02, 0x50, 0x00, 0x0A]));
        let end = pump(source, &mut decoder, &tx, 64);
        assert!(matches!(end, PumpEnd::Failed(_)));
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(decoder.pending_len(), 1);
    }

    #[test]
    fn reader_thread_ends_at_eof() {
        let path = std::env::temp_dir().join(format!("tlv_receiver_{}.bin", std::process::id()));
        // 0x04 (fuel) na frente: é o caractere de EOF de um tty em modo cooked.
        let mut bytes = vec![0x04, 0x02, 0xB8, 0x0B];
        bytes.extend_from_slice(&STREAM);
        std::fs::write(&path, &bytes).unwrap();

        let config = ReceiverConfig {
            device: path.display().to_string(),
            ..Default::default()
        };
        let rx = spawn_reader_thread(config).unwrap();
        let records: Vec<_> = rx.iter().map(|m| m.record).collect();
        let _ = std::fs::remove_file(&path);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].value(), &[0xB8, 0x0B]);
        assert_eq!(records[2].value(), &[0x03]);
    }

    #[cfg(unix)]
    #[test]
    fn pump_decodes_from_serial_device() {
        use serialport::{SerialPort, TTYPort};
        use std::io::Write;
        use std::time::Duration;

        let (mut master, slave) = TTYPort::pair().unwrap();
        let path = slave.name().unwrap();
        drop(slave);

        let source = open_reader(&path, 115_200).unwrap();
        let (tx, rx) = bounded(16);
        // A porta nunca dá EOF: a thread termina quando `rx` é descartado.
        std::thread::spawn(move || {
            let mut decoder = TlvDecoder::new();
            pump(source, &mut decoder, &tx, 64)
        });

        // fuel 3000, speed 80
        master.write_all(&[0x04, 0x02, 0xB8, 0x0B, 0x05, 0x02, 0x50, 0x00]).unwrap();
        master.flush().unwrap();

        let timeout = Duration::from_secs(2);
        let fuel = rx.recv_timeout(timeout).unwrap().record;
        let speed = rx.recv_timeout(timeout).unwrap().record;
        assert_eq!((fuel.tlv_type(), fuel.value()), (0x04, &[0xB8, 0x0B][..]));
        assert_eq!((speed.tlv_type(), speed.value()), (0x05, &[0x50, 0x00][..]));
    }
}
