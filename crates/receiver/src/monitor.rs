//! Estado do link – snapshot do veículo, contadores e detecção de link parado.

use crate::serial_thread::SerialMessage;
use std::time::{Duration, Instant};
use tlv_core::protocol::ProtocolError;
use tlv_core::registry::SignalType;
use tlv_core::types::VehicleData;
use tracing::debug;

/// Resultado de processar um registro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Signal(SignalType),
    Unknown(u8),
    Invalid,
}

/// Estado do monitor de link.
#[derive(Debug)]
pub struct LinkMonitor {
    snapshot: VehicleData,
    records: u64,
    unknown: u64,
    invalid: u64,
    started: Instant,
    last_record: Option<Instant>,
    stale: bool,
}

impl LinkMonitor {
    pub fn new() -> Self {
        Self {
            snapshot: VehicleData::default(),
            records: 0,
            unknown: 0,
            invalid: 0,
            started: Instant::now(),
            last_record: None,
            stale: false,
        }
    }

    /// Aplica um registro recebido no snapshot.
    pub fn handle(&mut self, msg: &SerialMessage) -> Applied {
        self.records += 1;
        self.last_record = Some(msg.received_at);
        self.stale = false;

        match self.snapshot.apply(&msg.record) {
            Ok(signal) => Applied::Signal(signal),
            Err(ProtocolError::UnknownType(t)) => {
                self.unknown += 1;
                debug!(
                    "Tipo desconhecido 0x{t:02X} ({} bytes), ignorando",
                    msg.record.value().len()
                );
                Applied::Unknown(t)
            }
            Err(e) => {
                self.invalid += 1;
                debug!("Registro inválido: {e}");
                Applied::Invalid
            }
        }
    }

    /// Marca o link como parado se passou `timeout` sem registros.
    ///
    /// Retorna `true` só na transição, para logar uma vez.
    pub fn check_stale(&mut self, now: Instant, timeout: Duration) -> bool {
        if self.stale {
            return false;
        }
        let since = self.last_record.unwrap_or(self.started);
        let idle = now.saturating_duration_since(since) >= timeout;
        if idle {
            self.stale = true;
        }
        idle
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn snapshot(&self) -> &VehicleData {
        &self.snapshot
    }

    /// Total de registros, desconhecidos e inválidos.
    pub fn counters(&self) -> (u64, u64, u64) {
        (self.records, self.unknown, self.invalid)
    }

    /// Linha de resumo para o log.
    pub fn summary(&self) -> String {
        let d = &self.snapshot;
        let mut line = format!(
            "RPM {} | {} km/h | marcha {} | acel {}% | volante {}° | boost {} mbar | óleo {} | comb {} | freio {}",
            fmt_opt(d.rpm),
            fmt_opt(d.speed),
            fmt_opt(d.gear_position),
            fmt_opt(d.throttle_position),
            fmt_opt(d.steering_angle),
            fmt_opt(d.boost_pressure),
            fmt_opt(d.oil_pressure),
            fmt_opt(d.fuel_level),
            fmt_opt(d.brake_pressure),
        );

        if let Some(flags) = d.status_flags {
            if flags.any_warning() {
                line.push_str(" | ⚠ AVISO");
            }
        }

        line.push_str(&format!(
            " | {} registros ({} desconhecidos, {} inválidos)",
            self.records, self.unknown, self.invalid
        ));
        line
    }
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "--".into(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlv_core::registry::Scalar;
    use tlv_core::types::TlvRecord;

    fn msg(record: TlvRecord, at: Instant) -> SerialMessage {
        SerialMessage {
            record,
            received_at: at,
        }
    }

    #[test]
    fn known_unknown_and_invalid_records() {
        let now = Instant::now();
        let mut monitor = LinkMonitor::new();

        let rpm = TlvRecord::from_scalar(0x01, Scalar::U16(2000));
        assert_eq!(monitor.handle(&msg(rpm, now)), Applied::Signal(SignalType::Rpm));

        let unknown = TlvRecord::new(0x99, vec![1, 2]).unwrap();
        assert_eq!(monitor.handle(&msg(unknown, now)), Applied::Unknown(0x99));

        let short = TlvRecord::new(0x05, vec![0x50]).unwrap();
        assert_eq!(monitor.handle(&msg(short, now)), Applied::Invalid);

        assert_eq!(monitor.counters(), (3, 1, 1));
        assert_eq!(monitor.snapshot().rpm, Some(2000));
        assert!(monitor.snapshot().speed.is_none());
    }

    #[test]
    fn stale_is_reported_once() {
        let start = Instant::now();
        let timeout = Duration::from_millis(100);
        let mut monitor = LinkMonitor::new();

        monitor.handle(&msg(TlvRecord::from_scalar(0x0A, Scalar::U8(3)), start));
        assert!(!monitor.check_stale(start + Duration::from_millis(50), timeout));
        assert!(monitor.check_stale(start + Duration::from_millis(150), timeout));
        assert!(!monitor.check_stale(start + Duration::from_millis(300), timeout));
        assert!(monitor.is_stale());

        monitor.handle(&msg(
            TlvRecord::from_scalar(0x0A, Scalar::U8(4)),
            start + Duration::from_millis(310),
        ));
        assert!(!monitor.is_stale());
    }

    #[test]
    fn silent_link_goes_stale_from_start() {
        let mut monitor = LinkMonitor::new();
        let later = Instant::now() + Duration::from_secs(5);
        assert!(monitor.check_stale(later, Duration::from_secs(1)));
    }

    #[test]
    fn summary_shows_missing_values() {
        let mut monitor = LinkMonitor::new();
        monitor.handle(&msg(
            TlvRecord::from_scalar(0x07, Scalar::I16(-300)),
            Instant::now(),
        ));
        let line = monitor.summary();
        assert!(line.contains("RPM --"), "{line}");
        assert!(line.contains("volante -300°"), "{line}");
        assert!(line.contains("1 registros"), "{line}");
    }

    #[test]
    fn summary_flags_warnings() {
        let mut monitor = LinkMonitor::new();
        monitor.handle(&msg(
            TlvRecord::from_scalar(0x06, Scalar::U8(0x01)),
            Instant::now(),
        ));
        assert!(monitor.summary().contains("AVISO"));
    }
}
