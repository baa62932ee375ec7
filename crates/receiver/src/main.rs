//! # TLV Receiver
//!
//! Lê o stream TLV do link serial (ou stdin), mantém o snapshot mais
//! recente de cada sinal do veículo e publica resumos periódicos no log.
//!
//! Registros de tipo desconhecido são consumidos sem perder o framing.

mod monitor;
mod serial_thread;

use crossbeam_channel::RecvTimeoutError;
use monitor::{Applied, LinkMonitor};
use std::collections::BTreeSet;
use std::time::Instant;
use tlv_core::config::AppConfig;
use tracing::{error, info, trace, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        let _ = config.save(&config_path);
    }

    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let recv_cfg = config.receiver.clone();
    let stale_after = recv_cfg.stale_after();
    let summary_interval = recv_cfg.summary_interval();

    // ── Thread de leitura ──
    let rx = match serial_thread::spawn_reader_thread(recv_cfg.clone()) {
        Ok(rx) => rx,
        Err(e) => {
            error!("Falha ao criar thread de leitura: {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ TLV RECEIVER – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Origem:    {}", recv_cfg.device);
    println!("  Baud rate: {}", recv_cfg.baud_rate);
    println!("  Timeout:   {} ms", recv_cfg.stale_after_ms);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let mut monitor = LinkMonitor::new();
    let mut last_summary = Instant::now();
    let mut unknown_types = BTreeSet::new();

    loop {
        match rx.recv_timeout(stale_after) {
            Ok(msg) => {
                if monitor.is_stale() {
                    info!("Link restabelecido");
                }
                match monitor.handle(&msg) {
                    Applied::Signal(signal) => {
                        trace!("{signal} = {:?}", monitor.snapshot().get(signal));
                    }
                    Applied::Unknown(t) => {
                        // Uma vez por tipo: provavelmente firmware mais novo.
                        if unknown_types.insert(t) {
                            warn!("Tipo 0x{t:02X} fora do registro, payload ignorado");
                        }
                    }
                    Applied::Invalid => {}
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                let (records, unknown, invalid) = monitor.counters();
                info!(
                    "Stream encerrado: {records} registros, {} sinais, {unknown} desconhecidos, {invalid} inválidos",
                    monitor.snapshot().populated()
                );
                info!("{}", monitor.summary());
                break;
            }
        }

        let now = Instant::now();
        if monitor.check_stale(now, stale_after) {
            warn!("Sem dados há mais de {} ms", recv_cfg.stale_after_ms);
        }
        if now.duration_since(last_summary) >= summary_interval && !monitor.is_stale() {
            info!("{}", monitor.summary());
            last_summary = now;
        }
    }
}
