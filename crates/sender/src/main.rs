//! # TLV Sender
//!
//! Gera leituras mock do veículo e transmite como registros TLV num
//! dispositivo serial (ou stdout), um frame por ciclo.
//!
//! ## Uso
//! ```bash
//! tlv_sender                       # usa config.toml ao lado do executável
//! tlv_sender | tlv_receiver        # com device = "-" nos dois lados
//! ```

mod mock;

use mock::MockVehicle;
use std::io::{self, Write};
use std::time::Instant;
use tlv_core::config::AppConfig;
use tlv_core::protocol::encode_frame;
use tlv_core::transport::open_writer;
use tlv_core::types::VehicleData;
use tracing::{debug, error, info, warn};

/// Ciclos entre logs de resumo (~1 s a 20 Hz).
const SUMMARY_EVERY: u64 = 20;

fn main() {
    // ── Logging ──
    // stderr: stdout pode ser o próprio stream TLV.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let sender_cfg = &config.sender;
    let interval = sender_cfg.interval();

    // ── Saída ──
    let mut sink = match open_writer(&sender_cfg.device, sender_cfg.baud_rate) {
        Ok(sink) => sink,
        Err(e) => {
            error!("Falha ao abrir {}: {e}", sender_cfg.device);
            std::process::exit(1);
        }
    };

    let mut mock = MockVehicle::new(interval, sender_cfg.include_tyres);

    // ── Banner ──
    eprintln!();
    eprintln!("══════════════════════════════════════════════");
    eprintln!("   ⚡ TLV SENDER – ATIVO");
    eprintln!("══════════════════════════════════════════════");
    eprintln!("  Destino:   {}", sender_cfg.device);
    eprintln!("  Baud rate: {}", sender_cfg.baud_rate);
    eprintln!("  Intervalo: {} ms", sender_cfg.interval_ms);
    eprintln!("  Pneus:     {}", if sender_cfg.include_tyres { "sim" } else { "não" });
    eprintln!("══════════════════════════════════════════════");
    eprintln!();

    // ── Loop principal ──
    let mut cycle: u64 = 0;
    let mut bytes_total: u64 = 0;
    loop {
        let cycle_start = Instant::now();

        let data = mock.next_sample();
        match send_cycle(&mut sink, &data) {
            Ok(sent) => {
                bytes_total += sent as u64;
                debug!("→ {sent} bytes ({} registros)", data.populated());
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                info!("Destino fechado, encerrando");
                break;
            }
            Err(e) => error!("Erro ao escrever em {}: {e}", sender_cfg.device),
        }

        cycle += 1;
        if cycle % SUMMARY_EVERY == 0 {
            info!(
                "Ciclo {cycle} ({:.1}s) | {bytes_total} bytes | RPM {} | {} km/h | marcha {}",
                mock.elapsed_secs(),
                data.rpm.unwrap_or_default(),
                data.speed.unwrap_or_default(),
                data.gear_position.unwrap_or_default(),
            );
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }
}

/// Codifica e escreve um ciclo. Retorna bytes escritos.
fn send_cycle<W: Write + ?Sized>(sink: &mut W, data: &VehicleData) -> io::Result<usize> {
    let frame = encode_frame(data);
    sink.write_all(&frame)?;
    sink.flush()?;
    Ok(frame.len())
}
