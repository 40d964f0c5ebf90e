mod config;
mod logging;

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};

use config::CliConfig;
use logging::{FrameAlignedEvent, FrameRejectedEvent, LogEvent, StructuredLogger};
use photon_align_core::decoder::{decode_nox_file, read_packed_qubits};
use photon_align_core::errors::MarkerFetchError;
use photon_align_core::logging::{LogConfig, SignalLogger};
use photon_align_core::pipeline::{AlignmentOrchestrator, MarkerExchange, NullObserver};
use photon_align_core::qubit::{Markers, QubitList, SlotID};
use photon_align_core::random::StdRandomSource;

#[derive(Parser, Debug)]
#[command(author, version, about = "Photon detection alignment pipeline runner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Enable verbose diagnostic output.
    #[arg(short, long)]
    verbose: bool,
}

/// Local stand-in for the transmitter's marker RPC: serves markers by
/// sampling a dense ground-truth qubit list loaded from a packed-qubit
/// file. The wire transport this would normally go over is out of scope
/// for the core.
struct FileMarkerExchange {
    truth: QubitList,
}

impl MarkerExchange for FileMarkerExchange {
    fn request_markers(
        &mut self,
        frame_id: u64,
        number_of_markers: u32,
        send_all_basis: bool,
    ) -> Result<Markers, MarkerFetchError> {
        if self.truth.is_empty() {
            return Err(MarkerFetchError {
                frame_id,
                reason: "no ground-truth qubit list configured".to_string(),
            });
        }

        let mut markers: Markers = HashMap::new();
        let count = if send_all_basis || number_of_markers == 0 {
            self.truth.len()
        } else {
            (number_of_markers as usize).min(self.truth.len())
        };
        let step = (self.truth.len() / count.max(1)).max(1);
        let mut slot = 0usize;
        while slot < self.truth.len() && markers.len() < count {
            markers.insert(slot as SlotID, self.truth[slot]);
            slot += step;
        }
        Ok(markers)
    }

    fn discard_transmissions(&mut self, _frame_id: u64, _slot_ids: &[SlotID]) {}
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cli_config = CliConfig::from_file(&args.config)
        .wrap_err_with(|| format!("Failed to load config from {}", args.config.display()))?;

    let mut logger = StructuredLogger::new(cli_config.terminal.logging.clone())?;
    logger.log(LogEvent::Info {
        message: format!("reading detections from {}", cli_config.terminal.input.display()),
    })?;

    let mut core_logger = SignalLogger::new(LogConfig::default());
    let (detections, dropped_at_decode) = decode_nox_file(
        &cli_config.terminal.input,
        &cli_config.alignment.decoder,
        &mut core_logger,
    )
    .wrap_err("failed to decode time-tag file")?;

    logger.log(LogEvent::Info {
        message: format!(
            "decoded {} detections ({} dropped for unmapped channel)",
            detections.len(),
            dropped_at_decode
        ),
    })?;

    let truth = match &cli_config.terminal.markers {
        Some(path) => read_packed_qubits(path, &cli_config.alignment.decoder.channel_mapping, 0)
            .wrap_err("failed to read markers file")?,
        None => QubitList::new(),
    };
    let mut markers = FileMarkerExchange { truth };

    let mut orchestrator = AlignmentOrchestrator::new(cli_config.alignment.clone());
    let mut random = StdRandomSource::new();
    let mut observer = NullObserver;

    match orchestrator.process_frame(0, &detections, &mut markers, &mut random, &mut observer, &mut core_logger) {
        Ok(result) => {
            logger.log(LogEvent::FrameAligned(FrameAlignedEvent {
                timestamp: chrono::Utc::now(),
                frame_id: 0,
                drift: result.drift,
                peak_width: result.peak_width,
                confidence: result.confidence,
                offset: result.offset,
                valid_slots: result.valid_slots.len(),
                dropped_detections: result.dropped_detections,
            }))?;

            if let Some(json_path) = &cli_config.terminal.json_output {
                let dump = serde_json::json!({
                    "valid_slots": result.valid_slots,
                    "qubits": result.qubits,
                });
                std::fs::write(json_path, serde_json::to_string_pretty(&dump)?)
                    .wrap_err_with(|| format!("failed to write {}", json_path.display()))?;
            }

            if args.verbose {
                logger.log(LogEvent::Info {
                    message: format!("core log:\n{}", core_logger),
                })?;
            }
        }
        Err(error) => {
            logger.log(LogEvent::FrameRejected(FrameRejectedEvent {
                timestamp: chrono::Utc::now(),
                frame_id: 0,
                reason: error.to_string(),
            }))?;
        }
    }

    logger.log(LogEvent::Info {
        message: format!("finished in {:.3}s", logger.elapsed()),
    })?;

    Ok(())
}
