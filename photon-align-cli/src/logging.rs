//! Structured logging for the alignment run: one event per completed or
//! failed frame, plus general info/warn/error messages.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Structured log event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// A frame completed alignment successfully.
    FrameAligned(FrameAlignedEvent),

    /// A frame was rejected (low confidence or marker fetch failure).
    FrameRejected(FrameRejectedEvent),

    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAlignedEvent {
    pub timestamp: DateTime<Utc>,
    pub frame_id: u64,
    pub drift: f64,
    pub peak_width: f64,
    pub confidence: f64,
    pub offset: i64,
    pub valid_slots: usize,
    pub dropped_detections: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRejectedEvent {
    pub timestamp: DateTime<Utc>,
    pub frame_id: u64,
    pub reason: String,
}

/// Logger that writes one line per event in JSON, logfmt, or pretty form.
pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => serde_json::to_string(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;
        Ok(())
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::FrameAligned(e) => format!(
                "ts=\"{}\" type=frame_aligned frame_id={} drift={:.3e} peak_width={:.4} confidence={:.4} offset={} valid_slots={} dropped={}",
                ts, e.frame_id, e.drift, e.peak_width, e.confidence, e.offset, e.valid_slots, e.dropped_detections
            ),
            LogEvent::FrameRejected(e) => format!(
                "ts=\"{}\" type=frame_rejected frame_id={} reason=\"{}\"",
                ts, e.frame_id, e.reason
            ),
            LogEvent::Info { message } => format!("ts=\"{}\" level=info msg=\"{}\"", ts, message),
            LogEvent::Warn { message } => format!("ts=\"{}\" level=warn msg=\"{}\"", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{}\" level=error msg=\"{}\" details=\"{}\"", ts, message, d),
                None => format!("ts=\"{}\" level=error msg=\"{}\"", ts, message),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::FrameAligned(e) => format!(
                "[{}] FRAME[{}] ALIGNED: drift={:.3e} peak_width={:.4} confidence={:.4} offset={} valid_slots={} dropped={}",
                ts, e.frame_id, e.drift, e.peak_width, e.confidence, e.offset, e.valid_slots, e.dropped_detections
            ),
            LogEvent::FrameRejected(e) => {
                format!("[{}] FRAME[{}] REJECTED: {}", ts, e.frame_id, e.reason)
            }
            LogEvent::Info { message } => format!("[{}] INFO: {}", ts, message),
            LogEvent::Warn { message } => format!("[{}] WARN: {}", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{}] ERROR: {} | {}", ts, message, d),
                None => format!("[{}] ERROR: {}", ts, message),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
