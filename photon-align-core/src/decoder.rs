//! Time-tag decoding and the auxiliary detection-report / packed-qubit
//! file formats (component C1).

use std::path::Path;

use crate::config::DecoderConfig;
use crate::errors::DecodeError;
use crate::logging::SignalLogger;
use crate::qubit::{DetectionReport, DetectionReportList, Qubit, QubitList};

const RECORD_SIZE: usize = 8;
const MSG_DETECTION: u8 = 0x24;
const MSG_CONFIG: u8 = 0x25;

/// Decoded fields of a single 8-byte NOX record.
struct NoxRecord {
    message_type: u8,
    coarse: u64,
    fine: u16,
    /// Raw nibble from the wire, before the decoder's -1 shift.
    channel_raw: u8,
}

impl NoxRecord {
    fn from_bytes(buffer: &[u8; RECORD_SIZE]) -> Result<Self, DecodeError> {
        let message_type = buffer[0];
        match message_type {
            MSG_DETECTION => {
                let coarse = (buffer[1] as u64) << 28
                    | (buffer[2] as u64) << 20
                    | (buffer[3] as u64) << 12
                    | (buffer[4] as u64) << 4
                    | (buffer[5] as u64) >> 4;
                let fine = ((buffer[6] & 0x0F) as u16) << 8 | buffer[7] as u16;
                let channel_raw = buffer[6] >> 4;
                Ok(NoxRecord {
                    message_type,
                    coarse,
                    fine,
                    channel_raw,
                })
            }
            MSG_CONFIG => Ok(NoxRecord {
                message_type,
                coarse: 0,
                fine: 0,
                channel_raw: 0,
            }),
            other => Err(DecodeError::InvalidRecordType(other)),
        }
    }

    /// Arrival time in picoseconds, given the device's tick parameters.
    fn time_ps(&self, coarse_hz: u64, fine_taps: u32) -> u64 {
        let coarse_ps = (self.coarse as u128 * 1_000_000_000_000) / coarse_hz as u128;
        let fine_denom = coarse_hz as u128 * fine_taps as u128;
        let fine_ps = (self.fine as u128 * 1_000_000_000_000) / fine_denom;
        (coarse_ps + fine_ps) as u64
    }
}

/// Decode a NOX time-tagger file into a [`DetectionReportList`], dropping
/// out-of-range-channel records rather than failing the whole read.
///
/// Returns the decoded list and the number of detections dropped for an
/// unmapped channel.
pub fn decode_nox_file(
    path: &Path,
    config: &DecoderConfig,
    logger: &mut SignalLogger,
) -> Result<(DetectionReportList, u64), DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_nox_bytes(&bytes, config, logger)
}

/// Same as [`decode_nox_file`] but operating on an in-memory buffer; the
/// file-reading wrapper above is a thin convenience over this.
pub fn decode_nox_bytes(
    bytes: &[u8],
    config: &DecoderConfig,
    logger: &mut SignalLogger,
) -> Result<(DetectionReportList, u64), DecodeError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(DecodeError::TruncatedFile {
            len: bytes.len(),
            record_size: RECORD_SIZE,
        });
    }

    let num_records = bytes.len() / RECORD_SIZE;
    let mut output = DetectionReportList::with_capacity(num_records);
    let mut dropped = 0u64;
    let mut got_config = !config.wait_for_config;

    for chunk in bytes.chunks_exact(RECORD_SIZE) {
        let mut buffer = [0u8; RECORD_SIZE];
        buffer.copy_from_slice(chunk);

        let record = match NoxRecord::from_bytes(&buffer) {
            Ok(record) => record,
            Err(DecodeError::InvalidRecordType(ty)) => {
                logger.warn("DECODE", format!("skipping invalid record type {ty:#x}"));
                continue;
            }
            Err(other) => return Err(other),
        };

        match record.message_type {
            MSG_CONFIG => {
                got_config = true;
            }
            MSG_DETECTION if got_config => {
                if config.max_coarse_time != 0 && record.coarse >= config.max_coarse_time {
                    break;
                }
                let channel = record.channel_raw.wrapping_sub(1) as usize;
                match config.channel_mapping.get(channel) {
                    Some(&value) => {
                        let time = record.time_ps(config.coarse_hz, config.fine_taps);
                        output.push(DetectionReport { time, value });
                    }
                    None => {
                        logger.warn("DECODE", format!("channel {channel} not mapped"));
                        dropped += 1;
                    }
                }
            }
            _ => {}
        }
    }

    logger.info(
        "DECODE",
        format!("read {} detections, dropped {dropped}", output.len()),
    );

    Ok((output, dropped))
}

/// Read a packed-qubit file: 4 qubits per byte, MSB pair first.
pub fn read_packed_qubits(
    path: &Path,
    channel_mapping: &[Qubit],
    max_values: u64,
) -> Result<QubitList, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut limit = bytes.len() as u64 * 4;
    if max_values != 0 {
        limit = limit.min(max_values);
    }

    let mut output = QubitList::with_capacity(limit as usize);
    for &byte in &bytes {
        if output.len() as u64 >= limit {
            break;
        }
        for shift in [6, 4, 2, 0] {
            if output.len() as u64 >= limit {
                break;
            }
            let index = ((byte >> shift) & 0b11) as usize;
            output.push(channel_mapping[index]);
        }
    }
    Ok(output)
}

/// Write a qubit list to a packed-qubit file, 4 qubits per byte. A
/// trailing partial group is zero-padded and a warning logged.
pub fn write_packed_qubits(
    qubits: &[Qubit],
    path: &Path,
    logger: &mut SignalLogger,
) -> Result<(), DecodeError> {
    let mut bytes = Vec::with_capacity((qubits.len() + 3) / 4);
    let mut chunks = qubits.chunks_exact(4);
    for chunk in &mut chunks {
        let byte = (chunk[0].0 << 6) | (chunk[1].0 << 4) | (chunk[2].0 << 2) | chunk[3].0;
        bytes.push(byte);
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        logger.warn("DECODE", "file will be padded with trailing zeros to the nearest byte");
        let mut byte = 0u8;
        let mut shift = 6i32;
        for qubit in remainder {
            byte |= qubit.0 << shift;
            shift -= 2;
        }
        bytes.push(byte);
    }

    std::fs::write(path, bytes).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read a detection-report dump: big-endian `u64` picosecond timestamp
/// followed by a single qubit byte, repeated.
pub fn read_detection_report_list(path: &Path) -> Result<DetectionReportList, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;

    const RECORD: usize = 9;
    let mut output = DetectionReportList::with_capacity(bytes.len() / RECORD);
    for chunk in bytes.chunks_exact(RECORD) {
        let time = u64::from_be_bytes(chunk[0..8].try_into().unwrap());
        let value = Qubit(chunk[8]);
        output.push(DetectionReport { time, value });
    }
    Ok(output)
}

/// Write a detection-report dump, the inverse of [`read_detection_report_list`].
pub fn write_detection_report_list(
    reports: &[DetectionReport],
    path: &Path,
) -> Result<(), DecodeError> {
    let mut bytes = Vec::with_capacity(reports.len() * 9);
    for report in reports {
        bytes.extend_from_slice(&report.time.to_be_bytes());
        bytes.push(report.value.0);
    }
    std::fs::write(path, bytes).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection_record(coarse: u64, channel_nibble: u8, fine: u16) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[0] = MSG_DETECTION;
        buf[1] = ((coarse >> 28) & 0xFF) as u8;
        buf[2] = ((coarse >> 20) & 0xFF) as u8;
        buf[3] = ((coarse >> 12) & 0xFF) as u8;
        buf[4] = ((coarse >> 4) & 0xFF) as u8;
        buf[5] = ((coarse << 4) & 0xF0) as u8 | ((fine >> 8) as u8 & 0x00);
        buf[6] = (channel_nibble << 4) | ((fine >> 8) as u8 & 0x0F);
        buf[7] = (fine & 0xFF) as u8;
        buf
    }

    #[test]
    fn truncated_file_is_rejected() {
        let mut logger = SignalLogger::new(Default::default());
        let config = DecoderConfig::default();
        let err = decode_nox_bytes(&[0u8; 5], &config, &mut logger).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedFile { len: 5, record_size: 8 }));
    }

    #[test]
    fn config_record_unblocks_detection_when_waiting() {
        let mut logger = SignalLogger::new(Default::default());
        let mut config = DecoderConfig::default();
        config.wait_for_config = true;

        let mut bytes = Vec::new();
        bytes.push(MSG_CONFIG);
        bytes.extend_from_slice(&[0u8; 7]);
        bytes.extend_from_slice(&detection_record(0, 1, 0));

        let (reports, dropped) = decode_nox_bytes(&bytes, &config, &mut logger).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].value, Qubit::ZERO);
    }

    #[test]
    fn detection_before_config_is_dropped_when_waiting() {
        let mut logger = SignalLogger::new(Default::default());
        let mut config = DecoderConfig::default();
        config.wait_for_config = true;

        let bytes = detection_record(0, 1, 0).to_vec();
        let (reports, _dropped) = decode_nox_bytes(&bytes, &config, &mut logger).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn out_of_range_channel_is_dropped_not_fatal() {
        let mut logger = SignalLogger::new(Default::default());
        let config = DecoderConfig::default();
        // channel nibble 0 underflows to usize::MAX after the -1 shift.
        let bytes = detection_record(0, 0, 0).to_vec();
        let (reports, dropped) = decode_nox_bytes(&bytes, &config, &mut logger).unwrap();
        assert!(reports.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn packed_qubit_roundtrip_preserves_values() {
        let mut logger = SignalLogger::new(Default::default());
        let mapping = [Qubit::ZERO, Qubit::ONE, Qubit::POS, Qubit::NEG];
        let qubits = vec![
            Qubit::ZERO, Qubit::ONE, Qubit::POS, Qubit::NEG,
            Qubit::ONE, Qubit::ZERO,
        ];
        let dir = std::env::temp_dir().join("photon_align_packed_test.bin");
        write_packed_qubits(&qubits, &dir, &mut logger).unwrap();
        let read_back = read_packed_qubits(&dir, &mapping, 0).unwrap();
        std::fs::remove_file(&dir).ok();

        assert_eq!(&read_back[..4], &qubits[..4]);
        assert_eq!(&read_back[4..6], &qubits[4..6]);
    }

    #[test]
    fn detection_report_list_roundtrip() {
        let reports = vec![
            DetectionReport { time: 123_456_789, value: Qubit::ONE },
            DetectionReport { time: 0, value: Qubit::ZERO },
        ];
        let path = std::env::temp_dir().join("photon_align_reports_test.bin");
        write_detection_report_list(&reports, &path).unwrap();
        let read_back = read_detection_report_list(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(read_back, reports);
    }
}
