use crate::models::ecg::RawSample;
use crate::sensor::IngestError;

/// PMD ECG frames carry a fixed header before the samples.
pub const ECG_FRAME_HEADER_LEN: usize = 10;
pub const ECG_SAMPLE_LEN: usize = 3;
pub const MAX_SAMPLES_PER_FRAME: usize = 73;

/// Decodes a Heart Rate Measurement characteristic value (bpm).
///
/// Bit 0 of the flags byte selects a little-endian u16 instead of a u8.
pub fn parse_heart_rate_measurement(bytes: &[u8]) -> Result<u16, IngestError> {
    let flags = *bytes
        .first()
        .ok_or_else(|| IngestError::MalformedFrame("empty heart rate measurement".into()))?;

    if flags & 0x01 != 0 {
        match bytes.get(1..3) {
            Some(&[low, high]) => Ok(u16::from_le_bytes([low, high])),
            _ => Err(IngestError::MalformedFrame(
                "16-bit heart rate flag set but value is truncated".into(),
            )),
        }
    } else {
        bytes
            .get(1)
            .map(|&value| value as u16)
            .ok_or_else(|| IngestError::MalformedFrame("heart rate value missing".into()))
    }
}

fn decode_i24_le(chunk: &[u8]) -> i32 {
    let raw = (chunk[0] as i32) | ((chunk[1] as i32) << 8) | ((chunk[2] as i32) << 16);
    // sign-extend from 24 bits
    (raw << 8) >> 8
}

/// Decodes the 24-bit two's-complement samples of one ECG data frame.
///
/// Trailing bytes that do not form a full sample are ignored, as are samples past the
/// per-frame maximum.
pub fn parse_ecg_frame(bytes: &[u8]) -> Result<Vec<i32>, IngestError> {
    if bytes.len() < ECG_FRAME_HEADER_LEN {
        return Err(IngestError::MalformedFrame(format!(
            "ECG frame of {} bytes is shorter than its header",
            bytes.len()
        )));
    }

    let payload = &bytes[ECG_FRAME_HEADER_LEN..];
    if payload.len() % ECG_SAMPLE_LEN != 0 {
        tracing::debug!("Ignoring {} trailing bytes in ECG frame", payload.len() % ECG_SAMPLE_LEN);
    }
    Ok(payload
        .chunks_exact(ECG_SAMPLE_LEN)
        .take(MAX_SAMPLES_PER_FRAME)
        .map(decode_i24_le)
        .collect())
}

/// Spreads a decoded frame over the timeline at the sampling period.
///
/// Stamps start at the arrival time, unless the frame arrived at or before `previous`
/// (the newest timestamp already assigned). Then they continue one period after it, so
/// notifications delivered in a burst keep all their samples.
pub fn stamp_ecg_frame(
    samples: &[i32],
    arrival_ms: i64,
    previous: Option<i64>,
    sampling_rate_hz: f64,
) -> Vec<RawSample> {
    let step = 1000.0 / sampling_rate_hz;
    let origin = match previous {
        Some(last) if arrival_ms <= last => last as f64 + step,
        _ => arrival_ms as f64,
    };
    samples
        .iter()
        .enumerate()
        .map(|(i, &value)| RawSample {
            timestamp: (origin + i as f64 * step).round() as i64,
            value: value as f64,
        })
        .collect()
}

/// Stamps frames in arrival order, each continuing from the one before.
pub fn stamp_ecg_frames(
    frames: &[(i64, Vec<i32>)],
    mut previous: Option<i64>,
    sampling_rate_hz: f64,
) -> Vec<RawSample> {
    let mut stamped = Vec::with_capacity(frames.iter().map(|(_, samples)| samples.len()).sum());
    for (arrival_ms, samples) in frames {
        let frame = stamp_ecg_frame(samples, *arrival_ms, previous, sampling_rate_hz);
        previous = frame.last().map(|s| s.timestamp).or(previous);
        stamped.extend(frame);
    }
    stamped
}
