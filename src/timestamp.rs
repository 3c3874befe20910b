//! Conversion between seconds and clock-style timestamp strings.
//!
//! Every other module that touches wire formats goes through this codec:
//! - display timestamps (`MM:SS`, `1:00:16`)
//! - WebVTT cue timings (`HH:MM:SS.mmm`)
//! - SubRip cue timings (`HH:MM:SS,mmm`)
//!
//! We do all arithmetic on integers (scaled by the fraction precision) to avoid
//! float drift at format boundaries.

/// Options controlling how [`seconds_to_timestamp`] renders its output.
#[derive(Debug, Clone)]
pub struct TimestampOptions {
    /// Emit an hours component even when the value is under one hour.
    pub force_hours: bool,

    /// Pad the hours component to two digits. Only meaningful when hours are shown.
    pub pad_hours: bool,

    /// Number of fractional-second digits to append. Zero means whole seconds only.
    pub fraction_digits: u8,

    /// Delimiter placed before the fractional digits (`.` for WebVTT, `,` for SubRip).
    pub fraction_delimiter: char,
}

impl Default for TimestampOptions {
    fn default() -> Self {
        Self {
            force_hours: false,
            pad_hours: false,
            fraction_digits: 0,
            fraction_delimiter: '.',
        }
    }
}

/// Format seconds as a clock timestamp.
///
/// Default output is `MM:SS`; an hours component appears when the value reaches one hour
/// or `force_hours` is set. Negative or non-finite input is clamped to zero.
///
/// Rounding policy:
/// - With fractional digits, we round to the nearest unit of the requested precision
///   (so `1.9995` at millisecond precision becomes `00:00:02.000`).
/// - Without fractional digits, we truncate, so that
///   `timestamp_to_seconds(seconds_to_timestamp(s)) == floor(s)`.
pub fn seconds_to_timestamp(seconds: f64, opts: &TimestampOptions) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    let scale = 10u64.pow(u32::from(opts.fraction_digits));
    let total_scaled = if opts.fraction_digits == 0 {
        seconds.floor() as u64
    } else {
        (seconds * scale as f64).round() as u64
    };

    let fraction = total_scaled % scale;
    let total_s = total_scaled / scale;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    let mut out = String::new();
    if h > 0 || opts.force_hours {
        if opts.pad_hours {
            out.push_str(&format!("{h:02}:"));
        } else {
            out.push_str(&format!("{h}:"));
        }
    }
    out.push_str(&format!("{m:02}:{s:02}"));

    if opts.fraction_digits > 0 {
        out.push(opts.fraction_delimiter);
        out.push_str(&format!(
            "{fraction:0width$}",
            width = opts.fraction_digits as usize
        ));
    }

    out
}

/// Format seconds as a WebVTT cue timestamp (`HH:MM:SS.mmm`).
///
/// WebVTT requires a two-digit hours component and millisecond precision.
pub fn vtt_timestamp(seconds: f64) -> String {
    seconds_to_timestamp(
        seconds,
        &TimestampOptions {
            force_hours: true,
            pad_hours: true,
            fraction_digits: 3,
            fraction_delimiter: '.',
        },
    )
}

/// Format seconds as a SubRip cue timestamp (`HH:MM:SS,mmm`).
pub fn srt_timestamp(seconds: f64) -> String {
    seconds_to_timestamp(
        seconds,
        &TimestampOptions {
            force_hours: true,
            pad_hours: true,
            fraction_digits: 3,
            fraction_delimiter: ',',
        },
    )
}

/// Parse a `[HH:]MM:SS[.fff]` (or `,fff`) timestamp back into seconds.
///
/// Components are parsed as integers and summed with positional weights
/// (1, 60, 3600 from the right). Anything unparsable yields `0.0`, keeping
/// this function total like the rest of the conversion layer. Parsers that
/// need to *skip* malformed cues use [`parse_timestamp`] instead, which
/// reports the failure.
pub fn timestamp_to_seconds(timestamp: &str) -> f64 {
    parse_timestamp(timestamp).unwrap_or(0.0)
}

/// Strict variant of [`timestamp_to_seconds`]: `None` when the input is not a
/// well-formed clock timestamp.
pub fn parse_timestamp(timestamp: &str) -> Option<f64> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        return None;
    }

    // Split off the optional fractional part first; either delimiter is accepted
    // so SubRip timings can be fed in without normalization.
    let (clock, fraction) = match timestamp.split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (timestamp, None),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut total = 0u64;
    let mut weight = 1u64;
    for part in parts.iter().rev() {
        let value = part.trim().parse::<u64>().ok()?;
        total += value * weight;
        weight *= 60;
    }

    let mut seconds = total as f64;
    if let Some(fraction) = fraction {
        let digits = fraction.trim();
        let value = digits.parse::<u64>().ok()?;
        seconds += value as f64 / 10f64.powi(digits.len() as i32);
    }

    Some(seconds)
}
