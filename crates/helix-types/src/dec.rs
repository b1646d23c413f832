//! Integer decimal arithmetic for sdk.Dec strings and display formatting.
//!
//! Chain endpoints report some quantities (community pool, commission) as
//! sdk.Dec decimal strings. Everything here stays in integer space; no
//! floats anywhere near token amounts.

/// 10^n as i128, saturating at i128::MAX for out-of-range exponents.
pub fn pow10(n: u32) -> i128 {
    10i128.checked_pow(n).unwrap_or(i128::MAX)
}

/// Parse an sdk.Dec-style decimal string into an integer scaled by 10^scale.
///
/// Lenient on malformed input: non-digit characters are stripped and an
/// empty or unparsable string yields 0. Fractional digits beyond `scale`
/// are truncated. `parse_dec("12.34", 2) == 1234`.
pub fn parse_dec(s: &str, scale: u32) -> i128 {
    let s0 = s.trim();
    if s0.is_empty() {
        return 0;
    }
    let (neg, s0) = match s0.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s0),
    };

    let (whole_part, frac_part) = match s0.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s0, ""),
    };

    let whole: String = whole_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let frac: String = frac_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let whole_val: i128 = whole.parse().unwrap_or(0);

    // Take exactly `scale` fractional digits, right-padded with zeros.
    let mut frac_scaled: i128 = 0;
    if scale > 0 {
        let taken: String = frac.chars().take(scale as usize).collect();
        let pad = scale as usize - taken.len();
        frac_scaled = taken.parse().unwrap_or(0);
        frac_scaled = frac_scaled.saturating_mul(pow10(pad as u32));
    }

    let val = whole_val
        .saturating_mul(pow10(scale))
        .saturating_add(frac_scaled);
    if neg {
        -val
    } else {
        val
    }
}

/// Format an integer amount of base atomics as a decimal string with
/// `decimals` fractional digits, trimming trailing zeros and capping the
/// fraction at `max_frac` digits.
pub fn format_units(amount: i128, decimals: u32, max_frac: u32) -> String {
    let neg = amount < 0;
    let a = amount.unsigned_abs();

    if decimals == 0 {
        return if neg { format!("-{}", a) } else { a.to_string() };
    }

    let base = pow10(decimals).unsigned_abs();
    let whole = a / base;
    let frac = a % base;

    let frac_full = format!("{:0>width$}", frac, width = decimals as usize);
    let take = (max_frac.min(decimals)) as usize;
    let frac_part = frac_full[..take].trim_end_matches('0');

    let s = if frac_part.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac_part)
    };
    if neg {
        format!("-{}", s)
    } else {
        s
    }
}
