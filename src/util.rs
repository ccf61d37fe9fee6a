pub fn format_amount(amount: f64) -> String {
    const UNITS: [&str; 5] = ["", "k", "M", "G", "T"];

    let mut value = amount.max(0.0);
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}{}", UNITS[unit])
    }
}

/// Leading characters of a public key, enough to tell peers apart on screen.
pub fn short_key(public_key: &str) -> &str {
    match public_key.char_indices().nth(10) {
        Some((end, _)) => &public_key[..end],
        None => public_key,
    }
}
