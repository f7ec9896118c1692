/// Parse a free-text target price such as `"$1,234.50 USD"`.
///
/// Returns 0.0 for empty, unparseable or non-finite input; callers treat 0.0 as "missing".
pub fn parse_price(price: &str) -> f64 {
    let clean = price.trim();
    if clean.is_empty() {
        return 0.0;
    }

    let clean = clean
        .replace(['$', '€', '£', ','], "")
        .replace("USD", "");

    match clean.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}
