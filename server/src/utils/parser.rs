use regex::Regex;

/// Parses a price that arrived as text.
/// Examples: "42.50", "$42.50", "42,50 USD", "1.234,56 €", "1,234.56", "₺4.350"
pub fn parse_price(text: &str) -> Result<f64, String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();

    if cleaned.is_empty() {
        return Err(format!("No digits in price: '{}'", text));
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        // Both separators: whichever comes last is the decimal one.
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // Only dots: three trailing digits means a thousands separator.
        (Some(dot), None) => {
            if cleaned.len() - dot - 1 == 3 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, Some(comma)) => {
            if cleaned.len() - comma - 1 == 3 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (None, None) => cleaned,
    };

    let re = Regex::new(r"([0-9]+(?:\.[0-9]+)?)").map_err(|e| e.to_string())?;

    if let Some(captures) = re.captures(&normalized) {
        if let Some(matched) = captures.get(1) {
            return matched
                .as_str()
                .parse::<f64>()
                .map_err(|e| format!("Number parse error: {}", e));
        }
    }

    Err(format!("Could not parse price: '{}'", text))
}
