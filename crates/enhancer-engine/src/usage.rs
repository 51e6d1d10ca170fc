use enhancer_contracts::runs::TokenUsage;

/// Approximate USD prices. Output is priced at the image-output rate.
pub const PRICE_INPUT_PER_1M_TOKENS_USD: f64 = 0.30;
pub const PRICE_OUTPUT_PER_1M_TOKENS_USD: f64 = 30.00;

/// Missing counts are 0; a missing total is the sum of the other two.
pub fn normalize_usage(prompt: Option<u64>, output: Option<u64>, total: Option<u64>) -> TokenUsage {
    let prompt_tokens = prompt.unwrap_or(0);
    let output_tokens = output.unwrap_or(0);
    TokenUsage {
        prompt_tokens,
        output_tokens,
        total_tokens: total.unwrap_or_else(|| prompt_tokens.saturating_add(output_tokens)),
    }
}

/// Rounded to 6 decimal places.
pub fn estimate_price_usd(prompt_tokens: u64, output_tokens: u64) -> f64 {
    let cost = (prompt_tokens as f64 / 1_000_000.0) * PRICE_INPUT_PER_1M_TOKENS_USD
        + (output_tokens as f64 / 1_000_000.0) * PRICE_OUTPUT_PER_1M_TOKENS_USD;
    round_to(cost, 6)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-12
    }

    #[test]
    fn missing_usage_fields_default_to_zero_and_sum() {
        let usage = normalize_usage(None, None, None);
        assert_eq!(usage, TokenUsage::default());

        let usage = normalize_usage(Some(120), Some(1290), None);
        assert_eq!(usage.total_tokens, 1410);

        let usage = normalize_usage(Some(120), None, Some(5000));
        assert_eq!(usage.output_tokens, 0);
        assert_eq!(usage.total_tokens, 5000);
    }

    #[test]
    fn price_follows_per_million_rates() {
        assert!(close(estimate_price_usd(0, 0), 0.0));
        assert!(close(estimate_price_usd(1_000_000, 0), 0.30));
        assert!(close(estimate_price_usd(0, 1_000_000), 30.0));
        assert!(close(estimate_price_usd(0, 1290), 0.0387));
        assert!(close(estimate_price_usd(258, 1290), 0.038777));
    }

    #[test]
    fn price_is_rounded_to_six_decimals() {
        assert!(close(estimate_price_usd(123, 4567), 0.137047));
        assert!(close(estimate_price_usd(1, 0), 0.0));
        assert!(close(estimate_price_usd(2, 0), 0.000001));
    }
}
