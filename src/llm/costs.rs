//! Per-token pricing table (USD), used for cost logging only.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Look up (input, output) cost per token for a model.
///
/// Matches on model-family prefixes; unknown models cost zero.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    let model = model.to_ascii_lowercase();
    if model.starts_with("gemini-1.5-flash") || model.starts_with("gemini-2.0-flash") {
        (dec!(0.000000075), dec!(0.0000003))
    } else if model.starts_with("gemini-1.5-pro") {
        (dec!(0.00000125), dec!(0.000005))
    } else if model.starts_with("claude-3-5-haiku") || model.starts_with("claude-haiku") {
        (dec!(0.0000008), dec!(0.000004))
    } else if model.starts_with("claude") {
        (dec!(0.000003), dec!(0.000015))
    } else if model.starts_with("gpt-4o-mini") {
        (dec!(0.00000015), dec!(0.0000006))
    } else if model.starts_with("gpt-4o") {
        (dec!(0.0000025), dec!(0.00001))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    }
}

/// Estimated cost of one call.
pub fn estimate(costs: (Decimal, Decimal), input_tokens: u32, output_tokens: u32) -> Decimal {
    costs.0 * Decimal::from(input_tokens) + costs.1 * Decimal::from(output_tokens)
}
