//! Token and price estimates for completion requests.

/// USD per 1K prompt tokens.
const INPUT_COST_PER_1K: f64 = 0.01;
/// USD per 1K completion tokens.
const OUTPUT_COST_PER_1K: f64 = 0.03;

pub fn estimate_cost(prompt_tokens: u32, completion_tokens: u32) -> f64 {
    f64::from(prompt_tokens) / 1000.0 * INPUT_COST_PER_1K
        + f64::from(completion_tokens) / 1000.0 * OUTPUT_COST_PER_1K
}

/// Rough token count for text: one token per 0.75 whitespace-separated words.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count() as f64;
    (words / 0.75).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_cost() {
        assert_eq!(estimate_cost(0, 0), 0.0);
        assert!((estimate_cost(1000, 1000) - 0.04).abs() < 1e-12);
        assert!((estimate_cost(2500, 500) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   \n\t "), 0);
        assert_eq!(estimate_tokens("one two three"), 4);
        assert_eq!(estimate_tokens("one\ntwo  three\tfour"), 6);
    }
}
