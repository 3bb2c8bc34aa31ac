/// Keeps ticker input to what market symbols use, e.g. `BRK-B`, `^GSPC`,
/// `EURUSD=X`.
pub fn sanitize_ticker(ticker: &str) -> String {
    ticker
        .chars()
        .take(20)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '^' | '='))
        .collect::<String>()
        .to_uppercase()
}
