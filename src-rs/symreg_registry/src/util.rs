/// Removes a surrounding `$...$`, `$$...$$` or
/// `\begin{equation}...\end{equation}` pair, along with the whitespace
/// around it.
pub fn strip_math_delimiters(text: &str) -> &str {
    let text = text.trim();

    let stripped = text
        .strip_prefix("$$")
        .and_then(|inner| inner.strip_suffix("$$"))
        .or_else(|| {
            text.strip_prefix('$')
                .and_then(|inner| inner.strip_suffix('$'))
        })
        .or_else(|| {
            text.strip_prefix("\\begin{equation}")
                .and_then(|inner| inner.strip_suffix("\\end{equation}"))
        });

    stripped.map_or(text, str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiters() {
        assert_eq!(strip_math_delimiters("$a^x+b $"), "a^x+b");
        assert_eq!(strip_math_delimiters("$$x$$"), "x");
        assert_eq!(
            strip_math_delimiters("\\begin{equation}f = x\\end{equation}"),
            "f = x"
        );
        assert_eq!(strip_math_delimiters(" x**2 "), "x**2");
        assert_eq!(strip_math_delimiters("$"), "$");
    }
}
