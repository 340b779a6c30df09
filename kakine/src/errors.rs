/// Failure to compile one line of an ignore file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseError {
    /// 1-based line number in the ignore source.
    pub line: usize,
    /// The raw line as it appeared in the source.
    pub pattern: String,
    pub message: String,
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid ignore pattern '{}' on line {}: {}",
            self.pattern, self.line, self.message
        )
    }
}
