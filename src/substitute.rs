use crate::variables::VariableMap;

const TOKEN_OPEN: &str = "{{";
const TOKEN_CLOSE: &str = "}}";

/// Builds the placeholder for a variable name, e.g. `name` -> `{{name}}`.
pub fn token_for(name: &str) -> String {
    format!("{TOKEN_OPEN}{name}{TOKEN_CLOSE}")
}

/// Flat find/replace of `{{name}}` tokens.
///
/// Tokens are built once from the [`VariableMap`] and replaced key by key in declaration
/// order, one left-to-right pass per key. A value is never rescanned for its own token, so
/// `{"a": "{{a}}"}` cannot loop. A value holding the token of a key declared later is
/// picked up when that key's turn comes.
#[derive(Debug, Clone)]
pub struct Substitutor {
    tokens: Vec<(String, String)>,
}
impl Substitutor {
    pub fn new(variables: &VariableMap) -> Self {
        let tokens = variables
            .iter()
            .map(|(name, value)| (token_for(name), value.to_string()))
            .collect();

        Self { tokens }
    }

    pub fn substitute(&self, text: &str) -> String {
        let mut output = text.to_string();

        for (token, value) in &self.tokens {
            if output.contains(token.as_str()) {
                output = output.replace(token.as_str(), value);
            }
        }

        output
    }
}

/// One-shot form of [`Substitutor::substitute`].
pub fn substitute(text: &str, variables: &VariableMap) -> String {
    Substitutor::new(variables).substitute(text)
}

/// Returns the distinct names of `{{...}}` tokens still present in `text`, in order of
/// first appearance.
pub fn unresolved_tokens(text: &str) -> Vec<String> {
    lazy_static::lazy_static! {
        static ref TOKEN_REGEX: regex::Regex =
            regex::Regex::new(r"\{\{([^{}\s]+)\}\}").expect("a valid regex pattern");
    }

    let mut names: Vec<String> = Vec::new();

    for captures in TOKEN_REGEX.captures_iter(text) {
        let name = &captures[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }

    names
}
