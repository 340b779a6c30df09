// gitignore-style path exclusion, evaluated in file order with last-match-wins.
use errors::ParseError;
use glob::{MatchOptions, Pattern};
pub mod errors;

/// `*` and `?` never cross a `/`; dotfiles are matched like any other name.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A single compiled line of an ignore file.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The line as written, kept for diagnostics.
    pub source: String,
    /// `!pattern`: re-include whatever an earlier rule excluded.
    pub negated: bool,
    /// `pattern/`: only directories can match.
    pub directory_only: bool,
    /// Leading or inner `/`: matched against the full path from the root instead of a
    /// single path component at any depth.
    pub anchored: bool,
    pattern: Pattern,
}
impl Rule {
    /// Compiles one line. Returns `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str, line_number: usize) -> Result<Option<Self>, ParseError> {
        let trimmed = line.trim_end();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        // `\#` and `\!` stand for a literal leading character
        let body = body
            .strip_prefix("\\#")
            .map(|rest| format!("#{rest}"))
            .or_else(|| body.strip_prefix("\\!").map(|rest| format!("!{rest}")))
            .unwrap_or_else(|| body.to_string());

        let (directory_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body.as_str()),
        };

        let (leading_slash, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        if body.is_empty() {
            return Ok(None);
        }

        let anchored = leading_slash || body.contains('/');

        let pattern = Pattern::new(body).map_err(|error| ParseError {
            line: line_number,
            pattern: line.to_string(),
            message: error.msg.to_string(),
        })?;

        Ok(Some(Rule {
            source: line.to_string(),
            negated,
            directory_only,
            anchored,
            pattern,
        }))
    }

    /// Tests the rule against one path (not its ancestors).
    ///
    /// `path` is the `/`-joined path from the root and `name` its last component.
    fn matches(&self, path: &str, name: &str, is_directory: bool) -> bool {
        if self.directory_only && !is_directory {
            return false;
        }

        if self.anchored {
            self.pattern.matches_with(path, MATCH_OPTIONS)
        } else {
            self.pattern.matches_with(name, MATCH_OPTIONS)
        }
    }
}

/// An ordered set of ignore rules.
///
/// An empty set ignores nothing, which is what a render without an ignore file uses.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}
impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Parses the full text of an ignore file.
    ///
    /// # Example
    /// ```
    /// let rules = kakine::RuleSet::parse("build/\n!build/keep.txt\n").unwrap();
    ///
    /// assert!(rules.is_ignored("build/a.txt", false));
    /// assert!(!rules.is_ignored("build/keep.txt", false));
    /// ```
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut rules = Vec::new();

        for (index, line) in source.lines().enumerate() {
            if let Some(rule) = Rule::parse(line, index + 1)? {
                rules.push(rule);
            }
        }

        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Decides whether `relative_path` (relative to the root, `/`-separated) is excluded.
    ///
    /// Rules are applied in order and the last one that matches decides. An excluding rule
    /// matches the path itself or any of its ancestor directories, so `build/` excludes
    /// `build/a.txt`. A `!` rule only matches the path itself: a later `!build/keep.txt`
    /// re-includes that one file, while `!logs/` does not re-include `logs/debug.log`.
    pub fn is_ignored(&self, relative_path: &str, is_directory: bool) -> bool {
        self.deciding_rule(relative_path, is_directory)
            .is_some_and(|rule| !rule.negated)
    }

    /// The last rule that matches `relative_path`, if any.
    pub fn deciding_rule(&self, relative_path: &str, is_directory: bool) -> Option<&Rule> {
        let segments: Vec<&str> = relative_path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();

        if segments.is_empty() {
            return None;
        }

        // (path from root, last component, is directory) for each ancestor and the path
        let candidates: Vec<(String, &str, bool)> = (1..=segments.len())
            .map(|depth| {
                let is_last = depth == segments.len();

                (
                    segments[..depth].join("/"),
                    segments[depth - 1],
                    !is_last || is_directory,
                )
            })
            .collect();

        let (own_path, own_name, own_is_dir) = candidates.last()?;

        self.rules.iter().rev().find(|rule| {
            if rule.negated {
                rule.matches(own_path, own_name, *own_is_dir)
            } else {
                candidates
                    .iter()
                    .any(|(path, name, is_dir)| rule.matches(path, name, *is_dir))
            }
        })
    }
}

/// Convenience form of [`RuleSet::is_ignored`].
pub fn is_ignored(relative_path: &str, is_directory: bool, rules: &RuleSet) -> bool {
    rules.is_ignored(relative_path, is_directory)
}
