/// Tokenizer for route path patterns
///
/// Splits a pattern such as `/users/:id(\d+)/files/:path*` into one token per
/// `/`-delimited segment. All functions are **pure**: same input → same output.
///
/// # Segment syntax
///
/// - `about` → static text
/// - `:id` → required parameter
/// - `:id(\d+)` → parameter with a custom regex constraint
/// - `:id?` → optional parameter
/// - `:path+` → repeatable parameter, one or more segments
/// - `:path*` → repeatable parameter, zero or more segments
/// - `*` → catch-all, same as `:pathMatch(.*)*`
use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::ConfigError;

/// Name given to the parameter captured by a bare `*` segment
pub const CATCH_ALL_PARAM: &str = "pathMatch";

/// Constraint that makes a parameter a wildcard
pub const WILDCARD_CONSTRAINT: &str = ".*";

/// One segment of a parsed path pattern
///
/// # Examples
///
/// ```
/// use trailhead_router::route::pattern::{tokenize, Token};
///
/// let tokens = tokenize("/users/:id?").unwrap();
/// assert!(matches!(tokens[0], Token::Static(_)));
/// assert!(matches!(&tokens[1], Token::Param(p) if p.optional));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, matched verbatim
    Static(String),
    /// Named dynamic segment
    Param(ParamToken),
}

/// A dynamic segment with its constraint and modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamToken {
    pub name: String,
    /// Regex source restricting what the segment may contain
    pub constraint: Option<String>,
    /// `?` or `*`: the segment may be absent
    pub optional: bool,
    /// `+` or `*`: the segment may span several `/`-separated pieces
    pub repeatable: bool,
}

impl ParamToken {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
            optional: false,
            repeatable: false,
        }
    }

    fn catch_all() -> Self {
        Self {
            name: CATCH_ALL_PARAM.to_string(),
            constraint: Some(WILDCARD_CONSTRAINT.to_string()),
            optional: true,
            repeatable: true,
        }
    }

    /// Whether this parameter matches anything (`.*`)
    pub fn is_wildcard(&self) -> bool {
        self.constraint.as_deref() == Some(WILDCARD_CONSTRAINT)
    }

    fn is_catch_all(&self) -> bool {
        self.name == CATCH_ALL_PARAM && self.is_wildcard() && self.optional && self.repeatable
    }

    fn modifier(&self) -> Option<char> {
        match (self.optional, self.repeatable) {
            (true, true) => Some('*'),
            (false, true) => Some('+'),
            (true, false) => Some('?'),
            (false, false) => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Static(text) => f.write_str(text),
            Token::Param(param) if param.is_catch_all() => f.write_str("*"),
            Token::Param(param) => {
                write!(f, ":{}", param.name)?;
                if let Some(constraint) = &param.constraint {
                    write!(f, "({})", constraint)?;
                }
                if let Some(modifier) = param.modifier() {
                    write!(f, "{}", modifier)?;
                }
                Ok(())
            }
        }
    }
}

/// Reassembles tokens into their normalized pattern string
///
/// # Examples
///
/// ```
/// use trailhead_router::route::pattern::{tokenize, tokens_to_path};
///
/// let tokens = tokenize("//users///:id(\\d+)?/").unwrap();
/// assert_eq!(tokens_to_path(&tokens), "/users/:id(\\d+)?");
/// ```
pub fn tokens_to_path(tokens: &[Token]) -> String {
    let segments: Vec<String> = tokens.iter().map(Token::to_string).collect();
    format!("/{}", segments.join("/"))
}

/// Splits a path pattern into tokens (pure function)
///
/// Empty segments from leading, trailing or repeated slashes are dropped.
/// A `/` inside a custom constraint does not split the segment.
///
/// # Errors
///
/// [`ConfigError::InvalidPattern`] for an unterminated constraint, a missing
/// parameter name, stray characters after a parameter, or a parameter name
/// used twice.
///
/// # Examples
///
/// ```
/// use trailhead_router::route::pattern::{tokenize, Token, ParamToken};
///
/// let tokens = tokenize("/files/:path+").unwrap();
/// assert_eq!(tokens[0], Token::Static("files".to_string()));
/// assert!(matches!(&tokens[1], Token::Param(p) if p.repeatable && !p.optional));
///
/// assert!(tokenize("/users/:id(\\d+").is_err());
/// ```
pub fn tokenize(pattern: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some(&(_, ch)) = chars.peek() {
        match ch {
            '/' => {
                chars.next();
            }
            ':' => {
                chars.next();
                tokens.push(Token::Param(parse_param(pattern, &mut chars)?));
            }
            _ => {
                let text = take_static(&mut chars);
                if text == "*" {
                    tokens.push(Token::Param(ParamToken::catch_all()));
                } else {
                    tokens.push(Token::Static(text));
                }
            }
        }
    }

    ensure_unique_names(pattern, &tokens)?;
    Ok(tokens)
}

fn take_static(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut text = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if ch == '/' {
            break;
        }
        text.push(ch);
        chars.next();
    }
    text
}

fn parse_param(
    pattern: &str,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<ParamToken, ConfigError> {
    let mut name = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if !(ch.is_ascii_alphanumeric() || ch == '_') {
            break;
        }
        name.push(ch);
        chars.next();
    }
    if name.is_empty() {
        return Err(ConfigError::pattern(pattern, "missing parameter name after `:`"));
    }

    let mut param = ParamToken::new(name);

    if let Some(&(_, '(')) = chars.peek() {
        chars.next();
        param.constraint = Some(parse_constraint(pattern, &param.name, chars)?);
    }

    match chars.peek().map(|&(_, ch)| ch) {
        Some('?') => param.optional = true,
        Some('+') => param.repeatable = true,
        Some('*') => {
            param.optional = true;
            param.repeatable = true;
        }
        _ => {}
    }
    if param.optional || param.repeatable {
        chars.next();
    }

    match chars.peek() {
        None | Some(&(_, '/')) => Ok(param),
        Some(&(offset, _)) => Err(ConfigError::pattern(
            pattern,
            format!(
                "unexpected `{}` after parameter `{}`",
                &pattern[offset..],
                param.name
            ),
        )),
    }
}

/// Reads a parenthesized constraint, the opening `(` already consumed
fn parse_constraint(
    pattern: &str,
    name: &str,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<String, ConfigError> {
    let unterminated = || {
        ConfigError::pattern(
            pattern,
            format!("unterminated custom constraint for parameter `{}`", name),
        )
    };

    let mut depth = 1usize;
    let mut source = String::new();
    loop {
        let (_, ch) = chars.next().ok_or_else(unterminated)?;
        match ch {
            '\\' => {
                let (_, escaped) = chars.next().ok_or_else(unterminated)?;
                source.push('\\');
                source.push(escaped);
            }
            '(' => {
                depth += 1;
                source.push(ch);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                source.push(ch);
            }
            _ => source.push(ch),
        }
    }

    if source.is_empty() {
        return Err(ConfigError::pattern(
            pattern,
            format!("empty custom constraint for parameter `{}`", name),
        ));
    }
    Ok(source)
}

fn ensure_unique_names(pattern: &str, tokens: &[Token]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for token in tokens {
        if let Token::Param(param) = token {
            if !seen.insert(param.name.as_str()) {
                return Err(ConfigError::pattern(
                    pattern,
                    format!("parameter `{}` is declared twice", param.name),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(token: &Token) -> &ParamToken {
        match token {
            Token::Param(param) => param,
            Token::Static(text) => panic!("expected a param, got static `{}`", text),
        }
    }

    #[test]
    fn test_tokenize_static() {
        let tokens = tokenize("/about/team").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Static("about".to_string()),
                Token::Static("team".to_string())
            ]
        );
    }

    #[test]
    fn test_tokenize_root_is_empty() {
        assert!(tokenize("/").unwrap().is_empty());
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_drops_empty_segments() {
        let tokens = tokenize("//users///new/").unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_tokenize_required_param() {
        let tokens = tokenize("/users/:user_id").unwrap();
        let p = param(&tokens[1]);
        assert_eq!(p.name, "user_id");
        assert_eq!(p.constraint, None);
        assert!(!p.optional);
        assert!(!p.repeatable);
    }

    #[test]
    fn test_tokenize_modifiers() {
        let tokens = tokenize("/:a?/:b+/:c*").unwrap();
        let (a, b, c) = (param(&tokens[0]), param(&tokens[1]), param(&tokens[2]));
        assert!(a.optional && !a.repeatable);
        assert!(!b.optional && b.repeatable);
        assert!(c.optional && c.repeatable);
    }

    #[test]
    fn test_tokenize_constraint() {
        let tokens = tokenize("/orders/:id(\\d+)?").unwrap();
        let p = param(&tokens[1]);
        assert_eq!(p.constraint.as_deref(), Some("\\d+"));
        assert!(p.optional);
    }

    #[test]
    fn test_tokenize_constraint_with_nested_groups_and_slash() {
        let tokens = tokenize("/:date((?:\\d{4})/\\d{2})/x").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            param(&tokens[0]).constraint.as_deref(),
            Some("(?:\\d{4})/\\d{2}")
        );
    }

    #[test]
    fn test_tokenize_escaped_paren_in_constraint() {
        let tokens = tokenize("/:v(a\\)b)").unwrap();
        assert_eq!(param(&tokens[0]).constraint.as_deref(), Some("a\\)b"));
    }

    #[test]
    fn test_tokenize_catch_all() {
        let tokens = tokenize("/docs/*").unwrap();
        let p = param(&tokens[1]);
        assert_eq!(p.name, CATCH_ALL_PARAM);
        assert!(p.is_wildcard());
        assert!(p.optional && p.repeatable);
    }

    #[test]
    fn test_star_inside_static_text_is_static() {
        let tokens = tokenize("/a*b").unwrap();
        assert_eq!(tokens, vec![Token::Static("a*b".to_string())]);
    }

    #[test]
    fn test_unterminated_constraint_is_config_error() {
        let err = tokenize("/users/:id(\\d+").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "/users/:id(\\d+"));
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_missing_name_is_config_error() {
        assert!(tokenize("/users/:").is_err());
        assert!(tokenize("/users/:(\\d+)").is_err());
    }

    #[test]
    fn test_trailing_garbage_is_config_error() {
        let err = tokenize("/users/:id-:name").unwrap_err();
        assert!(err.to_string().contains("after parameter `id`"));
    }

    #[test]
    fn test_duplicate_param_is_config_error() {
        assert!(tokenize("/:id/x/:id").is_err());
    }

    #[test]
    fn test_display_reproduces_normalized_pattern() {
        for pattern in ["/", "/users/:id", "/files/:path+", "/a/:b(\\d+)?/:c*", "/docs/*"] {
            let tokens = tokenize(pattern).unwrap();
            assert_eq!(tokens_to_path(&tokens), pattern);
        }
    }
}
