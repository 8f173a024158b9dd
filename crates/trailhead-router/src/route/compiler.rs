/// Compilation of token sequences into path recognizers
///
/// A [`CompiledMatcher`] bundles the anchored regex recognizer, the ordered
/// parameter keys (one per capturing group) and the specificity [`Score`].
/// It answers two questions: does a concrete path match (and with which
/// params), and which concrete path does a param set produce.
use std::borrow::Cow;

use regex::Regex;
use serde::Deserialize;

use super::pattern::{tokenize, tokens_to_path, ParamToken, Token};
use super::score::Score;
use crate::error::{ConfigError, StringifyError};
use crate::params::{ParamValue, Params};

/// Default body of a parameter group: one or more non-slash characters
const DEFAULT_PARAM_PATTERN: &str = "[^/]+";

/// Matching switches applied when compiling one pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    /// Compare static text and constraints ignoring ASCII/Unicode case
    pub case_insensitive: bool,
    /// Disallow the optional trailing slash
    pub strict: bool,
}

/// One parameter key, in capturing-group order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamKey {
    pub name: String,
    pub optional: bool,
    pub repeatable: bool,
}

impl From<&ParamToken> for ParamKey {
    fn from(param: &ParamToken) -> Self {
        Self {
            name: param.name.clone(),
            optional: param.optional,
            repeatable: param.repeatable,
        }
    }
}

/// A compiled path pattern
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    pattern: String,
    tokens: Vec<Token>,
    recognizer: Regex,
    keys: Vec<ParamKey>,
    score: Score,
    trailing_slash: bool,
    /// Params whose constraint also matches the empty string
    empty_capable: Vec<String>,
}

/// Accumulator for the fold over tokens
///
/// All mutations stay local to the fold; each step consumes and returns Self.
#[derive(Default)]
struct CompileState {
    source: String,
    keys: Vec<ParamKey>,
}

impl CompileState {
    fn with_static_segment(mut self, text: &str) -> Self {
        self.source.push('/');
        self.source.push_str(&regex::escape(text));
        self
    }

    fn with_param(mut self, param: &ParamToken) -> Self {
        let base = param.constraint.as_deref().unwrap_or(DEFAULT_PARAM_PATTERN);
        let body = if param.repeatable {
            format!("(?:{base})(?:/(?:{base}))*")
        } else {
            format!("(?:{base})")
        };

        if param.optional {
            self.source.push_str(&format!("(?:/({body}))?"));
        } else {
            self.source.push_str(&format!("/({body})"));
        }
        self.keys.push(ParamKey::from(param));
        self
    }

    fn with_token(self, token: &Token) -> Self {
        match token {
            Token::Static(text) => self.with_static_segment(text),
            Token::Param(param) => self.with_param(param),
        }
    }

    /// Anchors the pattern and applies trailing-slash and case rules
    fn finalize(mut self, options: PatternOptions, trailing_slash: bool) -> Self {
        if self.source.is_empty() || trailing_slash {
            self.source.push('/');
        } else if !options.strict {
            self.source.push_str("/?");
        }

        let flags = if options.case_insensitive { "(?i)" } else { "" };
        self.source = format!("{flags}^{}$", self.source);
        self
    }
}

/// Tokenizes and compiles a path pattern in one step
///
/// In strict mode a trailing slash in the pattern is significant and
/// becomes part of both the recognizer and generated paths.
///
/// # Examples
///
/// ```
/// use trailhead_router::route::compiler::{compile_pattern, PatternOptions};
///
/// let matcher = compile_pattern("/users/:id", PatternOptions::default()).unwrap();
/// let params = matcher.recognize("/users/42").unwrap();
/// assert_eq!(params["id"], "42");
/// assert!(matcher.recognize("/users").is_none());
/// ```
pub fn compile_pattern(
    pattern: &str,
    options: PatternOptions,
) -> Result<CompiledMatcher, ConfigError> {
    let tokens = tokenize(pattern)?;
    let trailing_slash = options.strict && !tokens.is_empty() && pattern.ends_with('/');
    build_matcher(tokens, options, trailing_slash)
}

/// Compiles a token sequence into a matcher
///
/// # Errors
///
/// [`ConfigError::InvalidPattern`] when a custom constraint is not a valid
/// regex or contains a capturing group of its own.
pub fn compile(tokens: Vec<Token>, options: PatternOptions) -> Result<CompiledMatcher, ConfigError> {
    build_matcher(tokens, options, false)
}

fn build_matcher(
    tokens: Vec<Token>,
    options: PatternOptions,
    trailing_slash: bool,
) -> Result<CompiledMatcher, ConfigError> {
    let mut pattern = tokens_to_path(&tokens);
    if trailing_slash {
        pattern.push('/');
    }

    let mut empty_capable = Vec::new();
    for token in &tokens {
        if let Token::Param(param) = token {
            if validate_constraint(&pattern, param)? {
                empty_capable.push(param.name.clone());
            }
        }
    }

    let state = tokens
        .iter()
        .fold(CompileState::default(), CompileState::with_token)
        .finalize(options, trailing_slash);

    let recognizer = Regex::new(&state.source)
        .map_err(|err| ConfigError::pattern(&pattern, err.to_string()))?;
    let score = Score::from_tokens(&tokens);

    Ok(CompiledMatcher {
        pattern,
        tokens,
        recognizer,
        keys: state.keys,
        score,
        trailing_slash,
        empty_capable,
    })
}

/// Checks a custom constraint, returning whether it matches the empty string
fn validate_constraint(pattern: &str, param: &ParamToken) -> Result<bool, ConfigError> {
    let Some(constraint) = param.constraint.as_deref() else {
        return Ok(false);
    };

    let probe = Regex::new(&format!("^(?:{constraint})$")).map_err(|err| {
        ConfigError::pattern(
            pattern,
            format!("invalid constraint for parameter `{}`: {}", param.name, err),
        )
    })?;

    // Group 0 is the whole match; any other group would shift the keys.
    if probe.captures_len() > 1 {
        return Err(ConfigError::pattern(
            pattern,
            format!(
                "constraint for parameter `{}` contains a capturing group, use `(?:...)` instead",
                param.name
            ),
        ));
    }
    Ok(probe.is_match(""))
}

impl CompiledMatcher {
    /// The normalized pattern, e.g. `/users/:id(\d+)?`
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parameter keys in capturing-group order
    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    /// Source of the anchored recognizer regex
    pub fn recognizer_source(&self) -> &str {
        self.recognizer.as_str()
    }

    /// Whether `path` matches, without extracting params
    pub fn is_match(&self, path: &str) -> bool {
        self.recognizer.is_match(path)
    }

    /// Tests a concrete path and extracts its params
    ///
    /// Captured values are percent-decoded; repeatable params are split on
    /// `/` before decoding so an encoded `%2F` stays inside its piece.
    /// Optional params that are absent or empty are left out of the map; a
    /// required param whose constraint matched nothing keeps its empty value.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::route::compiler::{compile_pattern, PatternOptions};
    /// use trailhead_router::ParamValue;
    ///
    /// let matcher = compile_pattern("/files/:path+", PatternOptions::default()).unwrap();
    /// let params = matcher.recognize("/files/a/b%20c").unwrap();
    /// assert_eq!(params["path"], ParamValue::from(["a", "b c"]));
    /// ```
    pub fn recognize(&self, path: &str) -> Option<Params> {
        let captures = self.recognizer.captures(path)?;

        let params = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(index, key)| {
                let raw = captures.get(index + 1)?.as_str();
                if raw.is_empty() && key.optional {
                    return None;
                }
                let value = if key.repeatable {
                    ParamValue::List(
                        raw.split('/')
                            .filter(|piece| !piece.is_empty())
                            .map(decode_segment)
                            .collect(),
                    )
                } else {
                    ParamValue::Single(decode_segment(raw))
                };
                Some((key.name.clone(), value))
            })
            .collect();

        Some(params)
    }

    /// Generates a concrete path from params
    ///
    /// Values are percent-encoded; list values of repeatable params are
    /// encoded piecewise and joined with `/`. Absent optional params drop
    /// their whole segment. An empty value for a required param is accepted
    /// only when its constraint matches the empty string.
    ///
    /// # Errors
    ///
    /// [`StringifyError::MissingParam`] for an absent required param and
    /// [`StringifyError::UnexpectedList`] for a list given to a
    /// non-repeatable param.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::route::compiler::{compile_pattern, PatternOptions};
    /// use trailhead_router::params_from;
    ///
    /// let matcher = compile_pattern("/users/:id/:tab?", PatternOptions::default()).unwrap();
    /// let path = matcher.build(&params_from([("id", "a b")])).unwrap();
    /// assert_eq!(path, "/users/a%20b");
    ///
    /// assert!(matcher.build(&params_from([("tab", "posts")])).is_err());
    /// ```
    pub fn build(&self, params: &Params) -> Result<String, StringifyError> {
        let mut segments: Vec<Cow<'_, str>> = Vec::with_capacity(self.tokens.len());

        for token in &self.tokens {
            let param = match token {
                Token::Static(text) => {
                    segments.push(Cow::Borrowed(text.as_str()));
                    continue;
                }
                Token::Param(param) => param,
            };

            let given = params.get(&param.name);
            match given.filter(|value| !value.is_empty()) {
                None if param.optional => {}
                None if given.is_some() && self.empty_capable.contains(&param.name) => {
                    segments.push(Cow::Borrowed(""));
                }
                None => {
                    return Err(StringifyError::MissingParam {
                        key: param.name.clone(),
                        pattern: self.pattern.clone(),
                    })
                }
                Some(ParamValue::Single(value)) => {
                    segments.push(urlencoding::encode(value));
                }
                Some(ParamValue::List(_)) if !param.repeatable => {
                    return Err(StringifyError::UnexpectedList {
                        key: param.name.clone(),
                        pattern: self.pattern.clone(),
                    })
                }
                Some(ParamValue::List(values)) => {
                    let joined = values
                        .iter()
                        .filter(|value| !value.is_empty())
                        .map(|value| urlencoding::encode(value))
                        .collect::<Vec<_>>()
                        .join("/");
                    segments.push(Cow::Owned(joined));
                }
            }
        }

        let mut path = format!("/{}", segments.join("/"));
        if self.trailing_slash && path.len() > 1 {
            path.push('/');
        }
        Ok(path)
    }
}

/// Percent-decodes one captured piece, keeping it verbatim if malformed
fn decode_segment(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::warn!("Keeping undecodable param value {:?} verbatim: {}", raw, err);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::params_from;
    use pretty_assertions::assert_eq;

    fn matcher(pattern: &str) -> CompiledMatcher {
        compile_pattern(pattern, PatternOptions::default()).unwrap()
    }

    #[test]
    fn test_keys_follow_capturing_groups() {
        let m = matcher("/users/:id(\\d+)/files/:path*");
        assert_eq!(
            m.keys(),
            &[
                ParamKey {
                    name: "id".to_string(),
                    optional: false,
                    repeatable: false
                },
                ParamKey {
                    name: "path".to_string(),
                    optional: true,
                    repeatable: true
                },
            ]
        );
        assert_eq!(m.recognizer.captures_len() - 1, m.keys().len());
    }

    #[test]
    fn test_static_text_is_escaped() {
        let m = matcher("/v1.0/a+b");
        assert!(m.is_match("/v1.0/a+b"));
        assert!(!m.is_match("/v1x0/aab"));
    }

    #[test]
    fn test_optional_trailing_slash() {
        let m = matcher("/about");
        assert!(m.is_match("/about"));
        assert!(m.is_match("/about/"));
        assert!(!m.is_match("/about//"));
    }

    #[test]
    fn test_strict_rejects_trailing_slash() {
        let options = PatternOptions {
            strict: true,
            ..PatternOptions::default()
        };
        let m = compile_pattern("/about", options).unwrap();
        assert!(m.is_match("/about"));
        assert!(!m.is_match("/about/"));

        let m = compile_pattern("/about/", options).unwrap();
        assert!(!m.is_match("/about"));
        assert!(m.is_match("/about/"));
        assert_eq!(m.build(&Params::new()).unwrap(), "/about/");
    }

    #[test]
    fn test_case_insensitive() {
        let options = PatternOptions {
            case_insensitive: true,
            ..PatternOptions::default()
        };
        let m = compile_pattern("/About", options).unwrap();
        assert!(m.is_match("/about"));
        assert!(!matcher("/About").is_match("/about"));
    }

    #[test]
    fn test_root_matches_only_root() {
        let m = matcher("/");
        assert!(m.is_match("/"));
        assert!(!m.is_match("/a"));
        assert_eq!(m.recognize("/").unwrap(), Params::new());
    }

    #[test]
    fn test_recognize_decodes() {
        let params = matcher("/tags/:tag").recognize("/tags/caf%C3%A9%2Fbar").unwrap();
        assert_eq!(params["tag"], "café/bar");
    }

    #[test]
    fn test_recognize_keeps_malformed_escape() {
        let params = matcher("/tags/:tag").recognize("/tags/%E9").unwrap();
        assert_eq!(params["tag"], "%E9");
    }

    #[test]
    fn test_optional_absent_is_omitted() {
        let m = matcher("/users/:id?");
        let params = m.recognize("/users").unwrap();
        assert!(!params.contains_key("id"));

        let params = m.recognize("/users/7").unwrap();
        assert_eq!(params["id"], "7");
    }

    #[test]
    fn test_optional_in_the_middle() {
        let m = matcher("/users/:id?/edit");
        assert_eq!(m.recognize("/users/edit").unwrap(), Params::new());
        assert_eq!(m.recognize("/users/3/edit").unwrap()["id"], "3");
    }

    #[test]
    fn test_repeatable_requires_one() {
        let m = matcher("/files/:path+");
        assert!(m.recognize("/files").is_none());
        assert_eq!(
            m.recognize("/files/a/b/c").unwrap()["path"],
            ParamValue::from(["a", "b", "c"])
        );
    }

    #[test]
    fn test_repeatable_zero_or_more() {
        let m = matcher("/files/:path*");
        assert!(!m.recognize("/files").unwrap().contains_key("path"));
        assert_eq!(m.recognize("/files/a").unwrap()["path"], ParamValue::from(["a"]));
    }

    #[test]
    fn test_repeatable_with_constraint() {
        let m = matcher("/ids/:id(\\d+)+");
        assert_eq!(m.recognize("/ids/1/22").unwrap()["id"], ParamValue::from(["1", "22"]));
        assert!(m.recognize("/ids/1/x").is_none());
    }

    #[test]
    fn test_catch_all_spans_slashes() {
        let m = matcher("/docs/*");
        assert_eq!(
            m.recognize("/docs/guide/intro").unwrap()["pathMatch"],
            ParamValue::from(["guide", "intro"])
        );
        assert!(m.recognize("/docs").unwrap().is_empty());
    }

    #[test]
    fn test_constraint_filters() {
        let m = matcher("/orders/:id(\\d+)");
        assert!(m.recognize("/orders/12").is_some());
        assert!(m.recognize("/orders/abc").is_none());
    }

    #[test]
    fn test_constraint_alternation_is_isolated() {
        let m = matcher("/:lang(en|fr)/home");
        assert!(m.is_match("/en/home"));
        assert!(!m.is_match("/en"));
        assert!(!m.is_match("/de/home"));
    }

    #[test]
    fn test_capturing_constraint_is_rejected() {
        let err = compile_pattern("/:id(a|(b))", PatternOptions::default()).unwrap_err();
        assert!(err.to_string().contains("capturing group"));
        assert!(compile_pattern("/:id(a|(?:b))", PatternOptions::default()).is_ok());
    }

    #[test]
    fn test_invalid_constraint_is_rejected() {
        let err = compile_pattern("/:id([a-)", PatternOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_build_static_and_params() {
        let m = matcher("/users/:id/posts/:slug");
        let path = m
            .build(&params_from([("id", "1"), ("slug", "hello world")]))
            .unwrap();
        assert_eq!(path, "/users/1/posts/hello%20world");
    }

    #[test]
    fn test_build_missing_required() {
        let err = matcher("/users/:id").build(&Params::new()).unwrap_err();
        assert_eq!(
            err,
            StringifyError::MissingParam {
                key: "id".to_string(),
                pattern: "/users/:id".to_string()
            }
        );
    }

    #[test]
    fn test_build_empty_string_counts_as_missing() {
        assert!(matcher("/users/:id").build(&params_from([("id", "")])).is_err());
        assert_eq!(
            matcher("/users/:id?").build(&params_from([("id", "")])).unwrap(),
            "/users"
        );
    }

    #[test]
    fn test_build_repeatable() {
        let m = matcher("/files/:path+");
        let params = params_from([("path", ParamValue::from(["a", "b c"]))]);
        assert_eq!(m.build(&params).unwrap(), "/files/a/b%20c");
    }

    #[test]
    fn test_build_list_for_scalar_param() {
        let m = matcher("/users/:id");
        let params = params_from([("id", ParamValue::from(["1", "2"]))]);
        assert!(matches!(
            m.build(&params),
            Err(StringifyError::UnexpectedList { .. })
        ));
    }

    #[test]
    fn test_build_root() {
        assert_eq!(matcher("/").build(&Params::new()).unwrap(), "/");
        assert_eq!(matcher("/:lang?").build(&Params::new()).unwrap(), "/");
    }

    #[test]
    fn test_build_then_recognize() {
        let m = matcher("/users/:id/files/:path*");
        let params = params_from([
            ("id", ParamValue::from("jo/hn")),
            ("path", ParamValue::from(["x y", "z"])),
        ]);
        let path = m.build(&params).unwrap();
        assert_eq!(m.recognize(&path).unwrap(), params);
    }

    #[test]
    fn test_required_param_may_capture_empty() {
        let m = matcher("/:rest(.*)");
        let params = m.recognize("/").unwrap();
        assert_eq!(params, params_from([("rest", "")]));
        assert_eq!(m.build(&params).unwrap(), "/");

        let m = matcher("/files/:rest(.*)");
        let params = m.recognize("/files/").unwrap();
        assert_eq!(params["rest"], "");
        assert_eq!(m.build(&params).unwrap(), "/files/");
        assert_eq!(m.recognize("/files/").unwrap(), params);
    }

    #[test]
    fn test_required_param_without_empty_match_still_needs_a_value() {
        assert!(matcher("/files/:rest(.+)")
            .build(&params_from([("rest", "")]))
            .is_err());
        assert!(matcher("/:rest(.*)").build(&Params::new()).is_err());
    }
}
