/// Route pattern module
///
/// Pure components turning a path pattern into a compiled matcher:
/// - `pattern`: tokenizer (pattern string → tokens)
/// - `compiler`: tokens → recognizer, parameter keys, path builder
/// - `score`: specificity ranking between compiled patterns

pub mod compiler;
pub mod pattern;
pub mod score;

// Re-export commonly used types
pub use compiler::{compile, compile_pattern, CompiledMatcher, ParamKey, PatternOptions};
pub use pattern::{tokenize, tokens_to_path, ParamToken, Token, CATCH_ALL_PARAM};
pub use score::Score;
