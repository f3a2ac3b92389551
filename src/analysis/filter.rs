use crate::analysis::token::Token;

pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn TokenFilter>;
}

impl Clone for Box<dyn TokenFilter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Lowercases token text in place, leaving `position`/`length` (which refer
/// to the original byte span) untouched.
#[derive(Clone)]
pub struct LowercaseFilter;

impl TokenFilter for LowercaseFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|mut token| {
                token.text = token.text.to_lowercase();
                token
            })
            .collect()
    }

    fn name(&self) -> &str {
        "lowercase"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(LowercaseFilter)
    }
}
