use std::fmt;

use crate::canonical::canonicalize;
use crate::errors::SuggestError;

const CACHE_KEY_PREFIX: &str = "scently:suggest:v1";

/// Raw suggest parameters as received from a caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuggestRequest {
    pub brand: String,
    pub name: String,
    pub use_ai: bool,
}

impl SuggestRequest {
    pub fn new(brand: impl Into<String>, name: impl Into<String>) -> Self {
        Self { brand: brand.into(), name: name.into(), use_ai: false }
    }

    pub fn with_ai(mut self, use_ai: bool) -> Self {
        self.use_ai = use_ai;
        self
    }
}

/// Canonical `(brand, name, use_ai)` tuple keying the response cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    brand: String,
    name: String,
    use_ai: bool,
}

impl Fingerprint {
    pub fn new(brand: &str, name: &str, use_ai: bool) -> Result<Self, SuggestError> {
        let brand = canonicalize(brand);
        if brand.is_empty() {
            return Err(SuggestError::Validation("brand is empty".to_string()));
        }
        let name = canonicalize(name);
        if name.is_empty() {
            return Err(SuggestError::Validation("name is empty".to_string()));
        }
        Ok(Self { brand, name, use_ai })
    }

    pub fn from_request(request: &SuggestRequest) -> Result<Self, SuggestError> {
        Self::new(&request.brand, &request.name, request.use_ai)
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn use_ai(&self) -> bool {
        self.use_ai
    }

    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.use_ai { "ai" } else { "base" };
        write!(f, "{CACHE_KEY_PREFIX}:{}:{}:{mode}", self.brand, self.name)
    }
}
