use std::collections::BTreeMap;

use crate::canonical::canonicalize;
use crate::domain::Sex;
use crate::errors::SuggestError;

/// Raw tag-based suggest parameters as received from a caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagRequest {
    pub tags: Vec<String>,
    /// `None` and unisex both mean "any sex".
    pub sex: Option<Sex>,
}

impl TagRequest {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self { tags: tags.into_iter().map(Into::into).collect(), sex: None }
    }

    /// Splits a comma-separated `tags` parameter.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn with_sex(mut self, sex: Option<Sex>) -> Self {
        self.sex = sex;
        self
    }

    /// Sex to filter the catalog on; unisex does not narrow it.
    pub fn sex_filter(&self) -> Option<Sex> {
        self.sex.filter(|sex| *sex != Sex::Unisex)
    }

    /// Canonical tag multiset. A tag repeated by the caller weighs more.
    pub fn weighted_tags(&self) -> Result<BTreeMap<String, f64>, SuggestError> {
        let mut weighted = BTreeMap::new();
        for tag in self.tags.iter().map(|tag| canonicalize(tag)).filter(|tag| !tag.is_empty()) {
            *weighted.entry(tag).or_insert(0.0) += 1.0;
        }
        if weighted.is_empty() {
            return Err(SuggestError::Validation("tags are empty".to_string()));
        }
        Ok(weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::TagRequest;
    use crate::domain::Sex;
    use crate::errors::SuggestError;

    #[test]
    fn repeated_and_differently_spelled_tags_accumulate() {
        let weighted = TagRequest::from_csv("Citrus, citrus!,woody,,")
            .weighted_tags()
            .expect("tags should be accepted");

        assert_eq!(weighted.len(), 2);
        assert_eq!(weighted.get("citrus"), Some(&2.0));
        assert_eq!(weighted.get("woody"), Some(&1.0));
    }

    #[test]
    fn blank_tags_are_a_validation_failure() {
        assert_eq!(
            TagRequest::from_csv(" , ?! ").weighted_tags(),
            Err(SuggestError::Validation("tags are empty".to_string()))
        );
    }

    #[test]
    fn unisex_does_not_filter_the_catalog() {
        let request = TagRequest::new(["warm"]);
        assert_eq!(request.clone().with_sex(Some(Sex::Unisex)).sex_filter(), None);
        assert_eq!(request.with_sex(Some(Sex::Male)).sex_filter(), Some(Sex::Male));
    }
}
