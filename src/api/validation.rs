use std::collections::HashSet;
use thiserror::Error;

use crate::dashboard::models::MetadataPatch;

pub const MAX_NAME_CHARS: usize = 128;
pub const MAX_DESCRIPTION_CHARS: usize = 2048;
pub const MAX_TAGS: usize = 32;
pub const MAX_TAG_CHARS: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataValidationError {
    #[error("at least one of name, description or tags must be provided")]
    Empty,
    #[error("name exceeds {MAX_NAME_CHARS} characters")]
    NameTooLong,
    #[error("description exceeds {MAX_DESCRIPTION_CHARS} characters")]
    DescriptionTooLong,
    #[error("at most {MAX_TAGS} tags are allowed")]
    TooManyTags,
    #[error("tag '{0}' exceeds {MAX_TAG_CHARS} characters")]
    TagTooLong(String),
    #[error("tags must not contain control characters")]
    InvalidTag,
}

/// Checks a metadata patch and normalizes it.
///
/// Name and tags are trimmed; blank tags are dropped and duplicates removed
/// keeping first occurrence, since tags behave as an ordered set.
pub fn validate_metadata(patch: MetadataPatch) -> Result<MetadataPatch, MetadataValidationError> {
    if patch.is_empty() {
        return Err(MetadataValidationError::Empty);
    }

    let name = patch.name.map(|name| name.trim().to_string());
    if name.as_ref().is_some_and(|n| n.chars().count() > MAX_NAME_CHARS) {
        return Err(MetadataValidationError::NameTooLong);
    }

    if patch
        .description
        .as_ref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(MetadataValidationError::DescriptionTooLong);
    }

    let tags = patch.tags.map(normalize_tags).transpose()?;

    Ok(MetadataPatch {
        name,
        description: patch.description,
        tags,
    })
}

fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, MetadataValidationError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();

    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().any(char::is_control) {
            return Err(MetadataValidationError::InvalidTag);
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(MetadataValidationError::TagTooLong(tag.to_string()));
        }
        if seen.insert(tag.to_string()) {
            normalized.push(tag.to_string());
        }
    }

    if normalized.len() > MAX_TAGS {
        return Err(MetadataValidationError::TooManyTags);
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(name: Option<&str>, tags: Option<Vec<&str>>) -> MetadataPatch {
        MetadataPatch {
            name: name.map(str::to_string),
            description: None,
            tags: tags.map(|t| t.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn validate_metadata_normalizes_tags() {
        let result = validate_metadata(patch(
            Some("  Orders API "),
            Some(vec!["prod", " eu ", "", "prod", "payments"]),
        ))
        .unwrap();

        assert_eq!(result.name.as_deref(), Some("Orders API"));
        assert_eq!(result.tags.unwrap(), vec!["prod", "eu", "payments"]);
    }

    #[test]
    fn validate_metadata_allows_clearing_fields() {
        let result = validate_metadata(patch(Some(""), Some(vec![]))).unwrap();
        assert_eq!(result.name.as_deref(), Some(""));
        assert!(result.tags.unwrap().is_empty());
    }

    #[test]
    fn validate_metadata_rejects_empty_patch() {
        assert_eq!(
            validate_metadata(MetadataPatch::default()),
            Err(MetadataValidationError::Empty)
        );
    }

    #[test]
    fn validate_metadata_limits() {
        let long_name = "x".repeat(MAX_NAME_CHARS + 1);
        assert_eq!(
            validate_metadata(patch(Some(&long_name), None)),
            Err(MetadataValidationError::NameTooLong)
        );

        let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("t{i}")).collect();
        let many_refs: Vec<&str> = many.iter().map(String::as_str).collect();
        assert_eq!(
            validate_metadata(patch(None, Some(many_refs))),
            Err(MetadataValidationError::TooManyTags)
        );

        let long_tag = "y".repeat(MAX_TAG_CHARS + 1);
        assert!(matches!(
            validate_metadata(patch(None, Some(vec![&long_tag]))),
            Err(MetadataValidationError::TagTooLong(_))
        ));

        assert_eq!(
            validate_metadata(patch(None, Some(vec!["bad\ntag"]))),
            Err(MetadataValidationError::InvalidTag)
        );
    }
}
