//! Checks on request bodies, run before anything reaches the datastore.
use crate::datastore::structs::CredentialType;
use crate::twoface::{ExternalError, Fallible};

pub const INVALID_NAME: ExternalError =
    ExternalError::invalid_field("name must be 5 to 50 characters");
pub const INVALID_PASSWORD: ExternalError =
    ExternalError::invalid_field("password must be 5 to 15 characters");
pub const INVALID_EMAIL: ExternalError = ExternalError::invalid_field("invalid email format");
pub const INVALID_PHONE: ExternalError = ExternalError::invalid_field(
    "phone must start with + and be 7 to 13 characters",
);
pub const INVALID_IMAGE_URL: ExternalError =
    ExternalError::invalid_field("imageUrl must be a .jpg, .jpeg or .png URL");
pub const INVALID_POST: ExternalError =
    ExternalError::invalid_field("postInHtml must be 2 to 500 characters");
pub const INVALID_TAGS: ExternalError = ExternalError::invalid_field("tags must not be empty");
pub const INVALID_COMMENT: ExternalError =
    ExternalError::invalid_field("comment must be 2 to 500 characters");

/// Length in characters, not bytes.
pub fn length(value: &str, min: usize, max: usize, invalid: ExternalError) -> Fallible<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(invalid.into());
    }
    Ok(())
}

pub fn email(value: &str) -> Fallible<()> {
    if looks_like_email(value) {
        Ok(())
    } else {
        Err(INVALID_EMAIL.into())
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

pub fn phone(value: &str) -> Fallible<()> {
    if !value.starts_with('+') {
        return Err(INVALID_PHONE.into());
    }
    length(value, 7, 13, INVALID_PHONE)
}

pub fn credential(credential_type: CredentialType, value: &str) -> Fallible<()> {
    match credential_type {
        CredentialType::Email => email(value),
        CredentialType::Phone => phone(value),
    }
}

pub fn image_url(value: &str) -> Fallible<()> {
    let url = url::Url::parse(value).map_err(|_| INVALID_IMAGE_URL)?;
    let is_web = matches!(url.scheme(), "http" | "https") && url.host().is_some();
    let is_image = [".jpg", ".jpeg", ".png"]
        .iter()
        .any(|ext| url.path().ends_with(ext));
    if is_web && is_image {
        Ok(())
    } else {
        Err(INVALID_IMAGE_URL.into())
    }
}

pub fn tags(tags: &[String]) -> Fallible<()> {
    if tags.iter().any(|tag| tag.is_empty()) {
        return Err(INVALID_TAGS.into());
    }
    Ok(())
}
