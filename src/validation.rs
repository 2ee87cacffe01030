// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::{ValidationError, ValidationErrors};

/// File extensions accepted for review images
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Validates that an uploaded filename carries an accepted image extension
pub fn validate_image_filename(name: &str) -> Result<(), ValidationError> {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) =>
        {
            Ok(())
        }
        _ => Err(ValidationError::new("unsupported_image_type")),
    }
}

/// Flattens a set of validation failures to the single message the API
/// returns: the first violation's message
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_accepted_image_extensions() {
        assert!(validate_image_filename("photo.jpg").is_ok());
        assert!(validate_image_filename("photo.JPEG").is_ok());
        assert!(validate_image_filename("photo.png").is_ok());
        assert!(validate_image_filename("photo.webp").is_ok());
    }

    #[test]
    fn test_rejected_image_extensions() {
        assert!(validate_image_filename("notes.txt").is_err());
        assert!(validate_image_filename("archive.tar.gz").is_err());
        assert!(validate_image_filename("noextension").is_err());
        assert!(validate_image_filename(".png").is_err());
        assert!(validate_image_filename("").is_err());
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 1, max = 5, message = "Star rating must be between 1 and 5"))]
        star_rating: i16,
    }

    #[test]
    fn test_first_validation_message_uses_declared_message() {
        let sample = Sample { star_rating: 9 };
        let errors = sample.validate().unwrap_err();

        assert_eq!(
            first_validation_message(&errors),
            "Star rating must be between 1 and 5"
        );
    }
}
