mod categories;
mod images;
mod products;

pub use categories::CategoryService;
pub use images::ProductImageService;
pub use products::ProductService;

use domain_kernel::ValidationError;
use std::borrow::Cow;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{CatalogError, CatalogResult};

/// Ids arriving from callers must be positive.
fn require_id(field: &'static str, id: i32) -> CatalogResult<i32> {
    if id <= 0 {
        return Err(CatalogError::validation(
            field,
            format!("Invalid {}: {}", field.replace('_', " "), id),
        ));
    }
    Ok(id)
}

fn require_text(field: &'static str, label: &str, raw: &str) -> CatalogResult<()> {
    if raw.trim().is_empty() {
        return Err(CatalogError::validation(field, format!("{} is required", label)));
    }
    Ok(())
}

/// Run the derived `Validate` rules of an input, reporting the first failing
/// field (by name, nested structs and lists included).
fn validate_input<T: Validate>(input: &T) -> CatalogResult<()> {
    input.validate().map_err(|errors| {
        let (field, message) = first_failure(&errors)
            .unwrap_or_else(|| ("input".into(), "Invalid input".to_string()));
        CatalogError::Validation(ValidationError::new(field, message))
    })
}

fn first_failure(errors: &ValidationErrors) -> Option<(Cow<'static, str>, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields.into_iter().find_map(|(field, kind)| match kind {
        ValidationErrorsKind::Field(failures) => failures.first().map(|failure| {
            let message = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {}", field.replace('_', " ")));
            (field.clone(), message)
        }),
        ValidationErrorsKind::Struct(nested) => first_failure(nested),
        ValidationErrorsKind::List(items) => items.values().find_map(|nested| first_failure(nested)),
    })
}
