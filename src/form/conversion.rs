use super::FormDefinition;
use crate::error::FormConversionError;

/// A trait for custom form formats that can be converted into a `FormDefinition`.
///
/// Implement this on the structs your authoring tool produces to feed them to
/// the engine without going through the built-in JSON shape.
///
/// # Example
///
/// ```rust,no_run
/// use kakunin::prelude::*;
/// use kakunin::error::FormConversionError;
///
/// struct Question { key: String, mandatory: bool }
/// struct Survey { questions: Vec<Question> }
///
/// impl IntoForm for Survey {
///     fn into_form(self) -> std::result::Result<FormDefinition, FormConversionError> {
///         let fields = self
///             .questions
///             .into_iter()
///             .map(|q| {
///                 let field = FieldDefinition::new(&q.key, FieldType::Text);
///                 if q.mandatory { field.required() } else { field }
///             })
///             .collect();
///         Ok(FormDefinition { fields, ..Default::default() })
///     }
/// }
/// ```
pub trait IntoForm {
    /// Consumes the object and converts it into a form definition.
    fn into_form(self) -> Result<FormDefinition, FormConversionError>;
}

impl IntoForm for FormDefinition {
    fn into_form(self) -> Result<FormDefinition, FormConversionError> {
        Ok(self)
    }
}
