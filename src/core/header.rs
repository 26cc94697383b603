use std::collections::HashMap;

/// Inspects the header list of a CSV stream before any row is processed.
///
/// An empty result means the headers are accepted. Any message returned
/// aborts the whole run with [`crate::CsvError::HeaderValidation`].
///
/// # Examples
///
/// ```
/// use smart_csv_rs::core::header::HeaderValidator;
///
/// struct LowercaseHeaders;
///
/// impl HeaderValidator for LowercaseHeaders {
///     fn validate_headers(&self, headers: &[String]) -> Vec<String> {
///         headers
///             .iter()
///             .filter(|header| header.chars().any(char::is_uppercase))
///             .map(|header| format!("Header '{}' must be lowercase", header))
///             .collect()
///     }
/// }
///
/// let headers = vec!["id".to_string(), "Name".to_string()];
/// assert_eq!(
///     LowercaseHeaders.validate_headers(&headers),
///     vec!["Header 'Name' must be lowercase".to_string()]
/// );
/// ```
pub trait HeaderValidator {
    /// Validates the CSV headers.
    ///
    /// # Parameters
    /// - `headers`: header names in physical column order
    ///
    /// # Returns
    /// One message per problem found, empty when the headers are acceptable
    fn validate_headers(&self, headers: &[String]) -> Vec<String>;
}

impl<F> HeaderValidator for F
where
    F: Fn(&[String]) -> Vec<String>,
{
    fn validate_headers(&self, headers: &[String]) -> Vec<String> {
        self(headers)
    }
}

/// Accepts every header list.
#[derive(Default, Debug, Clone, Copy)]
pub struct DefaultHeaderValidator;

impl HeaderValidator for DefaultHeaderValidator {
    fn validate_headers(&self, _headers: &[String]) -> Vec<String> {
        Vec::new()
    }
}

/// Rejects header lists missing one of the configured columns.
#[derive(Debug, Clone)]
pub struct RequiredHeadersValidator {
    required: Vec<String>,
}

impl RequiredHeadersValidator {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl HeaderValidator for RequiredHeadersValidator {
    fn validate_headers(&self, headers: &[String]) -> Vec<String> {
        self.required
            .iter()
            .filter(|name| !headers.contains(name))
            .map(|name| format!("Missing required header '{}'", name))
            .collect()
    }
}

/// Rejects header lists where a column name occurs more than once.
///
/// Rows are keyed by column name, so a duplicated header silently keeps only
/// the last column's value. Plug this validator in to refuse such files.
#[derive(Default, Debug, Clone, Copy)]
pub struct UniqueHeadersValidator;

impl HeaderValidator for UniqueHeadersValidator {
    fn validate_headers(&self, headers: &[String]) -> Vec<String> {
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for header in headers {
            *occurrences.entry(header.as_str()).or_default() += 1;
        }

        let mut errors = Vec::new();
        for header in headers {
            // Report each duplicate once, at its first occurrence
            if let Some(count) = occurrences.remove(header.as_str()) {
                if count > 1 {
                    errors.push(format!("Duplicate header '{}'", header));
                }
            }
        }
        errors
    }
}
