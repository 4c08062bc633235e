//! AWS SDK error categorization for per-region failure logs.
//!
//! A failing region is reported as one log line. The category lets an
//! operator tell a throttled region from a missing permission without
//! reading the full SDK error chain. Categorization never drives retries:
//! the engine makes exactly one attempt per region.

/// Categorized error types for AWS SDK errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request was throttled due to rate limiting
    Throttled { error_code: String },
    /// Request timed out at the HTTP layer
    Timeout,
    /// Network connectivity issues (DNS, refused connection, dispatch failure)
    NetworkError,
    /// AWS service temporarily unavailable
    ServiceUnavailable,
    /// Anything else (permissions, validation, opt-in regions, ...)
    NonRetryable {
        code: String,
        is_permission_error: bool,
    },
}

impl ErrorCategory {
    /// Short label for log lines
    pub fn short_label(&self) -> &'static str {
        match self {
            ErrorCategory::Throttled { .. } => "throttled",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::NetworkError => "network",
            ErrorCategory::ServiceUnavailable => "unavailable",
            ErrorCategory::NonRetryable {
                is_permission_error: true,
                ..
            } => "permission",
            ErrorCategory::NonRetryable { .. } => "error",
        }
    }

    /// AWS error code, when one was found in the error text
    pub fn code(&self) -> Option<&str> {
        match self {
            ErrorCategory::Throttled { error_code } => Some(error_code.as_str()),
            ErrorCategory::NonRetryable { code, .. } if code != "Error" => Some(code.as_str()),
            _ => None,
        }
    }

    /// `label` or `label/Code` for the per-region failure line
    pub fn log_tag(&self) -> String {
        match self.code() {
            Some(code) => format!("{}/{}", self.short_label(), code),
            None => self.short_label().to_string(),
        }
    }
}

/// Categorize an error returned by a region query.
///
/// SDK errors display as a terse "service error"; the debug form carries the
/// error code, so both are inspected.
pub fn categorize_error(error: &anyhow::Error) -> ErrorCategory {
    let detail = format!("{:#} {:?}", error, error);
    categorize_error_string(&detail)
}

/// Categorize an error based on its string representation
pub fn categorize_error_string(error_str: &str) -> ErrorCategory {
    if error_str.contains("ThrottlingException")
        || error_str.contains("Throttling")
        || error_str.contains("TooManyRequestsException")
        || error_str.contains("RequestLimitExceeded")
        || error_str.contains("RateExceeded")
    {
        let error_code = extract_error_code(error_str).unwrap_or_else(|| "Throttling".to_string());
        return ErrorCategory::Throttled { error_code };
    }

    if error_str.contains("TimeoutError")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
    {
        return ErrorCategory::Timeout;
    }

    if error_str.contains("DispatchFailure")
        || error_str.contains("connection")
        || error_str.contains("Connection")
        || error_str.contains("dns error")
        || error_str.contains("DNS")
    {
        return ErrorCategory::NetworkError;
    }

    if error_str.contains("ServiceUnavailable")
        || error_str.contains("InternalServerError")
        || error_str.contains("InternalFailure")
        || error_str.contains("InternalError")
    {
        return ErrorCategory::ServiceUnavailable;
    }

    let is_permission_error = error_str.contains("AccessDenied")
        || error_str.contains("UnauthorizedOperation")
        || error_str.contains("AuthFailure")
        || error_str.contains("UnrecognizedClientException")
        || error_str.contains("InvalidClientTokenId")
        || error_str.contains("ExpiredToken")
        || error_str.contains("SignatureDoesNotMatch");

    let code = extract_error_code(error_str).unwrap_or_else(|| {
        if is_permission_error {
            "AccessDenied".to_string()
        } else {
            "Error".to_string()
        }
    });

    ErrorCategory::NonRetryable {
        code,
        is_permission_error,
    }
}

/// Extract AWS error code from error message if present
fn extract_error_code(error_str: &str) -> Option<String> {
    // Debug output of SDK errors: code: Some("AccessDeniedException")
    if let Some(start) = error_str.find("code: Some(\"") {
        let after = &error_str[start + "code: Some(\"".len()..];
        if let Some(end) = after.find('"') {
            let code = &after[..end];
            if !code.is_empty() && code.len() < 64 {
                return Some(code.to_string());
            }
        }
    }

    // Leading "ErrorName: message"
    if let Some(pos) = error_str.find(':') {
        let prefix = error_str[..pos].trim();
        if (prefix.ends_with("Exception") || prefix.ends_with("Error"))
            && !prefix.contains(' ')
            && prefix.len() < 64
        {
            return Some(prefix.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_throttling() {
        let cat = categorize_error_string("ThrottlingException: Rate exceeded");
        assert_eq!(
            cat,
            ErrorCategory::Throttled {
                error_code: "ThrottlingException".to_string()
            }
        );
        assert_eq!(cat.short_label(), "throttled");
        assert_eq!(cat.log_tag(), "throttled/ThrottlingException");
    }

    #[test]
    fn test_categorize_timeout() {
        let cat = categorize_error_string("TimeoutError: request timed out after 30s");
        assert_eq!(cat, ErrorCategory::Timeout);
    }

    #[test]
    fn test_categorize_network_error() {
        let cat = categorize_error_string("dispatch failure: DispatchFailure(connection refused)");
        assert_eq!(cat, ErrorCategory::NetworkError);
        assert_eq!(cat.code(), None);
        assert_eq!(cat.log_tag(), "network");
    }

    #[test]
    fn test_categorize_service_unavailable() {
        let cat = categorize_error_string("ServiceUnavailable: try again later");
        assert_eq!(cat, ErrorCategory::ServiceUnavailable);
    }

    #[test]
    fn test_categorize_access_denied_from_debug_output() {
        let cat = categorize_error_string(
            "service error ServiceError { code: Some(\"AccessDeniedException\"), message: None }",
        );
        assert_eq!(
            cat,
            ErrorCategory::NonRetryable {
                code: "AccessDeniedException".to_string(),
                is_permission_error: true,
            }
        );
        assert_eq!(cat.code(), Some("AccessDeniedException"));
        assert_eq!(cat.log_tag(), "permission/AccessDeniedException");
    }

    #[test]
    fn test_categorize_generic_error() {
        let cat = categorize_error_string("ValidationException: Invalid parameter");
        assert_eq!(
            cat,
            ErrorCategory::NonRetryable {
                code: "ValidationException".to_string(),
                is_permission_error: false,
            }
        );
        assert_eq!(cat.log_tag(), "error/ValidationException");
        assert_eq!(categorize_error_string("something odd").log_tag(), "error");
    }

    #[test]
    fn test_categorize_anyhow_chain() {
        let err = anyhow::anyhow!("AuthFailure: AWS was not able to validate the credentials")
            .context("DescribeInstances failed");
        let cat = categorize_error(&err);
        assert!(matches!(
            cat,
            ErrorCategory::NonRetryable {
                is_permission_error: true,
                ..
            }
        ));
    }
}
