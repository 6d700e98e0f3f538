//! Cancel endpoint handler
//!
//! Transport-agnostic: the host's HTTP layer hands the raw JSON body in and
//! serializes the typed response back out.

use crate::registry::CancelRegistry;
use crate::types::{CancelRequest, CancelResponse};

/// Handle a cancel request against the shared registry.
///
/// A missing or blank `job_id` maps to a `bad_request` response; otherwise
/// the result is `cancelled` or `not_found` depending on whether a transfer
/// with that id was in flight.
pub fn handle_cancel_request(registry: &CancelRegistry, body: &str) -> CancelResponse {
    let request: CancelRequest = match serde_json::from_str(body) {
        Ok(req) => req,
        Err(e) => {
            return CancelResponse {
                status: "bad_request".to_string(),
                job_id: None,
                error: Some(format!("invalid request body: {}", e)),
            }
        }
    };

    let job_id = match request.job_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return CancelResponse {
                status: "bad_request".to_string(),
                job_id: None,
                error: Some("job_id required".to_string()),
            }
        }
    };

    let status = if registry.cancel(&job_id) {
        "cancelled"
    } else {
        "not_found"
    };

    CancelResponse {
        status: status.to_string(),
        job_id: Some(job_id),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::handle_cancel_request;
    use crate::registry::CancelRegistry;

    #[test]
    fn cancel_of_active_job_reports_cancelled() {
        let registry = CancelRegistry::new();
        registry.register("42");

        let response = handle_cancel_request(&registry, r#"{"job_id": "42"}"#);
        assert_eq!(response.status, "cancelled");
        assert_eq!(response.job_id.as_deref(), Some("42"));
    }

    #[test]
    fn cancel_of_unknown_job_reports_not_found() {
        let registry = CancelRegistry::new();

        let response = handle_cancel_request(&registry, r#"{"job_id": "42"}"#);
        assert_eq!(response.status, "not_found");
    }

    #[test]
    fn missing_job_id_is_a_bad_request() {
        let registry = CancelRegistry::new();

        let response = handle_cancel_request(&registry, r#"{}"#);
        assert_eq!(response.status, "bad_request");
        assert!(response.error.is_some());

        let response = handle_cancel_request(&registry, r#"{"job_id": "  "}"#);
        assert_eq!(response.status, "bad_request");
    }

    #[test]
    fn malformed_body_is_a_bad_request() {
        let registry = CancelRegistry::new();

        let response = handle_cancel_request(&registry, "not json");
        assert_eq!(response.status, "bad_request");
    }
}
