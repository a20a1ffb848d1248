// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

/// Exercises the query-param folding behavior of the metrics middleware's
/// route-label fallback, enabled via XCM_MONITOR_METRICS_INCLUDE_QUERYPARAMS.
#[cfg(test)]
mod tests {
    #[test]
    fn test_normalize_route_without_query_params() {
        let result = normalize_route("/v1/health", None, false);
        assert_eq!(result, "/v1/health");
    }

    #[test]
    fn test_normalize_route_with_query_params_disabled() {
        let result = normalize_route("/v1/health", Some("verbose=true"), false);
        assert_eq!(result, "/v1/health");
    }

    #[test]
    fn test_normalize_route_with_query_params_enabled() {
        let result = normalize_route(
            "/v1/health",
            Some("finalized=true&eventDocs=false"),
            true,
        );
        assert_eq!(result, "/v1/health?eventDocs=<?>&finalized=<?>");
    }

    #[test]
    fn test_normalize_route_query_params_alphabetical_sorting() {
        let result = normalize_route("/v1/health", Some("z_param=1&a_param=2&m_param=3"), true);
        assert_eq!(result, "/v1/health?a_param=<?>&m_param=<?>&z_param=<?>");
    }

    #[test]
    fn test_normalize_route_empty_query_string() {
        let result = normalize_route("/v1/health", Some(""), true);
        assert_eq!(result, "/v1/health");
    }

    #[test]
    fn test_normalize_route_single_param() {
        let result = normalize_route("/v1/health", Some("verbose=true"), true);
        assert_eq!(result, "/v1/health?verbose=<?>");
    }

    // Mirrors the private helper in `metrics::middleware` so the folding
    // behavior can be exercised without exposing it outside the crate.
    fn normalize_route(path: &str, query_string: Option<&str>, include_query_params: bool) -> String {
        let mut normalized = path.to_string();

        if include_query_params
            && let Some(query) = query_string
            && !query.is_empty()
        {
            let mut params: Vec<String> = query
                .split('&')
                .filter_map(|pair| pair.split('=').next().map(|name| name.to_string()))
                .collect();
            params.sort();

            let query_params = params
                .iter()
                .map(|name| format!("{}=<?>", name))
                .collect::<Vec<_>>()
                .join("&");

            normalized = format!("{}?{}", normalized, query_params);
        }

        normalized
    }
}
