//! Standard and application JSON-RPC 2.0 error codes.

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// Application error codes.

/// Protocol version mismatch.
pub const VERSION_NOT_SUPPORTED: i64 = -32002;

/// The agent has not been initialized yet (must call `initialize` first).
pub const NOT_INITIALIZED: i64 = -32007;

/// A player action was sent while no player is open.
pub const NO_ACTIVE_VIEW: i64 = -32010;

/// No saved player with the given id.
pub const NOT_TRACKED: i64 = -32011;

/// Unknown metric name.
pub const INVALID_METRIC: i64 = -32012;

/// No player with the given id in the match lineup.
pub const PLAYER_NOT_FOUND: i64 = -32013;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes_in_json_rpc_range() {
        let standard = [
            PARSE_ERROR,
            INVALID_REQUEST,
            METHOD_NOT_FOUND,
            INVALID_PARAMS,
            INTERNAL_ERROR,
        ];
        for code in standard {
            assert!(
                (-32768..=-32000).contains(&code),
                "Standard code {code} should be in -32768..-32000"
            );
        }
    }

    #[test]
    fn application_codes_in_expected_range() {
        let app_codes = [
            VERSION_NOT_SUPPORTED,
            NOT_INITIALIZED,
            NO_ACTIVE_VIEW,
            NOT_TRACKED,
            INVALID_METRIC,
            PLAYER_NOT_FOUND,
        ];
        for code in app_codes {
            assert!(
                (-32099..=-32000).contains(&code),
                "Application code {code} should be in -32099..-32000"
            );
        }
    }
}
