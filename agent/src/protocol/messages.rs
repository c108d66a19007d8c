//! JSON-RPC 2.0 message types.

pub use filemanager_core::protocol::messages::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn deserialize_request() {
        let req: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {"name": "list_directory", "arguments": {"path": "."}},
            "id": 7
        }))
        .unwrap();
        assert_eq!(req.method, "tools/call");
        assert_eq!(req.params["name"], "list_directory");
        assert_eq!(req.id, Some(json!(7)));
        assert!(!req.is_notification());
    }

    #[test]
    fn deserialize_notification_without_params() {
        let req: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(req.params.is_null());
        assert!(req.is_notification());
    }

    #[test]
    fn serialize_success_response() {
        let resp = JsonRpcResponse::new(json!(1), json!({"ok": true}));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["result"]["ok"], true);
        assert_eq!(v["id"], 1);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn serialize_error_response() {
        let resp = JsonRpcErrorResponse::new(json!("abc"), -32601, "Method not found");
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["error"]["code"], -32601);
        assert_eq!(v["error"]["message"], "Method not found");
        assert_eq!(v["id"], "abc");
        assert!(v["error"].get("data").is_none());
    }

    #[test]
    fn null_id_is_a_request_not_a_notification() {
        let req: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "ping",
            "id": null
        }))
        .unwrap();
        assert_eq!(req.id, Some(Value::Null));
        assert!(!req.is_notification());
    }
}
