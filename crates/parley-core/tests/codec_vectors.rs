//! Wire codec vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::{json, Value};

use parley_core::protocol::codec::{decode, encode};
use parley_core::Envelope;

mod vector_loader;
use vector_loader::load;

#[test]
fn codec_vectors() {
    let files = [
        "envelope_message.json",
        "envelope_progress.json",
        "envelope_exception.json",
        "envelope_terminate.json",
        "envelope_unknown_field.json",
        "envelope_payload_and_progress.json",
        "envelope_missing_seq.json",
        "envelope_not_json.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode(v.frame.as_bytes());

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(env.conversation_id(), ex["conversation_id"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.seq(), ex["seq"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(env.is_exception(), ex["exception"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(env.payload().cloned().unwrap_or(Value::Null), ex["payload"], "vector={}", v.description);
        assert_eq!(env.progress_text(), ex["progress"].as_str(), "vector={}", v.description);
        assert_eq!(env.is_terminate(), ex.get("terminate").and_then(Value::as_bool).unwrap_or(false), "vector={}", v.description);
    }
}

#[test]
fn encode_omits_absent_fields() {
    let raw = encode(&Envelope::progress("C1", 2, "working")).unwrap();
    let v: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(v, json!({ "conversation_id": "C1", "seq": 2, "exception": false, "progress": "working" }));
}

#[test]
fn encoded_exception_decodes_to_same_description() {
    let env = Envelope::exception("C2", 4, "TimeoutException: client gave up");
    let back = decode(&encode(&env).unwrap()).unwrap();
    assert_eq!(back, env);
    assert_eq!(back.exception_description().as_deref(), Some("TimeoutException: client gave up"));
}
