//! # Canonical Byte Vectors
//!
//! Fixed byte strings that off-ledger signers (the decryption oracle) must
//! reproduce exactly. If these change, every previously issued attestation
//! stops verifying.

use gt_core::{sha256_hex, Address, CanonicalBytes, EventId, RequestId};

#[test]
fn disclosure_payload_bytes_are_stable() {
    let request_id = RequestId([0x11; 32]);
    let payload = serde_json::json!({
        "domain": "gt-disclosure-v1",
        "request_id": request_id,
        "cleartext": format!("{}01", "00".repeat(31)),
    });
    let cb = CanonicalBytes::new(&payload).unwrap();
    let expected = format!(
        r#"{{"cleartext":"{}01","domain":"gt-disclosure-v1","request_id":"{}"}}"#,
        "00".repeat(31),
        "11".repeat(32)
    );
    assert_eq!(std::str::from_utf8(cb.as_bytes()).unwrap(), expected);
}

#[test]
fn event_id_serializes_as_bare_integer() {
    let cb = CanonicalBytes::new(&serde_json::json!({"event_id": EventId(42)})).unwrap();
    assert_eq!(cb.as_bytes(), br#"{"event_id":42}"#);
}

#[test]
fn label_addresses_are_stable_across_calls() {
    let a1 = Address::from_label("alice").unwrap();
    let a2 = Address::from_label("alice").unwrap();
    assert_eq!(a1, a2);

    let cb = CanonicalBytes::new(&serde_json::json!({"label": "alice"})).unwrap();
    let digest_hex = sha256_hex(&cb);
    // The address is the low 20 bytes of the label digest.
    assert_eq!(a1.to_hex(), format!("0x{}", &digest_hex[24..]));
}
