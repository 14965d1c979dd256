#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    use crate::canonical;
    use crate::envelope::MessageEnvelope;
    use crate::keys::{decode_signing_key, encode_hex};
    use crate::signer::Signer;

    fn signer_from_seed(seed: [u8; 32]) -> (Signer, String) {
        let mut signer = Signer::new();
        let public_key = signer.load_identity(&encode_hex(&seed)).unwrap();
        (signer, public_key)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Determinism: insertion order of payload maps never changes the bytes
        #[test]
        fn test_canonical_determinism(
            entries in prop::collection::btree_map("[a-zA-Z0-9_]{1,8}", any::<i64>(), 0..16)
        ) {
            let mut forward = Map::new();
            for (k, v) in entries.iter() {
                forward.insert(k.clone(), json!(v));
            }
            let mut backward = Map::new();
            for (k, v) in entries.iter().rev() {
                backward.insert(k.clone(), json!({"inner": v, "key": k}));
            }
            let mut backward_plain = Map::new();
            for (k, v) in entries.iter().rev() {
                backward_plain.insert(k.clone(), json!(v));
            }

            let a = canonical::to_vec(&Value::Object(forward)).unwrap();
            let b = canonical::to_vec(&Value::Object(backward_plain)).unwrap();
            prop_assert_eq!(&a, &b);

            // encoding twice is stable
            let c = canonical::to_vec(&Value::Object(backward.clone())).unwrap();
            let d = canonical::to_vec(&Value::Object(backward)).unwrap();
            prop_assert_eq!(c, d);
        }

        // Signature validity for any message content
        #[test]
        fn test_signature_round_trip(
            seed in any::<[u8; 32]>(),
            msg_type in "[a-z]{1,12}",
            from in ".{0,24}",
            to in ".{0,24}",
            text in ".{0,64}",
            reply_to in proptest::option::of("[a-f0-9]{8}"),
            timestamp in any::<i64>(),
        ) {
            let (signer, public_key) = signer_from_seed(seed);
            let signed = signer
                .build_and_sign(&msg_type, &from, &to, &json!({"text": text}), reply_to.as_deref(), timestamp)
                .unwrap();
            prop_assert!(signed.verify(&public_key).is_ok());
        }

        // Tamper detection: changing any single content field breaks the signature
        #[test]
        fn test_tamper_detection(
            seed in any::<[u8; 32]>(),
            text in "[a-z]{1,16}",
            timestamp in 0i64..4_000_000_000_000,
            field in 0usize..6,
        ) {
            let (signer, public_key) = signer_from_seed(seed);
            let signed = signer
                .build_and_sign("text", "agent-A", "agent-B", &json!({"text": text}), None, timestamp)
                .unwrap();

            let mut tampered = signed.clone();
            match field {
                0 => tampered.envelope.message_type.push('x'),
                1 => tampered.envelope.from.push('x'),
                2 => tampered.envelope.to.push('x'),
                3 => tampered.envelope.payload = json!({"text": format!("{text}!")}),
                4 => tampered.envelope.reply_to = Some("forged".to_string()),
                _ => tampered.envelope.timestamp = timestamp + 1,
            }
            prop_assert!(tampered.verify(&public_key).is_err());
        }

        // Round-trip key encoding
        #[test]
        fn test_key_hex_round_trip(seed in any::<[u8; 32]>()) {
            let encoded = encode_hex(&seed);
            let decoded = decode_signing_key(&encoded).unwrap();
            prop_assert_eq!(decoded.to_bytes(), seed);
        }

        // The signature never feeds back into the signed bytes
        #[test]
        fn test_signature_excluded_from_content(
            seed in any::<[u8; 32]>(),
            forged in any::<[u8; 32]>(),
        ) {
            let (signer, _) = signer_from_seed(seed);
            let signed = signer
                .build_and_sign("ping", "a", "b", &json!({}), None, 1)
                .unwrap();
            let envelope: MessageEnvelope = signed.clone().into_envelope();

            let mut other = signed.clone();
            other.signature = encode_hex(&forged);
            prop_assert_eq!(other.content_bytes().unwrap(), envelope.canonical_bytes().unwrap());
        }
    }
}
