//! # Codec Properties
//!
//! Envelope encoding and suffix parsing over generated inputs.

#[cfg(test)]
mod tests {
    use embedlink_router::{split_type, Envelope, EnvelopeKind};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn payload() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            ".{0,16}".prop_map(Value::from),
            (any::<i32>(), ".{0,8}").prop_map(|(n, s)| json!({"n": n, "s": s, "list": [n, s]})),
        ]
    }

    fn kind() -> impl Strategy<Value = EnvelopeKind> {
        prop_oneof![
            Just(EnvelopeKind::Command),
            Just(EnvelopeKind::Success),
            Just(EnvelopeKind::Failure),
        ]
    }

    proptest! {
        #[test]
        fn envelope_round_trips(
            message_type in "[A-Z][A-Z_]{0,15}",
            uid in "[0-9]{1,6}",
            payload in payload(),
        ) {
            let envelope = Envelope::new(message_type, uid, payload);
            let decoded = Envelope::decode(&envelope.encode().unwrap()).unwrap();
            prop_assert_eq!(decoded, envelope);
        }

        #[test]
        fn suffix_split_recovers_base(base in "[A-Z][A-Z0-9]{0,7}(_[A-Z0-9]{1,6}){0,3}", kind in kind()) {
            // A bare base that already ends in a suffix is itself a response type
            prop_assume!(kind != EnvelopeKind::Command || split_type(&base).1 == EnvelopeKind::Command);

            let wire = format!("{}{}", base, kind.suffix());
            prop_assert_eq!(split_type(&wire), (base.as_str(), kind));
        }

        #[test]
        fn decode_never_panics(text in ".{0,64}") {
            let _ = Envelope::decode(&text);
        }
    }

    #[test]
    fn test_split_examples() {
        assert_eq!(split_type("FOO"), ("FOO", EnvelopeKind::Command));
        assert_eq!(split_type("FOO_OK"), ("FOO", EnvelopeKind::Success));
        assert_eq!(split_type("FOO_FAILED"), ("FOO", EnvelopeKind::Failure));
        assert_eq!(split_type("FOO_BAR_OK"), ("FOO_BAR", EnvelopeKind::Success));
    }
}
