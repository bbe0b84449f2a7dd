//! Property tests for the bus codec and RPC descriptor parsing.
//!
//! The codec faces bytes from other modules' firmware; whatever arrives,
//! decoding must either produce a valid message or a typed protocol error,
//! never a panic.

use busgate::bus::codec::{
    ApiType, EdisonMessage, FrameType, Message, MessageType, ModuleAddress, ProcessingMessage,
    MAX_PAYLOAD,
};
use busgate::rpc::RpcDescriptor;
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = ModuleAddress> {
    prop_oneof![
        Just(ModuleAddress::Controller),
        Just(ModuleAddress::Storage),
        Just(ModuleAddress::Radio),
        Just(ModuleAddress::Gateway),
    ]
}

fn arb_frame_type() -> impl Strategy<Value = FrameType> {
    prop_oneof![
        Just(FrameType::Notification),
        Just(FrameType::Command),
        Just(FrameType::Response),
        Just(FrameType::Error),
    ]
}

fn arb_message_type() -> impl Strategy<Value = MessageType> {
    prop_oneof![
        Just(MessageType::Edison(EdisonMessage::ReadHandle)),
        Just(MessageType::Edison(EdisonMessage::ReadRpc)),
        Just(MessageType::Processing(ProcessingMessage::RpcReadPrepare)),
        Just(MessageType::Processing(ProcessingMessage::RpcResponseReady)),
    ]
}

proptest! {
    /// decode(encode(m)) == m for every constructible message.
    #[test]
    fn codec_round_trip(
        source in arb_address(),
        dest in arb_address(),
        frame_type in arb_frame_type(),
        message_type in arb_message_type(),
        payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD),
    ) {
        let m = Message::new(source, dest, frame_type, message_type, &payload).unwrap();
        let decoded = Message::decode(&m.encode()).unwrap();
        prop_assert_eq!(decoded, m);
    }

    /// The payload bound is a hard cutoff at 255 bytes.
    #[test]
    fn payload_bound(len in 0usize..=600) {
        let payload = vec![0u8; len];
        let result = Message::new(
            ModuleAddress::Gateway,
            ModuleAddress::Storage,
            FrameType::Notification,
            MessageType::Edison(EdisonMessage::ReadRpc),
            &payload,
        );
        if len <= MAX_PAYLOAD {
            prop_assert_eq!(result.unwrap().payload().len(), len);
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Arbitrary byte soup never panics the decoder.
    #[test]
    fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..=300)) {
        let _ = Message::decode(&bytes);
    }

    /// The api/tag pairing survives the wire: whatever decodes is
    /// internally consistent.
    #[test]
    fn decoded_message_type_matches_category(
        bytes in proptest::collection::vec(any::<u8>(), 6..=40),
    ) {
        if let Ok(m) = Message::decode(&bytes) {
            let api = m.api_type();
            prop_assert!(MessageType::from_tag(api, m.message_type.tag()).is_ok());
            prop_assert!(matches!(api, ApiType::Edison | ApiType::Processing));
        }
    }

    /// Descriptor parsing never panics on arbitrary payloads.
    #[test]
    fn descriptor_parse_never_panics(payload in proptest::collection::vec(any::<u8>(), 0..=255)) {
        let _ = RpcDescriptor::parse(&payload);
    }

    /// encode → parse restores the descriptor for separator-free argv.
    #[test]
    fn descriptor_round_trip(
        owning_user in any::<u8>(),
        argv in proptest::collection::vec("[a-zA-Z0-9/_.-]{1,12}", 0..=6),
    ) {
        let d = RpcDescriptor { owning_user, argv };
        let parsed = RpcDescriptor::parse(&d.encode().unwrap()).unwrap();
        prop_assert_eq!(parsed, d);
    }
}
