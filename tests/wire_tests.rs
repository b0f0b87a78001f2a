//! Codec properties over arbitrary payloads.

use proptest::prelude::*;
use swarmfetch::wire::{self, HEADER_LEN};
use swarmfetch::{ChunkRequest, ChunkResponse, Message, SwarmError};

fn decode_blocking(bytes: &[u8]) -> Result<wire::Frame, SwarmError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut reader = bytes;
    rt.block_on(wire::decode(&mut reader))
}

fn response_strategy() -> impl Strategy<Value = ChunkResponse> {
    (
        "[a-z]{1,12}\\.bin",
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 1..2048),
    )
        .prop_map(|(name, offset, data)| {
            let request = ChunkRequest::new(name, offset as u64, data.len() as u64);
            ChunkResponse::ok(request, data)
        })
}

proptest! {
    #[test]
    fn prop_any_payload_bit_flip_is_detected(
        response in response_strategy(),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let mut frame = wire::encode(&response).unwrap().to_vec();
        let payload_len = frame.len() - HEADER_LEN;
        let target = HEADER_LEN + position.index(payload_len);
        frame[target] ^= mask;

        let result = decode_blocking(&frame);
        prop_assert!(
            matches!(result, Err(SwarmError::Integrity { .. })),
            "tampered byte {} went unnoticed: {:?}",
            target,
            result
        );
    }

    #[test]
    fn prop_unknown_discriminant_rejected(kind in prop_oneof![Just(0u8), 6u8..=255]) {
        let mut frame = wire::encode(&ChunkRequest::new("a", 0, 1)).unwrap().to_vec();
        frame[0] = kind;
        prop_assert!(matches!(decode_blocking(&frame), Err(SwarmError::UnknownType(k)) if k == kind));
    }

    #[test]
    fn prop_untampered_frame_decodes_to_same_message(response in response_strategy()) {
        let frame = wire::encode(&response).unwrap();
        let message = decode_blocking(&frame).unwrap().into_message().unwrap();
        prop_assert_eq!(message, Message::ChunkResponse(response));
    }
}

#[test]
fn test_every_truncation_is_a_disconnect() {
    let frame = wire::encode(&ChunkRequest::new("file.bin", 4096, 1024)).unwrap();
    for cut in 0..frame.len() {
        let result = decode_blocking(&frame[..cut]);
        assert!(
            matches!(result, Err(SwarmError::Disconnected)),
            "cut at {}: {:?}",
            cut,
            result
        );
    }
}
