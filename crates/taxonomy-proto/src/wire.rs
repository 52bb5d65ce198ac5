// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packet framing and CBOR helpers.
//!
//! Packet layout:
//!
//! ``MAGIC(4) || VERSION(2) || FLAGS(2) || LENGTH(4) || PAYLOAD || CHECKSUM(32)``
//!
//! * PAYLOAD is a CBOR [`OpEnvelope`]
//! * CHECKSUM = blake3-256 over HEADER (first 12 bytes) || PAYLOAD

use blake3::Hasher;
use ciborium::value::Value;
use serde::{de::DeserializeOwned, Serialize};

use crate::{ErrorPayload, GetTaxonomyByIdRequest, GetTaxonomyByIdResponse, Message, OpEnvelope};

/// Protocol magic constant "TAX!".
pub const MAGIC: [u8; 4] = [0x54, 0x41, 0x58, 0x21];
/// Wire protocol version (big-endian u16).
pub const VERSION: u16 = 0x0001;
/// Reserved flags (set to zero for v1).
pub const FLAGS: u16 = 0x0000;
/// Header length in bytes.
pub const HEADER_BYTES: usize = 12;
/// Trailing checksum length in bytes.
pub const CHECKSUM_BYTES: usize = 32;
/// Largest payload either side accepts (8 MiB).
pub const MAX_PAYLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Framing or encoding failure.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Fewer bytes than the header announces.
    #[error("incomplete packet")]
    Incomplete,
    /// Packet does not start with [`MAGIC`].
    #[error("bad magic")]
    BadMagic,
    /// Packet version is not [`VERSION`].
    #[error("unsupported version {0:#06x}")]
    UnsupportedVersion(u16),
    /// Checksum does not cover header and payload.
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// Payload exceeds the accepted maximum.
    #[error("payload too large ({len} > {max} bytes)")]
    PayloadTooLarge {
        /// Announced or actual payload length.
        len: usize,
        /// Accepted maximum.
        max: usize,
    },
    /// Envelope names an op this schema does not define.
    #[error("unknown op {0:?}")]
    UnknownOp(String),
    /// CBOR serialization failed.
    #[error("cbor encode: {0}")]
    Encode(String),
    /// CBOR deserialization failed.
    #[error("cbor decode: {0}")]
    Decode(String),
}

/// Encode to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).map_err(|e| WireError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    ciborium::de::from_reader(bytes).map_err(|e| WireError::Decode(e.to_string()))
}

fn checksum(header: &[u8], payload: &[u8]) -> [u8; CHECKSUM_BYTES] {
    let mut hasher = Hasher::new();
    hasher.update(header);
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

/// A full packet (header + payload + checksum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw header (12 bytes).
    pub header: [u8; HEADER_BYTES],
    /// CBOR payload bytes.
    pub payload: Vec<u8>,
    /// blake3 checksum over header||payload.
    pub checksum: [u8; CHECKSUM_BYTES],
}

impl Packet {
    /// Build a packet from a CBOR payload.
    pub fn from_payload(payload: Vec<u8>) -> Result<Self, WireError> {
        let too_large = || WireError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_BYTES,
        };
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(too_large());
        }
        let len = u32::try_from(payload.len()).map_err(|_| too_large())?;

        let mut header = [0u8; HEADER_BYTES];
        header[0..4].copy_from_slice(&MAGIC);
        header[4..6].copy_from_slice(&VERSION.to_be_bytes());
        header[6..8].copy_from_slice(&FLAGS.to_be_bytes());
        header[8..12].copy_from_slice(&len.to_be_bytes());
        let checksum = checksum(&header, &payload);

        Ok(Packet {
            header,
            payload,
            checksum,
        })
    }

    /// Concatenate header, payload and checksum.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_BYTES + self.payload.len() + CHECKSUM_BYTES);
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.checksum);
        out
    }

    /// Encode an `OpEnvelope` into a full packet byte vector.
    pub fn encode_envelope<P: Serialize>(env: &OpEnvelope<P>) -> Result<Vec<u8>, WireError> {
        let payload = to_cbor(env)?;
        Ok(Packet::from_payload(payload)?.into_bytes())
    }

    /// Decode a packet from a byte slice, returning the envelope and bytes consumed.
    pub fn decode_envelope<P: DeserializeOwned>(
        bytes: &[u8],
    ) -> Result<(OpEnvelope<P>, usize), WireError> {
        let Some(frame_len) = try_frame_len(bytes, MAX_PAYLOAD_BYTES)? else {
            return Err(WireError::Incomplete);
        };
        if bytes.len() < frame_len {
            return Err(WireError::Incomplete);
        }
        if bytes[0..4] != MAGIC {
            return Err(WireError::BadMagic);
        }
        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }
        let payload_end = frame_len - CHECKSUM_BYTES;
        let header = &bytes[..HEADER_BYTES];
        let payload = &bytes[HEADER_BYTES..payload_end];
        if checksum(header, payload) != bytes[payload_end..frame_len] {
            return Err(WireError::ChecksumMismatch);
        }

        let env: OpEnvelope<P> = from_cbor(payload)?;
        Ok((env, frame_len))
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, WireError> {
    Value::serialized(value).map_err(|e| WireError::Encode(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, WireError> {
    value
        .deserialized()
        .map_err(|e| WireError::Decode(e.to_string()))
}

/// Encode a `Message` into a packet with the provided request id.
pub fn encode_message(msg: &Message, ts: u64) -> Result<Vec<u8>, WireError> {
    let payload = match msg {
        Message::GetTaxonomyById(p) => to_value(p)?,
        Message::GetTaxonomyByIdResponse(p) => to_value(p)?,
        Message::Error(p) => to_value(p)?,
    };
    let env = OpEnvelope {
        op: msg.op_name().to_string(),
        ts,
        payload,
    };
    Packet::encode_envelope(&env)
}

/// Decode bytes into (Message, ts, bytes_consumed).
pub fn decode_message(bytes: &[u8]) -> Result<(Message, u64, usize), WireError> {
    let (env, used) = Packet::decode_envelope::<Value>(bytes)?;
    let msg = match env.op.as_str() {
        "get_taxonomy_by_id" => {
            Message::GetTaxonomyById(from_value::<GetTaxonomyByIdRequest>(&env.payload)?)
        }
        "get_taxonomy_by_id_response" => {
            Message::GetTaxonomyByIdResponse(from_value::<GetTaxonomyByIdResponse>(&env.payload)?)
        }
        "error" => Message::Error(from_value::<ErrorPayload>(&env.payload)?),
        other => return Err(WireError::UnknownOp(other.to_string())),
    };
    Ok((msg, env.ts, used))
}

/// Total frame length announced by a buffered header, if a full header is
/// present. Rejects payloads larger than `max_payload`.
pub fn try_frame_len(buf: &[u8], max_payload: usize) -> Result<Option<usize>, WireError> {
    if buf.len() < HEADER_BYTES {
        return Ok(None);
    }
    let payload_len = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
    if payload_len > max_payload {
        return Err(WireError::PayloadTooLarge {
            len: payload_len,
            max: max_payload,
        });
    }
    Ok(Some(HEADER_BYTES + payload_len + CHECKSUM_BYTES))
}

/// Drain one complete frame from the front of `acc`, leaving any remainder.
pub fn try_extract_frame(acc: &mut Vec<u8>, max: usize) -> Result<Option<Vec<u8>>, WireError> {
    let Some(frame_len) = try_frame_len(acc, max)? else {
        return Ok(None);
    };
    if acc.len() < frame_len {
        return Ok(None);
    }
    Ok(Some(acc.drain(..frame_len).collect()))
}

// --- Unit tests -----------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taxonomy_model::{Node, TaxonomyTree};

    fn request(id: &str) -> Message {
        Message::GetTaxonomyById(GetTaxonomyByIdRequest {
            taxonomy_id: id.into(),
        })
    }

    #[test]
    fn request_survives_framing_with_its_ts() {
        let pkt = encode_message(&request("1701181887VZ"), 7).unwrap();
        let (msg, ts, used) = decode_message(&pkt).unwrap();
        assert_eq!(msg, request("1701181887VZ"));
        assert_eq!(ts, 7);
        assert_eq!(used, pkt.len());
    }

    #[test]
    fn response_carries_the_full_tree() {
        let mut tree = TaxonomyTree::placeholder("t1", "Curriculum");
        tree.created_at = 1_701_181_887;
        tree.nodes.insert(
            "n1".into(),
            Node {
                id: "n1".into(),
                name: "Physics".into(),
                node_type: 2,
                description: Some(String::new()),
                ..Node::default()
            },
        );
        let msg = Message::GetTaxonomyByIdResponse(GetTaxonomyByIdResponse::new(Arc::new(tree)));
        let pkt = encode_message(&msg, 1).unwrap();
        let (back, _, _) = decode_message(&pkt).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let mut pkt = encode_message(&request("x"), 0).unwrap();
        let last = pkt.len() - 1;
        pkt[last] ^= 0xff;
        assert!(matches!(
            decode_message(&pkt),
            Err(WireError::ChecksumMismatch)
        ));
    }

    #[test]
    fn bad_magic_and_version_are_rejected() {
        let mut pkt = encode_message(&request("x"), 0).unwrap();
        pkt[0] = b'X';
        assert!(matches!(decode_message(&pkt), Err(WireError::BadMagic)));
        pkt[0] = MAGIC[0];
        pkt[5] = 9;
        assert!(matches!(
            decode_message(&pkt),
            Err(WireError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn truncated_packet_is_incomplete() {
        let pkt = encode_message(&request("x"), 0).unwrap();
        assert!(matches!(
            decode_message(&pkt[..pkt.len() - 1]),
            Err(WireError::Incomplete)
        ));
        assert!(matches!(decode_message(&pkt[..4]), Err(WireError::Incomplete)));
    }

    #[test]
    fn unknown_op_is_rejected() {
        let env = OpEnvelope {
            op: "list_taxonomies".to_string(),
            ts: 3,
            payload: Value::Null,
        };
        let pkt = Packet::encode_envelope(&env).unwrap();
        let err = decode_message(&pkt).unwrap_err();
        assert!(matches!(err, WireError::UnknownOp(op) if op == "list_taxonomies"));
    }

    #[test]
    fn oversized_announcement_is_rejected_before_buffering() {
        let mut header = [0u8; HEADER_BYTES];
        header[8..12].copy_from_slice(&100u32.to_be_bytes());
        let err = try_frame_len(&header, 10).unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { len: 100, max: 10 }));
    }

    #[test]
    fn try_extract_frame_drains_one_frame_and_preserves_remainder() {
        let f1 = encode_message(&request("a"), 1).unwrap();
        let f2 = encode_message(&Message::Error(ErrorPayload::backend("boom")), 2).unwrap();
        let mut acc = [f1.clone(), f2[..5].to_vec()].concat();

        let pkt1 = try_extract_frame(&mut acc, MAX_PAYLOAD_BYTES)
            .unwrap()
            .expect("pkt1");
        assert_eq!(pkt1, f1);
        assert!(try_extract_frame(&mut acc, MAX_PAYLOAD_BYTES)
            .unwrap()
            .is_none());

        acc.extend_from_slice(&f2[5..]);
        let pkt2 = try_extract_frame(&mut acc, MAX_PAYLOAD_BYTES)
            .unwrap()
            .expect("pkt2");
        assert_eq!(pkt2, f2);
        assert!(acc.is_empty());
    }
}
