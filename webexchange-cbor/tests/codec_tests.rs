// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the canonical CBOR codec.
//!
//! Round-trips through our own decoder, canonical-order properties, and
//! differential checks against `minicbor` as an independent implementation.

use webexchange_cbor::{Decoder, Encoder, MapEntry};

fn encode_with<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut Encoder<Vec<u8>>),
{
    let mut e = Encoder::new(Vec::new());
    f(&mut e);
    e.into_writer()
}

#[test]
fn uint_round_trip() {
    for n in [
        0u64,
        1,
        23,
        24,
        255,
        256,
        65535,
        65536,
        u32::MAX as u64,
        u32::MAX as u64 + 1,
        u64::MAX,
    ] {
        let bytes = encode_with(|e| e.encode_uint(n).unwrap());
        let mut d = Decoder::new(&bytes);
        assert_eq!(d.decode_uint().unwrap(), n);
        assert_eq!(d.position(), bytes.len(), "no trailing bytes for {n}");
    }
}

#[test]
fn byte_and_text_string_round_trip() {
    let bytes = encode_with(|e| {
        e.encode_byte_string(b":method").unwrap();
        e.encode_text_string("htxg").unwrap();
        e.encode_byte_string(&[0u8; 300]).unwrap();
    });
    let mut d = Decoder::new(&bytes);
    assert_eq!(d.decode_byte_string().unwrap(), b":method");
    assert_eq!(d.decode_text_string().unwrap(), "htxg");
    assert_eq!(d.decode_byte_string().unwrap(), &[0u8; 300][..]);
    assert_eq!(d.position(), bytes.len());
}

#[test]
fn array_header_round_trip() {
    let bytes = encode_with(|e| {
        e.encode_array_header(7).unwrap();
        for i in 0..7 {
            e.encode_uint(i).unwrap();
        }
    });
    let mut d = Decoder::new(&bytes);
    assert_eq!(d.decode_array_header().unwrap(), 7);
    for i in 0..7 {
        assert_eq!(d.decode_uint().unwrap(), i);
    }
}

/// The same logical map must encode identically regardless of the order
/// entries were staged in, and the emitted keys must be non-decreasing under
/// byte-wise comparison.
#[test]
fn map_encoding_is_insertion_order_independent() {
    let entry = |name: &str, v: u64| {
        MapEntry::encoded(|k, val| {
            k.encode_byte_string(name.as_bytes())?;
            val.encode_uint(v)
        })
        .unwrap()
    };

    let forward = encode_with(|e| {
        e.encode_map(vec![entry("mi", 1), entry(":status", 2), entry("content-type", 3)])
            .unwrap()
    });
    let reverse = encode_with(|e| {
        e.encode_map(vec![entry("content-type", 3), entry(":status", 2), entry("mi", 1)])
            .unwrap()
    });
    assert_eq!(forward, reverse);

    let mut d = Decoder::new(&forward);
    let n = d.decode_map_header().unwrap();
    assert_eq!(n, 3);
    let mut prev: Option<Vec<u8>> = None;
    for _ in 0..n {
        let start = d.position();
        d.decode_byte_string().unwrap();
        let key = forward[start..d.position()].to_vec();
        if let Some(p) = &prev {
            assert!(p < &key, "keys must be strictly increasing");
        }
        prev = Some(key);
        d.decode_uint().unwrap();
    }
}

#[test]
fn minicbor_decodes_our_output() {
    let bytes = encode_with(|e| {
        e.encode_array_header(2).unwrap();
        e.encode_map(vec![
            MapEntry::encoded(|k, v| {
                k.encode_byte_string(b":method")?;
                v.encode_byte_string(b"GET")
            })
            .unwrap(),
            MapEntry::encoded(|k, v| {
                k.encode_byte_string(b":url")?;
                v.encode_byte_string(b"https://example.com/")
            })
            .unwrap(),
        ])
        .unwrap();
        e.encode_uint(1517418800).unwrap();
    });

    let mut d = minicbor::Decoder::new(&bytes);
    assert_eq!(d.array().unwrap(), Some(2));
    assert_eq!(d.map().unwrap(), Some(2));
    assert_eq!(d.bytes().unwrap(), b":method");
    assert_eq!(d.bytes().unwrap(), b"GET");
    assert_eq!(d.bytes().unwrap(), b":url");
    assert_eq!(d.bytes().unwrap(), b"https://example.com/");
    assert_eq!(d.u64().unwrap(), 1517418800);
    assert_eq!(d.position(), bytes.len());
}

#[test]
fn we_decode_minicbor_output() {
    let mut enc = minicbor::Encoder::new(Vec::new());
    enc.array(3).unwrap();
    enc.u64(65536).unwrap();
    enc.str("index").unwrap();
    enc.bytes(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
    let bytes = enc.into_writer();

    let mut d = Decoder::new(&bytes);
    assert_eq!(d.decode_array_header().unwrap(), 3);
    assert_eq!(d.decode_uint().unwrap(), 65536);
    assert_eq!(d.decode_text_string().unwrap(), "index");
    assert_eq!(d.decode_byte_string().unwrap(), &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(d.position(), bytes.len());
}

/// minicbor writes shortest-form headers as well; the two encoders must
/// agree byte-for-byte on the shared subset.
#[test]
fn header_encodings_match_minicbor() {
    for n in [0u64, 23, 24, 255, 256, 65535, 65536, u32::MAX as u64, u32::MAX as u64 + 1] {
        let ours = encode_with(|e| e.encode_uint(n).unwrap());
        let mut enc = minicbor::Encoder::new(Vec::new());
        enc.u64(n).unwrap();
        assert_eq!(ours, enc.into_writer(), "encoding of {n}");
    }
}
