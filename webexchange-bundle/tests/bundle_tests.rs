// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bundle writer/reader integration tests: framing layout, metadata
//! round-trips and the reader's validation paths.

use url::Url;
use webexchange::ResponseHeader;
use webexchange_bundle::{
    load_metadata, read_response, Bundle, BundleError, Exchange, HEADER_MAGIC, SECTION_INDEX,
    SECTION_RESPONSES,
};
use webexchange_cbor::Decoder;

fn example_exchange(path: &str, payload: &[u8]) -> Exchange {
    Exchange::new(
        Url::parse(&format!("https://example.com{path}")).unwrap(),
        Vec::new(),
        200,
        vec![ResponseHeader::new("Content-Type", "text/html; charset=utf-8")],
        payload.to_vec(),
    )
    .unwrap()
}

fn write_bundle(exchanges: Vec<Exchange>) -> Vec<u8> {
    let mut buf = Vec::new();
    let written = Bundle::new(exchanges).write_to(&mut buf).unwrap();
    assert_eq!(written, buf.len() as u64);
    buf
}

#[test]
fn single_exchange_layout() {
    let bytes = write_bundle(vec![example_exchange("/", b"hello")]);

    // Magic.
    assert_eq!(&bytes[..10], &HEADER_MAGIC);

    // Footer: 9 bytes, a CBOR bstr holding the big-endian total size.
    let footer = &bytes[bytes.len() - 9..];
    assert_eq!(footer[0], 0x48);
    let declared = u64::from_be_bytes(footer[1..].try_into().unwrap());
    assert_eq!(declared, bytes.len() as u64);

    let metadata = load_metadata(&bytes).unwrap();

    // index at offset 0, responses immediately after.
    let index = metadata.find_section(SECTION_INDEX).unwrap();
    let responses = metadata.find_section(SECTION_RESPONSES).unwrap();
    assert_eq!(index.offset, 0);
    assert_eq!(responses.offset, index.length);

    // The section-count array header sits between the section-offsets byte
    // string and the first section's contents.
    let header_pos = metadata.sections_start as usize - 1;
    assert_eq!(bytes[header_pos], 0x82);
}

#[test]
fn section_offsets_are_contiguous() {
    let metadata = load_metadata(&write_bundle(vec![
        example_exchange("/", b"index page"),
        example_exchange("/a.js", b"var a;"),
    ]))
    .unwrap();

    let offsets = &metadata.section_offsets;
    assert_eq!(offsets.len(), 2);
    for pair in offsets.windows(2) {
        assert_eq!(pair[0].offset + pair[0].length, pair[1].offset);
    }
}

#[test]
fn index_locates_each_response() {
    let exchanges = vec![
        example_exchange("/", b"index page"),
        example_exchange("/a.js", b"var a;"),
    ];
    let keys: Vec<Vec<u8>> = exchanges.iter().map(|e| e.request_key().unwrap()).collect();
    let bytes = write_bundle(exchanges);

    let metadata = load_metadata(&bytes).unwrap();
    assert_eq!(metadata.index.len(), 2);

    for (key, payload) in keys.iter().zip([&b"index page"[..], b"var a;"]) {
        let entry = metadata.find_response(key).unwrap();
        let response = read_response(&bytes, &metadata, entry).unwrap();
        assert_eq!(response.payload, payload);

        let names: Vec<&[u8]> = response.headers.iter().map(|(n, _)| n.as_slice()).collect();
        assert_eq!(names, [&b":status"[..], b"content-type"]);
        assert_eq!(response.headers[0].1, b"200");
    }
}

#[test]
fn index_entry_ranges_match_response_section_bytes() {
    let exchange = example_exchange("/", b"hello");
    let key = exchange.request_key().unwrap();
    let bytes = write_bundle(vec![exchange]);

    let metadata = load_metadata(&bytes).unwrap();
    let responses = metadata.find_section(SECTION_RESPONSES).unwrap();
    let entry = metadata.find_response(&key).unwrap();

    let start = (metadata.sections_start + responses.offset + entry.offset) as usize;
    let slice = &bytes[start..start + entry.length as usize];

    // The located bytes are a complete [headers, payload] 2-element array.
    let mut d = Decoder::new(slice);
    assert_eq!(d.decode_array_header().unwrap(), 2);
    d.decode_byte_string().unwrap();
    assert_eq!(d.decode_byte_string().unwrap(), b"hello");
    assert_eq!(d.position(), slice.len());
}

#[test]
fn empty_bundle_round_trips() {
    let bytes = write_bundle(Vec::new());
    let metadata = load_metadata(&bytes).unwrap();
    assert!(metadata.index.is_empty());
    assert_eq!(metadata.find_section(SECTION_INDEX).unwrap().length as usize, 1);
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = write_bundle(vec![example_exchange("/", b"hello")]);
    bytes[0] ^= 0xff;
    assert!(matches!(
        load_metadata(&bytes),
        Err(BundleError::MagicMismatch)
    ));

    // Truncated before the magic ends.
    assert!(matches!(
        load_metadata(&HEADER_MAGIC[..6]),
        Err(BundleError::MagicMismatch)
    ));
}

#[test]
fn duplicate_section_is_rejected() {
    // magic + bstr{ "index" => [0, 0], "index" => [0, 0] }
    let mut section_offsets = Vec::new();
    {
        let mut e = webexchange_cbor::Encoder::new(&mut section_offsets);
        e.encode_map(vec![
            webexchange_cbor::MapEntry::new(
                {
                    let mut k = webexchange_cbor::Encoder::new(Vec::new());
                    k.encode_text_string("index").unwrap();
                    k.into_writer()
                },
                {
                    let mut v = webexchange_cbor::Encoder::new(Vec::new());
                    v.encode_array_header(2).unwrap();
                    v.encode_uint(0).unwrap();
                    v.encode_uint(0).unwrap();
                    v.into_writer()
                },
            ),
            webexchange_cbor::MapEntry::new(
                {
                    let mut k = webexchange_cbor::Encoder::new(Vec::new());
                    k.encode_text_string("index").unwrap();
                    k.into_writer()
                },
                {
                    let mut v = webexchange_cbor::Encoder::new(Vec::new());
                    v.encode_array_header(2).unwrap();
                    v.encode_uint(0).unwrap();
                    v.encode_uint(1).unwrap();
                    v.into_writer()
                },
            ),
        ])
        .unwrap();
    }

    let mut bytes = HEADER_MAGIC.to_vec();
    let mut e = webexchange_cbor::Encoder::new(&mut bytes);
    e.encode_byte_string(&section_offsets).unwrap();

    assert!(matches!(
        load_metadata(&bytes),
        Err(BundleError::DuplicateSection { name }) if name == "index"
    ));
}

#[test]
fn out_of_range_index_section_is_rejected() {
    // An index section that claims to extend past the end of the file.
    let mut section_offsets = Vec::new();
    {
        let mut e = webexchange_cbor::Encoder::new(&mut section_offsets);
        e.encode_map(vec![webexchange_cbor::MapEntry::new(
            {
                let mut k = webexchange_cbor::Encoder::new(Vec::new());
                k.encode_text_string("index").unwrap();
                k.into_writer()
            },
            {
                let mut v = webexchange_cbor::Encoder::new(Vec::new());
                v.encode_array_header(2).unwrap();
                v.encode_uint(0).unwrap();
                v.encode_uint(10_000).unwrap();
                v.into_writer()
            },
        )])
        .unwrap();
    }

    let mut bytes = HEADER_MAGIC.to_vec();
    let mut e = webexchange_cbor::Encoder::new(&mut bytes);
    e.encode_byte_string(&section_offsets).unwrap();
    e.encode_array_header(1).unwrap();

    assert!(matches!(
        load_metadata(&bytes),
        Err(BundleError::OffsetOutOfRange { name, .. }) if name == "index"
    ));
}

/// Unknown sections are skipped, not errors.
#[test]
fn unknown_sections_are_ignored() {
    let mut section_offsets = Vec::new();
    {
        let mut e = webexchange_cbor::Encoder::new(&mut section_offsets);
        e.encode_map(vec![webexchange_cbor::MapEntry::new(
            {
                let mut k = webexchange_cbor::Encoder::new(Vec::new());
                k.encode_text_string("critical-metadata").unwrap();
                k.into_writer()
            },
            {
                let mut v = webexchange_cbor::Encoder::new(Vec::new());
                v.encode_array_header(2).unwrap();
                v.encode_uint(0).unwrap();
                v.encode_uint(10_000).unwrap();
                v.into_writer()
            },
        )])
        .unwrap();
    }

    let mut bytes = HEADER_MAGIC.to_vec();
    let mut e = webexchange_cbor::Encoder::new(&mut bytes);
    e.encode_byte_string(&section_offsets).unwrap();
    e.encode_array_header(1).unwrap();

    let metadata = load_metadata(&bytes).unwrap();
    assert_eq!(metadata.section_offsets.len(), 1);
    assert!(metadata.index.is_empty());
}

#[test]
fn request_headers_participate_in_request_key() {
    let plain = example_exchange("/", b"x");
    let with_header = Exchange::new(
        Url::parse("https://example.com/").unwrap(),
        vec![ResponseHeader::new("Accept-Language", "en")],
        200,
        Vec::new(),
        b"x".to_vec(),
    )
    .unwrap();

    let plain_key = plain.request_key().unwrap();
    let header_key = with_header.request_key().unwrap();
    assert_ne!(plain_key, header_key);

    // The header shows up lowercased in the key map.
    let mut d = Decoder::new(&header_key);
    let n = d.decode_map_header().unwrap();
    assert_eq!(n, 3);
    let mut names = Vec::new();
    for _ in 0..n {
        names.push(d.decode_byte_string().unwrap().to_vec());
        d.decode_byte_string().unwrap();
    }
    assert!(names.iter().any(|n| n == b"accept-language"));
}
