use pnger::{decode_file, encode_file, legacy, DecodeOptions, EncodeOptions, Error};
use std::fs;
use tempfile::tempdir;

#[test]
fn file_round_trip() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("test.bin");
    let png = dir.path().join("output.png");
    let recovered = dir.path().join("extracted.bin");

    let content: Vec<u8> = (0..128u8).rev().collect();
    fs::write(&original, &content).unwrap();

    let dims = encode_file(&original, &png, &EncodeOptions::default()).unwrap();
    assert!(dims.canvas_len() >= content.len());

    let len = decode_file(&png, &recovered, &DecodeOptions::default()).unwrap();
    assert_eq!(len, content.len());
    assert_eq!(fs::read(&recovered).unwrap(), content);
}

#[test]
fn empty_file_round_trip() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("empty.txt");
    let png = dir.path().join("output.png");
    let recovered = dir.path().join("extracted.txt");
    fs::write(&original, b"").unwrap();

    encode_file(&original, &png, &EncodeOptions::default()).unwrap();
    decode_file(&png, &recovered, &DecodeOptions::default()).unwrap();

    assert_eq!(fs::metadata(&recovered).unwrap().len(), 0);
}

#[test]
fn existing_output_is_replaced() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("in.txt");
    let png = dir.path().join("out.png");
    fs::write(&original, b"new").unwrap();
    fs::write(&png, b"stale").unwrap();

    encode_file(&original, &png, &EncodeOptions::default()).unwrap();
    assert_eq!(
        pnger::decode(&fs::read(&png).unwrap(), &DecodeOptions::default()).unwrap(),
        b"new"
    );
}

#[test]
fn missing_input_is_an_input_error() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.png");

    match encode_file(dir.path().join("missing"), &out, &EncodeOptions::default()) {
        Err(Error::InputRead { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!out.exists());
}

#[test]
fn unwritable_output_is_an_output_error() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("in.txt");
    fs::write(&original, b"data").unwrap();
    let out = dir.path().join("no such dir").join("out.png");

    match encode_file(&original, &out, &EncodeOptions::default()) {
        Err(Error::OutputWrite { path, .. }) => assert_eq!(path, out),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn failed_decode_leaves_output_untouched() {
    let dir = tempdir().unwrap();
    let not_png = dir.path().join("small.png");
    let out = dir.path().join("out.bin");
    fs::write(&not_png, b"small").unwrap();
    fs::write(&out, b"keep me").unwrap();

    match decode_file(&not_png, &out, &DecodeOptions::default()) {
        Err(Error::BadSignature { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(fs::read(&out).unwrap(), b"keep me");
}

#[test]
fn legacy_file_extraction() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.png");
    let out = dir.path().join("old.txt");

    let mut bytes = include_bytes!("fixtures/original_header.png").to_vec();
    bytes.extend_from_slice(b"hidden the old way");
    fs::write(&old, &bytes).unwrap();

    let len = legacy::decode_file(&old, &out, &DecodeOptions::default()).unwrap();
    assert_eq!(len, 18);
    assert_eq!(fs::read(&out).unwrap(), b"hidden the old way");
}
