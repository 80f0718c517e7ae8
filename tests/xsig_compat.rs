//! XSig wire compatibility tests
//!
//! These tests pin the exact bytes a control processor expects for each frame
//! type, including the index split across the first two bytes and the analog
//! value split across three.

use xsig_link::protocol::xsig::{self, Signal, SignalKind};
use xsig_link::CommError;

/// Digital frames carry the "off" flag in bit 5 of the first byte
#[test]
fn test_digital_frames() {
    assert_eq!(&xsig::encode_digital(1, true).unwrap()[..], &[0x80, 0x00]);
    assert_eq!(&xsig::encode_digital(128, true).unwrap()[..], &[0x81, 0x7F]);
    assert_eq!(&xsig::encode_digital(129, false).unwrap()[..], &[0xA1, 0x00]);
    assert_eq!(&xsig::encode_digital(4095, false).unwrap()[..], &[0xBF, 0x7E]);
}

/// Analog frames: top two value bits in the header, then 7 + 7 bits
#[test]
fn test_analog_frames() {
    assert_eq!(
        &xsig::encode_analog(200, 1000).unwrap()[..],
        &[0xC1, 0x47, 0x07, 0x68]
    );
    assert_eq!(
        &xsig::encode_analog(1, 0xFFFF).unwrap()[..],
        &[0xF0, 0x00, 0x7F, 0x7F]
    );
    assert_eq!(
        &xsig::encode_analog(1023, 0x8001).unwrap()[..],
        &[0xE7, 0x7E, 0x00, 0x01]
    );
}

/// Serial frames: header, address, one byte per character, 0xFF terminator
#[test]
fn test_serial_frames() {
    assert_eq!(
        &xsig::encode_serial(5, "Hi\r").unwrap()[..],
        &[0xC8, 0x04, b'H', b'i', 0x0D, 0xFF]
    );
    // U+20AC has no single-byte form
    assert_eq!(
        &xsig::encode_serial(300, "\u{e9}\u{20ac}").unwrap()[..],
        &[0xCA, 0x2B, 0xE9, b'?', 0xFF]
    );
    assert_eq!(&xsig::encode_serial(1, "").unwrap()[..], &[0xC8, 0x00, 0xFF]);
}

#[test]
fn test_control_frames() {
    assert_eq!(&xsig::clear_outputs()[..], &[0xFC]);
    assert_eq!(&xsig::send_status()[..], &[0xFD]);
}

/// Batches are plain concatenations of consecutive single frames
#[test]
fn test_batches_concatenate_frames() {
    let batch = xsig::encode_digitals(127, &[true, false]).unwrap();
    assert_eq!(&batch[..], &[0x80, 0x7E, 0xA1, 0x7F]);

    let serials = xsig::encode_serials(1, &["a", "bc"]).unwrap();
    assert_eq!(&serials[..], &[0xC8, 0x00, b'a', 0xFF, 0xC8, 0x01, b'b', b'c', 0xFF]);

    let mut expected = Vec::new();
    for (i, v) in [10u16, 20, 30].iter().enumerate() {
        expected.extend_from_slice(&xsig::encode_analog(40 + i as i32, *v).unwrap());
    }
    assert_eq!(&xsig::encode_analogs(40, &[10, 20, 30]).unwrap()[..], &expected[..]);
}

#[test]
fn test_out_of_range_batch_is_rejected_whole() {
    let err = xsig::encode_analogs(1022, &[1, 2, 3]).unwrap_err();
    match err {
        CommError::InvalidIndex { kind, index, max } => {
            assert_eq!(kind, SignalKind::Analog);
            assert_eq!(index, 1024);
            assert_eq!(max, 1023);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(xsig::encode_digitals(-1, &[true]).is_err());
    assert!(xsig::encode_serials(1024, &["x"]).is_err());
    assert!(xsig::encode_digitals(5000, &[] as &[bool]).is_ok());
}

#[test]
fn test_generic_encode_matches_typed() {
    assert_eq!(
        xsig::encode(33, &Signal::Digital(true)).unwrap(),
        xsig::encode_digital(33, true).unwrap()
    );
    assert_eq!(
        xsig::encode(33, &Signal::from(0x1234u16)).unwrap(),
        xsig::encode_analog(33, 0x1234).unwrap()
    );
    assert_eq!(
        xsig::encode(33, &Signal::from("on")).unwrap(),
        xsig::encode_serial(33, "on").unwrap()
    );
    assert_eq!(Signal::from("on").frame_len(), 5);
}
