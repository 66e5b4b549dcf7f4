#![no_main]

use libfuzzer_sys::fuzz_target;
use mzdb::decode::decode_bounding_box;
use mzdb::model::{ByteOrder, Compression, DataEncoding, DataMode, PeakLayout, Precision};

fuzz_target!(|data: &[u8]| {
    // First byte selects the encoding, the rest is the payload
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };

    let precision = |bit: u8| {
        if selector & bit == 0 {
            Precision::Float64
        } else {
            Precision::Float32
        }
    };
    let encoding = DataEncoding {
        id: 1,
        mode: if selector & 0x01 == 0 {
            DataMode::Profile
        } else {
            DataMode::Fitted
        },
        mz_precision: precision(0x02),
        intensity_precision: precision(0x04),
        compression: match (selector >> 3) & 0x03 {
            1 => Compression::Zlib,
            2 => Compression::Deflate,
            _ => Compression::None,
        },
        byte_order: if selector & 0x20 == 0 {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        },
        peak_layout: if selector & 0x40 == 0 {
            PeakLayout::Interleaved
        } else {
            PeakLayout::Separate
        },
    };

    // Must fail gracefully, never panic
    if let Ok(slices) = decode_bounding_box(payload, &encoding) {
        for slice in slices {
            assert_eq!(slice.mz.len(), slice.intensity.len());
        }
    }
});
