#![no_main]

// Arbitrary flat tuples must decode or desync, never panic. Tuples the
// signature accepts must always decode.

use std::sync::OnceLock;

use arbitrary::Unstructured;
use fuzz_shape::shaped::ArgList;
use fuzz_shape::transcode::{flatten_args, CanonicalShape, Reconstructor};
use fuzz_shape::{ScalarType, ScalarValue};
use libfuzzer_sys::fuzz_target;

fn reconstructor() -> &'static Reconstructor {
    static RECONSTRUCTOR: OnceLock<Reconstructor> = OnceLock::new();
    RECONSTRUCTOR.get_or_init(|| {
        let seed = (vec![vec![1i64, 2], vec![], vec![3]], String::from("seed"), vec![true]);
        let flattened = flatten_args(&seed.to_values()).expect("seed flattens");
        let shape = CanonicalShape::new(flattened.shapes, flattened.spans).expect("canonical shape");
        Reconstructor::new(shape).expect("reconstructor")
    })
}

fn scalar(u: &mut Unstructured<'_>, ty: ScalarType) -> arbitrary::Result<ScalarValue> {
    Ok(match ty {
        ScalarType::Bool => ScalarValue::Bool(u.arbitrary()?),
        ScalarType::I8 => ScalarValue::I8(u.arbitrary()?),
        ScalarType::I16 => ScalarValue::I16(u.arbitrary()?),
        ScalarType::I32 => ScalarValue::I32(u.arbitrary()?),
        ScalarType::I64 => ScalarValue::I64(u.arbitrary()?),
        ScalarType::U8 => ScalarValue::U8(u.arbitrary()?),
        ScalarType::U16 => ScalarValue::U16(u.arbitrary()?),
        ScalarType::U32 => ScalarValue::U32(u.arbitrary()?),
        ScalarType::U64 => ScalarValue::U64(u.arbitrary()?),
        ScalarType::F32 => ScalarValue::F32(u.arbitrary()?),
        ScalarType::F64 => ScalarValue::F64(u.arbitrary()?),
        ScalarType::Text => ScalarValue::Text(u.arbitrary()?),
        ScalarType::Bytes => ScalarValue::Bytes(u.arbitrary()?),
    })
}

fn flat_tuple(u: &mut Unstructured<'_>) -> arbitrary::Result<Vec<ScalarValue>> {
    let len = u.int_in_range(0..=8usize)?;
    (0..len)
        .map(|_| {
            let tag = u.int_in_range(0..=12u8)?;
            let ty = ScalarType::try_from(tag).map_err(|_| arbitrary::Error::IncorrectFormat)?;
            scalar(u, ty)
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(flat) = flat_tuple(&mut u) else {
        return;
    };
    let reconstructor = reconstructor();
    match reconstructor.reconstruct(&flat) {
        Ok(rebuilt) => {
            assert!(reconstructor.signature().accepts(&flat));
            assert_eq!(rebuilt.consumed, flat.len());
        }
        Err(err) => {
            assert!(err.is_per_invocation(), "setup error at replay time: {}", err);
            assert!(!reconstructor.signature().accepts(&flat));
        }
    }
});
