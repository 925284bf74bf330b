#![no_main]

// flatten -> normalize -> reconstruct must give back the typed seed.

use arbitrary::Arbitrary;
use fuzz_shape::shaped::ArgList;
use fuzz_shape::shaped_record;
use fuzz_shape::transcode::{flatten_args, ShapeBuilder, Reconstructor};
use libfuzzer_sys::fuzz_target;

shaped_record! {
    #[derive(Arbitrary, Debug, Clone, PartialEq)]
    pub struct Cell {
        pub tag: u8,
        pub label: String,
    }
}

shaped_record! {
    #[derive(Arbitrary, Debug, Clone, PartialEq)]
    pub struct Sheet {
        pub id: u64,
        pub rows: Vec<Vec<Cell>>,
        pub weights: Vec<i32>,
        pub done: bool,
    }
}

type Args = (Sheet, Vec<u16>, i8);

fuzz_target!(|seeds: (Args, Args)| {
    let (older, latest) = seeds;
    let mut builder = ShapeBuilder::new();
    builder
        .register(&flatten_args(&older.to_values()).expect("older seed flattens"))
        .expect("older seed registers");
    let flattened = flatten_args(&latest.to_values()).expect("latest seed flattens");
    builder.register(&flattened).expect("seeds share a structure");

    let reconstructor = Reconstructor::new(builder.finish().expect("canonical shape")).expect("reconstructor");
    let rebuilt = reconstructor.reconstruct(&flattened.leaves).expect("latest seed decodes");
    assert_eq!(rebuilt.consumed, flattened.leaves.len());
    assert_eq!(<Args as ArgList>::from_values(rebuilt.args).expect("typed decode"), latest);
});
