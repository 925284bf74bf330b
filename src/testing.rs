//! Shared fixtures for tests, benches and fuzz targets.

use crate::shaped_record;

/// Installs a `tracing` subscriber that writes through the test harness.
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

shaped_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Pair {
        pub first: i64,
        pub second: String,
    }
}

shaped_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Parent {
        pub child1: Pair,
        pub child2: Pair,
    }
}

shaped_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Holder {
        pub x1: f64,
        pub x2: f64,
    }
}

shaped_record! {
    /// Records nested in sequences nested in a record.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Batch {
        pub id: u32,
        pub pairs: Vec<Pair>,
        pub grid: Vec<Vec<i16>>,
        pub flag: bool,
    }
}

shaped_record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Sealed {
        pub open: i32,
        closed: i32,
    }
}

impl Sealed {
    pub fn new(open: i32, closed: i32) -> Self {
        Sealed { open, closed }
    }
}

impl Pair {
    pub fn new(first: i64, second: &str) -> Self {
        Pair { first, second: second.to_string() }
    }
}
