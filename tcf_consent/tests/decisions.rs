mod common;

include!(concat!(env!("OUT_DIR"), "/decision_tests.rs"));
