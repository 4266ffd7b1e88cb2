//! Concurrent pipeline construction tests.
//!
//! A registry is read-only once populated, so builds from many threads must
//! agree with each other and with a single-threaded build.


use std::sync::{Arc, Barrier};
use std::thread;

use ordinance_registry::{Phase, PluginMetadata};
use ordinance_schedule::{PipelineBuilder, PipelineRequest, ValidationMode, build};
use test_utils::{all_names, document_registry, registry_of};

#[test]
fn concurrent_builds_match_sequential_build() {
    let registry = Arc::new(document_registry());
    let expected = build(&registry, &all_names(&registry), ValidationMode::Strict).unwrap();
    let expected = Arc::new(expected);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for _ in 0..50 {
                    let result =
                        build(&registry, &all_names(&registry), ValidationMode::Strict).unwrap();
                    assert_eq!(&result, expected.as_ref());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

#[test]
fn concurrent_builds_with_different_requests_are_isolated() {
    let registry = Arc::new(registry_of([
        PluginMetadata::new("imports", Phase::ContentLoading).provides("content:imported"),
        PluginMetadata::new("a", Phase::ConditionalEval).run_after("b"),
        PluginMetadata::new("b", Phase::ConditionalEval).run_after("a"),
        PluginMetadata::new("loops", Phase::ConditionalEval).requires("content:imported"),
    ]));
    let barrier = Arc::new(Barrier::new(3));

    let clean = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let request = PipelineRequest::new(["imports", "loops"]);
            PipelineBuilder::new(&registry).build(&request).unwrap()
        })
    };

    let cyclic = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let request = PipelineRequest::new(["a", "b"]).with_mode(ValidationMode::Silent);
            PipelineBuilder::new(&registry).build(&request).unwrap()
        })
    };

    let failing = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            build(&registry, &["loops"], ValidationMode::Strict).is_err()
        })
    };

    let clean = clean.join().expect("Thread panicked");
    let cyclic = cyclic.join().expect("Thread panicked");
    let failed = failing.join().expect("Thread panicked");

    assert!(clean.is_valid());
    assert_eq!(clean.order(), ["imports", "loops"]);
    assert!(!cyclic.is_valid());
    assert_eq!(cyclic.len(), 2);
    assert!(failed);
}
