use rstest::rstest;
use strum::IntoEnumIterator;

use continuation_helper::ContinuationHelper;
use continuation_helper::frame_kind::{classify, CompiledFrame, FrameKind, InterpretedFrame, NativeFrame, NonInterpretedUnknownFrame, StubFrame};
use continuation_helper::stack_builder::{FrameHandle, InterpretedFrameSpec, StackBuilder};

use crate::common::*;

mod common;

#[derive(Debug, Copy, Clone)]
enum Fixtured {
    Interpreted,
    Compiled,
    Leaf,
    NativeSync,
    NativePlain,
    Stub,
    Adapter,
}

fn push(fixture: &Fixture, builder: &mut StackBuilder, which: Fixtured) -> FrameHandle {
    match which {
        Fixtured::Interpreted => builder.push_interpreted(InterpretedFrameSpec::new(fixture.looping.clone(), LOOP_BCI_EMPTY).returning_to(BOTTOM_RETURN_PC)),
        Fixtured::Compiled => builder.push_compiled(&fixture.run, RUN_CALL_RETURN_PC, BOTTOM_RETURN_PC, vec![]),
        Fixtured::Leaf => builder.push_compiled(&fixture.leaf, LEAF_PC, BOTTOM_RETURN_PC, vec![]),
        Fixtured::NativeSync => builder.push_native(&fixture.native_sync, NATIVE_SYNC_PC, BOTTOM_RETURN_PC, Some(fixture.constant_lock)),
        Fixtured::NativePlain => builder.push_native(&fixture.native_plain, NATIVE_PLAIN_PC, BOTTOM_RETURN_PC, None),
        Fixtured::Stub => builder.push_stub(&fixture.stub, BOTTOM_RETURN_PC),
        Fixtured::Adapter => builder.push_non_interpreted(&fixture.adapter, fixture.adapter.code().start, BOTTOM_RETURN_PC, vec![]),
    }
}

#[rstest]
#[case(Fixtured::Interpreted, FrameKind::Interpreted)]
#[case(Fixtured::Compiled, FrameKind::Compiled)]
#[case(Fixtured::Leaf, FrameKind::Compiled)]
#[case(Fixtured::NativeSync, FrameKind::Native)]
#[case(Fixtured::NativePlain, FrameKind::Native)]
#[case(Fixtured::Stub, FrameKind::Stub)]
fn known_kinds_are_exclusive(#[case] which: Fixtured, #[case] expected: FrameKind) {
    let fixture = Fixture::new();
    let options = fixture.options();
    let mut builder = StackBuilder::native_stack(&fixture.code_cache, 256, &options);
    let handle = push(&fixture, &mut builder, which);
    let f = builder.frame(handle);

    assert_eq!(classify(&f), expected);
    let fine = [
        InterpretedFrame::is_instance(&f),
        CompiledFrame::is_instance(&f),
        NativeFrame::is_instance(&f),
        StubFrame::is_instance(&f),
    ];
    assert_eq!(fine.iter().filter(|is| **is).count(), 1, "{:?} matched {:?}", which, fine);
    assert_eq!(NonInterpretedUnknownFrame::is_instance(&f), !InterpretedFrame::is_instance(&f));
    for kind in FrameKind::iter().filter(|kind| *kind != FrameKind::NonInterpretedUnknown) {
        assert_eq!(kind.is_instance(&f), kind == expected, "{} predicate on {:?}", kind, which);
    }
}

#[test]
fn adapters_fall_back_to_unknown() {
    let fixture = Fixture::new();
    let options = fixture.options();
    let mut builder = StackBuilder::native_stack(&fixture.code_cache, 64, &options);
    let handle = push(&fixture, &mut builder, Fixtured::Adapter);
    let f = builder.frame(handle);

    assert_eq!(classify(&f), FrameKind::NonInterpretedUnknown);
    assert!(FrameKind::NonInterpretedUnknown.is_instance(&f));
    assert!(!CompiledFrame::is_instance(&f));
    assert!(!NativeFrame::is_instance(&f));
    assert!(!StubFrame::is_instance(&f));
}

#[test]
fn classification_is_stable_and_traced() {
    let fixture = Fixture::new();
    let mut options = fixture.options();
    options.tracing.trace_classification = true;
    let helper = ContinuationHelper::new(options.clone());
    let mut builder = StackBuilder::native_stack(&fixture.code_cache, 256, &options);
    let caller = push(&fixture, &mut builder, Fixtured::Interpreted);
    let callee = push(&fixture, &mut builder, Fixtured::Compiled);
    let frames = [builder.frame(caller), builder.frame(callee)];
    for _ in 0..3 {
        assert_eq!(helper.classify(&frames[0]), FrameKind::Interpreted);
        assert_eq!(helper.classify(&frames[1]), FrameKind::Compiled);
    }
}

#[test]
fn stub_blobs() {
    let fixture = Fixture::new();
    assert!(ContinuationHelper::is_stub(&fixture.stub));
    assert!(!ContinuationHelper::is_stub(&fixture.adapter));
    assert!(!ContinuationHelper::is_stub(&fixture.run));
    assert!(!ContinuationHelper::is_stub(&fixture.interpreter));
}

#[test]
fn frame_method_per_kind() {
    let fixture = Fixture::new();
    let options = fixture.options();
    let helper = ContinuationHelper::new(options.clone());
    let mut builder = StackBuilder::native_stack(&fixture.code_cache, 256, &options);
    let interpreted = push(&fixture, &mut builder, Fixtured::Interpreted);
    let compiled = push(&fixture, &mut builder, Fixtured::Compiled);
    let native = push(&fixture, &mut builder, Fixtured::NativeSync);

    assert_eq!(helper.frame_method(&builder.frame(interpreted)).id(), fixture.looping.id());
    assert_eq!(helper.frame_method(&builder.frame(compiled)).name(), "Worker.run");
    assert_eq!(helper.frame_method(&builder.frame(native)).name(), "Worker.nativeSync");
}

#[test]
#[should_panic]
fn stub_frames_have_no_method() {
    let fixture = Fixture::new();
    let options = fixture.options();
    let helper = ContinuationHelper::new(options.clone());
    let mut builder = StackBuilder::native_stack(&fixture.code_cache, 64, &options);
    let stub = push(&fixture, &mut builder, Fixtured::Stub);
    helper.frame_method(&builder.frame(stub));
}
