//! Behavioral coverage for the race combinators: policies, cancellation
//! and exactly-once delivery.

mod common;

use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use sender_concurrency::prelude::*;
use sender_concurrency::when_any::{stop_when, when_any};
use sender_concurrency::{
    connect, just, just_error, just_stopped, sync_wait, Completion, EmptyEnv, Never,
    OperationState, Receiver, StopSource, StoppedReceiver, ThreadScheduler, Scheduler,
    ValueReceiver,
};

#[test]
fn first_in_start_order_wins() {
    let race = (just((42,)), just((17,))).when_any();
    assert_eq!(sync_wait(race).into_value(), Some((42,)));
}

#[test]
fn error_outcome_is_forwarded() {
    let race = (just_error(42i32),).when_any();
    assert_eq!(sync_wait(race).into_error(), Some(42));
}

#[test]
fn error_beats_later_value_under_first_completion() {
    let race = (just_error(42i32), just((17,))).when_any();
    assert_eq!(sync_wait(race).into_error(), Some(42));
}

#[test]
fn stopped_child_decides_first_completion() {
    let race = (just_stopped(),).when_any();
    assert!(sync_wait(race).is_stopped());
}

#[test]
fn first_successful_skips_errors() {
    let race = (just_error(42i32), just((17,))).first_successful();
    assert_eq!(sync_wait(race).into_value(), Some((17,)));
}

#[test]
fn first_successful_reports_last_error_when_none_succeed() {
    let race = (just_error(1i32), just_error(2i32)).first_successful();
    assert_eq!(sync_wait(race).into_error(), Some(2));
}

#[test]
fn first_successful_reports_stopped_when_no_child_errs() {
    let race = (just_stopped(), just_stopped()).first_successful();
    assert!(sync_wait(race).is_stopped());
}

#[test]
fn multi_shot_senders_connect_from_clones() {
    let race = (just((7,)),).when_any();
    let copy = race.clone();
    assert_eq!(sync_wait(race).into_value(), Some((7,)));
    assert_eq!(sync_wait(copy).into_value(), Some((7,)));
}

#[derive(Debug)]
struct Ticket(i32);

#[test]
fn single_shot_children_carry_move_only_payloads() {
    let race = (just((Ticket(42),)),).when_any();
    let Some((Ticket(n),)) = sync_wait(race).into_value() else {
        panic!("expected a value completion");
    };
    assert_eq!(n, 42);
}

#[test]
fn races_scale_to_the_widest_tuple() {
    let race = (
        just((0,)),
        just((1,)),
        just((2,)),
        just((3,)),
        just((4,)),
        just((5,)),
        just((6,)),
        just((7,)),
        just((8,)),
        just((9,)),
        just((10,)),
        just((11,)),
    )
        .when_any();
    assert_eq!(sync_wait(race).into_value(), Some((0,)));
}

#[test]
fn cancel_before_start_suppresses_child_bodies() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let child = ThreadScheduler.schedule().then(move |()| {
        flag.store(true, Ordering::SeqCst);
        1
    });
    let source = StopSource::new();
    let (receiver, rx) = common::stoppable_receiver::<(i32,), Never>(&source);
    let mut op = pin!(connect((child,).when_any(), receiver));
    source.request_stop();
    op.as_mut().start();

    // The scheduled child observes the stop before its body runs and
    // completes stopped instead.
    assert!(rx.recv().unwrap().is_stopped());
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn cancel_in_flight_converts_the_late_completion() {
    let source = StopSource::new();
    let (receiver, rx) = common::stoppable_receiver::<(i32,), Never>(&source);
    let (child, open) = common::gate_sender(1);
    let mut op = pin!(connect((child,).when_any(), receiver));
    op.as_mut().start();
    assert!(rx.try_recv().is_err());

    source.request_stop();
    open.send(()).unwrap();
    assert!(rx.recv().unwrap().is_stopped());
}

#[test]
fn winner_cancels_the_stragglers() {
    let (slow, open) = common::gate_sender(1);
    let race = (just((42,)), slow).when_any();
    let (receiver, rx) = common::receiver::<(i32,), Never>();
    let mut op = pin!(connect(race, receiver));
    op.as_mut().start();

    // Decided at start by the inline child, but delivery waits for the
    // gated child to acknowledge the cancellation.
    assert!(rx.try_recv().is_err());
    open.send(()).unwrap();
    assert_eq!(rx.recv().unwrap().into_value(), Some((42,)));
}

#[test]
fn exactly_one_delivery_under_concurrency() {
    use rand::Rng;
    use std::time::Duration;

    let mut rng = rand::thread_rng();
    for _ in 0..100 {
        // Random jitter per child so every interleaving of publish and
        // decrement gets exercised over the iterations.
        let mut jittered = |n: i32| {
            let delay = Duration::from_micros(rng.gen_range(0..50));
            ThreadScheduler.schedule().then(move |()| {
                std::thread::sleep(delay);
                n
            })
        };
        let race = (jittered(0), jittered(1), jittered(2), jittered(3)).when_any();
        let (receiver, rx) = common::receiver::<(i32,), Never>();
        let mut op = pin!(connect(race, receiver));
        op.as_mut().start();

        // Delivery happens only after every child finished, so once the
        // winner arrives the channel can never see a second completion.
        assert!(matches!(rx.recv().unwrap(), Completion::Value((0..=3,))));
        assert!(rx.try_recv().is_err());
    }
}

#[test]
fn zero_children_never_completes_spontaneously() {
    let (receiver, rx) = common::receiver::<(), Never>();
    let mut op = pin!(connect(when_any(()), receiver));
    op.as_mut().start();
    assert!(rx.try_recv().is_err());
}

#[test]
fn zero_children_stops_on_request_before_start() {
    let source = StopSource::new();
    let (receiver, rx) = common::stoppable_receiver::<(), Never>(&source);
    let mut op = pin!(connect(when_any(()), receiver));
    source.request_stop();
    op.as_mut().start();
    assert!(rx.try_recv().unwrap().is_stopped());
}

#[test]
fn zero_children_stops_on_request_after_start() {
    let source = StopSource::new();
    let (receiver, rx) = common::stoppable_receiver::<(), Never>(&source);
    let mut op = pin!(connect(when_any(()), receiver));
    op.as_mut().start();
    assert!(rx.try_recv().is_err());

    source.request_stop();
    assert!(rx.try_recv().unwrap().is_stopped());
}

#[test]
fn races_nest() {
    let source = StopSource::new();
    let (receiver, rx) = common::stoppable_receiver::<(), Never>(&source);
    let mut op = pin!(connect((when_any(()),).when_any(), receiver));
    op.as_mut().start();
    assert!(rx.try_recv().is_err());

    source.request_stop();
    assert!(rx.try_recv().unwrap().is_stopped());
}

#[test]
fn stop_when_lets_the_primary_through() {
    let guarded = stop_when(just((42,)), just_stopped());
    assert_eq!(sync_wait(guarded).into_value(), Some((42,)));
}

#[test]
fn stop_when_trigger_cancels_the_primary() {
    let (primary, open) = common::gate_sender(1);
    let guarded = stop_when(primary, just_stopped());
    let (receiver, rx) = common::receiver::<(i32,), Never>();
    let mut op = pin!(connect(guarded, receiver));
    op.as_mut().start();
    assert!(rx.try_recv().is_err());

    open.send(()).unwrap();
    assert!(rx.recv().unwrap().is_stopped());
}

#[test]
fn stop_when_is_pipeable() {
    let guarded = just((42,)).stop_when(just_stopped());
    assert_eq!(sync_wait(guarded).into_value(), Some((42,)));
}

#[test]
fn then_maps_the_race_outcome() {
    let race = (just((20,)), just((1,))).when_any().then(|(n,): (i32,)| n + 22);
    assert_eq!(sync_wait(race).into_value(), Some((42,)));
}

#[test]
fn upon_stopped_recovers_a_stopped_race() {
    let race = (just_stopped(),).when_any().upon_stopped(|| 5);
    assert_eq!(sync_wait(race).into_value(), Some((5,)));
}

#[derive(Debug, PartialEq, Eq)]
enum Hetero {
    Unit,
    Int(i32),
    Stopped,
}

struct BiReceiver {
    tx: mpsc::Sender<Hetero>,
}

impl Receiver for BiReceiver {
    type Env = EmptyEnv;

    fn env(&self) -> EmptyEnv {
        EmptyEnv
    }
}

impl ValueReceiver<()> for BiReceiver {
    fn set_value(self, (): ()) {
        self.tx.send(Hetero::Unit).unwrap();
    }
}

impl ValueReceiver<(i32,)> for BiReceiver {
    fn set_value(self, (n,): (i32,)) {
        self.tx.send(Hetero::Int(n)).unwrap();
    }
}

impl StoppedReceiver for BiReceiver {
    fn set_stopped(self) {
        self.tx.send(Hetero::Stopped).unwrap();
    }
}

#[test]
fn heterogeneous_children_need_one_impl_per_distinct_signature() {
    let (tx, rx) = mpsc::channel();
    let race = (just(()), just((17,))).when_any();
    let mut op = pin!(connect(race, BiReceiver { tx }));
    op.as_mut().start();
    assert_eq!(rx.try_recv().unwrap(), Hetero::Unit);
}
