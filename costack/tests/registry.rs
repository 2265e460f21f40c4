use costack::{Error, RuntimeBuilder, Status, yield_now};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn test_spawning_past_capacity_grows_registry() {
    let rt = RuntimeBuilder::new().capacity(32).seed(21).build().unwrap();
    let done = Rc::new(RefCell::new(Vec::new()));

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let done = done.clone();
            rt.spawn(
                "grow",
                move |i: usize| {
                    yield_now().unwrap();
                    done.borrow_mut().push(i);
                },
                i,
            )
            .unwrap()
        })
        .collect();

    assert_eq!(rt.capacity(), 64);
    assert_eq!(rt.live_count(), 40);

    let ids: Vec<_> = handles.iter().map(|h| h.id().index()).collect();
    assert_eq!(ids, (1..=40).collect::<Vec<_>>());

    for handle in handles {
        rt.wait(handle).unwrap();
    }

    let mut done = done.borrow().clone();
    done.sort_unstable();
    assert_eq!(done, (0..40).collect::<Vec<_>>());
    assert_eq!(rt.capacity(), 64, "capacity never shrinks");
    assert_eq!(rt.pending_joins(), 0);
}

#[test]
fn test_growth_from_tiny_capacity() {
    let rt = RuntimeBuilder::new().capacity(1).seed(22).build().unwrap();

    let first = rt.spawn("a", |_: ()| {}, ()).unwrap();
    assert_eq!(rt.capacity(), 2);

    let second = rt.spawn("b", |_: ()| {}, ()).unwrap();
    assert_eq!(rt.capacity(), 4);

    rt.wait(first).unwrap();
    rt.wait(second).unwrap();
}

#[test]
fn test_reclaimed_slot_is_reused_cleanly() {
    let rt = RuntimeBuilder::new().seed(23).build().unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    let sink = log.clone();
    let a = rt
        .spawn("a", move |_: ()| sink.borrow_mut().push("a"), ())
        .unwrap();
    let a_id = a.id();
    rt.wait(a).unwrap();

    let sink = log.clone();
    let b = rt
        .spawn("b", move |_: ()| sink.borrow_mut().push("b"), ())
        .unwrap();

    assert_eq!(b.id(), a_id);
    assert_eq!(b.name(), "b");
    assert_eq!(rt.status(&b), Some(Status::Suspended));

    rt.wait(b).unwrap();

    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn test_dead_but_unjoined_slot_is_not_reused() {
    let rt = RuntimeBuilder::new().seed(24).build().unwrap();
    let finished = Rc::new(Cell::new(0));

    let first = rt
        .spawn(
            "first",
            |f: Rc<Cell<u32>>| f.set(f.get() + 1),
            finished.clone(),
        )
        .unwrap();
    let second = rt
        .spawn(
            "second",
            |f: Rc<Cell<u32>>| f.set(f.get() + 1),
            finished.clone(),
        )
        .unwrap();

    // `first` may terminate while `second` is driven; it stays unjoined.
    rt.wait(second).unwrap();

    let third = rt.spawn("third", |_: ()| {}, ()).unwrap();
    assert_ne!(third.id(), first.id());

    rt.wait(first).unwrap();
    rt.wait(third).unwrap();
    assert_eq!(finished.get(), 2);
}

#[test]
fn test_handle_from_other_runtime_is_given_back() {
    let rt_a = RuntimeBuilder::new().seed(25).build().unwrap();
    let rt_b = RuntimeBuilder::new().seed(26).build().unwrap();
    let ran = Rc::new(Cell::new(false));

    let flag = ran.clone();
    let handle = rt_a.spawn("foreign", move |_: ()| flag.set(true), ()).unwrap();
    let id = handle.id();

    assert_eq!(rt_b.status(&handle), None);

    let err = rt_b.wait(handle).unwrap_err();
    assert!(matches!(err, Error::ForeignHandle(_)));

    let handle = err.into_handle().expect("rejected wait returns the handle");
    assert_eq!(handle.id(), id);

    rt_a.wait(handle).unwrap();
    assert!(ran.get());
    assert_eq!(rt_a.pending_joins(), 0);
}

#[test]
fn test_wait_from_inside_coroutine_is_rejected() {
    let rt = Rc::new(RuntimeBuilder::new().seed(27).build().unwrap());
    let outcome = Rc::new(Cell::new(None));

    let inner_rt = rt.clone();
    let slot = outcome.clone();
    let kept = Rc::new(RefCell::new(None));
    let keep = kept.clone();
    let outer = rt
        .spawn(
            "outer",
            move |_: ()| {
                let inner = inner_rt.spawn("inner", |_: ()| {}, ()).unwrap();
                let outer_id = costack::current();

                match inner_rt.wait(inner) {
                    Err(Error::WaitFromCoroutine { current, handle }) => {
                        slot.set(Some(Some(current) == outer_id));
                        *keep.borrow_mut() = Some(handle);
                    }
                    _ => slot.set(Some(false)),
                }
            },
            (),
        )
        .unwrap();

    rt.wait(outer).unwrap();

    assert_eq!(outcome.get(), Some(true));

    // The rejected handle can still be joined from main.
    let inner = kept.borrow_mut().take().unwrap();
    rt.wait(inner).unwrap();
    assert_eq!(rt.pending_joins(), 0);
}

#[test]
fn test_runtimes_nest_inside_coroutines() {
    let outer_rt = RuntimeBuilder::new().seed(28).build().unwrap();
    let total = Rc::new(Cell::new(0));

    let handle = outer_rt
        .spawn(
            "host",
            |total: Rc<Cell<u32>>| {
                let inner_rt = RuntimeBuilder::new().seed(29).build().unwrap();

                let handles: Vec<_> = (0..3)
                    .map(|_| {
                        inner_rt
                            .spawn(
                                "guest",
                                |total: Rc<Cell<u32>>| {
                                    for _ in 0..2 {
                                        total.set(total.get() + 1);
                                        yield_now().unwrap();
                                    }
                                },
                                total.clone(),
                            )
                            .unwrap()
                    })
                    .collect();

                for handle in handles {
                    inner_rt.wait(handle).unwrap();
                }

                // Back under the outer runtime.
                yield_now().unwrap();
                total.set(total.get() + 100);
            },
            total.clone(),
        )
        .unwrap();

    outer_rt.wait(handle).unwrap();

    assert_eq!(total.get(), 106);
}
