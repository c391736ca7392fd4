//! Benchmarks for round evaluation over pulse chains and accumulators.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use eventide::{downcast, payload, Automaton, Channel, EvalCx};

/// Build an automaton whose output sits `depth` map nodes away from the
/// input channel.
fn chain(numbers: &Channel<i64>, depth: usize) -> Automaton {
    Automaton::new(|cx| {
        let mut head = cx.pulse_from_channel("source", numbers);
        for _ in 0..depth {
            let previous = head;
            head = cx.new_pulse("bump", move |cx: &mut EvalCx<'_>| {
                Ok(cx
                    .pulse_value(previous)?
                    .and_then(|p| downcast::<i64>(&p).map(|n| payload(n + 1))))
            });
            cx.depend_on(head, previous);
        }
        Ok(head)
    })
    .unwrap()
}

/// One round pulled through a map chain of varying depth.
fn bench_map_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_chain");

    for depth in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let numbers: Channel<i64> = Channel::new();
            let mut automaton = chain(&numbers, depth);
            let mut n = 0i64;
            b.iter(|| {
                n += 1;
                automaton.step(vec![numbers.encode(n)]).unwrap()
            });
        });
    }

    group.finish();
}

/// A counter accumulator driven for 1000 rounds.
fn bench_accumulate(c: &mut Criterion) {
    c.bench_function("accumulate_1000_rounds", |b| {
        b.iter(|| {
            let clicks: Channel<i64> = Channel::new();
            let mut automaton = Automaton::new(|cx| {
                let source = cx.pulse_from_channel("clicks", &clicks);
                let (count, updater) = cx.new_latch("count", payload(0i64));
                updater.update_on(cx, source, |current, occurrence| {
                    let a = *downcast::<i64>(current).unwrap();
                    let b = *downcast::<i64>(occurrence).unwrap();
                    Ok(payload(a + b))
                });
                let probe = cx.new_pulse("probe", move |cx: &mut EvalCx<'_>| {
                    Ok(Some(cx.latch_value(count)?))
                });
                Ok(probe)
            })
            .unwrap();

            for n in 0..1000 {
                automaton.step(vec![clicks.encode(n)]).unwrap();
            }
        });
    });
}

/// Rounds with empty batches over an already built chain.
fn bench_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_state");

    for depth in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let numbers: Channel<i64> = Channel::new();
            let mut automaton = chain(&numbers, depth);
            b.iter(|| automaton.step(Vec::new()).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_map_chain, bench_accumulate, bench_steady_state);
criterion_main!(benches);
