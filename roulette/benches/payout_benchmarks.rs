use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use roulette::{
    BetKey, BetLedger, BettingWindow, ParticipantAccount, RoundState, WheelNumber,
    game::RoundTimings, resolve,
};
use std::hint::black_box;

/// Ledger with one stake on each of the first `n` bet keys
fn ledger_with_bets(n: usize) -> BetLedger {
    BetKey::all()
        .into_iter()
        .take(n)
        .map(|key| (key, 10))
        .collect()
}

/// Benchmark payout resolution for growing ledgers
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let winning = WheelNumber::new(17).unwrap();

    for n in [1, 6, 20, 49] {
        let ledger = ledger_with_bets(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ledger, |b, ledger| {
            b.iter(|| resolve(black_box(ledger), black_box(winning)));
        });
    }

    group.finish();
}

/// Benchmark parsing wire bet keys
fn bench_parse_bet_keys(c: &mut Criterion) {
    let wire: Vec<String> = BetKey::all().iter().map(ToString::to_string).collect();

    c.bench_function("parse_all_bet_keys", |b| {
        b.iter(|| {
            for raw in &wire {
                let _ = black_box(raw.parse::<BetKey>());
            }
        });
    });
}

/// Benchmark a full round of placing then settling bets for one account
fn bench_account_round(c: &mut Criterion) {
    let winning = WheelNumber::new(7).unwrap();

    c.bench_function("account_place_and_settle", |b| {
        b.iter(|| {
            let mut account = ParticipantAccount::new(10_000);
            for key in BetKey::all() {
                let _ = account.place_bet(BettingWindow::Open, key, 5);
            }
            let settlement = resolve(account.bets(), winning);
            let _ = account.settle_round(1, &settlement);
            black_box(account.balance())
        });
    });
}

/// Benchmark advancing the round clock through a whole round
fn bench_round_cycle(c: &mut Criterion) {
    let timings = RoundTimings::default();
    let winning = WheelNumber::new(0).unwrap();

    c.bench_function("round_full_cycle", |b| {
        b.iter(|| {
            let mut state = RoundState::new(&timings);
            for _ in 0..(timings.betting_secs + timings.spin_secs) {
                let _ = state.advance(&timings, || winning);
            }
            black_box(state.round_id())
        });
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_parse_bet_keys,
    bench_account_round,
    bench_round_cycle
);
criterion_main!(benches);
