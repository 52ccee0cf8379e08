use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spread_scanner::core::gaps::{detect_gaps, GapFilter};
use spread_scanner::core::price_store::PriceStore;
use spread_scanner::core::types::{Exchange, MarketType, NormalizedTicker};

const MARKETS: [(Exchange, MarketType); 9] = [
    (Exchange::Upbit, MarketType::Spot),
    (Exchange::Binance, MarketType::Spot),
    (Exchange::Binance, MarketType::Futures),
    (Exchange::Bybit, MarketType::Spot),
    (Exchange::Okx, MarketType::Spot),
    (Exchange::Mexc, MarketType::Spot),
    (Exchange::Gateio, MarketType::Spot),
    (Exchange::Bitget, MarketType::Spot),
    (Exchange::Kucoin, MarketType::Spot),
];

/// One ticker per (symbol, venue) with a small price skew per venue
fn make_snapshot(symbols: usize) -> Vec<NormalizedTicker> {
    let mut tickers = Vec::with_capacity(symbols * MARKETS.len());
    for s in 0..symbols {
        let base = 1_000.0 + s as f64 * 10.0;
        for (i, (exchange, market)) in MARKETS.iter().enumerate() {
            let last = base * (1.0 + i as f64 * 0.001);
            tickers.push(
                NormalizedTicker::new(*exchange, *market, &format!("C{}", s), last).with_volume(1.0),
            );
        }
    }
    tickers
}

fn bench_detect_gaps_200_symbols(c: &mut Criterion) {
    c.bench_function("detect_gaps_200_symbols", |b| {
        let snapshot = make_snapshot(200);
        b.iter(|| {
            black_box(detect_gaps(black_box(&snapshot)));
        });
    });
}

fn bench_filtered_gaps(c: &mut Criterion) {
    c.bench_function("filtered_gaps_200_symbols", |b| {
        let snapshot = make_snapshot(200);
        let filter = GapFilter {
            min_spread: Some(0.5),
            exchanges: Some(vec![Exchange::Upbit, Exchange::Binance, Exchange::Okx]),
        };
        b.iter(|| {
            black_box(filter.detect(black_box(&snapshot)));
        });
    });
}

fn bench_store_update(c: &mut Criterion) {
    c.bench_function("store_update", |b| {
        let snapshot = make_snapshot(200);
        let mut store = PriceStore::default();
        for ticker in &snapshot {
            store.update(ticker.clone());
        }
        let ticker = NormalizedTicker::new(Exchange::Okx, MarketType::Spot, "C100", 2_001.0);
        b.iter(|| {
            black_box(store.update(black_box(ticker.clone())));
        });
    });
}

criterion_group!(
    benches,
    bench_detect_gaps_200_symbols,
    bench_filtered_gaps,
    bench_store_update,
);
criterion_main!(benches);
