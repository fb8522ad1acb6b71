//! Performance benchmarks for sistemav
//!
//! This benchmark suite measures:
//! - Single-sale commission calculation per rule type
//! - Period aggregation and ranking across growing sale volumes
//! - Memory cache operations (set, get, eviction under pressure)
//! - Cache key generation
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;
use sistemav::cache::{generate_key, MemoryCache};
use sistemav::commission::rank_attendants;
use sistemav::config::CacheConfig;
use sistemav::repository::InMemorySource;
use sistemav::{
    calculate_commission, calculate_period_commissions, Attendant, CommissionRule,
    CommissionService, RuleType, Sale,
};
use std::hint::black_box;

// ============================================================================
// Benchmark Fixtures
// ============================================================================

fn rules() -> Vec<CommissionRule> {
    vec![
        CommissionRule::new("small", "Pequenas", RuleType::Fixed, Decimal::new(15, 0))
            .with_targets(None, Some(Decimal::new(200, 0))),
        CommissionRule::new("tier", "Meta", RuleType::Tiered, Decimal::new(5, 0))
            .with_targets(Some(Decimal::new(1500, 0)), None)
            .with_bonus(Decimal::new(2, 0)),
        CommissionRule::new("std", "Padrão", RuleType::Percentage, Decimal::new(4, 0)),
    ]
}

fn attendants(count: usize) -> Vec<Attendant> {
    (0..count)
        .map(|i| Attendant::new(format!("a{}", i), format!("Atendente {}", i), (i * 1000).to_string()))
        .collect()
}

fn sales(count: usize, attendant_count: usize) -> Vec<Sale> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let value = Decimal::new((i as i64 % 400) * 1000 + 99, 2);
            Sale::new(
                i.to_string(),
                format!("a{}", i % attendant_count),
                value.to_string(),
                start + Duration::minutes(i as i64),
            )
        })
        .collect()
}

// ============================================================================
// Commission Benchmarks
// ============================================================================

fn commission_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("commission");
    let rules = rules();
    let attendant = Attendant::new("a1", "Ana", "15000");

    for (name, value) in [("fixed", "120.00"), ("percentage", "800.00"), ("tiered", "2500.00")] {
        let sale = Sale::new("s1", "a1", value, Utc::now());
        group.bench_function(BenchmarkId::new("single_sale", name), |b| {
            b.iter(|| calculate_commission(black_box(&sale), black_box(&attendant), black_box(&rules)))
        });
    }

    for size in [100usize, 1_000, 10_000].iter() {
        let attendants = attendants(25);
        let sales = sales(*size, attendants.len());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(30);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("period", size), size, |b, _| {
            b.iter(|| calculate_period_commissions(&sales, &attendants, &rules, start, end))
        });

        group.bench_with_input(BenchmarkId::new("period_and_ranking", size), size, |b, _| {
            b.iter(|| {
                let period = calculate_period_commissions(&sales, &attendants, &rules, start, end)
                    .expect("valid fixtures");
                rank_attendants(&period, &attendants)
            })
        });
    }

    group.finish();
}

fn service_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("service");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    let service = CommissionService::new(
        InMemorySource::new()
            .with_attendants(attendants(25))
            .with_rules(rules())
            .with_sales(sales(5_000, 25)),
    );
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);

    group.bench_function("ranking_5000_sales", |b| {
        b.to_async(&rt).iter(|| async {
            service.ranking(start, end).await.expect("ranking");
        });
    });

    group.bench_function("commission_for_sale", |b| {
        b.to_async(&rt).iter(|| async {
            service.commission_for_sale("2500").await.expect("lookup");
        });
    });

    group.finish();
}

// ============================================================================
// Cache Benchmarks
// ============================================================================

fn cache_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_cache");

    for size in [1024usize, 10240, 102400].iter() {
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
            let cache = MemoryCache::default();
            let data = vec![0u8; size];
            b.iter(|| cache.set("GET:/api/sales", black_box(data.clone())))
        });

        group.bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
            let cache = MemoryCache::default();
            cache.set("GET:/api/sales", vec![0u8; size]);
            b.iter(|| black_box(cache.get("GET:/api/sales")))
        });
    }

    group.bench_function("get_miss", |b| {
        let cache = MemoryCache::default();
        b.iter(|| black_box(cache.get("GET:/api/missing")))
    });

    group.bench_function("set_with_eviction", |b| {
        let cache = MemoryCache::new(CacheConfig::utility());
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            cache.set(&format!("GET:/api/sales?page={}", n), vec![0u8; 64]);
        })
    });

    group.bench_function("generate_key", |b| {
        b.iter(|| {
            generate_key(
                black_box("GET"),
                black_box("/api/sales"),
                black_box(Some("page=2&limit=20&attendantId=a7&sort=desc")),
            )
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    commission_benchmarks,
    service_benchmarks,
    cache_benchmarks
);
criterion_main!(benches);
