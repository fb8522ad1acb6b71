//! End-to-end commission scenarios through the service and the pure engine.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sistemav::commission::{rank_attendants, select_rule};
use sistemav::repository::InMemorySource;
use sistemav::{
    calculate_commission, calculate_period_commissions, Attendant, CommissionRule,
    CommissionService, Error, Money, RuleType, Sale,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
}

fn percentage(id: &str, rate: &str) -> CommissionRule {
    CommissionRule::new(id, id, RuleType::Percentage, dec(rate))
}

/// Test 1: Percentage Rule With and Without Performance Bonus
///
/// A 1000.00 sale under a 10% rule earns 100.00; an attendant whose
/// cumulative earnings exceed 10000 gets 10% on top.
#[test]
fn test_percentage_scenario() {
    let rules = vec![percentage("r1", "10")];
    let sale = Sale::new("s1", "a1", "1000", day(1));

    let regular = Attendant::new("a1", "Ana", "5000");
    let calc = calculate_commission(&sale, &regular, &rules).unwrap().unwrap();
    assert_eq!(calc.commission_value.to_string(), "100.00");
    assert_eq!(calc.breakdown, "10% de R$ 1000.00 = R$ 100.00");

    let top = Attendant::new("a1", "Ana", "15000");
    let calc = calculate_commission(&sale, &top, &rules).unwrap().unwrap();
    assert_eq!(calc.commission_value.to_string(), "110.00");
    assert_eq!(
        calc.breakdown,
        "10% de R$ 1000.00 = R$ 100.00 + Bônus de desempenho (10%) = R$ 10.00"
    );
}

/// Test 2: Earnings Exactly at the Threshold Get No Bonus
#[test]
fn test_performance_threshold_is_exclusive() {
    let rules = vec![percentage("r1", "10")];
    let sale = Sale::new("s1", "a1", "1000", day(1));
    let attendant = Attendant::new("a1", "Ana", "10000.00");

    let calc = calculate_commission(&sale, &attendant, &rules).unwrap().unwrap();
    assert_eq!(calc.commission_value.to_string(), "100.00");
}

/// Test 3: Tiered Rule Adds the Bonus Once the Target Is Met
#[test]
fn test_tiered_scenario() {
    let rules = vec![CommissionRule::new("t1", "Meta", RuleType::Tiered, dec("5"))
        .with_targets(Some(dec("1500")), None)
        .with_bonus(dec("2"))];
    let attendant = Attendant::new("a1", "Ana", "0");

    let above = Sale::new("s1", "a1", "2000", day(1));
    let calc = calculate_commission(&above, &attendant, &rules).unwrap().unwrap();
    assert_eq!(calc.commission_value.to_string(), "140.00");
    assert_eq!(
        calc.breakdown,
        "5% de R$ 2000.00 = R$ 100.00 + Bônus de 2% (meta de R$ 1500.00 atingida) = R$ 40.00"
    );

    // Below minTarget the rule is not applicable at all.
    let below = Sale::new("s2", "a1", "1000", day(1));
    assert!(calculate_commission(&below, &attendant, &rules).unwrap().is_none());
}

/// Test 4: Fixed Rule Ignores the Sale Value
#[test]
fn test_fixed_rule() {
    let rules = vec![CommissionRule::new("f1", "Fixo", RuleType::Fixed, dec("50"))];
    let attendant = Attendant::new("a1", "Ana", "0");

    for value in ["10", "999999.99"] {
        let sale = Sale::new("s", "a1", value, day(1));
        let calc = calculate_commission(&sale, &attendant, &rules).unwrap().unwrap();
        assert_eq!(calc.commission_value, Money::new(dec("50")));
        assert_eq!(calc.breakdown, "Valor fixo = R$ 50.00");
    }
}

/// Test 5: No Rules, Inactive Rules and Out-of-Range Targets Yield None
#[test]
fn test_no_applicable_rule() {
    let attendant = Attendant::new("a1", "Ana", "0");
    let sale = Sale::new("s1", "a1", "300", day(1));

    assert!(calculate_commission(&sale, &attendant, &[]).unwrap().is_none());

    let inactive = vec![percentage("r1", "10").with_active(false)];
    assert!(calculate_commission(&sale, &attendant, &inactive).unwrap().is_none());

    let out_of_range = vec![percentage("r1", "10").with_targets(Some(dec("500")), Some(dec("900")))];
    assert!(calculate_commission(&sale, &attendant, &out_of_range).unwrap().is_none());
}

/// Test 6: First Applicable Rule Wins
#[test]
fn test_rule_order_decides_overlaps() {
    let rules = vec![
        percentage("small", "3").with_targets(None, Some(dec("500"))),
        percentage("any", "8"),
        percentage("never", "50"),
    ];

    let small = select_rule(&rules, Money::new(dec("500"))).unwrap();
    assert_eq!(small.id, "small");

    let big = select_rule(&rules, Money::new(dec("500.01"))).unwrap();
    assert_eq!(big.id, "any");
}

/// Test 7: Non-numeric Values Are Computation Errors
#[test]
fn test_non_numeric_value() {
    let rules = vec![percentage("r1", "10")];
    let attendant = Attendant::new("a1", "Ana", "0");
    let sale = Sale::new("s1", "a1", "mil reais", day(1));

    let err = calculate_commission(&sale, &attendant, &rules).unwrap_err();
    assert!(matches!(err, Error::ComputationError(_)));
}

/// Test 8: Period Bounds Are Inclusive
#[test]
fn test_period_bounds_inclusive() {
    let rules = vec![percentage("r1", "10")];
    let attendants = vec![Attendant::new("a1", "Ana", "0")];
    let sales = vec![
        Sale::new("before", "a1", "100", day(1)),
        Sale::new("start", "a1", "100", day(2)),
        Sale::new("mid", "a1", "100", day(3)),
        Sale::new("end", "a1", "100", day(4)),
        Sale::new("after", "a1", "100", day(5)),
    ];

    let period = calculate_period_commissions(&sales, &attendants, &rules, day(2), day(4)).unwrap();
    let ana = &period["a1"];
    assert_eq!(ana.count, 3);
    assert_eq!(ana.total.to_string(), "30.00");
    let ids: Vec<&str> = ana.details.iter().map(|c| c.sale_id.as_str()).collect();
    assert_eq!(ids, ["start", "mid", "end"]);
}

/// Test 9: Ranking Breaks Ties by Count, Then Name
#[test]
fn test_ranking_tie_breaks() {
    let rules = vec![percentage("r1", "10")];
    let attendants = vec![
        Attendant::new("a1", "Carla", "0"),
        Attendant::new("a2", "Bruno", "0"),
        Attendant::new("a3", "Ana", "0"),
        Attendant::new("a4", "Diego", "0"),
    ];
    let sales = vec![
        Sale::new("1", "a1", "1000", day(1)),
        Sale::new("2", "a2", "500", day(1)),
        Sale::new("3", "a2", "500", day(1)),
        Sale::new("4", "a3", "1000", day(1)),
    ];

    let period = calculate_period_commissions(&sales, &attendants, &rules, day(1), day(1)).unwrap();
    let board = rank_attendants(&period, &attendants);

    let order: Vec<(&str, usize)> = board
        .iter()
        .map(|e| (e.name.as_str(), e.position))
        .collect();
    assert_eq!(
        order,
        [("Bruno", 1), ("Ana", 2), ("Carla", 3), ("Diego", 4)]
    );
    assert!(board[3].total.is_zero());
}

/// Test 10: Service Wiring Over an In-Memory Source
#[tokio::test]
async fn test_service_period_and_lookup() {
    let _ = env_logger::builder().is_test(true).try_init();

    let source = InMemorySource::new()
        .with_attendants(vec![
            Attendant::new("a1", "Ana", "20000"),
            Attendant::new("a2", "Bruno", "0"),
        ])
        .with_rules(vec![percentage("r1", "10")])
        .with_sales(vec![
            Sale::new("s1", "a1", "1000", day(10)),
            Sale::new("s2", "a2", "1000", day(11)),
        ]);
    let service = CommissionService::new(source);

    let period = service.period_commissions(day(1), day(31)).await.unwrap();
    assert_eq!(period["a1"].total.to_string(), "110.00");
    assert_eq!(period["a2"].total.to_string(), "100.00");

    let calc = service.commission_for_sale("s2").await.unwrap().unwrap();
    assert_eq!(calc.rule.id, "r1");

    let json = serde_json::to_value(&calc).unwrap();
    assert_eq!(json["saleId"], "s2");
    assert_eq!(json["rule"]["type"], "percentage");
    assert_eq!(json["rule"]["isActive"], 1);
}
