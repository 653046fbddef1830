//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating mandates and products that
//! satisfy the local validity rules.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, MandateId, Money};
use domain_mandate::{Address, Gender, Insurer, Mandate, MandateDocument, PremiumPeriod, Product};

/// Strategy for the currencies the platform accepts
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::EUR),
        Just(Currency::CHF),
        Just(Currency::GBP),
        Just(Currency::USD),
    ]
}

/// Strategy for premiums with up to four decimal places
pub fn premium_strategy() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64, 0u32..=4u32, currency_strategy())
        .prop_map(|(mantissa, scale, currency)| Money::new(Decimal::new(mantissa, scale), currency))
}

pub fn premium_period_strategy() -> impl Strategy<Value = PremiumPeriod> {
    prop_oneof![
        Just(PremiumPeriod::Once),
        Just(PremiumPeriod::Year),
        Just(PremiumPeriod::HalfYear),
        Just(PremiumPeriod::Quarter),
        Just(PremiumPeriod::Month),
    ]
}

/// Countries that have a code on the platform
pub fn country_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "DE", "AT", "CH", "FR", "IT", "NL", "BE", "LU", "ES", "PL", "DK", "GB", "CZ",
    ])
}

/// Strategy for dates between 1930 and 2005
pub fn birthdate_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..27_000i64).prop_map(|days| {
        NaiveDate::from_ymd_opt(1930, 1, 1).unwrap() + Duration::days(days)
    })
}

/// Strategy for contract start dates and optional end dates
pub fn contract_term_strategy() -> impl Strategy<Value = (NaiveDate, Option<NaiveDate>)> {
    (0i64..9_000i64, prop::option::of(1i64..15_000i64)).prop_map(|(start, length)| {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(start);
        (start, length.map(|days| start + Duration::days(days)))
    })
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zäöüß]{1,20}"
}

/// Strategy for valid natural-person or company mandates
pub fn valid_mandate_strategy() -> impl Strategy<Value = Mandate> {
    (
        prop_oneof![Just(Gender::Male), Just(Gender::Female), Just(Gender::Company)],
        name_strategy(),
        name_strategy(),
        "[A-Z][a-z]{2,15}str\\.",
        "[1-9][0-9]{0,2}[a-c]?",
        "[0-9]{5}",
        name_strategy(),
        country_strategy(),
        birthdate_strategy(),
        prop::option::of("\\+49 [1-9][0-9]{2} [0-9]{5,8}"),
        prop::collection::vec(any::<u8>(), 1..2048),
    )
        .prop_map(
            |(gender, first, last, street, number, zip, city, country, birthdate, phone, pdf)| {
                let mut mandate = Mandate::new(
                    gender,
                    first.clone(),
                    last,
                    Address::new(street, number, zip, city, country),
                );
                if gender != Gender::Company {
                    mandate.birthdate = Some(birthdate);
                }
                mandate.email = Some(format!("{}@example.com", first.to_lowercase()));
                mandate.phone = phone;
                mandate.primary_document = Some(MandateDocument::new("mandate.pdf", pdf));
                mandate
            },
        )
}

/// Strategy for products of `mandate_id` in a category of the standard table
pub fn product_strategy(mandate_id: MandateId) -> impl Strategy<Value = Product> {
    (
        prop::sample::select(vec!["liability", "household", "accident", "legal_protection"]),
        prop_oneof![
            "[1-9][0-9]{3}".prop_map(|n: String| (Some(n), None::<String>)),
            "GP-[0-9]{4}".prop_map(|n: String| (None::<String>, Some(n))),
        ],
        "[A-Z]{2}-[0-9]{6,10}",
        premium_strategy(),
        premium_period_strategy(),
        contract_term_strategy(),
    )
        .prop_map(move |(category, (bafin_id, gpid), policy_number, premium, period, (start, end))| {
            let mut product = Product::new(
                mandate_id,
                category,
                Insurer {
                    name: "Versicherer AG".to_string(),
                    bafin_id,
                    gpid,
                },
                policy_number,
                premium,
                period,
                start,
            );
            product.contract_ended_at = end;
            product
        })
}
