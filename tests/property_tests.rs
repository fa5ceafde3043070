//! Property-based tests for the storefront's pure helpers.

use proptest::prelude::*;
use rust_decimal::Decimal;
use storefront_api::auth::{
    otp::generate_otp,
    validators::{is_email_like, looks_like_phone, validate_phone},
};
use storefront_api::services::quotations::compute_totals;

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|paise| Decimal::new(paise, 2))
}

fn gst_rate_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::ZERO),
        Just(Decimal::new(5, 2)),
        Just(Decimal::new(12, 2)),
        Just(Decimal::new(18, 2)),
        Just(Decimal::new(28, 2)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn ten_digit_numbers_are_phones(phone in "[0-9]{10}") {
        prop_assert!(validate_phone(&phone).is_ok());
        prop_assert!(looks_like_phone(&phone));
        prop_assert!(!is_email_like(&phone));
    }

    #[test]
    fn other_lengths_are_not_phones(phone in "[0-9]{1,9}|[0-9]{11,15}") {
        prop_assert!(validate_phone(&phone).is_err());
        prop_assert!(!looks_like_phone(&phone));
    }

    #[test]
    fn emails_are_never_phones(
        local in "[a-z]{3,10}",
        domain in "[a-z]{3,8}",
        tld in prop_oneof!["com", "in", "net"],
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_email_like(&email));
        prop_assert!(!looks_like_phone(&email));
    }

    #[test]
    fn generated_otps_are_numeric(length in 1usize..=9) {
        let otp = generate_otp(length);
        prop_assert_eq!(otp.len(), length);
        prop_assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn totals_add_up(
        amounts in prop::collection::vec(amount_strategy(), 0..20),
        rate in gst_rate_strategy(),
    ) {
        let (net, taxes, grand, rounded) = compute_totals(&amounts, rate);
        prop_assert_eq!(net, amounts.iter().copied().sum::<Decimal>());
        prop_assert_eq!(grand, net + taxes);
        prop_assert!(taxes >= Decimal::ZERO);
        prop_assert!(taxes.scale() <= 2);
        prop_assert!((rounded - grand).abs() <= Decimal::new(5, 1));
    }
}
