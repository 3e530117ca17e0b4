//! Federal rule sets and sample returns shared by unit tests.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    FilingStatusCode, FormCode, PhaseOut, RuleSetKey, TaxBracket, TaxYearRuleSet, TaxpayerInput,
};

fn brackets(rows: &[(Decimal, Decimal)]) -> Vec<TaxBracket> {
    rows.iter()
        .map(|(lower_bound, rate)| TaxBracket::new(*lower_bound, *rate))
        .collect()
}

fn corporate() -> Vec<TaxBracket> {
    brackets(&[(dec!(0), dec!(0.21))])
}

fn individual_2023(key: RuleSetKey) -> TaxYearRuleSet {
    TaxYearRuleSet::builder(key, "2023.1")
        .schedule(
            "X",
            brackets(&[
                (dec!(0), dec!(0.10)),
                (dec!(11000), dec!(0.12)),
                (dec!(44725), dec!(0.22)),
                (dec!(95375), dec!(0.24)),
                (dec!(182100), dec!(0.32)),
                (dec!(231250), dec!(0.35)),
                (dec!(578125), dec!(0.37)),
            ]),
        )
        .schedule(
            "Y-1",
            brackets(&[
                (dec!(0), dec!(0.10)),
                (dec!(22000), dec!(0.12)),
                (dec!(89450), dec!(0.22)),
                (dec!(190750), dec!(0.24)),
                (dec!(364200), dec!(0.32)),
                (dec!(462500), dec!(0.35)),
                (dec!(693750), dec!(0.37)),
            ]),
        )
        .schedule(
            "Y-2",
            brackets(&[
                (dec!(0), dec!(0.10)),
                (dec!(11000), dec!(0.12)),
                (dec!(44725), dec!(0.22)),
                (dec!(95375), dec!(0.24)),
                (dec!(182100), dec!(0.32)),
                (dec!(231250), dec!(0.35)),
                (dec!(346875), dec!(0.37)),
            ]),
        )
        .schedule(
            "Z",
            brackets(&[
                (dec!(0), dec!(0.10)),
                (dec!(15700), dec!(0.12)),
                (dec!(59850), dec!(0.22)),
                (dec!(95350), dec!(0.24)),
                (dec!(182100), dec!(0.32)),
                (dec!(231250), dec!(0.35)),
                (dec!(578100), dec!(0.37)),
            ]),
        )
        .standard_deduction(FilingStatusCode::Single, dec!(13850))
        .standard_deduction(FilingStatusCode::MarriedFilingJointly, dec!(27700))
        .standard_deduction(FilingStatusCode::MarriedFilingSeparately, dec!(13850))
        .standard_deduction(FilingStatusCode::HeadOfHousehold, dec!(20800))
        .standard_deduction(FilingStatusCode::QualifyingSurvivingSpouse, dec!(27700))
        .phase_out(
            "child_tax_credit",
            PhaseOut {
                thresholds: FilingStatusCode::ALL
                    .into_iter()
                    .map(|status| {
                        let threshold = match status {
                            FilingStatusCode::MarriedFilingJointly => dec!(400000),
                            _ => dec!(200000),
                        };
                        (status, threshold)
                    })
                    .collect::<BTreeMap<_, _>>(),
                step: dec!(1000),
                reduction_per_step: dec!(50),
            },
        )
        .parameter("se_net_earnings_factor", dec!(0.9235))
        .parameter("se_social_security_rate", dec!(0.124))
        .parameter("se_medicare_rate", dec!(0.029))
        .parameter("social_security_wage_base", dec!(160200))
        .parameter("se_minimum_earnings", dec!(400))
        .parameter("se_deductible_share", dec!(0.5))
        .parameter("qbi_rate", dec!(0.20))
        .parameter("child_tax_credit_per_child", dec!(2000))
        .build()
        .unwrap()
}

/// The 2023 federal rule set for `form`.
pub fn federal_2023(form: FormCode) -> TaxYearRuleSet {
    let key = RuleSetKey::new(2023, "federal", form.as_str());
    match form {
        FormCode::Individual => individual_2023(key),
        FormCode::CCorporation => TaxYearRuleSet::builder(key, "2023.1")
            .schedule("CORP", corporate())
            .parameter("charitable_limit_rate", dec!(0.10))
            .parameter("dividends_received_rate", dec!(0.50))
            .parameter("nol_limitation_rate", dec!(0.80))
            .build()
            .unwrap(),
        FormCode::SCorporation => TaxYearRuleSet::builder(key, "2023.1")
            .schedule("CORP", corporate())
            .build()
            .unwrap(),
        FormCode::Partnership => TaxYearRuleSet::builder(key, "2023.1").build().unwrap(),
        FormCode::TrustEstate => TaxYearRuleSet::builder(key, "2023.1")
            .schedule(
                "TRUST",
                brackets(&[
                    (dec!(0), dec!(0.10)),
                    (dec!(2900), dec!(0.24)),
                    (dec!(10550), dec!(0.35)),
                    (dec!(14450), dec!(0.37)),
                ]),
            )
            .parameter("exemption_estate", dec!(600))
            .parameter("exemption_simple_trust", dec!(300))
            .parameter("exemption_complex_trust", dec!(100))
            .build()
            .unwrap(),
        FormCode::NonProfit => TaxYearRuleSet::builder(key, "2023.1")
            .schedule("CORP", corporate())
            .parameter("ubit_specific_deduction", dec!(1000))
            .build()
            .unwrap(),
    }
}

/// A complete, realistic return for `form`.
pub fn sample_input(form: FormCode) -> TaxpayerInput {
    match form {
        FormCode::Individual => TaxpayerInput::new()
            .with_status("filing_status", "MFJ")
            .with_amount("wages", dec!(95000))
            .with_amount("taxable_interest", dec!(1200))
            .with_amount("business_income", dec!(18000))
            .with_amount("ira_deduction", dec!(6500))
            .with_count("qualifying_children", 2)
            .with_amount("federal_withholding", dec!(9000)),
        FormCode::CCorporation => TaxpayerInput::new()
            .with_amount("gross_receipts", dec!(2500000))
            .with_amount("cost_of_goods_sold", dec!(1100000))
            .with_amount("dividends", dec!(30000))
            .with_amount("salaries_and_wages", dec!(600000))
            .with_amount("charitable_contributions", dec!(90000))
            .with_amount("nol_carryover", dec!(150000))
            .with_amount("estimated_payments", dec!(100000)),
        FormCode::SCorporation => TaxpayerInput::new()
            .with_amount("gross_receipts", dec!(750000))
            .with_amount("cost_of_goods_sold", dec!(250000))
            .with_amount("compensation_of_officers", dec!(150000))
            .with_amount("net_recognized_built_in_gain", dec!(20000))
            .with_count("shareholder_count", 2),
        FormCode::Partnership => TaxpayerInput::new()
            .with_amount("gross_receipts", dec!(480000))
            .with_amount("guaranteed_payments", dec!(90000))
            .with_amount("rents", dec!(36000))
            .with_count("partner_count", 3),
        FormCode::TrustEstate => TaxpayerInput::new()
            .with_status("entity_type", "COMPLEX_TRUST")
            .with_amount("interest_income", dec!(42000))
            .with_amount("capital_gains", dec!(8000))
            .with_amount("fiduciary_fees", dec!(2500))
            .with_amount("distributions", dec!(15000)),
        FormCode::NonProfit => TaxpayerInput::new()
            .with_amount("contributions", dec!(1250000))
            .with_amount("program_service_revenue", dec!(300000))
            .with_amount("grants_paid", dec!(700000))
            .with_amount("salaries_and_compensation", dec!(600000))
            .with_amount("unrelated_business_gross_income", dec!(45000))
            .with_amount("unrelated_business_deductions", dec!(12000)),
    }
}
