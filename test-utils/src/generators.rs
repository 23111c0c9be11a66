//! Shared proptest generators for advertisement API types.

use crate::builders::AdvertisementBuilder;
use jobad_client::model::{Salary, WorkType};
use jobad_client::{Advertisement, FieldError};
use proptest::prelude::*;

/// Generate advertisement ids.
pub fn advertisement_id_strategy() -> impl Strategy<Value = String> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
}

/// Generate advertiser ids.
pub fn advertiser_id_strategy() -> impl Strategy<Value = String> {
    "[1-9][0-9]{0,8}"
}

/// Generate job titles, including characters that need escaping.
pub fn job_title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 $&'\"/-]{1,80}"
}

/// Generate work types.
pub fn work_type_strategy() -> impl Strategy<Value = WorkType> {
    prop_oneof![
        Just(WorkType::FullTime),
        Just(WorkType::PartTime),
        Just(WorkType::ContractTemp),
        Just(WorkType::Casual),
    ]
}

/// Generate salary ranges with `minimum <= maximum`.
pub fn salary_strategy() -> impl Strategy<Value = Salary> {
    (
        prop_oneof![Just("AnnualPackage"), Just("HourlyRate")],
        0u32..200_000,
        0u32..100_000,
        proptest::option::of("[A-Za-z0-9 ]{1,30}"),
    )
        .prop_map(|(salary_type, minimum, spread, details)| Salary {
            salary_type: Some(salary_type.to_string()),
            minimum: Some(minimum.into()),
            maximum: Some((minimum + spread).into()),
            details,
            ..Salary::default()
        })
}

/// Generate valid advertisements, optionally with an unmodelled field.
pub fn advertisement_strategy() -> impl Strategy<Value = Advertisement> {
    (
        advertiser_id_strategy(),
        job_title_strategy(),
        work_type_strategy(),
        salary_strategy(),
        proptest::option::of("[A-Z]{3}[0-9]{4}"),
        any::<bool>(),
    )
        .prop_map(|(advertiser, title, work_type, salary, reference, urgent)| {
            let builder = AdvertisementBuilder::minimum_valid()
                .with_advertiser_id(advertiser)
                .with_job_title(title)
                .with_work_type(work_type)
                .with_salary(salary);
            let builder = match reference {
                Some(reference) => builder.with_job_reference(reference),
                None => builder,
            };
            if urgent {
                builder.with_extra("isUrgent", serde_json::json!(true))
            } else {
                builder
            }
            .build()
        })
}

/// Generate field errors.
pub fn field_error_strategy() -> impl Strategy<Value = FieldError> {
    (
        prop_oneof![
            Just("jobTitle"),
            Just("salary.minimum"),
            Just("salary.maximum"),
            Just("location.id"),
            Just("applicationEmail"),
        ],
        prop_oneof![
            Just("Required"),
            Just("ValueOutOfRange"),
            Just("InvalidValue"),
            Just("MaxLengthExceeded"),
        ],
    )
        .prop_map(|(field, code)| FieldError::new(field, code))
}

/// Generate non-success HTTP statuses.
pub fn error_status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(401u16),
        Just(403u16),
        Just(404u16),
        Just(409u16),
        Just(422u16),
        400u16..600,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_salary_strategy_orders_bounds() {
        let mut runner = TestRunner::default();
        for _ in 0..50 {
            let salary = salary_strategy().new_tree(&mut runner).unwrap().current();
            let bound = |n: Option<serde_json::Number>| n.and_then(|n| n.as_u64());
            assert!(bound(salary.minimum) <= bound(salary.maximum));
        }
    }

    #[test]
    fn test_error_status_strategy_range() {
        let mut runner = TestRunner::default();
        for _ in 0..50 {
            let status = error_status_strategy().new_tree(&mut runner).unwrap().current();
            assert!((400..600).contains(&status));
        }
    }
}
