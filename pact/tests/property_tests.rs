//! Property-based tests for the contract library.
//!
//! Tests validate:
//! - Contract serialization round-trip
//! - Pact file naming from participants
//! - Interaction order and lookup

use jobad_pact::{Contract, ContractBuilder, Interaction, Request, Response};
use proptest::prelude::*;

// Strategy for generating participant names
fn participant_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("ats-sync".to_string()),
        Just("job-board-bridge".to_string()),
        Just("advertisement-api".to_string()),
        Just("hirer-portal".to_string()),
    ]
}

// Strategy for generating HTTP methods
fn http_method_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("HEAD".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("PATCH".to_string()),
    ]
}

// Strategy for generating paths
fn path_strategy() -> impl Strategy<Value = String> {
    "/[a-z][a-z0-9/-]{2,30}"
}

fn contract_strategy() -> impl Strategy<Value = Contract> {
    (
        participant_strategy(),
        participant_strategy(),
        proptest::collection::vec(
            (http_method_strategy(), path_strategy(), 200u16..600, any::<bool>()),
            0..5,
        ),
    )
        .prop_map(|(consumer, provider, interactions)| {
            interactions
                .into_iter()
                .enumerate()
                .fold(
                    ContractBuilder::new(consumer, provider),
                    |builder, (i, (method, path, status, stateful))| {
                        let interaction = Interaction::new(format!("interaction {i}"))
                            .with_request(Request::new(method, path))
                            .will_respond_with(Response::status(status));
                        let interaction = if stateful {
                            interaction.given("an advertisement exists")
                        } else {
                            interaction
                        };
                        builder.interaction(interaction)
                    },
                )
                .build()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* generated contract, serialization to JSON and
    /// deserialization back SHALL produce an identical object.
    #[test]
    fn prop_contract_serialization_roundtrip(contract in contract_strategy()) {
        let json = serde_json::to_string(&contract).unwrap();
        let restored: Contract = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(contract, restored);
    }

    /// *For any* participants, the pact file is named after both.
    #[test]
    fn prop_file_name(contract in contract_strategy()) {
        prop_assert_eq!(
            contract.file_name(),
            format!("{}-{}.json", contract.consumer.name, contract.provider.name)
        );
    }

    /// *For any* generated contract, interactions keep declaration order
    /// and each is found by its description.
    #[test]
    fn prop_interactions_in_declared_order(contract in contract_strategy()) {
        for (i, interaction) in contract.interactions.iter().enumerate() {
            prop_assert_eq!(&interaction.description, &format!("interaction {i}"));
            prop_assert_eq!(contract.interaction(&interaction.description), Some(interaction));
        }
    }
}
