// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Property-based tests over the derivation pipeline.
//!
//! These quantify the engine's universal invariants: determinism, template
//! shape, character-class membership, and the stateful round trip. User
//! keys are constructed directly from arbitrary bytes so the properties run
//! without paying for scrypt on every case.

use proptest::prelude::*;

use savedhi_domain::{
    site_key, site_result, site_state, AlgorithmVersion, KeyCounter, KeyPurpose, ResultType, UserKey,
};

fn arb_user_key() -> impl Strategy<Value = UserKey> {
    (any::<[u8; 32]>(), 0u32..=3).prop_map(|(half, version)| {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&half);
        bytes[32..].copy_from_slice(&half);
        UserKey::new(bytes, AlgorithmVersion::try_from(version).unwrap())
    })
}

fn arb_site_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.-]{0,30}"
}

proptest! {
    /// Site keys are deterministic for any fixed descriptor.
    #[test]
    fn site_key_is_deterministic(
        user_key in arb_user_key(),
        site in arb_site_name(),
        counter in 1u32..,
    ) {
        let a = site_key(&user_key, &site, KeyCounter::new(counter), KeyPurpose::Authentication, None).unwrap();
        let b = site_key(&user_key, &site, KeyCounter::new(counter), KeyPurpose::Authentication, None).unwrap();
        prop_assert_eq!(a.bytes(), b.bytes());
        prop_assert_eq!(a.key_id(), b.key_id());
    }

    /// The three purposes never share a site key: the scope strings are
    /// effective domain separators.
    #[test]
    fn purposes_are_domain_separated(
        user_key in arb_user_key(),
        site in arb_site_name(),
    ) {
        let auth = site_key(&user_key, &site, KeyCounter::INITIAL, KeyPurpose::Authentication, None).unwrap();
        let ident = site_key(&user_key, &site, KeyCounter::INITIAL, KeyPurpose::Identification, None).unwrap();
        let rec = site_key(&user_key, &site, KeyCounter::INITIAL, KeyPurpose::Recovery, None).unwrap();
        prop_assert_ne!(auth.bytes(), ident.bytes());
        prop_assert_ne!(auth.bytes(), rec.bytes());
        prop_assert_ne!(ident.bytes(), rec.bytes());
    }

    /// Template results have a template-inventory length and draw every
    /// character from the right class inventories.
    #[test]
    fn template_results_have_template_shape(
        user_key in arb_user_key(),
        site in arb_site_name(),
        counter in 1u32..,
    ) {
        let cases: [(ResultType, &[usize], &str); 5] = [
            (ResultType::TEMPLATE_LONG, &[14], "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@&%?,=[]_:-+*$#!'^~;()/."),
            (ResultType::TEMPLATE_MEDIUM, &[8], "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@&%?,=[]_:-+*$#!'^~;()/."),
            (ResultType::TEMPLATE_PIN, &[4], "0123456789"),
            (ResultType::TEMPLATE_NAME, &[9], "abcdefghijklmnopqrstuvwxyz"),
            (ResultType::TEMPLATE_PHRASE, &[18, 20], "abcdefghijklmnopqrstuvwxyz0123456789 "),
        ];

        for (result_type, lengths, alphabet) in cases {
            let result = site_result(
                &user_key, &site, result_type, None,
                KeyCounter::new(counter), KeyPurpose::Authentication, None,
            ).unwrap();
            prop_assert!(lengths.contains(&result.len()), "{}: length {}", result_type, result.len());
            for c in result.chars() {
                prop_assert!(alphabet.contains(c), "{}: unexpected char {:?}", result_type, c);
            }
        }
    }

    /// A PIN is purely numeric and a name purely lowercase for every seed.
    #[test]
    fn narrow_templates_stay_in_class(
        user_key in arb_user_key(),
        site in arb_site_name(),
    ) {
        let pin = site_result(
            &user_key, &site, ResultType::TEMPLATE_PIN, None,
            KeyCounter::INITIAL, KeyPurpose::Authentication, None,
        ).unwrap();
        prop_assert!(pin.chars().all(|c| c.is_ascii_digit()));

        let name = site_result(
            &user_key, &site, ResultType::TEMPLATE_NAME, None,
            KeyCounter::INITIAL, KeyPurpose::Authentication, None,
        ).unwrap();
        prop_assert!(name.chars().all(|c| c.is_ascii_lowercase()));
    }

    /// Stateful persistence round-trips any NUL-free secret byte-for-byte.
    #[test]
    fn stateful_round_trip(
        user_key in arb_user_key(),
        site in arb_site_name(),
        secret in "[^\u{0}]{1,64}",
    ) {
        let state = site_state(
            &user_key, &site, ResultType::STATE_PERSONAL, &secret,
            KeyCounter::INITIAL, KeyPurpose::Authentication, None,
        ).unwrap();
        let recovered = site_result(
            &user_key, &site, ResultType::STATE_PERSONAL, Some(&state),
            KeyCounter::INITIAL, KeyPurpose::Authentication, None,
        ).unwrap();
        prop_assert_eq!(recovered, secret);
    }

    /// The key context changes the derived credential whenever present.
    #[test]
    fn context_separates_credentials(
        user_key in arb_user_key(),
        site in arb_site_name(),
        context in "[a-z]{1,12}",
    ) {
        let bare = site_key(&user_key, &site, KeyCounter::INITIAL, KeyPurpose::Recovery, None).unwrap();
        let scoped = site_key(&user_key, &site, KeyCounter::INITIAL, KeyPurpose::Recovery, Some(&context)).unwrap();
        prop_assert_ne!(bare.bytes(), scoped.bytes());
    }
}
