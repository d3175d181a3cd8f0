// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Result Templates and Character Classes
//!
//! A template is a mini-language string whose characters are class tags;
//! each position picks one character from the tag's inventory using the next
//! site-key byte. Both the template inventories and the class inventories
//! are contractual: reordering or editing any of them changes every
//! credential derived through them.
//!
//! ## Class Tags
//!
//! - `V` / `v`: uppercase / lowercase vowel
//! - `C` / `c`: uppercase / lowercase consonant
//! - `A`: uppercase letter
//! - `a`: letter of either case
//! - `n`: digit
//! - `o`: special symbol
//! - `x`: letter, digit or symbol
//! - `' '`: a single space (phrase templates only)

use crate::value_objects::ResultType;

const TEMPLATES_MAXIMUM: &[&str] = &["anoxxxxxxxxxxxxxxxxx", "axxxxxxxxxxxxxxxxxno"];

const TEMPLATES_LONG: &[&str] = &[
    "CvcvnoCvcvCvcv",
    "CvcvCvcvnoCvcv",
    "CvcvCvcvCvcvno",
    "CvccnoCvcvCvcv",
    "CvccCvcvnoCvcv",
    "CvccCvcvCvcvno",
    "CvcvnoCvccCvcv",
    "CvcvCvccnoCvcv",
    "CvcvCvccCvcvno",
    "CvcvnoCvcvCvcc",
    "CvcvCvcvnoCvcc",
    "CvcvCvcvCvccno",
    "CvccnoCvccCvcv",
    "CvccCvccnoCvcv",
    "CvccCvccCvcvno",
    "CvcvnoCvccCvcc",
    "CvcvCvccnoCvcc",
    "CvcvCvccCvccno",
    "CvccnoCvcvCvcc",
    "CvccCvcvnoCvcc",
    "CvccCvcvCvccno",
];

const TEMPLATES_MEDIUM: &[&str] = &["CvcnoCvc", "CvcCvcno"];

const TEMPLATES_SHORT: &[&str] = &["Cvcn"];

const TEMPLATES_BASIC: &[&str] = &["aaanaaan", "aannaaan", "aaannaaa"];

const TEMPLATES_PIN: &[&str] = &["nnnn"];

const TEMPLATES_NAME: &[&str] = &["cvccvcvcv"];

const TEMPLATES_PHRASE: &[&str] = &["cvcc cvc cvccvcv cvc", "cvc cvccvcvcv cvcv", "cv cvccv cvc cvcvccv"];

/// The template inventory for a template-class result type.
pub(crate) fn templates_for(result_type: ResultType) -> Option<&'static [&'static str]> {
    match result_type {
        ResultType::TEMPLATE_MAXIMUM => Some(TEMPLATES_MAXIMUM),
        ResultType::TEMPLATE_LONG => Some(TEMPLATES_LONG),
        ResultType::TEMPLATE_MEDIUM => Some(TEMPLATES_MEDIUM),
        ResultType::TEMPLATE_SHORT => Some(TEMPLATES_SHORT),
        ResultType::TEMPLATE_BASIC => Some(TEMPLATES_BASIC),
        ResultType::TEMPLATE_PIN => Some(TEMPLATES_PIN),
        ResultType::TEMPLATE_NAME => Some(TEMPLATES_NAME),
        ResultType::TEMPLATE_PHRASE => Some(TEMPLATES_PHRASE),
        _ => None,
    }
}

/// The character inventory for a class tag.
pub(crate) fn class_characters(class: char) -> Option<&'static str> {
    match class {
        'V' => Some("AEIOU"),
        'C' => Some("BCDFGHJKLMNPQRSTVWXYZ"),
        'v' => Some("aeiou"),
        'c' => Some("bcdfghjklmnpqrstvwxyz"),
        'A' => Some("AEIOUBCDFGHJKLMNPQRSTVWXYZ"),
        'a' => Some("AEIOUaeiouBCDFGHJKLMNPQRSTVWXYZbcdfghjklmnpqrstvwxyz"),
        'n' => Some("0123456789"),
        'o' => Some("@&%?,=[]_:-+*$#!'^~;()/."),
        'x' => Some("AEIOUaeiouBCDFGHJKLMNPQRSTVWXYZbcdfghjklmnpqrstvwxyz0123456789!@#$%^&*()"),
        ' ' => Some(" "),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests the contractual inventory shapes: template counts and lengths
    /// per result type.
    #[test]
    fn test_template_inventory_shapes() {
        let cases: [(ResultType, usize, &[usize]); 8] = [
            (ResultType::TEMPLATE_MAXIMUM, 2, &[20]),
            (ResultType::TEMPLATE_LONG, 21, &[14]),
            (ResultType::TEMPLATE_MEDIUM, 2, &[8]),
            (ResultType::TEMPLATE_SHORT, 1, &[4]),
            (ResultType::TEMPLATE_BASIC, 3, &[8]),
            (ResultType::TEMPLATE_PIN, 1, &[4]),
            (ResultType::TEMPLATE_NAME, 1, &[9]),
            (ResultType::TEMPLATE_PHRASE, 3, &[20, 18, 20]),
        ];

        for (result_type, count, lengths) in cases {
            let templates = templates_for(result_type).unwrap();
            assert_eq!(templates.len(), count, "{}", result_type);
            for (i, template) in templates.iter().enumerate() {
                let expected = if lengths.len() == 1 { lengths[0] } else { lengths[i] };
                assert_eq!(template.len(), expected, "{} [{}]", result_type, i);
            }
        }
    }

    /// Tests that every tag used by any template has a character inventory.
    #[test]
    fn test_all_template_tags_resolve() {
        for result_type in [
            ResultType::TEMPLATE_MAXIMUM,
            ResultType::TEMPLATE_LONG,
            ResultType::TEMPLATE_MEDIUM,
            ResultType::TEMPLATE_SHORT,
            ResultType::TEMPLATE_BASIC,
            ResultType::TEMPLATE_PIN,
            ResultType::TEMPLATE_NAME,
            ResultType::TEMPLATE_PHRASE,
        ] {
            for template in templates_for(result_type).unwrap() {
                for tag in template.chars() {
                    assert!(class_characters(tag).is_some(), "tag {:?} in {:?}", tag, template);
                }
            }
        }
    }

    /// Tests that non-template types have no inventory.
    #[test]
    fn test_non_template_types_have_no_inventory() {
        assert!(templates_for(ResultType::STATE_PERSONAL).is_none());
        assert!(templates_for(ResultType::DERIVE_KEY).is_none());
        assert!(templates_for(ResultType::NONE).is_none());
    }

    /// Tests phrase templates contain spaces and only spaces beyond their
    /// letter classes.
    #[test]
    fn test_phrase_templates_have_spaces() {
        for template in templates_for(ResultType::TEMPLATE_PHRASE).unwrap() {
            assert!(template.contains(' '));
        }
    }
}
