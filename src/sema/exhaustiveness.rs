//! Match exhaustiveness and reachability.
//!
//! Coverage is decided per scrutinee type: booleans need both literals,
//! enums need every variant, and everything else needs a catch-all.
//! Guarded arms never count toward coverage because the guard can fail
//! at runtime. A variant pattern only covers its variant when the
//! payload pattern (if any) is irrefutable.

use string_interner::DefaultStringInterner;

use crate::ast::{LiteralKind, MatchArm, Pattern, PatternKind};

use super::types::{PrimitiveTy, Type, TypeKind};

/// Outcome of checking one `match` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustivenessResult {
    pub is_exhaustive: bool,
    /// Human-readable descriptions of uncovered values.
    pub missing_patterns: Vec<String>,
    /// Indices of arms no value can reach.
    pub unreachable_arms: Vec<usize>,
}

/// Variant inventory for an enum scrutinee, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariantInfo {
    pub enum_name: String,
    pub variant_names: Vec<String>,
}

/// Check arm coverage for a `match` over `scrutinee_ty`.
///
/// `enum_info` is supplied when the scrutinee is an enum (including the
/// built-ins `Option` and `Result`); other types dispatch on the kind.
pub fn check_exhaustiveness(
    arms: &[MatchArm],
    scrutinee_ty: &Type,
    enum_info: Option<&EnumVariantInfo>,
    interner: &DefaultStringInterner,
) -> ExhaustivenessResult {
    if arms.is_empty() {
        return ExhaustivenessResult {
            is_exhaustive: false,
            missing_patterns: all_values_of(scrutinee_ty, enum_info),
            unreachable_arms: Vec::new(),
        };
    }

    let unreachable_arms = find_unreachable_arms(arms);

    // An unguarded catch-all settles coverage for every type.
    let has_catch_all = arms
        .iter()
        .any(|arm| arm.guard.is_none() && arm.pattern.is_irrefutable());
    if has_catch_all {
        return ExhaustivenessResult {
            is_exhaustive: true,
            missing_patterns: Vec::new(),
            unreachable_arms,
        };
    }

    let missing_patterns = match enum_info {
        Some(info) => missing_enum_variants(arms, info, interner),
        None => match scrutinee_ty.kind() {
            TypeKind::Primitive(PrimitiveTy::Bool) => missing_bool_values(arms),
            _ => vec!["_".to_string()],
        },
    };

    ExhaustivenessResult {
        is_exhaustive: missing_patterns.is_empty(),
        missing_patterns,
        unreachable_arms,
    }
}

/// Everything a match with no arms fails to cover.
fn all_values_of(scrutinee_ty: &Type, enum_info: Option<&EnumVariantInfo>) -> Vec<String> {
    match enum_info {
        Some(info) => info
            .variant_names
            .iter()
            .map(|v| format!("{}.{}", info.enum_name, v))
            .collect(),
        None => match scrutinee_ty.kind() {
            TypeKind::Primitive(PrimitiveTy::Bool) => {
                vec!["true".to_string(), "false".to_string()]
            }
            _ => vec!["_".to_string()],
        },
    }
}

/// Arms after the first unguarded irrefutable arm can never run.
fn find_unreachable_arms(arms: &[MatchArm]) -> Vec<usize> {
    let first_catch_all = arms
        .iter()
        .position(|arm| arm.guard.is_none() && arm.pattern.is_irrefutable());

    match first_catch_all {
        Some(idx) => ((idx + 1)..arms.len()).collect(),
        None => Vec::new(),
    }
}

/// Bool coverage: both literals must appear on unguarded arms.
fn missing_bool_values(arms: &[MatchArm]) -> Vec<String> {
    let mut has_true = false;
    let mut has_false = false;

    for arm in arms {
        if arm.guard.is_some() {
            continue;
        }
        if let PatternKind::Literal(lit) = &arm.pattern.kind {
            match lit.kind {
                LiteralKind::Bool(true) => has_true = true,
                LiteralKind::Bool(false) => has_false = true,
                _ => {}
            }
        }
    }

    let mut missing = Vec::new();
    if !has_true {
        missing.push("true".to_string());
    }
    if !has_false {
        missing.push("false".to_string());
    }
    missing
}

/// Enum coverage: every declared variant must be covered by an
/// unguarded variant pattern whose payload cannot fail.
fn missing_enum_variants(
    arms: &[MatchArm],
    info: &EnumVariantInfo,
    interner: &DefaultStringInterner,
) -> Vec<String> {
    let mut covered: Vec<&str> = Vec::new();

    for arm in arms {
        if arm.guard.is_some() {
            continue;
        }
        if let Some(variant) = covered_variant(&arm.pattern, interner) {
            covered.push(variant);
        }
    }

    info.variant_names
        .iter()
        .filter(|name| !covered.contains(&name.as_str()))
        .map(|name| format!("{}.{}", info.enum_name, name))
        .collect()
}

/// The variant a pattern fully covers, if any. A payload pattern that
/// can fail (a literal or a nested variant) leaves the variant only
/// partially covered.
fn covered_variant<'a>(
    pattern: &Pattern,
    interner: &'a DefaultStringInterner,
) -> Option<&'a str> {
    if let PatternKind::EnumVariant {
        variant, payload, ..
    } = &pattern.kind
    {
        let payload_irrefutable = match payload {
            Some(p) => p.is_irrefutable(),
            None => true,
        };
        if payload_irrefutable {
            return interner.resolve(variant.node);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Expr, ExprKind, Literal};
    use crate::span::{Span, Spanned};
    use string_interner::DefaultStringInterner;

    fn dummy_span() -> Span {
        Span::dummy()
    }

    fn empty_block() -> Block {
        Block {
            statements: Vec::new(),
            span: dummy_span(),
        }
    }

    fn wildcard_pat() -> Pattern {
        Pattern {
            kind: PatternKind::Wildcard,
            span: dummy_span(),
        }
    }

    fn bool_pat(value: bool) -> Pattern {
        Pattern {
            kind: PatternKind::Literal(Literal {
                kind: LiteralKind::Bool(value),
                span: dummy_span(),
            }),
            span: dummy_span(),
        }
    }

    fn int_pat(value: i64) -> Pattern {
        Pattern {
            kind: PatternKind::Literal(Literal {
                kind: LiteralKind::Int(value),
                span: dummy_span(),
            }),
            span: dummy_span(),
        }
    }

    fn binding_pat(interner: &mut DefaultStringInterner, name: &str) -> Pattern {
        Pattern {
            kind: PatternKind::Binding {
                mutable: false,
                name: Spanned::new(interner.get_or_intern(name), dummy_span()),
            },
            span: dummy_span(),
        }
    }

    fn variant_pat(
        interner: &mut DefaultStringInterner,
        enum_name: &str,
        variant: &str,
        payload: Option<Pattern>,
    ) -> Pattern {
        Pattern {
            kind: PatternKind::EnumVariant {
                enum_name: Spanned::new(interner.get_or_intern(enum_name), dummy_span()),
                variant: Spanned::new(interner.get_or_intern(variant), dummy_span()),
                payload: payload.map(Box::new),
            },
            span: dummy_span(),
        }
    }

    fn arm(pattern: Pattern) -> MatchArm {
        MatchArm {
            pattern,
            guard: None,
            body: empty_block(),
            span: dummy_span(),
        }
    }

    fn guarded_arm(pattern: Pattern) -> MatchArm {
        let guard = Expr {
            kind: ExprKind::Literal(Literal {
                kind: LiteralKind::Bool(true),
                span: dummy_span(),
            }),
            span: dummy_span(),
        };
        MatchArm {
            guard: Some(guard),
            ..arm(pattern)
        }
    }

    fn color_info() -> EnumVariantInfo {
        EnumVariantInfo {
            enum_name: "Color".to_string(),
            variant_names: vec![
                "Red".to_string(),
                "Green".to_string(),
                "Blue".to_string(),
            ],
        }
    }

    #[test]
    fn both_bool_literals_are_exhaustive() {
        let interner = DefaultStringInterner::new();
        let arms = vec![arm(bool_pat(true)), arm(bool_pat(false))];
        let result = check_exhaustiveness(&arms, &Type::bool(), None, &interner);
        assert!(result.is_exhaustive);
        assert!(result.unreachable_arms.is_empty());
    }

    #[test]
    fn missing_false_is_reported() {
        let interner = DefaultStringInterner::new();
        let arms = vec![arm(bool_pat(true))];
        let result = check_exhaustiveness(&arms, &Type::bool(), None, &interner);
        assert!(!result.is_exhaustive);
        assert_eq!(result.missing_patterns, vec!["false".to_string()]);
    }

    #[test]
    fn wildcard_covers_any_type() {
        let interner = DefaultStringInterner::new();
        let arms = vec![arm(int_pat(0)), arm(wildcard_pat())];
        let result = check_exhaustiveness(&arms, &Type::i32(), None, &interner);
        assert!(result.is_exhaustive);
    }

    #[test]
    fn binding_acts_as_catch_all() {
        let mut interner = DefaultStringInterner::new();
        let arms = vec![arm(binding_pat(&mut interner, "n"))];
        let result = check_exhaustiveness(&arms, &Type::i32(), None, &interner);
        assert!(result.is_exhaustive);
    }

    #[test]
    fn guarded_catch_all_does_not_discharge_coverage() {
        let mut interner = DefaultStringInterner::new();
        let arms = vec![guarded_arm(binding_pat(&mut interner, "n"))];
        let result = check_exhaustiveness(&arms, &Type::i32(), None, &interner);
        assert!(!result.is_exhaustive);
        assert_eq!(result.missing_patterns, vec!["_".to_string()]);
    }

    #[test]
    fn guarded_variant_leaves_variant_uncovered() {
        let mut interner = DefaultStringInterner::new();
        let arms = vec![
            guarded_arm(variant_pat(&mut interner, "Color", "Red", None)),
            arm(variant_pat(&mut interner, "Color", "Green", None)),
            arm(variant_pat(&mut interner, "Color", "Blue", None)),
        ];
        let result = check_exhaustiveness(
            &arms,
            &Type::enum_ref("Color", Vec::new()),
            Some(&color_info()),
            &interner,
        );
        assert!(!result.is_exhaustive);
        assert_eq!(result.missing_patterns, vec!["Color.Red".to_string()]);
    }

    #[test]
    fn enum_missing_variant_is_named_in_order() {
        let mut interner = DefaultStringInterner::new();
        let arms = vec![
            arm(variant_pat(&mut interner, "Color", "Red", None)),
            arm(variant_pat(&mut interner, "Color", "Blue", None)),
        ];
        let result = check_exhaustiveness(
            &arms,
            &Type::enum_ref("Color", Vec::new()),
            Some(&color_info()),
            &interner,
        );
        assert!(!result.is_exhaustive);
        assert_eq!(result.missing_patterns, vec!["Color.Green".to_string()]);
    }

    #[test]
    fn refutable_payload_does_not_cover_its_variant() {
        let mut interner = DefaultStringInterner::new();
        let info = EnumVariantInfo {
            enum_name: "Option".to_string(),
            variant_names: vec!["Some".to_string(), "None".to_string()],
        };
        // `Option.Some(5)` covers only one payload value.
        let arms = vec![
            arm(variant_pat(
                &mut interner,
                "Option",
                "Some",
                Some(int_pat(5)),
            )),
            arm(variant_pat(&mut interner, "Option", "None", None)),
        ];
        let result = check_exhaustiveness(
            &arms,
            &Type::option(Type::i32()),
            Some(&info),
            &interner,
        );
        assert!(!result.is_exhaustive);
        assert_eq!(result.missing_patterns, vec!["Option.Some".to_string()]);
    }

    #[test]
    fn irrefutable_payload_covers_its_variant() {
        let mut interner = DefaultStringInterner::new();
        let info = EnumVariantInfo {
            enum_name: "Option".to_string(),
            variant_names: vec!["Some".to_string(), "None".to_string()],
        };
        let payload = binding_pat(&mut interner, "v");
        let arms = vec![
            arm(variant_pat(&mut interner, "Option", "Some", Some(payload))),
            arm(variant_pat(&mut interner, "Option", "None", None)),
        ];
        let result = check_exhaustiveness(
            &arms,
            &Type::option(Type::i32()),
            Some(&info),
            &interner,
        );
        assert!(result.is_exhaustive);
    }

    #[test]
    fn arms_after_catch_all_are_unreachable() {
        let mut interner = DefaultStringInterner::new();
        let arms = vec![
            arm(wildcard_pat()),
            arm(int_pat(1)),
            arm(binding_pat(&mut interner, "n")),
        ];
        let result = check_exhaustiveness(&arms, &Type::i32(), None, &interner);
        assert!(result.is_exhaustive);
        assert_eq!(result.unreachable_arms, vec![1, 2]);
    }

    #[test]
    fn empty_match_lists_every_variant() {
        let interner = DefaultStringInterner::new();
        let result = check_exhaustiveness(
            &[],
            &Type::enum_ref("Color", Vec::new()),
            Some(&color_info()),
            &interner,
        );
        assert!(!result.is_exhaustive);
        assert_eq!(result.missing_patterns.len(), 3);
        assert_eq!(result.missing_patterns[0], "Color.Red");
    }

    #[test]
    fn empty_match_over_bool_lists_both_literals() {
        let interner = DefaultStringInterner::new();
        let result = check_exhaustiveness(&[], &Type::bool(), None, &interner);
        assert_eq!(
            result.missing_patterns,
            vec!["true".to_string(), "false".to_string()]
        );
    }
}
