//! Overload resolution: applicability filtering and betterness ordering.
//!
//! [`resolve_overload`] is pure over its inputs. Candidates keep their
//! original indices throughout so ties and diagnostics are reported
//! deterministically in declaration order.

use csf_ir::Name;
use smallvec::SmallVec;

use crate::conversions::{classify_conversion, Conversion, ConversionContext};
use crate::data::TypeData;
use crate::idx::TypeId;
use crate::pool::TypePool;

/// Passing mode of a parameter or argument.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ParamModifier {
    #[default]
    Value,
    Ref,
    Out,
    /// `params T[]` trailing parameter.
    Params,
}

/// One parameter of a candidate signature.
#[derive(Clone, Debug)]
pub struct ParamSig {
    pub name: Name,
    pub ty: TypeId,
    pub modifier: ParamModifier,
    pub has_default: bool,
}

/// A callable signature offered to resolution.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub params: Vec<ParamSig>,
    /// Generic candidates lose ties against non-generic ones.
    pub is_generic: bool,
}

/// One argument at the call site, already typed by the checker.
#[derive(Clone, Debug)]
pub struct CallArgument {
    /// `f(name: expr)` argument label, if any.
    pub name: Option<Name>,
    pub ty: TypeId,
    pub modifier: ParamModifier,
}

/// Why resolution failed.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum OverloadError {
    /// No candidate accepts the arguments; `closest` is the index of the
    /// candidate that matched the most arguments, for diagnostics.
    NoApplicableCandidate { closest: Option<usize> },
    /// Two or more candidates remain tied, listed in declaration order.
    AmbiguousCall(Vec<usize>),
}

/// How a candidate absorbed the argument list.
#[derive(Clone, Debug)]
struct Applicable {
    index: usize,
    /// Conversion per argument, in argument order.
    conversions: SmallVec<[Conversion; 4]>,
    /// Whether the trailing `params` parameter was expanded.
    expanded: bool,
    is_generic: bool,
}

/// Select the unique best candidate for the arguments, or report why
/// none can be chosen.
#[tracing::instrument(level = "trace", skip(pool, candidates, arguments))]
pub fn resolve_overload(
    pool: &TypePool,
    candidates: &[Candidate],
    arguments: &[CallArgument],
) -> Result<usize, OverloadError> {
    let mut applicable: Vec<Applicable> = Vec::new();
    let mut closest: Option<(usize, usize)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        match apply(pool, candidate, arguments) {
            Ok(mut forms) => {
                // normal form beats expanded form within one candidate
                forms.sort_by_key(|form| form.expanded);
                let mut form = forms.remove(0);
                form.index = index;
                form.is_generic = candidate.is_generic;
                tracing::trace!(index, expanded = form.expanded, "candidate applicable");
                applicable.push(form);
            }
            Err(matched) => {
                if closest.is_none_or(|(_, best)| matched > best) {
                    closest = Some((index, matched));
                }
            }
        }
    }

    if applicable.is_empty() {
        return Err(OverloadError::NoApplicableCandidate {
            closest: closest.map(|(index, _)| index),
        });
    }
    if applicable.len() == 1 {
        return Ok(applicable[0].index);
    }

    // non-generic candidates win ties against generic ones
    if applicable.iter().any(|form| !form.is_generic) {
        applicable.retain(|form| !form.is_generic);
        if applicable.len() == 1 {
            return Ok(applicable[0].index);
        }
    }

    let mut best: Vec<&Applicable> = vec![&applicable[0]];
    for form in &applicable[1..] {
        let against = best[0];
        if better(form, against) {
            best = vec![form];
        } else if !better(against, form) {
            best.push(form);
        }
    }
    // the running winner must also beat every earlier candidate
    if best.len() == 1 {
        let winner = best[0];
        if applicable
            .iter()
            .all(|form| form.index == winner.index || better(winner, form))
        {
            return Ok(winner.index);
        }
        best = applicable
            .iter()
            .filter(|form| !better(winner, form))
            .collect();
    }
    Err(OverloadError::AmbiguousCall(
        best.iter().map(|form| form.index).collect(),
    ))
}

/// Try to match the arguments against a candidate, in normal form and,
/// when the last parameter is `params`, in expanded form. Errors carry
/// how many arguments matched before failing, for closest-miss
/// reporting.
fn apply(
    pool: &TypePool,
    candidate: &Candidate,
    arguments: &[CallArgument],
) -> Result<Vec<Applicable>, usize> {
    let mut forms = Vec::with_capacity(2);
    let mut best_miss = 0;

    match apply_form(pool, candidate, arguments, false) {
        Ok(form) => forms.push(form),
        Err(matched) => best_miss = matched,
    }
    let has_params = candidate
        .params
        .last()
        .is_some_and(|p| p.modifier == ParamModifier::Params);
    if has_params {
        match apply_form(pool, candidate, arguments, true) {
            Ok(form) => forms.push(form),
            Err(matched) => best_miss = best_miss.max(matched),
        }
    }
    if forms.is_empty() {
        Err(best_miss)
    } else {
        Ok(forms)
    }
}

fn apply_form(
    pool: &TypePool,
    candidate: &Candidate,
    arguments: &[CallArgument],
    expanded: bool,
) -> Result<Applicable, usize> {
    let params = &candidate.params;
    let params_element = if expanded {
        match params.last().map(|p| pool.data(p.ty)) {
            Some(TypeData::Array { element, rank: 1 }) => Some(element),
            _ => return Err(0),
        }
    } else {
        None
    };

    // which parameter each argument lands on
    let mut conversions: SmallVec<[Conversion; 4]> = SmallVec::new();
    let mut filled: SmallVec<[bool; 8]> = SmallVec::from_elem(false, params.len());
    let mut next_positional = 0usize;
    let mut matched = 0usize;

    for argument in arguments {
        let slot = match argument.name {
            Some(name) => match params.iter().position(|p| p.name == name) {
                Some(slot) => slot,
                None => return Err(matched),
            },
            None => {
                let slot = next_positional;
                if expanded && slot >= params.len().saturating_sub(1) {
                    // everything past the fixed prefix feeds the params
                    // element
                    params.len() - 1
                } else if slot >= params.len() {
                    return Err(matched);
                } else {
                    next_positional = slot + 1;
                    slot
                }
            }
        };
        let param = &params[slot];
        let target = if expanded && slot == params.len() - 1 {
            match params_element {
                Some(element) => element,
                None => return Err(matched),
            }
        } else {
            if filled[slot] {
                return Err(matched);
            }
            filled[slot] = true;
            param.ty
        };

        let conversion = if matches!(param.modifier, ParamModifier::Ref | ParamModifier::Out) {
            // by-reference arguments need the same modifier and the
            // exact type
            if argument.modifier != param.modifier || argument.ty != target {
                return Err(matched);
            }
            Conversion::Identity
        } else {
            if argument.modifier != ParamModifier::Value {
                return Err(matched);
            }
            let conversion =
                classify_conversion(pool, argument.ty, target, ConversionContext::IMPLICIT);
            if !conversion.is_implicit() {
                return Err(matched);
            }
            conversion
        };
        conversions.push(conversion);
        matched += 1;
    }

    // unmatched parameters must have defaults (or be the expandable
    // tail, which absorbs zero arguments)
    for (slot, param) in params.iter().enumerate() {
        let positionally_consumed = !expanded && slot < next_positional;
        let is_params_tail = slot == params.len() - 1
            && (expanded || param.modifier == ParamModifier::Params);
        if filled[slot] || positionally_consumed || is_params_tail {
            continue;
        }
        if !param.has_default {
            return Err(matched);
        }
    }

    Ok(Applicable {
        index: 0,
        conversions,
        expanded,
        is_generic: false,
    })
}

/// Candidate `a` is better than `b`: no argument converts worse and at
/// least one converts strictly better; an exhausted tie falls back to
/// normal form beating expanded form.
fn better(a: &Applicable, b: &Applicable) -> bool {
    debug_assert_eq!(a.conversions.len(), b.conversions.len());
    let mut strictly = false;
    for (ca, cb) in a.conversions.iter().zip(&b.conversions) {
        match ca.rank().cmp(&cb.rank()) {
            std::cmp::Ordering::Less => return false,
            std::cmp::Ordering::Greater => strictly = true,
            std::cmp::Ordering::Equal => {}
        }
    }
    if strictly {
        return true;
    }
    !a.expanded && b.expanded
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use super::*;

    fn param(interner: &StringInterner, name: &str, ty: TypeId) -> ParamSig {
        ParamSig {
            name: interner.intern(name),
            ty,
            modifier: ParamModifier::Value,
            has_default: false,
        }
    }

    fn defaulted(interner: &StringInterner, name: &str, ty: TypeId) -> ParamSig {
        ParamSig {
            has_default: true,
            ..param(interner, name, ty)
        }
    }

    fn arg(ty: TypeId) -> CallArgument {
        CallArgument {
            name: None,
            ty,
            modifier: ParamModifier::Value,
        }
    }

    fn named(interner: &StringInterner, name: &str, ty: TypeId) -> CallArgument {
        CallArgument {
            name: Some(interner.intern(name)),
            ty,
            modifier: ParamModifier::Value,
        }
    }

    #[test]
    fn exact_match_beats_widening() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let candidates = vec![
            Candidate {
                params: vec![param(&interner, "x", TypeId::LONG)],
                is_generic: false,
            },
            Candidate {
                params: vec![param(&interner, "x", TypeId::INT)],
                is_generic: false,
            },
        ];
        let result = resolve_overload(&pool, &candidates, &[arg(TypeId::INT)]);
        assert_eq!(result, Ok(1));
    }

    #[test]
    fn widening_alone_is_applicable() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let candidates = vec![Candidate {
            params: vec![param(&interner, "x", TypeId::LONG)],
            is_generic: false,
        }];
        assert_eq!(
            resolve_overload(&pool, &candidates, &[arg(TypeId::INT)]),
            Ok(0)
        );
    }

    #[test]
    fn non_generic_beats_generic() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        // f(int, byte = default) vs generic f(T); f(5) picks the former
        let candidates = vec![
            Candidate {
                params: vec![
                    param(&interner, "a", TypeId::INT),
                    defaulted(&interner, "b", TypeId::BYTE),
                ],
                is_generic: false,
            },
            Candidate {
                params: vec![param(&interner, "value", TypeId::INT)],
                is_generic: true,
            },
        ];
        let result = resolve_overload(&pool, &candidates, &[arg(TypeId::INT)]);
        assert_eq!(result, Ok(0));
    }

    #[test]
    fn named_arguments_out_of_order() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let candidates = vec![Candidate {
            params: vec![
                param(&interner, "a", TypeId::INT),
                param(&interner, "b", TypeId::INT),
            ],
            is_generic: false,
        }];
        let arguments = vec![
            named(&interner, "b", TypeId::INT),
            named(&interner, "a", TypeId::INT),
        ];
        assert_eq!(resolve_overload(&pool, &candidates, &arguments), Ok(0));
    }

    #[test]
    fn default_supplemented_tie_is_ambiguous() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        // Test(int x, int arg = 0) vs Test(int x, int arg = 0, long z = 0)
        // called as Test(1, arg: 2): both applicable, neither better
        let candidates = vec![
            Candidate {
                params: vec![
                    param(&interner, "x", TypeId::INT),
                    defaulted(&interner, "arg", TypeId::INT),
                ],
                is_generic: false,
            },
            Candidate {
                params: vec![
                    param(&interner, "x", TypeId::INT),
                    defaulted(&interner, "arg", TypeId::INT),
                    defaulted(&interner, "z", TypeId::LONG),
                ],
                is_generic: false,
            },
        ];
        let arguments = vec![arg(TypeId::INT), named(&interner, "arg", TypeId::INT)];
        assert_eq!(
            resolve_overload(&pool, &candidates, &arguments),
            Err(OverloadError::AmbiguousCall(vec![0, 1]))
        );
    }

    #[test]
    fn no_candidate_reports_closest_miss() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let candidates = vec![
            Candidate {
                params: vec![param(&interner, "s", TypeId::STRING)],
                is_generic: false,
            },
            Candidate {
                params: vec![
                    param(&interner, "a", TypeId::INT),
                    param(&interner, "s", TypeId::STRING),
                ],
                is_generic: false,
            },
        ];
        let arguments = vec![arg(TypeId::INT), arg(TypeId::INT)];
        assert_eq!(
            resolve_overload(&pool, &candidates, &arguments),
            Err(OverloadError::NoApplicableCandidate { closest: Some(1) })
        );
    }

    #[test]
    fn params_array_expands_and_normal_form_wins() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let int_array = pool.array(TypeId::INT, 1);
        let candidates = vec![Candidate {
            params: vec![ParamSig {
                name: interner.intern("values"),
                ty: int_array,
                modifier: ParamModifier::Params,
                has_default: false,
            }],
            is_generic: false,
        }];
        // expanded: each int feeds the element type
        assert_eq!(
            resolve_overload(&pool, &candidates, &[arg(TypeId::INT), arg(TypeId::INT)]),
            Ok(0)
        );
        // an explicit array binds in normal form
        assert_eq!(resolve_overload(&pool, &candidates, &[arg(int_array)]), Ok(0));
        // and absorbing zero arguments is fine
        assert_eq!(resolve_overload(&pool, &candidates, &[]), Ok(0));
    }

    #[test]
    fn ref_arguments_need_exact_type_and_modifier() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let candidates = vec![Candidate {
            params: vec![ParamSig {
                name: interner.intern("x"),
                ty: TypeId::LONG,
                modifier: ParamModifier::Ref,
                has_default: false,
            }],
            is_generic: false,
        }];
        let by_ref = CallArgument {
            name: None,
            ty: TypeId::LONG,
            modifier: ParamModifier::Ref,
        };
        assert_eq!(resolve_overload(&pool, &candidates, &[by_ref]), Ok(0));

        // widening is not allowed by reference
        let narrower = CallArgument {
            name: None,
            ty: TypeId::INT,
            modifier: ParamModifier::Ref,
        };
        assert_eq!(
            resolve_overload(&pool, &candidates, &[narrower]),
            Err(OverloadError::NoApplicableCandidate { closest: Some(0) })
        );
        // and a by-value argument does not bind a ref parameter
        assert_eq!(
            resolve_overload(&pool, &candidates, &[arg(TypeId::LONG)]),
            Err(OverloadError::NoApplicableCandidate { closest: Some(0) })
        );
    }

    #[test]
    fn betterness_is_antisymmetric() {
        let a = Applicable {
            index: 0,
            conversions: smallvec::smallvec![Conversion::Identity, Conversion::ImplicitNumeric],
            expanded: false,
            is_generic: false,
        };
        let b = Applicable {
            index: 1,
            conversions: smallvec::smallvec![Conversion::Identity, Conversion::Identity],
            expanded: false,
            is_generic: false,
        };
        assert!(better(&b, &a));
        assert!(!better(&a, &b));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn any_primitive() -> impl Strategy<Value = TypeId> {
            (1u32..TypeId::PRIMITIVE_COUNT).prop_map(TypeId::from_raw)
        }

        proptest! {
            // resolution terminates with exactly one of the three
            // outcomes and repeated calls agree
            #[test]
            fn resolution_is_total_and_deterministic(
                param_types in prop::collection::vec(
                    prop::collection::vec(any_primitive(), 0..3),
                    1..4,
                ),
                arg_types in prop::collection::vec(any_primitive(), 0..3),
            ) {
                let interner = StringInterner::new();
                let pool = TypePool::new();
                let names = ["a", "b", "c"];
                let candidates: Vec<Candidate> = param_types
                    .iter()
                    .map(|tys| Candidate {
                        params: tys
                            .iter()
                            .enumerate()
                            .map(|(i, &ty)| ParamSig {
                                name: interner.intern(names[i]),
                                ty,
                                modifier: ParamModifier::Value,
                                has_default: false,
                            })
                            .collect(),
                        is_generic: false,
                    })
                    .collect();
                let arguments: Vec<CallArgument> =
                    arg_types.iter().map(|&ty| CallArgument {
                        name: None,
                        ty,
                        modifier: ParamModifier::Value,
                    }).collect();

                let first = resolve_overload(&pool, &candidates, &arguments);
                let second = resolve_overload(&pool, &candidates, &arguments);
                prop_assert_eq!(&first, &second);
                if let Ok(index) = first {
                    prop_assert!(index < candidates.len());
                }
            }
        }
    }
}
