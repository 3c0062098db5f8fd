//! Return-alias and freeable-array analysis.
//!
//! Flow-insensitive and whole-function. Any array that may denote the same
//! storage as a returned array belongs to the caller after the return; every
//! other locally allocated array is freed just before the return statement.

use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Arrays that may alias a returned array.
///
/// Starts from `return_arrays` and adds the other side of every pair that
/// has exactly one side in the set, until nothing changes. The result keeps
/// discovery order.
pub fn compute_return_aliases<T>(return_arrays: &[T], aliased_pairs: &[(T, T)]) -> Vec<T>
where
    T: Copy + Eq + Hash,
{
    let mut closure: Vec<T> = Vec::with_capacity(return_arrays.len());
    let mut seen: FxHashSet<T> = FxHashSet::default();
    for &array in return_arrays {
        if seen.insert(array) {
            closure.push(array);
        }
    }

    let mut iteration = 0;
    loop {
        iteration += 1;
        let mut changed = false;
        for &(left, right) in aliased_pairs {
            let added = match (seen.contains(&left), seen.contains(&right)) {
                (true, false) => right,
                (false, true) => left,
                _ => continue,
            };
            seen.insert(added);
            closure.push(added);
            changed = true;
        }
        if !changed {
            break;
        }
    }

    tracing::debug!(
        iterations = iteration,
        aliases = closure.len(),
        "return aliases converged"
    );
    closure
}

/// Local arrays not reachable from a return, in allocation order.
pub fn compute_freeable_locals<T>(local_arrays: &[T], return_aliases: &[T]) -> Vec<T>
where
    T: Copy + Eq + Hash,
{
    let returned: FxHashSet<T> = return_aliases.iter().copied().collect();
    let mut seen: FxHashSet<T> = FxHashSet::default();
    local_arrays
        .iter()
        .copied()
        .filter(|array| !returned.contains(array) && seen.insert(*array))
        .collect()
}

/// Both analysis results for one function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasInfo<T> {
    pub return_aliases: Vec<T>,
    pub freeable: Vec<T>,
}

impl<T: Copy + Eq + Hash> AliasInfo<T> {
    pub fn analyze(return_arrays: &[T], local_arrays: &[T], aliased_pairs: &[(T, T)]) -> Self {
        let return_aliases = compute_return_aliases(return_arrays, aliased_pairs);
        let freeable = compute_freeable_locals(local_arrays, &return_aliases);
        AliasInfo {
            return_aliases,
            freeable,
        }
    }
}
