use std::collections::HashMap;

use crate::error::Result;
use crate::types::DogId;

use super::pedigree::Pedigree;

/// Compute the inbreeding coefficient of every dog in the pedigree, with no
/// generation bound.
///
/// Dogs are processed parents-first. For dog *i* with sire *s* and dam *d*:
///
/// - If either parent is unknown (or dangling): F[i] = 0
/// - If both parents known: F[i] = 0.5 * a(s, d)
///
/// where a(s, d) is the additive relationship between sire and dam, given by
/// the recursive formula
///
///   a(p, p) = 1 + F[p]
///   a(p, q) = 0.5 * (a(p, sire_q) + a(p, dam_q))   if p precedes q
///
/// This is the whole-pedigree counterpart of the bounded path-counting
/// analysis; on a pedigree shallower than the bound both agree.
///
/// # Returns
///
/// `(dog id, F)` pairs in parents-first order.
///
/// # Errors
///
/// Returns an error if the pedigree contains a cycle.
pub fn compute_inbreeding(ped: &Pedigree) -> Result<Vec<(DogId, f64)>> {
    let order = ped.topological_order()?;
    let n = order.len();

    let index_of: HashMap<&str, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut sire_of: Vec<Option<usize>> = Vec::with_capacity(n);
    let mut dam_of: Vec<Option<usize>> = Vec::with_capacity(n);
    for id in &order {
        let rec = ped.get(id);
        let resolve = |p: Option<&String>| p.and_then(|p| index_of.get(p.as_str()).copied());
        sire_of.push(rec.and_then(|r| resolve(r.sire.as_ref())));
        dam_of.push(rec.and_then(|r| resolve(r.dam.as_ref())));
    }

    let table = Parents {
        sire: &sire_of,
        dam: &dam_of,
    };
    let mut f = vec![0.0_f64; n];
    // Entries only involve dogs whose F is already final, so the cache stays
    // valid for the whole pass.
    let mut cache: HashMap<(usize, usize), f64> = HashMap::new();

    for i in 0..n {
        if let (Some(s), Some(d)) = (sire_of[i], dam_of[i]) {
            f[i] = 0.5 * relationship_cached(&table, s, d, &f, &mut cache);
        }
    }

    let inbred = f.iter().filter(|&&x| x > 0.0).count();
    log::debug!("Computed inbreeding for {} dogs ({} inbred)", n, inbred);

    Ok(order
        .into_iter()
        .map(str::to_string)
        .zip(f)
        .collect())
}

/// Parent indices in parents-first order.
struct Parents<'a> {
    sire: &'a [Option<usize>],
    dam: &'a [Option<usize>],
}

fn relationship_cached(
    ped: &Parents<'_>,
    p: usize,
    q: usize,
    f: &[f64],
    cache: &mut HashMap<(usize, usize), f64>,
) -> f64 {
    // Ensure a <= b for canonical form.
    let (a, b) = if p <= q { (p, q) } else { (q, p) };

    if let Some(&val) = cache.get(&(a, b)) {
        return val;
    }

    let result = if a == b {
        1.0 + f[a]
    } else {
        // a < b: b's parents precede b, so recurse on them.
        match (ped.sire[b], ped.dam[b]) {
            (Some(s), Some(d)) => {
                0.5 * (relationship_cached(ped, a, s, f, cache)
                    + relationship_cached(ped, a, d, f, cache))
            }
            (Some(s), None) => 0.5 * relationship_cached(ped, a, s, f, cache),
            (None, Some(d)) => 0.5 * relationship_cached(ped, a, d, f, cache),
            (None, None) => 0.0,
        }
    };

    cache.insert((a, b), result);
    result
}
