use crate::model::Region;

/// Replace more than `threshold` regions with their union.
///
/// Regions are expected to be padded and clipped already; the union of padded
/// boxes equals the padded union of the raw boxes, so no extra padding is applied.
/// Returns the regions and whether they were collapsed.
pub fn collapse_regions(regions: Vec<Region>, threshold: usize) -> (Vec<Region>, bool) {
    if regions.len() <= threshold {
        return (regions, false);
    }
    let mut iter = regions.into_iter();
    let first = match iter.next() {
        Some(r) => r,
        None => return (Vec::new(), false),
    };
    let union = iter.fold(first, |acc, r| acc.union(&r));
    (vec![union], true)
}
