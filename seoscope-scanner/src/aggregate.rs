//! Assembly of the final [`CrawlResult`].

use crate::result::{CrawlResult, FoundOn, LinkMap, PageRecord, PageStatus};

/// Append every anchor list in `source` to the matching target in `into`.
///
/// Anchor texts are concatenated, not deduplicated: the same target linked
/// from two pages keeps both anchors.
pub fn merge_link_maps(into: &mut LinkMap, source: &LinkMap) {
    for (target, anchors) in source {
        into.entry(target.clone())
            .or_default()
            .extend(anchors.iter().cloned());
    }
}

pub fn aggregate(
    root_status: PageStatus,
    domain: String,
    seed_url: String,
    pages: Vec<PageRecord>,
    external: LinkMap,
    broken: LinkMap,
    found_on: FoundOn,
) -> CrawlResult {
    CrawlResult {
        status: root_status,
        domain,
        url: seed_url,
        pages,
        external,
        broken,
        found_on,
    }
}
