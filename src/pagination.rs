//! Page arithmetic for the lead board.

/// Number of leads requested per page.
pub const ITEMS_PER_PAGE: usize = 10;

/// Pages needed to show `total` records.
pub fn total_pages(total: usize) -> usize {
    total.div_ceil(ITEMS_PER_PAGE)
}

/// Zero-based page links for a pager: both edges plus a window around the
/// current page, `None` marking a gap.
pub fn page_links(
    total_pages: usize,
    current: usize,
    edge: usize,
    around: usize,
) -> Vec<Option<usize>> {
    if total_pages == 0 {
        return vec![];
    }

    let last = total_pages - 1;
    let current = current.min(last);
    let mut links = Vec::new();
    let mut previous: Option<usize> = None;

    for page in 0..=last {
        let near_edge = page < edge || page + edge > last;
        let near_current = page + around >= current && page <= current + around;
        if !(near_edge || near_current) {
            continue;
        }
        if previous.is_some_and(|prev| page > prev + 1) {
            links.push(None);
        }
        links.push(Some(page));
        previous = Some(page);
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(23), 3);
    }


    #[test]
    fn links_collapse_distant_pages() {
        let links = page_links(12, 6, 1, 1);
        assert_eq!(
            links,
            vec![Some(0), None, Some(5), Some(6), Some(7), None, Some(11)]
        );
    }

    #[test]
    fn links_without_gaps_for_short_lists() {
        assert_eq!(page_links(3, 0, 1, 1), vec![Some(0), Some(1), Some(2)]);
        assert!(page_links(0, 0, 1, 1).is_empty());
    }
}
