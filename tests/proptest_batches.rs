//! Property-based tests using proptest
//!
//! Batch partitioning, fan-out output ordering and sitemap order under
//! randomized inputs.

use gscq::batch::{create_batches, fan_out, BatchOptions};
use gscq::sitemap::{parse_sitemap, SitemapDocument, SitemapEntry};
use proptest::prelude::*;

/// Generate a list of page URLs (duplicates allowed)
fn arb_urls() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}(/[a-z0-9]{1,6}){0,3}", 0..120)
        .prop_map(|paths| {
            paths
                .into_iter()
                .map(|p| format!("https://example.com/{}", p))
                .collect()
        })
}

proptest! {
    /// Batches are ceil(N/B) contiguous slices whose concatenation is the input
    #[test]
    fn batches_cover_input_in_order(
        items in prop::collection::vec(any::<u16>(), 0..500),
        size in 1usize..80,
    ) {
        let batches = create_batches(&items, size);

        prop_assert_eq!(batches.len(), items.len().div_ceil(size));
        for (i, batch) in batches.iter().enumerate() {
            prop_assert!(!batch.is_empty());
            if i + 1 < batches.len() {
                prop_assert_eq!(batch.len(), size);
            } else {
                prop_assert!(batch.len() <= size);
            }
        }

        let flattened: Vec<u16> = batches.concat();
        prop_assert_eq!(flattened, items);
    }

    /// Zero batch size behaves like one
    #[test]
    fn zero_batch_size_is_clamped(items in prop::collection::vec(any::<u8>(), 0..50)) {
        prop_assert_eq!(create_batches(&items, 0), create_batches(&items, 1));
    }

    /// Output follows sitemap order and every successful URL carries its own result
    #[test]
    fn fan_out_preserves_order(urls in arb_urls(), batch_size in 1usize..20, fail_mod in 2usize..7) {
        let entries: Vec<SitemapEntry> = urls.iter().map(SitemapEntry::new).collect();
        let options = BatchOptions { batch_size, ..Default::default() };

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let out = runtime.block_on(fan_out(entries, &options, move |url| async move {
            if url.len() % fail_mod == 0 {
                anyhow::bail!("failed {}", url);
            }
            Ok(url.to_uppercase())
        }));

        prop_assert_eq!(out.len(), urls.len());
        for (collated, url) in out.iter().zip(&urls) {
            prop_assert_eq!(&collated.entry.loc, url);
            if url.len() % fail_mod == 0 {
                prop_assert!(collated.result.is_none());
            } else {
                prop_assert_eq!(collated.result.clone(), Some(url.to_uppercase()));
            }
        }
    }

    /// Parsed urlset keeps document order
    #[test]
    fn urlset_parse_keeps_order(urls in arb_urls()) {
        let body: String = urls.iter().map(|u| format!("<url><loc>{}</loc></url>", u)).collect();
        let xml = format!("<urlset>{}</urlset>", body);

        match parse_sitemap(&xml) {
            Ok(SitemapDocument::UrlSet(entries)) => {
                let locs: Vec<String> = entries.into_iter().map(|e| e.loc).collect();
                prop_assert_eq!(locs, urls);
            }
            other => prop_assert!(false, "unexpected parse result: {:?}", other),
        }
    }
}
