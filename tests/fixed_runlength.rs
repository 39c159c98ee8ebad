use anyhow::Result;
use oorandom::Rand64;

use TreeLens::codec::EntropyTables;
use TreeLens::config::DumpConfig;
use TreeLens::dump::Dumper;
use TreeLens::error::DumpError;
use TreeLens::page::fixed::{decode_fixed, expand, regroup};
use TreeLens::page::{
    header_read, FixedLayout, FixedRecords, Page, PageBuilder, PageType, RepeatGroup,
};
use TreeLens::source::MemPageSource;

const RLE4: FixedLayout = FixedLayout { fixed_len: 4, repeat_comp: true };

fn random_groups(rng: &mut Rand64, n: usize) -> Vec<RepeatGroup> {
    // маленький алфавит, чтобы соседние группы совпадали
    let alphabet: [&[u8; 4]; 3] = [b"aaaa", b"bbbb", b"cccc"];
    (0..n)
        .map(|_| RepeatGroup {
            count: rng.rand_range(1..40) as u16,
            value: alphabet[rng.rand_range(0..3) as usize].to_vec(),
            deleted: rng.rand_range(0..4) == 0,
        })
        .collect()
}

fn build(groups: &[RepeatGroup]) -> Result<Vec<u8>> {
    let mut b = PageBuilder::new(PageType::ColFixed).fixed_layout(RLE4);
    for g in groups {
        b = b.repeat_group(g.count, &g.value, g.deleted)?;
    }
    let size = b.min_size(512);
    Ok(b.finish(size)?)
}

/// sum(repeat) == records, expand/regroup сохраняют последовательность записей.
#[test]
fn run_length_invariants_random() -> Result<()> {
    let mut rng = Rand64::new(0x5EED_u128);
    for round in 0..200 {
        let n = rng.rand_range(1..60) as usize;
        let groups = random_groups(&mut rng, n);
        let bytes = build(&groups)?;
        let (hdr, off) = header_read(&bytes)?;
        let counts = hdr.body.counts().ok_or_else(|| anyhow::anyhow!("no counts"))?;

        let recs = decode_fixed(&bytes, off, &counts, &RLE4)?;
        let FixedRecords::Repeat(decoded) = &recs else {
            anyhow::bail!("round {}: expected run-length records", round);
        };
        assert_eq!(decoded, &groups, "round {}", round);
        let total: u64 = decoded.iter().map(|g| g.count as u64).sum();
        assert_eq!(total, counts.records, "round {}", round);

        let flat = expand(decoded);
        assert_eq!(flat.len() as u64, counts.records, "round {}", round);

        let merged = regroup(&flat);
        assert!(merged.len() <= decoded.len(), "round {}", round);
        assert_eq!(expand(&merged), flat, "round {}", round);
        assert!(merged
            .windows(2)
            .all(|w| w[0].value != w[1].value || w[0].deleted != w[1].deleted));
    }
    Ok(())
}

/// Три "aaaa" и две удалённые "bbbb": две строки дампа, пять записей.
#[test]
fn run_length_scenario_dump() -> Result<()> {
    let groups = vec![
        RepeatGroup { count: 3, value: b"aaaa".to_vec(), deleted: false },
        RepeatGroup { count: 2, value: b"bbbb".to_vec(), deleted: true },
    ];
    let bytes = build(&groups)?;
    let size = bytes.len() as u32;
    let src = MemPageSource::new();
    let cfg = DumpConfig::default().with_fixed_len(4).with_repeat_comp(true);
    let d = Dumper::new(&src, cfg, EntropyTables::none());
    let out = d.render_page(&Page::new(1, size, bytes.clone()))?;
    let body: Vec<&str> = out.lines().filter(|l| l.starts_with("\trepeat")).collect();
    assert_eq!(body, vec!["\trepeat 3 {aaaa}", "\trepeat 2 {deleted}"]);

    let (hdr, off) = header_read(&bytes)?;
    let counts = hdr.body.counts().ok_or_else(|| anyhow::anyhow!("no counts"))?;
    let flat = decode_fixed(&bytes, off, &counts, &RLE4)?.expanded();
    assert_eq!(flat.len(), 5);
    assert!(!flat[2].deleted && flat[3].deleted && flat[4].deleted);
    Ok(())
}

#[test]
fn zero_repeat_count_is_illegal() -> Result<()> {
    let mut bytes = build(&[RepeatGroup { count: 1, value: b"aaaa".to_vec(), deleted: false }])?;
    // repeat u16 сразу за заголовком
    bytes[32] = 0;
    bytes[20] = 0;
    let src = MemPageSource::new();
    let cfg = DumpConfig::default().with_fixed_len(4).with_repeat_comp(true);
    let d = Dumper::new(&src, cfg, EntropyTables::none());
    let size = bytes.len() as u32;
    let err = d.render_page(&Page::new(1, size, bytes)).unwrap_err();
    assert!(matches!(err, DumpError::IllegalFormat(_)));
    Ok(())
}

#[test]
fn fixed_page_without_width_is_illegal() -> Result<()> {
    let bytes = build(&[RepeatGroup { count: 1, value: b"aaaa".to_vec(), deleted: false }])?;
    let src = MemPageSource::new();
    let d = Dumper::new(&src, DumpConfig::default(), EntropyTables::none());
    let size = bytes.len() as u32;
    assert!(matches!(
        d.render_page(&Page::new(1, size, bytes)),
        Err(DumpError::IllegalFormat(_))
    ));
    Ok(())
}
