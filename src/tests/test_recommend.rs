use std::collections::HashSet;

use crate::dataset::SongDataset;
use crate::error::RecommendError;
use crate::recommend::{QueryParams, Recommendation};
use crate::tests::test_data::{abc_corpus, build, random_corpus, song, to_csv};

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_every_song_resolves_case_insensitively() {
    let space = build(random_corpus(120, 11));
    let params = QueryParams::default();

    for s in space.dataset().iter() {
        for name in [s.name.clone(), s.name.to_uppercase(), s.name.to_lowercase()] {
            assert!(
                space.recommend(&name, &params).is_ok(),
                "'{}' should resolve",
                name
            );
        }
    }
}

#[test]
fn test_absent_song_is_not_found() {
    let space = build(abc_corpus());
    for name in ["Z", "", "A ", "AB", "Artist A"] {
        assert_eq!(
            space.recommend(name, &QueryParams::default()),
            Err(RecommendError::NotFound(name.to_string()))
        );
    }
}

#[test]
fn test_duplicate_target_resolves_to_first_occurrence() {
    let space = build(SongDataset::from_records(vec![
        song("Other", &["X"], 1980, 0.2, 0.2),
        song("Echo", &["Band"], 2010, 0.7, 0.6),
        song("Filler", &["Y"], 1995, 0.4, 0.9),
        song("Echo", &["Band"], 1970, 0.1, 0.1),
        song("More", &["Z"], 2005, 0.9, 0.3),
    ]));

    let ctx = space.query_context("ECHO", &QueryParams::default()).unwrap();
    assert_eq!(ctx.index, 1);
    assert_eq!(ctx.year, Some(2010));
    assert_eq!(ctx.energy, 0.7);
    assert_eq!(ctx.valence, 0.6);
}

#[test]
fn test_negative_or_nan_range_is_invalid() {
    let space = build(abc_corpus());
    for r in [-0.1, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            space.recommend("A", &QueryParams::new(5, 2, r)),
            Err(RecommendError::InvalidQuery(_))
        ));
    }
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_abc_scenario() {
    let space = build(abc_corpus());
    let params = QueryParams::new(10, 2, 0.1);

    let ctx = space.query_context("a", &params).unwrap();
    assert_eq!(space.candidates(&ctx), vec![0, 1]);

    let rec = space.recommend("A", &params).unwrap();
    let names: Vec<&str> = rec.songs().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["B"]);

    let b = &rec.songs()[0];
    assert_eq!(b.index, 1);
    assert_eq!(b.artists, vec!["Artist B".to_string()]);
    assert_eq!(b.year, 2001);
    assert_eq!(b.energy, 0.55);
    assert_eq!(b.valence, 0.42);
    assert_eq!(b.similarity, space.similarity(0, 1));
}

#[test]
fn test_bounds_are_inclusive_and_unclamped() {
    let space = build(SongDataset::from_records(vec![
        song("Base", &["X"], 2000, 0.5, 0.5),
        song("Edge", &["X"], 2002, 0.75, 0.25),
        song("Past", &["X"], 2003, 0.5, 0.5),
        song("Loud", &["X"], 2000, 0.76, 0.5),
        song("Pad", &["X"], 1950, 0.0, 1.0),
    ]));

    let ctx = space
        .query_context("Base", &QueryParams::new(10, 2, 0.25))
        .unwrap();
    assert_eq!(ctx.energy_range, (0.25, 0.75));
    assert_eq!(ctx.valence_range, (0.25, 0.75));
    assert_eq!(space.candidates(&ctx), vec![0, 1]);

    // a wide range reaches outside [0, 1] without clamping
    let wide = space
        .query_context("Base", &QueryParams::new(10, 60, 2.0))
        .unwrap();
    assert_eq!(wide.energy_range, (-1.5, 2.5));
    assert_eq!(space.candidates(&wide), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_only_self_matches_gives_empty_songs() {
    let space = build(abc_corpus());
    let rec = space.recommend("C", &QueryParams::new(10, 0, 0.0)).unwrap();
    assert_eq!(rec, Recommendation::Songs(vec![]));
    assert!(rec.is_empty());
}

#[test]
fn test_undated_song_has_no_similar_songs() {
    let mut undated = song("Undated", &["X"], 0, 0.5, 0.4);
    undated.year = None;
    let mut records = abc_corpus().records().to_vec();
    records.push(undated);
    let space = build(SongDataset::from_records(records));
    let params = QueryParams::new(10, 100, 1.0);

    assert_eq!(
        space.recommend("undated", &params),
        Ok(Recommendation::NoSimilarSongs)
    );

    // never recommended to dated songs either, however wide the window
    let ctx = space.query_context("A", &params).unwrap();
    assert_eq!(space.candidates(&ctx), vec![0, 1, 2, 3, 4]);
    let rec = space.recommend("A", &params).unwrap();
    assert_eq!(rec.len(), 4);
    assert!(rec.songs().iter().all(|s| s.name != "Undated"));
}

#[test]
fn test_undated_row_from_csv_has_no_similar_songs() {
    let mut csv = to_csv(abc_corpus().records());
    csv.push_str("Undated,\"['Y']\",,0.4,0.45,0.41,98,0.5,0.2\n");
    let space = build(SongDataset::from_reader(csv.as_bytes()).unwrap());

    let rec = space.recommend("Undated", &QueryParams::new(10, 2, 0.1)).unwrap();
    assert_eq!(rec, Recommendation::NoSimilarSongs);
    assert!(rec.is_empty());
}

#[test]
fn test_no_similar_songs_outcome_is_empty() {
    let rec = Recommendation::NoSimilarSongs;
    assert!(rec.songs().is_empty());
    assert_eq!(rec.len(), 0);
    assert!(rec.into_songs().is_empty());
}

#[test]
fn test_top_n_zero_is_always_empty() {
    let space = build(random_corpus(80, 21));
    for s in space.dataset().iter().take(20) {
        let rec = space.recommend(&s.name, &QueryParams::new(0, 10, 1.0)).unwrap();
        assert!(rec.is_empty());
    }
}

// ============================================================================
// Ranking invariants over a random corpus
// ============================================================================

#[test]
fn test_recommendation_invariants() {
    let space = build(random_corpus(400, 42));

    for params in [
        QueryParams::new(5, 2, 0.1),
        QueryParams::new(21, 2, 0.2),
        QueryParams::new(50, 9, 1.0),
    ] {
        for name in space.dataset().iter().step_by(7).map(|s| s.name.clone()) {
            let ctx = space.query_context(&name, &params).unwrap();
            let rec = space.recommend(&name, &params).unwrap();
            let songs = rec.songs();

            assert!(songs.len() <= params.top_n);

            let mut identities = HashSet::new();
            for (pos, r) in songs.iter().enumerate() {
                // self exclusion
                assert_ne!(r.index, ctx.index);
                // filter bounds
                assert!(ctx.admits(space.song(r.index)), "{} violates bounds", r.name);
                let base_year = ctx.year.expect("random corpus songs are dated");
                let gap = (i64::from(r.year) - i64::from(base_year)).abs();
                assert!(gap <= i64::from(params.year_tolerance));
                // reported score is the query/result similarity
                assert_eq!(r.similarity, space.similarity(ctx.index, r.index));
                // descending similarity
                if pos > 0 {
                    assert!(songs[pos - 1].similarity >= r.similarity);
                }
                // no repeated (name, artists)
                assert!(identities.insert((r.name.clone(), r.artists.clone())));
            }
        }
    }
}

#[test]
fn test_ties_keep_load_order() {
    // three songs with identical features: equal scores, ranked by row
    let space = build(SongDataset::from_records(vec![
        song("Base", &["X"], 2000, 0.5, 0.5),
        song("T1", &["A"], 2000, 0.6, 0.6),
        song("T2", &["B"], 2000, 0.6, 0.6),
        song("T3", &["C"], 2000, 0.6, 0.6),
        song("Far", &["D"], 1950, 0.0, 0.0),
        song("Farther", &["E"], 1940, 1.0, 0.1),
    ]));
    let rec = space.recommend("Base", &QueryParams::new(10, 1, 0.2)).unwrap();
    let idx: Vec<usize> = rec.songs().iter().map(|s| s.index).collect();
    assert_eq!(idx, vec![1, 2, 3]);
}

#[test]
fn test_dedup_after_truncation_without_backfill() {
    let space = build(SongDataset::from_records(vec![
        song("Base", &["X"], 2000, 0.80, 0.20),
        song("Twin", &["Duo"], 2000, 0.80, 0.20),
        song("Twin", &["Duo"], 2000, 0.80, 0.20),
        song("Twin", &["Other Duo"], 2000, 0.80, 0.20),
        song("Near", &["Y"], 2000, 0.75, 0.25),
        song("Pad1", &["Z"], 1950, 0.10, 0.90),
        song("Pad2", &["W"], 1960, 0.40, 0.60),
    ]));

    // ranks: Twin#1, Twin#2, Twin(Other Duo) all tie at the top, then Near
    let rec = space.recommend("Base", &QueryParams::new(2, 0, 0.1)).unwrap();
    let idx: Vec<usize> = rec.songs().iter().map(|s| s.index).collect();
    assert_eq!(idx, vec![1], "second Twin dropped and not backfilled");

    let rec = space.recommend("Base", &QueryParams::new(4, 0, 0.1)).unwrap();
    let idx: Vec<usize> = rec.songs().iter().map(|s| s.index).collect();
    assert_eq!(idx, vec![1, 3, 4], "same name with other artists is kept");
}

#[test]
fn test_dedup_compares_artists_cell_text() {
    let mut double_quoted = song("Twin", &["Duo"], 2000, 0.80, 0.20);
    double_quoted.artists_raw = "[\"Duo\"]".to_string();
    let space = build(SongDataset::from_records(vec![
        song("Base", &["X"], 2000, 0.80, 0.20),
        song("Twin", &["Duo"], 2000, 0.80, 0.20),
        double_quoted,
        song("Twin", &["Duo"], 2000, 0.80, 0.20),
        song("Near", &["Y"], 2000, 0.75, 0.25),
        song("Pad1", &["Z"], 1950, 0.10, 0.90),
        song("Pad2", &["W"], 1960, 0.40, 0.60),
    ]));

    // rows 1 and 2 parse to the same artists but their cells differ
    let rec = space.recommend("Base", &QueryParams::new(3, 0, 0.1)).unwrap();
    let idx: Vec<usize> = rec.songs().iter().map(|s| s.index).collect();
    assert_eq!(idx, vec![1, 2]);
}
