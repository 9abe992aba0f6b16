use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use xqmatch::search::collect_peaks;
use xqmatch::{ImageView, MatchConfig, Template, TemplateMatcher, Threshold};

fn random_buffer(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.random_range(0..=255)).collect()
}

/// Pastes `tpl` (interleaved, `channels` per pixel) at each placement.
fn scene(
    rng: &mut StdRng,
    width: usize,
    height: usize,
    channels: usize,
    tpl: &[u8],
    tpl_w: usize,
    tpl_h: usize,
    placements: &[(usize, usize)],
) -> Vec<u8> {
    let mut image = random_buffer(rng, width * height * channels);
    for &(x0, y0) in placements {
        for ty in 0..tpl_h {
            let dst = ((y0 + ty) * width + x0) * channels;
            let src = ty * tpl_w * channels;
            image[dst..dst + tpl_w * channels].copy_from_slice(&tpl[src..src + tpl_w * channels]);
        }
    }
    image
}

#[test]
fn finds_every_exact_copy_once() {
    let mut rng = StdRng::seed_from_u64(42);
    let (tpl_w, tpl_h, ch) = (9, 7, 3);
    let tpl = random_buffer(&mut rng, tpl_w * tpl_h * ch);
    let placements = [(3, 4), (40, 5), (22, 30), (50, 41)];
    let image = scene(&mut rng, 64, 56, ch, &tpl, tpl_w, tpl_h, &placements);

    let template = Template::new(tpl, tpl_w, tpl_h, ch).unwrap();
    let view = ImageView::from_slice(&image, 64, 56, ch).unwrap();
    let matcher = TemplateMatcher::default();

    let found = matcher
        .find_all(view, &template, Threshold::SessionDefault)
        .unwrap();
    assert_eq!(found.len(), placements.len());
    let centres: HashSet<(usize, usize)> = found.iter().map(|m| (m.x, m.y)).collect();
    for (x, y) in placements {
        assert!(centres.contains(&(x + tpl_w / 2, y + tpl_h / 2)));
    }
    assert!(found.windows(2).all(|w| w[0].score >= w[1].score));

    let none = matcher
        .find_all(view, &template, Threshold::Fixed(1.0))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn grayscale_copies_are_found_too() {
    let mut rng = StdRng::seed_from_u64(7);
    let tpl = random_buffer(&mut rng, 8 * 8);
    let image = scene(&mut rng, 48, 40, 1, &tpl, 8, 8, &[(0, 0), (40, 32)]);
    let template = Template::new(tpl, 8, 8, 1).unwrap();
    let found = TemplateMatcher::default()
        .find_all(
            ImageView::from_slice(&image, 48, 40, 1).unwrap(),
            &template,
            Threshold::Fixed(0.9),
        )
        .unwrap();
    let centres: Vec<(usize, usize)> = found.iter().map(|m| (m.x, m.y)).collect();
    assert_eq!(centres.len(), 2);
    assert!(centres.contains(&(4, 4)));
    assert!(centres.contains(&(44, 36)));
}

#[test]
fn colour_distinguishes_same_luminance_pattern() {
    let mut rng = StdRng::seed_from_u64(11);
    let (tpl_w, tpl_h) = (6, 6);
    let red: Vec<u8> = (0..tpl_w * tpl_h)
        .flat_map(|_| {
            let v: u8 = rng.random();
            [v, 0, 0]
        })
        .collect();
    let black: Vec<u8> = red.chunks(3).flat_map(|p| [0, 0, p[0]]).collect();
    let image = scene(&mut rng, 30, 30, 3, &black, tpl_w, tpl_h, &[(10, 10)]);

    let template = Template::new(red, tpl_w, tpl_h, 3).unwrap();
    let found = TemplateMatcher::default()
        .find_all(
            ImageView::from_slice(&image, 30, 30, 3).unwrap(),
            &template,
            Threshold::SessionDefault,
        )
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn suppression_never_reports_a_placement_twice() {
    let mut rng = StdRng::seed_from_u64(99);
    let tpl = random_buffer(&mut rng, 5 * 5 * 3);
    let image = scene(&mut rng, 40, 40, 3, &tpl, 5, 5, &[(10, 10), (11, 25)]);
    let template = Template::new(tpl, 5, 5, 3).unwrap();
    let matcher = TemplateMatcher::new(MatchConfig {
        precision: 0.3,
        ..MatchConfig::default()
    });
    let response = matcher
        .response(ImageView::from_slice(&image, 40, 40, 3).unwrap(), &template)
        .unwrap();

    for threshold in [0.3f32, 0.5, 0.8, 0.95] {
        let found = collect_peaks(&response, threshold, 5, 5);
        let unique: HashSet<(usize, usize)> = found.iter().map(|m| (m.x, m.y)).collect();
        assert_eq!(unique.len(), found.len(), "threshold {threshold}");
        assert!(found.iter().all(|m| m.score > threshold));
    }
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_matcher_agrees_with_scalar() {
    let mut rng = StdRng::seed_from_u64(5);
    let tpl = random_buffer(&mut rng, 7 * 7 * 3);
    let image = scene(&mut rng, 80, 60, 3, &tpl, 7, 7, &[(5, 5), (60, 40)]);
    let template = Template::new(tpl, 7, 7, 3).unwrap();
    let view = ImageView::from_slice(&image, 80, 60, 3).unwrap();

    let serial = TemplateMatcher::default()
        .find_all(view, &template, Threshold::SessionDefault)
        .unwrap();
    let parallel = TemplateMatcher::new(MatchConfig {
        parallel: true,
        ..MatchConfig::default()
    })
    .find_all(view, &template, Threshold::SessionDefault)
    .unwrap();
    assert_eq!(serial, parallel);
}
