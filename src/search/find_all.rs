//! Multi-instance template search with peak suppression.

#[cfg(feature = "rayon")]
use crate::kernel::rayon::ZnccRayon;
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{Kernel, ScanParams};
use crate::search::response::{PeakMask, ResponseMap};
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::{XqError, XqResult};
use crate::ImageView;

/// Default acceptance score for a template instance.
pub const DEFAULT_PRECISION: f32 = 0.96;

/// Acceptance threshold for [`TemplateMatcher::find_all`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Threshold {
    /// Use the matcher's configured precision.
    #[default]
    SessionDefault,
    /// Use an explicit score; peaks must be strictly above it.
    Fixed(f32),
}

/// Matcher configuration.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Score used when callers pass [`Threshold::SessionDefault`].
    pub precision: f32,
    /// Minimum per-pixel window variance; flatter windows score zero.
    pub min_var_i: f64,
    /// Use the row-parallel kernel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            min_var_i: ScanParams::default().min_var_i,
            parallel: false,
        }
    }
}

/// One found template instance, reported at the template centre in source
/// image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

/// Finds every instance of a template whose score clears a threshold.
#[derive(Clone, Debug, Default)]
pub struct TemplateMatcher {
    cfg: MatchConfig,
}

impl TemplateMatcher {
    pub fn new(cfg: MatchConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Resolves a threshold against the configured precision.
    pub fn resolve(&self, threshold: Threshold) -> f32 {
        match threshold {
            Threshold::SessionDefault => self.cfg.precision,
            Threshold::Fixed(value) => value,
        }
    }

    /// Computes the dense response surface of `template` over `source`.
    pub fn response(&self, source: ImageView<'_>, template: &Template) -> XqResult<ResponseMap> {
        let params = ScanParams {
            min_var_i: self.cfg.min_var_i,
        };
        dense_response(source, template, params, self.cfg.parallel)
    }

    /// Returns the centres of all instances scoring strictly above the
    /// threshold, strongest first.
    ///
    /// Zero matches is an empty vector, not an error; an error means the
    /// correlation could not run (e.g. the template is larger than the source).
    pub fn find_all(
        &self,
        source: ImageView<'_>,
        template: &Template,
        threshold: Threshold,
    ) -> XqResult<Vec<Match>> {
        let threshold = self.resolve(threshold);
        if !threshold.is_finite() {
            return Err(XqError::InvalidInput("match threshold must be finite"));
        }
        let _span = trace_span!(
            "find_all",
            width = source.width(),
            height = source.height(),
            threshold = threshold
        )
        .entered();

        let response = self.response(source, template)?;
        let matches = collect_peaks(&response, threshold, template.width(), template.height());
        trace_event!("find_all_matches", count = matches.len());
        Ok(matches)
    }
}

#[cfg(feature = "rayon")]
fn dense_response(
    source: ImageView<'_>,
    template: &Template,
    params: ScanParams,
    parallel: bool,
) -> XqResult<ResponseMap> {
    if parallel {
        ZnccRayon::response(source, template.plan(), params)
    } else {
        ZnccScalar::response(source, template.plan(), params)
    }
}

#[cfg(not(feature = "rayon"))]
fn dense_response(
    source: ImageView<'_>,
    template: &Template,
    params: ScanParams,
    _parallel: bool,
) -> XqResult<ResponseMap> {
    ZnccScalar::response(source, template.plan(), params)
}

/// Repeatedly takes the global maximum of `response` until it no longer
/// clears `threshold`, suppressing each accepted peak's neighbourhood.
pub fn collect_peaks(
    response: &ResponseMap,
    threshold: f32,
    tpl_width: usize,
    tpl_height: usize,
) -> Vec<Match> {
    let mut mask = PeakMask::for_response(response);
    let mut out = Vec::new();
    while let Some(peak) = response.max_unmasked(&mask) {
        if peak.score <= threshold {
            break;
        }
        out.push(Match {
            x: peak.x + tpl_width / 2,
            y: peak.y + tpl_height / 2,
            score: peak.score,
        });
        response.suppress(&mut mask, peak, threshold);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{collect_peaks, MatchConfig, TemplateMatcher, Threshold};
    use crate::search::ResponseMap;
    use crate::template::Template;
    use crate::{ImageView, XqError};

    #[test]
    fn plateau_is_reported_once() {
        #[rustfmt::skip]
        let scores = vec![
            0.97, 0.98, 0.0,
            0.99, 0.97, 0.0,
            0.0,  0.0,  0.0,
        ];
        let response = ResponseMap::new(scores, 3, 3).unwrap();
        let found = collect_peaks(&response, 0.96, 4, 6);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].x, found[0].y), (2, 4));
    }

    #[test]
    fn threshold_is_strict() {
        let response = ResponseMap::new(vec![0.5, 0.96, 0.2, 0.1], 2, 2).unwrap();
        assert!(collect_peaks(&response, 0.96, 1, 1).is_empty());
        assert_eq!(collect_peaks(&response, 0.95, 1, 1).len(), 1);
    }

    #[test]
    fn session_default_uses_precision() {
        let matcher = TemplateMatcher::new(MatchConfig {
            precision: 0.5,
            ..MatchConfig::default()
        });
        assert_eq!(matcher.resolve(Threshold::SessionDefault), 0.5);
        assert_eq!(matcher.resolve(Threshold::Fixed(0.8)), 0.8);
    }

    #[test]
    fn template_larger_than_source_fails() {
        let tpl_data: Vec<u8> = (0..6 * 6).map(|v| (v * 7) as u8).collect();
        let template = Template::new(tpl_data, 6, 6, 1).unwrap();
        let source = vec![3u8; 16];
        let err = TemplateMatcher::default()
            .find_all(
                ImageView::from_slice(&source, 4, 4, 1).unwrap(),
                &template,
                Threshold::SessionDefault,
            )
            .unwrap_err();
        assert!(matches!(err, XqError::Match { .. }));
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let tpl_data: Vec<u8> = (0..5 * 5).map(|v| (v * 11) as u8).collect();
        let template = Template::new(tpl_data, 5, 5, 1).unwrap();
        let source: Vec<u8> = (0..30 * 30).map(|v| (v * 37 % 251) as u8).collect();
        let view = ImageView::from_slice(&source, 30, 30, 1).unwrap();
        let matcher = TemplateMatcher::default();
        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = matcher
                .find_all(view, &template, Threshold::Fixed(value))
                .unwrap_err();
            assert!(matches!(err, XqError::InvalidInput(_)));
        }
    }
}
