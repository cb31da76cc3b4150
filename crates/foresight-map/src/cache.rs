use foresight_scene::tour::default_plan;
use foresight_scene::{Rgb, TourSegment};

use crate::store::Store;
use crate::versioned::Memoized;

/// One row of the pillar legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
    pub methodologies: usize,
}

pub struct Cache {
    pub tour_plan: Memoized<Store, u64, Vec<TourSegment>>,
    pub legend: Memoized<Store, u64, Vec<LegendEntry>>,
}

impl Cache {
    pub fn new() -> Self {
        let tour_plan = Memoized::new(
            |s: &Store| s.content.version(),
            |s: &Store| default_plan(s.content.get()),
        );

        let legend = Memoized::new(
            |s: &Store| s.content.version(),
            |s: &Store| {
                s.content
                    .get()
                    .pillars
                    .iter()
                    .map(|p| LegendEntry {
                        label: p.label.clone(),
                        color: p.color(),
                        methodologies: p.children.len(),
                    })
                    .collect()
            },
        );

        Self { tour_plan, legend }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::bundled_content;
    use foresight_scene::SceneConfig;

    #[test]
    fn derived_views_follow_the_content_version() {
        let mut store =
            Store::new(bundled_content().unwrap(), SceneConfig::default()).unwrap();
        let mut cache = Cache::new();

        assert_eq!(cache.tour_plan.get(&store).len(), 6);
        assert_eq!(cache.legend.get(&store)[0].label, "Horizon Scanning");
        assert_eq!(cache.legend.get(&store)[0].methodologies, 3);
        assert_eq!(cache.legend.recomputed(), 1);

        let mut content = bundled_content().unwrap();
        content.tour.clear();
        store.apply_content(content).unwrap();
        // center, then each pillar and its first methodology
        assert_eq!(cache.tour_plan.get(&store).len(), 1 + 4 * 2);
        assert_eq!(cache.tour_plan.recomputed(), 2);
    }
}
