//! Instrument registry: the latest market snapshot plus the active
//! category filter.
//!
//! The snapshot is replaced wholesale on every poll. Filtering is a pure
//! view over the cached snapshot; changing the filter never issues a
//! fetch, the next scheduled poll simply sees the new value too.

use dinex_client::MealSummary;

/// Active category filter: the "all" sentinel or one exact category
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Category(name) => name,
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(name) => name == category,
        }
    }
}

/// Latest instrument snapshot + filter state
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    meals: Vec<MealSummary>,
    filter: CategoryFilter,
}

impl InstrumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known set with a fresh snapshot, preserving its order
    pub fn update(&mut self, snapshot: Vec<MealSummary>) {
        self.meals = snapshot;
    }

    pub fn meals(&self) -> &[MealSummary] {
        &self.meals
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    /// The subsequence of the snapshot matching the active filter, in
    /// snapshot order. An unknown category yields an empty sequence.
    pub fn filtered(&self) -> Vec<&MealSummary> {
        self.meals
            .iter()
            .filter(|meal| self.filter.matches(&meal.category))
            .collect()
    }

    /// Look up one meal by name in the latest snapshot
    pub fn get(&self, name: &str) -> Option<&MealSummary> {
        self.meals.iter().find(|meal| meal.name == name)
    }

    /// Distinct categories in first-seen snapshot order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for meal in &self.meals {
            if !seen.contains(&meal.category.as_str()) {
                seen.push(&meal.category);
            }
        }
        seen
    }

    /// Tab-bar options: the "All" sentinel followed by each category
    pub fn filter_options(&self) -> Vec<CategoryFilter> {
        let mut options = vec![CategoryFilter::All];
        options.extend(
            self.categories()
                .into_iter()
                .map(|c| CategoryFilter::Category(c.to_string())),
        );
        options
    }

    /// Advance the filter to the next tab (wrapping), or back with
    /// `forward == false`
    pub fn cycle_filter(&mut self, forward: bool) {
        let options = self.filter_options();
        let current = options
            .iter()
            .position(|option| *option == self.filter)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        self.filter = options[next].clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(name: &str, category: &str) -> MealSummary {
        MealSummary {
            name: name.into(),
            category: category.into(),
            house_supply: 500,
            best_ask: None,
            best_bid: None,
            spread: None,
        }
    }

    fn snapshot() -> Vec<MealSummary> {
        vec![
            meal("Teriyaki Chicken", "Chicken"),
            meal("Beef Stew", "Beef"),
            meal("Roasted Chicken", "Chicken"),
            meal("Brown Sugar Oatmeal", "Misc"),
        ]
    }

    #[test]
    fn test_all_filter_is_identity() {
        let mut registry = InstrumentRegistry::new();
        registry.update(snapshot());

        let filtered = registry.filtered();
        assert_eq!(filtered.len(), 4);
        let names: Vec<&str> = filtered.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Teriyaki Chicken",
                "Beef Stew",
                "Roasted Chicken",
                "Brown Sugar Oatmeal"
            ]
        );
    }

    #[test]
    fn test_category_filter_preserves_order() {
        let mut registry = InstrumentRegistry::new();
        registry.update(snapshot());
        registry.set_filter(CategoryFilter::Category("Chicken".into()));

        let names: Vec<&str> = registry.filtered().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Teriyaki Chicken", "Roasted Chicken"]);
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let mut registry = InstrumentRegistry::new();
        registry.update(snapshot());
        registry.set_filter(CategoryFilter::Category("Dessert".into()));
        assert!(registry.filtered().is_empty());
    }

    #[test]
    fn test_categories_first_seen_order() {
        let mut registry = InstrumentRegistry::new();
        registry.update(snapshot());
        assert_eq!(registry.categories(), vec!["Chicken", "Beef", "Misc"]);
    }

    #[test]
    fn test_cycle_filter_wraps() {
        let mut registry = InstrumentRegistry::new();
        registry.update(snapshot());

        registry.cycle_filter(true);
        assert_eq!(
            registry.filter(),
            &CategoryFilter::Category("Chicken".into())
        );

        registry.cycle_filter(false);
        assert_eq!(registry.filter(), &CategoryFilter::All);

        // Backwards from All wraps to the last category
        registry.cycle_filter(false);
        assert_eq!(registry.filter(), &CategoryFilter::Category("Misc".into()));
    }
}
