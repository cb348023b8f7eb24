use crate::models::Condition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_YEAR_DOMAIN: (i32, i32) = (2004, 2017);
pub const DEFAULT_CONDITIONS: [Condition; 4] = [
    Condition::Cancer,
    Condition::Cardiovascular,
    Condition::Diabetes,
    Condition::Depression,
];

/// The singular city/state pick. Picking one replaces the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Focus {
    City(String),
    State(String),
}

/// User interactions that mutate a view's selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectionChange {
    YearRange { min: i32, max: i32 },
    ToggleCondition { id: Condition },
    SelectCity { id: String },
    SelectState { id: String },
    Reset,
}

/// Filter shared by every chart of one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    year_domain: (i32, i32),
    year_range: (i32, i32),
    conditions: BTreeSet<Condition>,
    focus: Option<Focus>,
    #[serde(skip)]
    default_focus: Option<Focus>,
    #[serde(skip)]
    domain_observed: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Selection {
    pub fn new(default_focus: Option<Focus>) -> Self {
        Self {
            year_domain: DEFAULT_YEAR_DOMAIN,
            year_range: DEFAULT_YEAR_DOMAIN,
            conditions: DEFAULT_CONDITIONS.into_iter().collect(),
            focus: default_focus.clone(),
            default_focus,
            domain_observed: false,
        }
    }

    pub fn year_domain(&self) -> (i32, i32) {
        self.year_domain
    }

    pub fn year_range(&self) -> (i32, i32) {
        self.year_range
    }

    pub fn contains_year(&self, year: i32) -> bool {
        let (min, max) = self.year_range;
        (min..=max).contains(&year)
    }

    pub fn conditions(&self) -> &BTreeSet<Condition> {
        &self.conditions
    }

    pub fn is_selected(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn city(&self) -> Option<&str> {
        match &self.focus {
            Some(Focus::City(city)) => Some(city),
            _ => None,
        }
    }

    /// Clamps both bounds into the domain. Never fails.
    pub fn set_year_range(&mut self, min: i32, max: i32) -> bool {
        let (low, high) = self.year_domain;
        let (mut min, mut max) = (min.clamp(low, high), max.clamp(low, high));
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        self.replace_range((min, max))
    }

    pub fn toggle_condition(&mut self, condition: Condition) -> bool {
        if !self.conditions.remove(&condition) {
            self.conditions.insert(condition);
        }
        true
    }

    pub fn select_city(&mut self, city: impl Into<String>) -> bool {
        self.replace_focus(Focus::City(city.into()))
    }

    pub fn select_state(&mut self, state: impl Into<String>) -> bool {
        self.replace_focus(Focus::State(state.into()))
    }

    pub fn reset(&mut self) -> bool {
        let restored = Self {
            year_domain: self.year_domain,
            year_range: self.year_domain,
            conditions: DEFAULT_CONDITIONS.into_iter().collect(),
            focus: self.default_focus.clone(),
            default_focus: self.default_focus.clone(),
            domain_observed: self.domain_observed,
        };
        let changed = restored != *self;
        *self = restored;
        changed
    }

    pub fn apply(&mut self, change: SelectionChange) -> bool {
        match change {
            SelectionChange::YearRange { min, max } => self.set_year_range(min, max),
            SelectionChange::ToggleCondition { id } => self.toggle_condition(id),
            SelectionChange::SelectCity { id } => self.select_city(id),
            SelectionChange::SelectState { id } => self.select_state(id),
            SelectionChange::Reset => self.reset(),
        }
    }

    /// Widens the domain to cover `bounds`. The first dataset replaces the
    /// built-in default; later ones extend it, so arrival order does not
    /// matter. A range that spanned the whole previous domain keeps spanning it.
    pub fn observe_year_domain(&mut self, bounds: (i32, i32)) -> bool {
        if bounds.0 > bounds.1 {
            return false;
        }
        let domain = if self.domain_observed {
            (self.year_domain.0.min(bounds.0), self.year_domain.1.max(bounds.1))
        } else {
            bounds
        };
        self.domain_observed = true;
        if domain == self.year_domain {
            return false;
        }

        let spanned = self.year_range == self.year_domain;
        self.year_domain = domain;
        if spanned {
            self.replace_range(domain)
        } else {
            let (min, max) = self.year_range;
            self.set_year_range(min, max)
        }
    }

    fn replace_range(&mut self, range: (i32, i32)) -> bool {
        let changed = self.year_range != range;
        self.year_range = range;
        changed
    }

    fn replace_focus(&mut self, focus: Focus) -> bool {
        let changed = self.focus.as_ref() != Some(&focus);
        self.focus = Some(focus);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_is_clamped_to_domain() {
        let mut selection = Selection::default();
        assert!(selection.set_year_range(1990, 2010));
        assert_eq!(selection.year_range(), (2004, 2010));

        selection.set_year_range(2030, 2012);
        assert_eq!(selection.year_range(), (2012, 2017));
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = Selection::default();
        selection.toggle_condition(Condition::Obesity);
        assert!(selection.is_selected(Condition::Obesity));
        assert_eq!(selection.conditions().len(), 5);

        selection.toggle_condition(Condition::Obesity);
        assert!(!selection.is_selected(Condition::Obesity));
    }

    #[test]
    fn state_pick_replaces_city_pick() {
        let mut selection = Selection::new(Some(Focus::City("Austin".into())));
        assert!(!selection.select_city("Austin"));
        assert!(selection.select_state("TX"));
        assert_eq!(selection.city(), None);
        assert_eq!(selection.focus(), Some(&Focus::State("TX".into())));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut selection = Selection::new(Some(Focus::City("Austin".into())));
        selection.set_year_range(2010, 2012);
        selection.toggle_condition(Condition::Cancer);
        selection.select_city("Dallas");

        assert!(selection.reset());
        assert_eq!(selection, Selection::new(Some(Focus::City("Austin".into()))));
        assert!(!selection.reset());
    }

    #[test]
    fn observed_domains_are_merged() {
        let mut selection = Selection::default();
        assert!(selection.observe_year_domain((2004, 2019)));
        assert_eq!(selection.year_range(), (2004, 2019));
        assert!(selection.observe_year_domain((1999, 2001)));
        assert_eq!(selection.year_domain(), (1999, 2019));
        assert_eq!(selection.year_range(), (1999, 2019));
        assert!(!selection.observe_year_domain((2005, 2010)));

        let mut narrowed = Selection::default();
        narrowed.set_year_range(2008, 2016);
        narrowed.observe_year_domain((2010, 2014));
        assert_eq!(narrowed.year_range(), (2010, 2014));
    }

    #[test]
    fn merged_domain_is_independent_of_order() {
        let mut first = Selection::default();
        first.observe_year_domain((1999, 2017));
        first.observe_year_domain((2004, 2017));

        let mut second = Selection::default();
        second.observe_year_domain((2004, 2017));
        second.observe_year_domain((1999, 2017));

        assert_eq!(first, second);
        assert_eq!(first.year_range(), (1999, 2017));
    }

    #[test]
    fn changes_deserialize_from_tagged_json() {
        let change: SelectionChange =
            serde_json::from_str(r#"{"action":"toggle_condition","id":"obesity"}"#).unwrap();
        assert_eq!(change, SelectionChange::ToggleCondition { id: Condition::Obesity });

        let reset: SelectionChange = serde_json::from_str(r#"{"action":"reset"}"#).unwrap();
        assert_eq!(reset, SelectionChange::Reset);
    }
}
