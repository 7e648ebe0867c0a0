use crate::config::constants::{JEWELRY_FIXED_EXCLUSIONS, METAL_KEYWORDS};
use crate::domain::{GemstoneFilters, JewelryFilters, Task, TaskFilters, WatchFilters};

/// One upstream search request, already expanded from a task's filters
/// (spec §4.1 step 5: jewelry fans out per selected metal, gemstone fans
/// out per selected stone type; everything else is a single query).
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keywords: String,
    pub category_ids: Option<String>,
    pub min_price: f64,
    pub max_price: f64,
}

/// Builds the set of search queries a task expands into. Jewelry tasks
/// with multiple selected metals and gemstone tasks with multiple
/// selected stone types each produce one query per value so the upstream
/// keyword search doesn't have to OR unrelated terms together (spec §4.1,
/// §7 item: "multi-metal tasks issue one search per metal").
pub fn queries_for(task: &Task) -> Vec<SearchQuery> {
    match &task.filters {
        TaskFilters::Jewelry(f) => jewelry_queries(task, f),
        TaskFilters::Watch(f) => vec![watch_query(task, f)],
        TaskFilters::Gemstone(f) => gemstone_queries(task, f),
    }
}

fn base_exclusions(task: &Task) -> Vec<String> {
    let mut terms: Vec<String> = JEWELRY_FIXED_EXCLUSIONS.iter().map(|s| s.to_string()).collect();
    terms.extend(task.exclude_keywords.iter().cloned());
    terms
}

/// Metals the task did *not* select, excluded from the title so a
/// mixed-metal listing doesn't pollute a single-metal search. The silver
/// family is skipped to avoid over-blocking (spec §4.5 step 2).
fn unselected_metal_exclusions(selected: &[String]) -> Vec<String> {
    if selected.is_empty() {
        return Vec::new();
    }
    METAL_KEYWORDS
        .iter()
        .filter(|m| **m != "silver")
        .filter(|m| !selected.iter().any(|s| s.eq_ignore_ascii_case(m)))
        .map(|m| m.to_string())
        .collect()
}

fn with_negatives(positive: &str, exclusions: &[String]) -> String {
    let mut q = positive.to_string();
    for term in exclusions {
        q.push_str(&format!(" -\"{term}\""));
    }
    q
}

/// OR-joined category filter string for the task's `allowed_category_ids`,
/// or `None` when the task imposes no restriction (spec §4.1 step 5).
fn category_filter(task: &Task) -> Option<String> {
    (!task.allowed_category_ids.is_empty()).then(|| task.allowed_category_ids.join("|"))
}

fn jewelry_queries(task: &Task, filters: &JewelryFilters) -> Vec<SearchQuery> {
    let mut exclusions = base_exclusions(task);
    exclusions.extend(unselected_metal_exclusions(&filters.metals));
    let metals: Vec<&str> = if filters.metals.is_empty() {
        METAL_KEYWORDS.to_vec()
    } else {
        filters.metals.iter().map(String::as_str).collect()
    };
    let category_ids = category_filter(task);

    metals
        .into_iter()
        .map(|metal| {
            let mut positive = metal.to_string();
            for brand in &filters.brands {
                positive.push(' ');
                positive.push_str(brand);
            }
            SearchQuery {
                keywords: with_negatives(&positive, &exclusions),
                category_ids: category_ids.clone(),
                min_price: *task.min_price,
                max_price: *task.max_price,
            }
        })
        .collect()
}

fn watch_query(task: &Task, filters: &WatchFilters) -> SearchQuery {
    let exclusions = base_exclusions(task);
    let positive = filters.brands.join(" ");
    SearchQuery {
        keywords: with_negatives(&positive, &exclusions),
        category_ids: category_filter(task),
        min_price: *task.min_price,
        max_price: *task.max_price,
    }
}

fn gemstone_queries(task: &Task, filters: &GemstoneFilters) -> Vec<SearchQuery> {
    let exclusions = base_exclusions(task);
    let category_ids = category_filter(task);

    let stone_types: Vec<String> = if filters.stone_types.is_empty() {
        vec![String::new()]
    } else {
        filters.stone_types.clone()
    };

    stone_types
        .into_iter()
        .map(|stone| SearchQuery {
            keywords: with_negatives(&stone, &exclusions),
            category_ids: category_ids.clone(),
            min_price: *task.min_price,
            max_price: *task.max_price,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GemstoneFilters, JewelryFilters, TaskStatus};

    fn task(filters: TaskFilters) -> Task {
        Task {
            id: "t".to_string(),
            user_id: "u".to_string(),
            name: "n".to_string(),
            status: TaskStatus::Active,
            exclude_keywords: vec!["fake".to_string()],
            min_price: crate::config::Money::new(10.0),
            max_price: crate::config::Money::new(200.0),
            allowed_category_ids: vec![],
            poll_interval_s: 60,
            last_run: None,
            max_detail_fetches: 0,
            filters,
        }
    }

    #[test]
    fn jewelry_multi_metal_task_issues_one_query_per_metal() {
        let mut filters = JewelryFilters::default();
        filters.metals = vec!["gold".to_string(), "platinum".to_string()];
        let t = task(TaskFilters::Jewelry(filters));
        let queries = queries_for(&t);
        assert_eq!(queries.len(), 2);
        assert!(queries[0].keywords.starts_with("gold"));
        assert!(queries[1].keywords.starts_with("platinum"));
    }

    #[test]
    fn jewelry_query_excludes_unselected_metals_but_not_silver() {
        let mut filters = JewelryFilters::default();
        filters.metals = vec!["gold".to_string()];
        let t = task(TaskFilters::Jewelry(filters));
        let queries = queries_for(&t);
        assert_eq!(queries.len(), 1);
        assert!(queries[0].keywords.contains("-\"platinum\""));
        assert!(queries[0].keywords.contains("-\"palladium\""));
        assert!(!queries[0].keywords.contains("-\"silver\""));
    }

    #[test]
    fn task_exclude_keywords_and_fixed_exclusions_both_appear() {
        let t = task(TaskFilters::Jewelry(JewelryFilters::default()));
        let queries = queries_for(&t);
        let combined: String = queries.iter().map(|q| q.keywords.as_str()).collect();
        assert!(combined.contains("-\"fake\""));
        assert!(combined.contains("-\"costume jewelry\""));
    }

    #[test]
    fn gemstone_multi_type_task_issues_one_query_per_stone() {
        let mut filters = GemstoneFilters::default();
        filters.stone_types = vec!["ruby".to_string(), "sapphire".to_string()];
        let t = task(TaskFilters::Gemstone(filters));
        assert_eq!(queries_for(&t).len(), 2);
    }

    #[test]
    fn category_filter_is_none_when_task_has_no_restriction() {
        let t = task(TaskFilters::Jewelry(JewelryFilters::default()));
        assert!(queries_for(&t).iter().all(|q| q.category_ids.is_none()));
    }

    #[test]
    fn category_filter_or_joins_allowed_ids() {
        let mut t = task(TaskFilters::Jewelry(JewelryFilters::default()));
        t.allowed_category_ids = vec!["1".to_string(), "2".to_string()];
        let queries = queries_for(&t);
        assert!(queries.iter().all(|q| q.category_ids.as_deref() == Some("1|2")));
    }
}
