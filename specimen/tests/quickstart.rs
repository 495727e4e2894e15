// End-to-end walkthrough: declare a template, replicate it, and query
// the registry the way a test suite would.
use specimen::*;

fn visitor_template(cache: &RangeCache) -> Template {
    Template::builder("visitor")
        .seed(Seed::from_u64(2026))
        .range_cache(cache.clone())
        .field("id", Generator::counter(1))
        .field(
            "browser",
            Generator::one_of_weighted(
                vec![
                    Candidate::value("firefox"),
                    Candidate::value("chrome"),
                    Candidate::value("other"),
                ],
                &[0.45, 0.45, 0.10],
            )
            .expect("weights match candidates"),
        )
        .field("visits", Generator::one_of(vec![Candidate::range(1, 9)]))
        .field(
            "tier",
            Generator::depending_on(
                "visits",
                vec![(Value::Int(1), Mapped::value("new"))],
                Some(Mapped::value("regular")),
            ),
        )
        .build()
}

#[test]
fn replicate_and_query_a_catalog() {
    let registry = Registry::with_seed(Seed::from_u64(11));
    let cache = RangeCache::new();
    let template = visitor_template(&cache);

    let visitors = template.replicate(25, &registry).unwrap();
    assert_eq!(visitors.len(), 25);
    assert_eq!(visitors.template_name(), Some("visitor".to_string()));

    // Counter state persisted across all 25 makes
    for (offset, element) in visitors.elements().iter().enumerate() {
        let instance = element.as_instance().unwrap();
        assert_eq!(instance.get("id"), Value::Int(offset as i64 + 1));

        let visits = instance.get("visits").as_int().unwrap();
        assert!((1..=9).contains(&visits));

        let expected_tier = if visits == 1 { "new" } else { "regular" };
        assert_eq!(instance.get("tier").as_str(), Some(expected_tier));
    }

    // Only one range was ever materialized for all those draws
    assert_eq!(cache.len(), 1);

    // Registry-wide predicate search over the replicated pool
    let found = registry
        .any(&template, |element| {
            element
                .as_instance()
                .map(|instance| instance.get("id") == Value::Int(10))
                .unwrap_or(false)
        })
        .unwrap();
    assert_eq!(found.as_instance().unwrap().get("id"), Value::Int(10));
}

#[test]
fn collections_expose_the_outputter_boundary() {
    let registry = Registry::with_seed(Seed::from_u64(11));
    let cache = RangeCache::new();
    let template = visitor_template(&cache);

    let visitors = template.replicate(5, &registry).unwrap();
    assert_eq!(
        visitors.field_names(),
        vec!["id", "browser", "visits", "tier"]
    );

    // Field names plus per-element get() are enough for any serializer
    let header = visitors.field_names().join(",");
    assert_eq!(header, "id,browser,visits,tier");
    for element in visitors.elements() {
        let instance = element.as_instance().unwrap();
        let row: Vec<String> = visitors
            .field_names()
            .iter()
            .map(|field| instance.get(field).to_string())
            .collect();
        assert_eq!(row.len(), 4);
        assert!(!row.iter().any(String::is_empty));
    }
}

#[test]
fn one_instance_can_live_in_many_collections() {
    let registry = Registry::with_seed(Seed::from_u64(11));
    let cache = RangeCache::new();
    let template = visitor_template(&cache);

    let all = template.replicate(10, &registry).unwrap();
    let loyal = Collection::of(Kind::Record("visitor".to_string()));
    for element in all.elements() {
        let instance = element.as_instance().unwrap();
        if instance.get("tier").as_str() == Some("regular") {
            loyal.append(std::rc::Rc::clone(instance)).unwrap();
        }
    }

    assert!(loyal.len() <= all.len());
    for element in loyal.elements() {
        let instance = element.as_instance().unwrap();
        assert_eq!(instance.get("tier").as_str(), Some("regular"));
    }
}
