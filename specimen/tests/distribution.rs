// Statistical contracts of the weighted-choice and subset generators,
// checked with wide binomial tolerances.
use specimen::*;
use std::collections::HashMap;

#[test]
fn skewed_weights_dominate_the_draw() {
    let template = Template::builder("pick")
        .seed(Seed::from_u64(42))
        .field(
            "choice",
            Generator::one_of_weighted(
                vec![
                    Candidate::value("heavy"),
                    Candidate::value("light"),
                    Candidate::value("light-too"),
                ],
                &[0.9, 0.05, 0.05],
            )
            .expect("weights match candidates"),
        )
        .build();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..1000 {
        let choice = template.make().unwrap().get("choice");
        *counts.entry(choice.to_string()).or_insert(0) += 1;
    }

    // 10% tolerance around the expected 900
    let heavy = *counts.get("heavy").unwrap_or(&0);
    assert!(
        (855..=945).contains(&heavy),
        "'heavy' drawn {} times out of 1000",
        heavy
    );
}

#[test]
fn nested_generator_candidates_are_delegated_to() {
    let template = Template::builder("mixed")
        .seed(Seed::from_u64(42))
        .field(
            "value",
            Generator::one_of(vec![
                Candidate::gen(Generator::counter(100)),
                Candidate::value(-1),
            ]),
        )
        .build();

    let mut counter_draws = 0;
    let mut previous_counter = 99;
    for _ in 0..100 {
        let value = template.make().unwrap().get("value").as_int().unwrap();
        if value >= 100 {
            // The nested counter keeps its own state between draws
            assert_eq!(value, previous_counter + 1);
            previous_counter = value;
            counter_draws += 1;
        } else {
            assert_eq!(value, -1);
        }
    }
    assert!(counter_draws > 20, "counter chosen {} times", counter_draws);
}

#[test]
fn subset_sizes_cover_the_full_range() {
    let template = Template::builder("perms")
        .seed(Seed::from_u64(42))
        .field(
            "granted",
            Generator::subset(vec![
                Generator::constant("read"),
                Generator::constant("write"),
                Generator::constant("admin"),
            ]),
        )
        .build();

    let mut sizes_seen = [false; 4];
    for _ in 0..300 {
        let granted = template.make().unwrap().get("granted");
        let len = granted.as_list().unwrap().len();
        assert!((1..=3).contains(&len));
        sizes_seen[len] = true;
    }
    assert!(sizes_seen[1] && sizes_seen[2] && sizes_seen[3]);
}
